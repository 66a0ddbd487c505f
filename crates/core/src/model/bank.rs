use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{ContextBlock, ContextLink, QuestionBody, QuestionItem};

//
// ─── BANK DEFINITIONS ──────────────────────────────────────────────────────────
//

/// A standalone question as supplied by the content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub subject: String,
    pub prompt: String,
    #[serde(flatten)]
    pub body: QuestionBody,
}

/// A question inside a context group; it inherits the group's subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    #[serde(flatten)]
    pub body: QuestionBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextGroupDraft {
    pub subject: String,
    pub context: ContextBlock,
    pub questions: Vec<SubQuestionDraft>,
}

/// One entry of a question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BankEntry {
    Question(QuestionDraft),
    ContextGroup(ContextGroupDraft),
}

impl BankEntry {
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            BankEntry::Question(q) => &q.subject,
            BankEntry::ContextGroup(g) => &g.subject,
        }
    }

    /// Number of navigable items this entry expands into.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            BankEntry::Question(_) => 1,
            BankEntry::ContextGroup(g) => g.questions.len(),
        }
    }

    fn question_ids(&self) -> Vec<QuestionId> {
        match self {
            BankEntry::Question(q) => vec![q.id],
            BankEntry::ContextGroup(g) => g.questions.iter().map(|q| q.id).collect(),
        }
    }
}

//
// ─── FLATTENING ────────────────────────────────────────────────────────────────
//

/// Number of items `flatten` produces for `entries`.
#[must_use]
pub fn flattened_len(entries: &[BankEntry]) -> usize {
    entries.iter().map(BankEntry::item_count).sum()
}

/// Expand context groups into one navigable item per sub-question.
///
/// Every item of a group shares one `Arc<ContextBlock>` and keeps its 1-based
/// position, so sub-question order survives.
#[must_use]
pub fn flatten(entries: &[BankEntry]) -> Vec<QuestionItem> {
    let mut items = Vec::with_capacity(flattened_len(entries));
    for entry in entries {
        match entry {
            BankEntry::Question(q) => items.push(QuestionItem {
                id: q.id,
                subject: q.subject.clone(),
                prompt: q.prompt.clone(),
                body: q.body.clone(),
                context: None,
            }),
            BankEntry::ContextGroup(group) => {
                let context = Arc::new(group.context.clone());
                let group_len = group.questions.len();
                for (idx, sub) in group.questions.iter().enumerate() {
                    items.push(QuestionItem {
                        id: sub.id,
                        subject: group.subject.clone(),
                        prompt: sub.prompt.clone(),
                        body: sub.body.clone(),
                        context: Some(ContextLink {
                            context: Arc::clone(&context),
                            position: idx + 1,
                            group_len,
                        }),
                    });
                }
            }
        }
    }
    items
}

/// Keep only entries whose subject is in `subjects`, in bank order.
#[must_use]
pub fn select_subjects<S: AsRef<str>>(entries: &[BankEntry], subjects: &[S]) -> Vec<BankEntry> {
    entries
        .iter()
        .filter(|entry| subjects.iter().any(|s| s.as_ref() == entry.subject()))
        .cloned()
        .collect()
}

//
// ─── VALIDATED BANK ────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error("question {id}: {reason}")]
    InvalidQuestion { id: QuestionId, reason: &'static str },

    #[error("context group for {subject} has no questions")]
    EmptyContextGroup { subject: String },
}

/// A validated, read-only question bank.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionBank {
    entries: Vec<BankEntry>,
}

impl QuestionBank {
    /// Validate entries and wrap them.
    ///
    /// # Errors
    ///
    /// Returns `BankError` on duplicate ids, malformed bodies, or empty context groups.
    pub fn new(entries: Vec<BankEntry>) -> Result<Self, BankError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if let BankEntry::ContextGroup(group) = entry
                && group.questions.is_empty()
            {
                return Err(BankError::EmptyContextGroup {
                    subject: group.subject.clone(),
                });
            }
            for id in entry.question_ids() {
                if !seen.insert(id) {
                    return Err(BankError::DuplicateId(id));
                }
            }
            let bodies: Vec<(QuestionId, &QuestionBody)> = match entry {
                BankEntry::Question(q) => vec![(q.id, &q.body)],
                BankEntry::ContextGroup(g) => g.questions.iter().map(|q| (q.id, &q.body)).collect(),
            };
            for (id, body) in bodies {
                if let Some(reason) = body.problem() {
                    return Err(BankError::InvalidQuestion { id, reason });
                }
            }
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[BankEntry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<BankEntry> {
        self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct subjects in first-seen order.
    #[must_use]
    pub fn subjects(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !out.iter().any(|s| s == entry.subject()) {
                out.push(entry.subject().to_string());
            }
        }
        out
    }

    #[must_use]
    pub fn for_subjects<S: AsRef<str>>(&self, subjects: &[S]) -> Vec<BankEntry> {
        select_subjects(&self.entries, subjects)
    }
}
