use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::model::ids::QuestionId;

//
// ─── QUESTION SHAPES ───────────────────────────────────────────────────────────
//

/// Discriminant of a question body, handy for labels and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    Matching,
}

impl QuestionKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single choice",
            QuestionKind::MultiChoice => "multiple choice",
            QuestionKind::Matching => "matching",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selectable content of a question. Each kind carries only its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QuestionBody {
    SingleChoice {
        options: Vec<String>,
    },
    MultiChoice {
        options: Vec<String>,
    },
    Matching {
        left_items: Vec<String>,
        right_options: Vec<String>,
    },
}

impl QuestionBody {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionBody::SingleChoice { .. } => QuestionKind::SingleChoice,
            QuestionBody::MultiChoice { .. } => QuestionKind::MultiChoice,
            QuestionBody::Matching { .. } => QuestionKind::Matching,
        }
    }

    /// Options offered by a choice question; empty for matching.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match self {
            QuestionBody::SingleChoice { options } | QuestionBody::MultiChoice { options } => {
                options
            }
            QuestionBody::Matching { .. } => &[],
        }
    }

    pub(crate) fn problem(&self) -> Option<&'static str> {
        match self {
            QuestionBody::SingleChoice { options } | QuestionBody::MultiChoice { options } => {
                options.is_empty().then_some("choice question has no options")
            }
            QuestionBody::Matching {
                left_items,
                right_options,
            } => {
                if left_items.is_empty() {
                    Some("matching question has no left items")
                } else if right_options.is_empty() {
                    Some("matching question has no right options")
                } else {
                    None
                }
            }
        }
    }
}

//
// ─── SHARED CONTEXT ────────────────────────────────────────────────────────────
//

/// Reading passage and/or image shown above every question of a context group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Url>,
}

/// Back-reference from a flattened item to its context group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLink {
    pub context: Arc<ContextBlock>,
    /// 1-based position inside the group.
    pub position: usize,
    pub group_len: usize,
}

impl ContextLink {
    #[must_use]
    pub fn shares_context_with(&self, other: &ContextLink) -> bool {
        Arc::ptr_eq(&self.context, &other.context)
    }
}

//
// ─── NAVIGABLE ITEM ────────────────────────────────────────────────────────────
//

/// One navigable unit in a test attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionItem {
    pub id: QuestionId,
    pub subject: String,
    pub prompt: String,
    pub body: QuestionBody,
    pub context: Option<ContextLink>,
}

impl QuestionItem {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.body.kind()
    }

    #[must_use]
    pub fn offers_option(&self, option: &str) -> bool {
        self.body.options().iter().any(|o| o == option)
    }

    #[must_use]
    pub fn offers_pair(&self, left: &str, right: &str) -> bool {
        match &self.body {
            QuestionBody::Matching {
                left_items,
                right_options,
            } => left_items.iter().any(|l| l == left) && right_options.iter().any(|r| r == right),
            QuestionBody::SingleChoice { .. } | QuestionBody::MultiChoice { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_serializes_with_kind_tag() {
        let body = QuestionBody::MultiChoice {
            options: vec!["A) Mass".into(), "B) Velocity".into()],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], "multi-choice");
        assert_eq!(json["options"][1], "B) Velocity");
    }

    #[test]
    fn matching_parses_from_json() {
        let body: QuestionBody = serde_json::from_str(
            r#"{"kind":"matching","left_items":["H2O"],"right_options":["water","salt"]}"#,
        )
        .unwrap();
        assert_eq!(body.kind(), QuestionKind::Matching);
        assert!(body.options().is_empty());
        assert!(body.problem().is_none());
    }

    #[test]
    fn empty_options_are_a_problem() {
        let body = QuestionBody::SingleChoice { options: vec![] };
        assert!(body.problem().is_some());
    }

    #[test]
    fn offers_pair_only_for_matching() {
        let item = QuestionItem {
            id: QuestionId::new(1),
            subject: "Chemistry".into(),
            prompt: "Match".into(),
            body: QuestionBody::Matching {
                left_items: vec!["NaCl".into()],
                right_options: vec!["salt".into()],
            },
            context: None,
        };
        assert!(item.offers_pair("NaCl", "salt"));
        assert!(!item.offers_pair("NaCl", "sugar"));
        assert!(!item.offers_option("salt"));
    }
}
