use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::ids::QuestionId;

/// A respondent action on one item: pick an option, or bind a matching pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Option(String),
    Pair { left: String, right: String },
}

impl Selection {
    pub fn option(option: impl Into<String>) -> Self {
        Selection::Option(option.into())
    }

    pub fn pair(left: impl Into<String>, right: impl Into<String>) -> Self {
        Selection::Pair {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Recorded answer for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// Selected options; membership only.
    Choices(BTreeSet<String>),
    /// Left item → chosen right option. Right options may repeat.
    Matching(BTreeMap<String, String>),
}

impl Answer {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Choices(set) => set.is_empty(),
            Answer::Matching(map) => map.is_empty(),
        }
    }

    #[must_use]
    pub fn choices(&self) -> Option<&BTreeSet<String>> {
        match self {
            Answer::Choices(set) => Some(set),
            Answer::Matching(_) => None,
        }
    }

    #[must_use]
    pub fn bindings(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Answer::Matching(map) => Some(map),
            Answer::Choices(_) => None,
        }
    }
}

/// Answers keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerState(HashMap<QuestionId, Answer>);

impl AnswerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Answer> {
        self.0.get(&id)
    }

    /// True when the item has any selection or any binding.
    #[must_use]
    pub fn has_answer(&self, id: QuestionId) -> bool {
        self.0.get(&id).is_some_and(|a| !a.is_empty())
    }

    /// Number of items with a non-empty answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.0.values().filter(|a| !a.is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &Answer)> {
        self.0.iter()
    }

    pub(crate) fn replace_single(&mut self, id: QuestionId, option: String) {
        self.0
            .insert(id, Answer::Choices(BTreeSet::from([option])));
    }

    pub(crate) fn toggle_choice(&mut self, id: QuestionId, option: String) {
        let entry = self
            .0
            .entry(id)
            .or_insert_with(|| Answer::Choices(BTreeSet::new()));
        match entry {
            Answer::Choices(set) => {
                if !set.remove(&option) {
                    set.insert(option);
                }
            }
            Answer::Matching(_) => {
                *entry = Answer::Choices(BTreeSet::from([option]));
            }
        }
    }

    pub(crate) fn bind_pair(&mut self, id: QuestionId, left: String, right: String) {
        let entry = self
            .0
            .entry(id)
            .or_insert_with(|| Answer::Matching(BTreeMap::new()));
        match entry {
            Answer::Matching(map) => {
                map.insert(left, right);
            }
            Answer::Choices(_) => {
                *entry = Answer::Matching(BTreeMap::from([(left, right)]));
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

/// Positions flagged "review later".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkSet(BTreeSet<usize>);

impl MarkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, index: usize) {
        if !self.0.remove(&index) {
            self.0.insert(index);
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}
