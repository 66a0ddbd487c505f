use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{
    AnswerState, AttemptId, BankEntry, MarkSet, QuestionBody, QuestionId, QuestionItem, Selection,
    flatten,
};
use crate::time::AttemptClock;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("cannot start test: the question bank is empty")]
    EmptyBank,

    #[error("attempt already submitted")]
    AlreadySubmitted,

    #[error("attempt was abandoned")]
    Abandoned,
}

//
// ─── STATUS & OUTCOMES ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Active,
    Submitted,
    Abandoned,
}

/// What a single timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock moved; seconds remaining.
    Running(u32),
    /// Clock just reached zero. Reported once per attempt run.
    Expired,
    /// Nothing to do: clock already at zero or attempt not active.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimeExpired,
}

/// Frozen outcome handed to the results consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt_id: AttemptId,
    pub answers: AnswerState,
    pub marks: MarkSet,
    pub elapsed_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub reason: SubmitReason,
}

/// Header counters: "answered/total" and the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptProgress {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub remaining_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteState {
    Current,
    Marked,
    Answered,
    Unanswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteCell {
    pub index: usize,
    pub state: PaletteState,
}

impl PaletteCell {
    /// 1-based label shown on the palette button.
    #[must_use]
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

enum Apply {
    Replace(String),
    Toggle(String),
    Bind(String, String),
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one test attempt.
///
/// Everything except `initialize` and `submit` is total: out-of-range
/// positions, unknown ids, and actions on a finished attempt are ignored.
pub struct Attempt {
    id: AttemptId,
    items: Vec<QuestionItem>,
    answers: AnswerState,
    marks: MarkSet,
    clock: AttemptClock,
    current: usize,
    status: AttemptStatus,
    started_at: DateTime<Utc>,
}

impl Attempt {
    /// Flatten `bank` and start a fresh attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyBank` if the bank yields no item.
    pub fn initialize(
        bank: &[BankEntry],
        duration_seconds: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        let items = flatten(bank);
        if items.is_empty() {
            return Err(AttemptError::EmptyBank);
        }

        let id = AttemptId::generate();
        log::info!(
            "attempt {id} started with {} items, {duration_seconds}s",
            items.len()
        );
        Ok(Self {
            id,
            items,
            answers: AnswerState::new(),
            marks: MarkSet::new(),
            clock: AttemptClock::new(duration_seconds),
            current: 0,
            status: AttemptStatus::Active,
            started_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerState {
        &self.answers
    }

    #[must_use]
    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    #[must_use]
    pub fn clock(&self) -> &AttemptClock {
        &self.clock
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_item(&self) -> &QuestionItem {
        &self.items[self.current]
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AttemptStatus::Active
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True on the last item, where "Next" turns into "Submit".
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.items.len()
    }

    fn item_by_id(&self, id: QuestionId) -> Option<&QuestionItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Record a respondent selection for `item_id`.
    ///
    /// Single choice replaces, multi choice toggles, matching binds one left item.
    pub fn select_answer(&mut self, item_id: QuestionId, selection: Selection) {
        if !self.is_active() {
            log::debug!("attempt {}: selection ignored, not active", self.id);
            return;
        }
        let Some(item) = self.item_by_id(item_id) else {
            log::debug!("attempt {}: unknown question {item_id}", self.id);
            return;
        };

        let action = match (&item.body, selection) {
            (QuestionBody::SingleChoice { .. }, Selection::Option(option))
                if item.offers_option(&option) =>
            {
                Some(Apply::Replace(option))
            }
            (QuestionBody::MultiChoice { .. }, Selection::Option(option))
                if item.offers_option(&option) =>
            {
                Some(Apply::Toggle(option))
            }
            (QuestionBody::Matching { .. }, Selection::Pair { left, right })
                if item.offers_pair(&left, &right) =>
            {
                Some(Apply::Bind(left, right))
            }
            _ => None,
        };

        match action {
            Some(Apply::Replace(option)) => self.answers.replace_single(item_id, option),
            Some(Apply::Toggle(option)) => self.answers.toggle_choice(item_id, option),
            Some(Apply::Bind(left, right)) => self.answers.bind_pair(item_id, left, right),
            None => log::debug!(
                "attempt {}: selection does not fit question {item_id}",
                self.id
            ),
        }
    }

    /// Flip the review mark of `index`.
    pub fn toggle_mark(&mut self, index: usize) {
        if self.is_active() {
            self.marks.toggle(index);
        }
    }

    /// Move to `target` if it is a valid position; otherwise nothing changes.
    pub fn navigate(&mut self, target: isize) {
        if !self.is_active() {
            return;
        }
        match usize::try_from(target) {
            Ok(index) if index < self.items.len() => self.current = index,
            _ => log::debug!("attempt {}: navigate({target}) out of range", self.id),
        }
    }

    /// Step forward. Returns false on the last item.
    pub fn next(&mut self) -> bool {
        let before = self.current;
        self.navigate(isize::try_from(self.current + 1).unwrap_or(isize::MAX));
        self.current != before
    }

    /// Step back. Returns false on the first item.
    pub fn previous(&mut self) -> bool {
        let before = self.current;
        self.navigate(isize::try_from(self.current).unwrap_or(isize::MAX) - 1);
        self.current != before
    }

    /// One second passes.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_active() || self.clock.is_expired() {
            return TickOutcome::Idle;
        }
        if self.clock.tick() {
            log::info!("attempt {}: time is up", self.id);
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.clock.remaining())
        }
    }

    /// Whether the item at `index` has any answer recorded.
    #[must_use]
    pub fn is_complete(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|item| self.answers.has_answer(item.id))
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        AttemptProgress {
            total: self.items.len(),
            answered: (0..self.items.len()).filter(|&i| self.is_complete(i)).count(),
            marked: self.marks.len(),
            remaining_seconds: self.clock.remaining(),
        }
    }

    /// Per-position state for the navigation palette.
    #[must_use]
    pub fn palette(&self) -> Vec<PaletteCell> {
        (0..self.items.len())
            .map(|index| {
                let state = if index == self.current {
                    PaletteState::Current
                } else if self.marks.contains(index) {
                    PaletteState::Marked
                } else if self.is_complete(index) {
                    PaletteState::Answered
                } else {
                    PaletteState::Unanswered
                };
                PaletteCell { index, state }
            })
            .collect()
    }

    /// Freeze the attempt and hand out its answers.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::AlreadySubmitted` or `AttemptError::Abandoned`
    /// when the attempt is no longer active.
    pub fn submit(
        &mut self,
        submitted_at: DateTime<Utc>,
        reason: SubmitReason,
    ) -> Result<AttemptResult, AttemptError> {
        match self.status {
            AttemptStatus::Active => {}
            AttemptStatus::Submitted => return Err(AttemptError::AlreadySubmitted),
            AttemptStatus::Abandoned => return Err(AttemptError::Abandoned),
        }
        self.status = AttemptStatus::Submitted;

        let result = AttemptResult {
            attempt_id: self.id,
            answers: std::mem::take(&mut self.answers),
            marks: std::mem::take(&mut self.marks),
            elapsed_seconds: self.clock.elapsed(),
            started_at: self.started_at,
            submitted_at,
            reason,
        };
        log::info!(
            "attempt {} submitted ({:?}) after {}s",
            self.id,
            reason,
            result.elapsed_seconds
        );
        Ok(result)
    }

    /// Discard answers and stop; later ticks and selections are ignored.
    pub fn abandon(&mut self) {
        if self.is_active() {
            self.answers.clear();
            self.marks.clear();
            self.status = AttemptStatus::Abandoned;
            log::info!("attempt {} abandoned", self.id);
        }
    }

    /// Start over on the same items with a fresh id and full clock.
    pub fn restart(&mut self, started_at: DateTime<Utc>) {
        self.id = AttemptId::generate();
        self.answers.clear();
        self.marks.clear();
        self.clock.reset();
        self.current = 0;
        self.status = AttemptStatus::Active;
        self.started_at = started_at;
        log::info!("attempt restarted as {}", self.id);
    }
}

impl fmt::Debug for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempt")
            .field("id", &self.id)
            .field("items_len", &self.items.len())
            .field("current", &self.current)
            .field("answered", &self.answers.answered_count())
            .field("marked", &self.marks.len())
            .field("remaining", &self.clock.remaining())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Answer, ContextBlock, ContextGroupDraft, QuestionDraft, SubQuestionDraft, flattened_len,
    };
    use crate::time::fixed_now;
    use std::collections::BTreeSet;

    fn choice(id: u64, multi: bool) -> BankEntry {
        let options = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        BankEntry::Question(QuestionDraft {
            id: QuestionId::new(id),
            subject: "Math Literacy".into(),
            prompt: format!("Q{id}"),
            body: if multi {
                QuestionBody::MultiChoice { options }
            } else {
                QuestionBody::SingleChoice { options }
            },
        })
    }

    fn matching(id: u64) -> BankEntry {
        BankEntry::Question(QuestionDraft {
            id: QuestionId::new(id),
            subject: "Chemistry".into(),
            prompt: "Match formula to name".into(),
            body: QuestionBody::Matching {
                left_items: vec!["H2O".into(), "NaCl".into(), "CO2".into()],
                right_options: vec!["water".into(), "salt".into(), "gas".into()],
            },
        })
    }

    fn reading_group(n: u64) -> BankEntry {
        BankEntry::ContextGroup(ContextGroupDraft {
            subject: "Reading Literacy".into(),
            context: ContextBlock {
                text: "The Aral Sea, once the fourth-largest lake in the world...".into(),
                image: None,
            },
            questions: (1..=n)
                .map(|i| SubQuestionDraft {
                    id: QuestionId::new(100 + i),
                    prompt: format!("Part {i}"),
                    body: QuestionBody::SingleChoice {
                        options: vec!["A".into(), "B".into()],
                    },
                })
                .collect(),
        })
    }

    fn bank() -> Vec<BankEntry> {
        vec![choice(1, false), choice(2, true), matching(3), reading_group(2)]
    }

    fn start(duration: u32) -> Attempt {
        Attempt::initialize(&bank(), duration, fixed_now()).unwrap()
    }

    fn choices(attempt: &Attempt, id: u64) -> BTreeSet<String> {
        attempt
            .answers()
            .get(QuestionId::new(id))
            .and_then(Answer::choices)
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn initialize_flattens_and_starts_at_zero() {
        let attempt = start(60);
        assert_eq!(attempt.items().len(), flattened_len(&bank()));
        assert_eq!(attempt.current_index(), 0);
        assert_eq!(attempt.answers().answered_count(), 0);
        assert!(attempt.marks().is_empty());
        assert_eq!(attempt.clock().remaining(), 60);
    }

    #[test]
    fn empty_bank_fails() {
        let err = Attempt::initialize(&[], 60, fixed_now()).unwrap_err();
        assert_eq!(err, AttemptError::EmptyBank);
    }

    #[test]
    fn single_choice_replaces() {
        let mut attempt = start(60);
        let id = QuestionId::new(1);
        attempt.select_answer(id, Selection::option("A"));
        attempt.select_answer(id, Selection::option("B"));
        assert_eq!(choices(&attempt, 1), BTreeSet::from(["B".to_string()]));

        attempt.select_answer(id, Selection::option("B"));
        assert_eq!(choices(&attempt, 1), BTreeSet::from(["B".to_string()]));
    }

    #[test]
    fn multi_choice_toggles() {
        let mut attempt = start(60);
        let id = QuestionId::new(2);
        attempt.select_answer(id, Selection::option("A"));
        attempt.select_answer(id, Selection::option("C"));
        assert_eq!(choices(&attempt, 2).len(), 2);

        attempt.select_answer(id, Selection::option("A"));
        attempt.select_answer(id, Selection::option("C"));
        assert!(choices(&attempt, 2).is_empty());
        assert!(!attempt.is_complete(1));
    }

    #[test]
    fn matching_binds_per_left_item() {
        let mut attempt = start(60);
        let id = QuestionId::new(3);
        attempt.select_answer(id, Selection::pair("H2O", "water"));
        attempt.select_answer(id, Selection::pair("NaCl", "water"));
        attempt.select_answer(id, Selection::pair("NaCl", "salt"));

        let map = attempt.answers().get(id).and_then(Answer::bindings).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["H2O"], "water");
        assert_eq!(map["NaCl"], "salt");
        // one binding out of three is enough for the palette
        assert!(attempt.is_complete(2));
    }

    #[test]
    fn mismatched_or_unknown_selections_are_ignored() {
        let mut attempt = start(60);
        attempt.select_answer(QuestionId::new(999), Selection::option("A"));
        attempt.select_answer(QuestionId::new(1), Selection::pair("H2O", "water"));
        attempt.select_answer(QuestionId::new(3), Selection::option("water"));
        attempt.select_answer(QuestionId::new(1), Selection::option("Z"));
        assert_eq!(attempt.answers().answered_count(), 0);
    }

    #[test]
    fn navigate_out_of_range_is_noop() {
        let mut attempt = start(60);
        attempt.navigate(2);
        attempt.navigate(-1);
        assert_eq!(attempt.current_index(), 2);
        attempt.navigate(attempt.items().len() as isize);
        assert_eq!(attempt.current_index(), 2);
    }

    #[test]
    fn next_and_previous_stop_at_edges() {
        let mut attempt = start(60);
        assert!(!attempt.previous());
        while attempt.next() {}
        assert!(attempt.is_last());
        assert_eq!(attempt.current_index(), attempt.items().len() - 1);
        assert!(attempt.previous());
    }

    #[test]
    fn toggle_mark_twice_restores() {
        let mut attempt = start(60);
        let before = attempt.marks().clone();
        attempt.toggle_mark(3);
        assert!(attempt.marks().contains(3));
        attempt.toggle_mark(3);
        assert_eq!(attempt.marks(), &before);
    }

    #[test]
    fn ticks_floor_at_zero_and_expire_once() {
        let mut attempt = start(3);
        assert_eq!(attempt.tick(), TickOutcome::Running(2));
        assert_eq!(attempt.tick(), TickOutcome::Running(1));
        assert_eq!(attempt.tick(), TickOutcome::Expired);
        assert_eq!(attempt.clock().remaining(), 0);
        assert_eq!(attempt.tick(), TickOutcome::Idle);
        assert_eq!(attempt.clock().remaining(), 0);
    }

    #[test]
    fn tick_after_submit_is_noop() {
        let mut attempt = start(10);
        attempt.tick();
        attempt.submit(fixed_now(), SubmitReason::Manual).unwrap();
        let remaining = attempt.clock().remaining();
        assert_eq!(attempt.tick(), TickOutcome::Idle);
        assert_eq!(attempt.clock().remaining(), remaining);
    }

    #[test]
    fn full_length_attempt_reports_elapsed() {
        let mut attempt = start(9000);
        for _ in 0..9000 {
            attempt.tick();
        }
        let result = attempt.submit(fixed_now(), SubmitReason::Manual).unwrap();
        assert_eq!(result.elapsed_seconds, 9000);
    }

    #[test]
    fn submit_moves_answers_and_is_terminal() {
        let mut attempt = start(60);
        attempt.select_answer(QuestionId::new(1), Selection::option("A"));
        attempt.toggle_mark(0);

        let result = attempt.submit(fixed_now(), SubmitReason::Manual).unwrap();
        assert_eq!(result.answers.answered_count(), 1);
        assert!(result.marks.contains(0));
        assert_eq!(result.attempt_id, attempt.id());
        assert_eq!(attempt.answers().answered_count(), 0);

        let err = attempt.submit(fixed_now(), SubmitReason::Manual).unwrap_err();
        assert_eq!(err, AttemptError::AlreadySubmitted);

        attempt.select_answer(QuestionId::new(1), Selection::option("B"));
        assert_eq!(attempt.answers().answered_count(), 0);
    }

    #[test]
    fn abandon_clears_and_blocks_submit() {
        let mut attempt = start(60);
        attempt.select_answer(QuestionId::new(1), Selection::option("A"));
        attempt.abandon();
        assert_eq!(attempt.answers().answered_count(), 0);
        assert_eq!(attempt.tick(), TickOutcome::Idle);
        assert_eq!(
            attempt.submit(fixed_now(), SubmitReason::Manual).unwrap_err(),
            AttemptError::Abandoned
        );
    }

    #[test]
    fn restart_resets_everything() {
        let mut attempt = start(5);
        let first_id = attempt.id();
        attempt.select_answer(QuestionId::new(1), Selection::option("A"));
        attempt.navigate(3);
        attempt.tick();
        attempt.submit(fixed_now(), SubmitReason::Manual).unwrap();

        attempt.restart(fixed_now());
        assert_ne!(attempt.id(), first_id);
        assert!(attempt.is_active());
        assert_eq!(attempt.current_index(), 0);
        assert_eq!(attempt.clock().remaining(), 5);
        assert_eq!(attempt.answers().answered_count(), 0);
    }

    #[test]
    fn palette_prefers_current_then_marked_then_answered() {
        let mut attempt = start(60);
        attempt.select_answer(QuestionId::new(1), Selection::option("A"));
        attempt.select_answer(QuestionId::new(2), Selection::option("A"));
        attempt.toggle_mark(1);
        attempt.navigate(4);

        let states: Vec<PaletteState> = attempt.palette().iter().map(|c| c.state).collect();
        assert_eq!(
            states,
            vec![
                PaletteState::Answered,
                PaletteState::Marked,
                PaletteState::Unanswered,
                PaletteState::Unanswered,
                PaletteState::Current,
            ]
        );
        assert_eq!(attempt.palette()[4].number(), 5);

        let progress = attempt.progress();
        assert_eq!(progress.total, 5);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.marked, 1);
    }

    #[test]
    fn context_group_items_are_numbered_in_order() {
        let attempt = Attempt::initialize(&[reading_group(5)], 60, fixed_now()).unwrap();
        assert_eq!(attempt.items().len(), 5);
        let first = attempt.items()[0].context.clone().unwrap();
        for (i, item) in attempt.items().iter().enumerate() {
            let link = item.context.as_ref().unwrap();
            assert!(link.shares_context_with(&first));
            assert_eq!(link.position, i + 1);
        }
    }
}
