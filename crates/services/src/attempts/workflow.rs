use std::sync::Arc;
use std::time::Duration;

use exam_core::model::BankEntry;
use exam_core::{Attempt, Clock};
use rand::seq::SliceRandom;
use storage::QuestionBankRepository;

use super::live::{AttemptResults, LiveAttempt};
use crate::config::{AttemptConfig, DEFAULT_DURATION_SECS};
use crate::error::AttemptServiceError;

/// Builds attempts from the question bank and starts their countdown.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    banks: Arc<dyn QuestionBankRepository>,
    duration_seconds: u32,
    tick_period: Duration,
    shuffle: bool,
}

impl AttemptService {
    #[must_use]
    pub fn new(clock: Clock, banks: Arc<dyn QuestionBankRepository>) -> Self {
        Self {
            clock,
            banks,
            duration_seconds: DEFAULT_DURATION_SECS,
            tick_period: Duration::from_secs(1),
            shuffle: false,
        }
    }

    #[must_use]
    pub fn from_config(
        clock: Clock,
        banks: Arc<dyn QuestionBankRepository>,
        config: &AttemptConfig,
    ) -> Self {
        Self::new(clock, banks)
            .with_duration(config.duration_seconds)
            .with_tick_period(config.tick_period)
            .with_shuffle(config.shuffle)
    }

    #[must_use]
    pub fn with_duration(mut self, duration_seconds: u32) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    /// Shuffle top-level bank entries. Sub-questions keep their group order.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    /// Subjects the respondent can pick from.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if the bank cannot be read.
    pub async fn subjects(&self) -> Result<Vec<String>, AttemptServiceError> {
        Ok(self.banks.subjects().await?)
    }

    fn build(&self, mut entries: Vec<BankEntry>) -> Result<Attempt, AttemptServiceError> {
        if self.shuffle {
            entries.shuffle(&mut rand::rng());
        }
        Ok(Attempt::initialize(
            &entries,
            self.duration_seconds,
            self.clock.now(),
        )?)
    }

    /// Build an attempt for the chosen subjects without starting the countdown.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::NoSubjects` for an empty choice,
    /// `AttemptServiceError::Attempt` if nothing matches, or storage errors.
    pub async fn prepare(&self, subjects: &[String]) -> Result<Attempt, AttemptServiceError> {
        if subjects.is_empty() {
            return Err(AttemptServiceError::NoSubjects);
        }
        let entries = self.banks.entries_for_subjects(subjects).await?;
        self.build(entries)
    }

    /// Confirm the subject selection and start a timed attempt.
    ///
    /// # Errors
    ///
    /// See [`AttemptService::prepare`].
    pub async fn start_attempt(
        &self,
        subjects: &[String],
    ) -> Result<(LiveAttempt, AttemptResults), AttemptServiceError> {
        let attempt = self.prepare(subjects).await?;
        log::info!("starting attempt {} for {}", attempt.id(), subjects.join(" + "));
        Ok(LiveAttempt::start(attempt, self.clock, self.tick_period))
    }

    /// Start a timed attempt over the whole bank.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Attempt` for an empty bank, or storage errors.
    pub async fn start_full_attempt(
        &self,
    ) -> Result<(LiveAttempt, AttemptResults), AttemptServiceError> {
        let bank = self.banks.load_bank().await?;
        let attempt = self.build(bank.into_entries())?;
        Ok(LiveAttempt::start(attempt, self.clock, self.tick_period))
    }
}
