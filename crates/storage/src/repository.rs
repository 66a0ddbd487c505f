use async_trait::async_trait;
use exam_core::model::{BankEntry, BankError, QuestionBank};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by question bank sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    InvalidBank(#[from] BankError),
}

/// Read-only source of question bank entries.
#[async_trait]
pub trait QuestionBankRepository: Send + Sync {
    /// Load the whole bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source cannot be read or fails validation.
    async fn load_bank(&self) -> Result<QuestionBank, StorageError>;

    /// Distinct subjects in bank order.
    ///
    /// # Errors
    ///
    /// Propagates `load_bank` errors.
    async fn subjects(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.load_bank().await?.subjects())
    }

    /// Entries for the chosen subjects, in bank order.
    ///
    /// # Errors
    ///
    /// Propagates `load_bank` errors.
    async fn entries_for_subjects(
        &self,
        subjects: &[String],
    ) -> Result<Vec<BankEntry>, StorageError> {
        Ok(self.load_bank().await?.for_subjects(subjects))
    }
}

/// Simple in-memory bank for tests and fixed-bank variants.
#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    bank: Arc<Mutex<QuestionBank>>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank: Arc::new(Mutex::new(bank)),
        }
    }

    /// Validate and wrap raw entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidBank` when validation fails.
    pub fn from_entries(entries: Vec<BankEntry>) -> Result<Self, StorageError> {
        Ok(Self::new(QuestionBank::new(entries)?))
    }

    /// Swap the bank contents, e.g. after a content refresh.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn replace(&self, bank: QuestionBank) -> Result<(), StorageError> {
        let mut guard = self
            .bank
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = bank;
        Ok(())
    }
}

#[async_trait]
impl QuestionBankRepository for InMemoryQuestionBank {
    async fn load_bank(&self) -> Result<QuestionBank, StorageError> {
        let guard = self
            .bank
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

/// Aggregates bank sources behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub banks: Arc<dyn QuestionBankRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(bank: QuestionBank) -> Self {
        Self {
            banks: Arc::new(InMemoryQuestionBank::new(bank)),
        }
    }

    #[must_use]
    pub fn json_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            banks: Arc::new(crate::json::JsonQuestionBank::new(path)),
        }
    }
}
