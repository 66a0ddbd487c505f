use async_trait::async_trait;
use exam_core::model::{BankEntry, QuestionBank};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::repository::{QuestionBankRepository, StorageError};

/// Question bank read from a JSON array of bank entries.
///
/// The file is re-read on every load so content edits show up without a restart.
#[derive(Debug, Clone)]
pub struct JsonQuestionBank {
    path: PathBuf,
}

impl JsonQuestionBank {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a bank from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed JSON and
    /// `StorageError::InvalidBank` when validation fails.
    pub fn parse(raw: &str) -> Result<QuestionBank, StorageError> {
        let entries: Vec<BankEntry> =
            serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(QuestionBank::new(entries)?)
    }

    /// Write `bank` as pretty JSON, replacing the file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn write(&self, bank: &QuestionBank) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(bank.entries())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        log::info!("wrote question bank to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl QuestionBankRepository for JsonQuestionBank {
    async fn load_bank(&self) -> Result<QuestionBank, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(e) => return Err(StorageError::Connection(e.to_string())),
        };
        let bank = Self::parse(&raw)?;
        log::debug!(
            "loaded {} bank entries from {}",
            bank.entries().len(),
            self.path.display()
        );
        Ok(bank)
    }
}
