use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppServicesError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5275";
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_BANK_PATH: &str = "question_bank.json";
/// 150 minutes.
pub const DEFAULT_DURATION_SECS: u32 = 9000;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct AttemptConfig {
    pub bank_path: PathBuf,
    pub duration_seconds: u32,
    pub tick_period: Duration,
    pub shuffle: bool,
}

/// Everything the app needs at start-up, read from `EXAM_*` variables.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub identity: Option<IdentityConfig>,
    pub attempt: AttemptConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Config` when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppServicesError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, so tests need not touch the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Config` when a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppServicesError> {
        let base_url = lookup("EXAM_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let identity = lookup("EXAM_AUTH_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| IdentityConfig {
                base_url: lookup("EXAM_AUTH_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.into()),
                api_key,
            });

        let duration_seconds = match lookup("EXAM_DURATION_SECS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                AppServicesError::Config(format!("EXAM_DURATION_SECS is not a number: {raw}"))
            })?,
            None => DEFAULT_DURATION_SECS,
        };
        let shuffle = lookup("EXAM_SHUFFLE").is_some_and(|v| matches!(v.trim(), "1" | "true"));

        Ok(Self {
            api: ApiConfig { base_url },
            identity,
            attempt: AttemptConfig {
                bank_path: lookup("EXAM_BANK_PATH")
                    .map_or_else(|| PathBuf::from(DEFAULT_BANK_PATH), PathBuf::from),
                duration_seconds,
                tick_period: Duration::from_secs(1),
                shuffle,
            },
        })
    }
}
