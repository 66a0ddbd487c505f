#![forbid(unsafe_code)]

pub mod attempt;
pub mod error;
pub mod model;
pub mod time;

pub use attempt::{
    Attempt, AttemptError, AttemptProgress, AttemptResult, AttemptStatus, PaletteCell,
    PaletteState, SubmitReason, TickOutcome,
};
pub use error::Error;
pub use time::{AttemptClock, Clock};
