mod live;
mod workflow;

// Public API of the attempt subsystem.
pub use crate::error::AttemptServiceError;
pub use live::{AttemptResults, LiveAttempt};
pub use workflow::AttemptService;
