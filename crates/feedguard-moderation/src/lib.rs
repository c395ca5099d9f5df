//! FeedGuard Moderation Engine
//!
//! Decides whether a post is safe to publish by combining a remote
//! language model with the deterministic rules classifier.
//!
//! The engine:
//! - Asks the model for a JSON verdict and repairs loosely shaped answers
//! - Retries failures with capped exponential backoff, rebuilding the client
//! - Falls back to rules-only classification when the model is unavailable
//! - Forces posts with sexual content involving minors to unsafe

pub mod engine;
pub mod prompt;
pub mod retry;

pub use engine::{ModelVerdict, Moderator, DEFAULT_USER_MESSAGE};
pub use retry::{RetryOutcome, RetryPolicy, MAX_BACKOFF};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::Moderator;
    pub use crate::retry::{RetryOutcome, RetryPolicy};
}
