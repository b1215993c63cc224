//! Submission-boundary errors
//!
//! Most internal failures travel as `anyhow::Error`; the submission boundary
//! gets a typed enum so the caller can tell a rejected input from a run that
//! was refused because one is already in flight. A model failure is NOT an
//! error here: it surfaces inside the conversation as an error turn.

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Empty or whitespace-only input. Rejected before any turn is created.
    #[error("message is empty")]
    EmptyMessage,

    /// A response is already being generated. The conversation is unchanged.
    #[error("a response is already in flight")]
    Busy,
}
