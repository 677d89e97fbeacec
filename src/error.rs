use std::sync::Arc;

use tokio::sync::mpsc::error::SendError;

use crate::EventRef;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A handler reported a failure for the event it processed.
    #[error("handler failed: {0}")]
    Handler(Arc<str>),

    /// The queued bus has been cancelled and no longer accepts events.
    #[error("event bus is closed")]
    Closed,

    /// A fanned-out handler task could not be joined (it panicked or
    /// was aborted).
    #[error("handler task join error: {0}")]
    Join(Arc<str>),
}

impl Error {
    /// Shorthand for a handler failure with the given message.
    pub fn handler(msg: impl Into<Arc<str>>) -> Self {
        Error::Handler(msg.into())
    }
}

impl From<SendError<EventRef>> for Error {
    fn from(_: SendError<EventRef>) -> Self {
        Error::Closed
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Join(e.to_string().into())
    }
}
