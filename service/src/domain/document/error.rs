use thiserror::Error;

/// A requested status change the workflow does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("document has no handler and cannot be reported as completed")]
    NotAssigned,
    #[error("document is already completed")]
    AlreadyCompleted,
    #[error("document in processing must keep a handler")]
    HandlerRequired,
    #[error("completion time can only be set on a completed document")]
    NotCompleted,
}
