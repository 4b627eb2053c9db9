use thiserror::Error;

/// Failure reported by a backend collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("entry text cannot be empty")]
    EmptyText,

    #[error("no user is signed in")]
    Unauthenticated,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
