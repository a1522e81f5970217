use thiserror::Error;

use crate::remote::RemoteError;

/// Errors surfaced by the domain query wrappers.
///
/// Store operations never fail, so there is no cache-specific variant.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid query shape: {0}")]
    InvalidQueryShape(String),

    #[error("Remote fetch failed: {0}")]
    RemoteFetchFailed(#[from] RemoteError),
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        QueryError::InvalidQueryShape(reason.into())
    }

    /// True when the remote store rejected or failed the request.
    pub fn is_remote(&self) -> bool {
        matches!(self, QueryError::RemoteFetchFailed(_))
    }
}
