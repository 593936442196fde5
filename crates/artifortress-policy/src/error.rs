use artifortress_metastore::MetaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy evaluation timed out")]
    Timeout,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("metadata store error: {0}")]
    Meta(#[from] MetaError),
}
