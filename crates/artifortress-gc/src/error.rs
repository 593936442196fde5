use artifortress_metastore::MetaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GcError {
    #[error("metadata store error: {0}")]
    Meta(#[from] MetaError),
}
