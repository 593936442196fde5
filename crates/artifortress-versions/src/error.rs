use artifortress_metastore::MetaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("version state conflict: {0}")]
    Conflict(String),

    #[error("blob {0} does not exist")]
    BlobNotFound(String),

    #[error("digest {digest} is not committed in repo {repo_id}")]
    DigestNotCommittedInRepo { repo_id: String, digest: String },

    #[error("metadata store error: {0}")]
    Meta(#[from] MetaError),
}
