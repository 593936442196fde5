use artifortress_metastore::MetaError;
use artifortress_objectstore::ObjectStoreError;
use thiserror::Error;

/// Structured verification-failure detail populated on commit mismatch
/// ("verification failures additionally include expected/actual digest
/// and length").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub expected_digest: String,
    pub actual_digest: String,
    pub expected_length: u64,
    pub actual_length: u64,
    pub reason: VerificationFailureReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailureReason {
    DigestMismatch,
    LengthMismatch,
}

impl VerificationFailureReason {
    /// The `aborted_reason` string stamped on the session row.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationFailureReason::DigestMismatch => "digest_mismatch",
            VerificationFailureReason::LengthMismatch => "length_mismatch",
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload request: {0}")]
    Validation(String),

    #[error("upload session conflict: {0}")]
    Conflict(String),

    #[error("digest {digest} already exists with length {existing_length}, requested length {requested_length}")]
    DigestLengthMismatch {
        digest: String,
        existing_length: u64,
        requested_length: u64,
    },

    #[error("the upload session state changed concurrently; retry")]
    RaceLost,

    #[error("commit verification failed: expected {0:?}")]
    VerificationFailed(VerificationFailure),

    #[error("object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),

    #[error("metadata store error: {0}")]
    Meta(#[from] MetaError),
}
