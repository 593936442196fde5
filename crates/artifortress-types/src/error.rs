//! Shared error taxonomy (see the error handling design notes).
//!
//! Every adapter and component crate ultimately produces an
//! [`ArtifortressError`] at the boundary a caller needs to branch on. Lower
//! layers are free to use their own narrower error enum internally and
//! convert with `From`/`.into()` once the failure needs to cross into a
//! workflow that a router would map to a status code.

use thiserror::Error;

/// A taxonomy mirroring the status codes the (out-of-scope) HTTP router maps
/// onto: 400/401/403/404/409/416/423/503.
#[derive(Debug, Error)]
pub enum ArtifortressError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: missing role {required} on {repo_key}")]
    Forbidden {
        repo_key: String,
        required: &'static str,
    },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("conflict: {detail}")]
    Conflict { detail: ConflictDetail },

    #[error("range not satisfiable")]
    RangeInvalid,

    #[error("locked: {reason}")]
    Locked { reason: String },

    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

/// Structured detail for conflicts that need more than a message — upload
/// verification failures specifically need the expected/actual digest and
/// length surfaced, not just prose.
#[derive(Debug)]
pub enum ConflictDetail {
    Message(String),
    UploadVerificationFailed {
        expected_digest: String,
        actual_digest: String,
        expected_length: u64,
        actual_length: u64,
    },
    DigestLengthMismatch {
        digest: String,
        existing_length: u64,
        requested_length: u64,
    },
    UnreachableDigest {
        digest: String,
    },
}

impl std::fmt::Display for ConflictDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictDetail::Message(m) => write!(f, "{m}"),
            ConflictDetail::UploadVerificationFailed {
                expected_digest,
                actual_digest,
                expected_length,
                actual_length,
            } => write!(
                f,
                "upload verification failed: expected digest {expected_digest} length {expected_length}, got digest {actual_digest} length {actual_length}"
            ),
            ConflictDetail::DigestLengthMismatch {
                digest,
                existing_length,
                requested_length,
            } => write!(
                f,
                "digest {digest} already exists with length {existing_length}, requested length {requested_length}"
            ),
            ConflictDetail::UnreachableDigest { digest } => {
                write!(f, "digest {digest} is not committed in this repository")
            }
        }
    }
}

impl ArtifortressError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn conflict(detail: ConflictDetail) -> Self {
        Self::Conflict { detail }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Machine-readable code a router would put in the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            ArtifortressError::Validation { .. } => "validation_failed",
            ArtifortressError::Unauthenticated => "unauthenticated",
            ArtifortressError::Forbidden { .. } => "forbidden",
            ArtifortressError::NotFound { .. } => "not_found",
            ArtifortressError::Conflict { detail } => match detail {
                ConflictDetail::UploadVerificationFailed { .. } => "upload_verification_failed",
                ConflictDetail::DigestLengthMismatch { .. } => "digest_length_mismatch",
                ConflictDetail::UnreachableDigest { .. } => "digest_unreachable",
                ConflictDetail::Message(_) => "conflict",
            },
            ArtifortressError::RangeInvalid => "range_not_satisfiable",
            ArtifortressError::Locked { .. } => "quarantined_blob",
            ArtifortressError::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    /// HTTP-equivalent status the out-of-scope router is expected to emit.
    pub fn status_code(&self) -> u16 {
        match self {
            ArtifortressError::Validation { .. } => 400,
            ArtifortressError::Unauthenticated => 401,
            ArtifortressError::Forbidden { .. } => 403,
            ArtifortressError::NotFound { .. } => 404,
            ArtifortressError::Conflict { .. } => 409,
            ArtifortressError::RangeInvalid => 416,
            ArtifortressError::Locked { .. } => 423,
            ArtifortressError::ServiceUnavailable { .. } => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ArtifortressError::Unauthenticated.status_code(), 401);
        assert_eq!(ArtifortressError::RangeInvalid.status_code(), 416);
        assert_eq!(
            ArtifortressError::Locked {
                reason: "quarantined".into()
            }
            .status_code(),
            423
        );
    }

    #[test]
    fn conflict_detail_renders_expected_actual() {
        let err = ArtifortressError::conflict(ConflictDetail::UploadVerificationFailed {
            expected_digest: "a".repeat(64),
            actual_digest: "b".repeat(64),
            expected_length: 10,
            actual_length: 11,
        });
        assert_eq!(err.code(), "upload_verification_failed");
        assert!(err.to_string().contains("expected digest"));
    }
}
