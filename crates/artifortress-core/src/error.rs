//! Conversions from every component crate's narrower error enum into the
//! shared [`ArtifortressError`] taxonomy, performed at the point each
//! crosses into a workflow function a router would map to a status code.

use artifortress_auth::AuthError;
use artifortress_gc::GcError;
use artifortress_metastore::MetaError;
use artifortress_objectstore::ObjectStoreError;
use artifortress_policy::PolicyError;
use artifortress_types::{ArtifortressError, ConflictDetail, ObjectErrorKind};
use artifortress_upload::UploadError;
use artifortress_versions::VersionError;

impl From<MetaError> for ArtifortressError {
    fn from(err: MetaError) -> Self {
        match err {
            MetaError::NotFound(resource) => ArtifortressError::not_found(resource),
            MetaError::UniqueViolation { constraint } => {
                ArtifortressError::conflict(ConflictDetail::Message(constraint))
            }
            MetaError::Locked { table, key } => {
                ArtifortressError::service_unavailable(format!("row lock timed out on {table}:{key}"))
            }
        }
    }
}

impl From<ObjectStoreError> for ArtifortressError {
    fn from(err: ObjectStoreError) -> Self {
        match err.kind {
            ObjectErrorKind::NotFound => ArtifortressError::not_found(err.message),
            ObjectErrorKind::InvalidRequest => ArtifortressError::validation(err.message),
            ObjectErrorKind::InvalidRange => ArtifortressError::RangeInvalid,
            ObjectErrorKind::AccessDenied => ArtifortressError::service_unavailable(err.message),
            ObjectErrorKind::TransientFailure | ObjectErrorKind::UnexpectedFailure => {
                ArtifortressError::service_unavailable(err.message)
            }
        }
    }
}

impl From<UploadError> for ArtifortressError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(message) => ArtifortressError::validation(message),
            UploadError::Conflict(message) => ArtifortressError::conflict(ConflictDetail::Message(message)),
            UploadError::DigestLengthMismatch {
                digest,
                existing_length,
                requested_length,
            } => ArtifortressError::conflict(ConflictDetail::DigestLengthMismatch {
                digest,
                existing_length,
                requested_length,
            }),
            UploadError::RaceLost => {
                ArtifortressError::conflict(ConflictDetail::Message("upload session state changed concurrently; retry".into()))
            }
            UploadError::VerificationFailed(failure) => ArtifortressError::conflict(ConflictDetail::UploadVerificationFailed {
                expected_digest: failure.expected_digest,
                actual_digest: failure.actual_digest,
                expected_length: failure.expected_length,
                actual_length: failure.actual_length,
            }),
            UploadError::ObjectStore(inner) => inner.into(),
            UploadError::Meta(inner) => inner.into(),
        }
    }
}

impl From<VersionError> for ArtifortressError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Validation(message) => ArtifortressError::validation(message),
            VersionError::Conflict(message) => ArtifortressError::conflict(ConflictDetail::Message(message)),
            VersionError::BlobNotFound(digest) => ArtifortressError::not_found(format!("blob {digest}")),
            VersionError::DigestNotCommittedInRepo { digest, .. } => {
                ArtifortressError::conflict(ConflictDetail::UnreachableDigest { digest })
            }
            VersionError::Meta(inner) => inner.into(),
        }
    }
}

impl From<PolicyError> for ArtifortressError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Timeout => ArtifortressError::service_unavailable("policy evaluation timed out"),
            PolicyError::Validation(message) => ArtifortressError::validation(message),
            PolicyError::NotFound(resource) => ArtifortressError::not_found(resource),
            PolicyError::Meta(inner) => inner.into(),
        }
    }
}

impl From<GcError> for ArtifortressError {
    fn from(err: GcError) -> Self {
        match err {
            GcError::Meta(inner) => inner.into(),
        }
    }
}

impl From<AuthError> for ArtifortressError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::UnknownToken | AuthError::InactiveToken => {
                ArtifortressError::Unauthenticated
            }
            AuthError::Forbidden { repo_key, required } => ArtifortressError::Forbidden {
                repo_key,
                required: role_code(&required),
            },
            AuthError::BootstrapMismatch => ArtifortressError::Unauthenticated,
            AuthError::FederationRejected(message) | AuthError::SamlRejected(message) => {
                ArtifortressError::validation(message)
            }
        }
    }
}

/// `AuthError::Forbidden.required` is a free-form `String`; `Forbidden`
/// only carries a `&'static str`, so unrecognized role text collapses to
/// a generic label rather than leaking an unbounded string into a `'static`.
fn role_code(required: &str) -> &'static str {
    match required {
        "read" => "read",
        "write" => "write",
        "admin" => "admin",
        "promote" => "promote",
        _ => "unspecified",
    }
}
