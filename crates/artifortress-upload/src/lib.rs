//! Upload session state machine: create, presign parts, complete,
//! abort, and commit, composing the object store and metadata store
//! contracts into the one workflow that actually moves bytes.

mod config;
mod engine;
mod error;

pub use config::UploadConfig;
pub use engine::{CreatedUpload, PresignedPartUrl, abort_upload, commit_upload, complete_upload, create_upload, presign_part};
pub use error::{UploadError, VerificationFailure, VerificationFailureReason};
