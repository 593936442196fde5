//! Orchestration facade: the workflow layer an HTTP server would sit on
//! top of, composing identity, object storage, metadata, upload,
//! version, policy, garbage collection, audit, and reconciliation into
//! the operations a tenant or an operator actually calls.
//!
//! Each module corresponds to one group of routes; [`state::AppState`]
//! is the one piece of shared, immutable context every workflow
//! function takes by reference. [`error`] carries the `From` impls that
//! collapse every component crate's narrower error type into
//! [`artifortress_types::ArtifortressError`] at the point a workflow
//! returns it.

mod admin_workflows;
mod auth_workflows;
mod error;
mod health;
mod policy_workflows;
mod repo_workflows;
mod state;
mod upload_workflows;
mod version_workflows;

pub use admin_workflows::{export_audit, list_audit, ops_summary, reconcile_blobs, run_gc};
pub use auth_workflows::{IssuedPat, WhoAmI, issue_pat, revoke_pat, saml_acs, saml_metadata, whoami};
pub use health::{health_live, health_ready};
pub use policy_workflows::{
    evaluate as evaluate_policy, get_quarantine, reject as reject_quarantine, release as release_quarantine,
};
pub use repo_workflows::{create_repo, delete_repo, get_binding, get_repo, list_repos, upsert_binding};
pub use state::AppState;
pub use upload_workflows::{abort_upload, commit_upload, complete_upload, create_upload, get_blob, presign_part};
pub use version_workflows::{
    create_or_reuse_draft, get_manifest, publish, tombstone, upsert_entries as upsert_version_entries, upsert_manifest,
};
