//! Row-shaped entities backing the data model.
//!
//! These are plain data; the transactional behavior around them (locking,
//! uniqueness, transitions) lives in `artifortress-metastore` and the
//! component crates that operate on them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{
    DecisionSource, GcMode, PolicyAction, PolicyDecision, QuarantineStatus, RepoType,
    UploadState, VersionState,
};

pub type TenantId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub repo_id: String,
    pub tenant_id: TenantId,
    pub repo_key: String,
    pub repo_type: RepoType,
    /// `remote`: upstream URL. `virtual`: ordered, deduplicated member repo
    /// keys. `local`: empty.
    pub upstream_url: Option<String>,
    pub virtual_members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalAccessToken {
    pub token_id: String,
    pub tenant_id: TenantId,
    pub subject: String,
    pub token_hash: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PersonalAccessToken {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if self.revoked_at.is_some() {
            return false;
        }
        match self.expires_at {
            Some(exp) => exp > now,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub repo_id: String,
    pub subject: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub digest: String,
    pub length: u64,
    pub storage_key: String,
    pub object_etag: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    pub upload_id: String,
    pub tenant_id: TenantId,
    pub repo_id: String,
    pub expected_digest: String,
    pub expected_length: u64,
    pub state: UploadState,
    pub object_staging_key: Option<String>,
    pub storage_upload_id: Option<String>,
    pub committed_blob_digest: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub aborted_at: Option<DateTime<Utc>>,
    pub aborted_reason: Option<String>,
    pub committed_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.state.is_terminal() && now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub package_id: String,
    pub repo_id: String,
    pub package_type: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl Package {
    /// Uniqueness key coalesces a missing namespace to empty string.
    pub fn identity_key(&self) -> (String, String, String) {
        (
            self.package_type.clone(),
            self.namespace.clone().unwrap_or_default(),
            self.name.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub version_id: String,
    pub repo_id: String,
    pub package_id: String,
    pub version: String,
    pub state: VersionState,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub tombstoned_at: Option<DateTime<Utc>>,
    pub tombstone_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub version_id: String,
    pub relative_path: String,
    pub blob_digest: String,
    pub checksum_sha1: Option<String>,
    pub checksum_sha256: Option<String>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version_id: String,
    pub document: serde_json::Value,
    pub manifest_blob_digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub version_id: String,
    pub retention_until: DateTime<Utc>,
    pub reason: String,
    pub deleted_by_subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub event_id: String,
    pub tenant_id: TenantId,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
    pub available_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OutboxEvent {
    pub fn idempotency_key(&self) -> (TenantId, String, String, String) {
        (
            self.tenant_id.clone(),
            self.aggregate_type.clone(),
            self.aggregate_id.clone(),
            self.event_type.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEvaluation {
    pub evaluation_id: String,
    pub tenant_id: TenantId,
    pub repo_id: String,
    pub version_id: String,
    pub action: PolicyAction,
    pub decision: PolicyDecision,
    pub decision_source: DecisionSource,
    pub reason: String,
    pub policy_engine_version: Option<String>,
    pub evaluated_at: DateTime<Utc>,
    pub evaluated_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineItem {
    pub quarantine_id: String,
    pub tenant_id: TenantId,
    pub repo_id: String,
    pub version_id: String,
    pub status: QuarantineStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GcCounters {
    pub marked: u64,
    pub candidate_blob_count: u64,
    pub deleted_blob_count: u64,
    pub deleted_version_count: u64,
    pub delete_error_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcRun {
    pub run_id: String,
    pub mode: GcMode,
    pub counters: GcCounters,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub audit_id: String,
    pub tenant_id: TenantId,
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub details: HashMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}
