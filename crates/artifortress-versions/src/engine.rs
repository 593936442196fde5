use std::collections::HashSet;
use std::time::Duration;

use artifortress_metastore::InMemoryMetadataStore;
use artifortress_types::digest::{is_valid_sha1_hex, is_valid_sha256_hex};
use artifortress_types::{ArtifactEntry, AuditEntry, Manifest, OutboxEvent, Package, PackageVersion, Tombstone, VersionState};
use chrono::{DateTime, Utc};
use rand::RngExt;
use rand::distr::Alphanumeric;
use std::collections::HashMap;

use crate::error::VersionError;

const ROW_LOCK_TIMEOUT: Duration = Duration::from_millis(500);
const DEFAULT_RETENTION_DAYS: i64 = 30;
const MIN_RETENTION_DAYS: i64 = 1;
const MAX_RETENTION_DAYS: i64 = 3650;

fn generate_id(prefix: &str) -> String {
    let suffix: String = rand::rng().sample_iter(&Alphanumeric).take(20).map(char::from).collect();
    format!("{prefix}-{suffix}")
}

/// One entry of a commit request, before the row has been persisted.
#[derive(Debug, Clone)]
pub struct ArtifactEntryInput {
    pub relative_path: String,
    pub blob_digest: String,
    pub checksum_sha1: Option<String>,
    pub checksum_sha256: Option<String>,
    pub size_bytes: u64,
}

/// Upsert the package identity and insert-or-reuse a draft version at
/// `(repo, package, version)`.
pub fn create_or_reuse_draft(
    store: &InMemoryMetadataStore,
    repo_id: &str,
    package_type: &str,
    namespace: Option<&str>,
    name: &str,
    version: &str,
    now: DateTime<Utc>,
) -> Result<PackageVersion, VersionError> {
    if name.trim().is_empty() || version.trim().is_empty() {
        return Err(VersionError::Validation("package name and version must be non-empty".into()));
    }
    let package = store.upsert_package(Package {
        package_id: generate_id("pkg"),
        repo_id: repo_id.to_string(),
        package_type: package_type.to_string(),
        namespace: namespace.map(str::to_string),
        name: name.to_string(),
    });
    let draft = PackageVersion {
        version_id: generate_id("ver"),
        repo_id: repo_id.to_string(),
        package_id: package.package_id.clone(),
        version: version.to_string(),
        state: VersionState::Draft,
        created_at: now,
        published_at: None,
        tombstoned_at: None,
        tombstone_reason: None,
    };
    store.insert_or_reuse_draft(draft).map_err(|e| match e {
        artifortress_metastore::MetaError::UniqueViolation { constraint } => VersionError::Conflict(constraint),
        other => VersionError::Meta(other),
    })
}

fn require_draft(store: &InMemoryMetadataStore, version_id: &str) -> Result<PackageVersion, VersionError> {
    let version = store.get_version(version_id)?;
    if version.state != VersionState::Draft {
        return Err(VersionError::Conflict(format!(
            "version {version_id} is {:?}, not draft",
            version.state
        )));
    }
    Ok(version)
}

/// Validate and upsert artifact entries under a draft version; each
/// digest must already be committed in this repo's upload history.
pub fn upsert_entries(
    store: &InMemoryMetadataStore,
    repo_id: &str,
    version_id: &str,
    entries: Vec<ArtifactEntryInput>,
) -> Result<Vec<ArtifactEntry>, VersionError> {
    let _guard = store.lock_row("versions", version_id, ROW_LOCK_TIMEOUT)?;
    require_draft(store, version_id)?;

    let mut seen_paths = HashSet::new();
    for entry in &entries {
        if entry.relative_path.is_empty() {
            return Err(VersionError::Validation("relative_path must not be empty".into()));
        }
        if !seen_paths.insert(entry.relative_path.clone()) {
            return Err(VersionError::Validation(format!(
                "duplicate relative_path in request: {}",
                entry.relative_path
            )));
        }
        if entry.size_bytes == 0 {
            return Err(VersionError::Validation(format!("{}: size_bytes must be > 0", entry.relative_path)));
        }
        if !is_valid_sha256_hex(&entry.blob_digest) {
            return Err(VersionError::Validation(format!(
                "{}: blob_digest must be 64 lowercase hex chars",
                entry.relative_path
            )));
        }
        if let Some(sha1) = &entry.checksum_sha1 {
            if !is_valid_sha1_hex(sha1) {
                return Err(VersionError::Validation(format!("{}: checksum_sha1 must be 40 hex chars", entry.relative_path)));
            }
        }
        if let Some(sha256) = &entry.checksum_sha256 {
            if !is_valid_sha256_hex(sha256) {
                return Err(VersionError::Validation(format!(
                    "{}: checksum_sha256 must be 64 hex chars",
                    entry.relative_path
                )));
            }
        }
        ensure_digest_committed(store, repo_id, &entry.blob_digest)?;
    }

    let mut inserted = Vec::with_capacity(entries.len());
    for entry in entries {
        let row = ArtifactEntry {
            version_id: version_id.to_string(),
            relative_path: entry.relative_path,
            blob_digest: entry.blob_digest,
            checksum_sha1: entry.checksum_sha1,
            checksum_sha256: entry.checksum_sha256,
            size_bytes: entry.size_bytes,
        };
        store.upsert_artifact_entry(row.clone());
        inserted.push(row);
    }
    Ok(inserted)
}

fn ensure_digest_committed(store: &InMemoryMetadataStore, repo_id: &str, digest: &str) -> Result<(), VersionError> {
    if !artifortress_blobindex::exists(store, digest) {
        return Err(VersionError::BlobNotFound(digest.to_string()));
    }
    if !artifortress_blobindex::is_committed_in_repo(store, repo_id, digest) {
        return Err(VersionError::DigestNotCommittedInRepo {
            repo_id: repo_id.to_string(),
            digest: digest.to_string(),
        });
    }
    Ok(())
}

fn required_manifest_fields(package_type: &str) -> &'static [&'static str] {
    match package_type {
        "nuget" => &["id", "version"],
        "npm" => &["name", "version"],
        "maven" => &["groupId", "artifactId", "version"],
        _ => &[],
    }
}

/// Validate and upsert a version's manifest document.
pub fn upsert_manifest(
    store: &InMemoryMetadataStore,
    repo_id: &str,
    package_type: &str,
    version_id: &str,
    document: serde_json::Value,
    manifest_blob_digest: Option<String>,
) -> Result<Manifest, VersionError> {
    let _guard = store.lock_row("versions", version_id, ROW_LOCK_TIMEOUT)?;
    require_draft(store, version_id)?;

    let object = document
        .as_object()
        .ok_or_else(|| VersionError::Validation("manifest document must be a JSON object".into()))?;
    for field in required_manifest_fields(package_type) {
        match object.get(*field) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => {}
            _ => return Err(VersionError::Validation(format!("manifest is missing required field '{field}'"))),
        }
    }

    if let Some(digest) = &manifest_blob_digest {
        if !is_valid_sha256_hex(digest) {
            return Err(VersionError::Validation("manifest_blob_digest must be 64 lowercase hex chars".into()));
        }
        ensure_digest_committed(store, repo_id, digest)?;
    }

    let manifest = Manifest {
        version_id: version_id.to_string(),
        document,
        manifest_blob_digest,
    };
    store.upsert_manifest(manifest.clone());
    Ok(manifest)
}

/// A publish call's result, matching the `idempotent`/`eventEmitted` pair a
/// router reports back: a fresh publish emits exactly one outbox event, a
/// replay of an already-published version emits none.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub version: PackageVersion,
    pub was_idempotent: bool,
    pub event_emitted: bool,
}

/// Publish a draft version; idempotent if already published.
pub fn publish(
    store: &InMemoryMetadataStore,
    tenant_id: &str,
    repo_id: &str,
    version_id: &str,
    now: DateTime<Utc>,
) -> Result<PublishOutcome, VersionError> {
    let _guard = store.lock_row("versions", version_id, ROW_LOCK_TIMEOUT)?;
    let version = store.get_version(version_id)?;
    match version.state {
        VersionState::Published => {
            return Ok(PublishOutcome {
                version,
                was_idempotent: true,
                event_emitted: false,
            });
        }
        VersionState::Draft => {}
        VersionState::Tombstoned => {
            return Err(VersionError::Conflict(format!("version {version_id} is tombstoned")));
        }
    }

    let entries = store.list_artifact_entries(version_id);
    if entries.is_empty() {
        return Err(VersionError::Conflict("at least one artifact entry is required to publish".into()));
    }
    let manifest = store
        .get_manifest(version_id)
        .ok_or_else(|| VersionError::Conflict("exactly one manifest is required to publish".into()))?;

    for entry in &entries {
        ensure_digest_committed(store, repo_id, &entry.blob_digest)?;
    }
    if let Some(digest) = &manifest.manifest_blob_digest {
        ensure_digest_committed(store, repo_id, digest)?;
    }

    let published = store.update_version(version_id, |v| {
        v.state = VersionState::Published;
        v.published_at = Some(v.published_at.unwrap_or(now));
    })?;

    let payload = serde_json::json!({
        "version_id": published.version_id,
        "repo_id": published.repo_id,
        "package_id": published.package_id,
        "version": published.version,
        "published_at": published.published_at,
    });
    store.insert_outbox_event(OutboxEvent {
        event_id: generate_id("evt"),
        tenant_id: tenant_id.to_string(),
        aggregate_type: "package_version".to_string(),
        aggregate_id: version_id.to_string(),
        event_type: "version.published".to_string(),
        payload,
        occurred_at: now,
        available_at: now,
        delivered_at: None,
    })?;

    store.append_audit_entry(AuditEntry {
        audit_id: generate_id("aud"),
        tenant_id: tenant_id.to_string(),
        actor: "system".to_string(),
        action: "version.publish".to_string(),
        resource_type: "package_version".to_string(),
        resource_id: version_id.to_string(),
        details: HashMap::from([("version".to_string(), published.version.clone())]),
        occurred_at: now,
    });

    tracing::info!(version_id = %version_id, repo_id = %repo_id, version = %published.version, "version published");
    Ok(PublishOutcome {
        version: published,
        was_idempotent: false,
        event_emitted: true,
    })
}

fn clamp_retention_days(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_RETENTION_DAYS).clamp(MIN_RETENTION_DAYS, MAX_RETENTION_DAYS)
}

/// Tombstone a draft or published version; idempotent if already
/// tombstoned.
pub fn tombstone(
    store: &InMemoryMetadataStore,
    tenant_id: &str,
    version_id: &str,
    reason: &str,
    deleted_by_subject: &str,
    retention_days: Option<i64>,
    now: DateTime<Utc>,
) -> Result<PackageVersion, VersionError> {
    let _guard = store.lock_row("versions", version_id, ROW_LOCK_TIMEOUT)?;
    let version = store.get_version(version_id)?;
    if version.state == VersionState::Tombstoned {
        return Ok(version);
    }

    let days = clamp_retention_days(retention_days);
    let updated = store.update_version(version_id, |v| {
        v.state = VersionState::Tombstoned;
        v.tombstoned_at = Some(now);
        v.tombstone_reason = Some(reason.to_string());
    })?;
    store.upsert_tombstone(Tombstone {
        version_id: version_id.to_string(),
        retention_until: now + chrono::Duration::days(days),
        reason: reason.to_string(),
        deleted_by_subject: deleted_by_subject.to_string(),
    });
    store.append_audit_entry(AuditEntry {
        audit_id: generate_id("aud"),
        tenant_id: tenant_id.to_string(),
        actor: deleted_by_subject.to_string(),
        action: "version.tombstone".to_string(),
        resource_type: "package_version".to_string(),
        resource_id: version_id.to_string(),
        details: HashMap::from([("reason".to_string(), reason.to_string())]),
        occurred_at: now,
    });
    tracing::info!(version_id = %version_id, reason = %reason, retention_days = days, "version tombstoned");
    Ok(updated)
}
