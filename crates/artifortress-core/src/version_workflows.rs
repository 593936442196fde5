//! `/v1/repos/{repo_key}/packages/*` workflows: draft
//! assembly, entries, manifest, publish, and tombstone, wrapping
//! `artifortress_versions` with repo-key role checks.

use artifortress_auth::{Principal, has_role};
use artifortress_types::{ArtifortressError, Manifest, PackageVersion, Repository, Role};
use artifortress_versions::PublishOutcome;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::state::AppState;

fn require_role(principal: &Principal, repo_key: &str, required: Role) -> Result<(), ArtifortressError> {
    if has_role(&principal.scopes, repo_key, required) {
        Ok(())
    } else {
        Err(ArtifortressError::Forbidden {
            repo_key: repo_key.to_string(),
            required: required.as_str(),
        })
    }
}

fn resolve_repo(state: &AppState, tenant_id: &str, repo_key: &str) -> Result<Repository, ArtifortressError> {
    Ok(state.metastore.find_repository_by_key(tenant_id, repo_key)?)
}

/// `POST /v1/repos/{repo_key}/packages`: `write` role required.
#[allow(clippy::too_many_arguments)]
pub fn create_or_reuse_draft(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    package_type: &str,
    namespace: Option<&str>,
    name: &str,
    version: &str,
    now: DateTime<Utc>,
) -> Result<PackageVersion, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    let repo = resolve_repo(state, tenant_id, repo_key)?;
    Ok(artifortress_versions::create_or_reuse_draft(
        &state.metastore,
        &repo.repo_id,
        package_type,
        namespace,
        name,
        version,
        now,
    )?)
}

/// `PUT /v1/repos/{repo_key}/packages/{version_id}/entries`: `write` role required.
pub fn upsert_entries(
    state: &AppState,
    principal: &Principal,
    repo_key: &str,
    repo_id: &str,
    version_id: &str,
    entries: Vec<artifortress_versions::ArtifactEntryInput>,
) -> Result<Vec<artifortress_types::ArtifactEntry>, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    Ok(artifortress_versions::upsert_entries(&state.metastore, repo_id, version_id, entries)?)
}

/// `PUT /v1/repos/{repo_key}/packages/{version_id}/manifest`: `write` role required.
pub fn upsert_manifest(
    state: &AppState,
    principal: &Principal,
    repo_key: &str,
    repo_id: &str,
    package_type: &str,
    version_id: &str,
    document: Value,
    manifest_blob_digest: Option<String>,
) -> Result<Manifest, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    Ok(artifortress_versions::upsert_manifest(
        &state.metastore,
        repo_id,
        package_type,
        version_id,
        document,
        manifest_blob_digest,
    )?)
}

/// `POST /v1/repos/{repo_key}/packages/{version_id}/publish`: `promote` role required.
pub fn publish(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    repo_id: &str,
    version_id: &str,
    now: DateTime<Utc>,
) -> Result<PublishOutcome, ArtifortressError> {
    require_role(principal, repo_key, Role::Promote)?;
    Ok(artifortress_versions::publish(&state.metastore, tenant_id, repo_id, version_id, now)?)
}

/// `POST /v1/repos/{repo_key}/packages/{version_id}/tombstone`: `promote` role required.
#[allow(clippy::too_many_arguments)]
pub fn tombstone(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    version_id: &str,
    reason: &str,
    retention_days: Option<i64>,
    now: DateTime<Utc>,
) -> Result<PackageVersion, ArtifortressError> {
    require_role(principal, repo_key, Role::Promote)?;
    Ok(artifortress_versions::tombstone(
        &state.metastore,
        tenant_id,
        version_id,
        reason,
        &principal.subject,
        retention_days,
        now,
    )?)
}

/// `GET /v1/repos/{repo_key}/packages/{version_id}/manifest`: `read` role required.
pub fn get_manifest(state: &AppState, principal: &Principal, repo_key: &str, version_id: &str) -> Result<Manifest, ArtifortressError> {
    require_role(principal, repo_key, Role::Read)?;
    state
        .metastore
        .get_manifest(version_id)
        .ok_or_else(|| ArtifortressError::not_found(format!("manifest for version {version_id}")))
}
