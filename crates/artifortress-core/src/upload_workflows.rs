//! `/v1/repos/{repo_key}/uploads/*` and the blob `GET` route: role-checked
//! wrappers around `artifortress_upload`, plus the
//! quarantine-lock check that gates reading blob bytes back out.

use std::time::Duration;

use artifortress_auth::{Principal, has_role};
use artifortress_objectstore::{ByteRange, CompletedPart, DownloadedObject};
use artifortress_types::{ArtifortressError, Repository, Role, UploadSession};
use chrono::{DateTime, Utc};

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

/// `POST /v1/repos/{repo_key}/uploads`: `write` role required.
pub fn create_upload(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    expected_digest: &str,
    expected_length: u64,
    now: DateTime<Utc>,
) -> Result<artifortress_upload::CreatedUpload, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    let repo = resolve_repo(state, tenant_id, repo_key)?;
    Ok(artifortress_upload::create_upload(
        &state.metastore,
        state.object_store.as_ref(),
        &state.upload,
        tenant_id,
        &repo.repo_id,
        &repo.repo_key,
        expected_digest,
        expected_length,
        now,
    )?)
}

/// `POST /v1/repos/{repo_key}/uploads/{upload_id}/parts/{part_number}`:
/// `write` role required.
pub fn presign_part(
    state: &AppState,
    principal: &Principal,
    repo_key: &str,
    upload_id: &str,
    part_number: u32,
    requested_ttl: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<artifortress_upload::PresignedPartUrl, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    Ok(artifortress_upload::presign_part(
        &state.metastore,
        state.object_store.as_ref(),
        &state.upload,
        upload_id,
        part_number,
        requested_ttl,
        now,
    )?)
}

/// `POST /v1/repos/{repo_key}/uploads/{upload_id}/complete`: `write` role required.
pub fn complete_upload(
    state: &AppState,
    principal: &Principal,
    repo_key: &str,
    upload_id: &str,
    parts: &[CompletedPart],
    now: DateTime<Utc>,
) -> Result<UploadSession, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    Ok(artifortress_upload::complete_upload(&state.metastore, state.object_store.as_ref(), upload_id, parts, now)?)
}

/// `POST /v1/repos/{repo_key}/uploads/{upload_id}/abort`: `write` role required.
pub fn abort_upload(
    state: &AppState,
    principal: &Principal,
    repo_key: &str,
    upload_id: &str,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<UploadSession, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    Ok(artifortress_upload::abort_upload(&state.metastore, state.object_store.as_ref(), upload_id, reason, now)?)
}

/// `POST /v1/repos/{repo_key}/uploads/{upload_id}/commit`: `write` role required.
pub fn commit_upload(
    state: &AppState,
    principal: &Principal,
    repo_key: &str,
    upload_id: &str,
    now: DateTime<Utc>,
) -> Result<UploadSession, ArtifortressError> {
    require_role(principal, repo_key, Role::Write)?;
    Ok(artifortress_upload::commit_upload(&state.metastore, state.object_store.as_ref(), upload_id, now)?)
}

/// `GET /v1/repos/{repo_key}/blobs/{digest}`: `read` role required, then a
/// quarantine check ("reads of a quarantined digest return 423
/// locked") before the bytes are ever streamed back.
pub fn get_blob(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    digest: &str,
    byte_range: Option<ByteRange>,
) -> Result<DownloadedObject, ArtifortressError> {
    require_role(principal, repo_key, Role::Read)?;
    let repo = resolve_repo(state, tenant_id, repo_key)?;

    if artifortress_policy::is_digest_locked(&state.metastore, &repo.repo_id, digest) {
        tracing::warn!(digest = %digest, repo_key = %repo_key, "suppressing read of quarantined blob");
        return Err(ArtifortressError::Locked {
            reason: format!("digest {digest} is quarantined in repo {repo_key}"),
        });
    }

    let storage_key = artifortress_blobindex::storage_key(&state.metastore, digest)
        .ok_or_else(|| ArtifortressError::not_found(format!("blob {digest}")))?;
    Ok(state.object_store.download(&storage_key, byte_range)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_auth::PrincipalSource;
    use artifortress_metastore::InMemoryMetadataStore;
    use artifortress_objectstore::InMemoryObjectStore;
    use artifortress_types::{PolicyAction, PolicyDecision, RepoType, Scope};
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(InMemoryMetadataStore::new()), Arc::new(InMemoryObjectStore::new()))
    }

    fn principal(scopes: &[&str]) -> Principal {
        Principal {
            subject: "alice".into(),
            tenant_id: "tenant-a".into(),
            scopes: scopes.iter().map(|s| Scope::parse(s).unwrap()).collect(),
            source: PrincipalSource::PersonalAccessToken,
        }
    }

    fn seed_repo(state: &AppState, repo_key: &str) -> Repository {
        let repo = Repository {
            repo_id: format!("repo-{repo_key}"),
            tenant_id: "tenant-a".into(),
            repo_key: repo_key.to_string(),
            repo_type: RepoType::Local,
            upstream_url: None,
            virtual_members: vec![],
            created_at: Utc::now(),
        };
        state.metastore.insert_repository(repo.clone()).unwrap();
        repo
    }

    #[test]
    fn read_only_principal_cannot_create_uploads() {
        let state = state();
        seed_repo(&state, "lib");
        let reader = principal(&["lib:read"]);
        let err = create_upload(&state, &reader, "tenant-a", "lib", &"a".repeat(64), 10, Utc::now()).unwrap_err();
        assert!(matches!(err, ArtifortressError::Forbidden { .. }));
    }

    #[test]
    fn writer_creates_and_aborts_an_upload() {
        let state = state();
        seed_repo(&state, "lib");
        let writer = principal(&["lib:write"]);
        let created = create_upload(&state, &writer, "tenant-a", "lib", &"a".repeat(64), 10, Utc::now()).unwrap();
        assert!(!created.deduped);
        let aborted = abort_upload(&state, &writer, "lib", &created.session.upload_id, Some("test"), Utc::now()).unwrap();
        assert_eq!(aborted.upload_id, created.session.upload_id);
    }

    #[test]
    fn get_blob_returns_locked_when_digest_is_quarantined() {
        let state = state();
        let repo = seed_repo(&state, "lib");
        let digest = "b".repeat(64);
        state.metastore.upsert_blob(&digest, 3, "blobs/b", None).unwrap();

        let now = Utc::now();
        let version = artifortress_versions::create_or_reuse_draft(&state.metastore, &repo.repo_id, "npm", None, "widget", "1.0.0", now).unwrap();
        state.metastore.upsert_artifact_entry(artifortress_types::ArtifactEntry {
            version_id: version.version_id.clone(),
            relative_path: "a.txt".into(),
            blob_digest: digest.clone(),
            checksum_sha1: None,
            checksum_sha256: None,
            size_bytes: 3,
        });
        artifortress_policy::evaluate_and_persist(
            &state.metastore,
            "tenant-a",
            &repo.repo_id,
            &version.version_id,
            PolicyAction::Publish,
            Some(PolicyDecision::Quarantine),
            None,
            Duration::from_millis(250),
            "alice",
            now,
        )
        .unwrap();

        let reader = principal(&["lib:read"]);
        let err = get_blob(&state, &reader, "tenant-a", "lib", &digest, None).unwrap_err();
        assert!(matches!(err, ArtifortressError::Locked { .. }));
    }

    #[test]
    fn get_blob_not_found_for_unknown_digest() {
        let state = state();
        seed_repo(&state, "lib");
        let reader = principal(&["lib:read"]);
        let err = get_blob(&state, &reader, "tenant-a", "lib", &"c".repeat(64), None).unwrap_err();
        assert!(matches!(err, ArtifortressError::NotFound { .. }));
    }
}
