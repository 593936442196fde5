//! Shared scenario seeding for every subcommand: an upload, a draft, and a
//! published version, all against an in-process `InMemoryObjectStore`.
//! Mirrors the blob-to-published-version path a real tenant would drive
//! through an HTTP surface, collapsed into one in-process call chain since
//! this CLI has no server to talk to.

use std::sync::Arc;

use anyhow::{Context, Result};
use artifortress_auth::Principal;
use artifortress_objectstore::{CompletedPart, InMemoryObjectStore};
use artifortress_types::{PackageVersion, Repository};
use artifortress_versions::ArtifactEntryInput;
use chrono::Utc;
use sha2::{Digest, Sha256};

const DEMO_PAYLOAD: &[u8] = b"artifortress demo artifact contents";

fn digest_of(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn upload_and_publish(
    state: &artifortress_core::AppState,
    object_store: &Arc<InMemoryObjectStore>,
    admin: &Principal,
    tenant_id: &str,
    repo: &Repository,
    version: &str,
) -> Result<PackageVersion> {
    let digest = digest_of(DEMO_PAYLOAD);
    let now = Utc::now();

    let created = artifortress_core::create_upload(state, admin, tenant_id, &repo.repo_key, &digest, DEMO_PAYLOAD.len() as u64, now)
        .context("creating upload session")?;
    let session = created.session;

    if !created.deduped {
        let key = session.object_staging_key.as_deref().context("upload session missing a staging key")?;
        let storage_upload_id = session.storage_upload_id.as_deref().context("upload session missing a storage upload id")?;
        let etag = object_store.put_part(key, storage_upload_id, 1, DEMO_PAYLOAD.to_vec()).context("writing the demo part")?;

        artifortress_core::complete_upload(state, admin, &repo.repo_key, &session.upload_id, &[CompletedPart { part_number: 1, etag }], Utc::now())
            .context("completing upload")?;
        artifortress_core::commit_upload(state, admin, &repo.repo_key, &session.upload_id, Utc::now()).context("committing upload")?;
    }

    let draft = artifortress_core::create_or_reuse_draft(state, admin, tenant_id, &repo.repo_key, "generic", None, "widget", version, Utc::now())
        .context("creating draft version")?;

    artifortress_core::upsert_version_entries(
        state,
        admin,
        &repo.repo_key,
        &repo.repo_id,
        &draft.version_id,
        vec![ArtifactEntryInput {
            relative_path: "widget.tar.gz".to_string(),
            blob_digest: digest.clone(),
            checksum_sha1: None,
            checksum_sha256: Some(digest.clone()),
            size_bytes: DEMO_PAYLOAD.len() as u64,
        }],
    )
    .context("upserting entries")?;

    artifortress_core::upsert_manifest(
        state,
        admin,
        &repo.repo_key,
        &repo.repo_id,
        "generic",
        &draft.version_id,
        serde_json::json!({"name": "widget", "version": version}),
        None,
    )
    .context("upserting manifest")?;

    let outcome = artifortress_core::publish(state, admin, tenant_id, &repo.repo_key, &repo.repo_id, &draft.version_id, Utc::now())
        .context("publishing version")?;
    Ok(outcome.version)
}
