use std::collections::BTreeMap;
use std::time::Duration;

use artifortress_metastore::InMemoryMetadataStore;
use artifortress_objectstore::{ByteRange, CompletedPart, ObjectStore};
use artifortress_types::digest::is_valid_sha256_hex;
use artifortress_types::{UploadSession, UploadState};
use chrono::{DateTime, Utc};
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::config::UploadConfig;
use crate::error::{UploadError, VerificationFailure, VerificationFailureReason};

const COMMIT_CHUNK_SIZE: usize = 64 * 1024;

fn generate_upload_id() -> String {
    hex::encode(rand::rng().random::<[u8; 16]>())
}

/// A create-session result; `deduped` marks the path that never touched
/// the object store because the bytes were already committed.
#[derive(Debug, Clone)]
pub struct CreatedUpload {
    pub session: UploadSession,
    pub deduped: bool,
}

/// "Create": dedupes against an existing blob of the same digest and
/// length before ever touching the object store.
#[allow(clippy::too_many_arguments)]
pub fn create_upload(
    store: &InMemoryMetadataStore,
    object_store: &dyn ObjectStore,
    config: &UploadConfig,
    tenant_id: &str,
    repo_id: &str,
    repo_key: &str,
    expected_digest: &str,
    expected_length: u64,
    now: DateTime<Utc>,
) -> Result<CreatedUpload, UploadError> {
    if !is_valid_sha256_hex(expected_digest) {
        return Err(UploadError::Validation("expected_digest must be 64 lowercase hex chars".into()));
    }
    if expected_length == 0 {
        return Err(UploadError::Validation("expected_length must be > 0".into()));
    }

    let upload_id = generate_upload_id();

    if let Some(existing_blob) = store.get_blob(expected_digest) {
        if existing_blob.length != expected_length {
            return Err(UploadError::DigestLengthMismatch {
                digest: expected_digest.to_string(),
                existing_length: existing_blob.length,
                requested_length: expected_length,
            });
        }
        let session = UploadSession {
            upload_id,
            tenant_id: tenant_id.to_string(),
            repo_id: repo_id.to_string(),
            expected_digest: expected_digest.to_string(),
            expected_length,
            state: UploadState::Committed,
            object_staging_key: None,
            storage_upload_id: None,
            committed_blob_digest: Some(expected_digest.to_string()),
            created_at: now,
            expires_at: now + chrono::Duration::from_std(config.session_ttl).unwrap_or_default(),
            updated_at: now,
            aborted_at: None,
            aborted_reason: None,
            committed_at: Some(now),
        };
        store.insert_upload_session(session.clone())?;
        tracing::debug!(upload_id = %session.upload_id, digest = %expected_digest, "deduplicated upload against existing blob");
        return Ok(CreatedUpload { session, deduped: true });
    }

    let staging_key = format!("staging/{tenant_id}/{repo_key}/{upload_id}");
    let multipart = object_store.start_multipart(&staging_key)?;
    let session = UploadSession {
        upload_id,
        tenant_id: tenant_id.to_string(),
        repo_id: repo_id.to_string(),
        expected_digest: expected_digest.to_string(),
        expected_length,
        state: UploadState::Initiated,
        object_staging_key: Some(staging_key),
        storage_upload_id: Some(multipart.storage_upload_id),
        committed_blob_digest: None,
        created_at: now,
        expires_at: now + chrono::Duration::from_std(config.session_ttl).unwrap_or_default(),
        updated_at: now,
        aborted_at: None,
        aborted_reason: None,
        committed_at: None,
    };
    store.insert_upload_session(session.clone())?;
    tracing::debug!(upload_id = %session.upload_id, tenant_id = %tenant_id, repo_id = %repo_id, "upload session initiated");
    Ok(CreatedUpload { session, deduped: false })
}

pub struct PresignedPartUrl {
    pub url: String,
    pub part_number: u32,
    pub expires_at: DateTime<Utc>,
}

/// "Presign part".
pub fn presign_part(
    store: &InMemoryMetadataStore,
    object_store: &dyn ObjectStore,
    config: &UploadConfig,
    upload_id: &str,
    part_number: u32,
    requested_ttl: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<PresignedPartUrl, UploadError> {
    let session = store.get_upload_session(upload_id)?;
    if session.is_expired(now) {
        return Err(UploadError::Conflict("upload session has expired".into()));
    }
    if !matches!(session.state, UploadState::Initiated | UploadState::PartsUploading) {
        return Err(UploadError::Conflict(format!(
            "cannot presign a part in state {:?}",
            session.state
        )));
    }
    let key = session
        .object_staging_key
        .as_deref()
        .ok_or_else(|| UploadError::Conflict("session has no staging key".into()))?;
    let storage_upload_id = session
        .storage_upload_id
        .as_deref()
        .ok_or_else(|| UploadError::Conflict("session has no multipart upload".into()))?;

    let ttl = config.clamp_presign_ttl(requested_ttl);
    let presigned = object_store.presign_part(key, storage_upload_id, part_number, ttl)?;

    if session.state == UploadState::Initiated {
        // Losing this race means another presign already advanced the state.
        let _ = store.transition_upload_state(upload_id, UploadState::Initiated, |s| {
            s.state = UploadState::PartsUploading;
        });
        tracing::debug!(upload_id = %upload_id, "upload session accepting parts");
    }

    Ok(PresignedPartUrl {
        url: presigned.url,
        part_number: presigned.part_number,
        expires_at: presigned.expires_at,
    })
}

/// "Complete": validates, dedupes by part number, sorts ascending. ETags
/// arrive quoted from S3-style clients; the quotes are not part of the tag.
pub fn complete_upload(
    store: &InMemoryMetadataStore,
    object_store: &dyn ObjectStore,
    upload_id: &str,
    parts: &[CompletedPart],
    now: DateTime<Utc>,
) -> Result<UploadSession, UploadError> {
    let session = store.get_upload_session(upload_id)?;
    match session.state {
        UploadState::PendingCommit | UploadState::Committed => return Ok(session),
        UploadState::Initiated => {
            return Err(UploadError::Conflict("no parts uploaded yet".into()));
        }
        UploadState::Aborted => {
            return Err(UploadError::Conflict("upload session is aborted".into()));
        }
        UploadState::PartsUploading => {}
    }
    if session.is_expired(now) {
        return Err(UploadError::Conflict("upload session has expired".into()));
    }

    let mut deduped: BTreeMap<u32, String> = BTreeMap::new();
    for part in parts {
        if part.part_number < 1 {
            return Err(UploadError::Validation("part_number must be >= 1".into()));
        }
        let etag = part.etag.trim_matches('"');
        if etag.is_empty() {
            return Err(UploadError::Validation("etag must not be empty".into()));
        }
        deduped.insert(part.part_number, etag.to_string());
    }
    let sorted_parts: Vec<CompletedPart> = deduped
        .into_iter()
        .map(|(part_number, etag)| CompletedPart { part_number, etag })
        .collect();

    let key = session.object_staging_key.as_deref().unwrap_or_default();
    let storage_upload_id = session.storage_upload_id.as_deref().unwrap_or_default();
    object_store.complete_multipart(key, storage_upload_id, &sorted_parts)?;

    let updated = store
        .transition_upload_state(upload_id, UploadState::PartsUploading, |s| {
            s.state = UploadState::PendingCommit;
        })?
        .ok_or(UploadError::RaceLost)?;
    tracing::debug!(upload_id = %upload_id, parts = sorted_parts.len(), "upload session pending commit");
    Ok(updated)
}

/// "Abort".
pub fn abort_upload(
    store: &InMemoryMetadataStore,
    object_store: &dyn ObjectStore,
    upload_id: &str,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<UploadSession, UploadError> {
    let session = store.get_upload_session(upload_id)?;
    if session.state == UploadState::Aborted {
        return Ok(session);
    }
    if session.state == UploadState::Committed {
        return Err(UploadError::Conflict("cannot abort a committed upload".into()));
    }

    if let Some(storage_upload_id) = &session.storage_upload_id {
        let key = session.object_staging_key.as_deref().unwrap_or_default();
        object_store.abort_multipart(key, storage_upload_id)?;
    }

    let reason = reason.unwrap_or("client_abort").to_string();
    let expected = session.state;
    let updated = store
        .transition_upload_state(upload_id, expected, |s| {
            s.state = UploadState::Aborted;
            s.aborted_at = Some(now);
            s.aborted_reason = Some(reason.clone());
        })?
        .ok_or(UploadError::RaceLost)?;
    tracing::debug!(upload_id = %upload_id, reason = %reason, "upload session aborted");
    Ok(updated)
}

/// "Commit": recomputes the digest and length over the staged
/// object, streamed in 64 KiB chunks regardless of the in-memory
/// reference store holding the whole object in one buffer — the chunking
/// loop is what a real network-backed store requires.
pub fn commit_upload(
    store: &InMemoryMetadataStore,
    object_store: &dyn ObjectStore,
    upload_id: &str,
    now: DateTime<Utc>,
) -> Result<UploadSession, UploadError> {
    let session = store.get_upload_session(upload_id)?;
    if session.state == UploadState::Committed {
        return Ok(session);
    }
    if session.state != UploadState::PendingCommit {
        return Err(UploadError::Conflict(format!(
            "cannot commit from state {:?}",
            session.state
        )));
    }
    if session.is_expired(now) {
        return Err(UploadError::Conflict("upload session has expired".into()));
    }

    let key = session.object_staging_key.clone().unwrap_or_default();
    let downloaded = object_store.download(&key, None::<ByteRange>)?;

    let mut hasher = Sha256::new();
    let mut actual_length: u64 = 0;
    for chunk in downloaded.bytes.chunks(COMMIT_CHUNK_SIZE) {
        hasher.update(chunk);
        actual_length += chunk.len() as u64;
    }
    let actual_digest = hex::encode(hasher.finalize());

    let digest_mismatch = actual_digest != session.expected_digest;
    let length_mismatch = actual_length != session.expected_length;

    if digest_mismatch || length_mismatch {
        // Digest wins when both differ.
        let reason = if digest_mismatch {
            VerificationFailureReason::DigestMismatch
        } else {
            VerificationFailureReason::LengthMismatch
        };
        let failure = VerificationFailure {
            expected_digest: session.expected_digest.clone(),
            actual_digest: actual_digest.clone(),
            expected_length: session.expected_length,
            actual_length,
            reason,
        };
        tracing::warn!(
            upload_id = %upload_id,
            expected_digest = %failure.expected_digest,
            actual_digest = %failure.actual_digest,
            "upload verification failed"
        );
        let _ = store.transition_upload_state(upload_id, UploadState::PendingCommit, |s| {
            s.state = UploadState::Aborted;
            s.aborted_at = Some(now);
            s.aborted_reason = Some(reason.as_str().to_string());
        });
        return Err(UploadError::VerificationFailed(failure));
    }

    store.upsert_blob(&session.expected_digest, actual_length, &key, downloaded.etag.clone())?;

    let updated = store
        .transition_upload_state(upload_id, UploadState::PendingCommit, |s| {
            s.state = UploadState::Committed;
            s.committed_blob_digest = Some(session.expected_digest.clone());
            s.committed_at = Some(now);
        })?
        .ok_or(UploadError::RaceLost)?;
    tracing::info!(upload_id = %upload_id, digest = %session.expected_digest, length = actual_length, "upload session committed");
    Ok(updated)
}
