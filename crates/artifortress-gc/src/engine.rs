use std::collections::HashSet;

use artifortress_metastore::InMemoryMetadataStore;
use artifortress_objectstore::ObjectStore;
use artifortress_types::{Blob, GcCounters, GcMode, GcRun, VersionState};
use chrono::{DateTime, Utc};
use rand::RngExt;
use rand::distr::Alphanumeric;

use crate::config::GcConfig;
use crate::error::GcError;

fn generate_run_id() -> String {
    let suffix: String = rand::rng().sample_iter(&Alphanumeric).take(20).map(char::from).collect();
    format!("gc-{suffix}")
}

pub fn start_run(store: &InMemoryMetadataStore, mode: GcMode, now: DateTime<Utc>) -> GcRun {
    let run = GcRun {
        run_id: generate_run_id(),
        mode,
        counters: GcCounters::default(),
        started_at: now,
        completed_at: None,
        failed: false,
    };
    store.insert_gc_run(run.clone());
    run
}

fn is_live(store: &InMemoryMetadataStore, version_id: &str, now: DateTime<Utc>) -> bool {
    let Ok(version) = store.get_version(version_id) else {
        return false;
    };
    if version.state != VersionState::Tombstoned {
        return true;
    }
    store
        .get_tombstone(version_id)
        .map(|tombstone| now < tombstone.retention_until)
        .unwrap_or(false)
}

/// Materializes the root set: every digest reachable from a live
/// artifact entry or manifest.
pub fn mark_root_set(store: &InMemoryMetadataStore, run_id: &str, now: DateTime<Utc>) {
    for entry in store.all_artifact_entries() {
        if is_live(store, &entry.version_id, now) {
            store.mark_digest_reachable(run_id, &entry.blob_digest);
        }
    }
    for manifest in store.all_manifests() {
        if let Some(digest) = manifest.manifest_blob_digest {
            if is_live(store, &manifest.version_id, now) {
                store.mark_digest_reachable(run_id, &digest);
            }
        }
    }
}

/// Candidate blobs for deletion: old enough, unmarked, and not
/// referenced by any artifact entry or manifest row at all (a stronger
/// check than the liveness-aware root set, to avoid racing a row that
/// still exists).
pub fn select_candidates(store: &InMemoryMetadataStore, run_id: &str, config: &GcConfig, now: DateTime<Utc>) -> Vec<Blob> {
    let referenced: HashSet<String> = store
        .all_artifact_entries()
        .into_iter()
        .map(|e| e.blob_digest)
        .chain(store.all_manifests().into_iter().filter_map(|m| m.manifest_blob_digest))
        .collect();

    let cutoff = now - chrono::Duration::hours(config.grace_hours as i64);
    let mut candidates: Vec<Blob> = store
        .all_blob_digests()
        .into_iter()
        .filter_map(|digest| store.get_blob(&digest))
        .filter(|blob| blob.created_at <= cutoff)
        .filter(|blob| !store.is_digest_marked(run_id, &blob.digest))
        .filter(|blob| !referenced.contains(&blob.digest))
        .collect();
    candidates.sort_by_key(|blob| blob.created_at);
    candidates.truncate(config.batch_size as usize);
    candidates
}

/// Runs a full GC pass: mark, select, and (in execute mode) delete.
/// Dry-run performs the same selection without touching either store.
pub fn run(
    store: &InMemoryMetadataStore,
    object_store: &dyn ObjectStore,
    run_id: &str,
    config: &GcConfig,
    now: DateTime<Utc>,
) -> Result<GcRun, GcError> {
    mark_root_set(store, run_id, now);
    let candidates = select_candidates(store, run_id, config, now);
    let run = store.get_gc_run(run_id)?;

    let marked = store.marked_count(run_id);
    let candidate_count = candidates.len() as u64;

    let (deleted_blobs, delete_errors) = match run.mode {
        GcMode::DryRun => (0, 0),
        GcMode::Execute => {
            let mut deleted = 0u64;
            let mut errors = 0u64;
            for blob in &candidates {
                match object_store.delete(&blob.storage_key) {
                    Ok(()) => {
                        // Metadata delete only after the bytes are gone.
                        store.clear_committed_blob_digest(&blob.digest);
                        store.delete_blob(&blob.digest);
                        deleted += 1;
                    }
                    Err(err) => {
                        tracing::warn!(digest = %blob.digest, storage_key = %blob.storage_key, error = %err, "object store delete failed, keeping blob row");
                        errors += 1;
                    }
                }
            }
            (deleted, errors)
        }
    };

    let deleted_versions = if run.mode == GcMode::Execute {
        let mut count = 0u64;
        for tombstone in store.all_tombstones() {
            if now >= tombstone.retention_until {
                store.delete_version(&tombstone.version_id);
                count += 1;
            }
        }
        count
    } else {
        store.all_tombstones().iter().filter(|t| now >= t.retention_until).count() as u64
    };

    let failed = delete_errors > 0;
    let updated = store.update_gc_run(run_id, |r| {
        r.counters = GcCounters {
            marked,
            candidate_blob_count: candidate_count,
            deleted_blob_count: deleted_blobs,
            deleted_version_count: deleted_versions,
            delete_error_count: delete_errors,
        };
        r.completed_at = Some(now);
        r.failed = failed;
    })?;
    tracing::info!(
        run_id = %run_id,
        mode = ?updated.mode,
        marked,
        candidates = candidate_count,
        deleted_blobs,
        deleted_versions,
        delete_errors,
        "gc run finalized"
    );
    Ok(updated)
}
