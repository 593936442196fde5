//! Read-only reconciliation and ops summary: consistency checks
//! that never mutate state, plus counters an operator dashboard polls.
//! Nothing here repairs what it finds — that's GC's job for orphan
//! blobs and a human's job for everything else.

use artifortress_metastore::InMemoryMetadataStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

const SAMPLE_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct MissingBlobRef {
    pub version_id: String,
    pub relative_path: Option<String>,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ConsistencyReport {
    pub missing_artifact_blob_ref_count: usize,
    pub missing_artifact_blob_ref_sample: Vec<MissingBlobRef>,
    pub missing_manifest_blob_ref_count: usize,
    pub missing_manifest_blob_ref_sample: Vec<MissingBlobRef>,
    pub orphan_blob_count: usize,
    pub orphan_blob_sample: Vec<String>,
}

fn push_sample<T>(sample: &mut Vec<T>, count: &mut usize, item: T) {
    *count += 1;
    if sample.len() < SAMPLE_LIMIT {
        sample.push(item);
    }
}

/// Scans every artifact entry and manifest row for a blob digest that
/// has no matching `Blob` row, and every blob digest that no entry or
/// manifest references at all.
pub fn check_consistency(store: &InMemoryMetadataStore) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();
    let mut referenced: HashSet<String> = HashSet::new();

    for entry in store.all_artifact_entries() {
        referenced.insert(entry.blob_digest.clone());
        if store.get_blob(&entry.blob_digest).is_none() {
            push_sample(
                &mut report.missing_artifact_blob_ref_sample,
                &mut report.missing_artifact_blob_ref_count,
                MissingBlobRef {
                    version_id: entry.version_id,
                    relative_path: Some(entry.relative_path),
                    digest: entry.blob_digest,
                },
            );
        }
    }

    for manifest in store.all_manifests() {
        if let Some(digest) = manifest.manifest_blob_digest {
            referenced.insert(digest.clone());
            if store.get_blob(&digest).is_none() {
                push_sample(
                    &mut report.missing_manifest_blob_ref_sample,
                    &mut report.missing_manifest_blob_ref_count,
                    MissingBlobRef {
                        version_id: manifest.version_id,
                        relative_path: None,
                        digest,
                    },
                );
            }
        }
    }

    for digest in store.all_blob_digests() {
        if !referenced.contains(&digest) {
            push_sample(&mut report.orphan_blob_sample, &mut report.orphan_blob_count, digest);
        }
    }

    tracing::debug!(
        missing_artifact_refs = report.missing_artifact_blob_ref_count,
        missing_manifest_refs = report.missing_manifest_blob_ref_count,
        orphan_blobs = report.orphan_blob_count,
        "consistency report built"
    );
    report
}

#[derive(Debug, Clone, Serialize)]
pub struct OpsSummary {
    pub pending_outbox_count: usize,
    pub available_now_outbox_count: usize,
    pub oldest_pending_outbox_age_seconds: Option<i64>,
    /// Search indexing is out of scope; this implementation never
    /// enqueues a search job, so these are always zero.
    pub pending_search_jobs: u64,
    pub failed_search_jobs: u64,
    pub incomplete_gc_run_count: usize,
    pub recent_policy_timeout_count: usize,
}

/// Operational counters an ops dashboard polls. `now` drives both the
/// "available now" outbox split and the 24h policy-timeout window.
pub fn ops_summary(store: &InMemoryMetadataStore, now: DateTime<Utc>) -> OpsSummary {
    let pending = store.list_unpublished_outbox_events();
    let available_now_count = pending.iter().filter(|e| e.available_at <= now).count();
    let oldest_pending_age = pending.iter().map(|e| (now - e.occurred_at).num_seconds()).max();

    let incomplete_gc_runs = store.all_gc_runs().into_iter().filter(|r| r.completed_at.is_none()).count();

    let window_start = now - Duration::hours(24);
    let recent_timeouts = store
        .all_audit_entries()
        .into_iter()
        .filter(|e| e.action == "policy.timeout" && e.occurred_at >= window_start && e.occurred_at <= now)
        .count();

    OpsSummary {
        pending_outbox_count: pending.len(),
        available_now_outbox_count: available_now_count,
        oldest_pending_outbox_age_seconds: oldest_pending_age,
        pending_search_jobs: 0,
        failed_search_jobs: 0,
        incomplete_gc_run_count: incomplete_gc_runs,
        recent_policy_timeout_count: recent_timeouts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_types::{ArtifactEntry, AuditEntry, GcCounters, GcMode, GcRun, Manifest, OutboxEvent};
    use std::collections::HashMap;

    #[test]
    fn consistency_report_flags_missing_blob_and_orphan() {
        let store = InMemoryMetadataStore::new();
        store
            .upsert_blob(&"a".repeat(64), 10, "blobs/a", None)
            .unwrap();

        store.upsert_artifact_entry(ArtifactEntry {
            version_id: "ver-1".into(),
            relative_path: "x.txt".into(),
            blob_digest: "b".repeat(64),
            checksum_sha1: None,
            checksum_sha256: None,
            size_bytes: 10,
        });

        let report = check_consistency(&store);
        assert_eq!(report.missing_artifact_blob_ref_count, 1);
        assert_eq!(report.missing_artifact_blob_ref_sample[0].digest, "b".repeat(64));
        assert_eq!(report.orphan_blob_count, 1);
        assert_eq!(report.orphan_blob_sample[0], "a".repeat(64));
    }

    #[test]
    fn consistency_report_flags_missing_manifest_blob() {
        let store = InMemoryMetadataStore::new();
        store.upsert_manifest(Manifest {
            version_id: "ver-1".into(),
            document: serde_json::json!({"name": "widget"}),
            manifest_blob_digest: Some("c".repeat(64)),
        });

        let report = check_consistency(&store);
        assert_eq!(report.missing_manifest_blob_ref_count, 1);
        assert_eq!(report.missing_manifest_blob_ref_sample[0].version_id, "ver-1");
    }

    #[test]
    fn ops_summary_counts_pending_and_incomplete_runs() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();

        store
            .insert_outbox_event(OutboxEvent {
                event_id: "evt-1".into(),
                tenant_id: "tenant-a".into(),
                aggregate_type: "package_version".into(),
                aggregate_id: "ver-1".into(),
                event_type: "version.published".into(),
                payload: serde_json::json!({}),
                occurred_at: now - Duration::minutes(10),
                available_at: now - Duration::minutes(9),
                delivered_at: None,
            })
            .unwrap();

        store.insert_gc_run(GcRun {
            run_id: "gc-1".into(),
            mode: GcMode::DryRun,
            counters: GcCounters::default(),
            started_at: now,
            completed_at: None,
            failed: false,
        });

        store.append_audit_entry(AuditEntry {
            audit_id: "aud-1".into(),
            tenant_id: "tenant-a".into(),
            actor: "system".into(),
            action: "policy.timeout".into(),
            resource_type: "package_version".into(),
            resource_id: "ver-1".into(),
            details: HashMap::new(),
            occurred_at: now - Duration::hours(1),
        });

        let summary = ops_summary(&store, now);
        assert_eq!(summary.pending_outbox_count, 1);
        assert_eq!(summary.available_now_outbox_count, 1);
        assert_eq!(summary.oldest_pending_outbox_age_seconds, Some(600));
        assert_eq!(summary.incomplete_gc_run_count, 1);
        assert_eq!(summary.recent_policy_timeout_count, 1);
        assert_eq!(summary.pending_search_jobs, 0);
    }

    #[test]
    fn ops_summary_excludes_stale_policy_timeouts() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();
        store.append_audit_entry(AuditEntry {
            audit_id: "aud-old".into(),
            tenant_id: "tenant-a".into(),
            actor: "system".into(),
            action: "policy.timeout".into(),
            resource_type: "package_version".into(),
            resource_id: "ver-1".into(),
            details: HashMap::new(),
            occurred_at: now - Duration::hours(25),
        });

        let summary = ops_summary(&store, now);
        assert_eq!(summary.recent_policy_timeout_count, 0);
    }
}
