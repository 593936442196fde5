//! Package version lifecycle: draft assembly, artifact entry and manifest
//! validation, publish, and tombstone, composing the metadata
//! store with the content-addressed blob index.

mod engine;
mod error;

pub use engine::{ArtifactEntryInput, PublishOutcome, create_or_reuse_draft, publish, tombstone, upsert_entries, upsert_manifest};
pub use error::VersionError;

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_metastore::InMemoryMetadataStore;
    use chrono::Utc;

    fn commit_blob(store: &InMemoryMetadataStore, repo_id: &str, digest: &str, length: u64) {
        use artifortress_types::{UploadSession, UploadState};
        store.upsert_blob(digest, length, "staging/x", None).unwrap();
        store
            .insert_upload_session(UploadSession {
                upload_id: format!("up-{digest}"),
                tenant_id: "tenant-a".into(),
                repo_id: repo_id.to_string(),
                expected_digest: digest.to_string(),
                expected_length: length,
                state: UploadState::Committed,
                object_staging_key: None,
                storage_upload_id: None,
                committed_blob_digest: Some(digest.to_string()),
                created_at: Utc::now(),
                expires_at: Utc::now(),
                updated_at: Utc::now(),
                aborted_at: None,
                aborted_reason: None,
                committed_at: Some(Utc::now()),
            })
            .unwrap();
    }

    fn digest(byte: u8) -> String {
        format!("{:02x}", byte).repeat(32)
    }

    #[test]
    fn create_or_reuse_draft_reuses_existing_draft() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();
        let first = create_or_reuse_draft(&store, "repo-a", "npm", None, "left-pad", "1.0.0", now).unwrap();
        let second = create_or_reuse_draft(&store, "repo-a", "npm", None, "left-pad", "1.0.0", now).unwrap();
        assert_eq!(first.version_id, second.version_id);
    }

    #[test]
    fn upsert_entries_rejects_uncommitted_digest() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();
        let version = create_or_reuse_draft(&store, "repo-a", "npm", None, "left-pad", "1.0.0", now).unwrap();
        let result = upsert_entries(
            &store,
            "repo-a",
            &version.version_id,
            vec![ArtifactEntryInput {
                relative_path: "index.js".into(),
                blob_digest: digest(0xaa),
                checksum_sha1: None,
                checksum_sha256: None,
                size_bytes: 10,
            }],
        );
        assert!(matches!(result, Err(VersionError::BlobNotFound(_))));
    }

    #[test]
    fn publish_requires_entries_and_manifest() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();
        let version = create_or_reuse_draft(&store, "repo-a", "npm", None, "left-pad", "1.0.0", now).unwrap();
        let result = publish(&store, "tenant-a", "repo-a", &version.version_id, now);
        assert!(matches!(result, Err(VersionError::Conflict(_))));
    }

    #[test]
    fn publish_is_idempotent_and_emits_one_outbox_event() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();
        let version = create_or_reuse_draft(&store, "repo-a", "npm", None, "left-pad", "1.0.0", now).unwrap();
        let d = digest(0xbb);
        commit_blob(&store, "repo-a", &d, 10);
        upsert_entries(
            &store,
            "repo-a",
            &version.version_id,
            vec![ArtifactEntryInput {
                relative_path: "index.js".into(),
                blob_digest: d.clone(),
                checksum_sha1: None,
                checksum_sha256: None,
                size_bytes: 10,
            }],
        )
        .unwrap();
        upsert_manifest(
            &store,
            "repo-a",
            "npm",
            &version.version_id,
            serde_json::json!({"name": "left-pad", "version": "1.0.0"}),
            None,
        )
        .unwrap();

        let first = publish(&store, "tenant-a", "repo-a", &version.version_id, now).unwrap();
        let second = publish(&store, "tenant-a", "repo-a", &version.version_id, now).unwrap();
        assert_eq!(first.version.published_at, second.version.published_at);
        assert!(!first.was_idempotent);
        assert!(first.event_emitted);
        assert!(second.was_idempotent);
        assert!(!second.event_emitted);
        assert_eq!(store.list_unpublished_outbox_events().len(), 1);
    }

    #[test]
    fn tombstone_clamps_retention_and_is_idempotent() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();
        let version = create_or_reuse_draft(&store, "repo-a", "npm", None, "left-pad", "1.0.0", now).unwrap();
        let first = tombstone(&store, "tenant-a", &version.version_id, "policy", "alice", Some(999_999), now).unwrap();
        let record = store.get_tombstone(&version.version_id).unwrap();
        assert_eq!(record.retention_until, now + chrono::Duration::days(3650));

        let second = tombstone(&store, "tenant-a", &version.version_id, "ignored", "bob", None, now).unwrap();
        assert_eq!(first.version_id, second.version_id);
        assert_eq!(second.tombstone_reason.as_deref(), Some("policy"));
    }

    #[test]
    fn manifest_requires_type_specific_fields() {
        let store = InMemoryMetadataStore::new();
        let now = Utc::now();
        let version = create_or_reuse_draft(&store, "repo-a", "maven", None, "lib", "1.0.0", now).unwrap();
        let result = upsert_manifest(
            &store,
            "repo-a",
            "maven",
            &version.version_id,
            serde_json::json!({"groupId": "com.example"}),
            None,
        );
        assert!(matches!(result, Err(VersionError::Validation(_))));
    }
}
