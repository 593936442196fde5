//! Content-addressed blob catalog: a row per digest with
//! insert-or-merge-under-length-invariance already enforced by
//! `artifortress-metastore`; this crate is the read-side lookup surface
//! used by version assembly and garbage collection.

use artifortress_metastore::InMemoryMetadataStore;

pub fn exists(store: &InMemoryMetadataStore, digest: &str) -> bool {
    store.get_blob(digest).is_some()
}

pub fn length(store: &InMemoryMetadataStore, digest: &str) -> Option<u64> {
    store.get_blob(digest).map(|b| b.length)
}

pub fn storage_key(store: &InMemoryMetadataStore, digest: &str) -> Option<String> {
    store.get_blob(digest).map(|b| b.storage_key)
}

/// Repository-level reachability predicate: a digest is usable as
/// an artifact entry in a repo only if the blob exists globally *and* a
/// committed upload session in that same repo produced it. Cross-repo
/// digest reuse without a local commit is not reachable.
pub fn is_committed_in_repo(store: &InMemoryMetadataStore, repo_id: &str, digest: &str) -> bool {
    exists(store, digest) && store.repo_has_committed_digest(repo_id, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_length_and_storage_key_reflect_blob_table() {
        let store = InMemoryMetadataStore::new();
        assert!(!exists(&store, "abc"));
        store.upsert_blob("abc", 42, "staging/abc", None).unwrap();
        assert!(exists(&store, "abc"));
        assert_eq!(length(&store, "abc"), Some(42));
        assert_eq!(storage_key(&store, "abc"), Some("staging/abc".to_string()));
    }

    #[test]
    fn is_committed_in_repo_requires_both_blob_and_local_commit() {
        use artifortress_types::UploadSession;
        use chrono::{Duration, Utc};

        let store = InMemoryMetadataStore::new();
        store.upsert_blob("abc", 10, "staging/abc", None).unwrap();
        assert!(!is_committed_in_repo(&store, "repo1", "abc"));

        let now = Utc::now();
        store
            .insert_upload_session(UploadSession {
                upload_id: "u1".into(),
                tenant_id: "t1".into(),
                repo_id: "repo1".into(),
                expected_digest: "abc".into(),
                expected_length: 10,
                state: artifortress_types::UploadState::Committed,
                object_staging_key: None,
                storage_upload_id: None,
                committed_blob_digest: Some("abc".into()),
                created_at: now,
                expires_at: now + Duration::minutes(60),
                updated_at: now,
                aborted_at: None,
                aborted_reason: None,
                committed_at: Some(now),
            })
            .unwrap();

        assert!(is_committed_in_repo(&store, "repo1", "abc"));
        assert!(!is_committed_in_repo(&store, "other-repo", "abc"));
    }
}
