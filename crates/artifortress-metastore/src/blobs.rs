use artifortress_types::Blob;
use chrono::Utc;

use crate::db::InMemoryMetadataStore;
use crate::error::MetaError;

impl InMemoryMetadataStore {
    pub fn get_blob(&self, digest: &str) -> Option<Blob> {
        self.blobs.lock().unwrap().get(digest).cloned()
    }

    /// `ON CONFLICT(digest) DO UPDATE ... preserving length` (commit
    /// step): lengths must agree or the upsert is rejected outright,
    /// matching invariant 1 ("a blob has exactly one length").
    pub fn upsert_blob(
        &self,
        digest: &str,
        length: u64,
        storage_key: &str,
        etag: Option<String>,
    ) -> Result<Blob, MetaError> {
        let mut blobs = self.blobs.lock().unwrap();
        if let Some(existing) = blobs.get(digest) {
            if existing.length != length {
                return Err(MetaError::UniqueViolation {
                    constraint: format!(
                        "blobs(digest) length mismatch: existing {} requested {}",
                        existing.length, length
                    ),
                });
            }
            let mut updated = existing.clone();
            updated.object_etag = updated.object_etag.or(etag);
            blobs.insert(digest.to_string(), updated.clone());
            return Ok(updated);
        }
        let blob = Blob {
            digest: digest.to_string(),
            length,
            storage_key: storage_key.to_string(),
            object_etag: etag,
            created_at: Utc::now(),
        };
        blobs.insert(digest.to_string(), blob.clone());
        Ok(blob)
    }

    pub fn all_blob_digests(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn delete_blob(&self, digest: &str) {
        self.blobs.lock().unwrap().remove(digest);
    }
}
