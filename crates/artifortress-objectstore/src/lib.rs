//! Object Store Adapter: multipart init / presign / complete / abort /
//! range-read / delete over an S3-compatible API, with classified error
//! kinds.
//!
//! One trait, one concrete fully-implemented in-memory backend, and other
//! backend kinds declared but not implemented — the real object store
//! (S3, GCS, Azure) is an out-of-scope external collaborator; only the
//! contract and one reference implementation live here.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use artifortress_types::ObjectErrorKind;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct ObjectStoreError {
    pub kind: ObjectErrorKind,
    pub message: String,
}

impl ObjectStoreError {
    pub fn new(kind: ObjectErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ObjectErrorKind::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ObjectErrorKind::InvalidRequest, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// `start..=end`, inclusive. Suffix ranges and multi-range requests
    /// are rejected upstream of this adapter, so this type only models
    /// the single, well-formed case.
    pub fn new(start: u64, end: u64) -> Result<Self, ObjectStoreError> {
        if end < start {
            return Err(ObjectStoreError::invalid_request(
                "range end must be >= start",
            ));
        }
        Ok(Self { start, end })
    }
}

#[derive(Debug, Clone)]
pub struct MultipartUpload {
    pub storage_upload_id: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct PresignedPart {
    pub url: String,
    pub part_number: u32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

#[derive(Debug, Clone)]
pub struct DownloadedObject {
    pub bytes: Vec<u8>,
    pub length: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub content_range: Option<ByteRange>,
    pub status: u16,
}

/// Every method may represent a suspending network call in a
/// real backend; cancellation is modeled at the caller's boundary, not
/// threaded through this trait, since the in-memory reference implementation
/// never actually blocks.
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    fn start_multipart(&self, key: &str) -> Result<MultipartUpload, ObjectStoreError>;

    fn presign_part(
        &self,
        key: &str,
        storage_upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<PresignedPart, ObjectStoreError>;

    fn complete_multipart(
        &self,
        key: &str,
        storage_upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), ObjectStoreError>;

    /// Idempotent: a missing upload is treated as already-aborted success.
    fn abort_multipart(&self, key: &str, storage_upload_id: &str) -> Result<(), ObjectStoreError>;

    fn download(
        &self,
        key: &str,
        byte_range: Option<ByteRange>,
    ) -> Result<DownloadedObject, ObjectStoreError>;

    /// Idempotent: NotFound counts as success (used by GC).
    fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;

    fn check_availability(&self) -> Result<(), ObjectStoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStoreKind {
    InMemory,
    S3Compatible,
}

/// Backend factory: the one implemented kind builds; unimplemented
/// kinds fail loudly rather than silently degrading.
pub fn build_object_store(kind: ObjectStoreKind) -> Result<Box<dyn ObjectStore>, ObjectStoreError> {
    match kind {
        ObjectStoreKind::InMemory => Ok(Box::new(InMemoryObjectStore::new())),
        ObjectStoreKind::S3Compatible => Err(ObjectStoreError::new(
            ObjectErrorKind::UnexpectedFailure,
            "S3-compatible object store backend is not yet implemented",
        )),
    }
}

#[derive(Debug)]
struct PendingUpload {
    key: String,
    parts: HashMap<u32, Vec<u8>>,
}

#[derive(Debug)]
struct Inner {
    objects: HashMap<String, Vec<u8>>,
    pending: HashMap<String, PendingUpload>,
    next_upload_id: u64,
}

/// Full, thread-safe, in-process implementation of [`ObjectStore`]. Used by
/// every other component's tests and by the CLI's demo commands; this is
/// the adapter a real deployment would replace with an S3 client.
#[derive(Debug)]
pub struct InMemoryObjectStore {
    inner: Mutex<Inner>,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                objects: HashMap::new(),
                pending: HashMap::new(),
                next_upload_id: 1,
            }),
        }
    }

    /// Not part of the [`ObjectStore`] contract: PUTting bytes to a
    /// presigned URL is the client's job, which this in-process reference
    /// implementation has no real HTTP endpoint for. Tests and the upload
    /// engine use this to simulate that PUT and obtain the part's ETag.
    pub fn put_part(
        &self,
        key: &str,
        storage_upload_id: &str,
        part_number: u32,
        data: Vec<u8>,
    ) -> Result<String, ObjectStoreError> {
        let mut inner = self.inner.lock().expect("object store lock poisoned");
        let pending = inner
            .pending
            .get_mut(storage_upload_id)
            .ok_or_else(|| ObjectStoreError::not_found(format!("no such upload {storage_upload_id}")))?;
        if pending.key != key {
            return Err(ObjectStoreError::invalid_request("key does not match upload"));
        }
        let etag = etag_for(&data);
        pending.parts.insert(part_number, data);
        Ok(etag)
    }

    pub fn object_count(&self) -> usize {
        self.inner.lock().expect("object store lock poisoned").objects.len()
    }
}

fn etag_for(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

impl ObjectStore for InMemoryObjectStore {
    fn start_multipart(&self, key: &str) -> Result<MultipartUpload, ObjectStoreError> {
        let mut inner = self.inner.lock().expect("object store lock poisoned");
        let id = inner.next_upload_id;
        inner.next_upload_id += 1;
        let storage_upload_id = format!("mpu-{id}");
        inner.pending.insert(
            storage_upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                parts: HashMap::new(),
            },
        );
        Ok(MultipartUpload {
            storage_upload_id,
            key: key.to_string(),
        })
    }

    fn presign_part(
        &self,
        key: &str,
        storage_upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<PresignedPart, ObjectStoreError> {
        if part_number < 1 {
            return Err(ObjectStoreError::invalid_request("part_number must be >= 1"));
        }
        let inner = self.inner.lock().expect("object store lock poisoned");
        if !inner.pending.contains_key(storage_upload_id) {
            return Err(ObjectStoreError::not_found(format!(
                "no such upload {storage_upload_id}"
            )));
        }
        Ok(PresignedPart {
            url: format!("https://objectstore.invalid/{key}?uploadId={storage_upload_id}&partNumber={part_number}"),
            part_number,
            expires_at: Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default(),
        })
    }

    fn complete_multipart(
        &self,
        key: &str,
        storage_upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), ObjectStoreError> {
        let mut inner = self.inner.lock().expect("object store lock poisoned");
        // A failed complete leaves the multipart upload open, same as a real
        // S3 CompleteMultipartUpload; only success consumes it.
        let pending = inner
            .pending
            .get(storage_upload_id)
            .ok_or_else(|| ObjectStoreError::not_found(format!("no such upload {storage_upload_id}")))?;
        if pending.key != key {
            return Err(ObjectStoreError::invalid_request("key does not match upload"));
        }
        if parts.is_empty() {
            return Err(ObjectStoreError::invalid_request("no parts to complete"));
        }
        let mut body = Vec::new();
        for part in parts {
            let data = pending.parts.get(&part.part_number).ok_or_else(|| {
                ObjectStoreError::invalid_request(format!("missing part {}", part.part_number))
            })?;
            let actual_etag = etag_for(data);
            if actual_etag != part.etag {
                return Err(ObjectStoreError::invalid_request(format!(
                    "etag mismatch for part {}",
                    part.part_number
                )));
            }
            body.extend_from_slice(data);
        }
        inner.pending.remove(storage_upload_id);
        inner.objects.insert(key.to_string(), body);
        Ok(())
    }

    fn abort_multipart(&self, _key: &str, storage_upload_id: &str) -> Result<(), ObjectStoreError> {
        let mut inner = self.inner.lock().expect("object store lock poisoned");
        inner.pending.remove(storage_upload_id);
        Ok(())
    }

    fn download(
        &self,
        key: &str,
        byte_range: Option<ByteRange>,
    ) -> Result<DownloadedObject, ObjectStoreError> {
        let inner = self.inner.lock().expect("object store lock poisoned");
        let bytes = inner
            .objects
            .get(key)
            .ok_or_else(|| ObjectStoreError::not_found(format!("no such object {key}")))?;
        match byte_range {
            None => Ok(DownloadedObject {
                bytes: bytes.clone(),
                length: bytes.len() as u64,
                content_type: None,
                etag: Some(etag_for(bytes)),
                content_range: None,
                status: 200,
            }),
            Some(range) => {
                let len = bytes.len() as u64;
                if range.start >= len {
                    return Err(ObjectStoreError::new(
                        ObjectErrorKind::InvalidRange,
                        "range start beyond object length",
                    ));
                }
                let end = range.end.min(len.saturating_sub(1));
                let slice = &bytes[range.start as usize..=end as usize];
                Ok(DownloadedObject {
                    bytes: slice.to_vec(),
                    length: slice.len() as u64,
                    content_type: None,
                    etag: Some(etag_for(bytes)),
                    content_range: Some(ByteRange {
                        start: range.start,
                        end,
                    }),
                    status: 206,
                })
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let mut inner = self.inner.lock().expect("object store lock poisoned");
        inner.objects.remove(key);
        Ok(())
    }

    fn check_availability(&self) -> Result<(), ObjectStoreError> {
        Ok(())
    }
}
