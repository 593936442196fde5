use artifortress_types::{UploadSession, UploadState};
use chrono::Utc;

use crate::db::InMemoryMetadataStore;
use crate::error::MetaError;

impl InMemoryMetadataStore {
    pub fn insert_upload_session(&self, session: UploadSession) -> Result<(), MetaError> {
        self.upload_sessions
            .lock()
            .unwrap()
            .insert(session.upload_id.clone(), session);
        Ok(())
    }

    pub fn get_upload_session(&self, upload_id: &str) -> Result<UploadSession, MetaError> {
        self.upload_sessions
            .lock()
            .unwrap()
            .get(upload_id)
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("upload session {upload_id}")))
    }

    /// `UPDATE ... SET state = $new WHERE upload_id = $id AND state = $expected`.
    /// Returns the updated session on success; `None` means the precondition
    /// didn't hold (the race-loser case), distinguished from "not
    /// found" by the caller re-reading current state if it needs the reason.
    pub fn transition_upload_state<F>(
        &self,
        upload_id: &str,
        expected: UploadState,
        mutate: F,
    ) -> Result<Option<UploadSession>, MetaError>
    where
        F: FnOnce(&mut UploadSession),
    {
        let mut sessions = self.upload_sessions.lock().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| MetaError::NotFound(format!("upload session {upload_id}")))?;
        if session.state != expected {
            return Ok(None);
        }
        mutate(session);
        session.updated_at = Utc::now();
        Ok(Some(session.clone()))
    }

    /// True if some session in this repo committed this exact digest
    /// ("a committed upload session for this repo references the
    /// digest").
    pub fn repo_has_committed_digest(&self, repo_id: &str, digest: &str) -> bool {
        self.upload_sessions.lock().unwrap().values().any(|s| {
            s.repo_id == repo_id
                && s.state == UploadState::Committed
                && s.committed_blob_digest.as_deref() == Some(digest)
        })
    }

    /// Clears dangling references ahead of a blob-row delete (GC
    /// execute step): a deleted blob must not leave a committed session
    /// still pointing at it.
    pub fn clear_committed_blob_digest(&self, digest: &str) {
        for session in self.upload_sessions.lock().unwrap().values_mut() {
            if session.committed_blob_digest.as_deref() == Some(digest) {
                session.committed_blob_digest = None;
            }
        }
    }
}
