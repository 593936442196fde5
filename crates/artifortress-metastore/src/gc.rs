use std::collections::HashSet;

use artifortress_types::GcRun;

use crate::db::InMemoryMetadataStore;
use crate::error::MetaError;

impl InMemoryMetadataStore {
    pub fn insert_gc_run(&self, run: GcRun) {
        self.gc_marks.lock().unwrap().insert(run.run_id.clone(), HashSet::new());
        self.gc_runs.lock().unwrap().insert(run.run_id.clone(), run);
    }

    pub fn get_gc_run(&self, run_id: &str) -> Result<GcRun, MetaError> {
        self.gc_runs
            .lock()
            .unwrap()
            .get(run_id)
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("gc run {run_id}")))
    }

    pub fn update_gc_run<F>(&self, run_id: &str, mutate: F) -> Result<GcRun, MetaError>
    where
        F: FnOnce(&mut GcRun),
    {
        let mut runs = self.gc_runs.lock().unwrap();
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| MetaError::NotFound(format!("gc run {run_id}")))?;
        mutate(run);
        Ok(run.clone())
    }

    /// Marks a digest as reachable for the given run's root-set sweep.
    pub fn mark_digest_reachable(&self, run_id: &str, digest: &str) {
        self.gc_marks
            .lock()
            .unwrap()
            .entry(run_id.to_string())
            .or_default()
            .insert(digest.to_string());
    }

    pub fn is_digest_marked(&self, run_id: &str, digest: &str) -> bool {
        self.gc_marks
            .lock()
            .unwrap()
            .get(run_id)
            .is_some_and(|set| set.contains(digest))
    }

    pub fn marked_count(&self, run_id: &str) -> u64 {
        self.gc_marks
            .lock()
            .unwrap()
            .get(run_id)
            .map(|set| set.len() as u64)
            .unwrap_or_default()
    }

    pub fn all_gc_runs(&self) -> Vec<GcRun> {
        self.gc_runs.lock().unwrap().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_types::{GcCounters, GcMode};
    use chrono::Utc;

    fn run() -> GcRun {
        GcRun {
            run_id: "run1".into(),
            mode: GcMode::DryRun,
            counters: GcCounters::default(),
            started_at: Utc::now(),
            completed_at: None,
            failed: false,
        }
    }

    #[test]
    fn marking_digests_is_scoped_to_run() {
        let db = InMemoryMetadataStore::new();
        db.insert_gc_run(run());
        db.mark_digest_reachable("run1", "abc");
        assert!(db.is_digest_marked("run1", "abc"));
        assert!(!db.is_digest_marked("run1", "def"));
        assert!(!db.is_digest_marked("run2", "abc"));
        assert_eq!(db.marked_count("run1"), 1);
    }

    #[test]
    fn update_gc_run_mutates_counters() {
        let db = InMemoryMetadataStore::new();
        db.insert_gc_run(run());
        let updated = db
            .update_gc_run("run1", |r| {
                r.counters.deleted_blob_count += 1;
                r.completed_at = Some(Utc::now());
            })
            .unwrap();
        assert_eq!(updated.counters.deleted_blob_count, 1);
        assert!(updated.completed_at.is_some());
    }
}
