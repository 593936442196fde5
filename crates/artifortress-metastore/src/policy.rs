use artifortress_types::{PolicyEvaluation, QuarantineItem, QuarantineStatus};

use crate::db::InMemoryMetadataStore;
use crate::error::MetaError;

impl InMemoryMetadataStore {
    pub fn insert_policy_evaluation(&self, evaluation: PolicyEvaluation) {
        self.policy_evaluations.lock().unwrap().push(evaluation);
    }

    pub fn list_policy_evaluations_for_version(&self, version_id: &str) -> Vec<PolicyEvaluation> {
        self.policy_evaluations
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.version_id == version_id)
            .cloned()
            .collect()
    }

    /// Insert-or-reuse on `(tenant, repo, version)`: a version can be
    /// quarantined only once while the item is unresolved.
    pub fn upsert_quarantine(&self, item: QuarantineItem) -> Result<QuarantineItem, MetaError> {
        let key = (item.tenant_id.clone(), item.repo_id.clone(), item.version_id.clone());
        let mut index = self.quarantine_index.lock().unwrap();
        if let Some(existing_id) = index.get(&key) {
            let quarantine = self.quarantine.lock().unwrap();
            let existing = quarantine.get(existing_id).unwrap().clone();
            if existing.status == QuarantineStatus::Quarantined {
                return Ok(existing);
            }
        }
        index.insert(key, item.quarantine_id.clone());
        self.quarantine
            .lock()
            .unwrap()
            .insert(item.quarantine_id.clone(), item.clone());
        Ok(item)
    }

    pub fn get_quarantine_for_version(&self, tenant_id: &str, repo_id: &str, version_id: &str) -> Option<QuarantineItem> {
        let key = (tenant_id.to_string(), repo_id.to_string(), version_id.to_string());
        let id = self.quarantine_index.lock().unwrap().get(&key).cloned()?;
        self.quarantine.lock().unwrap().get(&id).cloned()
    }

    /// Conditional resolve: only transitions a still-quarantined item, so
    /// a double-resolve from a racing operator request is a no-op.
    pub fn resolve_quarantine(
        &self,
        quarantine_id: &str,
        status: QuarantineStatus,
        resolved_by: &str,
        resolved_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<QuarantineItem>, MetaError> {
        let mut quarantine = self.quarantine.lock().unwrap();
        let item = quarantine
            .get_mut(quarantine_id)
            .ok_or_else(|| MetaError::NotFound(format!("quarantine item {quarantine_id}")))?;
        if item.status != QuarantineStatus::Quarantined {
            return Ok(None);
        }
        item.status = status;
        item.resolved_by = Some(resolved_by.to_string());
        item.resolved_at = Some(resolved_at);
        Ok(Some(item.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_types::{DecisionSource, PolicyAction, PolicyDecision};
    use chrono::Utc;

    fn quarantine_item() -> QuarantineItem {
        QuarantineItem {
            quarantine_id: "q1".into(),
            tenant_id: "t1".into(),
            repo_id: "r1".into(),
            version_id: "v1".into(),
            status: QuarantineStatus::Quarantined,
            reason: "malware hint".into(),
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        }
    }

    #[test]
    fn upsert_quarantine_reuses_open_item() {
        let db = InMemoryMetadataStore::new();
        let first = db.upsert_quarantine(quarantine_item()).unwrap();
        let mut again = quarantine_item();
        again.quarantine_id = "q2-should-not-be-used".into();
        let reused = db.upsert_quarantine(again).unwrap();
        assert_eq!(first.quarantine_id, reused.quarantine_id);
    }

    #[test]
    fn resolve_quarantine_is_conditional() {
        let db = InMemoryMetadataStore::new();
        db.upsert_quarantine(quarantine_item()).unwrap();
        let resolved = db
            .resolve_quarantine("q1", QuarantineStatus::Released, "bob", Utc::now())
            .unwrap();
        assert!(resolved.is_some());
        let second = db
            .resolve_quarantine("q1", QuarantineStatus::Rejected, "bob", Utc::now())
            .unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn policy_evaluations_list_by_version() {
        let db = InMemoryMetadataStore::new();
        db.insert_policy_evaluation(PolicyEvaluation {
            evaluation_id: "e1".into(),
            tenant_id: "t1".into(),
            repo_id: "r1".into(),
            version_id: "v1".into(),
            action: PolicyAction::Publish,
            decision: PolicyDecision::Allow,
            decision_source: DecisionSource::DefaultAllow,
            reason: "no hints".into(),
            policy_engine_version: None,
            evaluated_at: Utc::now(),
            evaluated_by: "system".into(),
        });
        assert_eq!(db.list_policy_evaluations_for_version("v1").len(), 1);
        assert_eq!(db.list_policy_evaluations_for_version("other").len(), 0);
    }
}
