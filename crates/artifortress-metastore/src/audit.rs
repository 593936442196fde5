use artifortress_types::AuditEntry;

use crate::db::InMemoryMetadataStore;

impl InMemoryMetadataStore {
    /// Append-only: audit rows are never updated or deleted once written.
    pub fn append_audit_entry(&self, entry: AuditEntry) {
        self.audit.lock().unwrap().push(entry);
    }

    pub fn list_audit_entries_for_resource(&self, resource_type: &str, resource_id: &str) -> Vec<AuditEntry> {
        self.audit
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.resource_type == resource_type && e.resource_id == resource_id)
            .cloned()
            .collect()
    }

    pub fn all_audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn entry(action: &str) -> AuditEntry {
        AuditEntry {
            audit_id: format!("audit-{action}"),
            tenant_id: "t1".into(),
            actor: "alice".into(),
            action: action.into(),
            resource_type: "version".into(),
            resource_id: "v1".into(),
            details: HashMap::new(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn entries_are_appended_not_replaced() {
        let db = InMemoryMetadataStore::new();
        db.append_audit_entry(entry("publish"));
        db.append_audit_entry(entry("tombstone"));
        assert_eq!(db.all_audit_entries().len(), 2);
        assert_eq!(db.list_audit_entries_for_resource("version", "v1").len(), 2);
        assert_eq!(db.list_audit_entries_for_resource("version", "other").len(), 0);
    }
}
