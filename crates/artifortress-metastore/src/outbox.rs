use artifortress_types::OutboxEvent;

use crate::db::InMemoryMetadataStore;
use crate::error::MetaError;

impl InMemoryMetadataStore {
    /// Idempotent insert keyed on `(tenant, aggregate_type, aggregate_id,
    /// event_type)` per the outbox invariant: re-publishing the same logical
    /// event is a no-op, not a duplicate row.
    pub fn insert_outbox_event(&self, event: OutboxEvent) -> Result<(), MetaError> {
        let key = event.idempotency_key();
        let mut index = self.outbox_index.lock().unwrap();
        if index.contains(&key) {
            return Ok(());
        }
        index.insert(key);
        self.outbox.lock().unwrap().push(event);
        Ok(())
    }

    pub fn list_unpublished_outbox_events(&self) -> Vec<OutboxEvent> {
        self.outbox
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.delivered_at.is_none())
            .cloned()
            .collect()
    }

    pub fn mark_outbox_event_published(
        &self,
        event_id: &str,
        delivered_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), MetaError> {
        let mut outbox = self.outbox.lock().unwrap();
        let event = outbox
            .iter_mut()
            .find(|e| e.event_id == event_id)
            .ok_or_else(|| MetaError::NotFound(format!("outbox event {event_id}")))?;
        event.delivered_at = Some(delivered_at);
        Ok(())
    }

    pub fn all_outbox_events(&self) -> Vec<OutboxEvent> {
        self.outbox.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(event_type: &str) -> OutboxEvent {
        let now = Utc::now();
        OutboxEvent {
            event_id: format!("evt-{event_type}"),
            tenant_id: "t1".into(),
            aggregate_type: "version".into(),
            aggregate_id: "v1".into(),
            event_type: event_type.into(),
            payload: serde_json::json!({}),
            occurred_at: now,
            available_at: now,
            delivered_at: None,
        }
    }

    #[test]
    fn duplicate_logical_event_is_idempotent() {
        let db = InMemoryMetadataStore::new();
        db.insert_outbox_event(event("published")).unwrap();
        db.insert_outbox_event(event("published")).unwrap();
        assert_eq!(db.all_outbox_events().len(), 1);
    }

    #[test]
    fn distinct_event_types_are_both_kept() {
        let db = InMemoryMetadataStore::new();
        db.insert_outbox_event(event("published")).unwrap();
        db.insert_outbox_event(event("tombstoned")).unwrap();
        assert_eq!(db.all_outbox_events().len(), 2);
    }

    #[test]
    fn publishing_removes_from_unpublished_list() {
        let db = InMemoryMetadataStore::new();
        db.insert_outbox_event(event("published")).unwrap();
        let id = db.all_outbox_events()[0].event_id.clone();
        assert_eq!(db.list_unpublished_outbox_events().len(), 1);
        db.mark_outbox_event_published(&id, Utc::now()).unwrap();
        assert_eq!(db.list_unpublished_outbox_events().len(), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            /// At most one outbox row per (tenant, aggregate type, aggregate
            /// id, event type), no matter how often publishers race the
            /// same logical event.
            #[test]
            fn at_most_one_row_per_idempotency_key(
                inserts in proptest::collection::vec(("[ab]", "[xy]", "(published|tombstoned)"), 1..40)
            ) {
                let db = InMemoryMetadataStore::new();
                let now = Utc::now();
                for (i, (tenant, aggregate, event_type)) in inserts.iter().enumerate() {
                    db.insert_outbox_event(OutboxEvent {
                        event_id: format!("evt-{i}"),
                        tenant_id: tenant.clone(),
                        aggregate_type: "version".into(),
                        aggregate_id: aggregate.clone(),
                        event_type: event_type.clone(),
                        payload: serde_json::json!({}),
                        occurred_at: now,
                        available_at: now,
                        delivered_at: None,
                    }).unwrap();
                }

                let rows = db.all_outbox_events();
                let keys: HashSet<_> = rows.iter().map(|e| e.idempotency_key()).collect();
                prop_assert_eq!(keys.len(), rows.len());
            }
        }
    }
}
