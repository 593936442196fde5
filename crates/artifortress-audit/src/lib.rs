//! Append-only audit log: every state-changing operation records
//! a tenant-scoped row with a free-form string details dictionary.
//! Writes participating in a larger transaction (publish, tombstone) are
//! appended by the caller directly through the metadata store; this
//! crate is the read side plus a one-JSON-object-per-line export.

use std::collections::HashMap;
use std::io::Write;

use artifortress_metastore::InMemoryMetadataStore;
use artifortress_types::AuditEntry;
use chrono::{DateTime, Utc};
use rand::RngExt;
use rand::distr::Alphanumeric;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to serialize audit entry")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write audit export")]
    Io(#[from] std::io::Error),
}

fn generate_audit_id() -> String {
    let suffix: String = rand::rng().sample_iter(&Alphanumeric).take(20).map(char::from).collect();
    format!("aud-{suffix}")
}

/// Records one audit row. Most callers append directly through the
/// metadata store as part of a larger write; use this for standalone
/// writes (token issuance, binding upserts, GC run completion) that are
/// not themselves gated on another row's state.
pub fn record(
    store: &InMemoryMetadataStore,
    tenant_id: &str,
    actor: &str,
    action: &str,
    resource_type: &str,
    resource_id: &str,
    details: HashMap<String, String>,
    now: DateTime<Utc>,
) -> AuditEntry {
    let entry = AuditEntry {
        audit_id: generate_audit_id(),
        tenant_id: tenant_id.to_string(),
        actor: actor.to_string(),
        action: action.to_string(),
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        details,
        occurred_at: now,
    };
    store.append_audit_entry(entry.clone());
    entry
}

pub fn list_for_resource(store: &InMemoryMetadataStore, resource_type: &str, resource_id: &str) -> Vec<AuditEntry> {
    store.list_audit_entries_for_resource(resource_type, resource_id)
}

pub fn list_for_tenant(store: &InMemoryMetadataStore, tenant_id: &str) -> Vec<AuditEntry> {
    let mut entries: Vec<AuditEntry> = store
        .all_audit_entries()
        .into_iter()
        .filter(|e| e.tenant_id == tenant_id)
        .collect();
    entries.sort_by_key(|e| e.occurred_at);
    entries
}

/// Writes every audit row for a tenant as one JSON object per line,
/// ordered by occurrence, to any writer (a file, a response body, a pipe).
pub fn export_jsonl(store: &InMemoryMetadataStore, tenant_id: &str, writer: &mut impl Write) -> Result<(), AuditError> {
    for entry in list_for_tenant(store, tenant_id) {
        let line = serde_json::to_string(&entry)?;
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
