//! `/v1/admin/*` workflows: GC runs, the ops
//! summary dashboard, the read-only consistency report, and audit log
//! access. Every route here requires `*:admin` — tenant-scoped repo
//! roles don't carry operator authority.

use std::collections::HashMap;

use artifortress_auth::Principal;
use artifortress_audit::export_jsonl;
use artifortress_reconcile::{ConsistencyReport, OpsSummary};
use artifortress_types::{ArtifortressError, AuditEntry, GcMode, GcRun};
use chrono::{DateTime, Utc};

use crate::state::AppState;

fn require_global_admin(principal: &Principal) -> Result<(), ArtifortressError> {
    if principal.scopes.iter().any(|s| s.is_global_admin()) {
        Ok(())
    } else {
        Err(ArtifortressError::Forbidden {
            repo_key: "*".to_string(),
            required: "admin",
        })
    }
}

/// `POST /v1/admin/gc/runs`: starts and immediately runs a GC pass.
pub fn run_gc(state: &AppState, principal: &Principal, mode: GcMode, now: DateTime<Utc>) -> Result<GcRun, ArtifortressError> {
    require_global_admin(principal)?;
    let started = artifortress_gc::start_run(&state.metastore, mode, now);
    let run = artifortress_gc::run(&state.metastore, state.object_store.as_ref(), &started.run_id, &state.gc, now)?;
    artifortress_audit::record(
        &state.metastore,
        &principal.tenant_id,
        &principal.subject,
        "gc.run",
        "gc_run",
        &run.run_id,
        HashMap::new(),
        now,
    );
    Ok(run)
}

/// `GET /v1/admin/ops/summary`.
pub fn ops_summary(state: &AppState, principal: &Principal, now: DateTime<Utc>) -> Result<OpsSummary, ArtifortressError> {
    require_global_admin(principal)?;
    Ok(artifortress_reconcile::ops_summary(&state.metastore, now))
}

/// `GET /v1/admin/reconcile/blobs`.
pub fn reconcile_blobs(state: &AppState, principal: &Principal) -> Result<ConsistencyReport, ArtifortressError> {
    require_global_admin(principal)?;
    Ok(artifortress_reconcile::check_consistency(&state.metastore))
}

/// `GET /v1/admin/audit`: entries for one tenant, newest last.
pub fn list_audit(state: &AppState, principal: &Principal, tenant_id: &str) -> Result<Vec<AuditEntry>, ArtifortressError> {
    require_global_admin(principal)?;
    Ok(artifortress_audit::list_for_tenant(&state.metastore, tenant_id))
}

/// `GET /v1/admin/audit/export`: JSONL, one audit row per line.
pub fn export_audit(state: &AppState, principal: &Principal, tenant_id: &str) -> Result<Vec<u8>, ArtifortressError> {
    require_global_admin(principal)?;
    let mut buffer = Vec::new();
    export_jsonl(&state.metastore, tenant_id, &mut buffer)
        .map_err(|e| ArtifortressError::service_unavailable(format!("audit export failed: {e}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_auth::PrincipalSource;
    use artifortress_metastore::InMemoryMetadataStore;
    use artifortress_objectstore::InMemoryObjectStore;
    use artifortress_types::Scope;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(InMemoryMetadataStore::new()), Arc::new(InMemoryObjectStore::new()))
    }

    fn principal(scopes: &[&str]) -> Principal {
        Principal {
            subject: "alice".into(),
            tenant_id: "tenant-a".into(),
            scopes: scopes.iter().map(|s| Scope::parse(s).unwrap()).collect(),
            source: PrincipalSource::PersonalAccessToken,
        }
    }

    #[test]
    fn repo_scoped_admin_cannot_reach_operator_routes() {
        let state = state();
        let repo_admin = principal(&["lib:admin"]);
        assert!(run_gc(&state, &repo_admin, GcMode::DryRun, Utc::now()).is_err());
        assert!(ops_summary(&state, &repo_admin, Utc::now()).is_err());
        assert!(reconcile_blobs(&state, &repo_admin).is_err());
        assert!(list_audit(&state, &repo_admin, "tenant-a").is_err());
    }

    #[test]
    fn global_admin_runs_gc_dry_run() {
        let state = state();
        let admin = principal(&["*:admin"]);
        let run = run_gc(&state, &admin, GcMode::DryRun, Utc::now()).unwrap();
        assert!(run.completed_at.is_some());
        let audited = artifortress_audit::list_for_tenant(&state.metastore, "tenant-a");
        assert!(audited.iter().any(|e| e.action == "gc.run"));
    }

    #[test]
    fn global_admin_reads_ops_summary_and_reconcile_report() {
        let state = state();
        let admin = principal(&["*:admin"]);
        let summary = ops_summary(&state, &admin, Utc::now()).unwrap();
        assert_eq!(summary.pending_outbox_count, 0);

        let report = reconcile_blobs(&state, &admin).unwrap();
        assert_eq!(report.orphan_blob_count, 0);
    }

    #[test]
    fn audit_export_produces_jsonl_bytes() {
        let state = state();
        let admin = principal(&["*:admin"]);
        artifortress_audit::record(&state.metastore, "tenant-a", "alice", "test.action", "thing", "1", Default::default(), Utc::now());
        let bytes = export_audit(&state, &admin, "tenant-a").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("test.action"));
    }
}
