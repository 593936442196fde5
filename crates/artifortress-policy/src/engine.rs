use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use artifortress_metastore::InMemoryMetadataStore;
use artifortress_types::{
    AuditEntry, DecisionSource, PolicyAction, PolicyDecision, PolicyEvaluation, QuarantineItem, QuarantineStatus,
};
use chrono::{DateTime, Utc};
use rand::RngExt;
use rand::distr::Alphanumeric;
use std::collections::HashMap;

use crate::error::PolicyError;

fn generate_id(prefix: &str) -> String {
    let suffix: String = rand::rng().sample_iter(&Alphanumeric).take(20).map(char::from).collect();
    format!("{prefix}-{suffix}")
}

/// Runs `f` on a worker thread and waits up to `timeout`; the task's
/// result is discarded if it arrives after the deadline.
fn run_bounded<T, F>(timeout: Duration, f: F) -> Result<T, PolicyError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(timeout).map_err(|_| PolicyError::Timeout)
}

/// A deployment-provided engine version string that makes the evaluation
/// task overrun its deadline; the bounded wait converts that into the
/// fail-closed timeout path without a real slow engine in the loop.
pub const SIMULATE_TIMEOUT_ENGINE_VERSION: &str = "simulate_timeout";

/// The engine itself: absent a hint it allows by default; a hint
/// overrides the decision and is reflected in the decision source.
fn evaluate_decision(
    hint: Option<PolicyDecision>,
    engine_version: Option<&str>,
    timeout: Duration,
) -> Result<(PolicyDecision, DecisionSource), PolicyError> {
    let simulate_timeout = engine_version == Some(SIMULATE_TIMEOUT_ENGINE_VERSION);
    run_bounded(timeout, move || {
        if simulate_timeout {
            thread::sleep(timeout + Duration::from_millis(50));
        }
        match hint {
            None => (PolicyDecision::Allow, DecisionSource::DefaultAllow),
            Some(PolicyDecision::Allow) => (PolicyDecision::Allow, DecisionSource::HintAllow),
            Some(PolicyDecision::Deny) => (PolicyDecision::Deny, DecisionSource::HintDeny),
            Some(PolicyDecision::Quarantine) => (PolicyDecision::Quarantine, DecisionSource::HintQuarantine),
        }
    })
}

/// Evaluate a version for `action`, persist the evaluation, and open a
/// quarantine item if the decision is `quarantine`. A timeout is
/// fail-closed: an audit row is written, nothing is persisted, and the
/// caller must not proceed.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_and_persist(
    store: &InMemoryMetadataStore,
    tenant_id: &str,
    repo_id: &str,
    version_id: &str,
    action: PolicyAction,
    hint: Option<PolicyDecision>,
    policy_engine_version: Option<&str>,
    timeout: Duration,
    evaluated_by: &str,
    now: DateTime<Utc>,
) -> Result<PolicyEvaluation, PolicyError> {
    let version = store.get_version(version_id)?;
    if version.repo_id != repo_id {
        return Err(PolicyError::NotFound(format!("version {version_id} in repo {repo_id}")));
    }

    let outcome = evaluate_decision(hint, policy_engine_version, timeout);
    let (decision, decision_source) = match outcome {
        Ok(pair) => pair,
        Err(PolicyError::Timeout) => {
            tracing::warn!(
                version_id = %version_id,
                repo_id = %repo_id,
                timeout_ms = timeout.as_millis() as u64,
                "policy evaluation timed out, failing closed"
            );
            store.append_audit_entry(AuditEntry {
                audit_id: generate_id("aud"),
                tenant_id: tenant_id.to_string(),
                actor: evaluated_by.to_string(),
                action: "policy.timeout".to_string(),
                resource_type: "package_version".to_string(),
                resource_id: version_id.to_string(),
                details: HashMap::new(),
                occurred_at: now,
            });
            return Err(PolicyError::Timeout);
        }
        Err(other) => return Err(other),
    };

    let evaluation = PolicyEvaluation {
        evaluation_id: generate_id("pev"),
        tenant_id: tenant_id.to_string(),
        repo_id: repo_id.to_string(),
        version_id: version_id.to_string(),
        action,
        decision,
        decision_source,
        reason: format!("{decision_source:?}"),
        policy_engine_version: policy_engine_version.map(str::to_string),
        evaluated_at: now,
        evaluated_by: evaluated_by.to_string(),
    };
    store.insert_policy_evaluation(evaluation.clone());

    if decision == PolicyDecision::Quarantine {
        store.upsert_quarantine(QuarantineItem {
            quarantine_id: generate_id("qtn"),
            tenant_id: tenant_id.to_string(),
            repo_id: repo_id.to_string(),
            version_id: version_id.to_string(),
            status: QuarantineStatus::Quarantined,
            reason: evaluation.reason.clone(),
            created_at: now,
            resolved_at: None,
            resolved_by: None,
        })?;
    }

    Ok(evaluation)
}

/// Resolve an open quarantine item to `release` or `reject`. Already
/// resolved is returned as-is rather than erroring.
pub fn resolve_quarantine(
    store: &InMemoryMetadataStore,
    tenant_id: &str,
    repo_id: &str,
    version_id: &str,
    target_status: QuarantineStatus,
    resolved_by: &str,
    now: DateTime<Utc>,
) -> Result<QuarantineItem, PolicyError> {
    if target_status == QuarantineStatus::Quarantined {
        return Err(PolicyError::Validation("target status must be released or rejected".into()));
    }
    let item = store
        .get_quarantine_for_version(tenant_id, repo_id, version_id)
        .ok_or_else(|| PolicyError::NotFound(format!("quarantine item for version {version_id}")))?;

    match store.resolve_quarantine(&item.quarantine_id, target_status, resolved_by, now)? {
        Some(updated) => Ok(updated),
        None => store
            .get_quarantine_for_version(tenant_id, repo_id, version_id)
            .ok_or_else(|| PolicyError::NotFound(format!("quarantine item for version {version_id}"))),
    }
}

/// Read-path suppression: true if any artifact entry referencing
/// `digest` in this repo belongs to a version currently quarantined or
/// rejected.
pub fn is_digest_locked(store: &InMemoryMetadataStore, repo_id: &str, digest: &str) -> bool {
    let repo = match store.get_repository(repo_id) {
        Ok(repo) => repo,
        Err(_) => return false,
    };
    store
        .all_artifact_entries()
        .iter()
        .filter(|entry| entry.blob_digest == digest)
        .filter_map(|entry| store.get_version(&entry.version_id).ok())
        .filter(|version| version.repo_id == repo_id)
        .any(|version| {
            store
                .get_quarantine_for_version(&repo.tenant_id, repo_id, &version.version_id)
                .map(|item| matches!(item.status, QuarantineStatus::Quarantined | QuarantineStatus::Rejected))
                .unwrap_or(false)
        })
}
