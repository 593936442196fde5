//! `/v1/repos/{repo_key}/quarantine/*` and the policy-evaluation trigger
//! wraps `artifortress_policy`'s bounded-time evaluation and
//! quarantine resolution with repo-scoped role checks.

use artifortress_auth::{Principal, has_role};
use artifortress_types::{ArtifortressError, PolicyAction, PolicyDecision, PolicyEvaluation, QuarantineItem, QuarantineStatus, Role};
use chrono::{DateTime, Utc};

use crate::state::AppState;

fn require_role(principal: &Principal, repo_key: &str, required: Role) -> Result<(), ArtifortressError> {
    if has_role(&principal.scopes, repo_key, required) {
        Ok(())
    } else {
        Err(ArtifortressError::Forbidden {
            repo_key: repo_key.to_string(),
            required: required.as_str(),
        })
    }
}

/// Evaluates a version for `action`, called internally from publish/promote
/// flows that need a decision ahead of the state change; `promote` role
/// required since a caller can only trigger evaluation for a version it's
/// authorized to move forward.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    repo_id: &str,
    version_id: &str,
    action: PolicyAction,
    hint: Option<PolicyDecision>,
    policy_engine_version: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PolicyEvaluation, ArtifortressError> {
    require_role(principal, repo_key, Role::Promote)?;
    Ok(artifortress_policy::evaluate_and_persist(
        &state.metastore,
        tenant_id,
        repo_id,
        version_id,
        action,
        hint,
        policy_engine_version,
        state.policy.evaluation_timeout,
        &principal.subject,
        now,
    )?)
}

/// `GET /v1/repos/{repo_key}/quarantine/{version_id}`: `promote` role required.
pub fn get_quarantine(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    repo_id: &str,
    version_id: &str,
) -> Result<QuarantineItem, ArtifortressError> {
    require_role(principal, repo_key, Role::Promote)?;
    state
        .metastore
        .get_quarantine_for_version(tenant_id, repo_id, version_id)
        .ok_or_else(|| ArtifortressError::not_found(format!("quarantine item for version {version_id}")))
}

/// `POST /v1/repos/{repo_key}/quarantine/{version_id}/release`: `promote` role required.
pub fn release(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    repo_id: &str,
    version_id: &str,
    now: DateTime<Utc>,
) -> Result<QuarantineItem, ArtifortressError> {
    require_role(principal, repo_key, Role::Promote)?;
    Ok(artifortress_policy::resolve_quarantine(
        &state.metastore,
        tenant_id,
        repo_id,
        version_id,
        QuarantineStatus::Released,
        &principal.subject,
        now,
    )?)
}

/// `POST /v1/repos/{repo_key}/quarantine/{version_id}/reject`: `promote` role required.
pub fn reject(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    repo_id: &str,
    version_id: &str,
    now: DateTime<Utc>,
) -> Result<QuarantineItem, ArtifortressError> {
    require_role(principal, repo_key, Role::Promote)?;
    Ok(artifortress_policy::resolve_quarantine(
        &state.metastore,
        tenant_id,
        repo_id,
        version_id,
        QuarantineStatus::Rejected,
        &principal.subject,
        now,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_auth::PrincipalSource;
    use artifortress_metastore::InMemoryMetadataStore;
    use artifortress_objectstore::InMemoryObjectStore;
    use artifortress_types::{RepoType, Repository, Scope};
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

    fn seed(state: &AppState) -> (Repository, artifortress_types::PackageVersion) {
        let now = Utc::now();
        let repo = Repository {
            repo_id: "repo-lib".into(),
            tenant_id: "tenant-a".into(),
            repo_key: "lib".into(),
            repo_type: RepoType::Local,
            upstream_url: None,
            virtual_members: vec![],
            created_at: now,
        };
        state.metastore.insert_repository(repo.clone()).unwrap();
        let version = artifortress_versions::create_or_reuse_draft(&state.metastore, &repo.repo_id, "npm", None, "widget", "1.0.0", now).unwrap();
        (repo, version)
    }

    #[test]
    fn writer_cannot_trigger_evaluation() {
        let state = state();
        let (repo, version) = seed(&state);
        let writer = principal(&["lib:write"]);
        let err = evaluate(
            &state,
            &writer,
            "tenant-a",
            "lib",
            &repo.repo_id,
            &version.version_id,
            PolicyAction::Publish,
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifortressError::Forbidden { .. }));
    }

    #[test]
    fn promoter_releases_a_quarantined_version() {
        let state = state();
        let (repo, version) = seed(&state);
        let promoter = principal(&["lib:promote"]);

        evaluate(
            &state,
            &promoter,
            "tenant-a",
            "lib",
            &repo.repo_id,
            &version.version_id,
            PolicyAction::Publish,
            Some(PolicyDecision::Quarantine),
            None,
            Utc::now(),
        )
        .unwrap();

        let open = get_quarantine(&state, &promoter, "tenant-a", "lib", &repo.repo_id, &version.version_id).unwrap();
        assert_eq!(open.status, QuarantineStatus::Quarantined);

        let released = release(&state, &promoter, "tenant-a", "lib", &repo.repo_id, &version.version_id, Utc::now()).unwrap();
        assert_eq!(released.status, QuarantineStatus::Released);
    }

    #[test]
    fn writer_cannot_resolve_quarantine() {
        let state = state();
        let (repo, version) = seed(&state);
        let writer = principal(&["lib:write"]);
        let err = reject(&state, &writer, "tenant-a", "lib", &repo.repo_id, &version.version_id, Utc::now()).unwrap_err();
        assert!(matches!(err, ArtifortressError::Forbidden { .. }));
    }
}
