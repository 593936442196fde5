//! `/v1/repos/*` workflows: repo CRUD and role-binding
//! management, all gated on `repo:admin` (or `*:admin`).

use std::collections::HashMap;

use artifortress_auth::{Principal, has_role};
use artifortress_types::{ArtifortressError, RepoType, Repository, Role, RoleBinding, validate_repo_key};
use chrono::Utc;

use crate::state::AppState;

fn require_admin(principal: &Principal, repo_key: &str) -> Result<(), ArtifortressError> {
    if has_role(&principal.scopes, repo_key, Role::Admin) {
        Ok(())
    } else {
        Err(ArtifortressError::Forbidden {
            repo_key: repo_key.to_string(),
            required: "admin",
        })
    }
}

/// `POST /v1/repos`: creates a local, remote, or virtual repo. Virtual
/// member lists are validated against the same self-reference and cycle
/// rules the metastore enforces for later membership edits.
pub fn create_repo(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    repo_type: RepoType,
    upstream_url: Option<String>,
    virtual_members: Vec<String>,
) -> Result<Repository, ArtifortressError> {
    require_admin(principal, repo_key)?;
    validate_repo_key(repo_key).map_err(ArtifortressError::validation)?;

    if repo_type == RepoType::Remote && upstream_url.as_deref().unwrap_or_default().is_empty() {
        return Err(ArtifortressError::validation("a remote repo requires an upstream_url"));
    }
    if repo_type == RepoType::Virtual {
        state.metastore.validate_virtual_members(tenant_id, repo_key, &virtual_members)?;
    }

    let repo = Repository {
        repo_id: format!("repo-{tenant_id}-{repo_key}"),
        tenant_id: tenant_id.to_string(),
        repo_key: repo_key.to_string(),
        repo_type,
        upstream_url,
        virtual_members,
        created_at: Utc::now(),
    };
    state.metastore.insert_repository(repo.clone())?;
    artifortress_audit::record(
        &state.metastore,
        tenant_id,
        &principal.subject,
        "repo.create",
        "repository",
        &repo.repo_id,
        HashMap::new(),
        Utc::now(),
    );
    Ok(repo)
}

/// `GET /v1/repos/{repo_key}`: any principal with at least `read` on the repo.
pub fn get_repo(state: &AppState, principal: &Principal, tenant_id: &str, repo_key: &str) -> Result<Repository, ArtifortressError> {
    if !has_role(&principal.scopes, repo_key, Role::Read) {
        return Err(ArtifortressError::Forbidden {
            repo_key: repo_key.to_string(),
            required: "read",
        });
    }
    Ok(state.metastore.find_repository_by_key(tenant_id, repo_key)?)
}

/// `GET /v1/repos`: every repo the principal has at least `read` on.
pub fn list_repos(state: &AppState, principal: &Principal, tenant_id: &str) -> Vec<Repository> {
    state
        .metastore
        .list_repositories_for_tenant(tenant_id)
        .into_iter()
        .filter(|repo| has_role(&principal.scopes, &repo.repo_key, Role::Read))
        .collect()
}

/// `DELETE /v1/repos/{repo_key}`: admin-only, irreversible.
pub fn delete_repo(state: &AppState, principal: &Principal, tenant_id: &str, repo_key: &str) -> Result<(), ArtifortressError> {
    require_admin(principal, repo_key)?;
    let repo = state.metastore.find_repository_by_key(tenant_id, repo_key)?;
    Ok(state.metastore.delete_repository(&repo.repo_id)?)
}

/// `PUT /v1/repos/{repo_key}/bindings/{subject}`: admin-only.
pub fn upsert_binding(
    state: &AppState,
    principal: &Principal,
    tenant_id: &str,
    repo_key: &str,
    subject: &str,
    roles: Vec<String>,
) -> Result<RoleBinding, ArtifortressError> {
    require_admin(principal, repo_key)?;
    let repo = state.metastore.find_repository_by_key(tenant_id, repo_key)?;
    let binding = RoleBinding {
        repo_id: repo.repo_id,
        subject: subject.to_string(),
        roles,
    };
    state.metastore.upsert_role_binding(binding.clone())?;
    artifortress_audit::record(
        &state.metastore,
        tenant_id,
        &principal.subject,
        "binding.upsert",
        "role_binding",
        &binding.subject,
        HashMap::new(),
        Utc::now(),
    );
    Ok(binding)
}

/// `GET /v1/repos/{repo_key}/bindings/{subject}`: admin-only.
pub fn get_binding(state: &AppState, principal: &Principal, tenant_id: &str, repo_key: &str, subject: &str) -> Result<RoleBinding, ArtifortressError> {
    require_admin(principal, repo_key)?;
    let repo = state.metastore.find_repository_by_key(tenant_id, repo_key)?;
    state
        .metastore
        .find_role_binding(&repo.repo_id, subject)
        .ok_or_else(|| ArtifortressError::not_found(format!("role binding for {subject} on {repo_key}")))
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
    fn admin_creates_gets_and_deletes_a_repo() {
        let state = state();
        let admin = principal(&["lib:admin"]);
        let repo = create_repo(&state, &admin, "tenant-a", "lib", RepoType::Local, None, vec![]).unwrap();
        assert_eq!(repo.repo_key, "lib");
        let audited = artifortress_audit::list_for_tenant(&state.metastore, "tenant-a");
        assert!(audited.iter().any(|e| e.action == "repo.create"));

        let fetched = get_repo(&state, &admin, "tenant-a", "lib").unwrap();
        assert_eq!(fetched.repo_id, repo.repo_id);

        delete_repo(&state, &admin, "tenant-a", "lib").unwrap();
        assert!(get_repo(&state, &admin, "tenant-a", "lib").is_err());
    }

    #[test]
    fn read_only_principal_cannot_create_or_delete() {
        let state = state();
        let admin = principal(&["lib:admin"]);
        create_repo(&state, &admin, "tenant-a", "lib", RepoType::Local, None, vec![]).unwrap();

        let reader = principal(&["lib:read"]);
        assert!(create_repo(&state, &reader, "tenant-a", "other", RepoType::Local, None, vec![]).is_err());
        assert!(delete_repo(&state, &reader, "tenant-a", "lib").is_err());
        assert!(get_repo(&state, &reader, "tenant-a", "lib").is_ok());
    }

    #[test]
    fn list_repos_is_scoped_to_readable_repos() {
        let state = state();
        let admin = principal(&["*:admin"]);
        create_repo(&state, &admin, "tenant-a", "lib", RepoType::Local, None, vec![]).unwrap();
        create_repo(&state, &admin, "tenant-a", "other", RepoType::Local, None, vec![]).unwrap();

        let reader = principal(&["lib:read"]);
        let repos = list_repos(&state, &reader, "tenant-a");
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].repo_key, "lib");
    }

    #[test]
    fn remote_repo_requires_an_upstream_url() {
        let state = state();
        let admin = principal(&["*:admin"]);
        let err = create_repo(&state, &admin, "tenant-a", "mirror", RepoType::Remote, None, vec![]).unwrap_err();
        assert!(matches!(err, ArtifortressError::Validation { .. }));
        assert!(
            create_repo(
                &state,
                &admin,
                "tenant-a",
                "mirror",
                RepoType::Remote,
                Some("https://registry.npmjs.org".into()),
                vec![]
            )
            .is_ok()
        );
    }

    #[test]
    fn repo_key_containing_colon_is_rejected() {
        let state = state();
        let admin = principal(&["*:admin"]);
        let err = create_repo(&state, &admin, "tenant-a", "lib:v2", RepoType::Local, None, vec![]).unwrap_err();
        assert!(matches!(err, ArtifortressError::Validation { .. }));
    }

    #[test]
    fn bindings_round_trip() {
        let state = state();
        let admin = principal(&["*:admin"]);
        create_repo(&state, &admin, "tenant-a", "lib", RepoType::Local, None, vec![]).unwrap();
        upsert_binding(&state, &admin, "tenant-a", "lib", "bob", vec!["write".into()]).unwrap();
        let binding = get_binding(&state, &admin, "tenant-a", "lib", "bob").unwrap();
        assert_eq!(binding.roles, vec!["write".to_string()]);
        let audited = artifortress_audit::list_for_tenant(&state.metastore, "tenant-a");
        assert!(audited.iter().any(|e| e.action == "binding.upsert"));
    }
}
