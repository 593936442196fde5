use artifortress_types::{RepoKeyOrWildcard, Role, Scope};

/// Scope-check rules:
/// - `*:admin` satisfies any required role on any repo.
/// - `repo:admin` satisfies `{read, write, admin, promote}` on that repo.
/// - `repo:promote` satisfies `{read, promote}`.
/// - `repo:write` satisfies `{read, write}`.
/// - `repo:read` satisfies `{read}`.
pub fn has_role(scopes: &[Scope], repo_key: &str, required: Role) -> bool {
    scopes.iter().any(|scope| {
        if scope.is_global_admin() {
            return true;
        }
        let RepoKeyOrWildcard::Repo(scoped_repo) = &scope.repo_key else {
            return false;
        };
        if scoped_repo != repo_key {
            return false;
        }
        role_implies(scope.role, required)
    })
}

fn role_implies(held: Role, required: Role) -> bool {
    match held {
        Role::Admin => true,
        Role::Promote => matches!(required, Role::Read | Role::Promote),
        Role::Write => matches!(required, Role::Read | Role::Write),
        Role::Read => required == Role::Read,
    }
}
