use artifortress_types::{RoleBinding, Scope};

/// Derives default scopes for a PAT issued without explicit scopes, from
/// the subject's repo role bindings ("RoleBinding ... may derive
/// scopes when a PAT is issued without explicit scopes").
///
/// Bindings address repos by `repo_id`; scopes speak `repo_key`, so the
/// caller supplies the lookup. Bindings whose repo no longer resolves and
/// role strings outside the closed role set are skipped, not fatal.
pub fn derive_scopes_from_bindings(
    bindings: &[RoleBinding],
    repo_key_of: impl Fn(&str) -> Option<String>,
) -> Vec<Scope> {
    bindings
        .iter()
        .filter_map(|binding| repo_key_of(&binding.repo_id).map(|key| (key, &binding.roles)))
        .flat_map(|(repo_key, roles)| {
            roles
                .iter()
                .filter_map(move |role| Scope::parse(&format!("{repo_key}:{role}")).ok())
                .collect::<Vec<_>>()
        })
        .collect()
}
