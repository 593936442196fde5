use artifortress_metastore::InMemoryMetadataStore;
use artifortress_types::{PersonalAccessToken, Scope};
use chrono::{DateTime, Utc};
use rand::RngExt;
use rand::distr::Alphanumeric;

use crate::config::SamlConfig;
use crate::error::AuthError;
use crate::pat::hash_token;
use crate::saml::SamlAssertion;

/// Generates a random opaque bearer token. Only the SHA-256 hash is ever
/// persisted; the caller returns this plaintext value to the
/// subject exactly once.
fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect()
}

/// Issues a short-lived PAT bound to a validated SAML assertion's subject,
/// deriving scopes from the configured attribute-role mappings
/// ("SAML ACS ... resolves scopes from attribute mappings and issues a
/// short-lived PAT bound to the subject").
pub fn issue_pat_for_saml_assertion(
    store: &InMemoryMetadataStore,
    config: &SamlConfig,
    tenant_id: &str,
    assertion: &SamlAssertion,
    token_id: String,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let mut scopes = Vec::new();
    for mapping in &config.role_mappings {
        let matched = assertion
            .attributes
            .iter()
            .any(|(name, value)| name == &mapping.claim && (mapping.value == "*" || value == &mapping.value));
        if matched {
            if let Ok(scope) = Scope::parse(&format!("{}:{}", mapping.repo_key, mapping.role)) {
                scopes.push(scope);
            }
        }
    }

    let token = generate_token();
    let pat = PersonalAccessToken {
        token_id,
        tenant_id: tenant_id.to_string(),
        subject: assertion.name_id.clone(),
        token_hash: hash_token(&token),
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
        expires_at: Some(now + chrono::Duration::from_std(config.issued_pat_ttl).unwrap_or(chrono::Duration::hours(1))),
        revoked_at: None,
        created_at: now,
    };
    store
        .insert_pat(pat)
        .map_err(|e| AuthError::SamlRejected(format!("could not issue pat: {e}")))?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClaimRoleMapping;

    #[test]
    fn issues_pat_with_scopes_from_matching_attributes() {
        let store = InMemoryMetadataStore::new();
        let config = SamlConfig {
            sp_entity_id: "sp".into(),
            expected_issuer: "idp".into(),
            role_mappings: vec![ClaimRoleMapping {
                claim: "team".into(),
                value: "*".into(),
                repo_key: "lib".into(),
                role: "read".into(),
            }],
            issued_pat_ttl: std::time::Duration::from_secs(900),
        };
        let assertion = SamlAssertion {
            issuer: "idp".into(),
            audience: Some("sp".into()),
            name_id: "alice@example.com".into(),
            attributes: vec![("team".into(), "platform".into())],
        };
        let now = Utc::now();
        let token = issue_pat_for_saml_assertion(&store, &config, "tenant1", &assertion, "tok1".into(), now).unwrap();
        assert!(!token.is_empty());

        let principal = crate::pat::resolve_principal_from_pat(&store, &token).unwrap();
        assert_eq!(principal.subject, "alice@example.com");
        assert_eq!(principal.scopes.len(), 1);
    }
}
