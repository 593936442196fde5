//! Principal resolution and repo-scoped authorization: personal
//! access tokens, OIDC federation, SAML federation, and the `hasRole`
//! scope-check rules shared by every HTTP surface.

mod bootstrap;
mod config;
mod error;
mod issue;
mod oidc;
mod pat;
mod principal;
mod role_binding;
mod saml;
mod scope_check;

pub use bootstrap::check_bootstrap_header;
pub use config::{ClaimRoleMapping, FederationConfig, JwtAlgorithm, OidcConfig, Rs256Key, SamlConfig};
pub use error::AuthError;
pub use issue::issue_pat_for_saml_assertion;
pub use oidc::resolve_principal_from_jwt;
pub use pat::{constant_time_eq, hash_token, resolve_principal_from_pat};
pub use principal::{Principal, PrincipalSource};
pub use role_binding::derive_scopes_from_bindings;
pub use saml::{SamlAssertion, decode_saml_response, validate_assertion};
pub use scope_check::has_role;

use artifortress_metastore::InMemoryMetadataStore;

/// Resolves a principal from an `Authorization: Bearer <token>` header
/// value: tries the PAT path first, then falls back to OIDC verification
/// if configured, matching the "on miss, and if OIDC is configured"
/// fallback order.
pub fn resolve_principal(
    store: &InMemoryMetadataStore,
    federation: &FederationConfig,
    bearer_token: &str,
) -> Result<Principal, AuthError> {
    match pat::resolve_principal_from_pat(store, bearer_token) {
        Ok(principal) => Ok(principal),
        Err(AuthError::UnknownToken) => {
            let oidc = federation
                .oidc
                .as_ref()
                .ok_or(AuthError::UnknownToken)?;
            tracing::debug!("bearer token is not a known PAT, trying OIDC verification");
            oidc::resolve_principal_from_jwt(oidc, bearer_token)
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_types::PersonalAccessToken;
    use chrono::Utc;

    #[test]
    fn resolve_principal_falls_back_to_oidc_on_unknown_pat() {
        let store = InMemoryMetadataStore::new();
        let oidc = OidcConfig {
            issuer: "https://issuer.example".into(),
            audience: "artifortress".into(),
            algorithm: JwtAlgorithm::Hs256,
            hs256_secret: Some("test-secret".into()),
            ..OidcConfig::default()
        };
        let federation = FederationConfig {
            oidc: Some(oidc.clone()),
            saml: None,
            bootstrap_secret: None,
        };

        use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "iss": oidc.issuer,
            "aud": oidc.audience,
            "sub": "alice",
            "exp": now + 60,
        });
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();

        let principal = resolve_principal(&store, &federation, &token).unwrap();
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.source, PrincipalSource::Oidc);
    }

    #[test]
    fn resolve_principal_prefers_pat_over_oidc() {
        let store = InMemoryMetadataStore::new();
        let token = "pat-token";
        store
            .insert_pat(PersonalAccessToken {
                token_id: "t1".into(),
                tenant_id: "tenant1".into(),
                subject: "bob".into(),
                token_hash: hash_token(token),
                scopes: vec!["lib:write".into()],
                expires_at: None,
                revoked_at: None,
                created_at: Utc::now(),
            })
            .unwrap();
        let federation = FederationConfig::default();
        let principal = resolve_principal(&store, &federation, token).unwrap();
        assert_eq!(principal.subject, "bob");
        assert_eq!(principal.source, PrincipalSource::PersonalAccessToken);
    }

    #[test]
    fn resolve_principal_errors_when_no_oidc_configured() {
        let store = InMemoryMetadataStore::new();
        let federation = FederationConfig::default();
        let err = resolve_principal(&store, &federation, "nope").unwrap_err();
        assert!(matches!(err, AuthError::UnknownToken));
    }
}
