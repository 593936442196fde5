use artifortress_types::Scope;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{JwtAlgorithm, OidcConfig, Rs256Key};
use crate::error::AuthError;
use crate::principal::{Principal, PrincipalSource};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    scope: Option<Value>,
    #[serde(default)]
    scp: Option<Value>,
    #[serde(default)]
    artifortress_scopes: Option<Value>,
    #[serde(flatten)]
    rest: std::collections::HashMap<String, Value>,
}

/// Picks the RS256 key the token's header names. A token without a `kid`
/// is only acceptable against a single-key JWKS.
fn select_rs256_key<'a>(keys: &'a [Rs256Key], token: &str) -> Result<&'a Rs256Key, AuthError> {
    let header = decode_header(token).map_err(|e| AuthError::FederationRejected(e.to_string()))?;
    match header.kid {
        Some(kid) => keys
            .iter()
            .find(|k| k.kid.as_deref() == Some(kid.as_str()))
            .ok_or_else(|| AuthError::FederationRejected(format!("no RS256 key with kid {kid:?}"))),
        None if keys.len() == 1 => Ok(&keys[0]),
        None => Err(AuthError::FederationRejected(
            "token has no kid and more than one RS256 key is configured".into(),
        )),
    }
}

/// Verifies a compact JWT against the configured issuer/audience/algorithm
/// and derives a [`Principal`] from its scope and claim-role claims.
/// `tenant_id` is taken from the issuer since OIDC principals are not
/// otherwise tenant-scoped in this design.
pub fn resolve_principal_from_jwt(config: &OidcConfig, token: &str) -> Result<Principal, AuthError> {
    let mut validation = Validation::new(match config.algorithm {
        JwtAlgorithm::Hs256 => Algorithm::HS256,
        JwtAlgorithm::Rs256 => Algorithm::RS256,
    });
    validation.set_issuer(&[config.issuer.clone()]);
    validation.set_audience(&[config.audience.clone()]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let key = match config.algorithm {
        JwtAlgorithm::Hs256 => {
            let secret = config
                .hs256_secret
                .as_deref()
                .ok_or_else(|| AuthError::FederationRejected("no HS256 secret configured".into()))?;
            DecodingKey::from_secret(secret.as_bytes())
        }
        JwtAlgorithm::Rs256 => {
            if config.rs256_keys.is_empty() {
                return Err(AuthError::FederationRejected("no RS256 keys configured".into()));
            }
            let selected = select_rs256_key(&config.rs256_keys, token)?;
            DecodingKey::from_rsa_pem(selected.public_key_pem.as_bytes())
                .map_err(|e| AuthError::FederationRejected(format!("invalid RS256 key: {e}")))?
        }
    };

    let data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| AuthError::FederationRejected(e.to_string()))?;
    let claims = data.claims;

    let mut scopes: Vec<Scope> = Vec::new();
    for raw in [&claims.scope, &claims.scp, &claims.artifortress_scopes]
        .into_iter()
        .flatten()
    {
        scopes.extend(parse_scope_value(raw));
    }

    for mapping in &config.claim_role_mappings {
        if let Some(value) = claims.rest.get(&mapping.claim) {
            let matched = match value {
                Value::String(s) => mapping.value == "*" && !s.is_empty() || *s == mapping.value,
                other => other
                    .as_array()
                    .is_some_and(|arr| arr.iter().any(|v| v.as_str() == Some(mapping.value.as_str()))),
            };
            if matched {
                if let Ok(scope) = Scope::parse(&format!("{}:{}", mapping.repo_key, mapping.role)) {
                    scopes.push(scope);
                }
            }
        }
    }

    Ok(Principal {
        subject: claims.sub,
        tenant_id: config.issuer.clone(),
        scopes,
        source: PrincipalSource::Oidc,
    })
}

fn parse_scope_value(value: &Value) -> Vec<Scope> {
    match value {
        Value::String(s) => s.split_whitespace().filter_map(|t| Scope::parse(t).ok()).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(|t| Scope::parse(t).ok())
            .collect(),
        _ => Vec::new(),
    }
}
