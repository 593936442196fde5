use artifortress_metastore::InMemoryMetadataStore;
use artifortress_types::Scope;
use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::principal::{Principal, PrincipalSource};

/// SHA-256, lowercase hex — the only form a PAT is ever stored or compared
/// in ("hash with SHA-256, lowercase-hex").
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time byte comparison, used for both PAT-hash lookups backed by
/// a plain index (the hash itself already normalizes timing since lookups
/// are by equality on a fixed-size digest) and the bootstrap header check,
/// where the secret is compared directly rather than hashed first.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

pub fn resolve_principal_from_pat(
    store: &InMemoryMetadataStore,
    token: &str,
) -> Result<Principal, AuthError> {
    let hash = hash_token(token);
    let pat = store.find_pat_by_hash(&hash).ok_or(AuthError::UnknownToken)?;
    if !pat.is_active(Utc::now()) {
        return Err(AuthError::InactiveToken);
    }
    let scopes = pat
        .scopes
        .iter()
        .filter_map(|s| Scope::parse(s).ok())
        .collect();
    Ok(Principal {
        subject: pat.subject,
        tenant_id: pat.tenant_id,
        scopes,
        source: PrincipalSource::PersonalAccessToken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_types::PersonalAccessToken;

    #[test]
    fn hash_token_is_deterministic_lowercase_hex() {
        let h1 = hash_token("secret");
        let h2 = hash_token("secret");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn constant_time_eq_matches_equal_strings() {
        assert!(constant_time_eq("abc123", "abc123"));
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("short", "longer-string"));
    }

    #[test]
    fn resolve_principal_rejects_unknown_token() {
        let store = InMemoryMetadataStore::new();
        let err = resolve_principal_from_pat(&store, "nope").unwrap_err();
        assert!(matches!(err, AuthError::UnknownToken));
    }

    #[test]
    fn resolve_principal_rejects_revoked_token() {
        let store = InMemoryMetadataStore::new();
        let token = "tok-abc";
        let hash = hash_token(token);
        store
            .insert_pat(PersonalAccessToken {
                token_id: "t1".into(),
                tenant_id: "tenant1".into(),
                subject: "alice".into(),
                token_hash: hash,
                scopes: vec!["lib:write".into()],
                expires_at: None,
                revoked_at: Some(Utc::now()),
                created_at: Utc::now(),
            })
            .unwrap();
        let err = resolve_principal_from_pat(&store, token).unwrap_err();
        assert!(matches!(err, AuthError::InactiveToken));
    }

    #[test]
    fn resolve_principal_succeeds_with_parsed_scopes() {
        let store = InMemoryMetadataStore::new();
        let token = "tok-abc";
        let hash = hash_token(token);
        store
            .insert_pat(PersonalAccessToken {
                token_id: "t1".into(),
                tenant_id: "tenant1".into(),
                subject: "alice".into(),
                token_hash: hash,
                scopes: vec!["lib:write".into(), "*:admin".into()],
                expires_at: None,
                revoked_at: None,
                created_at: Utc::now(),
            })
            .unwrap();
        let principal = resolve_principal_from_pat(&store, token).unwrap();
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.scopes.len(), 2);
    }
}
