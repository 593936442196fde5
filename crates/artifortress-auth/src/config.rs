use std::time::Duration;

/// Claim-to-role mapping rule: `claim|value|repo_key|role`, where `value
/// == "*"` matches any non-empty claim value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRoleMapping {
    pub claim: String,
    pub value: String,
    pub repo_key: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    Hs256,
    Rs256,
}

/// One RS256 verification key from the configured JWKS. A key without a
/// `kid` can only be used when it is the sole key configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rs256Key {
    pub kid: Option<String>,
    pub public_key_pem: String,
}

#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub issuer: String,
    pub audience: String,
    pub algorithm: JwtAlgorithm,
    pub hs256_secret: Option<String>,
    pub rs256_keys: Vec<Rs256Key>,
    pub claim_role_mappings: Vec<ClaimRoleMapping>,
}

#[derive(Debug, Clone)]
pub struct SamlConfig {
    pub sp_entity_id: String,
    pub expected_issuer: String,
    pub role_mappings: Vec<ClaimRoleMapping>,
    pub issued_pat_ttl: Duration,
}

/// Federation settings ("OIDC/SAML settings shape"): mirrors
/// `CloudStorageConfig`'s shape of named knobs with sensible defaults,
/// wired up by the out-of-scope configuration-loading collaborator.
#[derive(Debug, Clone, Default)]
pub struct FederationConfig {
    pub oidc: Option<OidcConfig>,
    pub saml: Option<SamlConfig>,
    pub bootstrap_secret: Option<String>,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            audience: String::new(),
            algorithm: JwtAlgorithm::Hs256,
            hs256_secret: None,
            rs256_keys: Vec::new(),
            claim_role_mappings: Vec::new(),
        }
    }
}

impl Default for SamlConfig {
    fn default() -> Self {
        Self {
            sp_entity_id: String::new(),
            expected_issuer: String::new(),
            role_mappings: Vec::new(),
            issued_pat_ttl: Duration::from_secs(3600),
        }
    }
}
