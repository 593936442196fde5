//! `/v1/auth/*` workflows: PAT issuance/revocation, `whoami`,
//! and the SAML metadata/ACS pair. Bearer-token resolution itself lives in
//! `artifortress_auth::resolve_principal`; this module is the
//! role-gated write surface around it.

use std::collections::HashMap;

use artifortress_auth::{Principal, hash_token};
use artifortress_types::{ArtifortressError, PersonalAccessToken, Scope};
use chrono::{DateTime, Utc};
use rand::RngExt;
use rand::distr::Alphanumeric;

use crate::state::AppState;

pub struct WhoAmI {
    pub subject: String,
    pub tenant_id: String,
    pub scopes: Vec<String>,
    pub source: &'static str,
}

pub fn whoami(principal: &Principal) -> WhoAmI {
    WhoAmI {
        subject: principal.subject.clone(),
        tenant_id: principal.tenant_id.clone(),
        scopes: principal.scopes.iter().map(|s| s.to_string()).collect(),
        source: match principal.source {
            artifortress_auth::PrincipalSource::PersonalAccessToken => "personal_access_token",
            artifortress_auth::PrincipalSource::Oidc => "oidc",
            artifortress_auth::PrincipalSource::Saml => "saml",
        },
    }
}

fn is_global_admin(principal: &Principal) -> bool {
    principal.scopes.iter().any(|s| s.is_global_admin())
}

fn generate_token() -> String {
    rand::rng().sample_iter(&Alphanumeric).take(40).map(char::from).collect()
}

fn generate_token_id() -> String {
    let suffix: String = rand::rng().sample_iter(&Alphanumeric).take(20).map(char::from).collect();
    format!("pat-{suffix}")
}

pub struct IssuedPat {
    pub token_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// `POST /v1/auth/pats`: authorized either by an existing `*:admin`
/// principal or by the bootstrap header (the path that mints a tenant's
/// first token). A request without explicit scopes falls back to the
/// subject's role bindings. `ttl_minutes` is clamped to the 5-1440
/// minute window.
#[allow(clippy::too_many_arguments)]
pub fn issue_pat(
    state: &AppState,
    tenant_id: &str,
    actor: Option<&Principal>,
    bootstrap_header: Option<&str>,
    subject: &str,
    scopes: Vec<String>,
    ttl_minutes: i64,
    now: DateTime<Utc>,
) -> Result<IssuedPat, ArtifortressError> {
    match (actor, bootstrap_header) {
        (_, Some(header)) => {
            artifortress_auth::check_bootstrap_header(&state.federation, header)?;
        }
        (Some(principal), None) => {
            if !is_global_admin(principal) {
                return Err(ArtifortressError::Forbidden {
                    repo_key: "*".to_string(),
                    required: "admin",
                });
            }
        }
        (None, None) => return Err(ArtifortressError::Unauthenticated),
    }

    let parsed_scopes: Result<Vec<Scope>, String> = scopes.iter().map(|s| Scope::parse(s)).collect();
    parsed_scopes.map_err(ArtifortressError::validation)?;

    let scopes = if scopes.is_empty() {
        let bindings = state.metastore.list_role_bindings_for_subject(subject);
        artifortress_auth::derive_scopes_from_bindings(&bindings, |repo_id| {
            state.metastore.get_repository(repo_id).ok().map(|r| r.repo_key)
        })
        .iter()
        .map(|s| s.to_string())
        .collect()
    } else {
        scopes
    };

    let ttl_minutes = ttl_minutes.clamp(5, 1440);
    let token_id = generate_token_id();
    let token = generate_token();
    let expires_at = now + chrono::Duration::minutes(ttl_minutes);

    state.metastore.insert_pat(PersonalAccessToken {
        token_id: token_id.clone(),
        tenant_id: tenant_id.to_string(),
        subject: subject.to_string(),
        token_hash: hash_token(&token),
        scopes,
        expires_at: Some(expires_at),
        revoked_at: None,
        created_at: now,
    })?;

    artifortress_audit::record(
        &state.metastore,
        tenant_id,
        subject,
        "pat.issue",
        "personal_access_token",
        &token_id,
        HashMap::new(),
        now,
    );

    Ok(IssuedPat { token_id, token, expires_at })
}

/// `POST /v1/auth/pats/revoke`: `*:admin` only.
pub fn revoke_pat(state: &AppState, actor: &Principal, token_id: &str, now: DateTime<Utc>) -> Result<(), ArtifortressError> {
    if !is_global_admin(actor) {
        return Err(ArtifortressError::Forbidden {
            repo_key: "*".to_string(),
            required: "admin",
        });
    }
    state.metastore.revoke_pat(token_id, now)?;
    artifortress_audit::record(
        &state.metastore,
        &actor.tenant_id,
        &actor.subject,
        "pat.revoke",
        "personal_access_token",
        token_id,
        HashMap::new(),
        now,
    );
    Ok(())
}

/// `GET /v1/auth/saml/metadata`: unauthenticated; just the SP entity ID a
/// real IdP-facing metadata document would be built around.
pub fn saml_metadata(state: &AppState) -> Result<String, ArtifortressError> {
    let saml = state
        .federation
        .saml
        .as_ref()
        .ok_or_else(|| ArtifortressError::not_found("saml federation is not configured"))?;
    Ok(saml.sp_entity_id.clone())
}

/// `POST /v1/auth/saml/acs`: decodes and validates the assertion, then
/// issues a short-lived PAT bound to its subject.
pub fn saml_acs(state: &AppState, tenant_id: &str, encoded_response: &str, now: DateTime<Utc>) -> Result<String, ArtifortressError> {
    let saml = state
        .federation
        .saml
        .as_ref()
        .ok_or_else(|| ArtifortressError::not_found("saml federation is not configured"))?;

    let assertion = artifortress_auth::decode_saml_response(encoded_response)?;
    artifortress_auth::validate_assertion(saml, &assertion)?;

    let token = artifortress_auth::issue_pat_for_saml_assertion(&state.metastore, saml, tenant_id, &assertion, generate_token_id(), now)?;

    artifortress_audit::record(
        &state.metastore,
        tenant_id,
        &assertion.name_id,
        "pat.issue_via_saml",
        "personal_access_token",
        &assertion.name_id,
        HashMap::new(),
        now,
    );
    Ok(token)
}
