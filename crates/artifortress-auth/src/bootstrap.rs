use crate::config::FederationConfig;
use crate::error::AuthError;
use crate::pat::constant_time_eq;

/// "Bootstrap": a PAT may be issued with the bootstrap header instead of an
/// authenticated `*:admin` principal. The header typically mints a tenant's
/// very first token, but stays valid afterwards; its value is compared to
/// the configured secret in constant time.
pub fn check_bootstrap_header(config: &FederationConfig, header_value: &str) -> Result<(), AuthError> {
    let secret = config
        .bootstrap_secret
        .as_deref()
        .ok_or(AuthError::BootstrapMismatch)?;
    if !constant_time_eq(header_value, secret) {
        return Err(AuthError::BootstrapMismatch);
    }
    Ok(())
}
