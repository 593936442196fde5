use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingCredential,

    #[error("token is not a recognized personal access token")]
    UnknownToken,

    #[error("token is expired or revoked")]
    InactiveToken,

    #[error("federated token rejected: {0}")]
    FederationRejected(String),

    #[error("saml response rejected: {0}")]
    SamlRejected(String),

    #[error("bootstrap header did not match the configured secret")]
    BootstrapMismatch,

    #[error("principal lacks required scope {repo_key}:{required}")]
    Forbidden { repo_key: String, required: String },
}
