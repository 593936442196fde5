use artifortress_types::Scope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalSource {
    PersonalAccessToken,
    Oidc,
    Saml,
}

#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: String,
    pub tenant_id: String,
    pub scopes: Vec<Scope>,
    pub source: PrincipalSource,
}
