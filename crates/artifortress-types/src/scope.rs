//! Scope string parsing ("Repo Scope").
//!
//! A scope is always `repo_key:role` or the global wildcard `*:admin`. This
//! module only parses the value type; the implication rules for whether a
//! set of scopes satisfies a required role on a repo live in
//! `artifortress-auth`, since that's authorization logic rather than a
//! shared value type.

use serde::{Deserialize, Serialize};

use crate::enums::Role;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope {
    pub repo_key: RepoKeyOrWildcard,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepoKeyOrWildcard {
    Wildcard,
    Repo(String),
}

impl Scope {
    pub fn parse(s: &str) -> Result<Self, String> {
        let (repo_part, role_part) = s
            .split_once(':')
            .ok_or_else(|| format!("scope {s:?} is missing ':'"))?;
        if repo_part.is_empty() {
            return Err(format!("scope {s:?} has an empty repo part"));
        }
        let repo_key = if repo_part == "*" {
            RepoKeyOrWildcard::Wildcard
        } else {
            RepoKeyOrWildcard::Repo(repo_part.to_string())
        };
        let role: Role = role_part
            .parse()
            .map_err(|_| format!("scope {s:?} has an unknown role {role_part:?}"))?;
        if matches!(repo_key, RepoKeyOrWildcard::Wildcard) && role != Role::Admin {
            return Err("wildcard scope must be \"*:admin\"".to_string());
        }
        Ok(Scope { repo_key, role })
    }

    pub fn is_global_admin(&self) -> bool {
        matches!(self.repo_key, RepoKeyOrWildcard::Wildcard) && self.role == Role::Admin
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repo = match &self.repo_key {
            RepoKeyOrWildcard::Wildcard => "*",
            RepoKeyOrWildcard::Repo(r) => r.as_str(),
        };
        write!(f, "{repo}:{}", self.role.as_str())
    }
}

impl TryFrom<String> for Scope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Scope::parse(&value)
    }
}

impl From<Scope> for String {
    fn from(value: Scope) -> Self {
        value.to_string()
    }
}

/// `repo_key` validation shared by repository creation and scope
/// parsing: repo keys may never contain `:` since that's the scope
/// separator.
pub fn validate_repo_key(repo_key: &str) -> Result<(), String> {
    if repo_key.is_empty() {
        return Err("repo_key must not be empty".to_string());
    }
    if repo_key.contains(':') {
        return Err("repo_key must not contain ':'".to_string());
    }
    if repo_key == "*" {
        return Err("repo_key must not be the wildcard \"*\"".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repo_scoped() {
        let s = Scope::parse("lib:write").unwrap();
        assert_eq!(s.role, Role::Write);
        assert!(!s.is_global_admin());
        assert_eq!(s.to_string(), "lib:write");
    }

    #[test]
    fn parses_wildcard_admin() {
        let s = Scope::parse("*:admin").unwrap();
        assert!(s.is_global_admin());
    }

    #[test]
    fn rejects_wildcard_non_admin() {
        assert!(Scope::parse("*:read").is_err());
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(Scope::parse("lib").is_err());
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Scope::parse("lib:superuser").is_err());
    }

    #[test]
    fn repo_key_rejects_colon_and_wildcard() {
        assert!(validate_repo_key("a:b").is_err());
        assert!(validate_repo_key("*").is_err());
        assert!(validate_repo_key("").is_err());
        assert!(validate_repo_key("lib").is_ok());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Display and parse are inverses over every valid repo-scoped
            /// scope string.
            #[test]
            fn scope_round_trips_through_display(
                repo in "[a-z][a-z0-9._-]{0,20}",
                role in "(read|write|admin|promote)",
            ) {
                prop_assume!(repo != "*");
                let rendered = format!("{repo}:{role}");
                let parsed = Scope::parse(&rendered).unwrap();
                prop_assert_eq!(parsed.to_string(), rendered);
            }

            /// A validated repo key always yields a parseable scope; keys
            /// the validator rejects are exactly the ones scope syntax
            /// cannot carry.
            #[test]
            fn valid_repo_keys_form_valid_scopes(repo in "[a-zA-Z0-9._/-]{1,24}") {
                match validate_repo_key(&repo) {
                    Ok(()) => prop_assert!(Scope::parse(&format!("{repo}:read")).is_ok()),
                    Err(_) => prop_assert!(repo.is_empty() || repo.contains(':') || repo == "*"),
                }
            }
        }
    }
}
