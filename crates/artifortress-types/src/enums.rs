//! Closed sum types for every state machine in the data model.
//!
//! Exhaustive matching on these variants replaces the polymorphic state
//! objects a class-hierarchy design would reach for; every transition in
//! the upload, version, policy, and GC state machines is expressed as a
//! match arm somewhere downstream rather than a subtype.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoType {
    Local,
    Remote,
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Read,
    Write,
    Admin,
    Promote,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::Write => "write",
            Role::Admin => "admin",
            Role::Promote => "promote",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Role::Read),
            "write" => Ok(Role::Write),
            "admin" => Ok(Role::Admin),
            "promote" => Ok(Role::Promote),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Upload session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Initiated,
    PartsUploading,
    PendingCommit,
    Committed,
    Aborted,
}

impl UploadState {
    /// Declared outgoing edges of the state graph; used to assert the
    /// engine never performs a transition it didn't mean to.
    pub fn allowed_next(&self) -> &'static [UploadState] {
        use UploadState::*;
        match self {
            Initiated => &[PartsUploading, Aborted],
            PartsUploading => &[PendingCommit, Aborted],
            PendingCommit => &[Committed, Aborted],
            Committed => &[],
            Aborted => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Committed | UploadState::Aborted)
    }
}

/// Package version lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionState {
    Draft,
    Published,
    Tombstoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    Publish,
    Promote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    Allow,
    Deny,
    Quarantine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    DefaultAllow,
    HintAllow,
    HintDeny,
    HintQuarantine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineStatus {
    Quarantined,
    Released,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcMode {
    DryRun,
    Execute,
}

/// Classification the object store adapter surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectErrorKind {
    InvalidRequest,
    NotFound,
    InvalidRange,
    AccessDenied,
    TransientFailure,
    UnexpectedFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_state_graph_has_no_edges_out_of_terminal_states() {
        assert!(UploadState::Committed.allowed_next().is_empty());
        assert!(UploadState::Aborted.allowed_next().is_empty());
    }

    #[test]
    fn upload_state_every_non_terminal_can_reach_aborted() {
        for state in [
            UploadState::Initiated,
            UploadState::PartsUploading,
            UploadState::PendingCommit,
        ] {
            assert!(state.allowed_next().contains(&UploadState::Aborted));
        }
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Read, Role::Write, Role::Admin, Role::Promote] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }
}
