//! Shared entities, closed-enum state machines, and error taxonomy for
//! Artifortress.
//!
//! This crate carries no behavior beyond value-type invariants (format
//! validation, uniqueness-key derivation, state-graph edges). Every
//! component crate depends on it for a common vocabulary instead of
//! re-declaring these shapes.

pub mod digest;
pub mod entities;
pub mod enums;
pub mod error;
pub mod scope;

pub use entities::*;
pub use enums::*;
pub use error::{ArtifortressError, ConflictDetail};
pub use scope::{RepoKeyOrWildcard, Scope, validate_repo_key};
