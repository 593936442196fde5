//! Bounded-time policy evaluation and quarantine management: the
//! engine is modeled as a callable with a configurable deadline, failing
//! closed on timeout.

mod config;
mod engine;
mod error;

pub use config::PolicyConfig;
pub use engine::{SIMULATE_TIMEOUT_ENGINE_VERSION, evaluate_and_persist, is_digest_locked, resolve_quarantine};
pub use error::PolicyError;
