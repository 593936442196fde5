//! Mark-and-sweep garbage collection: computes the root set of
//! reachable blob digests from live artifact entries and manifests, then
//! sweeps old, unreferenced blobs and elapsed tombstoned versions.

mod config;
mod engine;
mod error;

pub use config::GcConfig;
pub use engine::{mark_root_set, run, select_candidates, start_run};
pub use error::GcError;
