//! Metadata Store Adapter contract and its in-memory reference
//! implementation: every relational table backing repositories, tokens,
//! blobs, uploads, packages, versions, outbox events, policy evaluations,
//! quarantine, garbage collection, and audit history.
//!
//! A real deployment swaps `InMemoryMetadataStore` for a Postgres-backed
//! implementation; that adapter is outside this crate's scope, but every
//! method here is written so the conditional-update and row-lock idioms
//! translate directly to `UPDATE ... WHERE` and `SELECT ... FOR UPDATE`.

mod audit;
mod blobs;
mod db;
mod error;
mod gc;
mod outbox;
mod policy;
mod repos;
mod row_lock;
mod uploads;
mod versions;

pub use db::InMemoryMetadataStore;
pub use error::MetaError;
pub use row_lock::{RowGuard, RowLockTable};
