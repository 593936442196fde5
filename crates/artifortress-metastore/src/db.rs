use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use artifortress_types::*;

use std::time::Duration;

use crate::error::MetaError;
use crate::row_lock::{RowGuard, RowLockTable};

/// The `InMemoryMetadataStore`: every entity table behind
/// its own mutex, plus the row-lock table used for conditional,
/// lock-then-validate-then-mutate transactions.
///
/// This is the one reference implementation of the Metadata Store Adapter
/// contract; a real deployment replaces it with Postgres, which is outside
/// this crate's scope.
pub struct InMemoryMetadataStore {
    pub(crate) row_locks: RowLockTable,

    pub(crate) repos: Mutex<HashMap<String, Repository>>,
    pub(crate) repo_keys: Mutex<HashMap<(TenantId, String), String>>,

    pub(crate) pats: Mutex<HashMap<String, PersonalAccessToken>>,
    pub(crate) pats_by_hash: Mutex<HashMap<String, String>>,
    pub(crate) role_bindings: Mutex<HashMap<(String, String), RoleBinding>>,

    pub(crate) blobs: Mutex<HashMap<String, Blob>>,
    pub(crate) upload_sessions: Mutex<HashMap<String, UploadSession>>,

    pub(crate) packages: Mutex<HashMap<String, Package>>,
    pub(crate) package_index: Mutex<HashMap<(String, String, String, String), String>>,

    pub(crate) versions: Mutex<HashMap<String, PackageVersion>>,
    pub(crate) version_index: Mutex<HashMap<(String, String, String), String>>,
    pub(crate) entries: Mutex<HashMap<String, Vec<ArtifactEntry>>>,
    pub(crate) manifests: Mutex<HashMap<String, Manifest>>,
    pub(crate) tombstones: Mutex<HashMap<String, Tombstone>>,

    pub(crate) outbox: Mutex<Vec<OutboxEvent>>,
    pub(crate) outbox_index: Mutex<HashSet<(TenantId, String, String, String)>>,

    pub(crate) policy_evaluations: Mutex<Vec<PolicyEvaluation>>,
    pub(crate) quarantine: Mutex<HashMap<String, QuarantineItem>>,
    pub(crate) quarantine_index: Mutex<HashMap<(TenantId, String, String), String>>,

    pub(crate) gc_runs: Mutex<HashMap<String, GcRun>>,
    pub(crate) gc_marks: Mutex<HashMap<String, HashSet<String>>>,

    pub(crate) audit: Mutex<Vec<AuditEntry>>,
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            row_locks: RowLockTable::new(),
            repos: Mutex::new(HashMap::new()),
            repo_keys: Mutex::new(HashMap::new()),
            pats: Mutex::new(HashMap::new()),
            pats_by_hash: Mutex::new(HashMap::new()),
            role_bindings: Mutex::new(HashMap::new()),
            blobs: Mutex::new(HashMap::new()),
            upload_sessions: Mutex::new(HashMap::new()),
            packages: Mutex::new(HashMap::new()),
            package_index: Mutex::new(HashMap::new()),
            versions: Mutex::new(HashMap::new()),
            version_index: Mutex::new(HashMap::new()),
            entries: Mutex::new(HashMap::new()),
            manifests: Mutex::new(HashMap::new()),
            tombstones: Mutex::new(HashMap::new()),
            outbox: Mutex::new(Vec::new()),
            outbox_index: Mutex::new(HashSet::new()),
            policy_evaluations: Mutex::new(Vec::new()),
            quarantine: Mutex::new(HashMap::new()),
            quarantine_index: Mutex::new(HashMap::new()),
            gc_runs: Mutex::new(HashMap::new()),
            gc_marks: Mutex::new(HashMap::new()),
            audit: Mutex::new(Vec::new()),
        }
    }

    /// Emulates `SELECT ... FOR UPDATE`: callers performing a
    /// lock-then-validate-then-mutate sequence across several tables take
    /// this guard before reading, and hold it until every write in the
    /// transaction has landed.
    pub fn lock_row(&self, table: &str, key: &str, timeout: Duration) -> Result<RowGuard, MetaError> {
        self.row_locks.lock_row(table, key, timeout)
    }
}
