//! Lock management for plan isolation.
//!
//! The lock manager grants table- and row-level locks to transaction
//! batches. A batch requests all of its locks up front and the grant is
//! all-or-nothing: either every request is compatible with the current
//! grant table and all are granted together, or none are and the denial
//! names the conflicting grant.
//!
//! # Lock Compatibility Matrix
//!
//! ```text
//!          │ S  │ X  │
//! ─────────┼────┼────┤
//!     S    │ ✓  │ ✗  │
//!     X    │ ✗  │ ✗  │
//! ```
//!
//! Compatibility is judged across batches; a batch never conflicts with
//! its own grants. A row request additionally checks its owning table: an
//! exclusive table lock held by another batch denies every row request
//! under that table.
//!
//! All state lives behind one process-wide `parking_lot::Mutex`. Coarse,
//! but the check-then-grant sequence is trivially atomic and no deadlock
//! detection is needed: batches never wait.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use quarry_common::config::LockConfig;
use quarry_common::types::{BatchId, DatabaseId, RowId, SchemaId, TreeAddress};

/// Lock mode for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKind {
    /// Shared lock (readers).
    Shared,
    /// Exclusive lock (writers).
    Exclusive,
}

impl LockKind {
    /// Checks if this lock kind is compatible with another batch's grant.
    #[must_use]
    pub const fn is_compatible_with(self, other: LockKind) -> bool {
        matches!((self, other), (LockKind::Shared, LockKind::Shared))
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Shared => write!(f, "S"),
            LockKind::Exclusive => write!(f, "X"),
        }
    }
}

/// The category of a lockable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockableKind {
    /// A whole database.
    Database,
    /// A schema within a database.
    Schema,
    /// A table.
    Table,
    /// A single row.
    Row,
}

/// The identity of a lockable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockTarget {
    /// A whole database.
    Database(DatabaseId),
    /// A schema within a database.
    Schema(DatabaseId, SchemaId),
    /// A table, named by its tree.
    Table(TreeAddress),
    /// A row, named by its owning tree and stable ID.
    Row(TreeAddress, RowId),
}

impl LockTarget {
    /// Returns the category of this target.
    #[must_use]
    pub const fn kind(&self) -> LockableKind {
        match self {
            LockTarget::Database(_) => LockableKind::Database,
            LockTarget::Schema(_, _) => LockableKind::Schema,
            LockTarget::Table(_) => LockableKind::Table,
            LockTarget::Row(_, _) => LockableKind::Row,
        }
    }

    /// Returns the owning table for a row target.
    #[must_use]
    pub const fn owning_table(&self) -> Option<LockTarget> {
        match self {
            LockTarget::Row(tree, _) => Some(LockTarget::Table(*tree)),
            _ => None,
        }
    }
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockTarget::Database(db) => write!(f, "database {db}"),
            LockTarget::Schema(db, schema) => write!(f, "schema {db}.{schema}"),
            LockTarget::Table(tree) => write!(f, "table {tree}"),
            LockTarget::Row(tree, row) => write!(f, "row {row} of table {tree}"),
        }
    }
}

/// One lock request within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRequest {
    /// The object to lock.
    pub target: LockTarget,
    /// The requested mode.
    pub kind: LockKind,
}

impl LockRequest {
    /// Creates a shared request.
    #[must_use]
    pub const fn shared(target: LockTarget) -> Self {
        Self {
            target,
            kind: LockKind::Shared,
        }
    }

    /// Creates an exclusive request.
    #[must_use]
    pub const fn exclusive(target: LockTarget) -> Self {
        Self {
            target,
            kind: LockKind::Exclusive,
        }
    }
}

/// A lock held by a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantedLock {
    /// The locked object.
    pub target: LockTarget,
    /// The granted mode.
    pub kind: LockKind,
    /// The holding batch.
    pub batch_id: BatchId,
}

impl fmt::Display for GrantedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lock on {} held by batch {}",
            self.kind, self.target, self.batch_id
        )
    }
}

/// Lock manager statistics.
#[derive(Debug, Default)]
pub struct LockStats {
    batches_granted: AtomicU64,
    batches_denied: AtomicU64,
    locks_granted: AtomicU64,
    locks_released: AtomicU64,
}

impl LockStats {
    /// Returns batches granted.
    pub fn batches_granted(&self) -> u64 {
        self.batches_granted.load(Ordering::Relaxed)
    }

    /// Returns batches denied.
    pub fn batches_denied(&self) -> u64 {
        self.batches_denied.load(Ordering::Relaxed)
    }

    /// Returns individual locks granted.
    pub fn locks_granted(&self) -> u64 {
        self.locks_granted.load(Ordering::Relaxed)
    }

    /// Returns individual locks released.
    pub fn locks_released(&self) -> u64 {
        self.locks_released.load(Ordering::Relaxed)
    }
}

/// The all-or-nothing batch lock table.
#[derive(Debug, Default)]
pub struct LockManager {
    grants: Mutex<HashMap<LockTarget, Vec<GrantedLock>>>,
    stats: LockStats,
    config: LockConfig,
}

impl LockManager {
    /// Creates an empty lock manager with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty lock manager with the given configuration.
    #[must_use]
    pub fn with_config(config: LockConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the manager's statistics.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &LockStats {
        &self.stats
    }

    /// Attempts to grant every request for a batch.
    ///
    /// Either all requests are granted together or none are; a denial
    /// returns the conflicting grant so the caller can report it. Batches
    /// never wait.
    pub fn try_lock_batch(
        &self,
        batch_id: BatchId,
        requests: &[LockRequest],
    ) -> Result<(), GrantedLock> {
        let mut grants = self.grants.lock();

        // Check phase: every request must be compatible before any grant.
        for request in requests {
            if let Some(conflict) = Self::find_conflict(&grants, batch_id, request) {
                if self.config.enable_stats {
                    self.stats.batches_denied.fetch_add(1, Ordering::Relaxed);
                }
                tracing::warn!(
                    batch = %batch_id,
                    conflict = %conflict,
                    "lock batch denied"
                );
                return Err(conflict);
            }
        }

        // Grant phase.
        for request in requests {
            grants.entry(request.target).or_default().push(GrantedLock {
                target: request.target,
                kind: request.kind,
                batch_id,
            });
        }
        if self.config.enable_stats {
            self.stats.batches_granted.fetch_add(1, Ordering::Relaxed);
            self.stats
                .locks_granted
                .fetch_add(requests.len() as u64, Ordering::Relaxed);
        }
        tracing::debug!(batch = %batch_id, locks = requests.len(), "lock batch granted");
        Ok(())
    }

    /// Releases every lock held by a batch. Returns the number released.
    pub fn release_batch(&self, batch_id: BatchId) -> usize {
        let mut grants = self.grants.lock();
        let mut released = 0;
        grants.retain(|_, held| {
            let before = held.len();
            held.retain(|g| g.batch_id != batch_id);
            released += before - held.len();
            !held.is_empty()
        });
        if self.config.enable_stats {
            self.stats
                .locks_released
                .fetch_add(released as u64, Ordering::Relaxed);
        }
        tracing::debug!(batch = %batch_id, locks = released, "lock batch released");
        released
    }

    /// Returns all grants currently held on a target.
    #[must_use]
    pub fn holders(&self, target: LockTarget) -> Vec<GrantedLock> {
        self.grants
            .lock()
            .get(&target)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns true if any batch holds a lock on the target.
    #[must_use]
    pub fn is_locked(&self, target: LockTarget) -> bool {
        !self.holders(target).is_empty()
    }

    /// Finds a grant conflicting with the request, if any.
    ///
    /// A row request first checks its owning table for an exclusive grant
    /// by another batch, then the row itself.
    fn find_conflict(
        grants: &HashMap<LockTarget, Vec<GrantedLock>>,
        batch_id: BatchId,
        request: &LockRequest,
    ) -> Option<GrantedLock> {
        if let Some(table) = request.target.owning_table() {
            if let Some(held) = grants.get(&table) {
                if let Some(conflict) = held
                    .iter()
                    .find(|g| g.batch_id != batch_id && g.kind == LockKind::Exclusive)
                {
                    return Some(*conflict);
                }
            }
        }

        grants.get(&request.target).and_then(|held| {
            held.iter()
                .find(|g| g.batch_id != batch_id && !request.kind.is_compatible_with(g.kind))
                .copied()
        })
    }
}
