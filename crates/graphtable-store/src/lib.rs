//! Graphtable Record Store
//!
//! The minimal contract the relationship engine needs from a sorted
//! key-value store with one global secondary index:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SINGLE PHYSICAL TABLE                          │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │   primary_key          sort_key            kind_tag     name        │
//! │   ───────────          ────────            ────────     ────        │
//! │   u-1                  --root--            USER         Alice       │
//! │   v-1_VIDEO-OWNERSHIP  u-1_VIDEO-OWNERSHIP VIDEO-OWN..  -           │
//! │                              │                                      │
//! │                              ▼                                      │
//! │                  ┌──────────────────────┐                           │
//! │                  │ lookup index         │                           │
//! │                  │ (lookup_key=sort_key)│                           │
//! │                  └──────────────────────┘                           │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Features
//!
//! - **Conditional writes only**: `put_if_absent`, presence-checked deletes,
//!   partition checks. Nothing in the adapter overwrites a record blindly.
//! - **Atomic commits**: a bounded list of operations applied all-or-nothing.
//! - **Idempotency tokens**: resubmitting an identical commit is a no-op.
//! - **Reference backend**: [`MemoryStore`] implements the full contract
//!   in-process and doubles as the test backend.

pub mod config;
pub mod error;
pub mod memory;


pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, TableSnapshot};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Core Types
// ============================================================================

/// The table's only uniqueness constraint: one record per key pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub primary_key: String,
    pub sort_key: String,
}

impl RecordKey {
    pub fn new(primary_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            sort_key: sort_key.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.primary_key, self.sort_key)
    }
}

/// A physical record: an entity or one relationship edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub primary_key: String,
    pub sort_key: String,
    pub kind_tag: String,
    /// Human-readable label, only present on entity records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Record {
    pub fn new(key: RecordKey, kind_tag: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            primary_key: key.primary_key,
            sort_key: key.sort_key,
            kind_tag: kind_tag.into(),
            display_name,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.primary_key.clone(), self.sort_key.clone())
    }

    /// Value projected into the secondary index.
    pub fn lookup_key(&self) -> &str {
        &self.sort_key
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{type: {}, pk: {}, sk: {}",
            self.kind_tag, self.primary_key, self.sort_key
        )?;
        if let Some(name) = &self.display_name {
            write!(f, ", name: {name}")?;
        }
        write!(f, "}}")
    }
}

/// Caller-supplied token that makes resubmission of a commit a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyToken(String);

impl IdempotencyToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Atomic Commits
// ============================================================================

/// One conditional operation inside an atomic commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    /// Insert a record; the key pair must be absent.
    Put(Record),
    /// Remove a record; the key pair must be present.
    Delete(RecordKey),
    /// Condition check: the partition must hold exactly these sort keys.
    ExpectPartition {
        primary_key: String,
        sort_keys: BTreeSet<String>,
    },
}

impl WriteOp {
    fn target(&self) -> OpTarget<'_> {
        match self {
            WriteOp::Put(record) => OpTarget::Item(&record.primary_key, &record.sort_key),
            WriteOp::Delete(key) => OpTarget::Item(&key.primary_key, &key.sort_key),
            WriteOp::ExpectPartition { primary_key, .. } => OpTarget::Partition(primary_key),
        }
    }

    fn digest_into(&self, hasher: &mut Sha256) {
        fn field(hasher: &mut Sha256, value: &str) {
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }

        match self {
            WriteOp::Put(record) => {
                hasher.update([0u8]);
                field(hasher, &record.primary_key);
                field(hasher, &record.sort_key);
                field(hasher, &record.kind_tag);
                match &record.display_name {
                    Some(name) => {
                        hasher.update([1u8]);
                        field(hasher, name);
                    }
                    None => hasher.update([0u8]),
                }
            }
            WriteOp::Delete(key) => {
                hasher.update([1u8]);
                field(hasher, &key.primary_key);
                field(hasher, &key.sort_key);
            }
            WriteOp::ExpectPartition {
                primary_key,
                sort_keys,
            } => {
                hasher.update([2u8]);
                field(hasher, primary_key);
                hasher.update((sort_keys.len() as u64).to_le_bytes());
                for sort_key in sort_keys {
                    field(hasher, sort_key);
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum OpTarget<'a> {
    Item(&'a str, &'a str),
    Partition(&'a str),
}

/// An ordered, all-or-nothing set of conditional operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub token: IdempotencyToken,
    pub ops: Vec<WriteOp>,
}

impl Commit {
    pub fn new(token: IdempotencyToken) -> Self {
        Self {
            token,
            ops: Vec::new(),
        }
    }

    pub fn with_op(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// SHA-256 over the operation list; two commits with the same
    /// fingerprint describe the same mutation.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update((self.ops.len() as u64).to_le_bytes());
        for op in &self.ops {
            op.digest_into(&mut hasher);
        }
        hasher.finalize().into()
    }

    /// Structural checks that do not depend on table state.
    pub fn validate(&self, max_ops: usize) -> StoreResult<()> {
        if self.ops.is_empty() {
            return Err(StoreError::InvalidCommit("commit has no operations".into()));
        }
        if self.ops.len() > max_ops {
            return Err(StoreError::InvalidCommit(format!(
                "commit has {} operations, limit is {max_ops}",
                self.ops.len()
            )));
        }

        let mut seen = BTreeSet::new();
        for op in &self.ops {
            if !seen.insert(op.target()) {
                return Err(StoreError::InvalidCommit(format!(
                    "commit targets {:?} more than once",
                    op.target()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The operations were applied by this call.
    Applied,
    /// The token was already committed with identical operations.
    Replayed,
}

// ============================================================================
// Store Contract
// ============================================================================

/// Operations the relationship engine requires from the underlying table.
pub trait RecordStore: Send + Sync {
    /// Point read; a missing record is `Ok(None)`.
    fn get(&self, key: &RecordKey) -> StoreResult<Option<Record>>;

    /// Insert succeeding only when the key pair is absent.
    fn put_if_absent(&self, record: Record) -> StoreResult<PutOutcome>;

    /// Idempotent delete.
    fn delete(&self, key: &RecordKey) -> StoreResult<()>;

    /// All records under one primary key, ordered by sort key.
    fn query_by_primary_key(&self, primary_key: &str) -> StoreResult<Vec<Record>>;

    /// Secondary index scan with full projection.
    fn query_by_lookup_key(&self, lookup_key: &str) -> StoreResult<Vec<Record>>;

    /// Apply every operation of `commit` or none of them.
    fn atomic_commit(&self, commit: &Commit) -> StoreResult<CommitOutcome>;

    /// Every record, ordered by key pair.
    fn scan(&self) -> StoreResult<Vec<Record>>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn get(&self, key: &RecordKey) -> StoreResult<Option<Record>> {
        (**self).get(key)
    }

    fn put_if_absent(&self, record: Record) -> StoreResult<PutOutcome> {
        (**self).put_if_absent(record)
    }

    fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn query_by_primary_key(&self, primary_key: &str) -> StoreResult<Vec<Record>> {
        (**self).query_by_primary_key(primary_key)
    }

    fn query_by_lookup_key(&self, lookup_key: &str) -> StoreResult<Vec<Record>> {
        (**self).query_by_lookup_key(lookup_key)
    }

    fn atomic_commit(&self, commit: &Commit) -> StoreResult<CommitOutcome> {
        (**self).atomic_commit(commit)
    }

    fn scan(&self) -> StoreResult<Vec<Record>> {
        (**self).scan()
    }
}
