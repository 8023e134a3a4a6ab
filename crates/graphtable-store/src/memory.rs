//! In-memory record store.
//!
//! One primary table ordered by `(primary_key, sort_key)` and one lookup
//! index keyed on `sort_key`, both behind a single `RwLock`. A commit holds
//! the write lock across validation and application, which is what makes it
//! atomic with respect to every other reader and writer.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::{
    Commit, CommitOutcome, PutOutcome, Record, RecordKey, RecordStore, StoreConfig, StoreError,
    StoreResult, WriteOp,
};

// ============================================================================
// Table State
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    fingerprint: [u8; 32],
    committed_at: Instant,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<RecordKey, Record>,
    /// `lookup_key -> {record keys}`
    lookup: BTreeMap<String, BTreeSet<RecordKey>>,
    /// Committed idempotency tokens.
    ledger: HashMap<String, LedgerEntry>,
}

impl Table {
    fn contains(&self, key: &RecordKey) -> bool {
        self.rows.contains_key(key)
    }

    fn insert(&mut self, record: Record) {
        let key = record.key();
        self.lookup
            .entry(record.lookup_key().to_string())
            .or_default()
            .insert(key.clone());
        self.rows.insert(key, record);
    }

    fn remove(&mut self, key: &RecordKey) -> Option<Record> {
        let record = self.rows.remove(key)?;
        if let Some(keys) = self.lookup.get_mut(record.lookup_key()) {
            keys.remove(key);
            if keys.is_empty() {
                self.lookup.remove(record.lookup_key());
            }
        }
        Some(record)
    }

    fn partition<'a>(&'a self, primary_key: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        let start = RecordKey::new(primary_key, "");
        self.rows
            .range(start..)
            .take_while(move |(key, _)| key.primary_key == primary_key)
            .map(|(_, record)| record)
    }

    fn partition_sort_keys(&self, primary_key: &str) -> BTreeSet<String> {
        self.partition(primary_key)
            .map(|record| record.sort_key.clone())
            .collect()
    }

    /// Evaluate one operation's condition against current state.
    fn check(&self, op: &WriteOp) -> Result<(), String> {
        match op {
            WriteOp::Put(record) => {
                let key = record.key();
                if self.contains(&key) {
                    return Err(format!("record {key} already exists"));
                }
            }
            WriteOp::Delete(key) => {
                if !self.contains(key) {
                    return Err(format!("record {key} no longer exists"));
                }
            }
            WriteOp::ExpectPartition {
                primary_key,
                sort_keys,
            } => {
                let actual = self.partition_sort_keys(primary_key);
                if &actual != sort_keys {
                    return Err(format!(
                        "partition {primary_key} changed: expected {sort_keys:?}, found {actual:?}"
                    ));
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, op: &WriteOp) {
        match op {
            WriteOp::Put(record) => self.insert(record.clone()),
            WriteOp::Delete(key) => {
                self.remove(key);
            }
            WriteOp::ExpectPartition { .. } => {}
        }
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// Reference [`RecordStore`] backend living entirely in process memory.
#[derive(Debug)]
pub struct MemoryStore {
    config: StoreConfig,
    table: RwLock<Table>,
    unavailable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::unchecked(StoreConfig::default())
    }

    /// Store with custom limits. Fails if the limits are invalid.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    fn unchecked(config: StoreConfig) -> Self {
        Self {
            config,
            table: RwLock::new(Table::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Rebuild a store from a snapshot. Duplicate key pairs are rejected.
    pub fn from_snapshot(snapshot: TableSnapshot, config: StoreConfig) -> StoreResult<Self> {
        let store = Self::with_config(config)?;
        {
            let mut table = store.table.write();
            for record in snapshot.records {
                let key = record.key();
                if table.contains(&key) {
                    return Err(StoreError::conflict(format!(
                        "snapshot contains record {key} twice"
                    )));
                }
                table.insert(record);
            }
        }
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().rows.is_empty()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            records: self.table.read().rows.values().cloned().collect(),
        }
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &RecordKey) -> StoreResult<Option<Record>> {
        self.check_available()?;
        Ok(self.table.read().rows.get(key).cloned())
    }

    fn put_if_absent(&self, record: Record) -> StoreResult<PutOutcome> {
        self.check_available()?;
        let mut table = self.table.write();
        if table.contains(&record.key()) {
            return Ok(PutOutcome::AlreadyExists);
        }
        table.insert(record);
        Ok(PutOutcome::Created)
    }

    fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        self.check_available()?;
        self.table.write().remove(key);
        Ok(())
    }

    fn query_by_primary_key(&self, primary_key: &str) -> StoreResult<Vec<Record>> {
        self.check_available()?;
        let table = self.table.read();
        Ok(table.partition(primary_key).cloned().collect())
    }

    fn query_by_lookup_key(&self, lookup_key: &str) -> StoreResult<Vec<Record>> {
        self.check_available()?;
        let table = self.table.read();
        let Some(keys) = table.lookup.get(lookup_key) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| table.rows.get(key).cloned())
            .collect())
    }

    fn atomic_commit(&self, commit: &Commit) -> StoreResult<CommitOutcome> {
        self.check_available()?;
        commit.validate(self.config.max_commit_ops)?;
        let fingerprint = commit.fingerprint();
        let window = self.config.idempotency_window();

        let mut table = self.table.write();
        table
            .ledger
            .retain(|_, entry| entry.committed_at.elapsed() < window);

        if let Some(entry) = table.ledger.get(commit.token.as_str()) {
            if entry.fingerprint == fingerprint {
                tracing::debug!(token = %commit.token, "commit replayed from idempotency ledger");
                return Ok(CommitOutcome::Replayed);
            }
            return Err(StoreError::IdempotencyMismatch {
                token: commit.token.to_string(),
            });
        }

        for op in &commit.ops {
            if let Err(reason) = table.check(op) {
                tracing::debug!(token = %commit.token, %reason, "commit condition failed");
                return Err(StoreError::Conflict { reason });
            }
        }

        for op in &commit.ops {
            table.apply(op);
        }
        table.ledger.insert(
            commit.token.to_string(),
            LedgerEntry {
                fingerprint,
                committed_at: Instant::now(),
            },
        );
        Ok(CommitOutcome::Applied)
    }

    fn scan(&self) -> StoreResult<Vec<Record>> {
        self.check_available()?;
        Ok(self.table.read().rows.values().cloned().collect())
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// Serializable copy of every record in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub records: Vec<Record>,
}

impl TableSnapshot {
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> StoreResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
