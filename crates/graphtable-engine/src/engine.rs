//! Relationship engine: entity creation, edge mutation and the query
//! primitives, expressed as operations on a [`RecordStore`].
//!
//! ## Mutation protocol
//!
//! - **Entities** and **many-to-many edges** are single conditional puts.
//!   An existing key is reported as a value, never as an error.
//! - **One-to-many edges** are replaced atomically. `set_owner` reads the
//!   partition `{many_id}_{kind}`, then commits
//!
//!   ```text
//!   ExpectPartition(observed) ; Delete(each observed edge) ; Put(new edge)
//!   ```
//!
//!   under an idempotency token derived from the arguments and the observed
//!   state. A concurrent writer that changes the partition in between makes
//!   the partition check fail, and the caller receives
//!   [`EngineError::OwnerReassignConflict`]. A replayed token whose effect
//!   has since been undone is detected by re-reading the partition, and the
//!   commit is resubmitted once under a salted token.
//!
//! ## Queries
//!
//! | Operation            | Store access                          | Returns         |
//! |----------------------|---------------------------------------|-----------------|
//! | `list_owned_by`      | lookup index on `{one_id}_{kind}`     | many-side ids   |
//! | `find_owner`         | primary key `{many_id}_{kind}`        | one-side id     |
//! | `list_left_of_m2m`   | primary key `{left_id}_{kind}`        | right-side ids  |
//! | `list_right_of_m2m`  | lookup index on `{right_id}_{kind}`   | left-side ids   |
//!
//! Result order is whatever the store returns; callers should compare sets.

use graphtable_store::{
    Commit, CommitOutcome, IdempotencyToken, PutOutcome, Record, RecordStore, StoreError, WriteOp,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::catalog::{Catalog, Category};
use crate::error::{EngineError, EngineResult};
use crate::keys::{self, Edge, EntityId, KindTag};

/// Source of per-call token salts. Zero is reserved for the deterministic token.
static TOKEN_SALT: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Outcomes
// ============================================================================

/// Result of [`RelationshipEngine::create_entity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Record),
    /// A record already occupies the entity key; nothing was written.
    AlreadyExists,
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            CreateOutcome::Created(record) => Some(record),
            CreateOutcome::AlreadyExists => None,
        }
    }
}

/// Result of [`RelationshipEngine::set_owner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerOutcome {
    /// The new edge was committed, replacing `previous` owners (if any).
    Assigned { previous: Vec<EntityId> },
    /// The requested owner was already the only owner.
    Unchanged,
}

/// Result of [`RelationshipEngine::link_m2m`]. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    AlreadyLinked,
}

// ============================================================================
// Engine
// ============================================================================

/// Stateless relationship engine over an injected store.
pub struct RelationshipEngine<S> {
    store: S,
    catalog: Arc<Catalog>,
}

impl<S: RecordStore> RelationshipEngine<S> {
    pub fn new(store: S, catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            store,
            catalog: catalog.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create an entity record unless one already exists under `id`.
    pub fn create_entity(&self, kind: &str, id: &str, name: &str) -> EngineResult<CreateOutcome> {
        let (tag, _) = self.catalog.expect(kind, Category::Entity)?;
        let id = EntityId::new(id)?;
        let record = Record::new(keys::entity_key(&id), tag.as_str(), Some(name.to_string()));

        match self.store.put_if_absent(record.clone())? {
            PutOutcome::Created => {
                tracing::debug!(kind = %tag, id = %id, "entity created");
                Ok(CreateOutcome::Created(record))
            }
            PutOutcome::AlreadyExists => {
                tracing::debug!(kind = %tag, id = %id, "entity already exists");
                Ok(CreateOutcome::AlreadyExists)
            }
        }
    }

    /// Make `one_id` the sole owner of `many_id` under a one-to-many kind.
    pub fn set_owner(&self, kind: &str, many_id: &str, one_id: &str) -> EngineResult<OwnerOutcome> {
        let (tag, _) = self.catalog.expect(kind, Category::OneToMany)?;
        let many_id = EntityId::new(many_id)?;
        let one_id = EntityId::new(one_id)?;

        let target = Edge::new(tag.clone(), many_id.clone(), one_id.clone());
        let target_key = target.key();
        let partition = keys::edge_partition(tag, &many_id);

        let existing = self.store.query_by_primary_key(&partition)?;
        let observed: BTreeSet<String> = existing.iter().map(|r| r.sort_key.clone()).collect();

        if observed.len() == 1 && observed.contains(&target_key.sort_key) {
            tracing::debug!(kind = %tag, many_id = %many_id, one_id = %one_id, "owner unchanged");
            return Ok(OwnerOutcome::Unchanged);
        }
        if existing.len() > 1 {
            tracing::warn!(
                kind = %tag,
                many_id = %many_id,
                records = existing.len(),
                "partition holds more than one owner; replacing all of them"
            );
        }

        let mut previous = Vec::new();
        let mut ops = vec![WriteOp::ExpectPartition {
            primary_key: partition.clone(),
            sort_keys: observed.clone(),
        }];
        for record in &existing {
            if record.sort_key == target_key.sort_key {
                continue;
            }
            match Edge::decode(record) {
                Ok(edge) => previous.push(edge.to_id),
                Err(err) => tracing::warn!(
                    kind = %tag,
                    many_id = %many_id,
                    sort_key = %record.sort_key,
                    error = %err,
                    "undecodable owner record; deleting it"
                ),
            }
            ops.push(WriteOp::Delete(record.key()));
        }
        if !observed.contains(&target_key.sort_key) {
            ops.push(WriteOp::Put(target.to_record()));
        }

        let mut salt = 0;
        loop {
            let commit = Commit {
                token: owner_token(tag, &many_id, &one_id, &observed, salt),
                ops: ops.clone(),
            };
            match self.store.atomic_commit(&commit) {
                Ok(CommitOutcome::Applied) => {
                    tracing::info!(
                        kind = %tag,
                        many_id = %many_id,
                        one_id = %one_id,
                        replaced = previous.len(),
                        "owner assigned"
                    );
                    return Ok(OwnerOutcome::Assigned { previous });
                }
                Ok(CommitOutcome::Replayed) => {
                    // The same transition may have been committed earlier in
                    // the token window and since undone by other writes.
                    let current: BTreeSet<String> = self
                        .store
                        .query_by_primary_key(&partition)?
                        .into_iter()
                        .map(|r| r.sort_key)
                        .collect();
                    if current.len() == 1 && current.contains(&target_key.sort_key) {
                        tracing::debug!(
                            kind = %tag,
                            many_id = %many_id,
                            token = %commit.token,
                            "owner commit replayed"
                        );
                        return Ok(OwnerOutcome::Assigned { previous });
                    }
                    if current != observed {
                        return Err(self.reassign_conflict(
                            tag,
                            &many_id,
                            "partition changed after replay",
                        ));
                    }
                    // Salts do not repeat within a process.
                    salt = fresh_token_salt();
                    tracing::debug!(
                        kind = %tag,
                        many_id = %many_id,
                        salt,
                        "stale replay; salting token"
                    );
                }
                Err(StoreError::Conflict { reason }) => {
                    return Err(self.reassign_conflict(tag, &many_id, &reason));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn reassign_conflict(&self, tag: &KindTag, many_id: &EntityId, reason: &str) -> EngineError {
        tracing::warn!(kind = %tag, many_id = %many_id, reason, "owner reassignment lost a race");
        EngineError::OwnerReassignConflict {
            kind: tag.to_string(),
            many_id: many_id.to_string(),
        }
    }

    /// Insert a many-to-many edge if it is not already present.
    pub fn link_m2m(&self, kind: &str, left_id: &str, right_id: &str) -> EngineResult<LinkOutcome> {
        let (tag, _) = self.catalog.expect(kind, Category::ManyToMany)?;
        let edge = Edge::new(tag.clone(), EntityId::new(left_id)?, EntityId::new(right_id)?);

        match self.store.put_if_absent(edge.to_record())? {
            PutOutcome::Created => {
                tracing::debug!(
                    kind = %tag,
                    left = %edge.from_id,
                    right = %edge.to_id,
                    "edge linked"
                );
                Ok(LinkOutcome::Linked)
            }
            PutOutcome::AlreadyExists => Ok(LinkOutcome::AlreadyLinked),
        }
    }

    // ========================================================================
    // Query Primitives
    // ========================================================================

    /// Many-side ids currently owned by `one_id`.
    pub fn list_owned_by(&self, kind: &str, one_id: &str) -> EngineResult<Vec<EntityId>> {
        let (tag, _) = self.catalog.expect(kind, Category::OneToMany)?;
        let one_id = EntityId::new(one_id)?;
        let records = self.store.query_by_lookup_key(&keys::edge_lookup(tag, &one_id))?;
        let edges = decode_edges(tag, &records)?;
        Ok(edges.into_iter().map(|edge| edge.from_id).collect())
    }

    /// The current owner of `many_id`, if any.
    pub fn find_owner(&self, kind: &str, many_id: &str) -> EngineResult<Option<EntityId>> {
        let (tag, _) = self.catalog.expect(kind, Category::OneToMany)?;
        let many_id = EntityId::new(many_id)?;
        let records = self
            .store
            .query_by_primary_key(&keys::edge_partition(tag, &many_id))?;
        let mut edges = decode_edges(tag, &records)?;
        if edges.len() > 1 {
            tracing::warn!(
                kind = %tag,
                many_id = %many_id,
                owners = edges.len(),
                "multiple owners found"
            );
        }
        Ok((!edges.is_empty()).then(|| edges.swap_remove(0).to_id))
    }

    /// Right-side ids linked from `left_id`.
    pub fn list_left_of_m2m(&self, kind: &str, left_id: &str) -> EngineResult<Vec<EntityId>> {
        let (tag, _) = self.catalog.expect(kind, Category::ManyToMany)?;
        let left_id = EntityId::new(left_id)?;
        let records = self
            .store
            .query_by_primary_key(&keys::edge_partition(tag, &left_id))?;
        let edges = decode_edges(tag, &records)?;
        Ok(edges.into_iter().map(|edge| edge.to_id).collect())
    }

    /// Left-side ids linking to `right_id`.
    pub fn list_right_of_m2m(&self, kind: &str, right_id: &str) -> EngineResult<Vec<EntityId>> {
        let (tag, _) = self.catalog.expect(kind, Category::ManyToMany)?;
        let right_id = EntityId::new(right_id)?;
        let records = self.store.query_by_lookup_key(&keys::edge_lookup(tag, &right_id))?;
        let edges = decode_edges(tag, &records)?;
        Ok(edges.into_iter().map(|edge| edge.from_id).collect())
    }

    // ========================================================================
    // Entity Reads
    // ========================================================================

    /// Point read of an entity. A record of another kind under `id` is `None`.
    pub fn get_entity(&self, kind: &str, id: &str) -> EngineResult<Option<Record>> {
        let (tag, _) = self.catalog.expect(kind, Category::Entity)?;
        let id = EntityId::new(id)?;
        let record = self.store.get(&keys::entity_key(&id))?;
        Ok(record.filter(|record| record.kind_tag == tag.as_str()))
    }

    pub fn entity_exists(&self, kind: &str, id: &str) -> EngineResult<bool> {
        Ok(self.get_entity(kind, id)?.is_some())
    }

    /// Every entity record of `kind`. Full table scan.
    pub fn list_entities(&self, kind: &str) -> EngineResult<Vec<Record>> {
        let (tag, _) = self.catalog.expect(kind, Category::Entity)?;
        Ok(self
            .store
            .scan()?
            .into_iter()
            .filter(|record| keys::is_entity_record(record) && record.kind_tag == tag.as_str())
            .collect())
    }

    pub fn scan(&self) -> EngineResult<Vec<Record>> {
        Ok(self.store.scan()?)
    }
}

/// Decode edge records of `tag`, skipping records of other kinds.
fn decode_edges(tag: &KindTag, records: &[Record]) -> EngineResult<Vec<Edge>> {
    records
        .iter()
        .filter(|record| record.kind_tag == tag.as_str())
        .map(|record| {
            Edge::decode(record).map_err(|err| EngineError::CorruptRecord {
                primary_key: record.primary_key.clone(),
                sort_key: record.sort_key.clone(),
                reason: err.to_string(),
            })
        })
        .collect()
}

/// Nonzero salt for a resubmitted owner commit.
fn fresh_token_salt() -> u64 {
    let count = TOKEN_SALT.fetch_add(1, Ordering::Relaxed) & 0xFF_FFFF_FFFF;
    (u64::from(std::process::id()) << 40) | count.max(1)
}

/// Token for one owner replacement.
///
/// Covers the arguments and the partition state the replacement was built
/// from, so resubmitting the same replacement reuses the token while a later
/// replacement (even back to an earlier owner) gets a fresh one. With
/// `salt == 0` the token is deterministic; a nonzero salt separates repeats
/// of an identical transition inside the token window.
pub fn owner_token(
    kind: &KindTag,
    many_id: &EntityId,
    one_id: &EntityId,
    observed: &BTreeSet<String>,
    salt: u64,
) -> IdempotencyToken {
    let mut hasher = Sha256::new();
    for part in [kind.as_str(), many_id.as_str(), one_id.as_str()] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.update((observed.len() as u64).to_le_bytes());
    for sort_key in observed {
        hasher.update((sort_key.len() as u64).to_le_bytes());
        hasher.update(sort_key.as_bytes());
    }
    hasher.update(salt.to_le_bytes());
    let digest: [u8; 32] = hasher.finalize().into();

    let mut token = String::from("o2m-");
    for b in &digest[..16] {
        let _ = write!(&mut token, "{:02x}", b);
    }
    IdempotencyToken::new(token)
}
