//! Kind catalog: which tags are entities and which are relationships.
//!
//! The catalog is closed once built. Relationship kinds name the entity
//! kinds they connect, and every participant must itself be registered as
//! an entity kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CatalogError, EngineError, EngineResult};
use crate::keys::KindTag;

/// Structural category of a kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Entity,
    OneToMany,
    ManyToMany,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Entity => "entity",
            Category::OneToMany => "one-to-many",
            Category::ManyToMany => "many-to-many",
        })
    }
}

/// What a kind tag stands for, with the entity kinds a relationship connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Entity,
    /// Each `many` entity has at most one `one` entity.
    OneToMany { one: KindTag, many: KindTag },
    /// Set-valued association from `left` entities to `right` entities.
    ManyToMany { left: KindTag, right: KindTag },
}

impl ItemKind {
    pub fn category(&self) -> Category {
        match self {
            ItemKind::Entity => Category::Entity,
            ItemKind::OneToMany { .. } => Category::OneToMany,
            ItemKind::ManyToMany { .. } => Category::ManyToMany,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Clone)]
enum PendingKind {
    Entity,
    OneToMany { one: String, many: String },
    ManyToMany { left: String, right: String },
}

#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    entries: Vec<(String, PendingKind)>,
}

impl CatalogBuilder {
    pub fn entity(mut self, tag: impl Into<String>) -> Self {
        self.entries.push((tag.into(), PendingKind::Entity));
        self
    }

    pub fn one_to_many(
        mut self,
        tag: impl Into<String>,
        one: impl Into<String>,
        many: impl Into<String>,
    ) -> Self {
        self.entries.push((
            tag.into(),
            PendingKind::OneToMany {
                one: one.into(),
                many: many.into(),
            },
        ));
        self
    }

    pub fn many_to_many(
        mut self,
        tag: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.entries.push((
            tag.into(),
            PendingKind::ManyToMany {
                left: left.into(),
                right: right.into(),
            },
        ));
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        if self.entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        // Pass 1: validate and register every tag.
        let mut kinds: BTreeMap<KindTag, ItemKind> = BTreeMap::new();
        for (raw, pending) in &self.entries {
            let tag = KindTag::new(raw.as_str())?;
            if kinds.contains_key(&tag) {
                return Err(CatalogError::DuplicateTag(raw.clone()));
            }
            let kind = match pending {
                PendingKind::Entity => ItemKind::Entity,
                PendingKind::OneToMany { one, many } => ItemKind::OneToMany {
                    one: KindTag::new(one.as_str())?,
                    many: KindTag::new(many.as_str())?,
                },
                PendingKind::ManyToMany { left, right } => ItemKind::ManyToMany {
                    left: KindTag::new(left.as_str())?,
                    right: KindTag::new(right.as_str())?,
                },
            };
            kinds.insert(tag, kind);
        }

        // Pass 2: relationship participants must be entity kinds.
        for (tag, kind) in &kinds {
            let participants = match kind {
                ItemKind::Entity => continue,
                ItemKind::OneToMany { one, many } => [one, many],
                ItemKind::ManyToMany { left, right } => [left, right],
            };
            for participant in participants {
                if kinds.get(participant) != Some(&ItemKind::Entity) {
                    return Err(CatalogError::UnknownParticipant {
                        relationship: tag.to_string(),
                        participant: participant.to_string(),
                    });
                }
            }
        }

        Ok(Catalog { kinds })
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    kinds: BTreeMap<KindTag, ItemKind>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Look up a tag, returning the validated tag alongside its kind.
    pub fn resolve(&self, tag: &str) -> EngineResult<(&KindTag, &ItemKind)> {
        self.kinds
            .get_key_value(tag)
            .ok_or_else(|| EngineError::UnknownKind(tag.to_string()))
    }

    /// Resolve a tag and require a specific category.
    pub fn expect(&self, tag: &str, expected: Category) -> EngineResult<(&KindTag, &ItemKind)> {
        let (resolved, kind) = self.resolve(tag)?;
        let actual = kind.category();
        if actual != expected {
            return Err(EngineError::InvalidRelationshipKind {
                tag: tag.to_string(),
                expected,
                actual,
            });
        }
        Ok((resolved, kind))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }

    /// Kinds in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&KindTag, &ItemKind)> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
