//! Graphtable Relationship Engine
//!
//! Stores a typed entity graph inside one record table:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        RelationshipEngine                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   Catalog            keys                  RecordStore           │
//! │   ───────            ────                  ───────────           │
//! │   USER   entity  ─►  u-1 / --root--    ─►  put_if_absent         │
//! │   VIDEO-OWNERSHIP    v-1_VIDEO-OWN..   ─►  atomic_commit         │
//! │     one-to-many      u-1_VIDEO-OWN..   ─►  query by pk / lookup  │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`keys`]: validated ids and tags, composite key encode/decode
//! - [`catalog`]: the closed set of kinds and their categories
//! - [`engine`]: entity creation, edge mutation, query primitives
//! - [`config`]: JSON configuration for the store and catalog
//! - [`error`]: the error taxonomy
//!
//! ## Example
//!
//! ```
//! use graphtable_engine::{Catalog, RelationshipEngine};
//! use graphtable_store::MemoryStore;
//!
//! let catalog = Catalog::builder()
//!     .entity("USER")
//!     .entity("VIDEO")
//!     .one_to_many("VIDEO-OWNERSHIP", "USER", "VIDEO")
//!     .build()
//!     .unwrap();
//! let engine = RelationshipEngine::new(MemoryStore::new(), catalog);
//!
//! engine.create_entity("USER", "u-1", "Alice").unwrap();
//! engine.create_entity("VIDEO", "v-1", "Intro").unwrap();
//! engine.set_owner("VIDEO-OWNERSHIP", "v-1", "u-1").unwrap();
//!
//! let owned = engine.list_owned_by("VIDEO-OWNERSHIP", "u-1").unwrap();
//! assert_eq!(owned, vec!["v-1"]);
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod keys;


pub use catalog::{Catalog, CatalogBuilder, Category, ItemKind};
pub use config::{CatalogConfig, ConfigError, GraphTableConfig, KindSpec};
pub use engine::{CreateOutcome, LinkOutcome, OwnerOutcome, RelationshipEngine};
pub use error::{CatalogError, EngineError, EngineResult, KeyError};
pub use keys::{Edge, EntityId, KindTag};
