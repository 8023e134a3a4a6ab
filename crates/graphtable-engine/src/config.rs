//! Engine configuration, loadable from JSON.
//!
//! ```json
//! {
//!   "store": { "max_commit_ops": 25, "idempotency_window_secs": 600 },
//!   "catalog": {
//!     "kinds": [
//!       { "category": "entity", "tag": "USER" },
//!       { "category": "entity", "tag": "VIDEO" },
//!       { "category": "one_to_many", "tag": "VIDEO-OWNERSHIP", "one": "USER", "many": "VIDEO" }
//!     ]
//!   }
//! }
//! ```

use graphtable_store::{StoreConfig, StoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::{Catalog, ItemKind};
use crate::error::CatalogError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One catalog entry as written in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum KindSpec {
    Entity { tag: String },
    OneToMany { tag: String, one: String, many: String },
    ManyToMany { tag: String, left: String, right: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub kinds: Vec<KindSpec>,
}

impl CatalogConfig {
    pub fn build(&self) -> Result<Catalog, CatalogError> {
        self.kinds
            .iter()
            .fold(Catalog::builder(), |builder, spec| match spec {
                KindSpec::Entity { tag } => builder.entity(tag.as_str()),
                KindSpec::OneToMany { tag, one, many } => {
                    builder.one_to_many(tag.as_str(), one.as_str(), many.as_str())
                }
                KindSpec::ManyToMany { tag, left, right } => {
                    builder.many_to_many(tag.as_str(), left.as_str(), right.as_str())
                }
            })
            .build()
    }
}

impl From<&Catalog> for CatalogConfig {
    fn from(catalog: &Catalog) -> Self {
        let kinds = catalog
            .iter()
            .map(|(tag, kind)| match kind {
                ItemKind::Entity => KindSpec::Entity {
                    tag: tag.to_string(),
                },
                ItemKind::OneToMany { one, many } => KindSpec::OneToMany {
                    tag: tag.to_string(),
                    one: one.to_string(),
                    many: many.to_string(),
                },
                ItemKind::ManyToMany { left, right } => KindSpec::ManyToMany {
                    tag: tag.to_string(),
                    left: left.to_string(),
                    right: right.to_string(),
                },
            })
            .collect();
        Self { kinds }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphTableConfig {
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
}

impl GraphTableConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check store limits and build the catalog.
    pub fn validate(&self) -> Result<Catalog, ConfigError> {
        self.store.validate()?;
        Ok(self.catalog.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "store": { "max_commit_ops": 10 },
        "catalog": {
            "kinds": [
                { "category": "entity", "tag": "USER" },
                { "category": "entity", "tag": "VIDEO" },
                { "category": "one_to_many", "tag": "VIDEO-OWNERSHIP", "one": "USER", "many": "VIDEO" },
                { "category": "many_to_many", "tag": "VIEWER-SUBSCRIBE-YOUTUBER", "left": "USER", "right": "USER" }
            ]
        }
    }"#;

    #[test]
    fn test_parse_and_validate() {
        let config = GraphTableConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.store.max_commit_ops, 10);
        assert_eq!(
            config.store.idempotency_window_secs,
            StoreConfig::default().idempotency_window_secs
        );

        let catalog = config.validate().unwrap();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.contains("VIEWER-SUBSCRIBE-YOUTUBER"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graphtable.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = GraphTableConfig::load(&path).unwrap();
        assert_eq!(config.catalog.kinds.len(), 4);
    }

    #[test]
    fn test_duplicate_tag_fails_validation() {
        let json = r#"{ "catalog": { "kinds": [
            { "category": "entity", "tag": "USER" },
            { "category": "entity", "tag": "USER" }
        ] } }"#;
        let config = GraphTableConfig::from_json(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Catalog(CatalogError::DuplicateTag(_)))
        ));
    }

    #[test]
    fn test_store_limits_are_checked() {
        let json = r#"{ "store": { "max_commit_ops": 1 },
            "catalog": { "kinds": [ { "category": "entity", "tag": "USER" } ] } }"#;
        let config = GraphTableConfig::from_json(json).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Store(_))));
    }

    #[test]
    fn test_catalog_round_trips_through_config() {
        let config = GraphTableConfig::from_json(SAMPLE).unwrap();
        let catalog = config.validate().unwrap();

        let regenerated = CatalogConfig::from(&catalog);
        assert_eq!(regenerated.build().unwrap(), catalog);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = GraphTableConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
