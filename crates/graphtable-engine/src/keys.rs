//! Key codec for the single-table layout.
//!
//! Every record key is derived from validated ids and kind tags:
//!
//! - `{id}` / `--root--` - Entity record
//! - `{many_id}_{kind}` / `{one_id}_{kind}` - One-to-many edge
//! - `{left_id}_{kind}` / `{right_id}_{kind}` - Many-to-many edge
//!
//! The lookup index is keyed on the sort key, so the right-hand composite of
//! an edge is also its reverse-traversal key.
//!
//! Neither ids nor kind tags may contain [`SEPARATOR`]. A composite therefore
//! contains exactly one separator and decodes to a single `(id, kind)` pair,
//! and the root sentinel (which has no separator) can never equal a composite.

use graphtable_store::{Record, RecordKey};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

/// Joins an id and a kind tag inside a composite key.
pub const SEPARATOR: char = '_';

/// Sort key of an entity record.
pub const ROOT_SENTINEL: &str = "--root--";

pub const MAX_ID_LEN: usize = 128;
pub const MAX_TAG_LEN: usize = 64;

// ============================================================================
// Validated Identifiers
// ============================================================================

/// An entity id drawn from `[A-Za-z0-9.-]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Result<Self, KeyError> {
        let raw = raw.into();
        let invalid = |reason: &str| KeyError::InvalidId {
            id: raw.clone(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("id is empty"));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(invalid(&format!("id exceeds {MAX_ID_LEN} bytes")));
        }
        if let Some(c) = raw.chars().find(|c| !is_id_char(*c)) {
            return Err(invalid(&format!(
                "character {c:?} is not allowed (letters, digits, '-' and '.' only)"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.'
}

/// A kind tag drawn from `[A-Z0-9-]`, starting with a letter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KindTag(String);

impl KindTag {
    pub fn new(raw: impl Into<String>) -> Result<Self, KeyError> {
        let raw = raw.into();
        let invalid = |reason: &str| KeyError::InvalidTag {
            tag: raw.clone(),
            reason: reason.to_string(),
        };

        match raw.chars().next() {
            None => return Err(invalid("tag is empty")),
            Some(first) if !first.is_ascii_uppercase() => {
                return Err(invalid("tag must start with an uppercase letter"));
            }
            Some(_) => {}
        }
        if raw.len() > MAX_TAG_LEN {
            return Err(invalid(&format!("tag exceeds {MAX_TAG_LEN} bytes")));
        }
        if let Some(c) = raw.chars().find(|c| !is_tag_char(*c)) {
            return Err(invalid(&format!(
                "character {c:?} is not allowed (uppercase letters, digits and '-' only)"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'
}

macro_rules! string_newtype {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = KeyError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_newtype!(EntityId);
string_newtype!(KindTag);

// ============================================================================
// Encoding
// ============================================================================

/// Build the key of an entity record.
///
/// Schema: `{id}` / `--root--`
#[inline]
pub fn entity_key(id: &EntityId) -> RecordKey {
    RecordKey::new(id.as_str(), ROOT_SENTINEL)
}

/// Build the `{id}_{kind}` composite used on both sides of an edge.
#[inline]
pub fn composite(id: &EntityId, kind: &KindTag) -> String {
    format!("{id}{SEPARATOR}{kind}")
}

/// Build the key of an edge record.
///
/// Schema: `{from_id}_{kind}` / `{to_id}_{kind}`
#[inline]
pub fn edge_key(kind: &KindTag, from_id: &EntityId, to_id: &EntityId) -> RecordKey {
    RecordKey::new(composite(from_id, kind), composite(to_id, kind))
}

/// Primary key holding every edge of `kind` that starts at `from_id`.
#[inline]
pub fn edge_partition(kind: &KindTag, from_id: &EntityId) -> String {
    composite(from_id, kind)
}

/// Lookup key holding every edge of `kind` that ends at `to_id`.
#[inline]
pub fn edge_lookup(kind: &KindTag, to_id: &EntityId) -> String {
    composite(to_id, kind)
}

// ============================================================================
// Decoding
// ============================================================================

/// Split a composite back into its id and kind tag.
pub fn decode_composite(key: &str) -> Result<(EntityId, KindTag), KeyError> {
    let malformed = |reason: String| KeyError::Malformed {
        key: key.to_string(),
        reason,
    };

    let (id, kind) = key
        .split_once(SEPARATOR)
        .ok_or_else(|| malformed(format!("missing separator {SEPARATOR:?}")))?;
    let id = EntityId::new(id).map_err(|err| malformed(err.to_string()))?;
    let kind = KindTag::new(kind).map_err(|err| malformed(err.to_string()))?;
    Ok((id, kind))
}

pub fn is_entity_record(record: &Record) -> bool {
    record.sort_key == ROOT_SENTINEL
}

/// A decoded relationship edge.
///
/// For one-to-many kinds `from_id` is the "many" side and `to_id` the owner;
/// for many-to-many kinds they are the left and right entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub kind: KindTag,
    pub from_id: EntityId,
    pub to_id: EntityId,
}

impl Edge {
    pub fn new(kind: KindTag, from_id: EntityId, to_id: EntityId) -> Self {
        Self {
            kind,
            from_id,
            to_id,
        }
    }

    pub fn key(&self) -> RecordKey {
        edge_key(&self.kind, &self.from_id, &self.to_id)
    }

    pub fn to_record(&self) -> Record {
        Record::new(self.key(), self.kind.as_str(), None)
    }

    pub fn decode(record: &Record) -> Result<Self, KeyError> {
        let (from_id, from_kind) = decode_composite(&record.primary_key)?;
        let (to_id, to_kind) = decode_composite(&record.sort_key)?;

        if from_kind != to_kind || from_kind != record.kind_tag.as_str() {
            return Err(KeyError::Malformed {
                key: record.key().to_string(),
                reason: format!(
                    "kind tags disagree: pk={from_kind}, sk={to_kind}, record={}",
                    record.kind_tag
                ),
            });
        }

        Ok(Self::new(from_kind, from_id, to_id))
    }
}
