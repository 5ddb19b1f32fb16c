// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controlled vocabularies (category token sets)
//!
//! Token lists are data, not code: the built-in tables are read from
//! `data/categories.json` once per process. An external feed with the same
//! shape can be supplied through [`VocabularyRegistry::from_json`].
//!
//! Feed shape: one member per category. String-valued categories map to an
//! array of tokens; integer-coded categories map to an object of
//! `token → code`.

use crate::{ImdfError, Result};
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const BUILTIN_CATEGORIES: &str = include_str!("../data/categories.json");

static BUILTIN: Lazy<std::result::Result<Arc<VocabularyRegistry>, String>> = Lazy::new(|| {
    VocabularyRegistry::from_json(BUILTIN_CATEGORIES)
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

/// Category kinds with a controlled vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    AccessControl,
    Accessibility,
    Amenity,
    Building,
    Door,
    Fixture,
    Footprint,
    Geofence,
    Level,
    Occupant,
    Opening,
    Relationship,
    Restriction,
    Section,
    Unit,
    Venue,
}

impl CategoryKind {
    /// All category kinds
    pub const ALL: [CategoryKind; 16] = [
        CategoryKind::AccessControl,
        CategoryKind::Accessibility,
        CategoryKind::Amenity,
        CategoryKind::Building,
        CategoryKind::Door,
        CategoryKind::Fixture,
        CategoryKind::Footprint,
        CategoryKind::Geofence,
        CategoryKind::Level,
        CategoryKind::Occupant,
        CategoryKind::Opening,
        CategoryKind::Relationship,
        CategoryKind::Restriction,
        CategoryKind::Section,
        CategoryKind::Unit,
        CategoryKind::Venue,
    ];

    /// Get the feed member name
    pub fn name(&self) -> &'static str {
        match self {
            CategoryKind::AccessControl => "access_control",
            CategoryKind::Accessibility => "accessibility",
            CategoryKind::Amenity => "amenity",
            CategoryKind::Building => "building",
            CategoryKind::Door => "door",
            CategoryKind::Fixture => "fixture",
            CategoryKind::Footprint => "footprint",
            CategoryKind::Geofence => "geofence",
            CategoryKind::Level => "level",
            CategoryKind::Occupant => "occupant",
            CategoryKind::Opening => "opening",
            CategoryKind::Relationship => "relationship",
            CategoryKind::Restriction => "restriction",
            CategoryKind::Section => "section",
            CategoryKind::Unit => "unit",
            CategoryKind::Venue => "venue",
        }
    }

    /// Parse a feed member name
    pub fn parse(s: &str) -> Option<Self> {
        CategoryKind::ALL.into_iter().find(|k| k.name() == s)
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A category value as it appears in a property
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryToken<'a> {
    Text(&'a str),
    Integer(i64),
}

impl<'a> CategoryToken<'a> {
    /// Interpret a JSON value as a token; other JSON types yield `None`
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(CategoryToken::Text(s)),
            Value::Number(n) => n.as_i64().map(CategoryToken::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryToken::Text(s) => write!(f, "{s:?}"),
            CategoryToken::Integer(i) => write!(f, "{i}"),
        }
    }
}

/// Closed token set for one category
#[derive(Clone, Debug, Default)]
pub struct VocabularyTable {
    tokens: FxHashSet<String>,
    codes: FxHashMap<i64, String>,
}

impl VocabularyTable {
    /// Table of string tokens
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            codes: FxHashMap::default(),
        }
    }

    /// Table of integer-coded tokens; both the token and its code are valid
    pub fn from_coded<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (token, code) in entries {
            let token = token.into();
            table.codes.insert(code, token.clone());
            table.tokens.insert(token);
        }
        table
    }

    /// Check membership
    pub fn contains(&self, token: &CategoryToken<'_>) -> bool {
        match token {
            CategoryToken::Text(s) => self.tokens.contains(*s),
            CategoryToken::Integer(code) => self.codes.contains_key(code),
        }
    }

    /// Check whether the table carries integer codes
    pub fn is_coded(&self) -> bool {
        !self.codes.is_empty()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check for no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableFeed {
    Tokens(Vec<String>),
    Coded(BTreeMap<String, i64>),
}

/// Registry of every category's vocabulary
///
/// Immutable once built; lookups are pure.
#[derive(Clone, Debug, Default)]
pub struct VocabularyRegistry {
    tables: FxHashMap<CategoryKind, VocabularyTable>,
}

impl VocabularyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the process-wide registry built from the embedded tables
    pub fn builtin() -> Result<Arc<VocabularyRegistry>> {
        (*BUILTIN).clone().map_err(ImdfError::InvalidVocabulary)
    }

    /// Build a registry from a JSON vocabulary feed
    ///
    /// Unknown category names are rejected. Categories missing from the feed
    /// are only an error when queried.
    pub fn from_json(json: &str) -> Result<Self> {
        let feed: BTreeMap<String, TableFeed> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (name, table) in feed {
            let kind = CategoryKind::parse(&name)
                .ok_or_else(|| ImdfError::vocabulary(format!("unknown category {name:?}")))?;
            let table = match table {
                TableFeed::Tokens(tokens) => VocabularyTable::from_tokens(tokens),
                TableFeed::Coded(entries) => VocabularyTable::from_coded(entries),
            };
            registry.insert(kind, table);
        }
        Ok(registry)
    }

    /// Set the table for a category
    pub fn insert(&mut self, kind: CategoryKind, table: VocabularyTable) {
        self.tables.insert(kind, table);
    }

    /// Set the table for a category (builder form)
    pub fn with_table(mut self, kind: CategoryKind, table: VocabularyTable) -> Self {
        self.insert(kind, table);
        self
    }

    /// Get the table for a category
    pub fn table(&self, kind: CategoryKind) -> Result<&VocabularyTable> {
        self.tables
            .get(&kind)
            .ok_or(ImdfError::UndefinedCategory(kind))
    }

    /// Check a token against a category's vocabulary
    ///
    /// Querying a category the registry has no table for is a configuration
    /// error, not a data error.
    pub fn is_valid(&self, kind: CategoryKind, token: &CategoryToken<'_>) -> Result<bool> {
        Ok(self.table(kind)?.contains(token))
    }

    /// Categories with a table
    pub fn kinds(&self) -> Vec<CategoryKind> {
        let mut kinds: Vec<_> = self.tables.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_has_every_category() {
        let registry = VocabularyRegistry::builtin().unwrap();
        assert_eq!(registry.kinds(), CategoryKind::ALL.to_vec());
        assert_eq!(registry.table(CategoryKind::Restriction).unwrap().len(), 2);
        assert!(registry.table(CategoryKind::Occupant).unwrap().is_coded());
    }

    #[test]
    fn test_builtin_membership() {
        let registry = VocabularyRegistry::builtin().unwrap();
        assert!(registry
            .is_valid(CategoryKind::Unit, &CategoryToken::Text("restroom.female"))
            .unwrap());
        assert!(registry
            .is_valid(CategoryKind::Restriction, &CategoryToken::Text("employeesonly"))
            .unwrap());
        assert!(!registry
            .is_valid(CategoryKind::Restriction, &CategoryToken::Text("flying"))
            .unwrap());
        assert!(!registry
            .is_valid(CategoryKind::Unit, &CategoryToken::Integer(3))
            .unwrap());
    }

    #[test]
    fn test_coded_category_accepts_token_and_code() {
        let registry = VocabularyRegistry::builtin().unwrap();
        assert!(registry
            .is_valid(CategoryKind::Occupant, &CategoryToken::Text("yoga"))
            .unwrap());
        assert!(registry
            .is_valid(CategoryKind::Occupant, &CategoryToken::Integer(1114))
            .unwrap());
        assert!(!registry
            .is_valid(CategoryKind::Occupant, &CategoryToken::Integer(99_999))
            .unwrap());
    }

    #[test]
    fn test_undefined_category_is_error() {
        let registry = VocabularyRegistry::from_json(r#"{"unit": ["room"]}"#).unwrap();
        assert!(registry
            .is_valid(CategoryKind::Unit, &CategoryToken::Text("room"))
            .unwrap());
        assert!(matches!(
            registry.is_valid(CategoryKind::Venue, &CategoryToken::Text("airport")),
            Err(ImdfError::UndefinedCategory(CategoryKind::Venue))
        ));
    }

    #[test]
    fn test_feed_rejects_unknown_category() {
        let err = VocabularyRegistry::from_json(r#"{"spaceship": ["x"]}"#).unwrap_err();
        assert!(matches!(err, ImdfError::InvalidVocabulary(_)));
    }

    #[test]
    fn test_token_from_value() {
        assert_eq!(
            CategoryToken::from_value(&json!("room")),
            Some(CategoryToken::Text("room"))
        );
        assert_eq!(CategoryToken::from_value(&json!(12)), Some(CategoryToken::Integer(12)));
        assert_eq!(CategoryToken::from_value(&json!(1.5)), None);
        assert_eq!(CategoryToken::from_value(&json!(true)), None);
    }
}
