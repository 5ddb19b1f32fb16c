// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IMDF data representation
//!
//! This module defines the fundamental types used throughout the loading and
//! validation pipeline.

use crate::{Geometry, GeometryError, GeometryKind, ImdfError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Type-safe feature identifier
///
/// IMDF identifiers are opaque strings (UUIDs in practice). They are unique
/// within a feature type's namespace; cross-references always pair an id with
/// the feature type it is expected to resolve to.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FeatureId(pub String);

impl FeatureId {
    /// Create a new identifier
    pub fn new(id: impl Into<String>) -> Self {
        FeatureId(id.into())
    }

    /// Get the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId(id.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        FeatureId(id)
    }
}

/// IMDF feature type enumeration
///
/// Declaration order is alphabetical and doubles as the report ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Address,
    Amenity,
    Anchor,
    Building,
    Detail,
    Fixture,
    Footprint,
    Geofence,
    Kiosk,
    Level,
    Occupant,
    Opening,
    Relationship,
    Section,
    Unit,
    Venue,
}

impl FeatureType {
    /// All feature types in declaration order
    pub const ALL: [FeatureType; 16] = [
        FeatureType::Address,
        FeatureType::Amenity,
        FeatureType::Anchor,
        FeatureType::Building,
        FeatureType::Detail,
        FeatureType::Fixture,
        FeatureType::Footprint,
        FeatureType::Geofence,
        FeatureType::Kiosk,
        FeatureType::Level,
        FeatureType::Occupant,
        FeatureType::Opening,
        FeatureType::Relationship,
        FeatureType::Section,
        FeatureType::Unit,
        FeatureType::Venue,
    ];

    /// Parse a feature type from its archive name
    ///
    /// Returns `None` for names outside the 16 IMDF feature types.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "address" => Some(FeatureType::Address),
            "amenity" => Some(FeatureType::Amenity),
            "anchor" => Some(FeatureType::Anchor),
            "building" => Some(FeatureType::Building),
            "detail" => Some(FeatureType::Detail),
            "fixture" => Some(FeatureType::Fixture),
            "footprint" => Some(FeatureType::Footprint),
            "geofence" => Some(FeatureType::Geofence),
            "kiosk" => Some(FeatureType::Kiosk),
            "level" => Some(FeatureType::Level),
            "occupant" => Some(FeatureType::Occupant),
            "opening" => Some(FeatureType::Opening),
            "relationship" => Some(FeatureType::Relationship),
            "section" => Some(FeatureType::Section),
            "unit" => Some(FeatureType::Unit),
            "venue" => Some(FeatureType::Venue),
            _ => None,
        }
    }

    /// Get the archive name (also the `feature_type` member value)
    pub fn name(&self) -> &'static str {
        match self {
            FeatureType::Address => "address",
            FeatureType::Amenity => "amenity",
            FeatureType::Anchor => "anchor",
            FeatureType::Building => "building",
            FeatureType::Detail => "detail",
            FeatureType::Fixture => "fixture",
            FeatureType::Footprint => "footprint",
            FeatureType::Geofence => "geofence",
            FeatureType::Kiosk => "kiosk",
            FeatureType::Level => "level",
            FeatureType::Occupant => "occupant",
            FeatureType::Opening => "opening",
            FeatureType::Relationship => "relationship",
            FeatureType::Section => "section",
            FeatureType::Unit => "unit",
            FeatureType::Venue => "venue",
        }
    }

    /// Get the file name this type uses inside an unpacked archive
    pub fn file_name(&self) -> String {
        format!("{}.geojson", self.name())
    }
}

impl FromStr for FeatureType {
    type Err = ImdfError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FeatureType::parse(s).ok_or_else(|| ImdfError::UnknownFeatureType(s.to_string()))
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Polymorphic reference carried by relationship endpoints
///
/// The target type is declared per instance rather than by the schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureReference {
    pub id: FeatureId,
    pub feature_type: FeatureType,
}

/// Geometry member of a feature as decoded by the loader
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
    /// `geometry` is `null` or missing
    Absent,
    /// A decodable GeoJSON geometry
    Present(Geometry),
    /// A geometry object that could not be decoded
    Malformed(GeometryError),
}

impl FeatureGeometry {
    /// Decode the `geometry` member of a GeoJSON feature
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => FeatureGeometry::Absent,
            Some(v) => match Geometry::from_value(v) {
                Ok(geometry) => FeatureGeometry::Present(geometry),
                Err(e) => FeatureGeometry::Malformed(e),
            },
        }
    }

    /// Get the geometry kind, `None` when absent or malformed
    pub fn kind(&self) -> Option<GeometryKind> {
        match self {
            FeatureGeometry::Present(g) => Some(g.kind()),
            _ => None,
        }
    }

    /// Get the decoded geometry
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            FeatureGeometry::Present(g) => Some(g),
            _ => None,
        }
    }

    /// Short description for messages
    pub fn describe(&self) -> &'static str {
        match self {
            FeatureGeometry::Absent => "null",
            FeatureGeometry::Present(g) => g.kind().name(),
            FeatureGeometry::Malformed(_) => "malformed geometry",
        }
    }
}

/// Decoded IMDF feature
///
/// Features are immutable value objects for the lifetime of a validation run.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    /// Feature identifier
    pub id: FeatureId,
    /// Feature type (matches the containing collection)
    pub feature_type: FeatureType,
    /// Geometry member
    pub geometry: FeatureGeometry,
    /// Raw property mapping
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Create a feature with no geometry and no properties
    pub fn new(id: impl Into<FeatureId>, feature_type: FeatureType) -> Self {
        Self {
            id: id.into(),
            feature_type,
            geometry: FeatureGeometry::Absent,
            properties: Map::new(),
        }
    }

    /// Set geometry
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = FeatureGeometry::Present(geometry);
        self
    }

    /// Set a property
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Get property value, `None` when the key is absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Get property value, treating explicit `null` as absent
    pub fn get_non_null(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_null())
    }

    /// Get string property
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    /// Get boolean property
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    /// Get integer property
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_i64())
    }

    /// Get single identifier reference
    pub fn get_ref(&self, name: &str) -> Option<FeatureId> {
        self.get_str(name).map(FeatureId::from)
    }

    /// Get list of identifier references (non-string entries are skipped)
    pub fn get_refs(&self, name: &str) -> Option<Vec<FeatureId>> {
        self.get(name)
            .and_then(|v| v.as_array())
            .map(|list| list.iter().filter_map(|v| v.as_str()).map(FeatureId::from).collect())
    }
}

/// Archive metadata from `manifest.json`
///
/// The manifest is informational only. Text members that carry some other
/// JSON shape decode to `None`; `generated_by` is kept as written since
/// producers emit either a string or a `{name, version}` object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// IMDF version (e.g., "1.0.0")
    #[serde(default, deserialize_with = "lenient_text")]
    pub version: Option<String>,
    /// Creation timestamp
    #[serde(default, deserialize_with = "lenient_text")]
    pub created: Option<String>,
    /// Default language tag
    #[serde(default, deserialize_with = "lenient_text")]
    pub language: Option<String>,
    /// Producing tool
    #[serde(default)]
    pub generated_by: Option<Value>,
    /// Declared extensions
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl Manifest {
    /// Name of the producing tool, from either form of `generated_by`
    pub fn generator(&self) -> Option<&str> {
        match self.generated_by.as_ref()? {
            Value::String(name) => Some(name),
            Value::Object(map) => map.get("name").and_then(Value::as_str),
            _ => None,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
