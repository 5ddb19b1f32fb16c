// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature schema table
//!
//! The single source of per-variant structural rules: the geometry each
//! feature type must carry, which properties it declares, which of them are
//! required, and which are identifier references to other feature types.

use crate::{CategoryKind, FeatureType, GeometryRule, ImdfError, Result};

use self::PropertyType as P;
use crate::CategoryKind as C;

/// Value type of a declared property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    /// Free text
    Text,
    /// Language tag → display string mapping
    Labels,
    Boolean,
    Integer,
    /// One token from a controlled vocabulary
    Category(CategoryKind),
    /// One token, or an array of tokens, from a controlled vocabulary
    CategorySet(CategoryKind),
    /// One of a small inline set of literals
    OneOf(&'static [&'static str]),
    /// ISO 3166-1 alpha-2 country code
    CountryCode,
    /// ISO 3166-2 subdivision code
    SubdivisionCode,
    /// GeoJSON Point
    DisplayPoint,
    /// `{start, end, modified}` RFC 3339 timestamps
    Temporality,
    /// `{type, automatic, material}` door description
    Door,
    /// Identifier reference(s) to other features
    Reference(ReferenceSpec),
}

/// How many identifiers a reference field holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// A single identifier
    One,
    /// An array of identifiers
    Many,
}

/// Feature types a reference may resolve to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// Plain identifier resolving to one of these types
    Types(&'static [FeatureType]),
    /// `{id, feature_type}` object naming its own target type
    Declared,
}

impl ReferenceTarget {
    /// Check whether a feature type is an acceptable target
    pub fn admits(&self, feature_type: FeatureType) -> bool {
        match self {
            ReferenceTarget::Types(types) => types.contains(&feature_type),
            ReferenceTarget::Declared => true,
        }
    }

    /// Description for diagnostics
    pub fn describe(&self) -> String {
        match self {
            ReferenceTarget::Types(types) => types
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(" or "),
            ReferenceTarget::Declared => "declared feature type".to_string(),
        }
    }
}

/// Reference field declaration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceSpec {
    pub target: ReferenceTarget,
    pub cardinality: Cardinality,
}

/// Whether a property must carry a value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Present and non-null
    Required,
    /// May be absent or null
    Optional,
}

/// One declared property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub ty: PropertyType,
    pub presence: Presence,
}

impl PropertySpec {
    /// Check for a required property
    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// Null is accepted exactly for optional properties
    pub fn is_nullable(&self) -> bool {
        self.presence == Presence::Optional
    }

    /// Get the reference declaration, if this is a reference field
    pub fn reference(&self) -> Option<&ReferenceSpec> {
        match &self.ty {
            PropertyType::Reference(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Structural rules for one feature type
#[derive(Debug)]
pub struct FeatureSchema {
    pub feature_type: FeatureType,
    pub geometry: GeometryRule,
    pub properties: &'static [PropertySpec],
}

impl FeatureSchema {
    /// Get a declared property
    pub fn property(&self, name: &str) -> Option<&'static PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Required property declarations
    pub fn required(&self) -> impl Iterator<Item = &'static PropertySpec> {
        self.properties.iter().filter(|p| p.is_required())
    }

    /// Optional property declarations
    pub fn optional(&self) -> impl Iterator<Item = &'static PropertySpec> {
        self.properties.iter().filter(|p| !p.is_required())
    }

    /// Reference field declarations with their reference specs
    pub fn references(&self) -> impl Iterator<Item = (&'static PropertySpec, &'static ReferenceSpec)> {
        self.properties
            .iter()
            .filter_map(|p| p.reference().map(|r| (p, r)))
    }
}

/// Get the schema entry for a feature type
pub fn schema_for(feature_type: FeatureType) -> &'static FeatureSchema {
    match feature_type {
        FeatureType::Address => &ADDRESS,
        FeatureType::Amenity => &AMENITY,
        FeatureType::Anchor => &ANCHOR,
        FeatureType::Building => &BUILDING,
        FeatureType::Detail => &DETAIL,
        FeatureType::Fixture => &FIXTURE,
        FeatureType::Footprint => &FOOTPRINT,
        FeatureType::Geofence => &GEOFENCE,
        FeatureType::Kiosk => &KIOSK,
        FeatureType::Level => &LEVEL,
        FeatureType::Occupant => &OCCUPANT,
        FeatureType::Opening => &OPENING,
        FeatureType::Relationship => &RELATIONSHIP,
        FeatureType::Section => &SECTION,
        FeatureType::Unit => &UNIT,
        FeatureType::Venue => &VENUE,
    }
}

/// Get the schema entry for a feature type name
///
/// An unknown name is a configuration error.
pub fn schema_for_name(name: &str) -> Result<&'static FeatureSchema> {
    FeatureType::parse(name)
        .map(schema_for)
        .ok_or_else(|| ImdfError::UnknownFeatureType(name.to_string()))
}

/// Inline literal sets
pub const RELATIONSHIP_DIRECTIONS: &[&str] = &["directed", "undirected"];
pub const DOOR_MATERIALS: &[&str] = &["wood", "glass", "metal", "gate"];

const fn req(name: &'static str, ty: PropertyType) -> PropertySpec {
    PropertySpec {
        name,
        ty,
        presence: Presence::Required,
    }
}

const fn opt(name: &'static str, ty: PropertyType) -> PropertySpec {
    PropertySpec {
        name,
        ty,
        presence: Presence::Optional,
    }
}

const fn one(target: &'static [FeatureType]) -> PropertyType {
    PropertyType::Reference(ReferenceSpec {
        target: ReferenceTarget::Types(target),
        cardinality: Cardinality::One,
    })
}

const fn many(target: &'static [FeatureType]) -> PropertyType {
    PropertyType::Reference(ReferenceSpec {
        target: ReferenceTarget::Types(target),
        cardinality: Cardinality::Many,
    })
}

const DECLARED: PropertyType = PropertyType::Reference(ReferenceSpec {
    target: ReferenceTarget::Declared,
    cardinality: Cardinality::One,
});

const TO_ADDRESS: &[FeatureType] = &[FeatureType::Address];
const TO_AMENITY: &[FeatureType] = &[FeatureType::Amenity];
const TO_ANCHOR: &[FeatureType] = &[FeatureType::Anchor];
const TO_BUILDING: &[FeatureType] = &[FeatureType::Building];
const TO_LEVEL: &[FeatureType] = &[FeatureType::Level];
const TO_OCCUPANT: &[FeatureType] = &[FeatureType::Occupant];
const TO_SECTION: &[FeatureType] = &[FeatureType::Section];
const TO_UNIT: &[FeatureType] = &[FeatureType::Unit];

static ADDRESS: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Address,
    geometry: GeometryRule::Null,
    properties: &[
        req("address", P::Text),
        opt("unit", P::Text),
        req("locality", P::Text),
        opt("province", P::SubdivisionCode),
        req("country", P::CountryCode),
        opt("postal_code", P::Text),
        opt("postal_code_ext", P::Text),
        opt("postal_code_vanity", P::Text),
    ],
};

static AMENITY: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Amenity,
    geometry: GeometryRule::Point,
    properties: &[
        req("category", P::Category(C::Amenity)),
        opt("accessibility", P::CategorySet(C::Accessibility)),
        opt("name", P::Labels),
        opt("alt_name", P::Labels),
        opt("hours", P::Text),
        opt("phone", P::Text),
        opt("website", P::Text),
        req("unit_ids", many(TO_UNIT)),
        opt("address_id", one(TO_ADDRESS)),
        opt("correlation_id", one(TO_AMENITY)),
    ],
};

static ANCHOR: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Anchor,
    geometry: GeometryRule::Point,
    properties: &[
        opt("address_id", one(TO_ADDRESS)),
        req("unit_id", one(TO_UNIT)),
    ],
};

static BUILDING: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Building,
    geometry: GeometryRule::Null,
    properties: &[
        req("category", P::Category(C::Building)),
        req("restriction", P::Category(C::Restriction)),
        opt("name", P::Labels),
        opt("alt_name", P::Labels),
        opt("display_point", P::DisplayPoint),
        opt("address_id", one(TO_ADDRESS)),
    ],
};

static DETAIL: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Detail,
    geometry: GeometryRule::Any,
    properties: &[req("level_id", one(TO_LEVEL))],
};

static FIXTURE: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Fixture,
    geometry: GeometryRule::Polygonal,
    properties: &[
        req("category", P::Category(C::Fixture)),
        opt("name", P::Labels),
        opt("alt_name", P::Labels),
        opt("anchor_id", one(TO_ANCHOR)),
        req("level_id", one(TO_LEVEL)),
        opt("display_point", P::DisplayPoint),
    ],
};

static FOOTPRINT: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Footprint,
    geometry: GeometryRule::Polygonal,
    properties: &[
        req("category", P::Category(C::Footprint)),
        opt("name", P::Labels),
        req("building_ids", many(TO_BUILDING)),
    ],
};

static GEOFENCE: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Geofence,
    geometry: GeometryRule::Polygonal,
    properties: &[req("category", P::Category(C::Geofence))],
};

static KIOSK: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Kiosk,
    geometry: GeometryRule::Polygonal,
    properties: &[
        req("name", P::Labels),
        req("alt_name", P::Labels),
        opt("anchor_id", one(TO_ANCHOR)),
        opt("level_id", one(TO_LEVEL)),
        opt("display_point", P::DisplayPoint),
    ],
};

static LEVEL: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Level,
    geometry: GeometryRule::Polygonal,
    properties: &[
        req("category", P::Category(C::Level)),
        opt("restriction", P::Category(C::Restriction)),
        req("outdoor", P::Boolean),
        req("ordinal", P::Integer),
        req("name", P::Labels),
        req("short_name", P::Labels),
        opt("display_point", P::DisplayPoint),
        opt("address_id", one(TO_ADDRESS)),
        opt("building_ids", many(TO_BUILDING)),
    ],
};

static OCCUPANT: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Occupant,
    geometry: GeometryRule::Null,
    properties: &[
        req("name", P::Labels),
        req("category", P::Category(C::Occupant)),
        req("anchor_id", one(TO_ANCHOR)),
        opt("hours", P::Text),
        opt("phone", P::Text),
        opt("website", P::Text),
        opt("validity", P::Temporality),
        opt("correlation_id", one(TO_OCCUPANT)),
    ],
};

static OPENING: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Opening,
    geometry: GeometryRule::LineString,
    properties: &[
        req("category", P::Category(C::Opening)),
        opt("accessibility", P::CategorySet(C::Accessibility)),
        opt("access_control", P::CategorySet(C::AccessControl)),
        opt("door", P::Door),
        opt("name", P::Labels),
        opt("alt_name", P::Labels),
        opt("display_point", P::DisplayPoint),
        req("level_id", one(TO_LEVEL)),
    ],
};

static RELATIONSHIP: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Relationship,
    geometry: GeometryRule::Any,
    properties: &[
        req("category", P::Category(C::Relationship)),
        req("direction", P::OneOf(RELATIONSHIP_DIRECTIONS)),
        opt("origin", DECLARED),
        opt("intermediary", DECLARED),
        opt("destination", DECLARED),
        opt("hours", P::Text),
    ],
};

static SECTION: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Section,
    geometry: GeometryRule::Polygonal,
    properties: &[
        req("category", P::Category(C::Section)),
        opt("restriction", P::Category(C::Restriction)),
        opt("accessibility", P::CategorySet(C::Accessibility)),
        opt("name", P::Labels),
        opt("alt_name", P::Labels),
        opt("display_point", P::DisplayPoint),
        req("level_id", one(TO_LEVEL)),
        opt("address_id", one(TO_ADDRESS)),
        opt("correlation_id", one(TO_SECTION)),
        opt("parents", one(TO_SECTION)),
    ],
};

static UNIT: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Unit,
    geometry: GeometryRule::Polygonal,
    properties: &[
        req("category", P::Category(C::Unit)),
        opt("restriction", P::Category(C::Restriction)),
        opt("accessibility", P::CategorySet(C::Accessibility)),
        opt("name", P::Labels),
        opt("alt_name", P::Labels),
        req("level_id", one(TO_LEVEL)),
        opt("display_point", P::DisplayPoint),
    ],
};

static VENUE: FeatureSchema = FeatureSchema {
    feature_type: FeatureType::Venue,
    geometry: GeometryRule::Polygonal,
    properties: &[
        req("category", P::Category(C::Venue)),
        opt("restriction", P::Category(C::Restriction)),
        req("name", P::Labels),
        opt("alt_name", P::Labels),
        opt("hours", P::Text),
        opt("phone", P::Text),
        opt("website", P::Text),
        req("display_point", P::DisplayPoint),
        req("address_id", one(TO_ADDRESS)),
    ],
};
