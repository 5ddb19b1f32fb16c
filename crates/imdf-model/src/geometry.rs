// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoJSON geometry model and containment
//!
//! Only the structure needed for validation is decoded: positions, rings and
//! the geometry kind. Topological correctness (self-intersection, ring
//! orientation) is out of scope; containment is delegated to a
//! [`SpatialPredicate`] so a full geometry engine can be plugged in.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Planar position (longitude, latitude); altitude is ignored
pub type Position = Point2<f64>;

/// Closed linear ring (first position equals last)
pub type Ring = Vec<Position>;

/// Decoded GeoJSON geometry
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    /// Outer ring followed by holes
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    GeometryCollection(Vec<Geometry>),
}

/// GeoJSON geometry kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// Parse the GeoJSON `type` member
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Point" => Some(GeometryKind::Point),
            "MultiPoint" => Some(GeometryKind::MultiPoint),
            "LineString" => Some(GeometryKind::LineString),
            "MultiLineString" => Some(GeometryKind::MultiLineString),
            "Polygon" => Some(GeometryKind::Polygon),
            "MultiPolygon" => Some(GeometryKind::MultiPolygon),
            "GeometryCollection" => Some(GeometryKind::GeometryCollection),
            _ => None,
        }
    }

    /// Get the GeoJSON `type` name
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
        }
    }

    /// Check for Polygon or MultiPolygon
    pub fn is_polygonal(&self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }
}

/// Geometry constraint declared by a feature type's schema entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryRule {
    /// Geometry must be `null` or absent
    Null,
    /// Exactly a Point
    Point,
    /// Exactly a LineString
    LineString,
    /// Polygon or MultiPolygon
    Polygonal,
    /// Any geometry, or none
    Any,
}

impl GeometryRule {
    /// Check whether a geometry kind (`None` = absent) satisfies the rule
    pub fn accepts(&self, kind: Option<GeometryKind>) -> bool {
        match (self, kind) {
            (GeometryRule::Any, _) => true,
            (GeometryRule::Null, None) => true,
            (GeometryRule::Point, Some(GeometryKind::Point)) => true,
            (GeometryRule::LineString, Some(GeometryKind::LineString)) => true,
            (GeometryRule::Polygonal, Some(k)) => k.is_polygonal(),
            _ => false,
        }
    }

    /// Description for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            GeometryRule::Null => "null",
            GeometryRule::Point => "Point",
            GeometryRule::LineString => "LineString",
            GeometryRule::Polygonal => "Polygon or MultiPolygon",
            GeometryRule::Any => "any geometry",
        }
    }
}

/// Reasons a geometry object cannot be decoded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Geometry is not a JSON object
    #[error("geometry is not an object")]
    NotAnObject,

    /// `type` member missing or not a GeoJSON geometry type
    #[error("unknown geometry type {0:?}")]
    UnknownType(String),

    /// Required member missing
    #[error("{kind} is missing its \"{member}\" member")]
    MissingMember {
        kind: &'static str,
        member: &'static str,
    },

    /// Coordinates of the wrong shape
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Too few positions for the geometry kind
    #[error("{what} needs at least {min} positions, found {found}")]
    TooFewPositions {
        what: &'static str,
        min: usize,
        found: usize,
    },

    /// Linear ring whose first and last positions differ
    #[error("linear ring is not closed")]
    UnclosedRing,
}

type GeometryResult<T> = std::result::Result<T, GeometryError>;

impl Geometry {
    /// Decode a GeoJSON geometry object
    pub fn from_value(value: &Value) -> GeometryResult<Geometry> {
        let obj = value.as_object().ok_or(GeometryError::NotAnObject)?;
        let type_name = obj.get("type").and_then(|t| t.as_str()).unwrap_or("");
        let kind = GeometryKind::parse(type_name)
            .ok_or_else(|| GeometryError::UnknownType(type_name.to_string()))?;

        let coordinates = || {
            obj.get("coordinates").ok_or(GeometryError::MissingMember {
                kind: kind.name(),
                member: "coordinates",
            })
        };

        match kind {
            GeometryKind::Point => decode_position(coordinates()?).map(Geometry::Point),
            GeometryKind::MultiPoint => decode_positions(coordinates()?).map(Geometry::MultiPoint),
            GeometryKind::LineString => decode_line(coordinates()?).map(Geometry::LineString),
            GeometryKind::MultiLineString => {
                each(coordinates()?, decode_line).map(Geometry::MultiLineString)
            }
            GeometryKind::Polygon => decode_polygon(coordinates()?).map(Geometry::Polygon),
            GeometryKind::MultiPolygon => {
                each(coordinates()?, decode_polygon).map(Geometry::MultiPolygon)
            }
            GeometryKind::GeometryCollection => obj
                .get("geometries")
                .and_then(|g| g.as_array())
                .ok_or(GeometryError::MissingMember {
                    kind: kind.name(),
                    member: "geometries",
                })?
                .iter()
                .map(Geometry::from_value)
                .collect::<GeometryResult<Vec<_>>>()
                .map(Geometry::GeometryCollection),
        }
    }

    /// Get the geometry kind
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// Get the point, if this is a Point
    pub fn as_point(&self) -> Option<Position> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }
}

fn each<T>(value: &Value, decode: fn(&Value) -> GeometryResult<T>) -> GeometryResult<Vec<T>> {
    value
        .as_array()
        .ok_or_else(|| GeometryError::InvalidCoordinates("expected an array".to_string()))?
        .iter()
        .map(decode)
        .collect()
}

fn decode_position(value: &Value) -> GeometryResult<Position> {
    let parts = value
        .as_array()
        .ok_or_else(|| GeometryError::InvalidCoordinates("position is not an array".to_string()))?;
    if parts.len() < 2 {
        return Err(GeometryError::InvalidCoordinates(format!(
            "position has {} ordinates",
            parts.len()
        )));
    }
    let x = parts[0].as_f64().filter(|v| v.is_finite());
    let y = parts[1].as_f64().filter(|v| v.is_finite());
    match (x, y) {
        (Some(x), Some(y)) => Ok(Position::new(x, y)),
        _ => Err(GeometryError::InvalidCoordinates(
            "position ordinates must be finite numbers".to_string(),
        )),
    }
}

fn decode_positions(value: &Value) -> GeometryResult<Vec<Position>> {
    each(value, decode_position)
}

fn decode_line(value: &Value) -> GeometryResult<Vec<Position>> {
    let line = decode_positions(value)?;
    if line.len() < 2 {
        return Err(GeometryError::TooFewPositions {
            what: "LineString",
            min: 2,
            found: line.len(),
        });
    }
    Ok(line)
}

fn decode_ring(value: &Value) -> GeometryResult<Ring> {
    let ring = decode_positions(value)?;
    if ring.len() < 4 {
        return Err(GeometryError::TooFewPositions {
            what: "linear ring",
            min: 4,
            found: ring.len(),
        });
    }
    if ring.first() != ring.last() {
        return Err(GeometryError::UnclosedRing);
    }
    Ok(ring)
}

fn decode_polygon(value: &Value) -> GeometryResult<Vec<Ring>> {
    let rings = each(value, decode_ring)?;
    if rings.is_empty() {
        return Err(GeometryError::InvalidCoordinates(
            "polygon has no rings".to_string(),
        ));
    }
    Ok(rings)
}

/// Containment oracle used for the display point check
///
/// Implementations may wrap a full geometry engine. `None` means the
/// predicate does not apply to this geometry (e.g., a LineString).
pub trait SpatialPredicate: Send + Sync {
    fn contains(&self, geometry: &Geometry, point: &Position) -> Option<bool>;
}

/// Planar ray-casting containment
///
/// Boundary points of the outer ring count as inside; points strictly inside
/// a hole are outside.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanarContainment;

const BOUNDARY_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RingLocation {
    Inside,
    Boundary,
    Outside,
}

impl SpatialPredicate for PlanarContainment {
    fn contains(&self, geometry: &Geometry, point: &Position) -> Option<bool> {
        match geometry {
            Geometry::Polygon(rings) => Some(polygon_contains(rings, point)),
            Geometry::MultiPolygon(polygons) => {
                Some(polygons.iter().any(|rings| polygon_contains(rings, point)))
            }
            Geometry::GeometryCollection(members) => {
                let results: Vec<bool> = members
                    .iter()
                    .filter_map(|g| self.contains(g, point))
                    .collect();
                if results.is_empty() {
                    None
                } else {
                    Some(results.into_iter().any(|inside| inside))
                }
            }
            _ => None,
        }
    }
}

fn polygon_contains(rings: &[Ring], point: &Position) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    if locate(outer, point) == RingLocation::Outside {
        return false;
    }
    !holes
        .iter()
        .any(|hole| locate(hole, point) == RingLocation::Inside)
}

fn locate(ring: &[Position], p: &Position) -> RingLocation {
    let mut inside = false;
    for pair in ring.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if on_segment(a, b, p) {
            return RingLocation::Boundary;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    if inside {
        RingLocation::Inside
    } else {
        RingLocation::Outside
    }
}

fn on_segment(a: &Position, b: &Position, p: &Position) -> bool {
    let ab = b - a;
    let ap = p - a;
    let cross = ab.x * ap.y - ab.y * ap.x;
    let scale = ab.norm().max(1.0);
    if cross.abs() > BOUNDARY_EPSILON * scale {
        return false;
    }
    p.x >= a.x.min(b.x) - BOUNDARY_EPSILON
        && p.x <= a.x.max(b.x) + BOUNDARY_EPSILON
        && p.y >= a.y.min(b.y) - BOUNDARY_EPSILON
        && p.y <= a.y.max(b.y) + BOUNDARY_EPSILON
}
