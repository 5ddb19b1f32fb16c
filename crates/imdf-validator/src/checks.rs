// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-feature check stages
//!
//! Stages run in a fixed order and never short-circuit each other. Only a
//! vocabulary registry missing a queried category is an `Err`.

use chrono::DateTime;
use imdf_loader::json_kind;
use imdf_model::{
    CategoryKind, CategoryToken, Diagnostic, DiagnosticCode, Feature, FeatureGeometry,
    FeatureSchema, Geometry, Labels, PropertySpec, PropertyType, Result, SpatialPredicate,
    VocabularyRegistry, DOOR_MATERIALS,
};
use serde_json::Value;

/// Members of a temporality object
const TEMPORALITY_MEMBERS: [&str; 3] = ["start", "end", "modified"];

/// Stage 1: geometry kind against the schema rule
pub fn check_geometry(feature: &Feature, schema: &FeatureSchema) -> Vec<Diagnostic> {
    match &feature.geometry {
        FeatureGeometry::Malformed(e) => vec![Diagnostic::for_feature(
            DiagnosticCode::MalformedGeometry,
            feature.feature_type,
            &feature.id,
            e.to_string(),
        )
        .with_field("geometry")],
        geometry if !schema.geometry.accepts(geometry.kind()) => vec![Diagnostic::for_feature(
            DiagnosticCode::GeometryKindMismatch,
            feature.feature_type,
            &feature.id,
            format!(
                "{} geometry must be {}, found {}",
                feature.feature_type,
                schema.geometry.describe(),
                geometry.describe()
            ),
        )
        .with_field("geometry")],
        _ => Vec::new(),
    }
}

/// Stage 2: required properties present and non-null
///
/// Exactly one diagnostic per missing (feature, field) pair.
pub fn check_presence(feature: &Feature, schema: &FeatureSchema) -> Vec<Diagnostic> {
    schema
        .required()
        .filter(|prop| feature.get_non_null(prop.name).is_none())
        .map(|prop| {
            let state = if feature.get(prop.name).is_some() {
                "null"
            } else {
                "missing"
            };
            Diagnostic::for_feature(
                DiagnosticCode::MissingRequiredProperty,
                feature.feature_type,
                &feature.id,
                format!("required property {} is {state}", prop.name),
            )
            .with_field(prop.name)
        })
        .collect()
}

/// Stage 3: value checks for non-reference, non-label properties
pub struct PropertyChecker<'a> {
    pub registry: &'a VocabularyRegistry,
    pub spatial: &'a dyn SpatialPredicate,
    pub check_containment: bool,
    pub report_unexpected: bool,
}

impl PropertyChecker<'_> {
    /// Check every declared property value, then any undeclared keys
    pub fn check(&self, feature: &Feature, schema: &FeatureSchema) -> Result<Vec<Diagnostic>> {
        let mut out = Sink::new(feature);

        for prop in schema.properties {
            let Some(value) = feature.get_non_null(prop.name) else {
                continue;
            };
            self.check_value(feature, prop, value, &mut out)?;
        }

        if self.report_unexpected {
            for key in feature.properties.keys() {
                if schema.property(key).is_none() {
                    out.push(
                        DiagnosticCode::UnexpectedProperty,
                        key,
                        None,
                        format!("{key} is not a {} property", feature.feature_type),
                    );
                }
            }
        }

        Ok(out.finish())
    }

    fn check_value(
        &self,
        feature: &Feature,
        prop: &PropertySpec,
        value: &Value,
        out: &mut Sink<'_>,
    ) -> Result<()> {
        let field = prop.name;
        match prop.ty {
            // Checked by their own stages
            PropertyType::Labels | PropertyType::Reference(_) => {}
            PropertyType::Text => {
                if !value.is_string() {
                    out.invalid(field, None, format!("expected a string, found {}", json_kind(value)));
                }
            }
            PropertyType::Boolean => {
                if !value.is_boolean() {
                    out.invalid(field, None, format!("expected a boolean, found {}", json_kind(value)));
                }
            }
            PropertyType::Integer => {
                if !(value.is_i64() || value.is_u64()) {
                    out.invalid(field, None, format!("expected an integer, found {value}"));
                }
            }
            PropertyType::Category(kind) => self.check_token(kind, field, None, value, out)?,
            PropertyType::CategorySet(kind) => match value.as_array() {
                Some(items) => {
                    for (index, item) in items.iter().enumerate() {
                        self.check_token(kind, field, Some(index), item, out)?;
                    }
                }
                None => self.check_token(kind, field, None, value, out)?,
            },
            PropertyType::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                _ => out.invalid(
                    field,
                    None,
                    format!("expected one of {}, found {value}", allowed.join(", ")),
                ),
            },
            PropertyType::CountryCode => {
                if !value.as_str().is_some_and(is_country_code) {
                    out.invalid(field, None, format!("{value} is not an ISO 3166-1 alpha-2 code"));
                }
            }
            PropertyType::SubdivisionCode => {
                if !value.as_str().is_some_and(is_subdivision_code) {
                    out.invalid(field, None, format!("{value} is not an ISO 3166-2 code"));
                }
            }
            PropertyType::DisplayPoint => self.check_display_point(feature, field, value, out),
            PropertyType::Temporality => check_temporality(field, value, out),
            PropertyType::Door => self.check_door(field, value, out)?,
        }
        Ok(())
    }

    fn check_token(
        &self,
        kind: CategoryKind,
        field: &str,
        index: Option<usize>,
        value: &Value,
        out: &mut Sink<'_>,
    ) -> Result<()> {
        let Some(token) = CategoryToken::from_value(value) else {
            out.invalid(
                field,
                index,
                format!("{kind} category must be a string or integer token, found {}", json_kind(value)),
            );
            return Ok(());
        };
        if !self.registry.is_valid(kind, &token)? {
            out.push(
                DiagnosticCode::InvalidCategoryValue,
                field,
                index,
                format!("{token} is not a valid {kind} category"),
            );
        }
        Ok(())
    }

    fn check_display_point(&self, feature: &Feature, field: &str, value: &Value, out: &mut Sink<'_>) {
        let point = match Geometry::from_value(value) {
            Ok(Geometry::Point(p)) => p,
            Ok(other) => {
                out.invalid(field, None, format!("must be a Point, found {}", other.kind().name()));
                return;
            }
            Err(e) => {
                out.invalid(field, None, e.to_string());
                return;
            }
        };

        if !self.check_containment {
            return;
        }
        let Some(geometry) = feature.geometry.as_geometry() else {
            return;
        };
        if self.spatial.contains(geometry, &point) == Some(false) {
            out.push(
                DiagnosticCode::DisplayPointOutOfBounds,
                field,
                None,
                format!(
                    "({}, {}) lies outside the feature's {}",
                    point.x,
                    point.y,
                    geometry.kind().name()
                ),
            );
        }
    }

    fn check_door(&self, field: &str, value: &Value, out: &mut Sink<'_>) -> Result<()> {
        let Some(door) = value.as_object() else {
            out.invalid(field, None, format!("expected a door object, found {}", json_kind(value)));
            return Ok(());
        };

        if let Some(kind) = door.get("type").filter(|v| !v.is_null()) {
            self.check_token(CategoryKind::Door, &format!("{field}.type"), None, kind, out)?;
        }
        if let Some(automatic) = door.get("automatic").filter(|v| !v.is_null()) {
            if !automatic.is_boolean() {
                out.invalid(
                    &format!("{field}.automatic"),
                    None,
                    format!("expected a boolean, found {}", json_kind(automatic)),
                );
            }
        }
        if let Some(material) = door.get("material").filter(|v| !v.is_null()) {
            if !material.as_str().is_some_and(|m| DOOR_MATERIALS.contains(&m)) {
                out.invalid(
                    &format!("{field}.material"),
                    None,
                    format!("expected one of {}, found {material}", DOOR_MATERIALS.join(", ")),
                );
            }
        }
        Ok(())
    }
}

fn check_temporality(field: &str, value: &Value, out: &mut Sink<'_>) {
    let Some(obj) = value.as_object() else {
        out.invalid(field, None, format!("expected a temporality object, found {}", json_kind(value)));
        return;
    };

    let mut parsed = Vec::with_capacity(TEMPORALITY_MEMBERS.len());
    for member in TEMPORALITY_MEMBERS {
        let path = format!("{field}.{member}");
        match obj.get(member).and_then(|v| v.as_str()) {
            Some(text) => match DateTime::parse_from_rfc3339(text) {
                Ok(t) => parsed.push(Some(t)),
                Err(e) => {
                    out.invalid(&path, None, format!("{text:?} is not an RFC 3339 timestamp: {e}"));
                    parsed.push(None);
                }
            },
            None => {
                out.invalid(&path, None, "missing timestamp".to_string());
                parsed.push(None);
            }
        }
    }

    if let (Some(Some(start)), Some(Some(end))) = (parsed.first(), parsed.get(1)) {
        if end < start {
            out.invalid(&format!("{field}.end"), None, "end precedes start".to_string());
        }
    }
}

/// Stage 5: label well-formedness
pub fn check_labels(feature: &Feature, schema: &FeatureSchema) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for prop in schema
        .properties
        .iter()
        .filter(|p| p.ty == PropertyType::Labels)
    {
        let Some(value) = feature.get_non_null(prop.name) else {
            continue;
        };
        if let Err(errors) = Labels::from_value(value) {
            diagnostics.extend(errors.into_iter().map(|e| {
                Diagnostic::for_feature(
                    DiagnosticCode::MalformedLabels,
                    feature.feature_type,
                    &feature.id,
                    e.to_string(),
                )
                .with_field(prop.name)
            }));
        }
    }
    diagnostics
}

/// Check ISO 3166-1 alpha-2 syntax
pub fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Check ISO 3166-2 syntax (`US-CA`, `GB-LND`, `FR-75C`)
pub fn is_subdivision_code(code: &str) -> bool {
    match code.split_once('-') {
        Some((country, sub)) => {
            is_country_code(country)
                && (1..=3).contains(&sub.len())
                && sub
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        }
        None => false,
    }
}

/// Diagnostic collector for one feature
struct Sink<'f> {
    feature: &'f Feature,
    diagnostics: Vec<Diagnostic>,
}

impl<'f> Sink<'f> {
    fn new(feature: &'f Feature) -> Self {
        Self {
            feature,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, code: DiagnosticCode, field: &str, index: Option<usize>, message: String) {
        let diagnostic = Diagnostic::for_feature(
            code,
            self.feature.feature_type,
            &self.feature.id,
            message,
        )
        .with_field(field);
        self.diagnostics.push(match index {
            Some(i) => diagnostic.with_index(i),
            None => diagnostic,
        });
    }

    fn invalid(&mut self, field: &str, index: Option<usize>, message: String) {
        self.push(DiagnosticCode::InvalidPropertyValue, field, index, message);
    }

    fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
