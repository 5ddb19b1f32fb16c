// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference Resolver - checks every declared reference field of a feature
//!
//! Each reference occurrence is looked up by `(feature_type, id)` in the
//! read-only archive index. An id found under no type is dangling; an id
//! found only under other types is a type mismatch.

use imdf_loader::json_kind;
use imdf_model::{
    schema_for, Cardinality, Diagnostic, DiagnosticCode, Feature, FeatureId, FeatureReference,
    FeatureResolver, FeatureResolverExt, FeatureType, ReferenceSpec, ReferenceTarget, Resolution,
    Stage,
};
use serde_json::Value;

/// One identifier found in a reference field
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceOccurrence<'a> {
    /// Reference field name
    pub field: &'static str,
    /// Position in the array, for many-valued fields
    pub index: Option<usize>,
    /// Referenced id
    pub id: FeatureId,
    /// Accepted target types
    pub targets: Vec<FeatureType>,
    /// Lookup outcome
    pub resolution: Resolution<'a>,
}

impl ReferenceOccurrence<'_> {
    /// Convert an unresolved occurrence into its diagnostic
    pub fn diagnostic(&self, source: &Feature) -> Option<Diagnostic> {
        let expected = type_names(&self.targets, " or ");

        let diagnostic = match &self.resolution {
            Resolution::Resolved(_) => return None,
            Resolution::Missing => Diagnostic::for_feature(
                DiagnosticCode::DanglingReference,
                source.feature_type,
                &source.id,
                format!("{expected} {} does not exist", self.id),
            ),
            Resolution::WrongType(found) => Diagnostic::for_feature(
                DiagnosticCode::ReferenceTypeMismatch,
                source.feature_type,
                &source.id,
                format!(
                    "{} is a {}, expected {expected}",
                    self.id,
                    type_names(found, "/")
                ),
            ),
        };

        let diagnostic = diagnostic.with_field(self.field);
        Some(match self.index {
            Some(index) => diagnostic.with_index(index),
            None => diagnostic,
        })
    }
}

/// Reference checks against a read-only feature index
pub struct ReferenceResolver<'a> {
    index: &'a dyn FeatureResolver,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver over an index
    pub fn new(index: &'a dyn FeatureResolver) -> Self {
        Self { index }
    }

    /// Resolve every reference occurrence of a feature
    ///
    /// Returns the occurrences in field then array order, together with
    /// diagnostics for reference values of the wrong shape. Absent and null
    /// values produce nothing here; presence is checked elsewhere.
    pub fn resolve(&self, feature: &Feature) -> (Vec<ReferenceOccurrence<'a>>, Vec<Diagnostic>) {
        let mut occurrences = Vec::new();
        let mut problems = Vec::new();

        for (prop, spec) in schema_for(feature.feature_type).references() {
            let Some(value) = feature.get_non_null(prop.name) else {
                continue;
            };
            self.resolve_field(feature, prop.name, spec, value, &mut occurrences, &mut problems);
        }

        (occurrences, problems)
    }

    /// Check every reference field of a feature
    ///
    /// Diagnostics come out ordered by field name, then array index.
    pub fn check(&self, feature: &Feature) -> Vec<Diagnostic> {
        let (occurrences, mut diagnostics) = self.resolve(feature);
        diagnostics.extend(occurrences.iter().filter_map(|o| o.diagnostic(feature)));
        diagnostics.sort_by(|a, b| a.report_order(b));
        diagnostics
    }

    fn resolve_field(
        &self,
        feature: &Feature,
        field: &'static str,
        spec: &ReferenceSpec,
        value: &Value,
        occurrences: &mut Vec<ReferenceOccurrence<'a>>,
        problems: &mut Vec<Diagnostic>,
    ) {
        match (spec.cardinality, &spec.target) {
            (Cardinality::One, ReferenceTarget::Types(targets)) => match value.as_str() {
                Some(id) => occurrences.push(self.occurrence(field, None, id, targets)),
                None => problems.push(shape_problem(
                    feature,
                    field,
                    None,
                    format!("expected an identifier string, found {}", json_kind(value)),
                )),
            },
            (Cardinality::Many, ReferenceTarget::Types(targets)) => {
                let Some(items) = value.as_array() else {
                    problems.push(shape_problem(
                        feature,
                        field,
                        None,
                        format!("expected an array of identifiers, found {}", json_kind(value)),
                    ));
                    return;
                };
                for (index, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(id) => occurrences.push(self.occurrence(field, Some(index), id, targets)),
                        None => problems.push(shape_problem(
                            feature,
                            field,
                            Some(index),
                            format!("expected an identifier string, found {}", json_kind(item)),
                        )),
                    }
                }
            }
            (_, ReferenceTarget::Declared) => {
                match serde_json::from_value::<FeatureReference>(value.clone()) {
                    Ok(reference) => occurrences.push(self.occurrence(
                        field,
                        None,
                        reference.id.as_str(),
                        &[reference.feature_type],
                    )),
                    Err(e) => problems.push(shape_problem(
                        feature,
                        field,
                        None,
                        format!("expected {{\"id\", \"feature_type\"}} reference: {e}"),
                    )),
                }
            }
        }
    }

    fn occurrence(
        &self,
        field: &'static str,
        index: Option<usize>,
        id: &str,
        targets: &[FeatureType],
    ) -> ReferenceOccurrence<'a> {
        let id = FeatureId::from(id);
        let lookup: &'a dyn FeatureResolver = self.index;
        let resolution = lookup.resolve(&id, targets);
        ReferenceOccurrence {
            field,
            index,
            id,
            targets: targets.to_vec(),
            resolution,
        }
    }
}

fn type_names(types: &[FeatureType], separator: &str) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(separator)
}

fn shape_problem(
    feature: &Feature,
    field: &'static str,
    index: Option<usize>,
    message: String,
) -> Diagnostic {
    let diagnostic = Diagnostic::for_feature(
        DiagnosticCode::InvalidPropertyValue,
        feature.feature_type,
        &feature.id,
        message,
    )
    .with_field(field)
    .with_stage(Stage::References);
    match index {
        Some(index) => diagnostic.with_index(index),
        None => diagnostic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imdf_loader::FeatureIndex;
    use serde_json::json;

    fn index() -> FeatureIndex {
        let mut index = FeatureIndex::new();
        index.insert(Feature::new("L1", FeatureType::Level));
        index.insert(Feature::new("B1", FeatureType::Building));
        index.insert(Feature::new("U1", FeatureType::Unit));
        index
    }

    #[test]
    fn test_resolved_reference_is_silent() {
        let index = index();
        let unit = Feature::new("U2", FeatureType::Unit).with_property("level_id", json!("L1"));
        let resolver = ReferenceResolver::new(&index);

        let (occurrences, problems) = resolver.resolve(&unit);
        assert_eq!(occurrences.len(), 1);
        assert!(matches!(occurrences[0].resolution, Resolution::Resolved(_)));
        assert!(problems.is_empty());
        assert!(resolver.check(&unit).is_empty());
    }

    #[test]
    fn test_dangling_and_type_mismatch() {
        let index = index();
        let resolver = ReferenceResolver::new(&index);

        let unit = Feature::new("U2", FeatureType::Unit).with_property("level_id", json!("L9"));
        let diagnostics = resolver.check(&unit);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::DanglingReference);
        assert_eq!(diagnostics[0].field.as_deref(), Some("level_id"));

        let unit = Feature::new("U3", FeatureType::Unit).with_property("level_id", json!("B1"));
        let diagnostics = resolver.check(&unit);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::ReferenceTypeMismatch);
        assert!(diagnostics[0].message.contains("building"));
    }

    #[test]
    fn test_arrays_resolve_element_wise() {
        let index = index();
        let resolver = ReferenceResolver::new(&index);
        let footprint = Feature::new("F1", FeatureType::Footprint)
            .with_property("building_ids", json!(["B1", "B9", 4, "B1"]));

        let diagnostics = resolver.check(&footprint);
        let found: Vec<_> = diagnostics.iter().map(|d| (d.code, d.index)).collect();
        assert_eq!(
            found,
            vec![
                (DiagnosticCode::DanglingReference, Some(1)),
                (DiagnosticCode::InvalidPropertyValue, Some(2)),
            ]
        );
    }

    #[test]
    fn test_null_and_absent_references_are_skipped() {
        let index = index();
        let resolver = ReferenceResolver::new(&index);
        let section = Feature::new("S1", FeatureType::Section)
            .with_property("address_id", Value::Null)
            .with_property("level_id", json!("L1"));
        assert!(resolver.check(&section).is_empty());
    }

    #[test]
    fn test_declared_references() {
        let index = index();
        let resolver = ReferenceResolver::new(&index);
        let relationship = Feature::new("R1", FeatureType::Relationship)
            .with_property("origin", json!({"id": "U1", "feature_type": "unit"}))
            .with_property("destination", json!({"id": "U1", "feature_type": "level"}))
            .with_property("intermediary", json!({"id": "X", "feature_type": "room"}));

        let diagnostics = resolver.check(&relationship);
        let found: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.field.as_deref().unwrap_or(""), d.code))
            .collect();
        assert_eq!(
            found,
            vec![
                ("destination", DiagnosticCode::ReferenceTypeMismatch),
                ("intermediary", DiagnosticCode::InvalidPropertyValue),
            ]
        );
    }
}
