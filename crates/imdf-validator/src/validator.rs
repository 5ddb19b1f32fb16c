// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validator - runs every check stage over a loaded archive
//!
//! The archive index is built before validation starts and only read here,
//! so each feature collection is an independent unit of work. Per-type
//! diagnostic lists are merged and sorted into report order afterwards.

use crate::checks::{check_geometry, check_labels, check_presence, PropertyChecker};
use crate::config::ValidatorConfig;
use crate::resolver::ReferenceResolver;
use imdf_model::{
    schema_for, Diagnostic, Feature, FeatureArchive, FeatureResolver, FeatureType,
    PlanarContainment, Report, Result, SpatialPredicate, VocabularyRegistry,
};
use rayon::prelude::*;
use std::sync::Arc;

/// Archive validator
///
/// Holds the static collaborators (vocabularies, containment oracle) and the
/// options. A validator can be reused for any number of archives; every call
/// produces a fresh, independent [`Report`].
#[derive(Clone)]
pub struct Validator {
    registry: Arc<VocabularyRegistry>,
    spatial: Arc<dyn SpatialPredicate>,
    config: ValidatorConfig,
}

impl Validator {
    /// Create a validator with the built-in vocabularies and default options
    pub fn new() -> Result<Self> {
        Ok(Self::with_registry(VocabularyRegistry::builtin()?))
    }

    /// Create a validator over a specific vocabulary registry
    pub fn with_registry(registry: Arc<VocabularyRegistry>) -> Self {
        Self {
            registry,
            spatial: Arc::new(PlanarContainment),
            config: ValidatorConfig::default(),
        }
    }

    /// Set options
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the containment oracle used for display points
    pub fn with_spatial_predicate(mut self, spatial: Arc<dyn SpatialPredicate>) -> Self {
        self.spatial = spatial;
        self
    }

    /// Get options
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a loaded archive
    ///
    /// Load diagnostics are carried into the report. Returns `Err` only for
    /// configuration problems; bad data always yields a report.
    pub fn validate(&self, archive: &dyn FeatureArchive) -> Result<Report> {
        let resolver = archive.resolver();
        let types: Vec<FeatureType> = FeatureType::ALL
            .into_iter()
            .filter(|ft| resolver.count_by_type(*ft) > 0)
            .collect();

        log::debug!(
            "Validating {} collections ({})",
            types.len(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        let per_type: Vec<Result<Vec<Diagnostic>>> = if self.config.parallel {
            types
                .par_iter()
                .map(|ft| self.validate_collection(resolver, *ft))
                .collect()
        } else {
            types
                .iter()
                .map(|ft| self.validate_collection(resolver, *ft))
                .collect()
        };

        let mut report = archive.load_report().clone();
        // First failure in feature type order, so the error is deterministic too
        for diagnostics in per_type {
            report.extend(diagnostics?);
        }
        report.sort();

        log::info!(
            "Validated {} features: {} errors, {} warnings, {}",
            resolver.feature_count(),
            report.errors().count(),
            report.warnings().count(),
            if report.passed() { "pass" } else { "fail" }
        );
        Ok(report)
    }

    /// Validate every feature of one collection
    pub fn validate_collection(
        &self,
        resolver: &dyn FeatureResolver,
        feature_type: FeatureType,
    ) -> Result<Vec<Diagnostic>> {
        let references = ReferenceResolver::new(resolver);
        let mut diagnostics = Vec::new();
        for feature in resolver.features_by_type(feature_type) {
            diagnostics.extend(self.validate_feature_with(feature, &references)?);
        }
        Ok(diagnostics)
    }

    /// Validate one feature against an index
    pub fn validate_feature(
        &self,
        feature: &Feature,
        resolver: &dyn FeatureResolver,
    ) -> Result<Vec<Diagnostic>> {
        self.validate_feature_with(feature, &ReferenceResolver::new(resolver))
    }

    fn validate_feature_with(
        &self,
        feature: &Feature,
        references: &ReferenceResolver<'_>,
    ) -> Result<Vec<Diagnostic>> {
        let schema = schema_for(feature.feature_type);
        let properties = PropertyChecker {
            registry: &self.registry,
            spatial: self.spatial.as_ref(),
            check_containment: self.config.check_display_point_containment,
            report_unexpected: self.config.report_unexpected_properties,
        };

        let mut diagnostics = check_geometry(feature, schema);
        diagnostics.extend(check_presence(feature, schema));
        diagnostics.extend(properties.check(feature, schema)?);
        diagnostics.extend(references.check(feature));
        diagnostics.extend(check_labels(feature, schema));
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imdf_loader::FeatureIndex;
    use imdf_model::{DiagnosticCode, Geometry, Stage};
    use serde_json::json;

    fn square() -> Geometry {
        Geometry::from_value(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]]
        }))
        .unwrap()
    }

    #[test]
    fn test_stages_run_in_order_without_short_circuit() {
        let mut index = FeatureIndex::new();
        index.insert(Feature::new("B1", FeatureType::Building));
        let unit = Feature::new("U1", FeatureType::Unit)
            .with_property("restriction", json!("flying"))
            .with_property("level_id", json!("B1"))
            .with_property("name", json!({"": "x"}));

        let validator = Validator::new().unwrap();
        let diagnostics = validator.validate_feature(&unit, &index).unwrap();
        let stages: Vec<_> = diagnostics.iter().map(|d| (d.stage, d.code)).collect();
        assert_eq!(
            stages,
            vec![
                (Stage::Geometry, DiagnosticCode::GeometryKindMismatch),
                (Stage::Presence, DiagnosticCode::MissingRequiredProperty),
                (Stage::Properties, DiagnosticCode::InvalidCategoryValue),
                (Stage::References, DiagnosticCode::ReferenceTypeMismatch),
                (Stage::Labels, DiagnosticCode::MalformedLabels),
            ]
        );
    }

    #[test]
    fn test_containment_can_be_disabled() {
        let mut index = FeatureIndex::new();
        index.insert(Feature::new("L1", FeatureType::Level));
        let unit = Feature::new("U1", FeatureType::Unit)
            .with_geometry(square())
            .with_property("category", json!("room"))
            .with_property("level_id", json!("L1"))
            .with_property("display_point", json!({"type": "Point", "coordinates": [9.0, 9.0]}));

        let validator = Validator::new().unwrap();
        let diagnostics = validator.validate_feature(&unit, &index).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::DisplayPointOutOfBounds);

        let validator = validator
            .with_config(ValidatorConfig::new().with_display_point_containment(false));
        assert!(validator.validate_feature(&unit, &index).unwrap().is_empty());
    }

    struct NeverInside;

    impl SpatialPredicate for NeverInside {
        fn contains(&self, _geometry: &Geometry, _point: &imdf_model::Position) -> Option<bool> {
            Some(false)
        }
    }

    #[test]
    fn test_custom_spatial_predicate() {
        let mut index = FeatureIndex::new();
        index.insert(Feature::new("L1", FeatureType::Level));
        let unit = Feature::new("U1", FeatureType::Unit)
            .with_geometry(square())
            .with_property("category", json!("room"))
            .with_property("level_id", json!("L1"))
            .with_property("display_point", json!({"type": "Point", "coordinates": [1.0, 1.0]}));

        let validator = Validator::new()
            .unwrap()
            .with_spatial_predicate(Arc::new(NeverInside));
        let diagnostics = validator.validate_feature(&unit, &index).unwrap();
        assert_eq!(diagnostics[0].code, DiagnosticCode::DisplayPointOutOfBounds);
    }
}
