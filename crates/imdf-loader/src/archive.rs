// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LoadedArchive - Main IMDF archive implementation

use crate::geojson::{collection_features, decode_feature, Decoded};
use crate::index::FeatureIndex;

use imdf_model::{
    Diagnostic, DiagnosticCode, FeatureArchive, FeatureResolver, FeatureType, Manifest, Report,
    Result,
};
use serde_json::Value;

/// Loaded IMDF archive implementing the `FeatureArchive` trait
#[derive(Debug, Default)]
pub struct LoadedArchive {
    /// Global `(feature_type, id)` index
    index: FeatureIndex,
    /// Diagnostics recorded while loading
    report: Report,
    /// Archive metadata
    manifest: Option<Manifest>,
    /// Feature types present in the source
    collections: Vec<FeatureType>,
}

impl LoadedArchive {
    /// Ingest decoded collection documents
    ///
    /// Collections must be given in feature type order. Bad features are
    /// recorded and skipped; only a bad collection envelope is fatal.
    pub(crate) fn ingest<'a, I>(collections: I, properties_fallback: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (FeatureType, &'a Value)>,
    {
        let mut archive = LoadedArchive::default();

        for (feature_type, doc) in collections {
            let features = collection_features(feature_type, doc)?;
            let mut accepted = 0usize;

            for (position, value) in features.iter().enumerate() {
                match decode_feature(feature_type, value, properties_fallback) {
                    Decoded::Accepted(feature) => {
                        let id = feature.id.clone();
                        if archive.index.insert(feature) {
                            accepted += 1;
                        } else {
                            log::debug!("{feature_type} {id}: duplicate id at position {position}");
                            archive.report.push(
                                Diagnostic::for_feature(
                                    DiagnosticCode::DuplicateId,
                                    feature_type,
                                    &id,
                                    format!("id {id} already used by another {feature_type}; first occurrence kept"),
                                )
                                .with_index(position),
                            );
                        }
                    }
                    Decoded::Mismatch { id, declared } => {
                        let declared = declared.as_deref().unwrap_or("nothing");
                        log::debug!("{feature_type} {id}: declares {declared}, excluded");
                        archive.report.push(
                            Diagnostic::for_feature(
                                DiagnosticCode::TypeMismatch,
                                feature_type,
                                &id,
                                format!("feature_type declares {declared} inside the {feature_type} collection"),
                            )
                            .with_field("feature_type")
                            .with_index(position),
                        );
                    }
                    Decoded::Malformed { id, reason } => {
                        log::debug!("{feature_type} #{position}: {reason}, excluded");
                        archive.report.push(
                            Diagnostic::new(DiagnosticCode::MalformedFeature, feature_type, id, reason)
                                .with_index(position),
                        );
                    }
                }
            }

            log::debug!(
                "{feature_type}: {accepted} of {} features accepted",
                features.len()
            );
            archive.collections.push(feature_type);
        }

        archive.report.sort();
        log::info!(
            "Loaded {} features from {} collections ({} load diagnostics)",
            archive.index.feature_count(),
            archive.collections.len(),
            archive.report.len()
        );
        Ok(archive)
    }

    /// Attach archive metadata
    pub(crate) fn set_manifest(&mut self, manifest: Manifest) {
        self.manifest = Some(manifest);
    }

    /// Get the feature index
    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }
}

impl FeatureArchive for LoadedArchive {
    fn resolver(&self) -> &dyn FeatureResolver {
        &self.index
    }

    fn load_report(&self) -> &Report {
        &self.report
    }

    fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    fn collection_types(&self) -> Vec<FeatureType> {
        self.collections.clone()
    }
}
