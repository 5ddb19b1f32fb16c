// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IMDF Loader - GeoJSON archive ingestion
//!
//! This crate reads the per-type feature collections of an IMDF archive and
//! builds the global `(feature_type, id)` index. It implements the traits
//! defined in `imdf-model`.
//!
//! # Features
//!
//! - **Partial-failure tolerant** - bad features become diagnostics, never errors
//! - **Three sources** - JSON values, JSON text, or an unpacked archive directory
//! - **Deterministic** - collections are processed in feature type order
//!
//! # Example
//!
//! ```ignore
//! use imdf_loader::ArchiveLoader;
//! use imdf_model::FeatureArchive;
//!
//! let archive = ArchiveLoader::new().load_dir("venue.imdf")?;
//! println!("{} features", archive.resolver().feature_count());
//! ```

mod archive;
mod geojson;
mod index;

pub use archive::LoadedArchive;
pub use geojson::{collection_features, decode_feature, json_kind, Decoded};
pub use index::FeatureIndex;

use imdf_model::{FeatureType, ImdfError, Manifest, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const MANIFEST_FILE: &str = "manifest.json";
const COLLECTION_EXTENSION: &str = "geojson";

/// Archive loader
///
/// Entry point for reading an IMDF archive into a [`LoadedArchive`].
#[derive(Clone, Debug)]
pub struct ArchiveLoader {
    /// Accept `properties.feature_type` when the top-level member is absent
    pub feature_type_fallback: bool,
}

impl Default for ArchiveLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveLoader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            feature_type_fallback: true,
        }
    }

    /// Set whether `properties.feature_type` may stand in for the top-level member
    pub fn with_feature_type_fallback(mut self, enabled: bool) -> Self {
        self.feature_type_fallback = enabled;
        self
    }

    /// Load collections keyed by feature type name
    ///
    /// An unknown name, a name given twice, or a document that is not a
    /// FeatureCollection aborts the load.
    pub fn load<K, I>(&self, collections: I) -> Result<LoadedArchive>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let ordered = order_collections(collections)?;
        LoadedArchive::ingest(
            ordered.iter().map(|(ft, doc)| (*ft, doc)),
            self.feature_type_fallback,
        )
    }

    /// Load collections given as JSON text
    pub fn load_str<K, S, I>(&self, collections: I) -> Result<LoadedArchive>
    where
        K: AsRef<str>,
        S: AsRef<str>,
        I: IntoIterator<Item = (K, S)>,
    {
        let parsed = collections
            .into_iter()
            .map(|(name, text)| Ok((name, serde_json::from_str::<Value>(text.as_ref())?)))
            .collect::<Result<Vec<_>>>()?;
        self.load(parsed)
    }

    /// Load an unpacked archive directory
    ///
    /// Every `<feature_type>.geojson` file is a collection; `manifest.json`,
    /// when present and decodable, is kept as metadata. Other files are
    /// ignored.
    pub fn load_dir(&self, path: impl AsRef<Path>) -> Result<LoadedArchive> {
        let path = path.as_ref();
        let mut collections = Vec::new();
        let mut manifest = None;

        for entry in fs::read_dir(path)? {
            let file = entry?.path();
            if !file.is_file() {
                continue;
            }
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if name == MANIFEST_FILE {
                manifest = read_manifest(&file)?;
                continue;
            }

            let is_collection = file
                .extension()
                .is_some_and(|ext| ext == COLLECTION_EXTENSION);
            if let (true, Some(stem)) = (is_collection, file.file_stem().and_then(|s| s.to_str())) {
                let text = fs::read_to_string(&file)?;
                collections.push((stem.to_string(), serde_json::from_str::<Value>(&text)?));
            }
        }

        log::debug!(
            "{}: {} collection files, manifest {}",
            path.display(),
            collections.len(),
            if manifest.is_some() { "present" } else { "absent" }
        );

        let mut archive = self.load(collections)?;
        if let Some(manifest) = manifest {
            archive.set_manifest(manifest);
        }
        Ok(archive)
    }
}

fn order_collections<K, I>(collections: I) -> Result<BTreeMap<FeatureType, Value>>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Value)>,
{
    let mut ordered = BTreeMap::new();
    for (name, doc) in collections {
        let feature_type: FeatureType = name.as_ref().parse()?;
        if ordered.insert(feature_type, doc).is_some() {
            return Err(ImdfError::collection(
                feature_type,
                "collection supplied more than once",
            ));
        }
    }
    Ok(ordered)
}

/// Quick load function for simple use cases
pub fn load<K, I>(collections: I) -> Result<LoadedArchive>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Value)>,
{
    ArchiveLoader::new().load(collections)
}

/// Load an unpacked archive directory with default settings
pub fn load_dir(path: impl AsRef<Path>) -> Result<LoadedArchive> {
    ArchiveLoader::new().load_dir(path)
}

/// Read `manifest.json`; an undecodable manifest is dropped, not fatal
fn read_manifest(file: &Path) -> Result<Option<Manifest>> {
    let text = fs::read_to_string(file)?;
    match serde_json::from_str::<Manifest>(&text) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(e) => {
            log::warn!("{}: manifest ignored: {}", file.display(), e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imdf_model::{DiagnosticCode, FeatureArchive, FeatureId, FeatureResolver};
    use serde_json::json;

    fn feature(id: &str, feature_type: &str) -> Value {
        json!({
            "id": id,
            "type": "Feature",
            "feature_type": feature_type,
            "geometry": null,
            "properties": {}
        })
    }

    fn collection(features: Vec<Value>) -> Value {
        json!({"type": "FeatureCollection", "features": features})
    }

    #[test]
    fn test_load_partitions_by_type() {
        let archive = load([
            ("unit", collection(vec![feature("U1", "unit"), feature("U2", "unit")])),
            ("level", collection(vec![feature("L1", "level")])),
        ])
        .unwrap();

        let resolver = archive.resolver();
        assert_eq!(resolver.count_by_type(FeatureType::Unit), 2);
        assert_eq!(resolver.count_by_type(FeatureType::Level), 1);
        assert_eq!(
            archive.collection_types(),
            vec![FeatureType::Level, FeatureType::Unit]
        );
        assert!(archive.load_report().is_empty());
    }

    #[test]
    fn test_bad_features_are_isolated() {
        let archive = load([(
            "unit",
            collection(vec![
                feature("U1", "unit"),
                feature("U1", "unit"),
                feature("L9", "level"),
                json!(42),
                feature("U2", "unit"),
            ]),
        )])
        .unwrap();

        let report = archive.load_report();
        assert_eq!(report.count(DiagnosticCode::DuplicateId), 1);
        assert_eq!(report.count(DiagnosticCode::TypeMismatch), 1);
        assert_eq!(report.count(DiagnosticCode::MalformedFeature), 1);
        assert_eq!(archive.resolver().count_by_type(FeatureType::Unit), 2);
        // Mismatched feature is not indexed under either type
        assert!(archive
            .resolver()
            .types_of(&FeatureId::from("L9"))
            .is_empty());
    }

    #[test]
    fn test_unknown_collection_is_fatal() {
        let err = load([("room", collection(vec![]))]).unwrap_err();
        assert!(matches!(err, ImdfError::UnknownFeatureType(ref name) if name == "room"));
    }

    #[test]
    fn test_duplicate_collection_is_fatal() {
        let err = load([("unit", collection(vec![])), ("unit", collection(vec![]))]).unwrap_err();
        assert!(matches!(err, ImdfError::InvalidCollection { .. }));
    }

    #[test]
    fn test_load_str() {
        let archive = ArchiveLoader::new()
            .load_str([(
                "level",
                r#"{"type":"FeatureCollection","features":[{"id":"L1","type":"Feature","feature_type":"level","geometry":null,"properties":{}}]}"#,
            )])
            .unwrap();
        assert_eq!(archive.resolver().feature_count(), 1);

        let err = ArchiveLoader::new().load_str([("level", "{not json")]).unwrap_err();
        assert!(matches!(err, ImdfError::Json(_)));
    }

    #[test]
    fn test_load_dir_with_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("manifest.json"),
            r#"{"version": "1.0.0", "language": "en-US", "generated_by": "survey"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("level.geojson"),
            collection(vec![feature("L1", "level")]).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let archive = load_dir(dir.path()).unwrap();
        assert_eq!(archive.resolver().count_by_type(FeatureType::Level), 1);
        let manifest = archive.manifest().unwrap();
        assert_eq!(manifest.version.as_deref(), Some("1.0.0"));
        assert_eq!(manifest.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_load_dir_object_generated_by() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("manifest.json"),
            r#"{"version":"1.0.0","created":"2024-05-01T12:00:00Z","generated_by":{"name":"Tool","version":"2.1"},"language":"en","extensions":null}"#,
        )
        .unwrap();
        fs::write(dir.path().join("level.geojson"), collection(vec![]).to_string()).unwrap();

        let archive = load_dir(dir.path()).unwrap();
        let manifest = archive.manifest().unwrap();
        assert_eq!(manifest.version.as_deref(), Some("1.0.0"));
        assert_eq!(manifest.generator(), Some("Tool"));
        assert!(archive.load_report().is_empty());
    }

    #[test]
    fn test_load_dir_undecodable_manifest_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("manifest.json"), "[1, 2").unwrap();
        fs::write(
            dir.path().join("level.geojson"),
            collection(vec![feature("L1", "level")]).to_string(),
        )
        .unwrap();

        let archive = load_dir(dir.path()).unwrap();
        assert!(archive.manifest().is_none());
        assert_eq!(archive.resolver().count_by_type(FeatureType::Level), 1);
    }

    #[test]
    fn test_load_dir_unknown_collection_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("room.geojson"), collection(vec![]).to_string()).unwrap();
        assert!(matches!(
            load_dir(dir.path()),
            Err(ImdfError::UnknownFeatureType(_))
        ));
    }
}
