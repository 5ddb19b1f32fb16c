// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FeatureResolver trait implementation

use imdf_model::{Feature, FeatureId, FeatureResolver, FeatureType};
use rustc_hash::FxHashMap;

/// Global `(feature_type, id)` index
///
/// Built once by the loader and read-only afterwards.
#[derive(Debug, Default)]
pub struct FeatureIndex {
    /// Feature type -> features in collection order
    by_type: FxHashMap<FeatureType, Vec<Feature>>,
    /// (feature type, id) -> position in `by_type`
    positions: FxHashMap<(FeatureType, FeatureId), usize>,
    /// id -> every feature type holding it, sorted
    id_types: FxHashMap<FeatureId, Vec<FeatureType>>,
}

impl FeatureIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature unless its key is taken
    ///
    /// Returns `false` (and drops the feature) when the `(feature_type, id)`
    /// key already exists; the first occurrence wins.
    pub fn insert(&mut self, feature: Feature) -> bool {
        let key = (feature.feature_type, feature.id.clone());
        if self.positions.contains_key(&key) {
            return false;
        }

        let types = self.id_types.entry(feature.id.clone()).or_default();
        if let Err(at) = types.binary_search(&feature.feature_type) {
            types.insert(at, feature.feature_type);
        }

        let features = self.by_type.entry(feature.feature_type).or_default();
        self.positions.insert(key, features.len());
        features.push(feature);
        true
    }

    /// Check whether a key is taken
    pub fn contains(&self, feature_type: FeatureType, id: &FeatureId) -> bool {
        self.positions.contains_key(&(feature_type, id.clone()))
    }

    /// Iterate all features in feature type order, then collection order
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        FeatureType::ALL
            .into_iter()
            .flat_map(move |ft| self.features_by_type(ft).iter())
    }
}

impl FeatureResolver for FeatureIndex {
    fn get(&self, feature_type: FeatureType, id: &FeatureId) -> Option<&Feature> {
        let position = *self.positions.get(&(feature_type, id.clone()))?;
        self.by_type.get(&feature_type)?.get(position)
    }

    fn types_of(&self, id: &FeatureId) -> Vec<FeatureType> {
        self.id_types.get(id).cloned().unwrap_or_default()
    }

    fn features_by_type(&self, feature_type: FeatureType) -> &[Feature] {
        self.by_type
            .get(&feature_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn feature_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imdf_model::{FeatureResolverExt, Resolution};

    #[test]
    fn test_first_occurrence_wins() {
        let mut index = FeatureIndex::new();
        assert!(index.insert(Feature::new("U1", FeatureType::Unit).with_property("n", 1.into())));
        assert!(!index.insert(Feature::new("U1", FeatureType::Unit).with_property("n", 2.into())));

        let unit = index.get(FeatureType::Unit, &FeatureId::from("U1")).unwrap();
        assert_eq!(unit.get_integer("n"), Some(1));
        assert_eq!(index.count_by_type(FeatureType::Unit), 1);
    }

    #[test]
    fn test_same_id_under_two_types() {
        let mut index = FeatureIndex::new();
        index.insert(Feature::new("X", FeatureType::Unit));
        index.insert(Feature::new("X", FeatureType::Level));

        assert_eq!(
            index.types_of(&FeatureId::from("X")),
            vec![FeatureType::Level, FeatureType::Unit]
        );
        assert!(matches!(
            index.resolve(&FeatureId::from("X"), &[FeatureType::Level]),
            Resolution::Resolved(f) if f.feature_type == FeatureType::Level
        ));
        assert_eq!(index.feature_count(), 2);
    }

    #[test]
    fn test_iter_order() {
        let mut index = FeatureIndex::new();
        index.insert(Feature::new("U2", FeatureType::Unit));
        index.insert(Feature::new("L1", FeatureType::Level));
        index.insert(Feature::new("U1", FeatureType::Unit));

        let ids: Vec<_> = index.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "U2", "U1"]);
    }
}
