// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature lookup keyed on `(feature_type, id)`

use crate::{Feature, FeatureId, FeatureType};

/// Feature lookup over a loaded archive
///
/// Lookups always pair an id with a feature type: the same id may legitimately
/// name features of different types. Implementations should provide O(1)
/// lookup by key.
///
/// # Example
///
/// ```ignore
/// use imdf_model::{FeatureResolver, FeatureResolverExt, FeatureType, FeatureId};
///
/// fn level_of(resolver: &dyn FeatureResolver, unit_id: &FeatureId) -> Option<FeatureId> {
///     let unit = resolver.get(FeatureType::Unit, unit_id)?;
///     let level_id = unit.get_ref("level_id")?;
///     resolver.exists(FeatureType::Level, &level_id).then_some(level_id)
/// }
/// ```
pub trait FeatureResolver: Send + Sync {
    /// Get feature by type and id
    fn get(&self, feature_type: FeatureType, id: &FeatureId) -> Option<&Feature>;

    /// Get every feature type under which this id exists, in declaration order
    fn types_of(&self, id: &FeatureId) -> Vec<FeatureType>;

    /// Get all features of a type, in collection order
    fn features_by_type(&self, feature_type: FeatureType) -> &[Feature];

    /// Count features of a type
    fn count_by_type(&self, feature_type: FeatureType) -> usize {
        self.features_by_type(feature_type).len()
    }

    /// Get total feature count
    fn feature_count(&self) -> usize {
        FeatureType::ALL
            .iter()
            .map(|ft| self.count_by_type(*ft))
            .sum()
    }
}

/// Outcome of resolving one reference occurrence
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<'a> {
    /// Found under an accepted target type
    Resolved(&'a Feature),
    /// Found, but only under these other types
    WrongType(Vec<FeatureType>),
    /// Not found under any type
    Missing,
}

/// Extension methods for FeatureResolver
pub trait FeatureResolverExt: FeatureResolver {
    /// Check if a feature exists
    fn exists(&self, feature_type: FeatureType, id: &FeatureId) -> bool {
        self.get(feature_type, id).is_some()
    }

    /// Resolve an id against a set of accepted target types
    ///
    /// The first accepted type holding the id wins.
    fn resolve(&self, id: &FeatureId, targets: &[FeatureType]) -> Resolution<'_> {
        if let Some(feature) = targets.iter().find_map(|ft| self.get(*ft, id)) {
            return Resolution::Resolved(feature);
        }
        let found = self.types_of(id);
        if found.is_empty() {
            Resolution::Missing
        } else {
            Resolution::WrongType(found)
        }
    }
}

// Blanket implementation for all FeatureResolver types
impl<T: FeatureResolver + ?Sized> FeatureResolverExt for T {}
