// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for loaded archives

use crate::{FeatureResolver, FeatureType, Manifest, Report};

/// Read-only access to a loaded IMDF archive
///
/// The archive is immutable once loaded, so it is `Send + Sync` and can be
/// shared by parallel validation workers.
pub trait FeatureArchive: Send + Sync {
    /// Get the `(feature_type, id)` index
    fn resolver(&self) -> &dyn FeatureResolver;

    /// Diagnostics recorded while loading (type mismatches, duplicates,
    /// malformed features)
    fn load_report(&self) -> &Report;

    /// Archive metadata, when the source carried a manifest
    fn manifest(&self) -> Option<&Manifest>;

    /// Feature types with a collection in the source, in declaration order
    fn collection_types(&self) -> Vec<FeatureType>;
}
