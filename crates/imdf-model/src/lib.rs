// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IMDF Model - Feature types, schema table and vocabularies for IMDF archives
//!
//! This crate provides the core abstractions for working with IMDF (Indoor Mapping
//! Data Format) archives. An archive is a set of GeoJSON feature collections, one per
//! feature type, whose features cross-reference one another by identifier.
//!
//! # Architecture
//!
//! - [`Feature`] / [`FeatureType`] - the universal record and its 16 variants
//! - [`schema_for`] - static per-variant structural rules (geometry, properties, references)
//! - [`VocabularyRegistry`] - closed token sets for every category field
//! - [`FeatureResolver`] - `(feature_type, id)` lookup over a loaded archive
//! - [`FeatureArchive`] - read-only access to a loaded archive
//! - [`Report`] / [`Diagnostic`] - the validation output contract
//! - [`SpatialPredicate`] - containment checks, delegated to a geometry collaborator
//!
//! # Example
//!
//! ```ignore
//! use imdf_model::{schema_for, FeatureType, VocabularyRegistry, CategoryKind, CategoryToken};
//!
//! let schema = schema_for(FeatureType::Unit);
//! assert!(schema.property("level_id").is_some());
//!
//! let registry = VocabularyRegistry::builtin()?;
//! assert!(registry.is_valid(CategoryKind::Unit, &CategoryToken::Text("room"))?);
//! ```

pub mod error;
pub mod geometry;
pub mod labels;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod traits;
pub mod types;
pub mod vocabulary;

// Re-export all public types
pub use error::*;
pub use geometry::*;
pub use labels::*;
pub use report::*;
pub use resolver::*;
pub use schema::*;
pub use traits::*;
pub use types::*;
pub use vocabulary::*;
