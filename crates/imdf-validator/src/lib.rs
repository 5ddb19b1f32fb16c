// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IMDF Validator - Referential integrity and schema checks
//!
//! This crate validates a loaded IMDF archive against the feature schema
//! table and the controlled vocabularies, and resolves every identifier
//! reference between feature collections. It only depends on the traits
//! from `imdf-model`, so any [`FeatureArchive`] implementation can be
//! validated.
//!
//! # Check stages
//!
//! Per feature, in order:
//! 1. Geometry kind against the schema rule
//! 2. Required property presence
//! 3. Property values (types, categories, codes, display point)
//! 4. Reference fields, resolved by `(feature_type, id)`
//! 5. Label well-formedness
//!
//! # Example
//!
//! ```ignore
//! use imdf_validator::{validate_dir, ValidatorConfig};
//!
//! let report = validate_dir("venue.imdf")?;
//! if !report.passed() {
//!     eprintln!("{report}");
//! }
//! ```

pub mod checks;
pub mod config;
pub mod resolver;
pub mod validator;

pub use checks::{check_geometry, check_labels, check_presence, PropertyChecker};
pub use config::ValidatorConfig;
pub use resolver::{ReferenceOccurrence, ReferenceResolver};
pub use validator::Validator;

use imdf_model::{FeatureArchive, Report, Result};
use std::path::Path;

/// Validate an archive with the built-in vocabularies and default options
pub fn validate(archive: &dyn FeatureArchive) -> Result<Report> {
    Validator::new()?.validate(archive)
}

/// Load and validate an unpacked archive directory
pub fn validate_dir(path: impl AsRef<Path>) -> Result<Report> {
    let archive = imdf_loader::load_dir(path)?;
    validate(&archive)
}
