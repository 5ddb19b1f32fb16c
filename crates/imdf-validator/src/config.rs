// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validator configuration

use imdf_model::Result;
use serde::{Deserialize, Serialize};

/// Validation options
///
/// Every member has a default, so a partial JSON document is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Validate feature collections concurrently
    pub parallel: bool,
    /// Warn when a `display_point` falls outside its feature's geometry
    pub check_display_point_containment: bool,
    /// Warn about property keys the schema does not declare
    pub report_unexpected_properties: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            check_display_point_containment: true,
            report_unexpected_properties: true,
        }
    }
}

impl ValidatorConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set whether collections are validated concurrently
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Set whether display point containment is checked
    pub fn with_display_point_containment(mut self, enabled: bool) -> Self {
        self.check_display_point_containment = enabled;
        self
    }

    /// Set whether undeclared properties are reported
    pub fn with_unexpected_properties(mut self, enabled: bool) -> Self {
        self.report_unexpected_properties = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ValidatorConfig::from_json(r#"{"parallel": false}"#).unwrap();
        assert!(!config.parallel);
        assert!(config.check_display_point_containment);
        assert!(config.report_unexpected_properties);
    }

    #[test]
    fn test_builder() {
        let config = ValidatorConfig::new()
            .with_parallel(false)
            .with_unexpected_properties(false);
        assert_eq!(
            config,
            ValidatorConfig {
                parallel: false,
                check_display_point_containment: true,
                report_unexpected_properties: false,
            }
        );
    }
}
