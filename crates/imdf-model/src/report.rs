// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation report model
//!
//! A [`Report`] is an ordered list of [`Diagnostic`]s plus a verdict. The
//! verdict passes iff no error-severity diagnostic exists.

use crate::{FeatureId, FeatureType, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Diagnostic severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Pipeline stage that produced a diagnostic
///
/// Declaration order is the per-feature execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Geometry,
    Presence,
    Properties,
    References,
    Labels,
}

/// Diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Declared `feature_type` disagrees with the containing collection
    TypeMismatch,
    /// Id repeated within one feature type's namespace
    DuplicateId,
    /// Feature is not an object or lacks a string id
    MalformedFeature,
    /// Geometry object could not be decoded
    MalformedGeometry,
    /// Geometry presence or shape disagrees with the schema
    GeometryKindMismatch,
    MissingRequiredProperty,
    /// Value of the wrong type or shape
    InvalidPropertyValue,
    InvalidCategoryValue,
    UnexpectedProperty,
    /// Referenced id not found anywhere in the archive
    DanglingReference,
    /// Referenced id exists, but only under other feature types
    ReferenceTypeMismatch,
    MalformedLabels,
    DisplayPointOutOfBounds,
}

impl DiagnosticCode {
    /// Get the code name as reported
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticCode::TypeMismatch => "TypeMismatch",
            DiagnosticCode::DuplicateId => "DuplicateId",
            DiagnosticCode::MalformedFeature => "MalformedFeature",
            DiagnosticCode::MalformedGeometry => "MalformedGeometry",
            DiagnosticCode::GeometryKindMismatch => "GeometryKindMismatch",
            DiagnosticCode::MissingRequiredProperty => "MissingRequiredProperty",
            DiagnosticCode::InvalidPropertyValue => "InvalidPropertyValue",
            DiagnosticCode::InvalidCategoryValue => "InvalidCategoryValue",
            DiagnosticCode::UnexpectedProperty => "UnexpectedProperty",
            DiagnosticCode::DanglingReference => "DanglingReference",
            DiagnosticCode::ReferenceTypeMismatch => "ReferenceTypeMismatch",
            DiagnosticCode::MalformedLabels => "MalformedLabels",
            DiagnosticCode::DisplayPointOutOfBounds => "DisplayPointOutOfBounds",
        }
    }

    /// Severity a diagnostic with this code carries by default
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::UnexpectedProperty | DiagnosticCode::DisplayPointOutOfBounds => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    /// Stage that normally emits this code
    pub fn default_stage(&self) -> Stage {
        match self {
            DiagnosticCode::TypeMismatch
            | DiagnosticCode::DuplicateId
            | DiagnosticCode::MalformedFeature => Stage::Load,
            DiagnosticCode::MalformedGeometry | DiagnosticCode::GeometryKindMismatch => {
                Stage::Geometry
            }
            DiagnosticCode::MissingRequiredProperty => Stage::Presence,
            DiagnosticCode::InvalidPropertyValue
            | DiagnosticCode::InvalidCategoryValue
            | DiagnosticCode::UnexpectedProperty
            | DiagnosticCode::DisplayPointOutOfBounds => Stage::Properties,
            DiagnosticCode::DanglingReference | DiagnosticCode::ReferenceTypeMismatch => {
                Stage::References
            }
            DiagnosticCode::MalformedLabels => Stage::Labels,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One reported anomaly
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    #[serde(skip_serializing, default = "default_stage")]
    pub stage: Stage,
    pub feature_type: FeatureType,
    /// `None` for a feature without a usable id
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub feature_id: Option<FeatureId>,
    /// Property name, dotted for nested members (`door.type`)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field: Option<String>,
    /// Array position within `field`, or within the collection for features without an id
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index: Option<usize>,
    pub message: String,
}

fn default_stage() -> Stage {
    Stage::Load
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity and stage
    pub fn new(
        code: DiagnosticCode,
        feature_type: FeatureType,
        feature_id: Option<FeatureId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            stage: code.default_stage(),
            feature_type,
            feature_id,
            field: None,
            index: None,
            message: message.into(),
        }
    }

    /// Create a diagnostic about an identified feature
    pub fn for_feature(
        code: DiagnosticCode,
        feature_type: FeatureType,
        feature_id: &FeatureId,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, feature_type, Some(feature_id.clone()), message)
    }

    /// Set field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set array index
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the emitting stage
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Total order used for report output
    ///
    /// Feature type, feature id, stage, field, index; code and message break
    /// the remaining ties so equal inputs always render identically.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.feature_type
            .cmp(&other.feature_type)
            .then_with(|| self.feature_id.cmp(&other.feature_id))
            .then_with(|| self.stage.cmp(&other.stage))
            .then_with(|| self.field.cmp(&other.field))
            .then_with(|| self.index.cmp(&other.index))
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.code, self.feature_type)?;
        match &self.feature_id {
            Some(id) => write!(f, " {id}")?,
            None => f.write_str(" <no id>")?,
        }
        if let Some(field) = &self.field {
            write!(f, " {field}")?;
            if let Some(index) = self.index {
                write!(f, "[{index}]")?;
            }
        } else if let Some(index) = self.index {
            write!(f, " #{index}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Validation output
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    passed: bool,
    error_count: usize,
    warning_count: usize,
    diagnostics: &'a [Diagnostic],
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a report from diagnostics, in report order
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let mut report = Self { diagnostics };
        report.sort();
        report
    }

    /// Add a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Append another report's diagnostics
    pub fn merge(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Restore report order
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| a.report_order(b));
    }

    /// All diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Overall verdict
    pub fn passed(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Error-severity diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Warning-severity diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Diagnostics about one feature
    pub fn for_feature<'a>(
        &'a self,
        feature_type: FeatureType,
        id: &'a FeatureId,
    ) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.feature_type == feature_type && d.feature_id.as_ref() == Some(id))
    }

    /// Number of diagnostics per code
    pub fn count_by_code(&self) -> BTreeMap<DiagnosticCode, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.diagnostics {
            *counts.entry(d.code).or_insert(0) += 1;
        }
        counts
    }

    /// Number of diagnostics with a given code
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        let doc = ReportDocument {
            passed: self.passed(),
            error_count: self.errors().count(),
            warning_count: self.warnings().count(),
            diagnostics: &self.diagnostics,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.diagnostics {
            writeln!(f, "{d}")?;
        }
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        write!(
            f,
            "{verdict}: {} error(s), {} warning(s)",
            self.errors().count(),
            self.warnings().count()
        )
    }
}

impl Extend<Diagnostic> for Report {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.diagnostics.extend(iter);
    }
}

impl IntoIterator for Report {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(code: DiagnosticCode, ft: FeatureType, id: &str) -> Diagnostic {
        Diagnostic::for_feature(code, ft, &FeatureId::from(id), "test")
    }

    #[test]
    fn test_defaults_from_code() {
        let d = diag(DiagnosticCode::DanglingReference, FeatureType::Unit, "U1");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.stage, Stage::References);

        let d = diag(DiagnosticCode::DisplayPointOutOfBounds, FeatureType::Unit, "U1");
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut report = Report::new();
        assert!(report.passed());
        report.push(diag(DiagnosticCode::UnexpectedProperty, FeatureType::Unit, "U1"));
        assert!(report.passed());
        report.push(diag(DiagnosticCode::MissingRequiredProperty, FeatureType::Unit, "U1"));
        assert!(!report.passed());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_report_order() {
        let report = Report::from_diagnostics(vec![
            diag(DiagnosticCode::DanglingReference, FeatureType::Unit, "U1").with_field("level_id"),
            diag(DiagnosticCode::GeometryKindMismatch, FeatureType::Unit, "U1"),
            diag(DiagnosticCode::DanglingReference, FeatureType::Footprint, "F1")
                .with_field("building_ids")
                .with_index(1),
            diag(DiagnosticCode::DanglingReference, FeatureType::Footprint, "F1")
                .with_field("building_ids")
                .with_index(0),
            diag(DiagnosticCode::DuplicateId, FeatureType::Unit, "U0"),
        ]);

        let keys: Vec<_> = report
            .diagnostics()
            .iter()
            .map(|d| (d.feature_type, d.feature_id.clone(), d.code, d.index))
            .collect();
        assert_eq!(
            keys,
            vec![
                (FeatureType::Footprint, Some(FeatureId::from("F1")), DiagnosticCode::DanglingReference, Some(0)),
                (FeatureType::Footprint, Some(FeatureId::from("F1")), DiagnosticCode::DanglingReference, Some(1)),
                (FeatureType::Unit, Some(FeatureId::from("U0")), DiagnosticCode::DuplicateId, None),
                (FeatureType::Unit, Some(FeatureId::from("U1")), DiagnosticCode::GeometryKindMismatch, None),
                (FeatureType::Unit, Some(FeatureId::from("U1")), DiagnosticCode::DanglingReference, None),
            ]
        );
    }

    #[test]
    fn test_count_by_code_and_merge() {
        let mut a = Report::new();
        a.push(diag(DiagnosticCode::DanglingReference, FeatureType::Unit, "U1"));
        let mut b = Report::new();
        b.push(diag(DiagnosticCode::DanglingReference, FeatureType::Unit, "U2"));
        b.push(diag(DiagnosticCode::DuplicateId, FeatureType::Level, "L1"));
        a.merge(b);

        let counts = a.count_by_code();
        assert_eq!(counts[&DiagnosticCode::DanglingReference], 2);
        assert_eq!(counts[&DiagnosticCode::DuplicateId], 1);
        assert_eq!(a.count(DiagnosticCode::TypeMismatch), 0);
    }

    #[test]
    fn test_to_json() {
        let mut report = Report::new();
        report.push(
            diag(DiagnosticCode::InvalidCategoryValue, FeatureType::Unit, "U1")
                .with_field("restriction"),
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["passed"], false);
        assert_eq!(json["error_count"], 1);
        let d = &json["diagnostics"][0];
        assert_eq!(d["severity"], "error");
        assert_eq!(d["code"], "InvalidCategoryValue");
        assert_eq!(d["feature_type"], "unit");
        assert_eq!(d["feature_id"], "U1");
        assert_eq!(d["field"], "restriction");
        assert!(d.get("index").is_none());
        assert!(d.get("stage").is_none());
    }

    #[test]
    fn test_display() {
        let mut report = Report::new();
        report.push(
            diag(DiagnosticCode::DanglingReference, FeatureType::Footprint, "F1")
                .with_field("building_ids")
                .with_index(2),
        );
        let text = report.to_string();
        assert!(text.starts_with("error [DanglingReference] footprint F1 building_ids[2]: test"));
        assert!(text.ends_with("FAIL: 1 error(s), 0 warning(s)"));
    }
}
