// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for configuration-level failures
//!
//! Anomalies in the archive itself are never errors: they become
//! [`Diagnostic`](crate::Diagnostic)s. The variants below abort a run.

use crate::{CategoryKind, FeatureType};
use thiserror::Error;

/// Result type alias for loader and validator operations
pub type Result<T> = std::result::Result<T, ImdfError>;

/// Errors that abort loading or validation
#[derive(Error, Debug)]
pub enum ImdfError {
    /// Collection keyed by a name that is not an IMDF feature type
    #[error("Unknown feature type: {0}")]
    UnknownFeatureType(String),

    /// Vocabulary registry has no table for the requested category
    #[error("Vocabulary registry has no table for category {0}")]
    UndefinedCategory(CategoryKind),

    /// Collection document is not a GeoJSON FeatureCollection
    #[error("Invalid {feature_type} collection: {message}")]
    InvalidCollection {
        feature_type: FeatureType,
        message: String,
    },

    /// Vocabulary feed could not be interpreted
    #[error("Invalid vocabulary feed: {0}")]
    InvalidVocabulary(String),

    /// JSON syntax error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ImdfError {
    /// Create an invalid collection error
    pub fn collection(feature_type: FeatureType, msg: impl Into<String>) -> Self {
        ImdfError::InvalidCollection {
            feature_type,
            message: msg.into(),
        }
    }

    /// Create an invalid vocabulary error
    pub fn vocabulary(msg: impl Into<String>) -> Self {
        ImdfError::InvalidVocabulary(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ImdfError::Other(msg.into())
    }
}
