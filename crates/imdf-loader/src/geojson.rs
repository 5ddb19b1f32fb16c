// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoJSON envelope decoding
//!
//! Splits a FeatureCollection into decoded [`Feature`]s. A bad collection
//! envelope is fatal; a bad feature is isolated as a [`Decoded`] outcome so
//! the caller can record it and continue.

use imdf_model::{Feature, FeatureGeometry, FeatureId, FeatureType, ImdfError, Result};
use serde_json::{Map, Value};

/// Legacy camelCase property keys and their canonical names
const KIOSK_ALIASES: &[(&str, &str)] = &[("anchorId", "anchor_id"), ("levelId", "level_id")];

/// Outcome of decoding one feature object
#[derive(Debug)]
pub enum Decoded {
    /// Well-formed feature of the collection's type
    Accepted(Feature),
    /// Declared `feature_type` missing or different from the collection's
    Mismatch {
        id: FeatureId,
        declared: Option<String>,
    },
    /// Not a usable GeoJSON feature
    Malformed {
        id: Option<FeatureId>,
        reason: String,
    },
}

/// Get the `features` array of a FeatureCollection document
pub fn collection_features(feature_type: FeatureType, doc: &Value) -> Result<&[Value]> {
    let obj = doc
        .as_object()
        .ok_or_else(|| ImdfError::collection(feature_type, "document is not a JSON object"))?;

    match obj.get("type").and_then(|t| t.as_str()) {
        Some("FeatureCollection") => {}
        Some(other) => {
            return Err(ImdfError::collection(
                feature_type,
                format!("expected type \"FeatureCollection\", found {other:?}"),
            ))
        }
        None => return Err(ImdfError::collection(feature_type, "missing \"type\" member")),
    }

    obj.get("features")
        .and_then(|f| f.as_array())
        .map(|f| f.as_slice())
        .ok_or_else(|| ImdfError::collection(feature_type, "missing \"features\" array"))
}

/// Decode one member of a collection's `features` array
///
/// `properties_fallback` accepts `properties.feature_type` when the top-level
/// `feature_type` member is absent.
pub fn decode_feature(
    collection: FeatureType,
    value: &Value,
    properties_fallback: bool,
) -> Decoded {
    let Some(obj) = value.as_object() else {
        return malformed(None, "feature is not a JSON object");
    };

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => FeatureId::new(s.as_str()),
        Some(Value::String(_)) => return malformed(None, "feature id is empty"),
        Some(other) => {
            return malformed(None, format!("feature id must be a string, found {}", json_kind(other)))
        }
        None => return malformed(None, "feature has no id"),
    };

    if obj.get("type").and_then(|t| t.as_str()) != Some("Feature") {
        return malformed(Some(id), "GeoJSON type must be \"Feature\"");
    }

    let mut properties = match obj.get("properties") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return malformed(
                Some(id),
                format!("properties must be an object, found {}", json_kind(other)),
            )
        }
    };

    let declared = obj
        .get("feature_type")
        .or_else(|| {
            properties_fallback
                .then(|| properties.get("feature_type"))
                .flatten()
        })
        .and_then(|v| v.as_str());

    if declared != Some(collection.name()) {
        return Decoded::Mismatch {
            id,
            declared: declared.map(str::to_string),
        };
    }

    if collection == FeatureType::Kiosk {
        normalize_aliases(&mut properties, KIOSK_ALIASES);
    }
    // Mirrored type tag is envelope data, not a schema property
    properties.remove("feature_type");

    Decoded::Accepted(Feature {
        id,
        feature_type: collection,
        geometry: FeatureGeometry::from_value(obj.get("geometry")),
        properties,
    })
}

/// Rename legacy keys unless the canonical key is already present
fn normalize_aliases(properties: &mut Map<String, Value>, aliases: &[(&str, &str)]) {
    for (legacy, canonical) in aliases {
        if properties.contains_key(*canonical) {
            continue;
        }
        if let Some(value) = properties.remove(*legacy) {
            properties.insert((*canonical).to_string(), value);
        }
    }
}

fn malformed(id: Option<FeatureId>, reason: impl Into<String>) -> Decoded {
    Decoded::Malformed {
        id,
        reason: reason.into(),
    }
}

/// JSON type name for messages
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
