// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Localized labels (`name`, `alt_name`, `short_name`)
//!
//! A labels object maps IETF BCP 47 language tags to display strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Problems found in a labels object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelsError {
    #[error("labels must be an object")]
    NotAnObject,

    #[error("labels object has no entries")]
    Empty,

    #[error("{0:?} is not a well-formed language tag")]
    InvalidTag(String),

    #[error("label for {0:?} is not a string")]
    NonStringValue(String),

    #[error("label for {0:?} is blank")]
    BlankValue(String),
}

/// Language tag → display string
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Decode and check a labels value
    ///
    /// Every problem is collected rather than stopping at the first one.
    pub fn from_value(value: &Value) -> std::result::Result<Labels, Vec<LabelsError>> {
        let obj = value.as_object().ok_or_else(|| vec![LabelsError::NotAnObject])?;
        if obj.is_empty() {
            return Err(vec![LabelsError::Empty]);
        }

        let mut errors = Vec::new();
        let mut labels = BTreeMap::new();
        for (tag, text) in obj {
            if !is_language_tag(tag) {
                errors.push(LabelsError::InvalidTag(tag.clone()));
            }
            match text.as_str() {
                Some(s) if s.trim().is_empty() => errors.push(LabelsError::BlankValue(tag.clone())),
                Some(s) => {
                    labels.insert(tag.clone(), s.to_string());
                }
                None => errors.push(LabelsError::NonStringValue(tag.clone())),
            }
        }

        if errors.is_empty() {
            Ok(Labels(labels))
        } else {
            Err(errors)
        }
    }

    /// Get label for an exact language tag
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(|s| s.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Check IETF BCP 47 language tag syntax
///
/// Covers language, extlang, script, region, variant, extension and
/// private-use subtags. Registry membership of subtags is not checked.
pub fn is_language_tag(tag: &str) -> bool {
    let subtags: Vec<&str> = tag.split('-').collect();
    if subtags.iter().any(|s| s.is_empty() || s.len() > 8) {
        return false;
    }
    if !subtags.iter().all(|s| s.chars().all(|c| c.is_ascii_alphanumeric())) {
        return false;
    }

    let mut rest = subtags.as_slice();

    // Tag made only of private use
    if rest[0].eq_ignore_ascii_case("x") {
        return private_use(&rest[1..]);
    }

    // language
    let lang = rest[0];
    if !is_alpha(lang) || !(2..=8).contains(&lang.len()) {
        return false;
    }
    rest = &rest[1..];

    // extlang (only after a 2-3 letter language)
    if lang.len() <= 3 {
        let mut extlangs = 0;
        while let Some(s) = rest.first() {
            if extlangs < 3 && s.len() == 3 && is_alpha(s) {
                extlangs += 1;
                rest = &rest[1..];
            } else {
                break;
            }
        }
    }

    // script
    if let Some(s) = rest.first() {
        if s.len() == 4 && is_alpha(s) {
            rest = &rest[1..];
        }
    }

    // region
    if let Some(s) = rest.first() {
        if (s.len() == 2 && is_alpha(s)) || (s.len() == 3 && is_digit(s)) {
            rest = &rest[1..];
        }
    }

    // variants, each at most once
    let mut variants: Vec<&str> = Vec::new();
    while let Some(s) = rest.first() {
        let variant = (5..=8).contains(&s.len())
            || (s.len() == 4 && s.as_bytes()[0].is_ascii_digit());
        if variant {
            if variants.iter().any(|v| v.eq_ignore_ascii_case(s)) {
                return false;
            }
            variants.push(s);
            rest = &rest[1..];
        } else {
            break;
        }
    }

    // extensions, one per singleton
    let mut singletons: Vec<&str> = Vec::new();
    while let Some(s) = rest.first() {
        if s.len() != 1 || s.eq_ignore_ascii_case("x") {
            break;
        }
        if singletons.iter().any(|x| x.eq_ignore_ascii_case(s)) {
            return false;
        }
        singletons.push(s);
        let mut body = 0;
        rest = &rest[1..];
        while let Some(part) = rest.first() {
            if part.len() >= 2 {
                body += 1;
                rest = &rest[1..];
            } else {
                break;
            }
        }
        if body == 0 {
            return false;
        }
    }

    match rest.split_first() {
        None => true,
        Some((x, tail)) if x.eq_ignore_ascii_case("x") => private_use(tail),
        Some(_) => false,
    }
}

fn private_use(subtags: &[&str]) -> bool {
    !subtags.is_empty()
}

fn is_alpha(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_digit(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_tags() {
        for tag in [
            "en",
            "en-US",
            "zh-Hant-TW",
            "es-419",
            "sl-rozaj-biske",
            "de-CH-1996",
            "en-a-bbb-x-private",
            "x-whatever",
            "zh-yue-HK",
            "EN-gb",
        ] {
            assert!(is_language_tag(tag), "{tag} should be well formed");
        }
    }

    #[test]
    fn test_malformed_tags() {
        for tag in ["", "e", "en_US", "en-", "-en", "123", "en-a", "en-x", "toolongtag1", "en-US-a-"] {
            assert!(!is_language_tag(tag), "{tag} should be rejected");
        }
    }

    #[test]
    fn test_repeated_variants_and_singletons_rejected() {
        assert!(is_language_tag("de-1996-1901"));
        assert!(is_language_tag("en-a-aaa-b-bbb"));
        for tag in ["de-1996-1996", "sl-rozaj-ROZAJ", "en-a-aaa-a-bbb", "en-a-aaa-A-bbb"] {
            assert!(!is_language_tag(tag), "{tag} should be rejected");
        }
    }

    #[test]
    fn test_labels_ok() {
        let labels = Labels::from_value(&json!({"en": "Main Hall", "fr": "Grand hall"})).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("fr"), Some("Grand hall"));
    }

    #[test]
    fn test_labels_collects_every_problem() {
        let errors = Labels::from_value(&json!({"en_US": "Hall", "fr": 3, "de": "  "})).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&LabelsError::InvalidTag("en_US".to_string())));
        assert!(errors.contains(&LabelsError::NonStringValue("fr".to_string())));
        assert!(errors.contains(&LabelsError::BlankValue("de".to_string())));
    }

    #[test]
    fn test_labels_shape() {
        assert_eq!(Labels::from_value(&json!({})).unwrap_err(), vec![LabelsError::Empty]);
        assert_eq!(
            Labels::from_value(&json!("Hall")).unwrap_err(),
            vec![LabelsError::NotAnObject]
        );
    }
}
