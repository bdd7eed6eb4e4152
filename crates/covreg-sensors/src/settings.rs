//! Multi-valued property settings read by sensors.
//!
//! Mirrors the host platform's configuration source: every property is a
//! string, and multi-valued properties are comma-separated.
//!
//! Settings files are TOML with a single `[properties]` table whose values
//! are strings or arrays of strings:
//!
//! ```toml
//! [properties]
//! "sonar.vbnet.opencover.reportsPaths" = "a.xml,b.xml"
//! "sonar.vbnet.analyzer.projectOutPaths" = ["App/obj", "Lib/obj"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use covreg_core::{split_path_list, CovregError, Result};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PropertyValue {
    One(String),
    Many(Vec<String>),
}

impl PropertyValue {
    fn into_raw(self) -> String {
        match self {
            PropertyValue::One(value) => value,
            PropertyValue::Many(values) => values.join(","),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
}

/// Immutable property map for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    properties: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(input)?;
        let mut properties = BTreeMap::new();
        for (key, value) in file.properties {
            if key.trim().is_empty() {
                return Err(CovregError::Config("property key must not be empty".to_string()));
            }
            properties.insert(key, value.into_raw());
        }
        Ok(Self { properties })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&input)?;
        debug!(
            path = %path.display(),
            properties = settings.properties.len(),
            "loaded settings"
        );
        Ok(settings)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Comma-separated entries of `key`; empty when unset or blank.
    pub fn get_string_array(&self, key: &str) -> Vec<String> {
        self.get(key).map(split_path_list).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_array_splits_commas() {
        let settings = Settings::new().with("k", "a.xml, b.xml,,c.xml ");
        assert_eq!(settings.get_string_array("k"), vec!["a.xml", "b.xml", "c.xml"]);
    }

    #[test]
    fn test_missing_key_is_empty_array() {
        let settings = Settings::new();
        assert!(settings.get_string_array("absent").is_empty());
        assert!(!settings.has_key("absent"));
    }

    #[test]
    fn test_toml_accepts_strings_and_arrays() {
        let settings = Settings::from_toml_str(
            r#"
            [properties]
            "sonar.vbnet.opencover.reportsPaths" = "a.xml,b.xml"
            "sonar.vbnet.analyzer.projectOutPaths" = ["App/obj", "Lib/obj"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(
            settings.get_string_array("sonar.vbnet.analyzer.projectOutPaths"),
            vec!["App/obj", "Lib/obj"]
        );
        assert_eq!(
            settings.get("sonar.vbnet.opencover.reportsPaths"),
            Some("a.xml,b.xml")
        );
    }

    #[test]
    fn test_toml_rejects_unknown_tables() {
        let err = Settings::from_toml_str("[other]\nx = 1\n").unwrap_err();
        assert!(matches!(err, CovregError::Toml(_)));
    }

    #[test]
    fn test_toml_rejects_non_string_values() {
        let err = Settings::from_toml_str("[properties]\n\"k\" = 3\n").unwrap_err();
        assert!(matches!(err, CovregError::Toml(_)));
    }

    #[test]
    fn test_empty_document_is_empty_settings() {
        assert!(Settings::from_toml_str("").unwrap().is_empty());
    }
}
