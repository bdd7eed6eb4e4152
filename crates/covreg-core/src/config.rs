//! Language configuration table.
//!
//! Maps a language key and [`TestScope`] to the property keys under which
//! coverage report paths are configured. The table is built once at startup
//! (from the built-in languages or a TOML file) and is read-only afterwards;
//! share it behind an `Arc`.
//!
//! Keys follow `sonar.<language>.<tool>[.it].reportsPaths`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CovregError, Result};
use crate::kind::{CoverageTool, TestScope};

const KEY_PREFIX: &str = "sonar";

/// The four coverage property keys for one (language, scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageKeys {
    pub ncover3: String,
    pub opencover: String,
    pub dotcover: String,
    pub vs_xml: String,
}

impl CoverageKeys {
    fn derive(language: &str, scope: TestScope) -> Self {
        let key = |tool: CoverageTool| {
            format!(
                "{KEY_PREFIX}.{language}.{}{}.reportsPaths",
                tool.slug(),
                scope.key_infix()
            )
        };
        Self {
            ncover3: key(CoverageTool::NCover3),
            opencover: key(CoverageTool::OpenCover),
            dotcover: key(CoverageTool::DotCover),
            vs_xml: key(CoverageTool::VisualStudioXml),
        }
    }

    pub fn get(&self, tool: CoverageTool) -> &str {
        match tool {
            CoverageTool::NCover3 => &self.ncover3,
            CoverageTool::OpenCover => &self.opencover,
            CoverageTool::DotCover => &self.dotcover,
            CoverageTool::VisualStudioXml => &self.vs_xml,
        }
    }

    /// `(tool, key)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (CoverageTool, &str)> + '_ {
        CoverageTool::ALL.into_iter().map(move |tool| (tool, self.get(tool)))
    }
}

/// Binds a language to its coverage keys for one test scope.
///
/// Immutable once constructed. Only [`CoverageConfiguration::new`] builds
/// one, so the keys always match the language and scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageConfiguration {
    language: String,
    scope: TestScope,
    keys: CoverageKeys,
}

impl CoverageConfiguration {
    pub fn new(language: &str, scope: TestScope) -> Self {
        Self {
            language: language.to_string(),
            scope,
            keys: CoverageKeys::derive(language, scope),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn scope(&self) -> TestScope {
        self.scope
    }

    pub fn keys(&self) -> &CoverageKeys {
        &self.keys
    }

    pub fn key(&self, tool: CoverageTool) -> &str {
        self.keys.get(tool)
    }
}

/// Plugin metadata for a registered language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Short key used in property names (`vbnet`).
    pub key: String,
    /// Display name used in sensor names (`VB.NET`).
    pub name: String,
}

impl LanguageInfo {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    /// Property listing analyzer project output directories.
    pub fn project_out_paths_key(&self) -> String {
        format!("{KEY_PREFIX}.{}.analyzer.projectOutPaths", self.key)
    }

    /// Property listing Roslyn JSON report files.
    pub fn roslyn_report_paths_key(&self) -> String {
        format!("{KEY_PREFIX}.{}.roslyn.reportFilePaths", self.key)
    }

    /// Directory name the analyzer writes protobuf output into.
    pub fn analyzer_output_dir(&self) -> String {
        format!("output-{}", self.key)
    }
}

#[derive(Debug, Clone)]
struct LanguageEntry {
    info: LanguageInfo,
    unit: CoverageConfiguration,
    integration: CoverageConfiguration,
}

/// On-disk shape of a languages table.
///
/// ```toml
/// [[language]]
/// key = "vbnet"
/// name = "VB.NET"
/// ```
#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default, rename = "language")]
    languages: Vec<LanguageInfo>,
}

/// Registry of languages and their per-scope coverage configurations.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationTable {
    languages: BTreeMap<String, LanguageEntry>,
}

impl ConfigurationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the languages shipped by default (`vbnet`, `cs`).
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(LanguageInfo::new("vbnet", "VB.NET"));
        table.insert(LanguageInfo::new("cs", "C#"));
        table
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: TableFile = toml::from_str(input)?;
        if file.languages.is_empty() {
            return Err(CovregError::Config(
                "languages table declares no [[language]] entries".to_string(),
            ));
        }
        let mut table = Self::new();
        for info in file.languages {
            table.register(info)?;
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading languages table");
        Self::from_toml_str(&input)
    }

    /// Register a language, deriving both scopes' keys.
    pub fn register(&mut self, info: LanguageInfo) -> Result<()> {
        validate_language_key(&info.key)?;
        if info.name.trim().is_empty() {
            return Err(CovregError::Config(format!(
                "language '{}' has an empty display name",
                info.key
            )));
        }
        if self.languages.contains_key(&info.key) {
            return Err(CovregError::Config(format!(
                "language '{}' registered twice",
                info.key
            )));
        }
        self.insert(info);
        Ok(())
    }

    fn insert(&mut self, info: LanguageInfo) {
        let entry = LanguageEntry {
            unit: CoverageConfiguration::new(&info.key, TestScope::Unit),
            integration: CoverageConfiguration::new(&info.key, TestScope::Integration),
            info,
        };
        self.languages.insert(entry.info.key.clone(), entry);
    }

    pub fn resolve_keys(&self, language: &str, scope: TestScope) -> Result<&CoverageKeys> {
        self.configuration(language, scope).map(CoverageConfiguration::keys)
    }

    pub fn configuration(&self, language: &str, scope: TestScope) -> Result<&CoverageConfiguration> {
        let entry = self.entry(language)?;
        Ok(match scope {
            TestScope::Unit => &entry.unit,
            TestScope::Integration => &entry.integration,
        })
    }

    pub fn language(&self, language: &str) -> Result<&LanguageInfo> {
        self.entry(language).map(|entry| &entry.info)
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageInfo> {
        self.languages.values().map(|entry| &entry.info)
    }

    pub fn contains(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    fn entry(&self, language: &str) -> Result<&LanguageEntry> {
        self.languages
            .get(language)
            .ok_or_else(|| CovregError::UnknownLanguage(language.to_string()))
    }
}

fn validate_language_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(CovregError::Config(format!(
            "invalid language key '{key}': expected lowercase ascii letters or digits"
        )))
    }
}
