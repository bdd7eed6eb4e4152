//! Sensor contract.
//!
//! A sensor reads one module's settings and contributes report paths to the
//! run's [`ReportPathCollector`] for its language.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use covreg_core::{CovregError, ModuleKey, ReportPathCollector, Result};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Static description of a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub name: String,
    /// Language the sensor is restricted to, if any.
    pub only_on_language: Option<String>,
}

impl SensorDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            only_on_language: None,
        }
    }

    pub fn only_on_language(mut self, language: impl Into<String>) -> Self {
        self.only_on_language = Some(language.into());
        self
    }

    /// Whether the sensor should run on a module with these languages.
    pub fn applies_to(&self, languages: &BTreeSet<String>) -> bool {
        match &self.only_on_language {
            Some(language) => languages.contains(language),
            None => true,
        }
    }
}

/// One module of the analysed project.
#[derive(Debug, Clone)]
pub struct Module {
    key: ModuleKey,
    base_dir: PathBuf,
    settings: Arc<Settings>,
    languages: BTreeSet<String>,
}

impl Module {
    pub fn new(key: ModuleKey, base_dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            key,
            base_dir: base_dir.into(),
            settings: Arc::new(settings),
            languages: BTreeSet::new(),
        }
    }

    /// Declare a language present in this module.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.insert(language.into());
        self
    }

    pub fn key(&self) -> &ModuleKey {
        &self.key
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }
}

/// Per-language collectors of one analysis run.
pub type Collectors = BTreeMap<String, Arc<ReportPathCollector>>;

/// Everything a sensor sees while executing on one module.
#[derive(Debug, Clone)]
pub struct SensorContext {
    module: Module,
    collectors: Arc<Collectors>,
}

impl SensorContext {
    pub fn new(module: Module, collectors: Arc<Collectors>) -> Self {
        Self { module, collectors }
    }

    /// Context with a single collector, keyed by the language it is bound to.
    pub fn with_collector(module: Module, collector: Arc<ReportPathCollector>) -> Self {
        let mut collectors = Collectors::new();
        if let Some(language) = collector.language() {
            collectors.insert(language.to_string(), Arc::clone(&collector));
        }
        Self::new(module, Arc::new(collectors))
    }

    pub fn module(&self) -> &ModuleKey {
        self.module.key()
    }

    pub fn base_dir(&self) -> &Path {
        self.module.base_dir()
    }

    pub fn settings(&self) -> &Settings {
        self.module.settings()
    }

    /// The collector receiving `language`'s reports.
    pub fn collector(&self, language: &str) -> Result<&ReportPathCollector> {
        self.collectors
            .get(language)
            .map(Arc::as_ref)
            .ok_or_else(|| CovregError::UnknownLanguage(language.to_string()))
    }
}

/// What a sensor execution contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorOutcome {
    /// Paths newly accepted by the collector.
    pub contributed: usize,
    /// Configured entries skipped because they could not be normalized.
    pub rejected: usize,
}

impl SensorOutcome {
    pub fn merge(self, other: SensorOutcome) -> Self {
        Self {
            contributed: self.contributed + other.contributed,
            rejected: self.rejected + other.rejected,
        }
    }
}

/// A unit of the analysis run that contributes report paths.
#[async_trait]
pub trait Sensor: Send + Sync {
    fn describe(&self) -> SensorDescriptor;

    async fn execute(&self, context: &SensorContext) -> Result<SensorOutcome>;
}
