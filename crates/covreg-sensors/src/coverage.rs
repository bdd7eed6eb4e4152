//! Coverage report import sensor, one instance per (language, scope).

use async_trait::async_trait;
use covreg_core::{
    emit_path_rejected, normalize_all, ConfigurationTable, CoverageConfiguration, LanguageInfo,
    Result, TestScope,
};

use crate::sensor::{Sensor, SensorContext, SensorDescriptor, SensorOutcome};

/// Reads the four coverage-tool properties for one scope and registers the
/// listed report files with the collector.
pub struct CoverageReportImportSensor {
    language: LanguageInfo,
    configuration: CoverageConfiguration,
}

impl CoverageReportImportSensor {
    /// Fails with `UnknownLanguage` when `language` is not in `table`.
    pub fn new(table: &ConfigurationTable, language: &str, scope: TestScope) -> Result<Self> {
        Ok(Self {
            language: table.language(language)?.clone(),
            configuration: table.configuration(language, scope)?.clone(),
        })
    }

    pub fn scope(&self) -> TestScope {
        self.configuration.scope()
    }
}

#[async_trait]
impl Sensor for CoverageReportImportSensor {
    fn describe(&self) -> SensorDescriptor {
        SensorDescriptor::new(format!(
            "{} {} Coverage Report Import",
            self.language.name,
            self.scope().title()
        ))
        .only_on_language(self.language.key.clone())
    }

    async fn execute(&self, context: &SensorContext) -> Result<SensorOutcome> {
        let scope = self.scope();
        let collector = context.collector(&self.language.key)?;
        let mut outcome = SensorOutcome::default();

        for (tool, key) in self.configuration.keys().iter() {
            let raws = context.settings().get_string_array(key);
            if raws.is_empty() {
                continue;
            }
            let (paths, rejected) = normalize_all(&raws, context.base_dir());
            for err in &rejected {
                emit_path_rejected(key, err);
            }
            outcome.rejected += rejected.len();
            outcome.contributed += collector.add_module_paths(
                context.module(),
                tool.report_kind(),
                Some(scope),
                paths,
            )?;
        }

        Ok(outcome)
    }
}
