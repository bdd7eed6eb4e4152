//! Sensor contributing analyzer outputs: protobuf directories and Roslyn reports.

use async_trait::async_trait;
use covreg_core::{LanguageInfo, Result, RoslynReport};
use tracing::debug;

use crate::analyzer::AnalyzerConfiguration;
use crate::sensor::{Sensor, SensorContext, SensorDescriptor, SensorOutcome};

pub struct PropertiesSensor {
    language: LanguageInfo,
}

impl PropertiesSensor {
    pub fn new(language: LanguageInfo) -> Self {
        Self { language }
    }
}

#[async_trait]
impl Sensor for PropertiesSensor {
    fn describe(&self) -> SensorDescriptor {
        SensorDescriptor::new(format!("{} Properties", self.language.name))
            .only_on_language(self.language.key.clone())
    }

    async fn execute(&self, context: &SensorContext) -> Result<SensorOutcome> {
        let config =
            AnalyzerConfiguration::new(&self.language, context.settings(), context.base_dir());
        let collector = context.collector(&self.language.key)?;
        let mut outcome = SensorOutcome::default();

        let protobuf = config.protobuf_report_paths();
        if !protobuf.is_empty() {
            outcome.contributed += collector.add_protobuf_dirs(protobuf)?;
        }

        let roslyn: Vec<RoslynReport> = config
            .roslyn_report_paths()
            .into_iter()
            .map(|path| RoslynReport::new(context.module().clone(), path))
            .collect();
        if !roslyn.is_empty() {
            outcome.contributed += collector.add_roslyn_dirs(roslyn)?;
        }

        debug!(
            module = %context.module(),
            contributed = outcome.contributed,
            "analyzer properties collected"
        );
        Ok(outcome)
    }
}
