//! Analysis run orchestration.
//!
//! [`AnalysisRun`] owns one [`ReportPathCollector`] per registered language for
//! its lifetime, so reports of different languages never share a bucket.
//! Sensors are fanned out over every module concurrently during
//! [`AnalysisRun::execute`]; [`AnalysisRun::finish`] seals the collectors and
//! builds the report sets.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use covreg_core::{
    emit_run_finished, emit_run_started, emit_sensor_failed, emit_sensor_finished,
    emit_sensor_skipped, AnalyzerReportSet, ConfigurationTable, CoverageAggregator,
    CoverageReportSet, CovregError, EmptyReportPolicy, ReportPathCollector, Result, RunSpan,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use crate::sensor::{Collectors, Module, Sensor, SensorContext, SensorOutcome};

/// How one sensor execution on one module ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SensorStatus {
    Finished,
    /// The module does not contain the sensor's language.
    Skipped,
    Failed { error: String },
}

/// Result of one (sensor, module) execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReport {
    pub sensor: String,
    pub module: String,
    #[serde(flatten)]
    pub status: SensorStatus,
    pub outcome: SensorOutcome,
    pub duration_ms: u64,
}

/// Everything an analysis run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub coverage: Vec<CoverageReportSet>,
    /// Analyzer outputs keyed by language.
    pub analyzer: BTreeMap<String, AnalyzerReportSet>,
    pub sensors: Vec<SensorReport>,
}

impl RunReport {
    pub fn failed_sensors(&self) -> impl Iterator<Item = &SensorReport> {
        self.sensors
            .iter()
            .filter(|s| matches!(s.status, SensorStatus::Failed { .. }))
    }

    pub fn success(&self) -> bool {
        self.failed_sensors().next().is_none()
    }
}

pub struct AnalysisRun {
    run_id: String,
    table: Arc<ConfigurationTable>,
    collectors: Arc<Collectors>,
    policy: EmptyReportPolicy,
    started: Instant,
    sensor_reports: Vec<SensorReport>,
}

impl AnalysisRun {
    pub fn new(table: Arc<ConfigurationTable>) -> Self {
        let collectors: Collectors = table
            .languages()
            .map(|info| {
                (
                    info.key.clone(),
                    Arc::new(ReportPathCollector::for_language(info.key.clone())),
                )
            })
            .collect();
        Self {
            run_id: Uuid::new_v4().to_string(),
            table,
            collectors: Arc::new(collectors),
            policy: EmptyReportPolicy::default(),
            started: Instant::now(),
            sensor_reports: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: EmptyReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The collector holding `language`'s reports.
    pub fn collector(&self, language: &str) -> Option<&Arc<ReportPathCollector>> {
        self.collectors.get(language)
    }

    fn total_paths(&self) -> usize {
        self.collectors
            .values()
            .map(|collector| collector.total_paths())
            .sum()
    }

    /// Execute every sensor on every module concurrently.
    ///
    /// Sensor errors are recorded per execution rather than aborting the run.
    /// Returns the reports of this call in (module, sensor) order.
    pub async fn execute(
        &mut self,
        modules: &[Module],
        sensors: &[Arc<dyn Sensor>],
    ) -> &[SensorReport] {
        emit_run_started(&self.run_id, modules.len() * sensors.len());
        let span = tracing::info_span!("covreg.execute", run_id = %self.run_id);

        let mut join_set = JoinSet::new();
        let mut slots: Vec<SensorReport> = Vec::new();
        for module in modules {
            for sensor in sensors {
                let idx = slots.len();
                let descriptor = sensor.describe();
                slots.push(SensorReport {
                    sensor: descriptor.name.clone(),
                    module: module.key().to_string(),
                    status: SensorStatus::Failed {
                        error: "sensor task did not complete".to_string(),
                    },
                    outcome: SensorOutcome::default(),
                    duration_ms: 0,
                });

                if !descriptor.applies_to(module.languages()) {
                    emit_sensor_skipped(&descriptor.name, "language not present in module");
                    slots[idx].status = SensorStatus::Skipped;
                    continue;
                }

                let sensor = Arc::clone(sensor);
                let context = SensorContext::new(module.clone(), Arc::clone(&self.collectors));
                join_set.spawn(
                    async move {
                        let start = Instant::now();
                        let result = sensor.execute(&context).await;
                        (idx, result, start.elapsed().as_millis() as u64)
                    }
                    .instrument(span.clone()),
                );
            }
        }

        while let Some(joined) = join_set.join_next().await {
            let (idx, result, duration_ms) = match joined {
                Ok(done) => done,
                Err(err) => {
                    tracing::error!(error = %err, "sensor task join error");
                    continue;
                }
            };
            let report = &mut slots[idx];
            report.duration_ms = duration_ms;
            match result {
                Ok(outcome) => {
                    emit_sensor_finished(&report.sensor, outcome.contributed, duration_ms);
                    report.outcome = outcome;
                    report.status = SensorStatus::Finished;
                }
                Err(err) => {
                    emit_sensor_failed(&report.sensor, &err);
                    report.status = SensorStatus::Failed {
                        error: err.to_string(),
                    };
                }
            }
        }

        let first = self.sensor_reports.len();
        self.sensor_reports.extend(slots);
        &self.sensor_reports[first..]
    }

    /// Seal the collectors of `languages` and build their coverage report
    /// sets for both scopes, plus their analyzer outputs.
    pub fn finish(self, languages: &[&str]) -> Result<RunReport> {
        let _span = RunSpan::enter(&self.run_id);

        let mut coverage = Vec::new();
        let mut analyzer = BTreeMap::new();
        for language in languages {
            let collector = self
                .collector(language)
                .ok_or_else(|| CovregError::UnknownLanguage(language.to_string()))?;
            let aggregator = CoverageAggregator::new(Arc::clone(&self.table), Arc::clone(collector))
                .with_policy(self.policy);
            coverage.extend(aggregator.build_all(language)?);
            analyzer.insert(language.to_string(), aggregator.analyzer_reports());
        }
        let total_paths = self.total_paths();

        let report = RunReport {
            run_id: self.run_id.clone(),
            coverage,
            analyzer,
            sensors: self.sensor_reports,
        };
        emit_run_finished(
            &self.run_id,
            self.started.elapsed().as_millis() as u64,
            total_paths,
            report.success(),
        );
        Ok(report)
    }
}
