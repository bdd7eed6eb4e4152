//! covreg core library
//!
//! A registry for coverage and analyzer report paths contributed during one
//! analysis run:
//! - [`path`]: lexical normalization of contributed paths
//! - [`kind`]: report kinds, coverage tools and test scopes
//! - [`config`]: the per-language property-key table
//! - [`collector`]: the shared, sealable path collector
//! - [`aggregator`]: sealed per-scope report sets for downstream consumers

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod error;
pub mod kind;
pub mod obs;
pub mod path;
pub mod telemetry;

pub use aggregator::{
    AnalyzerReportSet, CoverageAggregator, CoverageReportSet, EmptyReportPolicy, ToolReports,
};
pub use collector::{ModuleKey, RegistryPhase, ReportPath, ReportPathCollector, RoslynReport};
pub use config::{ConfigurationTable, CoverageConfiguration, CoverageKeys, LanguageInfo};
pub use error::{CovregError, PathError, Result};
pub use kind::{BucketKey, CoverageTool, ReportKind, TestScope};
pub use path::{normalize, normalize_all, normalize_path, split_path_list, CanonicalPath};

pub use obs::{
    emit_contribution_rejected, emit_path_rejected, emit_paths_added, emit_registry_discarded,
    emit_registry_sealed, emit_report_set_built, emit_run_finished, emit_run_started,
    emit_sensor_failed, emit_sensor_finished, emit_sensor_skipped, RunSpan,
};
pub use telemetry::init_tracing;

/// covreg version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
