//! Sensors feeding the covreg report registry.
//!
//! - [`settings`]: per-module property source
//! - [`analyzer`]: protobuf and Roslyn output locations
//! - [`sensor`]: the async [`Sensor`] seam
//! - [`properties`], [`coverage`]: the two sensor kinds
//! - [`run`]: concurrent execution over one shared collector

pub mod analyzer;
pub mod coverage;
pub mod properties;
pub mod provider;
pub mod run;
pub mod sensor;
pub mod settings;

pub use analyzer::AnalyzerConfiguration;
pub use coverage::CoverageReportImportSensor;
pub use properties::PropertiesSensor;
pub use provider::sensors_for;
pub use run::{AnalysisRun, RunReport, SensorReport, SensorStatus};
pub use sensor::{Module, Sensor, SensorContext, SensorDescriptor, SensorOutcome};
pub use settings::Settings;
