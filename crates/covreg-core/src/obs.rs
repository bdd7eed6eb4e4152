//! Structured observability hooks for registry and run lifecycle events.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for contributions, sealing, report sets and sensors
//!
//! Every event carries a stable `event` field. Filter with `RUST_LOG`; for
//! JSON output initialise tracing with `json = true`.

use tracing::{debug, info, warn};

use crate::kind::{ReportKind, TestScope};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("run-12345");
/// // every event below is tagged with run_id = "run-12345"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("covreg.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

fn scope_label(scope: Option<TestScope>) -> &'static str {
    match scope {
        Some(TestScope::Unit) => "unit",
        Some(TestScope::Integration) => "integration",
        None => "none",
    }
}

/// Emit event: analysis run started.
pub fn emit_run_started(run_id: &str, sensor_count: usize) {
    info!(event = "run.started", run_id = %run_id, sensors = sensor_count);
}

/// Emit event: analysis run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, total_paths: usize, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        total_paths = total_paths,
        success = success,
    );
}

/// Emit event: paths accepted into a bucket.
pub fn emit_paths_added(kind: ReportKind, scope: Option<TestScope>, added: usize, duplicates: usize) {
    debug!(
        event = "registry.paths_added",
        kind = %kind,
        scope = scope_label(scope),
        added = added,
        duplicates = duplicates,
    );
}

/// Emit event: contribution refused by the collector (warning level).
pub fn emit_contribution_rejected(
    kind: ReportKind,
    scope: Option<TestScope>,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "registry.contribution_rejected",
        kind = %kind,
        scope = scope_label(scope),
        error = %error,
    );
}

/// Emit event: one configured path could not be normalized (warning level).
pub fn emit_path_rejected(property: &str, error: &dyn std::fmt::Display) {
    warn!(event = "path.rejected", property = %property, error = %error);
}

/// Emit event: collector sealed by the first aggregator read.
pub fn emit_registry_sealed(total_paths: usize) {
    info!(event = "registry.sealed", total_paths = total_paths);
}

/// Emit event: collector dropped at the end of the run.
pub fn emit_registry_discarded(total_paths: usize) {
    debug!(event = "registry.discarded", total_paths = total_paths);
}

/// Emit event: aggregator produced a report set.
pub fn emit_report_set_built(language: &str, scope: TestScope, total_paths: usize) {
    info!(
        event = "report_set.built",
        language = %language,
        scope = scope_label(Some(scope)),
        total_paths = total_paths,
    );
}

/// Emit event: sensor finished contributing.
pub fn emit_sensor_finished(sensor: &str, contributed: usize, duration_ms: u64) {
    info!(
        event = "sensor.finished",
        sensor = %sensor,
        contributed = contributed,
        duration_ms = duration_ms,
    );
}

/// Emit event: sensor skipped because it does not apply (debug level).
pub fn emit_sensor_skipped(sensor: &str, reason: &str) {
    debug!(event = "sensor.skipped", sensor = %sensor, reason = %reason);
}

/// Emit event: sensor failed (warning level).
pub fn emit_sensor_failed(sensor: &str, error: &dyn std::fmt::Display) {
    warn!(event = "sensor.failed", sensor = %sensor, error = %error);
}
