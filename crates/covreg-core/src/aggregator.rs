//! Coverage report aggregation.
//!
//! [`CoverageAggregator`] is the read side of the registry. Its first read
//! seals the shared [`ReportPathCollector`], then combines each coverage
//! tool's snapshot with the configuration key that produced it into a
//! [`CoverageReportSet`].

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::collector::{ReportPathCollector, RoslynReport};
use crate::config::ConfigurationTable;
use crate::error::{CovregError, Result};
use crate::kind::{CoverageTool, ReportKind, TestScope};
use crate::obs;
use crate::path::CanonicalPath;

/// What to do when no coverage tool yielded any path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReportPolicy {
    /// Return a set whose per-tool sequences are all empty.
    #[default]
    Lenient,
    /// Fail with [`CovregError::EmptyReportSet`].
    Strict,
}

/// Paths collected for one coverage tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReports {
    pub tool: CoverageTool,
    /// Property key the paths were configured under.
    pub property_key: String,
    pub paths: Vec<CanonicalPath>,
}

/// Sealed coverage report paths for one (language, scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReportSet {
    pub language: String,
    pub scope: TestScope,
    /// One entry per tool, in declaration order, including empty ones.
    pub reports: Vec<ToolReports>,
    pub generated_at: chrono::DateTime<Utc>,
}

impl CoverageReportSet {
    pub fn paths(&self, tool: CoverageTool) -> &[CanonicalPath] {
        self.reports
            .iter()
            .find(|r| r.tool == tool)
            .map(|r| r.paths.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.reports.iter().all(|r| r.paths.is_empty())
    }

    pub fn total_paths(&self) -> usize {
        self.reports.iter().map(|r| r.paths.len()).sum()
    }

    /// Tools that contributed at least one path.
    pub fn tools_with_reports(&self) -> Vec<CoverageTool> {
        self.reports
            .iter()
            .filter(|r| !r.paths.is_empty())
            .map(|r| r.tool)
            .collect()
    }

    /// SHA-256 over language, scope and the ordered per-tool paths.
    ///
    /// Independent of `generated_at`, so identical inputs give identical
    /// digests across runs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.language.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.scope.to_string().as_bytes());
        hasher.update(b"\0");
        for report in &self.reports {
            hasher.update(report.tool.slug().as_bytes());
            hasher.update(b"\0");
            for path in &report.paths {
                hasher.update(path.to_string().as_bytes());
                hasher.update(b"\0");
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Sealed analyzer outputs (protobuf directories and Roslyn reports).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerReportSet {
    pub protobuf_dirs: Vec<CanonicalPath>,
    pub roslyn_reports: Vec<RoslynReport>,
}

/// Builds report sets from a shared collector and configuration table.
pub struct CoverageAggregator {
    table: Arc<ConfigurationTable>,
    collector: Arc<ReportPathCollector>,
    policy: EmptyReportPolicy,
}

impl CoverageAggregator {
    pub fn new(table: Arc<ConfigurationTable>, collector: Arc<ReportPathCollector>) -> Self {
        Self {
            table,
            collector,
            policy: EmptyReportPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EmptyReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EmptyReportPolicy {
        self.policy
    }

    /// Seal the collector and build the report set for `(language, scope)`.
    ///
    /// Unknown languages, and languages other than the one the collector is
    /// bound to, fail before sealing.
    pub fn build_report_set(&self, language: &str, scope: TestScope) -> Result<CoverageReportSet> {
        let configuration = self.table.configuration(language, scope)?;
        if let Some(bound) = self.collector.language() {
            if bound != language {
                return Err(CovregError::LanguageMismatch {
                    bound: bound.to_string(),
                    requested: language.to_string(),
                });
            }
        }
        self.collector.seal();

        let reports: Vec<ToolReports> = configuration
            .keys()
            .iter()
            .map(|(tool, key)| ToolReports {
                tool,
                property_key: key.to_string(),
                paths: self.collector.snapshot(tool.report_kind(), Some(scope)),
            })
            .collect();

        let set = CoverageReportSet {
            language: language.to_string(),
            scope,
            reports,
            generated_at: Utc::now(),
        };

        if set.is_empty() && self.policy == EmptyReportPolicy::Strict {
            return Err(CovregError::EmptyReportSet {
                language: language.to_string(),
                scope,
            });
        }

        obs::emit_report_set_built(language, scope, set.total_paths());
        Ok(set)
    }

    /// Report sets for both scopes, unit first.
    pub fn build_all(&self, language: &str) -> Result<Vec<CoverageReportSet>> {
        TestScope::ALL
            .into_iter()
            .map(|scope| self.build_report_set(language, scope))
            .collect()
    }

    /// Seal the collector and return analyzer outputs.
    pub fn analyzer_reports(&self) -> AnalyzerReportSet {
        self.collector.seal();
        AnalyzerReportSet {
            protobuf_dirs: self.collector.snapshot(ReportKind::Protobuf, None),
            roslyn_reports: self.collector.roslyn_reports(),
        }
    }
}
