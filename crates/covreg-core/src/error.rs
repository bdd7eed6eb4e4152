//! Error taxonomy for the report registry.

use crate::kind::{ReportKind, TestScope};

/// Why a single raw path was rejected by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("base directory must be absolute: {base}")]
    RelativeBase { base: String },

    #[error("path escapes the filesystem root: {raw}")]
    EscapesRoot { raw: String },
}

/// Errors produced by the registry, configuration table and aggregators.
#[derive(Debug, thiserror::Error)]
pub enum CovregError {
    #[error("invalid report path '{raw}': {source}")]
    InvalidPath {
        raw: String,
        #[source]
        source: PathError,
    },

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("registry is sealed; rejected contribution for {kind} ({scope})")]
    RegistrySealed { kind: ReportKind, scope: String },

    #[error("no coverage reports found for language '{language}' ({scope})")]
    EmptyReportSet { language: String, scope: TestScope },

    #[error("report kind {kind} does not accept scope '{scope}'")]
    ScopeMismatch { kind: ReportKind, scope: String },

    #[error("collector holds '{bound}' reports; cannot build a report set for '{requested}'")]
    LanguageMismatch { bound: String, requested: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CovregError {
    /// Whether the run can continue after this error.
    ///
    /// Path rejections and empty report sets are scoped to one contribution;
    /// everything else signals a configuration or ordering bug.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CovregError::InvalidPath { .. } | CovregError::EmptyReportSet { .. }
        )
    }

    pub(crate) fn sealed(kind: ReportKind, scope: Option<TestScope>) -> Self {
        CovregError::RegistrySealed {
            kind,
            scope: scope_label(scope),
        }
    }

    pub(crate) fn scope_mismatch(kind: ReportKind, scope: Option<TestScope>) -> Self {
        CovregError::ScopeMismatch {
            kind,
            scope: scope_label(scope),
        }
    }
}

fn scope_label(scope: Option<TestScope>) -> String {
    scope.map_or_else(|| "none".to_string(), |s| s.to_string())
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, CovregError>;
