//! Report kinds, coverage tools and test scopes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CovregError, Result};

/// Which family of tests produced a coverage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestScope {
    Unit,
    Integration,
}

impl TestScope {
    pub const ALL: [TestScope; 2] = [TestScope::Unit, TestScope::Integration];

    /// Human-readable label used in sensor names ("Unit Tests", "Integration Tests").
    pub fn title(&self) -> &'static str {
        match self {
            TestScope::Unit => "Unit Tests",
            TestScope::Integration => "Integration Tests",
        }
    }

    /// Segment inserted into property keys; empty for unit tests.
    pub(crate) fn key_infix(&self) -> &'static str {
        match self {
            TestScope::Unit => "",
            TestScope::Integration => ".it",
        }
    }
}

impl fmt::Display for TestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestScope::Unit => f.write_str("unit"),
            TestScope::Integration => f.write_str("integration"),
        }
    }
}

impl FromStr for TestScope {
    type Err = CovregError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unit" | "ut" => Ok(TestScope::Unit),
            "integration" | "it" => Ok(TestScope::Integration),
            other => Err(CovregError::Config(format!("unknown test scope: {other}"))),
        }
    }
}

/// A coverage tool whose reports the registry accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageTool {
    NCover3,
    OpenCover,
    DotCover,
    VisualStudioXml,
}

impl CoverageTool {
    /// All tools, in property-declaration order.
    pub const ALL: [CoverageTool; 4] = [
        CoverageTool::NCover3,
        CoverageTool::OpenCover,
        CoverageTool::DotCover,
        CoverageTool::VisualStudioXml,
    ];

    /// Segment used in property keys (`sonar.<lang>.<slug>.reportsPaths`).
    pub fn slug(&self) -> &'static str {
        match self {
            CoverageTool::NCover3 => "ncover3",
            CoverageTool::OpenCover => "opencover",
            CoverageTool::DotCover => "dotcover",
            CoverageTool::VisualStudioXml => "vscoveragexml",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CoverageTool::NCover3 => "NCover3",
            CoverageTool::OpenCover => "OpenCover",
            CoverageTool::DotCover => "dotCover",
            CoverageTool::VisualStudioXml => "Visual Studio",
        }
    }

    /// Conventional report file extension for this tool.
    pub fn extension_hint(&self) -> &'static str {
        match self {
            CoverageTool::NCover3 => "nccov",
            CoverageTool::OpenCover => "xml",
            CoverageTool::DotCover => "html",
            CoverageTool::VisualStudioXml => "coveragexml",
        }
    }

    pub fn report_kind(&self) -> ReportKind {
        match self {
            CoverageTool::NCover3 => ReportKind::NCover3,
            CoverageTool::OpenCover => ReportKind::OpenCover,
            CoverageTool::DotCover => ReportKind::DotCover,
            CoverageTool::VisualStudioXml => ReportKind::VsXml,
        }
    }
}

impl fmt::Display for CoverageTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Identifies the tool or format that produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    NCover3,
    OpenCover,
    DotCover,
    VsXml,
    Protobuf,
    Roslyn,
}

impl ReportKind {
    /// The coverage tool behind this kind, `None` for analyzer outputs.
    pub fn coverage_tool(&self) -> Option<CoverageTool> {
        match self {
            ReportKind::NCover3 => Some(CoverageTool::NCover3),
            ReportKind::OpenCover => Some(CoverageTool::OpenCover),
            ReportKind::DotCover => Some(CoverageTool::DotCover),
            ReportKind::VsXml => Some(CoverageTool::VisualStudioXml),
            ReportKind::Protobuf | ReportKind::Roslyn => None,
        }
    }

    pub fn is_coverage(&self) -> bool {
        self.coverage_tool().is_some()
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.coverage_tool()) {
            (_, Some(tool)) => f.write_str(tool.slug()),
            (ReportKind::Protobuf, None) => f.write_str("protobuf"),
            (_, None) => f.write_str("roslyn"),
        }
    }
}

/// A (kind, scope) pair naming one path collection in the registry.
///
/// Coverage kinds always carry a scope; analyzer kinds never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub kind: ReportKind,
    pub scope: Option<TestScope>,
}

impl BucketKey {
    pub fn new(kind: ReportKind, scope: Option<TestScope>) -> Result<Self> {
        if kind.is_coverage() != scope.is_some() {
            return Err(CovregError::scope_mismatch(kind, scope));
        }
        Ok(Self { kind, scope })
    }

    pub fn coverage(tool: CoverageTool, scope: TestScope) -> Self {
        Self {
            kind: tool.report_kind(),
            scope: Some(scope),
        }
    }

    pub fn analyzer(kind: ReportKind) -> Result<Self> {
        Self::new(kind, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parses_short_and_long_forms() {
        assert_eq!("unit".parse::<TestScope>().unwrap(), TestScope::Unit);
        assert_eq!("IT".parse::<TestScope>().unwrap(), TestScope::Integration);
        assert_eq!(
            " integration ".parse::<TestScope>().unwrap(),
            TestScope::Integration
        );
        assert!("e2e".parse::<TestScope>().is_err());
    }

    #[test]
    fn test_every_tool_maps_to_a_coverage_kind() {
        for tool in CoverageTool::ALL {
            let kind = tool.report_kind();
            assert!(kind.is_coverage());
            assert_eq!(kind.coverage_tool(), Some(tool));
        }
        assert!(!ReportKind::Protobuf.is_coverage());
        assert!(!ReportKind::Roslyn.is_coverage());
    }

    #[test]
    fn test_tool_slugs_are_distinct() {
        let mut slugs: Vec<_> = CoverageTool::ALL.iter().map(|t| t.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 4);
    }

    #[test]
    fn test_bucket_key_rejects_scope_mismatch() {
        assert!(BucketKey::new(ReportKind::OpenCover, Some(TestScope::Unit)).is_ok());
        assert!(BucketKey::new(ReportKind::OpenCover, None).is_err());
        assert!(BucketKey::new(ReportKind::Roslyn, Some(TestScope::Unit)).is_err());
        assert!(BucketKey::analyzer(ReportKind::Protobuf).is_ok());
    }

    #[test]
    fn test_report_kind_display() {
        assert_eq!(ReportKind::VsXml.to_string(), "vscoveragexml");
        assert_eq!(ReportKind::Protobuf.to_string(), "protobuf");
        assert_eq!(ReportKind::Roslyn.to_string(), "roslyn");
    }
}
