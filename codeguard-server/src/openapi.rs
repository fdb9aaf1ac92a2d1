//! OpenAPI specification for CodeGuard server.

use utoipa::OpenApi;

use codeguard_core::deep::{
    CircularDependency, Confidence, DependencyAnalysis, DependencyNode, DesignPattern, Finding,
    FindingCategory, ImportSpec, Severity, UnusedImport,
};
use codeguard_core::domain::Impact;
use codeguard_core::html::{FindingKind, ValidationFinding, ValidityStatus, W3cSummary};
use codeguard_core::improver::{AppliedFix, ImprovementMetrics, SkippedFix};
use codeguard_core::performance::{PerformanceIssue, WebVitals};
use codeguard_core::{
    ChangeType, DeepAnalysisResult, FileReport, FixKind, ImprovementResult, Issue, IssueKind,
    LineComparison, PerformanceReport, ProjectReport, ProjectStatus, ProjectSummary, Suggestion,
    W3cReport,
};

use crate::routes::{
    AnalyzeRequest, AnalyzeResponse, CompareRequest, ErrorResponse, HealthResponse,
    ImproveRequest, SourceFileRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::analyze,
        crate::routes::validate,
        crate::routes::performance,
        crate::routes::improve,
        crate::routes::compare,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            HealthResponse,
            SourceFileRequest,
            AnalyzeRequest,
            AnalyzeResponse,
            ImproveRequest,
            CompareRequest,
            ErrorResponse,
            ProjectReport,
            ProjectSummary,
            ProjectStatus,
            FileReport,
            Issue,
            IssueKind,
            Suggestion,
            Impact,
            FixKind,
            DeepAnalysisResult,
            DesignPattern,
            Confidence,
            Finding,
            FindingCategory,
            Severity,
            DependencyAnalysis,
            DependencyNode,
            ImportSpec,
            CircularDependency,
            UnusedImport,
            W3cReport,
            W3cSummary,
            ValidityStatus,
            ValidationFinding,
            FindingKind,
            PerformanceReport,
            PerformanceIssue,
            WebVitals,
            ImprovementResult,
            ImprovementMetrics,
            AppliedFix,
            SkippedFix,
            LineComparison,
            ChangeType
        )
    ),
    tags(
        (name = "analysis", description = "Analysis, validation and page speed"),
        (name = "improve", description = "Automatic fixes and comparisons"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the CodeGuard server.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn openapi_includes_expected_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;

        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/analyze"));
        assert!(paths.contains_key("/validate"));
        assert!(paths.contains_key("/performance"));
        assert!(paths.contains_key("/improve"));
        assert!(paths.contains_key("/compare"));
        assert!(paths.contains_key("/openapi.json"));
    }

    #[test]
    fn openapi_registers_report_schemas() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        for name in ["ProjectReport", "W3cReport", "ImprovementResult", "ErrorResponse"] {
            assert!(components.schemas.contains_key(name), "{name}");
        }
    }
}
