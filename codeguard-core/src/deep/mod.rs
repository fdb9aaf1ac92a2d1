//! Multi-faceted heuristic scan of a single source file.
//!
//! Each sub-scan is an independent rule category: design patterns,
//! anti-patterns, syntax balance, semantics, runtime risks, performance and
//! security. Cross-file dependency analysis runs only when more than one
//! file is supplied.

mod dependencies;
mod patterns;
mod risks;
mod semantics;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::SourceFile;
use crate::error::isolate;

pub use dependencies::{
    CircularDependency, DependencyAnalysis, DependencyNode, ImportSpec, UnusedImport,
    analyze_dependencies,
};
pub use patterns::{callback_depth, cyclomatic_complexity};

/// How severe a deep-analysis finding is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or speculative.
    Low,
    /// Worth addressing.
    Medium,
    /// Likely defect.
    High,
    /// Must fix.
    Critical,
}

/// The sub-scan that produced a finding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    /// Known maintainability hazard.
    AntiPattern,
    /// Global brace or paren imbalance.
    SyntaxError,
    /// Suspicious but legal usage.
    SemanticWarning,
    /// Usage that fails at runtime.
    SemanticError,
    /// Missing or weak TypeScript typing.
    TypeSafety,
    /// Statically visible runtime hazard.
    RuntimeError,
    /// Inefficient construct.
    Performance,
    /// Exploitable construct.
    Security,
}

/// One deep-analysis finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    /// Sub-scan that produced the finding.
    #[serde(rename = "type")]
    pub category: FindingCategory,
    /// Short name for named anti-patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Severity tier.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
    /// 1-based, best-effort line.
    pub line: usize,
}

impl Finding {
    pub(crate) fn new(
        category: FindingCategory,
        severity: Severity,
        message: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            category,
            name: None,
            severity,
            message: message.into(),
            line,
        }
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Qualitative confidence of a design-pattern match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Weak signal.
    Low,
    /// Plausible.
    Medium,
    /// Strong signal.
    High,
}

/// A recognised design pattern; raises the overall score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DesignPattern {
    /// Pattern name.
    pub name: String,
    /// Fixed per pattern type.
    pub confidence: Confidence,
    /// Human-readable explanation.
    pub message: String,
}

/// Full result of [`perform_deep_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeepAnalysisResult {
    /// Analyzed file name.
    pub file_name: String,
    /// Recognised design patterns.
    pub patterns: Vec<DesignPattern>,
    /// Anti-pattern findings.
    pub anti_patterns: Vec<Finding>,
    /// Brace and paren balance findings.
    pub syntax_errors: Vec<Finding>,
    /// Semantic and type-safety findings.
    pub semantic_warnings: Vec<Finding>,
    /// Runtime hazard findings.
    pub runtime_errors: Vec<Finding>,
    /// Performance findings.
    pub performance_warnings: Vec<Finding>,
    /// Security findings.
    pub security_vulnerabilities: Vec<Finding>,
    /// Cross-file view scoped to this file; present for multi-file input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyAnalysis>,
    /// 0-100 aggregate score.
    pub overall_score: u8,
}

/// Run every deep sub-scan over `content`.
///
/// Dependency analysis is computed from `all_files` only when it holds more
/// than one file; cycles are then filtered to those that include `file_name`.
pub fn perform_deep_analysis(
    content: &str,
    file_name: &str,
    all_files: &[SourceFile],
) -> DeepAnalysisResult {
    let dependencies = (all_files.len() > 1).then(|| analyze_dependencies(all_files));
    perform_deep_analysis_with(content, file_name, dependencies.as_ref())
}

/// Like [`perform_deep_analysis`], reusing a precomputed project-wide
/// dependency analysis.
pub fn perform_deep_analysis_with(
    content: &str,
    file_name: &str,
    dependencies: Option<&DependencyAnalysis>,
) -> DeepAnalysisResult {
    let is_typescript = file_name.ends_with(".ts") || file_name.ends_with(".tsx");

    let patterns = isolate("design-patterns", || patterns::design_patterns(content));
    let anti_patterns = isolate("anti-patterns", || patterns::anti_patterns(content));
    let syntax_errors = isolate("syntax", || semantics::syntax_errors(content));
    let mut semantic_warnings = isolate("semantics", || semantics::semantic_issues(content));
    if is_typescript {
        semantic_warnings.extend(isolate("type-safety", || semantics::type_safety(content)));
    }
    let runtime_errors = isolate("runtime", || risks::runtime_errors(content));
    let performance_warnings = isolate("performance", || risks::performance_warnings(content));
    let security_vulnerabilities = isolate("security", || risks::security_vulnerabilities(content));

    let mut result = DeepAnalysisResult {
        file_name: file_name.to_string(),
        patterns,
        anti_patterns,
        syntax_errors,
        semantic_warnings,
        runtime_errors,
        performance_warnings,
        security_vulnerabilities,
        dependencies: dependencies.map(|analysis| analysis.for_file(file_name)),
        overall_score: 100,
    };
    result.overall_score = overall_score(&result);
    log::debug!(
        "deep analysis of {file_name}: score {}",
        result.overall_score
    );
    result
}

/// Severity-weighted aggregate, rewarded per pattern and clamped to 0-100.
pub fn overall_score(result: &DeepAnalysisResult) -> u8 {
    let count = |findings: &[Finding]| findings.len() as i64;
    let anti_with = |severity: Severity| {
        result
            .anti_patterns
            .iter()
            .filter(|finding| finding.severity == severity)
            .count() as i64
    };

    let score = 100 - 20 * count(&result.syntax_errors)
        - 15 * anti_with(Severity::High)
        - 10 * anti_with(Severity::Medium)
        - 25 * count(&result.security_vulnerabilities)
        - 15 * count(&result.runtime_errors)
        - 5 * count(&result.semantic_warnings)
        - 10 * count(&result.performance_warnings)
        + 5 * result.patterns.len() as i64;
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_scores_perfectly() {
        let result = perform_deep_analysis("", "empty.js", &[]);
        assert_eq!(result.overall_score, 100);
        assert!(result.anti_patterns.is_empty());
        assert!(result.syntax_errors.is_empty());
        assert!(result.dependencies.is_none());
    }

    #[test]
    fn eval_is_single_critical_vulnerability() {
        let result = perform_deep_analysis("eval(userInput)", "x.js", &[]);
        assert_eq!(result.security_vulnerabilities.len(), 1);
        let finding = &result.security_vulnerabilities[0];
        assert_eq!(finding.severity, Severity::Critical);
        assert!(finding.message.contains("eval"));
    }

    #[test]
    fn type_safety_only_for_typescript() {
        let content = "function add(a, b) { return a + b; }\nexport const total = add(1, 2);";
        let js = perform_deep_analysis(content, "math.js", &[]);
        let ts = perform_deep_analysis(content, "math.ts", &[]);
        let type_findings = |result: &DeepAnalysisResult| {
            result
                .semantic_warnings
                .iter()
                .filter(|finding| finding.category == FindingCategory::TypeSafety)
                .count()
        };
        assert_eq!(type_findings(&js), 0);
        assert_eq!(type_findings(&ts), 1);
    }

    #[test]
    fn score_clamps_to_zero() {
        let content = "{{{{ (((( eval(a); eval(b); password = 'x'; secret = 'y'; api_key = 'z';";
        let result = perform_deep_analysis(content, "bad.js", &[]);
        assert_eq!(result.overall_score, 0);
    }

    #[test]
    fn patterns_raise_score_but_cap_at_hundred() {
        let content = "export function createWidget() { return 1; }\nuseEffect";
        let result = perform_deep_analysis(content, "w.js", &[]);
        assert!(result.patterns.len() >= 2);
        assert_eq!(result.overall_score, 100);
    }

    #[test]
    fn serializes_kebab_case_categories() {
        let finding = Finding::new(FindingCategory::AntiPattern, Severity::High, "x", 1)
            .named("God Object");
        let json = serde_json::to_value(&finding).expect("json");
        assert_eq!(json["type"], "anti-pattern");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["name"], "God Object");
    }
}
