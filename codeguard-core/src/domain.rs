//! Domain entities for CodeGuard.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::deep::DeepAnalysisResult;

/// A mapping of language names to their percentage of total lines.
pub type LanguageDistribution = BTreeMap<String, f64>;

/// A source artifact handed to the engine by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    /// File name or relative path, used for family dispatch and import resolution.
    pub file_name: String,
    /// Full decoded text of the file.
    pub content: String,
    /// MIME type or extension hint supplied by the caller.
    #[serde(default, rename = "type")]
    pub file_type: String,
}

impl SourceFile {
    /// Create a source file, deriving the type hint from the extension.
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let file_type = extension_of(&file_name);
        Self {
            file_name,
            content: content.into(),
            file_type,
        }
    }

    /// Lowercase extension of the file name, empty when absent.
    pub fn extension(&self) -> String {
        extension_of(&self.file_name)
    }
}

/// Lowercase extension of a file name, empty when absent.
pub fn extension_of(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Severity tier of an [`Issue`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Breaks correctness or standards compliance.
    Error,
    /// Likely problem worth fixing.
    Warning,
    /// Informational note.
    Info,
}

/// A located finding produced by the basic analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Issue {
    /// Severity tier.
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// 1-based, best-effort line.
    pub line: usize,
    /// Human-readable description.
    pub message: String,
    /// Short machine-readable tag such as `CONSOLE_LOG`.
    pub code: String,
}

impl Issue {
    /// Build an error issue.
    pub fn error(line: usize, message: impl Into<String>, code: &str) -> Self {
        Self::new(IssueKind::Error, line, message, code)
    }

    /// Build a warning issue.
    pub fn warning(line: usize, message: impl Into<String>, code: &str) -> Self {
        Self::new(IssueKind::Warning, line, message, code)
    }

    /// Build an informational issue.
    pub fn info(line: usize, message: impl Into<String>, code: &str) -> Self {
        Self::new(IssueKind::Info, line, message, code)
    }

    fn new(kind: IssueKind, line: usize, message: impl Into<String>, code: &str) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
            code: code.to_string(),
        }
    }
}

/// Expected payoff of acting on a [`Suggestion`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Small payoff.
    Low,
    /// Moderate payoff.
    Medium,
    /// Large payoff.
    High,
}

/// Closed set of rewrite rules known to the improver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FixKind {
    /// Delete `console.*(...)` call statements.
    RemoveConsoleLogs,
    /// Replace `var` with `let` or `const`.
    ReplaceVar,
    /// Terminate declaration and return lines with `;`.
    AddSemicolons,
    /// Strip trailing whitespace from every line.
    TrimTrailingWhitespace,
    /// Re-indent by bracket nesting.
    FixIndentation,
    /// Drop imports whose bindings are never referenced.
    RemoveUnusedImports,
    /// Add `key` props to JSX produced by `.map` callbacks.
    AddMissingKeys,
    /// Insert a viewport meta tag.
    AddViewportMeta,
    /// Delete comment lines that look like code.
    RemoveCommentedCode,
    /// Add `alt` text derived from the image source.
    AddAltAttributes,
    /// Rewrite deprecated HTML tags.
    ReplaceDeprecatedTags,
    /// Prepend `<!DOCTYPE html>`.
    AddDoctype,
    /// Move `style={{...}}` objects into generated class names.
    ExtractInlineStyles,
    /// Annotate nested loops with an optimisation hint.
    AnnotateNestedLoops,
    /// Declare named constants for repeated numeric literals.
    ExtractMagicNumbers,
    /// Prepend `import React from 'react';`.
    AddReactImport,
    /// Insert `<meta charset="UTF-8">`.
    AddCharsetMeta,
    /// Add `lang="en"` to the `<html>` tag.
    AddHtmlLang,
    /// Remove the trailing slash from void elements.
    StripVoidSlash,
}

impl FixKind {
    /// Every rule, in legacy dispatch priority order.
    pub const ALL: [FixKind; 19] = [
        FixKind::RemoveConsoleLogs,
        FixKind::ReplaceVar,
        FixKind::AddSemicolons,
        FixKind::TrimTrailingWhitespace,
        FixKind::FixIndentation,
        FixKind::RemoveUnusedImports,
        FixKind::AddMissingKeys,
        FixKind::AddViewportMeta,
        FixKind::RemoveCommentedCode,
        FixKind::AddAltAttributes,
        FixKind::ReplaceDeprecatedTags,
        FixKind::AddDoctype,
        FixKind::ExtractInlineStyles,
        FixKind::AnnotateNestedLoops,
        FixKind::ExtractMagicNumbers,
        FixKind::AddReactImport,
        FixKind::AddCharsetMeta,
        FixKind::AddHtmlLang,
        FixKind::StripVoidSlash,
    ];

    /// Stable kebab-case identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::RemoveConsoleLogs => "remove-console-logs",
            Self::ReplaceVar => "replace-var",
            Self::AddSemicolons => "add-semicolons",
            Self::TrimTrailingWhitespace => "trim-trailing-whitespace",
            Self::FixIndentation => "fix-indentation",
            Self::RemoveUnusedImports => "remove-unused-imports",
            Self::AddMissingKeys => "add-missing-keys",
            Self::AddViewportMeta => "add-viewport-meta",
            Self::RemoveCommentedCode => "remove-commented-code",
            Self::AddAltAttributes => "add-alt-attributes",
            Self::ReplaceDeprecatedTags => "replace-deprecated-tags",
            Self::AddDoctype => "add-doctype",
            Self::ExtractInlineStyles => "extract-inline-styles",
            Self::AnnotateNestedLoops => "annotate-nested-loops",
            Self::ExtractMagicNumbers => "extract-magic-numbers",
            Self::AddReactImport => "add-react-import",
            Self::AddCharsetMeta => "add-charset-meta",
            Self::AddHtmlLang => "add-html-lang",
            Self::StripVoidSlash => "strip-void-slash",
        }
    }

    /// Parse an identifier or one of its short aliases.
    pub fn from_id(id: &str) -> Option<Self> {
        let normalized = id.trim().to_lowercase();
        if let Some(kind) = Self::ALL.into_iter().find(|kind| kind.id() == normalized) {
            return Some(kind);
        }
        match normalized.as_str() {
            "console" | "consoles" | "console-log" => Some(Self::RemoveConsoleLogs),
            "var" | "var-to-let" => Some(Self::ReplaceVar),
            "semicolons" | "semi" => Some(Self::AddSemicolons),
            "whitespace" | "trailing-whitespace" => Some(Self::TrimTrailingWhitespace),
            "indent" | "indentation" => Some(Self::FixIndentation),
            "imports" | "unused-imports" => Some(Self::RemoveUnusedImports),
            "keys" | "react-keys" => Some(Self::AddMissingKeys),
            "viewport" => Some(Self::AddViewportMeta),
            "comments" | "commented-code" => Some(Self::RemoveCommentedCode),
            "alt" => Some(Self::AddAltAttributes),
            "deprecated" | "deprecated-tags" => Some(Self::ReplaceDeprecatedTags),
            "doctype" => Some(Self::AddDoctype),
            "inline-styles" | "styles" => Some(Self::ExtractInlineStyles),
            "nested-loops" | "loops" => Some(Self::AnnotateNestedLoops),
            "magic-numbers" | "constants" => Some(Self::ExtractMagicNumbers),
            "react" | "react-import" => Some(Self::AddReactImport),
            "charset" => Some(Self::AddCharsetMeta),
            "lang" => Some(Self::AddHtmlLang),
            "void-slash" | "trailing-slash" => Some(Self::StripVoidSlash),
            _ => None,
        }
    }
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// An actionable recommendation, optionally resolvable by the improver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Free-form category such as `optimization` or `accessibility`.
    #[serde(rename = "type")]
    pub category: String,
    /// Human-readable recommendation.
    pub message: String,
    /// Whether a rewrite rule is expected to resolve this suggestion.
    #[serde(default)]
    pub auto_fix: bool,
    /// Legacy rule hint text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_code: Option<String>,
    /// Expected payoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    /// Rewrite rule tag; set by every built-in analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_kind: Option<FixKind>,
}

impl Suggestion {
    /// Create a manual (non-autofixable) suggestion.
    pub fn new(category: &str, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            message: message.into(),
            auto_fix: false,
            fix_code: None,
            impact: None,
            fix_kind: None,
        }
    }

    /// Mark the suggestion as resolvable by `kind`.
    pub fn with_fix(mut self, kind: FixKind, fix_code: &str) -> Self {
        self.auto_fix = true;
        self.fix_kind = Some(kind);
        self.fix_code = Some(fix_code.to_string());
        self
    }

    /// Attach an impact tier.
    pub fn with_impact(mut self, impact: Impact) -> Self {
        self.impact = Some(impact);
        self
    }
}

/// Per-file analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// File name as supplied.
    pub file_name: String,
    /// Type hint as supplied.
    pub file_type: String,
    /// Line count.
    pub lines: usize,
    /// Character count.
    pub size: usize,
    /// Findings in insertion order.
    pub issues: Vec<Issue>,
    /// Deduplicated suggestions in insertion order.
    pub suggestions: Vec<Suggestion>,
    /// Number of error issues.
    pub error_count: usize,
    /// Number of warning issues.
    pub warning_count: usize,
    /// Number of informational issues.
    pub info_count: usize,
    /// 0-100 quality score.
    pub quality_score: u8,
    /// Leading slice of the original text.
    pub content_preview: String,
    /// Detected language name, when recognised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Deep analysis, attached by the project aggregator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_analysis: Option<DeepAnalysisResult>,
}

/// Pass/fail verdict of a project.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// No file reported an error.
    Passed,
    /// At least one error was reported.
    Failed,
}

/// Project-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    /// Sum of per-file error counts.
    pub total_errors: usize,
    /// Sum of per-file warning counts.
    pub total_warnings: usize,
    /// Rounded mean of per-file quality scores.
    pub average_quality_score: u8,
    /// Sum of per-file line counts.
    pub total_lines: usize,
    /// `passed` iff `total_errors == 0`.
    pub status: ProjectStatus,
    /// Share of lines per detected language.
    pub language_stats: LanguageDistribution,
}

/// Aggregated report over every analyzed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    /// Number of analyzed files.
    pub total_files: usize,
    /// Per-file reports in input order.
    pub files: Vec<FileReport>,
    /// Totals and verdict.
    pub summary: ProjectSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_of_handles_paths_and_dotfiles() {
        assert_eq!(extension_of("src/App.JSX"), "jsx");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".env"), "");
        assert_eq!(extension_of("dir.v2/file"), "");
    }

    #[test]
    fn fix_kind_round_trips_ids_and_aliases() {
        for kind in FixKind::ALL {
            assert_eq!(FixKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(FixKind::from_id(" Console "), Some(FixKind::RemoveConsoleLogs));
        assert_eq!(FixKind::from_id("doctype"), Some(FixKind::AddDoctype));
        assert_eq!(FixKind::from_id("unknown-fix"), None);
    }

    #[test]
    fn suggestion_serializes_with_legacy_field_names() {
        let suggestion = Suggestion::new("optimization", "Remove console.log statements")
            .with_fix(FixKind::RemoveConsoleLogs, "Remove all console.log statements")
            .with_impact(Impact::Low);
        let json = serde_json::to_value(&suggestion).expect("json");
        assert_eq!(json["type"], "optimization");
        assert_eq!(json["autoFix"], true);
        assert_eq!(json["fixKind"], "remove-console-logs");
        assert_eq!(json["impact"], "low");
    }

    #[test]
    fn suggestion_deserializes_without_optional_fields() {
        let suggestion: Suggestion =
            serde_json::from_str(r#"{"type":"formatting","message":"trim","autoFix":true}"#)
                .expect("parse");
        assert!(suggestion.auto_fix);
        assert_eq!(suggestion.fix_kind, None);
    }
}
