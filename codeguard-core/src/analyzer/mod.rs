//! Per-file heuristic analysis producing issues, suggestions and a score.
//!
//! Files are dispatched by extension to a [`FileFamily`]. Each family owns
//! an ordered table of rule categories; the universal categories run first
//! for every family. A category that fails is logged and contributes
//! nothing.

mod javascript;
mod others;
mod universal;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{FileReport, Issue, IssueKind, Suggestion, extension_of};
use crate::error::{Result, isolate};
use crate::inspector::language_name;
use crate::text::{split_lines, truncate_chars};

pub(crate) use universal::{is_commented_code, magic_number_literals};

/// Maximum number of characters kept in [`FileReport::content_preview`].
pub const PREVIEW_CHARS: usize = 500;

/// Closed set of language families with their own rule tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileFamily {
    /// `.html` and `.htm`.
    Html,
    /// JavaScript and TypeScript sources, with or without JSX.
    Script,
    /// `.py`.
    Python,
    /// `.php`.
    Php,
    /// `.sol`.
    Solidity,
    /// `.vue` single-file components.
    Vue,
    /// Anything else; universal checks only.
    Other,
}

impl FileFamily {
    /// Classify a file by its extension.
    pub fn from_file_name(file_name: &str) -> Self {
        match extension_of(file_name).as_str() {
            "html" | "htm" => Self::Html,
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => Self::Script,
            "py" => Self::Python,
            "php" => Self::Php,
            "sol" => Self::Solidity,
            "vue" => Self::Vue,
            _ => Self::Other,
        }
    }

    fn rules(self) -> &'static [(&'static str, Rule)] {
        match self {
            Self::Html => others::HTML_RULES,
            Self::Script => javascript::RULES,
            Self::Python => others::PYTHON_RULES,
            Self::Php => others::PHP_RULES,
            Self::Solidity => others::SOLIDITY_RULES,
            Self::Vue => others::VUE_RULES,
            Self::Other => &[],
        }
    }
}

/// One rule category: inspects the file and reports outcomes.
type Rule = fn(&FileContext<'_>) -> Result<Vec<Outcome>>;

/// Something a rule category reports.
#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Issue(Issue),
    Suggestion(Suggestion),
}

impl From<Issue> for Outcome {
    fn from(issue: Issue) -> Self {
        Self::Issue(issue)
    }
}

impl From<Suggestion> for Outcome {
    fn from(suggestion: Suggestion) -> Self {
        Self::Suggestion(suggestion)
    }
}

/// Read-only view of the file handed to every rule.
struct FileContext<'a> {
    content: &'a str,
    extension: String,
    lines: Vec<&'a str>,
}

impl<'a> FileContext<'a> {
    fn new(file_name: &str, content: &'a str) -> Self {
        Self {
            content,
            extension: extension_of(file_name),
            lines: split_lines(content),
        }
    }

    /// JSX-bearing file: `.jsx`/`.tsx`, or any script importing React.
    fn is_jsx_like(&self) -> bool {
        matches!(self.extension.as_str(), "jsx" | "tsx")
            || self.content.contains("from 'react'")
            || self.content.contains("from \"react\"")
    }
}

/// Analyze one file. Never fails; a broken rule category degrades to no findings.
pub fn analyze_file(file_name: &str, content: &str, file_type: &str) -> FileReport {
    let family = FileFamily::from_file_name(file_name);
    let context = FileContext::new(file_name, content);

    let mut issues = Vec::new();
    let mut suggestions: Vec<Suggestion> = Vec::new();
    let categories = universal::RULES.iter().chain(family.rules());
    for (category, rule) in categories {
        for outcome in isolate(category, || rule(&context)) {
            match outcome {
                Outcome::Issue(issue) => issues.push(issue),
                Outcome::Suggestion(suggestion) => {
                    if !suggestions.contains(&suggestion) {
                        suggestions.push(suggestion);
                    }
                }
            }
        }
    }

    let count = |kind: IssueKind| issues.iter().filter(|issue| issue.kind == kind).count();
    let error_count = count(IssueKind::Error);
    let warning_count = count(IssueKind::Warning);
    let info_count = count(IssueKind::Info);
    let quality_score = quality_score(error_count, warning_count, info_count);
    log::debug!(
        "analyzed {file_name} as {family:?}: {error_count} errors, {warning_count} warnings, score {quality_score}"
    );

    FileReport {
        file_name: file_name.to_string(),
        file_type: file_type.to_string(),
        lines: context.lines.len(),
        size: content.chars().count(),
        issues,
        suggestions,
        error_count,
        warning_count,
        info_count,
        quality_score,
        content_preview: truncate_chars(content, PREVIEW_CHARS).to_string(),
        language: language_name(file_name),
        deep_analysis: None,
    }
}

/// `max(0, 100 - (15 * errors + 5 * warnings + 2 * infos))`.
pub fn quality_score(errors: usize, warnings: usize, infos: usize) -> u8 {
    let penalty = 15 * errors + 5 * warnings + 2 * infos;
    100usize.saturating_sub(penalty) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FixKind;

    #[test]
    fn classifies_families_by_extension() {
        assert_eq!(FileFamily::from_file_name("index.HTML"), FileFamily::Html);
        assert_eq!(FileFamily::from_file_name("src/App.tsx"), FileFamily::Script);
        assert_eq!(FileFamily::from_file_name("main.py"), FileFamily::Python);
        assert_eq!(FileFamily::from_file_name("Token.sol"), FileFamily::Solidity);
        assert_eq!(FileFamily::from_file_name("README"), FileFamily::Other);
    }

    #[test]
    fn quality_score_weights_and_floor() {
        assert_eq!(quality_score(0, 0, 0), 100);
        assert_eq!(quality_score(1, 2, 3), 69);
        assert_eq!(quality_score(7, 0, 0), 0);
    }

    #[test]
    fn empty_file_is_perfect() {
        let report = analyze_file("empty.js", "", "application/javascript");
        assert_eq!(report.quality_score, 100);
        assert!(report.issues.is_empty());
        assert!(report.suggestions.is_empty());
        assert_eq!(report.lines, 1);
        assert_eq!(report.size, 0);
    }

    #[test]
    fn counts_and_preview() {
        let content = format!("var a = 1;\nconsole.log(a);\n// TODO tidy\n{}", "x".repeat(600));
        let report = analyze_file("app.js", &content, "js");
        assert_eq!(report.warning_count, 2);
        assert_eq!(report.info_count, 1);
        assert_eq!(report.quality_score, 88);
        assert_eq!(report.content_preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(report.language.as_deref(), Some("JavaScript"));
    }

    #[test]
    fn suggestions_are_deduplicated() {
        let content = "<img src=\"a.png\">\n<img src=\"b.png\">";
        let report = analyze_file("page.html", content, "text/html");
        let alt_suggestions = report
            .suggestions
            .iter()
            .filter(|s| s.fix_kind == Some(FixKind::AddAltAttributes))
            .count();
        assert_eq!(alt_suggestions, 1);
    }

    #[test]
    fn every_autofix_suggestion_is_tagged() {
        let content = "var x = 10;\nconsole.log(x);\nfor (let i = 0; i < 9; i++) { for (let j = 0; j < 9; j++) {} }";
        let report = analyze_file("loops.js", content, "js");
        assert!(!report.suggestions.is_empty());
        assert!(
            report
                .suggestions
                .iter()
                .filter(|s| s.auto_fix)
                .all(|s| s.fix_kind.is_some())
        );
    }
}
