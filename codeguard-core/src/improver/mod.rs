//! Auto-fix engine: applies rewrite rules for autofixable suggestions.
//!
//! Suggestions are applied in order, each rule seeing the previous rule's
//! output. Dispatch is on [`Suggestion::fix_kind`]; suggestions without a
//! tag fall back to [`FixKind::infer`].

mod rules;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{FixKind, Issue, Suggestion};
use crate::error::Result;
use crate::text::count_matches;

/// Reason recorded when no rule matches a suggestion.
pub const NO_APPLICABLE_FIX: &str = "No applicable fix found";

lazy_static! {
    static ref CONSOLE: Regex = Regex::new(r"console\.").unwrap();
    static ref VAR: Regex = Regex::new(r"\bvar\b").unwrap();
}

impl FixKind {
    /// Infer the rule for an untagged suggestion from its text.
    ///
    /// Checks run in a fixed order and the first match wins.
    pub fn infer(category: &str, message: &str, fix_code: Option<&str>) -> Option<FixKind> {
        let code = fix_code.unwrap_or_default();
        let mentions = |needle: &str| message.contains(needle) || code.contains(needle);

        if code.contains("console.log") {
            Some(Self::RemoveConsoleLogs)
        } else if code.contains("var with const/let") {
            Some(Self::ReplaceVar)
        } else if category == "syntax" && message.contains("semicolon") {
            Some(Self::AddSemicolons)
        } else if category == "formatting" {
            Some(Self::TrimTrailingWhitespace)
        } else if message.contains("indentation") {
            Some(Self::FixIndentation)
        } else if message.contains("unused import") || message.contains("Unused import") {
            Some(Self::RemoveUnusedImports)
        } else if message.contains("key") {
            Some(Self::AddMissingKeys)
        } else if code.contains("viewport meta tag") {
            Some(Self::AddViewportMeta)
        } else if message.contains("Commented out code") {
            Some(Self::RemoveCommentedCode)
        } else if mentions("alt") || message.contains("Image missing") {
            Some(Self::AddAltAttributes)
        } else if message.contains("Deprecated") || code.contains("deprecated") {
            Some(Self::ReplaceDeprecatedTags)
        } else if mentions("DOCTYPE") {
            Some(Self::AddDoctype)
        } else if message.contains("Inline styles") || code.contains("inline styles") {
            Some(Self::ExtractInlineStyles)
        } else if message.contains("Nested loops") || code.contains("nested loops") {
            Some(Self::AnnotateNestedLoops)
        } else if message.contains("Magic numbers") || code.contains("magic numbers") {
            Some(Self::ExtractMagicNumbers)
        } else if message.contains("Missing React import") || code.contains("React import") {
            Some(Self::AddReactImport)
        } else if mentions("charset") {
            Some(Self::AddCharsetMeta)
        } else if mentions("lang attribute") {
            Some(Self::AddHtmlLang)
        } else if mentions("trailing slash") {
            Some(Self::StripVoidSlash)
        } else {
            None
        }
    }
}

/// A suggestion whose rewrite rule ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFix {
    /// Suggestion category.
    #[serde(rename = "type")]
    pub category: String,
    /// Suggestion message.
    pub message: String,
    /// Suggestion rule hint, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_code: Option<String>,
    /// Rule that ran.
    pub fix_kind: FixKind,
}

/// An autofixable suggestion that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedFix {
    /// Suggestion category.
    #[serde(rename = "type")]
    pub category: String,
    /// Suggestion message.
    pub message: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Before/after measurements of an improvement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementMetrics {
    /// Line positions whose text differs, counting positions past either end.
    pub lines_changed: usize,
    /// Drop in `console.` occurrences.
    pub consoles_removed: i64,
    /// Drop in `var` keyword occurrences.
    pub vars_replaced: i64,
    /// Original minus improved character count.
    pub size_reduction: i64,
    /// Size reduction as a percentage of the original, two decimals.
    pub size_reduction_percent: f64,
    /// Original line count.
    pub original_lines: usize,
    /// Improved line count.
    pub improved_lines: usize,
    /// Original character count.
    pub original_size: usize,
    /// Improved character count.
    pub improved_size: usize,
}

impl ImprovementMetrics {
    /// Compare two versions of a text.
    pub fn between(original: &str, improved: &str) -> Self {
        let before: Vec<&str> = original.split('\n').collect();
        let after: Vec<&str> = improved.split('\n').collect();
        let lines_changed = (0..before.len().max(after.len()))
            .filter(|&index| before.get(index) != after.get(index))
            .count();

        let original_size = original.chars().count();
        let improved_size = improved.chars().count();
        let size_reduction = original_size as i64 - improved_size as i64;
        let size_reduction_percent = if original_size == 0 {
            0.0
        } else {
            ((size_reduction as f64 / original_size as f64) * 10_000.0).round() / 100.0
        };
        let drop = |pattern: &Regex| {
            count_matches(original, pattern) as i64 - count_matches(improved, pattern) as i64
        };

        Self {
            lines_changed,
            consoles_removed: drop(&CONSOLE),
            vars_replaced: drop(&VAR),
            size_reduction,
            size_reduction_percent,
            original_lines: before.len(),
            improved_lines: after.len(),
            original_size,
            improved_size,
        }
    }
}

/// Output of [`improve_code`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementResult {
    /// Rewritten text.
    pub improved_code: String,
    /// Suggestions whose rule ran, in order.
    pub applied_fixes: Vec<AppliedFix>,
    /// Autofixable suggestions that were not applied.
    pub skipped_fixes: Vec<SkippedFix>,
    /// Before/after measurements.
    pub metrics: ImprovementMetrics,
    /// `improved_code != original`.
    pub has_changes: bool,
}

/// Apply every autofixable suggestion to `original` in order.
///
/// `issues` is accepted for interface parity with the analyzers and is not
/// consulted.
pub fn improve_code(
    file_name: &str,
    original: &str,
    suggestions: &[Suggestion],
    _issues: &[Issue],
) -> ImprovementResult {
    let mut improved = original.to_string();
    let mut applied_fixes = Vec::new();
    let mut skipped_fixes = Vec::new();

    for suggestion in suggestions.iter().filter(|suggestion| suggestion.auto_fix) {
        let kind = suggestion.fix_kind.or_else(|| {
            FixKind::infer(
                &suggestion.category,
                &suggestion.message,
                suggestion.fix_code.as_deref(),
            )
        });
        let skip = |reason: String| SkippedFix {
            category: suggestion.category.clone(),
            message: suggestion.message.clone(),
            reason,
        };
        let Some(kind) = kind else {
            skipped_fixes.push(skip(NO_APPLICABLE_FIX.to_string()));
            continue;
        };
        match apply_fix(&improved, kind, file_name) {
            Ok(rewritten) => {
                log::debug!("applied {kind} to {file_name}");
                improved = rewritten;
                applied_fixes.push(AppliedFix {
                    category: suggestion.category.clone(),
                    message: suggestion.message.clone(),
                    fix_code: suggestion.fix_code.clone(),
                    fix_kind: kind,
                });
            }
            Err(err) => {
                log::warn!("{kind} failed on {file_name}: {err}");
                skipped_fixes.push(skip(err.to_string()));
            }
        }
    }

    let metrics = ImprovementMetrics::between(original, &improved);
    ImprovementResult {
        has_changes: improved != original,
        improved_code: improved,
        applied_fixes,
        skipped_fixes,
        metrics,
    }
}

/// Run one rewrite rule over `code`.
pub fn apply_fix(code: &str, kind: FixKind, file_name: &str) -> Result<String> {
    let rule: fn(&str, &str) -> Result<String> = match kind {
        FixKind::RemoveConsoleLogs => rules::remove_console_logs,
        FixKind::ReplaceVar => rules::replace_var,
        FixKind::AddSemicolons => rules::add_semicolons,
        FixKind::TrimTrailingWhitespace => rules::trim_trailing_whitespace,
        FixKind::FixIndentation => rules::fix_indentation,
        FixKind::RemoveUnusedImports => rules::remove_unused_imports,
        FixKind::AddMissingKeys => rules::add_missing_keys,
        FixKind::AddViewportMeta => rules::add_viewport_meta,
        FixKind::RemoveCommentedCode => rules::remove_commented_code,
        FixKind::AddAltAttributes => rules::add_alt_attributes,
        FixKind::ReplaceDeprecatedTags => rules::replace_deprecated_tags,
        FixKind::AddDoctype => rules::add_doctype,
        FixKind::ExtractInlineStyles => rules::extract_inline_styles,
        FixKind::AnnotateNestedLoops => rules::annotate_nested_loops,
        FixKind::ExtractMagicNumbers => rules::extract_magic_numbers,
        FixKind::AddReactImport => rules::add_react_import,
        FixKind::AddCharsetMeta => rules::add_charset_meta,
        FixKind::AddHtmlLang => rules::add_html_lang,
        FixKind::StripVoidSlash => rules::strip_void_slash,
    };
    rule(code, file_name)
}

/// An autofixable suggestion requesting exactly `kind`.
pub fn fix_suggestion(kind: FixKind) -> Suggestion {
    Suggestion::new("manual", kind.id()).with_fix(kind, kind.id())
}

/// Classification of one line in a [`LineComparison`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Same text on both sides.
    Unchanged,
    /// Both sides have the line, with different text.
    Modified,
    /// Only the improved text has the line.
    Added,
    /// Only the original text has the line.
    Removed,
}

/// One line-index position of a side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineComparison {
    /// 1-based position.
    pub line_number: usize,
    /// Original text, empty past its end.
    pub original: String,
    /// Improved text, empty past its end.
    pub improved: String,
    /// Whether the two sides differ.
    pub is_different: bool,
    /// Classification.
    pub change_type: ChangeType,
}

/// Align two texts by line index and classify every position.
pub fn generate_code_comparison(original: &str, improved: &str) -> Vec<LineComparison> {
    let before: Vec<&str> = original.split('\n').collect();
    let after: Vec<&str> = improved.split('\n').collect();

    (0..before.len().max(after.len()))
        .map(|index| {
            let (old, new) = (before.get(index), after.get(index));
            let change_type = match (old, new) {
                (None, _) => ChangeType::Added,
                (_, None) => ChangeType::Removed,
                (Some(old), Some(new)) if old != new => ChangeType::Modified,
                _ => ChangeType::Unchanged,
            };
            LineComparison {
                line_number: index + 1,
                original: old.map(|line| line.to_string()).unwrap_or_default(),
                improved: new.map(|line| line.to_string()).unwrap_or_default(),
                is_different: change_type != ChangeType::Unchanged,
                change_type,
            }
        })
        .collect()
}

/// Name for the improved copy of a file: `a/b.jsx` becomes `a/b.improved.jsx`.
pub fn improved_file_name(file_name: &str) -> String {
    let base_start = file_name.rfind(['/', '\\']).map_or(0, |index| index + 1);
    match file_name[base_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = base_start + dot;
            format!("{}.improved{}", &file_name[..dot], &file_name[dot..])
        }
        _ => format!("{file_name}.improved"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(category: &str, message: &str, fix_code: Option<&str>) -> Suggestion {
        Suggestion {
            category: category.to_string(),
            message: message.to_string(),
            auto_fix: true,
            fix_code: fix_code.map(str::to_string),
            impact: None,
            fix_kind: None,
        }
    }

    #[test]
    fn infer_follows_legacy_priority() {
        assert_eq!(
            FixKind::infer("best-practice", "Remove console.log", Some("Remove console.log statements")),
            Some(FixKind::RemoveConsoleLogs)
        );
        assert_eq!(
            FixKind::infer("syntax", "Missing semicolon", None),
            Some(FixKind::AddSemicolons)
        );
        assert_eq!(
            FixKind::infer("formatting", "anything", None),
            Some(FixKind::TrimTrailingWhitespace)
        );
        assert_eq!(
            FixKind::infer("accessibility", "Image missing alt attribute", Some("Add alt attribute")),
            Some(FixKind::AddAltAttributes)
        );
        assert_eq!(
            FixKind::infer("html", "Missing DOCTYPE", Some("Add DOCTYPE")),
            Some(FixKind::AddDoctype)
        );
        assert_eq!(FixKind::infer("unknown", "Some unknown issue", None), None);
    }

    #[test]
    fn untagged_suggestions_are_inferred() {
        let suggestions = vec![legacy(
            "best-practice",
            "Replace var with const/let",
            Some("Replace var with const/let"),
        )];
        let result = improve_code("test.js", "var x = 10;\nvar y = 20;", &suggestions, &[]);
        assert_eq!(result.improved_code, "let x = 10;\nlet y = 20;");
        assert_eq!(result.applied_fixes[0].fix_kind, FixKind::ReplaceVar);
        assert_eq!(result.metrics.vars_replaced, 2);
        assert_eq!(result.metrics.lines_changed, 2);
    }

    #[test]
    fn unmatched_suggestions_are_skipped() {
        let suggestions = vec![
            legacy("unknown", "Some unknown issue", None),
            Suggestion::new("style", "manual only"),
        ];
        let result = improve_code("test.js", "const x = 10;", &suggestions, &[]);
        assert!(!result.has_changes);
        assert_eq!(result.skipped_fixes.len(), 1);
        assert_eq!(result.skipped_fixes[0].reason, NO_APPLICABLE_FIX);
    }

    #[test]
    fn fixes_compose_in_order() {
        let suggestions = vec![
            fix_suggestion(FixKind::RemoveConsoleLogs),
            fix_suggestion(FixKind::ReplaceVar),
        ];
        let original = "console.log('test');\nvar x = 10;";
        let result = improve_code("test.js", original, &suggestions, &[]);
        assert_eq!(result.improved_code, "let x = 10;");
        assert_eq!(result.metrics.consoles_removed, 1);
        assert_eq!(result.metrics.vars_replaced, 1);
        assert_eq!(result.metrics.original_lines, 2);
        assert_eq!(result.metrics.improved_lines, 1);
        assert_eq!(result.metrics.lines_changed, 2);
        assert_eq!(result.metrics.size_reduction, 21);
        assert!(result.has_changes);
    }

    #[test]
    fn size_percent_is_zero_for_empty_input() {
        let metrics = ImprovementMetrics::between("", "<!DOCTYPE html>\n");
        assert_eq!(metrics.size_reduction_percent, 0.0);
        assert_eq!(metrics.size_reduction, -16);
    }

    #[test]
    fn comparison_classifies_by_position() {
        let rows = generate_code_comparison("a\nb\nc", "a\nB");
        let kinds: Vec<ChangeType> = rows.iter().map(|row| row.change_type).collect();
        assert_eq!(
            kinds,
            vec![ChangeType::Unchanged, ChangeType::Modified, ChangeType::Removed]
        );
        assert_eq!(rows[2].improved, "");

        let grown = generate_code_comparison("a", "a\nb");
        assert_eq!(grown[1].change_type, ChangeType::Added);
        assert!(grown[1].is_different);
    }

    #[test]
    fn improved_names_keep_the_extension() {
        assert_eq!(improved_file_name("a/b.jsx"), "a/b.improved.jsx");
        assert_eq!(improved_file_name("index.html"), "index.improved.html");
        assert_eq!(improved_file_name("v1.2/Makefile"), "v1.2/Makefile.improved");
        assert_eq!(improved_file_name(".env"), ".env.improved");
    }
}
