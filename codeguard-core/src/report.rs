//! Project aggregation and report rendering.

use std::fmt::Write;

use rayon::prelude::*;
use serde::Serialize;

use crate::analyzer::{FileFamily, analyze_file};
use crate::deep::{analyze_dependencies, perform_deep_analysis_with};
use crate::domain::{
    FileReport, LanguageDistribution, ProjectReport, ProjectStatus, ProjectSummary, SourceFile,
};
use crate::html::{ValidationFinding, W3cReport};
use crate::improver::{ChangeType, ImprovementResult, LineComparison};
use crate::inspector::TokeiInspector;
use crate::performance::PerformanceReport;

/// Analyze every file and aggregate a project report.
///
/// Files are analyzed in parallel. Script and Vue files also get a deep
/// analysis; with more than one file the dependency graph is computed once
/// from the whole set and shared.
pub fn analyze_project(files: &[SourceFile]) -> ProjectReport {
    let dependencies = (files.len() > 1).then(|| analyze_dependencies(files));

    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|file| {
            let mut report = analyze_file(&file.file_name, &file.content, &file.file_type);
            if has_deep_analysis(&file.file_name) {
                report.deep_analysis = Some(perform_deep_analysis_with(
                    &file.content,
                    &file.file_name,
                    dependencies.as_ref(),
                ));
            }
            report
        })
        .collect();

    let language_stats = TokeiInspector::new().distribution(files);
    ProjectReport {
        total_files: reports.len(),
        summary: summarize(&reports, language_stats),
        files: reports,
    }
}

fn has_deep_analysis(file_name: &str) -> bool {
    matches!(
        FileFamily::from_file_name(file_name),
        FileFamily::Script | FileFamily::Vue
    )
}

/// Totals, rounded mean score and verdict over per-file reports.
///
/// An empty project averages 100 and passes.
pub fn summarize(files: &[FileReport], language_stats: LanguageDistribution) -> ProjectSummary {
    let total_errors = files.iter().map(|file| file.error_count).sum();
    let total_warnings = files.iter().map(|file| file.warning_count).sum();
    let total_lines = files.iter().map(|file| file.lines).sum();
    let average_quality_score = if files.is_empty() {
        100
    } else {
        let total: f64 = files.iter().map(|file| f64::from(file.quality_score)).sum();
        (total / files.len() as f64).round() as u8
    };

    ProjectSummary {
        total_errors,
        total_warnings,
        average_quality_score,
        total_lines,
        status: if total_errors == 0 {
            ProjectStatus::Passed
        } else {
            ProjectStatus::Failed
        },
        language_stats,
    }
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Language stats sorted by descending percentage.
pub fn format_language_stats(stats: &LanguageDistribution) -> Vec<(String, f64)> {
    let mut items: Vec<(String, f64)> = stats.iter().map(|(k, v)| (k.clone(), *v)).collect();
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    items
}

/// Render a project report as Markdown.
pub fn render_project_markdown(report: &ProjectReport) -> String {
    let summary = &report.summary;
    let mut output = String::new();
    let _ = writeln!(output, "# CodeGuard Analysis Report\n");
    let _ = writeln!(output, "- Files: {}", report.total_files);
    let _ = writeln!(output, "- Status: {}", status_label(summary.status));
    let _ = writeln!(output, "- Average quality score: {}/100", summary.average_quality_score);
    let _ = writeln!(output, "- Errors: {}", summary.total_errors);
    let _ = writeln!(output, "- Warnings: {}", summary.total_warnings);
    let _ = writeln!(output, "- Lines: {}\n", summary.total_lines);
    append_language_stats(&mut output, &summary.language_stats);

    for file in &report.files {
        let _ = writeln!(output, "## {}\n", file.file_name);
        let _ = writeln!(
            output,
            "- Score: {}/100 ({} errors, {} warnings, {} info)",
            file.quality_score, file.error_count, file.warning_count, file.info_count
        );
        if let Some(language) = &file.language {
            let _ = writeln!(output, "- Language: {language}");
        }
        if let Some(deep) = &file.deep_analysis {
            let _ = writeln!(output, "- Deep analysis score: {}/100", deep.overall_score);
            if let Some(dependencies) = &deep.dependencies {
                for cycle in &dependencies.circular_dependencies {
                    let _ = writeln!(output, "- {}", cycle.message);
                }
            }
        }
        let _ = writeln!(output);

        if file.issues.is_empty() {
            let _ = writeln!(output, "### Issues\nNo issues found.\n");
        } else {
            let _ = writeln!(output, "### Issues");
            for issue in &file.issues {
                let _ = writeln!(
                    output,
                    "- [{:?}] line {}: {} (`{}`)",
                    issue.kind, issue.line, issue.message, issue.code
                );
            }
            let _ = writeln!(output);
        }

        if !file.suggestions.is_empty() {
            let _ = writeln!(output, "### Suggestions");
            for suggestion in &file.suggestions {
                let marker = if suggestion.auto_fix { " (auto-fix)" } else { "" };
                let _ = writeln!(
                    output,
                    "- {}: {}{marker}",
                    suggestion.category, suggestion.message
                );
            }
            let _ = writeln!(output);
        }
    }
    output
}

/// Render a W3C report as Markdown.
pub fn render_validation_markdown(report: &W3cReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {} Report: {}\n", report.validator, report.file_name);
    let _ = writeln!(output, "- Score: {}/100", report.score);
    let _ = writeln!(output, "- {}\n", report.summary.message);
    append_findings(&mut output, "Errors", &report.errors);
    append_findings(&mut output, "Warnings", &report.warnings);
    append_findings(&mut output, "Suggestions", &report.suggestions);
    output
}

/// Render a performance report as Markdown.
pub fn render_performance_markdown(file_name: &str, report: &PerformanceReport) -> String {
    let metrics = &report.metrics;
    let mut output = String::new();
    let _ = writeln!(output, "# Page Speed Report: {file_name}\n");
    let _ = writeln!(output, "- Desktop score: {}/100", report.desktop_score);
    let _ = writeln!(output, "- Mobile score: {}/100\n", report.mobile_score);
    let _ = writeln!(output, "### Simulated metrics");
    let _ = writeln!(output, "- LCP: {:.2}s", metrics.lcp);
    let _ = writeln!(output, "- TBT: {}ms", metrics.tbt);
    let _ = writeln!(output, "- CLS: {:.2}", metrics.cls);
    let _ = writeln!(output, "- Speed Index: {:.2}s\n", metrics.speed_index);
    if report.issues.is_empty() {
        let _ = writeln!(output, "### Opportunities\nNo issues found.\n");
        return output;
    }
    let _ = writeln!(output, "### Opportunities");
    for issue in &report.issues {
        let _ = writeln!(
            output,
            "- [{:?}] {}: {}",
            issue.impact, issue.title, issue.description
        );
    }
    let _ = writeln!(output);
    output
}

/// Render an improvement result as Markdown, optionally with its line comparison.
pub fn render_improvement_markdown(
    file_name: &str,
    result: &ImprovementResult,
    comparison: Option<&[LineComparison]>,
) -> String {
    let metrics = &result.metrics;
    let mut output = String::new();
    let _ = writeln!(output, "# Code Improvement: {file_name}\n");
    let _ = writeln!(output, "- Lines changed: {}", metrics.lines_changed);
    let _ = writeln!(output, "- Console calls removed: {}", metrics.consoles_removed);
    let _ = writeln!(output, "- `var` declarations replaced: {}", metrics.vars_replaced);
    let _ = writeln!(
        output,
        "- Size: {} -> {} chars ({}%)\n",
        metrics.original_size, metrics.improved_size, metrics.size_reduction_percent
    );

    if result.applied_fixes.is_empty() {
        let _ = writeln!(output, "### Applied fixes\nNo fixes applied.\n");
    } else {
        let _ = writeln!(output, "### Applied fixes");
        for fix in &result.applied_fixes {
            let _ = writeln!(output, "- [{}] {}", fix.fix_kind, fix.message);
        }
        let _ = writeln!(output);
    }
    if !result.skipped_fixes.is_empty() {
        let _ = writeln!(output, "### Skipped fixes");
        for fix in &result.skipped_fixes {
            let _ = writeln!(output, "- {} ({})", fix.message, fix.reason);
        }
        let _ = writeln!(output);
    }

    if let Some(rows) = comparison {
        let _ = writeln!(output, "### Changes\n```diff");
        for row in rows.iter().filter(|row| row.is_different) {
            match row.change_type {
                ChangeType::Added => {
                    let _ = writeln!(output, "+ {}", row.improved);
                }
                ChangeType::Removed => {
                    let _ = writeln!(output, "- {}", row.original);
                }
                ChangeType::Modified => {
                    let _ = writeln!(output, "- {}\n+ {}", row.original, row.improved);
                }
                ChangeType::Unchanged => {}
            }
        }
        let _ = writeln!(output, "```\n");
    }
    output
}

fn status_label(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Passed => "passed",
        ProjectStatus::Failed => "failed",
    }
}

fn append_language_stats(output: &mut String, stats: &LanguageDistribution) {
    if stats.is_empty() {
        let _ = writeln!(output, "### Languages\nNo languages detected.\n");
        return;
    }
    let _ = writeln!(output, "### Languages");
    for (language, percent) in format_language_stats(stats) {
        let _ = writeln!(output, "- {language}: {percent:.2}%");
    }
    let _ = writeln!(output);
}

fn append_findings(output: &mut String, title: &str, findings: &[ValidationFinding]) {
    if findings.is_empty() {
        let _ = writeln!(output, "### {title}\nNone.\n");
        return;
    }
    let _ = writeln!(output, "### {title}");
    for finding in findings {
        let _ = writeln!(
            output,
            "- line {} [{}] {}: {}",
            finding.line, finding.category, finding.message, finding.suggestion
        );
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Issue, Suggestion};
    use crate::html::generate_w3c_report;
    use crate::improver::{generate_code_comparison, improve_code};
    use crate::performance::analyze_performance;
    use std::collections::BTreeMap;

    fn file_report(name: &str, errors: usize, score: u8) -> FileReport {
        FileReport {
            file_name: name.to_string(),
            file_type: "js".to_string(),
            lines: 10,
            size: 100,
            issues: (0..errors)
                .map(|line| Issue::error(line + 1, "broken", "BROKEN"))
                .collect(),
            suggestions: vec![Suggestion::new("style", "tidy up")],
            error_count: errors,
            warning_count: 1,
            info_count: 0,
            quality_score: score,
            content_preview: String::new(),
            language: None,
            deep_analysis: None,
        }
    }

    #[test]
    fn summarize_totals_and_verdict() {
        let files = vec![file_report("a.js", 2, 65), file_report("b.js", 0, 96)];
        let summary = summarize(&files, BTreeMap::new());
        assert_eq!(summary.total_errors, 2);
        assert_eq!(summary.total_warnings, 2);
        assert_eq!(summary.total_lines, 20);
        assert_eq!(summary.average_quality_score, 81);
        assert_eq!(summary.status, ProjectStatus::Failed);
    }

    #[test]
    fn empty_project_passes() {
        let report = analyze_project(&[]);
        assert_eq!(report.total_files, 0);
        assert_eq!(report.summary.average_quality_score, 100);
        assert_eq!(report.summary.status, ProjectStatus::Passed);
    }

    #[test]
    fn project_attaches_deep_analysis_to_scripts() {
        let files = vec![
            SourceFile::new("a.js", "import { b } from './b';\nexport const a = () => b();"),
            SourceFile::new("b.js", "import { a } from './a';\nexport const b = () => a();"),
            SourceFile::new("index.html", "<!DOCTYPE html>"),
        ];
        let report = analyze_project(&files);
        assert_eq!(report.total_files, 3);
        let deep = report.files[0].deep_analysis.as_ref().expect("deep analysis");
        let dependencies = deep.dependencies.as_ref().expect("dependencies");
        assert_eq!(dependencies.circular_dependencies.len(), 1);
        assert!(report.files[2].deep_analysis.is_none());
        assert!(!report.summary.language_stats.is_empty());
    }

    #[test]
    fn renders_project_markdown() {
        let mut stats = BTreeMap::new();
        stats.insert("JavaScript".to_string(), 100.0);
        let files = vec![file_report("a.js", 1, 80)];
        let report = ProjectReport {
            total_files: 1,
            summary: summarize(&files, stats),
            files,
        };
        let output = render_project_markdown(&report);
        assert!(output.contains("# CodeGuard Analysis Report"));
        assert!(output.contains("- Status: failed"));
        assert!(output.contains("JavaScript: 100.00%"));
        assert!(output.contains("[Error] line 1: broken (`BROKEN`)"));
        assert!(output.contains("- style: tidy up"));
    }

    #[test]
    fn renders_validation_markdown() {
        let report = generate_w3c_report("<html><body></body></html>", "page.html");
        let output = render_validation_markdown(&report);
        assert!(output.contains("W3C HTML Validator Report: page.html"));
        assert!(output.contains("Missing DOCTYPE declaration"));
    }

    #[test]
    fn renders_performance_markdown() {
        let report = analyze_performance("<img src=\"a.png\">", "page.html");
        let output = render_performance_markdown("page.html", &report);
        assert!(output.contains("Desktop score"));
        assert!(output.contains("Missing viewport meta tag"));
    }

    #[test]
    fn renders_improvement_markdown_with_changes() {
        let original = "var x = 1;";
        let suggestions = vec![crate::improver::fix_suggestion(
            crate::domain::FixKind::ReplaceVar,
        )];
        let result = improve_code("a.js", original, &suggestions, &[]);
        let rows = generate_code_comparison(original, &result.improved_code);
        let output = render_improvement_markdown("a.js", &result, Some(&rows));
        assert!(output.contains("[replace-var]"));
        assert!(output.contains("- var x = 1;\n+ let x = 1;"));
    }

    #[test]
    fn renders_json_payload() {
        let report = analyze_project(&[SourceFile::new("a.js", "var a = 1;")]);
        let json = render_json(&report).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["summary"]["status"], "passed");
        assert_eq!(parsed["totalFiles"], 1);
        let issues = parsed["files"][0]["issues"].as_array().expect("issues");
        assert!(issues.iter().any(|issue| issue["type"] == "warning"));
    }

    #[test]
    fn formats_language_stats_sorted() {
        let mut stats = BTreeMap::new();
        stats.insert("Python".to_string(), 10.0);
        stats.insert("JavaScript".to_string(), 30.0);
        let ordered = format_language_stats(&stats);
        assert_eq!(ordered[0].0, "JavaScript");
    }
}
