#![deny(missing_docs)]
//! CodeGuard core library.
//!
//! Heuristic analysis, validation, page-speed scoring and automatic fixes for
//! web and scripting sources. Everything here is pure text processing; the
//! CLI and the HTTP server are thin shells over these entry points.

pub mod analyzer;
pub mod deep;
pub mod domain;
pub mod error;
pub mod fs;
pub mod html;
pub mod improver;
pub mod inspector;
pub mod performance;
pub mod report;
mod text;

pub use analyzer::{FileFamily, analyze_file, quality_score};
pub use deep::{DeepAnalysisResult, analyze_dependencies, perform_deep_analysis};
pub use domain::{
    FileReport, FixKind, Issue, IssueKind, LanguageDistribution, ProjectReport, ProjectStatus,
    ProjectSummary, SourceFile, Suggestion,
};
pub use error::{CodeGuardError, Result};
pub use fs::{FileSystem, LoadOptions, LoadedSources, StdFileSystem, load_sources};
pub use html::{ValidationResult, W3cReport, generate_w3c_report, validate_html};
pub use improver::{
    ChangeType, ImprovementResult, LineComparison, apply_fix, fix_suggestion, generate_code_comparison,
    improve_code, improved_file_name,
};
pub use inspector::TokeiInspector;
pub use performance::{PerformanceReport, analyze_performance};
pub use report::{
    analyze_project, format_language_stats, render_improvement_markdown, render_json,
    render_performance_markdown, render_project_markdown, render_validation_markdown, summarize,
};
