#![deny(missing_docs)]
//! CodeGuard command-line interface.
//!
//! Analyzes projects, validates HTML, scores page speed and applies
//! automatic fixes to files on disk.

use clap::{Args, Parser, Subcommand, ValueEnum};
use codeguard_core::fs::{DEFAULT_MAX_FILE_SIZE, SkippedSource};
use codeguard_core::{
    FixKind, ImprovementResult, IssueKind, LineComparison, LoadOptions, PerformanceReport,
    ProjectReport, ProjectStatus, SourceFile, StdFileSystem, W3cReport, analyze_file,
    analyze_performance, analyze_project, fix_suggestion, format_language_stats,
    generate_code_comparison, generate_w3c_report, improve_code, improved_file_name,
    load_sources, render_improvement_markdown, render_json, render_performance_markdown,
    render_project_markdown, render_validation_markdown,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "codeguard", version, about = "CodeGuard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct LoadArgs {
    /// Maximum number of projects or files processed concurrently.
    #[arg(short = 'j', long, env = "CODEGUARD_CONCURRENCY", default_value_t = 5)]
    concurrency: usize,
    /// Skip files larger than this many bytes.
    #[arg(long, env = "CODEGUARD_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Args, Clone)]
struct ImproveArgs {
    /// File to improve.
    file: PathBuf,
    /// Fix IDs to apply instead of the analyzer's suggestions (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    fix: Vec<String>,
    /// Write the result next to the input as `<name>.improved.<ext>`.
    #[arg(long)]
    write: bool,
    /// Include a line-by-line comparison.
    #[arg(long)]
    diff: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze files or project directories.
    Analyze {
        /// Files or directories; each one is reported as its own project.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Exit with an error when any project fails.
        #[arg(long)]
        fail_on_error: bool,
        #[command(flatten)]
        load: LoadArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Validate HTML documents against structural and accessibility rules.
    Validate {
        /// HTML files to validate.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        load: LoadArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Score files for page-speed problems.
    Speed {
        /// Files to score.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        load: LoadArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Apply automatic fixes to a file.
    Improve {
        #[command(flatten)]
        improve: ImproveArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            paths,
            fail_on_error,
            load,
            report,
        } => run_analyze(paths, load, report, fail_on_error).await?,
        Commands::Validate {
            files,
            load,
            report,
        } => {
            let runs = run_files(files, &load, generate_w3c_report).await?;
            emit_validation_runs(&runs, &report).await?
        }
        Commands::Speed {
            files,
            load,
            report,
        } => {
            let runs = run_files(files, &load, analyze_performance).await?;
            emit_performance_runs(&runs, &report).await?
        }
        Commands::Improve { improve, report } => {
            let run = run_improve(improve).await?;
            emit_improvement(&run, &report).await?
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

/// Analysis of one root passed to `analyze`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRun {
    root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ProjectReport>,
    skipped: Vec<SkippedSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ProjectRun {
    fn failed(root: PathBuf, error: String) -> Self {
        Self {
            root,
            report: None,
            skipped: Vec::new(),
            error: Some(error),
        }
    }

    fn has_errors(&self) -> bool {
        match &self.report {
            Some(report) => report.summary.status == ProjectStatus::Failed,
            None => true,
        }
    }
}

/// One file-level check (`validate`, `speed`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileRun<T> {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> FileRun<T> {
    fn failed(path: PathBuf, error: String) -> Self {
        Self {
            path,
            report: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImprovementRun {
    path: PathBuf,
    result: ImprovementResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Vec<LineComparison>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    written: Option<PathBuf>,
}

async fn run_analyze(
    paths: Vec<PathBuf>,
    load: LoadArgs,
    report: OutputArgs,
    fail_on_error: bool,
) -> CliResult<()> {
    let runs = analyze_roots(paths, &load).await?;
    emit_project_runs(&runs, &report).await?;
    if fail_on_error && runs.iter().any(ProjectRun::has_errors) {
        return Err("analysis reported errors".into());
    }
    Ok(())
}

async fn analyze_roots(roots: Vec<PathBuf>, load: &LoadArgs) -> CliResult<Vec<ProjectRun>> {
    let options = LoadOptions {
        max_file_size: load.max_file_size,
    };
    let semaphore = Arc::new(Semaphore::new(load.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for root in roots {
        let permit = semaphore.clone().acquire_owned().await?;
        tasks.spawn(async move {
            let _permit = permit;
            analyze_root(root, options).await
        });
    }

    let mut runs = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(run) => runs.push(run),
            Err(err) => runs.push(ProjectRun::failed(PathBuf::new(), err.to_string())),
        }
    }
    runs.sort_by(|a, b| a.root.cmp(&b.root));
    Ok(runs)
}

async fn analyze_root(root: PathBuf, options: LoadOptions) -> ProjectRun {
    let task_root = root.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let loaded = load_sources(&StdFileSystem, std::slice::from_ref(&task_root), &options)?;
        log::info!(
            "analyzing {} files under {} ({} skipped)",
            loaded.files.len(),
            task_root.display(),
            loaded.skipped.len()
        );
        let report = analyze_project(&loaded.files);
        Ok::<_, codeguard_core::CodeGuardError>((report, loaded.skipped))
    })
    .await;

    match outcome {
        Ok(Ok((report, skipped))) => ProjectRun {
            root,
            report: Some(report),
            skipped,
            error: None,
        },
        Ok(Err(err)) => ProjectRun::failed(root, err.to_string()),
        Err(err) => ProjectRun::failed(root, err.to_string()),
    }
}

async fn run_files<T, F>(paths: Vec<PathBuf>, load: &LoadArgs, check: F) -> CliResult<Vec<FileRun<T>>>
where
    T: Send + 'static,
    F: Fn(&str, &str) -> T + Copy + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(load.concurrency.max(1)));
    let max_file_size = load.max_file_size;
    let mut tasks = JoinSet::new();

    for path in paths {
        let permit = semaphore.clone().acquire_owned().await?;
        tasks.spawn(async move {
            let _permit = permit;
            match read_source(&path, max_file_size).await {
                Ok(content) => {
                    let report = check(&content, &file_name_of(&path));
                    FileRun {
                        path,
                        report: Some(report),
                        error: None,
                    }
                }
                Err(err) => FileRun::failed(path, err.to_string()),
            }
        });
    }

    let mut runs = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(run) => runs.push(run),
            Err(err) => runs.push(FileRun::failed(PathBuf::new(), err.to_string())),
        }
    }
    runs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(runs)
}

async fn read_source(path: &Path, max_file_size: u64) -> CliResult<String> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > max_file_size {
        return Err(format!(
            "{} is {} bytes, above the {max_file_size} byte limit",
            path.display(),
            metadata.len()
        )
        .into());
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

fn file_name_of(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

async fn run_improve(args: ImproveArgs) -> CliResult<ImprovementRun> {
    let content = tokio::fs::read_to_string(&args.file).await?;
    let source = SourceFile::new(file_name_of(&args.file), content);

    let (suggestions, issues) = if args.fix.is_empty() {
        let analysis = analyze_file(&source.file_name, &source.content, &source.file_type);
        (analysis.suggestions, analysis.issues)
    } else {
        let kinds = parse_fix_kinds(&args.fix)?;
        (kinds.into_iter().map(fix_suggestion).collect(), Vec::new())
    };

    let result = improve_code(&source.file_name, &source.content, &suggestions, &issues);
    let comparison = args
        .diff
        .then(|| generate_code_comparison(&source.content, &result.improved_code));

    let written = if args.write && result.has_changes {
        let target = PathBuf::from(improved_file_name(&source.file_name));
        tokio::fs::write(&target, &result.improved_code).await?;
        log::info!("wrote {}", target.display());
        Some(target)
    } else {
        None
    };

    Ok(ImprovementRun {
        path: args.file,
        result,
        comparison,
        written,
    })
}

fn parse_fix_kinds(ids: &[String]) -> CliResult<Vec<FixKind>> {
    let mut kinds = Vec::new();
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        let Some(kind) = FixKind::from_id(id) else {
            let known: Vec<&str> = FixKind::ALL.iter().map(|kind| kind.id()).collect();
            return Err(format!("unknown fix `{id}`; expected one of: {}", known.join(", ")).into());
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

async fn emit_project_runs(runs: &[ProjectRun], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_project_text(runs),
        OutputFormat::Markdown => render_project_runs_markdown(runs),
        OutputFormat::Json => render_json(runs)?,
    };
    emit_output(output, contents).await
}

async fn emit_validation_runs(runs: &[FileRun<W3cReport>], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_validation_text(runs),
        OutputFormat::Markdown => {
            render_file_runs_markdown(runs, |_, report| render_validation_markdown(report))
        }
        OutputFormat::Json => render_json(runs)?,
    };
    emit_output(output, contents).await
}

async fn emit_performance_runs(
    runs: &[FileRun<PerformanceReport>],
    output: &OutputArgs,
) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_performance_text(runs),
        OutputFormat::Markdown => render_file_runs_markdown(runs, |path, report| {
            render_performance_markdown(&path.display().to_string(), report)
        }),
        OutputFormat::Json => render_json(runs)?,
    };
    emit_output(output, contents).await
}

async fn emit_improvement(run: &ImprovementRun, output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_improvement_text(run),
        OutputFormat::Markdown => render_improvement_markdown(
            &run.path.display().to_string(),
            &run.result,
            run.comparison.as_deref(),
        ),
        OutputFormat::Json => render_json(run)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn issue_label(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Error => "error",
        IssueKind::Warning => "warning",
        IssueKind::Info => "info",
    }
}

fn render_project_text(runs: &[ProjectRun]) -> String {
    let mut output = String::new();
    for run in runs {
        let _ = writeln!(output, "Root: {}", run.root.display());
        let Some(report) = &run.report else {
            let error = run.error.as_deref().unwrap_or("unknown error");
            let _ = writeln!(output, "Status: error ({error})");
            let _ = writeln!(output);
            continue;
        };
        let summary = &report.summary;
        let status = match summary.status {
            ProjectStatus::Passed => "passed",
            ProjectStatus::Failed => "failed",
        };
        let _ = writeln!(output, "Status: {status}");
        let _ = writeln!(
            output,
            "Files: {} ({} skipped)",
            report.total_files,
            run.skipped.len()
        );
        let _ = writeln!(
            output,
            "Quality: {}/100, {} errors, {} warnings, {} lines",
            summary.average_quality_score,
            summary.total_errors,
            summary.total_warnings,
            summary.total_lines
        );

        if summary.language_stats.is_empty() {
            let _ = writeln!(output, "Languages: none detected");
        } else {
            let _ = writeln!(output, "Languages:");
            for (language, percent) in format_language_stats(&summary.language_stats) {
                let _ = writeln!(output, "- {language}: {percent:.2}%");
            }
        }

        for file in &report.files {
            let _ = writeln!(
                output,
                "{}: {}/100",
                file.file_name, file.quality_score
            );
            for issue in &file.issues {
                let _ = writeln!(
                    output,
                    "  [{}] line {}: {}",
                    issue_label(issue.kind),
                    issue.line,
                    issue.message
                );
            }
            let fixable = file.suggestions.iter().filter(|s| s.auto_fix).count();
            if fixable > 0 {
                let _ = writeln!(output, "  {fixable} auto-fixable suggestion(s)");
            }
            if let Some(deep) = &file.deep_analysis {
                let _ = writeln!(output, "  deep analysis: {}/100", deep.overall_score);
            }
        }
        let _ = writeln!(output);
    }
    output
}

fn render_project_runs_markdown(runs: &[ProjectRun]) -> String {
    let mut output = String::new();
    for run in runs {
        match &run.report {
            Some(report) => output.push_str(&render_project_markdown(report)),
            None => {
                let error = run.error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(output, "# {}\n\nError: {error}\n", run.root.display());
            }
        }
    }
    output
}

fn render_file_runs_markdown<T>(
    runs: &[FileRun<T>],
    render: impl Fn(&Path, &T) -> String,
) -> String {
    let mut output = String::new();
    for run in runs {
        match &run.report {
            Some(report) => output.push_str(&render(&run.path, report)),
            None => {
                let error = run.error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(output, "# {}\n\nError: {error}\n", run.path.display());
            }
        }
    }
    output
}

fn render_validation_text(runs: &[FileRun<W3cReport>]) -> String {
    let mut output = String::new();
    for run in runs {
        let _ = writeln!(output, "File: {}", run.path.display());
        let Some(report) = &run.report else {
            let error = run.error.as_deref().unwrap_or("unknown error");
            let _ = writeln!(output, "Status: error ({error})");
            let _ = writeln!(output);
            continue;
        };
        let _ = writeln!(output, "Score: {}/100", report.score);
        let _ = writeln!(output, "{}", report.summary.message);
        let groups = [
            ("Errors", &report.errors),
            ("Warnings", &report.warnings),
            ("Suggestions", &report.suggestions),
        ];
        for (title, findings) in groups {
            if findings.is_empty() {
                continue;
            }
            let _ = writeln!(output, "{title}:");
            for finding in findings {
                let fix = if finding.auto_fix { " (auto-fix)" } else { "" };
                let _ = writeln!(
                    output,
                    "- line {}: {}{fix}",
                    finding.line, finding.message
                );
            }
        }
        let _ = writeln!(output);
    }
    output
}

fn render_performance_text(runs: &[FileRun<PerformanceReport>]) -> String {
    let mut output = String::new();
    for run in runs {
        let _ = writeln!(output, "File: {}", run.path.display());
        let Some(report) = &run.report else {
            let error = run.error.as_deref().unwrap_or("unknown error");
            let _ = writeln!(output, "Status: error ({error})");
            let _ = writeln!(output);
            continue;
        };
        let _ = writeln!(
            output,
            "Desktop: {}/100, Mobile: {}/100",
            report.desktop_score, report.mobile_score
        );
        let metrics = &report.metrics;
        let _ = writeln!(
            output,
            "Simulated LCP {:.2}s, TBT {}ms, CLS {:.2}, Speed Index {:.2}s",
            metrics.lcp, metrics.tbt, metrics.cls, metrics.speed_index
        );
        if report.issues.is_empty() {
            let _ = writeln!(output, "Issues: none");
        } else {
            let _ = writeln!(output, "Issues:");
            for issue in &report.issues {
                let _ = writeln!(output, "- {}: {}", issue.title, issue.description);
            }
        }
        let _ = writeln!(output);
    }
    output
}

fn render_improvement_text(run: &ImprovementRun) -> String {
    let result = &run.result;
    let metrics = &result.metrics;
    let mut output = String::new();
    let _ = writeln!(output, "File: {}", run.path.display());
    if !result.has_changes {
        let _ = writeln!(output, "No changes.");
    }
    let _ = writeln!(
        output,
        "Lines changed: {}, size {} -> {} ({}%)",
        metrics.lines_changed,
        metrics.original_size,
        metrics.improved_size,
        metrics.size_reduction_percent
    );
    for fix in &result.applied_fixes {
        let _ = writeln!(output, "+ [{}] {}", fix.fix_kind, fix.message);
    }
    for fix in &result.skipped_fixes {
        let _ = writeln!(output, "! {} ({})", fix.message, fix.reason);
    }
    if let Some(rows) = &run.comparison {
        for row in rows.iter().filter(|row| row.is_different) {
            let _ = writeln!(output, "{:>4} - {}", row.line_number, row.original);
            let _ = writeln!(output, "{:>4} + {}", row.line_number, row.improved);
        }
    }
    if let Some(path) = &run.written {
        let _ = writeln!(output, "Written: {}", path.display());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{
        FileRun, ImproveArgs, LoadArgs, OutputArgs, OutputFormat, ProjectRun, analyze_roots,
        emit_output, emit_project_runs, parse_fix_kinds, read_source, render_performance_text,
        render_project_text, render_validation_text, run_files, run_improve,
    };
    use codeguard_core::{FixKind, ProjectStatus, analyze_performance, generate_w3c_report};
    use std::path::PathBuf;

    static UNIQUE_COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let counter = UNIQUE_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        PathBuf::from(format!("codeguard_cli_test_{nanos}_{counter}"))
    }

    fn temp_root() -> PathBuf {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(&root).expect("temp root");
        root
    }

    fn load_args() -> LoadArgs {
        LoadArgs {
            concurrency: 2,
            max_file_size: 1024,
        }
    }

    #[tokio::test]
    async fn analyze_reports_each_root() {
        let root = temp_root();
        let project = root.join("project");
        std::fs::create_dir_all(project.join(".git")).expect("hidden dir");
        std::fs::write(project.join("app.js"), "var a = 1;\nconsole.log(a);\n").expect("app");
        std::fs::write(project.join("legacy.php"), "mysql_query($q);").expect("php");
        std::fs::write(project.join("notes.txt"), "ignored").expect("notes");
        std::fs::write(project.join(".git/config"), "hidden").expect("config");
        let missing = root.join("missing");

        let runs = analyze_roots(vec![project.clone(), missing.clone()], &load_args())
            .await
            .expect("runs");

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].root, missing);
        assert!(runs[0].error.is_some());
        assert!(runs[0].has_errors());

        let report = runs[1].report.as_ref().expect("report");
        assert_eq!(report.total_files, 2);
        assert_eq!(report.summary.status, ProjectStatus::Failed);
        assert_eq!(runs[1].skipped.len(), 1);
        assert!(runs[1].has_errors());

        let text = render_project_text(&runs);
        assert!(text.contains("Status: failed"));
        assert!(text.contains("Files: 2 (1 skipped)"));
        assert!(text.contains("Status: error"));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn validate_and_speed_read_files_concurrently() {
        let root = temp_root();
        let page = root.join("index.html");
        std::fs::write(&page, "<html><body><img src=\"a.png\"></body></html>").expect("page");
        let large = root.join("large.html");
        std::fs::write(&large, "x".repeat(2048)).expect("large");

        let runs = run_files(vec![page.clone(), large.clone()], &load_args(), generate_w3c_report)
            .await
            .expect("validation runs");
        assert_eq!(runs[0].path, page);
        let report = runs[0].report.as_ref().expect("w3c report");
        assert!(!report.is_valid);
        assert!(runs[1].error.as_deref().is_some_and(|e| e.contains("byte limit")));
        let text = render_validation_text(&runs);
        assert!(text.contains("Missing DOCTYPE declaration (auto-fix)"));

        let speed = run_files(vec![page.clone()], &load_args(), analyze_performance)
            .await
            .expect("speed runs");
        let text = render_performance_text(&speed);
        assert!(text.contains("Missing viewport meta tag"));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn read_source_rejects_missing_files() {
        let root = temp_root();
        assert!(read_source(&root.join("nope.js"), 10).await.is_err());
        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn improve_writes_improved_copy() {
        let root = temp_root();
        let file = root.join("app.js");
        std::fs::write(&file, "var total = 1;\nconsole.log(total);\n").expect("app");

        let run = run_improve(ImproveArgs {
            file: file.clone(),
            fix: vec!["console".to_string(), "var".to_string()],
            write: true,
            diff: true,
        })
        .await
        .expect("improve");

        assert!(run.result.has_changes);
        assert_eq!(run.result.applied_fixes.len(), 2);
        let written = run.written.as_ref().expect("written path");
        assert_eq!(written, &root.join("app.improved.js"));
        let improved = std::fs::read_to_string(written).expect("improved file");
        assert_eq!(improved, "let total = 1;\n");
        assert!(run.comparison.as_ref().is_some_and(|rows| !rows.is_empty()));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn improve_without_write_leaves_disk_alone() {
        let root = temp_root();
        let file = root.join("app.js");
        std::fs::write(&file, "var total = 1;\n").expect("app");

        let run = run_improve(ImproveArgs {
            file,
            fix: Vec::new(),
            write: false,
            diff: false,
        })
        .await
        .expect("improve");

        assert!(run.written.is_none());
        assert!(run.comparison.is_none());
        assert!(!root.join("app.improved.js").exists());

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn parses_fix_ids_and_aliases() {
        let kinds = parse_fix_kinds(&[
            "remove-console-logs".to_string(),
            "alt".to_string(),
            "console".to_string(),
        ])
        .expect("kinds");
        assert_eq!(kinds, vec![FixKind::RemoveConsoleLogs, FixKind::AddAltAttributes]);

        let error = parse_fix_kinds(&["bogus".to_string()]).expect_err("unknown id");
        assert!(error.to_string().contains("unknown fix `bogus`"));
    }

    #[tokio::test]
    async fn emits_json_report_to_file() {
        let root = temp_root();
        let output = OutputArgs {
            format: OutputFormat::Json,
            report_output: Some(root.join("reports/analysis.json")),
        };
        let runs = vec![ProjectRun::failed(PathBuf::from("gone"), "missing".to_string())];
        emit_project_runs(&runs, &output).await.expect("emit");

        let contents =
            std::fs::read_to_string(root.join("reports/analysis.json")).expect("report file");
        let parsed: serde_json::Value = serde_json::from_str(&contents).expect("json");
        assert_eq!(parsed[0]["root"], "gone");
        assert_eq!(parsed[0]["error"], "missing");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn emit_output_writes_plain_text() {
        let root = temp_root();
        let output = OutputArgs {
            format: OutputFormat::Text,
            report_output: Some(root.join("out.txt")),
        };
        emit_output(&output, "hello".to_string()).await.expect("emit");
        assert_eq!(
            std::fs::read_to_string(root.join("out.txt")).expect("out"),
            "hello"
        );
        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn failed_file_runs_render_errors() {
        let runs: Vec<FileRun<codeguard_core::PerformanceReport>> =
            vec![FileRun::failed(PathBuf::from("a.html"), "boom".to_string())];
        assert!(render_performance_text(&runs).contains("Status: error (boom)"));
    }
}
