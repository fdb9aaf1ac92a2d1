//! HTTP handlers for CodeGuard server.

use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use codeguard_core::{
    ImprovementResult, Issue, LineComparison, PerformanceReport, ProjectReport, SourceFile,
    Suggestion, W3cReport, analyze_file, analyze_performance, analyze_project,
    generate_code_comparison, generate_w3c_report, improve_code,
};

use crate::openapi::ApiDoc;

/// Health check payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the server is serving requests.
    pub status: String,
    /// Server version.
    pub version: String,
}

/// One uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileRequest {
    /// File name, optionally with a relative path; the extension selects the rules.
    pub file_name: String,
    /// Full decoded text.
    pub content: String,
}

/// Request payload for project analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Files of the project.
    pub files: Vec<SourceFileRequest>,
}

/// Response payload for project analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Identifier of this analysis run.
    pub analysis_id: String,
    /// RFC 3339 timestamp of the run.
    pub analyzed_at: String,
    /// Aggregated project report.
    pub report: ProjectReport,
}

/// Request payload for the improver.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImproveRequest {
    /// File name; the extension selects the rules.
    pub file_name: String,
    /// Original text.
    pub content: String,
    /// Suggestions to apply; defaults to the analyzer's own suggestions.
    #[serde(default)]
    pub suggestions: Option<Vec<Suggestion>>,
    /// Issues reported alongside the suggestions.
    #[serde(default)]
    pub issues: Option<Vec<Issue>>,
}

/// Request payload for a line comparison.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompareRequest {
    /// Text before the change.
    pub original: String,
    /// Text after the change.
    pub improved: String,
}

/// Error response payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub message: String,
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        message: message.to_string(),
    })
}

fn internal_error(message: String) -> HttpResponse {
    log::error!("request failed: {message}");
    HttpResponse::InternalServerError().json(ErrorResponse { message })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "system"
)]
#[get("/api/health")]
/// Report that the server is up.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Project report", body = AnalyzeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Analysis failed", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/analyze")]
/// Analyze every file of a project and aggregate the results.
pub async fn analyze(payload: web::Json<AnalyzeRequest>) -> impl Responder {
    let request = payload.into_inner();
    if request.files.is_empty() {
        return bad_request("at least one file is required");
    }
    if request.files.iter().any(|file| file.file_name.trim().is_empty()) {
        return bad_request("fileName is required for every file");
    }

    let files: Vec<SourceFile> = request
        .files
        .into_iter()
        .map(|file| SourceFile::new(file.file_name, file.content))
        .collect();
    let file_count = files.len();
    let report = match web::block(move || analyze_project(&files)).await {
        Ok(report) => report,
        Err(err) => return internal_error(err.to_string()),
    };

    let analysis_id = Uuid::new_v4().to_string();
    log::info!(
        "analysis {analysis_id}: {file_count} files, status {:?}",
        report.summary.status
    );
    HttpResponse::Ok().json(AnalyzeResponse {
        analysis_id,
        analyzed_at: Utc::now().to_rfc3339(),
        report,
    })
}

#[utoipa::path(
    post,
    path = "/validate",
    request_body = SourceFileRequest,
    responses(
        (status = 200, description = "W3C-style validation report", body = W3cReport),
        (status = 500, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/validate")]
/// Validate an HTML document.
pub async fn validate(payload: web::Json<SourceFileRequest>) -> impl Responder {
    let file = payload.into_inner();
    match web::block(move || generate_w3c_report(&file.content, &file.file_name)).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(err) => internal_error(err.to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/performance",
    request_body = SourceFileRequest,
    responses(
        (status = 200, description = "Simulated page-speed report", body = PerformanceReport),
        (status = 500, description = "Scoring failed", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/performance")]
/// Score a file for page-speed problems.
pub async fn performance(payload: web::Json<SourceFileRequest>) -> impl Responder {
    let file = payload.into_inner();
    match web::block(move || analyze_performance(&file.content, &file.file_name)).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(err) => internal_error(err.to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/improve",
    request_body = ImproveRequest,
    responses(
        (status = 200, description = "Improved code and metrics", body = ImprovementResult),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Improvement failed", body = ErrorResponse)
    ),
    tag = "improve"
)]
#[post("/api/improve")]
/// Apply autofixable suggestions to a file.
pub async fn improve(payload: web::Json<ImproveRequest>) -> impl Responder {
    let request = payload.into_inner();
    if request.file_name.trim().is_empty() {
        return bad_request("fileName is required");
    }
    let outcome = web::block(move || {
        let source = SourceFile::new(request.file_name, request.content);
        let (suggestions, issues) = match request.suggestions {
            Some(suggestions) => (suggestions, request.issues.unwrap_or_default()),
            None => {
                let analysis = analyze_file(&source.file_name, &source.content, &source.file_type);
                (analysis.suggestions, analysis.issues)
            }
        };
        improve_code(&source.file_name, &source.content, &suggestions, &issues)
    })
    .await;
    match outcome {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => internal_error(err.to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/compare",
    request_body = CompareRequest,
    responses(
        (status = 200, description = "Line-by-line comparison", body = [LineComparison])
    ),
    tag = "improve"
)]
#[post("/api/compare")]
/// Compare two versions of a file line by line.
pub async fn compare(payload: web::Json<CompareRequest>) -> impl Responder {
    let rows: Vec<LineComparison> = generate_code_comparison(&payload.original, &payload.improved);
    HttpResponse::Ok().json(rows)
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/api/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use codeguard_core::{ChangeType, FixKind, ProjectStatus, fix_suggestion};

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .service(health)
                    .service(analyze)
                    .service(validate)
                    .service(performance)
                    .service(improve)
                    .service(compare)
                    .service(openapi_json),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, "ok");
    }

    #[actix_web::test]
    async fn analyze_returns_stamped_project_report() {
        let app = app!();
        let payload = serde_json::json!({
            "files": [
                {"fileName": "legacy.php", "content": "mysql_query($q);"},
                {"fileName": "app.js", "content": "var a = 1;\nconsole.log(a);"}
            ]
        });
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(&payload)
            .to_request();
        let resp: AnalyzeResponse = test::call_and_read_body_json(&app, req).await;

        assert!(Uuid::parse_str(&resp.analysis_id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&resp.analyzed_at).is_ok());
        assert_eq!(resp.report.total_files, 2);
        assert_eq!(resp.report.summary.total_errors, 2);
        assert_eq!(resp.report.summary.status, ProjectStatus::Failed);
        assert!(resp.report.files[1].deep_analysis.is_some());
    }

    #[actix_web::test]
    async fn analyze_rejects_empty_projects() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(serde_json::json!({ "files": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "at least one file is required");
    }

    #[actix_web::test]
    async fn validate_returns_w3c_report() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/validate")
            .set_json(SourceFileRequest {
                file_name: "index.html".to_string(),
                content: "<html><body><h1>Hi</h1></body></html>".to_string(),
            })
            .to_request();
        let resp: W3cReport = test::call_and_read_body_json(&app, req).await;
        assert!(!resp.is_valid);
        assert_eq!(resp.file_name, "index.html");
        assert!(resp.summary.error_count >= 4);
    }

    #[actix_web::test]
    async fn performance_scores_page() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/performance")
            .set_json(SourceFileRequest {
                file_name: "index.html".to_string(),
                content: "<html><body></body></html>".to_string(),
            })
            .to_request();
        let resp: PerformanceReport = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.desktop_score, 94);
        assert_eq!(resp.mobile_score, 68);
    }

    #[actix_web::test]
    async fn improve_uses_supplied_suggestions() {
        let app = app!();
        let payload = ImproveRequest {
            file_name: "app.js".to_string(),
            content: "var a = 1;\nconsole.log(a);\n".to_string(),
            suggestions: Some(vec![fix_suggestion(FixKind::RemoveConsoleLogs)]),
            issues: None,
        };
        let req = test::TestRequest::post()
            .uri("/api/improve")
            .set_json(&payload)
            .to_request();
        let resp: ImprovementResult = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.improved_code, "var a = 1;\n");
        assert_eq!(resp.applied_fixes.len(), 1);
        assert!(resp.has_changes);
    }

    #[actix_web::test]
    async fn improve_defaults_to_analyzer_suggestions() {
        let app = app!();
        let payload = serde_json::json!({
            "fileName": "app.js",
            "content": "var a = 1;\nconsole.log(a);\n"
        });
        let req = test::TestRequest::post()
            .uri("/api/improve")
            .set_json(&payload)
            .to_request();
        let resp: ImprovementResult = test::call_and_read_body_json(&app, req).await;
        assert!(!resp.improved_code.contains("console.log"));
        assert!(!resp.improved_code.contains("var "));
    }

    #[actix_web::test]
    async fn compare_classifies_lines() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/compare")
            .set_json(CompareRequest {
                original: "a\nb".to_string(),
                improved: "a\nc\nd".to_string(),
            })
            .to_request();
        let rows: Vec<LineComparison> = test::call_and_read_body_json(&app, req).await;
        let kinds: Vec<ChangeType> = rows.iter().map(|row| row.change_type).collect();
        assert_eq!(
            kinds,
            vec![ChangeType::Unchanged, ChangeType::Modified, ChangeType::Added]
        );
    }

    #[actix_web::test]
    async fn openapi_json_returns_document() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/openapi.json")
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert!(resp.get("openapi").is_some());
    }
}
