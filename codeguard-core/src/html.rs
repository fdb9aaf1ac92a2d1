//! Structural and accessibility checks over raw HTML text.
//!
//! Every rule runs independently over the whole document and reports a
//! finding plus a score penalty. Nothing here parses the markup.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::FixKind;
use crate::error::{Result, isolate};
use crate::text::line_of_offset;

const BASE_SCORE: i32 = 100;
const VOID_TAGS: [&str; 6] = ["img", "br", "hr", "input", "meta", "link"];
const DEPRECATED_TAGS: [&str; 9] = [
    "center", "font", "marquee", "blink", "big", "strike", "tt", "frame", "frameset",
];
const MAX_INLINE_STYLES: usize = 5;

lazy_static! {
    static ref HTML_OPEN: Regex = Regex::new(r"(?i)<html(\s[^>]*)?>").unwrap();
    static ref HTML_LANG: Regex = Regex::new(r"(?i)<html\s[^>]*lang=").unwrap();
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head(\s[^>]*)?>").unwrap();
    static ref BODY_OPEN: Regex = Regex::new(r"(?i)<body(\s[^>]*)?>").unwrap();
    static ref META_CHARSET: Regex = Regex::new(r"(?i)<meta[^>]*charset=").unwrap();
    static ref TITLE: Regex = Regex::new(r"(?is)<title[^>]*>.*?</title>").unwrap();
    static ref META_VIEWPORT: Regex =
        Regex::new(r#"(?i)<meta[^>]*name=["']viewport["']"#).unwrap();
    static ref IMG_TAG: Regex = Regex::new(r"(?i)<img\b[^>]*>").unwrap();
    static ref ALT_ATTR: Regex = Regex::new(r"(?i)\balt=").unwrap();
    static ref INLINE_STYLE: Regex = Regex::new(r#"(?i)style=["'][^"']*["']"#).unwrap();
    static ref HEADING: Regex = Regex::new(r"(?i)<h[1-6]\b[^>]*>").unwrap();
    static ref H1: Regex = Regex::new(r"(?i)<h1\b[^>]*>").unwrap();
    static ref OPEN_TAG: Regex = Regex::new(r"<(\w+)[^>]*>").unwrap();
    static ref INPUT_TAG: Regex = Regex::new(r"(?i)<input\b[^>]*>").unwrap();
    static ref INPUT_EXEMPT: Regex =
        Regex::new(r#"(?i)type=["']?(submit|button|hidden)["']?"#).unwrap();
    static ref ID_ATTR: Regex = Regex::new(r#"(?i)\bid=["']([^"']+)["']"#).unwrap();
    static ref ANCHOR: Regex = Regex::new(r"(?i)<a(\s[^>]*)?>").unwrap();
    static ref HREF: Regex = Regex::new(r"(?i)href=").unwrap();
    static ref EMPTY_HREF: Regex = Regex::new(r#"(?i)href=["']#?["']"#).unwrap();
    static ref VOID_SLASH: Regex =
        Regex::new(r"(?i)<(br|hr|img|input|meta|link)\b[^>]*/>").unwrap();
    static ref P_OPEN: Regex = Regex::new(r"(?i)<p(\s[^>]*)?>").unwrap();
    static ref P_CLOSE: Regex = Regex::new(r"(?i)</p\s*>").unwrap();
    static ref BLOCK_TAG: Regex = Regex::new(
        r"(?i)<(div|p|ul|ol|li|table|section|article|header|footer|nav|aside|form|h[1-6]|blockquote|pre)\b"
    )
    .unwrap();
}

/// Severity tier of a validator finding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    /// Standards violation; makes the document invalid.
    Error,
    /// Likely problem.
    Warning,
    /// Best-practice recommendation.
    Suggestion,
    /// Informational note with no score impact.
    Info,
}

/// A single validator finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFinding {
    /// 1-based line, or `0` for document-level findings.
    pub line: usize,
    /// Severity tier.
    #[serde(rename = "type")]
    pub kind: FindingKind,
    /// Rule group such as `Structure` or `Accessibility`.
    pub category: String,
    /// What is wrong.
    pub message: String,
    /// How to remedy it.
    pub suggestion: String,
    /// Replacement snippet or hint.
    pub fix_code: String,
    /// Whether a rewrite rule resolves the finding.
    pub auto_fix: bool,
    /// Rewrite rule resolving the finding, when autofixable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_kind: Option<FixKind>,
}

/// Outcome of [`validate_html`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `false` iff at least one error was reported.
    pub is_valid: bool,
    /// Error findings.
    pub errors: Vec<ValidationFinding>,
    /// Warning findings.
    pub warnings: Vec<ValidationFinding>,
    /// Suggestions and informational notes.
    pub suggestions: Vec<ValidationFinding>,
    /// 0-100 compliance score.
    pub score: u8,
}

/// Overall verdict of a W3C report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ValidityStatus {
    /// No errors.
    Valid,
    /// At least one error.
    Invalid,
}

/// Summary block of a [`W3cReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct W3cSummary {
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Number of suggestions and notes.
    pub suggestion_count: usize,
    /// Overall verdict.
    pub status: ValidityStatus,
    /// Human-readable verdict.
    pub message: String,
}

/// Presentation-ready validation report for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct W3cReport {
    /// Validated file name.
    pub file_name: String,
    /// Validator display name.
    pub validator: String,
    /// Mirrors [`ValidationResult::is_valid`].
    pub is_valid: bool,
    /// Mirrors [`ValidationResult::score`].
    pub score: u8,
    /// Errors plus warnings.
    pub total_issues: usize,
    /// Error findings.
    pub errors: Vec<ValidationFinding>,
    /// Warning findings.
    pub warnings: Vec<ValidationFinding>,
    /// Suggestions and informational notes.
    pub suggestions: Vec<ValidationFinding>,
    /// Counts and verdict.
    pub summary: W3cSummary,
}

struct Check {
    finding: ValidationFinding,
    penalty: i32,
}

impl Check {
    fn new(kind: FindingKind, line: usize, category: &str, message: impl Into<String>) -> Self {
        Self {
            finding: ValidationFinding {
                line,
                kind,
                category: category.to_string(),
                message: message.into(),
                suggestion: String::new(),
                fix_code: String::new(),
                auto_fix: false,
                fix_kind: None,
            },
            penalty: 0,
        }
    }

    fn remedy(mut self, suggestion: &str, fix_code: impl Into<String>) -> Self {
        self.finding.suggestion = suggestion.to_string();
        self.finding.fix_code = fix_code.into();
        self
    }

    fn fixable(mut self, kind: FixKind) -> Self {
        self.finding.auto_fix = true;
        self.finding.fix_kind = Some(kind);
        self
    }

    fn penalty(mut self, penalty: i32) -> Self {
        self.penalty = penalty;
        self
    }
}

/// Validate an HTML document against the built-in W3C-style rule set.
pub fn validate_html(html: &str) -> ValidationResult {
    let rules: [(&str, fn(&str) -> Result<Vec<Check>>); 12] = [
        ("doctype", check_doctype),
        ("structure", check_structure),
        ("meta", check_meta),
        ("images", check_images),
        ("deprecated", check_deprecated),
        ("nesting", check_paragraph_nesting),
        ("inline-styles", check_inline_styles),
        ("headings", check_headings),
        ("tag-balance", check_tag_balance),
        ("labels", check_labels),
        ("links", check_links),
        ("void-slash", check_void_slash),
    ];

    let mut score = BASE_SCORE;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();
    for (category, rule) in rules {
        for check in isolate(category, || rule(html)) {
            score -= check.penalty;
            match check.finding.kind {
                FindingKind::Error => errors.push(check.finding),
                FindingKind::Warning => warnings.push(check.finding),
                FindingKind::Suggestion | FindingKind::Info => suggestions.push(check.finding),
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        suggestions,
        score: score.clamp(0, 100) as u8,
    }
}

/// Validate `html` and wrap the result in a presentation-ready report.
pub fn generate_w3c_report(html: &str, file_name: &str) -> W3cReport {
    let result = validate_html(html);
    let (status, message) = if result.is_valid {
        (
            ValidityStatus::Valid,
            "Your HTML is valid according to W3C standards.",
        )
    } else {
        (
            ValidityStatus::Invalid,
            "Your HTML has validation errors that need to be fixed.",
        )
    };
    W3cReport {
        file_name: file_name.to_string(),
        validator: "W3C HTML Validator".to_string(),
        is_valid: result.is_valid,
        score: result.score,
        total_issues: result.errors.len() + result.warnings.len(),
        summary: W3cSummary {
            error_count: result.errors.len(),
            warning_count: result.warnings.len(),
            suggestion_count: result.suggestions.len(),
            status,
            message: message.to_string(),
        },
        errors: result.errors,
        warnings: result.warnings,
        suggestions: result.suggestions,
    }
}

/// Line of the first case-insensitive occurrence of `needle`, `0` when absent.
fn locate(html: &str, needle: &str) -> usize {
    let haystack = html.to_lowercase();
    match haystack.find(&needle.to_lowercase()) {
        Some(index) => haystack[..index].matches('\n').count() + 1,
        None => 0,
    }
}

fn check_doctype(html: &str) -> Result<Vec<Check>> {
    if html.trim_start().to_lowercase().starts_with("<!doctype") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Check::new(
            FindingKind::Error,
            1,
            "Document Type",
            "Missing DOCTYPE declaration",
        )
        .remedy(
            "Add <!DOCTYPE html> at the beginning of the document",
            "<!DOCTYPE html>",
        )
        .fixable(FixKind::AddDoctype)
        .penalty(10),
    ])
}

fn check_structure(html: &str) -> Result<Vec<Check>> {
    let mut checks = Vec::new();
    match HTML_OPEN.find(html) {
        None => checks.push(
            Check::new(FindingKind::Error, 0, "Structure", "Missing <html> tag")
                .remedy("Wrap your content in <html> tags", "<html lang=\"en\">...</html>")
                .penalty(10),
        ),
        Some(found) if !HTML_LANG.is_match(html) => checks.push(
            Check::new(
                FindingKind::Warning,
                line_of_offset(html, found.start()),
                "Accessibility",
                "Missing lang attribute in <html> tag",
            )
            .remedy("Add lang attribute for accessibility", "<html lang=\"en\">")
            .fixable(FixKind::AddHtmlLang)
            .penalty(5),
        ),
        Some(_) => {}
    }
    if !HEAD_OPEN.is_match(html) {
        checks.push(
            Check::new(FindingKind::Error, 0, "Structure", "Missing <head> tag")
                .remedy("Add <head> section to your HTML", "<head>...</head>")
                .penalty(10),
        );
    }
    if !TITLE.is_match(html) {
        checks.push(
            Check::new(
                FindingKind::Error,
                locate(html, "<head"),
                "SEO",
                "Missing <title> tag",
            )
            .remedy("Add <title> tag in <head> section", "<title>Page Title</title>")
            .penalty(10),
        );
    }
    if !BODY_OPEN.is_match(html) {
        checks.push(
            Check::new(FindingKind::Error, 0, "Structure", "Missing <body> tag")
                .remedy("Add <body> section to your HTML", "<body>...</body>")
                .penalty(10),
        );
    }
    Ok(checks)
}

fn check_meta(html: &str) -> Result<Vec<Check>> {
    let mut checks = Vec::new();
    let head_line = locate(html, "<head");
    if !META_CHARSET.is_match(html) {
        checks.push(
            Check::new(
                FindingKind::Error,
                head_line,
                "Encoding",
                "Missing character encoding declaration",
            )
            .remedy("Add <meta charset=\"UTF-8\"> in <head>", "<meta charset=\"UTF-8\">")
            .fixable(FixKind::AddCharsetMeta)
            .penalty(10),
        );
    }
    if !META_VIEWPORT.is_match(html) {
        checks.push(
            Check::new(
                FindingKind::Warning,
                head_line,
                "Responsive",
                "Missing viewport meta tag",
            )
            .remedy(
                "Add viewport meta tag for responsive design",
                "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">",
            )
            .fixable(FixKind::AddViewportMeta)
            .penalty(5),
        );
    }
    Ok(checks)
}

fn check_images(html: &str) -> Result<Vec<Check>> {
    Ok(IMG_TAG
        .find_iter(html)
        .filter(|img| !ALT_ATTR.is_match(img.as_str()))
        .map(|img| {
            Check::new(
                FindingKind::Warning,
                line_of_offset(html, img.start()),
                "Accessibility",
                "Image missing alt attribute",
            )
            .remedy(
                "Add alt attribute to all images for accessibility",
                "alt=\"descriptive text\"",
            )
            .fixable(FixKind::AddAltAttributes)
            .penalty(2)
        })
        .collect())
}

fn check_deprecated(html: &str) -> Result<Vec<Check>> {
    let mut checks = Vec::new();
    for tag in DEPRECATED_TAGS {
        let pattern = Regex::new(&format!(r"(?i)<{tag}\b"))?;
        if let Some(found) = pattern.find(html) {
            checks.push(
                Check::new(
                    FindingKind::Error,
                    line_of_offset(html, found.start()),
                    "Deprecated",
                    format!("Deprecated tag {tag} found"),
                )
                .remedy("Replace with modern HTML5 and CSS", "Use CSS for styling instead")
                .fixable(FixKind::ReplaceDeprecatedTags)
                .penalty(8),
            );
        }
    }
    Ok(checks)
}

fn check_paragraph_nesting(html: &str) -> Result<Vec<Check>> {
    let mut checks = Vec::new();
    for open in P_OPEN.find_iter(html) {
        let rest = &html[open.end()..];
        let body = match P_CLOSE.find(rest) {
            Some(close) => &rest[..close.start()],
            None => rest,
        };
        if let Some(block) = BLOCK_TAG.captures(body) {
            let tag = block[1].to_lowercase();
            let offset = open.end() + block.get(0).map_or(0, |m| m.start());
            checks.push(
                Check::new(
                    FindingKind::Error,
                    line_of_offset(html, offset),
                    "Structure",
                    format!("Block element <{tag}> nested inside <p>"),
                )
                .remedy(
                    "Close the paragraph before starting a block element",
                    format!("</p><{tag}>"),
                )
                .penalty(5),
            );
        }
    }
    Ok(checks)
}

fn check_inline_styles(html: &str) -> Result<Vec<Check>> {
    let count = INLINE_STYLE.find_iter(html).count();
    if count <= MAX_INLINE_STYLES {
        return Ok(Vec::new());
    }
    Ok(vec![
        Check::new(
            FindingKind::Suggestion,
            0,
            "Best Practice",
            format!("Found {count} inline styles"),
        )
        .remedy(
            "Consider moving styles to external CSS file",
            "Extract to CSS file",
        )
        .penalty(3),
    ])
}

fn check_headings(html: &str) -> Result<Vec<Check>> {
    if !HEADING.is_match(html) {
        return Ok(Vec::new());
    }
    let h1_count = H1.find_iter(html).count();
    let check = match h1_count {
        0 => Check::new(FindingKind::Warning, 0, "SEO", "No <h1> heading found")
            .remedy("Add a main <h1> heading for better SEO", "<h1>Main Heading</h1>"),
        1 => return Ok(Vec::new()),
        count => Check::new(
            FindingKind::Warning,
            0,
            "SEO",
            format!("Multiple <h1> headings found ({count})"),
        )
        .remedy(
            "Use only one <h1> per page",
            "Change additional <h1> to <h2> or lower",
        ),
    };
    Ok(vec![check.penalty(5)])
}

fn check_tag_balance(html: &str) -> Result<Vec<Check>> {
    let mut seen: Vec<String> = Vec::new();
    let mut checks = Vec::new();
    for open in OPEN_TAG.captures_iter(html) {
        let name = open[1].to_lowercase();
        if VOID_TAGS.contains(&name.as_str()) || seen.contains(&name) {
            continue;
        }
        seen.push(name.clone());
        let escaped = regex::escape(&name);
        let open_count = Regex::new(&format!(r"(?i)<{escaped}\b[^>]*>"))?
            .find_iter(html)
            .count();
        let close_count = Regex::new(&format!(r"(?i)</{escaped}\s*>"))?
            .find_iter(html)
            .count();
        if open_count != close_count {
            let offset = open.get(0).map_or(0, |m| m.start());
            checks.push(
                Check::new(
                    FindingKind::Error,
                    line_of_offset(html, offset),
                    "Structure",
                    format!("Unclosed or mismatched <{name}> tag"),
                )
                .remedy(
                    &format!("Ensure all <{name}> tags are properly closed"),
                    format!("</{name}>"),
                )
                .penalty(8),
            );
        }
    }
    Ok(checks)
}

fn check_labels(html: &str) -> Result<Vec<Check>> {
    let mut checks = Vec::new();
    for input in INPUT_TAG.find_iter(html) {
        if INPUT_EXEMPT.is_match(input.as_str()) {
            continue;
        }
        let Some(id) = ID_ATTR.captures(input.as_str()) else {
            continue;
        };
        let id = &id[1];
        let label = Regex::new(&format!(
            r#"(?i)<label[^>]*for=["']{}["']"#,
            regex::escape(id)
        ))?;
        if !label.is_match(html) {
            checks.push(
                Check::new(
                    FindingKind::Warning,
                    line_of_offset(html, input.start()),
                    "Accessibility",
                    "Form input without associated label",
                )
                .remedy(
                    "Add <label> for better accessibility",
                    format!("<label for=\"{id}\">Label Text</label>"),
                )
                .penalty(3),
            );
        }
    }
    Ok(checks)
}

fn check_links(html: &str) -> Result<Vec<Check>> {
    Ok(ANCHOR
        .find_iter(html)
        .filter(|link| !HREF.is_match(link.as_str()) || EMPTY_HREF.is_match(link.as_str()))
        .map(|link| {
            Check::new(
                FindingKind::Warning,
                line_of_offset(html, link.start()),
                "Best Practice",
                "Link without valid href attribute",
            )
            .remedy("Add meaningful href to all links", "href=\"valid-url\"")
            .penalty(2)
        })
        .collect())
}

fn check_void_slash(html: &str) -> Result<Vec<Check>> {
    Ok(VOID_SLASH
        .find_iter(html)
        .map(|tag| {
            Check::new(
                FindingKind::Info,
                line_of_offset(html, tag.start()),
                "Info",
                "Trailing slash on void elements has no effect",
            )
            .remedy(
                "Remove the trailing slash (/) as it has no effect in HTML5",
                tag.as_str().replacen("/>", ">", 1),
            )
            .fixable(FixKind::StripVoidSlash)
        })
        .collect())
}
