//! Simulated page-speed scoring from static heuristics.
//!
//! Nothing here loads a page. Scores start near perfect and lose a fixed
//! amount per triggered heuristic; the web vitals are presentation numbers
//! interpolated from the desktop score, not measurements.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Impact, extension_of};
use crate::text::count_matches;

const DESKTOP_BASELINE: i32 = 99;
const MOBILE_BASELINE: i32 = 98;
const MISSING_VIEWPORT_MOBILE_PENALTY: i32 = 20;
const INLINE_STYLE_LIMIT: usize = 20;
const DOM_TAG_LIMIT: usize = 1500;

lazy_static! {
    static ref HEAD: Regex = Regex::new(r"(?is)<head(?:\s[^>]*)?>(.*?)(?:</head>|$)").unwrap();
    static ref SCRIPT_TAG: Regex = Regex::new(r"(?i)<script\b[^>]*>").unwrap();
    static ref DEFERRED: Regex = Regex::new(r"(?i)\b(?:defer|async)\b").unwrap();
    static ref INLINE_STYLE: Regex = Regex::new(r#"\bstyle\s*=\s*["']"#).unwrap();
    static ref IMG: Regex = Regex::new(r"(?i)<img\b").unwrap();
    static ref DIMENSION: Regex = Regex::new(r#"(?i)\b(?:width|height)\s*=\s*["'{]"#).unwrap();
    static ref VIEWPORT: Regex = Regex::new(r#"(?i)<meta[^>]*name\s*=\s*["']viewport["']"#).unwrap();
    static ref ALT: Regex = Regex::new(r#"(?i)\balt\s*=\s*["'{]"#).unwrap();
    static ref TAG: Regex = Regex::new(r"<[A-Za-z]+").unwrap();
    static ref LAZY: Regex = Regex::new(r#"(?i)\bloading\s*=\s*["']lazy["']"#).unwrap();
}

/// One triggered page-speed heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceIssue {
    /// Score tier; drives the deduction.
    pub impact: Impact,
    /// Short audit title.
    pub title: String,
    /// Remedy.
    pub description: String,
}

/// Simulated web vitals.
///
/// Derived from the desktop score by linear interpolation between a good and a
/// bad reference value. They are not measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebVitals {
    /// Largest contentful paint, seconds.
    pub lcp: f64,
    /// Total blocking time, milliseconds.
    pub tbt: f64,
    /// Cumulative layout shift.
    pub cls: f64,
    /// Speed index, seconds.
    pub speed_index: f64,
}

impl WebVitals {
    /// Interpolate vitals for a desktop score.
    pub fn simulate(desktop_score: u8) -> Self {
        let factor = (100.0 - f64::from(desktop_score.min(100))) / 100.0;
        let metric = |good: f64, bad: f64| round2(good + (bad - good) * factor);
        Self {
            lcp: metric(0.8, 4.5),
            tbt: metric(10.0, 600.0).round(),
            cls: metric(0.0, 0.5),
            speed_index: metric(0.5, 3.5),
        }
    }
}

/// Result of [`analyze_performance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// 0-100 desktop score.
    pub desktop_score: u8,
    /// 0-100 mobile score.
    pub mobile_score: u8,
    /// Simulated vitals for the desktop score.
    pub metrics: WebVitals,
    /// Triggered heuristics in evaluation order.
    pub issues: Vec<PerformanceIssue>,
}

struct Scorer {
    desktop: i32,
    mobile: i32,
    issues: Vec<PerformanceIssue>,
}

impl Scorer {
    fn flag(&mut self, impact: Impact, title: &str, description: String) {
        let (desktop, mobile) = match impact {
            Impact::High => (5, 10),
            Impact::Medium => (2, 5),
            Impact::Low => (1, 2),
        };
        self.desktop -= desktop;
        self.mobile -= mobile;
        self.issues.push(PerformanceIssue {
            impact,
            title: title.to_string(),
            description,
        });
    }
}

/// Score a file for page-speed problems.
pub fn analyze_performance(content: &str, file_name: &str) -> PerformanceReport {
    let mut scorer = Scorer {
        desktop: DESKTOP_BASELINE,
        mobile: MOBILE_BASELINE,
        issues: Vec::new(),
    };

    if has_blocking_head_script(content) {
        scorer.flag(
            Impact::High,
            "Eliminate render-blocking resources",
            "Scripts in <head> without `defer` or `async` block the first paint. Move them to the end of <body> or use `defer`.".to_string(),
        );
    }

    if count_matches(content, &INLINE_STYLE) > INLINE_STYLE_LIMIT {
        scorer.flag(
            Impact::Medium,
            "Reduce inline styles",
            "Too many inline styles increase document size. Move styles to external CSS files.".to_string(),
        );
    }

    let has_images = IMG.is_match(content);
    if has_images && !DIMENSION.is_match(content) {
        scorer.flag(
            Impact::High,
            "Image elements do not have explicit width and height",
            "Set explicit width and height on image elements to reduce layout shifts (CLS).".to_string(),
        );
    }

    if is_page_like(file_name) && !VIEWPORT.is_match(content) {
        scorer.flag(
            Impact::High,
            "Missing viewport meta tag",
            "The page is not optimized for mobile devices. Add a viewport meta tag.".to_string(),
        );
        scorer.mobile -= MISSING_VIEWPORT_MOBILE_PENALTY;
    }

    if has_images && !ALT.is_match(content) {
        scorer.flag(
            Impact::Medium,
            "Image elements missing alt attributes",
            "Missing alt attributes hurt accessibility and SEO.".to_string(),
        );
    }

    let tag_count = count_matches(content, &TAG);
    if tag_count > DOM_TAG_LIMIT {
        scorer.flag(
            Impact::Medium,
            "Avoid an excessive DOM size",
            format!("Found ~{tag_count} DOM elements. Large DOMs increase memory usage and style calculations."),
        );
    }

    if has_images && !LAZY.is_match(content) {
        scorer.flag(
            Impact::Low,
            "Defer offscreen images",
            "Consider using loading=\"lazy\" for offscreen images to improve initial load time.".to_string(),
        );
    }

    let desktop_score = scorer.desktop.clamp(0, 100) as u8;
    let mobile_score = scorer.mobile.clamp(0, 100) as u8;
    log::debug!("performance of {file_name}: desktop {desktop_score}, mobile {mobile_score}");

    PerformanceReport {
        desktop_score,
        mobile_score,
        metrics: WebVitals::simulate(desktop_score),
        issues: scorer.issues,
    }
}

fn has_blocking_head_script(content: &str) -> bool {
    let Some(head) = HEAD.captures(content) else {
        return false;
    };
    SCRIPT_TAG
        .find_iter(&head[1])
        .any(|tag| !DEFERRED.is_match(tag.as_str()))
}

fn is_page_like(file_name: &str) -> bool {
    matches!(extension_of(file_name).as_str(), "html" | "htm" | "jsx" | "tsx")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
