//! Runtime, performance and security risk checks.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Finding, FindingCategory, Severity};
use crate::error::Result;
use crate::text::{find_line_number, line_of_offset};

const MAX_DOM_QUERIES: usize = 5;

lazy_static! {
    static ref CHAINED_ACCESS: Regex = Regex::new(r"\w+\.\w+\.\w+").unwrap();
    static ref DIVIDE_BY_ZERO: Regex = Regex::new(r"/\s*0(?:[^.\w]|$)").unwrap();
    static ref WHILE_TRUE: Regex = Regex::new(r"while\s*\(\s*true\s*\)").unwrap();
    static ref FOREACH_PUSH: Regex = Regex::new(r"(?s)\.forEach\(.*?\.push\(").unwrap();
    static ref DOM_QUERY: Regex =
        Regex::new(r"document\.querySelector|document\.getElementById").unwrap();
    static ref FOR_HEADER: Regex = Regex::new(r"\bfor\s*\([^)]*\)[^{]*\{").unwrap();
    static ref ASYNC_IN_BODY: Regex = Regex::new(r"\bawait\b|\.then\(").unwrap();
    static ref EVAL: Regex = Regex::new(r"\beval\s*\(").unwrap();
    static ref INNER_HTML: Regex = Regex::new(r"\.innerHTML\s*=(?:[^=]|$)").unwrap();
    static ref CREDENTIALS: Vec<Regex> = [
        r#"(?i)password\s*=\s*['"][^'"]+['"]"#,
        r#"(?i)api[_-]?key\s*=\s*['"][^'"]+['"]"#,
        r#"(?i)secret\s*=\s*['"][^'"]+['"]"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect();
    static ref SQL_KEYWORD: Regex = Regex::new(r"\b(?:SELECT|INSERT|UPDATE|DELETE)\b").unwrap();
    static ref STRING_CONCAT: Regex = Regex::new(r#"\+\s*['"]"#).unwrap();
}

pub(super) fn runtime_errors(content: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    if let Some(access) = CHAINED_ACCESS.find(content) {
        findings.push(Finding::new(
            FindingCategory::RuntimeError,
            Severity::Medium,
            "Potential \"Cannot read property of undefined\" error. Use optional chaining (?.)",
            find_line_number(content, access.as_str()),
        ));
    }

    if let Some(division) = DIVIDE_BY_ZERO.find(content) {
        findings.push(Finding::new(
            FindingCategory::RuntimeError,
            Severity::High,
            "Potential division by zero",
            line_of_offset(content, division.start()),
        ));
    }

    if let Some(last) = WHILE_TRUE.find_iter(content).last() {
        if !content[last.end()..].contains("break") {
            findings.push(Finding::new(
                FindingCategory::RuntimeError,
                Severity::Critical,
                "Potential infinite loop detected (while(true) without break)",
                line_of_offset(content, last.start()),
            ));
        }
    }

    Ok(findings)
}

pub(super) fn performance_warnings(content: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    if let Some(found) = FOREACH_PUSH.find(content) {
        findings.push(Finding::new(
            FindingCategory::Performance,
            Severity::Medium,
            "Use .map() instead of .forEach() with .push() for better performance",
            line_of_offset(content, found.start()),
        ));
    }

    let dom_queries = DOM_QUERY.find_iter(content).count();
    if dom_queries > MAX_DOM_QUERIES {
        findings.push(Finding::new(
            FindingCategory::Performance,
            Severity::Medium,
            format!("{dom_queries} DOM queries detected. Consider caching selectors"),
            find_line_number(content, "document."),
        ));
    }

    if let Some(offset) = async_loop(content) {
        findings.push(Finding::new(
            FindingCategory::Performance,
            Severity::High,
            "Async operations in loop. Use Promise.all() for parallel execution",
            line_of_offset(content, offset),
        ));
    }

    Ok(findings)
}

/// Offset of the first `for (...) {` whose braced body awaits or chains `.then(`.
fn async_loop(content: &str) -> Option<usize> {
    FOR_HEADER.find_iter(content).find_map(|header| {
        let body = braced_body(&content[header.end()..]);
        ASYNC_IN_BODY.is_match(body).then_some(header.start())
    })
}

/// Text up to the brace that closes an already-open block, or the rest.
fn braced_body(rest: &str) -> &str {
    let mut depth = 1usize;
    for (index, ch) in rest.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &rest[..index];
                }
            }
            _ => {}
        }
    }
    rest
}

pub(super) fn security_vulnerabilities(content: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    if let Some(eval) = EVAL.find(content) {
        findings.push(Finding::new(
            FindingCategory::Security,
            Severity::Critical,
            "eval() usage detected - major security risk. Avoid at all costs",
            line_of_offset(content, eval.start()),
        ));
    }

    if let Some(assignment) = INNER_HTML.find(content) {
        findings.push(Finding::new(
            FindingCategory::Security,
            Severity::High,
            "innerHTML assignment can lead to XSS attacks. Use textContent or sanitize input",
            line_of_offset(content, assignment.start()),
        ));
    }

    for pattern in CREDENTIALS.iter() {
        if let Some(credential) = pattern.find(content) {
            findings.push(Finding::new(
                FindingCategory::Security,
                Severity::Critical,
                "Hardcoded credentials detected. Use environment variables",
                line_of_offset(content, credential.start()),
            ));
        }
    }

    if let Some(keyword) = SQL_KEYWORD.find(content) {
        if STRING_CONCAT.is_match(content) {
            findings.push(Finding::new(
                FindingCategory::Security,
                Severity::Critical,
                "Potential SQL injection vulnerability. Use parameterized queries",
                line_of_offset(content, keyword.start()),
            ));
        }
    }

    Ok(findings)
}
