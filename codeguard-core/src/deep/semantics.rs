//! Syntax balance, semantic and type-safety checks.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Finding, FindingCategory, Severity};
use crate::error::Result;
use crate::text::{count_word, find_line_number, line_of_offset};

lazy_static! {
    static ref DECLARATION: Regex = Regex::new(r"\b(?:const|let|var)\s+(\w+)").unwrap();
    static ref CONST_DECLARATION: Regex = Regex::new(r"\bconst\s+(\w+)\s*=").unwrap();
    static ref LOOSE_NULL: Regex = Regex::new(
        r"(?m)(?:^|[^=!])==\s*(?:null|undefined)\b|\b(?:null|undefined)\s*==(?:[^=]|$)"
    )
    .unwrap();
    static ref FUNCTION_PARAMS: Regex = Regex::new(r"function\s+\w+\s*\(([^)]+)\)").unwrap();
}

pub(super) fn syntax_errors(content: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for (open, close, label) in [('{', '}', "curly braces"), ('(', ')', "parentheses")] {
        let opening = content.matches(open).count();
        let closing = content.matches(close).count();
        if opening != closing {
            findings.push(Finding::new(
                FindingCategory::SyntaxError,
                Severity::Critical,
                format!("Mismatched {label}: {opening} opening, {closing} closing"),
                1,
            ));
        }
    }
    Ok(findings)
}

pub(super) fn semantic_issues(content: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for declaration in DECLARATION.captures_iter(content) {
        let name = &declaration[1];
        if count_word(content, name)? == 1 {
            findings.push(Finding::new(
                FindingCategory::SemanticWarning,
                Severity::Low,
                format!("Variable \"{name}\" is declared but never used"),
                find_line_number(content, &declaration[0]),
            ));
        }
    }

    if let Some(offset) = const_reassignment(content)? {
        findings.push(Finding::new(
            FindingCategory::SemanticError,
            Severity::High,
            "Attempting to reassign const variable",
            line_of_offset(content, offset),
        ));
    }

    if let Some(found) = LOOSE_NULL.find(content) {
        findings.push(Finding::new(
            FindingCategory::SemanticWarning,
            Severity::Medium,
            "Use === instead of == for null/undefined checks",
            line_of_offset(content, found.start()),
        ));
    }

    Ok(findings)
}

/// Offset of the first plain assignment to a name previously declared `const`.
///
/// Comparisons, arrows and redeclarations are not assignments.
fn const_reassignment(content: &str) -> Result<Option<usize>> {
    for declaration in CONST_DECLARATION.captures_iter(content) {
        let Some(whole) = declaration.get(0) else {
            continue;
        };
        let assignment = Regex::new(&format!(r"\b{}\s*=", regex::escape(&declaration[1])))?;
        let rest = &content[whole.end()..];
        for candidate in assignment.find_iter(rest) {
            let follows = rest[candidate.end()..].chars().next();
            if matches!(follows, Some('=') | Some('>')) {
                continue;
            }
            let before = rest[..candidate.start()].trim_end();
            if ["const", "let", "var"].iter().any(|kw| before.ends_with(kw)) {
                continue;
            }
            return Ok(Some(whole.end() + candidate.start()));
        }
    }
    Ok(None)
}

pub(super) fn type_safety(content: &str) -> Result<Vec<Finding>> {
    let mut findings: Vec<Finding> = FUNCTION_PARAMS
        .find_iter(content)
        .filter(|function| !function.as_str().contains(':'))
        .map(|function| {
            Finding::new(
                FindingCategory::TypeSafety,
                Severity::Medium,
                "Function parameters missing type annotations",
                line_of_offset(content, function.start()),
            )
        })
        .collect();
    if content.contains(": any") {
        findings.push(Finding::new(
            FindingCategory::TypeSafety,
            Severity::Low,
            "Avoid using \"any\" type. Use specific types for better type safety",
            find_line_number(content, ": any"),
        ));
    }
    Ok(findings)
}
