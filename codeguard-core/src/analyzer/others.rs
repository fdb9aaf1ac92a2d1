//! HTML, Python, PHP, Solidity and Vue checks.

use lazy_static::lazy_static;
use regex::Regex;

use super::{FileContext, Outcome, Rule};
use crate::domain::{Impact, Issue, Suggestion};
use crate::error::Result;
use crate::html::{FindingKind, ValidationFinding, validate_html};
use crate::text::{find_line_number, line_of_offset};

pub(super) const HTML_RULES: &[(&str, Rule)] = &[("w3c", w3c_validation)];
pub(super) const PYTHON_RULES: &[(&str, Rule)] = &[
    ("print", python_print),
    ("range-len", python_range_len),
    ("none-comparison", python_none_comparison),
];
pub(super) const PHP_RULES: &[(&str, Rule)] = &[
    ("mysql-query", php_mysql_query),
    ("die-exit", php_die_exit),
    ("open-tag", php_open_tag),
];
pub(super) const SOLIDITY_RULES: &[(&str, Rule)] = &[
    ("pragma", solidity_pragma),
    ("visibility", solidity_visibility),
];
pub(super) const VUE_RULES: &[(&str, Rule)] = &[
    ("v-for-key", vue_for_key),
    ("v-if-with-v-for", vue_if_with_for),
];

lazy_static! {
    static ref PY_PRINT: Regex = Regex::new(r"\bprint\s*\(").unwrap();
    static ref PY_RANGE_LEN: Regex = Regex::new(r"\brange\s*\(\s*len\s*\(").unwrap();
    static ref PY_EQ_NONE: Regex = Regex::new(r"[=!]=\s*None\b").unwrap();
    static ref PHP_DIE: Regex = Regex::new(r"\b(?:die|exit)\s*\(").unwrap();
    static ref SOL_FUNCTION: Regex =
        Regex::new(r"\bfunction\s+\w+\s*\([^)]*\)([^{;]*)").unwrap();
    static ref SOL_VISIBILITY: Regex =
        Regex::new(r"\b(?:public|private|internal|external)\b").unwrap();
    static ref VUE_FOR_TAG: Regex = Regex::new(r"<[^>]*\bv-for\s*=[^>]*>").unwrap();
    static ref VUE_KEY: Regex = Regex::new(r"(?:\s:|\bv-bind:)key\s*=").unwrap();
    static ref VUE_IF: Regex = Regex::new(r"\bv-if\s*=").unwrap();
}

/// Map validator findings to issues and autofix suggestions.
fn w3c_validation(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let result = validate_html(file.content);
    let mut outcomes = Vec::new();
    let findings = result
        .errors
        .iter()
        .chain(&result.warnings)
        .chain(&result.suggestions);
    for finding in findings {
        let code = format!(
            "W3C_{}",
            finding.category.to_uppercase().replace(' ', "_")
        );
        match finding.kind {
            FindingKind::Error => {
                outcomes.push(Issue::error(finding.line, finding.message.as_str(), &code).into())
            }
            FindingKind::Warning => {
                outcomes.push(Issue::warning(finding.line, finding.message.as_str(), &code).into())
            }
            FindingKind::Suggestion | FindingKind::Info => {
                if !finding.auto_fix {
                    outcomes.push(
                        Suggestion::new("best-practice", finding.suggestion.as_str()).into(),
                    );
                }
            }
        }
        if let Some(suggestion) = autofix_suggestion(finding) {
            outcomes.push(suggestion.into());
        }
    }
    Ok(outcomes)
}

fn autofix_suggestion(finding: &ValidationFinding) -> Option<Suggestion> {
    let kind = finding.fix_kind.filter(|_| finding.auto_fix)?;
    let impact = match finding.kind {
        FindingKind::Error => Impact::High,
        FindingKind::Warning => Impact::Medium,
        FindingKind::Suggestion | FindingKind::Info => Impact::Low,
    };
    Some(
        Suggestion::new(&finding.category.to_lowercase(), finding.suggestion.as_str())
            .with_fix(kind, &finding.fix_code)
            .with_impact(impact),
    )
}

fn python_print(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let Some(found) = PY_PRINT.find(file.content) else {
        return Ok(Vec::new());
    };
    Ok(vec![
        Issue::warning(
            line_of_offset(file.content, found.start()),
            "print() found - use the logging module instead",
            "PY_PRINT",
        )
        .into(),
        Suggestion::new(
            "optimization",
            "Replace print() debugging with the logging module",
        )
        .with_impact(Impact::Low)
        .into(),
    ])
}

fn python_range_len(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let Some(found) = PY_RANGE_LEN.find(file.content) else {
        return Ok(Vec::new());
    };
    Ok(vec![
        Issue::warning(
            line_of_offset(file.content, found.start()),
            "range(len(...)) iteration - use enumerate() instead",
            "PY_RANGE_LEN",
        )
        .into(),
        Suggestion::new(
            "modernization",
            "Iterate with enumerate() instead of range(len(...))",
        )
        .with_impact(Impact::Low)
        .into(),
    ])
}

fn python_none_comparison(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let Some(found) = PY_EQ_NONE.find(file.content) else {
        return Ok(Vec::new());
    };
    Ok(vec![
        Issue::warning(
            line_of_offset(file.content, found.start()),
            "Comparison to None with == - use \"is None\" instead",
            "PY_NONE_COMPARISON",
        )
        .into(),
    ])
}

fn php_mysql_query(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !file.content.contains("mysql_query") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Issue::error(
            find_line_number(file.content, "mysql_query"),
            "mysql_query() is removed and prone to SQL injection",
            "PHP_MYSQL_QUERY",
        )
        .into(),
        Suggestion::new(
            "security",
            "Use PDO or mysqli with prepared statements",
        )
        .with_impact(Impact::High)
        .into(),
    ])
}

fn php_die_exit(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let Some(found) = PHP_DIE.find(file.content) else {
        return Ok(Vec::new());
    };
    Ok(vec![
        Issue::warning(
            line_of_offset(file.content, found.start()),
            "die()/exit() used - prefer exceptions and proper error handling",
            "PHP_DIE_EXIT",
        )
        .into(),
    ])
}

fn php_open_tag(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if file.content.contains("<?php") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Issue::error(1, "Missing opening <?php tag", "PHP_MISSING_OPEN_TAG").into(),
    ])
}

fn solidity_pragma(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if file.content.contains("pragma solidity") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Issue::error(1, "Missing \"pragma solidity\" version directive", "SOL_MISSING_PRAGMA")
            .into(),
        Suggestion::new("security", "Pin the compiler version with a pragma solidity directive")
            .with_impact(Impact::High)
            .into(),
    ])
}

fn solidity_visibility(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    Ok(SOL_FUNCTION
        .captures_iter(file.content)
        .filter(|function| !SOL_VISIBILITY.is_match(&function[1]))
        .map(|function| {
            let offset = function.get(0).map_or(0, |m| m.start());
            Issue::warning(
                line_of_offset(file.content, offset),
                "Function declared without explicit visibility modifier",
                "SOL_NO_VISIBILITY",
            )
            .into()
        })
        .collect())
}

fn vue_for_key(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    Ok(VUE_FOR_TAG
        .find_iter(file.content)
        .filter(|tag| !VUE_KEY.is_match(tag.as_str()))
        .map(|tag| {
            Issue::warning(
                line_of_offset(file.content, tag.start()),
                "v-for without :key binding",
                "VUE_MISSING_KEY",
            )
            .into()
        })
        .collect())
}

fn vue_if_with_for(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !VUE_FOR_TAG
        .find_iter(file.content)
        .any(|tag| VUE_IF.is_match(tag.as_str()))
    {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "performance",
            "Avoid v-if and v-for on the same element; filter the list in a computed property",
        )
        .with_impact(Impact::Medium)
        .into(),
    ])
}
