//! Checks that apply to every file family.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::{FileContext, Outcome, Rule};
use crate::domain::{FixKind, Impact, Issue, Suggestion};
use crate::error::Result;
use crate::text::{count_matches, find_line_number, indentation, line_of_offset};

const MAX_FILE_LINES: usize = 300;
const MAX_NESTING: usize = 5;
const MAGIC_NUMBER_THRESHOLD: usize = 3;
const ALLOWED_NUMBERS: [&str; 6] = ["0", "1", "2", "10", "100", "1000"];
const DUPLICATE_MIN_CHARS: usize = 30;
const DUPLICATE_MAX_REPEATS: usize = 2;
const COMMENTED_CODE_LINES: usize = 3;
const MAX_FUNCTION_LINES: usize = 50;
const TRAILING_WHITESPACE_LINES: usize = 3;
const MAX_BRANCHES: usize = 20;
const MAX_FUNCTIONS: usize = 10;

pub(super) const RULES: &[(&str, Rule)] = &[
    ("debug-statements", debug_statements),
    ("var-usage", var_usage),
    ("todo-comments", todo_comments),
    ("file-length", file_length),
    ("complexity", complexity),
    ("nesting-depth", nesting_depth),
    ("magic-numbers", magic_numbers),
    ("duplicate-lines", duplicate_lines),
    ("nested-loops", nested_loops),
    ("commented-code", commented_code),
    ("long-functions", long_functions),
    ("long-parameters", long_parameters),
    ("function-count", function_count),
    ("trailing-whitespace", trailing_whitespace),
];

lazy_static! {
    static ref VAR_DECLARATION: Regex = Regex::new(r"\bvar\s+[A-Za-z_$]").unwrap();
    static ref NUMBER: Regex = Regex::new(r"\b\d{2,}\b").unwrap();
    static ref NESTED_LOOP: Regex =
        Regex::new(r"for\s*\([^)]*\)[^{]*\{[^}]*for\s*\(").unwrap();
    static ref FUNCTION_BLOCK: Regex =
        Regex::new(r"(?s)function\s+\w+\s*\([^)]*\)\s*\{.*?\n\}").unwrap();
    static ref ARROW_BLOCK: Regex =
        Regex::new(r"(?s)const\s+\w+\s*=\s*\([^)]*\)\s*=>\s*\{.*?\n\}").unwrap();
    static ref BRANCH: Regex = Regex::new(r"if\s*\(|else|for\s*\(|while\s*\(|switch\s*\(").unwrap();
    static ref FUNCTION_DECLARATION: Regex =
        Regex::new(r"function\s+\w+|const\s+\w+\s*=\s*\(").unwrap();
    static ref LONG_PARAMETERS: Regex = Regex::new(r"function\s+\w+\s*\(([^)]{50,})\)").unwrap();
}

/// Whether a line is a `//` comment that reads like code.
pub(crate) fn is_commented_code(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("//")
        && ["function", "const", "let", "var", "=", "return"]
            .iter()
            .any(|keyword| trimmed.contains(keyword))
}

/// Two-plus-digit numeric literals that are not in the allowlist.
pub(crate) fn magic_number_literals(content: &str) -> Vec<&str> {
    NUMBER
        .find_iter(content)
        .map(|number| number.as_str())
        .filter(|number| !ALLOWED_NUMBERS.contains(number))
        .collect()
}

fn has_trailing_whitespace(line: &str) -> bool {
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.ends_with(' ') || line.ends_with('\t')
}

fn debug_statements(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !file.content.contains("console.log") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Issue::warning(
            find_line_number(file.content, "console.log"),
            "console.log() found - should be removed in production",
            "CONSOLE_LOG",
        )
        .into(),
        Suggestion::new(
            "optimization",
            "Remove console.log statements or use a proper logging library",
        )
        .with_fix(FixKind::RemoveConsoleLogs, "Remove all console.log statements")
        .with_impact(Impact::Low)
        .into(),
    ])
}

fn var_usage(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let Some(found) = VAR_DECLARATION.find(file.content) else {
        return Ok(Vec::new());
    };
    Ok(vec![
        Issue::warning(
            line_of_offset(file.content, found.start()),
            "Using \"var\" instead of \"let\" or \"const\"",
            "USE_VAR",
        )
        .into(),
        Suggestion::new(
            "modernization",
            "Replace \"var\" with \"const\" or \"let\" for better scoping",
        )
        .with_fix(FixKind::ReplaceVar, "Replace var with const/let")
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn todo_comments(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let line = file
        .lines
        .iter()
        .position(|line| line.contains("TODO") || line.contains("FIXME"));
    Ok(line
        .map(|index| Issue::info(index + 1, "TODO/FIXME comment found", "TODO_COMMENT").into())
        .into_iter()
        .collect())
}

fn file_length(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let lines = file.lines.len();
    if lines <= MAX_FILE_LINES {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "maintainability",
            format!("Large file ({lines} lines). Consider splitting into smaller, focused modules"),
        )
        .with_impact(Impact::Medium)
        .into(),
    ])
}

/// Counts `if (`, `else`, `for (`, `while (` and `switch (` occurrences.
fn complexity(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if count_matches(file.content, &BRANCH) <= MAX_BRANCHES {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "complexity",
            "High cyclomatic complexity. Consider simplifying logic or using pattern matching",
        )
        .with_impact(Impact::High)
        .into(),
    ])
}

fn nesting_depth(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let depth = file
        .lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indentation(line).chars().count() / 2)
        .max()
        .unwrap_or(0);
    if depth <= MAX_NESTING {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "complexity",
            format!(
                "Deep nesting detected (level {depth}). Consider early returns or extracting functions"
            ),
        )
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn magic_numbers(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if magic_number_literals(file.content).len() < MAGIC_NUMBER_THRESHOLD {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "readability",
            "Magic numbers found. Consider using named constants for better code clarity",
        )
        .with_fix(FixKind::ExtractMagicNumbers, "Extract magic numbers to constants")
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn duplicate_lines(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in file.lines.iter().map(|line| line.trim()) {
        if line.chars().count() >= DUPLICATE_MIN_CHARS {
            *counts.entry(line).or_insert(0) += 1;
        }
    }
    if counts.values().all(|&count| count <= DUPLICATE_MAX_REPEATS) {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "maintainability",
            "Duplicate code detected. Consider extracting into reusable functions or components",
        )
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn nested_loops(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !NESTED_LOOP.is_match(file.content) {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "performance",
            "Nested loops detected. Consider optimizing with Map, Set, or single-pass algorithms",
        )
        .with_fix(
            FixKind::AnnotateNestedLoops,
            "Add optimization comment for nested loops",
        )
        .with_impact(Impact::High)
        .into(),
    ])
}

fn commented_code(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let lines = file.lines.iter().filter(|line| is_commented_code(line)).count();
    if lines <= COMMENTED_CODE_LINES {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "cleanliness",
            "Commented out code found. Remove dead code to keep codebase clean",
        )
        .with_fix(FixKind::RemoveCommentedCode, "Remove commented out code")
        .with_impact(Impact::Low)
        .into(),
    ])
}

fn long_functions(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    Ok(FUNCTION_BLOCK
        .find_iter(file.content)
        .chain(ARROW_BLOCK.find_iter(file.content))
        .map(|function| function.as_str().split('\n').count())
        .filter(|&lines| lines > MAX_FUNCTION_LINES)
        .map(|lines| {
            Suggestion::new(
                "maintainability",
                format!(
                    "Long function detected ({lines} lines). Consider breaking into smaller functions for better readability"
                ),
            )
            .with_impact(Impact::High)
            .into()
        })
        .collect())
}

fn long_parameters(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !LONG_PARAMETERS.is_match(file.content) {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "maintainability",
            "Long parameter list detected. Consider using object destructuring or parameter objects",
        )
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn function_count(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if count_matches(file.content, &FUNCTION_DECLARATION) <= MAX_FUNCTIONS {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "maintainability",
            "Consider breaking down large functions into smaller ones",
        )
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn trailing_whitespace(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let lines = file
        .lines
        .iter()
        .filter(|line| has_trailing_whitespace(line))
        .count();
    if lines <= TRAILING_WHITESPACE_LINES {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "formatting",
            format!("Trailing whitespace found on {lines} lines"),
        )
        .with_fix(FixKind::TrimTrailingWhitespace, "Remove trailing whitespace")
        .with_impact(Impact::Low)
        .into(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestions(outcomes: Vec<Outcome>) -> Vec<Suggestion> {
        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Outcome::Suggestion(suggestion) => Some(suggestion),
                Outcome::Issue(_) => None,
            })
            .collect()
    }

    #[test]
    fn console_log_warns_on_first_line_found() {
        let context = FileContext::new("a.js", "let a = 1;\nconsole.log(a);");
        let outcomes = debug_statements(&context).expect("rule");
        match &outcomes[0] {
            Outcome::Issue(issue) => {
                assert_eq!(issue.line, 2);
                assert_eq!(issue.code, "CONSOLE_LOG");
            }
            other => panic!("expected issue, got {other:?}"),
        }
    }

    #[test]
    fn var_requires_a_declaration() {
        let context = FileContext::new("a.js", "const variance = 1; // var");
        assert!(var_usage(&context).expect("rule").is_empty());
        let context = FileContext::new("a.js", "var x = 1;");
        assert_eq!(var_usage(&context).expect("rule").len(), 2);
    }

    #[test]
    fn magic_numbers_skip_allowlist() {
        assert_eq!(magic_number_literals("10 100 1000 42 7 365"), vec!["42", "365"]);
        let context = FileContext::new("a.js", "a = 42; b = 365; c = 10;");
        assert!(magic_numbers(&context).expect("rule").is_empty());
        let context = FileContext::new("a.js", "a = 42; b = 365; c = 86;");
        let found = suggestions(magic_numbers(&context).expect("rule"));
        assert_eq!(found[0].fix_kind, Some(FixKind::ExtractMagicNumbers));
    }

    #[test]
    fn nesting_depth_above_five_levels() {
        let shallow = FileContext::new("a.js", "          x");
        assert!(nesting_depth(&shallow).expect("rule").is_empty());
        let deep = FileContext::new("a.js", "            x");
        assert_eq!(nesting_depth(&deep).expect("rule").len(), 1);
    }

    #[test]
    fn duplicate_lines_need_three_occurrences() {
        let line = "const configuration = loadConfiguration();\n";
        let content = line.repeat(2);
        let twice = FileContext::new("a.js", &content);
        assert!(duplicate_lines(&twice).expect("rule").is_empty());
        let content = line.repeat(3);
        let thrice = FileContext::new("a.js", &content);
        assert_eq!(duplicate_lines(&thrice).expect("rule").len(), 1);
    }

    #[test]
    fn commented_code_detection() {
        assert!(is_commented_code("  // const x = 1;"));
        assert!(!is_commented_code("// explains the algorithm"));
        assert!(!is_commented_code("const x = 1; // trailing"));
        let content = "// const a = 1;\n// let b = 2;\n// return c;\n// x = y;\n";
        let context = FileContext::new("a.js", content);
        let found = suggestions(commented_code(&context).expect("rule"));
        assert_eq!(found[0].fix_kind, Some(FixKind::RemoveCommentedCode));
    }

    #[test]
    fn long_function_reports_line_count() {
        let body = "  step();\n".repeat(55);
        let content = format!("function work() {{\n{body}}}\n");
        let context = FileContext::new("a.js", &content);
        let found = suggestions(long_functions(&context).expect("rule"));
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("(57 lines)"), "{}", found[0].message);
    }

    #[test]
    fn trailing_whitespace_above_three_lines() {
        let context = FileContext::new("a.js", "a \nb\t\nc \nd \ne");
        let found = suggestions(trailing_whitespace(&context).expect("rule"));
        assert_eq!(found[0].fix_kind, Some(FixKind::TrimTrailingWhitespace));
        let crlf = FileContext::new("a.js", "a\r\nb\r\nc\r\nd\r\n");
        assert!(trailing_whitespace(&crlf).expect("rule").is_empty());
    }

    #[test]
    fn branchy_code_is_flagged_as_complex() {
        let branch = "function pick(a) { if (a) { return 1; } else { return 2; } }\n";
        let content = branch.repeat(10);
        let ten = FileContext::new("a.js", &content);
        assert!(complexity(&ten).expect("rule").is_empty());

        let content = branch.repeat(11);
        let eleven = FileContext::new("a.js", &content);
        let found = suggestions(complexity(&eleven).expect("rule"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, "complexity");
        assert_eq!(found[0].impact, Some(Impact::High));
        assert!(!found[0].auto_fix);
    }

    #[test]
    fn many_functions_suggest_splitting() {
        let content: String = (0..10).map(|n| format!("function f{n}() {{}}\n")).collect();
        let ten = FileContext::new("a.js", &content);
        assert!(function_count(&ten).expect("rule").is_empty());

        let content = format!("{content}const g = (x) => x;\n");
        let eleven = FileContext::new("a.js", &content);
        let found = suggestions(function_count(&eleven).expect("rule"));
        assert_eq!(found[0].category, "maintainability");
        assert_eq!(found[0].impact, Some(Impact::Medium));
    }

    #[test]
    fn analyze_file_reports_complexity_and_function_count() {
        let content: String = (0..12)
            .map(|n| format!("function f{n}(a) {{ if (a) {{ return 1; }} else {{ return 2; }} }}\n"))
            .collect();
        let report = super::super::analyze_file("branchy.js", &content, "js");
        let messages: Vec<&str> = report.suggestions.iter().map(|s| s.message.as_str()).collect();
        assert!(messages.contains(
            &"High cyclomatic complexity. Consider simplifying logic or using pattern matching"
        ));
        assert!(messages.contains(&"Consider breaking down large functions into smaller ones"));
    }
}
