//! Design-pattern and anti-pattern recognition.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::{Confidence, DesignPattern, Finding, FindingCategory, Severity};
use crate::error::Result;
use crate::text::find_line_number;

const GOD_OBJECT_METHODS: usize = 15;
const CALLBACK_DEPTH: usize = 3;
const SPAGHETTI_COMPLEXITY: usize = 20;
const MAGIC_STRINGS: usize = 10;
const DUPLICATE_BLOCKS: usize = 3;
const DUPLICATE_MIN_CHARS: usize = 20;
const ARROW_LOOKAHEAD: usize = 20;

lazy_static! {
    static ref SINGLETON: Regex = Regex::new(
        r"(?is)class\s+\w+\s*\{.*?static\s+instance.*?constructor\s*\(\s*\)\s*\{.*?if\s*\(.*?instance.*?\)"
    )
    .unwrap();
    static ref FACTORY: Regex = Regex::new(r"(?i)function\s+create\w+|class\s+\w*Factory").unwrap();
    static ref OBSERVER: Regex = Regex::new(r"(?i)useEffect|addEventListener|subscribe").unwrap();
    static ref MODULE: Regex =
        Regex::new(r"\bexport\s+(default\b|\{|const\b|let\b|function\b|class\b|async\s+function\b)")
            .unwrap();
    static ref METHOD: Regex = Regex::new(r"\b(function|const\s+\w+\s*=\s*\()").unwrap();
    static ref CLASS: Regex = Regex::new(r"class\s+(\w+)").unwrap();
    static ref MAGIC_STRING: Regex = Regex::new(r#""[^"]{10,}"|'[^']{10,}'"#).unwrap();
    static ref DECISIONS: Vec<Regex> = [
        r"\bif\s*\(",
        r"\belse\s+if\s*\(",
        r"\bfor\s*\(",
        r"\bwhile\s*\(",
        r"\bcase\s+",
        r"\?\s*[^:]+:",
        r"&&",
        r"\|\|",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect();
}

pub(super) fn design_patterns(content: &str) -> Result<Vec<DesignPattern>> {
    let detectors: [(&Regex, &str, Confidence, &str); 4] = [
        (
            &SINGLETON,
            "Singleton Pattern",
            Confidence::High,
            "Singleton pattern detected - ensures only one instance exists",
        ),
        (
            &FACTORY,
            "Factory Pattern",
            Confidence::Medium,
            "Factory pattern detected - centralizes object creation",
        ),
        (
            &OBSERVER,
            "Observer Pattern",
            Confidence::Medium,
            "Observer pattern detected - reactive programming approach",
        ),
        (
            &MODULE,
            "Module Pattern",
            Confidence::High,
            "Module pattern detected - proper encapsulation",
        ),
    ];
    Ok(detectors
        .into_iter()
        .filter(|(pattern, ..)| pattern.is_match(content))
        .map(|(_, name, confidence, message)| DesignPattern {
            name: name.to_string(),
            confidence,
            message: message.to_string(),
        })
        .collect())
}

pub(super) fn anti_patterns(content: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    let method_count = METHOD.find_iter(content).count();
    if let Some(class) = CLASS.captures(content) {
        if method_count > GOD_OBJECT_METHODS {
            let line = find_line_number(content, &class[0]);
            findings.push(
                Finding::new(
                    FindingCategory::AntiPattern,
                    Severity::High,
                    format!(
                        "Class \"{}\" has {method_count} methods. Consider splitting responsibilities",
                        &class[1]
                    ),
                    line,
                )
                .named("God Object"),
            );
        }
    }

    let depth = callback_depth(content);
    if depth > CALLBACK_DEPTH {
        findings.push(
            Finding::new(
                FindingCategory::AntiPattern,
                Severity::High,
                format!(
                    "Deeply nested callbacks detected (depth: {depth}). Use async/await or Promises"
                ),
                1,
            )
            .named("Callback Hell"),
        );
    }

    let complexity = cyclomatic_complexity(content);
    if complexity > SPAGHETTI_COMPLEXITY {
        findings.push(
            Finding::new(
                FindingCategory::AntiPattern,
                Severity::High,
                format!(
                    "High cyclomatic complexity ({complexity}). Refactor into smaller functions"
                ),
                1,
            )
            .named("Spaghetti Code"),
        );
    }

    let magic_strings = MAGIC_STRING.find_iter(content).count();
    if magic_strings > MAGIC_STRINGS {
        findings.push(
            Finding::new(
                FindingCategory::AntiPattern,
                Severity::Medium,
                format!("{magic_strings} magic strings found. Consider using constants"),
                1,
            )
            .named("Magic Strings"),
        );
    }

    let duplicates = duplicate_lines(content);
    if duplicates > DUPLICATE_BLOCKS {
        findings.push(
            Finding::new(
                FindingCategory::AntiPattern,
                Severity::Medium,
                format!(
                    "{duplicates} duplicate code blocks found. Extract to reusable functions"
                ),
                1,
            )
            .named("Copy-Paste Programming"),
        );
    }

    Ok(findings)
}

/// Maximum nesting of parentheses that open an arrow-function callback.
///
/// A `(` counts as a callback opener when `=>` appears within the next
/// twenty characters; every `)` closes one level, never below zero.
pub fn callback_depth(content: &str) -> usize {
    let chars: Vec<char> = content.chars().collect();
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    for (index, &ch) in chars.iter().enumerate() {
        match ch {
            '(' if opens_callback(&chars[index..]) => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}

fn opens_callback(window: &[char]) -> bool {
    let end = window.len().min(ARROW_LOOKAHEAD);
    window[..end].windows(2).any(|pair| pair == ['=', '>'])
}

/// `1 +` the number of textual branch points in the file.
pub fn cyclomatic_complexity(content: &str) -> usize {
    1 + DECISIONS
        .iter()
        .map(|pattern| pattern.find_iter(content).count())
        .sum::<usize>()
}

/// Number of repeated occurrences of trimmed lines of at least twenty chars.
fn duplicate_lines(content: &str) -> usize {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = 0;
    for line in content.split('\n').map(str::trim) {
        if line.chars().count() < DUPLICATE_MIN_CHARS {
            continue;
        }
        let count = seen.entry(line).or_insert(0);
        if *count > 0 {
            duplicates += 1;
        }
        *count += 1;
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(findings: &[Finding]) -> Vec<&str> {
        findings.iter().filter_map(|f| f.name.as_deref()).collect()
    }

    #[test]
    fn detects_singleton() {
        let content = "class Store {\n  static instance;\n  constructor() {\n    if (Store.instance) { return Store.instance; }\n  }\n}";
        let patterns = design_patterns(content).expect("patterns");
        assert_eq!(patterns[0].name, "Singleton Pattern");
        assert_eq!(patterns[0].confidence, Confidence::High);
    }

    #[test]
    fn module_pattern_includes_default_exports() {
        let patterns = design_patterns("export default App;").expect("patterns");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name, "Module Pattern");
    }

    #[test]
    fn callback_depth_tracks_arrow_nesting() {
        let content = "a((x) => b((y) => c((z) => d((w) => 1))))";
        assert_eq!(callback_depth(content), 5);
        assert_eq!(callback_depth("f(1, 2)"), 0);
        assert_eq!(callback_depth(")))"), 0);
    }

    #[test]
    fn callback_hell_flagged_above_three() {
        let content = "a((x) => b((y) => c((z) => d((w) => 1))))";
        let findings = anti_patterns(content).expect("anti");
        assert!(names(&findings).contains(&"Callback Hell"));
    }

    #[test]
    fn cyclomatic_complexity_counts_branches() {
        assert_eq!(cyclomatic_complexity(""), 1);
        let content = "if (a && b) {} else if (c || d) {} for (;;) {} while (x) {}";
        // the bare `if` pattern also matches inside `else if`
        assert_eq!(cyclomatic_complexity(content), 8);
    }

    #[test]
    fn god_object_needs_a_class() {
        let functions = "function f() {}\n".repeat(16);
        assert!(anti_patterns(&functions).expect("anti").is_empty());
        let with_class = format!("class Everything {{}}\n{functions}");
        let findings = anti_patterns(&with_class).expect("anti");
        assert_eq!(names(&findings), vec!["God Object"]);
    }

    #[test]
    fn copy_paste_needs_more_than_three_repeats() {
        let line = "const result = computeSomething(input);\n";
        assert_eq!(duplicate_lines(&line.repeat(4)), 3);
        assert_eq!(duplicate_lines(&line.repeat(5)), 4);
        let findings = anti_patterns(&line.repeat(5)).expect("anti");
        assert!(names(&findings).contains(&"Copy-Paste Programming"));
    }

    #[test]
    fn magic_strings_are_medium() {
        let content = "'a long string value'\n".repeat(11);
        let findings = anti_patterns(&content).expect("anti");
        let magic = findings
            .iter()
            .find(|f| f.name.as_deref() == Some("Magic Strings"))
            .expect("magic strings");
        assert_eq!(magic.severity, Severity::Medium);
    }
}
