//! JavaScript, TypeScript and JSX checks.

use lazy_static::lazy_static;
use regex::Regex;

use super::{FileContext, Outcome, Rule};
use crate::domain::{FixKind, Impact, Issue, Suggestion};
use crate::error::Result;
use crate::text::{count_word, find_line_number, line_of_offset};

pub(super) const RULES: &[(&str, Rule)] = &[
    ("react-import", react_import),
    ("class-components", class_components),
    ("inline-styles", inline_styles),
    ("list-keys", list_keys),
    ("unused-imports", unused_imports),
    ("effect-dependencies", effect_dependencies),
    ("jquery", jquery),
    ("threejs-dispose", threejs_dispose),
    ("nextjs-links", nextjs_links),
];

lazy_static! {
    static ref NAMED_IMPORT: Regex = Regex::new(r"import\s+\{([^}]+)\}\s+from").unwrap();
    static ref STATE_HOOK: Regex =
        Regex::new(r"const\s*\[\s*(\w+)\s*,\s*\w+\s*\]\s*=\s*useState\b").unwrap();
    static ref EFFECT: Regex = Regex::new(
        r"(?s)useEffect\(\s*(?:async\s*)?\(\s*\)\s*=>\s*\{(.*?)\}\s*,\s*\[([^\]]*)\]\s*\)"
    )
    .unwrap();
    static ref JQUERY: Regex = Regex::new(r"(?m)\bjQuery\b|(?:^|[^\w$.])\$\(").unwrap();
    static ref THREE: Regex = Regex::new(r#"from\s+['"]three['"]|\bTHREE\."#).unwrap();
    static ref NEXT_NAVIGATION: Regex =
        Regex::new(r#"from\s+['"]next/(?:router|link|navigation)['"]"#).unwrap();
    static ref RAW_ANCHOR: Regex = Regex::new(r"<a(?:\s|>)").unwrap();
}

/// Local binding of one entry of a named import list.
pub(crate) fn local_binding(entry: &str) -> &str {
    match entry.split_once(" as ") {
        Some((_, alias)) => alias.trim(),
        None => entry.trim(),
    }
}

fn react_import(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let jsx_extension = matches!(file.extension.as_str(), "jsx" | "tsx");
    if !jsx_extension
        || file.content.contains("import React")
        || file.content.contains("import {")
    {
        return Ok(Vec::new());
    }
    Ok(vec![
        Issue::error(1, "Missing React import", "MISSING_IMPORT").into(),
        Suggestion::new("fix", "Add missing React import")
            .with_fix(FixKind::AddReactImport, "Add React import")
            .with_impact(Impact::High)
            .into(),
    ])
}

fn class_components(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let extends_component = file.content.contains("extends Component")
        || file.content.contains("extends React.Component");
    if !file.content.contains("class ") || !extends_component {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "modernization",
            "Consider converting class components to functional components with hooks",
        )
        .with_impact(Impact::High)
        .into(),
    ])
}

fn inline_styles(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !file.is_jsx_like() || !file.content.contains("style={{") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "performance",
            "Inline styles detected. Consider moving to CSS modules or styled-components",
        )
        .with_fix(FixKind::ExtractInlineStyles, "Extract inline styles to CSS")
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn list_keys(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !file.is_jsx_like() || !file.content.contains(".map(") || file.content.contains("key=") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Issue::warning(
            find_line_number(file.content, ".map("),
            "Missing \"key\" prop in list items",
            "MISSING_KEY",
        )
        .into(),
        Suggestion::new(
            "optimization",
            "Add a unique \"key\" prop to list items rendered with .map()",
        )
        .with_fix(FixKind::AddMissingKeys, "Add key prop to mapped elements")
        .with_impact(Impact::Medium)
        .into(),
    ])
}

fn unused_imports(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let mut outcomes = Vec::new();
    for import in NAMED_IMPORT.captures_iter(file.content) {
        for entry in import[1].split(',') {
            let name = local_binding(entry);
            if name.is_empty() {
                continue;
            }
            if count_word(file.content, name)? == 1 {
                outcomes.push(
                    Suggestion::new(
                        "optimization",
                        format!("Unused import detected: {name}. Remove to reduce bundle size"),
                    )
                    .with_fix(FixKind::RemoveUnusedImports, "Remove unused imports")
                    .with_impact(Impact::Low)
                    .into(),
                );
            }
        }
    }
    Ok(outcomes)
}

fn effect_dependencies(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let state: Vec<&str> = STATE_HOOK
        .captures_iter(file.content)
        .filter_map(|captures| captures.get(1).map(|name| name.as_str()))
        .collect();
    if state.is_empty() {
        return Ok(Vec::new());
    }

    let mut outcomes = Vec::new();
    for effect in EFFECT.captures_iter(file.content) {
        let body = &effect[1];
        let declared: Vec<&str> = effect[2].split(',').map(str::trim).collect();
        let line = line_of_offset(file.content, effect.get(0).map_or(0, |m| m.start()));
        for name in &state {
            if declared.contains(name) || count_word(body, name)? == 0 {
                continue;
            }
            outcomes.push(
                Issue::warning(
                    line,
                    format!("useEffect references \"{name}\" but it is missing from the dependency array"),
                    "MISSING_EFFECT_DEPENDENCY",
                )
                .into(),
            );
        }
    }
    Ok(outcomes)
}

fn jquery(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !JQUERY.is_match(file.content) {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "modernization",
            "jQuery usage detected. Prefer native DOM APIs or framework state",
        )
        .with_impact(Impact::Low)
        .into(),
    ])
}

fn threejs_dispose(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    let Some(usage) = THREE.find(file.content) else {
        return Ok(Vec::new());
    };
    if file.content.contains(".dispose(") {
        return Ok(Vec::new());
    }
    Ok(vec![
        Issue::warning(
            line_of_offset(file.content, usage.start()),
            "Three.js resources are never disposed - possible memory leak",
            "THREE_NO_DISPOSE",
        )
        .into(),
        Suggestion::new(
            "performance",
            "Call .dispose() on geometries, materials and textures when they are no longer needed",
        )
        .with_impact(Impact::High)
        .into(),
    ])
}

fn nextjs_links(file: &FileContext<'_>) -> Result<Vec<Outcome>> {
    if !NEXT_NAVIGATION.is_match(file.content) || !RAW_ANCHOR.is_match(file.content) {
        return Ok(Vec::new());
    }
    Ok(vec![
        Suggestion::new(
            "performance",
            "Use next/link <Link> instead of raw <a> tags for client-side navigation",
        )
        .with_impact(Impact::Medium)
        .into(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueKind;

    fn issues(outcomes: &[Outcome]) -> Vec<&Issue> {
        outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Issue(issue) => Some(issue),
                Outcome::Suggestion(_) => None,
            })
            .collect()
    }

    #[test]
    fn react_import_only_for_jsx_extensions() {
        let content = "export default () => <div />;";
        let jsx = FileContext::new("App.jsx", content);
        let outcomes = react_import(&jsx).expect("rule");
        assert_eq!(issues(&outcomes)[0].kind, IssueKind::Error);

        let js = FileContext::new("App.js", content);
        assert!(react_import(&js).expect("rule").is_empty());

        let named = FileContext::new("App.jsx", "import { useState } from 'react';");
        assert!(react_import(&named).expect("rule").is_empty());
    }

    #[test]
    fn missing_keys_warn_and_suggest_fix() {
        let content = "import React from 'react';\nconst List = () => items.map((item) => <li>{item}</li>);";
        let outcomes = list_keys(&FileContext::new("List.js", content)).expect("rule");
        assert_eq!(outcomes.len(), 2);
        assert_eq!(issues(&outcomes)[0].line, 2);

        let keyed = content.replace("<li>", "<li key={item}>");
        assert!(list_keys(&FileContext::new("List.js", &keyed)).expect("rule").is_empty());
    }

    #[test]
    fn unused_named_imports_respect_aliases() {
        let content = "import { useState, useMemo as memo } from 'react';\nuseState(0);";
        let outcomes = unused_imports(&FileContext::new("a.jsx", content)).expect("rule");
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            Outcome::Suggestion(suggestion) => {
                assert_eq!(
                    suggestion.message,
                    "Unused import detected: memo. Remove to reduce bundle size"
                );
            }
            other => panic!("expected suggestion, got {other:?}"),
        }
    }

    #[test]
    fn effect_dependency_heuristic() {
        let content = "const [count, setCount] = useState(0);\nconst [name, setName] = useState('');\nuseEffect(() => {\n  document.title = name + count;\n}, [count]);";
        let outcomes = effect_dependencies(&FileContext::new("a.jsx", content)).expect("rule");
        let found = issues(&outcomes);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("\"name\""));
        assert_eq!(found[0].line, 3);
    }

    #[test]
    fn jquery_detection_ignores_template_literals() {
        assert!(jquery(&FileContext::new("a.js", "$('#id').hide();")).expect("rule").len() == 1);
        assert!(jquery(&FileContext::new("a.js", "`${value}`")).expect("rule").is_empty());
    }

    #[test]
    fn threejs_without_dispose_warns() {
        let content = "import * as THREE from 'three';\nconst g = new THREE.BoxGeometry();";
        let outcomes = threejs_dispose(&FileContext::new("scene.js", content)).expect("rule");
        assert_eq!(issues(&outcomes)[0].code, "THREE_NO_DISPOSE");
        let disposed = format!("{content}\ng.dispose();");
        assert!(threejs_dispose(&FileContext::new("scene.js", &disposed)).expect("rule").is_empty());
    }

    #[test]
    fn nextjs_with_raw_anchor_suggests_link() {
        let content = "import Link from 'next/link';\nconst Nav = () => <a href=\"/about\">About</a>;";
        assert_eq!(nextjs_links(&FileContext::new("nav.jsx", content)).expect("rule").len(), 1);
    }
}
