//! Cross-file import graph, cycle detection and unused imports.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Severity;
use crate::domain::SourceFile;
use crate::error::{Result, isolate};
use crate::text::count_word;

const RESOLVE_EXTENSIONS: [&str; 7] = ["js", "jsx", "ts", "tsx", "mjs", "cjs", "vue"];

lazy_static! {
    static ref IMPORT: Regex =
        Regex::new(r#"import\s+(?:\{([^}]+)\}|(\w+))\s+from\s+['"]([^'"]+)['"]"#).unwrap();
    static ref EXPORT: Regex =
        Regex::new(r"export\s+(?:default\s+)?(?:const|function|class)\s+(\w+)").unwrap();
}

/// One `import ... from '...'` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportSpec {
    /// Named bindings as written, including `as` aliases.
    pub named: Vec<String>,
    /// Default binding, when present.
    #[serde(default)]
    pub default: Option<String>,
    /// Module specifier.
    pub from: String,
}

impl ImportSpec {
    /// Local names this import introduces into the importing file.
    pub fn local_bindings(&self) -> Vec<&str> {
        let named = self.named.iter().map(|binding| match binding.split_once(" as ") {
            Some((_, alias)) => alias.trim(),
            None => binding.trim(),
        });
        self.default.as_deref().into_iter().chain(named).collect()
    }
}

/// A file's imports, exports and resolved in-project dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DependencyNode {
    /// Parsed import statements.
    pub imports: Vec<ImportSpec>,
    /// Names of exported declarations.
    pub exports: Vec<String>,
    /// File names of imported project files, in import order.
    pub dependencies: Vec<String>,
}

/// A cycle in the file-level import graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CircularDependency {
    /// Always high.
    pub severity: Severity,
    /// Cycle chain; the first file is repeated at the end.
    pub files: Vec<String>,
    /// Human-readable chain.
    pub message: String,
}

/// A named import never referenced elsewhere in its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnusedImport {
    /// Importing file.
    pub file_name: String,
    /// Local binding name.
    pub name: String,
    /// Module specifier.
    pub from: String,
}

/// Project-wide import analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyAnalysis {
    /// Per-file node, keyed by file name.
    pub dependency_graph: BTreeMap<String, DependencyNode>,
    /// Distinct cycles.
    pub circular_dependencies: Vec<CircularDependency>,
    /// Imports whose bindings are never used.
    pub unused_imports: Vec<UnusedImport>,
}

impl DependencyAnalysis {
    /// The analysis scoped to `file_name`: its own graph node, the cycles
    /// passing through it and its unused imports.
    pub fn for_file(&self, file_name: &str) -> DependencyAnalysis {
        DependencyAnalysis {
            dependency_graph: self
                .dependency_graph
                .get_key_value(file_name)
                .map(|(name, node)| (name.clone(), node.clone()))
                .into_iter()
                .collect(),
            circular_dependencies: self
                .circular_dependencies
                .iter()
                .filter(|cycle| cycle.files.iter().any(|file| file == file_name))
                .cloned()
                .collect(),
            unused_imports: self
                .unused_imports
                .iter()
                .filter(|unused| unused.file_name == file_name)
                .cloned()
                .collect(),
        }
    }
}

/// Build the import graph of `files` and detect cycles and unused imports.
pub fn analyze_dependencies(files: &[SourceFile]) -> DependencyAnalysis {
    let names: Vec<&str> = files.iter().map(|file| file.file_name.as_str()).collect();
    let mut analysis = DependencyAnalysis::default();

    for file in files {
        let imports = extract_imports(&file.content);
        let dependencies = imports
            .iter()
            .filter_map(|import| resolve(&file.file_name, &import.from, &names))
            .map(str::to_string)
            .collect();
        analysis.unused_imports.extend(isolate("unused-imports", || {
            unused_imports(&file.file_name, &file.content, &imports)
        }));
        analysis.dependency_graph.insert(
            file.file_name.clone(),
            DependencyNode {
                imports,
                exports: extract_exports(&file.content),
                dependencies,
            },
        );
    }

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    for name in analysis.dependency_graph.keys() {
        let mut path = Vec::new();
        let mut finished = HashSet::new();
        if let Some(cycle) = find_cycle(name, &analysis.dependency_graph, &mut path, &mut finished)
        {
            if seen.insert(canonical_rotation(&cycle)) {
                analysis.circular_dependencies.push(CircularDependency {
                    severity: Severity::High,
                    message: format!("Circular dependency detected: {}", cycle.join(" -> ")),
                    files: cycle,
                });
            }
        }
    }
    log::debug!(
        "dependency analysis over {} files: {} cycles",
        files.len(),
        analysis.circular_dependencies.len()
    );
    analysis
}

fn extract_imports(content: &str) -> Vec<ImportSpec> {
    IMPORT
        .captures_iter(content)
        .map(|captures| ImportSpec {
            named: captures
                .get(1)
                .map(|named| {
                    named
                        .as_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|binding| !binding.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            default: captures.get(2).map(|default| default.as_str().to_string()),
            from: captures[3].to_string(),
        })
        .collect()
}

fn extract_exports(content: &str) -> Vec<String> {
    EXPORT
        .captures_iter(content)
        .map(|captures| captures[1].to_string())
        .collect()
}

fn unused_imports(file_name: &str, content: &str, imports: &[ImportSpec]) -> Result<Vec<UnusedImport>> {
    let mut unused = Vec::new();
    for import in imports {
        for name in import.local_bindings() {
            if count_word(content, name)? == 1 {
                unused.push(UnusedImport {
                    file_name: file_name.to_string(),
                    name: name.to_string(),
                    from: import.from.clone(),
                });
            }
        }
    }
    Ok(unused)
}

/// Map an import specifier to one of the project's file names.
///
/// Exact names win, then relative paths with the usual extensions and
/// `index` files, then a bare stem match.
fn resolve<'a>(importer: &str, specifier: &str, names: &[&'a str]) -> Option<&'a str> {
    if let Some(name) = names.iter().find(|name| **name == specifier) {
        return Some(name);
    }
    if specifier.starts_with('.') {
        let base = parent_dir(importer);
        let target = normalize(&format!("{base}{specifier}"));
        let mut candidates = vec![target.clone()];
        candidates.extend(RESOLVE_EXTENSIONS.iter().map(|ext| format!("{target}.{ext}")));
        candidates.extend(RESOLVE_EXTENSIONS.iter().map(|ext| format!("{target}/index.{ext}")));
        for candidate in &candidates {
            if let Some(name) = names.iter().find(|name| normalize(name) == *candidate) {
                return Some(name);
            }
        }
    }
    let stem = specifier.rsplit('/').next().unwrap_or(specifier);
    names
        .iter()
        .find(|name| {
            let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
            let file_stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
            !stem.is_empty() && file_stem == stem && **name != importer
        })
        .copied()
}

fn parent_dir(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(index) => &path[..=index],
        None => "",
    }
}

fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Depth-first search for the first cycle reachable from `node`.
///
/// The returned chain starts and ends with the repeated file.
fn find_cycle(
    node: &str,
    graph: &BTreeMap<String, DependencyNode>,
    path: &mut Vec<String>,
    finished: &mut HashSet<String>,
) -> Option<Vec<String>> {
    if let Some(start) = path.iter().position(|visited| visited == node) {
        let mut cycle = path[start..].to_vec();
        cycle.push(node.to_string());
        return Some(cycle);
    }
    if finished.contains(node) {
        return None;
    }
    let entry = graph.get(node)?;
    path.push(node.to_string());
    for dependency in &entry.dependencies {
        if let Some(cycle) = find_cycle(dependency, graph, path, finished) {
            return Some(cycle);
        }
    }
    path.pop();
    finished.insert(node.to_string());
    None
}

/// Rotation-independent key of a closed cycle chain.
fn canonical_rotation(cycle: &[String]) -> Vec<String> {
    let ring = &cycle[..cycle.len().saturating_sub(1)];
    (0..ring.len())
        .map(|shift| {
            ring[shift..]
                .iter()
                .chain(&ring[..shift])
                .cloned()
                .collect::<Vec<_>>()
        })
        .min()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content: &str) -> SourceFile {
        SourceFile::new(name, content)
    }

    #[test]
    fn extracts_named_default_and_exports() {
        let content = "import React from 'react';\nimport { a, b as c } from './util';\nexport const x = 1;\nexport default function App() {}";
        let imports = extract_imports(content);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].default.as_deref(), Some("React"));
        assert_eq!(imports[1].named, vec!["a", "b as c"]);
        assert_eq!(imports[1].local_bindings(), vec!["a", "c"]);
        assert_eq!(extract_exports(content), vec!["x", "App"]);
    }

    #[test]
    fn resolves_relative_paths_and_index_files() {
        let names = ["src/App.jsx", "src/util/index.js", "src/lib/math.ts"];
        assert_eq!(resolve("src/App.jsx", "./util", &names), Some("src/util/index.js"));
        assert_eq!(resolve("src/util/index.js", "../lib/math", &names), Some("src/lib/math.ts"));
        assert_eq!(resolve("src/App.jsx", "react", &names), None);
    }

    #[test]
    fn detects_two_file_cycle_for_both_files() {
        let files = vec![
            file("A.js", "import { b } from './B';\nexport const a = b;"),
            file("B.js", "import { a } from './A';\nexport const b = a;"),
        ];
        let analysis = analyze_dependencies(&files);
        assert_eq!(analysis.circular_dependencies.len(), 1);
        assert_eq!(analysis.circular_dependencies[0].files, vec!["A.js", "B.js", "A.js"]);
        for name in ["A.js", "B.js"] {
            assert_eq!(analysis.for_file(name).circular_dependencies.len(), 1);
        }
    }

    #[test]
    fn per_file_view_keeps_only_its_own_node() {
        let files = vec![
            file("A.js", "import { b } from './B';\nexport const a = b;"),
            file("B.js", "export const b = 1;"),
            file("C.js", "export const c = 2;"),
        ];
        let analysis = analyze_dependencies(&files);
        assert_eq!(analysis.dependency_graph.len(), 3);

        let scoped = analysis.for_file("A.js");
        assert_eq!(scoped.dependency_graph.len(), 1);
        assert_eq!(scoped.dependency_graph["A.js"].dependencies, vec!["B.js"]);
        assert!(analysis.for_file("missing.js").dependency_graph.is_empty());
    }

    #[test]
    fn cycle_is_trimmed_to_repeated_node() {
        let files = vec![
            file("C.js", "import { a } from './A';"),
            file("A.js", "import { b } from './B';"),
            file("B.js", "import { a } from './A';"),
        ];
        let analysis = analyze_dependencies(&files);
        assert_eq!(analysis.circular_dependencies.len(), 1);
        assert!(analysis.for_file("C.js").circular_dependencies.is_empty());
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let files = vec![
            file("a.js", "import { b } from './b';\nb();"),
            file("b.js", "export function b() {}"),
        ];
        let analysis = analyze_dependencies(&files);
        assert!(analysis.circular_dependencies.is_empty());
        assert_eq!(analysis.dependency_graph["a.js"].dependencies, vec!["b.js"]);
        assert!(analysis.unused_imports.is_empty());
    }

    #[test]
    fn lists_unused_imports() {
        let files = vec![
            file("a.js", "import { used, idle } from './b';\nused();"),
            file("b.js", ""),
        ];
        let analysis = analyze_dependencies(&files);
        assert_eq!(analysis.unused_imports.len(), 1);
        assert_eq!(analysis.unused_imports[0].name, "idle");
        assert!(analysis.for_file("b.js").unused_imports.is_empty());
    }
}
