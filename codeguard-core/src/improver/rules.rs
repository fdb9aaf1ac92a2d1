//! Deterministic whole-text rewrite rules.
//!
//! Every rule takes the current text and returns the rewritten text. Rules
//! are line or regex based and never parse the source; when nothing applies
//! the input is returned unchanged.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::analyzer::{FileFamily, is_commented_code, magic_number_literals};
use crate::domain::extension_of;
use crate::error::Result;
use crate::text::{count_word, indentation};

const INDENT_WIDTH: usize = 2;
const VIEWPORT_TAG: &str =
    "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">";
const CHARSET_TAG: &str = "<meta charset=\"UTF-8\">";
const REACT_IMPORT: &str = "import React from 'react';";
const NESTED_LOOP_NOTE: &str =
    "// TODO: Consider optimizing this nested loop with Map/Set or single-pass algorithm";
const EXTRACTED_STYLE_PREFIX: &str = "extracted-style-";

lazy_static! {
    static ref CONSOLE_CALL: Regex = Regex::new(r"\bconsole\.[A-Za-z_$][\w$]*\s*\(").unwrap();
    static ref VAR_KEYWORD: Regex = Regex::new(r"\bvar(\s+[A-Za-z_$])").unwrap();
    static ref IMPORT_CLAUSE: Regex =
        Regex::new(r#"^\s*import\s+(?:type\s+)?(.+?)\s+from\s+['"]"#).unwrap();
    static ref NAMED_CLAUSE: Regex = Regex::new(r"\{([^}]*)\}").unwrap();
    static ref MAP_CALLBACK: Regex =
        Regex::new(r"\.map\(\s*\(([^)]*)\)\s*=>\s*\(?\s*<([A-Za-z][\w.]*)").unwrap();
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head(\s[^>]*)?>").unwrap();
    static ref HEAD_CLOSE: Regex = Regex::new(r"(?i)</head\s*>").unwrap();
    static ref VIEWPORT: Regex = Regex::new(r#"(?i)<meta[^>]*name=["']viewport["']"#).unwrap();
    static ref CHARSET: Regex = Regex::new(r"(?i)<meta[^>]*charset=").unwrap();
    static ref IMG_TAG: Regex = Regex::new(r"(?i)<img\b([^>]*?)\s*(/?)>").unwrap();
    static ref ALT_ATTR: Regex = Regex::new(r"(?i)\balt\s*=").unwrap();
    static ref SRC_ATTR: Regex = Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#).unwrap();
    static ref CENTER: Regex = Regex::new(r"(?is)<center(?:\s[^>]*)?>(.*?)</center\s*>").unwrap();
    static ref FONT: Regex = Regex::new(r"(?is)<font\b([^>]*)>(.*?)</font\s*>").unwrap();
    static ref FONT_COLOR: Regex = Regex::new(r#"(?i)\bcolor\s*=\s*["']([^"']+)["']"#).unwrap();
    static ref FONT_SIZE: Regex = Regex::new(r#"(?i)\bsize\s*=\s*["']([^"']+)["']"#).unwrap();
    static ref MARQUEE: Regex = Regex::new(r"(?is)<marquee\b[^>]*>(.*?)</marquee\s*>").unwrap();
    static ref BLINK: Regex = Regex::new(r"(?is)<blink\b[^>]*>(.*?)</blink\s*>").unwrap();
    static ref STRIKE_OPEN: Regex = Regex::new(r"(?i)<strike(\s[^>]*)?>").unwrap();
    static ref STRIKE_CLOSE: Regex = Regex::new(r"(?i)</strike\s*>").unwrap();
    static ref TT_OPEN: Regex = Regex::new(r"(?i)<tt(\s[^>]*)?>").unwrap();
    static ref TT_CLOSE: Regex = Regex::new(r"(?i)</tt\s*>").unwrap();
    static ref BIG_OPEN: Regex = Regex::new(r"(?i)<big(\s[^>]*)?>").unwrap();
    static ref BIG_CLOSE: Regex = Regex::new(r"(?i)</big\s*>").unwrap();
    static ref JSX_STYLE: Regex = Regex::new(r"style=\{\{([^}]+)\}\}").unwrap();
    static ref NESTED_LOOP: Regex =
        Regex::new(r"for\s*\([^)]*\)[^{]*\{[^}]*?(for\s*\()").unwrap();
    static ref HTML_OPEN: Regex = Regex::new(r"(?i)<html(\s[^>]*)?>").unwrap();
    static ref LANG_ATTR: Regex = Regex::new(r"(?i)\blang\s*=").unwrap();
    static ref VOID_SLASH: Regex =
        Regex::new(r"(?i)<(br|hr|img|input|meta|link)\b([^>]*?)\s*/>").unwrap();
}

/// Apply `rewrite` to every line, keeping `\r` line endings intact.
fn map_lines(code: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    code.split('\n')
        .map(|line| match line.strip_suffix('\r') {
            Some(body) => format!("{}\r", rewrite(body)),
            None => rewrite(line),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte index of the `)` closing the `(` at `open`, skipping string literals.
fn closing_paren(code: &str, open: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut index = open;
    while index < bytes.len() {
        let byte = bytes[index];
        match quote {
            Some(_) if byte == b'\\' => index += 1,
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None => match byte {
                b'\'' | b'"' | b'`' => quote = Some(byte),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                _ => {}
            },
        }
        index += 1;
    }
    None
}

fn line_break_len(rest: &str) -> usize {
    if rest.starts_with("\r\n") {
        2
    } else if rest.starts_with('\n') {
        1
    } else {
        0
    }
}

/// Remove `console.*(...)` calls and the lines they leave blank.
pub(super) fn remove_console_logs(code: &str, _file_name: &str) -> Result<String> {
    let mut output = String::with_capacity(code.len());
    let mut cursor = 0;

    while let Some(call) = CONSOLE_CALL.find_at(code, cursor) {
        if code[..call.start()].ends_with('.') {
            output.push_str(&code[cursor..call.end()]);
            cursor = call.end();
            continue;
        }
        let Some(close) = closing_paren(code, call.end() - 1) else {
            break;
        };

        output.push_str(&code[cursor..call.start()]);
        let mut end = close + 1;
        let rest = &code[end..];
        end += rest.len() - rest.trim_start_matches([' ', '\t']).len();
        if code[end..].starts_with(';') {
            end += 1;
        }
        let rest = &code[end..];
        end += rest.len() - rest.trim_start_matches([' ', '\t']).len();

        let line_start = output.rfind('\n').map_or(0, |index| index + 1);
        let break_len = line_break_len(&code[end..]);
        let line_is_blank = output[line_start..].trim().is_empty()
            && (break_len > 0 || end == code.len());
        if line_is_blank {
            output.truncate(line_start);
            if break_len > 0 {
                end += break_len;
            } else if output.ends_with('\n') {
                output.pop();
                if output.ends_with('\r') {
                    output.pop();
                }
            }
        }
        cursor = end;
    }

    output.push_str(&code[cursor..]);
    Ok(output)
}

/// Replace `var` with `let` on lines containing `=`, otherwise `const`.
pub(super) fn replace_var(code: &str, _file_name: &str) -> Result<String> {
    Ok(map_lines(code, |line| {
        if !VAR_KEYWORD.is_match(line) {
            return line.to_string();
        }
        let keyword = if line.contains('=') { "let" } else { "const" };
        VAR_KEYWORD
            .replace_all(line, format!("{keyword}${{1}}").as_str())
            .into_owned()
    }))
}

/// Terminate unterminated `return`/`const`/`let`/`var` lines with `;`.
pub(super) fn add_semicolons(code: &str, _file_name: &str) -> Result<String> {
    Ok(map_lines(code, |line| {
        let trimmed = line.trim();
        let is_statement = ["return ", "const ", "let ", "var "]
            .iter()
            .any(|keyword| trimmed.contains(keyword));
        let continues = trimmed.ends_with([';', '{', '}', ',', '(', '[', '=', '>', '+', '-', '&', '|', '?', ':']);
        let is_comment = ["//", "/*", "*"].iter().any(|marker| trimmed.starts_with(marker));
        let is_module = trimmed.contains("import ") || trimmed.contains("export ");
        if trimmed.is_empty() || !is_statement || continues || is_comment || is_module {
            return line.to_string();
        }
        format!("{};", line.trim_end())
    }))
}

/// Strip trailing spaces and tabs from every line.
pub(super) fn trim_trailing_whitespace(code: &str, _file_name: &str) -> Result<String> {
    Ok(map_lines(code, |line| line.trim_end().to_string()))
}

/// Re-indent non-blank lines by bracket nesting, two spaces per level.
pub(super) fn fix_indentation(code: &str, _file_name: &str) -> Result<String> {
    let mut level = 0usize;
    Ok(map_lines(code, |line| {
        let trimmed = line.trim();
        if trimmed.starts_with(['}', ']', ')']) {
            level = level.saturating_sub(1);
        }
        let indented = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}{trimmed}", " ".repeat(level * INDENT_WIDTH))
        };
        if trimmed.ends_with(['{', '[', '(']) {
            level += 1;
        }
        indented
    }))
}

/// Local names bound by a single-line import, or `None` for side-effect imports.
fn import_bindings(line: &str) -> Option<Vec<String>> {
    let clause = IMPORT_CLAUSE.captures(line)?;
    let clause = clause.get(1)?.as_str();
    let mut bindings = Vec::new();

    if let Some(named) = NAMED_CLAUSE.captures(clause) {
        bindings.extend(
            named[1]
                .split(',')
                .map(|entry| match entry.split_once(" as ") {
                    Some((_, alias)) => alias.trim(),
                    None => entry.trim(),
                })
                .map(|name| name.trim_start_matches("type ").trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
    }
    let outside = NAMED_CLAUSE.replace(clause, "");
    for part in outside.split(',') {
        let part = part.trim();
        let name = match part.split_once(" as ") {
            Some((_, alias)) => alias.trim(),
            None => part,
        };
        if !name.is_empty() {
            bindings.push(name.to_string());
        }
    }
    Some(bindings)
}

/// Drop import lines whose every binding is unused in the rest of the file.
pub(super) fn remove_unused_imports(code: &str, _file_name: &str) -> Result<String> {
    let lines: Vec<&str> = code.split('\n').collect();
    let body = lines
        .iter()
        .filter(|line| !line.trim_start().starts_with("import "))
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    let mut kept = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(bindings) = import_bindings(line) {
            let mut used = bindings.is_empty();
            for name in &bindings {
                if count_word(&body, name)? > 0 {
                    used = true;
                    break;
                }
            }
            if !used {
                continue;
            }
        }
        kept.push(line);
    }
    Ok(kept.join("\n"))
}

/// Add `key={...}` to the first element returned by `.map((item, index) => ...)`.
///
/// A callback with a single parameter gains an `index` parameter.
pub(super) fn add_missing_keys(code: &str, _file_name: &str) -> Result<String> {
    let mut output = String::with_capacity(code.len());
    let mut cursor = 0;

    for callback in MAP_CALLBACK.captures_iter(code) {
        let (Some(whole), Some(params), Some(tag)) =
            (callback.get(0), callback.get(1), callback.get(2))
        else {
            continue;
        };
        let attributes = code[tag.end()..].split('>').next().unwrap_or_default();
        if attributes.contains("key=") {
            continue;
        }

        let parameters: Vec<&str> = params.as_str().split(',').map(str::trim).collect();
        let key = match parameters.get(1) {
            Some(index) if !index.is_empty() => index.to_string(),
            _ => "index".to_string(),
        };

        output.push_str(&code[cursor..params.start()]);
        if parameters.len() < 2 && !params.as_str().trim().is_empty() {
            output.push_str(&format!("{}, index", params.as_str().trim()));
        } else {
            output.push_str(params.as_str());
        }
        output.push_str(&code[params.end()..tag.end()]);
        output.push_str(&format!(" key={{{key}}}"));
        cursor = whole.end();
    }

    output.push_str(&code[cursor..]);
    Ok(output)
}

fn insert_into_head(code: &str, tag: &str, present: &Regex) -> String {
    if present.is_match(code) {
        return code.to_string();
    }
    if let Some(open) = HEAD_OPEN.find(code) {
        return format!("{}\n    {tag}{}", &code[..open.end()], &code[open.end()..]);
    }
    if let Some(close) = HEAD_CLOSE.find(code) {
        return format!("{}    {tag}\n{}", &code[..close.start()], &code[close.start()..]);
    }
    code.to_string()
}

/// Insert a viewport meta tag into `<head>`.
pub(super) fn add_viewport_meta(code: &str, _file_name: &str) -> Result<String> {
    Ok(insert_into_head(code, VIEWPORT_TAG, &VIEWPORT))
}

/// Insert `<meta charset="UTF-8">` into `<head>`.
pub(super) fn add_charset_meta(code: &str, _file_name: &str) -> Result<String> {
    Ok(insert_into_head(code, CHARSET_TAG, &CHARSET))
}

/// Remove `//` lines that read like code.
pub(super) fn remove_commented_code(code: &str, _file_name: &str) -> Result<String> {
    Ok(code
        .split('\n')
        .filter(|line| !is_commented_code(line))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Alt text from an image source: the file stem with `-`/`_` as spaces.
fn alt_text(attributes: &str) -> String {
    let stem = SRC_ATTR
        .captures(attributes)
        .and_then(|src| {
            let path = src.get(1)?.as_str();
            let name = path.rsplit('/').next().unwrap_or(path);
            name.split('.').next().map(str::to_string)
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "image".to_string());
    stem.replace(['-', '_'], " ")
}

/// Add a synthesized `alt` attribute to images lacking one.
pub(super) fn add_alt_attributes(code: &str, _file_name: &str) -> Result<String> {
    Ok(IMG_TAG
        .replace_all(code, |image: &Captures<'_>| {
            let attributes = &image[1];
            if ALT_ATTR.is_match(attributes) {
                return image[0].to_string();
            }
            let closing = if image[2].is_empty() { ">" } else { " />" };
            format!("<img{attributes} alt=\"{}\"{closing}", alt_text(attributes))
        })
        .into_owned())
}

/// Rewrite deprecated presentational tags to modern equivalents.
pub(super) fn replace_deprecated_tags(code: &str, _file_name: &str) -> Result<String> {
    let code = CENTER.replace_all(code, "<div style=\"text-align: center;\">${1}</div>");
    let code = FONT.replace_all(&code, |font: &Captures<'_>| {
        let mut style = Vec::new();
        if let Some(color) = FONT_COLOR.captures(&font[1]) {
            style.push(format!("color: {};", &color[1]));
        }
        if let Some(size) = FONT_SIZE.captures(&font[1]) {
            style.push(format!("font-size: {};", &size[1]));
        }
        if style.is_empty() {
            format!("<span>{}</span>", &font[2])
        } else {
            format!("<span style=\"{}\">{}</span>", style.join(" "), &font[2])
        }
    });
    let code = MARQUEE.replace_all(&code, "${1}");
    let code = BLINK.replace_all(&code, "${1}");
    let code = STRIKE_OPEN.replace_all(&code, "<s${1}>");
    let code = STRIKE_CLOSE.replace_all(&code, "</s>");
    let code = TT_OPEN.replace_all(&code, "<code${1}>");
    let code = TT_CLOSE.replace_all(&code, "</code>");
    let code = BIG_OPEN.replace_all(&code, "<span style=\"font-size: larger;\"${1}>");
    let code = BIG_CLOSE.replace_all(&code, "</span>");
    Ok(code.into_owned())
}

/// Prepend `<!DOCTYPE html>` when missing.
pub(super) fn add_doctype(code: &str, _file_name: &str) -> Result<String> {
    if code.trim_start().to_lowercase().starts_with("<!doctype") {
        return Ok(code.to_string());
    }
    Ok(format!("<!DOCTYPE html>\n{code}"))
}

/// Move `style={{...}}` objects into generated class names.
///
/// The extracted declarations are collected into a leading comment block.
pub(super) fn extract_inline_styles(code: &str, _file_name: &str) -> Result<String> {
    let existing = code.matches(EXTRACTED_STYLE_PREFIX).count();
    let mut extracted = Vec::new();
    let replaced = JSX_STYLE.replace_all(code, |style: &Captures<'_>| {
        let class_name = format!("{EXTRACTED_STYLE_PREFIX}{}", existing + extracted.len());
        extracted.push(format!(".{class_name} {{ {} }}", style[1].trim()));
        format!("className=\"{class_name}\"")
    });
    if extracted.is_empty() {
        return Ok(code.to_string());
    }
    Ok(format!(
        "/* Extracted styles - move to CSS file:\n{}\n*/\n{replaced}",
        extracted.join("\n")
    ))
}

/// Insert an optimisation note above each inner loop of a nested loop.
pub(super) fn annotate_nested_loops(code: &str, _file_name: &str) -> Result<String> {
    let lines: Vec<&str> = code.split('\n').collect();
    let mut targets: Vec<usize> = NESTED_LOOP
        .captures_iter(code)
        .filter_map(|nested| nested.get(1))
        .map(|inner| code[..inner.start()].matches('\n').count())
        .collect();
    targets.dedup();

    let mut output = Vec::with_capacity(lines.len() + targets.len());
    for (index, line) in lines.iter().enumerate() {
        let annotated = index > 0 && lines[index - 1].trim() == NESTED_LOOP_NOTE;
        if targets.contains(&index) && !annotated {
            output.push(format!("{}{NESTED_LOOP_NOTE}", indentation(line)));
        }
        output.push(line.to_string());
    }
    Ok(output.join("\n"))
}

/// Declare named constants for magic numbers not already declared.
///
/// Usage sites are left untouched.
pub(super) fn extract_magic_numbers(code: &str, file_name: &str) -> Result<String> {
    let python = FileFamily::from_file_name(file_name) == FileFamily::Python;
    let mut numbers: Vec<&str> = Vec::new();
    for number in magic_number_literals(code) {
        let declared = code.contains(&format!("CONSTANT_{number} ="));
        if !declared && !numbers.contains(&number) {
            numbers.push(number);
        }
    }
    if numbers.is_empty() {
        return Ok(code.to_string());
    }

    let (comment, declaration) = if python { ("#", "") } else { ("//", "const ") };
    let mut block = format!("{comment} Extracted constants (replace with meaningful names):\n");
    for number in numbers {
        let terminator = if python { "" } else { ";" };
        block.push_str(&format!("{declaration}CONSTANT_{number} = {number}{terminator}\n"));
    }
    Ok(format!("{block}\n{code}"))
}

/// Prepend a React import to JSX files lacking one.
pub(super) fn add_react_import(code: &str, file_name: &str) -> Result<String> {
    let jsx_like = matches!(extension_of(file_name).as_str(), "jsx" | "tsx")
        || code.contains("from 'react'")
        || code.contains("from \"react\"");
    if !jsx_like || code.contains("import React") {
        return Ok(code.to_string());
    }
    let mut lines: Vec<&str> = code.split('\n').collect();
    let first_import = lines
        .iter()
        .position(|line| line.trim_start().starts_with("import "))
        .unwrap_or(0);
    lines.insert(first_import, REACT_IMPORT);
    Ok(lines.join("\n"))
}

/// Add `lang="en"` to an `<html>` tag without one.
pub(super) fn add_html_lang(code: &str, _file_name: &str) -> Result<String> {
    let Some(html) = HTML_OPEN.captures(code) else {
        return Ok(code.to_string());
    };
    let attributes = html.get(1).map_or("", |attributes| attributes.as_str());
    if LANG_ATTR.is_match(attributes) {
        return Ok(code.to_string());
    }
    let Some(tag) = html.get(0) else {
        return Ok(code.to_string());
    };
    Ok(format!(
        "{}<html lang=\"en\"{attributes}>{}",
        &code[..tag.start()],
        &code[tag.end()..]
    ))
}

/// Remove the trailing slash from HTML void elements.
///
/// Script files are left alone: JSX requires self-closing tags.
pub(super) fn strip_void_slash(code: &str, file_name: &str) -> Result<String> {
    if FileFamily::from_file_name(file_name) == FileFamily::Script {
        return Ok(code.to_string());
    }
    Ok(VOID_SLASH.replace_all(code, "<${1}${2}>").into_owned())
}
