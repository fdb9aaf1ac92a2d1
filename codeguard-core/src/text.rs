//! Line and pattern primitives shared by every analyzer.
//!
//! All helpers are total: a missing needle yields a default value rather
//! than an error, so callers can treat "not found" as "start of file".

use regex::Regex;

use crate::error::Result;

/// Return the 1-based line of the first line containing `needle`.
///
/// Falls back to `1` when the needle does not occur.
pub fn find_line_number(content: &str, needle: &str) -> usize {
    content
        .split('\n')
        .position(|line| line.contains(needle))
        .map(|index| index + 1)
        .unwrap_or(1)
}

/// Case-insensitive variant of [`find_line_number`].
pub fn find_line_number_ignore_case(content: &str, needle: &str) -> usize {
    let needle = needle.to_lowercase();
    content
        .split('\n')
        .position(|line| line.to_lowercase().contains(&needle))
        .map(|index| index + 1)
        .unwrap_or(1)
}

/// Count non-overlapping matches of `pattern` in `content`.
pub fn count_matches(content: &str, pattern: &Regex) -> usize {
    pattern.find_iter(content).count()
}

/// Split content into lines on `\n`, keeping a trailing empty line.
///
/// An empty document is one empty line.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split('\n').collect()
}

/// Return the 1-based line that contains the byte at `offset`.
pub fn line_of_offset(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Count whole-word occurrences of `word`.
pub fn count_word(content: &str, word: &str) -> Result<usize> {
    if word.is_empty() {
        return Ok(0);
    }
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(word)))?;
    Ok(pattern.find_iter(content).count())
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((index, _)) => &content[..index],
        None => content,
    }
}

/// Leading whitespace of a line.
pub fn indentation(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}
