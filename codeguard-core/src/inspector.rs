//! Language detection and line distribution backed by `tokei`.

use std::collections::BTreeMap;

use tokei::{Config, LanguageType};

use crate::domain::{LanguageDistribution, SourceFile, extension_of};

/// Computes per-language line shares for a set of sources using `tokei`.
pub struct TokeiInspector {
    config: Config,
}

impl Default for TokeiInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl TokeiInspector {
    /// Create a new inspector with default `tokei` configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create a new inspector with a custom `tokei` configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Percentage of total lines contributed by each recognised language.
    ///
    /// Files in unknown languages and empty files are ignored; an input with
    /// no counted lines yields an empty distribution.
    pub fn distribution(&self, files: &[SourceFile]) -> LanguageDistribution {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0usize;

        for file in files {
            let Some(language) = language_of(&file.file_name) else {
                continue;
            };
            let stats = language.parse_from_str(&file.content, &self.config);
            let lines = stats.code + stats.comments + stats.blanks;
            if lines == 0 {
                continue;
            }
            total += lines;
            *counts.entry(language.to_string()).or_insert(0) += lines;
        }

        if total == 0 {
            return BTreeMap::new();
        }

        counts
            .into_iter()
            .map(|(language, count)| (language, (count as f64 / total as f64) * 100.0))
            .collect()
    }
}

fn language_of(file_name: &str) -> Option<LanguageType> {
    let extension = extension_of(file_name);
    if extension.is_empty() {
        return None;
    }
    LanguageType::from_file_extension(&extension)
}

/// Display name of the language a file is written in, when `tokei` knows it.
pub fn language_name(file_name: &str) -> Option<String> {
    language_of(file_name).map(|language| language.to_string())
}
