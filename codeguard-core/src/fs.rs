//! Filesystem abstractions and the source loading filter.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::domain::{SourceFile, extension_of};
use crate::error::Result;

/// Extensions accepted by [`load_sources`].
pub const SUPPORTED_EXTENSIONS: [&str; 14] = [
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "css", "html", "htm", "json", "py", "php", "sol",
    "vue",
];

/// Default per-file size limit: 1 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Abstraction over filesystem access for testability.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    /// List all files reachable from the root path; a file root lists itself.
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>>;
    /// Read a file into a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Size of a file in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone)]
pub struct StdFileSystem;

impl StdFileSystem {
    /// Create a new standard filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for StdFileSystem {
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if is_system_entry(Path::new(&entry.file_name())) {
                    continue;
                }
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// Options for [`load_sources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Why a file was left out of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Hidden or operating-system metadata entry.
    System,
    /// Extension not in [`SUPPORTED_EXTENSIONS`].
    Unsupported,
    /// Larger than [`LoadOptions::max_file_size`].
    TooLarge,
    /// Same name and size as an already loaded file.
    Duplicate,
}

/// A file left out of a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    /// Path as listed.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of [`load_sources`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSources {
    /// Accepted files, named relative to their root.
    pub files: Vec<SourceFile>,
    /// Files left out, in listing order.
    pub skipped: Vec<SkippedSource>,
}

/// Load analyzable sources from one or more roots.
///
/// Hidden entries, `__MACOSX` folders and `.DS_Store` files are skipped, as
/// are unsupported extensions, oversized files and files with the same
/// relative name and size as one already loaded.
pub fn load_sources<F: FileSystem>(
    fs: &F,
    roots: &[PathBuf],
    options: &LoadOptions,
) -> Result<LoadedSources> {
    let mut loaded = LoadedSources::default();
    let mut seen: Vec<(String, u64)> = Vec::new();

    for root in roots {
        for path in fs.list_files(root)? {
            let name = relative_name(root, &path);
            let reason = if is_system_entry(Path::new(&name)) {
                Some(SkipReason::System)
            } else if !SUPPORTED_EXTENSIONS.contains(&extension_of(&name).as_str()) {
                Some(SkipReason::Unsupported)
            } else {
                None
            };
            if let Some(reason) = reason {
                loaded.skipped.push(SkippedSource { path, reason });
                continue;
            }

            let size = fs.file_size(&path)?;
            let reason = if size > options.max_file_size {
                Some(SkipReason::TooLarge)
            } else if seen.contains(&(name.clone(), size)) {
                Some(SkipReason::Duplicate)
            } else {
                None
            };
            if let Some(reason) = reason {
                log::debug!("skipping {}: {reason:?}", path.display());
                loaded.skipped.push(SkippedSource { path, reason });
                continue;
            }

            let content = fs.read_to_string(&path)?;
            seen.push((name.clone(), size));
            loaded.files.push(SourceFile::new(name, content));
        }
    }

    Ok(loaded)
}

/// Name of `path` relative to `root` with `/` separators.
///
/// A file root is named by its file name.
fn relative_name(root: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative,
        _ => Path::new(path.file_name().unwrap_or(path.as_os_str())),
    };
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_system_entry(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(part) => {
            let part = part.to_string_lossy();
            part.starts_with('.') || part == "__MACOSX"
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn mock_with(files: Vec<(&'static str, u64, &'static str)>) -> MockFileSystem {
        let mut fs = MockFileSystem::new();
        let listed: Vec<PathBuf> = files.iter().map(|(path, ..)| PathBuf::from(path)).collect();
        fs.expect_list_files().returning(move |_| Ok(listed.clone()));
        let sizes = files.clone();
        fs.expect_file_size().returning(move |path| {
            Ok(sizes
                .iter()
                .find(|(name, ..)| Path::new(name) == path)
                .map(|(_, size, _)| *size)
                .unwrap_or(0))
        });
        fs.expect_read_to_string().returning(move |path| {
            Ok(files
                .iter()
                .find(|(name, ..)| Path::new(name) == path)
                .map(|(.., content)| content.to_string())
                .unwrap_or_default())
        });
        fs
    }

    #[test]
    fn load_sources_filters_system_and_unsupported_files() {
        let fs = mock_with(vec![
            ("/repo/src/App.jsx", 10, "export default App;"),
            ("/repo/.git/config", 5, ""),
            ("/repo/__MACOSX/src/._App.jsx", 5, ""),
            ("/repo/src/.DS_Store", 5, ""),
            ("/repo/logo.png", 5, ""),
        ]);
        let loaded = load_sources(&fs, &[PathBuf::from("/repo")], &LoadOptions::default())
            .expect("load");
        assert_eq!(loaded.files.len(), 1);
        assert_eq!(loaded.files[0].file_name, "src/App.jsx");
        assert_eq!(loaded.files[0].file_type, "jsx");
        let reasons: Vec<SkipReason> = loaded.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::System,
                SkipReason::System,
                SkipReason::System,
                SkipReason::Unsupported
            ]
        );
    }

    #[test]
    fn load_sources_enforces_size_limit() {
        let fs = mock_with(vec![("/repo/big.js", 2048, "x"), ("/repo/small.js", 10, "y")]);
        let options = LoadOptions { max_file_size: 1024 };
        let loaded = load_sources(&fs, &[PathBuf::from("/repo")], &options).expect("load");
        assert_eq!(loaded.files.len(), 1);
        assert_eq!(loaded.skipped[0].reason, SkipReason::TooLarge);
    }

    #[test]
    fn load_sources_drops_duplicates_across_roots() {
        let fs = mock_with(vec![("/a/index.html", 42, "<html></html>")]);
        let roots = [PathBuf::from("/a"), PathBuf::from("/a")];
        let loaded = load_sources(&fs, &roots, &LoadOptions::default()).expect("load");
        assert_eq!(loaded.files.len(), 1);
        assert_eq!(loaded.skipped[0].reason, SkipReason::Duplicate);
    }

    #[test]
    fn relative_name_of_file_root_is_file_name() {
        let path = Path::new("/tmp/page.html");
        assert_eq!(relative_name(path, path), "page.html");
    }

    #[test]
    fn std_filesystem_lists_reads_and_sizes_files() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(root.join(".hidden")).expect("create temp dir");
        let file_path = root.join("hello.js");
        std::fs::write(&file_path, "hello codeguard").expect("write test file");
        std::fs::write(root.join(".hidden").join("secret.js"), "x").expect("write hidden");

        let fs = StdFileSystem::new();
        let files = fs.list_files(&root).expect("list files");
        assert_eq!(files, vec![file_path.clone()]);
        assert_eq!(fs.list_files(&file_path).expect("list file"), vec![file_path.clone()]);

        let contents = fs.read_to_string(&file_path).expect("read file");
        assert_eq!(contents, "hello codeguard");
        assert_eq!(fs.file_size(&file_path).expect("size"), 15);

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let counter = DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        PathBuf::from(format!("codeguard_core_test_{nanos}_{counter}"))
    }
}
