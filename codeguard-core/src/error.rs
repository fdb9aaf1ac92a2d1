//! Error types for CodeGuard core.

use std::{error::Error, fmt, io};

/// Error type for CodeGuard core operations.
#[derive(Debug)]
pub enum CodeGuardError {
    /// An underlying I/O error.
    Io(io::Error),
    /// A pattern built at runtime failed to compile.
    Pattern(regex::Error),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for CodeGuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Pattern(err) => write!(f, "pattern error: {err}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CodeGuardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Pattern(err) => Some(err),
            Self::Other(_) => None,
        }
    }
}

impl From<io::Error> for CodeGuardError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<regex::Error> for CodeGuardError {
    fn from(value: regex::Error) -> Self {
        Self::Pattern(value)
    }
}

/// Convenience result type for CodeGuard core.
pub type Result<T> = std::result::Result<T, CodeGuardError>;

/// Run one rule category, degrading a failure to an empty finding list.
///
/// A failing category is logged and never aborts the surrounding analysis.
pub fn isolate<T>(category: &str, scan: impl FnOnce() -> Result<Vec<T>>) -> Vec<T> {
    match scan() {
        Ok(findings) => findings,
        Err(err) => {
            log::warn!("rule category `{category}` failed: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeGuardError, isolate};
    use std::io;

    #[test]
    fn isolate_degrades_failures_to_empty() {
        let findings: Vec<u8> =
            isolate("broken", || Err(CodeGuardError::Other("boom".to_string())));
        assert!(findings.is_empty());
        assert_eq!(isolate("ok", || Ok(vec![1, 2])), vec![1, 2]);
    }

    #[test]
    fn io_error_formats_message() {
        let error = CodeGuardError::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(format!("{error}"), "io error: boom");
    }

    #[test]
    fn other_error_formats_message() {
        let error = CodeGuardError::Other("analysis failed".to_string());
        assert_eq!(format!("{error}"), "analysis failed");
    }

    #[test]
    fn pattern_error_maps_variant() {
        let error: CodeGuardError = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(error, CodeGuardError::Pattern(_)));
        assert!(format!("{error}").starts_with("pattern error:"));
    }

    #[test]
    fn from_io_error_maps_variant() {
        let error: CodeGuardError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match error {
            CodeGuardError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Io variant, got {other}"),
        }
    }
}
