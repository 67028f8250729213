//! The formatting seam run over generated code.

use thiserror::Error;

/// Errors reported by a [`GoFormatter`].
#[derive(Debug, Error)]
pub enum FormatError {
    /// The formatter rejected the source, usually a syntax error.
    #[error("formatter rejected the source: {0}")]
    Rejected(String),

    /// The formatter could not be run.
    #[error("formatter unavailable: {0}")]
    Unavailable(String),

    /// I/O failure while talking to the formatter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Canonical formatting for generated Go source.
///
/// Formatting is the last generation step. A failure is never fatal: the
/// unformatted text is returned instead.
pub trait GoFormatter: Send + Sync {
    /// Formats a complete Go source file.
    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// A formatter that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl GoFormatter for Verbatim {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Trims trailing whitespace from every line.
///
/// Applied instead of a formatter to snippets that are not complete Go files.
pub(crate) fn trim_line_ends(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for (i, line) in source.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out
}
