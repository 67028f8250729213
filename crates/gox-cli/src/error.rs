//! CLI errors.

use camino::Utf8PathBuf;
use gox_generator::GenerateError;
use gox_parser::ParseError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to read a file or directory.
    #[error("reading {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write a file or create a directory.
    #[error("writing {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory walk failed.
    #[error("walking directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A path that is not valid UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(std::path::PathBuf),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),

    /// The file has syntax errors; all of them are listed.
    #[error("{}", render_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Code generation failed.
    #[error("{path}: {source}")]
    Generate {
        path: Utf8PathBuf,
        #[source]
        source: GenerateError,
    },

    /// A source map could not be read or written.
    #[error("{path}: {source}")]
    SourceMap {
        path: Utf8PathBuf,
        #[source]
        source: source_map::SourceMapError,
    },

    /// The overlay could not be serialized.
    #[error("overlay json: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool setup failed.
    #[error("starting worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// `go` is not on PATH.
    #[error("go not found in PATH")]
    GoNotFound,

    /// Spawning or waiting on a child process failed.
    #[error("running {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Some files failed; each failure has already been reported.
    #[error("{count} file(s) failed")]
    FilesFailed { count: usize },
}

fn render_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
