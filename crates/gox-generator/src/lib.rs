//! Go code generation for `.gox` documents.
//!
//! Elements become calls into the runtime package, components become direct
//! calls with a typed props literal, and Go code passes through unchanged.
//! Every emitted character of passed-through code is recorded in a
//! [`SourceMap`] so diagnostics on the generated file can be traced back.
//!
//! # Example
//!
//! ```
//! use gox_generator::{generate, GenerateOptions};
//!
//! let parsed = gox_parser::parse("hello.gox", r#"<Greeting name="World" />"#);
//! let result = generate(&parsed.document, &GenerateOptions::default()).unwrap();
//! assert_eq!(result.code, r#"Greeting(GreetingProps{Name: "World"})"#);
//! ```

mod expression;
mod format;
mod generator;
mod imports;
mod props;

pub use format::{FormatError, GoFormatter, Verbatim};
pub use source_map::SourceMap;

use gox_parser::{Document, ParseError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Import path of the runtime package used when none is configured.
pub const DEFAULT_RUNTIME_PACKAGE: &str = "github.com/germtb/gox";

/// How deep markup may nest inside `{...}` expressions.
pub const MAX_NESTING: usize = 64;

/// Options for code generation.
#[derive(Clone)]
pub struct GenerateOptions {
    /// Import path of the runtime package the generated calls refer to.
    pub runtime_package: String,
    /// Formatter applied to the final output.
    pub formatter: Arc<dyn GoFormatter>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            formatter: Arc::new(Verbatim),
        }
    }
}

impl fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("runtime_package", &self.runtime_package)
            .finish_non_exhaustive()
    }
}

impl GenerateOptions {
    /// Sets the runtime package import path.
    pub fn with_runtime_package(mut self, package: impl Into<String>) -> Self {
        self.runtime_package = package.into();
        self
    }

    /// Sets the formatter.
    pub fn with_formatter(mut self, formatter: Arc<dyn GoFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// The package name generated calls are qualified with.
    ///
    /// This is the last path segment, skipping a trailing major version
    /// suffix: `example.com/ui/v2` is used as `ui`.
    pub fn qualifier(&self) -> &str {
        let path = self.runtime_package.trim_end_matches('/');
        let mut segments = path.rsplit('/');
        let last = segments.next().unwrap_or(path);
        match segments.next() {
            Some(parent) if is_major_version(last) => parent,
            _ => last,
        }
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Errors that make generating any output impossible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// Markup nested inside expressions beyond [`MAX_NESTING`] levels.
    #[error("markup nested more than {limit} levels deep inside expressions")]
    NestingTooDeep {
        /// The nesting limit.
        limit: usize,
    },
}

/// The output of [`generate`].
#[derive(Debug)]
pub struct GenerateResult {
    /// The generated Go source.
    pub code: String,
    /// Positions in `code` mapped to and from the `.gox` source.
    pub source_map: SourceMap,
    /// Whether the formatter ran and accepted the output.
    pub formatted: bool,
    /// Why formatting failed, if it did.
    pub format_error: Option<FormatError>,
    /// Malformed markup inside expressions, located in the source file.
    /// Those expressions are passed through as Go.
    pub errors: Vec<ParseError>,
}

/// Generates Go source for a parsed document.
///
/// A document without markup is passed through and gets no runtime import.
/// Formatter failures are not errors: the unformatted code is returned with
/// `formatted` set to false.
pub fn generate(
    document: &Document,
    options: &GenerateOptions,
) -> Result<GenerateResult, GenerateError> {
    generator::Generator::new(options).generate(document)
}
