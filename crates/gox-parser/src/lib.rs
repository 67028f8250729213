//! Parser for Go source files with inline markup (`.gox`).
//!
//! This crate provides:
//! - A dual-mode lexer that separates Go code from markup
//! - AST types for elements, fragments, attributes and children
//! - A recursive descent parser that accumulates errors instead of stopping
//!
//! # Example
//!
//! ```
//! use gox_parser::{parse, Node};
//!
//! let source = r#"package main
//!
//! func View(name string) gox.Node {
//!     return <p class="greeting">Hello {name}</p>
//! }
//! "#;
//!
//! let result = parse("view.gox", source);
//! assert!(result.errors.is_empty());
//! assert!(result.document.has_markup());
//! assert!(matches!(result.document.nodes[1], Node::Element(_)));
//! ```

mod ast;
mod error;
mod lexer;
mod parser;
mod token;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{is_ident_start, Lexer, MarkupState, Mode, TagState};
pub use parser::Parser;
pub use source_map::Span;
pub use token::{Token, TokenKind};

/// The result of parsing a `.gox` file.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed document, possibly partial when errors were found.
    pub document: Document,
    /// Every error encountered, in source order.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Returns true if any error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the first recorded error.
    pub fn first_error(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Converts into the document, or the first error if there was one.
    pub fn into_result(self) -> Result<Document, ParseError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.document),
        }
    }
}

/// Parses a `.gox` source file.
///
/// Parsing always runs to the end of the input. The returned document is
/// usable even when errors were recorded; `filename` only appears in error
/// messages.
pub fn parse(filename: &str, source: &str) -> ParseResult {
    Parser::new(filename, source).parse()
}
