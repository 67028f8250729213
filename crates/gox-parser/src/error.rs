//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred during parsing.
///
/// Displays as `file:line:col: message` with 1-indexed line and column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{filename}:{line}:{column}: {kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The file the error was found in.
    pub filename: String,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub column: u32,
    /// The offending source bytes.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(
        kind: ParseErrorKind,
        filename: impl Into<String>,
        line: u32,
        column: u32,
        span: Span,
    ) -> Self {
        Self {
            kind,
            filename: filename.into(),
            line,
            column,
            span,
        }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A token that cannot appear here.
    #[error("unexpected {found} in {context}")]
    UnexpectedToken {
        /// Where the token was found.
        context: &'static str,
        /// A description of the token.
        found: String,
    },

    /// `<` not followed by a tag name.
    #[error("expected tag name, got {found}")]
    ExpectedTagName {
        /// A description of the token.
        found: String,
    },

    /// `name=` not followed by a string or expression.
    #[error("expected string or expression for attribute `{name}`, got {found}")]
    MissingAttributeValue {
        /// The attribute name.
        name: String,
        /// A description of the token.
        found: String,
    },

    /// `...` not followed by an identifier.
    #[error("expected expression after '...', got {found}")]
    MissingSpreadExpression {
        /// A description of the token.
        found: String,
    },

    /// An opening tag not terminated by `>` or `/>`.
    #[error("expected '>' or '/>' to end <{context}>, got {found}")]
    UnclosedTag {
        /// The tag name.
        context: String,
        /// A description of the token.
        found: String,
    },

    /// An element or fragment whose closing tag never appeared.
    #[error("unclosed element <{name}>")]
    UnclosedElement {
        /// The tag name, empty for fragments.
        name: String,
    },

    /// `</b>` closing `<a>`.
    #[error("mismatched closing tag: expected </{expected}>, got </{found}>")]
    MismatchedClosingTag {
        /// The opening tag name.
        expected: String,
        /// The closing tag name.
        found: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_has_file_line_col_prefix() {
        let err = ParseError::new(
            ParseErrorKind::MismatchedClosingTag {
                expected: "a".into(),
                found: "b".into(),
            },
            "views/page.gox",
            3,
            14,
            Span::from_usize(40, 41),
        );
        assert_eq!(
            err.to_string(),
            "views/page.gox:3:14: mismatched closing tag: expected </a>, got </b>"
        );
    }

    #[test]
    fn test_unclosed_fragment_message() {
        let kind = ParseErrorKind::UnclosedElement {
            name: String::new(),
        };
        assert_eq!(kind.to_string(), "unclosed element <>");
    }
}
