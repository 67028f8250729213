//! Token model shared by the lexer and parser.

use source_map::Span;
use std::fmt;

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Host code ===
    /// Verbatim Go source between markup regions.
    HostCode,

    // === Markup structure ===
    /// `<` opening a start tag.
    LAngle,
    /// `</` opening an end tag.
    LAngleSlash,
    /// `>` closing a start or end tag.
    RAngle,
    /// `/` inside a tag (self-closing marker).
    Slash,
    /// `<>`
    FragmentOpen,
    /// `</>`
    FragmentClose,

    // === Markup content ===
    /// An element or component name.
    TagName,
    /// An attribute name.
    AttrName,
    /// `=` between an attribute name and its value.
    Eq,
    /// A double-quoted attribute value; the token text excludes the quotes.
    String,
    /// A `{...}` expression; the token text excludes the outer braces.
    Expression,
    /// A bare `...` spread marker inside a tag.
    Spread,
    /// A run of text between tags.
    Text,

    // === Sentinels ===
    /// End of input.
    Eof,
    /// A character that cannot appear at this point.
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::HostCode => "go code",
            TokenKind::LAngle => "'<'",
            TokenKind::LAngleSlash => "'</'",
            TokenKind::RAngle => "'>'",
            TokenKind::Slash => "'/'",
            TokenKind::FragmentOpen => "'<>'",
            TokenKind::FragmentClose => "'</>'",
            TokenKind::TagName => "tag name",
            TokenKind::AttrName => "attribute name",
            TokenKind::Eq => "'='",
            TokenKind::String => "string",
            TokenKind::Expression => "expression",
            TokenKind::Spread => "'...'",
            TokenKind::Text => "text",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }

    /// Returns true for kinds whose text varies from token to token.
    fn has_payload(&self) -> bool {
        matches!(
            self,
            TokenKind::HostCode
                | TokenKind::TagName
                | TokenKind::AttrName
                | TokenKind::String
                | TokenKind::Expression
                | TokenKind::Text
                | TokenKind::Error
        )
    }
}

/// A token produced by the [`Lexer`](crate::Lexer).
///
/// `line` and `column` are 1-indexed and point at the first character of the
/// token in the source, including delimiters that `text` leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The token's value.
    pub text: &'src str,
    /// The full byte span of the token in the source.
    pub span: Span,
    /// 1-indexed line of the token start.
    pub line: u32,
    /// 1-indexed column (in characters) of the token start.
    pub column: u32,
}

impl Token<'_> {
    /// Returns the byte offset of the token start.
    #[inline]
    pub fn offset(&self) -> usize {
        u32::from(self.span.start) as usize
    }

    /// Returns true if this is the end-of-input token.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.kind.has_payload() {
            return f.write_str(self.kind.name());
        }
        match self.text.char_indices().nth(20) {
            Some((cut, _)) => write!(f, "{} {:?}...", self.kind.name(), &self.text[..cut]),
            None => write!(f, "{} {:?}", self.kind.name(), self.text),
        }
    }
}
