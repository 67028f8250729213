//! Dual-mode lexer for Go source with inline markup.
//!
//! The lexer starts in host-code mode and passes Go source through verbatim
//! until it sees a `<` that starts markup. It then tokenizes the markup tree
//! and returns to host-code mode when the outermost element or fragment is
//! closed. Go strings, runes, raw strings and comments are skipped while
//! looking for markup, so `"<div>"` in Go stays Go.

use crate::token::{Token, TokenKind};
use logos::Logos;
use source_map::Span;

/// Tokens recognized between the `<` and `>` of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
#[logos(skip r"[ \t\r\n\f]+")]
enum TagToken {
    #[token(">")]
    RAngle,

    #[token("/")]
    Slash,

    #[token("=")]
    Eq,

    #[token("...")]
    Spread,

    #[token("\"")]
    Quote,

    #[token("{")]
    LBrace,

    #[regex(r"[\p{L}_][\p{L}\p{Nd}_\-]*")]
    Ident,
}

/// What the lexer is currently looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Verbatim Go source.
    #[default]
    HostCode,
    /// Inside a markup tree.
    Markup(MarkupState),
}

/// Lexer state while inside markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupState {
    /// Number of currently open elements and fragments.
    pub depth: u32,
    /// Position relative to the current tag.
    pub tag: TagState,
}

/// Position of the lexer relative to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    /// Between tags, scanning child content.
    Children,
    /// Inside `<name ...` before its `>`.
    Opening {
        /// The next identifier is the tag name.
        need_name: bool,
        /// A `/` was seen, so `>` closes the element.
        saw_slash: bool,
    },
    /// Inside `</name` before its `>`.
    Closing {
        /// The next identifier is the tag name.
        need_name: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

/// A lexer for `.gox` source.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    mode: Mode,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            mode: Mode::HostCode,
            finished: false,
        }
    }

    /// Returns the source string being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the current lexer mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Produces the next token. Returns `Eof` repeatedly once input is exhausted.
    pub fn next_token(&mut self) -> Token<'src> {
        if self.pos >= self.source.len() {
            return self.eof();
        }
        match self.mode {
            Mode::HostCode => self.lex_host_code(),
            Mode::Markup(state) => match state.tag {
                TagState::Children => self.lex_children(state),
                _ => self.lex_in_tag(state),
            },
        }
    }

    // === Host code ===

    fn lex_host_code(&mut self) -> Token<'src> {
        let start = self.mark();
        while let Some(c) = self.peek() {
            match c {
                '<' if self.at_markup_start() => {
                    if self.pos > start.pos {
                        return self.token_from(TokenKind::HostCode, start);
                    }
                    return self.lex_markup_open(MarkupState {
                        depth: 0,
                        tag: TagState::Children,
                    });
                }
                '"' | '\'' => self.skip_quoted(c),
                '`' => self.skip_raw_string(),
                '/' if self.peek_nth(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek_nth(1) == Some('*') => self.skip_block_comment(),
                _ => {
                    self.bump();
                }
            }
        }
        self.token_from(TokenKind::HostCode, start)
    }

    // === Markup ===

    /// Lexes `<`, `</`, `<>` or `</>` at the current position.
    fn lex_markup_open(&mut self, mut state: MarkupState) -> Token<'src> {
        let start = self.mark();
        self.bump();
        match self.peek() {
            Some('>') => {
                self.bump();
                state.depth += 1;
                state.tag = TagState::Children;
                self.mode = Mode::Markup(state);
                self.token_from(TokenKind::FragmentOpen, start)
            }
            Some('/') => {
                self.bump();
                if self.peek() == Some('>') {
                    self.bump();
                    self.close_element(state);
                    self.token_from(TokenKind::FragmentClose, start)
                } else {
                    state.tag = TagState::Closing { need_name: true };
                    self.mode = Mode::Markup(state);
                    self.token_from(TokenKind::LAngleSlash, start)
                }
            }
            _ => {
                state.depth += 1;
                state.tag = TagState::Opening {
                    need_name: true,
                    saw_slash: false,
                };
                self.mode = Mode::Markup(state);
                self.token_from(TokenKind::LAngle, start)
            }
        }
    }

    fn lex_children(&mut self, state: MarkupState) -> Token<'src> {
        match self.peek() {
            Some('<') if self.at_markup_start() => self.lex_markup_open(state),
            Some('{') => self.lex_expression(),
            Some('}') => {
                let start = self.mark();
                self.bump();
                self.token_from(TokenKind::Error, start)
            }
            _ => self.lex_text(),
        }
    }

    fn lex_text(&mut self) -> Token<'src> {
        let start = self.mark();
        while let Some(c) = self.peek() {
            if c == '{' || c == '}' || (c == '<' && self.at_markup_start()) {
                break;
            }
            self.bump();
        }
        self.token_from(TokenKind::Text, start)
    }

    fn lex_in_tag(&mut self, state: MarkupState) -> Token<'src> {
        let base = self.pos;
        let mut tags = TagToken::lexer(self.rest());
        let Some(result) = tags.next() else {
            // Only whitespace is left.
            self.advance_to(self.source.len());
            return self.eof();
        };
        let span = tags.span();
        self.advance_to(base + span.start);
        let start = self.mark();

        let kind = match result {
            Ok(TagToken::Quote) => return self.lex_string(start),
            Ok(TagToken::LBrace) => return self.lex_expression(),
            Ok(TagToken::Ident) => match state.tag {
                TagState::Opening {
                    need_name: true,
                    saw_slash,
                } => {
                    self.set_tag(
                        state,
                        TagState::Opening {
                            need_name: false,
                            saw_slash,
                        },
                    );
                    TokenKind::TagName
                }
                TagState::Closing { need_name: true } => {
                    self.set_tag(state, TagState::Closing { need_name: false });
                    TokenKind::TagName
                }
                _ => TokenKind::AttrName,
            },
            Ok(TagToken::RAngle) => {
                match state.tag {
                    TagState::Closing { .. }
                    | TagState::Opening {
                        saw_slash: true, ..
                    } => self.close_element(state),
                    _ => self.set_tag(state, TagState::Children),
                }
                TokenKind::RAngle
            }
            Ok(TagToken::Slash) => {
                if let TagState::Opening { need_name, .. } = state.tag {
                    self.set_tag(
                        state,
                        TagState::Opening {
                            need_name,
                            saw_slash: true,
                        },
                    );
                }
                TokenKind::Slash
            }
            Ok(TagToken::Eq) => TokenKind::Eq,
            Ok(TagToken::Spread) => TokenKind::Spread,
            Err(()) => TokenKind::Error,
        };

        self.advance_to(base + span.end);
        if self.pos == start.pos {
            self.bump();
        }
        self.token_from(kind, start)
    }

    /// Lexes a double-quoted attribute value starting at `start`.
    fn lex_string(&mut self, start: Mark) -> Token<'src> {
        self.bump();
        let content_start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '"' => break,
                _ => {
                    self.bump();
                }
            }
        }
        let content_end = self.pos;
        if self.peek() == Some('"') {
            self.bump();
        }
        Token {
            kind: TokenKind::String,
            text: &self.source[content_start..content_end],
            span: Span::from_usize(start.pos, self.pos),
            line: start.line,
            column: start.column,
        }
    }

    /// Lexes a `{...}` expression. Nested braces, Go literals and nested
    /// markup are skipped so the expression ends at its matching `}`.
    fn lex_expression(&mut self) -> Token<'src> {
        let start = self.mark();
        let closed = self.skip_braced();
        let content_end = if closed { self.pos - 1 } else { self.pos };
        Token {
            kind: TokenKind::Expression,
            text: &self.source[start.pos + 1..content_end],
            span: Span::from_usize(start.pos, self.pos),
            line: start.line,
            column: start.column,
        }
    }

    fn close_element(&mut self, state: MarkupState) {
        let depth = state.depth.saturating_sub(1);
        self.mode = if depth == 0 {
            Mode::HostCode
        } else {
            Mode::Markup(MarkupState {
                depth,
                tag: TagState::Children,
            })
        };
    }

    fn set_tag(&mut self, state: MarkupState, tag: TagState) {
        self.mode = Mode::Markup(MarkupState { tag, ..state });
    }

    // === Skipping ===

    /// Skips a balanced `{...}` group. Returns false if input ended first.
    fn skip_braced(&mut self) -> bool {
        self.bump();
        let mut depth = 1u32;
        while let Some(c) = self.peek() {
            match c {
                '{' => {
                    depth += 1;
                    self.bump();
                }
                '}' => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                '"' | '\'' => self.skip_quoted(c),
                '`' => self.skip_raw_string(),
                '/' if self.peek_nth(1) == Some('*') => self.skip_block_comment(),
                '/' if self.peek_nth(1) == Some('/') => self.skip_embedded_line_comment(depth),
                '<' if self.at_markup_start() => self.skip_nested_markup(),
                _ => {
                    self.bump();
                }
            }
        }
        false
    }

    /// Skips a whole markup tree nested inside an expression.
    fn skip_nested_markup(&mut self) {
        let mut depth = 0u32;
        while let Some(c) = self.peek() {
            match c {
                '<' if self.at_markup_start() => {
                    self.bump();
                    match self.peek() {
                        Some('>') => {
                            self.bump();
                            depth += 1;
                        }
                        Some('/') => {
                            self.skip_past('>');
                            depth = depth.saturating_sub(1);
                        }
                        _ => {
                            if !self.skip_tag_body() {
                                depth += 1;
                            }
                        }
                    }
                    if depth == 0 {
                        return;
                    }
                }
                '{' => {
                    self.skip_braced();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Skips the rest of a start tag. Returns true if it was self-closing.
    fn skip_tag_body(&mut self) -> bool {
        while let Some(c) = self.peek() {
            match c {
                '"' => self.skip_quoted('"'),
                '{' => {
                    self.skip_braced();
                }
                '/' if self.peek_nth(1) == Some('>') => {
                    self.bump();
                    self.bump();
                    return true;
                }
                '>' => {
                    self.bump();
                    return false;
                }
                _ => {
                    self.bump();
                }
            }
        }
        false
    }

    /// Skips a `"` string or `'` rune. Stops at an unescaped newline.
    fn skip_quoted(&mut self, quote: char) {
        self.bump();
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '\n' => return,
                _ => {
                    self.bump();
                    if c == quote {
                        return;
                    }
                }
            }
        }
    }

    fn skip_raw_string(&mut self) {
        self.bump();
        self.skip_past('`');
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// A `//` comment inside braces ends at the newline. Directly inside the
    /// outermost group it also ends at the last `}` on its line, so
    /// `{// note}` still closes.
    fn skip_embedded_line_comment(&mut self, depth: u32) {
        if depth > 1 {
            self.skip_line_comment();
            return;
        }
        let rest = self.rest();
        let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
        let stop = line.rfind('}').unwrap_or(line.len());
        self.advance_to(self.pos + stop);
    }

    fn skip_block_comment(&mut self) {
        self.bump();
        self.bump();
        while !self.rest().is_empty() {
            if self.rest().starts_with("*/") {
                self.bump();
                self.bump();
                return;
            }
            self.bump();
        }
    }

    fn skip_past(&mut self, end: char) {
        while let Some(c) = self.bump() {
            if c == end {
                return;
            }
        }
    }

    // === Cursor ===

    /// True if a `<` at the current position starts markup: `<` followed by
    /// an identifier, `>`, `/>` or `/` and an identifier.
    fn at_markup_start(&self) -> bool {
        let mut chars = self.rest().chars();
        if chars.next() != Some('<') {
            return false;
        }
        match chars.next() {
            Some('>') => true,
            Some('/') => matches!(chars.next(), Some(c) if c == '>' || is_ident_start(c)),
            Some(c) => is_ident_start(c),
            None => false,
        }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_to(&mut self, target: usize) {
        while self.pos < target && self.bump().is_some() {}
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn token_from(&self, kind: TokenKind, start: Mark) -> Token<'src> {
        Token {
            kind,
            text: &self.source[start.pos..self.pos],
            span: Span::from_usize(start.pos, self.pos),
            line: start.line,
            column: start.column,
        }
    }

    fn eof(&self) -> Token<'src> {
        self.token_from(TokenKind::Eof, self.mark())
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is_eof() {
            self.finished = true;
        }
        Some(token)
    }
}

/// Returns true if `c` can start a tag or attribute name.
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
