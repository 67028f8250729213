//! Recursive descent parser for `.gox` documents.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::ParseResult;
use smol_str::SmolStr;
use text_size::TextSize;

/// The parser state.
///
/// Pulls tokens from the lexer on demand with one token of lookahead.
pub struct Parser<'src> {
    /// The source being parsed.
    source: &'src str,
    /// File name for error messages.
    filename: String,
    lexer: Lexer<'src>,
    current: Token<'src>,
    peeked: Option<Token<'src>>,
    /// End of the last consumed token.
    prev_end: Location,
    /// Parse errors collected during parsing.
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    /// Creates a new parser.
    pub fn new(filename: &str, source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            source,
            filename: filename.to_string(),
            lexer,
            current,
            peeked: None,
            prev_end: Location::new(TextSize::from(0), 1, 1),
            errors: Vec::new(),
        }
    }

    /// Parses the whole document.
    pub fn parse(mut self) -> ParseResult {
        let mut nodes = Vec::new();
        while !self.current.is_eof() {
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        ParseResult {
            document: Document {
                source_path: self.filename,
                nodes,
            },
            errors: self.errors,
        }
    }

    // === Token helpers ===

    fn advance(&mut self) {
        self.prev_end = self.end_of(&self.current);
        self.current = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token(),
        };
    }

    fn peek(&mut self) -> Token<'src> {
        *self
            .peeked
            .get_or_insert_with(|| self.lexer.next_token())
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn start_of(&self, token: &Token<'src>) -> Location {
        Location::new(token.span.start, token.line, token.column)
    }

    fn end_of(&self, token: &Token<'src>) -> Location {
        self.start_of(token).advance(token.span.slice(self.source))
    }

    fn token_range(&self, token: &Token<'src>) -> Range {
        Range::new(self.start_of(token), self.end_of(token))
    }

    /// The range of an expression token's text, without the braces.
    fn inner_range(&self, token: &Token<'src>) -> Range {
        let start = self.start_of(token).advance("{");
        Range::new(start, start.advance(token.text))
    }

    fn error(&mut self, kind: ParseErrorKind) {
        let token = self.current;
        self.error_at(kind, &token);
    }

    fn error_at(&mut self, kind: ParseErrorKind, token: &Token<'src>) {
        self.errors.push(ParseError::new(
            kind,
            self.filename.as_str(),
            token.line,
            token.column,
            token.span,
        ));
    }

    fn unexpected(&mut self, context: &'static str) {
        let found = self.current.to_string();
        self.error(ParseErrorKind::UnexpectedToken { context, found });
        self.advance();
    }

    // === Nodes ===

    fn parse_node(&mut self) -> Option<Node> {
        match self.current.kind {
            TokenKind::HostCode => {
                let token = self.current;
                self.advance();
                Some(Node::HostCode(HostCode {
                    code: token.text.to_string(),
                    range: self.token_range(&token),
                }))
            }
            TokenKind::LAngle => self.parse_element().map(Node::Element),
            TokenKind::FragmentOpen => Some(Node::Fragment(self.parse_fragment())),
            TokenKind::LAngleSlash => {
                self.skip_stray_closing_tag();
                None
            }
            _ => {
                self.unexpected("top level");
                None
            }
        }
    }

    /// Reports `</name>` with no open element and skips all of it.
    fn skip_stray_closing_tag(&mut self) {
        let next = self.peek();
        let found = if next.kind == TokenKind::TagName {
            format!("closing tag </{}>", next.text)
        } else {
            self.current.to_string()
        };
        self.error(ParseErrorKind::UnexpectedToken {
            context: "top level",
            found,
        });
        self.advance();
        self.eat(TokenKind::TagName);
        self.eat(TokenKind::RAngle);
    }

    fn parse_element(&mut self) -> Option<Element> {
        let open = self.current;
        let start = self.start_of(&open);
        self.advance();

        if !self.check(TokenKind::TagName) {
            let found = self.current.to_string();
            self.error(ParseErrorKind::ExpectedTagName { found });
            return None;
        }
        let name = SmolStr::new(self.current.text);
        self.advance();

        let attributes = self.parse_attributes();

        if self.eat(TokenKind::Slash) {
            if !self.eat(TokenKind::RAngle) {
                self.unclosed_tag(name.as_str());
            }
            return Some(Element {
                name,
                attributes,
                children: Vec::new(),
                self_closing: true,
                range: Range::new(start, self.prev_end),
            });
        }

        if !self.eat(TokenKind::RAngle) {
            self.unclosed_tag(name.as_str());
            return Some(Element {
                name,
                attributes,
                children: Vec::new(),
                self_closing: false,
                range: Range::new(start, self.prev_end),
            });
        }

        let children = self.parse_children();

        if self.eat(TokenKind::LAngleSlash) {
            if self.check(TokenKind::TagName) {
                if self.current.text != name {
                    let found = self.current.text.to_string();
                    self.error(ParseErrorKind::MismatchedClosingTag {
                        expected: name.to_string(),
                        found,
                    });
                }
                self.advance();
            } else {
                let found = self.current.to_string();
                self.error(ParseErrorKind::ExpectedTagName { found });
            }
            if !self.eat(TokenKind::RAngle) {
                self.unclosed_tag(&format!("/{name}"));
            }
        } else {
            self.error_at(
                ParseErrorKind::UnclosedElement {
                    name: name.to_string(),
                },
                &open,
            );
        }

        Some(Element {
            name,
            attributes,
            children,
            self_closing: false,
            range: Range::new(start, self.prev_end),
        })
    }

    fn unclosed_tag(&mut self, context: &str) {
        let found = self.current.to_string();
        self.error(ParseErrorKind::UnclosedTag {
            context: context.to_string(),
            found,
        });
    }

    fn parse_fragment(&mut self) -> Fragment {
        let open = self.current;
        let start = self.start_of(&open);
        self.advance();

        let children = self.parse_children();
        if !self.eat(TokenKind::FragmentClose) {
            self.error_at(
                ParseErrorKind::UnclosedElement {
                    name: String::new(),
                },
                &open,
            );
        }

        Fragment {
            children,
            range: Range::new(start, self.prev_end),
        }
    }

    // === Attributes ===

    fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::RAngle | TokenKind::Slash | TokenKind::Eof => break,
                TokenKind::AttrName => {
                    if let Some(attr) = self.parse_attribute() {
                        attributes.push(attr);
                    }
                }
                TokenKind::Expression => {
                    let token = self.current;
                    match self.braced_spread(&token) {
                        Some(spread) => {
                            self.advance();
                            attributes.push(Attribute::Spread(spread));
                        }
                        None => self.unexpected("attributes"),
                    }
                }
                TokenKind::Spread => {
                    if let Some(spread) = self.bare_spread() {
                        attributes.push(Attribute::Spread(spread));
                    }
                }
                _ => self.unexpected("attributes"),
            }
        }
        attributes
    }

    fn parse_attribute(&mut self) -> Option<Attribute> {
        let name = self.current;
        let key = SmolStr::new(name.text);
        let start = self.start_of(&name);
        self.advance();

        if !self.eat(TokenKind::Eq) {
            return Some(Attribute::Expression(ExpressionAttribute {
                key,
                expression: "true".to_string(),
                range: Range::new(start, self.prev_end),
                value_range: None,
            }));
        }

        let value = self.current;
        match value.kind {
            TokenKind::String => {
                self.advance();
                Some(Attribute::String(StringAttribute {
                    key,
                    value: value.text.replace("\\\"", "\""),
                    range: Range::new(start, self.prev_end),
                }))
            }
            TokenKind::Expression => {
                self.advance();
                Some(Attribute::Expression(ExpressionAttribute {
                    key,
                    expression: value.text.to_string(),
                    range: Range::new(start, self.prev_end),
                    value_range: Some(self.inner_range(&value)),
                }))
            }
            _ => {
                self.error(ParseErrorKind::MissingAttributeValue {
                    name: key.to_string(),
                    found: value.to_string(),
                });
                None
            }
        }
    }

    /// Recognizes `{...expr}` written inside a tag.
    fn braced_spread(&self, token: &Token<'src>) -> Option<SpreadAttribute> {
        let text = token.text;
        let body = text.trim_start().strip_prefix("...")?;
        let expression = body.trim();
        if expression.is_empty() {
            return None;
        }
        let leading = text.len() - body.trim_start().len();
        let value_start = self.inner_range(token).start.advance(&text[..leading]);
        Some(SpreadAttribute {
            expression: expression.to_string(),
            range: self.token_range(token),
            value_range: Range::new(value_start, value_start.advance(expression)),
        })
    }

    /// Parses `...name` written as a bare marker.
    fn bare_spread(&mut self) -> Option<SpreadAttribute> {
        let marker = self.current;
        self.advance();
        if !self.check(TokenKind::AttrName) {
            let found = self.current.to_string();
            self.error_at(ParseErrorKind::MissingSpreadExpression { found }, &marker);
            return None;
        }
        let name = self.current;
        self.advance();
        Some(SpreadAttribute {
            expression: name.text.to_string(),
            range: Range::new(self.start_of(&marker), self.prev_end),
            value_range: self.token_range(&name),
        })
    }

    // === Children ===

    fn parse_children(&mut self) -> Vec<Child> {
        let mut children = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::Eof | TokenKind::FragmentClose | TokenKind::LAngleSlash => break,
                TokenKind::LAngle => {
                    if let Some(element) = self.parse_element() {
                        children.push(Child::Element(element));
                    }
                }
                TokenKind::FragmentOpen => children.push(Child::Fragment(self.parse_fragment())),
                TokenKind::Text => {
                    let token = self.current;
                    self.advance();
                    children.push(Child::Text(Text {
                        value: token.text.to_string(),
                        range: self.token_range(&token),
                    }));
                }
                TokenKind::Expression => {
                    let token = self.current;
                    self.advance();
                    children.push(Child::Expression(ExpressionChild {
                        expression: token.text.to_string(),
                        range: self.token_range(&token),
                        value_range: self.inner_range(&token),
                    }));
                }
                _ => self.unexpected("children"),
            }
        }
        children
    }
}
