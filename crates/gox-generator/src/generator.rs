//! Tree walk that emits Go code and records the source map.

use crate::expression::{closes_markup, is_comment_only, split_conditional};
use crate::format::trim_line_ends;
use crate::imports::insert_runtime_import;
use crate::props::go_quote;
use crate::{GenerateError, GenerateOptions, GenerateResult, MAX_NESTING};
use gox_parser::{Child, Document, Element, ExpressionChild, Fragment, Location, Node, ParseError};
use source_map::{Position, SourceMap};
use std::borrow::Cow;

/// Generator state for one document.
pub(crate) struct Generator<'a> {
    options: &'a GenerateOptions,
    out: String,
    /// Output position of the next character written.
    cursor: Position,
    source_map: SourceMap,
    /// Tab depth for child arguments.
    indent: usize,
    /// How many expressions deep this generator is nested.
    nesting: usize,
    filename: String,
    /// Malformed markup found inside expressions.
    errors: Vec<ParseError>,
}

impl<'a> Generator<'a> {
    pub(crate) fn new(options: &'a GenerateOptions) -> Self {
        Self {
            options,
            out: String::new(),
            cursor: Position::default(),
            source_map: SourceMap::new(),
            indent: 0,
            nesting: 0,
            filename: String::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn generate(
        mut self,
        document: &Document,
    ) -> Result<GenerateResult, GenerateError> {
        self.source_map.set_files(document.source_path.as_str(), "");
        self.filename.clone_from(&document.source_path);
        for node in &document.nodes {
            self.node(node)?;
        }

        let has_markup = document.has_markup();
        let mut code = std::mem::take(&mut self.out);
        if has_markup {
            if let Some(injection) = insert_runtime_import(&code, &self.options.runtime_package) {
                code = injection.code;
                for (after_line, delta) in injection.shifts {
                    self.source_map.shift_target_lines(after_line, delta);
                }
            }
        }

        if !has_markup && document.package_name().is_none() {
            return Ok(GenerateResult {
                code: trim_line_ends(&code),
                source_map: self.source_map,
                formatted: false,
                format_error: None,
                errors: self.errors,
            });
        }

        let (code, formatted, format_error) = match self.options.formatter.format(&code) {
            Ok(formatted) => (formatted, true, None),
            Err(err) => (code, false, Some(err)),
        };
        Ok(GenerateResult {
            code,
            source_map: self.source_map,
            formatted,
            format_error,
            errors: self.errors,
        })
    }

    // === Nodes ===

    fn node(&mut self, node: &Node) -> Result<(), GenerateError> {
        match node {
            Node::HostCode(code) => {
                self.write_mapped(&code.code, position(code.range.start));
                Ok(())
            }
            Node::Element(element) => {
                self.align_to_line();
                self.element(element)
            }
            Node::Fragment(fragment) => {
                self.align_to_line();
                self.fragment(fragment)
            }
        }
    }

    /// Child arguments of top-level markup sit one tab deeper than the Go
    /// line the markup starts on, where `gofmt` puts them.
    fn align_to_line(&mut self) {
        if self.nesting > 0 {
            return;
        }
        let line_start = self.out.rfind('\n').map_or(0, |i| i + 1);
        self.indent = self.out[line_start..]
            .chars()
            .take_while(|c| *c == '\t')
            .count();
    }

    fn element(&mut self, element: &Element) -> Result<(), GenerateError> {
        self.mark(position(element.range.start));
        if element.is_component() {
            self.write(&element.name);
            self.write("(");
            self.component_props(element)?;
        } else {
            self.write_qualified("Element(");
            self.write(&go_quote(&element.name));
            self.write(", ");
            self.intrinsic_props(&element.attributes)?;
        }
        self.children(&element.children, true)?;
        self.write(")");
        Ok(())
    }

    fn fragment(&mut self, fragment: &Fragment) -> Result<(), GenerateError> {
        self.mark(position(fragment.range.start));
        self.write_qualified("Fragment(");
        self.children(&fragment.children, false)?;
        self.write(")");
        Ok(())
    }

    /// Emits children as call arguments, one per line.
    ///
    /// With `after_props` every child is preceded by a separator; otherwise
    /// the first child follows the opening parenthesis directly.
    fn children(&mut self, children: &[Child], after_props: bool) -> Result<(), GenerateError> {
        self.indent += 1;
        let mut first = true;
        for child in children.iter().filter(|child| is_emitted(child)) {
            if after_props || !first {
                self.write(",\n");
                self.write_indent();
            }
            first = false;
            self.child(child)?;
        }
        self.indent -= 1;
        Ok(())
    }

    fn child(&mut self, child: &Child) -> Result<(), GenerateError> {
        match child {
            Child::Text(text) => {
                let leading = text.value.len() - text.value.trim_start().len();
                self.mark(position(text.range.start).advance(&text.value[..leading]));
                self.write_qualified("Text(");
                self.write(&go_quote(text.value.trim()));
                self.write(")");
                Ok(())
            }
            Child::Expression(expression) => self.expression_child(expression),
            Child::Element(element) => self.element(element),
            Child::Fragment(fragment) => self.fragment(fragment),
        }
    }

    /// Emits `V(expr)`, or `When(cond, node)` for `cond && node`.
    fn expression_child(&mut self, child: &ExpressionChild) -> Result<(), GenerateError> {
        let raw = child.expression.as_str();
        let leading = raw.len() - raw.trim_start().len();
        let expression = raw.trim();
        let origin = child.value_range.start.advance(&raw[..leading]);
        let source = position(origin);
        let transformed = self.transform_expression(expression, origin)?;
        let unchanged = matches!(transformed, Cow::Borrowed(_));

        let Some(conditional) = split_conditional(&transformed) else {
            self.write_qualified("V(");
            if unchanged {
                self.write_mapped(expression, source);
            } else {
                self.write(&transformed);
            }
            self.write(")");
            return Ok(());
        };

        self.write_qualified("When(");
        let condition_range =
            conditional.condition_offset..conditional.condition_offset + conditional.condition.len();
        if expression.get(condition_range) == Some(conditional.condition) {
            let at = source.advance(&expression[..conditional.condition_offset]);
            self.write_mapped(conditional.condition, at);
        } else {
            self.write(conditional.condition);
        }
        self.write(", ");
        if unchanged {
            let at = source.advance(&expression[..conditional.node_offset]);
            self.write_mapped(conditional.node, at);
        } else {
            self.write(conditional.node);
        }
        self.write(")");
        Ok(())
    }

    /// Replaces markup inside a Go expression with generated calls.
    ///
    /// The expression is lexed and parsed as a document of its own; if that
    /// fails or finds no markup, the text is returned unchanged. Parse errors
    /// are kept, moved to `origin`, when the text closes a tag.
    pub(crate) fn transform_expression<'e>(
        &mut self,
        expression: &'e str,
        origin: Location,
    ) -> Result<Cow<'e, str>, GenerateError> {
        if !expression.contains('<') {
            return Ok(Cow::Borrowed(expression));
        }
        let parsed = gox_parser::parse(&self.filename, expression);
        if parsed.has_errors() {
            if closes_markup(expression) {
                self.errors
                    .extend(parsed.errors.into_iter().map(|err| relocate(err, origin)));
            }
            return Ok(Cow::Borrowed(expression));
        }
        if !parsed.document.has_markup() {
            return Ok(Cow::Borrowed(expression));
        }

        if self.nesting >= MAX_NESTING {
            return Err(GenerateError::NestingTooDeep { limit: MAX_NESTING });
        }
        let mut nested = Generator::new(self.options);
        nested.nesting = self.nesting + 1;
        nested.indent = self.indent;
        nested.filename.clone_from(&self.filename);
        for node in &parsed.document.nodes {
            nested.node(node)?;
        }
        self.errors
            .extend(nested.errors.into_iter().map(|err| relocate(err, origin)));
        Ok(Cow::Owned(nested.out))
    }

    // === Output ===

    pub(crate) fn write(&mut self, text: &str) {
        self.out.push_str(text);
        self.cursor = self.cursor.advance(text);
    }

    /// Writes `<qualifier>.<text>`.
    pub(crate) fn write_qualified(&mut self, text: &str) {
        let qualified = format!("{}.{text}", self.options.qualifier());
        self.write(&qualified);
    }

    /// Writes `text` with one mapping per character back to `source`.
    pub(crate) fn write_mapped(&mut self, text: &str, source: Position) {
        self.source_map.add_expression(text, source, self.cursor);
        self.write(text);
    }

    fn mark(&mut self, source: Position) {
        self.source_map.add_mapping(source, self.cursor);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.write("\t");
        }
    }
}

/// Moves an error found in expression text to where the text starts.
fn relocate(mut err: ParseError, origin: Location) -> ParseError {
    if err.line == 1 {
        err.column += origin.column.saturating_sub(1);
    }
    err.line += origin.line.saturating_sub(1);
    err.span = err.span.shift(origin.offset);
    err
}

fn position(location: Location) -> Position {
    Position::from_one_based(location.line, location.column)
}

/// Whitespace-only text and comment-only expressions produce no argument.
fn is_emitted(child: &Child) -> bool {
    match child {
        Child::Text(text) => !text.is_whitespace(),
        Child::Expression(expression) => !is_comment_only(&expression.expression),
        Child::Element(_) | Child::Fragment(_) => true,
    }
}
