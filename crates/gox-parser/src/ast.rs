//! AST types for `.gox` documents.
//!
//! A document is an ordered list of opaque Go code blocks and markup trees.
//! Every node carries a [`Range`] with 1-indexed line/column positions.

use smol_str::SmolStr;
use source_map::Span;
use text_size::TextSize;

/// A position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location {
    /// Byte offset from the start of the file.
    pub offset: TextSize,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column, counted in characters.
    pub column: u32,
}

impl Location {
    /// Creates a new location.
    pub fn new(offset: TextSize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Returns the location reached after walking over `text` from here.
    pub fn advance(self, text: &str) -> Self {
        let mut loc = self;
        for c in text.chars() {
            if c == '\n' {
                loc.line += 1;
                loc.column = 1;
            } else {
                loc.column += 1;
            }
        }
        loc.offset += TextSize::of(text);
        loc
    }
}

/// A start/end pair of source locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    /// The first character of the node.
    pub start: Location,
    /// One past the last character of the node.
    pub end: Location,
}

impl Range {
    /// Creates a new range.
    pub fn new(start: Location, end: Location) -> Self {
        debug_assert!(start.offset <= end.offset);
        Self { start, end }
    }

    /// Returns the byte span of this range.
    pub fn span(&self) -> Span {
        Span::new(self.start.offset, self.end.offset)
    }

    /// Returns true if `other` lies within this range.
    pub fn contains(&self, other: &Range) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

/// A parsed `.gox` file.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The file name used in error messages.
    pub source_path: String,
    /// Top-level nodes in source order.
    pub nodes: Vec<Node>,
}

impl Document {
    /// Returns true if the document contains any element or fragment.
    pub fn has_markup(&self) -> bool {
        self.nodes.iter().any(|node| !matches!(node, Node::HostCode(_)))
    }

    /// Returns the name in the leading `package` clause, if any.
    ///
    /// Comments and blank lines before the clause are skipped.
    pub fn package_name(&self) -> Option<&str> {
        let Some(Node::HostCode(code)) = self.nodes.first() else {
            return None;
        };
        let mut in_block_comment = false;
        for line in code.code.lines() {
            let line = line.trim();
            if in_block_comment {
                if let Some(end) = line.find("*/") {
                    in_block_comment = false;
                    if !line[end + 2..].trim().is_empty() {
                        return package_clause(line[end + 2..].trim());
                    }
                }
                continue;
            }
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if line.starts_with("/*") {
                match line.find("*/") {
                    Some(end) if !line[end + 2..].trim().is_empty() => {
                        return package_clause(line[end + 2..].trim());
                    }
                    Some(_) => {}
                    None => in_block_comment = true,
                }
                continue;
            }
            return package_clause(line);
        }
        None
    }
}

fn package_clause(line: &str) -> Option<&str> {
    let name = line.strip_prefix("package")?;
    if !name.starts_with(char::is_whitespace) {
        return None;
    }
    name.split_whitespace().next()
}

/// A top-level node.
#[derive(Debug, Clone)]
pub enum Node {
    /// Verbatim Go source.
    HostCode(HostCode),
    /// An element or component.
    Element(Element),
    /// A `<>...</>` fragment.
    Fragment(Fragment),
}

impl Node {
    /// Returns the source range of this node.
    pub fn range(&self) -> Range {
        match self {
            Node::HostCode(n) => n.range,
            Node::Element(n) => n.range,
            Node::Fragment(n) => n.range,
        }
    }
}

/// A verbatim slice of Go source.
#[derive(Debug, Clone)]
pub struct HostCode {
    /// The Go source text.
    pub code: String,
    /// The source range.
    pub range: Range,
}

/// An element (`<div>`) or component (`<Button>`).
#[derive(Debug, Clone)]
pub struct Element {
    /// The tag name as written.
    pub name: SmolStr,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Child nodes. Always empty when `self_closing` is set.
    pub children: Vec<Child>,
    /// Whether the element was written `<name/>`.
    pub self_closing: bool,
    /// The source range, from `<` to the end of the closing tag.
    pub range: Range,
}

impl Element {
    /// Components start with an uppercase letter; everything else is intrinsic.
    pub fn is_component(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }

    /// Returns true if any attribute is a spread.
    pub fn has_spread(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, Attribute::Spread(_)))
    }
}

/// A `<>...</>` fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Child nodes.
    pub children: Vec<Child>,
    /// The source range.
    pub range: Range,
}

/// An attribute on an element.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// `key="value"`
    String(StringAttribute),
    /// `key={expr}` or a bare `key`.
    Expression(ExpressionAttribute),
    /// `{...expr}` or `...expr`.
    Spread(SpreadAttribute),
}

impl Attribute {
    /// Returns the attribute key, if it has one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Attribute::String(a) => Some(&a.key),
            Attribute::Expression(a) => Some(&a.key),
            Attribute::Spread(_) => None,
        }
    }

    /// Returns the source range of this attribute.
    pub fn range(&self) -> Range {
        match self {
            Attribute::String(a) => a.range,
            Attribute::Expression(a) => a.range,
            Attribute::Spread(a) => a.range,
        }
    }
}

/// `key="value"`
#[derive(Debug, Clone)]
pub struct StringAttribute {
    pub key: SmolStr,
    /// The literal value with `\"` unescaped.
    pub value: String,
    pub range: Range,
}

/// `key={expr}`; a bare `key` has the expression `true` and no value range.
#[derive(Debug, Clone)]
pub struct ExpressionAttribute {
    pub key: SmolStr,
    pub expression: String,
    pub range: Range,
    /// Where the expression text sits in the source.
    pub value_range: Option<Range>,
}

/// `{...expr}` or `...expr`
#[derive(Debug, Clone)]
pub struct SpreadAttribute {
    pub expression: String,
    pub range: Range,
    /// Where the expression text (after `...`) sits in the source.
    pub value_range: Range,
}

/// A child of an element or fragment.
#[derive(Debug, Clone)]
pub enum Child {
    /// A run of text.
    Text(Text),
    /// A `{expr}` child.
    Expression(ExpressionChild),
    /// A nested element.
    Element(Element),
    /// A nested fragment.
    Fragment(Fragment),
}

impl Child {
    /// Returns the source range of this child.
    pub fn range(&self) -> Range {
        match self {
            Child::Text(n) => n.range,
            Child::Expression(n) => n.range,
            Child::Element(n) => n.range,
            Child::Fragment(n) => n.range,
        }
    }
}

/// A run of text between tags.
#[derive(Debug, Clone)]
pub struct Text {
    pub value: String,
    pub range: Range,
}

impl Text {
    /// Whitespace-only text carries no meaning.
    pub fn is_whitespace(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// A `{expr}` child.
#[derive(Debug, Clone)]
pub struct ExpressionChild {
    /// The text between the braces, unprocessed.
    pub expression: String,
    /// The range including the braces.
    pub range: Range,
    /// The range of the text between the braces.
    pub value_range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(code: &str) -> Document {
        Document {
            source_path: "test.gox".into(),
            nodes: vec![Node::HostCode(HostCode {
                code: code.to_string(),
                range: Range::default(),
            })],
        }
    }

    #[test]
    fn test_location_advance() {
        let start = Location::new(TextSize::from(4), 2, 3);
        let end = start.advance("ab\ncdé");
        assert_eq!(end.line, 3);
        assert_eq!(end.column, 4);
        assert_eq!(end.offset, TextSize::from(4 + 7));
    }

    #[test]
    fn test_package_name() {
        assert_eq!(host("package main\n").package_name(), Some("main"));
        assert_eq!(
            host("// Package views renders pages.\n\npackage views\n").package_name(),
            Some("views")
        );
        assert_eq!(
            host("/*\nlicense\n*/\npackage ui // trailing\n").package_name(),
            Some("ui")
        );
        assert_eq!(host("func f() {}\n").package_name(), None);
        assert_eq!(host("packages := 1\n").package_name(), None);
        assert_eq!(Document::default().package_name(), None);
    }

    #[test]
    fn test_has_markup() {
        assert!(!host("package main\n").has_markup());
        let doc = Document {
            source_path: String::new(),
            nodes: vec![Node::Fragment(Fragment {
                children: Vec::new(),
                range: Range::default(),
            })],
        };
        assert!(doc.has_markup());
    }

    #[test]
    fn test_component_classification() {
        let element = |name: &str| Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: true,
            range: Range::default(),
        };
        assert!(element("Button").is_component());
        assert!(element("Ärger").is_component());
        assert!(!element("div").is_component());
        assert!(!element("_x").is_component());
    }
}
