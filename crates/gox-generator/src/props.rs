//! Attribute emission for intrinsic elements and components.

use crate::expression::is_bare_map_literal;
use crate::generator::Generator;
use crate::GenerateError;
use gox_parser::{Attribute, Element, ExpressionAttribute, SpreadAttribute};
use source_map::Position;
use std::borrow::Cow;

impl Generator<'_> {
    /// Emits the props argument of `Element("tag", props, ...)`.
    ///
    /// `nil` without attributes, a `Props{...}` literal without spreads, and
    /// otherwise `MergeProps(...)` over runs of plain attributes and spread
    /// expressions in source order.
    pub(crate) fn intrinsic_props(
        &mut self,
        attributes: &[Attribute],
    ) -> Result<(), GenerateError> {
        if attributes.is_empty() {
            self.write("nil");
            return Ok(());
        }
        if !attributes.iter().any(is_spread) {
            return self.props_literal(attributes);
        }

        self.write_qualified("MergeProps(");
        let mut i = 0;
        while i < attributes.len() {
            if i > 0 {
                self.write(", ");
            }
            match &attributes[i] {
                Attribute::Spread(spread) => {
                    self.spread(spread)?;
                    i += 1;
                }
                _ => {
                    let end = attributes[i..]
                        .iter()
                        .position(is_spread)
                        .map_or(attributes.len(), |offset| i + offset);
                    self.props_literal(&attributes[i..end])?;
                    i = end;
                }
            }
        }
        self.write(")");
        Ok(())
    }

    fn props_literal(&mut self, attributes: &[Attribute]) -> Result<(), GenerateError> {
        self.write_qualified("Props{");
        for (i, attribute) in attributes.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match attribute {
                Attribute::String(attr) => {
                    self.write(&format!("{}: {}", go_quote(&attr.key), go_quote(&attr.value)));
                }
                Attribute::Expression(attr) => {
                    self.write(&format!("{}: ", go_quote(&attr.key)));
                    self.attribute_value(attr, true)?;
                }
                Attribute::Spread(_) => {}
            }
        }
        self.write("}");
        Ok(())
    }

    /// Emits `NameProps{Field: value, ...}` for a component.
    ///
    /// Spread attributes have no struct literal form and are left out.
    pub(crate) fn component_props(&mut self, element: &Element) -> Result<(), GenerateError> {
        self.write(&format!("{}Props{{", element.name));
        let mut first = true;
        for attribute in &element.attributes {
            if !matches!(attribute, Attribute::Spread(_)) && !first {
                self.write(", ");
            }
            match attribute {
                Attribute::String(attr) => {
                    self.write(&format!("{}: {}", capitalize(&attr.key), go_quote(&attr.value)));
                }
                Attribute::Expression(attr) => {
                    self.write(&format!("{}: ", capitalize(&attr.key)));
                    self.attribute_value(attr, false)?;
                }
                Attribute::Spread(_) => continue,
            }
            first = false;
        }
        self.write("}");
        Ok(())
    }

    fn attribute_value(
        &mut self,
        attr: &ExpressionAttribute,
        wrap_map_literal: bool,
    ) -> Result<(), GenerateError> {
        let expression = attr.expression.trim();
        let leading = attr.expression.len() - attr.expression.trim_start().len();
        let origin = attr
            .value_range
            .map(|range| range.start.advance(&attr.expression[..leading]));
        let value = self.transform_expression(expression, origin.unwrap_or_default())?;
        if wrap_map_literal && is_bare_map_literal(&value) {
            self.write("map[string]any");
        }
        match (value, origin) {
            (Cow::Borrowed(text), Some(origin)) => {
                self.write_mapped(text, Position::from_one_based(origin.line, origin.column));
            }
            (value, _) => self.write(&value),
        }
        Ok(())
    }

    fn spread(&mut self, spread: &SpreadAttribute) -> Result<(), GenerateError> {
        match self.transform_expression(&spread.expression, spread.value_range.start)? {
            Cow::Borrowed(text) => {
                let start = spread.value_range.start;
                self.write_mapped(text, Position::from_one_based(start.line, start.column));
            }
            Cow::Owned(text) => self.write(&text),
        }
        Ok(())
    }
}

fn is_spread(attribute: &Attribute) -> bool {
    matches!(attribute, Attribute::Spread(_))
}

/// Quotes `s` as a Go interpreted string literal.
pub(crate) fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x80 && c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Uppercases the first character: `onClick` becomes `OnClick`.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_quote() {
        assert_eq!(go_quote("Hello World"), "\"Hello World\"");
        assert_eq!(go_quote("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(go_quote("a\\b"), r#""a\\b""#);
        assert_eq!(go_quote("tab\there\n"), r#""tab\there\n""#);
        assert_eq!(go_quote("\u{1}"), r#""\x01""#);
        assert_eq!(go_quote("\u{85}"), r#""\u0085""#);
        assert_eq!(go_quote("héllo ✓"), "\"héllo ✓\"");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("label"), "Label");
        assert_eq!(capitalize("onClick"), "OnClick");
        assert_eq!(capitalize("ärger"), "Ärger");
        assert_eq!(capitalize("X"), "X");
        assert_eq!(capitalize(""), "");
    }
}
