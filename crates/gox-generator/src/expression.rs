//! Textual analysis of Go expressions lifted out of `{...}`.

/// An expression of the form `condition && node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conditional<'a> {
    pub condition: &'a str,
    pub condition_offset: usize,
    pub node: &'a str,
    pub node_offset: usize,
}

/// Splits `expr` at its last `&&` outside brackets and string literals.
///
/// Returns `None` when there is no such `&&`, when either side is empty, or
/// when a top-level `||` makes the split ambiguous.
pub(crate) fn split_conditional(expr: &str) -> Option<Conditional<'_>> {
    let bytes = expr.as_bytes();
    let mut depth = 0i32;
    let mut split = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_quoted(bytes, i),
            b'`' => i = skip_raw(bytes, i),
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                depth -= 1;
                i += 1;
            }
            b'&' if depth == 0 && bytes.get(i + 1) == Some(&b'&') => {
                split = Some(i);
                i += 2;
            }
            b'|' if depth == 0 && bytes.get(i + 1) == Some(&b'|') => return None,
            _ => i += 1,
        }
    }

    let at = split?;
    let (condition, condition_offset) = trimmed(expr, 0, at);
    let (node, node_offset) = trimmed(expr, at + 2, expr.len());
    if condition.is_empty() || node.is_empty() {
        return None;
    }
    Some(Conditional {
        condition,
        condition_offset,
        node,
        node_offset,
    })
}

fn trimmed(expr: &str, start: usize, end: usize) -> (&str, usize) {
    let slice = &expr[start..end];
    let leading = slice.len() - slice.trim_start().len();
    (slice.trim(), start + leading)
}

/// Returns the index just past the string or rune literal starting at `start`.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_raw(bytes: &[u8], start: usize) -> usize {
    match bytes[start + 1..].iter().position(|&b| b == b'`') {
        Some(end) => start + end + 2,
        None => bytes.len(),
    }
}

/// Returns true if `expr` holds nothing but Go comments and whitespace.
pub(crate) fn is_comment_only(expr: &str) -> bool {
    let mut rest = expr.trim_start();
    loop {
        if let Some(comment) = rest.strip_prefix("//") {
            rest = match comment.find('\n') {
                Some(end) => comment[end..].trim_start(),
                None => "",
            };
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = match comment.find("*/") {
                Some(end) => comment[end + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest.is_empty();
        }
    }
}

/// Returns true if `expr` contains a closing tag or a self-closing `/>`.
pub(crate) fn closes_markup(expr: &str) -> bool {
    expr.contains("</") || expr.contains("/>")
}

/// Returns true for a bare composite literal such as `{"a": 1}`.
pub(crate) fn is_bare_map_literal(expr: &str) -> bool {
    let expr = expr.trim();
    expr.len() >= 2 && expr.starts_with('{') && expr.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split(expr: &str) -> Option<(&str, &str)> {
        split_conditional(expr).map(|c| (c.condition, c.node))
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(split("ok && <b/>"), Some(("ok", "<b/>")));
        assert_eq!(split("len(xs) > 0&&x"), Some(("len(xs) > 0", "x")));
    }

    #[test]
    fn test_split_uses_last_top_level_and() {
        assert_eq!(
            split("a && b && gox.Text(\"x\")"),
            Some(("a && b", "gox.Text(\"x\")"))
        );
    }

    #[test]
    fn test_split_ignores_nested_and_quoted() {
        assert_eq!(split("f(a && b)"), None);
        assert_eq!(split("items[a && b]"), None);
        assert_eq!(split("\"a && b\""), None);
        assert_eq!(split("`a && b`"), None);
        assert_eq!(split("'&' == c"), None);
        assert_eq!(split("ok && gox.Text(\"x && y\")"), Some(("ok", "gox.Text(\"x && y\")")));
    }

    #[test]
    fn test_split_rejects_or_and_empty_sides() {
        assert_eq!(split("a || b && c"), None);
        assert_eq!(split("&& x"), None);
        assert_eq!(split("x &&  "), None);
        assert_eq!(split("name"), None);
    }

    #[test]
    fn test_split_offsets() {
        let expr = "ready  &&  node";
        let c = split_conditional(expr);
        assert_eq!(c.map(|c| (c.condition_offset, c.node_offset)), Some((0, 11)));
    }

    #[test]
    fn test_comment_only() {
        assert!(is_comment_only(""));
        assert!(is_comment_only("  "));
        assert!(is_comment_only("/* note */"));
        assert!(is_comment_only("// note"));
        assert!(is_comment_only("/* a */ // b\n  /* c */"));
        assert!(is_comment_only("/* unterminated"));
        assert!(!is_comment_only("/* a */ x /* b */"));
        assert!(!is_comment_only("// note\nvalue"));
        assert!(!is_comment_only("x // trailing"));
    }

    #[test]
    fn test_closes_markup() {
        assert!(closes_markup("ok && <li>a</b>"));
        assert!(closes_markup("f(<br/>)"));
        assert!(!closes_markup("i<n && j > 2"));
        assert!(!closes_markup("a / b"));
    }

    #[test]
    fn test_bare_map_literal() {
        assert!(is_bare_map_literal("{\"color\": \"red\"}"));
        assert!(is_bare_map_literal(" {} "));
        assert!(!is_bare_map_literal("map[string]any{}"));
        assert!(!is_bare_map_literal("Style{}"));
        assert!(!is_bare_map_literal("{"));
    }
}
