//! Leaf token readers: pure functions from a remaining-input string to a
//! `ReadResult`, with `None` standing for "this rule does not match here".
//! Patterns are matched by explicit scanners rather than a regex dialect so
//! that escaped parentheses and quotes inside selector parameters are handled
//! exactly.

use crate::token::{ReadResult, Token, TokenTag};
use std::rc::Rc;

/// A token reader. Readers are cheap to clone and freely composable; the
/// residual of a successful read is always a suffix of the reader's input.
pub type Reader = Rc<dyn for<'a> Fn(&'a str) -> Option<ReadResult<'a>>>;

/// Builds a reader that matches `pattern` anchored at the start of the input,
/// ignoring ASCII case. The token value is the pattern with any leading
/// selector dot stripped; the residual is everything after the match.
pub fn literal(tag: TokenTag, pattern: &str) -> Reader {
    let pattern = pattern.to_string();
    let value = pattern.trim_start_matches('.').to_string();
    Rc::new(move |input: &str| {
        let head = input.as_bytes().get(..pattern.len())?;
        if !head.eq_ignore_ascii_case(pattern.as_bytes()) {
            return None;
        }
        // The pattern is ASCII, so the matched prefix is too and the slice
        // below lands on a char boundary.
        Some(ReadResult {
            token: Token::text(tag, value.clone()),
            residual: &input[pattern.len()..],
        })
    })
}

/// Builds a reader for a selector with one quoted string parameter, e.g.
/// `.view("Servers")`. The selector's own token is discarded; only the
/// unescaped parameter survives, tagged with `tag`.
pub fn selector_with_parameter(tag: TokenTag, name: &str) -> Reader {
    let open = literal(TokenTag::Selector, &format!(".{name}("));
    Rc::new(move |input: &str| {
        let opened = open(input)?;
        let (value, rest) = read_quoted_parameter(opened.residual)?;
        let residual = rest.strip_prefix(')')?;
        Some(ReadResult {
            token: Token::text(tag, value),
            residual,
        })
    })
}

/// The catch-all reader: always succeeds, consumes nothing and produces the
/// null token. Used to make optional grammar slots total.
pub fn nothing() -> Reader {
    Rc::new(|input: &str| {
        Some(ReadResult {
            token: Token::nothing(),
            residual: input,
        })
    })
}

/// Scans a double-quoted parameter at the start of the input. The escapes
/// `\(`, `\)` and `\"` are unescaped in the captured value; any other
/// backslash sequence is kept verbatim. Returns the captured value and the
/// input after the closing quote, or `None` if the opening or closing quote
/// is missing.
fn read_quoted_parameter(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let mut value = String::new();
    let mut chars = body.char_indices();
    while let Some((at, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped @ ('(' | ')' | '"'))) => value.push(escaped),
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => return None,
            },
            '"' => return Some((value, &body[at + 1..])),
            _ => value.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matches_case_insensitively() {
        let reader = literal(TokenTag::Nodes, "nodes");
        let result = reader("NODES.windows").unwrap();
        assert_eq!(result.token, Token::text(TokenTag::Nodes, "nodes"));
        assert_eq!(result.residual, ".windows");
    }

    #[test]
    fn test_literal_is_anchored() {
        let reader = literal(TokenTag::Nodes, "nodes");
        assert!(reader(" nodes").is_none());
        assert!(reader("node").is_none());
        assert!(reader("").is_none());
    }

    #[test]
    fn test_literal_strips_selector_dot_from_value() {
        let reader = literal(TokenTag::MonitoringPacks, ".monitoringPacks");
        let result = reader(".monitoringpacks.folder(\"x\")").unwrap();
        assert_eq!(result.token.as_text(), Some("monitoringPacks"));
        assert_eq!(result.residual, ".folder(\"x\")");
    }

    #[test]
    fn test_selector_with_parameter() {
        let reader = selector_with_parameter(TokenTag::View, "view");
        let result = reader(".view(\"Servers\").windows").unwrap();
        assert_eq!(result.token, Token::text(TokenTag::View, "Servers"));
        assert_eq!(result.residual, ".windows");
    }

    #[test]
    fn test_selector_parameter_unescapes_documented_escapes() {
        let reader = selector_with_parameter(TokenTag::Folder, "folder");
        let result = reader(r#".folder("a \(b\) \"c\"")"#).unwrap();
        assert_eq!(result.token.as_text(), Some(r#"a (b) "c""#));
        assert_eq!(result.residual, "");
    }

    #[test]
    fn test_selector_parameter_keeps_unknown_escapes_verbatim() {
        let reader = selector_with_parameter(TokenTag::Folder, "folder");
        let result = reader(r#".folder("a\nb")"#).unwrap();
        assert_eq!(result.token.as_text(), Some(r"a\nb"));
    }

    #[test]
    fn test_selector_fails_without_closing_quote_or_paren() {
        let reader = selector_with_parameter(TokenTag::Folder, "folder");
        assert!(reader(".folder(\"open").is_none());
        assert!(reader(".folder(\"x\"").is_none());
        assert!(reader(".folder(x)").is_none());
    }

    #[test]
    fn test_nothing_always_succeeds_consuming_zero_input() {
        let reader = nothing();
        let result = reader("anything").unwrap();
        assert!(result.token.is_null());
        assert_eq!(result.residual, "anything");
    }
}
