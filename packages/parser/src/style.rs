//! # Inline Style Maps
//!
//! Parses the object literal of a `style={{ ... }}` attribute into an
//! ordered property map and writes it back. Spreads (`...base`) are kept
//! verbatim in place. Parsing is best-effort: any other fragment that is
//! not a `key: value` pair is dropped instead of failing.
//!
//! CSS-string styles (`style="left: 10px; top: 0"`) are supported through
//! [`StyleMap::parse_css`] / [`StyleMap::to_css`].

use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum StyleToken {
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,

    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"`([^`\\]|\\.)*`")]
    Template,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$\-]*")]
    Ident,

    #[regex(r"[.?+*/%!<>=&|-]+")]
    Operator,
}

/// A single style value as written in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum StyleValue {
    /// Quoted string literal, stored unquoted
    Literal(String),
    /// Bare numeric literal (React treats lengths as px)
    Number(String),
    /// Any other expression, stored verbatim (`data.color`, template literals)
    Expression(String),
    /// `...expr` entry, stored without the dots
    Spread(String),
}

impl StyleValue {
    /// Value as a CSS string, without evaluating expressions
    pub fn as_css(&self) -> String {
        match self {
            StyleValue::Literal(value) => value.clone(),
            StyleValue::Number(n) => format!("{}px", n),
            StyleValue::Expression(expr) | StyleValue::Spread(expr) => expr.clone(),
        }
    }

    /// Whether this value already renders as `css`
    pub fn matches(&self, css: &str) -> bool {
        match self {
            StyleValue::Literal(value) => value == css,
            StyleValue::Number(n) => n == css || format!("{}px", n) == css,
            StyleValue::Expression(expr) => expr == css,
            StyleValue::Spread(_) => false,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Literal(value) => write!(f, "'{}'", value.replace('\'', "\\'")),
            StyleValue::Number(n) => write!(f, "{}", n),
            StyleValue::Expression(expr) => write!(f, "{}", expr),
            StyleValue::Spread(expr) => write!(f, "...{}", expr),
        }
    }
}

/// Ordered property → value map. Insertion order is preserved so that
/// re-serialising keeps the author's property order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleMap {
    entries: Vec<(String, StyleValue)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the object literal inside `style={...}`. Accepts the inner
    /// `{ left: '10px' }` form with or without its braces.
    pub fn parse_object(text: &str) -> Self {
        let mut lexer = StyleToken::lexer(text.trim()).spanned().peekable();
        let mut map = StyleMap::new();
        let mut depth = 0usize;

        // Leading braces belong to the literal itself
        while let Some((Ok(StyleToken::LBrace), _)) = lexer.peek() {
            depth += 1;
            lexer.next();
        }

        let source = text.trim();
        loop {
            // key
            let key = match lexer.next() {
                None => break,
                Some((Ok(StyleToken::Ident), span)) => source[span].to_string(),
                Some((Ok(StyleToken::SingleQuoted | StyleToken::DoubleQuoted), span)) => {
                    unquote(&source[span]).to_string()
                }
                Some((Ok(StyleToken::RBrace), _)) if depth > 0 => {
                    depth -= 1;
                    continue;
                }
                Some((Ok(StyleToken::Comma), _)) => continue,
                Some((Ok(StyleToken::Operator), span)) if &source[span.clone()] == "..." => {
                    match take_value(&mut lexer) {
                        Some(parts) => {
                            let expr = span_text(source, &parts);
                            map.set_value(format!("...{}", expr), StyleValue::Spread(expr));
                        }
                        None => tracing::debug!("dropping malformed spread"),
                    }
                    continue;
                }
                Some(_) => {
                    skip_fragment(&mut lexer);
                    continue;
                }
            };

            if !matches!(lexer.next(), Some((Ok(StyleToken::Colon), _))) {
                tracing::debug!(key = %key, "dropping style fragment without ':'");
                skip_fragment(&mut lexer);
                continue;
            }

            let Some(parts) = take_value(&mut lexer) else {
                tracing::debug!(key = %key, "dropping malformed style value");
                continue;
            };

            let value = match parts.as_slice() {
                [(StyleToken::SingleQuoted | StyleToken::DoubleQuoted, span)] => {
                    StyleValue::Literal(unquote(&source[span.clone()]).to_string())
                }
                [(StyleToken::Number, span)] => StyleValue::Number(source[span.clone()].to_string()),
                [(StyleToken::Operator, op), (StyleToken::Number, span)]
                    if &source[op.clone()] == "-" =>
                {
                    StyleValue::Number(format!("-{}", &source[span.clone()]))
                }
                _ => StyleValue::Expression(span_text(source, &parts)),
            };
            map.set_value(key, value);
        }

        map
    }

    /// Parse a CSS declaration string (`left: 10px; top: 20px`)
    pub fn parse_css(text: &str) -> Self {
        let mut map = StyleMap::new();
        for declaration in text.split(';') {
            let Some((key, value)) = declaration.split_once(':') else {
                if !declaration.trim().is_empty() {
                    tracing::debug!(fragment = declaration, "dropping css fragment");
                }
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }
            map.set_value(key.to_string(), StyleValue::Literal(value.to_string()));
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Set a literal string value, replacing in place or appending
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_value(key.into(), StyleValue::Literal(value.into()));
    }

    pub fn set_value(&mut self, key: String, value: StyleValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// True when every `(key, css)` pair is already present with that value
    pub fn contains_all<'a>(&self, changes: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
        changes
            .into_iter()
            .all(|(key, css)| self.get(key).is_some_and(|v| v.matches(css)))
    }

    /// Properties in source order; spreads are skipped
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries
            .iter()
            .filter(|(_, v)| !matches!(v, StyleValue::Spread(_)))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties, not counting spreads
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object literal body: `{left:'50px', top:'80px'}`
    pub fn to_object_literal(&self) -> String {
        let body: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| match v {
                StyleValue::Spread(_) => v.to_string(),
                _ => format!("{}:{}", object_key(k), v),
            })
            .collect();
        format!("{{{}}}", body.join(", "))
    }

    /// JSX attribute value: `{{left:'50px', top:'80px'}}`
    pub fn to_jsx_attribute(&self) -> String {
        format!("{{{}}}", self.to_object_literal())
    }

    /// CSS declaration string: `left: 50px; top: 80px`
    pub fn to_css(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}: {}", k, v.as_css()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn object_key(key: &str) -> String {
    if crate::expression::is_identifier(key) {
        key.to_string()
    } else {
        format!("'{}'", key)
    }
}

fn unquote(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

type Spanned = (StyleToken, std::ops::Range<usize>);

/// Tokens up to (not including) the next top-level `,` or `}`.
/// `None` when the run is empty or contains an unlexable character.
fn take_value<I>(lexer: &mut std::iter::Peekable<I>) -> Option<Vec<Spanned>>
where
    I: Iterator<Item = (Result<StyleToken, ()>, std::ops::Range<usize>)>,
{
    let mut parts = Vec::new();
    let mut nesting = 0usize;
    let mut malformed = false;
    while let Some((token, span)) = lexer.peek().cloned() {
        match token {
            Ok(StyleToken::Comma | StyleToken::RBrace) if nesting == 0 => break,
            Ok(StyleToken::LBrace | StyleToken::LParen | StyleToken::LBracket) => nesting += 1,
            Ok(StyleToken::RBrace | StyleToken::RParen | StyleToken::RBracket) => {
                nesting = nesting.saturating_sub(1)
            }
            Err(()) => malformed = true,
            _ => {}
        }
        if let Ok(token) = token {
            parts.push((token, span));
        }
        lexer.next();
    }
    (!malformed && !parts.is_empty()).then_some(parts)
}

/// Source text from the first token to the last
fn span_text(source: &str, parts: &[Spanned]) -> String {
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) => source[first.1.start..last.1.end].to_string(),
        _ => String::new(),
    }
}

/// Drop tokens up to (not including) the next top-level `,` or `}`
fn skip_fragment<I>(lexer: &mut std::iter::Peekable<I>)
where
    I: Iterator<Item = (Result<StyleToken, ()>, std::ops::Range<usize>)>,
{
    let mut nesting = 0usize;
    while let Some((token, _)) = lexer.peek() {
        match token {
            Ok(StyleToken::Comma | StyleToken::RBrace) if nesting == 0 => return,
            Ok(StyleToken::LBrace | StyleToken::LParen | StyleToken::LBracket) => nesting += 1,
            Ok(StyleToken::RBrace | StyleToken::RParen | StyleToken::RBracket) => {
                nesting = nesting.saturating_sub(1)
            }
            _ => {}
        }
        lexer.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geometry_map() {
        let map = StyleMap::parse_object("{left:'10px',top:'20px',width:'100px',height:'50px'}");
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("left"), Some(&StyleValue::Literal("10px".into())));
        assert_eq!(map.get("height"), Some(&StyleValue::Literal("50px".into())));
    }

    #[test]
    fn test_parse_mixed_values() {
        let map = StyleMap::parse_object(
            r#"{ "font-size": "12px", zIndex: 3, margin: -4, color: data.color, transform: `rotate(${deg}deg)` }"#,
        );
        assert_eq!(map.get("font-size"), Some(&StyleValue::Literal("12px".into())));
        assert_eq!(map.get("zIndex"), Some(&StyleValue::Number("3".into())));
        assert_eq!(map.get("margin"), Some(&StyleValue::Number("-4".into())));
        assert_eq!(map.get("color"), Some(&StyleValue::Expression("data.color".into())));
        assert!(matches!(map.get("transform"), Some(StyleValue::Expression(_))));
    }

    #[test]
    fn test_malformed_fragments_are_dropped() {
        let map = StyleMap::parse_object("{left:'10px', garbage, top:, :'x', width:'5px'");
        assert_eq!(map.get("left"), Some(&StyleValue::Literal("10px".into())));
        assert_eq!(map.get("width"), Some(&StyleValue::Literal("5px".into())));
        assert!(map.get("top").is_none());
        assert!(map.get("garbage").is_none());
    }

    #[test]
    fn test_serialize_preserves_order() {
        let mut map = StyleMap::parse_object("{left:'10px',top:'20px'}");
        map.set("left", "50px");
        map.set("color", "red");
        assert_eq!(map.to_object_literal(), "{left:'50px', top:'20px', color:'red'}");
        assert_eq!(map.to_jsx_attribute(), "{{left:'50px', top:'20px', color:'red'}}");
    }

    #[test]
    fn test_number_matches_px() {
        let map = StyleMap::parse_object("{left: 10}");
        assert!(map.contains_all([("left", "10px")]));
        assert!(!map.contains_all([("left", "11px")]));
    }

    #[test]
    fn test_spread_is_kept_in_place() {
        let mut map = StyleMap::parse_object("{ ...base, left: '10px', ...theme.card }");
        assert_eq!(map.len(), 1);
        assert!(map.iter().all(|(k, _)| k == "left"));
        map.set("left", "50px");
        map.set("top", "80px");
        assert_eq!(
            map.to_object_literal(),
            "{...base, left:'50px', ...theme.card, top:'80px'}"
        );
        assert_eq!(map.to_css(), "left: 50px; top: 80px");
    }

    #[test]
    fn test_css_string_round_trip() {
        let map = StyleMap::parse_css("left: 10px; top: 20px; bogus");
        assert_eq!(map.len(), 2);
        assert_eq!(map.to_css(), "left: 10px; top: 20px");
    }
}
