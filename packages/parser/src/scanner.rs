//! # Tag Scanner
//!
//! Index-addressable scan of component source. Instead of a full parse the
//! scanner records byte spans for every opening and closing tag, so callers
//! can rewrite one element and copy everything else verbatim.
//!
//! ## Addressing
//!
//! Every intrinsic element (tag name starting with a lowercase letter) that
//! does not sit on a comment-like line receives an ordinal, counted in
//! source order. The ordinal is the only key that links a rendered element
//! back to its text; inserting or removing an element shifts every later
//! ordinal.
//!
//! ## Tag detection
//!
//! A `<` starts a tag when it is followed by a letter, `/` or `>` and either
//! sits inside an already open element (JSX children) or follows a token
//! that can precede an expression (`(`, `=>`, `return`, `&&`, ...). A
//! candidate whose attribute list does not scan cleanly is not a tag.

use std::ops::Range;

/// Elements that never have children, even without `/>`
const VOID_TAGS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// `name="value"` / `name='value'`; span includes the quotes
    Quoted {
        span: Range<usize>,
        quote: char,
        value: String,
    },
    /// `name={expr}`; span includes the braces
    Expression { span: Range<usize>, inner: String },
}

impl AttributeValue {
    pub fn span(&self) -> Range<usize> {
        match self {
            AttributeValue::Quoted { span, .. } | AttributeValue::Expression { span, .. } => {
                span.clone()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// From the first byte of the name to the end of the value
    pub span: Range<usize>,
    pub value: Option<AttributeValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenTag {
    /// Ordinal among addressable elements, `None` for components/fragments
    pub ordinal: Option<usize>,
    pub name: String,
    /// Offset of `<`
    pub start: usize,
    /// Offset one past the tag name
    pub name_end: usize,
    /// Offset one past the closing `>`
    pub end: usize,
    pub self_closing: bool,
    pub attributes: Vec<Attribute>,
}

impl OpenTag {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Leaf element: self-closing or a void element
    pub fn is_leaf(&self) -> bool {
        self.self_closing || VOID_TAGS.contains(&self.name.as_str())
    }

    /// Offset of the `>` (or `/>`) that terminates the tag
    pub fn terminator_start(&self) -> usize {
        if self.self_closing {
            self.end - 2
        } else {
            self.end - 1
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseTag {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagToken {
    Open(OpenTag),
    Close(CloseTag),
}

impl TagToken {
    pub fn start(&self) -> usize {
        match self {
            TagToken::Open(open) => open.start,
            TagToken::Close(close) => close.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            TagToken::Open(open) => open.end,
            TagToken::Close(close) => close.end,
        }
    }
}

/// Scan `source` for tag tokens in document order.
pub fn scan(source: &str) -> Vec<TagToken> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut open_depth: usize = 0;
    let mut next_ordinal = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        if is_comment_line(source, i) {
            i += 1;
            continue;
        }

        let in_children = open_depth > 0;
        let next = bytes.get(i + 1).copied();

        match next {
            Some(b'/') => {
                if let Some(close) = scan_close_tag(source, i) {
                    if in_children {
                        open_depth -= 1;
                        i = close.end;
                        tokens.push(TagToken::Close(close));
                        continue;
                    }
                }
            }
            Some(c) if (c.is_ascii_alphabetic() || c == b'>') => {
                if in_children || can_start_markup(source, i) {
                    if let Some(mut open) = scan_open_tag(source, i) {
                        if is_addressable(&open.name) {
                            open.ordinal = Some(next_ordinal);
                            next_ordinal += 1;
                        }
                        if !open.is_leaf() {
                            open_depth += 1;
                        }
                        i = open.end;
                        tokens.push(TagToken::Open(open));
                        continue;
                    }
                    tracing::debug!(offset = i, "'<' does not start a well-formed tag");
                }
            }
            _ => {}
        }

        i += 1;
    }

    tokens
}

/// Intrinsic elements are addressable; components (`Card`, `motion.div`)
/// and fragments are not
pub fn is_addressable(name: &str) -> bool {
    name.as_bytes()
        .first()
        .is_some_and(|c| c.is_ascii_lowercase())
        && !name.contains('.')
}

/// True when the line holding `pos` is comment-like: it opens with `//`,
/// `/*` or `{/*`, or with `*` while a block comment is still open
pub fn is_comment_line(source: &str, pos: usize) -> bool {
    let line_start = source[..pos].rfind('\n').map(|n| n + 1).unwrap_or(0);
    let line = source[line_start..].trim_start();
    if line.starts_with("//") || line.starts_with("/*") || line.starts_with("{/*") {
        return true;
    }
    line.starts_with('*') && in_block_comment(&source[..line_start])
}

/// `before` ends inside an unterminated `/* ...`
fn in_block_comment(before: &str) -> bool {
    before
        .rfind("/*")
        .is_some_and(|open| !before[open + 2..].contains("*/"))
}

/// Skip a `{ ... }` group starting at `start` (which must be `{`).
///
/// Returns the offset one past the matching `}`. String and template
/// literals are skipped so braces inside them do not count.
pub fn skip_balanced(bytes: &[u8], start: usize) -> Option<usize> {
    debug_assert_eq!(bytes.get(start), Some(&b'{'));
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            quote @ (b'\'' | b'"' | b'`') => {
                i = skip_string(bytes, i, quote)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Offset one past the closing quote of the literal opened at `start`
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn can_start_markup(source: &str, pos: usize) -> bool {
    let before = source[..pos].trim_end();
    let Some(prev) = before.chars().last() else {
        return true;
    };
    if matches!(prev, '(' | ',' | '>' | '}' | '{' | '=' | '?' | ':' | '&' | '|' | '[' | ';') {
        return true;
    }
    before.ends_with("return") && {
        let head = &before[..before.len() - "return".len()];
        !head
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    }
}

fn is_name_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b':' | b'.' | b'$')
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn scan_open_tag(source: &str, start: usize) -> Option<OpenTag> {
    let bytes = source.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name_end = i;
    let name = source[start + 1..name_end].to_string();
    let mut attributes = Vec::new();

    loop {
        i = skip_whitespace(bytes, i);
        match *bytes.get(i)? {
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some(OpenTag {
                    ordinal: None,
                    name,
                    start,
                    name_end,
                    end: i + 2,
                    self_closing: true,
                    attributes,
                });
            }
            b'>' => {
                return Some(OpenTag {
                    ordinal: None,
                    name,
                    start,
                    name_end,
                    end: i + 1,
                    self_closing: false,
                    attributes,
                });
            }
            b'{' => {
                // spread attributes: `{...props}`
                i = skip_balanced(bytes, i)?;
            }
            c if is_name_byte(c) && !name.is_empty() => {
                let attr_start = i;
                while i < bytes.len() && is_name_byte(bytes[i]) {
                    i += 1;
                }
                let attr_name = source[attr_start..i].to_string();
                let after_name = skip_whitespace(bytes, i);

                if bytes.get(after_name) != Some(&b'=') {
                    attributes.push(Attribute {
                        name: attr_name,
                        span: attr_start..i,
                        value: None,
                    });
                    continue;
                }

                let value_start = skip_whitespace(bytes, after_name + 1);
                let value = match *bytes.get(value_start)? {
                    quote @ (b'"' | b'\'') => {
                        let value_end = skip_string(bytes, value_start, quote)?;
                        AttributeValue::Quoted {
                            span: value_start..value_end,
                            quote: quote as char,
                            value: source[value_start + 1..value_end - 1].to_string(),
                        }
                    }
                    b'{' => {
                        let value_end = skip_balanced(bytes, value_start)?;
                        AttributeValue::Expression {
                            span: value_start..value_end,
                            inner: source[value_start + 1..value_end - 1].to_string(),
                        }
                    }
                    _ => return None,
                };
                i = value.span().end;
                attributes.push(Attribute {
                    name: attr_name,
                    span: attr_start..i,
                    value: Some(value),
                });
            }
            _ => return None,
        }
    }
}

fn scan_close_tag(source: &str, start: usize) -> Option<CloseTag> {
    let bytes = source.as_bytes();
    let mut i = start + 2;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = source[start + 2..i].to_string();
    i = skip_whitespace(bytes, i);
    (bytes.get(i) == Some(&b'>')).then(|| CloseTag {
        name,
        start,
        end: i + 1,
    })
}

/// Scanned tags plus open→close pairing, addressable by ordinal.
#[derive(Debug, Clone)]
pub struct TagIndex {
    tokens: Vec<TagToken>,
    /// For each token index holding an open tag, the index of its close
    closing: Vec<Option<usize>>,
    /// Ordinal → token index
    by_ordinal: Vec<usize>,
}

impl TagIndex {
    pub fn build(source: &str) -> Self {
        let tokens = scan(source);
        let closing = pair_tags(&tokens);
        let by_ordinal = tokens
            .iter()
            .enumerate()
            .filter_map(|(idx, token)| match token {
                TagToken::Open(open) if open.ordinal.is_some() => Some(idx),
                _ => None,
            })
            .collect();

        Self {
            tokens,
            closing,
            by_ordinal,
        }
    }

    /// Number of addressable elements
    pub fn len(&self) -> usize {
        self.by_ordinal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ordinal.is_empty()
    }

    pub fn tokens(&self) -> &[TagToken] {
        &self.tokens
    }

    /// Index into `tokens()` of the close paired with the open at `token_idx`
    pub fn closing_index(&self, token_idx: usize) -> Option<usize> {
        self.closing.get(token_idx).copied().flatten()
    }

    pub fn open(&self, ordinal: usize) -> Option<&OpenTag> {
        match self.tokens.get(*self.by_ordinal.get(ordinal)?)? {
            TagToken::Open(open) => Some(open),
            TagToken::Close(_) => None,
        }
    }

    pub fn opens(&self) -> impl Iterator<Item = &OpenTag> {
        self.by_ordinal.iter().filter_map(|idx| match &self.tokens[*idx] {
            TagToken::Open(open) => Some(open),
            TagToken::Close(_) => None,
        })
    }

    pub fn closing(&self, ordinal: usize) -> Option<&CloseTag> {
        let idx = self.closing_index(*self.by_ordinal.get(ordinal)?)?;
        match &self.tokens[idx] {
            TagToken::Close(close) => Some(close),
            TagToken::Open(_) => None,
        }
    }

    /// Byte range between the element's opening and closing tags
    pub fn content_range(&self, ordinal: usize) -> Option<Range<usize>> {
        let open = self.open(ordinal)?;
        if open.is_leaf() {
            return None;
        }
        let close = self.closing(ordinal)?;
        Some(open.end..close.start)
    }

    /// True when any tag token lies between the element's open and close
    pub fn has_nested_tags(&self, ordinal: usize) -> bool {
        let Some(&open_idx) = self.by_ordinal.get(ordinal) else {
            return false;
        };
        match self.closing_index(open_idx) {
            Some(close_idx) => close_idx > open_idx + 1,
            None => false,
        }
    }
}

/// Pair opening and closing tags by depth balancing. Unclosed opens and
/// stray closes are left unpaired.
fn pair_tags(tokens: &[TagToken]) -> Vec<Option<usize>> {
    let mut closing = vec![None; tokens.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        match token {
            TagToken::Open(open) if !open.is_leaf() => stack.push(idx),
            TagToken::Open(_) => {}
            TagToken::Close(close) => {
                let matching = stack.iter().rposition(|&open_idx| {
                    matches!(&tokens[open_idx], TagToken::Open(open) if open.name == close.name)
                });
                if let Some(pos) = matching {
                    let open_idx = stack[pos];
                    stack.truncate(pos);
                    closing[open_idx] = Some(idx);
                }
            }
        }
    }

    closing
}
