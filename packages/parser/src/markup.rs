//! Element tree built from the tag scan, used for rendering.
//!
//! Text between tags follows JSX whitespace rules (see [`jsx_text`]).
//! `{...}` groups inside text become expression children; `{/* ... */}`
//! comments are discarded.

use crate::error::{ParseError, ParseResult};
use crate::expression::expressions;
use crate::scanner::{OpenTag, TagIndex, TagToken};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
    /// Inner text of a `{...}` child
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub tag: OpenTag,
    pub children: Vec<MarkupNode>,
    pub close: Option<Range<usize>>,
}

impl MarkupElement {
    pub fn name(&self) -> &str {
        &self.tag.name
    }

    /// Element children only
    pub fn child_elements(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(|child| match child {
            MarkupNode::Element(el) => Some(el),
            _ => None,
        })
    }
}

/// Build every top-level element tree in `source`.
pub fn parse_markup(source: &str) -> ParseResult<Vec<MarkupElement>> {
    let index = TagIndex::build(source);
    let mut roots: Vec<MarkupElement> = Vec::new();
    let mut stack: Vec<MarkupElement> = Vec::new();
    let mut prev_end = 0;

    for token in index.tokens() {
        if let Some(parent) = stack.last_mut() {
            push_text(&mut parent.children, &source[prev_end..token.start()]);
        }

        match token {
            TagToken::Open(open) => {
                let element = MarkupElement {
                    tag: open.clone(),
                    children: Vec::new(),
                    close: None,
                };
                if open.is_leaf() {
                    attach(&mut stack, &mut roots, element);
                } else {
                    stack.push(element);
                }
            }
            TagToken::Close(close) => {
                if let Some(pos) = stack.iter().rposition(|el| el.tag.name == close.name) {
                    while stack.len() > pos + 1 {
                        if let Some(unclosed) = stack.pop() {
                            tracing::debug!(tag = %unclosed.tag.name, "implicitly closing element");
                            attach(&mut stack, &mut roots, unclosed);
                        }
                    }
                    if let Some(mut element) = stack.pop() {
                        element.close = Some(close.start..close.end);
                        attach(&mut stack, &mut roots, element);
                    }
                }
            }
        }

        prev_end = token.end();
    }

    if let Some(unclosed) = stack.first() {
        return Err(ParseError::missing_closing_tag(
            unclosed.tag.start,
            unclosed.tag.name.clone(),
        ));
    }

    Ok(roots)
}

/// The element tree returned by `component`: the first top-level element
/// after the component's declaration, or the first one in the file.
pub fn parse_component_markup(source: &str, component: &str) -> ParseResult<MarkupElement> {
    let roots = parse_markup(source)?;
    let declared_at = declaration_offset(source, component).unwrap_or(0);

    let mut first = None;
    for root in roots {
        if root.tag.start >= declared_at {
            return Ok(root);
        }
        first.get_or_insert(root);
    }

    first.ok_or_else(|| ParseError::NoMarkup {
        component: component.to_string(),
    })
}

fn declaration_offset(source: &str, component: &str) -> Option<usize> {
    [
        format!("function {}", component),
        format!("const {} ", component),
        format!("const {}=", component),
    ]
    .iter()
    .filter_map(|needle| source.find(needle.as_str()))
    .min()
}

fn attach(stack: &mut [MarkupElement], roots: &mut Vec<MarkupElement>, element: MarkupElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(MarkupNode::Element(element)),
        None => roots.push(element),
    }
}

fn push_text(children: &mut Vec<MarkupNode>, raw: &str) {
    let mut cursor = 0;
    for (range, inner) in expressions(raw) {
        push_literal(children, &raw[cursor..range.start]);
        let inner = inner.trim();
        if !(inner.is_empty() || (inner.starts_with("/*") && inner.ends_with("*/"))) {
            children.push(MarkupNode::Expression(inner.to_string()));
        }
        cursor = range.end;
    }

    let rest = &raw[cursor..];
    // an unbalanced `{` is script glue (e.g. a `.map(` callback), not text
    let rest = match rest.find('{') {
        Some(brace) => &rest[..brace],
        None => rest,
    };
    push_literal(children, rest);
}

/// Children of a raw text run between tags: literal text after the JSX
/// whitespace rules, and `{...}` expressions
pub fn text_nodes(raw: &str) -> Vec<MarkupNode> {
    let mut nodes = Vec::new();
    push_text(&mut nodes, raw);
    nodes
}

fn push_literal(children: &mut Vec<MarkupNode>, raw: &str) {
    // a stray `}` ends an expression the markup was nested in, e.g. `)}`
    let raw = raw.rsplit_once('}').map_or(raw, |(_, after)| after);
    if let Some(text) = jsx_text(raw) {
        children.push(MarkupNode::Text(text));
    }
}

/// Apply JSX whitespace rules to a raw text run: every line but the first
/// loses its leading whitespace, every line but the last its trailing
/// whitespace, empty lines vanish and the rest join with single spaces.
pub fn jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len().saturating_sub(1);
    let kept: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut line = line.trim_end_matches('\r');
            if i != 0 {
                line = line.trim_start();
            }
            if i != last {
                line = line.trim_end();
            }
            line
        })
        .filter(|line| !line.is_empty())
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_shape() {
        let source = r#"
function Slide({ data }) {
  return (
    <div className="root">
      <h1>{data.title}</h1>
      <p>
        Hello <b>there</b>, {data.name}
      </p>
      {/* a comment */}
      <img src="a.png" />
    </div>
  );
}"#;
        let root = parse_component_markup(source, "Slide").unwrap();
        assert_eq!(root.name(), "div");
        let children: Vec<&MarkupElement> = root.child_elements().collect();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].children, vec![MarkupNode::Expression("data.title".into())]);
        assert_eq!(
            children[1].children[0],
            MarkupNode::Text("Hello ".into())
        );
        assert_eq!(children[1].children[2], MarkupNode::Text(", ".into()));
        assert_eq!(children[1].children[3], MarkupNode::Expression("data.name".into()));
        assert!(children[2].tag.self_closing);
    }

    #[test]
    fn test_component_selection_by_declaration() {
        let source = "const Badge = () => <span>b</span>;\nfunction Slide() { return <section>s</section>; }";
        let root = parse_component_markup(source, "Slide").unwrap();
        assert_eq!(root.name(), "section");
        let fallback = parse_component_markup(source, "Missing").unwrap();
        assert_eq!(fallback.name(), "span");
    }

    #[test]
    fn test_unclosed_root_is_an_error() {
        let source = "const C = () => <div><p>x</p>";
        let err = parse_markup(source).unwrap_err();
        assert!(matches!(err, ParseError::MissingClosingTag { .. }));
    }

    #[test]
    fn test_no_markup() {
        let err = parse_component_markup("function C() { return null }", "C").unwrap_err();
        assert!(matches!(err, ParseError::NoMarkup { .. }));
    }

    #[test]
    fn test_script_glue_is_not_text() {
        let source = "const L = ({ items }) => <ul>{items.map((i) => <li key={i}>{i}</li>)}</ul>;";
        let root = parse_component_markup(source, "L").unwrap();
        assert_eq!(root.children.len(), 1);
        let li = root.child_elements().next().unwrap();
        assert_eq!(li.children, vec![MarkupNode::Expression("i".into())]);
    }

    #[test]
    fn test_text_nodes_of_mixed_run() {
        assert_eq!(
            text_nodes("\n    Prepared by {data.author}{/* note */}\n  "),
            vec![
                MarkupNode::Text("Prepared by ".into()),
                MarkupNode::Expression("data.author".into()),
            ]
        );
    }

    #[test]
    fn test_jsx_text_rules() {
        assert_eq!(jsx_text("Hello "), Some("Hello ".to_string()));
        assert_eq!(jsx_text("\n    Two\n    lines\n  "), Some("Two lines".to_string()));
        assert_eq!(jsx_text("\n   \n"), None);
    }
}
