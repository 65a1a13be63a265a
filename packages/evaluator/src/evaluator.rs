//! # Evaluator
//!
//! Renders one component definition against a data context into a
//! [`VirtualDomDocument`] with computed geometry.
//!
//! ## Pipeline
//!
//! 1. Strip module syntax and find the component identifier.
//! 2. Build the component's element tree from the tag scan.
//! 3. Substitute `{data.<path>}` references. A key missing from the data
//!    context renders as the referenced field name instead of failing.
//! 4. Lay out boxes from `px`/`%` style values (see [`Evaluator::layout`]).
//!
//! ## Determinism
//!
//! The same source, data and viewport always produce the same document:
//! element ids derive from the page seed and the element's ordinal, maps
//! are ordered, and nothing depends on time or the environment.
//!
//! ## Failure isolation
//!
//! [`Evaluator::evaluate`] returns `Err` for malformed source.
//! [`Evaluator::render`] never fails: errors and panics both become a
//! diagnostic overlay document carrying the message and a stack.

use crate::vdom::{Geometry, VNode, VirtualDomDocument};
use livecanvas_parser::expression::field_of_path;
use livecanvas_parser::{
    data_path, parse_component_markup, preprocess, AttributeValue, ElementIds, MarkupElement,
    MarkupNode, OpenTag, ParseError, StyleMap, StyleValue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Height of one line of text when no explicit height is given
pub const LINE_HEIGHT: f64 = 24.0;

/// Default box of an image without explicit size
pub const IMAGE_SIZE: f64 = 100.0;

/// Nesting guard; deeper trees are rejected instead of overflowing the stack
pub const MAX_DEPTH: usize = 512;

/// Properties whose bare numbers are not lengths
const UNITLESS: &[&str] = &[
    "opacity",
    "zIndex",
    "fontWeight",
    "lineHeight",
    "flex",
    "flexGrow",
    "flexShrink",
    "order",
];

/// Attributes that never reach the rendered node
const SKIPPED_ATTRIBUTES: &[&str] = &["style", "key", "ref"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Nesting deeper than {limit} elements at <{tag}>")]
    TooDeep { tag: String, limit: usize },
}

impl EvalError {
    /// Stack lines shown under the diagnostic message
    pub fn stack(&self, component: &str, module: &str) -> Vec<String> {
        let position = match self {
            EvalError::Parse(err) => err.position(),
            EvalError::TooDeep { .. } => None,
        };
        match position {
            Some(pos) => {
                let (line, column) = line_column(module, pos);
                vec![format!("at {} (line {}, column {})", component, line, column)]
            }
            None => vec![format!("at {}", component)],
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Size of the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    viewport: Viewport,
    ids: ElementIds,
}

impl Evaluator {
    pub fn new(page_id: &str) -> Self {
        Self {
            viewport: Viewport::default(),
            ids: ElementIds::new(page_id),
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn ids(&self) -> &ElementIds {
        &self.ids
    }

    /// Evaluate `source` against `data`. Non-object data is treated as `{}`.
    #[tracing::instrument(skip_all, fields(len = source.len()))]
    pub fn evaluate(&self, source: &str, data: &Value) -> EvalResult<VirtualDomDocument> {
        let module = preprocess(source);
        let root = parse_component_markup(&module.body, &module.component)?;

        let empty = Value::Object(Default::default());
        let data = if data.is_object() { data } else { &empty };

        let surface = Geometry::new(0.0, 0.0, self.viewport.width, self.viewport.height);
        let mut cursor = 0.0;
        let node = self.layout(&root, data, &surface, &mut cursor, 0)?;

        let mut doc = VirtualDomDocument::new(module.component);
        doc.add_node(node);
        tracing::debug!(elements = doc.elements().len(), "evaluated component");
        Ok(doc)
    }

    /// Like [`evaluate`](Self::evaluate) but failures, including panics,
    /// come back as a diagnostic overlay document.
    pub fn render(&self, source: &str, data: &Value) -> VirtualDomDocument {
        let module = preprocess(source);
        match panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(source, data))) {
            Ok(Ok(doc)) => doc,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, component = %module.component, "render failed");
                let stack = err.stack(&module.component, &module.body);
                VirtualDomDocument::diagnostic(module.component, err.to_string(), stack)
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "render panicked".to_string());
                tracing::error!(message = %message, "render panicked");
                let stack = vec![format!("at {}", module.component)];
                VirtualDomDocument::diagnostic(module.component, message, stack)
            }
        }
    }

    /// Build `el` inside `parent` (page coordinates).
    ///
    /// Elements with `left`/`top` (or `position: absolute`) are placed
    /// relative to the parent box; everything else flows vertically from
    /// `cursor`, which is advanced past the element. Width defaults to the
    /// remaining parent width, height to the flowed content: nested flow
    /// elements plus one line when the element has text.
    fn layout(
        &self,
        el: &MarkupElement,
        data: &Value,
        parent: &Geometry,
        cursor: &mut f64,
        depth: usize,
    ) -> EvalResult<VNode> {
        if depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep {
                tag: el.name().to_string(),
                limit: MAX_DEPTH,
            });
        }

        let styles = self.resolve_styles(&el.tag, data);
        let is_image = el.name() == "img";
        let left = styles.get("left").and_then(|v| length(v, parent.width));
        let top = styles.get("top").and_then(|v| length(v, parent.height));
        let positioned = left.is_some()
            || top.is_some()
            || styles.get("position").is_some_and(|p| p == "absolute");

        let (page_left, page_top) = if positioned {
            (
                parent.left + left.unwrap_or(0.0),
                parent.top + top.unwrap_or(0.0),
            )
        } else {
            (parent.left, *cursor)
        };

        let width = styles
            .get("width")
            .and_then(|v| length(v, parent.width))
            .unwrap_or(if is_image {
                IMAGE_SIZE
            } else {
                (parent.right() - page_left).max(0.0)
            });
        let explicit_height = styles.get("height").and_then(|v| length(v, parent.height));

        let content_box = Geometry::new(
            page_left,
            page_top,
            width,
            explicit_height.unwrap_or(parent.height),
        );
        let mut child_cursor = page_top;
        let mut has_text = false;
        let mut children = Vec::with_capacity(el.children.len());

        for child in &el.children {
            match child {
                MarkupNode::Element(nested) => {
                    children.push(self.layout(nested, data, &content_box, &mut child_cursor, depth + 1)?);
                }
                MarkupNode::Text(text) => {
                    has_text = true;
                    children.push(VNode::text(text.clone()));
                }
                MarkupNode::Expression(expr) => {
                    let value = resolve_expression(expr, data);
                    has_text |= !value.is_empty();
                    children.push(VNode::text(value));
                }
            }
        }

        let flowed = child_cursor - page_top + if has_text { LINE_HEIGHT } else { 0.0 };
        let height = explicit_height.unwrap_or(if is_image { IMAGE_SIZE } else { flowed });
        if !positioned {
            *cursor = page_top + height;
        }

        let mut attributes = BTreeMap::new();
        for attr in &el.tag.attributes {
            if SKIPPED_ATTRIBUTES.contains(&attr.name.as_str()) || is_event_handler(&attr.name) {
                continue;
            }
            let name = if attr.name == "className" {
                "class".to_string()
            } else {
                attr.name.clone()
            };
            let value = match &attr.value {
                None => "true".to_string(),
                Some(AttributeValue::Quoted { value, .. }) => value.clone(),
                Some(AttributeValue::Expression { inner, .. }) => resolve_expression(inner, data),
            };
            attributes.insert(name, value);
        }

        let binding = match el.children.as_slice() {
            [MarkupNode::Expression(expr)] => field_of_path(expr.trim()).map(str::to_string),
            _ => None,
        };

        Ok(VNode::Element {
            tag: el.name().to_string(),
            ordinal: el.tag.ordinal,
            element_id: el.tag.ordinal.map(|ordinal| self.ids.id_for(ordinal)),
            attributes,
            styles,
            geometry: Geometry::new(page_left - parent.left, page_top - parent.top, width, height),
            origin: (parent.left, parent.top),
            binding,
            children,
        })
    }

    fn resolve_styles(&self, tag: &OpenTag, data: &Value) -> BTreeMap<String, String> {
        let map = match tag.attribute("style").and_then(|attr| attr.value.as_ref()) {
            Some(AttributeValue::Expression { inner, .. }) => StyleMap::parse_object(inner),
            Some(AttributeValue::Quoted { value, .. }) => StyleMap::parse_css(value),
            None => return BTreeMap::new(),
        };

        map.iter()
            .map(|(key, value)| {
                let css = match value {
                    StyleValue::Number(n) if UNITLESS.contains(&key) => n.clone(),
                    StyleValue::Expression(expr) => resolve_expression(expr, data),
                    other => other.as_css(),
                };
                (key.to_string(), css)
            })
            .collect()
    }
}

/// Display string of an expression child or attribute value.
///
/// Field paths resolve against `data` and fall back to the field name when
/// the key is missing. Plain string and number literals render as
/// themselves. Anything else renders empty.
pub fn resolve_expression(expr: &str, data: &Value) -> String {
    let expr = expr.trim();

    if let Some(path) = data_path(expr) {
        let mut current = data;
        for segment in &path {
            match current.get(segment) {
                Some(next) => current = next,
                None => {
                    let fallback = path.last().copied().unwrap_or(expr);
                    tracing::debug!(reference = %expr, "missing data key, using field name");
                    return fallback.to_string();
                }
            }
        }
        return display_value(current);
    }

    for quote in ['\'', '"', '`'] {
        if let Some(inner) = expr.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            if quote != '`' || !inner.contains("${") {
                return inner.to_string();
            }
        }
    }

    if expr.parse::<f64>().is_ok() {
        return expr.to_string();
    }

    tracing::debug!(expression = %expr, "unsupported expression renders empty");
    String::new()
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// `12px`, `12` or `50%` (of `basis`); anything else is not a length
pub fn length(value: &str, basis: f64) -> Option<f64> {
    let value = value.trim();
    if let Some(percent) = value.strip_suffix('%') {
        return percent.trim().parse::<f64>().ok().map(|p| basis * p / 100.0);
    }
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f64>()
        .ok()
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on") && name[2..].starts_with(|c: char| c.is_ascii_uppercase())
}

fn line_column(text: &str, pos: usize) -> (usize, usize) {
    let pos = pos.min(text.len());
    let before = &text.as_bytes()[..pos];
    let line = before.iter().filter(|b| **b == b'\n').count() + 1;
    let column = pos - before.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SLIDE: &str = r#"import React from 'react';

export default function Slide({ data }) {
  return (
    <div style={{ width: '800px', height: '600px' }}>
      <h1 style={{ left: '50px', top: '80px', color: 'red' }}>{data.title}</h1>
      <p>Hello {data.name}</p>
      <img src={data.image} style={{ left: 10, top: 300, width: 200 }} />
    </div>
  );
}
"#;

    fn element(doc: &VirtualDomDocument, ordinal: usize) -> &VNode {
        doc.elements()
            .into_iter()
            .find(|n| matches!(n, VNode::Element { ordinal: Some(o), .. } if *o == ordinal))
            .unwrap()
    }

    #[test]
    fn test_substitutes_and_binds() {
        let evaluator = Evaluator::new("slide-1");
        let doc = evaluator
            .evaluate(SLIDE, &json!({ "title": "Q3 Review", "name": "Ada", "image": "a.png" }))
            .unwrap();
        assert_eq!(doc.component, "Slide");

        let h1 = element(&doc, 1);
        assert_eq!(h1.text_content(), "Q3 Review");
        assert!(matches!(h1, VNode::Element { binding: Some(b), .. } if b == "title"));

        let p = element(&doc, 2);
        assert_eq!(p.text_content(), "Hello Ada");
        assert!(matches!(p, VNode::Element { binding: None, .. }));

        let img = element(&doc, 3);
        assert!(matches!(img, VNode::Element { attributes, .. } if attributes["src"] == "a.png"));
    }

    #[test]
    fn test_missing_key_falls_back_to_field_name() {
        let doc = Evaluator::new("p").evaluate(SLIDE, &json!({})).unwrap();
        assert_eq!(element(&doc, 1).text_content(), "title");
        let doc = Evaluator::new("p").evaluate(SLIDE, &json!([1, 2])).unwrap();
        assert_eq!(element(&doc, 2).text_content(), "Hello name");
    }

    #[test]
    fn test_layout_positions() {
        let doc = Evaluator::new("p").evaluate(SLIDE, &json!({})).unwrap();
        let VNode::Element { geometry, .. } = element(&doc, 0) else { panic!() };
        assert_eq!(*geometry, Geometry::new(0.0, 0.0, 800.0, 600.0));

        let VNode::Element { geometry, styles, .. } = element(&doc, 1) else { panic!() };
        assert_eq!(geometry.left, 50.0);
        assert_eq!(geometry.top, 80.0);
        assert_eq!(geometry.height, LINE_HEIGHT);
        assert_eq!(styles["color"], "red");

        // flows from the top of the parent; the absolute h1 takes no space
        let VNode::Element { geometry, .. } = element(&doc, 2) else { panic!() };
        assert_eq!((geometry.left, geometry.top), (0.0, 0.0));

        let VNode::Element { geometry, styles, .. } = element(&doc, 3) else { panic!() };
        assert_eq!(*geometry, Geometry::new(10.0, 300.0, 200.0, IMAGE_SIZE));
        assert_eq!(styles["width"], "200px");
    }

    #[test]
    fn test_element_ids_follow_ordinals() {
        let evaluator = Evaluator::new("slide-1");
        let doc = evaluator.evaluate(SLIDE, &json!({})).unwrap();
        for (i, node) in doc.elements().into_iter().enumerate() {
            let VNode::Element { element_id, .. } = node else { panic!() };
            assert_eq!(element_id.as_deref(), Some(evaluator.ids().id_for(i).as_str()));
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let evaluator = Evaluator::new("slide-1");
        let data = json!({ "title": "T" });
        assert_eq!(evaluator.render(SLIDE, &data), evaluator.render(SLIDE, &data));
    }

    #[test]
    fn test_render_failure_becomes_diagnostic() {
        let evaluator = Evaluator::new("p");
        let doc = evaluator.render("export default function Broken() {\n  return <div><p>x</p>;\n}", &json!({}));
        assert!(doc.is_diagnostic());
        let (message, stack) = doc.diagnostic_detail().unwrap();
        assert!(message.contains("<div>"));
        assert_eq!(stack[0], "at Broken (line 2, column 10)");
    }

    #[test]
    fn test_no_markup_is_diagnostic() {
        let doc = Evaluator::new("p").render("function Empty() { return null }", &json!({}));
        assert!(doc.is_diagnostic());
    }

    #[test]
    fn test_resolve_expression_literals() {
        let data = json!({ "n": 3, "flag": true, "nested": { "x": "y" } });
        assert_eq!(resolve_expression("'text'", &data), "text");
        assert_eq!(resolve_expression("42", &data), "42");
        assert_eq!(resolve_expression("data.n", &data), "3");
        assert_eq!(resolve_expression("data.flag", &data), "true");
        assert_eq!(resolve_expression("data.nested.x", &data), "y");
        assert_eq!(resolve_expression("items.map(i => i)", &data), "");
    }

    #[test]
    fn test_length_units() {
        assert_eq!(length("12px", 100.0), Some(12.0));
        assert_eq!(length("12", 100.0), Some(12.0));
        assert_eq!(length("50%", 300.0), Some(150.0));
        assert_eq!(length("auto", 100.0), None);
    }
}
