//! # Source Patch Engine
//!
//! Rewrites one addressed element of a component source in place.
//!
//! ## Design
//!
//! - Elements are addressed by ordinal (see `livecanvas_parser::scanner`)
//! - Only the byte ranges of the touched attribute or text are replaced;
//!   every other byte of the source is copied verbatim
//! - Patching an element with its current properties returns the input
//!   byte-for-byte. "Current" means as rendered against the data context,
//!   so an expression-valued style or text is left alone when it already
//!   resolves to the requested value
//! - Text and `src` of elements bound to `{data.<field>}` are never
//!   rewritten; they come back as [`DataEdit`]s for the binding resolver
//! - An unknown ordinal is a no-op with a diagnostic, never an error
//!
//! The source is rescanned after each step so later steps see fresh spans.

use livecanvas_evaluator::evaluator::resolve_expression;
use livecanvas_parser::expression::field_of_path;
use livecanvas_parser::{
    single_field_reference, text_nodes, AttributeValue, MarkupNode, StyleMap, StyleValue, TagIndex,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Range;
use thiserror::Error;

/// Why part of a patch was skipped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("Element #{ordinal} is out of range ({count} addressable elements)")]
    OutOfRange { ordinal: usize, count: usize },

    #[error("<{tag}> is not an image; src change ignored")]
    NotAnImage { tag: String },

    #[error("<{tag}> #{ordinal} has no text content")]
    NoTextContent { tag: String, ordinal: usize },

    #[error("<{tag}> #{ordinal} contains nested elements; text change ignored")]
    NestedContent { tag: String, ordinal: usize },
}

/// Properties to write to one element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyChanges {
    /// Style overrides in application order
    pub style: Vec<(String, String)>,
    pub src: Option<String>,
    pub text: Option<String>,
}

impl PropertyChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_style(key, value);
        self
    }

    /// `left`/`top` as px values
    pub fn position(self, left: f64, top: f64) -> Self {
        self.style("left", px(left)).style("top", px(top))
    }

    /// `left`/`top`/`width`/`height` as px values
    pub fn bounds(self, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.position(left, top)
            .style("width", px(width))
            .style("height", px(height))
    }

    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set a style value, replacing an earlier change to the same key
    pub fn set_style(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        match self.style.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.style.push((key, value)),
        }
    }

    /// Fold later changes into these
    pub fn merge(&mut self, other: PropertyChanges) {
        for (key, value) in other.style {
            self.set_style(key, value);
        }
        if other.src.is_some() {
            self.src = other.src;
        }
        if other.text.is_some() {
            self.text = other.text;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_empty() && self.src.is_none() && self.text.is_none()
    }
}

/// Format a length the way the source writes it: `50px`, `12.5px`
pub fn px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{}px", rounded)
    }
}

/// A value that belongs in the data context rather than the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEdit {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub source: String,
    pub changed: bool,
    pub data_edits: Vec<DataEdit>,
    /// Parts of the change that were skipped
    pub diagnostics: Vec<PatchError>,
}

impl PatchOutcome {
    fn unchanged(source: &str, diagnostic: PatchError) -> Self {
        Self {
            source: source.to_string(),
            changed: false,
            data_edits: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

/// Apply `changes` to the element at `ordinal`, with no data context:
/// expressions compare by their field-name fallback.
pub fn patch(source: &str, ordinal: usize, changes: &PropertyChanges) -> PatchOutcome {
    patch_with_data(source, ordinal, changes, &Value::Null)
}

/// Apply `changes` to the element at `ordinal`. Expressions in the element
/// are resolved against `data` to decide what already matches.
pub fn patch_with_data(
    source: &str,
    ordinal: usize,
    changes: &PropertyChanges,
    data: &Value,
) -> PatchOutcome {
    let index = TagIndex::build(source);
    if index.open(ordinal).is_none() {
        let err = PatchError::OutOfRange {
            ordinal,
            count: index.len(),
        };
        tracing::warn!(%err, "patch ignored");
        return PatchOutcome::unchanged(source, err);
    }

    let mut current = source.to_string();
    let mut data_edits = Vec::new();
    let mut diagnostics = Vec::new();

    if !changes.style.is_empty() {
        if let Some(next) = patch_style(&current, ordinal, &changes.style, data) {
            current = next;
        }
    }

    if let Some(src) = &changes.src {
        match patch_src(&current, ordinal, src, data) {
            Ok(Step::Rewritten(next)) => current = next,
            Ok(Step::Routed(edit)) => data_edits.push(edit),
            Ok(Step::Same) => {}
            Err(err) => diagnostics.push(err),
        }
    }

    if let Some(text) = &changes.text {
        match patch_text(&current, ordinal, text, data) {
            Ok(Step::Rewritten(next)) => current = next,
            Ok(Step::Routed(edit)) => data_edits.push(edit),
            Ok(Step::Same) => {}
            Err(err) => diagnostics.push(err),
        }
    }

    for err in &diagnostics {
        tracing::warn!(%err, "patch step skipped");
    }

    let changed = current != source;
    tracing::debug!(ordinal, changed, routed = data_edits.len(), "patched element");
    PatchOutcome {
        source: current,
        changed,
        data_edits,
        diagnostics,
    }
}

enum Step {
    Rewritten(String),
    Routed(DataEdit),
    Same,
}

fn splice(source: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(source.len() + replacement.len());
    out.push_str(&source[..range.start]);
    out.push_str(replacement);
    out.push_str(&source[range.end..]);
    out
}

/// Whether `key` in `map` already renders as `css`
fn renders_as(map: &StyleMap, key: &str, css: &str, data: &Value) -> bool {
    match map.get(key) {
        Some(StyleValue::Expression(expr)) => expr == css || resolve_expression(expr, data) == css,
        Some(value) => value.matches(css),
        None => false,
    }
}

/// `map` with every value that does not already render as requested
/// overwritten. `None` when nothing needed to change.
fn overlay(mut map: StyleMap, style: &[(String, String)], data: &Value) -> Option<StyleMap> {
    let stale: Vec<&(String, String)> = style
        .iter()
        .filter(|(key, value)| !renders_as(&map, key, value, data))
        .collect();
    if stale.is_empty() {
        return None;
    }
    for (key, value) in stale {
        map.set(key.as_str(), value.as_str());
    }
    Some(map)
}

/// Overlay style values. `None` when every value is already present.
fn patch_style(
    source: &str,
    ordinal: usize,
    style: &[(String, String)],
    data: &Value,
) -> Option<String> {
    let index = TagIndex::build(source);
    let open = index.open(ordinal)?;

    match open.attribute("style") {
        Some(attr) => match &attr.value {
            Some(AttributeValue::Expression { span, inner }) => {
                let map = overlay(StyleMap::parse_object(inner), style, data)?;
                Some(splice(source, span.clone(), &map.to_jsx_attribute()))
            }
            Some(AttributeValue::Quoted { span, quote, value }) => {
                let map = overlay(StyleMap::parse_css(value), style, data)?;
                let quoted = format!("{}{}{}", quote, map.to_css(), quote);
                Some(splice(source, span.clone(), &quoted))
            }
            None => {
                let map = overlay(StyleMap::new(), style, data)?;
                let attribute = format!("style={}", map.to_jsx_attribute());
                Some(splice(source, attr.span.clone(), &attribute))
            }
        },
        None => {
            let map = overlay(StyleMap::new(), style, data)?;
            let at = open
                .attributes
                .last()
                .map(|a| a.span.end)
                .unwrap_or(open.name_end);
            let attribute = format!(" style={}", map.to_jsx_attribute());
            Some(splice(source, at..at, &attribute))
        }
    }
}

fn patch_src(source: &str, ordinal: usize, src: &str, data: &Value) -> Result<Step, PatchError> {
    let index = TagIndex::build(source);
    let Some(open) = index.open(ordinal) else {
        return Ok(Step::Same);
    };
    if open.name != "img" {
        return Err(PatchError::NotAnImage {
            tag: open.name.clone(),
        });
    }

    let quoted = quote_attribute(src);
    match open.attribute("src") {
        Some(attr) => match &attr.value {
            Some(AttributeValue::Quoted { value, .. }) if value == src => Ok(Step::Same),
            Some(AttributeValue::Quoted { span, .. }) => {
                Ok(Step::Rewritten(splice(source, span.clone(), &quoted)))
            }
            Some(AttributeValue::Expression { span, inner }) => {
                if resolve_expression(inner, data) == src {
                    return Ok(Step::Same);
                }
                if let Some(field) = field_of_path(inner.trim()) {
                    return Ok(Step::Routed(DataEdit {
                        field: field.to_string(),
                        value: src.to_string(),
                    }));
                }
                Ok(Step::Rewritten(splice(source, span.clone(), &quoted)))
            }
            None => {
                let attribute = format!("src={}", quoted);
                Ok(Step::Rewritten(splice(source, attr.span.clone(), &attribute)))
            }
        },
        None => {
            let at = open.name_end;
            let attribute = format!(" src={}", quoted);
            Ok(Step::Rewritten(splice(source, at..at, &attribute)))
        }
    }
}

fn patch_text(source: &str, ordinal: usize, text: &str, data: &Value) -> Result<Step, PatchError> {
    let index = TagIndex::build(source);
    let Some(open) = index.open(ordinal) else {
        return Ok(Step::Same);
    };
    let Some(range) = index.content_range(ordinal) else {
        return Err(PatchError::NoTextContent {
            tag: open.name.clone(),
            ordinal,
        });
    };
    if index.has_nested_tags(ordinal) {
        return Err(PatchError::NestedContent {
            tag: open.name.clone(),
            ordinal,
        });
    }

    let content = &source[range.clone()];
    if displayed_text(content, data) == text {
        return Ok(Step::Same);
    }
    if let Some(field) = single_field_reference(content) {
        return Ok(Step::Routed(DataEdit {
            field: field.to_string(),
            value: text.to_string(),
        }));
    }

    let span = rendered_span(content);
    let replace = range.start + span.start..range.start + span.end;
    Ok(Step::Rewritten(splice(source, replace, &escape_text(text))))
}

/// Text a raw content run shows once rendered against `data`
fn displayed_text(content: &str, data: &Value) -> String {
    text_nodes(content)
        .iter()
        .map(|node| match node {
            MarkupNode::Text(text) => text.clone(),
            MarkupNode::Expression(expr) => resolve_expression(expr, data),
            MarkupNode::Element(_) => String::new(),
        })
        .collect()
}

/// Part of a content run that renders. Surrounding whitespace is only
/// dropped when it spans a line break, so multi-line layouts keep their
/// indentation and same-line spaces stay part of the text.
fn rendered_span(content: &str) -> Range<usize> {
    if content.trim().is_empty() {
        return if content.contains('\n') {
            0..0
        } else {
            0..content.len()
        };
    }
    let lead = content.len() - content.trim_start().len();
    let start = if content[..lead].contains('\n') { lead } else { 0 };
    let trail = content.trim_end().len();
    let end = if content[trail..].contains('\n') {
        trail
    } else {
        content.len()
    };
    start..end
}

/// Characters that would change meaning inside JSX text
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("{'{'}"),
            '}' => out.push_str("{'}'}"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn quote_attribute(value: &str) -> String {
    if value.contains('"') {
        format!("'{}'", value.replace('\'', "&apos;"))
    } else {
        format!("\"{}\"", value)
    }
}
