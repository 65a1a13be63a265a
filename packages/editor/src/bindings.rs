//! Data binding resolver.
//!
//! An element is bound when its whole content is one `{data.<field>}`
//! reference. Bound elements are edited through the data context; all
//! other text is literal and belongs to the patch engine.

use livecanvas_evaluator::evaluator::display_value;
use livecanvas_evaluator::EditableElement;
use livecanvas_parser::{single_field_reference, TagIndex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub element_ordinal: usize,
    pub field: String,
}

/// Every bound element in `source`, in ordinal order
pub fn extract_bindings(source: &str) -> Vec<Binding> {
    let index = TagIndex::build(source);
    index
        .opens()
        .filter_map(|open| {
            let ordinal = open.ordinal?;
            if index.has_nested_tags(ordinal) {
                return None;
            }
            let range = index.content_range(ordinal)?;
            let field = single_field_reference(&source[range])?;
            Some(Binding {
                element_ordinal: ordinal,
                field: field.to_string(),
            })
        })
        .collect()
}

/// Ordinal → field lookup, rebuilt whenever the source changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    fields: BTreeMap<usize, String>,
}

impl BindingTable {
    pub fn from_source(source: &str) -> Self {
        Self {
            fields: extract_bindings(source)
                .into_iter()
                .map(|b| (b.element_ordinal, b.field))
                .collect(),
        }
    }

    pub fn field_for(&self, ordinal: usize) -> Option<&str> {
        self.fields.get(&ordinal).map(String::as_str)
    }

    /// Whether the panel shows a data control for this element
    pub fn is_bound(&self, ordinal: usize) -> bool {
        self.fields.contains_key(&ordinal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.fields.iter().map(|(o, f)| (*o, f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Text the element shows: the data value if bound, else its literal content
pub fn resolve_display(element: &EditableElement, data: &Value) -> String {
    match &element.data_binding_key {
        Some(field) => data
            .get(field)
            .map(display_value)
            .unwrap_or_else(|| field.clone()),
        None => element.content.clone().unwrap_or_default(),
    }
}

/// `data` with the element's bound field set to `new_value`.
/// Unbound elements leave the data untouched.
pub fn apply_text_edit(element: &EditableElement, new_value: &str, data: &Value) -> Value {
    match &element.data_binding_key {
        Some(field) => set_field(data, field, new_value),
        None => data.clone(),
    }
}

/// `data` with `field` set to a string value; non-object data becomes an object
pub fn set_field(data: &Value, field: &str, value: &str) -> Value {
    let mut object = match data {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    object.insert(field.to_string(), Value::String(value.to_string()));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecanvas_evaluator::{Evaluator, Instrumentation};
    use serde_json::json;

    const SOURCE: &str = r#"function Slide({ data }) {
  return (
    <div>
      <h1>{data.title}</h1>
      <p>By {data.author}</p>
      <span>
        {data.footer}
      </span>
      <em>{data.a}{data.b}</em>
    </div>
  );
}"#;

    #[test]
    fn test_only_sole_references_bind() {
        let bindings = extract_bindings(SOURCE);
        assert_eq!(
            bindings,
            vec![
                Binding {
                    element_ordinal: 1,
                    field: "title".into()
                },
                Binding {
                    element_ordinal: 3,
                    field: "footer".into()
                },
            ]
        );
        let table = BindingTable::from_source(SOURCE);
        assert!(table.is_bound(1));
        assert!(!table.is_bound(2));
        assert_eq!(table.field_for(3), Some("footer"));
    }

    #[test]
    fn test_binding_round_trip() {
        let source = "const C = ({ data }) => <div>{data.title}</div>;";
        let data = json!({ "title": "Hello" });
        let doc = Evaluator::new("p").evaluate(source, &data).unwrap();
        let inst = Instrumentation::attach(&doc);
        let element = &inst.elements()[0];

        assert_eq!(resolve_display(element, &data), "Hello");
        let updated = apply_text_edit(element, "Goodbye", &data);
        assert_eq!(updated, json!({ "title": "Goodbye" }));
    }

    #[test]
    fn test_unbound_edit_is_noop() {
        let doc = Evaluator::new("p").evaluate(SOURCE, &json!({})).unwrap();
        let inst = Instrumentation::attach(&doc);
        let p = &inst.elements()[2];
        let data = json!({ "author": "Ada" });
        assert_eq!(resolve_display(p, &data), "By author");
        assert_eq!(apply_text_edit(p, "x", &data), data);
    }

    #[test]
    fn test_set_field_on_non_object() {
        assert_eq!(set_field(&json!(null), "k", "v"), json!({ "k": "v" }));
    }
}
