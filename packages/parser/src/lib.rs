//! # LiveCanvas Parser
//!
//! Lightweight, index-addressable scanning of declarative component source.
//!
//! Nothing here builds a full syntax tree of the host language. The scanner
//! records byte spans for tags and attributes so that the editor can rewrite
//! a single element and copy every other byte of the source verbatim.
//!
//! ```text
//! source ──► preprocess ──► component name
//!        └─► scanner ────► TagIndex (ordinal → spans) ──► markup tree
//!                      └─► style map / field references
//! ```

pub mod error;
pub mod expression;
pub mod id_generator;
pub mod markup;
pub mod preprocess;
pub mod scanner;
pub mod style;

pub use error::{ParseError, ParseResult};
pub use expression::{data_path, single_field_reference};
pub use id_generator::{get_page_seed, ElementIds};
pub use markup::{jsx_text, parse_component_markup, parse_markup, text_nodes, MarkupElement, MarkupNode};
pub use preprocess::{component_identifier, preprocess, strip_module_syntax, Preprocessed};
pub use scanner::{scan, Attribute, AttributeValue, CloseTag, OpenTag, TagIndex, TagToken};
pub use style::{StyleMap, StyleValue};
