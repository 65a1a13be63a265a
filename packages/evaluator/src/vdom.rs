use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Box in style space: `left`/`top` relative to the parent element's box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Inclusive of the top/left edges, exclusive of bottom/right
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

/// Rendered node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    Element {
        tag: String,
        /// Position among addressable tags in the source scan
        #[serde(skip_serializing_if = "Option::is_none")]
        ordinal: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        element_id: Option<String>,
        attributes: BTreeMap<String, String>,
        styles: BTreeMap<String, String>,
        geometry: Geometry,
        /// Page-space offset of `geometry`
        origin: (f64, f64),
        /// Field this element's text is bound to, if its content is exactly `{data.<field>}`
        #[serde(skip_serializing_if = "Option::is_none")]
        binding: Option<String>,
        children: Vec<VNode>,
    },

    Text { content: String },

    /// Diagnostic overlay produced when evaluation fails
    Error { message: String, stack: Vec<String> },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            ordinal: None,
            element_id: None,
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            geometry: Geometry::default(),
            origin: (0.0, 0.0),
            binding: None,
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>, stack: Vec<String>) -> Self {
        VNode::Error {
            message: message.into(),
            stack,
        }
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element { ref mut styles, .. } = self {
            styles.insert(key.into(), value.into());
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Concatenated text of this node's direct text children
    pub fn own_text(&self) -> String {
        self.children()
            .iter()
            .filter_map(|child| match child {
                VNode::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text of this node and all descendants, in document order
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content } => content.clone(),
            VNode::Element { children, .. } => {
                children.iter().map(VNode::text_content).collect()
            }
            VNode::Error { message, .. } => message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualDomDocument {
    pub component: String,
    pub nodes: Vec<VNode>,
}

impl VirtualDomDocument {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            nodes: Vec::new(),
        }
    }

    pub fn diagnostic(
        component: impl Into<String>,
        message: impl Into<String>,
        stack: Vec<String>,
    ) -> Self {
        Self {
            component: component.into(),
            nodes: vec![VNode::error(message, stack)],
        }
    }

    pub fn add_node(&mut self, node: VNode) {
        self.nodes.push(node);
    }

    pub fn is_diagnostic(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, VNode::Error { .. }))
    }

    /// First diagnostic's message and stack
    pub fn diagnostic_detail(&self) -> Option<(&str, &[String])> {
        self.nodes.iter().find_map(|n| match n {
            VNode::Error { message, stack } => Some((message.as_str(), stack.as_slice())),
            _ => None,
        })
    }

    /// Element nodes in pre-order (document) traversal
    pub fn elements(&self) -> Vec<&VNode> {
        fn walk<'a>(node: &'a VNode, out: &mut Vec<&'a VNode>) {
            if let VNode::Element { children, .. } = node {
                out.push(node);
                for child in children {
                    walk(child, out);
                }
            }
        }

        let mut out = Vec::new();
        for node in &self.nodes {
            walk(node, &mut out);
        }
        out
    }
}
