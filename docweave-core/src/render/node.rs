//! Rendered output nodes and their HTML serialization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTML5 elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderNode {
    Element {
        name: String,
        /// Always sorted by key.
        attributes: Vec<(String, String)>,
        children: Vec<RenderNode>,
    },
    Text {
        text: String,
    },
}

impl RenderNode {
    pub fn element(name: &str, children: Vec<RenderNode>) -> Self {
        Self::Element {
            name: name.to_string(),
            attributes: Vec::new(),
            children,
        }
    }

    /// An element whose attributes are sorted by key on construction.
    pub fn element_with(
        name: &str,
        attributes: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
        children: Vec<RenderNode>,
    ) -> Self {
        let mut attributes: Vec<(String, String)> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        attributes.sort_by(|a, b| a.0.cmp(&b.0));
        Self::Element {
            name: name.to_string(),
            attributes,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Set or replace an attribute, keeping the key order.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        if let Self::Element { attributes, .. } = self {
            let value = value.into();
            match attributes.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
                Ok(index) => attributes[index].1 = value,
                Err(index) => attributes.insert(index, (key.to_string(), value)),
            }
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            Self::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            Self::Text { .. } => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Element { name, .. } => Some(name),
            Self::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[RenderNode] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text { .. } => &[],
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Element { children, .. } => children.iter().map(Self::text_content).collect(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text { text } => out.push_str(&escape_html(text)),
            Self::Element {
                name,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

impl fmt::Display for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Serialize a sequence of nodes.
pub fn to_html(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out);
    }
    out
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
