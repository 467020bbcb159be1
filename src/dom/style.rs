use crate::{dom::{Dom, NodeId},
            error::Result};
use serde::{Deserialize, Serialize};

/// The two inline style properties the highlighter owns on page elements
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineStyle {
    pub outline: String,
    pub background: String,
}

impl InlineStyle {
    pub fn new(outline: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            outline: outline.into(),
            background: background.into(),
        }
    }

    /// Read the current inline values from an element
    pub fn read<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Result<Self> {
        Ok(Self {
            outline: dom.style_property(node, "outline")?,
            background: dom.style_property(node, "background")?,
        })
    }

    /// Overwrite the inline values on an element
    pub fn write<D: Dom + ?Sized>(&self, dom: &mut D, node: NodeId) -> Result<()> {
        dom.set_style_property(node, "outline", &self.outline)?;
        dom.set_style_property(node, "background", &self.background)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    Auto,
    #[default]
    Smooth,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBlock {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

/// Mirrors `scrollIntoView` options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrollOptions {
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, ElementNode};

    #[test]
    fn test_read_write_round_trip() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let node = doc.append_tree(body, ElementNode::new("div")).unwrap();

        let style = InlineStyle::new("1px solid red", "#fff");
        style.write(&mut doc, node).unwrap();

        assert_eq!(InlineStyle::read(&doc, node).unwrap(), style);
    }

    #[test]
    fn test_unset_style_reads_empty() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let node = doc.append_tree(body, ElementNode::new("div")).unwrap();

        assert_eq!(InlineStyle::read(&doc, node).unwrap(), InlineStyle::default());
    }

    #[test]
    fn test_scroll_options_serialize_like_dom() {
        let json = serde_json::to_value(ScrollOptions::default()).unwrap();
        assert_eq!(json, serde_json::json!({"behavior": "smooth", "block": "center"}));
    }
}
