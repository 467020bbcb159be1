use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of a DOM element: what the describer and the in-memory document work with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// Lowercase HTML tag name (e.g., "div", "img", "input")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, href, data-testid)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text content of the element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements, only used when building a document from a tree
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Layout box in viewport coordinates, absent when the element is not rendered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            bounding_box: None,
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: add one attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Get a non-empty attribute value by key
    pub fn non_empty_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        if let Some(classes) = self.attributes.get("class") {
            classes.split_whitespace().any(|c| c == class_name)
        } else {
            false
        }
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Trimmed text content, `None` when there is no visible text
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text_content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Copy of this node without its children
    pub fn shallow(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box is visible (has non-zero dimensions)
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn left(&self) -> f64 {
        self.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), "test-id".to_string());
        attrs.insert("data-testid".to_string(), "submit".to_string());

        let element = ElementNode::new("BUTTON")
            .with_attributes(attrs)
            .with_text("Click me")
            .with_bounding_box(1.0, 2.0, 30.0, 40.0);

        assert_eq!(element.tag_name, "button");
        assert_eq!(element.id(), Some(&"test-id".to_string()));
        assert_eq!(element.get_attribute("data-testid"), Some(&"submit".to_string()));
        assert_eq!(element.text_content, Some("Click me".to_string()));
        assert_eq!(element.bounding_box, Some(BoundingBox::new(1.0, 2.0, 30.0, 40.0)));
    }

    #[test]
    fn test_has_class() {
        let mut element = ElementNode::new("div");
        element.add_attribute("class", "container main active");

        assert!(element.has_class("container"));
        assert!(element.has_class("main"));
        assert!(element.has_class("active"));
        assert!(!element.has_class("hidden"));
    }

    #[test]
    fn test_trimmed_text() {
        assert_eq!(ElementNode::new("p").with_text("  hi  ").trimmed_text(), Some("hi"));
        assert_eq!(ElementNode::new("p").with_text("   ").trimmed_text(), None);
        assert_eq!(ElementNode::new("p").trimmed_text(), None);
    }

    #[test]
    fn test_non_empty_attribute() {
        let element = ElementNode::new("img").with_attribute("alt", "").with_attribute("src", "a.png");
        assert_eq!(element.non_empty_attribute("alt"), None);
        assert_eq!(element.non_empty_attribute("src"), Some("a.png"));
    }

    #[test]
    fn test_shallow_drops_children() {
        let parent = ElementNode::new("ul").with_children(vec![ElementNode::new("li")]);
        assert!(parent.shallow().children.is_empty());
        assert_eq!(parent.shallow().tag_name, "ul");
    }

    #[test]
    fn test_deserialize_bridge_payload() {
        let json = r#"{"tag_name":"a","attributes":{"href":"/x"},"text_content":"Go","bounding_box":{"x":1,"y":2,"width":3,"height":4}}"#;
        let element: ElementNode = serde_json::from_str(json).unwrap();

        assert!(element.is_tag("a"));
        assert_eq!(element.get_attribute("href"), Some(&"/x".to_string()));
        assert_eq!(element.bounding_box.unwrap().top(), 2.0);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::new(10.0, 20.0, 100.0, 50.0);

        assert!(bbox.is_visible());
        assert_eq!(bbox.left(), 10.0);
        assert_eq!(bbox.top(), 20.0);

        let invisible_bbox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        assert!(!invisible_bbox.is_visible());
    }
}
