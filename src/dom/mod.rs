//! Document abstraction
//!
//! The highlighter core never touches a concrete DOM. It talks to a [`Dom`]
//! implementation through opaque [`NodeId`] handles:
//! - [`Document`]: an in-memory arena document (tests, embedders)
//! - `browser::PageDom`: a live Chrome page driven over CDP
//!
//! Handles are non-owning. A node removed from the document keeps its handle,
//! reports `is_connected() == false`, and may still be read or written.

pub mod document;
pub mod element;
pub mod events;
pub mod mutation;
pub mod style;

pub use document::Document;
pub use element::{BoundingBox, ElementNode};
pub use events::UserEvent;
pub use mutation::{MutationKind, MutationRecord, ObserveOptions};
pub use style::{InlineStyle, ScrollBehavior, ScrollBlock, ScrollOptions};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an element of a [`Dom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The document operations the highlighter needs
///
/// Reads take `&self`, writes take `&mut self`. Every operation on an unknown
/// handle fails with an error rather than panicking.
pub trait Dom {
    /// The `<body>` element
    fn body(&self) -> Result<NodeId>;

    /// All connected elements carrying `attribute`, in document order
    fn query_attribute(&self, attribute: &str) -> Result<Vec<NodeId>>;

    /// Connected element with the given `id` attribute
    fn element_by_id(&self, id: &str) -> Result<Option<NodeId>>;

    /// Snapshot of tag, attributes, text content and layout (no children)
    fn element(&self, node: NodeId) -> Result<ElementNode>;

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>>;

    fn bounding_box(&self, node: NodeId) -> Result<Option<BoundingBox>>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>>;

    fn is_connected(&self, node: NodeId) -> bool;

    /// Inclusive containment, like `Node.contains`
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Inline style value, empty when unset
    fn style_property(&self, node: NodeId, property: &str) -> Result<String>;

    /// Set an inline style value; an empty value removes the property
    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> Result<()>;

    fn scroll_into_view(&mut self, node: NodeId, options: ScrollOptions) -> Result<()>;

    /// Create a detached element
    fn create_element(&mut self, tag_name: &str) -> Result<NodeId>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Detach a node from its parent; a no-op for detached nodes
    fn remove(&mut self, node: NodeId) -> Result<()>;

    fn clear_children(&mut self, node: NodeId) -> Result<()>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()>;

    /// Replace all children with a text node
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()>;

    /// Start recording mutations under `target`, replacing any previous observation
    fn observe(&mut self, target: NodeId, options: &ObserveOptions) -> Result<()>;

    /// Stop recording and drop queued records
    fn disconnect(&mut self);

    fn take_records(&mut self) -> Vec<MutationRecord>;

    fn take_events(&mut self) -> Vec<UserEvent>;

    /// Nearest inclusive ancestor of `node` carrying `attribute`, not leaving `boundary`
    fn closest_with_attribute(&self, node: NodeId, attribute: &str, boundary: NodeId) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if matches!(self.attribute(current, attribute), Ok(Some(_))) {
                return Some(current);
            }
            if current == boundary {
                return None;
            }
            cursor = self.parent(current).ok().flatten();
        }
        None
    }
}
