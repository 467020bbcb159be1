use crate::dom::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One DOM change notification, shaped like a `MutationRecord`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MutationRecord {
    pub kind: MutationKind,

    /// Node the change happened on (the parent for child list changes)
    pub target: NodeId,

    #[serde(default)]
    pub added_nodes: Vec<NodeId>,

    #[serde(default)]
    pub removed_nodes: Vec<NodeId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added_nodes: Vec<NodeId>, removed_nodes: Vec<NodeId>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added_nodes,
            removed_nodes,
            attribute_name: None,
        }
    }

    pub fn attributes(target: NodeId, attribute_name: impl Into<String>) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(attribute_name.into()),
        }
    }

    /// Nodes this record touches: added and removed nodes, or the target when there are none
    pub fn touched_nodes(&self) -> Vec<NodeId> {
        let touched: Vec<NodeId> = self
            .added_nodes
            .iter()
            .chain(self.removed_nodes.iter())
            .copied()
            .collect();

        if touched.is_empty() {
            vec![self.target]
        } else {
            touched
        }
    }
}

/// Mirrors `MutationObserverInit`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObserveOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_filter: Option<Vec<String>>,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            child_list: true,
            attributes: true,
            subtree: true,
            attribute_filter: None,
        }
    }
}

impl ObserveOptions {
    /// Subtree child list changes plus changes to a single attribute
    pub fn for_attribute(name: impl Into<String>) -> Self {
        Self {
            attribute_filter: Some(vec![name.into()]),
            ..Self::default()
        }
    }

    /// Whether a change to `name` should produce a record
    pub fn wants_attribute(&self, name: &str) -> bool {
        self.attributes
            && self
                .attribute_filter
                .as_ref()
                .is_none_or(|filter| filter.iter().any(|f| f == name))
    }
}
