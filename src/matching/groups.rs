use crate::dom::NodeId;
use indexmap::IndexMap;
use serde::Serialize;

/// Group key used for elements whose attribute value is blank
pub const EMPTY_VALUE: &str = "(empty)";

/// Elements sharing one attribute value, in query order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchGroup {
    pub value: String,
    pub elements: Vec<NodeId>,
}

impl MatchGroup {
    pub fn new(value: impl Into<String>, elements: Vec<NodeId>) -> Self {
        Self {
            value: value.into(),
            elements,
        }
    }

    /// The representative element: first in query order
    pub fn first(&self) -> Option<NodeId> {
        self.elements.first().copied()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Map of attribute values to matching elements
/// Uses IndexMap so groups come out in first-encounter order
#[derive(Debug, Clone, Default)]
pub struct GroupMap {
    map: IndexMap<String, Vec<NodeId>>,
}

impl GroupMap {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Normalize a raw attribute value into its group key
    pub fn key_for(value: Option<&str>) -> &str {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => EMPTY_VALUE,
        }
    }

    /// File an element under its attribute value
    pub fn insert(&mut self, value: Option<&str>, node: NodeId) {
        self.map
            .entry(Self::key_for(value).to_string())
            .or_default()
            .push(node);
    }

    pub fn into_groups(self) -> Vec<MatchGroup> {
        self.map
            .into_iter()
            .map(|(value, elements)| MatchGroup { value, elements })
            .collect()
    }
}

/// Ordered groups produced by one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    groups: Vec<MatchGroup>,
}

impl ScanResult {
    pub fn new(groups: Vec<MatchGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[MatchGroup] {
        &self.groups
    }

    pub fn find(&self, value: &str) -> Option<&MatchGroup> {
        self.groups.iter().find(|g| g.value == value)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every matched element across all groups
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.groups.iter().flat_map(|g| g.elements.iter().copied())
    }

    pub fn total_elements(&self) -> usize {
        self.groups.iter().map(MatchGroup::len).sum()
    }
}
