use crate::{dom::{BoundingBox, Dom, ElementNode, MutationRecord, NodeId, ObserveOptions, ScrollOptions, UserEvent},
            error::{HighlightError, Result}};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct Node {
    /// Tag, attributes, own text and layout; `children` is always empty here
    element: ElementNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    style: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
struct Observation {
    target: NodeId,
    options: ObserveOptions,
}

/// In-memory arena document
///
/// Nodes are never freed: removing a node only detaches it, so handles stay
/// valid the way element references do in a browser. Mutation records are
/// queued while an observation is active and user events are queued by
/// [`Document::dispatch`].
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    observation: Option<Observation>,
    records: Vec<MutationRecord>,
    events: Vec<UserEvent>,
    scroll_log: Vec<(NodeId, ScrollOptions)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `<body>`
    pub fn new() -> Self {
        Self::from_tree(ElementNode::new("body"))
    }

    /// Create a document whose body is built from `body` and its children
    pub fn from_tree(body: ElementNode) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: NodeId::new(0),
            observation: None,
            records: Vec::new(),
            events: Vec::new(),
            scroll_log: Vec::new(),
        };
        doc.body = doc.build_subtree(body, None);
        doc
    }

    /// Build `tree` and append it under `parent`, returning the new subtree root
    pub fn append_tree(&mut self, parent: NodeId, tree: ElementNode) -> Result<NodeId> {
        self.node(parent)?;
        let root = self.build_subtree(tree, None);
        self.append_child(parent, root)?;
        Ok(root)
    }

    /// Queue a user event for the next `take_events`
    pub fn dispatch(&mut self, event: UserEvent) {
        self.events.push(event);
    }

    /// Every `scroll_into_view` call so far
    pub fn scroll_log(&self) -> &[(NodeId, ScrollOptions)] {
        &self.scroll_log
    }

    /// Change an element's layout box
    pub fn set_bounding_box(&mut self, node: NodeId, bounding_box: Option<BoundingBox>) -> Result<()> {
        self.node_mut(node)?.element.bounding_box = bounding_box;
        Ok(())
    }

    /// Whether an observation is currently active
    pub fn is_observing(&self) -> bool {
        self.observation.is_some()
    }

    /// Concatenated text of the node and its descendants
    pub fn text_content(&self, node: NodeId) -> Result<String> {
        let data = self.node(node)?;
        let mut text = data.element.text_content.clone().unwrap_or_default();
        for &child in &data.children {
            text.push_str(&self.text_content(child)?);
        }
        Ok(text)
    }

    fn build_subtree(&mut self, mut tree: ElementNode, parent: Option<NodeId>) -> NodeId {
        let children = std::mem::take(&mut tree.children);
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(Node {
            element: tree,
            parent,
            children: Vec::new(),
            style: IndexMap::new(),
        });

        for child in children {
            let child_id = self.build_subtree(child, Some(id));
            self.nodes[id.raw() as usize].children.push(child_id);
        }

        id
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.raw() as usize)
            .ok_or(HighlightError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.raw() as usize)
            .ok_or(HighlightError::NodeNotFound(id))
    }

    /// Pre-order walk of the subtree rooted at `root`, root included
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Ok(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn record(&mut self, record: MutationRecord) {
        let Some(observation) = &self.observation else {
            return;
        };

        let in_scope = if observation.options.subtree {
            self.contains(observation.target, record.target)
        } else {
            observation.target == record.target
        };
        if !in_scope {
            return;
        }

        let wanted = match &record.attribute_name {
            Some(name) => observation.options.wants_attribute(name),
            None => observation.options.child_list,
        };
        if wanted {
            self.records.push(record);
        }
    }

    fn detach_children(&mut self, node: NodeId) -> Result<Vec<NodeId>> {
        let removed = std::mem::take(&mut self.node_mut(node)?.children);
        for &child in &removed {
            self.nodes[child.raw() as usize].parent = None;
        }
        Ok(removed)
    }
}

impl Dom for Document {
    fn body(&self) -> Result<NodeId> {
        Ok(self.body)
    }

    fn query_attribute(&self, attribute: &str) -> Result<Vec<NodeId>> {
        Ok(self
            .descendants(self.body)
            .into_iter()
            .filter(|&id| self.nodes[id.raw() as usize].element.attributes.contains_key(attribute))
            .collect())
    }

    fn element_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        Ok(self
            .descendants(self.body)
            .into_iter()
            .find(|&node| self.nodes[node.raw() as usize].element.id().map(String::as_str) == Some(id)))
    }

    fn element(&self, node: NodeId) -> Result<ElementNode> {
        let mut snapshot = self.node(node)?.element.shallow();
        let text = self.text_content(node)?;
        snapshot.text_content = (!text.is_empty()).then_some(text);
        snapshot.bounding_box = self.bounding_box(node)?;
        Ok(snapshot)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.node(node)?.element.attributes.get(name).cloned())
    }

    fn bounding_box(&self, node: NodeId) -> Result<Option<BoundingBox>> {
        let data = self.node(node)?;
        if !self.is_connected(node) {
            return Ok(None);
        }
        Ok(data.element.bounding_box)
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.body, node)
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).ok().and_then(|n| n.parent);
        }
        false
    }

    fn style_property(&self, node: NodeId, property: &str) -> Result<String> {
        Ok(self.node(node)?.style.get(property).cloned().unwrap_or_default())
    }

    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let style = &mut self.node_mut(node)?.style;
        if value.is_empty() {
            style.shift_remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
        self.record(MutationRecord::attributes(node, "style"));
        Ok(())
    }

    fn scroll_into_view(&mut self, node: NodeId, options: ScrollOptions) -> Result<()> {
        self.node(node)?;
        self.scroll_log.push((node, options));
        Ok(())
    }

    fn create_element(&mut self, tag_name: &str) -> Result<NodeId> {
        Ok(self.build_subtree(ElementNode::new(tag_name), None))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.body {
            return Err(HighlightError::InvalidOperation("cannot append the body".into()));
        }
        if self.contains(child, parent) {
            return Err(HighlightError::InvalidOperation(format!(
                "appending {} under {} would create a cycle",
                child, parent
            )));
        }

        self.remove(child)?;
        self.nodes[child.raw() as usize].parent = Some(parent);
        self.nodes[parent.raw() as usize].children.push(child);
        self.record(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> Result<()> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };
        self.nodes[parent.raw() as usize].children.retain(|&c| c != node);
        self.nodes[node.raw() as usize].parent = None;
        self.record(MutationRecord::child_list(parent, Vec::new(), vec![node]));
        Ok(())
    }

    fn clear_children(&mut self, node: NodeId) -> Result<()> {
        let removed = self.detach_children(node)?;
        if !removed.is_empty() {
            self.record(MutationRecord::child_list(node, Vec::new(), removed));
        }
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.node_mut(node)?.element.add_attribute(name, value);
        self.record(MutationRecord::attributes(node, name));
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        if self.node_mut(node)?.element.attributes.remove(name).is_some() {
            self.record(MutationRecord::attributes(node, name));
        }
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        let removed = self.detach_children(node)?;
        self.node_mut(node)?.element.text_content = (!text.is_empty()).then(|| text.to_string());
        self.record(MutationRecord::child_list(node, Vec::new(), removed));
        Ok(())
    }

    fn observe(&mut self, target: NodeId, options: &ObserveOptions) -> Result<()> {
        self.node(target)?;
        self.observation = Some(Observation {
            target,
            options: options.clone(),
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        self.observation = None;
        self.records.clear();
    }

    fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    fn take_events(&mut self) -> Vec<UserEvent> {
        std::mem::take(&mut self.events)
    }
}
