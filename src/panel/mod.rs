//! Floating panel mounted inside the page
//!
//! The panel lists one item per group, filters the list by a search text and
//! exposes the highlight-all and collapse controls. It never acts on user
//! input itself: [`Panel::interpret`] turns events into [`PanelAction`]s and
//! the scanner decides what they do.

pub mod tooltip;

pub use tooltip::{Tooltip, TOOLTIP_ID};

use crate::{dom::{Dom, NodeId, UserEvent},
            error::{HighlightError, Result},
            matching::{ContextDescriber, ScanResult}};

pub const PANEL_ID: &str = "ah-panel";
pub const TITLE_ID: &str = "ah-panel-title";
pub const SEARCH_INPUT_ID: &str = "ah-search-input";
pub const HIGHLIGHT_ALL_ID: &str = "ah-highlight-all-btn";
pub const TOGGLE_ID: &str = "ah-panel-toggle";
pub const LIST_ID: &str = "ah-attribute-list";

pub const DEFAULT_TITLE: &str = "Attribute Highlighter";
pub const EMPTY_MESSAGE: &str = "No matches";

pub const ACTION_ATTRIBUTE: &str = "data-ah-action";
pub const VALUE_ATTRIBUTE: &str = "data-ah-value";

const ITEM_CLASS: &str = "ah-attribute-item";
const SELECTED_CLASS: &str = "ah-item-selected";
const ACTIVE_CLASS: &str = "active";
const COLLAPSED_CLASS: &str = "ah-panel-collapsed";
const EXPANDED_CLASS: &str = "ah-panel-expanded";

/// What a user interaction with the panel asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    Select(String),
    ToggleHighlightAll,
    Search(String),
    ToggleCollapsed,
}

/// One rendered list item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub value: String,
    pub count: usize,
    pub context: String,
    pub node: NodeId,
}

impl PanelEntry {
    /// Case-insensitive substring match over value and context
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        format!("{} {}", self.value, self.context).to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone)]
pub struct Panel {
    root: NodeId,
    title: NodeId,
    search_input: NodeId,
    highlight_all: NodeId,
    toggle: NodeId,
    list: NodeId,
    tooltip: Tooltip,
    entries: Vec<PanelEntry>,
    empty_item: Option<NodeId>,
    query: String,
    collapsed: bool,
}

impl Panel {
    /// Create the panel under `<body>`, or adopt one already in the page
    pub fn mount<D: Dom + ?Sized>(dom: &mut D, tooltip_offset: f64) -> Result<Self> {
        if let Some(root) = dom.element_by_id(PANEL_ID)? {
            log::debug!("Adopting existing panel {}", root);
            return Self::adopt(dom, root, tooltip_offset);
        }

        let body = dom.body()?;
        let root = element(dom, "div", &[("id", PANEL_ID), ("class", "ah-panel ah-panel-expanded")])?;

        let header = element(dom, "div", &[("class", "ah-panel-header")])?;
        let title = element(dom, "h3", &[("id", TITLE_ID)])?;
        dom.set_text(title, DEFAULT_TITLE)?;
        let search_input = element(
            dom,
            "input",
            &[
                ("id", SEARCH_INPUT_ID),
                ("class", "ah-search-input"),
                ("placeholder", "Search attribute value..."),
            ],
        )?;
        let highlight_all = element(dom, "button", &[("id", HIGHLIGHT_ALL_ID), ("class", "ah-highlight-all-btn")])?;
        dom.set_text(highlight_all, "Highlight All")?;
        let toggle = element(dom, "button", &[("id", TOGGLE_ID), ("class", "ah-panel-toggle")])?;
        dom.set_text(toggle, "−")?;

        for child in [title, search_input, highlight_all, toggle] {
            dom.append_child(header, child)?;
        }

        let content = element(dom, "div", &[("class", "ah-panel-content")])?;
        let list = element(dom, "div", &[("id", LIST_ID), ("class", "ah-attribute-list")])?;
        dom.append_child(content, list)?;

        dom.append_child(root, header)?;
        dom.append_child(root, content)?;
        let tooltip = Tooltip::create(dom, root, tooltip_offset)?;
        dom.append_child(body, root)?;

        log::debug!("Mounted panel {}", root);
        Ok(Self::from_parts(root, title, search_input, highlight_all, toggle, list, tooltip))
    }

    fn adopt<D: Dom + ?Sized>(dom: &mut D, root: NodeId, tooltip_offset: f64) -> Result<Self> {
        let find = |id: &str| -> Result<NodeId> {
            dom.element_by_id(id)?
                .filter(|&node| dom.contains(root, node))
                .ok_or_else(|| HighlightError::PanelNodeMissing(id.to_string()))
        };

        let title = find(TITLE_ID)?;
        let search_input = find(SEARCH_INPUT_ID)?;
        let highlight_all = find(HIGHLIGHT_ALL_ID)?;
        let toggle = find(TOGGLE_ID)?;
        let list = find(LIST_ID)?;
        let tooltip = match find(TOOLTIP_ID) {
            Ok(node) => Tooltip::adopt(node, tooltip_offset),
            Err(_) => Tooltip::create(dom, root, tooltip_offset)?,
        };

        let mut panel = Self::from_parts(root, title, search_input, highlight_all, toggle, list, tooltip);
        panel.collapsed = dom
            .attribute(root, "class")?
            .is_some_and(|class| class.split_whitespace().any(|c| c == COLLAPSED_CLASS));
        dom.clear_children(list)?;
        Ok(panel)
    }

    fn from_parts(
        root: NodeId,
        title: NodeId,
        search_input: NodeId,
        highlight_all: NodeId,
        toggle: NodeId,
        list: NodeId,
        tooltip: Tooltip,
    ) -> Self {
        Self {
            root,
            title,
            search_input,
            highlight_all,
            toggle,
            list,
            tooltip,
            entries: Vec::new(),
            empty_item: None,
            query: String::new(),
            collapsed: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn entries(&self) -> &[PanelEntry] {
        &self.entries
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn tooltip_mut(&mut self) -> &mut Tooltip {
        &mut self.tooltip
    }

    /// Entries that pass the current search
    pub fn visible_entries(&self) -> impl Iterator<Item = &PanelEntry> {
        self.entries.iter().filter(|e| e.matches(&self.query))
    }

    /// Fail when the page removed any node the panel writes to
    pub fn ensure_attached<D: Dom + ?Sized>(&self, dom: &D) -> Result<()> {
        if !dom.is_connected(self.root) {
            return Err(HighlightError::PanelNodeMissing(PANEL_ID.to_string()));
        }
        let parts = [
            (self.title, TITLE_ID),
            (self.search_input, SEARCH_INPUT_ID),
            (self.highlight_all, HIGHLIGHT_ALL_ID),
            (self.toggle, TOGGLE_ID),
            (self.list, LIST_ID),
            (self.tooltip.node(), TOOLTIP_ID),
        ];
        match parts.iter().find(|(node, _)| !dom.contains(self.root, *node)) {
            Some((_, id)) => Err(HighlightError::PanelNodeMissing(id.to_string())),
            None => Ok(()),
        }
    }

    /// Replace the list with one item per group
    ///
    /// The current search text stays applied to the new items.
    pub fn render<D: Dom + ?Sized>(&mut self, dom: &mut D, result: &ScanResult, describer: &ContextDescriber) -> Result<()> {
        self.ensure_attached(dom)?;
        dom.clear_children(self.list)?;
        self.entries.clear();
        self.empty_item = None;

        for group in result.groups() {
            let representative = group.first().and_then(|node| dom.element(node).ok());
            let context = describer.describe(representative.as_ref());

            let item = element(
                dom,
                "div",
                &[
                    ("class", ITEM_CLASS),
                    ("role", "button"),
                    ("tabindex", "0"),
                    (ACTION_ATTRIBUTE, "select"),
                    (VALUE_ATTRIBUTE, &group.value),
                ],
            )?;
            let label = element(dom, "span", &[("class", "ah-item-label")])?;
            dom.set_text(label, &format!("{} ({})", group.value, group.len()))?;
            dom.append_child(item, label)?;
            if !context.is_empty() {
                let line = element(dom, "div", &[("class", "ah-item-context")])?;
                dom.set_text(line, &context)?;
                dom.append_child(item, line)?;
            }
            dom.append_child(self.list, item)?;

            self.entries.push(PanelEntry {
                value: group.value.clone(),
                count: group.len(),
                context,
                node: item,
            });
        }

        self.apply_filter(dom)
    }

    /// Show only the entries matching `text`; blank text shows all of them
    pub fn search<D: Dom + ?Sized>(&mut self, dom: &mut D, text: &str) -> Result<()> {
        self.query = text.to_string();
        self.apply_filter(dom)
    }

    fn apply_filter<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<()> {
        let mut shown = 0;
        for entry in &self.entries {
            let visible = entry.matches(&self.query);
            dom.set_style_property(entry.node, "display", if visible { "" } else { "none" })?;
            shown += usize::from(visible);
        }

        match (shown, self.empty_item) {
            (0, None) => {
                let item = element(dom, "div", &[("class", "ah-empty")])?;
                dom.set_text(item, EMPTY_MESSAGE)?;
                dom.append_child(self.list, item)?;
                self.empty_item = Some(item);
            }
            (1.., Some(item)) => {
                dom.remove(item)?;
                self.empty_item = None;
            }
            _ => {}
        }
        Ok(())
    }

    /// Put `text` in the title, or the default title when blank
    pub fn show_context<D: Dom + ?Sized>(&self, dom: &mut D, text: &str) -> Result<()> {
        let text = if text.trim().is_empty() { DEFAULT_TITLE } else { text };
        dom.set_text(self.title, text)
    }

    /// Mark the item of `value` as selected, unmarking every other one
    pub fn mark_selected<D: Dom + ?Sized>(&self, dom: &mut D, value: Option<&str>) -> Result<()> {
        for entry in &self.entries {
            let class = if Some(entry.value.as_str()) == value {
                format!("{} {}", ITEM_CLASS, SELECTED_CLASS)
            } else {
                ITEM_CLASS.to_string()
            };
            dom.set_attribute(entry.node, "class", &class)?;
        }
        Ok(())
    }

    pub fn set_highlight_all_active<D: Dom + ?Sized>(&self, dom: &mut D, active: bool) -> Result<()> {
        let class = if active {
            format!("ah-highlight-all-btn {}", ACTIVE_CLASS)
        } else {
            "ah-highlight-all-btn".to_string()
        };
        dom.set_attribute(self.highlight_all, "class", &class)
    }

    /// Flip between collapsed and expanded; returns whether it is now collapsed
    pub fn toggle_collapsed<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<bool> {
        self.collapsed = !self.collapsed;
        let (state, symbol) = if self.collapsed {
            (COLLAPSED_CLASS, "+")
        } else {
            (EXPANDED_CLASS, "−")
        };
        dom.set_attribute(self.root, "class", &format!("ah-panel {}", state))?;
        dom.set_text(self.toggle, symbol)?;
        Ok(self.collapsed)
    }

    pub fn show<D: Dom + ?Sized>(&self, dom: &mut D) -> Result<()> {
        dom.set_style_property(self.root, "display", "")
    }

    /// Hide the panel and its tooltip
    pub fn hide<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<()> {
        self.tooltip.hide(dom)?;
        dom.set_style_property(self.root, "display", "none")
    }

    /// Map an event to the action it requests, if it happened on the panel
    pub fn interpret<D: Dom + ?Sized>(&self, dom: &D, event: &UserEvent) -> Option<PanelAction> {
        let target = event.target();
        if !dom.contains(self.root, target) {
            return None;
        }

        match event {
            UserEvent::Click { .. } => {
                if dom.contains(self.toggle, target) {
                    Some(PanelAction::ToggleCollapsed)
                } else if dom.contains(self.highlight_all, target) {
                    Some(PanelAction::ToggleHighlightAll)
                } else {
                    self.item_action(dom, target)
                }
            }
            UserEvent::KeyDown { .. } if event.is_activation_key() => self.item_action(dom, target),
            UserEvent::Input { value, .. } if target == self.search_input => Some(PanelAction::Search(value.clone())),
            _ => None,
        }
    }

    fn item_action<D: Dom + ?Sized>(&self, dom: &D, target: NodeId) -> Option<PanelAction> {
        let item = dom.closest_with_attribute(target, ACTION_ATTRIBUTE, self.root)?;
        match dom.attribute(item, ACTION_ATTRIBUTE).ok().flatten().as_deref() {
            Some("select") => dom
                .attribute(item, VALUE_ATTRIBUTE)
                .ok()
                .flatten()
                .map(PanelAction::Select),
            _ => None,
        }
    }
}

fn element<D: Dom + ?Sized>(dom: &mut D, tag: &str, attributes: &[(&str, &str)]) -> Result<NodeId> {
    let node = dom.create_element(tag)?;
    for (name, value) in attributes {
        dom.set_attribute(node, name, value)?;
    }
    Ok(node)
}
