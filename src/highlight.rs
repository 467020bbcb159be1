//! Highlight styles on page elements
//!
//! Two layers can be visible at once: the shared "all" layer and the
//! "selected" layer on top of it. Each layer keeps a [`StyleSnapshots`] of the
//! inline styles it overwrote. Layers are always removed top first (selected,
//! then all) so that restoring the bottom layer ends on the page's own styles.

use crate::{config::HighlighterConfig,
            dom::{Dom, InlineStyle, NodeId, ScrollOptions},
            matching::MatchGroup};
use indexmap::IndexMap;

/// Original inline styles of elements, captured before they were overwritten
#[derive(Debug, Clone, Default)]
pub struct StyleSnapshots {
    map: IndexMap<NodeId, InlineStyle>,
}

impl StyleSnapshots {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Capture the current style of every element not captured yet
    ///
    /// Returns the elements now tracked. Elements whose style cannot be read
    /// are skipped and left untouched.
    pub fn snapshot_if_absent<D: Dom + ?Sized>(&mut self, dom: &D, elements: &[NodeId]) -> Vec<NodeId> {
        let mut tracked = Vec::with_capacity(elements.len());
        for &node in elements {
            if self.map.contains_key(&node) {
                tracked.push(node);
                continue;
            }
            match InlineStyle::read(dom, node) {
                Ok(style) => {
                    self.map.insert(node, style);
                    tracked.push(node);
                }
                Err(e) => log::debug!("Skipping {} while snapshotting styles: {}", node, e),
            }
        }
        tracked
    }

    /// Write captured styles back to attached elements, then forget all of them
    pub fn restore<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        for (node, style) in self.map.drain(..) {
            if !dom.is_connected(node) {
                log::debug!("Not restoring styles of detached {}", node);
                continue;
            }
            if let Err(e) = style.write(dom, node) {
                log::debug!("Failed to restore styles of {}: {}", node, e);
            }
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&InlineStyle> {
        self.map.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.map.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Snapshot `elements` into `snapshots`, then overwrite their inline style
pub fn apply_highlight<D: Dom + ?Sized>(
    dom: &mut D,
    snapshots: &mut StyleSnapshots,
    elements: &[NodeId],
    style: &InlineStyle,
) {
    for node in snapshots.snapshot_if_absent(dom, elements) {
        if let Err(e) = style.write(dom, node) {
            log::debug!("Failed to highlight {}: {}", node, e);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    /// The group was already selected and got cleared instead
    Deselected,
}

/// Highlight layers of one scan
#[derive(Debug, Clone)]
pub struct HighlightState {
    all_highlighted: bool,
    all_styles: StyleSnapshots,
    selected: Option<MatchGroup>,
    selected_styles: StyleSnapshots,
    all_style: InlineStyle,
    selected_style: InlineStyle,
}

impl HighlightState {
    pub fn new(all_style: InlineStyle, selected_style: InlineStyle) -> Self {
        Self {
            all_highlighted: false,
            all_styles: StyleSnapshots::new(),
            selected: None,
            selected_styles: StyleSnapshots::new(),
            all_style,
            selected_style,
        }
    }

    pub fn from_config(config: &HighlighterConfig) -> Self {
        Self::new(config.all_style.clone(), config.selected_style.clone())
    }

    pub fn is_all_highlighted(&self) -> bool {
        self.all_highlighted
    }

    pub fn selected(&self) -> Option<&MatchGroup> {
        self.selected.as_ref()
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected.as_ref().map(|g| g.value.as_str())
    }

    /// Snapshots of the "all" layer
    pub fn all_styles(&self) -> &StyleSnapshots {
        &self.all_styles
    }

    /// Snapshots of the "selected" layer
    pub fn selected_styles(&self) -> &StyleSnapshots {
        &self.selected_styles
    }

    /// Flip highlight-all; any selection is cleared either way. Returns the new flag.
    pub fn toggle_all_highlighted<D: Dom + ?Sized>(&mut self, dom: &mut D, groups: &[MatchGroup]) -> bool {
        self.clear_selection(dom);
        if self.all_highlighted {
            self.all_styles.restore(dom);
            self.all_highlighted = false;
        } else {
            self.highlight_all(dom, groups);
        }
        self.all_highlighted
    }

    /// Paint every element of every group with the shared style
    pub fn highlight_all<D: Dom + ?Sized>(&mut self, dom: &mut D, groups: &[MatchGroup]) {
        for group in groups {
            apply_highlight(dom, &mut self.all_styles, &group.elements, &self.all_style);
        }
        self.all_highlighted = true;
    }

    /// Select a group, or deselect it when it is already the selection
    ///
    /// Selecting restores the previous selection, paints the group with the
    /// selected style on top of any highlight-all and scrolls its first element
    /// into view.
    pub fn select_group<D: Dom + ?Sized>(&mut self, dom: &mut D, group: &MatchGroup) -> SelectOutcome {
        if self.selected_value() == Some(group.value.as_str()) {
            self.clear_selection(dom);
            return SelectOutcome::Deselected;
        }

        self.apply_selection(dom, group);
        if let Some(first) = group.first() {
            if let Err(e) = dom.scroll_into_view(first, ScrollOptions::default()) {
                log::debug!("Failed to scroll {} into view: {}", first, e);
            }
        }
        SelectOutcome::Selected
    }

    /// Make `group` the selection without scrolling
    pub fn apply_selection<D: Dom + ?Sized>(&mut self, dom: &mut D, group: &MatchGroup) {
        self.clear_selection(dom);
        apply_highlight(dom, &mut self.selected_styles, &group.elements, &self.selected_style);
        self.selected = Some(group.clone());
    }

    /// Remove the selected layer, uncovering the "all" layer if it is on
    pub fn clear_selection<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        self.selected_styles.restore(dom);
        self.selected = None;
    }

    /// Remove both layers
    pub fn clear<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        self.clear_selection(dom);
        self.all_styles.restore(dom);
        self.all_highlighted = false;
    }
}
