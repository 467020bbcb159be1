use crate::{dom::{Dom, NodeId, UserEvent},
            error::Result};

pub const TOOLTIP_ID: &str = "ah-tooltip";

/// Floating `"<attr>: <value>"` label that follows the pointer
#[derive(Debug, Clone)]
pub struct Tooltip {
    node: NodeId,
    offset: f64,
    visible: bool,
}

impl Tooltip {
    /// Create the tooltip element under `parent`, hidden
    pub fn create<D: Dom + ?Sized>(dom: &mut D, parent: NodeId, offset: f64) -> Result<Self> {
        let node = dom.create_element("div")?;
        dom.set_attribute(node, "id", TOOLTIP_ID)?;
        dom.set_attribute(node, "class", "ah-tooltip")?;
        dom.set_style_property(node, "position", "fixed")?;
        dom.set_style_property(node, "display", "none")?;
        dom.append_child(parent, node)?;
        Ok(Self::adopt(node, offset))
    }

    /// Wrap an existing tooltip element; it is assumed hidden
    pub fn adopt(node: NodeId, offset: f64) -> Self {
        Self {
            node,
            offset,
            visible: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// React to a pointer event for the tracked `attribute`
    ///
    /// Pointer-over an element with a non-empty value shows the tooltip, any
    /// other pointer-over or a pointer-out hides it. Other events are ignored.
    pub fn handle<D: Dom + ?Sized>(&mut self, dom: &mut D, event: &UserEvent, attribute: &str) -> Result<()> {
        match event {
            UserEvent::PointerOver { target, x, y } => {
                let value = dom.attribute(*target, attribute)?.filter(|v| !v.is_empty());
                match value {
                    Some(value) => self.show(dom, &format!("{}: {}", attribute, value), *x, *y),
                    None => self.hide(dom),
                }
            }
            UserEvent::PointerOut { .. } => self.hide(dom),
            _ => Ok(()),
        }
    }

    pub fn show<D: Dom + ?Sized>(&mut self, dom: &mut D, text: &str, x: f64, y: f64) -> Result<()> {
        dom.set_text(self.node, text)?;
        dom.set_style_property(self.node, "left", &format!("{}px", x + self.offset))?;
        dom.set_style_property(self.node, "top", &format!("{}px", y + self.offset))?;
        dom.set_style_property(self.node, "display", "block")?;
        self.visible = true;
        Ok(())
    }

    pub fn hide<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<()> {
        if self.visible {
            dom.set_style_property(self.node, "display", "none")?;
            self.visible = false;
        }
        Ok(())
    }
}
