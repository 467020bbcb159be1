use crate::dom::NodeId;
use serde::{Deserialize, Serialize};

/// User input observed on the page, in dispatch order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserEvent {
    Click { target: NodeId },
    KeyDown { target: NodeId, key: String },
    Input { target: NodeId, value: String },
    /// Pointer coordinates are viewport coordinates
    PointerOver { target: NodeId, x: f64, y: f64 },
    PointerOut { target: NodeId },
}

impl UserEvent {
    pub fn target(&self) -> NodeId {
        match self {
            UserEvent::Click { target }
            | UserEvent::KeyDown { target, .. }
            | UserEvent::Input { target, .. }
            | UserEvent::PointerOver { target, .. }
            | UserEvent::PointerOut { target } => *target,
        }
    }

    /// Keys that activate a focused button
    pub fn is_activation_key(&self) -> bool {
        matches!(self, UserEvent::KeyDown { key, .. } if key == "Enter" || key == " ")
    }
}
