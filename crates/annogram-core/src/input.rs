//! Input events delivered to the overlay session.

use crate::renderer::NodeHandle;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Listener kinds the core attaches through the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Click,
    PointerMove,
    KeyUp,
    Blur,
}

impl EventKind {
    /// DOM event type name.
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::PointerMove => "mousemove",
            EventKind::KeyUp => "keyup",
            EventKind::Blur => "blur",
        }
    }
}

/// Keys the overlay cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Escape,
    Other(String),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Delete" | "Del" => Key::Delete,
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }

    /// Parse a legacy `keyCode` value.
    pub fn from_key_code(code: u32) -> Self {
        match code {
            46 => Key::Delete,
            27 => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }

    /// Delete and Escape both end an edit session by removing the shape.
    pub fn is_removal(&self) -> bool {
        matches!(self, Key::Delete | Key::Escape)
    }
}

/// An event routed to the session by the platform layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayEvent {
    /// A click seen by the listener attached on `listener`.
    Click {
        /// Node the listener is attached to.
        listener: NodeHandle,
        /// Innermost known node under the pointer, if any.
        target: Option<NodeHandle>,
        /// Pointer position in overlay coordinates.
        position: Point,
    },
    PointerMove {
        position: Point,
    },
    KeyUp {
        key: Key,
    },
    /// A node lost keyboard focus.
    Blur {
        node: NodeHandle,
    },
}

impl OverlayEvent {
    /// Click on `node` whose target is the node itself.
    pub fn click(node: NodeHandle, position: Point) -> Self {
        OverlayEvent::Click {
            listener: node,
            target: Some(node),
            position,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            OverlayEvent::Click { .. } => EventKind::Click,
            OverlayEvent::PointerMove { .. } => EventKind::PointerMove,
            OverlayEvent::KeyUp { .. } => EventKind::KeyUp,
            OverlayEvent::Blur { .. } => EventKind::Blur,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parsing() {
        assert_eq!(Key::from_dom_key("Delete"), Key::Delete);
        assert_eq!(Key::from_dom_key("Esc"), Key::Escape);
        assert_eq!(Key::from_dom_key("a"), Key::Other("a".to_string()));
        assert_eq!(Key::from_key_code(46), Key::Delete);
        assert_eq!(Key::from_key_code(27), Key::Escape);
        assert!(!Key::from_key_code(13).is_removal());
    }

    #[test]
    fn test_event_kind() {
        let event = OverlayEvent::click(NodeHandle(4), Point::new(1.0, 2.0));
        assert_eq!(event.kind(), EventKind::Click);
        assert_eq!(EventKind::PointerMove.dom_name(), "mousemove");
        assert_eq!(
            OverlayEvent::KeyUp { key: Key::Escape }.kind(),
            EventKind::KeyUp
        );
    }
}
