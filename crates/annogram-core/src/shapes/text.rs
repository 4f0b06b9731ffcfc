//! Text box geometry.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// A text box placed at a fixed origin. The box itself is sized by the
/// platform; only its content is tracked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGeometry {
    pub origin: Point,
    pub size: Size,
    pub content: String,
}

impl TextGeometry {
    /// Default box size used when no configuration overrides it.
    pub const DEFAULT_SIZE: Size = Size::new(200.0, 60.0);

    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            origin,
            size,
            content: String::new(),
        }
    }

    /// Whitespace-only content counts as empty.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    /// SVG attributes of the hosting `<foreignObject>`.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x", self.origin.x.to_string()),
            ("y", self.origin.y.to_string()),
            ("width", self.size.width.to_string()),
            ("height", self.size.height.to_string()),
        ]
    }
}
