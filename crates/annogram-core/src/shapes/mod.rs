//! Annotation shapes and their geometry.

mod line;
mod rect;
mod text;

pub use line::LineGeometry;
pub use rect::{Flip, RectGeometry};
pub use text::TextGeometry;

use crate::renderer::NodeHandle;
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shape instances.
pub type ShapeId = Uuid;

/// The built-in shape types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Line,
    Rect,
    Text,
}

impl ShapeKind {
    /// Identifier stored in node tags and used by the registry.
    pub fn id(self) -> &'static str {
        match self {
            ShapeKind::Line => "line",
            ShapeKind::Rect => "rect",
            ShapeKind::Text => "text",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "line" => Some(ShapeKind::Line),
            "rect" => Some(ShapeKind::Rect),
            "text" => Some(ShapeKind::Text),
            _ => None,
        }
    }

    /// Label shown on the menu selector.
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Rect => "Rect",
            ShapeKind::Text => "Text",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Text, ShapeKind::Rect, ShapeKind::Line]
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in digits.char_indices() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            6 | 8 => {
                let r = channel(digits.get(0..2)?)?;
                let g = channel(digits.get(2..4)?)?;
                let b = channel(digits.get(4..6)?)?;
                let a = match digits.get(6..8) {
                    Some(a) => channel(a)?,
                    None => 255,
                };
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    /// CSS color value: `#rrggbb`, or `rgba(...)` when translucent.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f64 / 255.0
            )
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Part of a shape that follows the pointer during an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grip {
    /// Line endpoint 1.
    Start,
    /// Line endpoint 2.
    End,
    /// The free rectangle corner.
    Corner,
    /// Text content (nothing follows the pointer).
    Content,
}

/// Index of the candidate closest to `at` by squared distance.
/// Later candidates win ties.
pub(crate) fn nearest_index(candidates: &[Point], at: Point) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, p) in candidates.iter().enumerate() {
        let d = (*p - at).hypot2();
        if d <= best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Type-dependent geometry of a placed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Line(LineGeometry),
    Rect(RectGeometry),
    Text(TextGeometry),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Line(_) => ShapeKind::Line,
            Geometry::Rect(_) => ShapeKind::Rect,
            Geometry::Text(_) => ShapeKind::Text,
        }
    }
}

/// Visual nodes backing one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeNodes {
    /// Node attached to the overlay surface.
    pub root: NodeHandle,
    /// Inner editable node (the textarea of a text box).
    pub content: Option<NodeHandle>,
}

impl ShapeNodes {
    pub fn all(&self) -> impl Iterator<Item = NodeHandle> {
        std::iter::once(self.root).chain(self.content)
    }
}

/// One placed annotation.
#[derive(Debug, Clone)]
pub struct ShapeInstance {
    pub(crate) id: ShapeId,
    pub geometry: Geometry,
    pub color: SerializableColor,
    pub nodes: ShapeNodes,
}

impl ShapeInstance {
    pub fn new(geometry: Geometry, color: SerializableColor, nodes: ShapeNodes) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            color,
            nodes,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn as_line(&self) -> Option<&LineGeometry> {
        match &self.geometry {
            Geometry::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<&RectGeometry> {
        match &self.geometry {
            Geometry::Rect(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextGeometry> {
        match &self.geometry {
            Geometry::Text(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ids_round_trip() {
        for kind in ShapeKind::all() {
            assert_eq!(ShapeKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(ShapeKind::from_id("ellipse"), None);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(
            SerializableColor::from_hex("#ff8000"),
            Some(SerializableColor::rgb(255, 128, 0))
        );
        assert_eq!(
            SerializableColor::from_hex("f00"),
            Some(SerializableColor::rgb(255, 0, 0))
        );
        assert_eq!(
            SerializableColor::from_hex("#00000080"),
            Some(SerializableColor::new(0, 0, 0, 128))
        );
        assert_eq!(SerializableColor::from_hex("#12"), None);
        assert_eq!(SerializableColor::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_color_css() {
        assert_eq!(SerializableColor::rgb(255, 0, 16).to_css(), "#ff0010");
        assert_eq!(
            SerializableColor::new(0, 0, 0, 0).to_css(),
            "rgba(0, 0, 0, 0.000)"
        );
    }

    #[test]
    fn test_peniko_round_trip() {
        let color = SerializableColor::rgb(59, 130, 246);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }

    #[test]
    fn test_nearest_index_prefers_later_on_tie() {
        let p = Point::new(3.0, 3.0);
        assert_eq!(nearest_index(&[p, p], p), 1);
        assert_eq!(
            nearest_index(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0)], Point::new(1.0, 0.0)),
            0
        );
    }

    #[test]
    fn test_shape_nodes_iter() {
        let nodes = ShapeNodes {
            root: NodeHandle(1),
            content: Some(NodeHandle(2)),
        };
        assert_eq!(nodes.all().collect::<Vec<_>>(), vec![NodeHandle(1), NodeHandle(2)]);
    }
}
