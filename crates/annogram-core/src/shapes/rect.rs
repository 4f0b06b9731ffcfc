//! Rectangle geometry with origin-anchored flipping.

use super::nearest_index;
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// Which axes are mirrored across the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

impl Flip {
    pub fn any(self) -> bool {
        self.x || self.y
    }
}

/// A rectangle anchored at the point where it was placed.
///
/// The `<rect>` node always starts at `origin` with a non-negative size. When
/// the pointer is above or left of the origin, the affected axis is mirrored
/// with a transform anchored at `2 * origin`, so the box flips across its
/// origin instead of collapsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectGeometry {
    pub origin: Point,
    /// Opposite corner, follows the pointer.
    pub corner: Point,
}

impl RectGeometry {
    pub fn new(at: Point) -> Self {
        Self {
            origin: at,
            corner: at,
        }
    }

    pub fn drag(&mut self, at: Point) {
        self.corner = at;
    }

    pub fn width(&self) -> f64 {
        (self.corner.x - self.origin.x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.corner.y - self.origin.y).abs()
    }

    pub fn flip(&self) -> Flip {
        Flip {
            x: self.corner.x < self.origin.x,
            y: self.corner.y < self.origin.y,
        }
    }

    /// Mirroring transform applied to the un-flipped box.
    pub fn transform(&self) -> Affine {
        let flip = self.flip();
        let (sx, tx) = if flip.x {
            (-1.0, 2.0 * self.origin.x)
        } else {
            (1.0, 0.0)
        };
        let (sy, ty) = if flip.y {
            (-1.0, 2.0 * self.origin.y)
        } else {
            (1.0, 0.0)
        };
        Affine::new([sx, 0.0, 0.0, sy, tx, ty])
    }

    /// The box as drawn before the transform.
    pub fn local_rect(&self) -> Rect {
        Rect::from_origin_size(self.origin, (self.width(), self.height()))
    }

    /// The box as it appears on screen.
    pub fn visual_bounds(&self) -> Rect {
        Rect::from_points(self.origin, self.corner)
    }

    /// Re-anchor for editing an existing box: grip the visual corner nearest
    /// to `at` and make the opposite corner the new origin.
    pub fn regrip(&mut self, at: Point) {
        let b = self.visual_bounds();
        let corners = [
            Point::new(b.x0, b.y0),
            Point::new(b.x1, b.y0),
            Point::new(b.x0, b.y1),
            Point::new(b.x1, b.y1),
        ];
        let nearest = nearest_index(&corners, at);
        self.origin = corners[3 - nearest];
        self.corner = corners[nearest];
    }

    /// SVG `transform` attribute value, `None` when no axis is flipped.
    pub fn svg_transform(&self) -> Option<String> {
        let flip = self.flip();
        if !flip.any() {
            return None;
        }
        let [sx, _, _, sy, tx, ty] = self.transform().as_coeffs();
        Some(format!("translate({} {}) scale({} {})", tx, ty, sx, sy))
    }

    /// SVG attributes of the `<rect>` node, excluding `transform`.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x", self.origin.x.to_string()),
            ("y", self.origin.y.to_string()),
            ("width", self.width().to_string()),
            ("height", self.height().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_down_right_no_flip() {
        let mut rect = RectGeometry::new(Point::new(10.0, 20.0));
        rect.drag(Point::new(110.0, 70.0));
        assert!((rect.width() - 100.0).abs() < f64::EPSILON);
        assert!((rect.height() - 50.0).abs() < f64::EPSILON);
        assert!(!rect.flip().any());
        assert!(rect.svg_transform().is_none());
        assert_eq!(rect.transform(), Affine::IDENTITY);
    }

    #[test]
    fn test_flip_both_axes() {
        let (x0, y0) = (50.0, 80.0);
        let (x1, y1) = (20.0, 30.0);
        let mut rect = RectGeometry::new(Point::new(x0, y0));
        rect.drag(Point::new(x1, y1));

        assert!((rect.width() - (x1 - x0).abs()).abs() < f64::EPSILON);
        assert!((rect.height() - (y1 - y0).abs()).abs() < f64::EPSILON);
        assert_eq!(rect.flip(), Flip { x: true, y: true });

        let [sx, _, _, sy, tx, ty] = rect.transform().as_coeffs();
        assert_eq!((sx, sy), (-1.0, -1.0));
        assert_eq!((tx, ty), (2.0 * x0, 2.0 * y0));
        assert_eq!(
            rect.svg_transform().as_deref(),
            Some("translate(100 160) scale(-1 -1)")
        );
    }

    #[test]
    fn test_flip_single_axis() {
        let mut rect = RectGeometry::new(Point::new(50.0, 50.0));
        rect.drag(Point::new(80.0, 10.0));
        assert_eq!(rect.flip(), Flip { x: false, y: true });
        assert_eq!(
            rect.svg_transform().as_deref(),
            Some("translate(0 100) scale(1 -1)")
        );
    }

    #[test]
    fn test_transform_maps_local_box_onto_visual_bounds() {
        let mut rect = RectGeometry::new(Point::new(50.0, 50.0));
        for target in [
            Point::new(10.0, 10.0),
            Point::new(90.0, 10.0),
            Point::new(10.0, 95.0),
            Point::new(70.0, 60.0),
        ] {
            rect.drag(target);
            let mapped = rect.transform().transform_rect_bbox(rect.local_rect());
            assert_eq!(mapped, rect.visual_bounds());
        }
    }

    #[test]
    fn test_regrip_keeps_visual_box() {
        let mut rect = RectGeometry::new(Point::new(10.0, 10.0));
        rect.drag(Point::new(50.0, 40.0));
        let before = rect.visual_bounds();

        // Near the top-left corner: bottom-right becomes the anchor
        rect.regrip(Point::new(12.0, 9.0));
        assert_eq!(rect.origin, Point::new(50.0, 40.0));
        assert_eq!(rect.corner, Point::new(10.0, 10.0));
        assert_eq!(rect.visual_bounds(), before);

        rect.drag(Point::new(0.0, 0.0));
        assert_eq!(rect.visual_bounds(), Rect::new(0.0, 0.0, 50.0, 40.0));
    }
}
