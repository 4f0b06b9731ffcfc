//! Line geometry.

use super::{Grip, nearest_index};
use kurbo::{Line as KurboLine, Point};
use serde::{Deserialize, Serialize};

/// Two free-floating endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    /// Endpoint 1, fixed at creation.
    pub start: Point,
    /// Endpoint 2, tracks the pointer while editing a new line.
    pub end: Point,
}

impl LineGeometry {
    /// A zero-length line seeded at the click point.
    pub fn new(at: Point) -> Self {
        Self { start: at, end: at }
    }

    pub fn from_points(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Pick the endpoint the user most likely wants to drag.
    ///
    /// Endpoint 1 wins only when strictly closer; ties go to endpoint 2 so a
    /// freshly created zero-length line always drags its far end.
    pub fn nearest_grip(&self, at: Point) -> Grip {
        match nearest_index(&[self.start, self.end], at) {
            0 => Grip::Start,
            _ => Grip::End,
        }
    }

    /// Move the gripped endpoint to `at`.
    pub fn drag(&mut self, grip: Grip, at: Point) {
        match grip {
            Grip::Start => self.start = at,
            _ => self.end = at,
        }
    }

    pub fn length(&self) -> f64 {
        self.as_kurbo().length()
    }

    pub fn as_kurbo(&self) -> KurboLine {
        KurboLine::new(self.start, self.end)
    }

    /// SVG attributes of the `<line>` node.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x1", self.start.x.to_string()),
            ("y1", self.start.y.to_string()),
            ("x2", self.end.x.to_string()),
            ("y2", self.end.y.to_string()),
        ]
    }
}
