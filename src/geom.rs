//! Pure geometry helpers: points, rectangles, rotation about a pivot.
//!
//! All angles are in degrees. Canonical space has Y growing downward, so a
//! positive angle turns clockwise on screen.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in canonical, screen, or surface-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise sum `self + other`.
    #[must_use]
    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

/// Width and height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle with top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized rectangle spanned by two corners in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Inclusive containment test on all four edges.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Rotate `(x, y)` about `(center_x, center_y)` by `angle_deg` degrees.
///
/// The angle is reduced modulo 360 first, so `0`, `360`, `-720` all return the
/// input unchanged rather than accumulating trig error.
#[must_use]
pub fn rotate_point(x: f64, y: f64, center_x: f64, center_y: f64, angle_deg: f64) -> Point {
    let reduced = angle_deg.rem_euclid(360.0);
    if reduced == 0.0 || !reduced.is_finite() {
        return Point::new(x, y);
    }
    let (sin, cos) = reduced.to_radians().sin_cos();
    let dx = x - center_x;
    let dy = y - center_y;
    Point::new(center_x + dx * cos - dy * sin, center_y + dx * sin + dy * cos)
}

/// Angle in degrees of the ray from `(center_x, center_y)` to `(px, py)`.
///
/// Range is `(-180, 180]`; 0 points along +X and 90 points down.
#[must_use]
pub fn angle_of(center_x: f64, center_y: f64, px: f64, py: f64) -> f64 {
    (py - center_y).atan2(px - center_x).to_degrees()
}

/// Rotation produced by a rotate-drag: start rotation plus the pointer's
/// angular travel about the pivot. Unbounded; no wrapping is applied.
#[must_use]
pub fn drag_rotation(rotation_at_start: f64, angle_at_start: f64, angle_now: f64) -> f64 {
    rotation_at_start + (angle_now - angle_at_start)
}
