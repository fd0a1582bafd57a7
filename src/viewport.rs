#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::geom::{Point, Size};

/// Smallest scale the fit will produce, so screen -> canonical never divides by zero.
pub const MIN_SCALE: f64 = 0.01;

/// Uniform display scale between canonical space and the on-screen container.
///
/// Canonical content is only ever shrunk to fit, never magnified. `origin` is the
/// container's top-left in screen pixels (CSS pixels in a browser host).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Point,
    scale: f64,
    content: Size,
    container: Size,
    padding: f64,
    max_height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(padding: f64, max_height: f64) -> Self {
        Self {
            origin: Point::default(),
            scale: 1.0,
            content: Size::default(),
            container: Size::default(),
            padding,
            max_height,
        }
    }

    /// `min(avail_w / content_w, avail_h / content_h, 1)`, where the available box
    /// is the container minus horizontal padding, with height capped at `max_height`.
    #[must_use]
    pub fn fit_scale(content: Size, container: Size, padding: f64, max_height: f64) -> f64 {
        if content.width <= 0.0 || content.height <= 0.0 {
            return 1.0;
        }
        let avail_w = (container.width - padding).max(0.0);
        let avail_h = container.height.min(max_height).max(0.0);
        let scale = (avail_w / content.width).min(avail_h / content.height).min(1.0);
        if scale.is_finite() { scale.max(MIN_SCALE) } else { 1.0 }
    }

    /// Set canonical content dimensions (the base image) and refit.
    pub fn set_content(&mut self, content: Size) {
        self.content = content;
        self.refit();
    }

    /// Set the container's screen origin and size and refit.
    pub fn set_container(&mut self, origin: Point, size: Size) {
        self.origin = origin;
        self.container = size;
        self.refit();
    }

    fn refit(&mut self) {
        self.scale = Self::fit_scale(self.content, self.container, self.padding, self.max_height);
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn content(&self) -> Size {
        self.content
    }

    /// On-screen size of the scaled content.
    #[must_use]
    pub fn display_size(&self) -> Size {
        Size::new(self.content.width * self.scale, self.content.height * self.scale)
    }

    /// Convert a screen-space pointer position to canonical coordinates.
    #[must_use]
    pub fn screen_to_canonical(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.origin.x) / self.scale,
            y: (screen.y - self.origin.y) / self.scale,
        }
    }

    /// Convert a canonical point to screen coordinates.
    #[must_use]
    pub fn canonical_to_screen(&self, canonical: Point) -> Point {
        Point {
            x: canonical.x * self.scale + self.origin.x,
            y: canonical.y * self.scale + self.origin.y,
        }
    }

    /// Convert a screen-space distance to canonical distance.
    #[must_use]
    pub fn screen_dist_to_canonical(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Convert a canonical distance (e.g. a region's scroll offset) to screen pixels.
    #[must_use]
    pub fn canonical_dist_to_screen(&self, canonical_dist: f64) -> f64 {
        canonical_dist * self.scale
    }
}
