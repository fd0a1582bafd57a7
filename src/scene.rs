//! Scene model: overlay images, drawable regions, and the in-memory store.
//!
//! This module defines what sits on the layout canvas: `CanonicalImage` (an
//! uploaded raster placed in canonical space, optionally pivoted and carrying a
//! pen tip) and `DrawableRegion` (a fixed viewport onto scrollable kymograph
//! paper). `Scene` owns both collections plus the base image that defines the
//! canonical canvas bounds.
//!
//! Images and regions share one id namespace and one z-order. Draw order is
//! ascending `z_index`, ties broken by insertion order. The association between
//! a pen tip and the paper it writes on is purely geometric and is never stored.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::consts::{BACKING_WIDTH_FACTOR, CASCADE_STEP_PX, CASCADE_WRAP};
use crate::geom::{Point, Rect, Size, rotate_point};

/// Caller-supplied unique token identifying an image or region.
pub type ItemId = String;

/// Error returned by scene mutations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("no image or region with id {0}")]
    UnknownItem(ItemId),
    #[error("id already in use: {0}")]
    DuplicateId(ItemId),
    #[error("image {0} has no pivot; set a pivot before placing a pen tip")]
    PenTipWithoutPivot(ItemId),
}

/// The base image that defines the canonical canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseImage {
    /// Opaque payload reference (URL or data URL).
    pub reference: String,
    pub width: f64,
    pub height: f64,
}

/// An uploaded raster placed in canonical space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalImage {
    pub id: ItemId,
    /// Opaque payload reference.
    pub url: String,
    /// Left edge in canonical pixels.
    pub x: f64,
    /// Top edge in canonical pixels.
    pub y: f64,
    /// Natural width of the source asset; fixed at creation.
    pub width: f64,
    /// Natural height of the source asset; fixed at creation.
    pub height: f64,
    pub z_index: i64,
    /// Clockwise rotation in degrees about `pivot`.
    pub rotation: f64,
    /// Rotation center in canonical space. `None` means rotation is not configured.
    pub pivot: Option<Point>,
    /// Pen tip relative to the unrotated top-left corner.
    pub pen_tip_offset: Option<Point>,
}

impl CanonicalImage {
    #[must_use]
    pub fn new(id: impl Into<ItemId>, url: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            z_index: 0,
            rotation: 0.0,
            pivot: None,
            pen_tip_offset: None,
        }
    }

    /// Unrotated bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// World position of the pen tip at the image's current rotation.
    #[must_use]
    pub fn pen_tip(&self) -> Option<Point> {
        self.pen_tip_at(self.rotation)
    }

    /// World position of the pen tip if the image were rotated to `rotation`.
    ///
    /// `None` unless both a pivot and a pen tip offset are configured.
    #[must_use]
    pub fn pen_tip_at(&self, rotation: f64) -> Option<Point> {
        let pivot = self.pivot?;
        let offset = self.pen_tip_offset?;
        let unrotated = self.top_left().add(offset);
        Some(rotate_point(unrotated.x, unrotated.y, pivot.x, pivot.y, rotation))
    }
}

/// A fixed-position viewport onto horizontally scrollable paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableRegion {
    pub id: ItemId,
    pub x: f64,
    pub y: f64,
    /// Visible viewport width.
    pub width: f64,
    /// Visible viewport height; also the backing surface height.
    pub height: f64,
    /// Nominal logical width; the backing surface starts at three times this.
    pub scroll_width: f64,
    pub z_index: i64,
    /// Paper background as `#rgb` or `#rrggbb`.
    pub color: String,
}

impl DrawableRegion {
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Width the backing surface is allocated at on first mount.
    #[must_use]
    pub fn initial_backing_width(&self) -> f64 {
        (self.scroll_width * BACKING_WIDTH_FACTOR).max(self.width)
    }
}

/// Borrowed view of either kind of scene item, for ordered iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneItem<'a> {
    Image(&'a CanonicalImage),
    Region(&'a DrawableRegion),
}

impl<'a> SceneItem<'a> {
    #[must_use]
    pub fn id(&self) -> &'a str {
        match self {
            Self::Image(img) => &img.id,
            Self::Region(region) => &region.id,
        }
    }

    #[must_use]
    pub fn z_index(&self) -> i64 {
        match self {
            Self::Image(img) => img.z_index,
            Self::Region(region) => region.z_index,
        }
    }
}

/// Direction for [`Scene::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    /// Toward the viewer (swap with the next item up).
    Forward,
    /// Away from the viewer (swap with the next item down).
    Backward,
}

/// In-memory scene: base image, overlay images, and drawable regions.
#[derive(Debug, Clone)]
pub struct Scene {
    base: Option<BaseImage>,
    canvas: Size,
    images: HashMap<ItemId, CanonicalImage>,
    regions: HashMap<ItemId, DrawableRegion>,
    /// Insertion sequence per id, for z-order tie breaking.
    inserted: HashMap<ItemId, u64>,
    next_seq: u64,
    uploads: usize,
}

impl Scene {
    /// Create an empty scene whose canvas defaults to `canvas` until a base image is set.
    #[must_use]
    pub fn new(canvas: Size) -> Self {
        Self {
            base: None,
            canvas,
            images: HashMap::new(),
            regions: HashMap::new(),
            inserted: HashMap::new(),
            next_seq: 0,
            uploads: 0,
        }
    }

    // --- Base image ---

    /// Set the base image; its dimensions become the canonical canvas bounds.
    pub fn set_base_image(&mut self, base: BaseImage) {
        self.canvas = Size::new(base.width, base.height);
        self.base = Some(base);
    }

    #[must_use]
    pub fn base_image(&self) -> Option<&BaseImage> {
        self.base.as_ref()
    }

    /// Canonical canvas dimensions used for clamping.
    #[must_use]
    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    // --- Images ---

    /// Insert a fully specified image.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateId`] if the id is taken by any image or region, and
    /// [`SceneError::PenTipWithoutPivot`] if the image carries a pen tip but no pivot.
    pub fn add_image(&mut self, image: CanonicalImage) -> Result<(), SceneError> {
        self.claim_id(&image.id)?;
        if image.pen_tip_offset.is_some() && image.pivot.is_none() {
            self.inserted.remove(&image.id);
            return Err(SceneError::PenTipWithoutPivot(image.id));
        }
        self.images.insert(image.id.clone(), image);
        Ok(())
    }

    /// Insert a freshly uploaded asset at the next cascading position, on top of
    /// every existing item.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateId`] if the id is taken.
    pub fn add_uploaded_image(
        &mut self,
        id: impl Into<ItemId>,
        url: impl Into<String>,
        width: f64,
        height: f64,
    ) -> Result<&CanonicalImage, SceneError> {
        let mut image = CanonicalImage::new(id, url, width, height);
        let step = (self.uploads % CASCADE_WRAP) as f64 * CASCADE_STEP_PX;
        image.x = step;
        image.y = step;
        image.z_index = self.next_z();
        let id = image.id.clone();
        self.add_image(image)?;
        self.uploads += 1;
        self.images.get(&id).ok_or(SceneError::UnknownItem(id))
    }

    /// Remove an image, returning it.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id.
    pub fn remove_image(&mut self, id: &str) -> Result<CanonicalImage, SceneError> {
        let image = self
            .images
            .remove(id)
            .ok_or_else(|| SceneError::UnknownItem(id.to_owned()))?;
        self.inserted.remove(id);
        Ok(image)
    }

    #[must_use]
    pub fn image(&self, id: &str) -> Option<&CanonicalImage> {
        self.images.get(id)
    }

    /// Images in draw order.
    #[must_use]
    pub fn images(&self) -> Vec<&CanonicalImage> {
        let mut images: Vec<&CanonicalImage> = self.images.values().collect();
        images.sort_by_key(|img| (img.z_index, self.seq(&img.id)));
        images
    }

    /// Move an image so its top-left lands at `(x, y)`, clamped so the whole
    /// image stays on the canvas. Returns the applied position.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id.
    pub fn move_image(&mut self, id: &str, x: f64, y: f64) -> Result<Point, SceneError> {
        let canvas = self.canvas;
        let image = self.image_mut(id)?;
        image.x = clamp_axis(x, image.width, canvas.width);
        image.y = clamp_axis(y, image.height, canvas.height);
        Ok(image.top_left())
    }

    /// Set an image position from numeric entry. Not clamped.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id.
    pub fn set_image_position(&mut self, id: &str, x: f64, y: f64) -> Result<(), SceneError> {
        let image = self.image_mut(id)?;
        image.x = x;
        image.y = y;
        Ok(())
    }

    /// Shift an image by `(dx, dy)` with the same clamping as [`Self::move_image`].
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id.
    pub fn nudge_image(&mut self, id: &str, dx: f64, dy: f64) -> Result<Point, SceneError> {
        let current = self
            .image(id)
            .map(CanonicalImage::top_left)
            .ok_or_else(|| SceneError::UnknownItem(id.to_owned()))?;
        self.move_image(id, current.x + dx, current.y + dy)
    }

    /// Set the absolute rotation pivot.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id.
    pub fn set_pivot(&mut self, id: &str, x: f64, y: f64) -> Result<(), SceneError> {
        self.image_mut(id)?.pivot = Some(Point::new(x, y));
        Ok(())
    }

    /// Remove the pivot. The pen tip goes with it, since it cannot exist alone.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id.
    pub fn clear_pivot(&mut self, id: &str) -> Result<(), SceneError> {
        let image = self.image_mut(id)?;
        image.pivot = None;
        image.pen_tip_offset = None;
        Ok(())
    }

    /// Set the pen tip offset relative to the image's top-left.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id, and
    /// [`SceneError::PenTipWithoutPivot`] if no pivot is configured.
    pub fn set_pen_tip_offset(&mut self, id: &str, dx: f64, dy: f64) -> Result<(), SceneError> {
        let image = self.image_mut(id)?;
        if image.pivot.is_none() {
            return Err(SceneError::PenTipWithoutPivot(id.to_owned()));
        }
        image.pen_tip_offset = Some(Point::new(dx, dy));
        Ok(())
    }

    /// Set the image rotation in degrees. Unbounded.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no image has this id.
    pub fn set_rotation(&mut self, id: &str, degrees: f64) -> Result<(), SceneError> {
        self.image_mut(id)?.rotation = degrees;
        Ok(())
    }

    /// Return every image to 0 degrees.
    pub fn reset_rotations(&mut self) {
        for image in self.images.values_mut() {
            image.rotation = 0.0;
        }
    }

    fn image_mut(&mut self, id: &str) -> Result<&mut CanonicalImage, SceneError> {
        self.images
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownItem(id.to_owned()))
    }

    // --- Regions ---

    /// Insert a drawable region.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateId`] if the id is taken by any image or region.
    pub fn add_region(&mut self, region: DrawableRegion) -> Result<(), SceneError> {
        self.claim_id(&region.id)?;
        self.regions.insert(region.id.clone(), region);
        Ok(())
    }

    /// Remove a region, returning it.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no region has this id.
    pub fn remove_region(&mut self, id: &str) -> Result<DrawableRegion, SceneError> {
        let region = self
            .regions
            .remove(id)
            .ok_or_else(|| SceneError::UnknownItem(id.to_owned()))?;
        self.inserted.remove(id);
        Ok(region)
    }

    #[must_use]
    pub fn region(&self, id: &str) -> Option<&DrawableRegion> {
        self.regions.get(id)
    }

    /// Regions in draw order.
    #[must_use]
    pub fn regions(&self) -> Vec<&DrawableRegion> {
        let mut regions: Vec<&DrawableRegion> = self.regions.values().collect();
        regions.sort_by_key(|r| (r.z_index, self.seq(&r.id)));
        regions
    }

    /// Move a region on the layout canvas, clamped like images.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if no region has this id.
    pub fn move_region(&mut self, id: &str, x: f64, y: f64) -> Result<Point, SceneError> {
        let canvas = self.canvas;
        let region = self
            .regions
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownItem(id.to_owned()))?;
        region.x = clamp_axis(x, region.width, canvas.width);
        region.y = clamp_axis(y, region.height, canvas.height);
        Ok(Point::new(region.x, region.y))
    }

    // --- Ordering ---

    /// Highest `z_index` across all images and regions, or `None` when empty.
    #[must_use]
    pub fn max_z(&self) -> Option<i64> {
        let images = self.images.values().map(|img| img.z_index);
        let regions = self.regions.values().map(|r| r.z_index);
        images.chain(regions).max()
    }

    /// `z_index` for a new item placed above everything else.
    #[must_use]
    pub fn next_z(&self) -> i64 {
        self.max_z().map_or(0, |z| z + 1)
    }

    /// All items in draw order: ascending `z_index`, then insertion order.
    #[must_use]
    pub fn sorted_items(&self) -> Vec<SceneItem<'_>> {
        let mut items: Vec<SceneItem<'_>> = self
            .images
            .values()
            .map(SceneItem::Image)
            .chain(self.regions.values().map(SceneItem::Region))
            .collect();
        items.sort_by_key(|item| (item.z_index(), self.seq(item.id())));
        items
    }

    /// Swap `z_index` with the immediate neighbour in draw order.
    ///
    /// Returns `false` when the item is already at that end of the stack. When the
    /// neighbour shares the same `z_index` the swap is a no-op on values.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if the id is not in the scene.
    pub fn reorder(&mut self, id: &str, direction: ReorderDirection) -> Result<bool, SceneError> {
        let (mine, theirs) = {
            let items = self.sorted_items();
            let Some(pos) = items.iter().position(|item| item.id() == id) else {
                return Err(SceneError::UnknownItem(id.to_owned()));
            };
            let neighbour = match direction {
                ReorderDirection::Forward => items.get(pos + 1),
                ReorderDirection::Backward => pos.checked_sub(1).and_then(|p| items.get(p)),
            };
            let Some(neighbour) = neighbour else {
                return Ok(false);
            };
            (
                (items[pos].id().to_owned(), items[pos].z_index()),
                (neighbour.id().to_owned(), neighbour.z_index()),
            )
        };
        self.set_z(&mine.0, theirs.1);
        self.set_z(&theirs.0, mine.1);
        Ok(true)
    }

    fn set_z(&mut self, id: &str, z: i64) {
        if let Some(image) = self.images.get_mut(id) {
            image.z_index = z;
        } else if let Some(region) = self.regions.get_mut(id) {
            region.z_index = z;
        }
    }

    // --- Bookkeeping ---

    /// Number of images plus regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len() + self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.regions.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inserted.contains_key(id)
    }

    fn claim_id(&mut self, id: &str) -> Result<(), SceneError> {
        if self.inserted.contains_key(id) {
            return Err(SceneError::DuplicateId(id.to_owned()));
        }
        self.inserted.insert(id.to_owned(), self.next_seq);
        self.next_seq += 1;
        Ok(())
    }

    fn seq(&self, id: &str) -> u64 {
        self.inserted.get(id).copied().unwrap_or(u64::MAX)
    }
}

/// Clamp a leading edge so `[pos, pos + extent]` stays within `[0, limit]`.
/// Items larger than the canvas pin to 0.
fn clamp_axis(pos: f64, extent: f64, limit: f64) -> f64 {
    pos.clamp(0.0, (limit - extent).max(0.0))
}
