//! Drawing surfaces: one growable raster per drawable region.
//!
//! A `Surface` is the backing buffer behind a region's visible viewport. It is
//! wider than the viewport, scrolls horizontally, and only ever grows. Every
//! stroke drawn on it is also kept in an ordered list, so the raster can be
//! rebuilt (e.g. after undoing a stroke) and the per-region pen continuity lives
//! on the surface itself rather than in shared state.
//!
//! `SurfaceManager` owns the surfaces keyed by region id. Allocation is lazy: a
//! region is registered when it enters the scene and allocated when the host
//! mounts it. Draw, grow, and scroll calls that arrive in between are queued and
//! replayed in order once the surface exists.
//!
//! All coordinates here are backing-surface local, in canonical pixels.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use std::collections::{HashMap, HashSet};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tiny_skia::{Color, FillRule, LineCap, Paint, PathBuilder, Pixmap, Rect as SkRect, Stroke, Transform};

use crate::color::paper_rgb;
use crate::consts::{
    GRID_COLOR, GRID_SPACING_PX, GROWTH_MARGIN_PX, INJECT_STROKE_COLOR, TRACE_WIDTH_PX, WASH_STROKE_COLOR,
};
use crate::geom::Point;
use crate::scene::{DrawableRegion, ItemId};

/// Upper bound on backing width; growth past this fails instead of allocating.
pub const MAX_BACKING_WIDTH: u32 = 1 << 16;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Error returned by surface allocation and snapshot codecs.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("cannot allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("failed to decode snapshot: {0}")]
    Decode(String),
    #[error("snapshot is not a PNG data URL")]
    BadDataUrl,
    #[error("snapshot base64 is invalid: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Color and width of one stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub rgb: (u8, u8, u8),
    pub width: f32,
}

impl StrokeStyle {
    /// Red trace drawn while an injection runs.
    #[must_use]
    pub fn injection() -> Self {
        Self { rgb: INJECT_STROKE_COLOR, width: TRACE_WIDTH_PX }
    }

    /// Blue segment drawn when a wash completes.
    #[must_use]
    pub fn wash() -> Self {
        Self { rgb: WASH_STROKE_COLOR, width: TRACE_WIDTH_PX }
    }
}

/// One recorded stroke. `from: None` is a dot at `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeRecord {
    pub from: Option<Point>,
    pub to: Point,
    pub style: StrokeStyle,
}

/// Backing raster for one drawable region.
pub struct Surface {
    pixmap: Pixmap,
    paper: (u8, u8, u8),
    viewport_width: f64,
    scroll: f64,
    last_point: Option<Point>,
    strokes: Vec<StrokeRecord>,
    /// Restored snapshot, painted under the stroke list on rebuild.
    base: Option<Pixmap>,
}

impl Surface {
    /// Allocate a fresh surface for `region`: paper fill plus reference grid.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Allocation`] if the dimensions are zero or too large.
    pub fn new(region: &DrawableRegion) -> Result<Self, SurfaceError> {
        let width = px(region.initial_backing_width());
        let height = px(region.height);
        let mut surface = Self {
            pixmap: alloc(width, height)?,
            paper: paper_rgb(&region.color),
            viewport_width: region.width,
            scroll: 0.0,
            last_point: None,
            strokes: Vec::new(),
            base: None,
        };
        surface.paint_paper(0, width);
        Ok(surface)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Current horizontal scroll offset in canonical pixels.
    #[must_use]
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    /// Largest valid scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (f64::from(self.width()) - self.viewport_width).max(0.0)
    }

    #[must_use]
    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    /// Forget the last drawn point; the next segment starts with a dot.
    pub fn clear_last_point(&mut self) {
        self.last_point = None;
    }

    #[must_use]
    pub fn strokes(&self) -> &[StrokeRecord] {
        &self.strokes
    }

    /// RGBA of one backing pixel. Paper is opaque, so channels are unpremultiplied.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?;
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Raw premultiplied RGBA bytes of the whole backing surface.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Double the width until `required_width` clears the growth margin.
    ///
    /// Existing pixels are copied unchanged; only the new columns receive paper
    /// and grid. Returns whether the surface grew.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Allocation`] if the width would exceed [`MAX_BACKING_WIDTH`].
    pub fn grow_if_needed(&mut self, required_width: f64) -> Result<bool, SurfaceError> {
        let old_width = self.width();
        let mut new_width = old_width;
        while required_width > f64::from(new_width) - GROWTH_MARGIN_PX {
            new_width = new_width.saturating_mul(2);
            if new_width > MAX_BACKING_WIDTH {
                return Err(SurfaceError::Allocation { width: new_width, height: self.height() });
            }
        }
        if new_width == old_width {
            return Ok(false);
        }

        let mut grown = alloc(new_width, self.height())?;
        copy_columns(&self.pixmap, &mut grown);
        self.pixmap = grown;
        self.paint_paper(old_width, new_width);
        tracing::debug!(from = old_width, to = new_width, "surface grew");
        Ok(true)
    }

    /// Stroke from the last drawn point to `to`, or stamp a dot when there is none.
    pub fn draw_segment(&mut self, to: Point, style: StrokeStyle) {
        let record = StrokeRecord { from: self.last_point, to, style };
        self.paint_stroke(&record);
        self.strokes.push(record);
        self.last_point = Some(to);
    }

    /// Stroke an explicit `from -> to` line and continue from `to`.
    pub fn draw_line(&mut self, from: Point, to: Point, style: StrokeStyle) {
        let record = StrokeRecord { from: Some(from), to, style };
        self.paint_stroke(&record);
        self.strokes.push(record);
        self.last_point = Some(to);
    }

    /// Clamp to `[0, backing_width - viewport_width]` and store. Returns the applied offset.
    pub fn scroll_to(&mut self, offset: f64) -> f64 {
        let clamped = if offset.is_finite() { offset.clamp(0.0, self.max_scroll()) } else { 0.0 };
        self.scroll = clamped;
        clamped
    }

    /// Encode the backing raster as PNG.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Encode`] if the PNG encoder fails.
    pub fn snapshot_png(&self) -> Result<Vec<u8>, SurfaceError> {
        self.pixmap.encode_png().map_err(|e| SurfaceError::Encode(e.to_string()))
    }

    /// Replace content with a decoded PNG snapshot.
    ///
    /// The surface keeps its width if the snapshot is narrower (the uncovered
    /// columns get fresh paper and grid) and widens to fit a wider snapshot. The
    /// stroke list is cleared: the snapshot becomes the new base layer.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Decode`] for malformed PNG data.
    pub fn restore_png(&mut self, bytes: &[u8]) -> Result<(), SurfaceError> {
        let decoded = Pixmap::decode_png(bytes).map_err(|e| SurfaceError::Decode(e.to_string()))?;
        let width = self.width().max(decoded.width());
        let mut restored = alloc(width, self.height())?;
        fill_paper(&mut restored, self.paper, 0, width);
        copy_columns(&decoded, &mut restored);
        self.pixmap = restored;
        if decoded.width() < width {
            paint_grid(&mut self.pixmap, decoded.width(), width);
        }
        self.base = Some(decoded);
        self.strokes.clear();
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
        Ok(())
    }

    /// Wipe back to fresh gridded paper at the current width, forgetting strokes,
    /// the restored base layer, scroll, and pen continuity.
    pub fn clear(&mut self) {
        self.base = None;
        self.strokes.clear();
        self.last_point = None;
        self.scroll = 0.0;
        let width = self.width();
        self.paint_paper(0, width);
    }

    /// Drop the most recent stroke and rebuild the raster from what remains.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo_last_stroke(&mut self) -> bool {
        if self.strokes.pop().is_none() {
            return false;
        }
        self.last_point = self.strokes.last().map(|s| s.to);
        self.rebuild();
        true
    }

    /// Repaint the raster from paper, the base layer, and the stroke list.
    pub fn rebuild(&mut self) {
        let width = self.width();
        match self.base.take() {
            Some(base) => {
                fill_paper(&mut self.pixmap, self.paper, 0, width);
                copy_columns(&base, &mut self.pixmap);
                if base.width() < width {
                    paint_grid(&mut self.pixmap, base.width(), width);
                }
                self.base = Some(base);
            }
            None => self.paint_paper(0, width),
        }
        let strokes = std::mem::take(&mut self.strokes);
        for record in &strokes {
            self.paint_stroke(record);
        }
        self.strokes = strokes;
    }

    fn paint_paper(&mut self, from_x: u32, to_x: u32) {
        fill_paper(&mut self.pixmap, self.paper, from_x, to_x);
        paint_grid(&mut self.pixmap, from_x, to_x);
    }

    fn paint_stroke(&mut self, record: &StrokeRecord) {
        let mut paint = Paint::default();
        let (r, g, b) = record.style.rgb;
        paint.set_color(Color::from_rgba8(r, g, b, 255));
        paint.anti_alias = true;

        let to = record.to;
        match record.from {
            Some(from) if from != to => {
                let mut pb = PathBuilder::new();
                pb.move_to(from.x as f32, from.y as f32);
                pb.line_to(to.x as f32, to.y as f32);
                let Some(path) = pb.finish() else {
                    return;
                };
                let stroke = Stroke { width: record.style.width, line_cap: LineCap::Round, ..Stroke::default() };
                self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            _ => {
                let radius = (record.style.width / 2.0).max(0.5);
                let Some(path) = PathBuilder::from_circle(to.x as f32, to.y as f32, radius) else {
                    return;
                };
                self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
    }
}

/// Queued operation for a registered region whose surface is not allocated yet.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingOp {
    Grow(f64),
    Segment { to: Point, style: StrokeStyle },
    Line { from: Point, to: Point, style: StrokeStyle },
    ScrollTo(f64),
}

/// Owns every region's backing surface.
#[derive(Default)]
pub struct SurfaceManager {
    surfaces: HashMap<ItemId, Surface>,
    registered: HashSet<ItemId>,
    pending: HashMap<ItemId, Vec<PendingOp>>,
}

impl SurfaceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a region known without allocating its surface.
    pub fn register(&mut self, region_id: &str) {
        self.registered.insert(region_id.to_owned());
    }

    /// Forget a region: its surface and any queued work are dropped.
    pub fn unregister(&mut self, region_id: &str) {
        self.registered.remove(region_id);
        self.surfaces.remove(region_id);
        self.pending.remove(region_id);
    }

    #[must_use]
    pub fn is_initialized(&self, region_id: &str) -> bool {
        self.surfaces.contains_key(region_id)
    }

    #[must_use]
    pub fn surface(&self, region_id: &str) -> Option<&Surface> {
        self.surfaces.get(region_id)
    }

    /// Number of operations waiting for a region to be mounted.
    #[must_use]
    pub fn pending_len(&self, region_id: &str) -> usize {
        self.pending.get(region_id).map_or(0, Vec::len)
    }

    /// Allocate the region's surface if needed, then replay queued work.
    ///
    /// Returns `true` when a new surface was allocated.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Allocation`] if the surface cannot be created.
    pub fn ensure_initialized(&mut self, region: &DrawableRegion) -> Result<bool, SurfaceError> {
        self.mount(region, None)
    }

    /// Like [`Self::ensure_initialized`], but paints `snapshot` instead of the grid
    /// on a fresh allocation. An already allocated surface is restored in place.
    ///
    /// # Errors
    ///
    /// Allocation and decode failures. On decode failure a fresh allocation keeps
    /// its gridded paper.
    pub fn mount(&mut self, region: &DrawableRegion, snapshot: Option<&[u8]>) -> Result<bool, SurfaceError> {
        self.registered.insert(region.id.clone());
        let created = !self.surfaces.contains_key(&region.id);
        if created {
            self.surfaces.insert(region.id.clone(), Surface::new(region)?);
            tracing::debug!(region = %region.id, "surface allocated");
        }
        let restored = match (snapshot, self.surfaces.get_mut(&region.id)) {
            (Some(bytes), Some(surface)) => surface.restore_png(bytes),
            _ => Ok(()),
        };
        if let Err(e) = &restored {
            tracing::warn!(region = %region.id, error = %e, "snapshot restore failed; keeping fresh paper");
        }
        self.flush_pending(&region.id)?;
        restored?;
        Ok(created)
    }

    fn flush_pending(&mut self, region_id: &str) -> Result<(), SurfaceError> {
        let Some(ops) = self.pending.remove(region_id) else {
            return Ok(());
        };
        let Some(surface) = self.surfaces.get_mut(region_id) else {
            return Ok(());
        };
        tracing::debug!(region = %region_id, count = ops.len(), "replaying deferred surface ops");
        for op in ops {
            match op {
                PendingOp::Grow(w) => {
                    surface.grow_if_needed(w)?;
                }
                PendingOp::Segment { to, style } => surface.draw_segment(to, style),
                PendingOp::Line { from, to, style } => surface.draw_line(from, to, style),
                PendingOp::ScrollTo(offset) => {
                    surface.scroll_to(offset);
                }
            }
        }
        Ok(())
    }

    /// Route an op to the live surface, queue it, or drop it for unknown regions.
    /// Returns the live surface when the op should be applied now.
    fn route(&mut self, region_id: &str, op: PendingOp) -> Option<&mut Surface> {
        if self.surfaces.contains_key(region_id) {
            return self.surfaces.get_mut(region_id);
        }
        if self.registered.contains(region_id) {
            self.pending.entry(region_id.to_owned()).or_default().push(op);
        } else {
            tracing::warn!(region = %region_id, "surface op for unknown region ignored");
        }
        None
    }

    /// See [`Surface::grow_if_needed`]. Deferred regions report `false`.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Allocation`] on oversize growth.
    pub fn grow_if_needed(&mut self, region_id: &str, required_width: f64) -> Result<bool, SurfaceError> {
        match self.route(region_id, PendingOp::Grow(required_width)) {
            Some(surface) => surface.grow_if_needed(required_width),
            None => Ok(false),
        }
    }

    /// See [`Surface::draw_segment`].
    pub fn draw_segment(&mut self, region_id: &str, to: Point, style: StrokeStyle) {
        if let Some(surface) = self.route(region_id, PendingOp::Segment { to, style }) {
            surface.draw_segment(to, style);
        }
    }

    /// See [`Surface::draw_line`].
    pub fn draw_line(&mut self, region_id: &str, from: Point, to: Point, style: StrokeStyle) {
        if let Some(surface) = self.route(region_id, PendingOp::Line { from, to, style }) {
            surface.draw_line(from, to, style);
        }
    }

    /// See [`Surface::scroll_to`]. Returns the applied offset, or `None` when deferred.
    pub fn scroll_to(&mut self, region_id: &str, offset: f64) -> Option<f64> {
        self.route(region_id, PendingOp::ScrollTo(offset))
            .map(|surface| surface.scroll_to(offset))
    }

    /// Current scroll offset; 0 for unallocated regions.
    #[must_use]
    pub fn scroll_offset(&self, region_id: &str) -> f64 {
        self.surfaces.get(region_id).map_or(0.0, Surface::scroll)
    }

    /// Last drawn point of an allocated region.
    #[must_use]
    pub fn last_point(&self, region_id: &str) -> Option<Point> {
        self.surfaces.get(region_id).and_then(Surface::last_point)
    }

    /// PNG bytes of an allocated region, `None` if it is not allocated.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Encode`] if encoding fails.
    pub fn snapshot(&self, region_id: &str) -> Result<Option<Vec<u8>>, SurfaceError> {
        self.surfaces.get(region_id).map(Surface::snapshot_png).transpose()
    }

    /// Snapshot as a `data:image/png;base64,...` string.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Encode`] if encoding fails.
    pub fn snapshot_data_url(&self, region_id: &str) -> Result<Option<String>, SurfaceError> {
        Ok(self
            .snapshot(region_id)?
            .map(|bytes| format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(bytes))))
    }

    /// Restore PNG bytes onto an allocated region. Unallocated regions are skipped.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Decode`] for malformed data; the surface is left untouched.
    pub fn restore(&mut self, region_id: &str, bytes: &[u8]) -> Result<bool, SurfaceError> {
        let Some(surface) = self.surfaces.get_mut(region_id) else {
            return Ok(false);
        };
        surface.restore_png(bytes)?;
        Ok(true)
    }

    /// Restore from a PNG data URL.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::BadDataUrl`] / [`SurfaceError::Base64`] for malformed strings,
    /// otherwise as [`Self::restore`].
    pub fn restore_data_url(&mut self, region_id: &str, data_url: &str) -> Result<bool, SurfaceError> {
        let bytes = decode_data_url(data_url)?;
        self.restore(region_id, &bytes)
    }

    /// Drop the last stroke of a region and rebuild its raster.
    pub fn undo_last_stroke(&mut self, region_id: &str) -> bool {
        self.surfaces
            .get_mut(region_id)
            .is_some_and(Surface::undo_last_stroke)
    }

    /// Experiment reset: every surface back to gridded paper, queues dropped.
    pub fn reset_all(&mut self) {
        for surface in self.surfaces.values_mut() {
            surface.clear();
        }
        self.pending.clear();
    }

    /// Ids of regions with an allocated surface.
    pub fn initialized_ids(&self) -> impl Iterator<Item = &str> {
        self.surfaces.keys().map(String::as_str)
    }
}

/// Decode a `data:image/png;base64,` URL into PNG bytes.
///
/// # Errors
///
/// [`SurfaceError::BadDataUrl`] when the prefix is missing, [`SurfaceError::Base64`]
/// when the payload is not valid base64.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, SurfaceError> {
    let payload = data_url
        .trim()
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or(SurfaceError::BadDataUrl)?;
    Ok(STANDARD.decode(payload)?)
}

fn px(len: f64) -> u32 {
    if len.is_finite() && len >= 1.0 { len.ceil().min(f64::from(MAX_BACKING_WIDTH)) as u32 } else { 1 }
}

fn alloc(width: u32, height: u32) -> Result<Pixmap, SurfaceError> {
    Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })
}

/// Copy `src` into the left columns of `dst` byte for byte. Rows or columns
/// beyond `dst` are cut off.
fn copy_columns(src: &Pixmap, dst: &mut Pixmap) {
    let src_stride = src.width() as usize * 4;
    let dst_stride = dst.width() as usize * 4;
    let row_bytes = src_stride.min(dst_stride);
    let rows = src.height().min(dst.height()) as usize;
    let src_data = src.data();
    let dst_data = dst.data_mut();
    for row in 0..rows {
        let s = row * src_stride;
        let d = row * dst_stride;
        dst_data[d..d + row_bytes].copy_from_slice(&src_data[s..s + row_bytes]);
    }
}

fn fill_paper(pixmap: &mut Pixmap, (r, g, b): (u8, u8, u8), from_x: u32, to_x: u32) {
    let Some(rect) = SkRect::from_xywh(from_x as f32, 0.0, to_x.saturating_sub(from_x) as f32, pixmap.height() as f32)
    else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(r, g, b, 255));
    paint.anti_alias = false;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

/// Grid lines every [`GRID_SPACING_PX`] restricted to columns `[from_x, to_x)`.
/// Vertical lines sit on absolute multiples of the spacing, so painting in
/// pieces gives the same result as painting the full width at once.
fn paint_grid(pixmap: &mut Pixmap, from_x: u32, to_x: u32) {
    if to_x <= from_x {
        return;
    }
    let mut paint = Paint::default();
    let (r, g, b) = GRID_COLOR;
    paint.set_color(Color::from_rgba8(r, g, b, 255));
    paint.anti_alias = false;

    let spacing = GRID_SPACING_PX as u32;
    let height = pixmap.height();
    let first = from_x.div_ceil(spacing) * spacing;
    let mut x = first;
    while x < to_x {
        if let Some(rect) = SkRect::from_xywh(x as f32, 0.0, 1.0, height as f32) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
        x += spacing;
    }
    let mut y = 0;
    while y < height {
        if let Some(rect) = SkRect::from_xywh(from_x as f32, y as f32, (to_x - from_x) as f32, 1.0) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
        y += spacing;
    }
}
