//! Shared numeric constants for the kymograph engine.

// ── Layout ──────────────────────────────────────────────────────

/// Spacing of the reference grid drawn on fresh paper, in canonical pixels.
pub const GRID_SPACING_PX: f64 = 50.0;

/// The backing surface grows once a draw lands within this many pixels of its
/// right edge.
pub const GROWTH_MARGIN_PX: f64 = 200.0;

/// Initial backing width is `scroll_width` times this factor.
pub const BACKING_WIDTH_FACTOR: f64 = 3.0;

/// A region created by dragging gets a `scroll_width` of its width times this factor.
pub const SCROLL_WIDTH_FACTOR: f64 = 3.0;

/// Regions narrower or shorter than this are discarded on creation.
pub const MIN_REGION_SIZE_PX: f64 = 20.0;

/// Diagonal step between successive default image positions.
pub const CASCADE_STEP_PX: f64 = 20.0;

/// Number of cascade steps before the default position wraps back to the origin.
pub const CASCADE_WRAP: usize = 10;

/// Canonical canvas size used before any base image is loaded.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

// ── Keyboard ────────────────────────────────────────────────────

/// Arrow-key nudge distance without a modifier.
pub const NUDGE_STEP_PX: f64 = 1.0;

/// Arrow-key nudge distance with Shift held.
pub const NUDGE_STEP_LARGE_PX: f64 = 10.0;

// ── Strokes ─────────────────────────────────────────────────────

/// Background used when a region's color string cannot be parsed.
pub const DEFAULT_PAPER_COLOR: &str = "#ffffff";

/// Reference grid line color.
pub const GRID_COLOR: (u8, u8, u8) = (224, 224, 224);

/// Injection trace color (red).
pub const INJECT_STROKE_COLOR: (u8, u8, u8) = (220, 38, 38);

/// Wash trace color (blue).
pub const WASH_STROKE_COLOR: (u8, u8, u8) = (37, 99, 235);

/// Trace width in canonical pixels.
pub const TRACE_WIDTH_PX: f32 = 2.0;
