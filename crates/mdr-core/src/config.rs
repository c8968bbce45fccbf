//! Geometry contract constants and normalization options.

use crate::model::Canvas;
use serde::Deserialize;

// ─── Canvas ───────────────────────────────────────────────────────────────

pub const MIN_CANVAS: f64 = 100.0;
pub const MAX_CANVAS: f64 = 4000.0;

pub const DEFAULT_CANVAS_WIDTH: f64 = 900.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 450.0;
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Inset every primitive must respect after normalization.
pub const DEFAULT_MARGIN: f64 = 40.0;

// ─── Style defaults ───────────────────────────────────────────────────────

pub const DEFAULT_STROKE: &str = "#000000";
pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;
pub const DEFAULT_FILL: &str = "none";
pub const DEFAULT_FONT_FAMILY: &str = "Arial, system-ui, sans-serif";
pub const DEFAULT_FONT_SIZE: f64 = 18.0;

pub const MARKER_RADIUS: f64 = 4.0;
pub const MARKER_FILL: &str = "#000000";
pub const MARKER_STROKE: &str = "none";
pub const MARKER_STROKE_WIDTH: f64 = 1.0;

/// Average glyph advance as a fraction of font size, for label extents.
pub const LABEL_CHAR_WIDTH: f64 = 0.6;

// ─── Layout ───────────────────────────────────────────────────────────────

/// A vertex label closer than this to a vertex gets pushed outward.
pub const LABEL_PUSH_RADIUS: f64 = 18.0;
/// Distance from the vertex a pushed label ends up at.
pub const LABEL_PUSH_OFFSET: f64 = 16.0;

/// Clearance kept between shapes by the separation pass.
pub const SEPARATION_GAP: f64 = 24.0;
/// Padding around a shape's bounds when collecting annotations that travel with it.
pub const ANNOTATION_PAD: f64 = 24.0;

// ─── Links ────────────────────────────────────────────────────────────────

/// Per-axis tolerance for a point marker to count as sitting on a segment endpoint.
pub const ENDPOINT_EPSILON: f64 = 0.75;
/// Radius around a polygon vertex inside which a vertex label is linked.
pub const VERTEX_LABEL_RADIUS: f64 = 26.0;

// ─── Options ──────────────────────────────────────────────────────────────

/// Options for `normalize`.
///
/// The layout flags are plain booleans: deciding them from free text is the
/// caller's job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizeOptions {
    /// Authoritative drawing surface. The scene's canvas is pinned to it.
    pub canvas: Canvas,

    /// Inset from every canvas edge. Default: **40**.
    pub margin: f64,

    /// Skip the separation pass. Default: **true**, so overlapping shapes
    /// are left alone unless the caller opts in.
    pub allow_touching: bool,

    /// Arrange the first two shapes of the same kind into left/right slots.
    /// Default: **false**.
    pub wants_two: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            margin: DEFAULT_MARGIN,
            allow_touching: true,
            wants_two: false,
        }
    }
}

impl NormalizeOptions {
    /// Options pinned to an existing canvas.
    pub fn for_canvas(canvas: Canvas) -> Self {
        Self {
            canvas,
            ..Self::default()
        }
    }
}
