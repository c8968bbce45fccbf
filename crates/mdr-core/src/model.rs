//! Core scene model for diagram documents.
//!
//! A `Scene` is a canvas, a block of style defaults, and seven ordered
//! collections of primitives. Insertion order is paint order, and a
//! primitive's index inside its collection is its identity for the whole
//! session: the renderer tags elements with `(kind, index)` and the
//! interaction engine addresses them the same way.

use crate::config::{
    DEFAULT_BACKGROUND, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_FILL,
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH,
    LABEL_CHAR_WIDTH, MARKER_FILL, MARKER_STROKE, MARKER_STROKE_WIDTH, MAX_CANVAS, MIN_CANVAS,
};
use crate::geom::{Bounds, clamp, round2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// A 2D coordinate, serialized as `[x, y]`.
pub type Xy = (f64, f64);

// ─── Canvas & defaults ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub bg: String,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            bg: DEFAULT_BACKGROUND.into(),
        }
    }
}

impl Canvas {
    /// Round and clamp a requested size into the supported range.
    /// `None` when either side is not finite.
    pub fn clamp_size(width: f64, height: f64) -> Option<(f64, f64)> {
        (width.is_finite() && height.is_finite()).then(|| {
            (
                clamp(width.round(), MIN_CANVAS, MAX_CANVAS),
                clamp(height.round(), MIN_CANVAS, MAX_CANVAS),
            )
        })
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(0.0, 0.0, self.width, self.height)
    }

    /// The region primitives must stay inside after normalization.
    pub fn inset(&self, margin: f64) -> Bounds {
        Bounds::new(
            margin,
            margin,
            (self.width - margin * 2.0).max(0.0),
            (self.height - margin * 2.0).max(0.0),
        )
    }
}

/// Scene-wide fallback styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub stroke: String,
    pub stroke_width: f64,
    pub fill: String,
    pub font_family: String,
    pub font_size: f64,
    pub label_color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            stroke: DEFAULT_STROKE.into(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill: DEFAULT_FILL.into(),
            font_family: DEFAULT_FONT_FAMILY.into(),
            font_size: DEFAULT_FONT_SIZE,
            label_color: DEFAULT_STROKE.into(),
        }
    }
}

// ─── Styling ─────────────────────────────────────────────────────────────

/// Per-primitive style overrides. `None` falls back to `Defaults`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

/// Stroke-only style for segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

/// A fully resolved style, ready for painting.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub stroke: String,
    pub stroke_width: f64,
    pub fill: String,
}

impl ResolvedStyle {
    pub fn is_filled(&self) -> bool {
        !self.fill.eq_ignore_ascii_case("none") && !self.fill.eq_ignore_ascii_case("transparent")
    }
}

// ─── Primitives ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rx: f64,
    pub ry: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: SmallVec<[Xy; 4]>,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

impl Polygon {
    /// Fewer than three vertices: renders, but never links vertex labels.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Xy,
    pub b: Xy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
    #[serde(flatten)]
    pub style: LineStyle,
}

impl Segment {
    pub fn is_zero_length(&self) -> bool {
        self.a == self.b
    }
}

/// A small filled dot marking an endpoint or vertex. Semantically distinct
/// from a `Circle` shape even though both render as `<circle>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub at: Xy,
    pub r: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

impl PointMarker {
    pub fn resolved_style(&self) -> ResolvedStyle {
        ResolvedStyle {
            stroke: self
                .style
                .stroke
                .clone()
                .unwrap_or_else(|| MARKER_STROKE.into()),
            stroke_width: self.style.stroke_width.unwrap_or(MARKER_STROKE_WIDTH),
            fill: self.style.fill.clone().unwrap_or_else(|| MARKER_FILL.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub bold: bool,
}

impl Label {
    /// A single uppercase ASCII letter, the shape of a vertex name.
    pub fn is_vertex_name(&self) -> bool {
        let mut chars = self.text.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Geometric behaviour shared by every primitive kind.
pub trait Geometry {
    /// Geometric extent, not counting stroke width.
    fn bounds(&self) -> Bounds;

    /// How far the stroke paints past `bounds`.
    fn stroke_pad(&self) -> f64 {
        0.0
    }

    /// Points that must stay inside the allowed area while the primitive is
    /// translated: corners of the stroked extent, or a label's anchor.
    fn extent_points(&self) -> SmallVec<[Xy; 4]> {
        corners(self.bounds().expand(self.stroke_pad()))
    }

    /// Rigid translation. Coordinates are rounded to 0.01.
    fn translate(&mut self, dx: f64, dy: f64);
}

fn shift(p: Xy, dx: f64, dy: f64) -> Xy {
    (round2(p.0 + dx), round2(p.1 + dy))
}

fn corners(b: Bounds) -> SmallVec<[Xy; 4]> {
    smallvec::smallvec![(b.x, b.y), (b.max_x(), b.max_y())]
}

fn half(stroke_width: Option<f64>) -> f64 {
    stroke_width.unwrap_or(0.0).max(0.0) / 2.0
}

impl Geometry for Rect {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.w.max(0.0), self.h.max(0.0))
    }

    fn stroke_pad(&self) -> f64 {
        half(self.style.stroke_width)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        (self.x, self.y) = shift((self.x, self.y), dx, dy);
    }
}

impl Geometry for Circle {
    fn bounds(&self) -> Bounds {
        let r = self.r.max(0.0);
        Bounds::new(self.cx - r, self.cy - r, r * 2.0, r * 2.0)
    }

    fn stroke_pad(&self) -> f64 {
        half(self.style.stroke_width)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        (self.cx, self.cy) = shift((self.cx, self.cy), dx, dy);
    }
}

impl Geometry for Ellipse {
    fn bounds(&self) -> Bounds {
        let (rx, ry) = (self.rx.max(0.0), self.ry.max(0.0));
        Bounds::new(self.cx - rx, self.cy - ry, rx * 2.0, ry * 2.0)
    }

    fn stroke_pad(&self) -> f64 {
        half(self.style.stroke_width)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        (self.cx, self.cy) = shift((self.cx, self.cy), dx, dy);
    }
}

impl Geometry for Polygon {
    fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.points).unwrap_or_default()
    }

    fn stroke_pad(&self) -> f64 {
        half(self.style.stroke_width)
    }

    fn extent_points(&self) -> SmallVec<[Xy; 4]> {
        match Bounds::from_points(&self.points) {
            Some(b) => corners(b.expand(self.stroke_pad())),
            None => SmallVec::new(),
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            *p = shift(*p, dx, dy);
        }
    }
}

impl Geometry for Segment {
    fn bounds(&self) -> Bounds {
        Bounds::from_corners(self.a.0, self.a.1, self.b.0, self.b.1)
    }

    fn stroke_pad(&self) -> f64 {
        half(self.style.stroke_width)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.a = shift(self.a, dx, dy);
        self.b = shift(self.b, dx, dy);
    }
}

impl Geometry for PointMarker {
    fn bounds(&self) -> Bounds {
        let r = self.r.max(0.0);
        Bounds::new(self.at.0 - r, self.at.1 - r, r * 2.0, r * 2.0)
    }

    fn stroke_pad(&self) -> f64 {
        half(self.style.stroke_width)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.at = shift(self.at, dx, dy);
    }
}

impl Geometry for Label {
    /// Approximate text box centered on the anchor.
    fn bounds(&self) -> Bounds {
        let size = self.font_size.unwrap_or(DEFAULT_FONT_SIZE).max(0.0);
        let width = self.text.chars().count() as f64 * size * LABEL_CHAR_WIDTH;
        Bounds::new(self.x - width / 2.0, self.y - size / 2.0, width, size)
    }

    fn extent_points(&self) -> SmallVec<[Xy; 4]> {
        smallvec::smallvec![(self.x, self.y)]
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        (self.x, self.y) = shift((self.x, self.y), dx, dy);
    }
}

// ─── Addressing ──────────────────────────────────────────────────────────

/// The closed set of primitive kinds, in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Rect,
    Circle,
    Ellipse,
    Polygon,
    Segment,
    Point,
    Label,
}

impl EntityKind {
    /// Paint order: rectangles first, labels on top.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Rect,
        EntityKind::Circle,
        EntityKind::Ellipse,
        EntityKind::Polygon,
        EntityKind::Segment,
        EntityKind::Point,
        EntityKind::Label,
    ];

    /// Kinds that count as top-level shapes for separation and pairing.
    pub const SHAPES: [EntityKind; 4] = [
        EntityKind::Rect,
        EntityKind::Circle,
        EntityKind::Ellipse,
        EntityKind::Polygon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Rect => "rect",
            EntityKind::Circle => "circle",
            EntityKind::Ellipse => "ellipse",
            EntityKind::Polygon => "polygon",
            EntityKind::Segment => "segment",
            EntityKind::Point => "point",
            EntityKind::Label => "label",
        }
    }

    /// The SVG tag the renderer emits for this kind.
    pub fn svg_tag(self) -> &'static str {
        match self {
            EntityKind::Rect => "rect",
            EntityKind::Circle | EntityKind::Point => "circle",
            EntityKind::Ellipse => "ellipse",
            EntityKind::Polygon => "polygon",
            EntityKind::Segment => "line",
            EntityKind::Label => "text",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rect" => Ok(EntityKind::Rect),
            "circle" => Ok(EntityKind::Circle),
            "ellipse" => Ok(EntityKind::Ellipse),
            "polygon" => Ok(EntityKind::Polygon),
            "segment" => Ok(EntityKind::Segment),
            "point" => Ok(EntityKind::Point),
            "label" => Ok(EntityKind::Label),
            other => Err(format!("unknown entity kind `{other}`")),
        }
    }
}

/// A `(kind, index)` address into a scene's collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: EntityKind,
    pub index: usize,
}

impl ElementRef {
    pub const fn new(kind: EntityKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

/// A borrowed view of one primitive, for exhaustive per-kind dispatch.
#[derive(Debug, Clone, Copy)]
pub enum Primitive<'a> {
    Rect(&'a Rect),
    Circle(&'a Circle),
    Ellipse(&'a Ellipse),
    Polygon(&'a Polygon),
    Segment(&'a Segment),
    Point(&'a PointMarker),
    Label(&'a Label),
}

impl<'a> Primitive<'a> {
    pub fn geometry(&self) -> &'a dyn Geometry {
        match *self {
            Primitive::Rect(p) => p,
            Primitive::Circle(p) => p,
            Primitive::Ellipse(p) => p,
            Primitive::Polygon(p) => p,
            Primitive::Segment(p) => p,
            Primitive::Point(p) => p,
            Primitive::Label(p) => p,
        }
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// The complete in-memory description of one diagram.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub canvas: Canvas,
    pub defaults: Defaults,
    #[serde(default)]
    pub rects: Vec<Rect>,
    #[serde(default)]
    pub circles: Vec<Circle>,
    #[serde(default)]
    pub ellipses: Vec<Ellipse>,
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub points: Vec<PointMarker>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Scene {
    /// An empty scene on the given canvas with stock defaults.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ..Self::default()
        }
    }

    pub fn len_of(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Rect => self.rects.len(),
            EntityKind::Circle => self.circles.len(),
            EntityKind::Ellipse => self.ellipses.len(),
            EntityKind::Polygon => self.polygons.len(),
            EntityKind::Segment => self.segments.len(),
            EntityKind::Point => self.points.len(),
            EntityKind::Label => self.labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|&k| self.len_of(k) == 0)
    }

    pub fn contains(&self, r: ElementRef) -> bool {
        r.index < self.len_of(r.kind)
    }

    pub fn get(&self, r: ElementRef) -> Option<Primitive<'_>> {
        let i = r.index;
        Some(match r.kind {
            EntityKind::Rect => Primitive::Rect(self.rects.get(i)?),
            EntityKind::Circle => Primitive::Circle(self.circles.get(i)?),
            EntityKind::Ellipse => Primitive::Ellipse(self.ellipses.get(i)?),
            EntityKind::Polygon => Primitive::Polygon(self.polygons.get(i)?),
            EntityKind::Segment => Primitive::Segment(self.segments.get(i)?),
            EntityKind::Point => Primitive::Point(self.points.get(i)?),
            EntityKind::Label => Primitive::Label(self.labels.get(i)?),
        })
    }

    pub fn geometry_mut(&mut self, r: ElementRef) -> Option<&mut dyn Geometry> {
        let i = r.index;
        Some(match r.kind {
            EntityKind::Rect => self.rects.get_mut(i)?,
            EntityKind::Circle => self.circles.get_mut(i)?,
            EntityKind::Ellipse => self.ellipses.get_mut(i)?,
            EntityKind::Polygon => self.polygons.get_mut(i)?,
            EntityKind::Segment => self.segments.get_mut(i)?,
            EntityKind::Point => self.points.get_mut(i)?,
            EntityKind::Label => self.labels.get_mut(i)?,
        })
    }

    /// Overwrite the primitive at `r` with its counterpart in `src`.
    /// Returns `false` if either side lacks the address.
    pub fn copy_from(&mut self, src: &Scene, r: ElementRef) -> bool {
        fn copy<T: Clone>(dst: &mut [T], src: &[T], i: usize) -> bool {
            match (dst.get_mut(i), src.get(i)) {
                (Some(d), Some(s)) => {
                    d.clone_from(s);
                    true
                }
                _ => false,
            }
        }
        let i = r.index;
        match r.kind {
            EntityKind::Rect => copy(&mut self.rects, &src.rects, i),
            EntityKind::Circle => copy(&mut self.circles, &src.circles, i),
            EntityKind::Ellipse => copy(&mut self.ellipses, &src.ellipses, i),
            EntityKind::Polygon => copy(&mut self.polygons, &src.polygons, i),
            EntityKind::Segment => copy(&mut self.segments, &src.segments, i),
            EntityKind::Point => copy(&mut self.points, &src.points, i),
            EntityKind::Label => copy(&mut self.labels, &src.labels, i),
        }
    }

    /// Translate one primitive. Returns `false` if the address is stale.
    pub fn translate(&mut self, r: ElementRef, dx: f64, dy: f64) -> bool {
        match self.geometry_mut(r) {
            Some(g) => {
                g.translate(dx, dy);
                true
            }
            None => false,
        }
    }

    /// Scale uniformly onto a `width × height` canvas, centered. Stroke
    /// widths, font sizes and marker radii keep their size.
    pub fn fit_to(&mut self, width: f64, height: f64) {
        let s = (width / self.canvas.width).min(height / self.canvas.height);
        if !(s.is_finite() && s > 0.0) {
            return;
        }
        let ox = (width - self.canvas.width * s) / 2.0;
        let oy = (height - self.canvas.height * s) / 2.0;
        let at = |p: Xy| (round2(ox + p.0 * s), round2(oy + p.1 * s));
        let len = |v: f64| round2(v * s);

        for r in &mut self.rects {
            (r.x, r.y) = at((r.x, r.y));
            (r.w, r.h, r.rx, r.ry) = (len(r.w), len(r.h), len(r.rx), len(r.ry));
        }
        for c in &mut self.circles {
            (c.cx, c.cy) = at((c.cx, c.cy));
            c.r = len(c.r);
        }
        for e in &mut self.ellipses {
            (e.cx, e.cy) = at((e.cx, e.cy));
            (e.rx, e.ry) = (len(e.rx), len(e.ry));
        }
        for poly in &mut self.polygons {
            for v in &mut poly.points {
                *v = at(*v);
            }
        }
        for seg in &mut self.segments {
            (seg.a, seg.b) = (at(seg.a), at(seg.b));
        }
        for m in &mut self.points {
            m.at = at(m.at);
        }
        for l in &mut self.labels {
            (l.x, l.y) = at((l.x, l.y));
        }
        (self.canvas.width, self.canvas.height) = (width, height);
    }

    /// Every addressable element, in paint order.
    pub fn element_refs(&self) -> impl Iterator<Item = ElementRef> + '_ {
        EntityKind::ALL
            .into_iter()
            .flat_map(move |kind| (0..self.len_of(kind)).map(move |i| ElementRef::new(kind, i)))
    }

    /// Refs of the top-level shapes (rect, circle, ellipse, polygon).
    pub fn shape_refs(&self) -> impl Iterator<Item = ElementRef> + '_ {
        EntityKind::SHAPES
            .into_iter()
            .flat_map(move |kind| (0..self.len_of(kind)).map(move |i| ElementRef::new(kind, i)))
    }

    pub fn bounds_of(&self, r: ElementRef) -> Option<Bounds> {
        self.get(r).map(|p| self.primitive_bounds(p))
    }

    /// Union of every primitive's extent. `None` for an empty scene.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.element_refs()
            .filter_map(|r| self.bounds_of(r))
            .reduce(|acc, b| acc.union(&b))
    }

    fn primitive_bounds(&self, p: Primitive<'_>) -> Bounds {
        match p {
            // Labels measure with the scene's default font size when unset.
            Primitive::Label(l) if l.font_size.is_none() => Label {
                font_size: Some(self.defaults.font_size),
                ..l.clone()
            }
            .bounds(),
            other => other.geometry().bounds(),
        }
    }

    // ─── Style resolution ────────────────────────────────────────────────

    pub fn resolve_style(&self, style: &ShapeStyle) -> ResolvedStyle {
        ResolvedStyle {
            stroke: style
                .stroke
                .clone()
                .unwrap_or_else(|| self.defaults.stroke.clone()),
            stroke_width: style.stroke_width.unwrap_or(self.defaults.stroke_width),
            fill: style
                .fill
                .clone()
                .unwrap_or_else(|| self.defaults.fill.clone()),
        }
    }

    pub fn resolve_line_style(&self, style: &LineStyle) -> ResolvedStyle {
        ResolvedStyle {
            stroke: style
                .stroke
                .clone()
                .unwrap_or_else(|| self.defaults.stroke.clone()),
            stroke_width: style.stroke_width.unwrap_or(self.defaults.stroke_width),
            fill: "none".into(),
        }
    }

    /// Resolved style for any primitive; labels report their text color as fill.
    pub fn style_of(&self, p: Primitive<'_>) -> ResolvedStyle {
        match p {
            Primitive::Rect(s) => self.resolve_style(&s.style),
            Primitive::Circle(s) => self.resolve_style(&s.style),
            Primitive::Ellipse(s) => self.resolve_style(&s.style),
            Primitive::Polygon(s) => self.resolve_style(&s.style),
            Primitive::Segment(s) => self.resolve_line_style(&s.style),
            Primitive::Point(s) => s.resolved_style(),
            Primitive::Label(l) => ResolvedStyle {
                stroke: "none".into(),
                stroke_width: 0.0,
                fill: self.label_color(l).to_string(),
            },
        }
    }

    pub fn label_color<'a>(&'a self, label: &'a Label) -> &'a str {
        label.color.as_deref().unwrap_or(&self.defaults.label_color)
    }

    pub fn label_font_size(&self, label: &Label) -> f64 {
        label.font_size.unwrap_or(self.defaults.font_size)
    }

    // ─── JSON ────────────────────────────────────────────────────────────

    /// Parse and validate untrusted JSON text.
    ///
    /// # Errors
    /// Returns a `ValidationError` for malformed JSON or a structurally
    /// invalid canvas.
    pub fn from_json_str(text: &str) -> Result<Self, crate::ValidationError> {
        let raw: serde_json::Value = serde_json::from_str(text)?;
        crate::validate::validate(&raw)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        // Scene contains only strings, finite numbers, and arrays.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Scene {
        let mut scene = Scene::default();
        scene.rects.push(Rect {
            x: 10.0,
            y: 20.0,
            w: 30.0,
            h: 40.0,
            rx: 0.0,
            ry: 0.0,
            style: ShapeStyle::default(),
        });
        scene.labels.push(Label {
            text: "A".into(),
            x: 100.0,
            y: 100.0,
            color: None,
            font_size: None,
            bold: false,
        });
        scene
    }

    #[test]
    fn element_refs_follow_paint_order() {
        let scene = sample();
        let refs: Vec<_> = scene.element_refs().collect();
        assert_eq!(
            refs,
            vec![
                ElementRef::new(EntityKind::Rect, 0),
                ElementRef::new(EntityKind::Label, 0)
            ]
        );
    }

    #[test]
    fn translate_rounds_and_reports_stale_refs() {
        let mut scene = sample();
        assert!(scene.translate(ElementRef::new(EntityKind::Rect, 0), 0.333, 1.0 / 3.0));
        assert_eq!((scene.rects[0].x, scene.rects[0].y), (10.33, 20.33));
        assert!(!scene.translate(ElementRef::new(EntityKind::Rect, 5), 1.0, 1.0));
    }

    #[test]
    fn style_falls_back_to_defaults() {
        let scene = sample();
        let style = scene.resolve_style(&scene.rects[0].style);
        assert_eq!(style.stroke, "#000000");
        assert_eq!(style.fill, "none");
        assert!(!style.is_filled());
    }

    #[test]
    fn vertex_names_are_single_uppercase_letters() {
        let mut l = sample().labels[0].clone();
        assert!(l.is_vertex_name());
        l.text = "AB".into();
        assert!(!l.is_vertex_name());
        l.text = "a".into();
        assert!(!l.is_vertex_name());
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>(), Ok(kind));
        }
        assert!("triangle".parse::<EntityKind>().is_err());
    }

    #[test]
    fn extent_includes_half_the_stroke() {
        let mut scene = sample();
        scene.rects[0].style.stroke_width = Some(4.0);
        let extent = scene.rects[0].extent_points();
        assert_eq!(extent.as_slice(), &[(8.0, 18.0), (42.0, 62.0)]);
        // Labels keep only their anchor.
        assert_eq!(scene.labels[0].extent_points().as_slice(), &[(100.0, 100.0)]);
        let empty = Polygon {
            points: SmallVec::new(),
            style: ShapeStyle::default(),
        };
        assert!(empty.extent_points().is_empty());
    }

    #[test]
    fn fit_scales_and_centers() {
        let mut scene = sample();
        scene.fit_to(600.0, 600.0);
        // Scale 2/3, then 300px of vertical slack split evenly.
        assert_eq!((scene.canvas.width, scene.canvas.height), (600.0, 600.0));
        let r = &scene.rects[0];
        assert_eq!((r.x, r.y, r.w, r.h), (6.67, 163.33, 20.0, 26.67));
        assert_eq!((scene.labels[0].x, scene.labels[0].y), (66.67, 216.67));
    }

    #[test]
    fn canvas_sizes_are_clamped() {
        assert_eq!(Canvas::clamp_size(50.0, 9000.0), Some((100.0, 4000.0)));
        assert_eq!(Canvas::clamp_size(640.4, 480.6), Some((640.0, 481.0)));
        assert_eq!(Canvas::clamp_size(f64::NAN, 300.0), None);
    }

    #[test]
    fn content_bounds_unions_extents() {
        let scene = sample();
        let b = scene.content_bounds().unwrap();
        assert_eq!(b.x, 10.0);
        assert_eq!(b.y, 20.0);
        assert!(b.max_x() > 100.0);
        assert!(Scene::default().content_bounds().is_none());
    }
}
