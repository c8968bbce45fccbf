//! Geometric normalization: pin the canvas, clamp every primitive inside the
//! margin box, drop zero-length segments, push vertex labels off their
//! vertices, and optionally separate or pair shapes.
//!
//! Each step is a standalone function over `&mut Scene`; `normalize` runs
//! them in order on a copy of its input.

use crate::config::{
    ANNOTATION_PAD, LABEL_PUSH_OFFSET, LABEL_PUSH_RADIUS, NormalizeOptions, SEPARATION_GAP,
};
use crate::geom::{Bounds, centroid, clamp, distance, round2};
use crate::model::{Canvas, ElementRef, EntityKind, Geometry, Scene, Xy};
use std::collections::HashSet;

/// Shapes already within this distance of their pairing slot stay put.
const SLOT_TOLERANCE: f64 = 0.5;

/// Slack for float comparisons in containment checks.
const CONTAINMENT_EPSILON: f64 = 1e-6;

// ─── Pipeline ─────────────────────────────────────────────────────────────

/// Repair an already-validated scene into margin-safe, degeneracy-free geometry.
///
/// Never fails. Only zero-length segments are discarded.
pub fn normalize(scene: &Scene, options: &NormalizeOptions) -> Scene {
    let mut out = scene.clone();
    pin_canvas(&mut out, &options.canvas);

    let area = out.canvas.inset(options.margin);
    clamp_primitives(&mut out, &area);
    drop_degenerate_segments(&mut out);
    push_vertex_labels(&mut out, &area);

    if !options.allow_touching {
        separate_shapes(&mut out, &area);
    }
    if options.wants_two {
        pair_shapes(&mut out, &area);
    }

    log::debug!(
        "normalized scene: {} elements, margin {}",
        out.element_refs().count(),
        options.margin
    );
    out
}

// ─── Steps ────────────────────────────────────────────────────────────────

/// Force the scene onto the session's drawing surface.
pub fn pin_canvas(scene: &mut Scene, canvas: &Canvas) {
    if scene.canvas != *canvas {
        log::debug!(
            "pinning canvas {}×{} → {}×{}",
            scene.canvas.width,
            scene.canvas.height,
            canvas.width,
            canvas.height
        );
    }
    scene.canvas = canvas.clone();
}

fn clamp_point(p: Xy, area: &Bounds) -> Xy {
    (
        round2(clamp(p.0, area.x, area.max_x())),
        round2(clamp(p.1, area.y, area.max_y())),
    )
}

/// `area` shrunk by a stroke pad on every side, never past its center.
fn inner(area: &Bounds, pad: f64) -> Bounds {
    let pad = pad.min(area.width / 2.0).min(area.height / 2.0).max(0.0);
    area.expand(-pad)
}

/// Clamp a centered extent of half-size `r` so it stays inside `[lo, hi]`.
fn clamp_center(c: f64, r: f64, lo: f64, hi: f64) -> f64 {
    let r = r.max(0.0);
    round2(clamp(c, lo + r, hi - r))
}

/// Keep every primitive's stroked extent inside `area`, capping sizes that
/// exceed the available span before clamping position.
pub fn clamp_primitives(scene: &mut Scene, area: &Bounds) {
    for r in &mut scene.rects {
        let a = inner(area, r.stroke_pad());
        r.w = r.w.min(a.width);
        r.h = r.h.min(a.height);
        r.x = round2(clamp(r.x, a.x, a.max_x() - r.w.max(0.0)));
        r.y = round2(clamp(r.y, a.y, a.max_y() - r.h.max(0.0)));
    }
    for c in &mut scene.circles {
        let a = inner(area, c.stroke_pad());
        c.r = c.r.min(a.width / 2.0).min(a.height / 2.0);
        c.cx = clamp_center(c.cx, c.r, a.x, a.max_x());
        c.cy = clamp_center(c.cy, c.r, a.y, a.max_y());
    }
    for e in &mut scene.ellipses {
        let a = inner(area, e.stroke_pad());
        e.rx = e.rx.min(a.width / 2.0);
        e.ry = e.ry.min(a.height / 2.0);
        e.cx = clamp_center(e.cx, e.rx, a.x, a.max_x());
        e.cy = clamp_center(e.cy, e.ry, a.y, a.max_y());
    }
    for p in &mut scene.points {
        let a = inner(area, p.stroke_pad());
        p.r = p.r.min(a.width / 2.0).min(a.height / 2.0);
        p.at = (
            clamp_center(p.at.0, p.r, a.x, a.max_x()),
            clamp_center(p.at.1, p.r, a.y, a.max_y()),
        );
    }
    for poly in &mut scene.polygons {
        let a = inner(area, poly.stroke_pad());
        for v in &mut poly.points {
            *v = clamp_point(*v, &a);
        }
    }
    for s in &mut scene.segments {
        let a = inner(area, s.stroke_pad());
        s.a = clamp_point(s.a, &a);
        s.b = clamp_point(s.b, &a);
    }
    for l in &mut scene.labels {
        (l.x, l.y) = clamp_point((l.x, l.y), area);
    }
}

/// Remove zero-length segments. Returns how many were dropped.
pub fn drop_degenerate_segments(scene: &mut Scene) -> usize {
    let before = scene.segments.len();
    scene.segments.retain(|s| !s.is_zero_length());
    let dropped = before - scene.segments.len();
    if dropped > 0 {
        log::warn!("dropped {dropped} zero-length segment(s)");
    }
    dropped
}

/// Move single-letter labels that sit on a polygon vertex to a fixed offset
/// outward along the centroid→vertex direction.
///
/// The new position depends only on the vertex and the centroid, so running
/// the pass twice changes nothing.
pub fn push_vertex_labels(scene: &mut Scene, area: &Bounds) {
    let anchors: Vec<(Xy, Xy)> = scene
        .polygons
        .iter()
        .filter(|p| !p.is_degenerate())
        .filter_map(|p| {
            let c = centroid(&p.points)?;
            Some(p.points.iter().map(move |&v| (v, c)))
        })
        .flatten()
        .collect();
    if anchors.is_empty() {
        return;
    }

    for label in scene.labels.iter_mut().filter(|l| l.is_vertex_name()) {
        let at = (label.x, label.y);
        let nearest = anchors
            .iter()
            .map(|&(v, c)| (distance(at, v), v, c))
            .filter(|(d, _, _)| *d <= LABEL_PUSH_RADIUS)
            .min_by(|a, b| a.0.total_cmp(&b.0));
        let Some((_, v, c)) = nearest else { continue };

        let (dx, dy) = (v.0 - c.0, v.1 - c.1);
        let len = dx.hypot(dy);
        if len == 0.0 {
            continue;
        }
        let pushed = (
            v.0 + dx / len * LABEL_PUSH_OFFSET,
            v.1 + dy / len * LABEL_PUSH_OFFSET,
        );
        (label.x, label.y) = clamp_point(pushed, area);
        log::trace!("pushed vertex label {:?} to ({}, {})", label.text, label.x, label.y);
    }
}

/// Greedy, order-dependent overlap removal between top-level shapes.
///
/// Shapes are visited in paint order. A shape whose bounds overlap an
/// earlier shape's bounds grown by the gap is shifted right, else left,
/// else down, taking the first shift that clears every earlier shape and
/// stays inside `area`. Annotations near the shape travel with it.
pub fn separate_shapes(scene: &mut Scene, area: &Bounds) {
    let shapes: Vec<ElementRef> = scene.shape_refs().collect();
    let mut placed: Vec<Bounds> = Vec::with_capacity(shapes.len());
    let mut carried = HashSet::new();

    for r in shapes {
        let Some(b) = scene.bounds_of(r) else { continue };
        let fit = inner(area, stroke_pad_of(scene, r));
        let (dx, dy) = clearing_shift(&b, &placed, &fit);
        if dx != 0.0 || dy != 0.0 {
            log::debug!("separating {r} by ({dx}, {dy})");
            scene.translate(r, dx, dy);
            carry_annotations(scene, &b, (dx, dy), area, &mut carried);
        }
        placed.push(scene.bounds_of(r).unwrap_or(b));
    }
}

fn stroke_pad_of(scene: &Scene, r: ElementRef) -> f64 {
    scene.get(r).map_or(0.0, |p| p.geometry().stroke_pad())
}

fn overlapping<'a>(b: &Bounds, placed: &'a [Bounds]) -> Option<&'a Bounds> {
    placed
        .iter()
        .find(|p| b.intersects(&p.expand(SEPARATION_GAP)))
}

/// Repeatedly step past whichever placed box still overlaps, in one direction.
fn shift_until_clear(
    b: &Bounds,
    placed: &[Bounds],
    area: &Bounds,
    step: impl Fn(&Bounds, &Bounds) -> (f64, f64),
) -> Option<(f64, f64)> {
    let (mut dx, mut dy) = (0.0, 0.0);
    for _ in 0..=placed.len() {
        let moved = b.translate(dx, dy);
        match overlapping(&moved, placed) {
            None => {
                return area
                    .expand(CONTAINMENT_EPSILON)
                    .encloses(&moved)
                    .then_some((round2(dx), round2(dy)));
            }
            Some(p) => {
                let (sx, sy) = step(&moved, p);
                dx += sx;
                dy += sy;
            }
        }
    }
    None
}

fn clearing_shift(b: &Bounds, placed: &[Bounds], area: &Bounds) -> (f64, f64) {
    if overlapping(b, placed).is_none() {
        return (0.0, 0.0);
    }
    let right = |m: &Bounds, p: &Bounds| (p.max_x() + SEPARATION_GAP - m.x, 0.0);
    let left = |m: &Bounds, p: &Bounds| (p.x - SEPARATION_GAP - m.max_x(), 0.0);
    let down = |m: &Bounds, p: &Bounds| (0.0, p.max_y() + SEPARATION_GAP - m.y);

    if let Some(shift) = shift_until_clear(b, placed, area, right)
        .or_else(|| shift_until_clear(b, placed, area, left))
        .or_else(|| shift_until_clear(b, placed, area, down))
    {
        return shift;
    }

    // Nothing fits: go as far down as the area allows.
    let dy = placed
        .iter()
        .filter(|p| b.intersects(&p.expand(SEPARATION_GAP)))
        .map(|p| p.max_y() + SEPARATION_GAP - b.y)
        .fold(0.0, f64::max);
    (0.0, round2(clamp(dy, 0.0, area.max_y() - b.max_y())))
}

/// Arrange the first two shapes of the first kind that has at least two
/// instances into the left and right halves of `area`.
pub fn pair_shapes(scene: &mut Scene, area: &Bounds) {
    let Some(kind) = EntityKind::SHAPES
        .into_iter()
        .find(|&k| scene.len_of(k) >= 2)
    else {
        return;
    };

    let (_, cy) = area.center();
    let slots = [
        (area.x + area.width * 0.25, cy),
        (area.x + area.width * 0.75, cy),
    ];
    let refs = [ElementRef::new(kind, 0), ElementRef::new(kind, 1)];
    let originals: Vec<Option<Bounds>> = refs.iter().map(|&r| scene.bounds_of(r)).collect();
    let mut carried = HashSet::new();

    for ((r, slot), original) in refs.into_iter().zip(slots).zip(originals) {
        let Some(b) = original else { continue };
        let fit = inner(area, stroke_pad_of(scene, r));
        let (cx, cy) = b.center();
        let dx = clamp(slot.0 - cx, fit.x - b.x, fit.max_x() - b.max_x());
        let dy = clamp(slot.1 - cy, fit.y - b.y, fit.max_y() - b.max_y());
        if dx.abs() <= SLOT_TOLERANCE && dy.abs() <= SLOT_TOLERANCE {
            continue;
        }
        let (dx, dy) = (round2(dx), round2(dy));
        log::debug!("pairing {r} by ({dx}, {dy})");
        scene.translate(r, dx, dy);
        carry_annotations(scene, &b, (dx, dy), area, &mut carried);
    }
}

/// Translate labels, point markers and segments lying inside `region`
/// (padded) by `delta`, at most once each, and keep them inside `area`.
fn carry_annotations(
    scene: &mut Scene,
    region: &Bounds,
    (dx, dy): (f64, f64),
    area: &Bounds,
    carried: &mut HashSet<ElementRef>,
) {
    let zone = region.expand(ANNOTATION_PAD);
    let inside = |p: Xy| zone.contains(p.0, p.1);

    for (i, l) in scene.labels.iter_mut().enumerate() {
        if inside((l.x, l.y)) && carried.insert(ElementRef::new(EntityKind::Label, i)) {
            (l.x, l.y) = clamp_point((l.x + dx, l.y + dy), area);
        }
    }
    for (i, p) in scene.points.iter_mut().enumerate() {
        if inside(p.at) && carried.insert(ElementRef::new(EntityKind::Point, i)) {
            p.at = clamp_point((p.at.0 + dx, p.at.1 + dy), area);
        }
    }
    for (i, s) in scene.segments.iter_mut().enumerate() {
        if inside(s.a)
            && inside(s.b)
            && carried.insert(ElementRef::new(EntityKind::Segment, i))
        {
            s.a = clamp_point((s.a.0 + dx, s.a.1 + dy), area);
            s.b = clamp_point((s.b.0 + dx, s.b.1 + dy), area);
        }
    }
}

// ─── Checks ───────────────────────────────────────────────────────────────

/// Elements whose stroked extent leaves `area`. Empty for a normalized scene.
pub fn out_of_bounds(scene: &Scene, area: &Bounds) -> Vec<ElementRef> {
    let allowed = area.expand(CONTAINMENT_EPSILON);
    scene
        .element_refs()
        .filter(|&r| {
            scene.get(r).is_some_and(|p| {
                p.geometry()
                    .extent_points()
                    .iter()
                    .any(|&(x, y)| !allowed.contains(x, y))
            })
        })
        .collect()
}
