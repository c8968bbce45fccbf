//! Hit testing: pointer target → element address.
//!
//! Two entry points. `resolve_target` maps a rendered element (as reported
//! by a DOM host) back to its `(kind, index)`. `hit_test` does the same from
//! a canvas position alone, reverse-walking paint order so the topmost
//! element wins.

use crate::svg::{ATTR_ENTITY, ATTR_INDEX, ATTR_LABEL_INDEX};
use mdr_core::config::LABEL_CHAR_WIDTH;
use mdr_core::geom::{distance, distance_to_segment, point_in_polygon};
use mdr_core::{Bounds, ElementRef, EntityKind, Primitive, Scene, Xy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extra slack around strokes and markers, in canvas pixels.
pub const HIT_TOLERANCE: f64 = 4.0;

/// How close a circle's center must be to a primitive's to be matched.
const COORD_MATCH_EPSILON: f64 = 0.5;

/// The element under the pointer, as described by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetElement {
    /// Lowercase tag name, e.g. `circle`.
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    /// Attributes of the nearest `<g>` ancestor, if any.
    pub parent_attrs: BTreeMap<String, String>,
    /// Position among same-tag elements under the root, background excluded.
    pub dom_index: Option<usize>,
}

impl TargetElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_parent_attr(mut self, name: &str, value: impl ToString) -> Self {
        self.parent_attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn at_dom_index(mut self, index: usize) -> Self {
        self.dom_index = Some(index);
        self
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(name)
            .or_else(|| self.parent_attrs.get(name))
            .map(String::as_str)
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.attrs.get(name)?.trim().parse().ok()
    }
}

// ─── Target resolution ───────────────────────────────────────────────────

/// Map a rendered element back to its scene address.
///
/// Explicit address attributes win. Without them, falls back to matching by
/// DOM position among same-tag elements, with circles disambiguated by
/// center coordinates (point markers first, then circle shapes).
pub fn resolve_target(scene: &Scene, target: &TargetElement) -> Option<ElementRef> {
    if let Some(r) = resolve_by_attributes(target) {
        return scene.contains(r).then_some(r);
    }
    let r = resolve_by_position(scene, target)?;
    log::debug!("resolved <{}> by fallback to {r}", target.tag);
    scene.contains(r).then_some(r)
}

fn resolve_by_attributes(target: &TargetElement) -> Option<ElementRef> {
    if let Some(i) = target.attr(ATTR_LABEL_INDEX) {
        return Some(ElementRef::new(EntityKind::Label, i.trim().parse().ok()?));
    }
    let kind: EntityKind = target.attr(ATTR_ENTITY)?.parse().ok()?;
    let index = target.attr(ATTR_INDEX)?.trim().parse().ok()?;
    Some(ElementRef::new(kind, index))
}

fn resolve_by_position(scene: &Scene, target: &TargetElement) -> Option<ElementRef> {
    let kind = match target.tag.as_str() {
        "text" => EntityKind::Label,
        "rect" => EntityKind::Rect,
        "ellipse" => EntityKind::Ellipse,
        "polygon" => EntityKind::Polygon,
        "line" => EntityKind::Segment,
        "circle" => return resolve_circle(scene, target),
        _ => return None,
    };
    Some(ElementRef::new(kind, target.dom_index?))
}

fn resolve_circle(scene: &Scene, target: &TargetElement) -> Option<ElementRef> {
    if let (Some(cx), Some(cy)) = (target.number("cx"), target.number("cy")) {
        let near = |p: Xy| distance(p, (cx, cy)) <= COORD_MATCH_EPSILON;
        if let Some(i) = scene.points.iter().position(|p| near(p.at)) {
            return Some(ElementRef::new(EntityKind::Point, i));
        }
        if let Some(i) = scene.circles.iter().position(|c| near((c.cx, c.cy))) {
            return Some(ElementRef::new(EntityKind::Circle, i));
        }
    }
    // Circle shapes render before point markers.
    let i = target.dom_index?;
    let circles = scene.circles.len();
    Some(if i < circles {
        ElementRef::new(EntityKind::Circle, i)
    } else {
        ElementRef::new(EntityKind::Point, i - circles)
    })
}

// ─── Geometric hit testing ───────────────────────────────────────────────

/// Find the topmost element at `(px, py)`.
/// Returns `None` if only the background is hit.
///
/// Filled shapes are hit anywhere inside; unfilled ones only near their
/// outline.
pub fn hit_test(scene: &Scene, px: f64, py: f64) -> Option<ElementRef> {
    let refs: Vec<ElementRef> = scene.element_refs().collect();
    refs.into_iter()
        .rev()
        .find(|&r| scene.get(r).is_some_and(|p| hits(scene, p, (px, py))))
}

fn hits(scene: &Scene, p: Primitive<'_>, at: Xy) -> bool {
    let style = scene.style_of(p);
    let reach = style.stroke_width.max(0.0) / 2.0 + HIT_TOLERANCE;
    let filled = style.is_filled();

    match p {
        Primitive::Label(l) => {
            let size = scene.label_font_size(l);
            let width = (l.text.chars().count().max(1) as f64) * size * LABEL_CHAR_WIDTH;
            Bounds::new(l.x - width / 2.0, l.y - size / 2.0, width, size).contains(at.0, at.1)
        }
        Primitive::Point(m) => distance(at, m.at) <= m.r.max(0.0) + HIT_TOLERANCE,
        Primitive::Segment(s) => distance_to_segment(at, s.a, s.b) <= reach,
        Primitive::Rect(r) => {
            let b = Bounds::new(r.x, r.y, r.w.max(0.0), r.h.max(0.0));
            let corners = [
                (b.x, b.y),
                (b.max_x(), b.y),
                (b.max_x(), b.max_y()),
                (b.x, b.max_y()),
            ];
            (filled && b.contains(at.0, at.1)) || outline_distance(at, &corners) <= reach
        }
        Primitive::Circle(c) => {
            let d = distance(at, (c.cx, c.cy));
            (filled && d <= c.r) || (d - c.r).abs() <= reach
        }
        Primitive::Ellipse(e) => {
            let (rx, ry) = (e.rx.max(f64::EPSILON), e.ry.max(f64::EPSILON));
            let (nx, ny) = ((at.0 - e.cx) / rx, (at.1 - e.cy) / ry);
            let k = nx.hypot(ny);
            // Radial distance to the outline, scaled by the smaller radius.
            (filled && k <= 1.0) || (k - 1.0).abs() * rx.min(ry) <= reach
        }
        Primitive::Polygon(poly) => {
            (filled && point_in_polygon(at, &poly.points))
                || outline_distance(at, &poly.points) <= reach
        }
    }
}

/// Distance from `at` to a closed polyline.
fn outline_distance(at: Xy, vertices: &[Xy]) -> f64 {
    match vertices {
        [] => f64::INFINITY,
        [only] => distance(at, *only),
        _ => vertices
            .iter()
            .zip(vertices.iter().cycle().skip(1))
            .map(|(&a, &b)| distance_to_segment(at, a, b))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Find every element whose extent intersects the given rectangle.
/// Used for marquee (box) selection.
pub fn hit_test_rect(scene: &Scene, area: &Bounds) -> Vec<ElementRef> {
    scene
        .element_refs()
        .filter(|&r| {
            scene
                .bounds_of(r)
                .is_some_and(|b| b.intersects(area) || area.encloses(&b))
        })
        .collect()
}
