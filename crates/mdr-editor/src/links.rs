//! Link propagation: which annotations move with a dragged primitive.
//!
//! Links are derived from current geometry every time a drag begins and
//! are never stored. A marker sitting on a segment endpoint follows the
//! segment; a vertex-name label near a polygon vertex follows the polygon.

use mdr_core::config::{ENDPOINT_EPSILON, VERTEX_LABEL_RADIUS};
use mdr_core::geom::distance;
use mdr_core::{ElementRef, EntityKind, Scene, Xy};
use serde::Deserialize;
use smallvec::SmallVec;

/// Distances that decide whether two things are linked.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkTolerance {
    /// Per-axis distance from a segment endpoint to a point marker.
    pub endpoint: f64,
    /// Euclidean distance from a polygon vertex to a vertex label.
    pub vertex_label: f64,
}

impl Default for LinkTolerance {
    fn default() -> Self {
        Self {
            endpoint: ENDPOINT_EPSILON,
            vertex_label: VERTEX_LABEL_RADIUS,
        }
    }
}

/// Dependents of one primitive, by index into `points` and `labels`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Links {
    pub points: SmallVec<[usize; 2]>,
    pub labels: SmallVec<[usize; 4]>,
}

impl Links {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.labels.is_empty()
    }

    /// Linked elements as addresses.
    pub fn refs(&self) -> impl Iterator<Item = ElementRef> + '_ {
        self.points
            .iter()
            .map(|&i| ElementRef::new(EntityKind::Point, i))
            .chain(
                self.labels
                    .iter()
                    .map(|&i| ElementRef::new(EntityKind::Label, i)),
            )
    }
}

/// Compute the dependents of `r` with the stock tolerances.
pub fn compute_links(scene: &Scene, r: ElementRef) -> Links {
    compute_links_with(scene, r, &LinkTolerance::default())
}

pub fn compute_links_with(scene: &Scene, r: ElementRef, tol: &LinkTolerance) -> Links {
    let mut links = Links::default();
    match r.kind {
        EntityKind::Segment => {
            let Some(seg) = scene.segments.get(r.index) else {
                return links;
            };
            let same = |p: Xy, q: Xy| (p.0 - q.0).abs() <= tol.endpoint && (p.1 - q.1).abs() <= tol.endpoint;
            links.points.extend(
                scene
                    .points
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| same(p.at, seg.a) || same(p.at, seg.b))
                    .map(|(i, _)| i),
            );
        }
        EntityKind::Polygon => {
            let Some(poly) = scene.polygons.get(r.index) else {
                return links;
            };
            if poly.is_degenerate() {
                return links;
            }
            links.labels.extend(
                scene
                    .labels
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| l.is_vertex_name())
                    .filter(|(_, l)| {
                        poly.points
                            .iter()
                            .map(|&v| distance((l.x, l.y), v))
                            .fold(f64::INFINITY, f64::min)
                            <= tol.vertex_label
                    })
                    .map(|(i, _)| i),
            );
        }
        _ => {}
    }
    if !links.is_empty() {
        log::trace!("{r} links {:?}", links);
    }
    links
}
