//! Rigid-body drag engine.
//!
//! `Idle → Dragging(mode) → Idle`. A drag captures the base geometry of every
//! member (plus linked dependents) when it begins; pointer moves only update
//! a preview copy, and the scene itself changes once, at commit.

use crate::links::{LinkTolerance, compute_links_with};
use mdr_core::geom::clamp;
use mdr_core::{Bounds, ElementRef, EntityKind, Scene, Xy};
use mdr_render::element_attributes;
use serde::Serialize;

/// What kind of drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    /// One label; only its anchor is kept in bounds.
    Label,
    /// One non-label primitive and its linked dependents.
    Single,
    /// A multi-selection containing the pointer target.
    Group,
}

/// New geometry attributes for one rendered element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementPatch {
    pub entity: EntityKind,
    pub index: usize,
    pub attrs: Vec<(&'static str, String)>,
}

/// Result of a pointer move during a drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub dx: f64,
    pub dy: f64,
    pub patches: Vec<ElementPatch>,
}

/// Allowed translation range on both axes. Always contains zero.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DeltaRange {
    x: (f64, f64),
    y: (f64, f64),
}

impl DeltaRange {
    /// Range that keeps `extent` inside `area`. An axis already outside the
    /// area is never forced to move.
    fn keeping(extent: Bounds, area: Bounds) -> Self {
        let axis = |lo: f64, hi: f64, min: f64, max: f64| ((min - lo).min(0.0), (max - hi).max(0.0));
        Self {
            x: axis(extent.x, extent.max_x(), area.x, area.max_x()),
            y: axis(extent.y, extent.max_y(), area.y, area.max_y()),
        }
    }

    fn apply(&self, dx: f64, dy: f64) -> Xy {
        (clamp(dx, self.x.0, self.x.1), clamp(dy, self.y.0, self.y.1))
    }
}

/// One gesture in progress.
#[derive(Debug, Clone)]
pub struct DragSession {
    mode: DragMode,
    target: ElementRef,
    /// Dragged elements followed by linked dependents, deduplicated.
    members: Vec<ElementRef>,
    base: Scene,
    preview: Scene,
    origin: Xy,
    range: DeltaRange,
    delta: Xy,
}

impl DragSession {
    /// Start dragging `target` from scene position `origin`.
    ///
    /// The selection decides the mode: a target inside a selection of two or
    /// more drags the whole group. Returns `None` for a stale target.
    pub fn begin(
        scene: &Scene,
        target: ElementRef,
        selection: &[ElementRef],
        origin: Xy,
        tol: &LinkTolerance,
    ) -> Option<Self> {
        if !scene.contains(target) {
            return None;
        }
        let mode = if selection.len() >= 2 && selection.contains(&target) {
            DragMode::Group
        } else if target.kind == EntityKind::Label {
            DragMode::Label
        } else {
            DragMode::Single
        };

        let mut members: Vec<ElementRef> = match mode {
            DragMode::Group => selection
                .iter()
                .copied()
                .filter(|r| scene.contains(*r))
                .collect(),
            _ => vec![target],
        };
        if mode != DragMode::Label {
            let linked: Vec<ElementRef> = members
                .iter()
                .flat_map(|&r| compute_links_with(scene, r, tol).refs().collect::<Vec<_>>())
                .collect();
            for r in linked {
                if !members.contains(&r) {
                    members.push(r);
                }
            }
        }

        let extent = Bounds::from_points(
            members
                .iter()
                .filter_map(|&r| scene.get(r))
                .flat_map(|p| p.geometry().extent_points())
                .collect::<Vec<_>>()
                .iter(),
        )?;
        let range = DeltaRange::keeping(extent, scene.canvas.bounds());

        log::debug!(
            "begin {:?} drag on {target} ({} members)",
            mode,
            members.len()
        );
        Some(Self {
            mode,
            target,
            members,
            base: scene.clone(),
            preview: scene.clone(),
            origin,
            range,
            delta: (0.0, 0.0),
        })
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn target(&self) -> ElementRef {
        self.target
    }

    pub fn members(&self) -> &[ElementRef] {
        &self.members
    }

    /// The clamped delta of the latest update.
    pub fn delta(&self) -> Xy {
        self.delta
    }

    /// Scene as it would look if committed now.
    pub fn preview_scene(&self) -> &Scene {
        &self.preview
    }

    /// Move the pointer to scene position `pointer`. Never touches the scene.
    pub fn update(&mut self, pointer: Xy) -> Preview {
        let (dx, dy) = self
            .range
            .apply(pointer.0 - self.origin.0, pointer.1 - self.origin.1);
        self.delta = (dx, dy);

        let patches = self
            .members
            .iter()
            .map(|&r| {
                self.preview.copy_from(&self.base, r);
                self.preview.translate(r, dx, dy);
                ElementPatch {
                    entity: r.kind,
                    index: r.index,
                    attrs: element_attributes(&self.preview, r),
                }
            })
            .collect();
        log::trace!("drag delta ({dx}, {dy})");
        Preview { dx, dy, patches }
    }

    /// Apply the final delta to every member exactly once.
    /// Returns `None` when nothing moved.
    pub fn commit(self, scene: &mut Scene) -> Option<Xy> {
        let (dx, dy) = self.delta;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        for &r in &self.members {
            scene.translate(r, dx, dy);
        }
        log::debug!("commit {:?} drag by ({dx}, {dy})", self.mode);
        Some(self.delta)
    }
}

/// Explicit drag state machine.
#[derive(Debug, Clone, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Dragging(s) => Some(s),
            DragState::Idle => None,
        }
    }

    /// Enter `Dragging`. Returns `false` (and stays idle) for a stale target.
    pub fn begin_drag(
        &mut self,
        scene: &Scene,
        target: ElementRef,
        selection: &[ElementRef],
        origin: Xy,
        tol: &LinkTolerance,
    ) -> bool {
        match DragSession::begin(scene, target, selection, origin, tol) {
            Some(session) => {
                *self = DragState::Dragging(session);
                true
            }
            None => false,
        }
    }

    pub fn update_drag(&mut self, pointer: Xy) -> Option<Preview> {
        match self {
            DragState::Dragging(s) => Some(s.update(pointer)),
            DragState::Idle => None,
        }
    }

    /// Leave `Dragging`, applying the final delta.
    pub fn commit_drag(&mut self, scene: &mut Scene) -> Option<Xy> {
        match std::mem::take(self) {
            DragState::Dragging(s) => s.commit(scene),
            DragState::Idle => None,
        }
    }

    /// Leave `Dragging`, discarding the preview. Returns whether a drag was
    /// in progress.
    pub fn cancel_drag(&mut self) -> bool {
        std::mem::take(self).is_dragging()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_core::validate;
    use serde_json::json;

    fn scene() -> Scene {
        validate(&json!({
            "canvas": {"width": 400, "height": 300},
            "rects": [{"x": 100, "y": 100, "w": 50, "h": 50}],
            "segments": [{"a": [20, 20], "b": [120, 20]}],
            "points": [{"at": [120, 20]}],
            "labels": [{"text": "P", "x": 390, "y": 150}],
        }))
        .unwrap()
    }

    const RECT: ElementRef = ElementRef::new(EntityKind::Rect, 0);
    const SEG: ElementRef = ElementRef::new(EntityKind::Segment, 0);
    const LABEL: ElementRef = ElementRef::new(EntityKind::Label, 0);

    #[test]
    fn preview_does_not_touch_scene() {
        let s = scene();
        let mut drag = DragSession::begin(&s, RECT, &[], (0.0, 0.0), &LinkTolerance::default()).unwrap();
        let preview = drag.update((30.0, 10.0));
        assert_eq!((preview.dx, preview.dy), (30.0, 10.0));
        assert_eq!(
            preview.patches[0].attrs[..2],
            [("x", "130".to_string()), ("y", "110".to_string())]
        );
        assert_eq!(s, scene());
    }

    #[test]
    fn delta_clamps_to_canvas() {
        let mut s = scene();
        let mut drag = DragSession::begin(&s, RECT, &[], (0.0, 0.0), &LinkTolerance::default()).unwrap();
        drag.update((1000.0, -1000.0));
        // The 3px stroke keeps 1.5px clear of each edge.
        assert_eq!(drag.delta(), (248.5, -98.5));
        drag.commit(&mut s);
        assert_eq!((s.rects[0].x, s.rects[0].y), (348.5, 1.5));
    }

    #[test]
    fn label_drag_keeps_anchor_inside() {
        let mut s = scene();
        let mut drag = DragSession::begin(&s, LABEL, &[], (0.0, 0.0), &LinkTolerance::default()).unwrap();
        assert_eq!(drag.mode(), DragMode::Label);
        drag.update((25.0, 5.0));
        drag.commit(&mut s);
        assert_eq!((s.labels[0].x, s.labels[0].y), (400.0, 155.0));
    }

    #[test]
    fn segment_drag_carries_endpoint_marker() {
        let mut s = scene();
        let mut drag = DragSession::begin(&s, SEG, &[], (0.0, 0.0), &LinkTolerance::default()).unwrap();
        assert_eq!(drag.members(), &[SEG, ElementRef::new(EntityKind::Point, 0)]);
        drag.update((10.0, 40.0));
        drag.commit(&mut s);
        assert_eq!(s.segments[0].b, (130.0, 60.0));
        assert_eq!(s.points[0].at, (130.0, 60.0));
    }

    #[test]
    fn group_drag_moves_every_member() {
        let mut s = scene();
        let selection = [RECT, LABEL];
        let mut drag = DragSession::begin(&s, RECT, &selection, (0.0, 0.0), &LinkTolerance::default()).unwrap();
        assert_eq!(drag.mode(), DragMode::Group);
        // The label is 10px from the right edge.
        drag.update((50.0, 0.0));
        assert_eq!(drag.delta(), (10.0, 0.0));
        drag.commit(&mut s);
        assert_eq!(s.rects[0].x, 110.0);
        assert_eq!(s.labels[0].x, 400.0);
    }

    #[test]
    fn zero_delta_commit_reports_nothing() {
        let mut s = scene();
        let mut state = DragState::default();
        assert!(state.begin_drag(&s, RECT, &[], (5.0, 5.0), &LinkTolerance::default()));
        state.update_drag((5.0, 5.0));
        assert_eq!(state.commit_drag(&mut s), None);
        assert!(!state.is_dragging());
        assert_eq!(s, scene());
    }

    #[test]
    fn cancel_discards_preview() {
        let s = scene();
        let mut state = DragState::default();
        state.begin_drag(&s, RECT, &[], (0.0, 0.0), &LinkTolerance::default());
        state.update_drag((20.0, 20.0));
        assert!(state.cancel_drag());
        assert!(!state.cancel_drag());
        assert_eq!(s, scene());
    }

    #[test]
    fn stale_target_stays_idle() {
        let s = scene();
        let mut state = DragState::default();
        let stale = ElementRef::new(EntityKind::Polygon, 3);
        assert!(!state.begin_drag(&s, stale, &[], (0.0, 0.0), &LinkTolerance::default()));
        assert!(state.update_drag((1.0, 1.0)).is_none());
    }
}
