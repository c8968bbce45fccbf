//! Integration tests: pointer gestures → drag engine → committed scene.
//!
//! Covers rigid-body bound preservation for every element of a messy scene
//! and link propagation from polygons to vertex labels and from segments to
//! endpoint markers.

use mdr_core::{Bounds, ElementRef, EntityKind, NormalizeOptions, Scene, Xy, normalize, validate};
use mdr_editor::{Capture, DragSession, InputEvent, LinkTolerance, Modifiers, Session};
use mdr_render::TargetElement;
use pretty_assertions::assert_eq;

const TRIANGLE: ElementRef = ElementRef::new(EntityKind::Polygon, 0);
const SEGMENT: ElementRef = ElementRef::new(EntityKind::Segment, 0);

fn load(fixture: &str) -> Scene {
    let raw: serde_json::Value = serde_json::from_str(fixture).unwrap();
    validate(&raw).unwrap()
}

fn points_of(scene: &Scene, r: ElementRef) -> Vec<Xy> {
    scene.get(r).unwrap().geometry().extent_points().to_vec()
}

fn label_at(scene: &Scene, text: &str) -> Xy {
    let l = scene.labels.iter().find(|l| l.text == text).unwrap();
    (l.x, l.y)
}

// ─── Bound preservation ──────────────────────────────────────────────────

#[test]
fn every_drag_keeps_members_on_canvas_and_rigid() {
    let raw = load(include_str!("fixtures/messy_generator.json"));
    let scene = normalize(&raw, &NormalizeOptions::default());
    let canvas = scene.canvas.bounds();
    let pulls = [(2000.0, 0.0), (-2000.0, 0.0), (0.0, 2000.0), (-2000.0, -2000.0), (13.37, -7.5)];

    for target in scene.element_refs() {
        for &(px, py) in &pulls {
            // A polygon without vertices has no extent to drag.
            let Some(mut drag) =
                DragSession::begin(&scene, target, &[], (0.0, 0.0), &LinkTolerance::default())
            else {
                assert!(points_of(&scene, target).is_empty());
                continue;
            };
            drag.update((px, py));
            let (dx, dy) = drag.delta();
            let members = drag.members().to_vec();
            let mut moved = scene.clone();
            drag.commit(&mut moved);

            for r in scene.element_refs() {
                let before = points_of(&scene, r);
                let after = points_of(&moved, r);
                if members.contains(&r) {
                    for (&(x0, y0), &(x1, y1)) in before.iter().zip(&after) {
                        assert!(
                            canvas.expand(1e-6).contains(x1, y1),
                            "{r} left the canvas dragging {target} by ({px}, {py})"
                        );
                        assert!((x1 - x0 - dx).abs() < 0.011 && (y1 - y0 - dy).abs() < 0.011);
                    }
                } else {
                    assert_eq!(before, after, "{r} moved while dragging {target}");
                }
            }
        }
    }
}

// ─── Link propagation ────────────────────────────────────────────────────

#[test]
fn triangle_drag_carries_vertex_label_only() {
    let mut scene = load(include_str!("fixtures/labelled_triangle.json"));
    let (a, z, area) = (label_at(&scene, "A"), label_at(&scene, "Z"), label_at(&scene, "area"));

    let mut drag =
        DragSession::begin(&scene, TRIANGLE, &[], (100.0, 100.0), &LinkTolerance::default()).unwrap();
    drag.update((120.0, 90.0));
    assert_eq!(drag.commit(&mut scene), Some((20.0, -10.0)));

    assert_eq!(label_at(&scene, "A"), (a.0 + 20.0, a.1 - 10.0));
    assert_eq!(label_at(&scene, "Z"), z);
    assert_eq!(label_at(&scene, "area"), area);
    assert_eq!(scene.polygons[0].points[0], (70.0, 40.0));
}

#[test]
fn segment_drag_carries_endpoint_markers_only() {
    let mut scene = load(include_str!("fixtures/labelled_triangle.json"));
    let lone = scene.points[2].at;

    let mut drag = DragSession::begin(&scene, SEGMENT, &[], (0.0, 0.0), &LinkTolerance::default()).unwrap();
    drag.update((-50.0, 25.0));
    drag.commit(&mut scene);

    assert_eq!(scene.segments[0].a, (350.0, 325.0));
    assert_eq!(scene.points[0].at, (350.0, 325.0));
    assert_eq!(scene.points[1].at, (550.0, 325.0));
    assert_eq!(scene.points[2].at, lone);
}

#[test]
fn session_gesture_commits_linked_label_once() {
    let mut session = Session::default();
    session
        .load_json(include_str!("fixtures/labelled_triangle.json"))
        .unwrap();
    let a = label_at(session.scene(), "A");
    let z = label_at(session.scene(), "Z");

    let target = TargetElement::new("polygon")
        .with_parent_attr("data-entity", "polygon")
        .with_parent_attr("data-index", 0);
    let down = session.pointer_down((150.0, 150.0), 1, Modifiers::NONE, Some(&target));
    assert_eq!(down.capture, Some(Capture::Acquire(1)));

    let preview = session.pointer_move((170.0, 140.0), 1).preview.unwrap();
    assert_eq!((preview.dx, preview.dy), (20.0, -10.0));
    // Triangle plus its vertex label.
    assert_eq!(preview.patches.len(), 2);
    assert_eq!(label_at(session.scene(), "A"), a);

    let up = session.handle_event(&InputEvent::PointerCancel { pointer_id: 1 }, None);
    assert!(up.changed);
    assert_eq!(up.capture, Some(Capture::Release(1)));
    assert_eq!(label_at(session.scene(), "A"), (a.0 + 20.0, a.1 - 10.0));
    assert_eq!(label_at(session.scene(), "Z"), z);

    assert!(session.undo());
    assert_eq!(label_at(session.scene(), "A"), a);
}

#[test]
fn hit_tested_press_without_target_selects_topmost() {
    let mut session = Session::default();
    session
        .load_json(include_str!("fixtures/labelled_triangle.json"))
        .unwrap();

    // Inside the filled triangle, below the "area" label.
    session.pointer_down((150.0, 150.0), 4, Modifiers::NONE, None);
    assert_eq!(session.selection().members(), &[TRIANGLE]);
    session.pointer_up(None, 4);

    // Shift-press on empty canvas keeps the selection; plain press clears it.
    session.pointer_down((800.0, 400.0), 4, Modifiers::SHIFT, None);
    assert_eq!(session.selection().len(), 1);
    session.pointer_down((800.0, 400.0), 4, Modifiers::NONE, None);
    assert!(session.selection().is_empty());
}

#[test]
fn marquee_selects_segment_and_its_markers() {
    let mut session = Session::default();
    session
        .load_json(include_str!("fixtures/labelled_triangle.json"))
        .unwrap();

    let picked = session
        .select_in_rect(Bounds::new(350.0, 250.0, 300.0, 100.0))
        .to_vec();
    assert_eq!(
        picked,
        vec![
            SEGMENT,
            ElementRef::new(EntityKind::Point, 0),
            ElementRef::new(EntityKind::Point, 1),
        ]
    );

    assert!(session.select_in_rect(Bounds::new(700.0, 350.0, 50.0, 50.0)).is_empty());
    assert!(session.selection().is_empty());
}
