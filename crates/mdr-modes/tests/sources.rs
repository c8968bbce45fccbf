//! Integration tests: every scene source → validate → normalize.

use mdr_core::config::DEFAULT_MARGIN;
use mdr_core::{NormalizeOptions, out_of_bounds};
use mdr_modes::{
    GraphProducer, LayoutHints, SourceRequest, TemplateSource, load_from_source, templates,
};
use pretty_assertions::assert_eq;

#[test]
fn every_template_loads_inside_the_margin() {
    for t in templates::builtin() {
        let source = TemplateSource::new(t.id).unwrap();
        let request = SourceRequest::new(t.description);
        let options = LayoutHints::from_description(t.description).apply(&NormalizeOptions::default());
        let scene = load_from_source(&source, &request, &options).unwrap();

        let area = scene.canvas.inset(DEFAULT_MARGIN);
        assert_eq!(out_of_bounds(&scene, &area), vec![], "{}", t.id);
    }
}

#[test]
fn paired_template_lands_in_left_and_right_slots() {
    let t = templates::find("pa-similar-rectangles").unwrap();
    let hints = LayoutHints::from_description(t.description);
    assert!(hints.wants_two);

    let source = TemplateSource::new(t.id).unwrap();
    let scene = load_from_source(&source, &SourceRequest::new(t.description), &hints.apply(&NormalizeOptions::default()))
        .unwrap();
    let (left, right) = (
        scene.bounds_of(mdr_core::ElementRef::new(mdr_core::EntityKind::Rect, 0)).unwrap(),
        scene.bounds_of(mdr_core::ElementRef::new(mdr_core::EntityKind::Rect, 1)).unwrap(),
    );
    assert!(left.center().0 < scene.canvas.width / 2.0);
    assert!(right.center().0 > scene.canvas.width / 2.0);
}

#[test]
fn graph_source_survives_normalization() {
    let request = SourceRequest {
        description: "Create a coordinate plane from -10 to 10. Plot y = 2x + 1.".into(),
        canvas_width: 900.0,
        canvas_height: 450.0,
    };
    let scene = load_from_source(&GraphProducer, &request, &NormalizeOptions::default()).unwrap();
    assert_eq!(scene.canvas.width, 900.0);
    assert_eq!(scene.points.len(), 2);
    assert!(scene.segments.iter().all(|s| !s.is_zero_length()));
    assert_eq!(out_of_bounds(&scene, &scene.canvas.inset(DEFAULT_MARGIN)), vec![]);
}
