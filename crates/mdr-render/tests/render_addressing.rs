//! Integration tests: scene → SVG → addresses.
//!
//! Rendering a validated scene and scanning the markup back must recover
//! the `(kind, index)` address of every primitive, both through the address
//! attributes and through the DOM-order fallback.

use mdr_core::{NormalizeOptions, Scene, normalize, validate};
use mdr_render::{TargetElement, render, resolve_target, scan_markup};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn scene() -> Scene {
    let raw: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/messy_generator.json")).unwrap();
    normalize(&validate(&raw).unwrap(), &NormalizeOptions::default())
}

#[test]
fn scan_recovers_every_address_in_paint_order() {
    let scene = scene();
    let scanned = scan_markup(&render(&scene)).unwrap();

    let addresses: Vec<_> = scanned.iter().map(|s| s.address).collect();
    let expected: Vec<_> = scene.element_refs().collect();
    assert_eq!(addresses, expected);

    for element in &scanned {
        assert_eq!(element.tag, element.address.kind.svg_tag());
    }
}

#[test]
fn rendered_attributes_resolve_to_their_element() {
    let scene = scene();
    let svg = render(&scene);
    let doc = roxmltree::Document::parse(&svg).unwrap();

    let mut checked = 0;
    for node in doc.descendants().filter(|n| n.is_element()) {
        let Some(parent) = node.parent_element() else { continue };
        if node.has_tag_name("g") {
            continue;
        }
        let mut target = TargetElement::new(node.tag_name().name());
        for a in node.attributes() {
            target = target.with_attr(a.name(), a.value());
        }
        for a in parent.attributes() {
            target = target.with_parent_attr(a.name(), a.value());
        }
        let Some(resolved) = resolve_target(&scene, &target) else { continue };
        let expected = node
            .attribute("data-label-index")
            .or_else(|| parent.attribute("data-index"))
            .unwrap();
        assert_eq!(resolved.index.to_string(), expected);
        checked += 1;
    }
    assert_eq!(checked, scene.element_refs().count());
}

#[test]
fn dom_order_fallback_matches_attribute_path() {
    let scene = scene();
    let svg = render(&scene);
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let scanned = scan_markup(&svg).unwrap();

    // Drawn elements, skipping the background rect and the <g> wrappers.
    let drawn = doc.descendants().filter(|n| {
        n.is_element()
            && (n.has_attribute("data-label-index")
                || n.parent_element().is_some_and(|p| p.has_attribute("data-entity")))
    });

    let mut seen: HashMap<String, usize> = HashMap::new();
    for (node, expected) in drawn.zip(&scanned) {
        let tag = node.tag_name().name().to_string();
        let slot = seen.entry(tag.clone()).or_default();
        // No address attributes and no coordinates: position only.
        let target = TargetElement::new(tag).at_dom_index(*slot);
        *slot += 1;
        assert_eq!(resolve_target(&scene, &target), Some(expected.address));
    }
}
