//! Integration tests: validated scene → SVG / PNG files.

use mdr_core::{NormalizeOptions, Scene, normalize, validate};
use mdr_export::{Format, export_png, export_svg, write_export};
use pretty_assertions::assert_eq;

fn scene() -> Scene {
    let raw: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/paired_triangles.json")).unwrap();
    normalize(&validate(&raw).unwrap(), &NormalizeOptions::default())
}

#[test]
fn svg_export_is_renderer_output() {
    let scene = scene();
    assert_eq!(export_svg(&scene), mdr_render::render(&scene));
}

#[test]
fn png_export_matches_canvas() {
    let png = export_png(&scene()).unwrap();
    assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 900);
    assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 450);
}

#[test]
fn write_export_picks_format_by_extension() {
    let dir = std::env::temp_dir().join(format!("mdr-export-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let scene = scene();

    let svg_path = dir.join("scene.svg");
    assert_eq!(write_export(&scene, &svg_path).unwrap(), Format::Svg);
    assert_eq!(std::fs::read_to_string(&svg_path).unwrap(), export_svg(&scene));

    let png_path = dir.join("scene.png");
    assert_eq!(write_export(&scene, &png_path).unwrap(), Format::Png);
    assert!(std::fs::read(&png_path).unwrap().starts_with(b"\x89PNG"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_directory_is_an_io_error() {
    let path = std::env::temp_dir().join("mdr-export-missing-dir/none/scene.svg");
    assert!(matches!(
        write_export(&scene(), &path),
        Err(mdr_export::ExportError::Io(_))
    ));
}
