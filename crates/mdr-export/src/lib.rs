//! Scene export: the renderer's SVG verbatim, or a PNG rasterized at the
//! canvas's pixel size on an opaque white background.

use mdr_core::Scene;
use mdr_render::render;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to parse SVG: {0}")]
    Parse(#[from] usvg::Error),
    #[error("failed to allocate a {width}×{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("failed to encode PNG: {0}")]
    Encode(String),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Output format, chosen from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Svg,
    Png,
}

impl Format {
    /// `.png` (any case) selects PNG; everything else is SVG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => Format::Png,
            _ => Format::Svg,
        }
    }
}

/// The vector export is exactly what the renderer draws.
pub fn export_svg(scene: &Scene) -> String {
    render(scene)
}

/// Rasterize SVG markup into a `width × height` pixmap filled white first.
pub fn rasterize(svg: &str, width: u32, height: u32) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(ExportError::Pixmap { width, height })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    log::debug!("rasterized {width}×{height}");
    Ok(pixmap)
}

/// Render and rasterize a scene at its canvas size, encoded as PNG.
pub fn export_png(scene: &Scene) -> Result<Vec<u8>> {
    let (width, height) = pixel_size(scene);
    let pixmap = rasterize(&export_svg(scene), width, height)?;
    pixmap
        .encode_png()
        .map_err(|e| ExportError::Encode(e.to_string()))
}

/// Export in the format the path's extension asks for and write it.
pub fn write_export(scene: &Scene, path: &Path) -> Result<Format> {
    let format = Format::from_path(path);
    match format {
        Format::Svg => std::fs::write(path, export_svg(scene))?,
        Format::Png => std::fs::write(path, export_png(scene)?)?,
    }
    log::info!("wrote {}", path.display());
    Ok(format)
}

fn pixel_size(scene: &Scene) -> (u32, u32) {
    let px = |v: f64| if v.is_finite() { v.round().max(1.0) as u32 } else { 1 };
    (px(scene.canvas.width), px(scene.canvas.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_core::Canvas;

    fn scene() -> Scene {
        Scene::new(Canvas {
            width: 120.0,
            height: 80.0,
            bg: "#ffffff".into(),
        })
    }

    #[test]
    fn png_is_canvas_sized() {
        let png = export_png(&scene()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR width and height, big-endian.
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 120);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 80);
    }

    #[test]
    fn background_is_opaque_white() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\"></svg>";
        let pixmap = rasterize(svg, 10, 10).unwrap();
        let px = pixmap.pixel(5, 5).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 255, 255, 255));
    }

    #[test]
    fn failures_are_errors() {
        assert!(matches!(rasterize("not svg", 10, 10), Err(ExportError::Parse(_))));
        let svg = export_svg(&scene());
        assert!(matches!(
            rasterize(&svg, 0, 10),
            Err(ExportError::Pixmap { width: 0, height: 10 })
        ));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("out.PNG")), Format::Png);
        assert_eq!(Format::from_path(Path::new("out.svg")), Format::Svg);
        assert_eq!(Format::from_path(Path::new("out")), Format::Svg);
    }
}
