//! Scene → SVG markup.
//!
//! Every primitive is tagged with its `(kind, index)` address so a rendered
//! element can be traced back to the scene: shapes are wrapped in
//! `<g data-entity=".." data-index="..">`, labels carry `data-label-index`.

use mdr_core::{ElementRef, Primitive, ResolvedStyle, Scene};
use std::fmt::Write as _;

/// `id` of the root `<svg>` element.
pub const ROOT_ID: &str = "diagramSvg";

pub const ATTR_ENTITY: &str = "data-entity";
pub const ATTR_INDEX: &str = "data-index";
pub const ATTR_LABEL_INDEX: &str = "data-label-index";

const SHAPE_STYLE: &str = "cursor: grab; touch-action: none;";
const LABEL_STYLE: &str = "cursor: move; touch-action: none;";

/// Escape text for use in element content or attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn join_numbers(values: &[f64], sep: &str) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Geometry attributes of the element drawn for `r`.
///
/// These are the only attributes that change while an element is dragged,
/// so a live preview patches exactly this list.
pub fn element_attributes(scene: &Scene, r: ElementRef) -> Vec<(&'static str, String)> {
    let Some(p) = scene.get(r) else {
        return Vec::new();
    };
    match p {
        Primitive::Rect(s) => vec![
            ("x", s.x.to_string()),
            ("y", s.y.to_string()),
            ("width", s.w.to_string()),
            ("height", s.h.to_string()),
        ],
        Primitive::Circle(s) => vec![
            ("cx", s.cx.to_string()),
            ("cy", s.cy.to_string()),
            ("r", s.r.to_string()),
        ],
        Primitive::Ellipse(s) => vec![
            ("cx", s.cx.to_string()),
            ("cy", s.cy.to_string()),
            ("rx", s.rx.to_string()),
            ("ry", s.ry.to_string()),
        ],
        Primitive::Polygon(s) => vec![(
            "points",
            s.points
                .iter()
                .map(|(x, y)| format!("{x},{y}"))
                .collect::<Vec<_>>()
                .join(" "),
        )],
        Primitive::Segment(s) => vec![
            ("x1", s.a.0.to_string()),
            ("y1", s.a.1.to_string()),
            ("x2", s.b.0.to_string()),
            ("y2", s.b.1.to_string()),
        ],
        Primitive::Point(s) => vec![
            ("cx", s.at.0.to_string()),
            ("cy", s.at.1.to_string()),
            ("r", s.r.to_string()),
        ],
        Primitive::Label(s) => vec![("x", s.x.to_string()), ("y", s.y.to_string())],
    }
}

fn attrs(list: &[(&str, String)]) -> String {
    list.iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn paint_attrs(style: &ResolvedStyle) -> String {
    format!(
        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        escape(&style.fill),
        escape(&style.stroke),
        style.stroke_width
    )
}

/// Render a scene to a standalone SVG document.
///
/// Pure: the same scene always yields the same markup.
pub fn render(scene: &Scene) -> String {
    let (w, h) = (scene.canvas.width, scene.canvas.height);
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg id=\"{ROOT_ID}\" xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    );
    let _ = writeln!(
        svg,
        "  <rect width=\"100%\" height=\"100%\" fill=\"{}\" />",
        escape(&scene.canvas.bg)
    );

    for r in scene.element_refs() {
        if let Some(p) = scene.get(r) {
            render_primitive(&mut svg, scene, r, p);
        }
    }

    svg.push_str("</svg>");
    log::trace!("rendered {} bytes of SVG", svg.len());
    svg
}

fn render_primitive(out: &mut String, scene: &Scene, r: ElementRef, p: Primitive<'_>) {
    let geometry = attrs(&element_attributes(scene, r));
    let style = scene.style_of(p);

    let inner = match p {
        Primitive::Rect(s) => format!(
            "<rect {geometry} rx=\"{}\" ry=\"{}\" {} />",
            s.rx,
            s.ry,
            paint_attrs(&style)
        ),
        Primitive::Circle(_) | Primitive::Point(_) => {
            format!("<circle {geometry} {} />", paint_attrs(&style))
        }
        Primitive::Ellipse(_) => format!("<ellipse {geometry} {} />", paint_attrs(&style)),
        Primitive::Polygon(_) => format!("<polygon {geometry} {} />", paint_attrs(&style)),
        Primitive::Segment(s) => {
            let dash = s
                .dash
                .as_deref()
                .map(|d| format!(" stroke-dasharray=\"{}\"", join_numbers(d, " ")))
                .unwrap_or_default();
            format!(
                "<line {geometry} stroke=\"{}\" stroke-width=\"{}\"{dash} />",
                escape(&style.stroke),
                style.stroke_width
            )
        }
        Primitive::Label(l) => {
            let weight = if l.bold { 700 } else { 400 };
            let _ = writeln!(
                out,
                "  <text {ATTR_LABEL_INDEX}=\"{}\" {geometry} fill=\"{}\" font-size=\"{}\" font-family=\"{}\" font-weight=\"{weight}\" dominant-baseline=\"middle\" text-anchor=\"middle\" style=\"{LABEL_STYLE}\">{}</text>",
                r.index,
                escape(scene.label_color(l)),
                scene.label_font_size(l),
                escape(&scene.defaults.font_family),
                escape(&l.text)
            );
            return;
        }
    };

    let _ = writeln!(
        out,
        "  <g {ATTR_ENTITY}=\"{}\" {ATTR_INDEX}=\"{}\" style=\"{SHAPE_STYLE}\">{inner}</g>",
        r.kind, r.index
    );
}
