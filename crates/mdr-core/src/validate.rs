//! Validator: untrusted JSON → well-formed `Scene`.
//!
//! Structural defects (no canvas, unusable canvas size) are rejected.
//! Everything else is repaired by substituting defaults, so the output always
//! has every collection present and every style field populated.

use crate::config::{
    DEFAULT_BACKGROUND, DEFAULT_FILL, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_STROKE,
    DEFAULT_STROKE_WIDTH, MARKER_FILL, MARKER_RADIUS, MARKER_STROKE, MARKER_STROKE_WIDTH,
    MAX_CANVAS, MIN_CANVAS,
};
use crate::error::ValidationError;
use crate::model::{
    Canvas, Circle, Defaults, Ellipse, Label, LineStyle, PointMarker, Polygon, Rect, Scene,
    Segment, ShapeStyle, Xy,
};
use serde_json::{Map, Value};
use std::sync::LazyLock;

static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

// ─── Coercion helpers ─────────────────────────────────────────────────────

/// Finite number from a JSON number or a numeric string.
fn number(v: Option<&Value>) -> Option<f64> {
    let x = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

fn num(obj: &Map<String, Value>, key: &str, fallback: f64) -> f64 {
    number(obj.get(key)).unwrap_or(fallback)
}

/// Non-blank string, else the fallback.
fn text(obj: &Map<String, Value>, key: &str, fallback: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => fallback.to_string(),
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|x| x != 0.0),
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true") || s.trim() == "1",
        _ => false,
    }
}

fn xy(v: Option<&Value>) -> Xy {
    match v {
        Some(Value::Array(pair)) if pair.len() == 2 => (
            number(pair.first()).unwrap_or(0.0),
            number(pair.get(1)).unwrap_or(0.0),
        ),
        _ => (0.0, 0.0),
    }
}

fn dash(v: Option<&Value>) -> Option<Vec<f64>> {
    let parts: Vec<f64> = match v? {
        Value::Array(items) => items.iter().filter_map(|i| number(Some(i))).collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(|p| p.parse::<f64>().ok())
            .collect(),
        _ => return None,
    };
    let parts: Vec<f64> = parts.into_iter().filter(|d| d.is_finite() && *d > 0.0).collect();
    (!parts.is_empty()).then_some(parts)
}

/// Items of a collection. Absent or non-array values yield nothing and
/// non-object items read as empty objects.
fn items<'a>(
    root: &'a Map<String, Value>,
    keys: &[&str],
) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
    let list = keys
        .iter()
        .find_map(|k| root.get(*k))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    list.iter().map(|v| v.as_object().unwrap_or(&*EMPTY))
}

fn shape_style(obj: &Map<String, Value>, d: &Defaults) -> ShapeStyle {
    ShapeStyle {
        stroke: Some(text(obj, "stroke", &d.stroke)),
        stroke_width: Some(num(obj, "strokeWidth", d.stroke_width)),
        fill: Some(text(obj, "fill", &d.fill)),
    }
}

// ─── Validation ───────────────────────────────────────────────────────────

/// Turn an arbitrary JSON value into a well-formed `Scene`.
///
/// # Errors
/// Fails only on structural defects: the input is not an object, the canvas
/// is missing, or its dimensions are non-numeric or outside `[100, 4000]`.
pub fn validate(raw: &Value) -> Result<Scene, ValidationError> {
    let root = raw.as_object().ok_or(ValidationError::NotAnObject)?;
    let canvas = match root.get("canvas") {
        Some(Value::Object(c)) => c,
        _ => return Err(ValidationError::MissingCanvas),
    };

    let (width, height) = match (number(canvas.get("width")), number(canvas.get("height"))) {
        (Some(w), Some(h)) => (w, h),
        _ => return Err(ValidationError::CanvasNotNumeric),
    };
    if width < MIN_CANVAS || height < MIN_CANVAS {
        return Err(ValidationError::CanvasTooSmall { width, height });
    }
    if width > MAX_CANVAS || height > MAX_CANVAS {
        return Err(ValidationError::CanvasTooLarge { width, height });
    }
    let bg = match canvas.get("bg") {
        Some(_) => text(canvas, "bg", DEFAULT_BACKGROUND),
        None => text(canvas, "backgroundColor", DEFAULT_BACKGROUND),
    };

    let d = root.get("defaults").and_then(Value::as_object).unwrap_or(&*EMPTY);
    let defaults = Defaults {
        stroke: text(d, "stroke", DEFAULT_STROKE),
        stroke_width: num(d, "strokeWidth", DEFAULT_STROKE_WIDTH),
        fill: text(d, "fill", DEFAULT_FILL),
        font_family: text(d, "fontFamily", DEFAULT_FONT_FAMILY),
        font_size: num(d, "fontSize", DEFAULT_FONT_SIZE),
        label_color: text(d, "labelColor", DEFAULT_STROKE),
    };

    let rects = items(root, &["rects", "rectangles"])
        .map(|r| Rect {
            x: num(r, "x", 0.0),
            y: num(r, "y", 0.0),
            w: number(r.get("w")).or_else(|| number(r.get("width"))).unwrap_or(0.0),
            h: number(r.get("h")).or_else(|| number(r.get("height"))).unwrap_or(0.0),
            rx: num(r, "rx", 0.0),
            ry: num(r, "ry", 0.0),
            style: shape_style(r, &defaults),
        })
        .collect();

    let circles = items(root, &["circles"])
        .map(|c| Circle {
            cx: num(c, "cx", 0.0),
            cy: num(c, "cy", 0.0),
            r: num(c, "r", 0.0),
            style: shape_style(c, &defaults),
        })
        .collect();

    let ellipses = items(root, &["ellipses"])
        .map(|e| Ellipse {
            cx: num(e, "cx", 0.0),
            cy: num(e, "cy", 0.0),
            rx: num(e, "rx", 0.0),
            ry: num(e, "ry", 0.0),
            style: shape_style(e, &defaults),
        })
        .collect();

    let polygons = items(root, &["polygons"])
        .map(|p| Polygon {
            points: p
                .get("points")
                .and_then(Value::as_array)
                .map(|pts| pts.iter().map(|v| xy(Some(v))).collect())
                .unwrap_or_default(),
            style: shape_style(p, &defaults),
        })
        .collect();

    let segments = items(root, &["segments"])
        .map(|s| Segment {
            a: xy(s.get("a")),
            b: xy(s.get("b")),
            dash: dash(s.get("dash")),
            style: LineStyle {
                stroke: Some(text(s, "stroke", &defaults.stroke)),
                stroke_width: Some(num(s, "strokeWidth", defaults.stroke_width)),
            },
        })
        .collect();

    let points = items(root, &["points"])
        .map(|p| PointMarker {
            at: xy(p.get("at")),
            r: num(p, "r", MARKER_RADIUS),
            style: ShapeStyle {
                stroke: Some(text(p, "stroke", MARKER_STROKE)),
                stroke_width: Some(num(p, "strokeWidth", MARKER_STROKE_WIDTH)),
                fill: Some(text(p, "fill", MARKER_FILL)),
            },
        })
        .collect();

    let labels = items(root, &["labels"])
        .map(|l| Label {
            text: l
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            x: num(l, "x", 0.0),
            y: num(l, "y", 0.0),
            color: Some(text(l, "color", &defaults.label_color)),
            font_size: Some(num(l, "fontSize", defaults.font_size)),
            bold: flag(l, "bold"),
        })
        .collect();

    let scene = Scene {
        canvas: Canvas { width, height, bg },
        defaults,
        rects,
        circles,
        ellipses,
        polygons,
        segments,
        points,
        labels,
    };
    log::debug!(
        "validated scene {}×{}: {} elements",
        scene.canvas.width,
        scene.canvas.height,
        scene.element_refs().count()
    );
    Ok(scene)
}
