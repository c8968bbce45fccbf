//! Local Cartesian-plane producer.
//!
//! Reads a symmetric range (`from A to B`) and a linear equation
//! (`y = ax + b`) out of free text and draws grid, axes, tick labels, the
//! sampled line, and its intercepts. No external generator involved.

use crate::producer::{SceneSource, SourceError, SourceRequest};
use mdr_core::geom::{clamp, round2};
use regex::Regex;
use serde_json::{Value, json};
use std::sync::OnceLock;

const MIN_SIDE: f64 = 200.0;
const MAX_SIDE: f64 = 4000.0;
const DEFAULT_RANGE: (f64, f64) = (-10.0, 10.0);
const HEADER_CHARS: usize = 80;

const GRID_STROKE: &str = "#e3e3e3";
const AXIS_STROKE: &str = "#000000";
const TEXT_COLOR: &str = "#111";

/// Most grid lines drawn per axis before the step widens.
const MAX_GRID_LINES: f64 = 100.0;

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)from\s+(-?\d+(?:\.\d+)?)\s+to\s+(-?\d+(?:\.\d+)?)")
            .expect("range regex must compile")
    })
}

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)y=([+-]?\d*\.?\d*)\*?x([+-]\d+(?:\.\d+)?)?")
            .expect("line regex must compile")
    })
}

/// A parsed `y = ax + b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear {
    pub a: f64,
    pub b: f64,
}

impl Linear {
    pub fn at(&self, x: f64) -> f64 {
        self.a * x + self.b
    }

    /// `y = 2x + 1`, `y = -1x - 3`, `y = 0.5x`.
    pub fn equation(&self) -> String {
        let tail = if self.b == 0.0 {
            String::new()
        } else if self.b > 0.0 {
            format!(" + {}", self.b)
        } else {
            format!(" - {}", self.b.abs())
        };
        format!("y = {}x{tail}", self.a)
    }
}

/// Parse `from A to B` into an ordered, non-empty range.
pub fn parse_range(description: &str) -> Option<(f64, f64)> {
    let caps = range_re().captures(description)?;
    let a: f64 = caps[1].parse().ok()?;
    let b: f64 = caps[2].parse().ok()?;
    (a.is_finite() && b.is_finite() && a != b).then(|| (a.min(b), a.max(b)))
}

/// Parse the first `y = ax + b` in the text, ignoring whitespace.
pub fn parse_linear(description: &str) -> Option<Linear> {
    let compact: String = description.chars().filter(|c| !c.is_whitespace()).collect();
    let caps = line_re().captures(&compact)?;
    let a: f64 = match &caps[1] {
        "" | "+" => 1.0,
        "-" => -1.0,
        raw => raw.parse().ok()?,
    };
    let b: f64 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0.0,
    };
    (f64::is_finite(a) && f64::is_finite(b)).then_some(Linear { a, b })
}

/// Maps graph units to canvas pixels.
struct Plane {
    w: f64,
    h: f64,
    margin: f64,
    min: f64,
    max: f64,
}

impl Plane {
    fn x(&self, v: f64) -> f64 {
        round2(self.margin + (v - self.min) / (self.max - self.min) * (self.w - 2.0 * self.margin))
    }

    fn y(&self, v: f64) -> f64 {
        round2(self.h - self.margin - (v - self.min) / (self.max - self.min) * (self.h - 2.0 * self.margin))
    }

    fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    /// Integer positions in range, every `step` units.
    fn ticks(&self, step: i64) -> impl Iterator<Item = i64> {
        let (lo, hi) = (self.min.ceil() as i64, self.max.floor() as i64);
        (lo..=hi).step_by(step.max(1) as usize)
    }
}

fn segment(a: (f64, f64), b: (f64, f64), stroke: &str, width: f64) -> Value {
    json!({"a": [a.0, a.1], "b": [b.0, b.1], "stroke": stroke, "strokeWidth": width})
}

fn text(text: &str, x: f64, y: f64, size: f64, bold: bool) -> Value {
    json!({"text": text, "x": x, "y": y, "fontSize": size, "color": TEXT_COLOR, "bold": bold})
}

/// Build the graph scene for `description` on a `width × height` canvas.
pub fn make_graph(description: &str, width: f64, height: f64) -> Value {
    let side = |v: f64| if v.is_finite() { clamp(v.round(), MIN_SIDE, MAX_SIDE) } else { MIN_SIDE };
    let (w, h) = (side(width), side(height));
    let (min, max) = parse_range(description).unwrap_or(DEFAULT_RANGE);
    let plane = Plane {
        w,
        h,
        margin: (w.min(h) * 0.10).round(),
        min,
        max,
    };
    let span = max - min;

    let mut segments = Vec::new();
    let mut labels = Vec::new();
    let mut points = Vec::new();

    let trimmed = description.trim();
    let header = if trimmed.is_empty() {
        "Graph mode".to_string()
    } else if trimmed.chars().count() > HEADER_CHARS {
        format!("{}…", trimmed.chars().take(HEADER_CHARS).collect::<String>())
    } else {
        trimmed.to_string()
    };
    labels.push(text(&header, w / 2.0, 18.0, 13.0, true));

    // Grid
    let grid_step = (span / MAX_GRID_LINES).ceil().max(1.0) as i64;
    for t in plane.ticks(grid_step) {
        let px = plane.x(t as f64);
        segments.push(segment((px, plane.y(min)), (px, plane.y(max)), GRID_STROKE, 1.0));
    }
    for t in plane.ticks(grid_step) {
        let py = plane.y(t as f64);
        segments.push(segment((plane.x(min), py), (plane.x(max), py), GRID_STROKE, 1.0));
    }

    // Axes
    let has_origin = plane.contains(0.0);
    if has_origin {
        let px = plane.x(0.0);
        segments.push(segment((px, plane.y(min)), (px, plane.y(max)), AXIS_STROKE, 2.0));
        let py = plane.y(0.0);
        segments.push(segment((plane.x(min), py), (plane.x(max), py), AXIS_STROKE, 2.0));
    }

    // Tick labels, about ten per axis
    let label_every = (span / 10.0).round().max(1.0) as i64;
    let x_axis_y = plane.y(if has_origin { 0.0 } else { min });
    let y_axis_x = plane.x(if has_origin { 0.0 } else { min });
    for t in plane.ticks(label_every) {
        labels.push(text(&t.to_string(), plane.x(t as f64), x_axis_y + 18.0, 12.0, false));
    }
    for t in plane.ticks(label_every) {
        labels.push(text(&t.to_string(), y_axis_x - 20.0, plane.y(t as f64), 12.0, false));
    }

    match parse_linear(description) {
        Some(line) => {
            let samples = (w / 10.0).round().max(60.0) as usize;
            let mut prev: Option<(f64, f64)> = None;
            for i in 0..=samples {
                let x = min + (i as f64 / samples as f64) * span;
                let cur = (plane.x(x), plane.y(line.at(x)));
                if let Some(p) = prev {
                    segments.push(segment(p, cur, AXIS_STROKE, 3.0));
                }
                prev = Some(cur);
            }
            labels.push(text(&line.equation(), w - plane.margin, 40.0, 13.0, true));

            let mut intercept = |at: (f64, f64), caption: String| {
                let (px, py) = (plane.x(at.0), plane.y(at.1));
                points.push(json!({"at": [px, py], "r": 5, "fill": "#000000", "stroke": "none", "strokeWidth": 1}));
                labels.push(text(&caption, px + 55.0, py - 12.0, 12.0, true));
            };
            if plane.contains(0.0) && plane.contains(line.b) {
                intercept((0.0, line.b), format!("(0, {})", round2(line.b)));
            }
            if line.a != 0.0 {
                let x_int = -line.b / line.a;
                if x_int.is_finite() && plane.contains(x_int) && plane.contains(0.0) {
                    intercept((x_int, 0.0), format!("({}, 0)", round2(x_int)));
                }
            }
        }
        None => labels.push(text(
            "Tip: Try 'Plot y = 2x + 1' or include 'from -10 to 10'.",
            w / 2.0,
            42.0,
            12.0,
            false,
        )),
    }

    log::debug!(
        "graph {w}×{h} over [{min}, {max}]: {} segments, {} labels",
        segments.len(),
        labels.len()
    );
    json!({
        "canvas": {"width": w, "height": h, "bg": "#ffffff"},
        "defaults": {
            "stroke": "#000000",
            "strokeWidth": 3,
            "fill": "none",
            "fontFamily": "Arial, system-ui, sans-serif",
            "fontSize": 18,
            "labelColor": TEXT_COLOR,
        },
        "segments": segments,
        "labels": labels,
        "points": points,
    })
}

/// Local producer for Cartesian-plane requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphProducer;

impl SceneSource for GraphProducer {
    fn id(&self) -> &str {
        "graph"
    }

    fn produce(&self, request: &SourceRequest) -> Result<Value, SourceError> {
        Ok(make_graph(
            &request.description,
            request.canvas_width,
            request.canvas_height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_core::validate;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_linear_forms() {
        assert_eq!(parse_linear("Plot y = 2x + 1."), Some(Linear { a: 2.0, b: 1.0 }));
        assert_eq!(parse_linear("y=-x-3"), Some(Linear { a: -1.0, b: -3.0 }));
        assert_eq!(parse_linear("Y = x"), Some(Linear { a: 1.0, b: 0.0 }));
        assert_eq!(parse_linear("y = 0.5*x + 2.5"), Some(Linear { a: 0.5, b: 2.5 }));
        assert_eq!(parse_linear("a coordinate plane"), None);
    }

    #[test]
    fn parses_range_in_either_order() {
        assert_eq!(parse_range("from -5 to 5"), Some((-5.0, 5.0)));
        assert_eq!(parse_range("FROM 8 to -2"), Some((-2.0, 8.0)));
        assert_eq!(parse_range("from 3 to 3"), None);
    }

    #[test]
    fn equation_label_formats_sign() {
        assert_eq!(Linear { a: 2.0, b: 1.0 }.equation(), "y = 2x + 1");
        assert_eq!(Linear { a: -1.0, b: -3.0 }.equation(), "y = -1x - 3");
        assert_eq!(Linear { a: 3.0, b: 0.0 }.equation(), "y = 3x");
    }

    #[test]
    fn graph_has_intercepts_and_valid_scene() {
        let raw = make_graph("Plot y = 2x + 1 from -10 to 10", 900.0, 450.0);
        let scene = validate(&raw).unwrap();
        assert_eq!(scene.points.len(), 2);
        assert!(scene.labels.iter().any(|l| l.text == "(0, 1)"));
        assert!(scene.labels.iter().any(|l| l.text == "(-0.5, 0)"));
        assert!(scene.labels.iter().any(|l| l.text == "y = 2x + 1"));
        // 21 + 21 grid lines, 2 axes, 90 samples.
        assert_eq!(scene.segments.len(), 21 + 21 + 2 + 90);
    }

    #[test]
    fn canvas_is_clamped_and_tip_shown_without_equation() {
        let raw = make_graph("", 50.0, 9000.0);
        assert_eq!(raw["canvas"]["width"], 200.0);
        assert_eq!(raw["canvas"]["height"], 4000.0);
        let scene = validate(&raw).unwrap();
        assert_eq!(scene.labels[0].text, "Graph mode");
        assert!(scene.labels.iter().any(|l| l.text.starts_with("Tip:")));
        assert!(scene.points.is_empty());
    }
}
