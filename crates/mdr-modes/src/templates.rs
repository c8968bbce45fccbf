//! Built-in starter scenes. A template bypasses the generator entirely.

use crate::producer::{SceneSource, SourceError, SourceRequest};
use mdr_core::{Canvas, validate};
use serde::Serialize;
use serde_json::{Value, json};

/// A named starter scene with the description it illustrates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub scene: Value,
}

fn defaults_block() -> Value {
    json!({
        "stroke": "#000000",
        "strokeWidth": 3,
        "fill": "none",
        "fontFamily": "Arial, system-ui, sans-serif",
        "fontSize": 18,
        "labelColor": "#000000",
    })
}

fn canvas_block() -> Value {
    json!({"width": 900, "height": 450, "bg": "#ffffff"})
}

fn dot(x: f64, y: f64) -> Value {
    json!({"at": [x, y], "r": 4, "fill": "#000000"})
}

fn label(text: &str, x: f64, y: f64) -> Value {
    json!({"text": text, "x": x, "y": y, "bold": true})
}

/// Every built-in template, in menu order.
pub fn builtin() -> Vec<Template> {
    vec![
        Template {
            id: "pa-rectangle-missing-side-x",
            name: "Rectangle Missing Side (x)",
            description: "Draw a rectangle for a perimeter problem. Label top = 12 cm, left = 7 cm, right = 7 cm, bottom = x cm.",
            scene: json!({
                "canvas": canvas_block(),
                "defaults": defaults_block(),
                "rects": [{"x": 250, "y": 120, "w": 420, "h": 220}],
                "labels": [
                    label("12 cm", 460.0, 105.0),
                    label("x cm", 460.0, 365.0),
                    label("7 cm", 230.0, 230.0),
                    label("7 cm", 690.0, 230.0),
                ],
            }),
        },
        Template {
            id: "pa-triangle-base-height",
            name: "Triangle (base & height)",
            description: "Draw a triangle with base labeled 14 cm and height labeled 9 cm (show altitude).",
            scene: json!({
                "canvas": canvas_block(),
                "defaults": defaults_block(),
                "polygons": [{"points": [[260, 340], [640, 340], [500, 150]]}],
                "segments": [
                    {"a": [500, 150], "b": [500, 340]},
                    {"a": [500, 325], "b": [515, 325]},
                    {"a": [515, 325], "b": [515, 340]},
                ],
                "labels": [label("14 cm", 450.0, 365.0), label("9 cm", 530.0, 245.0)],
            }),
        },
        Template {
            id: "pa-circle-radius",
            name: "Circle (radius)",
            description: "Draw a circle with center O and radius labeled 8 cm. Include a radius segment.",
            scene: json!({
                "canvas": canvas_block(),
                "defaults": defaults_block(),
                "circles": [{"cx": 450, "cy": 225, "r": 140}],
                "segments": [{"a": [450, 225], "b": [590, 225]}],
                "points": [dot(450.0, 225.0), dot(590.0, 225.0)],
                "labels": [label("O", 430.0, 245.0), label("8 cm", 520.0, 205.0)],
            }),
        },
        Template {
            id: "pa-similar-rectangles",
            name: "Similar Rectangles (scale factor)",
            description: "Draw two similar rectangles. Left: 6 cm by 4 cm. Right: 15 cm by 10 cm. Show corresponding sides.",
            scene: json!({
                "canvas": canvas_block(),
                "defaults": defaults_block(),
                "rects": [
                    {"x": 140, "y": 160, "w": 240, "h": 160},
                    {"x": 540, "y": 120, "w": 300, "h": 200},
                ],
                "labels": [
                    label("6 cm", 260.0, 145.0),
                    label("4 cm", 125.0, 240.0),
                    label("15 cm", 690.0, 105.0),
                    label("10 cm", 525.0, 220.0),
                ],
            }),
        },
        Template {
            id: "segment-diagram",
            name: "Line Segments + Points",
            description: "Draw a segment AB and a segment CD. Mark endpoints with points and label A,B,C,D.",
            scene: json!({
                "canvas": canvas_block(),
                "defaults": defaults_block(),
                "segments": [
                    {"a": [180, 230], "b": [380, 230]},
                    {"a": [560, 160], "b": [770, 320]},
                ],
                "points": [
                    dot(180.0, 230.0),
                    dot(380.0, 230.0),
                    dot(560.0, 160.0),
                    dot(770.0, 320.0),
                ],
                "labels": [
                    label("A", 170.0, 250.0),
                    label("B", 390.0, 250.0),
                    label("C", 550.0, 140.0),
                    label("D", 780.0, 340.0),
                ],
            }),
        },
    ]
}

pub fn find(id: &str) -> Option<Template> {
    builtin().into_iter().find(|t| t.id == id)
}

/// Serves one template's scene scaled onto the requested canvas. The
/// request's description is ignored.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    template: Template,
}

impl TemplateSource {
    pub fn new(id: &str) -> Result<Self, SourceError> {
        find(id)
            .map(|template| Self { template })
            .ok_or_else(|| SourceError::UnknownTemplate(id.to_string()))
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl SceneSource for TemplateSource {
    fn id(&self) -> &str {
        self.template.id
    }

    fn produce(&self, request: &SourceRequest) -> Result<Value, SourceError> {
        let Some((width, height)) = Canvas::clamp_size(request.canvas_width, request.canvas_height)
        else {
            return Ok(self.template.scene.clone());
        };
        let mut scene = validate(&self.template.scene)?;
        if (scene.canvas.width, scene.canvas.height) != (width, height) {
            log::debug!("fitting template `{}` to {width}×{height}", self.template.id);
            scene.fit_to(width, height);
        }
        Ok(scene.to_json_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_template_validates() {
        for t in builtin() {
            let scene = validate(&t.scene).unwrap();
            assert!(!scene.is_empty(), "{} is empty", t.id);
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = builtin().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), builtin().len());
    }

    #[test]
    fn templates_scale_onto_smaller_canvas() {
        let request = SourceRequest {
            canvas_width: 600.0,
            canvas_height: 300.0,
            ..SourceRequest::default()
        };
        let raw = TemplateSource::new("segment-diagram")
            .unwrap()
            .produce(&request)
            .unwrap();
        assert_eq!(raw["canvas"]["width"], 600.0);
        assert_eq!(raw["segments"][1]["a"], json!([373.33, 106.67]));
        assert_eq!(raw["segments"][1]["b"], json!([513.33, 213.33]));
        assert_eq!(raw["points"][3]["at"], raw["segments"][1]["b"]);
    }

    #[test]
    fn default_request_serves_template_as_authored() {
        let source = TemplateSource::new("pa-circle-radius").unwrap();
        let raw = source.produce(&SourceRequest::default()).unwrap();
        assert_eq!(validate(&raw).unwrap(), validate(&source.template().scene).unwrap());
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(TemplateSource::new("pa-circle-radius").is_ok());
        assert!(matches!(
            TemplateSource::new("nope"),
            Err(SourceError::UnknownTemplate(id)) if id == "nope"
        ));
    }
}
