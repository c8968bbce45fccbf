//! WASM bridge for MDR: exposes the scene engine to the browser page.
//!
//! Compiled via `wasm-pack build --target web`. The page renders the SVG
//! string itself, forwards pointer events here, and patches the live DOM
//! from the small JSON responses.

use mdr_core::{Bounds, Canvas, StylePrefs};
use mdr_editor::{EditorConfig, InputEvent, Modifiers, PointerResponse, Session};
use mdr_modes::{
    GraphProducer, LayoutHints, SceneSource, SourceRequest, TemplateSource, load_from_source,
    templates,
};
use mdr_render::TargetElement;
use serde_json::json;
use wasm_bindgen::prelude::*;

/// The main WASM-facing diagram controller.
///
/// Holds the editing session. All interaction from the page goes through
/// this struct.
#[wasm_bindgen]
pub struct DiagramCanvas {
    session: Session,
}

#[wasm_bindgen]
impl DiagramCanvas {
    /// Create a controller whose canvas is `width × height`, clamped to the
    /// supported range. Non-finite sizes fall back to the default canvas.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        // Set up panic hook for better error messages in console
        console_error_panic_hook_setup();

        let mut config = EditorConfig::default();
        let canvas = &mut config.normalize.canvas;
        if let Some((w, h)) = Canvas::clamp_size(width, height) {
            (canvas.width, canvas.height) = (w, h);
        }
        let (w, h) = (canvas.width, canvas.height);
        let mut session = Session::new(config);
        session.set_viewport(w, h);
        Self { session }
    }

    /// Load a scene document. Returns `{"ok":true}` or
    /// `{"ok":false,"error":"..."}`; on error the previous scene stays.
    pub fn load_json(&mut self, text: &str) -> String {
        match self.session.load_json(text) {
            Ok(capture) => json!({"ok": true, "capture": capture}).to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Load a built-in template, laid out per its own description.
    pub fn load_template(&mut self, id: &str) -> String {
        let source = match TemplateSource::new(id) {
            Ok(s) => s,
            Err(e) => return error_json(&e.to_string()),
        };
        let description = source.template().description;
        self.load_source(&source, description)
    }

    /// Build a Cartesian-plane scene from free text.
    pub fn load_graph(&mut self, description: &str) -> String {
        self.load_source(&GraphProducer, description)
    }

    /// Built-in templates as `[{"id","name","description"}]`.
    pub fn templates_json(&self) -> String {
        let list: Vec<_> = templates::builtin()
            .into_iter()
            .map(|t| json!({"id": t.id, "name": t.name, "description": t.description}))
            .collect();
        serde_json::to_string(&list).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn render_svg(&self) -> String {
        self.session.render()
    }

    /// Pointer pressed. `target_json` describes the element under the
    /// pointer (a serialized `TargetElement`); pass an empty string to
    /// hit-test by position instead.
    pub fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        pointer_id: i32,
        shift: bool,
        target_json: &str,
    ) -> String {
        let target: Option<TargetElement> = if target_json.trim().is_empty() {
            None
        } else {
            match serde_json::from_str(target_json) {
                Ok(t) => Some(t),
                Err(e) => {
                    log::warn!("ignoring malformed target: {e}");
                    None
                }
            }
        };
        let modifiers = Modifiers {
            shift,
            ..Modifiers::NONE
        };
        self.dispatch(InputEvent::down(x, y, pointer_id, modifiers), target.as_ref())
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, pointer_id: i32) -> String {
        self.dispatch(InputEvent::moved(x, y, pointer_id), None)
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, pointer_id: i32) -> String {
        self.dispatch(InputEvent::up(x, y, pointer_id), None)
    }

    pub fn pointer_cancel(&mut self, pointer_id: i32) -> String {
        self.dispatch(InputEvent::PointerCancel { pointer_id }, None)
    }

    pub fn pointer_leave(&mut self, pointer_id: i32) -> String {
        self.dispatch(InputEvent::PointerLeave { pointer_id }, None)
    }

    /// Abandon the drag in progress; the scene is untouched.
    pub fn cancel_drag(&mut self) -> String {
        let response = PointerResponse {
            capture: self.session.cancel_drag(),
            ..PointerResponse::default()
        };
        response_json(&response)
    }

    /// Selected elements as `[{"kind","index"}]`.
    pub fn selected_json(&self) -> String {
        serde_json::to_string(self.session.selection().members()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Marquee selection over a screen-space box. Returns the new selection
    /// as `selected_json` does.
    pub fn select_in_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> String {
        let picked = self.session.select_in_rect(Bounds::new(x, y, width, height));
        serde_json::to_string(picked).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn select_all(&mut self) {
        self.session.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    /// Apply a style preset given as JSON. Returns `true` if the scene changed.
    pub fn apply_style_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<StylePrefs>(json) {
            Ok(prefs) => self.session.apply_style(&prefs),
            Err(e) => {
                log::warn!("ignoring malformed style preset: {e}");
                false
            }
        }
    }

    /// Resize the canvas (clamped), re-normalize and recenter.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        self.session.resize_canvas(width, height)
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.session.set_viewport(width, height);
    }

    /// Recenter content and return the view as `{"panX","panY","zoom"}`.
    pub fn recenter_transform(&mut self) -> String {
        let view = self.session.recenter();
        serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn reset(&mut self) -> bool {
        self.session.reset()
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    pub fn scene_json(&self) -> String {
        self.session.scene_json()
    }

    /// PNG bytes at canvas size, or `undefined` if rasterization failed.
    pub fn export_png(&self) -> Option<Vec<u8>> {
        mdr_export::export_png(self.session.scene())
            .inspect_err(|e| log::warn!("PNG export failed: {e}"))
            .ok()
    }
}

impl DiagramCanvas {
    fn dispatch(&mut self, event: InputEvent, target: Option<&TargetElement>) -> String {
        response_json(&self.session.handle_event(&event, target))
    }

    fn load_source(&mut self, source: &dyn SceneSource, description: &str) -> String {
        let normalize = &self.session.config().normalize;
        let request = SourceRequest {
            description: description.to_string(),
            canvas_width: normalize.canvas.width,
            canvas_height: normalize.canvas.height,
        };
        let options = LayoutHints::from_description(description).apply(normalize);
        match load_from_source(source, &request, &options) {
            Ok(scene) => {
                let capture = self.session.load_scene(scene);
                json!({"ok": true, "capture": capture}).to_string()
            }
            Err(e) => error_json(&e.to_string()),
        }
    }
}

fn error_json(message: &str) -> String {
    json!({"ok": false, "error": message}).to_string()
}

fn response_json(response: &PointerResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|_| r#"{"changed":false}"#.to_string())
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("MDR WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn load_errors_are_reported_as_json() {
        let mut canvas = DiagramCanvas::new(900.0, 450.0);
        let out = parse(&canvas.load_json("{}"));
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "Missing canvas.");
        assert_eq!(parse(&canvas.load_template("nope"))["ok"], false);
    }

    #[test]
    fn pointer_round_trip_through_json() {
        let mut canvas = DiagramCanvas::new(900.0, 450.0);
        assert_eq!(parse(&canvas.load_template("pa-rectangle-missing-side-x"))["ok"], true);

        let target = r#"{"tag":"rect","parentAttrs":{"data-entity":"rect","data-index":"0"}}"#;
        let down = parse(&canvas.pointer_down(300.0, 200.0, 1, false, target));
        assert_eq!(down["capture"]["acquire"], 1);
        assert_eq!(parse(&canvas.selected_json()), json!([{"kind": "rect", "index": 0}]));

        let moved = parse(&canvas.pointer_move(310.0, 205.0, 1));
        assert_eq!(moved["preview"]["dx"], 10.0);

        let up = parse(&canvas.pointer_up(310.0, 205.0, 1));
        assert_eq!(up["changed"], true);
        assert_eq!(up["capture"]["release"], 1);
        assert!(canvas.can_undo());
    }

    #[test]
    fn templates_keep_their_shape_on_a_small_canvas() {
        let mut canvas = DiagramCanvas::new(600.0, 300.0);
        assert_eq!(parse(&canvas.load_template("segment-diagram"))["ok"], true);
        let scene = parse(&canvas.scene_json());
        assert_eq!(scene["canvas"]["width"], 600.0);
        assert_eq!(scene["segments"][1]["a"], json!([373.33, 106.67]));
        assert_eq!(scene["segments"][1]["b"], json!([513.33, 213.33]));

        canvas.load_template("pa-similar-rectangles");
        let scene = parse(&canvas.scene_json());
        let edge = |i: usize, key: &str| scene["rects"][i][key].as_f64().unwrap();
        assert!(edge(0, "x") + edge(0, "w") < edge(1, "x"));
    }

    #[test]
    fn constructor_clamps_canvas_size() {
        let canvas = DiagramCanvas::new(20.0, 9000.0);
        let scene = parse(&canvas.scene_json());
        assert_eq!(scene["canvas"]["width"], 100.0);
        assert_eq!(scene["canvas"]["height"], 4000.0);
        let fallback = parse(&DiagramCanvas::new(f64::NAN, 300.0).scene_json());
        assert_eq!(fallback["canvas"]["width"], 900.0);
    }

    #[test]
    fn marquee_selection_is_reported() {
        let mut canvas = DiagramCanvas::new(900.0, 450.0);
        canvas.load_template("pa-circle-radius");
        let picked = parse(&canvas.select_in_rect(0.0, 0.0, 900.0, 450.0));
        // Circle, radius, two markers, two labels.
        assert_eq!(picked.as_array().unwrap().len(), 6);
        assert_eq!(parse(&canvas.selected_json()), picked);
        assert_eq!(parse(&canvas.pointer_cancel(9))["changed"], false);
    }

    #[test]
    fn style_resize_and_export() {
        let mut canvas = DiagramCanvas::new(900.0, 450.0);
        canvas.load_template("pa-circle-radius");
        assert!(canvas.apply_style_json(r##"{"stroke": "#1d4ed8"}"##));
        assert!(!canvas.apply_style_json("not json"));
        assert!(canvas.render_svg().contains("#1d4ed8"));

        canvas.resize(600.0, 300.0);
        assert_eq!(parse(&canvas.scene_json())["canvas"]["width"], 600.0);
        assert!(canvas.export_png().is_some());
    }
}
