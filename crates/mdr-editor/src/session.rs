//! Editing session: one scene, its selection, drag state, and history.
//!
//! Hosts (the wasm bridge, tests) feed pointer events in screen space and
//! get back small responses describing what to repaint. The scene changes
//! only through drag commits and wholesale operations (load, style, reset,
//! resize, undo/redo), each of which is one history entry.

use crate::commands::CommandStack;
use crate::drag::{DragState, Preview};
use crate::input::{InputEvent, Modifiers};
use crate::links::LinkTolerance;
use crate::selection::Selection;
use crate::view::ViewTransform;
use mdr_core::{
    Bounds, Canvas, ElementRef, NormalizeOptions, Scene, StylePrefs, ValidationError, Xy,
    apply_style, normalize,
};
use mdr_render::{TargetElement, hit_test, hit_test_rect, render, resolve_target};
use serde::{Deserialize, Serialize};

/// Default undo depth.
pub const HISTORY_DEPTH: usize = 100;

/// Editor settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Applied to every loaded scene. Its canvas is the authoritative
    /// drawing surface.
    pub normalize: NormalizeOptions,
    pub links: LinkTolerance,
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            links: LinkTolerance::default(),
            history_depth: HISTORY_DEPTH,
        }
    }
}

/// Pointer capture requests for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capture {
    Acquire(i32),
    Release(i32),
}

/// What a pointer event did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointerResponse {
    /// The scene was mutated and should be re-rendered.
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<Capture>,
    /// Live geometry for the dragged elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
}

pub struct Session {
    config: EditorConfig,
    scene: Scene,
    /// The scene as last loaded, for `reset`.
    pristine: Scene,
    selection: Selection,
    drag: DragState,
    /// Pointer that owns the current drag.
    active_pointer: Option<i32>,
    history: CommandStack,
    view: ViewTransform,
    viewport: Xy,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Session {
    pub fn new(config: EditorConfig) -> Self {
        let scene = Scene::new(config.normalize.canvas.clone());
        let viewport = (scene.canvas.width, scene.canvas.height);
        Self {
            history: CommandStack::new(config.history_depth),
            pristine: scene.clone(),
            scene,
            config,
            selection: Selection::new(),
            drag: DragState::Idle,
            active_pointer: None,
            view: ViewTransform::IDENTITY,
            viewport,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Parse, validate, and normalize a scene document, replacing the
    /// current scene. On error the session is unchanged.
    ///
    /// Returns the capture release owed to the host if a drag was aborted.
    pub fn load_json(&mut self, text: &str) -> Result<Option<Capture>, ValidationError> {
        let scene = Scene::from_json_str(text).inspect_err(|e| log::warn!("rejected scene: {e}"))?;
        Ok(self.load_scene(scene))
    }

    /// Normalize and adopt an already-validated scene. History starts over.
    pub fn load_scene(&mut self, scene: Scene) -> Option<Capture> {
        let release = self.abort_drag();
        self.scene = normalize(&scene, &self.config.normalize);
        self.pristine = self.scene.clone();
        self.selection.clear();
        self.history.clear();
        log::debug!(
            "loaded scene with {} elements",
            self.scene.element_refs().count()
        );
        release
    }

    pub fn render(&self) -> String {
        render(&self.scene)
    }

    /// The current scene as pretty JSON.
    pub fn scene_json(&self) -> String {
        self.scene.to_json_pretty()
    }

    // ─── Pointer events ──────────────────────────────────────────────────

    /// Dispatch a normalized input event. `target` describes the element
    /// under a pointer-down, when the host has one.
    pub fn handle_event(&mut self, event: &InputEvent, target: Option<&TargetElement>) -> PointerResponse {
        match *event {
            InputEvent::PointerDown {
                x,
                y,
                pointer_id,
                modifiers,
            } => self.pointer_down((x, y), pointer_id, modifiers, target),
            InputEvent::PointerMove { x, y, pointer_id } => self.pointer_move((x, y), pointer_id),
            InputEvent::PointerUp { .. }
            | InputEvent::PointerCancel { .. }
            | InputEvent::PointerLeave { .. } => self.pointer_up(event.position(), event.pointer_id()),
        }
    }

    /// Select and start dragging whatever is under the pointer.
    ///
    /// The host's `target` wins when it resolves; without one the element is
    /// found by geometric hit testing.
    pub fn pointer_down(
        &mut self,
        screen: Xy,
        pointer_id: i32,
        modifiers: Modifiers,
        target: Option<&TargetElement>,
    ) -> PointerResponse {
        if self.drag.is_dragging() {
            return PointerResponse::default();
        }
        let at = self.view.screen_to_scene(screen);
        let hit = match target {
            Some(t) => resolve_target(&self.scene, t),
            None => hit_test(&self.scene, at.0, at.1),
        };
        self.selection.click(hit, modifiers.shift);

        let Some(hit) = hit.filter(|r| self.selection.contains(*r)) else {
            return PointerResponse::default();
        };
        let began = self.drag.begin_drag(
            &self.scene,
            hit,
            self.selection.members(),
            at,
            &self.config.links,
        );
        if !began {
            return PointerResponse::default();
        }
        self.active_pointer = Some(pointer_id);
        PointerResponse {
            capture: Some(Capture::Acquire(pointer_id)),
            ..PointerResponse::default()
        }
    }

    pub fn pointer_move(&mut self, screen: Xy, pointer_id: i32) -> PointerResponse {
        if self.active_pointer != Some(pointer_id) {
            return PointerResponse::default();
        }
        let at = self.view.screen_to_scene(screen);
        PointerResponse {
            preview: self.drag.update_drag(at),
            ..PointerResponse::default()
        }
    }

    /// End the gesture owned by `pointer_id` and commit it. Up, cancel and
    /// leave all land here; `screen` is the final position when known.
    pub fn pointer_up(&mut self, screen: Option<Xy>, pointer_id: i32) -> PointerResponse {
        if self.active_pointer != Some(pointer_id) {
            return PointerResponse::default();
        }
        if let Some(screen) = screen {
            self.drag.update_drag(self.view.screen_to_scene(screen));
        }
        self.active_pointer = None;
        let before = self.scene.clone();
        let changed = match self.drag.commit_drag(&mut self.scene) {
            Some(_) => self.history.record(before, &self.scene, "drag"),
            None => false,
        };
        PointerResponse {
            changed,
            capture: Some(Capture::Release(pointer_id)),
            preview: None,
        }
    }

    /// Discard the drag in progress without touching the scene.
    pub fn cancel_drag(&mut self) -> Option<Capture> {
        self.abort_drag()
    }

    fn abort_drag(&mut self) -> Option<Capture> {
        self.drag.cancel_drag();
        self.active_pointer.take().map(Capture::Release)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.scene);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Marquee selection over a screen-space rectangle.
    pub fn select_in_rect(&mut self, screen: Bounds) -> &[ElementRef] {
        let (x1, y1) = self.view.screen_to_scene((screen.x, screen.y));
        let (x2, y2) = self.view.screen_to_scene((screen.max_x(), screen.max_y()));
        let area = Bounds::from_corners(x1, y1, x2, y2);
        self.selection.set(hit_test_rect(&self.scene, &area));
        self.selection.members()
    }

    // ─── Wholesale operations ────────────────────────────────────────────

    /// Overwrite stroke, fill, and label styling everywhere.
    pub fn apply_style(&mut self, prefs: &StylePrefs) -> bool {
        self.abort_drag();
        let styled = apply_style(&self.scene, prefs);
        self.replace(styled, "style")
    }

    /// Return to the scene as last loaded.
    pub fn reset(&mut self) -> bool {
        self.abort_drag();
        let pristine = self.pristine.clone();
        let changed = self.replace(pristine, "reset");
        self.selection.clear();
        changed
    }

    pub fn undo(&mut self) -> bool {
        self.abort_drag();
        let done = self.history.undo(&mut self.scene).is_some();
        self.selection.retain_valid(&self.scene);
        done
    }

    pub fn redo(&mut self) -> bool {
        self.abort_drag();
        let done = self.history.redo(&mut self.scene).is_some();
        self.selection.retain_valid(&self.scene);
        done
    }

    /// Change the canvas size, clamped to the supported range, then
    /// re-normalize and recenter. Non-finite sizes are ignored.
    pub fn resize_canvas(&mut self, width: f64, height: f64) -> bool {
        let Some((width, height)) = Canvas::clamp_size(width, height) else {
            return false;
        };
        self.abort_drag();
        let canvas = &mut self.config.normalize.canvas;
        (canvas.width, canvas.height) = (width, height);
        log::debug!("resize canvas to {width}×{height}");

        self.pristine = normalize(&self.pristine, &self.config.normalize);
        let resized = normalize(&self.scene, &self.config.normalize);
        let changed = self.replace(resized, "resize");
        self.recenter();
        changed
    }

    /// Size of the host surface the view transform targets.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    /// Center all content in the viewport at scale 1.
    pub fn recenter(&mut self) -> ViewTransform {
        self.view = ViewTransform::recentered(self.scene.content_bounds(), self.viewport);
        self.view
    }

    fn replace(&mut self, next: Scene, description: &str) -> bool {
        let before = std::mem::replace(&mut self.scene, next);
        self.history.record(before, &self.scene, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_core::EntityKind;

    const SCENE: &str = r##"{
        "canvas": {"width": 900, "height": 450},
        "rects": [{"x": 100, "y": 100, "w": 100, "h": 100, "fill": "#dbeafe"}],
        "labels": [{"text": "x", "x": 400, "y": 300}]
    }"##;

    fn session() -> Session {
        let mut s = Session::default();
        s.load_json(SCENE).unwrap();
        s
    }

    const RECT: ElementRef = ElementRef::new(EntityKind::Rect, 0);

    #[test]
    fn drag_commits_once_and_is_undoable() {
        let mut s = session();
        let down = s.pointer_down((150.0, 150.0), 7, Modifiers::NONE, None);
        assert_eq!(down.capture, Some(Capture::Acquire(7)));
        assert_eq!(s.selection().members(), &[RECT]);

        let moved = s.pointer_move((170.0, 160.0), 7);
        assert!(moved.preview.is_some());
        assert_eq!(s.scene().rects[0].x, 100.0);

        let up = s.pointer_up(Some((180.0, 160.0)), 7);
        assert!(up.changed);
        assert_eq!(up.capture, Some(Capture::Release(7)));
        assert_eq!((s.scene().rects[0].x, s.scene().rects[0].y), (130.0, 110.0));

        assert!(s.undo());
        assert_eq!(s.scene().rects[0].x, 100.0);
        assert!(s.redo());
        assert_eq!(s.scene().rects[0].x, 130.0);
    }

    #[test]
    fn input_events_drive_a_drag() {
        let mut s = session();
        let down = s.handle_event(&InputEvent::down(150.0, 150.0, 2, Modifiers::NONE), None);
        assert_eq!(down.capture, Some(Capture::Acquire(2)));
        assert!(s.handle_event(&InputEvent::moved(160.0, 150.0, 2), None).preview.is_some());

        let leave = s.handle_event(&InputEvent::PointerLeave { pointer_id: 2 }, None);
        assert!(leave.changed);
        assert_eq!(leave.capture, Some(Capture::Release(2)));
        assert_eq!(s.scene().rects[0].x, 110.0);

        let up = s.handle_event(&InputEvent::up(0.0, 0.0, 2), None);
        assert_eq!(up, PointerResponse::default());
    }

    #[test]
    fn click_without_move_leaves_no_history() {
        let mut s = session();
        s.pointer_down((150.0, 150.0), 1, Modifiers::NONE, None);
        let up = s.pointer_up(Some((150.0, 150.0)), 1);
        assert!(!up.changed);
        assert!(!s.can_undo());
    }

    #[test]
    fn other_pointers_are_ignored_during_a_drag() {
        let mut s = session();
        s.pointer_down((150.0, 150.0), 1, Modifiers::NONE, None);
        assert_eq!(s.pointer_move((300.0, 300.0), 2), PointerResponse::default());
        assert_eq!(s.pointer_up(None, 2), PointerResponse::default());
        assert!(s.is_dragging());
    }

    #[test]
    fn loading_mid_drag_releases_capture() {
        let mut s = session();
        s.pointer_down((150.0, 150.0), 3, Modifiers::NONE, None);
        assert_eq!(s.load_json(SCENE).unwrap(), Some(Capture::Release(3)));
        assert!(!s.is_dragging());
    }

    #[test]
    fn rejected_load_keeps_previous_scene() {
        let mut s = session();
        let before = s.scene().clone();
        assert!(s.load_json("[1, 2]").is_err());
        assert_eq!(s.scene(), &before);
    }

    #[test]
    fn resize_clamps_and_renormalizes() {
        let mut s = session();
        assert!(s.resize_canvas(50.0, 9000.0));
        assert_eq!((s.scene().canvas.width, s.scene().canvas.height), (100.0, 4000.0));
        // The 100px rect no longer fits a 100px canvas with a 40px margin
        // and its stroke.
        assert_eq!(s.scene().rects[0].w, 17.0);
    }

    #[test]
    fn style_and_reset_are_history_entries() {
        let mut s = session();
        let prefs = StylePrefs {
            stroke: "#ff0000".into(),
            ..StylePrefs::default()
        };
        assert!(s.apply_style(&prefs));
        assert_eq!(s.scene().rects[0].style.stroke.as_deref(), Some("#ff0000"));
        assert!(s.reset());
        assert_eq!(s.scene().rects[0].style.fill.as_deref(), Some("#dbeafe"));
        assert!(s.undo());
        assert_eq!(s.scene().rects[0].style.stroke.as_deref(), Some("#ff0000"));
    }
}
