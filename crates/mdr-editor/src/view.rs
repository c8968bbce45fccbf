//! View transform between screen and scene coordinates.

use mdr_core::{Bounds, Xy};
use serde::{Deserialize, Serialize};

/// Pan/zoom applied when the scene is shown on screen.
///
/// `pan_x` / `pan_y` are in screen pixels; `zoom` is a scale factor
/// (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewTransform {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        pan_x: 0.0,
        pan_y: 0.0,
        zoom: 1.0,
    };

    /// Convert a screen point to scene coordinates.
    #[must_use]
    pub fn screen_to_scene(&self, screen: Xy) -> Xy {
        let zoom = self.safe_zoom();
        ((screen.0 - self.pan_x) / zoom, (screen.1 - self.pan_y) / zoom)
    }

    /// Convert a scene point to screen coordinates.
    #[must_use]
    pub fn scene_to_screen(&self, scene: Xy) -> Xy {
        let zoom = self.safe_zoom();
        (scene.0 * zoom + self.pan_x, scene.1 * zoom + self.pan_y)
    }

    fn safe_zoom(&self) -> f64 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }

    /// Center `content` in a viewport of the given size at scale 1.
    ///
    /// Empty or zero-area content yields the identity transform.
    #[must_use]
    pub fn recentered(content: Option<Bounds>, viewport: Xy) -> Self {
        let Some(b) = content.filter(|b| !b.is_degenerate()) else {
            return Self::IDENTITY;
        };
        let (cx, cy) = b.center();
        Self {
            pan_x: viewport.0 / 2.0 - cx,
            pan_y: viewport.1 / 2.0 - cy,
            zoom: 1.0,
        }
    }
}
