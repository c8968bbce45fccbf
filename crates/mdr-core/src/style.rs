//! Whole-scene style presets.

use crate::model::Scene;
use serde::{Deserialize, Serialize};

/// Font size used for annotations when a preset leaves it unset.
pub const PRESET_FONT_SIZE: f64 = 22.0;

/// A user-chosen look applied to every primitive at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylePrefs {
    /// Shape outline and segment stroke.
    pub stroke: String,
    /// Shape fill.
    pub fill: String,
    pub label_color: String,
    pub label_font_size: f64,
}

impl Default for StylePrefs {
    fn default() -> Self {
        Self {
            stroke: "#000000".into(),
            fill: "none".into(),
            label_color: "#000000".into(),
            label_font_size: PRESET_FONT_SIZE,
        }
    }
}

/// Return a copy of `scene` with the preset written over every shape,
/// segment, and label, and into the scene defaults.
///
/// Point markers keep their own style. Geometry is untouched.
pub fn apply_style(scene: &Scene, prefs: &StylePrefs) -> Scene {
    let mut out = scene.clone();
    let font_size = if prefs.label_font_size.is_finite() && prefs.label_font_size > 0.0 {
        prefs.label_font_size
    } else {
        PRESET_FONT_SIZE
    };

    out.defaults.stroke = prefs.stroke.clone();
    out.defaults.fill = prefs.fill.clone();
    out.defaults.label_color = prefs.label_color.clone();
    out.defaults.font_size = font_size;

    let shapes = out
        .rects
        .iter_mut()
        .map(|r| &mut r.style)
        .chain(out.circles.iter_mut().map(|c| &mut c.style))
        .chain(out.ellipses.iter_mut().map(|e| &mut e.style))
        .chain(out.polygons.iter_mut().map(|p| &mut p.style));
    for style in shapes {
        style.stroke = Some(prefs.stroke.clone());
        style.fill = Some(prefs.fill.clone());
    }
    for s in &mut out.segments {
        s.style.stroke = Some(prefs.stroke.clone());
    }
    for l in &mut out.labels {
        l.color = Some(prefs.label_color.clone());
        l.font_size = Some(font_size);
    }

    log::debug!("applied style preset {prefs:?}");
    out
}
