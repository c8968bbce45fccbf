use crate::config::{MAX_CANVAS, MIN_CANVAS};
use thiserror::Error;

/// Structural defects that make a scene description unrepairable.
///
/// Cosmetic defects never produce one of these; they are replaced by
/// defaults during validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("JSON must be an object.")]
    NotAnObject,

    #[error("Missing canvas.")]
    MissingCanvas,

    #[error("canvas.width and canvas.height must be numbers.")]
    CanvasNotNumeric,

    #[error("Canvas is too small (min {min}×{min}), got {width}×{height}.", min = MIN_CANVAS)]
    CanvasTooSmall { width: f64, height: f64 },

    #[error("Canvas is too large (max {max}×{max}), got {width}×{height}.", max = MAX_CANVAS)]
    CanvasTooLarge { width: f64, height: f64 },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
