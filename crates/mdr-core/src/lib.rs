pub mod config;
pub mod error;
pub mod geom;
pub mod model;
pub mod normalize;
pub mod style;
pub mod validate;

pub use config::NormalizeOptions;
pub use error::ValidationError;
pub use geom::Bounds;
pub use model::*;
pub use normalize::{normalize, out_of_bounds};
pub use style::{StylePrefs, apply_style};
pub use validate::validate;
