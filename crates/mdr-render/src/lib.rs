pub mod address;
pub mod hit;
pub mod svg;

pub use address::{MarkupError, ScannedElement, scan_markup};
pub use hit::{TargetElement, hit_test, hit_test_rect, resolve_target};
pub use svg::{ROOT_ID, element_attributes, render};
