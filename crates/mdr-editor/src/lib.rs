pub mod commands;
pub mod drag;
pub mod input;
pub mod links;
pub mod selection;
pub mod session;
pub mod view;

pub use commands::CommandStack;
pub use drag::{DragMode, DragSession, DragState, ElementPatch, Preview};
pub use input::{InputEvent, Modifiers};
pub use links::{LinkTolerance, Links, compute_links, compute_links_with};
pub use selection::Selection;
pub use session::{Capture, EditorConfig, PointerResponse, Session};
pub use view::ViewTransform;
