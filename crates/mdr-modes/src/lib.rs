pub mod graph;
pub mod hints;
pub mod producer;
pub mod templates;

pub use graph::{GraphProducer, make_graph};
pub use hints::LayoutHints;
pub use producer::{ExternalSource, SceneSource, SourceError, SourceRequest, load_from_source};
pub use templates::{Template, TemplateSource};
