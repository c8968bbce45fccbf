//! The generator boundary: anything that turns a request into scene-shaped
//! JSON, plus the validate-then-normalize step every source goes through.

use mdr_core::config::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use mdr_core::{NormalizeOptions, Scene, ValidationError, normalize, validate};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Missing description")]
    EmptyDescription,
    #[error("unknown template `{0}`")]
    UnknownTemplate(String),
    #[error("generator failed: {0}")]
    Generator(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// What the host asks a source for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceRequest {
    pub description: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for SourceRequest {
    fn default() -> Self {
        Self {
            description: String::new(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl SourceRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }
}

/// Produces scene-shaped JSON without caring how it was created.
pub trait SceneSource {
    /// Short identifier, e.g. `graph`.
    fn id(&self) -> &str;

    fn produce(&self, request: &SourceRequest) -> Result<Value, SourceError>;
}

/// Adapts an external generator (a closure from description to JSON) into
/// a `SceneSource`. Blank descriptions are refused before it is called.
pub struct ExternalSource<F> {
    id: String,
    generate: F,
}

impl<F> ExternalSource<F>
where
    F: Fn(&str) -> Result<Value, String>,
{
    pub fn new(id: impl Into<String>, generate: F) -> Self {
        Self {
            id: id.into(),
            generate,
        }
    }
}

impl<F> SceneSource for ExternalSource<F>
where
    F: Fn(&str) -> Result<Value, String>,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn produce(&self, request: &SourceRequest) -> Result<Value, SourceError> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(SourceError::EmptyDescription);
        }
        (self.generate)(description).map_err(SourceError::Generator)
    }
}

/// Run a source and turn its output into a normalized scene.
///
/// The produced scene's own canvas is authoritative; `options` supplies the
/// margin and layout flags.
pub fn load_from_source(
    source: &dyn SceneSource,
    request: &SourceRequest,
    options: &NormalizeOptions,
) -> Result<Scene, SourceError> {
    let raw = source
        .produce(request)
        .inspect_err(|e| log::warn!("source `{}` failed: {e}", source.id()))?;
    let scene = validate(&raw).inspect_err(|e| log::warn!("source `{}` produced an invalid scene: {e}", source.id()))?;

    let options = NormalizeOptions {
        canvas: scene.canvas.clone(),
        ..options.clone()
    };
    log::debug!("normalizing scene from `{}`", source.id());
    Ok(normalize(&scene, &options))
}
