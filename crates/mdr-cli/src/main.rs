use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use mdr_core::{NormalizeOptions, Scene, ValidationError, normalize};
use mdr_export::{ExportError, export_svg, write_export};
use mdr_modes::{
    GraphProducer, LayoutHints, SceneSource, SourceError, SourceRequest, TemplateSource,
    load_from_source, templates,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Invalid(#[from] ValidationError),
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Export(#[from] ExportError),
}

#[derive(Parser, Debug)]
#[command(name = "mdr", about = "Render math diagram scenes to SVG or PNG")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Output {
    /// Write to this file instead of stdout; `.png` rasterizes.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate, normalize, and render a scene document.
    Render {
        scene: PathBuf,
        /// Push overlapping shapes apart.
        #[arg(long)]
        separate: bool,
        /// Lay out a pair of same-kind shapes left and right.
        #[arg(long)]
        pair: bool,
        #[command(flatten)]
        out: Output,
    },
    /// Render a built-in template.
    Template {
        id: String,
        #[command(flatten)]
        out: Output,
    },
    /// Plot a Cartesian plane from a description like "y = 2x + 1 from -5 to 5".
    Graph {
        description: String,
        #[arg(long, default_value_t = 900.0)]
        width: f64,
        #[arg(long, default_value_t = 450.0)]
        height: f64,
        #[command(flatten)]
        out: Output,
    },
    /// List the built-in templates.
    Templates,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Render {
            scene,
            separate,
            pair,
            out,
        } => {
            let text = std::fs::read_to_string(&scene).map_err(|source| CliError::Read {
                path: scene.clone(),
                source,
            })?;
            let raw = Scene::from_json_str(&text)?;
            let options = NormalizeOptions {
                allow_touching: !separate,
                wants_two: pair,
                ..NormalizeOptions::for_canvas(raw.canvas.clone())
            };
            emit(&normalize(&raw, &options), out.output.as_deref())
        }
        Command::Template { id, out } => {
            let source = TemplateSource::new(&id)?;
            let description = source.template().description;
            emit(&from_source(&source, SourceRequest::new(description))?, out.output.as_deref())
        }
        Command::Graph {
            description,
            width,
            height,
            out,
        } => {
            let request = SourceRequest {
                description,
                canvas_width: width,
                canvas_height: height,
            };
            emit(&from_source(&GraphProducer, request)?, out.output.as_deref())
        }
        Command::Templates => {
            for t in templates::builtin() {
                println!("{:<30} {}", t.id, t.name);
            }
            Ok(())
        }
    }
}

fn from_source(source: &dyn SceneSource, request: SourceRequest) -> Result<Scene, CliError> {
    let options = LayoutHints::from_description(&request.description).apply(&NormalizeOptions::default());
    Ok(load_from_source(source, &request, &options)?)
}

fn emit(scene: &Scene, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            let format = write_export(scene, path)?;
            log::debug!("exported {format:?} to {}", path.display());
        }
        None => println!("{}", export_svg(scene)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_export::Format;

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from(["mdr", "render", "scene.json", "--separate", "-o", "out.png"]).unwrap();
        match cli.command {
            Command::Render {
                scene,
                separate,
                pair,
                out,
            } => {
                assert_eq!(scene, PathBuf::from("scene.json"));
                assert!(separate);
                assert!(!pair);
                assert_eq!(Format::from_path(&out.output.unwrap()), Format::Png);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn graph_defaults_to_standard_canvas() {
        let cli = Cli::try_parse_from(["mdr", "graph", "y = x"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Graph { width, height, .. } if width == 900.0 && height == 450.0
        ));
    }

    #[test]
    fn missing_scene_file_is_a_read_error() {
        let err = run(Command::Render {
            scene: PathBuf::from("/nonexistent/scene.json"),
            separate: false,
            pair: false,
            out: Output { output: None },
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    fn unknown_template_fails() {
        let err = run(Command::Template {
            id: "nope".to_string(),
            out: Output { output: None },
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "unknown template `nope`");
    }
}
