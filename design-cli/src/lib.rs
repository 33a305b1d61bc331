//! # Design CLI
//!
//! Command-line host for persisted design documents.
//!
//! ## Usage
//!
//! ```bash
//! design-cli inspect shirt.json
//! design-cli check shirt.json
//! design-cli normalize shirt.json --out shirt.clean.json
//! ```
//!
//! Every command loads the document through the full engine (model,
//! history and a headless render backend), so a document that passes
//! `check` will load in the editor.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use design_core::{DesignEngine, EngineConfig, RecordingBackend};
use serde::Serialize;

/// Command-line arguments for design-cli.
#[derive(Debug, Clone, Parser)]
#[command(name = "design-cli")]
#[command(about = "Inspect, validate and normalize product design documents")]
#[command(version)]
pub struct CliArgs {
    /// Engine configuration file (JSON; missing fields take defaults)
    #[arg(long, global = true, env = "DESIGN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print a summary of a design document
    Inspect {
        /// Document to read
        file: PathBuf,
        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a design document; fails if it cannot be loaded
    Check {
        /// Document to read
        file: PathBuf,
    },
    /// Load a document, clamping out-of-range values, and write it back in
    /// canonical form
    Normalize {
        /// Document to read
        file: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

/// Summary of one element.
#[derive(Debug, Clone, Serialize)]
pub struct ElementSummary {
    /// Element id.
    pub id: String,
    /// Variant tag.
    #[serde(rename = "type")]
    pub variant: String,
    /// Display title.
    pub title: String,
}

/// Summary of one view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    /// View id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Elements, bottom first.
    pub elements: Vec<ElementSummary>,
}

/// Summary of a loaded design.
#[derive(Debug, Clone, Serialize)]
pub struct DesignSummary {
    /// Product title.
    pub title: String,
    /// Views in page order.
    pub views: Vec<ViewSummary>,
}

impl DesignSummary {
    /// Summarize the engine's current product.
    #[must_use]
    pub fn of(engine: &DesignEngine<RecordingBackend>) -> Self {
        let product = engine.product();
        Self {
            title: product.title.clone(),
            views: product
                .views()
                .iter()
                .map(|view| ViewSummary {
                    id: view.id().to_string(),
                    title: view.title.clone(),
                    width: view.width(),
                    height: view.height(),
                    elements: view
                        .elements()
                        .iter()
                        .map(|el| ElementSummary {
                            id: el.id().to_string(),
                            variant: el.variant().as_str().to_string(),
                            title: el.base.title.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Total number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.views.iter().map(|v| v.elements.len()).sum()
    }
}

impl fmt::Display for DesignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} views)", self.title, self.views.len())?;
        for view in &self.views {
            writeln!(
                f,
                "  {} \"{}\" {}x{} ({} elements)",
                view.id,
                view.title,
                view.width,
                view.height,
                view.elements.len()
            )?;
            // Top of the stack first, like a layer panel.
            for el in view.elements.iter().rev() {
                writeln!(f, "    {:<6} {} {}", el.variant, el.id, el.title)?;
            }
        }
        Ok(())
    }
}

/// Read an engine configuration, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Load a document into a headless engine.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub async fn load_engine(file: &Path, config: EngineConfig) -> anyhow::Result<DesignEngine<RecordingBackend>> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let mut engine = DesignEngine::new(RecordingBackend::new(), config)?;
    engine
        .load_json(&text)
        .with_context(|| format!("loading {}", file.display()))?;
    tracing::debug!(
        file = %file.display(),
        live_objects = engine.backend().object_count(),
        "document loaded"
    );
    Ok(engine)
}

/// Run a command and return what should be printed.
///
/// # Errors
///
/// Returns an error if the command fails.
pub async fn run(args: CliArgs) -> anyhow::Result<String> {
    let config = load_config(args.config.as_deref()).await?;
    match args.command {
        Command::Inspect { file, json } => {
            let engine = load_engine(&file, config).await?;
            let summary = DesignSummary::of(&engine);
            if json {
                Ok(serde_json::to_string_pretty(&summary)?)
            } else {
                Ok(summary.to_string())
            }
        }
        Command::Check { file } => {
            let engine = load_engine(&file, config).await?;
            let summary = DesignSummary::of(&engine);
            Ok(format!(
                "{}: ok ({} views, {} elements)",
                file.display(),
                summary.views.len(),
                summary.element_count()
            ))
        }
        Command::Normalize { file, out } => {
            let engine = load_engine(&file, config).await?;
            let json = engine.to_json()?;
            match out {
                Some(out) => {
                    tokio::fs::write(&out, &json)
                        .await
                        .with_context(|| format!("writing {}", out.display()))?;
                    tracing::info!(from = %file.display(), to = %out.display(), "normalized document");
                    Ok(format!("wrote {}", out.display()))
                }
                None => Ok(json),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "version": 1,
        "title": "Shirt",
        "views": [{
            "id": "front", "title": "Front", "width": 800, "height": 600,
            "elements": [
                {"id": "6f1c0e2a-8a55-4c52-b1de-5a1c0a6b3f10", "type": "text",
                 "text": "Hi", "fontSize": 900}
            ]
        }]
    }"#;

    fn write_doc(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("design.json");
        std::fs::write(&path, body).expect("write doc");
        path
    }

    #[test]
    fn test_cli_args_parse() {
        let args = CliArgs::try_parse_from(["design-cli", "normalize", "a.json", "--out", "b.json"])
            .expect("parse");
        match args.command {
            Command::Normalize { file, out } => {
                assert_eq!(file, PathBuf::from("a.json"));
                assert_eq!(out, Some(PathBuf::from("b.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_reports_counts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = write_doc(&dir, DOC);
        let out = run(CliArgs {
            config: None,
            command: Command::Check { file },
        })
        .await
        .expect("check");
        assert!(out.ends_with("ok (1 views, 1 elements)"));
    }

    #[tokio::test]
    async fn test_check_rejects_bad_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = write_doc(&dir, &DOC.replace("\"version\": 1", "\"version\": 7"));
        let result = run(CliArgs {
            config: None,
            command: Command::Check { file },
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_normalize_clamps_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = write_doc(&dir, DOC);
        let out = dir.path().join("clean.json");
        run(CliArgs {
            config: None,
            command: Command::Normalize {
                file,
                out: Some(out.clone()),
            },
        })
        .await
        .expect("normalize");
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).expect("read")).expect("json");
        assert_eq!(written["views"][0]["elements"][0]["fontSize"], serde_json::json!(200.0));
        assert_eq!(written["views"][0]["backgroundColor"], serde_json::json!("#ffffff"));
    }

    #[tokio::test]
    async fn test_inspect_json_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = write_doc(&dir, DOC);
        let out = run(CliArgs {
            config: None,
            command: Command::Inspect { file, json: true },
        })
        .await
        .expect("inspect");
        let summary: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(summary["views"][0]["elements"][0]["type"], serde_json::json!("text"));
        assert_eq!(summary["views"][0]["elements"][0]["title"], serde_json::json!("Hi"));
    }
}
