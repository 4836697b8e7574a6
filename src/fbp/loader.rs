//! # Loader
//!
//! Reads a graph definition file, picking the format from its extension:
//! `.fbp` (FBP DSL), `.json`, `.yaml` or `.yml`.

use crate::error::{FlowError, FlowResult};
use crate::fbp::definition::GraphDefinition;
use crate::fbp::parser;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Definition file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  /// FBP DSL text.
  Fbp,
  /// JSON document.
  Json,
  /// YAML document.
  Yaml,
}

impl Format {
  /// Format for a file extension, case-insensitive.
  pub fn from_extension(extension: &str) -> Option<Self> {
    match extension.to_ascii_lowercase().as_str() {
      "fbp" => Some(Format::Fbp),
      "json" => Some(Format::Json),
      "yaml" | "yml" => Some(Format::Yaml),
      _ => None,
    }
  }

  /// Format of `path`, judged by its extension.
  pub fn of(path: &Path) -> Option<Self> {
    path
      .extension()
      .and_then(|extension| extension.to_str())
      .and_then(Self::from_extension)
  }

  /// Parses `source` in this format.
  pub fn parse(self, source: &str) -> FlowResult<GraphDefinition> {
    match self {
      Format::Fbp => parser::parse(source),
      Format::Json => GraphDefinition::from_json(source),
      Format::Yaml => GraphDefinition::from_yaml(source),
    }
  }

  /// Renders `definition` in this format.
  pub fn render(self, definition: &GraphDefinition) -> FlowResult<String> {
    match self {
      Format::Fbp => definition.to_fbp(),
      Format::Json => definition.to_json(),
      Format::Yaml => definition.to_yaml(),
    }
  }
}

/// Loads the definition stored at `path`.
pub fn load_file(path: impl AsRef<Path>) -> FlowResult<GraphDefinition> {
  let path = path.as_ref();
  let format = Format::of(path).ok_or_else(|| {
    FlowError::Loader(format!(
      "{} has no supported extension (fbp, json, yaml, yml)",
      path.display()
    ))
  })?;

  if !path.is_file() {
    return Err(FlowError::Loader(format!(
      "file {} does not exist",
      path.display()
    )));
  }

  let source = fs::read_to_string(path)?;
  if source.trim().is_empty() {
    return Err(FlowError::Loader(format!("file {} is empty", path.display())));
  }

  debug!(path = %path.display(), ?format, "loading graph definition");
  format.parse(&source)
}
