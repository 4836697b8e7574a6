//! # Dumper
//!
//! Renders a [`GraphDefinition`] as FBP DSL text, pretty JSON or YAML.
//!
//! FBP output puts the graph name on a `#` header line, then one line per
//! initializer (`'data' -> port Process(Component)`) and one line per
//! connection (`Process(Component) port -> port Process(Component)`), so the
//! result parses back into the same definition.
//!
//! The DSL only carries single-line string initializers. Any other initializer
//! value is a [`FlowError::Dumper`] error rather than a lossy rendering; use
//! JSON or YAML for such graphs.

use crate::error::{FlowError, FlowResult};
use crate::fbp::definition::GraphDefinition;
use crate::fbp::parser::SEPARATOR;
use crate::socket::{Endpoint, Packet};

/// Pretty-printed JSON.
pub fn to_json(definition: &GraphDefinition) -> FlowResult<String> {
  Ok(serde_json::to_string_pretty(definition)?)
}

/// YAML.
pub fn to_yaml(definition: &GraphDefinition) -> FlowResult<String> {
  Ok(serde_yaml::to_string(definition)?)
}

/// FBP DSL text.
pub fn to_fbp(definition: &GraphDefinition) -> FlowResult<String> {
  let mut lines = Vec::new();

  if !definition.properties.name.is_empty() {
    lines.push(format!("# {}", definition.properties.name));
  }

  for initializer in &definition.initializers {
    lines.push(format!(
      "{} {SEPARATOR} {}",
      render_data(&initializer.data)?,
      target(definition, &initializer.tgt)?
    ));
  }

  for connection in &definition.connections {
    lines.push(format!(
      "{} {SEPARATOR} {}",
      source(definition, &connection.src)?,
      target(definition, &connection.tgt)?
    ));
  }

  Ok(lines.join("\n"))
}

fn render_data(data: &Packet) -> FlowResult<String> {
  match data {
    Packet::String(text) if text.contains(['\n', '\r', '\'']) || text.contains(SEPARATOR) => {
      Err(FlowError::Dumper(format!(
        "initializer {data} cannot be written as FBP text"
      )))
    }
    Packet::String(text) => Ok(format!("'{text}'")),
    Packet::Null => Err(FlowError::Dumper(
      "Definition has initializers but no data".to_string(),
    )),
    other => Err(FlowError::Dumper(format!(
      "initializer {other} is not a string, FBP text only carries strings"
    ))),
  }
}

fn process(definition: &GraphDefinition, endpoint: &Endpoint) -> FlowResult<String> {
  definition
    .processes
    .get(&endpoint.process)
    .map(|process| format!("{}({})", endpoint.process, process.component))
    .ok_or_else(|| {
      FlowError::Dumper(format!(
        "{} is not defined in processes",
        endpoint.process
      ))
    })
}

fn source(definition: &GraphDefinition, endpoint: &Endpoint) -> FlowResult<String> {
  Ok(format!("{} {}", process(definition, endpoint)?, endpoint.port))
}

fn target(definition: &GraphDefinition, endpoint: &Endpoint) -> FlowResult<String> {
  Ok(format!("{} {}", endpoint.port, process(definition, endpoint)?))
}
