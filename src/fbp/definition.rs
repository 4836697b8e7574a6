//! # Graph Definition
//!
//! The plain, serialisable shape of a graph. The FBP parser and the file
//! loader produce it; [`Graph::load_definition`](crate::graph::Graph::load_definition)
//! consumes it and [`Graph::to_definition`](crate::graph::Graph::to_definition)
//! renders a graph back into it.
//!
//! ```json
//! {
//!   "properties": { "name": "linecount" },
//!   "initializers": [ { "data": "file.txt", "tgt": { "process": "ReadFile", "port": "source" } } ],
//!   "processes": { "ReadFile": { "component": "ReadFile" } },
//!   "connections": [ { "src": { "process": "ReadFile", "port": "out" },
//!                      "tgt": { "process": "SplitStr", "port": "in" } } ]
//! }
//! ```

use crate::error::FlowResult;
use crate::fbp::dumper;
use crate::socket::{Endpoint, Packet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Graph level properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphProperties {
  /// Graph name.
  #[serde(default)]
  pub name: String,
  /// Any further properties, kept verbatim.
  #[serde(flatten)]
  pub extra: IndexMap<String, Packet>,
}

/// A one-shot value delivered to an in-port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializerDefinition {
  /// The value.
  pub data: Packet,
  /// Receiving port.
  pub tgt: Endpoint,
}

/// A process: a named instance of a component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
  /// Component type name.
  pub component: String,
  /// Free-form metadata.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata: Option<IndexMap<String, Packet>>,
}

impl ProcessDefinition {
  /// A process of type `component` without metadata.
  pub fn new(component: impl Into<String>) -> Self {
    Self {
      component: component.into(),
      metadata: None,
    }
  }
}

/// A port to port connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
  /// Sending port.
  pub src: Endpoint,
  /// Receiving port.
  pub tgt: Endpoint,
}

/// Serialisable graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
  /// Graph properties.
  #[serde(default)]
  pub properties: GraphProperties,
  /// Initial packets, in delivery order.
  #[serde(default)]
  pub initializers: Vec<InitializerDefinition>,
  /// Processes keyed by id, in declaration order.
  #[serde(default)]
  pub processes: IndexMap<String, ProcessDefinition>,
  /// Connections, in wiring order.
  #[serde(default)]
  pub connections: Vec<ConnectionDefinition>,
}

impl GraphDefinition {
  /// An empty definition called `name`.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      properties: GraphProperties {
        name: name.into(),
        extra: IndexMap::new(),
      },
      ..Self::default()
    }
  }

  /// The graph name.
  pub fn name(&self) -> &str {
    &self.properties.name
  }

  /// Parses a JSON document.
  pub fn from_json(source: &str) -> FlowResult<Self> {
    Ok(serde_json::from_str(source)?)
  }

  /// Parses a YAML document.
  pub fn from_yaml(source: &str) -> FlowResult<Self> {
    Ok(serde_yaml::from_str(source)?)
  }

  /// Renders pretty-printed JSON.
  pub fn to_json(&self) -> FlowResult<String> {
    dumper::to_json(self)
  }

  /// Renders YAML.
  pub fn to_yaml(&self) -> FlowResult<String> {
    dumper::to_yaml(self)
  }

  /// Renders FBP DSL text.
  pub fn to_fbp(&self) -> FlowResult<String> {
    dumper::to_fbp(self)
  }
}
