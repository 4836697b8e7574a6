//! # Error Handling
//!
//! Every fallible operation in flowweave returns [`FlowResult`]. The error kinds
//! mirror the three failure classes of a dataflow network:
//!
//! - **Definition errors**: the graph is malformed. An edge names a node or port
//!   that does not exist, a component type cannot be resolved, a port is
//!   attached twice, a port datatype is not one of the known datatypes.
//! - **Incompatible datatypes**: both ports are individually valid but the
//!   out-port datatype cannot flow into the in-port datatype.
//! - **Flow errors**: runtime protocol violations such as running a network
//!   that was never booted, or sending on a port without a socket.
//!
//! Parsing, loading and dumping of graph definitions add their own variants,
//! and I/O or serde failures are wrapped transparently.
//!
//! All errors are synchronous and fail fast: the operation that raised them is
//! aborted and already wired state is left untouched.

use thiserror::Error;

/// Error type for graph, network and port operations.
#[derive(Error, Debug)]
pub enum FlowError {
  /// The graph references something that does not exist or is malformed.
  #[error("invalid definition: {0}")]
  InvalidDefinition(String),
  /// Two valid ports were connected but their datatypes do not match.
  #[error("incompatible datatype: {0}")]
  IncompatibleDatatype(String),
  /// Runtime protocol violation.
  #[error("flow error: {0}")]
  Flow(String),
  /// The FBP DSL parser rejected a line.
  #[error("parse error on line {line}: {message}")]
  Parse {
    /// 1-based line number in the source text.
    line: usize,
    /// What went wrong.
    message: String,
  },
  /// A definition file could not be loaded.
  #[error("loader error: {0}")]
  Loader(String),
  /// A definition could not be rendered.
  #[error("dumper error: {0}")]
  Dumper(String),
  /// I/O error.
  #[error(transparent)]
  Io(#[from] std::io::Error),
  /// JSON (de)serialization error.
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  /// YAML (de)serialization error.
  #[error(transparent)]
  Yaml(#[from] serde_yaml::Error),
  /// Invalid parser pattern.
  #[error(transparent)]
  Regex(#[from] regex::Error),
}

impl FlowError {
  /// Shorthand for [`FlowError::InvalidDefinition`].
  pub fn definition(message: impl Into<String>) -> Self {
    FlowError::InvalidDefinition(message.into())
  }

  /// Shorthand for [`FlowError::Flow`].
  pub fn flow(message: impl Into<String>) -> Self {
    FlowError::Flow(message.into())
  }

  /// Returns true when the graph itself is malformed.
  pub fn is_definition_error(&self) -> bool {
    matches!(self, FlowError::InvalidDefinition(_))
  }

  /// Returns true when the graph is well-formed but wrongly typed.
  pub fn is_incompatible_datatype(&self) -> bool {
    matches!(self, FlowError::IncompatibleDatatype(_))
  }
}

/// Result alias used throughout the crate.
pub type FlowResult<T> = Result<T, FlowError>;
