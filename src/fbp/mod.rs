//! # FBP Definitions
//!
//! Everything that turns text into a [`GraphDefinition`] and back: the FBP
//! DSL parser, the FBP/JSON/YAML dumper and the file loader.

pub mod definition;
pub mod dumper;
pub mod loader;
pub mod parser;

pub use definition::{
  ConnectionDefinition, GraphDefinition, GraphProperties, InitializerDefinition, ProcessDefinition,
};
pub use loader::{Format, load_file};
pub use parser::FbpParser;
