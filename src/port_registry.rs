//! # Port Registry
//!
//! Named ports for one side (in or out) of a component. The registry picks the
//! port flavour from the attributes: addressable ports become
//! [`ArrayPort`](crate::port::ArrayPort)s, everything else a
//! [`SinglePort`](crate::port::SinglePort).
//!
//! Ports are kept in declaration order.

use crate::error::{FlowError, FlowResult};
use crate::port::{Port, PortAttributes};
use indexmap::IndexMap;
use std::ops::Index;

/// Ordered set of uniquely named ports.
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
  ports: IndexMap<String, Port>,
}

impl PortRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares a port. Fails if the name is taken.
  pub fn add(&mut self, name: &str, attributes: PortAttributes) -> FlowResult<&Port> {
    if self.ports.contains_key(name) {
      return Err(FlowError::definition(format!(
        "The port {name} already exists!"
      )));
    }
    let port = Port::new(name, attributes);
    Ok(self.ports.entry(name.to_string()).or_insert(port))
  }

  /// Looks up a port by name.
  pub fn get(&self, name: &str) -> FlowResult<&Port> {
    self
      .ports
      .get(name)
      .ok_or_else(|| FlowError::definition(format!("The port {name} does not exist!")))
  }

  /// Whether a port with this name exists.
  pub fn has(&self, name: &str) -> bool {
    self.ports.contains_key(name)
  }

  /// Removes a port, returning it.
  pub fn remove(&mut self, name: &str) -> Option<Port> {
    self.ports.shift_remove(name)
  }

  /// All ports in declaration order.
  pub fn all(&self) -> impl Iterator<Item = &Port> {
    self.ports.values()
  }

  /// Port names in declaration order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.ports.keys().map(String::as_str)
  }

  /// Number of ports.
  pub fn len(&self) -> usize {
    self.ports.len()
  }

  /// Whether the registry has no ports.
  pub fn is_empty(&self) -> bool {
    self.ports.is_empty()
  }

  /// Shuts down every port.
  pub fn shutdown(&self) {
    for port in self.ports.values() {
      port.shutdown();
    }
  }
}

impl Index<&str> for PortRegistry {
  type Output = Port;

  /// Panics when the port is missing; use [`PortRegistry::get`] for a
  /// fallible lookup.
  fn index(&self, name: &str) -> &Port {
    &self.ports[name]
  }
}

impl<'a> IntoIterator for &'a PortRegistry {
  type Item = (&'a String, &'a Port);
  type IntoIter = indexmap::map::Iter<'a, String, Port>;

  fn into_iter(self) -> Self::IntoIter {
    self.ports.iter()
  }
}
