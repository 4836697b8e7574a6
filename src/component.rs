//! # Components
//!
//! A component is the unit of work a network process runs. The runtime only
//! needs a component to expose a description, its in- and out-port registries,
//! and a way to shut down. Behaviour lives in the listeners the component
//! registers on its own ports when it is constructed.
//!
//! [`BaseComponent`] holds the two registries and the description; concrete
//! components embed it and delegate to it.
//!
//! ```rust
//! use flowweave::component::{BaseComponent, Component};
//! use flowweave::port::PortAttributes;
//! use flowweave::port_registry::PortRegistry;
//!
//! struct Echo {
//!   base: BaseComponent,
//! }
//!
//! impl Echo {
//!   fn new() -> flowweave::FlowResult<Self> {
//!     let mut in_ports = PortRegistry::new();
//!     let mut out_ports = PortRegistry::new();
//!     let input = in_ports.add("in", PortAttributes::default())?.clone();
//!     let output = out_ports.add("out", PortAttributes::default())?.clone();
//!     input.on_data(move |data, _| {
//!       let _ = output.send(data.clone());
//!     });
//!     Ok(Self {
//!       base: BaseComponent::new("Echoes every packet", in_ports, out_ports),
//!     })
//!   }
//! }
//!
//! impl Component for Echo {
//!   fn description(&self) -> &str {
//!     self.base.description()
//!   }
//!   fn in_ports(&self) -> &PortRegistry {
//!     self.base.in_ports()
//!   }
//!   fn out_ports(&self) -> &PortRegistry {
//!     self.base.out_ports()
//!   }
//! }
//! ```

use crate::port_registry::PortRegistry;

/// Capability every network process satisfies.
pub trait Component {
  /// Human readable description.
  fn description(&self) -> &str;

  /// Inbound ports.
  fn in_ports(&self) -> &PortRegistry;

  /// Outbound ports.
  fn out_ports(&self) -> &PortRegistry;

  /// Shuts down every port, tearing down attached sockets.
  fn shutdown(&self) {
    self.in_ports().shutdown();
    self.out_ports().shutdown();
  }
}

/// Description plus port registries, embedded by concrete components.
#[derive(Debug, Default)]
pub struct BaseComponent {
  description: String,
  in_ports: PortRegistry,
  out_ports: PortRegistry,
}

impl BaseComponent {
  /// Creates the base from already declared ports.
  pub fn new(description: impl Into<String>, in_ports: PortRegistry, out_ports: PortRegistry) -> Self {
    Self {
      description: description.into(),
      in_ports,
      out_ports,
    }
  }

  /// Human readable description.
  pub fn description(&self) -> &str {
    &self.description
  }

  /// Inbound ports.
  pub fn in_ports(&self) -> &PortRegistry {
    &self.in_ports
  }

  /// Outbound ports.
  pub fn out_ports(&self) -> &PortRegistry {
    &self.out_ports
  }
}

impl Component for BaseComponent {
  fn description(&self) -> &str {
    &self.description
  }

  fn in_ports(&self) -> &PortRegistry {
    &self.in_ports
  }

  fn out_ports(&self) -> &PortRegistry {
    &self.out_ports
  }
}
