//! Prints every packet arriving on any socket of its addressable `in` port.

use crate::component::{BaseComponent, Component};
use crate::error::FlowResult;
use crate::port::PortAttributes;
use crate::port_registry::PortRegistry;
use crate::socket::Packet;
use tracing::info;

/// Console sink.
#[derive(Debug)]
pub struct Output {
  base: BaseComponent,
}

impl Output {
  /// Declares the addressable `in` port.
  pub fn new() -> FlowResult<Self> {
    let mut in_ports = PortRegistry::new();
    let input = in_ports
      .add("in", PortAttributes::default().addressable(true))?
      .clone();

    input.on_data(|data, origin| {
      let line = match data {
        Packet::String(text) => text.clone(),
        other => other.to_string(),
      };
      info!(socket = ?origin.index(), "{line}");
      println!("{line}");
    });

    Ok(Self {
      base: BaseComponent::new("Display packets on the console", in_ports, PortRegistry::new()),
    })
  }
}

impl Component for Output {
  fn description(&self) -> &str {
    self.base.description()
  }

  fn in_ports(&self) -> &PortRegistry {
    self.base.in_ports()
  }

  fn out_ports(&self) -> &PortRegistry {
    self.base.out_ports()
  }
}
