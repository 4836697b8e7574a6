//! Counts the packets arriving on `in` and sends the count on `count` when
//! `in` disconnects.

use crate::component::{BaseComponent, Component};
use crate::components::send_or_warn;
use crate::error::FlowResult;
use crate::port::PortAttributes;
use crate::port_registry::PortRegistry;
use crate::socket::Packet;
use std::cell::Cell;
use std::rc::Rc;

/// Packet counter.
#[derive(Debug)]
pub struct Counter {
  base: BaseComponent,
}

impl Counter {
  /// Declares `in` and `count`.
  pub fn new() -> FlowResult<Self> {
    let mut in_ports = PortRegistry::new();
    let mut out_ports = PortRegistry::new();
    let input = in_ports.add("in", PortAttributes::typed("bang"))?.clone();
    let count = out_ports.add("count", PortAttributes::typed("int"))?.clone();

    // None until the first packet of a connection.
    let counted: Rc<Cell<Option<u64>>> = Rc::new(Cell::new(None));

    let shared = Rc::clone(&counted);
    input.on_data(move |_, _| shared.set(Some(shared.get().unwrap_or(0) + 1)));

    input.on_disconnect(move |_| {
      let total = counted.take().map_or(Packet::Null, Packet::from);
      send_or_warn(&count, total);
      count.disconnect();
    });

    Ok(Self {
      base: BaseComponent::new("Count number of data packets", in_ports, out_ports),
    })
  }
}

impl Component for Counter {
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
