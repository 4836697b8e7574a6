//! Collects the strings arriving on `in` and, when `in` disconnects, sends the
//! collected text split on the delimiter (newline unless `delimiter` says
//! otherwise), one part per packet.

use crate::component::{BaseComponent, Component};
use crate::components::send_or_warn;
use crate::error::FlowResult;
use crate::port::PortAttributes;
use crate::port_registry::PortRegistry;
use crate::socket::Packet;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

struct SplitState {
  delimiter: String,
  buffer: String,
}

/// String splitter.
#[derive(Debug)]
pub struct SplitStr {
  base: BaseComponent,
}

impl SplitStr {
  /// Declares `in`, `delimiter` and `out`.
  pub fn new() -> FlowResult<Self> {
    let mut in_ports = PortRegistry::new();
    let mut out_ports = PortRegistry::new();
    let input = in_ports.add("in", PortAttributes::typed("string"))?.clone();
    let delimiter = in_ports.add("delimiter", PortAttributes::typed("string"))?.clone();
    let out = out_ports.add("out", PortAttributes::typed("string"))?.clone();

    let state = Rc::new(RefCell::new(SplitState {
      delimiter: "\n".to_string(),
      buffer: String::new(),
    }));

    let shared = Rc::clone(&state);
    delimiter.on_data(move |data, _| match data {
      Packet::String(value) => shared.borrow_mut().delimiter = value.clone(),
      other => warn!(packet = %other, "SplitStr ignores non-string delimiter"),
    });

    let shared = Rc::clone(&state);
    input.on_data(move |data, _| {
      let mut state = shared.borrow_mut();
      match data {
        Packet::String(text) => state.buffer.push_str(text),
        other => state.buffer.push_str(&other.to_string()),
      }
    });

    input.on_disconnect(move |_| {
      let parts: Vec<String> = {
        let mut state = state.borrow_mut();
        let text = std::mem::take(&mut state.buffer);
        text.split(state.delimiter.as_str()).map(str::to_string).collect()
      };
      for part in parts {
        send_or_warn(&out, Packet::String(part));
      }
      out.disconnect();
    });

    Ok(Self {
      base: BaseComponent::new("Split a string into parts", in_ports, out_ports),
    })
  }
}

impl Component for SplitStr {
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
