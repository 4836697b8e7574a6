//! Buffers packets from `in` and sends them as one array on `messages` once
//! `size` packets are buffered, or when the `in` socket is detached.
//!
//! The size defaults to 100. A `size` packet that is not a non-negative
//! integer fitting in `usize` is reported on `err` and leaves the size
//! unchanged.

use crate::component::{BaseComponent, Component};
use crate::components::send_or_warn;
use crate::error::FlowResult;
use crate::port::{Port, PortAttributes};
use crate::port_registry::PortRegistry;
use crate::socket::Packet;
use std::cell::RefCell;
use std::rc::Rc;

/// Default number of packets buffered before a flush.
pub const DEFAULT_SIZE: usize = 100;

struct QueueState {
  size: usize,
  messages: Vec<Packet>,
}

/// Packet batcher.
#[derive(Debug)]
pub struct Queue {
  base: BaseComponent,
}

impl Queue {
  /// Declares `in`, `size`, `messages` and `err`.
  pub fn new() -> FlowResult<Self> {
    let mut in_ports = PortRegistry::new();
    let mut out_ports = PortRegistry::new();
    let input = in_ports.add("in", PortAttributes::default())?.clone();
    let size = in_ports.add("size", PortAttributes::typed("int"))?.clone();
    let err = out_ports.add("err", PortAttributes::typed("string"))?.clone();
    let messages = out_ports.add("messages", PortAttributes::typed("array"))?.clone();

    let state = Rc::new(RefCell::new(QueueState {
      size: DEFAULT_SIZE,
      messages: Vec::new(),
    }));

    let (shared, out) = (Rc::clone(&state), messages.clone());
    input.on_data(move |data, _| {
      shared.borrow_mut().messages.push(data.clone());
      flush_when_full(&shared, &out);
    });

    let (shared, out) = (Rc::clone(&state), messages.clone());
    input.on_detach(move |_| flush(&shared, &out));

    size.on_data(move |data, _| match as_size(data) {
      Some(value) => {
        state.borrow_mut().size = value;
        flush_when_full(&state, &messages);
      }
      None => send_or_warn(
        &err,
        Packet::String(format!(
          "Invalid queue size: '{data}'. Queue resize operation expects a positive integer value."
        )),
      ),
    });

    Ok(Self {
      base: BaseComponent::new("Batch packets into arrays", in_ports, out_ports),
    })
  }
}

/// `data` as a queue size, if it is an integer that fits `usize`.
fn as_size(data: &Packet) -> Option<usize> {
  data.as_u64().and_then(|value| usize::try_from(value).ok())
}

fn flush_when_full(state: &RefCell<QueueState>, out: &Port) {
  let full = {
    let state = state.borrow();
    state.messages.len() >= state.size
  };
  if full {
    flush(state, out);
  }
}

fn flush(state: &RefCell<QueueState>, out: &Port) {
  let messages = std::mem::take(&mut state.borrow_mut().messages);
  if messages.is_empty() {
    return;
  }
  send_or_warn(out, Packet::Array(messages));
  out.disconnect();
}

impl Component for Queue {
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
