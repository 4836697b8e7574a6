//! # Test Support
//!
//! A probe component that records every signal reaching its in-ports, and a
//! factory registering probes under a few type names.

use crate::builder::ComponentFactory;
use crate::component::{BaseComponent, Component};
use crate::error::FlowResult;
use crate::port::{Origin, PortAttributes};
use crate::port_registry::PortRegistry;
use crate::socket::{Signal, SignalKind};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared record of observed signals, one line per signal.
pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn new_log() -> Log {
  Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn entries(log: &Log) -> Vec<String> {
  log.borrow().clone()
}

/// Renders a port signal as `port[index] kind payload`.
pub(crate) fn describe(port: &str, signal: &Signal, origin: &Origin) -> String {
  let at = match origin.index() {
    Some(index) => format!("{port}[{index}]"),
    None => port.to_string(),
  };
  match signal {
    Signal::Data(data) => format!("{at} data {data}"),
    Signal::BeginGroup(group) => format!("{at} begin.group {group}"),
    Signal::EndGroup(group) => format!("{at} end.group {group}"),
    other => format!("{at} {}", other.kind()),
  }
}

/// Component with arbitrary ports that logs what its in-ports receive.
pub(crate) struct Probe {
  base: BaseComponent,
}

impl Probe {
  pub(crate) fn new(
    log: &Log,
    ins: &[(&str, PortAttributes)],
    outs: &[(&str, PortAttributes)],
  ) -> FlowResult<Self> {
    let mut in_ports = PortRegistry::new();
    for (name, attributes) in ins {
      let port = in_ports.add(name, attributes.clone())?.clone();
      for kind in [
        SignalKind::Connect,
        SignalKind::BeginGroup,
        SignalKind::Data,
        SignalKind::EndGroup,
        SignalKind::Disconnect,
      ] {
        let log = Rc::clone(log);
        let name = name.to_string();
        port.on(kind, move |signal, origin| {
          log.borrow_mut().push(describe(&name, signal, origin))
        });
      }
    }

    let mut out_ports = PortRegistry::new();
    for (name, attributes) in outs {
      out_ports.add(name, attributes.clone())?;
    }

    Ok(Self {
      base: BaseComponent::new("Records incoming signals", in_ports, out_ports),
    })
  }
}

impl Component for Probe {
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

/// Factory with the bundled components plus two probe types:
///
/// - `Source`: out-ports `out` (string), `num` (int), `any` (all).
/// - `Sink`: in-ports `in` (string), `number` (number), `count` (int),
///   `any` (all), `multi` (all, addressable), `odd` (invalid datatype);
///   out-port `out` (string).
pub(crate) fn probe_factory(log: &Log) -> ComponentFactory {
  let mut factory = ComponentFactory::with_defaults();

  let source_log = Rc::clone(log);
  factory
    .register("Source", move || {
      Probe::new(
        &source_log,
        &[],
        &[
          ("out", PortAttributes::typed("string")),
          ("num", PortAttributes::typed("int")),
          ("any", PortAttributes::default()),
        ],
      )
    })
    .unwrap();

  let sink_log = Rc::clone(log);
  factory
    .register("Sink", move || {
      Probe::new(
        &sink_log,
        &[
          ("in", PortAttributes::typed("string")),
          ("number", PortAttributes::typed("number")),
          ("count", PortAttributes::typed("int")),
          ("any", PortAttributes::default()),
          ("multi", PortAttributes::default().addressable(true)),
          ("odd", PortAttributes::typed("float")),
        ],
        &[("out", PortAttributes::typed("string"))],
      )
    })
    .unwrap();

  factory
}
