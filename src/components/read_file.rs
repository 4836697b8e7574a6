//! Reads a file named by each `source` packet and sends its contents on `out`.
//! Missing files produce a message on `error`.

use crate::component::{BaseComponent, Component};
use crate::components::send_or_warn;
use crate::error::FlowResult;
use crate::port::{Port, PortAttributes};
use crate::port_registry::PortRegistry;
use crate::socket::Packet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// File reader.
#[derive(Debug)]
pub struct ReadFile {
  base: BaseComponent,
}

impl ReadFile {
  /// Declares `source`, `out` and `error`.
  pub fn new() -> FlowResult<Self> {
    let mut in_ports = PortRegistry::new();
    let mut out_ports = PortRegistry::new();
    let source = in_ports.add("source", PortAttributes::typed("string"))?.clone();
    let out = out_ports.add("out", PortAttributes::typed("string"))?.clone();
    let error = out_ports.add("error", PortAttributes::default())?.clone();

    source.on_data(move |data, _| read(data, &out, &error));

    Ok(Self {
      base: BaseComponent::new("Read file from disk", in_ports, out_ports),
    })
  }
}

fn read(data: &Packet, out: &Port, error: &Port) {
  let path = match data {
    Packet::String(path) => path.as_str(),
    other => {
      warn!(packet = %other, "ReadFile expects a path string");
      send_or_warn(error, Packet::String(format!("Invalid path {other}")));
      return;
    }
  };

  if !Path::new(path).is_file() {
    send_or_warn(error, Packet::String(format!("File {path} doesn't exist")));
    return;
  }

  match fs::read_to_string(path) {
    Ok(contents) => {
      send_or_warn(out, Packet::String(contents));
      out.disconnect();
    }
    Err(err) => {
      warn!(path, error = %err, "ReadFile failed");
      send_or_warn(error, Packet::String(format!("File {path} could not be read: {err}")));
    }
  }
}

impl Component for ReadFile {
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
