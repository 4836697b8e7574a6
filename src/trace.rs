//! # Flow Tracing
//!
//! [`TraceableNetwork`] decorates a [`Network`] with a `flowtrace` hook on
//! every socket it creates and reports the traffic through `tracing`, under
//! the `flowtrace` target:
//!
//! ```text
//! ReadFile out -> in SplitStr CONN
//! ReadFile out -> in SplitStr DATA first line
//! -> source ReadFile DATA /tmp/input.txt
//! ```
//!
//! Packets are logged at `INFO`, connection lifecycle and group delimiters at
//! `DEBUG`. Initializer sockets have no source, so their lines start at the
//! arrow. Where the lines end up is decided by the installed subscriber.

use crate::error::{FlowError, FlowResult};
use crate::network::{GraphSource, Network};
use crate::socket::{Packet, Signal, Socket};
use std::ops::Deref;
use tracing::{debug, info};

/// Alias the trace hooks are registered under.
pub const TRACE_ALIAS: &str = "flowtrace";

/// Events the tracer hooks.
const TRACED: [&str; 5] = ["data", "connect", "disconnect", "begin.group", "end.group"];

/// A network whose socket traffic is logged.
#[derive(Debug)]
pub struct TraceableNetwork {
  network: Network,
}

impl TraceableNetwork {
  /// Installs the trace hooks on `network`.
  ///
  /// Fails if `network` already has a hook registered as
  /// [`TRACE_ALIAS`].
  pub fn new(network: Network) -> FlowResult<Self> {
    let hooks = network.hooks();
    let taken = TRACED.iter().find(|event| {
      hooks
        .get(**event)
        .is_some_and(|aliases| aliases.iter().any(|alias| alias == TRACE_ALIAS))
    });
    if let Some(event) = taken {
      return Err(FlowError::definition(format!(
        "The hook {TRACE_ALIAS} for event {event} already exists"
      )));
    }

    for event in TRACED {
      network.hook(event, TRACE_ALIAS, trace)?;
    }
    Ok(Self { network })
  }

  /// The decorated network.
  pub fn network(&self) -> &Network {
    &self.network
  }

  /// Boots the decorated network.
  pub fn boot(&self, source: impl Into<GraphSource>) -> FlowResult<&Self> {
    self.network.boot(source)?;
    Ok(self)
  }

  /// Runs `data` into `node.port` on the decorated network.
  pub fn run(&self, data: Packet, node: &str, port: &str) -> FlowResult<&Self> {
    self.network.run(data, node, port)?;
    Ok(self)
  }

  /// Shuts the decorated network down.
  pub fn shutdown(&self) {
    self.network.shutdown();
  }

  /// Removes the decorator. Hooks stay on already created sockets.
  pub fn into_inner(self) -> Network {
    self.network
  }
}

impl Deref for TraceableNetwork {
  type Target = Network;

  fn deref(&self) -> &Network {
    &self.network
  }
}

/// Renders the route of `socket`, e.g. `A out -> in B`.
fn route(socket: &Socket) -> String {
  let to = socket
    .to()
    .map(|to| format!("-> {} {}", to.port, to.process))
    .unwrap_or_else(|| "-> ANON".to_string());
  match socket.from() {
    Some(from) => format!("{} {} {to}", from.process, from.port),
    None => to,
  }
}

fn render(data: &Packet) -> String {
  match data {
    Packet::String(text) => text.clone(),
    other => other.to_string(),
  }
}

fn trace(signal: &Signal, socket: &Socket) {
  let route = route(socket);
  match signal {
    Signal::Data(data) => info!(target: "flowtrace", "{route} DATA {}", render(data)),
    Signal::Connect => debug!(target: "flowtrace", "{route} CONN"),
    Signal::Disconnect => debug!(target: "flowtrace", "{route} DISC"),
    Signal::BeginGroup(group) => debug!(target: "flowtrace", "{route} GROUP {group}"),
    Signal::EndGroup(group) => debug!(target: "flowtrace", "{route} ENDGROUP {group}"),
    _ => {}
  }
}
