//! # Hooks
//!
//! Socket listeners registered on a network by alias. Every socket the network
//! creates, for edges and initializers alike, gets all registered hooks before
//! it carries anything, so tracing tools observe the complete traffic without
//! touching component code.

use crate::error::{FlowError, FlowResult};
use crate::socket::{Signal, SignalKind, Socket, SocketListener};
use indexmap::IndexMap;
use std::rc::Rc;

/// Socket signals a hook may observe.
pub const HOOKABLE: [SignalKind; 5] = [
  SignalKind::Data,
  SignalKind::Connect,
  SignalKind::Disconnect,
  SignalKind::BeginGroup,
  SignalKind::EndGroup,
];

/// Hook table: event, then alias, then callback.
#[derive(Default)]
pub struct Hooks {
  table: IndexMap<SignalKind, IndexMap<String, Rc<SocketListener>>>,
}

impl Hooks {
  /// Creates an empty table.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `callback` under `alias` for `event`.
  ///
  /// Fails when `event` is not one of [`HOOKABLE`] or the alias is already
  /// taken for that event.
  pub fn add(
    &mut self,
    event: &str,
    alias: &str,
    callback: impl Fn(&Signal, &Socket) + 'static,
  ) -> FlowResult<()> {
    let kind = event
      .parse::<SignalKind>()
      .ok()
      .filter(|kind| HOOKABLE.contains(kind))
      .ok_or_else(|| {
        let valid: Vec<&str> = HOOKABLE.iter().map(SignalKind::as_str).collect();
        FlowError::definition(format!(
          "Event {event} is not supported, use one of: {}",
          valid.join(", ")
        ))
      })?;

    let aliases = self.table.entry(kind).or_default();
    if aliases.contains_key(alias) {
      return Err(FlowError::definition(format!(
        "The hook {alias} for event {event} already exists"
      )));
    }
    aliases.insert(alias.to_string(), Rc::new(callback));
    Ok(())
  }

  /// Attaches every hook to `socket`.
  pub fn apply(&self, socket: &Socket) {
    for (kind, aliases) in &self.table {
      for callback in aliases.values() {
        let callback = Rc::clone(callback);
        socket.on(*kind, move |signal, socket| callback(signal, socket));
      }
    }
  }

  /// Registered aliases per event name.
  pub fn aliases(&self) -> IndexMap<&'static str, Vec<String>> {
    self
      .table
      .iter()
      .map(|(kind, aliases)| (kind.as_str(), aliases.keys().cloned().collect()))
      .collect()
  }

  /// Whether no hook is registered.
  pub fn is_empty(&self) -> bool {
    self.table.values().all(|aliases| aliases.is_empty())
  }
}
