//! # Sockets
//!
//! A [`Socket`] is the in-process connection between one out-port and one
//! in-port. It carries data packets, group delimiters and lifecycle signals,
//! and records the `from`/`to` endpoints it was wired between.
//!
//! Sockets are cheap handles (`Rc`); cloning a socket yields another handle to
//! the same connection. Every signal is dispatched synchronously to the
//! socket's listeners in registration order.
//!
//! ## Signals
//!
//! | Signal        | Emitted by                                   |
//! |---------------|----------------------------------------------|
//! | `connect`     | [`Socket::connect`]                          |
//! | `begin.group` | [`Socket::begin_group`]                      |
//! | `data`        | [`Socket::send`]                             |
//! | `end.group`   | [`Socket::end_group`]                        |
//! | `disconnect`  | [`Socket::disconnect`]                       |
//! | `detach`      | a port releasing the socket                  |
//! | `shutdown`    | [`Socket::shutdown`]                         |

use crate::error::FlowError;
use crate::event::{EventEmitter, ListenerId};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::trace;

/// The payload carried by a socket. Any JSON-representable value.
pub type Packet = serde_json::Value;

/// Names of the signals flowing through sockets and ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
  /// A socket was attached to a port (port-level only).
  Attach,
  /// The connection opened.
  Connect,
  /// A group of packets begins.
  BeginGroup,
  /// A data packet.
  Data,
  /// A group of packets ends.
  EndGroup,
  /// The connection closed.
  Disconnect,
  /// A socket was released by a port.
  Detach,
  /// The owning network is shutting down.
  Shutdown,
}

impl SignalKind {
  /// Wire name of the signal, e.g. `"begin.group"`.
  pub fn as_str(&self) -> &'static str {
    match self {
      SignalKind::Attach => "attach",
      SignalKind::Connect => "connect",
      SignalKind::BeginGroup => "begin.group",
      SignalKind::Data => "data",
      SignalKind::EndGroup => "end.group",
      SignalKind::Disconnect => "disconnect",
      SignalKind::Detach => "detach",
      SignalKind::Shutdown => "shutdown",
    }
  }
}

impl fmt::Display for SignalKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SignalKind {
  type Err = FlowError;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    match name {
      "attach" => Ok(SignalKind::Attach),
      "connect" => Ok(SignalKind::Connect),
      "begin.group" => Ok(SignalKind::BeginGroup),
      "data" => Ok(SignalKind::Data),
      "end.group" => Ok(SignalKind::EndGroup),
      "disconnect" => Ok(SignalKind::Disconnect),
      "detach" => Ok(SignalKind::Detach),
      "shutdown" => Ok(SignalKind::Shutdown),
      other => Err(FlowError::definition(format!("unknown event {other}"))),
    }
  }
}

/// A signal together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
  /// See [`SignalKind::Attach`].
  Attach,
  /// See [`SignalKind::Connect`].
  Connect,
  /// Opens the named group.
  BeginGroup(String),
  /// Carries one packet.
  Data(Packet),
  /// Closes the named group.
  EndGroup(String),
  /// See [`SignalKind::Disconnect`].
  Disconnect,
  /// See [`SignalKind::Detach`].
  Detach,
  /// See [`SignalKind::Shutdown`].
  Shutdown,
}

impl Signal {
  /// The kind this signal is dispatched under.
  pub fn kind(&self) -> SignalKind {
    match self {
      Signal::Attach => SignalKind::Attach,
      Signal::Connect => SignalKind::Connect,
      Signal::BeginGroup(_) => SignalKind::BeginGroup,
      Signal::Data(_) => SignalKind::Data,
      Signal::EndGroup(_) => SignalKind::EndGroup,
      Signal::Disconnect => SignalKind::Disconnect,
      Signal::Detach => SignalKind::Detach,
      Signal::Shutdown => SignalKind::Shutdown,
    }
  }
}

/// One end of a socket: a port on a named process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
  /// Process (node) id.
  pub process: String,
  /// Port name on that process.
  pub port: String,
}

impl Endpoint {
  /// Creates an endpoint.
  pub fn new(process: impl Into<String>, port: impl Into<String>) -> Self {
    Self {
      process: process.into(),
      port: port.into(),
    }
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.process, self.port)
  }
}

/// Callback type for socket listeners.
pub type SocketListener = dyn Fn(&Signal, &Socket);

struct SocketInner {
  connected: Cell<bool>,
  from: RefCell<Option<Endpoint>>,
  to: RefCell<Option<Endpoint>>,
  events: EventEmitter<SignalKind, SocketListener>,
}

/// In-process connection between two ports.
#[derive(Clone)]
pub struct Socket {
  inner: Rc<SocketInner>,
}

impl Default for Socket {
  fn default() -> Self {
    Self::new(None, None)
  }
}

impl Socket {
  /// Creates a disconnected socket. Initializer sockets have no `from`.
  pub fn new(from: Option<Endpoint>, to: Option<Endpoint>) -> Self {
    Self {
      inner: Rc::new(SocketInner {
        connected: Cell::new(false),
        from: RefCell::new(from),
        to: RefCell::new(to),
        events: EventEmitter::new(),
      }),
    }
  }

  /// Creates a socket between two endpoints.
  pub fn between(from: Endpoint, to: Endpoint) -> Self {
    Self::new(Some(from), Some(to))
  }

  /// Human readable identifier, `ANON` standing in for a missing endpoint.
  pub fn id(&self) -> String {
    let render = |endpoint: &Option<Endpoint>| match endpoint {
      Some(endpoint) => endpoint.to_string(),
      None => "ANON".to_string(),
    };
    format!(
      "{}:{}",
      render(&self.inner.from.borrow()),
      render(&self.inner.to.borrow())
    )
  }

  /// The upstream endpoint, absent for initializer sockets.
  pub fn from(&self) -> Option<Endpoint> {
    self.inner.from.borrow().clone()
  }

  /// Sets the upstream endpoint.
  pub fn set_from(&self, from: Option<Endpoint>) {
    *self.inner.from.borrow_mut() = from;
  }

  /// The downstream endpoint.
  pub fn to(&self) -> Option<Endpoint> {
    self.inner.to.borrow().clone()
  }

  /// Sets the downstream endpoint.
  pub fn set_to(&self, to: Option<Endpoint>) {
    *self.inner.to.borrow_mut() = to;
  }

  /// Whether the connection is currently open.
  pub fn is_connected(&self) -> bool {
    self.inner.connected.get()
  }

  /// Opens the connection.
  pub fn connect(&self) {
    self.inner.connected.set(true);
    trace!(socket = %self.id(), "connect");
    self.emit(&Signal::Connect);
  }

  /// Closes the connection.
  pub fn disconnect(&self) {
    self.inner.connected.set(false);
    trace!(socket = %self.id(), "disconnect");
    self.emit(&Signal::Disconnect);
  }

  /// Delivers a packet to the listeners.
  pub fn send(&self, data: Packet) {
    self.emit(&Signal::Data(data));
  }

  /// Opens a group of packets.
  pub fn begin_group(&self, group: &str) {
    self.emit(&Signal::BeginGroup(group.to_string()));
  }

  /// Closes a group of packets.
  pub fn end_group(&self, group: &str) {
    self.emit(&Signal::EndGroup(group.to_string()));
  }

  /// Performs the operation a signal stands for.
  pub fn transmit(&self, signal: Signal) {
    match signal {
      Signal::Connect => self.connect(),
      Signal::Disconnect => self.disconnect(),
      Signal::Shutdown => self.shutdown(),
      Signal::Data(_) | Signal::BeginGroup(_) | Signal::EndGroup(_) => self.emit(&signal),
      Signal::Attach | Signal::Detach => self.emit(&signal),
    }
  }

  /// Announces that a port released this socket.
  pub(crate) fn notify_detach(&self) {
    self.emit(&Signal::Detach);
  }

  /// Tears the socket down: closes it, notifies listeners one last time, then
  /// forgets its endpoints and every listener.
  pub fn shutdown(&self) {
    trace!(socket = %self.id(), "shutdown");
    self.inner.connected.set(false);
    self.emit(&Signal::Shutdown);
    self.set_from(None);
    self.set_to(None);
    self.inner.events.remove_all_listeners();
  }

  /// Registers a listener for `kind`.
  pub fn on(&self, kind: SignalKind, listener: impl Fn(&Signal, &Socket) + 'static) -> ListenerId {
    self.inner.events.on(kind, Rc::new(listener))
  }

  /// Registers a listener for the next `kind` signal only.
  pub fn once(
    &self,
    kind: SignalKind,
    listener: impl Fn(&Signal, &Socket) + 'static,
  ) -> ListenerId {
    self.inner.events.once(kind, Rc::new(listener))
  }

  /// Removes a listener.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    self.inner.events.remove_listener(id)
  }

  /// Number of listeners for `kind`.
  pub fn listener_count(&self, kind: SignalKind) -> usize {
    self.inner.events.listener_count(kind)
  }

  /// Whether both handles point at the same socket.
  pub fn ptr_eq(&self, other: &Socket) -> bool {
    Rc::ptr_eq(&self.inner, &other.inner)
  }

  fn emit(&self, signal: &Signal) {
    self
      .inner
      .events
      .emit_with(signal.kind(), |listener| listener(signal, self));
  }
}

impl PartialEq for Socket {
  fn eq(&self, other: &Self) -> bool {
    self.ptr_eq(other)
  }
}

impl fmt::Debug for Socket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Socket")
      .field("id", &self.id())
      .field("connected", &self.is_connected())
      .finish()
  }
}
