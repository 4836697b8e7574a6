//! # Ports
//!
//! Ports are the named, typed endpoints of a component. A port holds its
//! attributes and the socket(s) attached to it, and re-emits every signal that
//! arrives through those sockets to the component's listeners.
//!
//! Two flavours exist:
//!
//! - [`SinglePort`]: at most one socket. Attaching a second socket without
//!   detaching the first is a definition error.
//! - [`ArrayPort`]: an addressable port holding any number of sockets, each
//!   addressed by the index it was attached at. Listeners receive the socket
//!   index instead of the socket itself.
//!
//! [`Port`] wraps both so registries and components handle them uniformly.
//!
//! ## Deferred Sends
//!
//! Sending on a port whose socket is not connected yet never drops the packet.
//! The port registers a one-shot `connect` listener that performs the send and
//! then connects the socket. Group delimiters follow the same protocol.
//!
//! ## Datatypes
//!
//! Port datatypes are checked once, when the network wires an edge, using
//! [`is_compatible`].

use crate::error::{FlowError, FlowResult};
use crate::event::{EventEmitter, ListenerId};
use crate::socket::{Endpoint, Packet, Signal, SignalKind, Socket};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Every datatype a port may declare.
pub const DATATYPES: [&str; 12] = [
  "all", "bang", "string", "bool", "boolean", "number", "int", "integer", "object", "array",
  "date", "function",
];

/// Whether `datatype` is one of [`DATATYPES`].
pub fn is_valid_datatype(datatype: &str) -> bool {
  DATATYPES.contains(&datatype)
}

/// Whether packets of `from_type` may flow into a port of `to_type`.
///
/// Identical types are compatible, `all` and `bang` accept anything, and
/// integers widen into `number`. Every other pair is incompatible.
pub fn is_compatible(from_type: &str, to_type: &str) -> bool {
  from_type == to_type
    || matches!(to_type, "all" | "bang")
    || (matches!(from_type, "int" | "integer") && to_type == "number")
}

/// Static attributes of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortAttributes {
  /// One of [`DATATYPES`]; validated when the port is wired.
  pub datatype: String,
  /// Whether the component needs this port connected.
  pub required: bool,
  /// Whether the port caches the last packet.
  pub cached: bool,
  /// Whether the port accepts multiple indexed sockets.
  pub addressable: bool,
}

impl Default for PortAttributes {
  fn default() -> Self {
    Self {
      datatype: "all".to_string(),
      required: false,
      cached: false,
      addressable: false,
    }
  }
}

impl PortAttributes {
  /// Default attributes with the given datatype.
  pub fn typed(datatype: impl Into<String>) -> Self {
    Self::default().with_datatype(datatype)
  }

  /// Replaces the datatype.
  pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
    self.datatype = datatype.into();
    self
  }

  /// Sets the `addressable` flag.
  pub fn addressable(mut self, addressable: bool) -> Self {
    self.addressable = addressable;
    self
  }

  /// Sets the `required` flag.
  pub fn required(mut self, required: bool) -> Self {
    self.required = required;
    self
  }

  /// Sets the `cached` flag.
  pub fn cached(mut self, cached: bool) -> Self {
    self.cached = cached;
    self
  }
}

/// Where a port-level signal came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
  /// The socket attached to a single port.
  Socket(Socket),
  /// The index of the socket on an array port.
  Index(usize),
  /// The port itself (shutdown notifications), by name.
  Port(String),
}

impl Origin {
  /// Socket index for array port signals.
  pub fn index(&self) -> Option<usize> {
    match self {
      Origin::Index(index) => Some(*index),
      _ => None,
    }
  }

  /// Originating socket for single port signals.
  pub fn socket(&self) -> Option<&Socket> {
    match self {
      Origin::Socket(socket) => Some(socket),
      _ => None,
    }
  }
}

/// Callback type for port listeners.
pub type PortListener = dyn Fn(&Signal, &Origin);

/// Signals a port relays from its sockets.
const RELAYED: [SignalKind; 5] = [
  SignalKind::Connect,
  SignalKind::BeginGroup,
  SignalKind::Data,
  SignalKind::EndGroup,
  SignalKind::Disconnect,
];

/// State shared by both port flavours.
struct PortCore {
  name: String,
  attributes: PortAttributes,
  events: EventEmitter<SignalKind, PortListener>,
}

impl PortCore {
  fn new(name: String, attributes: PortAttributes) -> Self {
    Self {
      name,
      attributes,
      events: EventEmitter::new(),
    }
  }

  fn emit(&self, signal: &Signal, origin: &Origin) {
    self
      .events
      .emit_with(signal.kind(), |listener| listener(signal, origin));
  }

  fn shut_down(&self) {
    self.emit(&Signal::Shutdown, &Origin::Port(self.name.clone()));
    self.events.remove_all_listeners();
  }
}

/// A socket held by a port, with the relay listeners the port put on it.
struct Attachment {
  socket: Socket,
  listeners: Vec<ListenerId>,
}

impl Attachment {
  fn release(&self) {
    for id in &self.listeners {
      self.socket.remove_listener(*id);
    }
  }
}

/// Performs `signal` on `socket`, connecting it first when needed.
fn deliver(socket: &Socket, signal: Signal) {
  if socket.is_connected() {
    socket.transmit(signal);
    return;
  }

  socket.once(SignalKind::Connect, move |_, socket| {
    socket.transmit(signal.clone())
  });
  socket.connect();
}

struct SinglePortInner {
  core: PortCore,
  attachment: RefCell<Option<Attachment>>,
  from: RefCell<Option<Endpoint>>,
}

/// A port holding at most one socket.
#[derive(Clone)]
pub struct SinglePort {
  inner: Rc<SinglePortInner>,
}

impl SinglePort {
  /// Creates an unattached port.
  pub fn new(name: impl Into<String>, attributes: PortAttributes) -> Self {
    Self {
      inner: Rc::new(SinglePortInner {
        core: PortCore::new(name.into(), attributes),
        attachment: RefCell::new(None),
        from: RefCell::new(None),
      }),
    }
  }

  /// The port name.
  pub fn name(&self) -> &str {
    &self.inner.core.name
  }

  /// The port attributes.
  pub fn attributes(&self) -> &PortAttributes {
    &self.inner.core.attributes
  }

  /// The attached socket, if any.
  pub fn socket(&self) -> Option<Socket> {
    self
      .inner
      .attachment
      .borrow()
      .as_ref()
      .map(|attachment| attachment.socket.clone())
  }

  /// Upstream endpoint of the attached socket.
  pub fn from(&self) -> Option<Endpoint> {
    self.inner.from.borrow().clone()
  }

  /// Attaches a socket. Fails if one is already attached.
  pub fn attach(&self, socket: &Socket) -> FlowResult<()> {
    if let Some(current) = self.inner.attachment.borrow().as_ref() {
      return Err(FlowError::definition(format!(
        "{} socket already attached {}",
        self.name(),
        current.socket.id()
      )));
    }

    let weak = Rc::downgrade(&self.inner);
    let listeners = RELAYED
      .iter()
      .map(|kind| {
        let weak: Weak<SinglePortInner> = weak.clone();
        socket.on(*kind, move |signal, socket| {
          if let Some(port) = weak.upgrade() {
            port.core.emit(signal, &Origin::Socket(socket.clone()));
          }
        })
      })
      .collect();

    *self.inner.from.borrow_mut() = socket.from();
    *self.inner.attachment.borrow_mut() = Some(Attachment {
      socket: socket.clone(),
      listeners,
    });
    self
      .inner
      .core
      .emit(&Signal::Attach, &Origin::Socket(socket.clone()));
    Ok(())
  }

  /// Releases `socket` if it is the attached one.
  pub fn detach(&self, socket: &Socket) {
    let attachment = {
      let mut slot = self.inner.attachment.borrow_mut();
      let attached = slot
        .as_ref()
        .is_some_and(|attachment| attachment.socket.ptr_eq(socket));
      if attached { slot.take() } else { None }
    };
    let Some(attachment) = attachment else {
      return;
    };

    attachment.release();
    *self.inner.from.borrow_mut() = None;
    self
      .inner
      .core
      .emit(&Signal::Detach, &Origin::Socket(socket.clone()));
    socket.notify_detach();
  }

  fn require_socket(&self) -> FlowResult<Socket> {
    self
      .socket()
      .ok_or_else(|| FlowError::flow(format!("port {} is not attached", self.name())))
  }

  /// Sends a packet, connecting the socket first if necessary.
  pub fn send(&self, data: Packet) -> FlowResult<()> {
    deliver(&self.require_socket()?, Signal::Data(data));
    Ok(())
  }

  /// Opens a group, connecting the socket first if necessary.
  pub fn begin_group(&self, group: &str) -> FlowResult<()> {
    deliver(&self.require_socket()?, Signal::BeginGroup(group.to_string()));
    Ok(())
  }

  /// Closes a group, connecting the socket first if necessary.
  pub fn end_group(&self, group: &str) -> FlowResult<()> {
    deliver(&self.require_socket()?, Signal::EndGroup(group.to_string()));
    Ok(())
  }

  /// Connects the attached socket.
  pub fn connect(&self) -> FlowResult<()> {
    self.require_socket()?.connect();
    Ok(())
  }

  /// Disconnects the attached socket, if any.
  pub fn disconnect(&self) {
    if let Some(socket) = self.socket() {
      socket.disconnect();
    }
  }

  /// Whether a socket is attached and connected.
  pub fn is_connected(&self) -> bool {
    self.socket().is_some_and(|socket| socket.is_connected())
  }

  /// Whether a socket is attached.
  pub fn is_attached(&self) -> bool {
    self.inner.attachment.borrow().is_some()
  }

  /// Registers a listener for `kind`.
  pub fn on(&self, kind: SignalKind, listener: impl Fn(&Signal, &Origin) + 'static) -> ListenerId {
    self.inner.core.events.on(kind, Rc::new(listener))
  }

  /// Removes a listener.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    self.inner.core.events.remove_listener(id)
  }

  /// Shuts the attached socket down and releases it.
  pub fn shutdown(&self) {
    let attachment = self.inner.attachment.borrow_mut().take();
    if let Some(attachment) = attachment {
      attachment.socket.shutdown();
    }
    *self.inner.from.borrow_mut() = None;
    self.inner.core.shut_down();
  }
}

struct ArrayPortInner {
  core: PortCore,
  slots: RefCell<Vec<Option<Attachment>>>,
}

/// An addressable port holding any number of indexed sockets.
///
/// Indices are handed out in attach order and stay stable: detaching a socket
/// vacates its slot without shifting the others, and vacated slots are not
/// reused.
#[derive(Clone)]
pub struct ArrayPort {
  inner: Rc<ArrayPortInner>,
}

impl ArrayPort {
  /// Creates a port without sockets.
  pub fn new(name: impl Into<String>, attributes: PortAttributes) -> Self {
    Self {
      inner: Rc::new(ArrayPortInner {
        core: PortCore::new(name.into(), attributes),
        slots: RefCell::new(Vec::new()),
      }),
    }
  }

  /// The port name.
  pub fn name(&self) -> &str {
    &self.inner.core.name
  }

  /// The port attributes.
  pub fn attributes(&self) -> &PortAttributes {
    &self.inner.core.attributes
  }

  /// The socket attached at `index`.
  pub fn socket(&self, index: usize) -> Option<Socket> {
    self
      .inner
      .slots
      .borrow()
      .get(index)
      .and_then(|slot| slot.as_ref())
      .map(|attachment| attachment.socket.clone())
  }

  /// Appends a socket and returns its index.
  pub fn attach(&self, socket: &Socket) -> usize {
    let index = self.inner.slots.borrow().len();
    let weak = Rc::downgrade(&self.inner);
    let listeners = RELAYED
      .iter()
      .map(|kind| {
        let weak: Weak<ArrayPortInner> = weak.clone();
        socket.on(*kind, move |signal, _| {
          if let Some(port) = weak.upgrade() {
            port.core.emit(signal, &Origin::Index(index));
          }
        })
      })
      .collect();

    self.inner.slots.borrow_mut().push(Some(Attachment {
      socket: socket.clone(),
      listeners,
    }));
    self.inner.core.emit(&Signal::Attach, &Origin::Index(index));
    index
  }

  /// Releases `socket`, vacating its slot.
  pub fn detach(&self, socket: &Socket) {
    let released = {
      let mut slots = self.inner.slots.borrow_mut();
      let position = slots.iter().position(|slot| {
        slot
          .as_ref()
          .is_some_and(|attachment| attachment.socket.ptr_eq(socket))
      });
      position.and_then(|index| slots[index].take().map(|attachment| (index, attachment)))
    };
    let Some((index, attachment)) = released else {
      return;
    };

    attachment.release();
    self.inner.core.emit(&Signal::Detach, &Origin::Index(index));
    socket.notify_detach();
  }

  fn require_socket(&self, index: usize) -> FlowResult<Socket> {
    self
      .socket(index)
      .ok_or_else(|| FlowError::flow(format!("No socket {index} connected on port {}", self.name())))
  }

  /// Sends a packet through the socket at `index`.
  pub fn send(&self, index: usize, data: Packet) -> FlowResult<()> {
    deliver(&self.require_socket(index)?, Signal::Data(data));
    Ok(())
  }

  /// Opens a group on the socket at `index`.
  pub fn begin_group(&self, index: usize, group: &str) -> FlowResult<()> {
    deliver(
      &self.require_socket(index)?,
      Signal::BeginGroup(group.to_string()),
    );
    Ok(())
  }

  /// Closes a group on the socket at `index`.
  pub fn end_group(&self, index: usize, group: &str) -> FlowResult<()> {
    deliver(
      &self.require_socket(index)?,
      Signal::EndGroup(group.to_string()),
    );
    Ok(())
  }

  /// Connects the socket at `index`.
  pub fn connect(&self, index: usize) -> FlowResult<()> {
    self.require_socket(index)?.connect();
    Ok(())
  }

  /// Disconnects the socket at `index`, if any.
  pub fn disconnect(&self, index: usize) {
    if let Some(socket) = self.socket(index) {
      socket.disconnect();
    }
  }

  /// Whether the socket at `index` exists and is connected.
  pub fn is_connected(&self, index: usize) -> bool {
    self
      .socket(index)
      .is_some_and(|socket| socket.is_connected())
  }

  /// Whether a socket is attached at `index`.
  pub fn is_attached(&self, index: usize) -> bool {
    self.socket(index).is_some()
  }

  /// Indices of all attached sockets.
  pub fn list_attached(&self) -> Vec<usize> {
    self
      .inner
      .slots
      .borrow()
      .iter()
      .enumerate()
      .filter_map(|(index, slot)| slot.as_ref().map(|_| index))
      .collect()
  }

  /// Registers a listener for `kind`.
  pub fn on(&self, kind: SignalKind, listener: impl Fn(&Signal, &Origin) + 'static) -> ListenerId {
    self.inner.core.events.on(kind, Rc::new(listener))
  }

  /// Removes a listener.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    self.inner.core.events.remove_listener(id)
  }

  /// Shuts every attached socket down and releases them.
  pub fn shutdown(&self) {
    let slots = std::mem::take(&mut *self.inner.slots.borrow_mut());
    for attachment in slots.into_iter().flatten() {
      attachment.socket.shutdown();
    }
    self.inner.core.shut_down();
  }
}

/// A component port of either flavour.
///
/// Methods without an index address socket 0 on array ports. Indexed methods
/// on a single port only accept index 0.
#[derive(Clone)]
pub enum Port {
  /// Holds at most one socket.
  Single(SinglePort),
  /// Holds indexed sockets.
  Array(ArrayPort),
}

impl Port {
  /// Creates an [`ArrayPort`] when `attributes.addressable` is set, a
  /// [`SinglePort`] otherwise.
  pub fn new(name: impl Into<String>, attributes: PortAttributes) -> Self {
    if attributes.addressable {
      Port::Array(ArrayPort::new(name, attributes))
    } else {
      Port::Single(SinglePort::new(name, attributes))
    }
  }

  /// The port name.
  pub fn name(&self) -> &str {
    match self {
      Port::Single(port) => port.name(),
      Port::Array(port) => port.name(),
    }
  }

  /// The port attributes.
  pub fn attributes(&self) -> &PortAttributes {
    match self {
      Port::Single(port) => port.attributes(),
      Port::Array(port) => port.attributes(),
    }
  }

  /// The declared datatype.
  pub fn datatype(&self) -> &str {
    &self.attributes().datatype
  }

  /// Whether this is an array port.
  pub fn is_addressable(&self) -> bool {
    matches!(self, Port::Array(_))
  }

  /// The single port, if this is one.
  pub fn as_single(&self) -> Option<&SinglePort> {
    match self {
      Port::Single(port) => Some(port),
      Port::Array(_) => None,
    }
  }

  /// The array port, if this is one.
  pub fn as_array(&self) -> Option<&ArrayPort> {
    match self {
      Port::Array(port) => Some(port),
      Port::Single(_) => None,
    }
  }

  fn single_index(&self, index: usize) -> FlowResult<()> {
    if index == 0 {
      Ok(())
    } else {
      Err(FlowError::flow(format!(
        "port {} is not addressable, no socket {index}",
        self.name()
      )))
    }
  }

  /// Attaches a socket and returns the index it was attached at.
  pub fn attach(&self, socket: &Socket) -> FlowResult<usize> {
    match self {
      Port::Single(port) => port.attach(socket).map(|_| 0),
      Port::Array(port) => Ok(port.attach(socket)),
    }
  }

  /// Releases a socket.
  pub fn detach(&self, socket: &Socket) {
    match self {
      Port::Single(port) => port.detach(socket),
      Port::Array(port) => port.detach(socket),
    }
  }

  /// Sends a packet (socket 0 on array ports).
  pub fn send(&self, data: Packet) -> FlowResult<()> {
    self.send_to(0, data)
  }

  /// Sends a packet through the socket at `index`.
  pub fn send_to(&self, index: usize, data: Packet) -> FlowResult<()> {
    match self {
      Port::Single(port) => {
        self.single_index(index)?;
        port.send(data)
      }
      Port::Array(port) => port.send(index, data),
    }
  }

  /// Opens a group (socket 0 on array ports).
  pub fn begin_group(&self, group: &str) -> FlowResult<()> {
    self.begin_group_at(0, group)
  }

  /// Opens a group on the socket at `index`.
  pub fn begin_group_at(&self, index: usize, group: &str) -> FlowResult<()> {
    match self {
      Port::Single(port) => {
        self.single_index(index)?;
        port.begin_group(group)
      }
      Port::Array(port) => port.begin_group(index, group),
    }
  }

  /// Closes a group (socket 0 on array ports).
  pub fn end_group(&self, group: &str) -> FlowResult<()> {
    self.end_group_at(0, group)
  }

  /// Closes a group on the socket at `index`.
  pub fn end_group_at(&self, index: usize, group: &str) -> FlowResult<()> {
    match self {
      Port::Single(port) => {
        self.single_index(index)?;
        port.end_group(group)
      }
      Port::Array(port) => port.end_group(index, group),
    }
  }

  /// Connects the socket (socket 0 on array ports).
  pub fn connect(&self) -> FlowResult<()> {
    self.connect_at(0)
  }

  /// Connects the socket at `index`.
  pub fn connect_at(&self, index: usize) -> FlowResult<()> {
    match self {
      Port::Single(port) => {
        self.single_index(index)?;
        port.connect()
      }
      Port::Array(port) => port.connect(index),
    }
  }

  /// Disconnects the socket (socket 0 on array ports).
  pub fn disconnect(&self) {
    self.disconnect_at(0)
  }

  /// Disconnects the socket at `index`.
  pub fn disconnect_at(&self, index: usize) {
    match self {
      Port::Single(port) if index == 0 => port.disconnect(),
      Port::Single(_) => {}
      Port::Array(port) => port.disconnect(index),
    }
  }

  /// Whether the socket (socket 0 on array ports) is connected.
  pub fn is_connected(&self) -> bool {
    self.is_connected_at(0)
  }

  /// Whether the socket at `index` is connected.
  pub fn is_connected_at(&self, index: usize) -> bool {
    match self {
      Port::Single(port) => index == 0 && port.is_connected(),
      Port::Array(port) => port.is_connected(index),
    }
  }

  /// Whether a socket (socket 0 on array ports) is attached.
  pub fn is_attached(&self) -> bool {
    self.is_attached_at(0)
  }

  /// Whether a socket is attached at `index`.
  pub fn is_attached_at(&self, index: usize) -> bool {
    match self {
      Port::Single(port) => index == 0 && port.is_attached(),
      Port::Array(port) => port.is_attached(index),
    }
  }

  /// Indices of all attached sockets.
  pub fn list_attached(&self) -> Vec<usize> {
    match self {
      Port::Single(port) if port.is_attached() => vec![0],
      Port::Single(_) => Vec::new(),
      Port::Array(port) => port.list_attached(),
    }
  }

  /// Registers a listener for `kind`.
  pub fn on(&self, kind: SignalKind, listener: impl Fn(&Signal, &Origin) + 'static) -> ListenerId {
    match self {
      Port::Single(port) => port.on(kind, listener),
      Port::Array(port) => port.on(kind, listener),
    }
  }

  /// Removes a listener.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    match self {
      Port::Single(port) => port.remove_listener(id),
      Port::Array(port) => port.remove_listener(id),
    }
  }

  /// Called with every data packet.
  pub fn on_data(&self, listener: impl Fn(&Packet, &Origin) + 'static) -> ListenerId {
    self.on(SignalKind::Data, move |signal, origin| {
      if let Signal::Data(data) = signal {
        listener(data, origin);
      }
    })
  }

  /// Called when a group opens.
  pub fn on_begin_group(&self, listener: impl Fn(&str, &Origin) + 'static) -> ListenerId {
    self.on(SignalKind::BeginGroup, move |signal, origin| {
      if let Signal::BeginGroup(group) = signal {
        listener(group, origin);
      }
    })
  }

  /// Called when a group closes.
  pub fn on_end_group(&self, listener: impl Fn(&str, &Origin) + 'static) -> ListenerId {
    self.on(SignalKind::EndGroup, move |signal, origin| {
      if let Signal::EndGroup(group) = signal {
        listener(group, origin);
      }
    })
  }

  /// Called when a connection opens.
  pub fn on_connect(&self, listener: impl Fn(&Origin) + 'static) -> ListenerId {
    self.on(SignalKind::Connect, move |_, origin| listener(origin))
  }

  /// Called when a connection closes.
  pub fn on_disconnect(&self, listener: impl Fn(&Origin) + 'static) -> ListenerId {
    self.on(SignalKind::Disconnect, move |_, origin| listener(origin))
  }

  /// Called when a socket is attached.
  pub fn on_attach(&self, listener: impl Fn(&Origin) + 'static) -> ListenerId {
    self.on(SignalKind::Attach, move |_, origin| listener(origin))
  }

  /// Called when a socket is detached.
  pub fn on_detach(&self, listener: impl Fn(&Origin) + 'static) -> ListenerId {
    self.on(SignalKind::Detach, move |_, origin| listener(origin))
  }

  /// Called once when the port shuts down.
  pub fn on_shutdown(&self, listener: impl Fn(&Origin) + 'static) -> ListenerId {
    self.on(SignalKind::Shutdown, move |_, origin| listener(origin))
  }

  /// Shuts down every attached socket and drops all listeners.
  pub fn shutdown(&self) {
    match self {
      Port::Single(port) => port.shutdown(),
      Port::Array(port) => port.shutdown(),
    }
  }
}

impl std::fmt::Debug for Port {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Port")
      .field("name", &self.name())
      .field("attributes", self.attributes())
      .field("attached", &self.list_attached())
      .finish()
  }
}
