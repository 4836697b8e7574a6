//! # Network
//!
//! The runtime that turns a [`Graph`] into running processes.
//!
//! ## Lifecycle
//!
//! ```text
//! Unbooted --boot--> Booted --shutdown--> Shutdown
//! ```
//!
//! - **boot** resolves the graph, subscribes to its structural events and
//!   replays it: nodes first, then edges, then initializers.
//! - While booted, every graph mutation is applied to the network through the
//!   subscription. Errors raised while applying a mutation are returned from
//!   the graph call that triggered it.
//! - **shutdown** shuts every component down, which tears down every port and
//!   socket, then forgets processes, connections and the graph. A shut down
//!   network cannot be reused.
//!
//! ## Wiring
//!
//! An edge becomes a [`Socket`] attached to the source out-port and the target
//! in-port. Before attaching, both ports must exist, both datatypes must be
//! valid and the out-port datatype must be compatible with the in-port
//! datatype (see [`is_compatible`]).
//!
//! Initializers get a socket without a source. The socket is attached to the
//! in-port, connected, used to send the packet, disconnected and detached
//! again within the same call.
//!
//! All dispatch is synchronous and single-threaded: no internal table is
//! borrowed while components or sockets run.

use crate::builder::ComponentBuilder;
use crate::component::Component;
use crate::error::{FlowError, FlowResult};
use crate::event::ListenerId;
use crate::graph::{Edge, EdgeSource, Graph, GraphEvent, GraphEventKind, Node};
use crate::hooks::Hooks;
use crate::port::{DATATYPES, Port, is_compatible, is_valid_datatype};
use crate::socket::{Endpoint, Packet, Signal, Socket};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Lifecycle state of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
  /// Created, no graph booted yet.
  Unbooted,
  /// A graph is booted and live.
  Booted,
  /// Torn down; terminal.
  Shutdown,
}

/// A running component instance.
#[derive(Clone)]
pub struct Process {
  /// Process id, the graph node id.
  pub id: String,
  /// The component.
  pub component: Rc<dyn Component>,
}

impl fmt::Debug for Process {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Process")
      .field("id", &self.id)
      .field("component", &self.component.description())
      .finish()
  }
}

/// What [`Network::boot`] loads.
#[derive(Debug, Clone)]
pub enum GraphSource {
  /// An existing graph.
  Graph(Graph),
  /// A definition file, format picked by extension.
  File(PathBuf),
  /// Inline FBP DSL text.
  Inline(String),
}

impl GraphSource {
  /// Loads the graph.
  pub fn resolve(self) -> FlowResult<Graph> {
    match self {
      GraphSource::Graph(graph) => Ok(graph),
      GraphSource::File(path) => Graph::load_file(path),
      GraphSource::Inline(source) => Graph::load_string(&source),
    }
  }
}

impl From<Graph> for GraphSource {
  fn from(graph: Graph) -> Self {
    GraphSource::Graph(graph)
  }
}

impl From<&Graph> for GraphSource {
  fn from(graph: &Graph) -> Self {
    GraphSource::Graph(graph.clone())
  }
}

impl From<PathBuf> for GraphSource {
  fn from(path: PathBuf) -> Self {
    GraphSource::File(path)
  }
}

impl From<&Path> for GraphSource {
  fn from(path: &Path) -> Self {
    GraphSource::File(path.to_path_buf())
  }
}

/// A string naming an existing file is loaded from disk, anything else is
/// parsed as FBP text.
impl From<&str> for GraphSource {
  fn from(source: &str) -> Self {
    if Path::new(source).is_file() {
      GraphSource::File(PathBuf::from(source))
    } else {
      GraphSource::Inline(source.to_string())
    }
  }
}

impl From<String> for GraphSource {
  fn from(source: String) -> Self {
    GraphSource::from(source.as_str())
  }
}

struct NetworkInner {
  builder: Box<dyn ComponentBuilder>,
  processes: RefCell<IndexMap<String, Process>>,
  connections: RefCell<Vec<Socket>>,
  graph: RefCell<Option<Graph>>,
  graph_listeners: RefCell<Vec<ListenerId>>,
  hooks: RefCell<Hooks>,
  started_at: Cell<Option<DateTime<Utc>>>,
  state: Cell<NetworkState>,
}

impl NetworkInner {
  fn unsubscribe(&self) {
    let listeners = std::mem::take(&mut *self.graph_listeners.borrow_mut());
    if let Some(graph) = self.graph.borrow().as_ref() {
      for id in listeners {
        graph.remove_listener(id);
      }
    }
  }
}

impl Drop for NetworkInner {
  fn drop(&mut self) {
    self.unsubscribe();
  }
}

/// Runtime instance of a graph.
pub struct Network {
  inner: Rc<NetworkInner>,
}

impl Network {
  /// Creates an unbooted network resolving components through `builder`.
  pub fn new(builder: impl ComponentBuilder + 'static) -> Self {
    Self {
      inner: Rc::new(NetworkInner {
        builder: Box::new(builder),
        processes: RefCell::new(IndexMap::new()),
        connections: RefCell::new(Vec::new()),
        graph: RefCell::new(None),
        graph_listeners: RefCell::new(Vec::new()),
        hooks: RefCell::new(Hooks::new()),
        started_at: Cell::new(Some(Utc::now())),
        state: Cell::new(NetworkState::Unbooted),
      }),
    }
  }

  /// Lifecycle state.
  pub fn state(&self) -> NetworkState {
    self.inner.state.get()
  }

  /// When the network was created; cleared by shutdown.
  pub fn started_at(&self) -> Option<DateTime<Utc>> {
    self.inner.started_at.get()
  }

  /// Time elapsed since creation, `None` after shutdown.
  pub fn uptime(&self) -> Option<Duration> {
    self.started_at().map(|started| Utc::now() - started)
  }

  /// The booted graph.
  pub fn graph(&self) -> Option<Graph> {
    self.inner.graph.borrow().clone()
  }

  /// The process with this id.
  pub fn get_node(&self, id: &str) -> Option<Process> {
    self.inner.processes.borrow().get(id).cloned()
  }

  /// All processes in creation order.
  pub fn processes(&self) -> Vec<Process> {
    self.inner.processes.borrow().values().cloned().collect()
  }

  /// All sockets created by this network, initializer sockets included.
  pub fn connections(&self) -> Vec<Socket> {
    self.inner.connections.borrow().clone()
  }

  /// Registers a socket hook. See [`Hooks::add`].
  ///
  /// Hooks apply to sockets created after registration.
  pub fn hook(
    &self,
    event: &str,
    alias: &str,
    callback: impl Fn(&Signal, &Socket) + 'static,
  ) -> FlowResult<&Self> {
    self.inner.hooks.borrow_mut().add(event, alias, callback)?;
    Ok(self)
  }

  /// Registered hook aliases per event name.
  pub fn hooks(&self) -> IndexMap<&'static str, Vec<String>> {
    self.inner.hooks.borrow().aliases()
  }

  fn ensure_live(&self) -> FlowResult<()> {
    match self.state() {
      NetworkState::Shutdown => Err(FlowError::flow("Network has been shut down")),
      _ => Ok(()),
    }
  }

  /// Loads the graph and replays it into processes, sockets and initializer
  /// deliveries, then follows its live changes.
  pub fn boot(&self, source: impl Into<GraphSource>) -> FlowResult<&Self> {
    match self.state() {
      NetworkState::Unbooted => {}
      NetworkState::Booted => return Err(FlowError::flow("Network is already booted")),
      NetworkState::Shutdown => return Err(FlowError::flow("Network has been shut down")),
    }

    let graph = source.into().resolve()?;
    debug!(graph = %graph.name(), "booting network");

    self.subscribe(&graph);
    *self.inner.graph.borrow_mut() = Some(graph.clone());
    self.inner.state.set(NetworkState::Booted);

    for node in graph.nodes() {
      self.add_node(&node)?;
    }
    for edge in graph.edges() {
      self.add_edge(&edge)?;
    }
    for initializer in graph.initializers() {
      self.add_initial(
        initializer.data,
        &initializer.target.node,
        &initializer.target.port,
      )?;
    }

    debug!(
      graph = %graph.name(),
      processes = self.inner.processes.borrow().len(),
      connections = self.inner.connections.borrow().len(),
      "network booted"
    );
    Ok(self)
  }

  fn subscribe(&self, graph: &Graph) {
    let weak = Rc::downgrade(&self.inner);
    let ids = vec![
      graph.on(GraphEventKind::AddNode, relay(&weak, |network, event| match event {
        GraphEvent::AddNode(node) => network.add_node(node),
        _ => Ok(()),
      })),
      graph.on(GraphEventKind::RemoveNode, relay(&weak, |network, event| match event {
        GraphEvent::RemoveNode(node) => network.remove_node(node),
        _ => Ok(()),
      })),
      graph.on(GraphEventKind::AddEdge, relay(&weak, |network, event| match event {
        GraphEvent::AddEdge(edge) => network.add_edge(edge),
        _ => Ok(()),
      })),
      graph.on(GraphEventKind::RemoveEdge, relay(&weak, |network, event| match event {
        GraphEvent::RemoveEdge(edge) => network.remove_edge(edge),
        _ => Ok(()),
      })),
    ];
    self.inner.graph_listeners.borrow_mut().extend(ids);
  }

  /// Instantiates the node's component. Adding a live id again is a no-op
  /// that keeps the existing component and its sockets.
  pub fn add_node(&self, node: &Node) -> FlowResult<()> {
    self.ensure_live()?;
    if self.inner.processes.borrow().contains_key(&node.id) {
      trace!(process = %node.id, "process already exists");
      return Ok(());
    }

    let component = self.inner.builder.build(&node.component)?;
    debug!(process = %node.id, component = %node.component, "process created");
    self.inner.processes.borrow_mut().insert(
      node.id.clone(),
      Process {
        id: node.id.clone(),
        component,
      },
    );
    Ok(())
  }

  /// Wires an edge into a socket. Data-sourced edges are delivered as
  /// initializers.
  pub fn add_edge(&self, edge: &Edge) -> FlowResult<()> {
    self.ensure_live()?;
    let source = match &edge.source {
      EdgeSource::Data(data) => {
        return self.add_initial(data.clone(), &edge.target.node, &edge.target.port);
      }
      EdgeSource::Port(source) => source,
    };

    let from = self.get_node(&source.node).ok_or_else(|| {
      FlowError::definition(format!("No process defined for outbound node {}", source.node))
    })?;
    let to = self.get_node(&edge.target.node).ok_or_else(|| {
      FlowError::definition(format!(
        "No process defined for inbound node {}",
        edge.target.node
      ))
    })?;

    let socket = self.connect_ports(&from, &source.port, &to, &edge.target.port)?;
    self.inner.connections.borrow_mut().push(socket);
    Ok(())
  }

  fn connect_ports(
    &self,
    from: &Process,
    out_port: &str,
    to: &Process,
    in_port: &str,
  ) -> FlowResult<Socket> {
    let outbound = outport(from, out_port)?;
    let inbound = inport(to, in_port)?;

    for (process, port) in [(from, &outbound), (to, &inbound)] {
      if !is_valid_datatype(port.datatype()) {
        return Err(FlowError::definition(format!(
          "Invalid datatype {} on port {} of process {}, valid datatypes are: {}",
          port.datatype(),
          port.name(),
          process.id,
          DATATYPES.join(", ")
        )));
      }
    }

    if !is_compatible(outbound.datatype(), inbound.datatype()) {
      return Err(FlowError::IncompatibleDatatype(format!(
        "Process {}: outport {} ({}) is not compatible with process {}: inport {} ({})",
        from.id,
        out_port,
        outbound.datatype(),
        to.id,
        in_port,
        inbound.datatype()
      )));
    }

    let socket = self.create_socket(
      Some(Endpoint::new(from.id.clone(), out_port)),
      Endpoint::new(to.id.clone(), in_port),
    );
    outbound.attach(&socket)?;
    if let Err(err) = inbound.attach(&socket) {
      outbound.detach(&socket);
      return Err(err);
    }

    debug!(socket = %socket.id(), "ports connected");
    Ok(socket)
  }

  fn create_socket(&self, from: Option<Endpoint>, to: Endpoint) -> Socket {
    let socket = Socket::new(from, Some(to));
    self.inner.hooks.borrow().apply(&socket);
    socket
  }

  /// Delivers `data` once to `node.port` through a short-lived socket.
  pub fn add_initial(&self, data: Packet, node: &str, port: &str) -> FlowResult<()> {
    self.ensure_live()?;
    let process = self.get_node(node).ok_or_else(|| {
      FlowError::definition(format!("No process defined for inbound node {node}"))
    })?;
    let inbound = inport(&process, port)?;

    let socket = self.create_socket(None, Endpoint::new(node, port));
    inbound.attach(&socket)?;
    debug!(socket = %socket.id(), "delivering initializer");

    socket.connect();
    socket.send(data);
    socket.disconnect();
    inbound.detach(&socket);

    self.inner.connections.borrow_mut().push(socket);
    Ok(())
  }

  /// Detaches and forgets every socket wired for `edge`.
  pub fn remove_edge(&self, edge: &Edge) -> FlowResult<()> {
    self.ensure_live()?;
    let from = edge.source_port().map(|source| source.endpoint());
    let to = Some(edge.target.endpoint());

    let removed = self.take_connections(|socket| socket.from() == from && socket.to() == to);
    for socket in &removed {
      debug!(socket = %socket.id(), "edge removed");
      self.detach_socket(socket);
    }
    Ok(())
  }

  /// Detaches every socket touching the node and drops its process.
  pub fn remove_node(&self, node: &Node) -> FlowResult<()> {
    self.ensure_live()?;
    let touches = |endpoint: Option<Endpoint>| endpoint.is_some_and(|e| e.process == node.id);

    let removed = self.take_connections(|socket| touches(socket.from()) || touches(socket.to()));
    for socket in &removed {
      self.detach_socket(socket);
    }

    if self.inner.processes.borrow_mut().shift_remove(&node.id).is_some() {
      debug!(process = %node.id, "process removed");
    }
    Ok(())
  }

  fn take_connections(&self, matches: impl Fn(&Socket) -> bool) -> Vec<Socket> {
    let mut connections = self.inner.connections.borrow_mut();
    let (removed, kept): (Vec<Socket>, Vec<Socket>) =
      connections.drain(..).partition(|socket| matches(socket));
    *connections = kept;
    removed
  }

  fn detach_socket(&self, socket: &Socket) {
    let outbound = socket
      .from()
      .and_then(|from| self.get_node(&from.process).zip(Some(from)))
      .and_then(|(process, from)| outport(&process, &from.port).ok());
    let inbound = socket
      .to()
      .and_then(|to| self.get_node(&to.process).zip(Some(to)))
      .and_then(|(process, to)| inport(&process, &to.port).ok());

    for port in outbound.into_iter().chain(inbound) {
      port.detach(socket);
    }
  }

  /// Sends `data` to `node.port` as a new graph initializer.
  pub fn run(&self, data: Packet, node: &str, port: &str) -> FlowResult<&Self> {
    let graph = self
      .graph()
      .ok_or_else(|| FlowError::flow("Graph is not yet initialized!"))?;
    graph.add_initial(data, node, port)?;
    Ok(self)
  }

  /// Shuts every component down and releases all resources.
  pub fn shutdown(&self) {
    if self.state() == NetworkState::Shutdown {
      return;
    }

    let processes: Vec<Process> = self
      .inner
      .processes
      .borrow()
      .values()
      .cloned()
      .collect();
    for process in &processes {
      trace!(process = %process.id, "shutting down process");
      process.component.shutdown();
    }

    self.inner.connections.borrow_mut().clear();
    self.inner.processes.borrow_mut().clear();
    self.inner.unsubscribe();
    *self.inner.graph.borrow_mut() = None;
    self.inner.started_at.set(None);
    self.inner.state.set(NetworkState::Shutdown);
    debug!(processes = processes.len(), "network shut down");
  }
}

impl fmt::Debug for Network {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Network")
      .field("state", &self.state())
      .field("processes", &self.inner.processes.borrow().len())
      .field("connections", &self.inner.connections.borrow().len())
      .finish()
  }
}

fn outport(process: &Process, name: &str) -> FlowResult<Port> {
  process
    .component
    .out_ports()
    .get(name)
    .cloned()
    .map_err(|_| {
      FlowError::definition(format!(
        "No outport {name} defined for process {}",
        process.id
      ))
    })
}

fn inport(process: &Process, name: &str) -> FlowResult<Port> {
  process
    .component
    .in_ports()
    .get(name)
    .cloned()
    .map_err(|_| {
      FlowError::definition(format!(
        "No inport {name} defined for process {}",
        process.id
      ))
    })
}

/// Wraps a network operation as a graph listener holding the network weakly.
fn relay(
  weak: &Weak<NetworkInner>,
  apply: impl Fn(&Network, &GraphEvent) -> FlowResult<()> + 'static,
) -> impl Fn(&GraphEvent) -> FlowResult<()> + 'static {
  let weak = weak.clone();
  move |event: &GraphEvent| match weak.upgrade() {
    Some(inner) => apply(&Network { inner }, event),
    None => Ok(()),
  }
}
