//! # Graph
//!
//! The mutable model of a flow: nodes (component instances by type name),
//! edges (port to port connections) and initializers (one-shot packets sent to
//! an in-port).
//!
//! Every mutation is committed first and then announced through a structural
//! event (`add.node`, `remove.node`, `add.edge`, `remove.edge`). A booted
//! [`Network`](crate::network::Network) listens to these events to stay in
//! sync with live changes. Initializers are announced as `add.edge` events
//! whose source is the data itself, see [`EdgeSource::Data`].
//!
//! The graph does not validate edges: only the network knows which components
//! and ports exist.
//!
//! ## Listener Errors
//!
//! Listeners return [`FlowResult`]. The first failing listener stops the
//! dispatch and its error is returned from the mutation call. The mutation
//! itself stays committed.

use crate::error::{FlowError, FlowResult};
use crate::event::{EventEmitter, ListenerId};
use crate::fbp::definition::{
  ConnectionDefinition, GraphDefinition, InitializerDefinition, ProcessDefinition,
};
use crate::fbp::loader::{self, Format};
use crate::fbp::parser;
use crate::socket::{Endpoint, Packet};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// A component instance in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  /// Unique id.
  pub id: String,
  /// Component type name, resolved by a builder.
  pub component: String,
}

/// A port on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
  /// Node id.
  pub node: String,
  /// Port name.
  pub port: String,
}

impl PortRef {
  /// Creates a port reference.
  pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
    Self {
      node: node.into(),
      port: port.into(),
    }
  }

  /// Whether this references `node.port`.
  pub fn is(&self, node: &str, port: &str) -> bool {
    self.node == node && self.port == port
  }

  /// The reference as a socket endpoint.
  pub fn endpoint(&self) -> Endpoint {
    Endpoint::new(self.node.clone(), self.port.clone())
  }
}

impl fmt::Display for PortRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.node, self.port)
  }
}

/// Where an edge takes its packets from.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeSource {
  /// An out-port.
  Port(PortRef),
  /// A literal packet: the edge is an initializer.
  Data(Packet),
}

/// A connection into an in-port.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
  /// Sending side.
  pub source: EdgeSource,
  /// Receiving in-port.
  pub target: PortRef,
}

impl Edge {
  /// A port to port edge.
  pub fn new(source: PortRef, target: PortRef) -> Self {
    Self {
      source: EdgeSource::Port(source),
      target,
    }
  }

  /// The source port, absent for initializer edges.
  pub fn source_port(&self) -> Option<&PortRef> {
    match &self.source {
      EdgeSource::Port(port) => Some(port),
      EdgeSource::Data(_) => None,
    }
  }

  fn touches(&self, node: &str) -> bool {
    self.target.node == node || self.source_port().is_some_and(|source| source.node == node)
  }

  fn touches_port(&self, node: &str, port: &str) -> bool {
    self.target.is(node, port) || self.source_port().is_some_and(|source| source.is(node, port))
  }
}

/// A one-shot packet delivered to an in-port.
#[derive(Debug, Clone, PartialEq)]
pub struct Initializer {
  /// The packet.
  pub data: Packet,
  /// Receiving in-port.
  pub target: PortRef,
}

impl Initializer {
  /// The initializer as a data-sourced edge.
  pub fn to_edge(&self) -> Edge {
    Edge {
      source: EdgeSource::Data(self.data.clone()),
      target: self.target.clone(),
    }
  }
}

/// Names of the structural events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphEventKind {
  /// A node was added (or replaced).
  AddNode,
  /// A node was removed.
  RemoveNode,
  /// An edge or initializer was added.
  AddEdge,
  /// An edge or initializer was removed.
  RemoveEdge,
}

impl GraphEventKind {
  /// Event name, e.g. `"add.node"`.
  pub fn as_str(&self) -> &'static str {
    match self {
      GraphEventKind::AddNode => "add.node",
      GraphEventKind::RemoveNode => "remove.node",
      GraphEventKind::AddEdge => "add.edge",
      GraphEventKind::RemoveEdge => "remove.edge",
    }
  }
}

impl fmt::Display for GraphEventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A structural change, with the affected element.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
  /// See [`GraphEventKind::AddNode`].
  AddNode(Node),
  /// See [`GraphEventKind::RemoveNode`].
  RemoveNode(Node),
  /// See [`GraphEventKind::AddEdge`].
  AddEdge(Edge),
  /// See [`GraphEventKind::RemoveEdge`].
  RemoveEdge(Edge),
}

impl GraphEvent {
  /// The kind this event is dispatched under.
  pub fn kind(&self) -> GraphEventKind {
    match self {
      GraphEvent::AddNode(_) => GraphEventKind::AddNode,
      GraphEvent::RemoveNode(_) => GraphEventKind::RemoveNode,
      GraphEvent::AddEdge(_) => GraphEventKind::AddEdge,
      GraphEvent::RemoveEdge(_) => GraphEventKind::RemoveEdge,
    }
  }
}

/// Callback type for graph listeners.
pub type GraphListener = dyn Fn(&GraphEvent) -> FlowResult<()>;

#[derive(Default)]
struct GraphState {
  nodes: IndexMap<String, Node>,
  edges: Vec<Edge>,
  initializers: Vec<Initializer>,
}

struct GraphInner {
  state: RefCell<GraphState>,
  definition: RefCell<GraphDefinition>,
  events: EventEmitter<GraphEventKind, GraphListener>,
}

/// Shared handle to a graph.
#[derive(Clone)]
pub struct Graph {
  inner: Rc<GraphInner>,
}

impl Graph {
  /// Creates an empty graph.
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_definition(GraphDefinition::named(name))
  }

  fn with_definition(definition: GraphDefinition) -> Self {
    Self {
      inner: Rc::new(GraphInner {
        state: RefCell::new(GraphState::default()),
        definition: RefCell::new(definition),
        events: EventEmitter::new(),
      }),
    }
  }

  /// The graph name.
  pub fn name(&self) -> String {
    self.inner.definition.borrow().properties.name.clone()
  }

  /// Renames the graph.
  pub fn set_name(&self, name: impl Into<String>) {
    self.inner.definition.borrow_mut().properties.name = name.into();
  }

  /// Registers a structural listener.
  pub fn on(
    &self,
    kind: GraphEventKind,
    listener: impl Fn(&GraphEvent) -> FlowResult<()> + 'static,
  ) -> ListenerId {
    self.inner.events.on(kind, Rc::new(listener))
  }

  /// Removes a structural listener.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    self.inner.events.remove_listener(id)
  }

  /// Number of listeners for `kind`.
  pub fn listener_count(&self, kind: GraphEventKind) -> usize {
    self.inner.events.listener_count(kind)
  }

  fn emit(&self, event: GraphEvent) -> FlowResult<()> {
    self
      .inner
      .events
      .try_emit_with(event.kind(), |listener| listener(&event))
  }

  /// Adds a node, replacing any node with the same id.
  pub fn add_node(&self, id: &str, component: &str) -> FlowResult<()> {
    let node = Node {
      id: id.to_string(),
      component: component.to_string(),
    };
    self
      .inner
      .state
      .borrow_mut()
      .nodes
      .insert(node.id.clone(), node.clone());
    self.emit(GraphEvent::AddNode(node))
  }

  /// Removes a node together with every edge and initializer touching it.
  ///
  /// Edges are removed first, then initializers, then the node, each with its
  /// own event. Removing an unknown node is a no-op. When a listener fails the
  /// removal still completes and the first error is returned.
  pub fn remove_node(&self, id: &str) -> FlowResult<()> {
    let (node, edges, initializers) = {
      let mut state = self.inner.state.borrow_mut();
      let Some(node) = state.nodes.get(id).cloned() else {
        return Ok(());
      };
      let (edges, kept): (Vec<Edge>, Vec<Edge>) =
        state.edges.drain(..).partition(|edge| edge.touches(id));
      state.edges = kept;
      let (initializers, kept): (Vec<Initializer>, Vec<Initializer>) = state
        .initializers
        .drain(..)
        .partition(|initializer| initializer.target.node == id);
      state.initializers = kept;
      state.nodes.shift_remove(id);
      (node, edges, initializers)
    };

    let events = edges
      .into_iter()
      .map(GraphEvent::RemoveEdge)
      .chain(
        initializers
          .iter()
          .map(|initializer| GraphEvent::RemoveEdge(initializer.to_edge())),
      )
      .chain(std::iter::once(GraphEvent::RemoveNode(node)));
    self.emit_all(events)
  }

  fn emit_all(&self, events: impl IntoIterator<Item = GraphEvent>) -> FlowResult<()> {
    let mut result = Ok(());
    for event in events {
      let outcome = self.emit(event);
      if result.is_ok() {
        result = outcome;
      }
    }
    result
  }

  /// The node with this id.
  pub fn node(&self, id: &str) -> Option<Node> {
    self.inner.state.borrow().nodes.get(id).cloned()
  }

  /// All nodes in insertion order.
  pub fn nodes(&self) -> Vec<Node> {
    self.inner.state.borrow().nodes.values().cloned().collect()
  }

  /// All port to port edges in insertion order.
  pub fn edges(&self) -> Vec<Edge> {
    self.inner.state.borrow().edges.clone()
  }

  /// All initializers in insertion order.
  pub fn initializers(&self) -> Vec<Initializer> {
    self.inner.state.borrow().initializers.clone()
  }

  /// Connects `out_node.out_port` to `in_node.in_port`.
  pub fn add_edge(
    &self,
    out_node: &str,
    out_port: &str,
    in_node: &str,
    in_port: &str,
  ) -> FlowResult<()> {
    let edge = Edge::new(PortRef::new(out_node, out_port), PortRef::new(in_node, in_port));
    self.inner.state.borrow_mut().edges.push(edge.clone());
    self.emit(GraphEvent::AddEdge(edge))
  }

  /// Removes every edge whose source or target is `node.port` and every
  /// initializer targeting it.
  pub fn remove_edge(&self, node: &str, port: &str) -> FlowResult<()> {
    let (edges, initializers) = {
      let mut state = self.inner.state.borrow_mut();
      let (edges, kept): (Vec<Edge>, Vec<Edge>) = state
        .edges
        .drain(..)
        .partition(|edge| edge.touches_port(node, port));
      state.edges = kept;
      let (initializers, kept): (Vec<Initializer>, Vec<Initializer>) = state
        .initializers
        .drain(..)
        .partition(|initializer| initializer.target.is(node, port));
      state.initializers = kept;
      (edges, initializers)
    };

    let events = edges.into_iter().map(GraphEvent::RemoveEdge).chain(
      initializers
        .iter()
        .map(|initializer| GraphEvent::RemoveEdge(initializer.to_edge())),
    );
    self.emit_all(events)
  }

  /// Queues `data` for `node.port`. Announced as an `add.edge` event with a
  /// data source.
  pub fn add_initial(&self, data: Packet, node: &str, port: &str) -> FlowResult<()> {
    let initializer = Initializer {
      data,
      target: PortRef::new(node, port),
    };
    let edge = initializer.to_edge();
    self.inner.state.borrow_mut().initializers.push(initializer);
    self.emit(GraphEvent::AddEdge(edge))
  }

  /// Snapshot of the graph as a definition.
  ///
  /// Graph properties and per-process metadata come from the definition the
  /// graph was loaded from, if any.
  pub fn to_definition(&self) -> GraphDefinition {
    let source = self.inner.definition.borrow();
    let state = self.inner.state.borrow();

    let processes = state
      .nodes
      .values()
      .map(|node| {
        let metadata = source
          .processes
          .get(&node.id)
          .and_then(|process| process.metadata.clone());
        (
          node.id.clone(),
          ProcessDefinition {
            component: node.component.clone(),
            metadata,
          },
        )
      })
      .collect();

    let connections = state
      .edges
      .iter()
      .filter_map(|edge| {
        edge.source_port().map(|source| ConnectionDefinition {
          src: source.endpoint(),
          tgt: edge.target.endpoint(),
        })
      })
      .collect();

    let initializers = state
      .initializers
      .iter()
      .map(|initializer| InitializerDefinition {
        data: initializer.data.clone(),
        tgt: initializer.target.endpoint(),
      })
      .collect();

    GraphDefinition {
      properties: source.properties.clone(),
      initializers,
      processes,
      connections,
    }
  }

  /// The graph as FBP DSL text.
  pub fn to_fbp(&self) -> FlowResult<String> {
    self.to_definition().to_fbp()
  }

  /// The graph as pretty JSON.
  pub fn to_json(&self) -> FlowResult<String> {
    self.to_definition().to_json()
  }

  /// The graph as YAML.
  pub fn to_yaml(&self) -> FlowResult<String> {
    self.to_definition().to_yaml()
  }

  /// Writes the graph to `path`, in the format named by its extension.
  ///
  /// Accepts the extensions [`load_file`](Self::load_file) reads back: `fbp`,
  /// `json`, `yaml` and `yml`.
  pub fn save(&self, path: impl AsRef<Path>) -> FlowResult<()> {
    let path = path.as_ref();
    let format = Format::of(path).ok_or_else(|| {
      FlowError::Dumper(format!(
        "{} has no supported extension (fbp, json, yaml, yml)",
        path.display()
      ))
    })?;
    let rendered = format.render(&self.to_definition())?;
    fs::write(path, rendered)?;
    Ok(())
  }

  /// Builds a graph from a definition: processes first, then initializers,
  /// then connections.
  pub fn load_definition(definition: GraphDefinition) -> FlowResult<Graph> {
    let graph = Graph::with_definition(definition.clone());
    for (id, process) in &definition.processes {
      graph.add_node(id, &process.component)?;
    }
    for initializer in &definition.initializers {
      graph.add_initial(
        initializer.data.clone(),
        &initializer.tgt.process,
        &initializer.tgt.port,
      )?;
    }
    for connection in &definition.connections {
      graph.add_edge(
        &connection.src.process,
        &connection.src.port,
        &connection.tgt.process,
        &connection.tgt.port,
      )?;
    }
    Ok(graph)
  }

  /// Parses FBP DSL text into a graph.
  pub fn load_string(source: &str) -> FlowResult<Graph> {
    Self::load_definition(parser::parse(source)?)
  }

  /// Loads a definition file (`.fbp`, `.json`, `.yaml`, `.yml`) into a graph.
  pub fn load_file(path: impl AsRef<Path>) -> FlowResult<Graph> {
    Self::load_definition(loader::load_file(path)?)
  }

  /// Whether both handles point at the same graph.
  pub fn ptr_eq(&self, other: &Graph) -> bool {
    Rc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for Graph {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.inner.state.borrow();
    f.debug_struct("Graph")
      .field("name", &self.name())
      .field("nodes", &state.nodes.len())
      .field("edges", &state.edges.len())
      .field("initializers", &state.initializers.len())
      .finish()
  }
}

impl TryFrom<GraphDefinition> for Graph {
  type Error = FlowError;

  fn try_from(definition: GraphDefinition) -> FlowResult<Self> {
    Graph::load_definition(definition)
  }
}
