//! # FlowWeave
//!
//! Flow-based programming runtime in pure Rust.
//!
//! An application is a [`Graph`] of named processes whose typed ports are
//! wired by edges, optionally seeded with initial packets. A [`Network`]
//! instantiates the processes through a [`ComponentBuilder`], wires every edge
//! into a [`Socket`] after checking port datatypes, delivers the initial
//! packets and keeps following live graph changes until it is shut down.
//!
//! ## Key Features
//!
//! - **Typed ports**: datatypes are checked once, when an edge is wired
//! - **Single and addressable ports**: one socket, or any number of indexed sockets
//! - **Send before connect**: packets sent on an unconnected port are never dropped
//! - **Live graphs**: graph mutations propagate into a booted network
//! - **FBP, JSON and YAML definitions**: load and dump graphs in all three
//! - **Hooks and tracing**: observe every socket without touching components
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowweave::{ComponentFactory, Network};
//! use serde_json::json;
//!
//! let network = Network::new(ComponentFactory::with_defaults());
//! network
//!   .boot("ReadFile(ReadFile) out -> in Split(SplitStr)\nSplit() out -> in Count(Counter)\nCount() count -> in Display(Output)")?
//!   .run(json!("input.txt"), "ReadFile", "source")?;
//! network.shutdown();
//! # Ok::<(), flowweave::FlowError>(())
//! ```
//!
//! Everything is single-threaded and synchronous: a signal sent through a
//! socket has reached every listener by the time the call returns.

#![warn(missing_docs)]

/// Component builders: type name factories and instance registries.
pub mod builder;
/// The component capability and its port holder.
pub mod component;
/// Reference components.
pub mod components;
/// Error type and result alias.
pub mod error;
/// Ordered observer registry.
pub mod event;
/// FBP DSL parser, dumper and definition file loader.
pub mod fbp;
/// The graph model.
pub mod graph;
/// Socket hooks registered on a network.
pub mod hooks;
/// The network runtime.
pub mod network;
/// Single and addressable ports, datatypes.
pub mod port;
/// Named port collections.
pub mod port_registry;
/// Sockets and the signals they carry.
pub mod socket;
/// Flow tracing decorator.
pub mod trace;

pub use builder::{ComponentBuilder, ComponentFactory, ComponentRegistry};
pub use component::{BaseComponent, Component};
pub use error::{FlowError, FlowResult};
pub use fbp::GraphDefinition;
pub use graph::{Edge, EdgeSource, Graph, GraphEvent, GraphEventKind, Initializer, Node, PortRef};
pub use network::{GraphSource, Network, NetworkState, Process};
pub use port::{ArrayPort, Origin, Port, PortAttributes, SinglePort, is_compatible};
pub use port_registry::PortRegistry;
pub use socket::{Endpoint, Packet, Signal, SignalKind, Socket};
pub use trace::TraceableNetwork;

#[cfg(test)]
mod builder_test;
#[cfg(test)]
mod components_test;
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod event_test;
#[cfg(test)]
mod fbp_test;
#[cfg(test)]
mod hooks_test;
#[cfg(test)]
mod test_support;
