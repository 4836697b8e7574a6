//! Counts the lines of a file with the bundled components.
//!
//! ```text
//! RUST_LOG=flowtrace=debug cargo run --example linecount -- Cargo.toml
//! ```

use flowweave::{ComponentFactory, FlowResult, Network, TraceableNetwork};
use serde_json::json;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> FlowResult<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let input = env::args().nth(1).unwrap_or_else(|| "Cargo.toml".to_string());
  let graph = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/count.fbp");

  let network = TraceableNetwork::new(Network::new(ComponentFactory::with_defaults()))?;
  network.boot(graph)?.run(json!(input), "ReadFile", "source")?;

  if let Some(uptime) = network.uptime() {
    tracing::info!(ms = uptime.num_milliseconds(), "done");
  }
  network.shutdown();
  Ok(())
}
