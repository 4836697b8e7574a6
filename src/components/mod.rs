//! # Bundled Components
//!
//! A handful of reference components, enough to build a line counter:
//!
//! | Component  | In ports                | Out ports          |
//! |------------|-------------------------|--------------------|
//! | `ReadFile` | `source`                | `out`, `error`     |
//! | `SplitStr` | `in`, `delimiter`       | `out`              |
//! | `Counter`  | `in`                    | `count`            |
//! | `Output`   | `in` (addressable)      |                    |
//! | `Queue`    | `in`, `size`            | `messages`, `err`  |
//!
//! All of them are registered by
//! [`ComponentFactory::with_defaults`](crate::builder::ComponentFactory::with_defaults).

pub mod counter;
pub mod output;
pub mod queue;
pub mod read_file;
pub mod split_str;

pub use counter::Counter;
pub use output::Output;
pub use queue::Queue;
pub use read_file::ReadFile;
pub use split_str::SplitStr;

use crate::port::Port;
use crate::socket::Packet;
use tracing::warn;

/// Sends on `port`, logging instead of failing when nothing is attached.
pub(crate) fn send_or_warn(port: &Port, data: Packet) {
  if let Err(error) = port.send(data) {
    warn!(port = port.name(), %error, "dropping packet");
  }
}
