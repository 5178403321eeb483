//! Relay server
//!
//! A process-external fan-out switch with no business logic: every
//! frame received from one connection is forwarded, unparsed, to every
//! other currently-open connection. No authentication, no persistence,
//! no ordering guarantee beyond arrival order per connection.

pub mod relay;

pub use relay::{Relay, RelayConfig, RelayError};
