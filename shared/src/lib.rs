//! Shared types for the front-of-house sync core
//!
//! Common types used by the relay server and the POS client: domain
//! models, sync event definitions, and the wire framing used between
//! clients and the relay.

pub mod event;
pub mod frame;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Sync event re-exports (for convenient access)
pub use event::{EventKind, MenuChange, SyncEvent};
pub use models::{MenuItem, Order, OrderItem, OrderStatus, Role, Table, TableStatus, User};
