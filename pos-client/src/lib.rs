//! POS client library
//!
//! The client half of the front-of-house sync core: a reconnecting
//! channel to the relay, a typed event bus, and the domain store that
//! keeps orders, tables and the menu converging across terminals.
//!
//! # Data flow
//!
//! ```text
//! UI action ─▶ AppStore mutation ─▶ EventSink ─▶ SyncChannel ─▶ Relay
//!                                                                │
//! peer UI ◀─ listeners ◀─ AppStore merge ◀─ EventBus ◀─ SyncChannel
//! ```
//!
//! Everything is dependency-injected through [`SyncService`]; there are
//! no process-wide singletons.

pub mod bus;
pub mod channel;
pub mod error;
pub mod notify;
pub mod persist;
pub mod service;
pub mod store;
pub mod transport;

// Re-exports
pub use bus::{EventBus, SubscriptionId};
pub use channel::{ChannelConfig, SyncChannel};
pub use error::{ChannelError, StoreError};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use persist::{PersistError, SnapshotStore, StoreSnapshot};
pub use service::{LogTicketPrinter, SyncService, SyncServiceConfig, TicketPrinter};
pub use store::{AppStore, EventSink, ListenerId, NullSink, RemoteEffect};
