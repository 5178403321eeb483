//! Data models
//!
//! Shared between the relay clients (waiter, kitchen, cashier, admin
//! terminals). Serialized field names follow the wire protocol
//! (camelCase), so these types double as the payload schema.

pub mod menu;
pub mod order;
pub mod table;
pub mod user;

// Re-exports
pub use menu::*;
pub use order::*;
pub use table::*;
pub use user::*;
