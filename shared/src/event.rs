//! Sync event definitions
//!
//! Every frame exchanged through the relay is one of these events,
//! serialized as a JSON object whose mandatory `type` field carries the
//! event name. There is no acknowledgment, sequence number, or schema
//! version: the relay is a dumb fan-out and ordering only holds within
//! a single connection's lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{MenuItem, Order, Table};

/// Kind of change carried by a `menu_updated` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuChange {
    Added,
    Updated,
    Deleted,
}

/// A typed sync event, as it appears on the wire
///
/// `order_updated` and `table_updated` carry the full post-mutation
/// record: merges are whole-record last-writer-wins, never field-level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    OrderCreated {
        order: Order,
    },
    OrderUpdated {
        order: Order,
    },
    TableUpdated {
        table: Table,
    },
    MenuUpdated {
        change: MenuChange,
        #[serde(rename = "menuItem")]
        menu_item: MenuItem,
    },
}

/// Field-less discriminant, used as the event-bus subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OrderCreated,
    OrderUpdated,
    TableUpdated,
    MenuUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::OrderCreated,
        EventKind::OrderUpdated,
        EventKind::TableUpdated,
        EventKind::MenuUpdated,
    ];
}

impl SyncEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::OrderCreated { .. } => EventKind::OrderCreated,
            SyncEvent::OrderUpdated { .. } => EventKind::OrderUpdated,
            SyncEvent::TableUpdated { .. } => EventKind::TableUpdated,
            SyncEvent::MenuUpdated { .. } => EventKind::MenuUpdated,
        }
    }

    /// Serialize to a wire payload
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse a wire payload
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::OrderCreated => "order_created",
            EventKind::OrderUpdated => "order_updated",
            EventKind::TableUpdated => "table_updated",
            EventKind::MenuUpdated => "menu_updated",
        };
        write!(f, "{}", s)
    }
}
