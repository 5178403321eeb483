//! Order Model and Lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status lifecycle
///
/// Strictly linear: pending → preparing → ready → served → paid.
/// The single allowed shortcut is pending → ready, used by the billing
/// workflow ("send to cashier") to bypass kitchen gating for
/// administrative correction. There is no cancellation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Served,
    Paid,
}

impl OrderStatus {
    /// Whether `self → next` is a legal lifecycle transition
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Preparing, Ready)
                | (Ready, Served)
                | (Served, Paid)
                // Billing shortcut: send a pending order straight to the cashier
                | (Pending, Ready)
        )
    }

    /// Terminal state check: a paid order no longer occupies its table
    pub fn is_settled(self) -> bool {
        matches!(self, OrderStatus::Paid)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Paid => "paid",
        };
        write!(f, "{}", s)
    }
}

/// A single line on an order
///
/// `menu_item_id` is a weak reference used for lookup only; `name` is
/// not stored here because the captured `price` plus the parent order
/// are the billing source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub menu_item_id: String,
    pub quantity: u32,
    /// Unit price in minor units, captured at add-time
    pub price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

impl OrderItem {
    pub fn subtotal(&self) -> i64 {
        self.price * self.quantity as i64
    }
}

/// Order entity
///
/// Invariant: `total` equals the sum of item subtotals after every
/// mutation. Mutators must call [`Order::recompute_total`] before the
/// record is considered committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub table_number: u32,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    /// Creation instant, immutable
    pub timestamp: DateTime<Utc>,
    /// Sum of item subtotals, minor units
    pub total: i64,
    /// Kitchen ticket printed flag
    pub is_printed: bool,
}

impl Order {
    pub fn compute_total(items: &[OrderItem]) -> i64 {
        items.iter().map(OrderItem::subtotal).sum()
    }

    pub fn recompute_total(&mut self) {
        self.total = Self::compute_total(&self.items);
    }
}

/// Create order payload (id, timestamp and total are assigned by the store)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub table_number: u32,
    pub items: Vec<OrderItem>,
    pub special_requests: Option<String>,
    /// Set by callers that print the kitchen ticket up front
    #[serde(default)]
    pub is_printed: bool,
}

/// Partial update payload for item edits while pending
///
/// Status changes go through the store's lifecycle entry point instead,
/// so they can be validated and carry their side effects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub items: Option<Vec<OrderItem>>,
    pub special_requests: Option<String>,
    pub is_printed: Option<bool>,
}
