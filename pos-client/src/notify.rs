//! Notification surface
//!
//! Best-effort, permission-gated user alerts triggered by inbound sync
//! events. Failure to display never affects store correctness, so the
//! trait is infallible by construction.

use std::sync::Mutex;

use shared::models::OrderStatus;

/// A user-visible alert sink
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Tracing-backed notifier
///
/// `granted = false` models a denied notification permission: alerts
/// are silently skipped.
#[derive(Debug)]
pub struct LogNotifier {
    granted: bool,
}

impl LogNotifier {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        if !self.granted {
            return;
        }
        tracing::info!(target: "notification", "{}: {}", title, body);
    }
}

/// Test double that records every alert
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

/// Alert text for a remotely observed status change; `None` for states
/// that do not notify
pub fn status_message(status: OrderStatus) -> Option<&'static str> {
    match status {
        OrderStatus::Preparing => Some("Order is being prepared"),
        OrderStatus::Ready => Some("Order is ready for pickup"),
        OrderStatus::Served => Some("Order has been served"),
        OrderStatus::Paid => Some("Payment completed"),
        OrderStatus::Pending => None,
    }
}
