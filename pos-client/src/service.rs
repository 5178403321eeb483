//! Sync service
//!
//! Composition root for one terminal: builds the event bus, the sync
//! channel, the snapshot cache and the domain store, wires inbound
//! events to the store merge path and the notifier, and owns shutdown.
//! Everything is injected, nothing is global, so tests can run many
//! terminals side by side in one process.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::bus::{EventBus, SubscriptionId};
use crate::channel::{ChannelConfig, SyncChannel};
use crate::notify::{LogNotifier, Notifier, status_message};
use crate::persist::{PersistError, SnapshotStore};
use crate::store::{AppStore, RemoteEffect};
use shared::event::EventKind;
use shared::models::{NewOrder, Order, OrderPatch};

use crate::error::StoreError;

/// Prints kitchen tickets for freshly placed orders
pub trait TicketPrinter: Send + Sync {
    fn print(&self, order: &Order);
}

/// Tracing-backed ticket printer
#[derive(Debug, Default)]
pub struct LogTicketPrinter;

impl TicketPrinter for LogTicketPrinter {
    fn print(&self, order: &Order) {
        tracing::info!(
            target: "kitchen",
            order_id = %order.id,
            table = order.table_number,
            items = order.items.len(),
            "Printing kitchen ticket"
        );
    }
}

#[derive(Debug, Clone)]
pub struct SyncServiceConfig {
    pub channel: ChannelConfig,
    /// Snapshot database path; `None` runs without local persistence
    pub snapshot_path: Option<PathBuf>,
    /// Models the notification permission grant
    pub notifications_enabled: bool,
}

impl Default for SyncServiceConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            snapshot_path: None,
            notifications_enabled: true,
        }
    }
}

/// One terminal's sync stack
pub struct SyncService {
    bus: Arc<EventBus>,
    channel: SyncChannel,
    store: Arc<AppStore>,
    notifier: Arc<dyn Notifier>,
    printer: Arc<dyn TicketPrinter>,
    subscriptions: Mutex<Vec<(EventKind, SubscriptionId)>>,
}

impl SyncService {
    /// Build with the default tracing-backed notifier and printer
    pub fn new(config: SyncServiceConfig) -> Result<Self, PersistError> {
        let notifier = Arc::new(LogNotifier::new(config.notifications_enabled));
        Self::with_parts(config, notifier, Arc::new(LogTicketPrinter))
    }

    /// Build with injected notifier and printer
    pub fn with_parts(
        config: SyncServiceConfig,
        notifier: Arc<dyn Notifier>,
        printer: Arc<dyn TicketPrinter>,
    ) -> Result<Self, PersistError> {
        let bus = Arc::new(EventBus::new());
        let channel = SyncChannel::new(config.channel, bus.clone());
        let snapshots = match &config.snapshot_path {
            Some(path) => Some(SnapshotStore::open(path)?),
            None => None,
        };
        let store = Arc::new(AppStore::new(Arc::new(channel.clone()), snapshots));

        Ok(Self {
            bus,
            channel,
            store,
            notifier,
            printer,
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Wire inbound events into the store and connect to the relay.
    /// Handlers only merge and notify; nothing here re-broadcasts.
    pub async fn start(&self) {
        for kind in EventKind::ALL {
            let store = self.store.clone();
            let notifier = self.notifier.clone();
            let id = self.bus.subscribe(kind, move |event| {
                match store.apply_remote(event) {
                    Some(RemoteEffect::NewOrder {
                        id,
                        table_number,
                        item_count,
                    }) => {
                        notifier.notify(
                            &format!("New Order #{}", id),
                            &format!("Table {} - {} items", table_number, item_count),
                        );
                    }
                    Some(RemoteEffect::StatusChanged { id, status }) => {
                        if let Some(message) = status_message(status) {
                            notifier.notify(&format!("Order #{}", id), message);
                        }
                    }
                    None => {}
                }
            });
            self.subscriptions.lock().unwrap().push((kind, id));
        }
        self.channel.connect().await;
    }

    /// Place an order and print its kitchen ticket. The printed flag is
    /// committed (and synced) as a follow-up update so peers see it.
    pub fn place_order(&self, new: NewOrder) -> Result<Order, StoreError> {
        let order = self.store.place_order(new);
        if order.is_printed {
            return Ok(order);
        }
        self.printer.print(&order);
        self.store.update_order(
            &order.id,
            OrderPatch {
                is_printed: Some(true),
                ..Default::default()
            },
        )
    }

    pub fn store(&self) -> &Arc<AppStore> {
        &self.store
    }

    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// Tear down: detach handlers, then drop the connection. Safe to
    /// call more than once.
    pub fn shutdown(&self) {
        let subscriptions: Vec<_> = self.subscriptions.lock().unwrap().drain(..).collect();
        for (kind, id) in subscriptions {
            self.bus.unsubscribe(kind, id);
        }
        self.channel.disconnect();
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("connected", &self.channel.is_connected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use chrono::Utc;
    use shared::event::SyncEvent;
    use shared::models::{OrderItem, OrderStatus};

    #[derive(Default)]
    struct RecordingPrinter {
        printed: Mutex<Vec<String>>,
    }

    impl TicketPrinter for RecordingPrinter {
        fn print(&self, order: &Order) {
            self.printed.lock().unwrap().push(order.id.clone());
        }
    }

    fn offline_config() -> SyncServiceConfig {
        SyncServiceConfig {
            channel: ChannelConfig {
                // Nothing listens here; connect fails and the service
                // keeps working offline
                addr: "127.0.0.1:1".to_string(),
                ..Default::default()
            },
            snapshot_path: None,
            notifications_enabled: true,
        }
    }

    fn order_item() -> OrderItem {
        OrderItem {
            id: "i1".to_string(),
            menu_item_id: "1".to_string(),
            quantity: 2,
            price: 7800,
            special_requests: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_prints_ticket_once() {
        let printer = Arc::new(RecordingPrinter::default());
        let service = SyncService::with_parts(
            offline_config(),
            Arc::new(RecordingNotifier::new()),
            printer.clone(),
        )
        .unwrap();

        let order = service
            .place_order(NewOrder {
                table_number: 1,
                items: vec![order_item()],
                special_requests: None,
                is_printed: false,
            })
            .unwrap();

        assert!(order.is_printed);
        assert_eq!(*printer.printed.lock().unwrap(), vec![order.id.clone()]);

        // Pre-printed orders are not printed again
        let second = service
            .place_order(NewOrder {
                table_number: 2,
                items: vec![order_item()],
                special_requests: None,
                is_printed: true,
            })
            .unwrap();
        assert_eq!(printer.printed.lock().unwrap().len(), 1);
        assert!(second.is_printed);
    }

    #[tokio::test]
    async fn test_inbound_events_notify_and_merge() {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = SyncService::with_parts(
            offline_config(),
            notifier.clone(),
            Arc::new(LogTicketPrinter),
        )
        .unwrap();
        service.start().await;

        let remote = Order {
            id: "r-1".to_string(),
            table_number: 7,
            items: vec![order_item()],
            status: OrderStatus::Pending,
            special_requests: None,
            timestamp: Utc::now(),
            total: 15600,
            is_printed: true,
        };
        // Simulate frames arriving from the channel's reader
        service.bus.publish(&SyncEvent::OrderCreated {
            order: remote.clone(),
        });

        assert_eq!(service.store().order("r-1").unwrap().total, 15600);
        let entries = notifier.entries();
        assert_eq!(entries[0].0, "New Order #r-1");
        assert_eq!(entries[0].1, "Table 7 - 1 items");

        let mut ready = remote;
        ready.status = OrderStatus::Ready;
        service.bus.publish(&SyncEvent::OrderUpdated { order: ready });

        let entries = notifier.entries();
        assert_eq!(entries[1].0, "Order #r-1");
        assert_eq!(entries[1].1, "Order is ready for pickup");

        service.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_detaches_handlers() {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = SyncService::with_parts(
            offline_config(),
            notifier.clone(),
            Arc::new(LogTicketPrinter),
        )
        .unwrap();
        service.start().await;
        service.shutdown();
        service.shutdown();

        for kind in EventKind::ALL {
            assert_eq!(service.bus.handler_count(kind), 0);
        }

        service.bus.publish(&SyncEvent::OrderCreated {
            order: Order {
                id: "late".to_string(),
                table_number: 1,
                items: vec![],
                status: OrderStatus::Pending,
                special_requests: None,
                timestamp: Utc::now(),
                total: 0,
                is_printed: false,
            },
        });
        assert!(notifier.entries().is_empty());
        assert!(service.store().order("late").is_none());
    }
}
