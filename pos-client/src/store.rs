//! Domain store
//!
//! The single authoritative snapshot of orders, tables, menu items and
//! the session user for one terminal. Every public mutator is
//! two-phase: the mutation (and its invariants, notably `Order.total`)
//! commits locally first, then the post-mutation record is handed to
//! the outbound [`EventSink`]. Inbound events take the mirror path
//! through [`AppStore::apply_remote`], which merges without
//! re-broadcasting so an event can never echo forever between peers.
//!
//! Merges are shallow replace-by-identity: the whole record in the
//! payload overwrites the local record with the same id
//! (last-writer-wins, never field-level).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::persist::{SnapshotStore, StoreSnapshot};
use shared::event::{MenuChange, SyncEvent};
use shared::models::{
    MenuItem, MenuItemPatch, NewMenuItem, NewOrder, Order, OrderPatch, OrderStatus, Table,
    TableStatus, User, menu::sample_menu, table::DEFAULT_TABLE_COUNT,
};

/// Outbound half of the sync loop; fire-and-forget by design
pub trait EventSink: Send + Sync {
    fn send(&self, event: &SyncEvent);
}

/// Sink that goes nowhere, for offline stores and tests
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn send(&self, _event: &SyncEvent) {}
}

/// Handle returned by [`AppStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// What a merged remote event means for the user, so the caller can
/// raise the matching notification. Not every merge has an effect.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEffect {
    /// A peer terminal placed an order we had not seen
    NewOrder {
        id: String,
        table_number: u32,
        item_count: usize,
    },
    /// A known order arrived with a different status
    StatusChanged { id: String, status: OrderStatus },
}

#[derive(Debug)]
struct StoreState {
    menu_items: Vec<MenuItem>,
    orders: Vec<Order>,
    tables: Vec<Table>,
    current_user: Option<User>,
}

type Listener = Arc<dyn Fn() + Send + Sync>;

/// The domain store for one terminal
pub struct AppStore {
    state: Mutex<StoreState>,
    sink: Arc<dyn EventSink>,
    snapshots: Option<SnapshotStore>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
}

impl AppStore {
    /// Build a store, rehydrating from the snapshot cache when one
    /// exists; otherwise seed the sample menu and the default floor.
    pub fn new(sink: Arc<dyn EventSink>, snapshots: Option<SnapshotStore>) -> Self {
        let restored = snapshots.as_ref().and_then(SnapshotStore::load);
        let state = match restored {
            Some(snapshot) => {
                tracing::info!(
                    orders = snapshot.orders.len(),
                    tables = snapshot.tables.len(),
                    "Rehydrated store from local snapshot"
                );
                StoreState {
                    menu_items: if snapshot.menu_items.is_empty() {
                        sample_menu()
                    } else {
                        snapshot.menu_items
                    },
                    orders: snapshot.orders,
                    tables: if snapshot.tables.is_empty() {
                        Table::default_floor(DEFAULT_TABLE_COUNT)
                    } else {
                        snapshot.tables
                    },
                    current_user: None,
                }
            }
            None => StoreState {
                menu_items: sample_menu(),
                orders: Vec::new(),
                tables: Table::default_floor(DEFAULT_TABLE_COUNT),
                current_user: None,
            },
        };

        Self {
            state: Mutex::new(state),
            sink,
            snapshots,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }

    // ========== Observers ==========

    /// Register a listener invoked after every committed mutation,
    /// local or merged
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    fn notify_listeners(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Persist while still holding the state lock, so the snapshot
    /// matches exactly what was committed. Best-effort: a write
    /// failure downgrades to a warning.
    fn persist(&self, state: &StoreState) {
        if let Some(snapshots) = &self.snapshots {
            let snapshot = StoreSnapshot {
                menu_items: state.menu_items.clone(),
                orders: state.orders.clone(),
                tables: state.tables.clone(),
            };
            if let Err(e) = snapshots.save(&snapshot) {
                tracing::warn!("Failed to persist snapshot: {}", e);
            }
        }
    }

    // ========== Accessors (cloned snapshots) ==========

    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.state.lock().unwrap().menu_items.clone()
    }

    pub fn menu_item(&self, id: &str) -> Option<MenuItem> {
        self.state
            .lock()
            .unwrap()
            .menu_items
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn order(&self, id: &str) -> Option<Order> {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    pub fn tables(&self) -> Vec<Table> {
        self.state.lock().unwrap().tables.clone()
    }

    pub fn table(&self, id: u32) -> Option<Table> {
        self.state
            .lock()
            .unwrap()
            .tables
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.lock().unwrap().current_user.clone()
    }

    /// Session user is terminal-local: no broadcast, not persisted
    pub fn set_current_user(&self, user: Option<User>) {
        self.state.lock().unwrap().current_user = user;
        self.notify_listeners();
    }

    // ========== Menu mutations ==========

    pub fn add_menu_item(&self, new: NewMenuItem) -> MenuItem {
        let item = new.into_item();
        {
            let mut state = self.state.lock().unwrap();
            state.menu_items.push(item.clone());
            self.persist(&state);
        }
        self.notify_listeners();
        self.sink.send(&SyncEvent::MenuUpdated {
            change: MenuChange::Added,
            menu_item: item.clone(),
        });
        item
    }

    pub fn update_menu_item(&self, id: &str, patch: MenuItemPatch) -> Result<MenuItem, StoreError> {
        let item = {
            let mut state = self.state.lock().unwrap();
            let item = state
                .menu_items
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("menu item {}", id)))?;
            item.apply(patch);
            let item = item.clone();
            self.persist(&state);
            item
        };
        self.notify_listeners();
        self.sink.send(&SyncEvent::MenuUpdated {
            change: MenuChange::Updated,
            menu_item: item.clone(),
        });
        Ok(item)
    }

    /// Remove a menu item. Order items that referenced it keep their
    /// captured name and price untouched.
    pub fn delete_menu_item(&self, id: &str) -> Result<MenuItem, StoreError> {
        let removed = {
            let mut state = self.state.lock().unwrap();
            let index = state
                .menu_items
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("menu item {}", id)))?;
            let removed = state.menu_items.remove(index);
            self.persist(&state);
            removed
        };
        self.notify_listeners();
        self.sink.send(&SyncEvent::MenuUpdated {
            change: MenuChange::Deleted,
            menu_item: removed.clone(),
        });
        Ok(removed)
    }

    // ========== Order mutations ==========

    /// Place a new order: assigns a collision-resistant id and the
    /// creation timestamp, recomputes the total, marks the table
    /// occupied, and broadcasts both records. Returns the committed
    /// order synchronously.
    pub fn place_order(&self, new: NewOrder) -> Order {
        let order = Order {
            id: Uuid::new_v4().to_string(),
            table_number: new.table_number,
            total: Order::compute_total(&new.items),
            items: new.items,
            status: OrderStatus::Pending,
            special_requests: new.special_requests,
            timestamp: Utc::now(),
            is_printed: new.is_printed,
        };

        let table = {
            let mut state = self.state.lock().unwrap();
            state.orders.push(order.clone());
            let table = set_table(
                &mut state.tables,
                new.table_number,
                TableStatus::Occupied,
                Some(order.id.clone()),
            );
            self.persist(&state);
            table
        };

        self.notify_listeners();
        self.sink.send(&SyncEvent::OrderCreated {
            order: order.clone(),
        });
        if let Some(table) = table {
            self.sink.send(&SyncEvent::TableUpdated { table });
        }
        order
    }

    /// Merge item-level edits; the total is recomputed before commit
    pub fn update_order(&self, id: &str, patch: OrderPatch) -> Result<Order, StoreError> {
        let order = {
            let mut state = self.state.lock().unwrap();
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))?;
            if let Some(items) = patch.items {
                order.items = items;
            }
            if let Some(special_requests) = patch.special_requests {
                order.special_requests = Some(special_requests);
            }
            if let Some(is_printed) = patch.is_printed {
                order.is_printed = is_printed;
            }
            order.recompute_total();
            let order = order.clone();
            self.persist(&state);
            order
        };
        self.notify_listeners();
        self.sink.send(&SyncEvent::OrderUpdated {
            order: order.clone(),
        });
        Ok(order)
    }

    /// Advance the order lifecycle. Illegal transitions are rejected
    /// here, not left to the calling view. Reaching `paid` releases
    /// the table in the same mutation.
    pub fn set_order_status(&self, id: &str, next: OrderStatus) -> Result<Order, StoreError> {
        let (order, table) = {
            let mut state = self.state.lock().unwrap();
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))?;

            if !order.status.can_transition_to(next) {
                return Err(StoreError::IllegalTransition {
                    from: order.status,
                    to: next,
                });
            }
            order.status = next;
            let order = order.clone();

            let table = if next.is_settled() {
                set_table(
                    &mut state.tables,
                    order.table_number,
                    TableStatus::Available,
                    None,
                )
            } else {
                None
            };

            self.persist(&state);
            (order, table)
        };

        self.notify_listeners();
        self.sink.send(&SyncEvent::OrderUpdated {
            order: order.clone(),
        });
        if let Some(table) = table {
            self.sink.send(&SyncEvent::TableUpdated { table });
        }
        Ok(order)
    }

    /// Local removal only. Deletion is not broadcast, so peers keep
    /// the order until they restart; settled orders are the normal way
    /// records leave circulation.
    pub fn delete_order(&self, id: &str) -> Result<Order, StoreError> {
        let removed = {
            let mut state = self.state.lock().unwrap();
            let index = state
                .orders
                .iter()
                .position(|o| o.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))?;
            let removed = state.orders.remove(index);
            self.persist(&state);
            removed
        };
        self.notify_listeners();
        Ok(removed)
    }

    // ========== Table mutations ==========

    /// Set a table's status. `order_id` always overwrites
    /// `current_order_id`; passing `None` clears it.
    pub fn update_table_status(
        &self,
        id: u32,
        status: TableStatus,
        order_id: Option<String>,
    ) -> Result<Table, StoreError> {
        let table = {
            let mut state = self.state.lock().unwrap();
            let table = set_table(&mut state.tables, id, status, order_id)
                .ok_or_else(|| StoreError::NotFound(format!("table {}", id)))?;
            self.persist(&state);
            table
        };
        self.notify_listeners();
        self.sink.send(&SyncEvent::TableUpdated {
            table: table.clone(),
        });
        Ok(table)
    }

    // ========== Inbound merge ==========

    /// Merge a remote event into local state without re-broadcasting.
    /// Idempotent: applying the same event twice leaves the state of
    /// the first application. Returns the user-facing effect, if any.
    pub fn apply_remote(&self, event: &SyncEvent) -> Option<RemoteEffect> {
        let (changed, effect) = {
            let mut state = self.state.lock().unwrap();
            let outcome = match event {
                SyncEvent::OrderCreated { order } => merge_order_created(&mut state, order),
                SyncEvent::OrderUpdated { order } => merge_order_updated(&mut state, order),
                SyncEvent::TableUpdated { table } => (merge_table_updated(&mut state, table), None),
                SyncEvent::MenuUpdated { change, menu_item } => {
                    (merge_menu_updated(&mut state, *change, menu_item), None)
                }
            };
            if outcome.0 {
                self.persist(&state);
            }
            outcome
        };

        if changed {
            self.notify_listeners();
        }
        effect
    }
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore").finish_non_exhaustive()
    }
}

/// Overwrite a table's status and current order; returns the updated
/// record, or `None` when the id is not on the floor
fn set_table(
    tables: &mut [Table],
    id: u32,
    status: TableStatus,
    order_id: Option<String>,
) -> Option<Table> {
    let table = tables.iter_mut().find(|t| t.id == id)?;
    table.status = status;
    table.current_order_id = order_id;
    Some(table.clone())
}

fn merge_order_created(state: &mut StoreState, order: &Order) -> (bool, Option<RemoteEffect>) {
    // Duplicate delivery is absorbed here, not treated as an error
    if state.orders.iter().any(|o| o.id == order.id) {
        return (false, None);
    }
    state.orders.push(order.clone());
    set_table(
        &mut state.tables,
        order.table_number,
        TableStatus::Occupied,
        Some(order.id.clone()),
    );
    (
        true,
        Some(RemoteEffect::NewOrder {
            id: order.id.clone(),
            table_number: order.table_number,
            item_count: order.items.len(),
        }),
    )
}

fn merge_order_updated(state: &mut StoreState, order: &Order) -> (bool, Option<RemoteEffect>) {
    let Some(existing) = state.orders.iter_mut().find(|o| o.id == order.id) else {
        // Unknown id: a no-op, not an error
        return (false, None);
    };
    let status_changed = existing.status != order.status;
    *existing = order.clone();
    // Trust but verify: the sender committed this invariant too
    existing.recompute_total();
    let effect = status_changed.then(|| RemoteEffect::StatusChanged {
        id: order.id.clone(),
        status: order.status,
    });
    (true, effect)
}

fn merge_table_updated(state: &mut StoreState, table: &Table) -> bool {
    let Some(existing) = state.tables.iter_mut().find(|t| t.id == table.id) else {
        tracing::debug!(table_id = table.id, "Table update for unknown table ignored");
        return false;
    };
    if existing == table {
        return false;
    }
    *existing = table.clone();
    true
}

fn merge_menu_updated(state: &mut StoreState, change: MenuChange, item: &MenuItem) -> bool {
    match change {
        MenuChange::Added => {
            if state.menu_items.iter().any(|m| m.id == item.id) {
                return false;
            }
            state.menu_items.push(item.clone());
            true
        }
        MenuChange::Updated => {
            let Some(existing) = state.menu_items.iter_mut().find(|m| m.id == item.id) else {
                return false;
            };
            *existing = item.clone();
            true
        }
        MenuChange::Deleted => {
            let before = state.menu_items.len();
            state.menu_items.retain(|m| m.id != item.id);
            state.menu_items.len() != before
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::OrderItem;

    /// Sink that records every broadcast event
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SyncEvent>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<SyncEvent> {
            self.events.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl EventSink for RecordingSink {
        fn send(&self, event: &SyncEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn recording_store() -> (Arc<RecordingSink>, AppStore) {
        let sink = Arc::new(RecordingSink::default());
        let store = AppStore::new(sink.clone(), None);
        (sink, store)
    }

    fn item(price: i64, quantity: u32) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4().to_string(),
            menu_item_id: "1".to_string(),
            quantity,
            price,
            special_requests: None,
        }
    }

    fn new_order(table: u32, items: Vec<OrderItem>) -> NewOrder {
        NewOrder {
            table_number: table,
            items,
            special_requests: None,
            is_printed: false,
        }
    }

    #[test]
    fn test_place_order_totals_and_occupies_table() {
        let (sink, store) = recording_store();
        let order = store.place_order(new_order(3, vec![item(500, 2), item(1000, 1)]));

        assert_eq!(order.total, 2000);
        assert_eq!(order.status, OrderStatus::Pending);

        let table = store.table(3).unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
        assert_eq!(table.current_order_id.as_deref(), Some(order.id.as_str()));

        // Both records were broadcast, order first
        let events = sink.events();
        assert!(matches!(events[0], SyncEvent::OrderCreated { .. }));
        assert!(matches!(events[1], SyncEvent::TableUpdated { .. }));
    }

    #[test]
    fn test_total_invariant_after_item_edits() {
        let (_, store) = recording_store();
        let order = store.place_order(new_order(1, vec![item(500, 2)]));

        let updated = store
            .update_order(
                &order.id,
                OrderPatch {
                    items: Some(vec![item(500, 2), item(250, 4)]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.total, 2000);

        let reread = store.order(&order.id).unwrap();
        assert_eq!(
            reread.total,
            Order::compute_total(&reread.items),
            "total must track item subtotals after every mutation"
        );
    }

    #[test]
    fn test_update_unknown_order_is_not_broadcast() {
        let (sink, store) = recording_store();
        let err = store.update_order("missing", OrderPatch::default());
        assert_eq!(err, Err(StoreError::NotFound("order missing".to_string())));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let (_, store) = recording_store();
        let order = store.place_order(new_order(2, vec![item(100, 1)]));

        for next in [
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Served,
            OrderStatus::Paid,
        ] {
            let updated = store.set_order_status(&order.id, next).unwrap();
            assert_eq!(updated.status, next);
        }
    }

    #[test]
    fn test_illegal_transition_rejected_and_not_broadcast() {
        let (sink, store) = recording_store();
        let order = store.place_order(new_order(2, vec![item(100, 1)]));
        sink.clear();

        let err = store.set_order_status(&order.id, OrderStatus::Paid);
        assert_eq!(
            err,
            Err(StoreError::IllegalTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Paid,
            })
        );
        assert_eq!(store.order(&order.id).unwrap().status, OrderStatus::Pending);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_billing_shortcut_pending_to_ready() {
        let (_, store) = recording_store();
        let order = store.place_order(new_order(2, vec![item(100, 1)]));
        let updated = store
            .set_order_status(&order.id, OrderStatus::Ready)
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Ready);
    }

    #[test]
    fn test_paid_releases_table_in_same_mutation() {
        let (sink, store) = recording_store();
        let order = store.place_order(new_order(5, vec![item(100, 1)]));
        store
            .set_order_status(&order.id, OrderStatus::Ready)
            .unwrap();
        store
            .set_order_status(&order.id, OrderStatus::Served)
            .unwrap();
        sink.clear();

        store.set_order_status(&order.id, OrderStatus::Paid).unwrap();

        let table = store.table(5).unwrap();
        assert_eq!(table.status, TableStatus::Available);
        assert_eq!(table.current_order_id, None);

        // The order update and the table release go out together
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SyncEvent::OrderUpdated { .. }));
        assert!(
            matches!(&events[1], SyncEvent::TableUpdated { table } if table.status == TableStatus::Available)
        );
    }

    #[test]
    fn test_delete_order_is_local_only() {
        let (sink, store) = recording_store();
        let order = store.place_order(new_order(1, vec![item(100, 1)]));
        sink.clear();

        store.delete_order(&order.id).unwrap();
        assert!(store.order(&order.id).is_none());
        assert!(sink.events().is_empty(), "order deletion must not broadcast");
    }

    #[test]
    fn test_menu_delete_keeps_captured_prices() {
        let (_, store) = recording_store();
        let menu_item = store.menu_items().remove(0);
        let captured = OrderItem {
            id: "oi-1".to_string(),
            menu_item_id: menu_item.id.clone(),
            quantity: 1,
            price: menu_item.price,
            special_requests: None,
        };
        let order = store.place_order(new_order(1, vec![captured.clone()]));

        store.delete_menu_item(&menu_item.id).unwrap();

        let reread = store.order(&order.id).unwrap();
        assert_eq!(reread.items[0].price, captured.price);
        assert_eq!(reread.total, captured.price);
    }

    #[test]
    fn test_menu_update_broadcasts_full_record() {
        let (sink, store) = recording_store();
        let id = store.menu_items()[0].id.clone();
        store
            .update_menu_item(
                &id,
                MenuItemPatch {
                    price: Some(8800),
                    ..Default::default()
                },
            )
            .unwrap();

        match &sink.events()[0] {
            SyncEvent::MenuUpdated { change, menu_item } => {
                assert_eq!(*change, MenuChange::Updated);
                assert_eq!(menu_item.price, 8800);
                assert!(!menu_item.name.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_order_created_is_idempotent() {
        let (sink, store) = recording_store();
        let order = Order {
            id: "remote-1".to_string(),
            table_number: 4,
            items: vec![item(700, 2)],
            status: OrderStatus::Pending,
            special_requests: None,
            timestamp: Utc::now(),
            total: 1400,
            is_printed: false,
        };
        let event = SyncEvent::OrderCreated {
            order: order.clone(),
        };

        let first = store.apply_remote(&event);
        assert_eq!(
            first,
            Some(RemoteEffect::NewOrder {
                id: "remote-1".to_string(),
                table_number: 4,
                item_count: 1,
            })
        );
        assert_eq!(store.table(4).unwrap().status, TableStatus::Occupied);

        let second = store.apply_remote(&event);
        assert_eq!(second, None);
        assert_eq!(store.orders().len(), 1);
        assert!(sink.events().is_empty(), "merges must never re-broadcast");
    }

    #[test]
    fn test_remote_update_for_unknown_order_is_noop() {
        let (_, store) = recording_store();
        let order = Order {
            id: "ghost".to_string(),
            table_number: 1,
            items: vec![],
            status: OrderStatus::Ready,
            special_requests: None,
            timestamp: Utc::now(),
            total: 0,
            is_printed: false,
        };
        let effect = store.apply_remote(&SyncEvent::OrderUpdated { order });
        assert_eq!(effect, None);
        assert!(store.orders().is_empty());
    }

    #[test]
    fn test_remote_update_is_whole_record_last_writer_wins() {
        let (_, store) = recording_store();
        let local = store.place_order(new_order(1, vec![item(100, 1)]));

        let mut remote = local.clone();
        remote.status = OrderStatus::Preparing;
        remote.items = vec![item(300, 2)];
        remote.special_requests = Some("no onions".to_string());

        let effect = store.apply_remote(&SyncEvent::OrderUpdated {
            order: remote.clone(),
        });
        assert_eq!(
            effect,
            Some(RemoteEffect::StatusChanged {
                id: local.id.clone(),
                status: OrderStatus::Preparing,
            })
        );

        let merged = store.order(&local.id).unwrap();
        assert_eq!(merged.items.len(), 1);
        assert_eq!(merged.total, 600);
        assert_eq!(merged.special_requests.as_deref(), Some("no onions"));
    }

    #[test]
    fn test_remote_table_update_replaces_by_id() {
        let (_, store) = recording_store();
        let table = Table {
            id: 9,
            status: TableStatus::Reserved,
            capacity: 4,
            current_order_id: None,
        };
        store.apply_remote(&SyncEvent::TableUpdated { table });
        assert_eq!(store.table(9).unwrap().status, TableStatus::Reserved);

        // Unknown table ids are ignored, not inserted
        let stray = Table {
            id: 99,
            status: TableStatus::Occupied,
            capacity: 2,
            current_order_id: None,
        };
        store.apply_remote(&SyncEvent::TableUpdated { table: stray });
        assert!(store.table(99).is_none());
    }

    #[test]
    fn test_remote_menu_changes() {
        let (_, store) = recording_store();
        let new_item = MenuItem {
            id: "m-new".to_string(),
            name: "Focaccia".to_string(),
            description: "House bread".to_string(),
            price: 5200,
            category: "appetizers".to_string(),
            image: None,
        };

        // Added, twice: second application is absorbed
        let added = SyncEvent::MenuUpdated {
            change: MenuChange::Added,
            menu_item: new_item.clone(),
        };
        store.apply_remote(&added);
        store.apply_remote(&added);
        assert_eq!(
            store.menu_items().iter().filter(|m| m.id == "m-new").count(),
            1
        );

        let mut updated = new_item.clone();
        updated.price = 6000;
        store.apply_remote(&SyncEvent::MenuUpdated {
            change: MenuChange::Updated,
            menu_item: updated,
        });
        assert_eq!(store.menu_item("m-new").unwrap().price, 6000);

        store.apply_remote(&SyncEvent::MenuUpdated {
            change: MenuChange::Deleted,
            menu_item: new_item,
        });
        assert!(store.menu_item("m-new").is_none());
    }

    #[test]
    fn test_update_table_status_overwrites_current_order() {
        let (_, store) = recording_store();
        store
            .update_table_status(2, TableStatus::Occupied, Some("o-1".to_string()))
            .unwrap();
        assert_eq!(
            store.table(2).unwrap().current_order_id.as_deref(),
            Some("o-1")
        );

        // Omitting the order id clears it
        store
            .update_table_status(2, TableStatus::Available, None)
            .unwrap();
        assert_eq!(store.table(2).unwrap().current_order_id, None);
    }

    #[test]
    fn test_listeners_fire_after_commit_and_unsubscribe_stops_them() {
        let (_, store) = recording_store();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let id = store.subscribe(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        store.place_order(new_order(1, vec![item(100, 1)]));
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        assert!(store.unsubscribe(id));
        store.place_order(new_order(2, vec![item(100, 1)]));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_session_user_is_local_only() {
        let (sink, store) = recording_store();
        store.set_current_user(Some(User {
            id: "u1".to_string(),
            name: "Dana".to_string(),
            role: shared::models::Role::Cashier,
        }));
        assert_eq!(store.current_user().unwrap().name, "Dana");
        assert!(sink.events().is_empty());
    }
}
