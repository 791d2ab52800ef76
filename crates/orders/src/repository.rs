//! Order persistence: the repository contract and its blob-store backed
//! implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use pizzapos_core::{BlobStore, Entity, OrderId, StorageError, StorageResult};

use crate::Order;

/// Default blob key of the orders document.
pub const ORDERS_KEY: &str = "pizzaShopOrders";

/// Persisted orders document: `{orders, orderCounter}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersDocument {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub order_counter: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    orders: &'a [Order],
    order_counter: u64,
}

/// Order repository abstraction.
///
/// Reads never fail: an unreadable backing store degrades to empty results.
/// Writes return [`StorageError`] and leave the repository unchanged when the
/// backing store rejects them.
pub trait OrderRepository: Send + Sync {
    /// Upsert by id.
    fn save(&self, order: Order) -> StorageResult<Order>;

    /// Returns whether an order with this id existed.
    fn delete(&self, id: OrderId) -> StorageResult<bool>;

    fn find_by_id(&self, id: OrderId) -> Option<Order>;

    /// All orders in insertion order.
    fn find_all(&self) -> Vec<Order>;

    /// Orders not yet both served and paid, in insertion order.
    fn find_ongoing(&self) -> Vec<Order>;

    /// Served and paid orders, most recent first.
    fn find_completed(&self) -> Vec<Order>;

    /// Orders whose `timestamp` lies in `[start_ms, end_ms]`.
    fn find_by_date_range(&self, start_ms: i64, end_ms: i64) -> Vec<Order>;

    fn order_counter(&self) -> u64;

    /// Bump and persist the counter, returning the new value.
    fn increment_order_counter(&self) -> StorageResult<u64>;

    /// Replace the whole order set and counter at once.
    fn import_orders(&self, orders: Vec<Order>, order_counter: u64) -> StorageResult<()>;

    /// Drop every order and reset the counter to 0.
    fn clear_all(&self) -> StorageResult<()>;

    /// Largest id currently stored.
    fn newest_id(&self) -> Option<OrderId> {
        self.find_all().iter().map(Entity::id).max()
    }

    /// Current state as a persistable document.
    fn snapshot(&self) -> OrdersDocument {
        OrdersDocument {
            orders: self.find_all(),
            order_counter: self.order_counter(),
        }
    }
}

impl<R> OrderRepository for Arc<R>
where
    R: OrderRepository + ?Sized,
{
    fn save(&self, order: Order) -> StorageResult<Order> {
        (**self).save(order)
    }

    fn delete(&self, id: OrderId) -> StorageResult<bool> {
        (**self).delete(id)
    }

    fn find_by_id(&self, id: OrderId) -> Option<Order> {
        (**self).find_by_id(id)
    }

    fn find_all(&self) -> Vec<Order> {
        (**self).find_all()
    }

    fn find_ongoing(&self) -> Vec<Order> {
        (**self).find_ongoing()
    }

    fn find_completed(&self) -> Vec<Order> {
        (**self).find_completed()
    }

    fn find_by_date_range(&self, start_ms: i64, end_ms: i64) -> Vec<Order> {
        (**self).find_by_date_range(start_ms, end_ms)
    }

    fn order_counter(&self) -> u64 {
        (**self).order_counter()
    }

    fn increment_order_counter(&self) -> StorageResult<u64> {
        (**self).increment_order_counter()
    }

    fn import_orders(&self, orders: Vec<Order>, order_counter: u64) -> StorageResult<()> {
        (**self).import_orders(orders, order_counter)
    }

    fn clear_all(&self) -> StorageResult<()> {
        (**self).clear_all()
    }

    fn newest_id(&self) -> Option<OrderId> {
        (**self).newest_id()
    }

    fn snapshot(&self) -> OrdersDocument {
        (**self).snapshot()
    }
}

#[derive(Debug, Default)]
struct State {
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
    counter: u64,
    ongoing: Option<Vec<Order>>,
    completed: Option<Vec<Order>>,
}

impl State {
    fn new(orders: Vec<Order>, counter: u64) -> Self {
        let mut state = Self {
            orders,
            counter,
            ..Self::default()
        };
        state.reindex();
        state
    }

    fn reindex(&mut self) {
        self.index = self
            .orders
            .iter()
            .enumerate()
            .map(|(pos, o)| (o.id(), pos))
            .collect();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.ongoing = None;
        self.completed = None;
    }
}

/// Repository persisting the whole order set as one JSON document in a
/// [`BlobStore`].
///
/// - `find_by_id` goes through an id → position index.
/// - Ongoing/completed views are cached until the next write.
/// - A write is encoded and stored first, then committed to memory.
pub struct StoreOrderRepository<S> {
    store: S,
    key: String,
    state: RwLock<State>,
}

impl<S: BlobStore> StoreOrderRepository<S> {
    /// Open the repository under [`ORDERS_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, ORDERS_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let doc = load_document(&store, &key);
        debug!(key = %key, orders = doc.orders.len(), counter = doc.order_counter, "orders loaded");
        Self {
            store,
            key,
            state: RwLock::new(State::new(doc.orders, doc.order_counter)),
        }
    }

    /// Re-read the backing store, discarding in-memory state.
    pub fn reload(&self) {
        let doc = load_document(&self.store, &self.key);
        if let Ok(mut state) = self.state.write() {
            *state = State::new(doc.orders, doc.order_counter);
        }
    }

    fn read(&self) -> Option<RwLockReadGuard<'_, State>> {
        match self.state.read() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(key = %self.key, "order state lock poisoned; returning empty result");
                None
            }
        }
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StorageError::backend("order state lock poisoned"))
    }

    fn persist(&self, orders: &[Order], order_counter: u64) -> StorageResult<()> {
        let encoded = serde_json::to_string(&DocumentRef {
            orders,
            order_counter,
        })
        .map_err(StorageError::from)
        .and_then(|json| self.store.save(&self.key, &json));

        if let Err(err) = &encoded {
            error!(key = %self.key, error = %err, "failed to persist orders");
        }
        encoded
    }

    fn cached_view(
        &self,
        pick: fn(&State) -> &Option<Vec<Order>>,
        fill: fn(&mut State) -> Vec<Order>,
    ) -> Vec<Order> {
        if let Some(state) = self.read() {
            if let Some(view) = pick(&*state) {
                return view.clone();
            }
        }
        match self.state.write() {
            Ok(mut state) => fill(&mut *state),
            Err(_) => Vec::new(),
        }
    }
}

fn load_document<S: BlobStore>(store: &S, key: &str) -> OrdersDocument {
    match store.load(key) {
        Ok(Some(raw)) => match serde_json::from_str::<OrdersDocument>(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(key, error = %err, "stored orders unreadable; starting empty");
                OrdersDocument::default()
            }
        },
        Ok(None) => OrdersDocument::default(),
        Err(err) => {
            warn!(key, error = %err, "failed to read orders; starting empty");
            OrdersDocument::default()
        }
    }
}

fn fill_ongoing(state: &mut State) -> Vec<Order> {
    let view: Vec<Order> = state.orders.iter().filter(|o| o.is_ongoing()).cloned().collect();
    state.ongoing = Some(view.clone());
    view
}

fn fill_completed(state: &mut State) -> Vec<Order> {
    let view: Vec<Order> = state
        .orders
        .iter()
        .rev()
        .filter(|o| o.is_completed())
        .cloned()
        .collect();
    state.completed = Some(view.clone());
    view
}

impl<S: BlobStore> OrderRepository for StoreOrderRepository<S> {
    fn save(&self, order: Order) -> StorageResult<Order> {
        let mut state = self.write()?;
        let mut orders = state.orders.clone();
        let existing = state.index.get(&order.id()).copied();
        match existing {
            Some(pos) => orders[pos] = order.clone(),
            None => orders.push(order.clone()),
        }
        self.persist(&orders, state.counter)?;

        state.orders = orders;
        if existing.is_none() {
            let pos = state.orders.len() - 1;
            state.index.insert(order.id(), pos);
        }
        state.invalidate();
        debug!(order_id = %order.id(), inserted = existing.is_none(), "order saved");
        Ok(order)
    }

    fn delete(&self, id: OrderId) -> StorageResult<bool> {
        let mut state = self.write()?;
        let Some(pos) = state.index.get(&id).copied() else {
            return Ok(false);
        };
        let mut orders = state.orders.clone();
        orders.remove(pos);
        self.persist(&orders, state.counter)?;

        state.orders = orders;
        state.reindex();
        debug!(order_id = %id, "order deleted");
        Ok(true)
    }

    fn find_by_id(&self, id: OrderId) -> Option<Order> {
        let state = self.read()?;
        let pos = *state.index.get(&id)?;
        state.orders.get(pos).cloned()
    }

    fn find_all(&self) -> Vec<Order> {
        self.read().map(|s| s.orders.clone()).unwrap_or_default()
    }

    fn find_ongoing(&self) -> Vec<Order> {
        self.cached_view(|s| &s.ongoing, fill_ongoing)
    }

    fn find_completed(&self) -> Vec<Order> {
        self.cached_view(|s| &s.completed, fill_completed)
    }

    fn find_by_date_range(&self, start_ms: i64, end_ms: i64) -> Vec<Order> {
        self.read()
            .map(|s| {
                s.orders
                    .iter()
                    .filter(|o| (start_ms..=end_ms).contains(&o.timestamp()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn order_counter(&self) -> u64 {
        self.read().map(|s| s.counter).unwrap_or(0)
    }

    fn increment_order_counter(&self) -> StorageResult<u64> {
        let mut state = self.write()?;
        let next = state.counter + 1;
        self.persist(&state.orders, next)?;
        state.counter = next;
        Ok(next)
    }

    fn import_orders(&self, orders: Vec<Order>, order_counter: u64) -> StorageResult<()> {
        let mut state = self.write()?;
        self.persist(&orders, order_counter)?;
        debug!(orders = orders.len(), counter = order_counter, "orders imported");
        *state = State::new(orders, order_counter);
        Ok(())
    }

    fn clear_all(&self) -> StorageResult<()> {
        let mut state = self.write()?;
        self.store.remove(&self.key).inspect_err(|err| {
            error!(key = %self.key, error = %err, "failed to clear orders");
        })?;
        *state = State::default();
        debug!(key = %self.key, "orders cleared");
        Ok(())
    }

    fn newest_id(&self) -> Option<OrderId> {
        self.read()?.index.keys().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewOrder, OrderItem, PaymentType};
    use pizzapos_core::InMemoryBlobStore;

    fn order(id: i64, order_no: u64) -> Order {
        Order::create(
            NewOrder::new(vec![OrderItem::new("Margherita (M)", 150)]),
            OrderId::new(id),
            order_no,
            id,
            "",
        )
        .unwrap()
    }

    fn completed(id: i64, order_no: u64) -> Order {
        let mut o = order(id, order_no);
        o.mark_paid(id + 1, Some(PaymentType::Cash));
        o.mark_served(id + 2);
        o
    }

    fn repo() -> (Arc<InMemoryBlobStore>, StoreOrderRepository<Arc<InMemoryBlobStore>>) {
        let store = Arc::new(InMemoryBlobStore::new());
        let repo = StoreOrderRepository::new(Arc::clone(&store));
        (store, repo)
    }

    #[test]
    fn save_inserts_then_replaces() {
        let (_, repo) = repo();
        repo.save(order(1, 1)).unwrap();
        repo.save(order(2, 2)).unwrap();

        let mut updated = order(1, 1);
        updated.mark_served(50);
        repo.save(updated).unwrap();

        let all = repo.find_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id(), OrderId::new(1));
        assert!(repo.find_by_id(OrderId::new(1)).unwrap().served());
        assert!(repo.find_by_id(OrderId::new(3)).is_none());
    }

    #[test]
    fn delete_reports_existence_and_reindexes() {
        let (_, repo) = repo();
        for i in 1..=3 {
            repo.save(order(i, i as u64)).unwrap();
        }
        assert!(repo.delete(OrderId::new(1)).unwrap());
        assert!(!repo.delete(OrderId::new(1)).unwrap());
        assert_eq!(repo.find_by_id(OrderId::new(3)).unwrap().order_no(), 3);
        assert_eq!(repo.find_all().len(), 2);
    }

    #[test]
    fn completed_view_is_reverse_insertion_and_cache_invalidates() {
        let (_, repo) = repo();
        repo.save(completed(1, 1)).unwrap();
        repo.save(order(2, 2)).unwrap();
        repo.save(completed(3, 3)).unwrap();

        let ids: Vec<i64> = repo.find_completed().iter().map(|o| o.id().value()).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(repo.find_ongoing().len(), 1);

        repo.save(completed(2, 2)).unwrap();
        let ids: Vec<i64> = repo.find_completed().iter().map(|o| o.id().value()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(repo.find_ongoing().is_empty());

        repo.delete(OrderId::new(3)).unwrap();
        assert_eq!(repo.find_completed().len(), 2);
    }

    #[test]
    fn date_range_is_inclusive() {
        let (_, repo) = repo();
        for ts in [100, 200, 300] {
            repo.save(order(ts, 1)).unwrap();
        }
        let hits: Vec<i64> = repo
            .find_by_date_range(100, 200)
            .iter()
            .map(|o| o.timestamp())
            .collect();
        assert_eq!(hits, vec![100, 200]);
    }

    #[test]
    fn state_survives_reopen_with_exact_field_names() {
        let (store, repo) = repo();
        assert_eq!(repo.increment_order_counter().unwrap(), 1);
        repo.save(order(10, 1)).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&store.raw(ORDERS_KEY).unwrap()).unwrap();
        assert_eq!(raw["orderCounter"], 1);
        assert_eq!(raw["orders"][0]["orderNo"], 1);

        let reopened = StoreOrderRepository::new(Arc::clone(&store));
        assert_eq!(reopened.order_counter(), 1);
        assert_eq!(reopened.find_all().len(), 1);
        assert_eq!(reopened.newest_id(), Some(OrderId::new(10)));
    }

    #[test]
    fn corrupt_blob_degrades_to_empty() {
        let store = InMemoryBlobStore::new().with_blob(ORDERS_KEY, "{not json");
        let repo = StoreOrderRepository::new(store);
        assert!(repo.find_all().is_empty());
        assert_eq!(repo.order_counter(), 0);
    }

    #[test]
    fn failed_write_propagates_and_leaves_state() {
        let (store, repo) = repo();
        repo.save(order(1, 1)).unwrap();
        store.fail_writes(true);

        match repo.save(order(2, 2)) {
            Err(StorageError::Backend(_)) => {}
            other => panic!("Expected Backend error, got {other:?}"),
        }
        assert!(repo.increment_order_counter().is_err());
        assert!(repo.delete(OrderId::new(1)).is_err());

        assert_eq!(repo.find_all().len(), 1);
        assert_eq!(repo.order_counter(), 0);
        assert!(repo.find_by_id(OrderId::new(2)).is_none());
    }

    #[test]
    fn import_replaces_everything_and_clear_resets() {
        let (store, repo) = repo();
        repo.save(order(1, 1)).unwrap();
        repo.find_ongoing();

        repo.import_orders(vec![completed(7, 7), order(8, 8)], 8).unwrap();
        assert_eq!(repo.order_counter(), 8);
        assert!(repo.find_by_id(OrderId::new(1)).is_none());
        assert_eq!(repo.find_by_id(OrderId::new(8)).unwrap().order_no(), 8);
        assert_eq!(repo.find_ongoing().len(), 1);
        assert_eq!(repo.find_completed().len(), 1);

        repo.clear_all().unwrap();
        assert!(repo.find_all().is_empty());
        assert_eq!(repo.order_counter(), 0);
        assert!(store.raw(ORDERS_KEY).is_none());
    }
}
