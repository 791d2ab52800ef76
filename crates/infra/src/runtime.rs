//! Composition root: one store, one bus, and the services wired to it.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use pizzapos_analytics::{AchievementTracker, Analytics, StoreProgressRepository};
use pizzapos_core::{BlobStore, Clock, ShopZone, StorageResult, SystemClock};
use pizzapos_events::{EventBus, EventEnvelope, Handler, HandlerId, InMemoryEventBus, handler_fn, topics};
use pizzapos_inventory::{InventoryService, StoreInventoryRepository};
use pizzapos_orders::{OrderRepository, OrderService, StoreOrderRepository};

use crate::config::PosConfig;
use crate::file_store::FileBlobStore;
use crate::transfer::{
    BackupInfo, BackupReceipt, BackupSnapshot, DeviceInfo, ExportEnvelope, TransferError, last_backup_info,
    parse_import, record_backup,
};

pub type SharedStore = Arc<dyn BlobStore>;
pub type SharedBus = Arc<InMemoryEventBus<EventEnvelope>>;
pub type OrderRepo = Arc<StoreOrderRepository<SharedStore>>;
pub type PosOrders = OrderService<OrderRepo, SharedBus>;
pub type PosInventory = InventoryService<StoreInventoryRepository<SharedStore>, SharedBus>;
pub type PosAnalytics = Analytics<OrderRepo, ShopZone>;
pub type PosAchievements = AchievementTracker<StoreProgressRepository<SharedStore>, ShopZone>;

pub struct PosRuntime {
    config: PosConfig,
    store: SharedStore,
    clock: Arc<dyn Clock>,
    bus: SharedBus,
    orders: Arc<PosOrders>,
    inventory: Arc<PosInventory>,
    analytics: PosAnalytics,
    achievements: Arc<PosAchievements>,
    subscriptions: Vec<(&'static str, HandlerId)>,
}

impl PosRuntime {
    /// Open the file-backed store under `config.data_dir` and start the
    /// services on it.
    pub fn open(config: PosConfig) -> anyhow::Result<Self> {
        let store = FileBlobStore::open(&config.data_dir)
            .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
        Self::with_store(config, Arc::new(store), Arc::new(SystemClock))
    }

    /// Start the services on an existing store.
    ///
    /// Dough is deducted as pizzas are ordered, and achievements are
    /// rescored whenever an order completes or orders are imported.
    pub fn with_store(config: PosConfig, store: SharedStore, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let zone = config.zone();
        let bus: SharedBus = Arc::new(InMemoryEventBus::new());

        let order_repo: OrderRepo = Arc::new(StoreOrderRepository::with_key(
            Arc::clone(&store),
            config.orders_key.clone(),
        ));
        let orders = Arc::new(
            OrderService::new(Arc::clone(&order_repo), Arc::clone(&bus))
                .with_clock(Arc::clone(&clock))
                .with_zone(zone),
        );
        let inventory = Arc::new(
            InventoryService::new(
                StoreInventoryRepository::with_key(Arc::clone(&store), config.inventory_key.clone()),
                Arc::clone(&bus),
            )
            .with_clock(Arc::clone(&clock)),
        );
        let analytics = Analytics::new(Arc::clone(&order_repo))
            .with_clock(Arc::clone(&clock))
            .with_timezone(zone);
        let achievements = Arc::new(
            AchievementTracker::new(StoreProgressRepository::with_key(
                Arc::clone(&store),
                config.achievements_key.clone(),
            ))
            .with_clock(Arc::clone(&clock))
            .with_timezone(zone),
        );

        achievements.calculate_progress(&order_repo.find_all());
        achievements
            .save()
            .context("saving initial achievement progress")?;

        let mut subscriptions: Vec<(&'static str, HandlerId)> = [topics::ORDER_CREATED, topics::ORDER_ITEMS_ADDED]
            .into_iter()
            .zip(inventory.attach_order_listener(&bus))
            .collect();
        for topic in [topics::ORDER_COMPLETED, topics::ORDERS_IMPORTED] {
            let handler = rescore_achievements(Arc::clone(&achievements), Arc::clone(&order_repo));
            subscriptions.push((topic, bus.subscribe(topic, handler)));
        }

        info!(
            orders = order_repo.find_all().len(),
            dough = inventory.inventory().dough_count(),
            zone = ?zone,
            "pos runtime started"
        );

        Ok(Self {
            config,
            store,
            clock,
            bus,
            orders,
            inventory,
            analytics,
            achievements,
            subscriptions,
        })
    }

    pub fn config(&self) -> &PosConfig {
        &self.config
    }

    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    pub fn orders(&self) -> &Arc<PosOrders> {
        &self.orders
    }

    pub fn inventory(&self) -> &Arc<PosInventory> {
        &self.inventory
    }

    pub fn analytics(&self) -> &PosAnalytics {
        &self.analytics
    }

    pub fn achievements(&self) -> &Arc<PosAchievements> {
        &self.achievements
    }

    /// Export file for the current orders.
    pub fn export(&self) -> ExportEnvelope {
        ExportEnvelope::new(
            self.orders.repository().snapshot(),
            self.clock.now_utc(),
            self.config.app_version.clone(),
        )
    }

    /// Replace all orders with the contents of an import file.
    pub async fn import(&self, raw: &str) -> anyhow::Result<usize> {
        let document = parse_import(raw)?;
        let count = self.orders.import_orders(document).await?;
        Ok(count)
    }

    pub fn backup_snapshot(&self) -> Result<BackupSnapshot, TransferError> {
        BackupSnapshot::capture(
            self.orders.repository().snapshot(),
            self.clock.now_utc(),
            DeviceInfo::current(),
        )
    }

    /// Remember that the backup collaborator stored `snapshot` under `uid`.
    pub fn record_backup(&self, uid: &str, snapshot: &BackupSnapshot) -> StorageResult<BackupReceipt> {
        record_backup(&*self.store, uid, snapshot.orders.len(), self.clock.now_utc())
    }

    pub fn last_backup_info(&self) -> BackupInfo {
        last_backup_info(&*self.store)
    }
}

impl Drop for PosRuntime {
    /// Handlers hold the services that hold the bus; unsubscribing breaks
    /// the cycle.
    fn drop(&mut self) {
        for (topic, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(topic, id);
        }
    }
}

fn rescore_achievements(tracker: Arc<PosAchievements>, orders: OrderRepo) -> Handler<EventEnvelope> {
    handler_fn(move |_: EventEnvelope| {
        let unlocked = tracker.check_new_unlocks(&orders.find_all())?;
        debug!(unlocked = unlocked.len(), "achievements rescored");
        Ok(())
    })
}
