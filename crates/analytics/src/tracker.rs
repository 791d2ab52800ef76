//! Achievement progress: scoring, unlock bookkeeping and persistence.
//!
//! Unlocks are monotonic. Once an achievement is unlocked it stays unlocked
//! with its original `unlockedAt`, even if the orders behind it are deleted.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use pizzapos_core::{BlobStore, Clock, StorageError, StorageResult, SystemClock};
use pizzapos_orders::Order;

use crate::achievements::{ACHIEVEMENTS, Achievement, AchievementCategory, Metrics};

/// Blob-store key of the persisted progress map.
pub const ACHIEVEMENTS_KEY: &str = "pizzaShopAchievements";

/// Stored state of one achievement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<i64>,
    /// Latest metric value (not capped at the target).
    #[serde(default)]
    pub progress: u64,
}

/// Achievement id to progress, persisted as a JSON object.
pub type ProgressMap = BTreeMap<String, AchievementProgress>;

pub trait ProgressRepository: Send + Sync {
    /// Stored progress; unreadable data reads as empty.
    fn load(&self) -> ProgressMap;

    fn save(&self, progress: &ProgressMap) -> StorageResult<()>;
}

impl<P> ProgressRepository for Arc<P>
where
    P: ProgressRepository + ?Sized,
{
    fn load(&self) -> ProgressMap {
        (**self).load()
    }

    fn save(&self, progress: &ProgressMap) -> StorageResult<()> {
        (**self).save(progress)
    }
}

#[derive(Debug)]
pub struct StoreProgressRepository<S> {
    store: S,
    key: String,
}

impl<S: BlobStore> StoreProgressRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, ACHIEVEMENTS_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl<S: BlobStore> ProgressRepository for StoreProgressRepository<S> {
    fn load(&self) -> ProgressMap {
        match self.store.load(&self.key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(key = %self.key, error = %err, "stored achievements unreadable; starting fresh");
                ProgressMap::new()
            }),
            Ok(None) => ProgressMap::new(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read achievements; starting fresh");
                ProgressMap::new()
            }
        }
    }

    fn save(&self, progress: &ProgressMap) -> StorageResult<()> {
        serde_json::to_string(progress)
            .map_err(StorageError::from)
            .and_then(|json| self.store.save(&self.key, &json))
            .inspect_err(|err| error!(key = %self.key, error = %err, "failed to save achievements"))
    }
}

/// An achievement together with its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: &'static Achievement,
    pub unlocked: bool,
    pub unlocked_at: Option<i64>,
    pub current_progress: u64,
}

impl AchievementStatus {
    fn of(achievement: &'static Achievement, progress: Option<&AchievementProgress>) -> Self {
        let progress = progress.copied().unwrap_or_default();
        Self {
            achievement,
            unlocked: progress.unlocked,
            unlocked_at: progress.unlocked_at,
            current_progress: progress.progress,
        }
    }

    /// Progress toward the target, capped at the target.
    pub fn capped_progress(&self) -> u64 {
        self.current_progress.min(self.achievement.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub category: AchievementCategory,
    pub title: &'static str,
    pub achievements: Vec<AchievementStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementSummary {
    pub total: usize,
    pub unlocked: usize,
    /// Whole percent of achievements unlocked.
    pub percentage: i64,
}

pub struct AchievementTracker<P, Tz: TimeZone = Local> {
    repository: P,
    clock: Arc<dyn Clock>,
    tz: Tz,
    progress: RwLock<ProgressMap>,
}

impl<P: ProgressRepository> AchievementTracker<P, Local> {
    /// Loads stored progress from `repository`.
    pub fn new(repository: P) -> Self {
        let progress = repository.load();
        Self {
            repository,
            clock: Arc::new(SystemClock),
            tz: Local,
            progress: RwLock::new(progress),
        }
    }
}

impl<P: ProgressRepository, Tz: TimeZone> AchievementTracker<P, Tz> {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Read order hours in `tz`.
    pub fn with_timezone<T: TimeZone>(self, tz: T) -> AchievementTracker<P, T> {
        AchievementTracker {
            repository: self.repository,
            clock: self.clock,
            tz,
            progress: self.progress,
        }
    }

    /// Rescore every achievement against `orders` without persisting.
    pub fn calculate_progress(&self, orders: &[Order]) -> Vec<AchievementStatus> {
        let next = self.scored(orders);
        if let Ok(mut progress) = self.progress.write() {
            *progress = next;
        }
        self.statuses()
    }

    /// Rescore against `orders` and return the achievements that were locked
    /// before and are unlocked now. Progress is persisted when anything
    /// unlocked; on a failed save nothing changes.
    pub fn check_new_unlocks(&self, orders: &[Order]) -> StorageResult<Vec<AchievementStatus>> {
        let mut progress = self
            .progress
            .write()
            .map_err(|_| StorageError::backend("achievement lock poisoned"))?;
        let next = self.score_into(&progress, orders);

        let unlocked: Vec<AchievementStatus> = ACHIEVEMENTS
            .iter()
            .filter(|a| {
                let was = progress.get(a.id).is_some_and(|p| p.unlocked);
                let now = next.get(a.id).is_some_and(|p| p.unlocked);
                !was && now
            })
            .map(|a| AchievementStatus::of(a, next.get(a.id)))
            .collect();

        if !unlocked.is_empty() {
            self.repository.save(&next)?;
            for status in &unlocked {
                info!(achievement = status.achievement.id, "achievement unlocked");
            }
        }
        *progress = next;
        Ok(unlocked)
    }

    /// Persist the current in-memory progress.
    pub fn save(&self) -> StorageResult<()> {
        let progress = self
            .progress
            .read()
            .map_err(|_| StorageError::backend("achievement lock poisoned"))?;
        self.repository.save(&progress)
    }

    /// Current state of every achievement in catalogue order.
    pub fn statuses(&self) -> Vec<AchievementStatus> {
        let progress = self.progress.read().map(|p| p.clone()).unwrap_or_default();
        ACHIEVEMENTS
            .iter()
            .map(|a| AchievementStatus::of(a, progress.get(a.id)))
            .collect()
    }

    pub fn status(&self, id: &str) -> Option<AchievementStatus> {
        self.statuses().into_iter().find(|s| s.achievement.id == id)
    }

    /// Statuses grouped by category, in category order; empty categories
    /// are left out.
    pub fn by_category(&self) -> Vec<CategoryGroup> {
        let statuses = self.statuses();
        AchievementCategory::ALL
            .iter()
            .map(|&category| CategoryGroup {
                category,
                title: category.title(),
                achievements: statuses
                    .iter()
                    .filter(|s| s.achievement.category == category)
                    .copied()
                    .collect(),
            })
            .filter(|g| !g.achievements.is_empty())
            .collect()
    }

    pub fn summary(&self) -> AchievementSummary {
        let statuses = self.statuses();
        let total = statuses.len();
        let unlocked = statuses.iter().filter(|s| s.unlocked).count();
        AchievementSummary {
            total,
            unlocked,
            percentage: crate::stats::round_ratio(unlocked as i64 * 100, total as i64),
        }
    }

    fn scored(&self, orders: &[Order]) -> ProgressMap {
        let current = self.progress.read().map(|p| p.clone()).unwrap_or_default();
        self.score_into(&current, orders)
    }

    fn score_into(&self, current: &ProgressMap, orders: &[Order]) -> ProgressMap {
        let metrics = Metrics::from_orders(orders, &self.tz);
        let now = self.clock.now_millis();
        let mut next = current.clone();
        for achievement in &ACHIEVEMENTS {
            let value = metrics.value(achievement.metric);
            let entry = next.entry(achievement.id.to_string()).or_default();
            entry.progress = value;
            if value >= achievement.target && !entry.unlocked {
                entry.unlocked = true;
                entry.unlocked_at = Some(now);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pizzapos_core::{InMemoryBlobStore, ManualClock, OrderId};
    use pizzapos_orders::{NewOrder, OrderItem};

    // 2023-11-14 22:13:20 UTC.
    const T0: i64 = 1_700_000_000_000;

    type Tracker = AchievementTracker<StoreProgressRepository<Arc<InMemoryBlobStore>>, FixedOffset>;

    fn tracker(store: &Arc<InMemoryBlobStore>, clock: &Arc<ManualClock>) -> Tracker {
        AchievementTracker::new(StoreProgressRepository::new(Arc::clone(store)))
            .with_clock(clock.clone())
            .with_timezone(FixedOffset::east_opt(0).unwrap())
    }

    fn completed(id: i64, price: i64, served_after: i64) -> Order {
        let mut order = Order::create(
            NewOrder::new(vec![OrderItem::new("Margherita (M)", price)]),
            OrderId::new(id),
            id as u64,
            T0,
            "",
        )
        .unwrap();
        order.mark_paid(T0, None);
        order.mark_served(T0 + served_after);
        order
    }

    #[test]
    fn first_completed_order_unlocks_starters() {
        let store = Arc::new(InMemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(T0 + 1_000));
        let tracker = tracker(&store, &clock);

        let unlocked = tracker.check_new_unlocks(&[completed(1, 150, 60_000)]).unwrap();
        let mut ids: Vec<&str> = unlocked.iter().map(|s| s.achievement.id).collect();
        ids.sort_unstable();
        assert_eq!(
            ids,
            vec!["first_baht", "first_slice", "grand_opening", "night_owl", "speed_demon"]
        );
        assert!(unlocked.iter().all(|s| s.unlocked_at == Some(T0 + 1_000)));

        let stored: ProgressMap = serde_json::from_str(&store.raw(ACHIEVEMENTS_KEY).unwrap()).unwrap();
        assert_eq!(stored.len(), ACHIEVEMENTS.len());
        assert_eq!(stored["first_baht"].progress, 150);
        assert!(!stored["centurion"].unlocked);

        clock.advance(5_000);
        assert!(tracker.check_new_unlocks(&[completed(1, 150, 60_000)]).unwrap().is_empty());
    }

    #[test]
    fn unlocks_survive_losing_the_orders() {
        let store = Arc::new(InMemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let tracker = tracker(&store, &clock);
        tracker.check_new_unlocks(&[completed(1, 150, 1_000)]).unwrap();

        clock.advance(60_000);
        let statuses = tracker.calculate_progress(&[]);
        let first = statuses.iter().find(|s| s.achievement.id == "first_slice").unwrap();
        assert!(first.unlocked);
        assert_eq!(first.unlocked_at, Some(T0));
        assert_eq!(first.current_progress, 0);
    }

    #[test]
    fn progress_is_reloaded_and_corrupt_data_is_ignored() {
        let store = Arc::new(InMemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        tracker(&store, &clock).check_new_unlocks(&[completed(1, 150, 1_000)]).unwrap();

        let reopened = tracker(&store, &clock);
        assert!(reopened.status("grand_opening").unwrap().unlocked);

        let corrupt = Arc::new(InMemoryBlobStore::new().with_blob(ACHIEVEMENTS_KEY, "{not json"));
        let fresh = tracker(&corrupt, &clock);
        assert_eq!(fresh.summary().unlocked, 0);
    }

    #[test]
    fn failed_save_keeps_previous_state() {
        let store = Arc::new(InMemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let tracker = tracker(&store, &clock);
        store.fail_writes(true);

        assert!(tracker.check_new_unlocks(&[completed(1, 150, 1_000)]).is_err());
        assert!(!tracker.status("first_slice").unwrap().unlocked);

        store.fail_writes(false);
        assert_eq!(tracker.check_new_unlocks(&[completed(1, 150, 1_000)]).unwrap().len(), 5);
    }

    #[test]
    fn grouping_and_summary() {
        let store = Arc::new(InMemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let tracker = tracker(&store, &clock);
        tracker.check_new_unlocks(&[completed(1, 150, 1_000)]).unwrap();

        let groups = tracker.by_category();
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[0].title, "📦 Volume Milestones");
        assert_eq!(groups[0].achievements.len(), 7);
        assert_eq!(groups[4].category, AchievementCategory::Special);

        let summary = tracker.summary();
        assert_eq!(summary, AchievementSummary { total: 20, unlocked: 5, percentage: 25 });
    }

    #[test]
    fn status_serializes_flat() {
        let store = Arc::new(InMemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let tracker = tracker(&store, &clock);
        let statuses = tracker.calculate_progress(&[completed(1, 20_000, 1_000)]);
        let ten_k = statuses.iter().find(|s| s.achievement.id == "10k_club").unwrap();
        assert_eq!(ten_k.capped_progress(), 10_000);

        let json = serde_json::to_value(ten_k).unwrap();
        assert_eq!(json["id"], "10k_club");
        assert_eq!(json["currentProgress"], 20_000);
        assert_eq!(json["unlocked"], true);
        // Nothing persisted without a check or explicit save.
        assert!(store.raw(ACHIEVEMENTS_KEY).is_none());
        tracker.save().unwrap();
        assert!(store.raw(ACHIEVEMENTS_KEY).is_some());
    }
}
