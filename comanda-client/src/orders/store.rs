//! Order Aggregate Store
//!
//! Read-through cache of the currently relevant orders, refreshed by a
//! wholesale reload on every change notification. No incremental patching:
//! at restaurant-scale volumes the full reload keeps every consumer
//! trivially consistent with at-least-once event delivery.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use shared::order::OrderAggregate;

use crate::db::{OrderFilter, OrderRepository};
use crate::error::ClientResult;
use crate::gateway::{tables, ChangeKind, DataGateway};

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Fan-out notification after a reload triggered by a gateway push
#[derive(Debug, Clone)]
pub struct StoreUpdate {
    /// What kind of change triggered the reload
    pub kind: ChangeKind,
    /// Which table changed (`orders` or `order_items`)
    pub table: String,
}

impl StoreUpdate {
    /// A brand-new order arrived (boards use this for the arrival cue)
    pub fn is_new_order(&self) -> bool {
        self.kind == ChangeKind::Inserted && self.table == tables::ORDERS
    }
}

/// Guard for the background watch task; dropping it stops the task and
/// unsubscribes the change feeds.
pub struct WatchGuard {
    handle: JoinHandle<()>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// In-memory cache of active order aggregates
pub struct OrderStore {
    repo: OrderRepository,
    gateway: Arc<dyn DataGateway>,
    filter: OrderFilter,
    cache: RwLock<Vec<OrderAggregate>>,
    update_tx: broadcast::Sender<StoreUpdate>,
}

impl OrderStore {
    pub fn new(gateway: Arc<dyn DataGateway>, filter: OrderFilter) -> Arc<Self> {
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Arc::new(Self {
            repo: OrderRepository::new(gateway.clone()),
            gateway,
            filter,
            cache: RwLock::new(Vec::new()),
            update_tx,
        })
    }

    /// Wholesale refresh from the gateway, replacing the cached working set
    pub async fn reload(&self) -> ClientResult<Vec<OrderAggregate>> {
        let aggregates = self.repo.load(&self.filter).await?;
        *self.cache.write() = aggregates.clone();
        Ok(aggregates)
    }

    /// Current cached working set
    pub fn snapshot(&self) -> Vec<OrderAggregate> {
        self.cache.read().clone()
    }

    /// Register a view renderer for reload notifications
    pub fn on_store_changed(&self) -> broadcast::Receiver<StoreUpdate> {
        self.update_tx.subscribe()
    }

    /// Start reacting to gateway pushes on `orders` and `order_items`.
    ///
    /// Every push triggers a full reload followed by a fan-out to all
    /// registered renderers. The returned guard cancels the subscription
    /// on drop (view teardown).
    pub fn watch(self: &Arc<Self>) -> WatchGuard {
        let store = Arc::clone(self);
        let mut orders_feed = store.gateway.subscribe(tables::ORDERS);
        let mut items_feed = store.gateway.subscribe(tables::ORDER_ITEMS);

        let handle = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    event = orders_feed.next() => event,
                    event = items_feed.next() => event,
                };
                let Some(event) = event else {
                    tracing::debug!("change feeds closed, store watch stopped");
                    break;
                };
                if let Err(err) = store.reload().await {
                    tracing::error!(error = %err, "store reload after push failed");
                    continue;
                }
                let _ = store.update_tx.send(StoreUpdate {
                    kind: event.kind,
                    table: event.table,
                });
            }
        });
        WatchGuard { handle }
    }
}
