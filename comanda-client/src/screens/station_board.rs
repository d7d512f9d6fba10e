//! Kitchen and bar display boards
//!
//! One controller parameterized by station: the kitchen board shows every
//! order whose kitchen work is unserved with its non-bar lines, the bar
//! board mirrors it for bar-category lines. Operators advance an order one
//! step at a time; edits (line removal) are only offered before
//! preparation starts.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use shared::order::{LineItem, Station, StationStatus};

use crate::db::OrderFilter;
use crate::error::ClientResult;
use crate::gateway::DataGateway;
use crate::notify::Notifier;
use crate::orders::{OrderStore, Reconciler, RemovedLine, WatchGuard};

/// An order arriving within this window is highlighted as new
const NEW_ORDER_WINDOW_SECS: i64 = 60;

/// One order card on a station board
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCard {
    pub order_id: String,
    pub table_label: String,
    pub status: StationStatus,
    /// Arrived within the last minute and not yet started
    pub is_new: bool,
    /// Only this station's lines
    pub lines: Vec<LineItem>,
    /// Line removal offered only before preparation starts
    pub can_edit: bool,
    /// The status the advance button would move to, if any
    pub next_status: Option<StationStatus>,
    pub created_at: DateTime<Utc>,
}

pub struct StationBoard {
    station: Station,
    store: Arc<OrderStore>,
    reconciler: Reconciler,
    notifier: Notifier,
    bar_category: String,
}

impl StationBoard {
    pub fn kitchen(
        gateway: Arc<dyn DataGateway>,
        notifier: Notifier,
        bar_category: impl Into<String>,
    ) -> Self {
        Self::new(gateway, notifier, bar_category, Station::Kitchen)
    }

    pub fn bar(
        gateway: Arc<dyn DataGateway>,
        notifier: Notifier,
        bar_category: impl Into<String>,
    ) -> Self {
        Self::new(gateway, notifier, bar_category, Station::Bar)
    }

    fn new(
        gateway: Arc<dyn DataGateway>,
        notifier: Notifier,
        bar_category: impl Into<String>,
        station: Station,
    ) -> Self {
        let bar_category = bar_category.into();
        Self {
            station,
            store: OrderStore::new(gateway.clone(), OrderFilter::station_board(station)),
            reconciler: Reconciler::new(gateway, bar_category.clone()),
            notifier,
            bar_category,
        }
    }

    pub fn station(&self) -> Station {
        self.station
    }

    /// The backing store, for renderers that want change notifications
    pub fn store(&self) -> &Arc<OrderStore> {
        &self.store
    }

    /// Start reacting to gateway pushes; drop the guard on view teardown
    pub fn watch(&self) -> WatchGuard {
        self.store.watch()
    }

    /// Reload the working set and compute the cards
    pub async fn load(&self, now: DateTime<Utc>) -> ClientResult<Vec<OrderCard>> {
        match self.store.reload().await {
            Ok(_) => Ok(self.cards(now)),
            Err(err) => {
                tracing::error!(error = %err, station = %self.station, "board reload failed");
                self.notifier.error("Could not load orders");
                Err(err)
            }
        }
    }

    /// Cards for the current cached working set, oldest first
    pub fn cards(&self, now: DateTime<Utc>) -> Vec<OrderCard> {
        self.store
            .snapshot()
            .into_iter()
            .filter_map(|agg| {
                let lines: Vec<LineItem> = agg
                    .station_lines(self.station, &self.bar_category)
                    .into_iter()
                    .cloned()
                    .collect();
                // An order with nothing for this station never shows here
                if lines.is_empty() {
                    return None;
                }
                let status = agg.station_status(self.station)?;
                let age_secs = (now - agg.order.created_at).num_seconds();
                Some(OrderCard {
                    table_label: agg.table_label(),
                    order_id: agg.order.id.clone(),
                    is_new: status == StationStatus::Submitted && age_secs < NEW_ORDER_WINDOW_SECS,
                    can_edit: status == StationStatus::Submitted,
                    next_status: status.next(),
                    created_at: agg.order.created_at,
                    status,
                    lines,
                })
            })
            .collect()
    }

    /// Advance one order to its next station status
    pub async fn advance(&self, order_id: &str) -> ClientResult<StationStatus> {
        match self.reconciler.advance(order_id, self.station).await {
            Ok(status) => {
                self.notifier
                    .info(format!("Order marked {:?}", status).to_lowercase());
                Ok(status)
            }
            Err(err) => {
                tracing::error!(error = %err, order_id, station = %self.station, "advance failed");
                self.notifier.error("Could not update the order");
                Err(err)
            }
        }
    }

    /// Remove a line from an order that has not started preparation
    pub async fn remove_line(&self, order_id: &str, line_item_id: &str) -> ClientResult<RemovedLine> {
        match self.reconciler.remove_line_item(order_id, line_item_id).await {
            Ok(removed) => {
                if removed.order_deleted {
                    self.notifier.info("Order cancelled (no items left)");
                } else {
                    self.notifier.info("Item removed, total updated");
                }
                Ok(removed)
            }
            Err(err) => {
                tracing::error!(error = %err, order_id, line_item_id, "line removal failed");
                self.notifier.error("Could not remove the item");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use shared::order::CartLine;

    fn cart_line(name: &str, category: &str, price: f64, quantity: i32) -> CartLine {
        CartLine {
            product_id: name.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price,
            quantity,
            note: String::new(),
        }
    }

    fn boards() -> (StationBoard, StationBoard, Reconciler) {
        let gateway = Arc::new(MemoryGateway::new());
        let kitchen = StationBoard::kitchen(gateway.clone(), Notifier::default(), "Bar");
        let bar = StationBoard::bar(gateway.clone(), Notifier::default(), "Bar");
        let reconciler = Reconciler::new(gateway, "Bar");
        (kitchen, bar, reconciler)
    }

    #[tokio::test]
    async fn test_boards_split_lines_by_station() {
        let (kitchen, bar, rec) = boards();
        rec.submit(
            1,
            &[
                cart_line("tacos", "Mains", 8.5, 1),
                cart_line("mojito", "Bar", 7.0, 2),
            ],
        )
        .await
        .unwrap();

        let kitchen_cards = kitchen.load(Utc::now()).await.unwrap();
        assert_eq!(kitchen_cards.len(), 1);
        assert_eq!(kitchen_cards[0].lines.len(), 1);
        assert_eq!(kitchen_cards[0].lines[0].product_name, "tacos");

        let bar_cards = bar.load(Utc::now()).await.unwrap();
        assert_eq!(bar_cards.len(), 1);
        assert_eq!(bar_cards[0].lines[0].product_name, "mojito");
    }

    #[tokio::test]
    async fn test_kitchen_board_hides_bar_only_orders() {
        let (kitchen, bar, rec) = boards();
        rec.submit(2, &[cart_line("mojito", "Bar", 7.0, 1)])
            .await
            .unwrap();

        assert!(kitchen.load(Utc::now()).await.unwrap().is_empty());
        assert_eq!(bar.load(Utc::now()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_card_flags_follow_status() {
        let (kitchen, _, rec) = boards();
        let order_id = rec
            .submit(1, &[cart_line("tacos", "Mains", 8.5, 1)])
            .await
            .unwrap();

        let card = &kitchen.load(Utc::now()).await.unwrap()[0];
        assert!(card.is_new);
        assert!(card.can_edit);
        assert_eq!(card.next_status, Some(StationStatus::Preparing));

        kitchen.advance(&order_id).await.unwrap();
        let card = &kitchen.load(Utc::now()).await.unwrap()[0];
        assert!(!card.is_new);
        assert!(!card.can_edit);
        assert_eq!(card.status, StationStatus::Preparing);
        assert_eq!(card.next_status, Some(StationStatus::Served));
    }

    #[tokio::test]
    async fn test_served_orders_leave_the_board() {
        let (kitchen, _, rec) = boards();
        let order_id = rec
            .submit(1, &[cart_line("tacos", "Mains", 8.5, 1)])
            .await
            .unwrap();
        kitchen.advance(&order_id).await.unwrap();
        kitchen.advance(&order_id).await.unwrap();

        assert!(kitchen.load(Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_line_from_board() {
        let (kitchen, _, rec) = boards();
        let order_id = rec
            .submit(
                1,
                &[
                    cart_line("tacos", "Mains", 8.5, 1),
                    cart_line("flan", "Desserts", 4.0, 1),
                ],
            )
            .await
            .unwrap();

        let card = &kitchen.load(Utc::now()).await.unwrap()[0];
        let flan = card
            .lines
            .iter()
            .find(|l| l.product_name == "flan")
            .unwrap();
        let removed = kitchen.remove_line(&order_id, &flan.id).await.unwrap();
        assert!(!removed.order_deleted);
        assert_eq!(removed.new_total, 8.5);
    }
}
