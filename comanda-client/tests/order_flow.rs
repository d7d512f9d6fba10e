//! End-to-end order lifecycle over the in-memory gateway
//!
//! Drives the same path the screens take in production: a cart submitted
//! from the menu, both station boards advancing their work, the global
//! status reconciling, the cashier settling the check, and the reports
//! picking the order up afterwards.

use std::sync::Arc;

use chrono::Utc;

use comanda_client::gateway::MemoryGateway;
use comanda_client::notify::Notifier;
use comanda_client::screens::{
    CashierScreen, MenuScreen, ReportRange, ReportsScreen, StationBoard,
};
use comanda_client::ClientError;
use shared::models::TableState;
use shared::order::{OrderStatus, PaymentMethod, StationStatus};

const BAR: &str = "Bar";

struct Pos {
    gateway: Arc<MemoryGateway>,
    notifier: Notifier,
}

impl Pos {
    fn new() -> Self {
        Self {
            gateway: Arc::new(MemoryGateway::new()),
            notifier: Notifier::default(),
        }
    }

    async fn menu(&self, table_number: i32) -> MenuScreen {
        let mut screen = MenuScreen::new(
            self.gateway.clone(),
            self.notifier.clone(),
            BAR,
            table_number,
        );
        screen.load().await.unwrap();
        screen
    }

    fn kitchen(&self) -> StationBoard {
        StationBoard::kitchen(self.gateway.clone(), self.notifier.clone(), BAR)
    }

    fn bar(&self) -> StationBoard {
        StationBoard::bar(self.gateway.clone(), self.notifier.clone(), BAR)
    }

    fn cashier(&self) -> CashierScreen {
        CashierScreen::new(self.gateway.clone(), self.notifier.clone(), BAR)
    }

    fn reports(&self) -> ReportsScreen {
        ReportsScreen::new(self.gateway.clone(), self.notifier.clone())
    }

    async fn seed_catalog(&self) {
        let repo = comanda_client::db::ProductRepository::new(self.gateway.clone());
        repo.seed("Tacos al pastor", "Mains", 8.5).await.unwrap();
        repo.seed("Flan", "Desserts", 4.0).await.unwrap();
        repo.seed("Mojito", BAR, 7.0).await.unwrap();
    }
}

async fn submit_order(pos: &Pos, table: i32, items: &[(&str, i32)]) -> String {
    let mut menu = pos.menu(table).await;
    for (name, quantity) in items {
        let id = menu.filtered("All", name)[0].id.clone();
        for _ in 0..*quantity {
            assert!(menu.add_to_cart(&id));
        }
    }
    menu.send_order().await.unwrap()
}

#[tokio::test]
async fn test_full_lifecycle_mixed_order() {
    let pos = Pos::new();
    pos.seed_catalog().await;

    let order_id = submit_order(&pos, 5, &[("Tacos", 2), ("Mojito", 1)]).await;

    // Both boards see their share of the order
    let kitchen = pos.kitchen();
    let bar = pos.bar();
    let kitchen_cards = kitchen.load(Utc::now()).await.unwrap();
    assert_eq!(kitchen_cards.len(), 1);
    assert_eq!(kitchen_cards[0].lines[0].product_name, "Tacos al pastor");
    let bar_cards = bar.load(Utc::now()).await.unwrap();
    assert_eq!(bar_cards[0].lines[0].product_name, "Mojito");

    // Kitchen finishes first; order is not globally served yet
    kitchen.advance(&order_id).await.unwrap();
    kitchen.advance(&order_id).await.unwrap();
    let cashier = pos.cashier();
    let check = {
        let cards = cashier.load_tables().await.unwrap();
        let table = cards.iter().find(|c| c.table.number == 5).unwrap();
        assert!(table.active);
        cashier.open_check(&table.table.id).await.unwrap()
    };
    assert_eq!(check.subtotal, 24.0);

    // Bar catches up; the global status reconciles to served
    bar.advance(&order_id).await.unwrap();
    let last = bar.advance(&order_id).await.unwrap();
    assert_eq!(last, StationStatus::Served);

    let served = pos
        .reports()
        .load(ReportRange::Today, Utc::now())
        .await
        .unwrap();
    assert_eq!(served.service_times.rows.len(), 1);

    // Settle with a tip; table closes and takings update
    let mut check = cashier.open_check(&check.table_id).await.unwrap();
    check.set_tip(3.0);
    cashier
        .settle(&check, Some(PaymentMethod::Cash))
        .await
        .unwrap();

    let takings = cashier.takings_today(Utc::now()).await.unwrap();
    assert_eq!(takings.cash, 24.0);

    let cards = cashier.load_tables().await.unwrap();
    let table = cards.iter().find(|c| c.table.number == 5).unwrap();
    assert_eq!(table.table.state, TableState::Closed);
    assert!(!table.active);

    // Both boards are empty again
    assert!(kitchen.load(Utc::now()).await.unwrap().is_empty());
    assert!(bar.load(Utc::now()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_station_boards_react_to_pushes() {
    let pos = Pos::new();
    pos.seed_catalog().await;

    let kitchen = pos.kitchen();
    let _guard = kitchen.watch();
    let mut updates = kitchen.store().on_store_changed();

    submit_order(&pos, 2, &[("Flan", 1)]).await;

    // The order-header insert reaches the board as a new-order cue
    let mut saw_new_order = false;
    for _ in 0..4 {
        if updates.recv().await.unwrap().is_new_order() {
            saw_new_order = true;
            break;
        }
    }
    assert!(saw_new_order);
    assert_eq!(kitchen.cards(Utc::now()).len(), 1);
}

#[tokio::test]
async fn test_order_edit_window_closes_when_preparation_starts() {
    let pos = Pos::new();
    pos.seed_catalog().await;
    let order_id = submit_order(&pos, 3, &[("Tacos", 1), ("Flan", 1)]).await;

    let kitchen = pos.kitchen();
    let cards = kitchen.load(Utc::now()).await.unwrap();
    assert!(cards[0].can_edit);

    // Remove one line while still submitted
    let flan = cards[0]
        .lines
        .iter()
        .find(|l| l.product_name == "Flan")
        .unwrap();
    let removed = kitchen.remove_line(&order_id, &flan.id).await.unwrap();
    assert!(!removed.order_deleted);
    assert_eq!(removed.new_total, 8.5);

    // Once preparing, the window is closed
    kitchen.advance(&order_id).await.unwrap();
    let cards = kitchen.load(Utc::now()).await.unwrap();
    assert!(!cards[0].can_edit);
    let tacos = cards[0].lines[0].clone();
    let err = kitchen.remove_line(&order_id, &tacos.id).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_removing_the_sole_line_cancels_the_order() {
    let pos = Pos::new();
    pos.seed_catalog().await;
    // A single 12.50 line, as on the dessert special
    let repo = comanda_client::db::ProductRepository::new(pos.gateway.clone());
    repo.seed("Tres leches", "Desserts", 12.5).await.unwrap();
    let order_id = submit_order(&pos, 9, &[("Tres leches", 1)]).await;

    let kitchen = pos.kitchen();
    let cards = kitchen.load(Utc::now()).await.unwrap();
    assert_eq!(cards[0].lines[0].subtotal, 12.5);

    let removed = kitchen
        .remove_line(&order_id, &cards[0].lines[0].id)
        .await
        .unwrap();
    assert!(removed.order_deleted);
    assert_eq!(removed.new_total, 0.0);
    assert!(kitchen.load(Utc::now()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_double_settlement_is_rejected() {
    let pos = Pos::new();
    pos.seed_catalog().await;
    submit_order(&pos, 6, &[("Tacos", 1)]).await;

    let cashier = pos.cashier();
    let cards = cashier.load_tables().await.unwrap();
    let table_id = cards
        .iter()
        .find(|c| c.table.number == 6)
        .unwrap()
        .table
        .id
        .clone();
    let check = cashier.open_check(&table_id).await.unwrap();

    cashier
        .settle(&check, Some(PaymentMethod::Card))
        .await
        .unwrap();
    // The stale check view still references the now-paid orders
    let err = cashier
        .settle(&check, Some(PaymentMethod::Cash))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AlreadyPaid(_)));
}

#[tokio::test]
async fn test_detached_history_still_reports() {
    let pos = Pos::new();
    pos.seed_catalog().await;
    submit_order(&pos, 8, &[("Tacos", 2)]).await;

    let cashier = pos.cashier();
    let cards = cashier.load_tables().await.unwrap();
    let table_id = cards
        .iter()
        .find(|c| c.table.number == 8)
        .unwrap()
        .table
        .id
        .clone();
    let check = cashier.open_check(&table_id).await.unwrap();
    cashier
        .settle(&check, Some(PaymentMethod::Cash))
        .await
        .unwrap();

    // Admin deletes the table; history is detached, not destroyed
    let admin = comanda_client::screens::AdminTablesScreen::new(
        pos.gateway.clone(),
        pos.notifier.clone(),
    );
    let outcome = admin.delete(&table_id).await.unwrap();
    assert_eq!(outcome, comanda_client::screens::DeleteOutcome::RequiresUnlink);
    admin.unlink_and_delete(&table_id).await.unwrap();

    let report = pos
        .reports()
        .load(ReportRange::All, Utc::now())
        .await
        .unwrap();
    assert_eq!(report.popularity.len(), 1);
    assert_eq!(report.popularity[0].quantity, 2);

    // The detached order no longer resolves a table
    let orders = comanda_client::db::OrderRepository::new(pos.gateway.clone());
    let all = orders
        .load(&comanda_client::db::OrderFilter::report(None))
        .await
        .unwrap();
    assert!(all[0].order.table_id.is_none());
    assert_eq!(all[0].order.status, OrderStatus::Paid);
}
