//! Cashier/billing screen controller
//!
//! Table cards with accumulated unpaid totals, the check detail for one
//! table (with display-side discount presets and tip), settlement, and
//! today's takings split by payment method. The table-to-orders relation
//! is derived by filtering orders on `table_id` at read time; nothing is
//! stored.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use shared::models::DiningTable;
use shared::order::{OrderAggregate, PaymentMethod};

use crate::db::{OrderFilter, OrderRepository, TableRepository};
use crate::error::{ClientError, ClientResult};
use crate::gateway::DataGateway;
use crate::notify::Notifier;
use crate::orders::{money, Reconciler};
use crate::utils::time::day_start;

/// Discount presets offered on the check panel
pub const DISCOUNT_PRESETS: [f64; 3] = [0.0, 5.0, 10.0];

/// One table card on the cashier floor view
#[derive(Debug, Clone, PartialEq)]
pub struct TableCard {
    pub table: DiningTable,
    /// Sum of this table's unpaid order totals
    pub accumulated: f64,
    /// Has open consumption, so the card is clickable
    pub active: bool,
}

/// One line of the check detail
#[derive(Debug, Clone, PartialEq)]
pub struct CheckLine {
    pub quantity: i32,
    pub product_name: String,
    pub subtotal: f64,
}

/// Check detail for one table, with display-side adjustments applied
#[derive(Debug, Clone, PartialEq)]
pub struct CheckView {
    pub table_id: String,
    pub table_label: String,
    pub order_ids: Vec<String>,
    pub lines: Vec<CheckLine>,
    pub subtotal: f64,
    pub discount_percent: f64,
    pub discount: f64,
    pub tip: f64,
    pub total: f64,
}

impl CheckView {
    /// Apply a discount preset to the displayed total
    pub fn apply_discount(&mut self, percent: f64) {
        self.discount_percent = percent;
        self.discount = money::to_f64(
            money::to_decimal(self.subtotal) * money::to_decimal(percent)
                / rust_decimal::Decimal::ONE_HUNDRED,
        );
        self.recompute();
    }

    /// Set the tip recorded at settlement
    pub fn set_tip(&mut self, tip: f64) {
        self.tip = money::round_money(tip.max(0.0));
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total = money::to_f64(
            money::to_decimal(self.subtotal) - money::to_decimal(self.discount)
                + money::to_decimal(self.tip),
        );
    }
}

/// Today's settled totals split by payment method
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Takings {
    pub cash: f64,
    pub card: f64,
    pub total: f64,
}

pub struct CashierScreen {
    orders: OrderRepository,
    dining_tables: TableRepository,
    reconciler: Reconciler,
    notifier: Notifier,
}

impl CashierScreen {
    pub fn new(
        gateway: Arc<dyn DataGateway>,
        notifier: Notifier,
        bar_category: impl Into<String>,
    ) -> Self {
        Self {
            orders: OrderRepository::new(gateway.clone()),
            dining_tables: TableRepository::new(gateway.clone()),
            reconciler: Reconciler::new(gateway, bar_category),
            notifier,
        }
    }

    /// Floor view: every table with its accumulated unpaid total
    pub async fn load_tables(&self) -> ClientResult<Vec<TableCard>> {
        let result: ClientResult<Vec<TableCard>> = async {
            let tables = self.dining_tables.find_all().await?;
            let unpaid = self.orders.load(&OrderFilter::unpaid()).await?;
            Ok(tables
                .into_iter()
                .map(|table| {
                    let accumulated = money::sum_subtotals(
                        unpaid
                            .iter()
                            .filter(|agg| agg.order.table_id.as_deref() == Some(table.id.as_str()))
                            .map(|agg| agg.order.total),
                    );
                    TableCard {
                        active: accumulated > 0.0,
                        accumulated,
                        table,
                    }
                })
                .collect())
        }
        .await;

        match result {
            Ok(cards) => Ok(cards),
            Err(err) => {
                tracing::error!(error = %err, "cashier floor load failed");
                self.notifier.error("Could not load the floor view");
                Err(err)
            }
        }
    }

    /// Open the check detail for one table
    pub async fn open_check(&self, table_id: &str) -> ClientResult<CheckView> {
        let table = self
            .dining_tables
            .find_by_id(table_id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("table {}", table_id)))?;
        let aggregates = self
            .orders
            .load(&OrderFilter::unpaid_for_table(table_id))
            .await?;

        let lines: Vec<CheckLine> = aggregates
            .iter()
            .flat_map(|agg| agg.lines.iter())
            .map(|line| CheckLine {
                quantity: line.quantity,
                product_name: line.product_name.clone(),
                subtotal: line.subtotal,
            })
            .collect();
        let subtotal = money::sum_subtotals(lines.iter().map(|l| l.subtotal));

        let mut view = CheckView {
            table_id: table.id.clone(),
            table_label: table.label(),
            order_ids: aggregates.iter().map(|agg| agg.order.id.clone()).collect(),
            lines,
            subtotal,
            discount_percent: 0.0,
            discount: 0.0,
            tip: 0.0,
            total: 0.0,
        };
        view.recompute();
        Ok(view)
    }

    /// Settle the whole check. `method` is `None` until the operator picks
    /// one; settling without a method is rejected up front.
    pub async fn settle(
        &self,
        check: &CheckView,
        method: Option<PaymentMethod>,
    ) -> ClientResult<()> {
        let Some(method) = method else {
            return Err(ClientError::EmptySelection("no payment method chosen"));
        };
        match self
            .reconciler
            .settle(&check.order_ids, method, check.tip)
            .await
        {
            Ok(()) => {
                self.notifier.info("Check settled, table released");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, table = %check.table_label, "settlement failed");
                self.notifier.error("Could not process the payment");
                Err(err)
            }
        }
    }

    /// Today's settled totals split by payment method
    pub async fn takings_today(&self, now: DateTime<Utc>) -> ClientResult<Takings> {
        let paid = self
            .orders
            .load(&OrderFilter::paid_since(day_start(now)))
            .await?;
        let split = |method: PaymentMethod| {
            money::sum_subtotals(
                paid.iter()
                    .filter(|agg| agg.order.payment_method == Some(method))
                    .map(|agg| agg.order.total),
            )
        };
        let cash = split(PaymentMethod::Cash);
        let card = split(PaymentMethod::Card);
        Ok(Takings {
            cash,
            card,
            total: money::sum_subtotals([cash, card]),
        })
    }

    /// Plain-text receipt for the check, as handed to the printer/email
    pub fn receipt_text(&self, check: &CheckView, now: DateTime<Utc>) -> String {
        let mut out = String::new();
        out.push_str("COMANDA - RECEIPT\n");
        out.push_str(&format!("{}\n", check.table_label));
        out.push_str(&format!("Date: {}\n", now.format("%Y-%m-%d %H:%M")));
        out.push_str("---------------------------\n");
        for line in &check.lines {
            out.push_str(&format!(
                "{}x {}  {:.2}\n",
                line.quantity, line.product_name, line.subtotal
            ));
        }
        out.push_str("---------------------------\n");
        if check.discount > 0.0 {
            out.push_str(&format!(
                "Discount ({}%): -{:.2}\n",
                check.discount_percent, check.discount
            ));
        }
        if check.tip > 0.0 {
            out.push_str(&format!("Tip: {:.2}\n", check.tip));
        }
        out.push_str(&format!("TOTAL: {:.2}\n", check.total));
        out.push_str("---------------------------\n");
        out.push_str("Thank you for your visit!\n");
        out
    }

    /// Load the aggregates behind a check (used by renderers for detail)
    pub async fn orders_for_table(&self, table_id: &str) -> ClientResult<Vec<OrderAggregate>> {
        self.orders
            .load(&OrderFilter::unpaid_for_table(table_id))
            .await
    }
}
