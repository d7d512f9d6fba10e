//! Sales-report dashboard controller
//!
//! Aggregations over the order history: service times (created to
//! finished), product popularity with banding, and Monday-Friday daily
//! sales for the trend chart. Range presets mirror the dashboard buttons:
//! today, the working week, or everything.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc, Weekday};

use shared::order::OrderAggregate;

use crate::db::{OrderFilter, OrderRepository};
use crate::error::ClientResult;
use crate::gateway::DataGateway;
use crate::notify::Notifier;
use crate::orders::money;
use crate::utils::time::{day_start, minutes_between, week_start_monday};

/// Range presets on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportRange {
    #[default]
    Today,
    /// Monday through Friday of the current week
    Week,
    All,
}

/// One served order's timing row
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTimeRow {
    pub table_label: String,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub minutes: i64,
}

/// Service-time table plus the headline average
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceTimes {
    pub rows: Vec<ServiceTimeRow>,
    pub average_minutes: Option<i64>,
}

/// Popularity banding relative to the best seller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopularityBand {
    Top,
    Mid,
    Low,
}

/// One product's popularity row
#[derive(Debug, Clone, PartialEq)]
pub struct PopularityRow {
    pub name: String,
    pub quantity: i64,
    /// Share of the best seller, 0-100
    pub percent: i64,
    pub band: PopularityBand,
}

/// Monday..Friday sales totals for the trend chart
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySales {
    pub weekdays: [f64; 5],
}

/// Everything the dashboard renders for one range
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub service_times: ServiceTimes,
    pub popularity: Vec<PopularityRow>,
    pub daily_sales: DailySales,
}

pub struct ReportsScreen {
    orders: OrderRepository,
    notifier: Notifier,
}

impl ReportsScreen {
    pub fn new(gateway: Arc<dyn DataGateway>, notifier: Notifier) -> Self {
        Self {
            orders: OrderRepository::new(gateway),
            notifier,
        }
    }

    /// Load and aggregate the dashboard for one range
    pub async fn load(&self, range: ReportRange, now: DateTime<Utc>) -> ClientResult<Report> {
        let from = match range {
            ReportRange::Today => Some(day_start(now)),
            ReportRange::Week => Some(week_start_monday(now)),
            ReportRange::All => None,
        };
        let aggregates = match self.orders.load(&OrderFilter::report(from)).await {
            Ok(aggregates) => aggregates,
            Err(err) => {
                tracing::error!(error = %err, ?range, "report load failed");
                self.notifier.error("Could not load the reports");
                return Err(err);
            }
        };

        // The weekly view reports the working week only
        let visible: Vec<&OrderAggregate> = if range == ReportRange::Week {
            aggregates.iter().filter(|a| is_weekday(a)).collect()
        } else {
            aggregates.iter().collect()
        };

        Ok(Report {
            service_times: service_times(&visible),
            popularity: popularity(&visible),
            daily_sales: daily_sales(&aggregates),
        })
    }
}

fn is_weekday(agg: &OrderAggregate) -> bool {
    !matches!(
        agg.order.created_at.weekday(),
        Weekday::Sat | Weekday::Sun
    )
}

/// Timing rows for every order that reached served
fn service_times(aggregates: &[&OrderAggregate]) -> ServiceTimes {
    let rows: Vec<ServiceTimeRow> = aggregates
        .iter()
        .filter_map(|agg| {
            let finished = agg.order.finished_at?;
            Some(ServiceTimeRow {
                table_label: agg.table_label(),
                started: agg.order.created_at,
                finished,
                minutes: minutes_between(agg.order.created_at, finished),
            })
        })
        .collect();
    let average_minutes = if rows.is_empty() {
        None
    } else {
        let total: i64 = rows.iter().map(|r| r.minutes).sum();
        Some((total as f64 / rows.len() as f64).round() as i64)
    };
    ServiceTimes {
        rows,
        average_minutes,
    }
}

/// Quantity ranking with banding relative to the best seller:
/// above 80% is a top seller, below 30% a low seller.
fn popularity(aggregates: &[&OrderAggregate]) -> Vec<PopularityRow> {
    let mut quantities: HashMap<String, i64> = HashMap::new();
    for agg in aggregates {
        for line in &agg.lines {
            *quantities.entry(line.product_name.clone()).or_default() += line.quantity as i64;
        }
    }
    let mut ranked: Vec<(String, i64)> = quantities.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let Some(&(_, max_quantity)) = ranked.first() else {
        return Vec::new();
    };
    ranked
        .into_iter()
        .map(|(name, quantity)| {
            let percent = if max_quantity > 0 {
                ((quantity as f64 / max_quantity as f64) * 100.0).round() as i64
            } else {
                0
            };
            let band = if percent > 80 {
                PopularityBand::Top
            } else if percent < 30 {
                PopularityBand::Low
            } else {
                PopularityBand::Mid
            };
            PopularityRow {
                name,
                quantity,
                percent,
                band,
            }
        })
        .collect()
}

/// Monday..Friday buckets of order totals
fn daily_sales(aggregates: &[OrderAggregate]) -> DailySales {
    let mut weekdays = [0.0_f64; 5];
    for agg in aggregates {
        let index = agg.order.created_at.weekday().num_days_from_monday() as usize;
        if index < 5 {
            weekdays[index] = money::sum_subtotals([weekdays[index], agg.order.total]);
        }
    }
    DailySales { weekdays }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{tables, DataGateway as _, MemoryGateway};
    use serde_json::json;

    /// Insert an order row with full control over its timestamps
    async fn seed_order(
        gateway: &MemoryGateway,
        created_at: &str,
        finished_at: Option<&str>,
        total: f64,
        product: &str,
        quantity: i32,
    ) {
        let order = gateway
            .insert(
                tables::ORDERS,
                json!({
                    "table_id": null,
                    "status": if finished_at.is_some() { "SERVED" } else { "PREPARING" },
                    "kitchen_status": "SERVED",
                    "total": total,
                    "created_at": created_at,
                    "finished_at": finished_at,
                }),
            )
            .await
            .unwrap();
        gateway
            .insert(
                tables::ORDER_ITEMS,
                json!({
                    "order_id": order["id"],
                    "product_id": product,
                    "quantity": quantity,
                    "subtotal": total,
                }),
            )
            .await
            .unwrap();
        gateway
            .insert(
                tables::PRODUCTS,
                json!({
                    "id": product,
                    "name": product,
                    "category": "Mains",
                    "price": total,
                    "active": true,
                }),
            )
            .await
            .unwrap();
    }

    fn now() -> DateTime<Utc> {
        // A Thursday
        "2026-08-06T18:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn test_today_range_excludes_older_orders() {
        let gateway = MemoryGateway::new();
        seed_order(&gateway, "2026-08-06T12:00:00Z", None, 20.0, "tacos", 2).await;
        seed_order(&gateway, "2026-08-04T12:00:00Z", None, 50.0, "mole", 1).await;

        let screen = ReportsScreen::new(Arc::new(gateway), Notifier::default());
        let report = screen.load(ReportRange::Today, now()).await.unwrap();
        assert_eq!(report.popularity.len(), 1);
        assert_eq!(report.popularity[0].name, "tacos");

        let week = screen.load(ReportRange::Week, now()).await.unwrap();
        assert_eq!(week.popularity.len(), 2);
    }

    #[tokio::test]
    async fn test_service_times_average() {
        let gateway = MemoryGateway::new();
        seed_order(
            &gateway,
            "2026-08-06T12:00:00Z",
            Some("2026-08-06T12:20:00Z"),
            20.0,
            "tacos",
            1,
        )
        .await;
        seed_order(
            &gateway,
            "2026-08-06T13:00:00Z",
            Some("2026-08-06T13:10:00Z"),
            10.0,
            "flan",
            1,
        )
        .await;
        // Still being prepared, excluded from timing rows
        seed_order(&gateway, "2026-08-06T14:00:00Z", None, 5.0, "agua", 1).await;

        let screen = ReportsScreen::new(Arc::new(gateway), Notifier::default());
        let report = screen.load(ReportRange::Today, now()).await.unwrap();
        assert_eq!(report.service_times.rows.len(), 2);
        assert_eq!(report.service_times.average_minutes, Some(15));
    }

    #[tokio::test]
    async fn test_popularity_banding() {
        let gateway = MemoryGateway::new();
        seed_order(&gateway, "2026-08-06T12:00:00Z", None, 100.0, "tacos", 10).await;
        seed_order(&gateway, "2026-08-06T12:05:00Z", None, 25.0, "mole", 5).await;
        seed_order(&gateway, "2026-08-06T12:10:00Z", None, 4.0, "flan", 1).await;

        let screen = ReportsScreen::new(Arc::new(gateway), Notifier::default());
        let report = screen.load(ReportRange::Today, now()).await.unwrap();

        let by_name: HashMap<&str, &PopularityRow> = report
            .popularity
            .iter()
            .map(|row| (row.name.as_str(), row))
            .collect();
        assert_eq!(by_name["tacos"].band, PopularityBand::Top);
        assert_eq!(by_name["tacos"].percent, 100);
        assert_eq!(by_name["mole"].band, PopularityBand::Mid);
        assert_eq!(by_name["flan"].band, PopularityBand::Low);
    }

    #[tokio::test]
    async fn test_daily_sales_buckets_weekdays() {
        let gateway = MemoryGateway::new();
        // Monday and Thursday of the current week, plus a Saturday
        seed_order(&gateway, "2026-08-03T12:00:00Z", None, 30.0, "tacos", 1).await;
        seed_order(&gateway, "2026-08-06T12:00:00Z", None, 20.0, "mole", 1).await;
        seed_order(&gateway, "2026-08-08T12:00:00Z", None, 99.0, "flan", 1).await;

        let screen = ReportsScreen::new(Arc::new(gateway), Notifier::default());
        let report = screen.load(ReportRange::All, now()).await.unwrap();
        assert_eq!(report.daily_sales.weekdays[0], 30.0);
        assert_eq!(report.daily_sales.weekdays[3], 20.0);
        // Weekend sales stay out of the Monday-Friday chart
        assert_eq!(report.daily_sales.weekdays.iter().sum::<f64>(), 50.0);
    }

    #[tokio::test]
    async fn test_empty_history_yields_empty_report() {
        let gateway = MemoryGateway::new();
        let screen = ReportsScreen::new(Arc::new(gateway), Notifier::default());
        let report = screen.load(ReportRange::All, now()).await.unwrap();
        assert!(report.popularity.is_empty());
        assert_eq!(report.service_times.average_minutes, None);
    }
}
