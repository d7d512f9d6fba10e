//! Application wiring
//!
//! One place that owns the gateway handle, the configuration and the toast
//! bus, and hands out screen controllers wired consistently. The host
//! (desktop shell, web view, test harness) builds one `App` per client
//! instance.

use std::sync::Arc;

use crate::config::Config;
use crate::gateway::DataGateway;
use crate::notify::Notifier;
use crate::screens::{
    AdminProductsScreen, AdminTablesScreen, CashierScreen, MenuScreen, ReportsScreen, StationBoard,
};
use crate::utils::logger;

pub struct App {
    gateway: Arc<dyn DataGateway>,
    config: Config,
    notifier: Notifier,
}

impl App {
    pub fn new(gateway: Arc<dyn DataGateway>, config: Config) -> Self {
        let notifier = Notifier::new(config.toast_ttl_ms);
        Self {
            gateway,
            config,
            notifier,
        }
    }

    /// Initialize tracing from the configuration; call once at startup
    pub fn init_logging(config: &Config) {
        logger::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    pub fn gateway(&self) -> Arc<dyn DataGateway> {
        self.gateway.clone()
    }

    /// Menu/ordering screen bound to one table
    pub fn menu(&self, table_number: i32) -> MenuScreen {
        MenuScreen::new(
            self.gateway.clone(),
            self.notifier.clone(),
            self.config.bar_category.clone(),
            table_number,
        )
    }

    pub fn kitchen_board(&self) -> StationBoard {
        StationBoard::kitchen(
            self.gateway.clone(),
            self.notifier.clone(),
            self.config.bar_category.clone(),
        )
    }

    pub fn bar_board(&self) -> StationBoard {
        StationBoard::bar(
            self.gateway.clone(),
            self.notifier.clone(),
            self.config.bar_category.clone(),
        )
    }

    pub fn cashier(&self) -> CashierScreen {
        CashierScreen::new(
            self.gateway.clone(),
            self.notifier.clone(),
            self.config.bar_category.clone(),
        )
    }

    pub fn admin_products(&self) -> AdminProductsScreen {
        AdminProductsScreen::new(self.gateway.clone(), self.notifier.clone())
    }

    pub fn admin_tables(&self) -> AdminTablesScreen {
        AdminTablesScreen::new(self.gateway.clone(), self.notifier.clone())
    }

    pub fn reports(&self) -> ReportsScreen {
        ReportsScreen::new(self.gateway.clone(), self.notifier.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProductRepository;
    use crate::gateway::MemoryGateway;
    use shared::order::Station;

    fn config() -> Config {
        Config {
            gateway_url: "http://localhost:54321".to_string(),
            gateway_api_key: String::new(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
            toast_ttl_ms: 1234,
            bar_category: "Drinks".to_string(),
        }
    }

    #[tokio::test]
    async fn test_screens_share_notifier_and_bar_category() {
        let app = App::new(Arc::new(MemoryGateway::new()), config());
        let mut toasts = app.notifier().subscribe();

        // The configured bar category routes lines on both boards
        ProductRepository::new(app.gateway())
            .seed("Mezcal", "Drinks", 9.0)
            .await
            .unwrap();
        let mut menu = app.menu(4);
        menu.load().await.unwrap();
        let id = menu.filtered("All", "mezcal")[0].id.clone();
        menu.add_to_cart(&id);
        menu.send_order().await.unwrap();

        assert_eq!(app.bar_board().station(), Station::Bar);
        let bar_cards = app.bar_board().load(chrono::Utc::now()).await.unwrap();
        assert_eq!(bar_cards.len(), 1);
        let kitchen_cards = app.kitchen_board().load(chrono::Utc::now()).await.unwrap();
        assert!(kitchen_cards.is_empty());

        // Toasts carry the configured lifetime
        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.ttl_ms, 1234);
    }
}
