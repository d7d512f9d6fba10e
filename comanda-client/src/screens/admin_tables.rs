//! Table manager screen controller

use std::sync::Arc;

use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};

use crate::db::TableRepository;
use crate::error::{ClientError, ClientResult};
use crate::gateway::DataGateway;
use crate::notify::Notifier;

/// Table list with the header stats
#[derive(Debug, Clone, PartialEq)]
pub struct TablesView {
    pub tables: Vec<DiningTable>,
    pub total: usize,
    pub open: usize,
}

/// Outcome of a delete attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The table has order history; the operator must confirm detaching it
    /// before the delete can proceed (see [`AdminTablesScreen::unlink_and_delete`]).
    RequiresUnlink,
}

pub struct AdminTablesScreen {
    dining_tables: TableRepository,
    notifier: Notifier,
}

impl AdminTablesScreen {
    pub fn new(gateway: Arc<dyn DataGateway>, notifier: Notifier) -> Self {
        Self {
            dining_tables: TableRepository::new(gateway),
            notifier,
        }
    }

    pub async fn load(&self) -> ClientResult<TablesView> {
        match self.dining_tables.find_all().await {
            Ok(tables) => Ok(TablesView {
                total: tables.len(),
                open: tables.iter().filter(|t| t.is_open()).count(),
                tables,
            }),
            Err(err) => {
                tracing::error!(error = %err, "tables load failed");
                self.notifier.error("Could not load the tables");
                Err(err)
            }
        }
    }

    pub async fn create(&self, number: i32, name: Option<String>) -> ClientResult<DiningTable> {
        match self
            .dining_tables
            .create(DiningTableCreate { number, name })
            .await
        {
            Ok(table) => {
                self.notifier.info("Table added");
                Ok(table)
            }
            Err(err @ ClientError::ConstraintViolation(_)) => {
                self.notifier.error("That table already exists");
                Err(err)
            }
            Err(err) => {
                tracing::error!(error = %err, number, "table create failed");
                self.notifier.error("Could not save the table");
                Err(err)
            }
        }
    }

    pub async fn rename(&self, id: &str, name: Option<String>) -> ClientResult<DiningTable> {
        match self
            .dining_tables
            .rename(id, DiningTableUpdate { name })
            .await
        {
            Ok(table) => {
                self.notifier.info("Table updated");
                Ok(table)
            }
            Err(err) => {
                tracing::error!(error = %err, table_id = id, "table rename failed");
                self.notifier.error("Could not save the table");
                Err(err)
            }
        }
    }

    /// Try a direct delete. A table with order history reports
    /// `RequiresUnlink` so the operator can confirm the remediation.
    pub async fn delete(&self, id: &str) -> ClientResult<DeleteOutcome> {
        match self.dining_tables.delete(id).await {
            Ok(()) => {
                self.notifier.info("Table deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(ClientError::ConstraintViolation(_)) => Ok(DeleteOutcome::RequiresUnlink),
            Err(err) => {
                tracing::error!(error = %err, table_id = id, "table delete failed");
                self.notifier.error("Could not delete the table");
                Err(err)
            }
        }
    }

    /// Confirmed remediation: detach the history, then delete
    pub async fn unlink_and_delete(&self, id: &str) -> ClientResult<()> {
        match self.dining_tables.unlink_and_delete(id).await {
            Ok(()) => {
                self.notifier
                    .info("Table deleted, order history kept for reports");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, table_id = id, "unlink-and-delete failed");
                self.notifier.error("Could not delete the table");
                Err(err)
            }
        }
    }
}
