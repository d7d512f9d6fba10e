//! Dining Table Repository

use std::sync::Arc;

use serde_json::json;

use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableState};

use super::{decode, decode_all};
use crate::error::{ClientError, ClientResult};
use crate::gateway::{tables, DataGateway, Filter, Mutation, Query};

#[derive(Clone)]
pub struct TableRepository {
    gateway: Arc<dyn DataGateway>,
}

impl TableRepository {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// All tables ordered by floor number
    pub async fn find_all(&self) -> ClientResult<Vec<DiningTable>> {
        let rows = self
            .gateway
            .select(tables::DINING_TABLES, Query::new().order_by("number", true))
            .await?;
        decode_all(rows)
    }

    pub async fn find_by_id(&self, id: &str) -> ClientResult<Option<DiningTable>> {
        let rows = self
            .gateway
            .select(
                tables::DINING_TABLES,
                Query::new().filter(Filter::eq("id", id)),
            )
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn find_by_number(&self, number: i32) -> ClientResult<Option<DiningTable>> {
        let rows = self
            .gateway
            .select(
                tables::DINING_TABLES,
                Query::new().filter(Filter::eq("number", number)),
            )
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// Create a table, rejecting duplicate floor numbers
    pub async fn create(&self, data: DiningTableCreate) -> ClientResult<DiningTable> {
        if self.find_by_number(data.number).await?.is_some() {
            return Err(ClientError::ConstraintViolation(format!(
                "table {} already exists",
                data.number
            )));
        }
        let row = self
            .gateway
            .insert(
                tables::DINING_TABLES,
                json!({
                    "number": data.number,
                    "name": data.name,
                    "state": TableState::Closed,
                }),
            )
            .await?;
        decode(row)
    }

    /// Rename a table; the floor number is not editable
    pub async fn rename(&self, id: &str, data: DiningTableUpdate) -> ClientResult<DiningTable> {
        let rows = self
            .gateway
            .update(
                tables::DINING_TABLES,
                vec![Filter::eq("id", id)],
                json!({"name": data.name}),
            )
            .await?;
        rows.into_iter()
            .next()
            .map(decode)
            .transpose()?
            .ok_or_else(|| ClientError::NotFound(format!("table {}", id)))
    }

    pub async fn set_state(&self, id: &str, state: TableState) -> ClientResult<()> {
        let rows = self
            .gateway
            .update(
                tables::DINING_TABLES,
                vec![Filter::eq("id", id)],
                json!({"state": state}),
            )
            .await?;
        if rows.is_empty() {
            return Err(ClientError::NotFound(format!("table {}", id)));
        }
        Ok(())
    }

    /// Delete a table outright. Fails with `ConstraintViolation` when the
    /// table still has order history; see [`Self::unlink_and_delete`].
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        let removed = self
            .gateway
            .delete(tables::DINING_TABLES, vec![Filter::eq("id", id)])
            .await?;
        if removed == 0 {
            return Err(ClientError::NotFound(format!("table {}", id)));
        }
        Ok(())
    }

    /// Detach the table's order history (preserving it for reports), then
    /// delete the table - in one atomic batch.
    pub async fn unlink_and_delete(&self, id: &str) -> ClientResult<()> {
        self.gateway
            .apply(vec![
                Mutation::update(
                    tables::ORDERS,
                    vec![Filter::eq("table_id", id)],
                    json!({"table_id": null}),
                ),
                Mutation::delete(tables::DINING_TABLES, vec![Filter::eq("id", id)]),
            ])
            .await?;
        tracing::info!(table_id = %id, "table deleted, order history detached");
        Ok(())
    }
}
