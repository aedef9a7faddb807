//! PostgreSQL inventory repository implementation.

use super::limit_offset;
use crate::{traits::InventoryRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{InventoryItem, InventoryItemId, Page, PageRequest, SalonId, TrimlyError, TrimlyResult};
use uuid::Uuid;

const ITEM_COLUMNS: &str =
    "id, salon_id, name, sku, unit, quantity, reorder_level, unit_cost, created_at, updated_at";

/// PostgreSQL inventory repository implementation.
#[derive(Clone)]
pub struct PgInventoryRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgInventoryRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    salon_id: Uuid,
    name: String,
    sku: String,
    unit: String,
    quantity: i32,
    reorder_level: i32,
    unit_cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: InventoryItemId::from_uuid(row.id),
            salon_id: SalonId::from_uuid(row.salon_id),
            name: row.name,
            sku: row.sku,
            unit: row.unit,
            quantity: row.quantity,
            reorder_level: row.reorder_level,
            unit_cost: row.unit_cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn find_by_id(&self, id: InventoryItemId) -> TrimlyResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM inventory_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(InventoryItem::from))
    }

    async fn find_by_sku(&self, salon_id: SalonId, sku: &str) -> TrimlyResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM inventory_items WHERE salon_id = $1 AND LOWER(sku) = LOWER($2)",
            ITEM_COLUMNS
        ))
        .bind(salon_id.into_inner())
        .bind(sku)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(InventoryItem::from))
    }

    async fn find_by_salon(&self, salon_id: SalonId, page: PageRequest) -> TrimlyResult<Page<InventoryItem>> {
        debug!("Finding inventory of salon: {}", salon_id);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE salon_id = $1")
            .bind(salon_id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM inventory_items WHERE salon_id = $1 ORDER BY name LIMIT $2 OFFSET $3",
            ITEM_COLUMNS
        ))
        .bind(salon_id.into_inner())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(Page::new(
            rows.into_iter().map(InventoryItem::from).collect(),
            page.page,
            page.size,
            total as u64,
        ))
    }

    async fn find_low_stock(&self, salon_id: SalonId) -> TrimlyResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM inventory_items WHERE salon_id = $1 AND quantity <= reorder_level ORDER BY quantity, name",
            ITEM_COLUMNS
        ))
        .bind(salon_id.into_inner())
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    async fn save(&self, item: &InventoryItem) -> TrimlyResult<InventoryItem> {
        debug!("Saving new inventory item: {}", item.sku);

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "INSERT INTO inventory_items ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            ITEM_COLUMNS, ITEM_COLUMNS
        ))
        .bind(item.id.into_inner())
        .bind(item.salon_id.into_inner())
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.reorder_level)
        .bind(item.unit_cost)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(InventoryItem::from(row))
    }

    async fn update(&self, item: &InventoryItem) -> TrimlyResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items
            SET name = $2, sku = $3, unit = $4, reorder_level = $5,
                unit_cost = $6, updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item.id.into_inner())
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.unit)
        .bind(item.reorder_level)
        .bind(item.unit_cost)
        .bind(item.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("InventoryItem", item.id))?;

        Ok(InventoryItem::from(row))
    }

    async fn adjust_quantity(
        &self,
        id: InventoryItemId,
        delta: i32,
        now: DateTime<Utc>,
    ) -> TrimlyResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items
            SET quantity = quantity + $2, updated_at = $3
            WHERE id = $1 AND quantity + $2 >= 0
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id.into_inner())
        .bind(delta)
        .bind(now)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(InventoryItem::from))
    }

    async fn delete(&self, id: InventoryItemId) -> TrimlyResult<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for PgInventoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgInventoryRepository").finish_non_exhaustive()
    }
}
