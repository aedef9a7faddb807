//! Salon stock keeping.

use crate::dto::{AdjustStockRequest, CreateInventoryItemRequest, UpdateInventoryItemRequest};
use crate::scope;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use trimly_core::{
    Clock, Interface, InventoryItem, InventoryItemId, Page, PageRequest, Permission, Salon, SalonId, TrimlyError,
    TrimlyResult, ValidateExt,
};
use trimly_repository::Repositories;
use trimly_security::{Claims, ClaimsExt};

/// Inventory service trait.
#[async_trait]
pub trait InventoryService: Interface + Send + Sync {
    async fn create_item(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateInventoryItemRequest,
    ) -> TrimlyResult<InventoryItem>;

    async fn get_item(&self, claims: &Claims, id: InventoryItemId) -> TrimlyResult<InventoryItem>;

    async fn list_items(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        page: PageRequest,
    ) -> TrimlyResult<Page<InventoryItem>>;

    async fn update_item(
        &self,
        claims: &Claims,
        id: InventoryItemId,
        request: UpdateInventoryItemRequest,
    ) -> TrimlyResult<InventoryItem>;

    async fn delete_item(&self, claims: &Claims, id: InventoryItemId) -> TrimlyResult<()>;

    /// Receives or consumes stock. Quantity never goes negative.
    async fn adjust_stock(
        &self,
        claims: &Claims,
        id: InventoryItemId,
        request: AdjustStockRequest,
    ) -> TrimlyResult<InventoryItem>;

    /// Items at or below their reorder level.
    async fn low_stock(&self, claims: &Claims, salon_id: SalonId) -> TrimlyResult<Vec<InventoryItem>>;
}

/// Inventory service implementation.
pub struct InventoryServiceImpl {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl InventoryServiceImpl {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    async fn item_for(&self, claims: &Claims, id: InventoryItemId) -> TrimlyResult<(InventoryItem, Salon)> {
        claims.require_permission(Permission::InventoryManage)?;
        let item = self
            .repos
            .inventory
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("InventoryItem", id))?;
        let salon = scope::salon_for(&self.repos, claims, item.salon_id).await?;
        Ok((item, salon))
    }

    async fn ensure_sku_free(&self, salon_id: SalonId, sku: &str, except: Option<InventoryItemId>) -> TrimlyResult<()> {
        match self.repos.inventory.find_by_sku(salon_id, sku).await? {
            Some(existing) if Some(existing.id) != except => Err(TrimlyError::conflict(format!(
                "SKU '{sku}' is already used in this salon"
            ))),
            _ => Ok(()),
        }
    }
}

fn check_cost(cost: Decimal) -> TrimlyResult<()> {
    if cost.is_sign_negative() {
        return Err(TrimlyError::validation("unit_cost: must not be negative"));
    }
    Ok(())
}

#[async_trait]
impl InventoryService for InventoryServiceImpl {
    async fn create_item(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateInventoryItemRequest,
    ) -> TrimlyResult<InventoryItem> {
        claims.require_permission(Permission::InventoryManage)?;
        request.validate_request()?;
        check_cost(request.unit_cost)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;

        let sku = request.sku.trim().to_string();
        self.ensure_sku_free(salon.id, &sku, None).await?;

        let item = InventoryItem::new(
            salon.id,
            request.name.trim().to_string(),
            sku,
            request.unit.trim().to_string(),
            request.quantity,
            request.reorder_level,
            request.unit_cost,
            self.clock.now(),
        );
        let saved = self.repos.inventory.save(&item).await?;
        info!("Inventory item {} ({}) added to salon {}", saved.sku, saved.id, salon.id);
        Ok(saved)
    }

    async fn get_item(&self, claims: &Claims, id: InventoryItemId) -> TrimlyResult<InventoryItem> {
        self.item_for(claims, id).await.map(|(item, _)| item)
    }

    async fn list_items(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        page: PageRequest,
    ) -> TrimlyResult<Page<InventoryItem>> {
        claims.require_permission(Permission::InventoryManage)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        self.repos.inventory.find_by_salon(salon.id, page).await
    }

    async fn update_item(
        &self,
        claims: &Claims,
        id: InventoryItemId,
        request: UpdateInventoryItemRequest,
    ) -> TrimlyResult<InventoryItem> {
        request.validate_request()?;
        let (mut item, salon) = self.item_for(claims, id).await?;

        if let Some(sku) = request.sku {
            let sku = sku.trim().to_string();
            self.ensure_sku_free(salon.id, &sku, Some(id)).await?;
            item.sku = sku;
        }
        if let Some(name) = request.name {
            item.name = name.trim().to_string();
        }
        if let Some(unit) = request.unit {
            item.unit = unit.trim().to_string();
        }
        if let Some(level) = request.reorder_level {
            item.reorder_level = level;
        }
        if let Some(cost) = request.unit_cost {
            check_cost(cost)?;
            item.unit_cost = cost;
        }
        item.updated_at = self.clock.now();

        self.repos.inventory.update(&item).await
    }

    async fn delete_item(&self, claims: &Claims, id: InventoryItemId) -> TrimlyResult<()> {
        let (item, _) = self.item_for(claims, id).await?;
        if !self.repos.inventory.delete(item.id).await? {
            return Err(TrimlyError::not_found("InventoryItem", id));
        }
        info!("Inventory item {} deleted", id);
        Ok(())
    }

    async fn adjust_stock(
        &self,
        claims: &Claims,
        id: InventoryItemId,
        request: AdjustStockRequest,
    ) -> TrimlyResult<InventoryItem> {
        request.validate_request()?;
        let (item, _) = self.item_for(claims, id).await?;

        let adjusted = self
            .repos
            .inventory
            .adjust_quantity(item.id, request.delta, self.clock.now())
            .await?;
        let Some(updated) = adjusted else {
            let current = self
                .repos
                .inventory
                .find_by_id(item.id)
                .await?
                .ok_or_else(|| TrimlyError::not_found("InventoryItem", id))?;
            return Err(current.insufficient_stock(request.delta));
        };
        info!(
            "Stock of {} adjusted by {} to {} ({})",
            updated.sku,
            request.delta,
            updated.quantity,
            request.reason.as_deref().unwrap_or("no reason given")
        );
        Ok(updated)
    }

    async fn low_stock(&self, claims: &Claims, salon_id: SalonId) -> TrimlyResult<Vec<InventoryItem>> {
        claims.require_permission(Permission::InventoryManage)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        self.repos.inventory.find_low_stock(salon.id).await
    }
}

impl std::fmt::Debug for InventoryServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use rust_decimal_macros::dec;
    use trimly_core::UserRole;

    fn shampoo(quantity: i32) -> CreateInventoryItemRequest {
        CreateInventoryItemRequest {
            name: "Shampoo 1L".to_string(),
            sku: "SHP-1L".to_string(),
            unit: "bottle".to_string(),
            quantity,
            reorder_level: 3,
            unit_cost: dec!(6.40),
        }
    }

    #[tokio::test]
    async fn test_sku_unique_within_salon() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let inventory = &ctx.services.inventory;

        inventory.create_item(&admin, salon.id, shampoo(10)).await.unwrap();
        let err = inventory
            .create_item(
                &admin,
                salon.id,
                CreateInventoryItemRequest {
                    sku: "shp-1l".to_string(),
                    ..shampoo(1)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_adjust_never_goes_negative() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let inventory = &ctx.services.inventory;
        let item = inventory.create_item(&admin, salon.id, shampoo(5)).await.unwrap();

        let consume = |delta| AdjustStockRequest {
            delta,
            reason: Some("used at wash station".to_string()),
        };
        let item = inventory.adjust_stock(&admin, item.id, consume(-4)).await.unwrap();
        assert_eq!(item.quantity, 1);

        let err = inventory.adjust_stock(&admin, item.id, consume(-2)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(inventory.get_item(&admin, item.id).await.unwrap().quantity, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumption_is_not_lost() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let id = ctx.services.inventory.create_item(&admin, salon.id, shampoo(10)).await.unwrap().id;

        let takers: Vec<_> = (0..16)
            .map(|_| {
                let inventory = Arc::clone(&ctx.services.inventory);
                let admin = admin.clone();
                tokio::spawn(async move {
                    inventory
                        .adjust_stock(&admin, id, AdjustStockRequest { delta: -1, reason: None })
                        .await
                })
            })
            .collect();

        let mut taken = 0;
        for taker in takers {
            match taker.await.unwrap() {
                Ok(_) => taken += 1,
                Err(err) => assert_eq!(err.status_code(), 400),
            }
        }
        assert_eq!(taken, 10);
        let left = ctx.services.inventory.get_item(&admin, id).await.unwrap();
        assert_eq!(left.quantity, 0);
    }

    #[tokio::test]
    async fn test_item_edit_keeps_stock_level() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let inventory = &ctx.services.inventory;
        let item = inventory.create_item(&admin, salon.id, shampoo(10)).await.unwrap();

        inventory
            .adjust_stock(&admin, item.id, AdjustStockRequest { delta: -4, reason: None })
            .await
            .unwrap();
        let mut stale = item.clone();
        stale.name = "Shampoo 1 litre".to_string();
        let saved = ctx.repos.inventory.update(&stale).await.unwrap();
        assert_eq!(saved.quantity, 6);
        assert_eq!(saved.name, "Shampoo 1 litre");
    }

    #[tokio::test]
    async fn test_low_stock_report() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let inventory = &ctx.services.inventory;
        inventory.create_item(&admin, salon.id, shampoo(3)).await.unwrap();
        inventory
            .create_item(
                &admin,
                salon.id,
                CreateInventoryItemRequest {
                    name: "Towels".to_string(),
                    sku: "TWL".to_string(),
                    ..shampoo(40)
                },
            )
            .await
            .unwrap();

        let low = inventory.low_stock(&admin, salon.id).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "SHP-1L");
        assert_eq!(
            inventory
                .list_items(&admin, salon.id, PageRequest::first())
                .await
                .unwrap()
                .total_elements(),
            2
        );
    }

    #[tokio::test]
    async fn test_staff_role_has_no_inventory_access() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, manager) = ctx.employee(&admin, &salon, UserRole::Manager, "mina@glow.example").await;
        let (_, staff) = ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;

        let item = ctx
            .services
            .inventory
            .create_item(&manager, salon.id, shampoo(5))
            .await
            .unwrap();
        let err = ctx.services.inventory.get_item(&staff, item.id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let inventory = &ctx.services.inventory;
        let item = inventory.create_item(&admin, salon.id, shampoo(5)).await.unwrap();

        let updated = inventory
            .update_item(
                &admin,
                item.id,
                UpdateInventoryItemRequest {
                    reorder_level: Some(10),
                    unit_cost: Some(dec!(7)),
                    ..UpdateInventoryItemRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.reorder_level, 10);
        assert_eq!(updated.quantity, 5);

        inventory.delete_item(&admin, item.id).await.unwrap();
        let err = inventory.get_item(&admin, item.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
