//! Inventory controller.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, PaginationQuery, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use trimly_core::{InventoryItem, InventoryItemId, Page, SalonId};
use trimly_service::{AdjustStockRequest, CreateInventoryItemRequest, UpdateInventoryItemRequest};

/// Creates the inventory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/salons/:id/inventory", get(list_items).post(create_item))
        .route("/salons/:id/inventory/low-stock", get(low_stock))
        .route("/inventory/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/inventory/:id/adjust", post(adjust_stock))
}

async fn list_items(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Page<InventoryItem>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let page = state
        .services
        .inventory
        .list_items(&user, salon_id, pagination.into())
        .await?;
    ok(page)
}

async fn create_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateInventoryItemRequest>,
) -> CreatedResult<InventoryItem> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let item = state.services.inventory.create_item(&user, salon_id, request).await?;
    created(item)
}

/// Items at or below their reorder level.
async fn low_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
) -> ApiResult<Vec<InventoryItem>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let items = state.services.inventory.low_stock(&user, salon_id).await?;
    ok(items)
}

async fn get_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<InventoryItem> {
    let id: InventoryItemId = parse_id("inventory item", &id)?;
    let item = state.services.inventory.get_item(&user, id).await?;
    ok(item)
}

async fn update_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateInventoryItemRequest>,
) -> ApiResult<InventoryItem> {
    let id: InventoryItemId = parse_id("inventory item", &id)?;
    let item = state.services.inventory.update_item(&user, id, request).await?;
    ok(item)
}

async fn delete_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: InventoryItemId = parse_id("inventory item", &id)?;
    state.services.inventory.delete_item(&user, id).await?;
    Ok(no_content())
}

/// Receives (positive delta) or consumes (negative delta) stock.
async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<AdjustStockRequest>,
) -> ApiResult<InventoryItem> {
    let id: InventoryItemId = parse_id("inventory item", &id)?;
    let item = state.services.inventory.adjust_stock(&user, id, request).await?;
    ok(item)
}
