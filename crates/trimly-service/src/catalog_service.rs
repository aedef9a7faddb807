//! Service catalog: categories and the services a salon offers.

use crate::dto::{
    AssignStaffRequest, CreateCategoryRequest, CreateServiceRequest, ServiceQuery, UpdateCategoryRequest,
    UpdateServiceRequest,
};
use crate::scope;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{
    Category, CategoryId, Clock, Interface, Permission, Salon, SalonId, SalonService, ServiceId, TrimlyError,
    TrimlyResult, ValidateExt,
};
use trimly_repository::{Repositories, ServiceFilter};
use trimly_security::{Claims, ClaimsExt};

/// Catalog service trait.
#[async_trait]
pub trait CatalogService: Interface + Send + Sync {
    async fn create_category(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateCategoryRequest,
    ) -> TrimlyResult<Category>;

    async fn list_categories(&self, claims: &Claims, salon_id: SalonId) -> TrimlyResult<Vec<Category>>;

    async fn update_category(
        &self,
        claims: &Claims,
        id: CategoryId,
        request: UpdateCategoryRequest,
    ) -> TrimlyResult<Category>;

    /// Deletes a category; its services stay, uncategorised.
    async fn delete_category(&self, claims: &Claims, id: CategoryId) -> TrimlyResult<()>;

    async fn create_service(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateServiceRequest,
    ) -> TrimlyResult<SalonService>;

    async fn get_service(&self, claims: &Claims, id: ServiceId) -> TrimlyResult<SalonService>;

    async fn list_services(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        query: ServiceQuery,
    ) -> TrimlyResult<Vec<SalonService>>;

    /// Active services of an active salon, for customers choosing what to book.
    async fn public_services(&self, salon_id: SalonId) -> TrimlyResult<Vec<SalonService>>;

    async fn update_service(
        &self,
        claims: &Claims,
        id: ServiceId,
        request: UpdateServiceRequest,
    ) -> TrimlyResult<SalonService>;

    async fn delete_service(&self, claims: &Claims, id: ServiceId) -> TrimlyResult<()>;

    /// Replaces the set of staff who perform a service.
    async fn assign_staff(
        &self,
        claims: &Claims,
        id: ServiceId,
        request: AssignStaffRequest,
    ) -> TrimlyResult<SalonService>;
}

/// Catalog service implementation.
pub struct CatalogServiceImpl {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl CatalogServiceImpl {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    async fn category_for(&self, claims: &Claims, id: CategoryId) -> TrimlyResult<(Category, Salon)> {
        let category = self
            .repos
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Category", id))?;
        let salon = scope::salon_for(&self.repos, claims, category.salon_id).await?;
        Ok((category, salon))
    }

    async fn ensure_category_name_free(
        &self,
        salon_id: SalonId,
        name: &str,
        except: Option<CategoryId>,
    ) -> TrimlyResult<()> {
        match self.repos.categories.find_by_name(salon_id, name).await? {
            Some(existing) if Some(existing.id) != except => Err(TrimlyError::conflict(format!(
                "Category '{name}' already exists in this salon"
            ))),
            _ => Ok(()),
        }
    }

    /// A category used by a service must belong to the service's salon.
    async fn check_category(&self, salon_id: SalonId, id: CategoryId) -> TrimlyResult<()> {
        match self.repos.categories.find_by_id(id).await? {
            Some(category) if category.salon_id == salon_id => Ok(()),
            Some(_) => Err(TrimlyError::validation(format!(
                "Category {id} belongs to another salon"
            ))),
            None => Err(TrimlyError::not_found("Category", id)),
        }
    }

    async fn reload(&self, id: ServiceId) -> TrimlyResult<SalonService> {
        self.repos
            .services
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Service", id))
    }
}

fn check_price(price: Decimal) -> TrimlyResult<()> {
    if price.is_sign_negative() {
        return Err(TrimlyError::validation("price: must not be negative"));
    }
    Ok(())
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn create_category(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateCategoryRequest,
    ) -> TrimlyResult<Category> {
        claims.require_permission(Permission::CatalogManage)?;
        request.validate_request()?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;

        let name = request.name.trim().to_string();
        self.ensure_category_name_free(salon.id, &name, None).await?;

        let category = Category::new(salon.id, name, request.description, self.clock.now());
        let saved = self.repos.categories.save(&category).await?;
        info!("Category '{}' created in salon {}", saved.name, salon.id);
        Ok(saved)
    }

    async fn list_categories(&self, claims: &Claims, salon_id: SalonId) -> TrimlyResult<Vec<Category>> {
        claims.require_permission(Permission::SalonRead)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        self.repos.categories.find_by_salon(salon.id).await
    }

    async fn update_category(
        &self,
        claims: &Claims,
        id: CategoryId,
        request: UpdateCategoryRequest,
    ) -> TrimlyResult<Category> {
        claims.require_permission(Permission::CatalogManage)?;
        request.validate_request()?;
        let (mut category, salon) = self.category_for(claims, id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            self.ensure_category_name_free(salon.id, &name, Some(id)).await?;
            category.name = name;
        }
        if let Some(description) = request.description {
            category.description = Some(description);
        }
        category.updated_at = self.clock.now();

        self.repos.categories.update(&category).await
    }

    async fn delete_category(&self, claims: &Claims, id: CategoryId) -> TrimlyResult<()> {
        claims.require_permission(Permission::CatalogManage)?;
        let (category, _) = self.category_for(claims, id).await?;
        if !self.repos.categories.delete(category.id).await? {
            return Err(TrimlyError::not_found("Category", id));
        }
        info!("Category {} deleted", id);
        Ok(())
    }

    async fn create_service(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateServiceRequest,
    ) -> TrimlyResult<SalonService> {
        debug!("Creating service {} in salon {}", request.name, salon_id);
        claims.require_permission(Permission::CatalogManage)?;
        request.validate_request()?;
        check_price(request.price)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;

        if let Some(category_id) = request.category_id {
            self.check_category(salon.id, category_id).await?;
        }
        let staff_ids = scope::dedup_ids(&request.staff_ids);
        scope::ensure_staff_in_salon(&self.repos, salon.id, &staff_ids).await?;

        let mut service = SalonService::new(
            salon.id,
            request.category_id,
            request.name.trim().to_string(),
            request.duration_minutes,
            request.price,
            self.clock.now(),
        );
        service.description = request.description;

        let saved = self.repos.services.save(&service).await?;
        if !staff_ids.is_empty() {
            self.repos.services.replace_staff(saved.id, &staff_ids).await?;
        }
        info!("Service '{}' created in salon {}", saved.name, salon.id);
        self.reload(saved.id).await
    }

    async fn get_service(&self, claims: &Claims, id: ServiceId) -> TrimlyResult<SalonService> {
        claims.require_permission(Permission::SalonRead)?;
        scope::service_for(&self.repos, claims, id).await.map(|(service, _)| service)
    }

    async fn list_services(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        query: ServiceQuery,
    ) -> TrimlyResult<Vec<SalonService>> {
        claims.require_permission(Permission::SalonRead)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        let filter = ServiceFilter {
            category_id: query.category_id,
            active: query.active,
        };
        self.repos.services.find_by_salon(salon.id, filter).await
    }

    async fn public_services(&self, salon_id: SalonId) -> TrimlyResult<Vec<SalonService>> {
        let salon = scope::bookable_salon(&self.repos, salon_id).await?;
        let filter = ServiceFilter {
            category_id: None,
            active: Some(true),
        };
        self.repos.services.find_by_salon(salon.id, filter).await
    }

    async fn update_service(
        &self,
        claims: &Claims,
        id: ServiceId,
        request: UpdateServiceRequest,
    ) -> TrimlyResult<SalonService> {
        claims.require_permission(Permission::CatalogManage)?;
        request.validate_request()?;
        let (mut service, salon) = scope::service_for(&self.repos, claims, id).await?;

        if request.clear_category && request.category_id.is_some() {
            return Err(TrimlyError::validation(
                "Give either category_id or clear_category, not both",
            ));
        }
        if let Some(category_id) = request.category_id {
            self.check_category(salon.id, category_id).await?;
            service.category_id = Some(category_id);
        }
        if request.clear_category {
            service.category_id = None;
        }
        if let Some(name) = request.name {
            service.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            service.description = Some(description);
        }
        if let Some(minutes) = request.duration_minutes {
            service.duration_minutes = minutes;
        }
        if let Some(price) = request.price {
            check_price(price)?;
            service.price = price;
        }
        if let Some(active) = request.is_active {
            service.is_active = active;
        }
        service.updated_at = self.clock.now();

        let updated = self.repos.services.update(&service).await?;
        info!("Service {} updated", updated.id);
        Ok(updated)
    }

    async fn delete_service(&self, claims: &Claims, id: ServiceId) -> TrimlyResult<()> {
        claims.require_permission(Permission::CatalogManage)?;
        let (service, _) = scope::service_for(&self.repos, claims, id).await?;
        if !self.repos.services.delete(service.id).await? {
            return Err(TrimlyError::not_found("Service", id));
        }
        info!("Service {} deleted", id);
        Ok(())
    }

    async fn assign_staff(
        &self,
        claims: &Claims,
        id: ServiceId,
        request: AssignStaffRequest,
    ) -> TrimlyResult<SalonService> {
        claims.require_permission(Permission::CatalogManage)?;
        let (service, salon) = scope::service_for(&self.repos, claims, id).await?;
        let staff_ids = scope::dedup_ids(&request.staff_ids);
        scope::ensure_staff_in_salon(&self.repos, salon.id, &staff_ids).await?;

        self.repos.services.replace_staff(service.id, &staff_ids).await?;
        info!("Service {} now performed by {} staff", id, staff_ids.len());
        self.reload(service.id).await
    }
}

impl std::fmt::Debug for CatalogServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{service_request, TestContext};
    use rust_decimal_macros::dec;
    use trimly_core::UserRole;

    fn category(name: &str) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_category_names_unique_per_salon() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, rival) = ctx.admin("rival@cuts.example").await;
        let rival_salon = ctx.salon(&rival).await;

        let catalog = &ctx.services.catalog;
        catalog.create_category(&admin, salon.id, category("Hair")).await.unwrap();
        let err = catalog
            .create_category(&admin, salon.id, category("hair"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(catalog.create_category(&rival, rival_salon.id, category("Hair")).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleting_category_uncategorises_services() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let catalog = &ctx.services.catalog;
        let hair = catalog.create_category(&admin, salon.id, category("Hair")).await.unwrap();

        let request = CreateServiceRequest {
            category_id: Some(hair.id),
            ..service_request("Haircut", 30, dec!(25))
        };
        let cut = catalog.create_service(&admin, salon.id, request).await.unwrap();
        assert_eq!(cut.category_id, Some(hair.id));

        catalog.delete_category(&admin, hair.id).await.unwrap();
        let cut = catalog.get_service(&admin, cut.id).await.unwrap();
        assert_eq!(cut.category_id, None);
        assert!(catalog.list_categories(&admin, salon.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_must_be_from_same_salon() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, rival) = ctx.admin("rival@cuts.example").await;
        let rival_salon = ctx.salon(&rival).await;
        let theirs = ctx
            .services
            .catalog
            .create_category(&rival, rival_salon.id, category("Hair"))
            .await
            .unwrap();

        let request = CreateServiceRequest {
            category_id: Some(theirs.id),
            ..service_request("Haircut", 30, dec!(25))
        };
        let err = ctx
            .services
            .catalog
            .create_service(&admin, salon.id, request)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let err = ctx
            .services
            .catalog
            .create_service(&admin, salon.id, service_request("Haircut", 30, dec!(-5)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_assign_staff_reflects_on_staff() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let cut = ctx.service(&admin, &salon, "Haircut", 30, dec!(25)).await;
        let ravi = ctx.staff(&admin, &salon, "Ravi", &[]).await;
        let meera = ctx.staff(&admin, &salon, "Meera", &[]).await;

        let updated = ctx
            .services
            .catalog
            .assign_staff(
                &admin,
                cut.id,
                AssignStaffRequest {
                    staff_ids: vec![meera.id, ravi.id, meera.id],
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.staff_ids.len(), 2);

        let ravi = ctx.repos.staff.find_by_id(ravi.id).await.unwrap().unwrap();
        assert_eq!(ravi.service_ids, vec![cut.id]);
    }

    #[tokio::test]
    async fn test_delete_service_removes_assignments() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let cut = ctx.service(&admin, &salon, "Haircut", 30, dec!(25)).await;
        let ravi = ctx.staff(&admin, &salon, "Ravi", &[cut.id]).await;

        ctx.services.catalog.delete_service(&admin, cut.id).await.unwrap();
        let ravi = ctx.repos.staff.find_by_id(ravi.id).await.unwrap().unwrap();
        assert!(ravi.service_ids.is_empty());
        let err = ctx.services.catalog.get_service(&admin, cut.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_list_filters_and_public_view() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let cut = ctx.service(&admin, &salon, "Haircut", 30, dec!(25)).await;
        ctx.service(&admin, &salon, "Shave", 15, dec!(10)).await;
        ctx.services
            .catalog
            .update_service(
                &admin,
                cut.id,
                UpdateServiceRequest {
                    is_active: Some(false),
                    ..UpdateServiceRequest::default()
                },
            )
            .await
            .unwrap();

        let all = ctx
            .services
            .catalog
            .list_services(&admin, salon.id, ServiceQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        let public = ctx.services.catalog.public_services(salon.id).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "Shave");
    }

    #[tokio::test]
    async fn test_staff_role_reads_but_cannot_edit() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let cut = ctx.service(&admin, &salon, "Haircut", 30, dec!(25)).await;
        let (_, staff) = ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;

        assert!(ctx.services.catalog.get_service(&staff, cut.id).await.is_ok());
        let err = ctx
            .services
            .catalog
            .delete_service(&staff, cut.id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
