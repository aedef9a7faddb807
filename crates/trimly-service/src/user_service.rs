//! Employee account management within a tenant.

use crate::dto::{CreateEmployeeRequest, EmployeeQuery, UpdateEmployeeRequest, UpdateUserStatusRequest, UserResponse};
use crate::scope;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{
    normalize_phone, AccountStatus, Clock, Email, Interface, Page, PageRequest, Permission,
    TrimlyError, TrimlyResult, User, UserId, UserRole, ValidateExt,
};
use trimly_repository::Repositories;
use trimly_security::{pinned_salon, Claims, ClaimsExt, PasswordHasher};

/// Employee account service trait.
#[async_trait]
pub trait UserService: Interface + Send + Sync {
    /// Creates a manager or staff account bound to one salon.
    async fn create_employee(&self, claims: &Claims, request: CreateEmployeeRequest) -> TrimlyResult<UserResponse>;

    /// Lists employees visible to the caller.
    async fn list_employees(
        &self,
        claims: &Claims,
        query: EmployeeQuery,
        page: PageRequest,
    ) -> TrimlyResult<Page<UserResponse>>;

    async fn get_employee(&self, claims: &Claims, id: UserId) -> TrimlyResult<UserResponse>;

    async fn update_employee(
        &self,
        claims: &Claims,
        id: UserId,
        request: UpdateEmployeeRequest,
    ) -> TrimlyResult<UserResponse>;

    /// Suspends or reactivates an employee.
    async fn set_status(
        &self,
        claims: &Claims,
        id: UserId,
        request: UpdateUserStatusRequest,
    ) -> TrimlyResult<UserResponse>;

    /// Soft-deletes an employee.
    async fn delete_employee(&self, claims: &Claims, id: UserId) -> TrimlyResult<()>;
}

/// Employee account service implementation.
pub struct UserServiceImpl {
    repos: Repositories,
    password_hasher: Arc<PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl UserServiceImpl {
    /// Creates a new user service.
    pub fn new(repos: Repositories, password_hasher: Arc<PasswordHasher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            password_hasher,
            clock,
        }
    }

    /// Loads an employee the caller may manage.
    ///
    /// Admins manage every employee of their tenant; managers only the staff
    /// accounts of their own salon.
    async fn load_managed(&self, claims: &Claims, id: UserId) -> TrimlyResult<User> {
        claims.require_permission(Permission::UserManage)?;
        let user = self
            .repos
            .users
            .find_by_id(id)
            .await?
            .filter(|u| u.status != AccountStatus::Deleted && u.role.is_employee())
            .ok_or_else(|| TrimlyError::not_found("User", id))?;

        let same_tenant = user.tenant_id.is_some_and(|tenant| claims.can_access_tenant(tenant));
        let within_reach = match claims.role {
            UserRole::Manager => user.role == UserRole::Staff && user.salon_id == claims.salon_id(),
            _ => true,
        };
        if !same_tenant || !within_reach {
            return Err(TrimlyError::forbidden(format!("No access to user {id}")));
        }
        Ok(user)
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_employee(&self, claims: &Claims, request: CreateEmployeeRequest) -> TrimlyResult<UserResponse> {
        debug!("Creating {} account: {}", request.role, request.email);
        claims.require_permission(Permission::UserManage)?;
        request.validate_request()?;

        if !request.role.is_employee() {
            return Err(TrimlyError::validation(
                "Only manager or staff accounts can be created here",
            ));
        }
        if claims.role == UserRole::Manager && request.role != UserRole::Staff {
            return Err(TrimlyError::forbidden("Managers may only create staff accounts"));
        }

        let salon = scope::salon_for(&self.repos, claims, request.salon_id).await?;
        let email = Email::new(&request.email)?;
        if self.repos.users.exists_by_email(email.as_str()).await? {
            return Err(TrimlyError::conflict(format!(
                "Email '{}' already exists",
                request.email
            )));
        }
        let phone = request.phone.as_deref().map(normalize_phone).transpose()?;
        let password_hash = self.password_hasher.hash(&request.password)?;

        let user = User::new_employee(
            salon.owner_id,
            salon.id,
            request.role,
            request.name.trim().to_string(),
            email,
            password_hash,
            phone,
            self.clock.now(),
        );
        let saved = self.repos.users.save(&user).await?;

        info!("Employee {} created for salon {}", saved.id, salon.id);
        Ok(saved.into())
    }

    async fn list_employees(
        &self,
        claims: &Claims,
        query: EmployeeQuery,
        page: PageRequest,
    ) -> TrimlyResult<Page<UserResponse>> {
        claims.require_permission(Permission::UserManage)?;
        let tenant = claims.require_tenant()?;

        let salon_id = match (pinned_salon(claims), query.salon_id) {
            (Some(pinned), Some(requested)) if pinned != requested => {
                return Err(TrimlyError::forbidden(format!("No access to salon {requested}")));
            }
            (Some(pinned), _) => Some(pinned),
            (None, Some(requested)) => Some(scope::salon_for(&self.repos, claims, requested).await?.id),
            (None, None) => None,
        };

        let page = self.repos.users.find_employees(tenant, salon_id, page).await?;
        Ok(page.map(UserResponse::from))
    }

    async fn get_employee(&self, claims: &Claims, id: UserId) -> TrimlyResult<UserResponse> {
        self.load_managed(claims, id).await.map(UserResponse::from)
    }

    async fn update_employee(
        &self,
        claims: &Claims,
        id: UserId,
        request: UpdateEmployeeRequest,
    ) -> TrimlyResult<UserResponse> {
        request.validate_request()?;
        let mut user = self.load_managed(claims, id).await?;

        if let Some(name) = request.name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            user.phone = Some(normalize_phone(&phone)?);
        }
        user.updated_at = self.clock.now();

        let updated = self.repos.users.update(&user).await?;
        info!("Employee {} updated", updated.id);
        Ok(updated.into())
    }

    async fn set_status(
        &self,
        claims: &Claims,
        id: UserId,
        request: UpdateUserStatusRequest,
    ) -> TrimlyResult<UserResponse> {
        if request.status == AccountStatus::Deleted {
            return Err(TrimlyError::validation("Use the delete operation to remove an account"));
        }
        if claims.user_id() == Some(id) {
            return Err(TrimlyError::business_rule("You cannot change your own status"));
        }
        let mut user = self.load_managed(claims, id).await?;
        user.set_status(request.status, self.clock.now());

        let updated = self.repos.users.update(&user).await?;
        info!("Employee {} is now {}", updated.id, updated.status);
        Ok(updated.into())
    }

    async fn delete_employee(&self, claims: &Claims, id: UserId) -> TrimlyResult<()> {
        if claims.user_id() == Some(id) {
            return Err(TrimlyError::business_rule("You cannot delete your own account"));
        }
        let mut user = self.load_managed(claims, id).await?;
        user.set_status(AccountStatus::Deleted, self.clock.now());
        self.repos.users.update(&user).await?;

        info!("Employee {} deleted", id);
        Ok(())
    }
}

impl std::fmt::Debug for UserServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestContext, PASSWORD};

    fn employee(salon_id: trimly_core::SalonId, role: UserRole, email: &str) -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            salon_id,
            role,
            name: "Ravi Kumar".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_admin_creates_manager() {
        let ctx = TestContext::new();
        let (owner, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;

        let created = ctx
            .services
            .users
            .create_employee(&admin, employee(salon.id, UserRole::Manager, "meera@glow.example"))
            .await
            .unwrap();
        assert_eq!(created.role, UserRole::Manager);
        assert_eq!(created.tenant_id, Some(owner.id));
        assert_eq!(created.salon_id, Some(salon.id));
    }

    #[tokio::test]
    async fn test_admin_roles_cannot_be_created() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;

        let err = ctx
            .services
            .users
            .create_employee(&admin, employee(salon.id, UserRole::Admin, "x@glow.example"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_manager_limited_to_staff_in_own_salon() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, manager) = ctx.employee(&admin, &salon, UserRole::Manager, "meera@glow.example").await;

        let err = ctx
            .services
            .users
            .create_employee(&manager, employee(salon.id, UserRole::Manager, "x@glow.example"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let staff = ctx
            .services
            .users
            .create_employee(&manager, employee(salon.id, UserRole::Staff, "ravi@glow.example"))
            .await
            .unwrap();
        assert_eq!(staff.role, UserRole::Staff);
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_see_employee() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (ravi, _) = ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;
        let (_, rival) = ctx.admin("rival@cuts.example").await;

        let err = ctx.services.users.get_employee(&rival, ravi.id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_suspend_and_delete() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (ravi, _) = ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;
        let users = ctx.services.users.clone();

        let suspended = users
            .set_status(
                &admin,
                ravi.id,
                UpdateUserStatusRequest {
                    status: AccountStatus::Suspended,
                },
            )
            .await
            .unwrap();
        assert_eq!(suspended.status, AccountStatus::Suspended);

        let deleted_via_status = users
            .set_status(
                &admin,
                ravi.id,
                UpdateUserStatusRequest {
                    status: AccountStatus::Deleted,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(deleted_via_status.status_code(), 400);

        users.delete_employee(&admin, ravi.id).await.unwrap();
        let listed = users
            .list_employees(&admin, EmployeeQuery::default(), PageRequest::first())
            .await
            .unwrap();
        assert!(listed.is_empty());
        assert_eq!(users.get_employee(&admin, ravi.id).await.unwrap_err().status_code(), 404);
    }

    #[tokio::test]
    async fn test_manager_lists_own_salon_only() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, manager) = ctx.employee(&admin, &salon, UserRole::Manager, "meera@glow.example").await;
        ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;

        let seen = ctx
            .services
            .users
            .list_employees(&manager, EmployeeQuery::default(), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(seen.total_elements(), 2);

        let elsewhere = EmployeeQuery {
            salon_id: Some(trimly_core::SalonId::new()),
        };
        let err = ctx
            .services
            .users
            .list_employees(&manager, elsewhere, PageRequest::first())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
