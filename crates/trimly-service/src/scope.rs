//! Loading salon-owned records on behalf of a principal.
//!
//! Unknown ids are 404; records of a salon the principal may not act for
//! are 403.

use std::collections::HashSet;
use trimly_core::{Salon, SalonId, SalonService, ServiceId, Staff, StaffId, TrimlyError, TrimlyResult};
use trimly_repository::Repositories;
use trimly_security::{Claims, ClaimsExt};

/// Loads a salon the caller may act for.
pub(crate) async fn salon_for(repos: &Repositories, claims: &Claims, id: SalonId) -> TrimlyResult<Salon> {
    let salon = repos
        .salons
        .find_by_id(id)
        .await?
        .ok_or_else(|| TrimlyError::not_found("Salon", id))?;
    claims.require_salon_access(&salon)?;
    Ok(salon)
}

/// Loads a salon open to public booking.
pub(crate) async fn bookable_salon(repos: &Repositories, id: SalonId) -> TrimlyResult<Salon> {
    repos
        .salons
        .find_by_id(id)
        .await?
        .filter(|salon| salon.is_active)
        .ok_or_else(|| TrimlyError::not_found("Salon", id))
}

/// Loads a staff member together with a salon the caller may act for.
pub(crate) async fn staff_for(repos: &Repositories, claims: &Claims, id: StaffId) -> TrimlyResult<(Staff, Salon)> {
    let staff = repos
        .staff
        .find_by_id(id)
        .await?
        .ok_or_else(|| TrimlyError::not_found("Staff", id))?;
    let salon = salon_for(repos, claims, staff.salon_id).await?;
    Ok((staff, salon))
}

/// Loads a service together with a salon the caller may act for.
pub(crate) async fn service_for(
    repos: &Repositories,
    claims: &Claims,
    id: ServiceId,
) -> TrimlyResult<(SalonService, Salon)> {
    let service = repos
        .services
        .find_by_id(id)
        .await?
        .ok_or_else(|| TrimlyError::not_found("Service", id))?;
    let salon = salon_for(repos, claims, service.salon_id).await?;
    Ok((service, salon))
}

/// Removes repeated ids, keeping first occurrences in order.
pub(crate) fn dedup_ids<T: Copy + Eq + std::hash::Hash>(ids: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Checks that every service id names a service of `salon_id`.
pub(crate) async fn ensure_services_in_salon(
    repos: &Repositories,
    salon_id: SalonId,
    ids: &[ServiceId],
) -> TrimlyResult<()> {
    let found = repos.services.find_by_ids(ids).await?;
    for id in ids {
        if !found.iter().any(|s| s.id == *id && s.salon_id == salon_id) {
            return Err(TrimlyError::validation(format!(
                "Service {id} is not offered by this salon"
            )));
        }
    }
    Ok(())
}

/// Checks that every staff id names a staff member of `salon_id`.
pub(crate) async fn ensure_staff_in_salon(
    repos: &Repositories,
    salon_id: SalonId,
    ids: &[StaffId],
) -> TrimlyResult<()> {
    let found = repos.staff.find_by_ids(ids).await?;
    for id in ids {
        if !found.iter().any(|s| s.id == *id && s.salon_id == salon_id) {
            return Err(TrimlyError::validation(format!(
                "Staff member {id} does not work at this salon"
            )));
        }
    }
    Ok(())
}
