//! Staff attendance: manager marking, self check-in and check-out, summaries.

use crate::dto::{AttendanceSummary, ClockRequest, MarkAttendanceRequest};
use crate::scope;
use async_trait::async_trait;
use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{
    Attendance, AttendanceStatus, Clock, Interface, Permission, Salon, SalonId, Staff, StaffId, TrimlyError,
    TrimlyResult, UserRole, ValidateExt,
};
use trimly_repository::Repositories;
use trimly_security::{Claims, ClaimsExt};

/// Attendance service trait.
#[async_trait]
pub trait AttendanceService: Interface + Send + Sync {
    /// Records a staff member's day, replacing any earlier record.
    async fn mark(&self, claims: &Claims, request: MarkAttendanceRequest) -> TrimlyResult<Attendance>;

    async fn check_in(&self, claims: &Claims, request: ClockRequest) -> TrimlyResult<Attendance>;

    async fn check_out(&self, claims: &Claims, request: ClockRequest) -> TrimlyResult<Attendance>;

    async fn list_day(&self, claims: &Claims, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Attendance>>;

    async fn monthly_summary(
        &self,
        claims: &Claims,
        staff_id: StaffId,
        year: i32,
        month: u32,
    ) -> TrimlyResult<AttendanceSummary>;
}

/// Attendance service implementation.
pub struct AttendanceServiceImpl {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl AttendanceServiceImpl {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Resolves whose clock is punched: a manager may name anyone in scope,
    /// everyone else punches their own linked staff record.
    async fn clock_target(&self, claims: &Claims, requested: Option<StaffId>) -> TrimlyResult<(Staff, Salon)> {
        claims.require_permission(Permission::AttendanceSelf)?;
        let own = match claims.user_id() {
            Some(user_id) => self.repos.staff.find_by_user(user_id).await?,
            None => None,
        };
        match (requested, own) {
            (Some(id), Some(own)) if id == own.id => scope::staff_for(&self.repos, claims, id).await,
            (Some(id), _) => {
                claims.require_permission(Permission::AttendanceMark)?;
                scope::staff_for(&self.repos, claims, id).await
            }
            (None, Some(own)) => scope::staff_for(&self.repos, claims, own.id).await,
            (None, None) => Err(TrimlyError::business_rule(
                "Your account is not linked to a staff record",
            )),
        }
    }

    fn local_now(&self, salon: &Salon) -> NaiveDateTime {
        let local = salon.local_time(self.clock.now());
        local.with_nanosecond(0).unwrap_or(local)
    }
}

fn month_bounds(year: i32, month: u32) -> TrimlyResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| TrimlyError::validation(format!("Invalid month: {year}-{month}")))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| TrimlyError::validation(format!("Invalid month: {year}-{month}")))?;
    Ok((first, last))
}

fn check_times(check_in: Option<NaiveTime>, check_out: Option<NaiveTime>) -> TrimlyResult<()> {
    match (check_in, check_out) {
        (None, Some(_)) => Err(TrimlyError::validation("check_out requires check_in")),
        (Some(start), Some(end)) if end <= start => {
            Err(TrimlyError::validation("check_out must be after check_in"))
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl AttendanceService for AttendanceServiceImpl {
    async fn mark(&self, claims: &Claims, request: MarkAttendanceRequest) -> TrimlyResult<Attendance> {
        debug!("Marking {} for staff {} on {}", request.status, request.staff_id, request.date);
        claims.require_permission(Permission::AttendanceMark)?;
        request.validate_request()?;
        check_times(request.check_in, request.check_out)?;
        let (staff, salon) = scope::staff_for(&self.repos, claims, request.staff_id).await?;

        let now = self.clock.now();
        let existing = self.repos.attendance.find_by_staff_on(staff.id, request.date).await?;
        let is_new = existing.is_none();
        let mut record = existing.unwrap_or_else(|| Attendance::new(salon.id, staff.id, request.date, request.status, now));
        record.status = request.status;
        record.check_in = request.check_in;
        record.check_out = request.check_out;
        record.notes = request.notes;
        record.updated_at = now;

        let saved = if is_new {
            self.repos.attendance.save(&record).await?
        } else {
            self.repos.attendance.update(&record).await?
        };
        info!("Staff {} marked {} on {}", staff.id, saved.status, saved.date);
        Ok(saved)
    }

    async fn check_in(&self, claims: &Claims, request: ClockRequest) -> TrimlyResult<Attendance> {
        let (staff, salon) = self.clock_target(claims, request.staff_id).await?;
        let local = self.local_now(&salon);
        let date = local.date();
        let time = request.time.unwrap_or_else(|| local.time());

        let now = self.clock.now();
        let saved = match self.repos.attendance.find_by_staff_on(staff.id, date).await? {
            Some(record) if record.check_in.is_some() => {
                return Err(TrimlyError::conflict(format!(
                    "{} already checked in on {date}",
                    staff.name
                )))
            }
            Some(mut record) => {
                record.status = AttendanceStatus::Present;
                record.check_in = Some(time);
                record.updated_at = now;
                self.repos.attendance.update(&record).await?
            }
            None => {
                let mut record = Attendance::new(salon.id, staff.id, date, AttendanceStatus::Present, now);
                record.check_in = Some(time);
                self.repos.attendance.save(&record).await?
            }
        };
        info!("Staff {} checked in at {} on {}", staff.id, time, date);
        Ok(saved)
    }

    async fn check_out(&self, claims: &Claims, request: ClockRequest) -> TrimlyResult<Attendance> {
        let (staff, salon) = self.clock_target(claims, request.staff_id).await?;
        let local = self.local_now(&salon);
        let date = local.date();
        let time = request.time.unwrap_or_else(|| local.time());

        let mut record = self
            .repos
            .attendance
            .find_by_staff_on(staff.id, date)
            .await?
            .filter(|r| r.check_in.is_some())
            .ok_or_else(|| TrimlyError::business_rule(format!("{} has not checked in on {date}", staff.name)))?;
        if record.check_out.is_some() {
            return Err(TrimlyError::conflict(format!(
                "{} already checked out on {date}",
                staff.name
            )));
        }
        check_times(record.check_in, Some(time))?;

        record.check_out = Some(time);
        record.updated_at = self.clock.now();
        let saved = self.repos.attendance.update(&record).await?;
        info!("Staff {} checked out at {} on {}", staff.id, time, date);
        Ok(saved)
    }

    async fn list_day(&self, claims: &Claims, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Attendance>> {
        claims.require_permission(Permission::AttendanceMark)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        self.repos.attendance.find_by_salon_on(salon.id, date).await
    }

    async fn monthly_summary(
        &self,
        claims: &Claims,
        staff_id: StaffId,
        year: i32,
        month: u32,
    ) -> TrimlyResult<AttendanceSummary> {
        let (from, to) = month_bounds(year, month)?;
        let (staff, _) = if claims.role == UserRole::Staff {
            self.clock_target(claims, Some(staff_id)).await?
        } else {
            claims.require_permission(Permission::AttendanceMark)?;
            scope::staff_for(&self.repos, claims, staff_id).await?
        };

        let records = self.repos.attendance.find_by_staff_between(staff.id, from, to).await?;
        let mut summary = AttendanceSummary {
            staff_id: staff.id,
            year,
            month,
            present: 0,
            absent: 0,
            half_day: 0,
            leave: 0,
            worked_minutes: 0,
        };
        for record in &records {
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::HalfDay => summary.half_day += 1,
                AttendanceStatus::Leave => summary.leave += 1,
            }
            summary.worked_minutes += record.worked_minutes();
        }
        Ok(summary)
    }
}

impl std::fmt::Debug for AttendanceServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use chrono::Duration;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    struct Roster {
        ctx: TestContext,
        admin: Claims,
        salon: Salon,
        ravi: Staff,
        ravi_claims: Claims,
    }

    async fn roster() -> Roster {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (user, ravi_claims) = ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;
        let mut ravi = ctx.staff(&admin, &salon, "Ravi", &[]).await;
        ravi.user_id = Some(user.id);
        let ravi = ctx.repos.staff.update(&ravi).await.unwrap();
        Roster {
            ctx,
            admin,
            salon,
            ravi,
            ravi_claims,
        }
    }

    #[tokio::test]
    async fn test_check_in_then_out() {
        let r = roster().await;
        let attendance = &r.ctx.services.attendance;

        let record = attendance.check_in(&r.ravi_claims, ClockRequest::default()).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.check_in, Some(t(8, 0)));
        assert_eq!(record.date, day(10));

        let again = attendance
            .check_in(&r.ravi_claims, ClockRequest::default())
            .await
            .unwrap_err();
        assert_eq!(again.status_code(), 409);

        r.ctx.clock.advance(Duration::hours(9));
        let record = attendance.check_out(&r.ravi_claims, ClockRequest::default()).await.unwrap();
        assert_eq!(record.worked_minutes(), 540);
    }

    #[tokio::test]
    async fn test_check_out_requires_later_check_in() {
        let r = roster().await;
        let attendance = &r.ctx.services.attendance;
        let err = attendance
            .check_out(&r.ravi_claims, ClockRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        attendance
            .check_in(
                &r.ravi_claims,
                ClockRequest {
                    staff_id: None,
                    time: Some(t(10, 0)),
                },
            )
            .await
            .unwrap();
        let err = attendance
            .check_out(
                &r.ravi_claims,
                ClockRequest {
                    staff_id: None,
                    time: Some(t(9, 0)),
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after check_in"));
    }

    #[tokio::test]
    async fn test_staff_cannot_punch_for_others() {
        let r = roster().await;
        let meera = r.ctx.staff(&r.admin, &r.salon, "Meera", &[]).await;
        let request = ClockRequest {
            staff_id: Some(meera.id),
            time: None,
        };
        let err = r
            .ctx
            .services
            .attendance
            .check_in(&r.ravi_claims, request)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(r.ctx.services.attendance.check_in(&r.admin, request).await.is_ok());
    }

    #[tokio::test]
    async fn test_unlinked_account_cannot_check_in() {
        let r = roster().await;
        let (_, other) = r
            .ctx
            .employee(&r.admin, &r.salon, UserRole::Staff, "meera@glow.example")
            .await;
        let err = r
            .ctx
            .services
            .attendance
            .check_in(&other, ClockRequest::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not linked"));
    }

    #[tokio::test]
    async fn test_mark_upserts_and_summarises_month() {
        let r = roster().await;
        let attendance = &r.ctx.services.attendance;
        let mark = |date, status, check_in, check_out| MarkAttendanceRequest {
            staff_id: r.ravi.id,
            date,
            status,
            check_in,
            check_out,
            notes: None,
        };

        attendance
            .mark(&r.admin, mark(day(3), AttendanceStatus::Absent, None, None))
            .await
            .unwrap();
        let corrected = attendance
            .mark(
                &r.admin,
                mark(day(3), AttendanceStatus::Present, Some(t(9, 0)), Some(t(17, 0))),
            )
            .await
            .unwrap();
        assert_eq!(corrected.status, AttendanceStatus::Present);
        attendance
            .mark(&r.admin, mark(day(4), AttendanceStatus::Leave, None, None))
            .await
            .unwrap();
        attendance
            .mark(
                &r.admin,
                mark(day(5), AttendanceStatus::HalfDay, Some(t(9, 0)), Some(t(13, 0))),
            )
            .await
            .unwrap();
        attendance
            .mark(
                &r.admin,
                mark(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), AttendanceStatus::Absent, None, None),
            )
            .await
            .unwrap();

        let summary = attendance.monthly_summary(&r.ravi_claims, r.ravi.id, 2025, 3).await.unwrap();
        assert_eq!(summary.present, 1);
        assert_eq!(summary.absent, 0);
        assert_eq!(summary.leave, 1);
        assert_eq!(summary.half_day, 1);
        assert_eq!(summary.worked_minutes, 8 * 60 + 4 * 60);

        assert_eq!(attendance.list_day(&r.admin, r.salon.id, day(3)).await.unwrap().len(), 1);
        let err = attendance.monthly_summary(&r.admin, r.ravi.id, 2025, 13).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_mark_rejects_inverted_times_and_staff_role() {
        let r = roster().await;
        let request = MarkAttendanceRequest {
            staff_id: r.ravi.id,
            date: day(3),
            status: AttendanceStatus::Present,
            check_in: Some(t(17, 0)),
            check_out: Some(t(9, 0)),
            notes: None,
        };
        let err = r.ctx.services.attendance.mark(&r.admin, request.clone()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = r.ctx.services.attendance.mark(&r.ravi_claims, request).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
