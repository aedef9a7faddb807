//! Booking rules and slot search.
//!
//! Everything here is pure. Callers load the salon, staff, services, attendance
//! and the day's appointments; these functions only decide. Each check returns
//! the error a client sees when it fails, so the order in which the booking
//! service calls them is the order in which problems are reported.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use trimly_core::{
    Appointment, AppointmentId, Attendance, Salon, SalonId, SalonService, ServiceId, Staff, StaffId,
    TimeSlot, TrimlyError, TrimlyResult,
};

/// The requested services resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBundle {
    pub service_ids: Vec<ServiceId>,
    pub duration_minutes: i64,
    pub total_price: Decimal,
}

/// Resolves `requested` against the services loaded from storage.
///
/// The list must be non-empty and free of duplicates, and every id must be an
/// active service of the salon. Duration and price are summed.
pub fn bundle_services(
    salon_id: SalonId,
    requested: &[ServiceId],
    found: &[SalonService],
) -> TrimlyResult<ServiceBundle> {
    if requested.is_empty() {
        return Err(TrimlyError::validation("At least one service is required"));
    }

    let mut seen = HashSet::with_capacity(requested.len());
    if let Some(duplicate) = requested.iter().find(|id| !seen.insert(**id)) {
        return Err(TrimlyError::validation(format!(
            "Service {duplicate} is listed more than once"
        )));
    }

    let mut duration_minutes = 0i64;
    let mut total_price = Decimal::ZERO;
    for id in requested {
        let service = found
            .iter()
            .find(|s| s.id == *id && s.salon_id == salon_id)
            .ok_or_else(|| TrimlyError::validation(format!("Service {id} is not offered by this salon")))?;
        if !service.is_active {
            return Err(TrimlyError::business_rule(format!(
                "Service '{}' is not currently offered",
                service.name
            )));
        }
        duration_minutes += i64::from(service.duration_minutes);
        total_price += service.price;
    }

    Ok(ServiceBundle {
        service_ids: requested.to_vec(),
        duration_minutes,
        total_price,
    })
}

/// The salon must be open on `date`: not a holiday and a working weekday.
pub fn check_open_on(salon: &Salon, date: NaiveDate) -> TrimlyResult<()> {
    if salon.is_holiday(date) {
        return Err(TrimlyError::business_rule(format!(
            "Salon is closed for a holiday on {date}"
        )));
    }
    if !salon.is_working_day(date) {
        return Err(TrimlyError::business_rule(format!(
            "Salon is closed on {}",
            date.format("%A")
        )));
    }
    Ok(())
}

/// `date` must be within the advance window and `start` not in the past,
/// both measured in salon-local time.
pub fn check_booking_window(
    salon: &Salon,
    date: NaiveDate,
    start: NaiveTime,
    now: DateTime<Utc>,
    max_advance_days: i64,
) -> TrimlyResult<()> {
    let local_now = salon.local_time(now);
    if date > local_now.date() + Duration::days(max_advance_days) {
        return Err(TrimlyError::business_rule(format!(
            "Bookings can be made at most {max_advance_days} days ahead"
        )));
    }
    if date.and_time(start) < local_now {
        return Err(TrimlyError::business_rule("Cannot book a time in the past"));
    }
    Ok(())
}

/// Builds `[start, start + duration)` and checks it fits the opening hours.
pub fn slot_in_hours(salon: &Salon, start: NaiveTime, duration_minutes: i64) -> TrimlyResult<TimeSlot> {
    let slot = TimeSlot::starting_at(start, duration_minutes)
        .ok_or_else(|| TrimlyError::business_rule("Appointment must end on the same day"))?;
    if !slot.within(salon.opening_time, salon.closing_time) {
        return Err(TrimlyError::business_rule(format!(
            "Appointment {}-{} is outside opening hours {}-{}",
            slot.start.format("%H:%M"),
            slot.end.format("%H:%M"),
            salon.opening_time.format("%H:%M"),
            salon.closing_time.format("%H:%M"),
        )));
    }
    Ok(slot)
}

/// The staff member must work at the salon, be active and present on `date`,
/// and perform every requested service.
pub fn check_staff_eligible(
    salon: &Salon,
    staff: &Staff,
    date: NaiveDate,
    attendance: Option<&Attendance>,
    services: &[ServiceId],
) -> TrimlyResult<()> {
    if staff.salon_id != salon.id {
        return Err(TrimlyError::validation(format!(
            "Staff member {} does not work at this salon",
            staff.id
        )));
    }
    if !staff.is_active {
        return Err(TrimlyError::business_rule(format!("{} is not active", staff.name)));
    }
    if staff.is_off_on(date) {
        return Err(TrimlyError::business_rule(format!(
            "{} is off on {}",
            staff.name,
            date.format("%A")
        )));
    }
    if let Some(record) = attendance.filter(|a| a.status.is_unavailable()) {
        return Err(TrimlyError::business_rule(format!(
            "{} is marked {} on {date}",
            staff.name, record.status
        )));
    }
    if !staff.performs_all(services) {
        return Err(TrimlyError::business_rule(format!(
            "{} does not perform every requested service",
            staff.name
        )));
    }
    Ok(())
}

/// Whether `slot` is clear of every appointment that still holds its time.
#[must_use]
pub fn is_free(slot: &TimeSlot, booked: &[Appointment], exclude: Option<AppointmentId>) -> bool {
    clash(slot, booked, exclude).is_none()
}

fn clash<'a>(slot: &TimeSlot, booked: &'a [Appointment], exclude: Option<AppointmentId>) -> Option<&'a Appointment> {
    booked
        .iter()
        .filter(|a| Some(a.id) != exclude && a.status.blocks_slot())
        .find(|a| a.slot().overlaps(slot))
}

/// `slot` must not overlap the staff member's other live appointments.
pub fn check_no_overlap(slot: &TimeSlot, booked: &[Appointment], exclude: Option<AppointmentId>) -> TrimlyResult<()> {
    match clash(slot, booked, exclude) {
        Some(existing) => Err(TrimlyError::conflict(format!(
            "Staff member is already booked from {} to {}",
            existing.start_time.format("%H:%M"),
            existing.end_time.format("%H:%M"),
        ))),
        None => Ok(()),
    }
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight().div_ceil(60)
}

fn time_of(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0)
}

/// Start times of the salon's booking grid: every slot interval from opening,
/// up to closing. With `not_before`, earlier starts are skipped, which rounds
/// `not_before` up to the next grid point.
pub fn grid_starts(salon: &Salon, not_before: Option<NaiveTime>) -> impl Iterator<Item = NaiveTime> {
    let open = minutes_of(salon.opening_time);
    let close = minutes_of(salon.closing_time);
    let step = usize::try_from(salon.slot_interval_minutes.max(1)).unwrap_or(1);
    let floor = not_before.map_or(0, minutes_of);
    (open..close)
        .step_by(step)
        .filter(move |m| *m >= floor)
        .filter_map(time_of)
}

/// A staff member able to take the booking, with that day's appointments.
#[derive(Debug, Clone)]
pub struct StaffDay {
    pub staff: Staff,
    pub appointments: Vec<Appointment>,
}

impl StaffDay {
    /// Appointments holding time that day.
    #[must_use]
    pub fn booking_count(&self) -> usize {
        self.appointments.iter().filter(|a| a.status.blocks_slot()).count()
    }
}

/// A free grid slot and the staff who could take it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub staff_ids: Vec<StaffId>,
}

/// Every grid slot of `duration_minutes` inside opening hours where at least
/// one candidate is free for the whole duration.
#[must_use]
pub fn available_slots(
    salon: &Salon,
    duration_minutes: i64,
    candidates: &[StaffDay],
    not_before: Option<NaiveTime>,
) -> Vec<AvailableSlot> {
    grid_starts(salon, not_before)
        .map_while(|start| {
            TimeSlot::starting_at(start, duration_minutes)
                .filter(|slot| slot.within(salon.opening_time, salon.closing_time))
        })
        .filter_map(|slot| {
            let staff_ids: Vec<StaffId> = candidates
                .iter()
                .filter(|c| is_free(&slot, &c.appointments, None))
                .map(|c| c.staff.id)
                .collect();
            (!staff_ids.is_empty()).then_some(AvailableSlot {
                start_time: slot.start,
                end_time: slot.end,
                staff_ids,
            })
        })
        .collect()
}

/// Picks the walk-in slot: the earliest grid start at or after `not_before`
/// where a candidate is free. Among free candidates the one with fewer
/// bookings that day wins, then the lowest id.
#[must_use]
pub fn allocate_walk_in(
    salon: &Salon,
    duration_minutes: i64,
    candidates: &[StaffDay],
    not_before: NaiveTime,
) -> Option<(StaffId, TimeSlot)> {
    grid_starts(salon, Some(not_before))
        .map_while(|start| {
            TimeSlot::starting_at(start, duration_minutes)
                .filter(|slot| slot.within(salon.opening_time, salon.closing_time))
        })
        .find_map(|slot| {
            candidates
                .iter()
                .filter(|c| is_free(&slot, &c.appointments, None))
                .min_by_key(|c| (c.booking_count(), c.staff.id))
                .map(|c| (c.staff.id, slot))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use trimly_core::{
        AppointmentKind, AppointmentStatus, AttendanceStatus, CustomerDetails, SalonSchedule, UserId,
        WeekdaySet,
    };

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
    }

    // 2025-03-10 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn salon() -> Salon {
        Salon::new(
            UserId::new(),
            "Glow".into(),
            SalonSchedule {
                opening_time: t(9, 0),
                closing_time: t(12, 0),
                working_days: WeekdaySet::MON_TO_SAT,
                slot_interval_minutes: 30,
                utc_offset_minutes: 0,
            },
            now(),
        )
        .unwrap()
    }

    fn service(salon: &Salon, minutes: i32, price: Decimal) -> SalonService {
        SalonService::new(salon.id, None, format!("{minutes} min"), minutes, price, now())
    }

    fn staff(salon: &Salon, services: &[ServiceId]) -> Staff {
        let mut s = Staff::new(salon.id, "Ravi".into(), now());
        s.service_ids = services.to_vec();
        s
    }

    fn booked(salon: &Salon, staff: &Staff, start: NaiveTime, minutes: i64) -> Appointment {
        Appointment::new(
            salon.id,
            staff.id,
            vec![ServiceId::new()],
            monday(),
            TimeSlot::starting_at(start, minutes).unwrap(),
            dec!(10),
            CustomerDetails {
                name: "Guest".into(),
                ..CustomerDetails::default()
            },
            AppointmentKind::Scheduled,
            now(),
        )
    }

    #[test]
    fn test_bundle_sums_duration_and_price() {
        let salon = salon();
        let cut = service(&salon, 30, dec!(25));
        let wash = service(&salon, 15, dec!(7.50));
        let bundle = bundle_services(salon.id, &[cut.id, wash.id], &[wash.clone(), cut.clone()]).unwrap();
        assert_eq!(bundle.duration_minutes, 45);
        assert_eq!(bundle.total_price, dec!(32.50));
        assert_eq!(bundle.service_ids, vec![cut.id, wash.id]);
    }

    #[test]
    fn test_bundle_rejects_empty_duplicate_foreign_and_inactive() {
        let salon = salon();
        let other = salon_with_offset(0);
        let cut = service(&salon, 30, dec!(25));
        let foreign = service(&other, 30, dec!(25));
        let mut retired = service(&salon, 30, dec!(25));
        retired.is_active = false;
        let all = vec![cut.clone(), foreign.clone(), retired.clone()];

        assert_eq!(bundle_services(salon.id, &[], &all).unwrap_err().status_code(), 400);
        let dup = bundle_services(salon.id, &[cut.id, cut.id], &all).unwrap_err();
        assert!(dup.to_string().contains("more than once"));
        let foreign_err = bundle_services(salon.id, &[foreign.id], &all).unwrap_err();
        assert!(foreign_err.to_string().contains("not offered"));
        let retired_err = bundle_services(salon.id, &[retired.id], &all).unwrap_err();
        assert_eq!(retired_err.error_code(), "BUSINESS_RULE_VIOLATION");
    }

    fn salon_with_offset(offset: i32) -> Salon {
        let mut s = salon();
        s.utc_offset_minutes = offset;
        s
    }

    #[test]
    fn test_closed_days() {
        let mut salon = salon();
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        assert!(check_open_on(&salon, monday()).is_ok());
        assert!(check_open_on(&salon, sunday).unwrap_err().to_string().contains("Sunday"));

        salon.add_holidays(&[monday()], now());
        assert!(check_open_on(&salon, monday()).unwrap_err().to_string().contains("holiday"));
    }

    #[test]
    fn test_booking_window_uses_salon_local_time() {
        // 08:00 UTC is 13:30 in a +05:30 salon.
        let salon = salon_with_offset(330);
        assert!(check_booking_window(&salon, monday(), t(13, 0), now(), 90).is_err());
        assert!(check_booking_window(&salon, monday(), t(14, 0), now(), 90).is_ok());

        let utc_salon = salon_with_offset(0);
        assert!(check_booking_window(&utc_salon, monday(), t(9, 0), now(), 90).is_ok());
        let too_far = monday() + Duration::days(91);
        assert!(check_booking_window(&utc_salon, too_far, t(9, 0), now(), 90)
            .unwrap_err()
            .to_string()
            .contains("90 days"));
    }

    #[test]
    fn test_slot_must_fit_opening_hours() {
        let salon = salon();
        assert_eq!(slot_in_hours(&salon, t(11, 30), 30).unwrap().end, t(12, 0));
        assert!(slot_in_hours(&salon, t(11, 45), 30).is_err());
        assert!(slot_in_hours(&salon, t(8, 30), 30).is_err());
        assert!(slot_in_hours(&salon, t(23, 30), 60)
            .unwrap_err()
            .to_string()
            .contains("same day"));
    }

    #[test]
    fn test_staff_eligibility() {
        let salon = salon();
        let cut = ServiceId::new();
        let mut ravi = staff(&salon, &[cut]);
        assert!(check_staff_eligible(&salon, &ravi, monday(), None, &[cut]).is_ok());
        assert!(check_staff_eligible(&salon, &ravi, monday(), None, &[cut, ServiceId::new()]).is_err());

        let leave = Attendance::new(salon.id, ravi.id, monday(), AttendanceStatus::Leave, now());
        assert!(check_staff_eligible(&salon, &ravi, monday(), Some(&leave), &[cut])
            .unwrap_err()
            .to_string()
            .contains("leave"));
        let half = Attendance::new(salon.id, ravi.id, monday(), AttendanceStatus::HalfDay, now());
        assert!(check_staff_eligible(&salon, &ravi, monday(), Some(&half), &[cut]).is_ok());

        ravi.weekly_off = [chrono::Weekday::Mon].into_iter().collect();
        assert!(check_staff_eligible(&salon, &ravi, monday(), None, &[cut]).is_err());

        let elsewhere = staff(&salon_with_offset(0), &[cut]);
        assert_eq!(
            check_staff_eligible(&salon, &elsewhere, monday(), None, &[cut])
                .unwrap_err()
                .status_code(),
            400
        );
    }

    #[test]
    fn test_overlap_ignores_touching_and_released_slots() {
        let salon = salon();
        let ravi = staff(&salon, &[]);
        let mut existing = vec![booked(&salon, &ravi, t(10, 0), 30)];

        let touching = TimeSlot::starting_at(t(10, 30), 30).unwrap();
        assert!(check_no_overlap(&touching, &existing, None).is_ok());

        let clashing = TimeSlot::starting_at(t(10, 15), 30).unwrap();
        assert_eq!(check_no_overlap(&clashing, &existing, None).unwrap_err().status_code(), 409);
        assert!(check_no_overlap(&clashing, &existing, Some(existing[0].id)).is_ok());

        existing[0].status = AppointmentStatus::NoShow;
        assert!(check_no_overlap(&clashing, &existing, None).is_ok());
    }

    #[test]
    fn test_grid_rounds_up_to_interval() {
        let salon = salon();
        let all: Vec<_> = grid_starts(&salon, None).collect();
        assert_eq!(all, vec![t(9, 0), t(9, 30), t(10, 0), t(10, 30), t(11, 0), t(11, 30)]);

        let from: Vec<_> = grid_starts(&salon, Some(t(10, 1))).collect();
        assert_eq!(from.first(), Some(&t(10, 30)));
        let early: Vec<_> = grid_starts(&salon, Some(t(7, 0))).collect();
        assert_eq!(early.first(), Some(&t(9, 0)));
    }

    #[test]
    fn test_available_slots_lists_free_staff() {
        let salon = salon();
        let ravi = staff(&salon, &[]);
        let meera = staff(&salon, &[]);
        let candidates = vec![
            StaffDay {
                appointments: vec![booked(&salon, &ravi, t(9, 0), 60)],
                staff: ravi.clone(),
            },
            StaffDay {
                appointments: vec![booked(&salon, &meera, t(9, 30), 60)],
                staff: meera.clone(),
            },
        ];

        let slots = available_slots(&salon, 60, &candidates, None);
        let starts: Vec<_> = slots.iter().map(|s| s.start_time).collect();
        // 09:00 and 09:30 clash for both; 11:30 would run past closing.
        assert_eq!(starts, vec![t(10, 0), t(10, 30), t(11, 0)]);
        assert_eq!(slots[0].staff_ids, vec![ravi.id]);
        assert_eq!(slots[1].staff_ids.len(), 2);

        let later = available_slots(&salon, 60, &candidates, Some(t(10, 45)));
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].start_time, t(11, 0));
    }

    #[test]
    fn test_walk_in_prefers_earliest_then_least_busy_then_lowest_id() {
        let salon = salon();
        let first = staff(&salon, &[]);
        let second = staff(&salon, &[]);
        assert!(first.id < second.id);

        // Both free at 10:00; `first` already has two bookings, `second` one.
        let candidates = vec![
            StaffDay {
                appointments: vec![
                    booked(&salon, &first, t(9, 0), 30),
                    booked(&salon, &first, t(11, 0), 30),
                ],
                staff: first.clone(),
            },
            StaffDay {
                appointments: vec![booked(&salon, &second, t(9, 0), 60)],
                staff: second.clone(),
            },
        ];
        let (chosen, slot) = allocate_walk_in(&salon, 30, &candidates, t(9, 40)).unwrap();
        assert_eq!(slot.start, t(10, 0));
        assert_eq!(chosen, second.id);

        let idle = vec![
            StaffDay {
                appointments: vec![],
                staff: second.clone(),
            },
            StaffDay {
                appointments: vec![],
                staff: first.clone(),
            },
        ];
        let (chosen, _) = allocate_walk_in(&salon, 30, &idle, t(9, 0)).unwrap();
        assert_eq!(chosen, first.id);
    }

    #[test]
    fn test_walk_in_none_when_day_is_over() {
        let salon = salon();
        let ravi = staff(&salon, &[]);
        let candidates = vec![StaffDay {
            appointments: vec![],
            staff: ravi,
        }];
        assert!(allocate_walk_in(&salon, 30, &candidates, t(11, 31)).is_none());
        assert!(allocate_walk_in(&salon, 240, &candidates, t(9, 0)).is_none());
    }
}
