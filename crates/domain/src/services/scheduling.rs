//! Appointment availability.
//!
//! The shop day runs from `open_hour` to `close_hour` (UTC) and is cut into
//! fixed slots. Every service bay can hold one appointment at a time, so an
//! interval has `bays` minus the most appointments running at any one instant
//! within it left.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors raised when booking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    #[error("Appointments cannot be booked in the past")]
    InPast,

    #[error("Appointment must fall within shop hours ({open:02}:00-{close:02}:00)")]
    OutsideHours { open: u32, close: u32 },

    #[error("No bays are free at the requested time")]
    SlotFull,
}

/// Shop hours and capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopHours {
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_minutes: u32,
    pub bays: u32,
}

/// An availability slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub remaining: u32,
}

/// A booked interval that holds a bay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(starts_at: DateTime<Utc>, duration_minutes: i32) -> Self {
        Self {
            starts_at,
            ends_at: starts_at + Duration::minutes(duration_minutes as i64),
        }
    }

    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.starts_at < end && start < self.ends_at
    }
}

/// Most bookings holding a bay at the same instant within `[start, end)`.
///
/// The count only rises where a booking starts, so checking each overlapping
/// booking's start (clamped to `start`) finds the peak.
fn peak_overlap(start: DateTime<Utc>, end: DateTime<Utc>, bookings: &[Booking]) -> u32 {
    let overlapping: Vec<&Booking> = bookings.iter().filter(|b| b.overlaps(start, end)).collect();
    overlapping
        .iter()
        .map(|b| b.starts_at.max(start))
        .map(|instant| {
            overlapping
                .iter()
                .filter(|b| b.starts_at <= instant && instant < b.ends_at)
                .count() as u32
        })
        .max()
        .unwrap_or(0)
}

fn at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let start = Utc.from_utc_datetime(&date.and_time(time));
    // close_hour 24 means midnight of the next day
    if hour >= 24 {
        start + Duration::hours(1)
    } else {
        start
    }
}

impl ShopHours {
    pub fn opens_at(&self, date: NaiveDate) -> DateTime<Utc> {
        at_hour(date, self.open_hour)
    }

    pub fn closes_at(&self, date: NaiveDate) -> DateTime<Utc> {
        at_hour(date, self.close_hour)
    }

    /// Start of each slot on `date`, open to close.
    fn slot_starts(&self, date: NaiveDate) -> Vec<DateTime<Utc>> {
        let step = Duration::minutes(self.slot_minutes.max(1) as i64);
        let close = self.closes_at(date);
        let mut starts = Vec::new();
        let mut cursor = self.opens_at(date);
        while cursor + step <= close {
            starts.push(cursor);
            cursor += step;
        }
        starts
    }

    fn remaining(&self, start: DateTime<Utc>, end: DateTime<Utc>, bookings: &[Booking]) -> u32 {
        self.bays.saturating_sub(peak_overlap(start, end, bookings))
    }

    /// Slots on `date` with their remaining capacity.
    pub fn availability(&self, date: NaiveDate, bookings: &[Booking]) -> Vec<Slot> {
        let step = Duration::minutes(self.slot_minutes.max(1) as i64);
        self.slot_starts(date)
            .into_iter()
            .map(|starts_at| {
                let ends_at = starts_at + step;
                Slot {
                    starts_at,
                    ends_at,
                    remaining: self.remaining(starts_at, ends_at, bookings),
                }
            })
            .collect()
    }

    /// Checks a new booking against the clock, shop hours and capacity.
    ///
    /// `bookings` are the active appointments on the same day.
    pub fn check_booking(
        &self,
        now: DateTime<Utc>,
        requested: Booking,
        bookings: &[Booking],
    ) -> Result<(), SchedulingError> {
        if requested.starts_at <= now {
            return Err(SchedulingError::InPast);
        }

        let date = requested.starts_at.date_naive();
        if requested.starts_at < self.opens_at(date) || requested.ends_at > self.closes_at(date) {
            return Err(SchedulingError::OutsideHours {
                open: self.open_hour,
                close: self.close_hour,
            });
        }

        if self.remaining(requested.starts_at, requested.ends_at, bookings) == 0 {
            return Err(SchedulingError::SlotFull);
        }
        Ok(())
    }
}

/// Whether `at` falls on a slot boundary.
pub fn is_slot_aligned(at: DateTime<Utc>, slot_minutes: u32) -> bool {
    let minutes = at.hour() * 60 + at.minute();
    at.second() == 0 && slot_minutes > 0 && minutes % slot_minutes == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours() -> ShopHours {
        ShopHours {
            open_hour: 8,
            close_hour: 17,
            slot_minutes: 60,
            bays: 2,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 12).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 12, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_slots_cover_shop_day() {
        let slots = hours().availability(date(), &[]);
        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0].starts_at, at(8, 0));
        assert_eq!(slots[8].ends_at, at(17, 0));
        assert!(slots.iter().all(|s| s.remaining == 2));
    }

    #[test]
    fn test_overlapping_bookings_reduce_capacity() {
        let bookings = [Booking::new(at(9, 30), 90), Booking::new(at(10, 0), 60)];
        let slots = hours().availability(date(), &bookings);
        // 09:00-10:00 overlaps the 09:30 booking only
        assert_eq!(slots[1].remaining, 1);
        // 10:00-11:00 overlaps both
        assert_eq!(slots[2].remaining, 0);
        // 11:00-12:00 overlaps neither; the first ends exactly at 11:00
        assert_eq!(slots[3].remaining, 2);
    }

    #[test]
    fn test_check_booking() {
        let now = at(7, 0);
        let shop = hours();
        assert_eq!(shop.check_booking(now, Booking::new(at(9, 0), 60), &[]), Ok(()));
        assert_eq!(
            shop.check_booking(at(10, 0), Booking::new(at(9, 0), 60), &[]),
            Err(SchedulingError::InPast)
        );
        assert_eq!(
            shop.check_booking(now, Booking::new(at(16, 30), 60), &[]),
            Err(SchedulingError::OutsideHours { open: 8, close: 17 })
        );

        let full = [Booking::new(at(9, 0), 60), Booking::new(at(9, 0), 120)];
        assert_eq!(
            shop.check_booking(now, Booking::new(at(9, 0), 60), &full),
            Err(SchedulingError::SlotFull)
        );
    }

    #[test]
    fn test_back_to_back_bookings_leave_a_bay_for_long_jobs() {
        let shop = hours();
        let bookings = [Booking::new(at(9, 0), 60), Booking::new(at(10, 0), 60)];

        let slots = shop.availability(date(), &bookings);
        assert_eq!(slots[1].remaining, 1);
        assert_eq!(slots[2].remaining, 1);

        // Only one bay is ever in use between 09:00 and 11:00
        assert_eq!(
            shop.check_booking(at(7, 0), Booking::new(at(9, 0), 120), &bookings),
            Ok(())
        );

        let with_long = [bookings[0], bookings[1], Booking::new(at(9, 0), 120)];
        assert_eq!(
            shop.check_booking(at(7, 0), Booking::new(at(10, 0), 60), &with_long),
            Err(SchedulingError::SlotFull)
        );
    }

    #[test]
    fn test_sequential_bookings_within_a_slot() {
        let bookings = [Booking::new(at(9, 0), 30), Booking::new(at(9, 30), 30)];
        let slots = hours().availability(date(), &bookings);
        assert_eq!(slots[1].remaining, 1);
    }

    #[test]
    fn test_slot_alignment() {
        assert!(is_slot_aligned(at(9, 30), 30));
        assert!(!is_slot_aligned(at(9, 15), 30));
    }

    #[test]
    fn test_close_at_midnight() {
        let shop = ShopHours {
            open_hour: 22,
            close_hour: 24,
            slot_minutes: 30,
            bays: 1,
        };
        assert_eq!(shop.availability(date(), &[]).len(), 4);
    }
}
