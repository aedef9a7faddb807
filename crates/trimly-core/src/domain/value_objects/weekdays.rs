//! Set of weekdays, used for salon working days and staff weekly offs.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Bit set of weekdays. Bit 0 is Monday.
///
/// Serialized as a list of day names (`["Mon", "Tue"]`); stored as the raw
/// bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// No days.
    pub const EMPTY: Self = Self(0);
    /// Monday through Saturday.
    pub const MON_TO_SAT: Self = Self(0b0011_1111);

    /// Builds a set from its stored bitmask; unknown bits are dropped.
    #[must_use]
    pub const fn from_bits(bits: i16) -> Self {
        Self((bits & 0x7f) as u8)
    }

    /// Returns the stored bitmask.
    #[must_use]
    pub const fn bits(&self) -> i16 {
        self.0 as i16
    }

    /// Checks membership.
    #[must_use]
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Checks whether the weekday of `date` is in the set.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }

    /// Adds a day.
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    /// Returns true when no day is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates over the contained days, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_DAYS.into_iter().filter(|day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<Weekday>> for WeekdaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}
