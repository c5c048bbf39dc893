//! Feed positions: 1-based quarter-hour slots of a delivery day.
//!
//! The feed day is shifted by one hour: position 1 starts at 01:00 local time,
//! and positions 93 to 96 fall on the first hour of the next calendar day.

use chrono::{DateTime, Local, MappedLocalTime, NaiveDate, TimeDelta, Timelike};

use crate::{core::quarter, quantity::price::MegawattHourPrice};

#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
)]
pub struct Position(pub u32);

impl Position {
    pub const FIRST: Self = Self(1);

    /// Last position of the longest feed day, the one with the extra hour.
    pub const LAST: Self = Self(100);

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Start of the slot on the specified feed day.
    ///
    /// Returns [`None`] for position zero and for the non-existent local times.
    pub fn to_timestamp(self, day: NaiveDate) -> Option<DateTime<Local>> {
        let offset = i64::from(self.0.checked_sub(1)?) * quarter::MINUTES;
        day_start(day)?.checked_add_signed(TimeDelta::minutes(offset))
    }
}

/// One point of a feed series.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Constructor)]
pub struct SeriesPoint {
    pub position: Position,
    pub price: MegawattHourPrice,
}

/// Start of the first position of the feed day.
pub fn day_start(day: NaiveDate) -> Option<DateTime<Local>> {
    match day.and_hms_opt(1, 0, 0)?.and_local_timezone(Local) {
        MappedLocalTime::Single(start_time) | MappedLocalTime::Ambiguous(start_time, _) => {
            Some(start_time)
        }
        MappedLocalTime::None => None,
    }
}

/// Feed day which publishes the price for the specified time.
pub fn feed_day_of(time: DateTime<Local>) -> NaiveDate {
    let date = time.date_naive();
    if time.hour() < 1 { date.pred_opt().unwrap_or(date) } else { date }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const DAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    #[test]
    fn test_first_position() {
        assert_eq!(
            Position(1).to_timestamp(DAY),
            Some(Local.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap()),
        );
    }

    #[test]
    fn test_fourth_position() {
        assert_eq!(
            Position(4).to_timestamp(DAY),
            Some(Local.with_ymd_and_hms(2025, 1, 1, 1, 45, 0).unwrap()),
        );
    }

    #[test]
    fn test_position_92_is_linear() {
        assert_eq!(
            Position(92).to_timestamp(DAY),
            Some(Local.with_ymd_and_hms(2025, 1, 1, 23, 45, 0).unwrap()),
        );
    }

    #[test]
    fn test_position_rolls_over_midnight() {
        assert_eq!(
            Position(93).to_timestamp(DAY),
            Some(Local.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
        );
        assert_eq!(
            Position(96).to_timestamp(DAY),
            Some(Local.with_ymd_and_hms(2025, 1, 2, 0, 45, 0).unwrap()),
        );
    }

    #[test]
    fn test_position_zero() {
        assert_eq!(Position(0).to_timestamp(DAY), None);
    }

    #[test]
    fn test_feed_day_of() {
        let time = Local.with_ymd_and_hms(2025, 1, 2, 0, 45, 0).unwrap();
        assert_eq!(feed_day_of(time), DAY);
        let time = Local.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap();
        assert_eq!(feed_day_of(time), DAY);
    }
}
