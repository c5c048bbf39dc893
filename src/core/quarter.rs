use chrono::{DateTime, DurationRound, Local, TimeDelta};

pub const MINUTES: i64 = 15;

/// Truncate the time to the enclosing quarter-hour boundary.
pub fn floor(time: DateTime<Local>) -> DateTime<Local> {
    time.duration_trunc(TimeDelta::minutes(MINUTES)).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    #[test]
    fn test_floor() {
        let time = Local.with_ymd_and_hms(2025, 1, 1, 13, 44, 59).unwrap();
        let time = time.with_nanosecond(123_456_789).unwrap();
        assert_eq!(floor(time), Local.with_ymd_and_hms(2025, 1, 1, 13, 30, 0).unwrap());
    }

    #[test]
    fn test_floor_aligned() {
        let time = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(floor(time), time);
    }
}
