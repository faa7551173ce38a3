//! Quarter-hour normalization and time ranges

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Granularity every slot and booking boundary is aligned to
pub const GRANULARITY_MINUTES: u32 = 15;

/// Shortest slot or booking accepted
pub fn min_duration() -> Duration {
    Duration::minutes(GRANULARITY_MINUTES as i64)
}

/// Floor a timestamp to the preceding quarter hour, dropping seconds and
/// sub-second precision.
pub fn normalize(t: DateTime<Utc>) -> DateTime<Utc> {
    let excess_minutes = t.minute() % GRANULARITY_MINUTES;
    t - Duration::minutes(excess_minutes as i64)
        - Duration::seconds(t.second() as i64)
        - Duration::nanoseconds(t.nanosecond() as i64)
}

/// A half-open `[start, end)` interval with quarter-hour aligned bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Normalize raw request times and validate the resulting range.
    ///
    /// A reversed or empty request is `InvalidRange`; a forward request that
    /// normalizes to less than one quarter hour (including zero) is `TooShort`.
    pub fn normalized(raw_start: DateTime<Utc>, raw_end: DateTime<Utc>) -> Result<Self, SchedulingError> {
        if raw_start >= raw_end {
            return Err(SchedulingError::InvalidRange);
        }

        let start = normalize(raw_start);
        let end = normalize(raw_end);

        if end - start < min_duration() {
            return Err(SchedulingError::TooShort);
        }

        Ok(Self { start, end })
    }

    /// Wrap bounds already validated on the way in (e.g. loaded from storage)
    pub fn from_normalized(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Half-open overlap: touching ranges do not overlap
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies within this range, bounds inclusive
    pub fn contains(&self, other: &TimeRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, s).unwrap()
    }

    /// Start-inside, end-inside or covers formulation of overlap
    fn three_way(a: &TimeRange, b: &TimeRange) -> bool {
        (a.start >= b.start && a.start < b.end)
            || (a.end > b.start && a.end <= b.end)
            || (a.start <= b.start && a.end >= b.end)
    }

    #[test]
    fn test_normalize_floors_to_quarter_hour() {
        assert_eq!(normalize(at(9, 7, 42)), at(9, 0, 0));
        assert_eq!(normalize(at(10, 2, 0)), at(10, 0, 0));
        assert_eq!(normalize(at(10, 59, 59)), at(10, 45, 0));
        assert_eq!(normalize(at(10, 30, 0)), at(10, 30, 0));
    }

    #[test]
    fn test_normalize_drops_subseconds() {
        let t = at(11, 16, 5) + Duration::milliseconds(750);
        assert_eq!(normalize(t), at(11, 15, 0));
    }

    #[test]
    fn test_normalize_properties_over_a_day() {
        let base = at(0, 0, 0);
        for step in 0..(24 * 60 * 6) {
            let t = base + Duration::seconds(step * 10 + 3);
            let n = normalize(t);
            assert_eq!(n.minute() % 15, 0);
            assert_eq!(n.second(), 0);
            assert!(n <= t);
            assert!(t - n < Duration::minutes(15));
            assert_eq!(normalize(n), n);
        }
    }

    #[test]
    fn test_normalized_range_accepts_rounded_hour() {
        let range = TimeRange::normalized(at(9, 7, 0), at(10, 2, 0)).unwrap();
        assert_eq!(range.start, at(9, 0, 0));
        assert_eq!(range.end, at(10, 0, 0));
    }

    #[test]
    fn test_normalized_range_rejects_short_span() {
        // 09:00-09:10 collapses to 09:00-09:00
        assert_eq!(
            TimeRange::normalized(at(9, 0, 0), at(9, 10, 0)),
            Err(SchedulingError::TooShort)
        );
        assert_eq!(
            TimeRange::normalized(at(9, 0, 0), at(9, 0, 0)),
            Err(SchedulingError::InvalidRange)
        );
        assert_eq!(
            TimeRange::normalized(at(10, 0, 0), at(9, 0, 0)),
            Err(SchedulingError::InvalidRange)
        );
        assert!(TimeRange::normalized(at(9, 0, 0), at(9, 15, 0)).is_ok());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = TimeRange::from_normalized(at(9, 0, 0), at(9, 30, 0));
        let b = TimeRange::from_normalized(at(9, 15, 0), at(9, 45, 0));
        let c = TimeRange::from_normalized(at(9, 30, 0), at(10, 0, 0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_overlap_matches_three_way_check() {
        let quarters: Vec<DateTime<Utc>> = (0..8).map(|q| at(9, 0, 0) + Duration::minutes(15 * q)).collect();
        let mut ranges = Vec::new();
        for (i, s) in quarters.iter().enumerate() {
            for e in &quarters[i + 1..] {
                ranges.push(TimeRange::from_normalized(*s, *e));
            }
        }
        for a in &ranges {
            for b in &ranges {
                assert_eq!(a.overlaps(b), three_way(a, b), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_contains_is_inclusive() {
        let slot = TimeRange::from_normalized(at(9, 0, 0), at(10, 0, 0));
        assert!(slot.contains(&slot));
        assert!(slot.contains(&TimeRange::from_normalized(at(9, 30, 0), at(10, 0, 0))));
        assert!(!slot.contains(&TimeRange::from_normalized(at(8, 45, 0), at(9, 30, 0))));
        assert!(!slot.contains(&TimeRange::from_normalized(at(9, 45, 0), at(10, 15, 0))));
    }
}
