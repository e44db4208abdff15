//! Temporal intervals added to or subtracted from dates and times.

use chrono::{Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Unit of one interval component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    /// Microseconds.
    Microseconds,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
    /// Weeks.
    Weeks,
    /// Months.
    Months,
    /// Quarters.
    Quarters,
    /// Years.
    Years,
    /// Decades.
    Decades,
    /// Centuries.
    Centuries,
    /// Millennia.
    Millennia,
}

impl IntervalUnit {
    /// Singular SQL keyword for the unit.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Microseconds => "MICROSECOND",
            Self::Milliseconds => "MILLISECOND",
            Self::Seconds => "SECOND",
            Self::Minutes => "MINUTE",
            Self::Hours => "HOUR",
            Self::Days => "DAY",
            Self::Weeks => "WEEK",
            Self::Months => "MONTH",
            Self::Quarters => "QUARTER",
            Self::Years => "YEAR",
            Self::Decades => "DECADE",
            Self::Centuries => "CENTURY",
            Self::Millennia => "MILLENNIUM",
        }
    }

    /// Number of months per unit, for calendar units.
    #[must_use]
    pub const fn months(self) -> Option<i64> {
        match self {
            Self::Months => Some(1),
            Self::Quarters => Some(3),
            Self::Years => Some(12),
            Self::Decades => Some(120),
            Self::Centuries => Some(1_200),
            Self::Millennia => Some(12_000),
            _ => None,
        }
    }

    /// Number of microseconds per unit, for clock units.
    #[must_use]
    pub const fn micros(self) -> Option<i64> {
        match self {
            Self::Microseconds => Some(1),
            Self::Milliseconds => Some(1_000),
            Self::Seconds => Some(1_000_000),
            Self::Minutes => Some(60_000_000),
            Self::Hours => Some(3_600_000_000),
            Self::Days => Some(86_400_000_000),
            Self::Weeks => Some(604_800_000_000),
            _ => None,
        }
    }
}

/// A sum of `(amount, unit)` components, e.g. `1 YEAR 2 DAYS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Interval {
    parts: Vec<(i64, IntervalUnit)>,
}

impl Interval {
    /// An interval of one component.
    #[must_use]
    pub fn new(amount: i64, unit: IntervalUnit) -> Self {
        Self {
            parts: vec![(amount, unit)],
        }
    }

    /// Adds another component.
    #[must_use]
    pub fn and(mut self, amount: i64, unit: IntervalUnit) -> Self {
        self.parts.push((amount, unit));
        self
    }

    /// The components in declaration order.
    #[must_use]
    pub fn parts(&self) -> &[(i64, IntervalUnit)] {
        &self.parts
    }

    /// Returns the single component, or `None` for multi-unit intervals.
    #[must_use]
    pub fn single(&self) -> Option<(i64, IntervalUnit)> {
        match self.parts.as_slice() {
            [part] => Some(*part),
            _ => None,
        }
    }

    /// The interval with every amount negated.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            parts: self.parts.iter().map(|(n, u)| (-n, *u)).collect(),
        }
    }

    /// Adds this interval to a datetime.
    ///
    /// Calendar units are applied first, clamping to the end of the month,
    /// then clock units.
    #[must_use]
    pub fn add_to(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut months = 0_i64;
        let mut micros = 0_i64;
        for (amount, unit) in &self.parts {
            if let Some(m) = unit.months() {
                months = months.checked_add(amount.checked_mul(m)?)?;
            } else if let Some(us) = unit.micros() {
                micros = micros.checked_add(amount.checked_mul(us)?)?;
            }
        }
        let shifted = if months >= 0 {
            dt.checked_add_months(Months::new(u32::try_from(months).ok()?))?
        } else {
            dt.checked_sub_months(Months::new(u32::try_from(-months).ok()?))?
        };
        shifted.checked_add_signed(Duration::microseconds(micros))
    }

    /// Adds this interval to a date; the result keeps only the date part.
    #[must_use]
    pub fn add_to_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.add_to(date.and_time(NaiveTime::MIN)).map(|dt| dt.date())
    }

    /// Adds this interval to a time of day, wrapping at midnight.
    #[must_use]
    pub fn add_to_time(&self, time: NaiveTime) -> Option<NaiveTime> {
        let micros: i64 = self
            .parts
            .iter()
            .filter_map(|(amount, unit)| unit.micros().map(|us| amount * us))
            .sum();
        Some(time.overflowing_add_signed(Duration::microseconds(micros)).0)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .parts
            .iter()
            .map(|(n, u)| format!("{n} {}", u.keyword()))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_add_months_clamps() {
        let interval = Interval::new(1, IntervalUnit::Months);
        assert_eq!(interval.add_to(dt(2024, 1, 31)), Some(dt(2024, 2, 29)));
    }

    #[test]
    fn test_add_mixed_units() {
        let interval = Interval::new(1, IntervalUnit::Years).and(2, IntervalUnit::Days);
        assert_eq!(interval.add_to(dt(2023, 3, 1)), Some(dt(2024, 3, 3)));
        assert_eq!(interval.to_string(), "1 YEAR 2 DAY");
    }

    #[test]
    fn test_negate() {
        let interval = Interval::new(3, IntervalUnit::Days).negate();
        assert_eq!(interval.add_to(dt(2024, 3, 2)), Some(dt(2024, 2, 28)));
    }

    #[test]
    fn test_time_wraps() {
        let t = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let interval = Interval::new(45, IntervalUnit::Minutes);
        assert_eq!(
            interval.add_to_time(t),
            Some(NaiveTime::from_hms_opt(0, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_single() {
        assert!(Interval::new(1, IntervalUnit::Days).single().is_some());
        assert!(Interval::new(1, IntervalUnit::Days)
            .and(1, IntervalUnit::Hours)
            .single()
            .is_none());
    }
}
