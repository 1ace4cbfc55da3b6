use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::str::FromStr;

/// Reporting cadence. Each period maps a reference date onto a half-open
/// UTC window [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid period '{0}', expected daily, weekly or monthly")]
pub struct InvalidPeriod(String);

impl FromStr for ReportPeriod {
    type Err = InvalidPeriod;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "daily" => Ok(ReportPeriod::Daily),
            "weekly" => Ok(ReportPeriod::Weekly),
            "monthly" => Ok(ReportPeriod::Monthly),
            other => Err(InvalidPeriod(other.to_string())),
        }
    }
}

impl ReportPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "Daily",
            ReportPeriod::Weekly => "Weekly",
            ReportPeriod::Monthly => "Monthly",
        }
    }

    /// Half-open window covering the reference date: the calendar day, the
    /// ISO week (Monday start), or the calendar month.
    pub fn window(&self, reference: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let (start_day, end_day) = match self {
            ReportPeriod::Daily => (reference, reference + Duration::days(1)),
            ReportPeriod::Weekly => {
                let monday =
                    reference - Duration::days(reference.weekday().num_days_from_monday() as i64);
                (monday, monday + Duration::days(7))
            }
            ReportPeriod::Monthly => {
                let first = reference - Duration::days(reference.day0() as i64);
                let into_next = first + Duration::days(32);
                let next_first = into_next - Duration::days(into_next.day0() as i64);
                (first, next_first)
            }
        };
        (midnight(start_day), midnight(end_day))
    }
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_known_periods() {
        assert_eq!("daily".parse::<ReportPeriod>().unwrap(), ReportPeriod::Daily);
        assert_eq!("weekly".parse::<ReportPeriod>().unwrap(), ReportPeriod::Weekly);
        assert_eq!("monthly".parse::<ReportPeriod>().unwrap(), ReportPeriod::Monthly);
        assert!("yearly".parse::<ReportPeriod>().is_err());
        assert!("Daily".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn daily_window_is_one_calendar_day() {
        let (start, end) = ReportPeriod::Daily.window(date(2025, 10, 12));
        assert_eq!(start, midnight(date(2025, 10, 12)));
        assert_eq!(end, midnight(date(2025, 10, 13)));
    }

    #[test]
    fn weekly_window_starts_monday() {
        // 2025-10-12 is a Sunday; its week starts 2025-10-06.
        let (start, end) = ReportPeriod::Weekly.window(date(2025, 10, 12));
        assert_eq!(start, midnight(date(2025, 10, 6)));
        assert_eq!(end, midnight(date(2025, 10, 13)));

        // A Monday reference is its own window start.
        let (start, _) = ReportPeriod::Weekly.window(date(2025, 10, 6));
        assert_eq!(start, midnight(date(2025, 10, 6)));
    }

    #[test]
    fn monthly_window_covers_the_calendar_month() {
        let (start, end) = ReportPeriod::Monthly.window(date(2025, 2, 14));
        assert_eq!(start, midnight(date(2025, 2, 1)));
        assert_eq!(end, midnight(date(2025, 3, 1)));
    }

    #[test]
    fn monthly_window_rolls_over_the_year() {
        let (start, end) = ReportPeriod::Monthly.window(date(2025, 12, 31));
        assert_eq!(start, midnight(date(2025, 12, 1)));
        assert_eq!(end, midnight(date(2026, 1, 1)));
    }

    #[test]
    fn windows_are_half_open() {
        let (start, end) = ReportPeriod::Daily.window(date(2025, 6, 1));
        // A session ending exactly at the upper bound belongs to the next day.
        assert!(start <= end - Duration::seconds(1));
        assert_eq!(end, midnight(date(2025, 6, 2)));
    }
}
