// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Time grains for bucketing time dimensions

use super::QueryError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucketing granularity of a time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeGrain {
    Second,
    Minute,
    Hour,
    Day,
    /// Week starting on Monday
    IsoWeek,
    /// Week starting on Sunday
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGrain {
    /// Name emitted into cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGrain::Second => "SECOND",
            TimeGrain::Minute => "MINUTE",
            TimeGrain::Hour => "HOUR",
            TimeGrain::Day => "DAY",
            TimeGrain::IsoWeek => "ISOWEEK",
            TimeGrain::Week => "WEEK",
            TimeGrain::Month => "MONTH",
            TimeGrain::Quarter => "QUARTER",
            TimeGrain::Year => "YEAR",
        }
    }

    /// Start of the bucket containing `time`
    pub fn truncate(&self, time: &DateTime<Utc>) -> DateTime<Utc> {
        let date = time.date_naive();
        let day_start = |d: NaiveDate| Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap_or_default());

        match self {
            TimeGrain::Second => *time - Duration::nanoseconds(time.nanosecond() as i64),
            TimeGrain::Minute => {
                *time
                    - Duration::seconds(time.second() as i64)
                    - Duration::nanoseconds(time.nanosecond() as i64)
            }
            TimeGrain::Hour => {
                day_start(date) + Duration::hours(time.hour() as i64)
            }
            TimeGrain::Day => day_start(date),
            TimeGrain::IsoWeek => {
                day_start(date - Duration::days(date.weekday().num_days_from_monday() as i64))
            }
            TimeGrain::Week => {
                day_start(date - Duration::days(date.weekday().num_days_from_sunday() as i64))
            }
            TimeGrain::Month => day_start(date - Duration::days(date.day0() as i64)),
            TimeGrain::Quarter => {
                let month = date.month0() / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1)
                    .map(day_start)
                    .unwrap_or_else(|| day_start(date))
            }
            TimeGrain::Year => day_start(date - Duration::days(date.ordinal0() as i64)),
        }
    }

    /// Render the bucket of `time` at this grain's precision
    pub fn format(&self, time: &DateTime<Utc>) -> String {
        let start = self.truncate(time);
        let pattern = match self {
            TimeGrain::Second => "%Y-%m-%dT%H:%M:%S",
            TimeGrain::Minute => "%Y-%m-%dT%H:%M",
            TimeGrain::Hour => "%Y-%m-%dT%H",
            TimeGrain::Month | TimeGrain::Quarter => "%Y-%m",
            TimeGrain::Year => "%Y",
            TimeGrain::Day | TimeGrain::IsoWeek | TimeGrain::Week => "%Y-%m-%d",
        };
        start.format(pattern).to_string()
    }
}

impl FromStr for TimeGrain {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SECOND" => Ok(TimeGrain::Second),
            "MINUTE" => Ok(TimeGrain::Minute),
            "HOUR" => Ok(TimeGrain::Hour),
            "DAY" => Ok(TimeGrain::Day),
            "ISOWEEK" => Ok(TimeGrain::IsoWeek),
            "WEEK" => Ok(TimeGrain::Week),
            "MONTH" => Ok(TimeGrain::Month),
            "QUARTER" => Ok(TimeGrain::Quarter),
            "YEAR" => Ok(TimeGrain::Year),
            _ => Err(QueryError::UnknownTimeGrain(s.to_string())),
        }
    }
}

impl fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_truncate() {
        // 2024-05-16 is a Thursday
        let t = at(2024, 5, 16, 13, 45, 30);
        assert_eq!(TimeGrain::Minute.truncate(&t), at(2024, 5, 16, 13, 45, 0));
        assert_eq!(TimeGrain::Hour.truncate(&t), at(2024, 5, 16, 13, 0, 0));
        assert_eq!(TimeGrain::Day.truncate(&t), at(2024, 5, 16, 0, 0, 0));
        assert_eq!(TimeGrain::IsoWeek.truncate(&t), at(2024, 5, 13, 0, 0, 0));
        assert_eq!(TimeGrain::Week.truncate(&t), at(2024, 5, 12, 0, 0, 0));
        assert_eq!(TimeGrain::Month.truncate(&t), at(2024, 5, 1, 0, 0, 0));
        assert_eq!(TimeGrain::Quarter.truncate(&t), at(2024, 4, 1, 0, 0, 0));
        assert_eq!(TimeGrain::Year.truncate(&t), at(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_format() {
        let t = at(2024, 5, 16, 13, 45, 30);
        assert_eq!(TimeGrain::Second.format(&t), "2024-05-16T13:45:30");
        assert_eq!(TimeGrain::Hour.format(&t), "2024-05-16T13");
        assert_eq!(TimeGrain::Month.format(&t), "2024-05");
        assert_eq!(TimeGrain::Year.format(&t), "2024");
    }

    #[test]
    fn test_parse() {
        assert_eq!("month".parse::<TimeGrain>(), Ok(TimeGrain::Month));
        assert_eq!("ISOWEEK".parse::<TimeGrain>(), Ok(TimeGrain::IsoWeek));
        assert!("fortnight".parse::<TimeGrain>().is_err());
        assert_eq!(serde_json::to_string(&TimeGrain::IsoWeek).unwrap(), "\"ISOWEEK\"");
    }
}
