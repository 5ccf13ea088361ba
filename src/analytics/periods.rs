use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Custom ranges are capped at a year (leap years included)
pub const MAX_CUSTOM_DAYS: i64 = 366;

const DATE_FORMAT: &str = "%d-%m-%Y";

/// Named financial windows plus a caller-defined range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "custom")]
    Custom,
}

impl Period {
    pub fn parse(s: &str) -> Result<Period, PeriodError> {
        match s {
            "today" => Ok(Period::Today),
            "last_7_days" => Ok(Period::Last7Days),
            "last_30_days" => Ok(Period::Last30Days),
            "month" => Ok(Period::Month),
            "custom" => Ok(Period::Custom),
            other => Err(PeriodError::Unsupported(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum PeriodError {
    #[error(
        "Unsupported period: {0}. Use: 'today', 'last_7_days', 'last_30_days', 'month', 'custom'"
    )]
    Unsupported(String),

    #[error("Custom period requires '{0}' in DD-MM-YYYY format")]
    MissingBound(&'static str),

    #[error("Invalid date for '{field}': {value}. Use DD-MM-YYYY (e.g. 01-12-2024)")]
    InvalidDate { field: &'static str, value: String },

    #[error("start_date cannot be after end_date")]
    StartAfterEnd,

    #[error("Custom range cannot exceed {MAX_CUSTOM_DAYS} days (got {0})")]
    RangeTooLong(i64),
}

impl PeriodError {
    /// Name of the offending request parameter, for validation responses
    pub fn field(&self) -> &'static str {
        match self {
            PeriodError::Unsupported(_) => "period",
            PeriodError::MissingBound(field) => field,
            PeriodError::InvalidDate { field, .. } => field,
            PeriodError::StartAfterEnd => "start_date",
            PeriodError::RangeTooLong(_) => "end_date",
        }
    }
}

/// Day-granular inclusive window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Inclusive length in calendar days
    pub fn days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days() + 1
    }

    /// The immediately preceding window of identical day length:
    /// no gap, no overlap, `previous.end` is the end of the day before
    /// `self.start`.
    pub fn previous(&self) -> DateRange {
        let days = self.days();
        let prev_end_date = self.start.date() - Duration::days(1);
        DateRange {
            start: self.start - Duration::days(days),
            end: prev_end_date.and_time(end_of_day()),
        }
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

/// Resolve a period selector into a concrete window relative to `now`
/// (local wall-clock time). Custom bounds are validated strictly and never
/// clamped.
pub fn resolve(
    period: Period,
    start_date: Option<&str>,
    end_date: Option<&str>,
    now: NaiveDateTime,
) -> Result<DateRange, PeriodError> {
    let today_start = now.date().and_time(NaiveTime::MIN);
    let today_end = now.date().and_time(end_of_day());

    match period {
        Period::Today => Ok(DateRange {
            start: today_start,
            end: today_end,
        }),
        Period::Last7Days => Ok(DateRange {
            start: today_start - Duration::days(6),
            end: today_end,
        }),
        Period::Last30Days => Ok(DateRange {
            start: today_start - Duration::days(29),
            end: today_end,
        }),
        Period::Month => {
            let first = now
                .date()
                .with_day(1)
                .unwrap_or_else(|| now.date());
            Ok(DateRange {
                start: first.and_time(NaiveTime::MIN),
                end: today_end,
            })
        }
        Period::Custom => resolve_custom(start_date, end_date),
    }
}

fn resolve_custom(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<DateRange, PeriodError> {
    let start_raw = start_date.ok_or(PeriodError::MissingBound("start_date"))?;
    let end_raw = end_date.ok_or(PeriodError::MissingBound("end_date"))?;

    let start = parse_date("start_date", start_raw)?;
    let end = parse_date("end_date", end_raw)?;

    if start > end {
        return Err(PeriodError::StartAfterEnd);
    }

    let days = (end - start).num_days() + 1;
    if days > MAX_CUSTOM_DAYS {
        return Err(PeriodError::RangeTooLong(days));
    }

    Ok(DateRange {
        start: start.and_time(NaiveTime::MIN),
        end: end.and_time(end_of_day()),
    })
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, PeriodError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| PeriodError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
