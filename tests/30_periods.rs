// These tests verify period resolution as callers use it: named windows
// relative to a fixed wall clock, strict custom-range validation, and the
// previous-window derivation the growth comparison relies on.

use chrono::{NaiveDate, NaiveDateTime};

use salon_api::analytics::periods::{self, Period, PeriodError};

fn clock(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 30, 0)
        .unwrap()
}

#[test]
fn named_windows_resolve_relative_to_now() {
    let now = clock(2026, 6, 15, 14);

    let today = periods::resolve(Period::Today, None, None, now).unwrap();
    assert_eq!(today.days(), 1);
    assert_eq!(today.start.date(), now.date());

    let week = periods::resolve(Period::Last7Days, None, None, now).unwrap();
    assert_eq!(week.days(), 7);
    assert_eq!(week.end.date(), now.date());

    let month = periods::resolve(Period::Month, None, None, now).unwrap();
    assert_eq!(month.start.date(), NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    assert_eq!(month.end.date(), now.date());
}

#[test]
fn custom_range_is_parsed_and_inclusive() {
    let now = clock(2026, 6, 15, 14);
    let range = periods::resolve(
        Period::Custom,
        Some("01-06-2026"),
        Some("10-06-2026"),
        now,
    )
    .unwrap();
    assert_eq!(range.days(), 10);
}

#[test]
fn custom_range_rejects_bad_input() {
    let now = clock(2026, 6, 15, 14);

    assert!(matches!(
        periods::resolve(Period::Custom, None, Some("10-06-2026"), now),
        Err(PeriodError::MissingBound("start_date"))
    ));
    assert!(matches!(
        periods::resolve(Period::Custom, Some("2026-06-01"), Some("10-06-2026"), now),
        Err(PeriodError::InvalidDate { field: "start_date", .. })
    ));
    assert!(matches!(
        periods::resolve(Period::Custom, Some("10-06-2026"), Some("01-06-2026"), now),
        Err(PeriodError::StartAfterEnd)
    ));
    assert!(matches!(
        periods::resolve(Period::Custom, Some("01-01-2025"), Some("05-02-2026"), now),
        Err(PeriodError::RangeTooLong(_))
    ));
}

#[test]
fn unknown_period_names_the_parameter() {
    let err = Period::parse("fortnight").unwrap_err();
    assert_eq!(err.field(), "period");
}

#[test]
fn previous_window_is_adjacent_and_same_length() {
    let now = clock(2026, 6, 15, 14);
    let range = periods::resolve(Period::Last30Days, None, None, now).unwrap();
    let previous = range.previous();

    assert_eq!(previous.days(), range.days());
    // No gap, no overlap: previous ends the day before the current start
    assert_eq!(
        previous.end.date(),
        range.start.date().pred_opt().unwrap()
    );
    assert!(previous.end < range.start);
}
