//! Booking status and query-state enums

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Persisted lifecycle value of a booking
///
/// `Canceled` is never produced by the server itself. It is honoured by
/// comment eligibility for records that carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Waiting,
    Approved,
    Rejected,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Waiting => "WAITING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Canceled => "CANCELED",
        }
    }

    /// Statuses that let the booker review the item once the rental is over
    pub const COMMENT_ELIGIBLE: &'static [BookingStatus] =
        &[BookingStatus::Approved, BookingStatus::Canceled];
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// Position of a booking's `[start, end)` range relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Any,
    /// `start <= now < end`
    Current,
    /// `end < now`
    Past,
    /// `start > now`
    Future,
}

impl TimeWindow {
    pub fn contains(&self, start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            TimeWindow::Any => true,
            TimeWindow::Current => start <= now && now < end,
            TimeWindow::Past => end < now,
            TimeWindow::Future => start > now,
        }
    }
}

// ---------------------------------------------------------------------------
// BookingState
// ---------------------------------------------------------------------------

/// View filter used when listing bookings; computed at query time, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingState {
    All,
    Current,
    Past,
    Future,
    Waiting,
    Rejected,
}

impl BookingState {
    pub const ALL_STATES: [BookingState; 6] = [
        BookingState::All,
        BookingState::Current,
        BookingState::Past,
        BookingState::Future,
        BookingState::Waiting,
        BookingState::Rejected,
    ];

    /// Case-insensitive keyword lookup
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL_STATES
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::All => "ALL",
            BookingState::Current => "CURRENT",
            BookingState::Past => "PAST",
            BookingState::Future => "FUTURE",
            BookingState::Waiting => "WAITING",
            BookingState::Rejected => "REJECTED",
        }
    }

    /// Statuses admitted by the filter, `None` meaning any status
    pub fn statuses(&self) -> Option<&'static [BookingStatus]> {
        match self {
            BookingState::All => None,
            BookingState::Current => Some(&[
                BookingStatus::Approved,
                BookingStatus::Waiting,
                BookingStatus::Rejected,
            ]),
            BookingState::Past => Some(&[BookingStatus::Approved]),
            BookingState::Future => Some(&[BookingStatus::Approved, BookingStatus::Waiting]),
            BookingState::Waiting => Some(&[BookingStatus::Waiting]),
            BookingState::Rejected => Some(&[BookingStatus::Rejected]),
        }
    }

    pub fn window(&self) -> TimeWindow {
        match self {
            BookingState::Current => TimeWindow::Current,
            BookingState::Past => TimeWindow::Past,
            BookingState::Future => TimeWindow::Future,
            BookingState::All | BookingState::Waiting | BookingState::Rejected => TimeWindow::Any,
        }
    }

    /// Whether a booking with the given status and range belongs to this view
    pub fn matches(
        &self,
        status: BookingStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        let status_ok = self.statuses().map_or(true, |allowed| allowed.contains(&status));
        status_ok && self.window().contains(start, end, now)
    }
}

impl FromStr for BookingState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AppError::UnsupportedState(s.to_string()))
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_state_case_insensitive() {
        assert_eq!(BookingState::parse("current"), Some(BookingState::Current));
        assert_eq!(BookingState::parse("Past"), Some(BookingState::Past));
        assert_eq!(BookingState::parse("ALL"), Some(BookingState::All));
        assert_eq!(BookingState::parse("UNSUPPORTED_STATUS"), None);
        assert_eq!(BookingState::parse(""), None);
    }

    #[test]
    fn test_from_str_reports_unknown_state() {
        let err = "later".parse::<BookingState>().unwrap_err();
        assert!(matches!(err, AppError::UnsupportedState(ref s) if s == "later"));
    }

    #[test]
    fn test_current_window_is_half_open() {
        let now = now();
        let window = TimeWindow::Current;
        assert!(window.contains(now, now + Duration::hours(1), now));
        assert!(!window.contains(now - Duration::hours(1), now, now));
        assert!(!window.contains(now + Duration::seconds(1), now + Duration::hours(1), now));
    }

    #[test]
    fn test_past_and_future_exclude_boundaries() {
        let now = now();
        assert!(!TimeWindow::Past.contains(now - Duration::hours(2), now, now));
        assert!(TimeWindow::Past.contains(now - Duration::hours(2), now - Duration::seconds(1), now));
        assert!(!TimeWindow::Future.contains(now, now + Duration::hours(1), now));
        assert!(TimeWindow::Future.contains(now + Duration::seconds(1), now + Duration::hours(1), now));
    }

    #[test]
    fn test_approved_bookings_fall_into_exactly_one_time_view() {
        let now = now();
        let ranges = [
            (now - Duration::days(3), now - Duration::days(1)),
            (now - Duration::days(1), now + Duration::days(1)),
            (now + Duration::days(1), now + Duration::days(3)),
        ];
        for (start, end) in ranges {
            let hits = [BookingState::Current, BookingState::Past, BookingState::Future]
                .iter()
                .filter(|state| state.matches(BookingStatus::Approved, start, end, now))
                .count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_status_filters() {
        let now = now();
        let (start, end) = (now + Duration::days(1), now + Duration::days(2));
        assert!(BookingState::Future.matches(BookingStatus::Waiting, start, end, now));
        assert!(!BookingState::Future.matches(BookingStatus::Rejected, start, end, now));
        assert!(BookingState::Rejected.matches(BookingStatus::Rejected, start, end, now));
        assert!(!BookingState::Waiting.matches(BookingStatus::Approved, start, end, now));
        assert!(BookingState::All.matches(BookingStatus::Canceled, start, end, now));
        assert!(!BookingState::Past.matches(BookingStatus::Canceled, now - Duration::days(2), now - Duration::days(1), now));
    }
}
