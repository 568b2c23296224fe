//! Booking model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{
    enums::{BookingState, BookingStatus},
    item::ItemShort,
    page::Page,
    user::UserShort,
};

/// Booking with its item and booker, as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub item: ItemShort,
    pub booker: UserShort,
}

impl Booking {
    pub fn is_booked_by(&self, user_id: i64) -> bool {
        self.booker.id == user_id
    }

    pub fn is_item_owned_by(&self, user_id: i64) -> bool {
        self.item.owner_id == user_id
    }
}

/// Flat row of `bookings` joined with `items` and `users`
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub item_id: i64,
    pub item_name: String,
    pub item_owner_id: i64,
    pub booker_id: i64,
    pub booker_name: String,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            start: row.start_date,
            end: row.end_date,
            status: row.status,
            item: ItemShort {
                id: row.item_id,
                name: row.item_name,
                owner_id: row.item_owner_id,
            },
            booker: UserShort {
                id: row.booker_id,
                name: row.booker_name,
            },
        }
    }
}

/// Compact booking attached to item details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingShort {
    pub id: i64,
    pub item_id: i64,
    pub booker_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
}

impl From<Booking> for BookingShort {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            item_id: booking.item.id,
            booker_id: booking.booker.id,
            start: booking.start,
            end: booking.end,
            status: booking.status,
        }
    }
}

/// Validated booking about to be persisted in WAITING status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub item_id: i64,
    pub booker_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Whose bookings a list query looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingSubject {
    /// Bookings made by the user
    Booker(i64),
    /// Bookings of items the user owns
    Owner(i64),
}

/// Fully resolved list query, evaluated against `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingQuery {
    pub subject: BookingSubject,
    pub state: BookingState,
    pub now: DateTime<Utc>,
    pub page: Page,
}

impl BookingQuery {
    pub fn matches(&self, booking: &Booking) -> bool {
        let subject_ok = match self.subject {
            BookingSubject::Booker(id) => booking.booker.id == id,
            BookingSubject::Owner(id) => booking.item.owner_id == id,
        };
        subject_ok
            && self
                .state
                .matches(booking.status, booking.start, booking.end, self.now)
    }
}
