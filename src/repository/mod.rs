//! Repository layer: storage traits and their implementations
//!
//! Services only see the traits below. `Repository::postgres` wires the
//! sqlx-backed stores, `Repository::in_memory` a single `MemoryStore`
//! implementing every trait.

pub mod bookings;
pub mod comments;
pub mod items;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        comment::CommentDetails,
        item::{CreateItem, UpdateItem},
        user::{CreateUser, UpdateUser},
        Booking, BookingQuery, BookingStatus, Item, NewBooking, NewComment, Page, User,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists(&self, id: i64) -> AppResult<bool>;
    async fn get_by_id(&self, id: i64) -> AppResult<Option<User>>;
    /// All users ordered by id
    async fn list(&self) -> AppResult<Vec<User>>;
    async fn create(&self, user: &CreateUser) -> AppResult<User>;
    async fn update(&self, id: i64, data: &UpdateUser) -> AppResult<Option<User>>;
    /// Returns false when no user had this id
    async fn delete(&self, id: i64) -> AppResult<bool>;
    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Item>>;
    async fn create(&self, owner_id: i64, data: &CreateItem) -> AppResult<Item>;
    /// Single-row update; `None` when the item does not exist
    async fn update(&self, id: i64, data: &UpdateItem) -> AppResult<Option<Item>>;
    /// Owner's items ordered by id
    async fn list_by_owner(&self, owner_id: i64, page: Page) -> AppResult<Vec<Item>>;
    /// Available items whose name or description contains `text`, ignoring case
    async fn search_available(&self, text: &str, page: Page) -> AppResult<Vec<Item>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a WAITING booking and return it with its generated id
    async fn create(&self, booking: &NewBooking) -> AppResult<Booking>;
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Booking>>;
    /// Move a WAITING booking to `status` atomically.
    ///
    /// Returns `None` when the booking is missing or no longer WAITING, so
    /// two concurrent decisions on one booking cannot both succeed.
    async fn decide(&self, id: i64, status: BookingStatus) -> AppResult<Option<Booking>>;
    /// Bookings matching the query, `start` descending then id ascending
    async fn list(&self, query: &BookingQuery) -> AppResult<Vec<Booking>>;
    /// APPROVED booking of the item with the latest `end` before `now`
    async fn last_for_item(&self, item_id: i64, now: DateTime<Utc>) -> AppResult<Option<Booking>>;
    /// APPROVED booking of the item with the earliest `start` after `now`
    async fn next_for_item(&self, item_id: i64, now: DateTime<Utc>) -> AppResult<Option<Booking>>;
    /// Whether the user has a booking of the item in one of `statuses` that ended before `now`
    async fn has_qualifying(
        &self,
        booker_id: i64,
        item_id: i64,
        statuses: &[BookingStatus],
        now: DateTime<Utc>,
    ) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create(&self, comment: &NewComment) -> AppResult<CommentDetails>;
    /// Most recent comments of the item, newest first
    async fn recent_for_item(&self, item_id: i64, limit: i64) -> AppResult<Vec<CommentDetails>>;
}

/// Entity store handed to the services
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UserStore>,
    pub items: Arc<dyn ItemStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub comments: Arc<dyn CommentStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            items: Arc::new(items::ItemsRepository::new(pool.clone())),
            bookings: Arc::new(bookings::BookingsRepository::new(pool.clone())),
            comments: Arc::new(comments::CommentsRepository::new(pool)),
        }
    }

    /// Create a repository keeping everything in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            users: store.clone(),
            items: store.clone(),
            bookings: store.clone(),
            comments: store,
        }
    }
}

/// Map constraint violations to `Conflict`, everything else to `Database`
pub(crate) fn map_constraint_error(err: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Conflict(format!("{} already exists", what));
        }
        if db.is_foreign_key_violation() {
            return AppError::Conflict(format!("{} is still referenced", what));
        }
    }
    AppError::Database(err)
}
