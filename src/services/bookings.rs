//! Booking lifecycle and temporal queries

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        Booking, BookingQuery, BookingState, BookingStatus, BookingSubject, NewBooking, Page,
    },
    repository::Repository,
    services::{availability, clock::Clock},
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl BookingsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<()> {
        if self.repository.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::UserNotFound(user_id))
        }
    }

    async fn get_existing(&self, booking_id: i64) -> AppResult<Booking> {
        self.repository
            .bookings
            .get_by_id(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))
    }

    /// Create a booking in WAITING status.
    ///
    /// Checks run in a fixed order and the first failure is reported.
    pub async fn create(&self, booking: NewBooking) -> AppResult<Booking> {
        self.ensure_user(booking.booker_id).await?;

        if booking.start >= booking.end {
            return Err(AppError::InvalidDateRange);
        }

        let item = self
            .repository
            .items
            .get_by_id(booking.item_id)
            .await?
            .ok_or(AppError::ItemNotFound(booking.item_id))?;

        if item.is_owned_by(booking.booker_id) {
            return Err(AppError::OwnerCannotBookOwnItem(item.id));
        }

        availability::check_bookable(&item)?;

        let created = self.repository.bookings.create(&booking).await?;
        tracing::info!(
            "Booking {} created by user {} for item {}",
            created.id,
            booking.booker_id,
            item.id
        );
        Ok(created)
    }

    /// Owner decision on a WAITING booking
    pub async fn approve(&self, user_id: i64, booking_id: i64, approved: bool) -> AppResult<Booking> {
        self.ensure_user(user_id).await?;
        let booking = self.get_existing(booking_id).await?;

        if !booking.is_item_owned_by(user_id) {
            return Err(AppError::NotItemOwner { user_id, booking_id });
        }
        if booking.status != BookingStatus::Waiting {
            return Err(AppError::StatusAlreadySet(booking_id));
        }

        let status = if approved {
            BookingStatus::Approved
        } else {
            BookingStatus::Rejected
        };

        // A concurrent decision may have landed since the read above
        let decided = self
            .repository
            .bookings
            .decide(booking_id, status)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Booking {} was decided concurrently", booking_id);
                AppError::StatusAlreadySet(booking_id)
            })?;

        tracing::info!("Booking {} set to {} by user {}", booking_id, status, user_id);
        Ok(decided)
    }

    /// Booking visible to its booker and to the item owner only
    pub async fn get_by_id(&self, user_id: i64, booking_id: i64) -> AppResult<Booking> {
        self.ensure_user(user_id).await?;
        let booking = self.get_existing(booking_id).await?;

        if !booking.is_booked_by(user_id) && !booking.is_item_owned_by(user_id) {
            return Err(AppError::AccessDenied { user_id, booking_id });
        }
        Ok(booking)
    }

    pub async fn list_for_booker(&self, booker_id: i64, state: &str, from: i64, size: i64) -> AppResult<Vec<Booking>> {
        self.list(BookingSubject::Booker(booker_id), booker_id, state, from, size)
            .await
    }

    pub async fn list_for_owner(&self, owner_id: i64, state: &str, from: i64, size: i64) -> AppResult<Vec<Booking>> {
        self.list(BookingSubject::Owner(owner_id), owner_id, state, from, size)
            .await
    }

    async fn list(
        &self,
        subject: BookingSubject,
        user_id: i64,
        state: &str,
        from: i64,
        size: i64,
    ) -> AppResult<Vec<Booking>> {
        self.ensure_user(user_id).await?;
        let state: BookingState = state.parse()?;
        let page = Page::new(from, size)?;

        let query = BookingQuery {
            subject,
            state,
            now: self.clock.now(),
            page,
        };
        tracing::debug!("Listing bookings: {:?}", query);
        self.repository.bookings.list(&query).await
    }
}
