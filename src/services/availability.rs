//! Availability rules: who may book an item and who may review it

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{BookingStatus, Item},
    repository::Repository,
    services::clock::Clock,
};

/// Whether new bookings of the item are accepted.
///
/// Only the item's own flag is consulted; overlapping bookings of one item
/// are allowed and left to the owner to arbitrate.
pub fn can_book(item: &Item) -> bool {
    item.available
}

pub fn check_bookable(item: &Item) -> AppResult<()> {
    if can_book(item) {
        Ok(())
    } else {
        Err(AppError::ItemUnavailable(item.id))
    }
}

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// A user may comment once one of their APPROVED or CANCELED bookings
    /// of the item has ended strictly before now
    pub async fn can_comment(&self, user_id: i64, item_id: i64) -> AppResult<bool> {
        self.repository
            .bookings
            .has_qualifying(user_id, item_id, BookingStatus::COMMENT_ELIGIBLE, self.clock.now())
            .await
    }

    pub async fn ensure_can_comment(&self, user_id: i64, item_id: i64) -> AppResult<()> {
        if self.can_comment(user_id, item_id).await? {
            Ok(())
        } else {
            tracing::debug!("User {} has no finished booking of item {}", user_id, item_id);
            Err(AppError::CommentNotAllowed { user_id, item_id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{item::CreateItem, user::CreateUser, NewBooking},
        services::clock::FixedClock,
    };
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_unavailable_item_cannot_be_booked() {
        let mut item = Item {
            id: 7,
            name: "Tent".into(),
            description: "Two persons".into(),
            available: false,
            owner_id: 1,
            request_id: None,
        };
        assert!(matches!(check_bookable(&item), Err(AppError::ItemUnavailable(7))));
        item.available = true;
        assert!(check_bookable(&item).is_ok());
    }

    #[tokio::test]
    async fn test_comment_requires_finished_approved_booking() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(now));
        let repository = Repository::in_memory();
        let rules = AvailabilityService::new(repository.clone(), clock.clone());

        let owner = repository.users.create(&CreateUser { name: "o".into(), email: "o@mail.com".into() }).await.unwrap();
        let user = repository.users.create(&CreateUser { name: "u".into(), email: "u@mail.com".into() }).await.unwrap();
        let new_item = CreateItem { name: "Saw".into(), description: "Hand saw".into(), available: true, request_id: None };
        let x = repository.items.create(owner.id, &new_item).await.unwrap();
        let y = repository.items.create(owner.id, &new_item).await.unwrap();

        assert!(!rules.can_comment(user.id, x.id).await.unwrap());

        let finished = repository
            .bookings
            .create(&NewBooking { item_id: x.id, booker_id: user.id, start: now - Duration::days(3), end: now - Duration::days(1) })
            .await
            .unwrap();
        repository.bookings.decide(finished.id, BookingStatus::Approved).await.unwrap();
        repository
            .bookings
            .create(&NewBooking { item_id: y.id, booker_id: user.id, start: now - Duration::days(3), end: now - Duration::days(1) })
            .await
            .unwrap();

        assert!(rules.can_comment(user.id, x.id).await.unwrap());
        let err = rules.ensure_can_comment(user.id, y.id).await.unwrap_err();
        assert!(matches!(err, AppError::CommentNotAllowed { .. }));
    }
}
