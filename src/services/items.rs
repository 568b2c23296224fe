//! Items, their comments and the owner's view of surrounding bookings

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        comment::CreateComment,
        item::{CreateItem, UpdateItem},
        BookingShort, CommentDetails, Item, ItemDetails, NewComment, Page,
    },
    repository::Repository,
    services::{availability::AvailabilityService, clock::Clock},
};

/// Comments attached to item details
pub const RECENT_COMMENTS_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct ItemsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    availability: AvailabilityService,
}

impl ItemsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        let availability = AvailabilityService::new(repository.clone(), clock.clone());
        Self {
            repository,
            clock,
            availability,
        }
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<()> {
        if self.repository.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::UserNotFound(user_id))
        }
    }

    async fn get_existing(&self, item_id: i64) -> AppResult<Item> {
        self.repository
            .items
            .get_by_id(item_id)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))
    }

    pub async fn create(&self, owner_id: i64, data: CreateItem) -> AppResult<Item> {
        self.ensure_user(owner_id).await?;
        data.validate()?;

        let item = self.repository.items.create(owner_id, &data).await?;
        tracing::info!("Item {} created by user {}", item.id, owner_id);
        Ok(item)
    }

    pub async fn update(&self, owner_id: i64, item_id: i64, data: UpdateItem) -> AppResult<Item> {
        self.ensure_user(owner_id).await?;
        let item = self.get_existing(item_id).await?;
        if !item.is_owned_by(owner_id) {
            return Err(AppError::Forbidden(format!(
                "User {} does not own item {}",
                owner_id, item_id
            )));
        }
        data.validate()?;

        let updated = self
            .repository
            .items
            .update(item_id, &data)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))?;

        if item.available != updated.available {
            tracing::info!("Item {} availability set to {}", item_id, updated.available);
        }
        Ok(updated)
    }

    /// Item details; last/next bookings are filled for the owner only
    pub async fn get(&self, viewer_id: i64, item_id: i64) -> AppResult<ItemDetails> {
        self.ensure_user(viewer_id).await?;
        let item = self.get_existing(item_id).await?;
        self.details(viewer_id, item).await
    }

    pub async fn list_for_owner(&self, owner_id: i64, from: i64, size: i64) -> AppResult<Vec<ItemDetails>> {
        self.ensure_user(owner_id).await?;
        let page = Page::new(from, size)?;

        let items = self.repository.items.list_by_owner(owner_id, page).await?;
        let mut details = Vec::with_capacity(items.len());
        for item in items {
            details.push(self.details(owner_id, item).await?);
        }
        Ok(details)
    }

    /// Available items matching `text` in name or description
    pub async fn search(&self, text: &str, from: i64, size: i64) -> AppResult<Vec<Item>> {
        let page = Page::new(from, size)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        self.repository.items.search_available(text, page).await
    }

    pub async fn add_comment(&self, author_id: i64, item_id: i64, data: CreateComment) -> AppResult<CommentDetails> {
        self.ensure_user(author_id).await?;
        let item = self.get_existing(item_id).await?;
        data.validate()?;
        self.availability.ensure_can_comment(author_id, item.id).await?;

        let comment = NewComment {
            item_id: item.id,
            author_id,
            text: data.text,
            created: self.clock.now(),
        };
        let created = self.repository.comments.create(&comment).await?;
        tracing::info!("Comment {} added to item {} by user {}", created.id, item_id, author_id);
        Ok(created)
    }

    async fn details(&self, viewer_id: i64, item: Item) -> AppResult<ItemDetails> {
        let comments = self
            .repository
            .comments
            .recent_for_item(item.id, RECENT_COMMENTS_LIMIT)
            .await?;

        if !item.is_owned_by(viewer_id) {
            return Ok(ItemDetails::new(item, comments));
        }

        let now = self.clock.now();
        let last = self.repository.bookings.last_for_item(item.id, now).await?;
        let next = self.repository.bookings.next_for_item(item.id, now).await?;

        let mut details = ItemDetails::new(item, comments);
        details.last_booking = last.map(BookingShort::from);
        details.next_booking = next.map(BookingShort::from);
        Ok(details)
    }
}
