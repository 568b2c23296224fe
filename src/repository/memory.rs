//! In-process entity store
//!
//! Implements every storage trait on top of `DashMap`s. Single-row updates
//! run under the entry's write guard, which gives the same per-row
//! atomicity the SQL store gets from `UPDATE ... WHERE`.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{
    mapref::{entry::Entry, one::Ref},
    DashMap,
};

use super::{BookingStore, CommentStore, ItemStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        item::{CreateItem, UpdateItem},
        user::{CreateUser, UpdateUser},
        Booking, BookingQuery, BookingStatus, CommentDetails, Item, ItemShort, NewBooking,
        NewComment, Page, User, UserShort,
    },
};

#[derive(Debug, Clone)]
struct BookingRecord {
    id: i64,
    item_id: i64,
    booker_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: BookingStatus,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    item_id: i64,
    author_id: i64,
    text: String,
    created: DateTime<Utc>,
}

/// Monotonic identifier source, first id is 1
struct Sequence(AtomicI64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

pub struct MemoryStore {
    users: DashMap<i64, User>,
    emails: DashMap<String, i64>,
    items: DashMap<i64, Item>,
    bookings: DashMap<i64, BookingRecord>,
    comments: DashMap<i64, CommentRecord>,
    user_ids: Sequence,
    item_ids: Sequence,
    booking_ids: Sequence,
    comment_ids: Sequence,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            items: DashMap::new(),
            bookings: DashMap::new(),
            comments: DashMap::new(),
            user_ids: Sequence::new(),
            item_ids: Sequence::new(),
            booking_ids: Sequence::new(),
            comment_ids: Sequence::new(),
        }
    }

    fn user(&self, id: i64) -> AppResult<User> {
        self.users
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or_else(|| AppError::Internal(format!("dangling reference to user {}", id)))
    }

    /// Read guard on a user about to be referenced by a new row.
    ///
    /// Hold it until the row is inserted: `delete` needs the entry's write
    /// guard, so it cannot slip between the existence check and the insert.
    /// Release it before reading the user again through `user`.
    fn referenced_user(&self, id: i64) -> AppResult<Ref<'_, i64, User>> {
        self.users
            .get(&id)
            .ok_or_else(|| AppError::Internal(format!("dangling reference to user {}", id)))
    }

    fn item(&self, id: i64) -> AppResult<Item> {
        self.items
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or_else(|| AppError::Internal(format!("dangling reference to item {}", id)))
    }

    fn booking_details(&self, record: &BookingRecord) -> AppResult<Booking> {
        let item = self.item(record.item_id)?;
        let booker = self.user(record.booker_id)?;
        Ok(Booking {
            id: record.id,
            start: record.start,
            end: record.end,
            status: record.status,
            item: ItemShort::from(&item),
            booker: UserShort::from(&booker),
        })
    }

    fn comment_details(&self, record: &CommentRecord) -> AppResult<CommentDetails> {
        let author = self.user(record.author_id)?;
        Ok(CommentDetails {
            id: record.id,
            text: record.text.clone(),
            item_id: record.item_id,
            author_name: author.name,
            created: record.created,
        })
    }

    fn approved_for_item(&self, item_id: i64) -> Vec<BookingRecord> {
        self.bookings
            .iter()
            .filter(|e| e.item_id == item_id && e.status == BookingStatus::Approved)
            .map(|e| e.value().clone())
            .collect()
    }

    fn is_user_referenced(&self, id: i64) -> bool {
        self.items.iter().any(|e| e.owner_id == id)
            || self.bookings.iter().any(|e| e.booker_id == id)
            || self.comments.iter().any(|e| e.author_id == id)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn exists(&self, id: i64) -> AppResult<bool> {
        Ok(self.users.contains_key(&id))
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|e| e.value().clone()))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        match self.emails.entry(data.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("User email already exists".to_string())),
            Entry::Vacant(slot) => {
                let user = User {
                    id: self.user_ids.next(),
                    name: data.name.clone(),
                    email: data.email.clone(),
                };
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn update(&self, id: i64, data: &UpdateUser) -> AppResult<Option<User>> {
        let Some(current) = self.users.get(&id).map(|e| e.value().clone()) else {
            return Ok(None);
        };

        if let Some(email) = data.email.as_ref().filter(|e| **e != current.email) {
            match self.emails.entry(email.clone()) {
                Entry::Occupied(_) => {
                    return Err(AppError::Conflict("User email already exists".to_string()))
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove(&current.email);
        }

        let Some(mut entry) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &data.name {
            entry.name = name.clone();
        }
        if let Some(email) = &data.email {
            entry.email = email.clone();
        }
        Ok(Some(entry.value().clone()))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        // The entry write guard blocks inserts that reference this user until
        // the check and the removal are both done
        let removed = match self.users.entry(id) {
            Entry::Vacant(_) => return Ok(false),
            Entry::Occupied(entry) => {
                if self.is_user_referenced(id) {
                    return Err(AppError::Conflict("User is still referenced".to_string()));
                }
                entry.remove()
            }
        };
        self.emails.remove(&removed.email);
        Ok(true)
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        Ok(self
            .emails
            .get(email)
            .map_or(false, |owner| Some(*owner.value()) != exclude_id))
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Item>> {
        Ok(self.items.get(&id).map(|e| e.value().clone()))
    }

    async fn create(&self, owner_id: i64, data: &CreateItem) -> AppResult<Item> {
        let _owner = self.referenced_user(owner_id)?;
        let item = Item {
            id: self.item_ids.next(),
            name: data.name.clone(),
            description: data.description.clone(),
            available: data.available,
            owner_id,
            request_id: data.request_id,
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, id: i64, data: &UpdateItem) -> AppResult<Option<Item>> {
        let Some(mut entry) = self.items.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &data.name {
            entry.name = name.clone();
        }
        if let Some(description) = &data.description {
            entry.description = description.clone();
        }
        if let Some(available) = data.available {
            entry.available = available;
        }
        Ok(Some(entry.value().clone()))
    }

    async fn list_by_owner(&self, owner_id: i64, page: Page) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .map(|e| e.value().clone())
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(page.slice(items))
    }

    async fn search_available(&self, text: &str, page: Page) -> AppResult<Vec<Item>> {
        let needle = text.to_lowercase();
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|e| {
                e.available
                    && (e.name.to_lowercase().contains(&needle)
                        || e.description.to_lowercase().contains(&needle))
            })
            .map(|e| e.value().clone())
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(page.slice(items))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create(&self, booking: &NewBooking) -> AppResult<Booking> {
        let record = {
            let _booker = self.referenced_user(booking.booker_id)?;
            self.item(booking.item_id)?;

            let record = BookingRecord {
                id: self.booking_ids.next(),
                item_id: booking.item_id,
                booker_id: booking.booker_id,
                start: booking.start,
                end: booking.end,
                status: BookingStatus::Waiting,
            };
            self.bookings.insert(record.id, record.clone());
            record
        };
        self.booking_details(&record)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Booking>> {
        let record = self.bookings.get(&id).map(|e| e.value().clone());
        record.map(|r| self.booking_details(&r)).transpose()
    }

    async fn decide(&self, id: i64, status: BookingStatus) -> AppResult<Option<Booking>> {
        let decided = {
            let Some(mut entry) = self.bookings.get_mut(&id) else {
                return Ok(None);
            };
            if entry.status != BookingStatus::Waiting {
                return Ok(None);
            }
            entry.status = status;
            entry.value().clone()
        };
        self.booking_details(&decided).map(Some)
    }

    async fn list(&self, query: &BookingQuery) -> AppResult<Vec<Booking>> {
        let records: Vec<BookingRecord> = self.bookings.iter().map(|e| e.value().clone()).collect();

        let mut bookings = Vec::new();
        for record in &records {
            let booking = self.booking_details(record)?;
            if query.matches(&booking) {
                bookings.push(booking);
            }
        }
        bookings.sort_by(|a, b| b.start.cmp(&a.start).then(a.id.cmp(&b.id)));

        Ok(query.page.slice(bookings))
    }

    async fn last_for_item(&self, item_id: i64, now: DateTime<Utc>) -> AppResult<Option<Booking>> {
        self.approved_for_item(item_id)
            .into_iter()
            .filter(|b| b.end < now)
            .min_by(|a, b| b.end.cmp(&a.end).then(a.id.cmp(&b.id)))
            .map(|r| self.booking_details(&r))
            .transpose()
    }

    async fn next_for_item(&self, item_id: i64, now: DateTime<Utc>) -> AppResult<Option<Booking>> {
        self.approved_for_item(item_id)
            .into_iter()
            .filter(|b| b.start > now)
            .min_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)))
            .map(|r| self.booking_details(&r))
            .transpose()
    }

    async fn has_qualifying(
        &self,
        booker_id: i64,
        item_id: i64,
        statuses: &[BookingStatus],
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.bookings.iter().any(|e| {
            e.booker_id == booker_id
                && e.item_id == item_id
                && statuses.contains(&e.status)
                && e.end < now
        }))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create(&self, comment: &NewComment) -> AppResult<CommentDetails> {
        let record = {
            let _author = self.referenced_user(comment.author_id)?;
            self.item(comment.item_id)?;

            let record = CommentRecord {
                id: self.comment_ids.next(),
                item_id: comment.item_id,
                author_id: comment.author_id,
                text: comment.text.clone(),
                created: comment.created,
            };
            self.comments.insert(record.id, record.clone());
            record
        };
        self.comment_details(&record)
    }

    async fn recent_for_item(&self, item_id: i64, limit: i64) -> AppResult<Vec<CommentDetails>> {
        let mut records: Vec<CommentRecord> = self
            .comments
            .iter()
            .filter(|e| e.item_id == item_id)
            .map(|e| e.value().clone())
            .collect();
        records.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));

        records
            .iter()
            .take(limit.max(0) as usize)
            .map(|r| self.comment_details(r))
            .collect()
    }
}
