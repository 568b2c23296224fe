//! Store tests against a live PostgreSQL database
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;

use shareit_server::{
    models::{
        comment::CommentDetails,
        item::CreateItem,
        user::CreateUser,
        BookingQuery, BookingState, BookingStatus, BookingSubject, NewBooking, NewComment, Page,
    },
    repository::Repository,
    AppError,
};

static SEQ: AtomicU32 = AtomicU32::new(0);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Tag unique across test runs sharing one database
fn unique(prefix: &str) -> String {
    format!(
        "{}-{}-{}-{}",
        prefix,
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

async fn connect() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::postgres(pool)
}

async fn user(repository: &Repository, name: &str) -> i64 {
    repository
        .users
        .create(&CreateUser {
            name: name.into(),
            email: format!("{}@mail.com", unique(name)),
        })
        .await
        .unwrap()
        .id
}

async fn item(repository: &Repository, owner_id: i64, name: &str) -> i64 {
    repository
        .items
        .create(
            owner_id,
            &CreateItem {
                name: name.into(),
                description: "Cordless drill".into(),
                available: true,
                request_id: None,
            },
        )
        .await
        .unwrap()
        .id
}

async fn booking(repository: &Repository, item_id: i64, booker_id: i64, start: i64, end: i64) -> i64 {
    repository
        .bookings
        .create(&NewBooking {
            item_id,
            booker_id,
            start: now() + Duration::days(start),
            end: now() + Duration::days(end),
        })
        .await
        .unwrap()
        .id
}

async fn decided(
    repository: &Repository,
    item_id: i64,
    booker_id: i64,
    start: i64,
    end: i64,
    status: BookingStatus,
) -> i64 {
    let id = booking(repository, item_id, booker_id, start, end).await;
    repository.bookings.decide(id, status).await.unwrap().unwrap();
    id
}

async fn ids(repository: &Repository, subject: BookingSubject, state: BookingState, page: Page) -> Vec<i64> {
    let query = BookingQuery { subject, state, now: now(), page };
    repository
        .bookings
        .list(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect()
}

#[tokio::test]
#[ignore]
async fn test_state_views_and_ordering() {
    let repository = connect().await;
    let owner = user(&repository, "owner").await;
    let booker = user(&repository, "booker").await;
    let drill = item(&repository, owner, "Drill").await;

    let past = decided(&repository, drill, booker, -5, -3, BookingStatus::Approved).await;
    let current = decided(&repository, drill, booker, -1, 1, BookingStatus::Approved).await;
    let waiting = booking(&repository, drill, booker, 2, 3).await;
    let future = decided(&repository, drill, booker, 4, 5, BookingStatus::Approved).await;
    let rejected = decided(&repository, drill, booker, 6, 7, BookingStatus::Rejected).await;

    let page = Page::new(0, 50).unwrap();
    let expected = [
        (BookingState::All, vec![rejected, future, waiting, current, past]),
        (BookingState::Current, vec![current]),
        (BookingState::Past, vec![past]),
        (BookingState::Future, vec![future, waiting]),
        (BookingState::Waiting, vec![waiting]),
        (BookingState::Rejected, vec![rejected]),
    ];
    for (state, want) in expected {
        assert_eq!(ids(&repository, BookingSubject::Booker(booker), state, page).await, want, "booker {}", state);
        assert_eq!(ids(&repository, BookingSubject::Owner(owner), state, page).await, want, "owner {}", state);
    }

    assert!(ids(&repository, BookingSubject::Owner(booker), BookingState::All, page)
        .await
        .is_empty());

    let window = Page::new(1, 2).unwrap();
    assert_eq!(
        ids(&repository, BookingSubject::Booker(booker), BookingState::All, window).await,
        vec![future, waiting]
    );
}

#[tokio::test]
#[ignore]
async fn test_decide_only_once() {
    let repository = connect().await;
    let owner = user(&repository, "owner").await;
    let booker = user(&repository, "booker").await;
    let drill = item(&repository, owner, "Drill").await;
    let id = booking(&repository, drill, booker, 1, 2).await;

    let approved = repository.bookings.decide(id, BookingStatus::Approved).await.unwrap();
    let approved = approved.unwrap();
    assert_eq!(approved.status, BookingStatus::Approved);
    assert_eq!(approved.item.owner_id, owner);
    assert_eq!(approved.booker.id, booker);

    assert!(repository.bookings.decide(id, BookingStatus::Rejected).await.unwrap().is_none());
    assert!(repository.bookings.decide(-1, BookingStatus::Approved).await.unwrap().is_none());

    let stored = repository.bookings.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Approved);
}

#[tokio::test]
#[ignore]
async fn test_last_next_and_comment_eligibility() {
    let repository = connect().await;
    let owner = user(&repository, "owner").await;
    let booker = user(&repository, "booker").await;
    let stranger = user(&repository, "stranger").await;
    let drill = item(&repository, owner, "Drill").await;

    let last = decided(&repository, drill, booker, -6, -4, BookingStatus::Approved).await;
    decided(&repository, drill, booker, -3, -2, BookingStatus::Rejected).await;
    booking(&repository, drill, booker, 1, 2).await;
    let next = decided(&repository, drill, booker, 3, 4, BookingStatus::Approved).await;
    decided(&repository, drill, stranger, -3, -2, BookingStatus::Rejected).await;

    let found = repository.bookings.last_for_item(drill, now()).await.unwrap();
    assert_eq!(found.map(|b| b.id), Some(last));
    let found = repository.bookings.next_for_item(drill, now()).await.unwrap();
    assert_eq!(found.map(|b| b.id), Some(next));

    let eligible = BookingStatus::COMMENT_ELIGIBLE;
    assert!(repository.bookings.has_qualifying(booker, drill, eligible, now()).await.unwrap());
    assert!(!repository.bookings.has_qualifying(stranger, drill, eligible, now()).await.unwrap());
    assert!(!repository.bookings.has_qualifying(booker, drill, &[], now()).await.unwrap());
    // not finished yet at the moment it started
    let early = now() - Duration::days(5);
    assert!(!repository.bookings.has_qualifying(booker, drill, eligible, early).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_search_treats_wildcards_literally() {
    let repository = connect().await;
    let owner = user(&repository, "owner").await;
    let tag = unique("cotton");
    let percent = item(&repository, owner, &format!("{} 100% wool", tag)).await;
    let digits = item(&repository, owner, &format!("{} 1000 wool", tag)).await;
    let underscore = item(&repository, owner, &format!("{} a_b", tag)).await;
    let letters = item(&repository, owner, &format!("{} axb", tag)).await;

    let page = Page::new(0, 50).unwrap();
    let search = |text: String| {
        let repository = repository.clone();
        async move {
            repository
                .items
                .search_available(&text, page)
                .await
                .unwrap()
                .into_iter()
                .map(|i| i.id)
                .collect::<Vec<_>>()
        }
    };

    assert_eq!(search(format!("{} 100%", tag)).await, vec![percent]);
    assert_eq!(search(format!("{} A_B", tag)).await, vec![underscore]);
    assert_eq!(search(tag.to_uppercase()).await, vec![percent, digits, underscore, letters]);
}

#[tokio::test]
#[ignore]
async fn test_comments_newest_first_and_restricted_delete() {
    let repository = connect().await;
    let owner = user(&repository, "owner").await;
    let author = user(&repository, "author").await;
    let drill = item(&repository, owner, "Drill").await;

    for (days, text) in [(1, "first"), (3, "third"), (2, "second")] {
        repository
            .comments
            .create(&NewComment {
                item_id: drill,
                author_id: author,
                text: text.into(),
                created: now() + Duration::days(days),
            })
            .await
            .unwrap();
    }

    let recent: Vec<CommentDetails> = repository.comments.recent_for_item(drill, 2).await.unwrap();
    let texts: Vec<&str> = recent.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["third", "second"]);
    assert!(recent.iter().all(|c| c.author_name == "author" && c.item_id == drill));

    let err = repository.users.delete(author).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let err = repository.users.delete(owner).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let idle = user(&repository, "idle").await;
    assert!(repository.users.delete(idle).await.unwrap());
    assert!(!repository.users.delete(idle).await.unwrap());
}
