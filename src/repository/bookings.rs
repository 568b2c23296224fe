//! Bookings repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, QueryBuilder};

use super::BookingStore;
use crate::{
    error::AppResult,
    models::{
        booking::BookingRow, Booking, BookingQuery, BookingStatus, BookingSubject, NewBooking,
        TimeWindow,
    },
};

/// Booking columns joined with the item and booker they reference
const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.start_date, b.end_date, b.status,
           i.id AS item_id, i.name AS item_name, i.owner_id AS item_owner_id,
           u.id AS booker_id, u.name AS booker_name
    FROM bookings b
    JOIN items i ON b.item_id = i.id
    JOIN users u ON b.booker_id = u.id
"#;

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for BookingsRepository {
    async fn create(&self, booking: &NewBooking) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            WITH inserted AS (
                INSERT INTO bookings (start_date, end_date, item_id, booker_id, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT b.id, b.start_date, b.end_date, b.status,
                   i.id AS item_id, i.name AS item_name, i.owner_id AS item_owner_id,
                   u.id AS booker_id, u.name AS booker_name
            FROM inserted b
            JOIN items i ON b.item_id = i.id
            JOIN users u ON b.booker_id = u.id
            "#,
        )
        .bind(booking.start)
        .bind(booking.end)
        .bind(booking.item_id)
        .bind(booking.booker_id)
        .bind(BookingStatus::Waiting)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("{} WHERE b.id = $1", BOOKING_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Booking::from))
    }

    async fn decide(&self, id: i64, status: BookingStatus) -> AppResult<Option<Booking>> {
        // The WHERE clause re-checks the status under the row lock taken by UPDATE
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            WITH updated AS (
                UPDATE bookings SET status = $1
                WHERE id = $2 AND status = $3
                RETURNING *
            )
            SELECT b.id, b.start_date, b.end_date, b.status,
                   i.id AS item_id, i.name AS item_name, i.owner_id AS item_owner_id,
                   u.id AS booker_id, u.name AS booker_name
            FROM updated b
            JOIN items i ON b.item_id = i.id
            JOIN users u ON b.booker_id = u.id
            "#,
        )
        .bind(status)
        .bind(id)
        .bind(BookingStatus::Waiting)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn list(&self, query: &BookingQuery) -> AppResult<Vec<Booking>> {
        let mut builder = QueryBuilder::<Postgres>::new(BOOKING_SELECT);

        match query.subject {
            BookingSubject::Booker(id) => builder.push(" WHERE b.booker_id = ").push_bind(id),
            BookingSubject::Owner(id) => builder.push(" WHERE i.owner_id = ").push_bind(id),
        };

        if let Some(statuses) = query.state.statuses() {
            builder.push(" AND b.status IN (");
            {
                let mut separated = builder.separated(", ");
                for status in statuses {
                    separated.push_bind(*status);
                }
                separated.push_unseparated(")");
            }
        }

        match query.state.window() {
            TimeWindow::Any => {}
            TimeWindow::Current => {
                builder
                    .push(" AND b.start_date <= ")
                    .push_bind(query.now)
                    .push(" AND b.end_date > ")
                    .push_bind(query.now);
            }
            TimeWindow::Past => {
                builder.push(" AND b.end_date < ").push_bind(query.now);
            }
            TimeWindow::Future => {
                builder.push(" AND b.start_date > ").push_bind(query.now);
            }
        }

        builder
            .push(" ORDER BY b.start_date DESC, b.id ASC LIMIT ")
            .push_bind(query.page.limit())
            .push(" OFFSET ")
            .push_bind(query.page.offset());

        let rows = builder
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn last_for_item(&self, item_id: i64, now: DateTime<Utc>) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE b.item_id = $1 AND b.status = $2 AND b.end_date < $3 ORDER BY b.end_date DESC, b.id ASC LIMIT 1",
            BOOKING_SELECT
        ))
        .bind(item_id)
        .bind(BookingStatus::Approved)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Booking::from))
    }

    async fn next_for_item(&self, item_id: i64, now: DateTime<Utc>) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE b.item_id = $1 AND b.status = $2 AND b.start_date > $3 ORDER BY b.start_date ASC, b.id ASC LIMIT 1",
            BOOKING_SELECT
        ))
        .bind(item_id)
        .bind(BookingStatus::Approved)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Booking::from))
    }

    async fn has_qualifying(
        &self,
        booker_id: i64,
        item_id: i64,
        statuses: &[BookingStatus],
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        if statuses.is_empty() {
            return Ok(false);
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE booker_id = ",
        );
        builder
            .push_bind(booker_id)
            .push(" AND item_id = ")
            .push_bind(item_id)
            .push(" AND end_date < ")
            .push_bind(now)
            .push(" AND status IN (");
        {
            let mut separated = builder.separated(", ");
            for status in statuses {
                separated.push_bind(*status);
            }
            separated.push_unseparated("))");
        }

        let exists: bool = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(exists)
    }
}
