//! Comments repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::CommentStore;
use crate::{
    error::AppResult,
    models::{CommentDetails, NewComment},
};

#[derive(Clone)]
pub struct CommentsRepository {
    pool: Pool<Postgres>,
}

impl CommentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for CommentsRepository {
    async fn create(&self, comment: &NewComment) -> AppResult<CommentDetails> {
        let created = sqlx::query_as::<_, CommentDetails>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (text, item_id, author_id, created)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT c.id, c.text, c.item_id, u.name AS author_name, c.created
            FROM inserted c
            JOIN users u ON c.author_id = u.id
            "#,
        )
        .bind(&comment.text)
        .bind(comment.item_id)
        .bind(comment.author_id)
        .bind(comment.created)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn recent_for_item(&self, item_id: i64, limit: i64) -> AppResult<Vec<CommentDetails>> {
        let comments = sqlx::query_as::<_, CommentDetails>(
            r#"
            SELECT c.id, c.text, c.item_id, u.name AS author_name, c.created
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.item_id = $1
            ORDER BY c.created DESC, c.id DESC
            LIMIT $2
            "#,
        )
        .bind(item_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}
