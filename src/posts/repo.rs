use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewPost, Post, PostWithAuthor};
use crate::db::StoreError;

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError>;

    /// Newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PostWithAuthor>, StoreError>;
}

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let row = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, content, user_email)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, user_email, created_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.user_email)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PostWithAuthor>, StoreError> {
        let rows = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.title, p.content, p.created_at,
                   u.email AS user_email, u.name AS user_name
              FROM posts p
              JOIN users u ON u.email = p.user_email
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
