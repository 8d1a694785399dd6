use anyhow::Result;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author_id: Uuid, body: String) -> Result<Post> {
        let row = sqlx::query(
            "INSERT INTO posts (author_id, body) VALUES ($1, $2) \
             RETURNING id, author_id, body, created_at",
        )
        .bind(author_id)
        .bind(body)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Post {
            id: row.get("id"),
            author_id: row.get("author_id"),
            author_handle: None,
            body: row.get("body"),
            created_at: row.get("created_at"),
        })
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT p.id, p.author_id, u.handle AS author_handle, p.body, p.created_at \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             WHERE p.id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        let post = row.map(|row| Post {
            id: row.get("id"),
            author_id: row.get("author_id"),
            author_handle: row.get("author_handle"),
            body: row.get("body"),
            created_at: row.get("created_at"),
        });

        Ok(post)
    }

    pub async fn list_by_user(
        &self,
        author_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let rows = match cursor {
            Some((created_at, post_id)) => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.handle AS author_handle, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     WHERE p.author_id = $1 \
                       AND (p.created_at < $2 OR (p.created_at = $2 AND p.id < $3)) \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $4",
                )
                .bind(author_id)
                .bind(created_at)
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.handle AS author_handle, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     WHERE p.author_id = $1 \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $2",
                )
                .bind(author_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(Post {
                id: row.get("id"),
                author_id: row.get("author_id"),
                author_handle: row.get("author_handle"),
                body: row.get("body"),
                created_at: row.get("created_at"),
            });
        }

        Ok(posts)
    }

    /// Edit a post's body. The ownership check is part of the UPDATE
    /// predicate, so a post owned by someone else behaves like a missing one.
    pub async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Option<Post>> {
        let row = sqlx::query(
            "UPDATE posts SET body = $3 \
             WHERE id = $1 AND author_id = $2 \
             RETURNING id, author_id, body, created_at",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(body)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| Post {
            id: row.get("id"),
            author_id: row.get("author_id"),
            author_handle: None,
            body: row.get("body"),
            created_at: row.get("created_at"),
        }))
    }

    /// Delete a post owned by the caller. Likes, comments, and notifications
    /// referencing it cascade in the store.
    pub async fn delete_post(&self, post_id: Uuid, author_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(post_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
