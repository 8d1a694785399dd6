use anyhow::Result;
use sqlx::Row;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::engagement::{Comment, Like};
use crate::infra::db::Db;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngagementError {
    #[error("post not found")]
    PostNotFound,
}

/// A freshly committed like, together with the post author the fanout
/// callback needs.
#[derive(Debug, Clone)]
pub struct NewLike {
    pub like: Like,
    pub post_author_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub comment: Comment,
    pub post_author_id: Uuid,
}

#[derive(Clone)]
pub struct EngagementService {
    db: Db,
}

impl EngagementService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Like a post. Returns None when the user already liked it; a
    /// concurrent duplicate insert loses to the unique (user_id, post_id)
    /// constraint and lands in the same case.
    pub async fn like_post(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<NewLike>> {
        let post_author_id = self.post_author(post_id).await?;

        let row = sqlx::query(
            "INSERT INTO likes (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING \
             RETURNING id, user_id, post_id, created_at",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| NewLike {
            like: Like {
                id: row.get("id"),
                user_id: row.get("user_id"),
                post_id: row.get("post_id"),
                created_at: row.get("created_at"),
            },
            post_author_id,
        }))
    }

    pub async fn unlike_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn comment_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        body: String,
    ) -> Result<NewComment> {
        let post_author_id = self.post_author(post_id).await?;

        let row = sqlx::query(
            "INSERT INTO comments (author_id, post_id, body) VALUES ($1, $2, $3) \
             RETURNING id, author_id, post_id, body, created_at",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(body)
        .fetch_one(self.db.pool())
        .await?;

        Ok(NewComment {
            comment: Comment {
                id: row.get("id"),
                user_id: row.get("author_id"),
                post_id: row.get("post_id"),
                body: row.get("body"),
                created_at: row.get("created_at"),
            },
            post_author_id,
        })
    }

    pub async fn list_likes(
        &self,
        post_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Like>> {
        let rows = match cursor {
            Some((created_at, like_id)) => {
                sqlx::query(
                    "SELECT id, user_id, post_id, created_at \
                     FROM likes \
                     WHERE post_id = $1 \
                       AND (created_at < $2 OR (created_at = $2 AND id < $3)) \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $4",
                )
                .bind(post_id)
                .bind(created_at)
                .bind(like_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, post_id, created_at \
                     FROM likes \
                     WHERE post_id = $1 \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $2",
                )
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut likes = Vec::with_capacity(rows.len());
        for row in rows {
            likes.push(Like {
                id: row.get("id"),
                user_id: row.get("user_id"),
                post_id: row.get("post_id"),
                created_at: row.get("created_at"),
            });
        }

        Ok(likes)
    }

    pub async fn list_comments(
        &self,
        post_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let rows = match cursor {
            Some((created_at, comment_id)) => {
                sqlx::query(
                    "SELECT id, author_id, post_id, body, created_at \
                     FROM comments \
                     WHERE post_id = $1 \
                       AND (created_at < $2 OR (created_at = $2 AND id < $3)) \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $4",
                )
                .bind(post_id)
                .bind(created_at)
                .bind(comment_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, author_id, post_id, body, created_at \
                     FROM comments \
                     WHERE post_id = $1 \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $2",
                )
                .bind(post_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(Comment {
                id: row.get("id"),
                user_id: row.get("author_id"),
                post_id: row.get("post_id"),
                body: row.get("body"),
                created_at: row.get("created_at"),
            });
        }

        Ok(comments)
    }

    /// Edit a comment's body. Ownership is part of the UPDATE predicate;
    /// editing someone else's comment looks like editing a missing one.
    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        post_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "UPDATE comments SET body = $4 \
             WHERE id = $1 AND post_id = $2 AND author_id = $3 \
             RETURNING id, author_id, post_id, body, created_at",
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(user_id)
        .bind(body)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| Comment {
            id: row.get("id"),
            user_id: row.get("author_id"),
            post_id: row.get("post_id"),
            body: row.get("body"),
            created_at: row.get("created_at"),
        }))
    }

    pub async fn delete_comment(
        &self,
        comment_id: Uuid,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM comments WHERE id = $1 AND post_id = $2 AND author_id = $3",
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn post_author(&self, post_id: Uuid) -> Result<Uuid> {
        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(self.db.pool())
                .await?;

        author_id.ok_or_else(|| EngagementError::PostNotFound.into())
    }
}
