use anyhow::Result;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct FeedService {
    db: Db,
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Home feed: posts authored by the accounts the user currently follows,
    /// newest first. The following set is a single membership subquery, and
    /// the result is computed live on every call so that unfollowing takes
    /// effect immediately.
    pub async fn home_feed(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<(Vec<Post>, Option<(OffsetDateTime, Uuid)>)> {
        let limit_plus = limit + 1;
        let rows = match cursor {
            Some((created_at, post_id)) => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.handle AS author_handle, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     WHERE p.author_id IN ( \
                         SELECT followee_id FROM follows WHERE follower_id = $1 \
                     ) \
                       AND (p.created_at < $2 OR (p.created_at = $2 AND p.id < $3)) \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $4",
                )
                .bind(user_id)
                .bind(created_at)
                .bind(post_id)
                .bind(limit_plus)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.handle AS author_handle, p.body, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.author_id \
                     WHERE p.author_id IN ( \
                         SELECT followee_id FROM follows WHERE follower_id = $1 \
                     ) \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $2",
                )
                .bind(user_id)
                .bind(limit_plus)
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

        // More rows exist past this page; resume after the last returned post.
        let next_cursor = if posts.len() > limit as usize {
            posts.pop();
            posts.last().map(|post| (post.created_at, post.id))
        } else {
            None
        };

        Ok((posts, next_cursor))
    }
}
