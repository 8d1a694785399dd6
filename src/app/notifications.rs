use anyhow::Result;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::engagement::{Comment, Like};
use crate::domain::notification::{Notification, NotificationVerb};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct NotificationService {
    db: Db,
}

impl NotificationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Fanout callback for a committed like. Invoked explicitly by the
    /// content handler after the like is durable; never notifies the actor
    /// about their own action, regardless of history. Returns whether a
    /// notification was written.
    pub async fn on_like_created(&self, like: &Like, post_author_id: Uuid) -> Result<bool> {
        if like.user_id == post_author_id {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO notifications (recipient_id, actor_id, verb, post_id) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(post_author_id)
        .bind(like.user_id)
        .bind(NotificationVerb::Liked.as_db())
        .bind(like.post_id)
        .execute(self.db.pool())
        .await?;

        Ok(true)
    }

    /// Fanout callback for a committed comment. Same suppression rule as
    /// likes: the post author is only notified about other people's comments.
    pub async fn on_comment_created(&self, comment: &Comment, post_author_id: Uuid) -> Result<bool> {
        if comment.user_id == post_author_id {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO notifications (recipient_id, actor_id, verb, post_id, comment_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(post_author_id)
        .bind(comment.user_id)
        .bind(NotificationVerb::Commented.as_db())
        .bind(comment.post_id)
        .bind(comment.id)
        .execute(self.db.pool())
        .await?;

        Ok(true)
    }

    pub async fn list(
        &self,
        recipient_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        self.list_filtered(recipient_id, cursor, limit, false).await
    }

    pub async fn list_unread(
        &self,
        recipient_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        self.list_filtered(recipient_id, cursor, limit, true).await
    }

    async fn list_filtered(
        &self,
        recipient_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let rows = match cursor {
            Some((created_at, notification_id)) => {
                sqlx::query(
                    "SELECT id, recipient_id, actor_id, verb, post_id, comment_id, read_at, created_at \
                     FROM notifications \
                     WHERE recipient_id = $1 \
                       AND (NOT $2 OR read_at IS NULL) \
                       AND (created_at < $3 OR (created_at = $3 AND id < $4)) \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $5",
                )
                .bind(recipient_id)
                .bind(unread_only)
                .bind(created_at)
                .bind(notification_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, recipient_id, actor_id, verb, post_id, comment_id, read_at, created_at \
                     FROM notifications \
                     WHERE recipient_id = $1 \
                       AND (NOT $2 OR read_at IS NULL) \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $3",
                )
                .bind(recipient_id)
                .bind(unread_only)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let verb: String = row.get("verb");
            let verb = NotificationVerb::from_db(&verb)
                .ok_or_else(|| anyhow::anyhow!("unknown notification verb: {}", verb))?;

            notifications.push(Notification {
                id: row.get("id"),
                recipient_id: row.get("recipient_id"),
                actor_id: row.get("actor_id"),
                verb,
                post_id: row.get("post_id"),
                comment_id: row.get("comment_id"),
                read_at: row.get("read_at"),
                created_at: row.get("created_at"),
            });
        }

        Ok(notifications)
    }

    /// Mark a single notification read. Authorization is by ownership: a
    /// notification belonging to someone else behaves exactly like one that
    /// does not exist. COALESCE keeps the original read_at, so the
    /// unread -> read transition happens at most once.
    pub async fn mark_read(&self, notification_id: Uuid, recipient_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = COALESCE(read_at, now()) \
             WHERE id = $1 AND recipient_id = $2",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification read; returns how many transitioned.
    /// Idempotent: a second call finds nothing unread and returns 0.
    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = now() \
             WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
