use anyhow::Result;
use sqlx::Row;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::user::User;
use crate::infra::db::Db;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SocialGraphError {
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("user not found")]
    TargetNotFound,
}

#[derive(Clone)]
pub struct SocialService {
    db: Db,
}

#[derive(Debug, Clone)]
pub struct SocialUserEdge {
    pub user: User,
    pub followed_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct RelationshipStatus {
    pub is_following: bool,
    pub is_followed_by: bool,
}

impl SocialService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create the follower -> followee edge. Returns true if a new edge was
    /// created, false if it already existed. Concurrent duplicate inserts
    /// collapse into the already-exists case via the store's uniqueness
    /// constraint.
    pub async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        if follower_id == followee_id {
            return Err(SocialGraphError::SelfFollow.into());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(followee_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Err(SocialGraphError::TargetNotFound.into());
        }

        let result = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove the edge if present. Returns false (not an error) when no
    /// edge existed; a self-unfollow lands in the same case because a
    /// self-edge can never exist.
    pub async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    pub async fn list_followers(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<SocialUserEdge>> {
        let rows = match cursor {
            Some((created_at, follower_id)) => {
                sqlx::query(
                    "SELECT u.id, u.handle, u.email, u.display_name, u.bio, \
                            u.created_at, f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.follower_id \
                     WHERE f.followee_id = $1 \
                       AND (f.created_at < $2 OR (f.created_at = $2 AND f.follower_id < $3)) \
                     ORDER BY f.created_at DESC, f.follower_id DESC \
                     LIMIT $4",
                )
                .bind(user_id)
                .bind(created_at)
                .bind(follower_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT u.id, u.handle, u.email, u.display_name, u.bio, \
                            u.created_at, f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.follower_id \
                     WHERE f.followee_id = $1 \
                     ORDER BY f.created_at DESC, f.follower_id DESC \
                     LIMIT $2",
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(SocialUserEdge {
                user: User {
                    id: row.get("id"),
                    handle: row.get("handle"),
                    email: row.get("email"),
                    display_name: row.get("display_name"),
                    bio: row.get("bio"),
                    created_at: row.get("created_at"),
                },
                followed_at: row.get("followed_at"),
            });
        }

        Ok(items)
    }

    pub async fn list_following(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<SocialUserEdge>> {
        let rows = match cursor {
            Some((created_at, followee_id)) => {
                sqlx::query(
                    "SELECT u.id, u.handle, u.email, u.display_name, u.bio, \
                            u.created_at, f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.followee_id \
                     WHERE f.follower_id = $1 \
                       AND (f.created_at < $2 OR (f.created_at = $2 AND f.followee_id < $3)) \
                     ORDER BY f.created_at DESC, f.followee_id DESC \
                     LIMIT $4",
                )
                .bind(user_id)
                .bind(created_at)
                .bind(followee_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT u.id, u.handle, u.email, u.display_name, u.bio, \
                            u.created_at, f.created_at AS followed_at \
                     FROM follows f \
                     JOIN users u ON u.id = f.followee_id \
                     WHERE f.follower_id = $1 \
                     ORDER BY f.created_at DESC, f.followee_id DESC \
                     LIMIT $2",
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(SocialUserEdge {
                user: User {
                    id: row.get("id"),
                    handle: row.get("handle"),
                    email: row.get("email"),
                    display_name: row.get("display_name"),
                    bio: row.get("bio"),
                    created_at: row.get("created_at"),
                },
                followed_at: row.get("followed_at"),
            });
        }

        Ok(items)
    }

    pub async fn relationship_status(
        &self,
        viewer_id: Uuid,
        other_id: Uuid,
    ) -> Result<RelationshipStatus> {
        let row = sqlx::query(
            "SELECT \
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2) AS is_following, \
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $2 AND followee_id = $1) AS is_followed_by",
        )
        .bind(viewer_id)
        .bind(other_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(RelationshipStatus {
            is_following: row.get("is_following"),
            is_followed_by: row.get("is_followed_by"),
        })
    }
}
