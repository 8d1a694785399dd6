use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::user::{PublicUser, User};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, handle, email, display_name, bio, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let user = row.map(|row| User {
            id: row.get("id"),
            handle: row.get("handle"),
            email: row.get("email"),
            display_name: row.get("display_name"),
            bio: row.get("bio"),
            created_at: row.get("created_at"),
        });

        Ok(user)
    }

    /// Public profile with follower/following/post counts resolved in one
    /// round trip.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<PublicUser>> {
        let row = sqlx::query(
            "SELECT u.id, u.handle, u.display_name, u.bio, u.created_at, \
                    (SELECT COUNT(*) FROM follows WHERE followee_id = u.id) AS followers_count, \
                    (SELECT COUNT(*) FROM follows WHERE follower_id = u.id) AS following_count, \
                    (SELECT COUNT(*) FROM posts WHERE author_id = u.id) AS posts_count \
             FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let profile = row.map(|row| PublicUser {
            id: row.get("id"),
            handle: row.get("handle"),
            display_name: row.get("display_name"),
            bio: row.get("bio"),
            created_at: row.get("created_at"),
            followers_count: row.get("followers_count"),
            following_count: row.get("following_count"),
            posts_count: row.get("posts_count"),
        });

        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: Option<String>,
        bio: Option<String>,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            "UPDATE users \
             SET display_name = COALESCE($2, display_name), \
                 bio = COALESCE($3, bio) \
             WHERE id = $1 \
             RETURNING id, handle, email, display_name, bio, created_at",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(bio)
        .fetch_optional(self.db.pool())
        .await?;

        let user = row.map(|row| User {
            id: row.get("id"),
            handle: row.get("handle"),
            email: row.get("email"),
            display_name: row.get("display_name"),
            bio: row.get("bio"),
            created_at: row.get("created_at"),
        });

        Ok(user)
    }

    /// Delete an account. The schema cascades to posts, comments, likes,
    /// follow edges, and notifications on both sides.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
