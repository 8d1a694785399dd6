use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVerb {
    Liked,
    Commented,
}

impl NotificationVerb {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "liked" => Some(Self::Liked),
            "commented" => Some(Self::Commented),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Commented => "commented",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub verb: NotificationVerb,
    pub post_id: Uuid,
    pub comment_id: Option<Uuid>,
    /// NULL while unread; set once and never cleared.
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
