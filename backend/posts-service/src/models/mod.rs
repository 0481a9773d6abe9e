/// Data models for posts-service
///
/// This module defines structures for:
/// - Group: A named community that posts may be filed under
/// - Author: The identity (mirrored from the auth layer) that owns posts
/// - Post: A single authored text entry, optionally tagged with a group
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Community that groups posts under a shared slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Input for administrative group creation
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Post author as known to this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}

/// Post entity, joined with its author's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// Validated post fields ready to be persisted.
///
/// Carries only the user-editable fields; the author is injected by the
/// service and the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
}

/// Row selection for listing and counting posts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
}
