/// Database access layer
///
/// This module provides:
/// - `PostStore`: the repository contract for groups, authors and posts
/// - `PgPostStore`: PostgreSQL implementation backed by `sqlx`
/// - `InMemoryPostStore`: process-local implementation for tests and local runs
/// - Connection pool creation and embedded migrations
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Author, Group, NewGroup, Post, PostDraft, PostFilter};

pub mod memory;
pub mod pool;
pub mod post_repo;

pub use memory::InMemoryPostStore;
pub use pool::{create_pool, run_migrations, DbConfig};
pub use post_repo::PgPostStore;

/// Repository over the three persisted records.
///
/// Lookups that match nothing fail with `AppError::NotFound`. Writes that
/// reference a missing author or group fail the same way; duplicate slugs or
/// usernames fail with `AppError::Conflict`. Every write is a single atomic
/// unit.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn group_by_slug(&self, slug: &str) -> Result<Group>;

    async fn group_by_id(&self, group_id: i64) -> Result<Group>;

    /// Record an identity supplied by the auth layer, returning the stored row.
    ///
    /// Idempotent for a matching `(id, username)` pair.
    async fn ensure_author(&self, author_id: Uuid, username: &str) -> Result<Author>;

    async fn author_by_username(&self, username: &str) -> Result<Author>;

    async fn insert_post(&self, author_id: Uuid, draft: PostDraft) -> Result<Post>;

    async fn post_by_id(&self, post_id: i64) -> Result<Post>;

    /// Replace text and group of a post owned by `author_id`.
    ///
    /// Ownership is re-checked inside the write; a post that does not exist or
    /// belongs to someone else yields `NotFound` and nothing changes.
    async fn update_post(&self, post_id: i64, author_id: Uuid, draft: PostDraft) -> Result<Post>;

    /// Matching posts, newest first
    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;
}
