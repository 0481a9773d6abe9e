use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::PostStore;
use crate::error::{AppError, Result};
use crate::models::{Author, Group, NewGroup, Post, PostDraft, PostFilter};

/// PostgreSQL-backed store.
///
/// Every write is one statement, so each create/edit is atomic without an
/// explicit transaction. Post rows are always returned joined with their
/// author's username.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn group_by_slug(&self, slug: &str) -> Result<Group> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))
    }

    async fn group_by_id(&self, group_id: i64) -> Result<Group> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group {}", group_id)))
    }

    async fn ensure_author(&self, author_id: Uuid, username: &str) -> Result<Author> {
        // A renamed identity keeps its posts; a username taken by another id
        // trips the unique index and surfaces as Conflict.
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (id, username)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username
            RETURNING id, username
            "#,
        )
        .bind(author_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    async fn author_by_username(&self, username: &str) -> Result<Author> {
        sqlx::query_as::<_, Author>("SELECT id, username FROM authors WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("author '{}'", username)))
    }

    async fn insert_post(&self, author_id: Uuid, draft: PostDraft) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (text, author_id, group_id)
                VALUES ($1, $2, $3)
                RETURNING id, text, author_id, group_id, created_at
            )
            SELECT i.id, i.text, i.author_id, a.username AS author_username,
                   i.group_id, i.created_at
            FROM inserted i
            JOIN authors a ON a.id = i.author_id
            "#,
        )
        .bind(&draft.text)
        .bind(author_id)
        .bind(draft.group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn post_by_id(&self, post_id: i64) -> Result<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.text, p.author_id, a.username AS author_username,
                   p.group_id, p.created_at
            FROM posts p
            JOIN authors a ON a.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    async fn update_post(&self, post_id: i64, author_id: Uuid, draft: PostDraft) -> Result<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts
                SET text = $1, group_id = $2
                WHERE id = $3 AND author_id = $4
                RETURNING id, text, author_id, group_id, created_at
            )
            SELECT u.id, u.text, u.author_id, a.username AS author_username,
                   u.group_id, u.created_at
            FROM updated u
            JOIN authors a ON a.id = u.author_id
            "#,
        )
        .bind(&draft.text)
        .bind(draft.group_id)
        .bind(post_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        const SELECT: &str = r#"
            SELECT p.id, p.text, p.author_id, a.username AS author_username,
                   p.group_id, p.created_at
            FROM posts p
            JOIN authors a ON a.id = p.author_id
        "#;
        const ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC";

        let posts = match filter {
            PostFilter::All => {
                let sql = format!("{SELECT} {ORDER} LIMIT $1 OFFSET $2");
                sqlx::query_as::<_, Post>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            PostFilter::Group(group_id) => {
                let sql = format!("{SELECT} WHERE p.group_id = $1 {ORDER} LIMIT $2 OFFSET $3");
                sqlx::query_as::<_, Post>(&sql)
                    .bind(group_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            PostFilter::Author(author_id) => {
                let sql = format!("{SELECT} WHERE p.author_id = $1 {ORDER} LIMIT $2 OFFSET $3");
                sqlx::query_as::<_, Post>(&sql)
                    .bind(author_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(posts)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let row = match filter {
            PostFilter::All => {
                sqlx::query("SELECT COUNT(*) AS count FROM posts")
                    .fetch_one(&self.pool)
                    .await?
            }
            PostFilter::Group(group_id) => {
                sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE group_id = $1")
                    .bind(group_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            PostFilter::Author(author_id) => {
                sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE author_id = $1")
                    .bind(author_id)
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(row.get::<i64, _>("count"))
    }
}
