use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PostStore;
use crate::error::{AppError, Result};
use crate::models::{Author, Group, NewGroup, Post, PostDraft, PostFilter};

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    text: String,
    author_id: Uuid,
    group_id: Option<i64>,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    groups: BTreeMap<i64, Group>,
    authors: BTreeMap<Uuid, Author>,
    posts: BTreeMap<i64, PostRow>,
    next_group_id: i64,
    next_post_id: i64,
}

impl Tables {
    fn join(&self, row: &PostRow) -> Result<Post> {
        let author = self
            .authors
            .get(&row.author_id)
            .ok_or_else(|| AppError::Internal(format!("post {} has no author row", row.id)))?;

        Ok(Post {
            id: row.id,
            text: row.text.clone(),
            author_id: row.author_id,
            author_username: author.username.clone(),
            group_id: row.group_id,
            created_at: row.created_at,
        })
    }

    fn check_group(&self, group_id: Option<i64>) -> Result<()> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => {
                Err(AppError::NotFound(format!("group {}", id)))
            }
            _ => Ok(()),
        }
    }

    /// Matching rows, newest first
    fn matching(&self, filter: PostFilter) -> Vec<&PostRow> {
        let mut rows: Vec<&PostRow> = self
            .posts
            .values()
            .filter(|row| match filter {
                PostFilter::All => true,
                PostFilter::Group(group_id) => row.group_id == Some(group_id),
                PostFilter::Author(author_id) => row.author_id == author_id,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }
}

/// Process-local store with the same integrity rules as the PostgreSQL one.
///
/// All tables sit behind one lock; each operation holds it for its whole
/// read-check-write.
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!("group slug '{}' already exists", group.slug)));
        }

        tables.next_group_id += 1;
        let group = Group {
            id: tables.next_group_id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn group_by_slug(&self, slug: &str) -> Result<Group> {
        let tables = self.tables.read().await;
        tables
            .groups
            .values()
            .find(|g| g.slug == slug)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))
    }

    async fn group_by_id(&self, group_id: i64) -> Result<Group> {
        let tables = self.tables.read().await;
        tables
            .groups
            .get(&group_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("group {}", group_id)))
    }

    async fn ensure_author(&self, author_id: Uuid, username: &str) -> Result<Author> {
        let mut tables = self.tables.write().await;
        if tables
            .authors
            .values()
            .any(|a| a.username == username && a.id != author_id)
        {
            return Err(AppError::Conflict(format!("username '{}' is taken", username)));
        }

        let author = Author {
            id: author_id,
            username: username.to_string(),
        };
        tables.authors.insert(author_id, author.clone());
        Ok(author)
    }

    async fn author_by_username(&self, username: &str) -> Result<Author> {
        let tables = self.tables.read().await;
        tables
            .authors
            .values()
            .find(|a| a.username == username)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("author '{}'", username)))
    }

    async fn insert_post(&self, author_id: Uuid, draft: PostDraft) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&author_id) {
            return Err(AppError::NotFound(format!("author {}", author_id)));
        }
        tables.check_group(draft.group_id)?;

        tables.next_post_id += 1;
        let row = PostRow {
            id: tables.next_post_id,
            text: draft.text,
            author_id,
            group_id: draft.group_id,
            created_at: Utc::now(),
        };
        let post = tables.join(&row)?;
        tables.posts.insert(row.id, row);
        Ok(post)
    }

    async fn post_by_id(&self, post_id: i64) -> Result<Post> {
        let tables = self.tables.read().await;
        let row = tables
            .posts
            .get(&post_id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;
        tables.join(row)
    }

    async fn update_post(&self, post_id: i64, author_id: Uuid, draft: PostDraft) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.check_group(draft.group_id)?;

        let row = tables
            .posts
            .get_mut(&post_id)
            .filter(|row| row.author_id == author_id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;
        row.text = draft.text;
        row.group_id = draft.group_id;

        let row = row.clone();
        tables.join(&row)
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let skip = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        tables
            .matching(filter)
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|row| tables.join(row))
            .collect()
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.matching(filter).len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_group(slug: &str) -> NewGroup {
        NewGroup {
            title: format!("Group {}", slug),
            slug: slug.to_string(),
            description: "test group".to_string(),
        }
    }

    fn draft(text: &str, group_id: Option<i64>) -> PostDraft {
        PostDraft {
            text: text.to_string(),
            group_id,
        }
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let store = InMemoryPostStore::new();
        store.create_group(new_group("cats")).await.unwrap();
        let err = store.create_group(new_group("cats")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn username_is_unique_across_identities() {
        let store = InMemoryPostStore::new();
        let first = Uuid::new_v4();
        store.ensure_author(first, "leo").await.unwrap();
        store.ensure_author(first, "leo").await.unwrap();

        let err = store.ensure_author(Uuid::new_v4(), "leo").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn insert_rejects_dangling_references() {
        let store = InMemoryPostStore::new();
        let err = store
            .insert_post(Uuid::new_v4(), draft("hello", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let author = store.ensure_author(Uuid::new_v4(), "leo").await.unwrap();
        let err = store
            .insert_post(author.id, draft("hello", Some(404)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_filtered() {
        let store = InMemoryPostStore::new();
        let author = store.ensure_author(Uuid::new_v4(), "leo").await.unwrap();
        let group = store.create_group(new_group("cats")).await.unwrap();

        let first = store.insert_post(author.id, draft("one", Some(group.id))).await.unwrap();
        store.insert_post(author.id, draft("two", None)).await.unwrap();
        let third = store.insert_post(author.id, draft("three", Some(group.id))).await.unwrap();

        let all = store.list_posts(PostFilter::All, 10, 0).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].text, "three");

        let grouped = store
            .list_posts(PostFilter::Group(group.id), 10, 0)
            .await
            .unwrap();
        let ids: Vec<i64> = grouped.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        assert_eq!(store.count_posts(PostFilter::Group(group.id)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_is_guarded_by_author() {
        let store = InMemoryPostStore::new();
        let owner = store.ensure_author(Uuid::new_v4(), "owner").await.unwrap();
        let other = store.ensure_author(Uuid::new_v4(), "other").await.unwrap();
        let post = store.insert_post(owner.id, draft("original", None)).await.unwrap();

        let err = store
            .update_post(post.id, other.id, draft("hijacked", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.post_by_id(post.id).await.unwrap().text, "original");

        let updated = store
            .update_post(post.id, owner.id, draft("edited", None))
            .await
            .unwrap();
        assert_eq!(updated.text, "edited");
        assert_eq!(updated.created_at, post.created_at);
        assert_eq!(updated.author_id, owner.id);
    }

    #[tokio::test]
    async fn offset_past_the_end_yields_nothing() {
        let store = InMemoryPostStore::new();
        let author = store.ensure_author(Uuid::new_v4(), "leo").await.unwrap();
        store.insert_post(author.id, draft("only", None)).await.unwrap();

        let posts = store.list_posts(PostFilter::All, 10, 10).await.unwrap();
        assert!(posts.is_empty());
    }
}
