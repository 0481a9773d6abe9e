/// Post service - listing, retrieval, creation and author-only editing
use serde::Serialize;
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::db::PostStore;
use crate::error::Result;
use crate::forms::PostForm;
use crate::metrics::posts::{record_write, POSTS_CREATED_TOTAL, POST_LIST_REQUESTS_TOTAL};
use crate::middleware::{check_post_update, require_user};
use crate::models::{Author, Group, NewGroup, Post, PostFilter};
use crate::pagination::{Page, PageRequest};
use crate::routes;

/// Which posts a listing covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    Group(String),
    Author(String),
}

impl ListScope {
    fn label(&self) -> &'static str {
        match self {
            ListScope::All => "all",
            ListScope::Group(_) => "group",
            ListScope::Author(_) => "author",
        }
    }
}

/// One page of a listing plus the scope's subject
#[derive(Debug, Clone, Serialize)]
pub struct PostListing {
    pub page: Page<Post>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_post_count: Option<i64>,
}

/// A single post with its group and its author's post count
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub group: Option<Group>,
    pub author_post_count: i64,
}

/// What a create/edit form needs to render
#[derive(Debug, Clone, Serialize)]
pub struct FormContext {
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
    pub form: PostForm,
    /// Available group choices
    pub groups: Vec<Group>,
}

/// Location to send the caller to after a committed write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    fn to(location: String) -> Self {
        Self { location }
    }
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Newest-first page of posts for a scope.
    ///
    /// Unknown group slugs and usernames fail with NotFound; a page past the
    /// end is simply empty.
    pub async fn list(&self, scope: ListScope, page: PageRequest) -> Result<PostListing> {
        POST_LIST_REQUESTS_TOTAL
            .with_label_values(&[scope.label()])
            .inc();

        let (filter, group, author) = match &scope {
            ListScope::All => (PostFilter::All, None, None),
            ListScope::Group(slug) => {
                let group = self.store.group_by_slug(slug).await?;
                (PostFilter::Group(group.id), Some(group), None)
            }
            ListScope::Author(username) => {
                let author = self.store.author_by_username(username).await?;
                (PostFilter::Author(author.id), None, Some(author))
            }
        };

        let total = self.store.count_posts(filter).await?;
        let items = self
            .store
            .list_posts(filter, page.limit(), page.offset())
            .await?;

        Ok(PostListing {
            page: Page::new(items, page, total),
            group,
            author_post_count: author.as_ref().map(|_| total),
            author,
        })
    }

    /// A post with its group and its author's total post count
    pub async fn get(&self, post_id: i64) -> Result<PostDetail> {
        let post = self.store.post_by_id(post_id).await?;
        let group = match post.group_id {
            Some(group_id) => Some(self.store.group_by_id(group_id).await?),
            None => None,
        };
        let author_post_count = self
            .store
            .count_posts(PostFilter::Author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            group,
            author_post_count,
        })
    }

    /// Access checks for creating a post
    pub fn authorize_create<'a>(&self, user: Option<&'a CurrentUser>) -> Result<&'a CurrentUser> {
        require_user(user)
    }

    /// Access checks for editing: signed in, post exists, caller wrote it
    pub async fn authorize_edit<'a>(
        &self,
        user: Option<&'a CurrentUser>,
        post_id: i64,
    ) -> Result<(&'a CurrentUser, Post)> {
        let user = require_user(user)?;
        let post = self.store.post_by_id(post_id).await?;
        if let Err(err) = check_post_update(user, &post) {
            tracing::warn!(post_id, user_id = %user.id, "edit refused: not the author");
            return Err(err);
        }
        Ok((user, post))
    }

    /// Blank form for a new post.
    ///
    /// Also records the caller as an author, so their profile exists before
    /// the first post.
    pub async fn create_form(&self, user: Option<&CurrentUser>) -> Result<FormContext> {
        let user = self.authorize_create(user)?;
        self.store.ensure_author(user.id, &user.username).await?;

        Ok(FormContext {
            is_edit: false,
            post: None,
            form: PostForm::default(),
            groups: self.store.list_groups().await?,
        })
    }

    /// Form pre-populated with the post's current values; owner only
    pub async fn edit_form(&self, user: Option<&CurrentUser>, post_id: i64) -> Result<FormContext> {
        let (_, post) = self.authorize_edit(user, post_id).await?;

        Ok(FormContext {
            is_edit: true,
            form: PostForm::from_post(&post),
            post: Some(post),
            groups: self.store.list_groups().await?,
        })
    }

    /// Create a post authored by `user`; redirects to the author's profile
    pub async fn create(&self, user: Option<&CurrentUser>, form: PostForm) -> Result<Redirect> {
        let result = self.create_post(user, form).await;
        record_write("create", &result);
        result
    }

    async fn create_post(&self, user: Option<&CurrentUser>, form: PostForm) -> Result<Redirect> {
        let user = self.authorize_create(user)?;
        let draft = form.bind(self.store.as_ref()).await?;

        let author = self.store.ensure_author(user.id, &user.username).await?;
        let post = self.store.insert_post(author.id, draft).await?;
        POSTS_CREATED_TOTAL.inc();

        tracing::info!(post_id = post.id, author = %author.username, "post created");
        Ok(Redirect::to(routes::profile(&author.username)))
    }

    /// Replace text and group of a post; author only. Redirects to the post.
    pub async fn edit(
        &self,
        user: Option<&CurrentUser>,
        post_id: i64,
        form: PostForm,
    ) -> Result<Redirect> {
        let result = self.edit_post(user, post_id, form).await;
        record_write("edit", &result);
        result
    }

    async fn edit_post(
        &self,
        user: Option<&CurrentUser>,
        post_id: i64,
        form: PostForm,
    ) -> Result<Redirect> {
        let (user, post) = self.authorize_edit(user, post_id).await?;

        let draft = form.bind(self.store.as_ref()).await?;
        let updated = self.store.update_post(post.id, user.id, draft).await?;

        tracing::info!(post_id = updated.id, "post edited");
        Ok(Redirect::to(routes::post_detail(updated.id)))
    }

    /// Administrative group creation
    pub async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let group = self.store.create_group(group).await?;
        tracing::info!(group_id = group.id, slug = %group.slug, "group created");
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPostStore;
    use crate::error::AppError;
    use uuid::Uuid;

    struct Fixture {
        service: PostService,
        store: Arc<InMemoryPostStore>,
        user: CurrentUser,
        group: Group,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryPostStore::new());
        let service = PostService::new(store.clone());
        let group = service
            .create_group(NewGroup {
                title: "Test group".into(),
                slug: "test-slug".into(),
                description: "Test description".into(),
            })
            .await
            .unwrap();
        Fixture {
            service,
            store,
            user: CurrentUser {
                id: Uuid::new_v4(),
                username: "TestUser".into(),
            },
            group,
        }
    }

    async fn total(store: &InMemoryPostStore) -> i64 {
        store.count_posts(PostFilter::All).await.unwrap()
    }

    #[tokio::test]
    async fn create_without_group_redirects_to_profile() {
        let f = fixture().await;
        let redirect = f
            .service
            .create(Some(&f.user), PostForm::new("Test text", None))
            .await
            .unwrap();

        assert_eq!(redirect.location, "/profile/TestUser/");
        assert_eq!(total(&f.store).await, 1);
        let posts = f.store.list_posts(PostFilter::All, 10, 0).await.unwrap();
        assert_eq!(posts[0].author_id, f.user.id);
        assert_eq!(posts[0].group_id, None);
    }

    #[tokio::test]
    async fn create_with_group_sets_group() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("Grouped", Some(f.group.id)))
            .await
            .unwrap();

        let posts = f
            .store
            .list_posts(PostFilter::Group(f.group.id), 10, 0)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].text, "Grouped");
    }

    #[tokio::test]
    async fn create_with_empty_text_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .create(Some(&f.user), PostForm::new("", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(total(&f.store).await, 0);
    }

    #[tokio::test]
    async fn anonymous_create_is_unauthorized() {
        let f = fixture().await;
        let err = f
            .service
            .create(None, PostForm::new("text", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(total(&f.store).await, 0);
    }

    #[tokio::test]
    async fn anonymous_edit_is_unauthorized() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("original", None))
            .await
            .unwrap();
        let post_id = f.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].id;

        let err = f
            .service
            .edit(None, post_id, PostForm::new("changed", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(f.service.get(post_id).await.unwrap().post.text, "original");
    }

    #[tokio::test]
    async fn opening_create_form_gives_an_empty_profile() {
        let f = fixture().await;
        let newbie = CurrentUser {
            id: Uuid::new_v4(),
            username: "newbie".into(),
        };
        assert!(matches!(
            f.service
                .list(ListScope::Author("newbie".into()), PageRequest::first())
                .await,
            Err(AppError::NotFound(_))
        ));

        f.service.create_form(Some(&newbie)).await.unwrap();

        let listing = f
            .service
            .list(ListScope::Author("newbie".into()), PageRequest::first())
            .await
            .unwrap();
        assert!(listing.page.is_empty());
        assert_eq!(listing.author_post_count, Some(0));
    }

    #[tokio::test]
    async fn authorize_edit_checks_identity_then_ownership() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("original", None))
            .await
            .unwrap();
        let post_id = f.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].id;
        let stranger = CurrentUser {
            id: Uuid::new_v4(),
            username: "stranger".into(),
        };

        assert!(matches!(
            f.service.authorize_edit(None, 999).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            f.service.authorize_edit(Some(&stranger), post_id).await,
            Err(AppError::Forbidden { .. })
        ));
        let (user, post) = f.service.authorize_edit(Some(&f.user), post_id).await.unwrap();
        assert_eq!(user.id, post.author_id);
    }

    #[tokio::test]
    async fn author_can_edit_text_and_group() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("before", None))
            .await
            .unwrap();
        let post_id = f.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].id;

        let redirect = f
            .service
            .edit(Some(&f.user), post_id, PostForm::new("after", Some(f.group.id)))
            .await
            .unwrap();
        assert_eq!(redirect.location, format!("/posts/{}/", post_id));

        let detail = f.service.get(post_id).await.unwrap();
        assert_eq!(detail.post.text, "after");
        assert_eq!(detail.group.as_ref().map(|g| g.title.as_str()), Some("Test group"));
        assert_eq!(total(&f.store).await, 1);

        f.service
            .edit(Some(&f.user), post_id, PostForm::new("after", None))
            .await
            .unwrap();
        assert_eq!(f.service.get(post_id).await.unwrap().group, None);
    }

    #[tokio::test]
    async fn stranger_cannot_edit() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("original", None))
            .await
            .unwrap();
        let post_id = f.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].id;

        let stranger = CurrentUser {
            id: Uuid::new_v4(),
            username: "stranger".into(),
        };
        let err = f
            .service
            .edit(Some(&stranger), post_id, PostForm::new("hijacked", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { post_id: id } if id == post_id));
        assert_eq!(f.service.get(post_id).await.unwrap().post.text, "original");

        let err = f.service.edit_form(Some(&stranger), post_id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn invalid_edit_leaves_post_untouched() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("original", None))
            .await
            .unwrap();
        let post_id = f.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].id;

        let err = f
            .service
            .edit(Some(&f.user), post_id, PostForm::new(" ", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.service.get(post_id).await.unwrap().post.text, "original");
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let f = fixture().await;
        assert!(matches!(f.service.get(999).await, Err(AppError::NotFound(_))));
        let err = f
            .service
            .edit(Some(&f.user), 999, PostForm::new("x", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn listings_paginate_in_windows_of_ten() {
        let f = fixture().await;
        for i in 0..13 {
            f.service
                .create(Some(&f.user), PostForm::new(format!("post {i}"), Some(f.group.id)))
                .await
                .unwrap();
        }

        let scopes = [
            ListScope::All,
            ListScope::Group("test-slug".into()),
            ListScope::Author("TestUser".into()),
        ];
        for scope in scopes {
            let first = f.service.list(scope.clone(), PageRequest::new(1)).await.unwrap();
            let second = f.service.list(scope.clone(), PageRequest::new(2)).await.unwrap();
            let third = f.service.list(scope, PageRequest::new(3)).await.unwrap();
            assert_eq!(first.page.len(), 10);
            assert_eq!(second.page.len(), 3);
            assert!(third.page.is_empty());
        }
    }

    #[tokio::test]
    async fn profile_listing_reports_post_count() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("only", None))
            .await
            .unwrap();

        let listing = f
            .service
            .list(ListScope::Author("TestUser".into()), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(listing.author_post_count, Some(1));
        assert_eq!(listing.author.unwrap().username, "TestUser");
        assert_eq!(listing.page.items[0].text, "only");
    }

    #[tokio::test]
    async fn group_listing_only_contains_group_posts() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("grouped", Some(f.group.id)))
            .await
            .unwrap();
        f.service
            .create(Some(&f.user), PostForm::new("loose", None))
            .await
            .unwrap();

        let listing = f
            .service
            .list(ListScope::Group("test-slug".into()), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(listing.group.unwrap().slug, "test-slug");
        assert_eq!(listing.page.total_count, 1);
        assert_eq!(listing.page.items[0].text, "grouped");

        let err = f
            .service
            .list(ListScope::Group("missing".into()), PageRequest::first())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn edit_form_is_prepopulated() {
        let f = fixture().await;
        f.service
            .create(Some(&f.user), PostForm::new("draft", Some(f.group.id)))
            .await
            .unwrap();
        let post_id = f.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].id;

        let ctx = f.service.edit_form(Some(&f.user), post_id).await.unwrap();
        assert!(ctx.is_edit);
        assert_eq!(ctx.form, PostForm::new("draft", Some(f.group.id)));
        assert_eq!(ctx.groups.len(), 1);

        let ctx = f.service.create_form(Some(&f.user)).await.unwrap();
        assert!(!ctx.is_edit);
        assert_eq!(ctx.form, PostForm::default());
        assert!(matches!(
            f.service.create_form(None).await,
            Err(AppError::Unauthorized)
        ));
    }
}
