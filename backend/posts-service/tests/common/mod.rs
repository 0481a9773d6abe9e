//! Shared fixtures for HTTP integration tests
//!
//! Builds the real route table over an `InMemoryPostStore` and issues
//! identity tokens signed with a throwaway secret.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use std::sync::Arc;
use uuid::Uuid;

use posts_service::auth::{CurrentUser, JwtKeys};
use posts_service::db::{InMemoryPostStore, PostStore};
use posts_service::handlers::{self, HealthState, PostHandlerState};
use posts_service::middleware::{HttpMetricsMiddleware, IdentityMiddleware};
use posts_service::models::{Group, NewGroup, Post, PostDraft};
use posts_service::services::PostService;

pub const LOGIN_URL: &str = "/auth/login/";
const TEST_SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub store: Arc<InMemoryPostStore>,
    keys: JwtKeys,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryPostStore::new()),
            keys: JwtKeys::from_secret(TEST_SECRET),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let state = PostHandlerState {
            service: PostService::new(self.store.clone()),
            login_url: LOGIN_URL.to_string(),
        };

        App::new()
            .app_data(web::Data::new(state))
            .app_data(web::Data::new(HealthState::default()))
            .wrap(IdentityMiddleware::new(self.keys.clone()))
            .wrap(HttpMetricsMiddleware)
            .configure(handlers::configure)
    }

    pub fn user(&self, username: &str) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
        }
    }

    /// `Authorization` header value for `user`
    pub fn bearer(&self, user: &CurrentUser) -> (&'static str, String) {
        let token = self
            .keys
            .issue_token(user, chrono::Duration::hours(1))
            .expect("issue token");
        ("Authorization", format!("Bearer {}", token))
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: format!("Group {}", slug),
                slug: slug.to_string(),
                description: String::new(),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &CurrentUser, text: &str, group_id: Option<i64>) -> Post {
        self.store
            .ensure_author(author.id, &author.username)
            .await
            .expect("ensure author");
        self.store
            .insert_post(
                author.id,
                PostDraft {
                    text: text.to_string(),
                    group_id,
                },
            )
            .await
            .expect("insert post")
    }
}
