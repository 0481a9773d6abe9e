/// OpenAPI documentation for Posts Service
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::forms::{FormRejection, PostForm};
use crate::models::{Author, Group, Post};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Yatube Posts Service API",
        version = "1.0.0",
        description = "Community blog posts. Anyone may browse the newest posts, a group's posts or an author's profile. Signed-in authors create posts and edit their own.",
        contact(
            name = "Yatube Team",
            email = "team@yatube.dev"
        ),
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Development server"),
    ),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "posts", description = "Post listings, detail, creation and editing"),
        (name = "groups", description = "Topical groups posts can be filed under"),
    ),
    components(schemas(Group, Author, Post, PostForm, FormRejection)),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("HS256 identity token; reads work without one"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/v1/openapi.json"
    }
}
