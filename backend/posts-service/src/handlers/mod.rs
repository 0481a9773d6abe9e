/// HTTP handlers for posts-service
///
/// This module contains handlers for:
/// - Posts: listings (all, by group, by author), detail, create and edit forms
/// - Health: liveness and readiness probes
///
/// `configure` registers the full route table.
use actix_web::web;

use crate::routes;

pub mod health;
pub mod posts;

pub use health::{health_summary, liveness_check, readiness_summary, HealthState};
pub use posts::{
    create_form, create_post, edit_form, edit_post, group_posts, index, post_detail, profile,
    PostHandlerState,
};

/// Register post and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/v1/health", web::get().to(health_summary))
        .route("/api/v1/health/ready", web::get().to(readiness_summary))
        .route("/api/v1/health/live", web::get().to(liveness_check))
        .route(routes::INDEX, web::get().to(index))
        .route(routes::GROUP_LIST, web::get().to(group_posts))
        .route(routes::PROFILE, web::get().to(profile))
        .service(
            web::resource(routes::POST_CREATE)
                .route(web::get().to(create_form))
                .route(web::post().to(create_post)),
        )
        .route(routes::POST_DETAIL, web::get().to(post_detail))
        .service(
            web::resource(routes::POST_EDIT)
                .route(web::get().to(edit_form))
                .route(web::post().to(edit_post)),
        );
}
