/// Post handlers - HTTP endpoints for listings, detail and post forms
use actix_web::http::header;
use actix_web::{web, Either, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::forms::PostForm;
use crate::metrics::posts::record_write;
use crate::middleware::MaybeUser;
use crate::pagination::{PageQuery, PageRequest};
use crate::routes;
use crate::services::{ListScope, PostService, Redirect};

/// Shared state for post handlers
#[derive(Clone)]
pub struct PostHandlerState {
    pub service: PostService,
    /// Where anonymous writers are sent to sign in
    pub login_url: String,
}

/// Form bodies are accepted url-encoded (browser forms) or as JSON
type FormBody = Either<web::Form<PostForm>, web::Json<PostForm>>;

/// Body extraction is deferred so access checks run before body errors surface
type MaybeFormBody = std::result::Result<FormBody, actix_web::Error>;

fn into_form(body: FormBody) -> PostForm {
    match body {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    }
}

/// Send an anonymous caller to the login page, returning here afterwards
fn login_redirect(req: &HttpRequest, state: &PostHandlerState) -> HttpResponse {
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());

    HttpResponse::Found()
        .insert_header((header::LOCATION, routes::login_redirect(&state.login_url, next)))
        .finish()
}

fn respond_json<T: Serialize>(
    req: &HttpRequest,
    state: &PostHandlerState,
    result: Result<T>,
) -> Result<HttpResponse> {
    match result {
        Ok(body) => Ok(HttpResponse::Ok().json(body)),
        Err(AppError::Unauthorized) => Ok(login_redirect(req, state)),
        Err(err) => Err(err),
    }
}

/// Answer an unreadable body, unless the caller was not allowed to write at all
fn respond_body_error<T>(
    req: &HttpRequest,
    state: &PostHandlerState,
    operation: &str,
    access: Result<T>,
    body_error: actix_web::Error,
) -> Result<HttpResponse> {
    let access = access.map(|_| ());
    if access.is_err() {
        record_write(operation, &access);
    }

    match access {
        Ok(()) => {
            tracing::debug!(operation, "unreadable post body: {}", body_error);
            Ok(body_error.as_response_error().error_response())
        }
        Err(AppError::Unauthorized) => Ok(login_redirect(req, state)),
        Err(err) => Err(err),
    }
}

fn respond_redirect(
    req: &HttpRequest,
    state: &PostHandlerState,
    result: Result<Redirect>,
) -> Result<HttpResponse> {
    match result {
        Ok(redirect) => Ok(HttpResponse::SeeOther()
            .insert_header((header::LOCATION, redirect.location))
            .finish()),
        Err(AppError::Unauthorized) => Ok(login_redirect(req, state)),
        Err(err) => Err(err),
    }
}

/// All posts, newest first
/// GET /
pub async fn index(
    state: web::Data<PostHandlerState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let listing = state
        .service
        .list(ListScope::All, PageRequest::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(listing))
}

/// Posts filed under a group
/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<PostHandlerState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let listing = state
        .service
        .list(ListScope::Group(slug.into_inner()), PageRequest::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(listing))
}

/// An author's posts and post count
/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<PostHandlerState>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let listing = state
        .service
        .list(ListScope::Author(username.into_inner()), PageRequest::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(listing))
}

/// Get a post by ID
/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<PostHandlerState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let detail = state.service.get(*post_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Blank post form
/// GET /create/
pub async fn create_form(
    req: HttpRequest,
    state: web::Data<PostHandlerState>,
    user: MaybeUser,
) -> Result<HttpResponse> {
    let result = state.service.create_form(user.user()).await;
    respond_json(&req, &state, result)
}

/// Create a new post
/// POST /create/
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<PostHandlerState>,
    user: MaybeUser,
    body: MaybeFormBody,
) -> Result<HttpResponse> {
    let form = match body {
        Ok(body) => into_form(body),
        Err(body_error) => {
            let access = state.service.authorize_create(user.user());
            return respond_body_error(&req, &state, "create", access, body_error);
        }
    };

    let result = state.service.create(user.user(), form).await;
    respond_redirect(&req, &state, result)
}

/// Pre-populated edit form
/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<PostHandlerState>,
    user: MaybeUser,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let result = state.service.edit_form(user.user(), *post_id).await;
    respond_json(&req, &state, result)
}

/// Edit a post
/// POST /posts/{post_id}/edit/
pub async fn edit_post(
    req: HttpRequest,
    state: web::Data<PostHandlerState>,
    user: MaybeUser,
    post_id: web::Path<i64>,
    body: MaybeFormBody,
) -> Result<HttpResponse> {
    let form = match body {
        Ok(body) => into_form(body),
        Err(body_error) => {
            let access = state.service.authorize_edit(user.user(), *post_id).await;
            return respond_body_error(&req, &state, "edit", access, body_error);
        }
    };

    let result = state.service.edit(user.user(), *post_id, form).await;
    respond_redirect(&req, &state, result)
}
