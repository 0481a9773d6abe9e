/// Posts Service Library
///
/// A small community blog: authors publish text posts, optionally filed under
/// a group, and browse them newest first ten to a page. Only a post's author
/// may edit it.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `services`: Listing, detail and post form workflows
/// - `forms`: Post form binding and validation
/// - `db`: The `PostStore` trait with Postgres and in-memory backends
/// - `models`: Post, group and author records
/// - `middleware`: Bearer identity resolution and write permissions
/// - `error`: Error types and their HTTP responses
/// - `config`: Configuration management
/// - `metrics`: Prometheus counters
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
