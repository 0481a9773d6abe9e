use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    /// Posts committed through the create operation.
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "posts_created_total",
        "Total posts created"
    )
    .expect("failed to register posts_created_total");

    /// Write attempts by terminal state (committed, rejected, forbidden, unauthorized).
    pub static ref POST_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_writes_total",
        "Post create/edit attempts segmented by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register post_writes_total");

    /// Listing requests by scope (all, group, author).
    pub static ref POST_LIST_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_list_requests_total",
        "Post listing requests segmented by scope",
        &["scope"]
    )
    .expect("failed to register post_list_requests_total");

    /// Request latency by route pattern (`/posts/{post_id}/`, not `/posts/7/`).
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration segmented by method, route pattern and status",
        &["method", "route", "status"]
    )
    .expect("failed to register http_request_duration_seconds");
}

/// Observe one finished HTTP request
pub fn record_request(method: &str, route: &str, status: u16, seconds: f64) {
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route, &status.to_string()])
        .observe(seconds);
}

/// Record the terminal state of a create/edit attempt
pub fn record_write<T>(operation: &str, result: &crate::error::Result<T>) {
    use crate::error::AppError;

    let outcome = match result {
        Ok(_) => "committed",
        Err(AppError::Unauthorized) => "unauthorized",
        Err(AppError::Forbidden { .. }) => "forbidden",
        Err(AppError::Validation(_)) => "rejected",
        Err(AppError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    POST_WRITES_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}
