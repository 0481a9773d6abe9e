/// Business logic layer for posts-service
///
/// - Post service: listings, detail, create/edit with author-only permission checks
pub mod posts;

pub use posts::{FormContext, ListScope, PostDetail, PostListing, PostService, Redirect};
