/// Authorization checks for posts-service
///
/// Only the author of a post may change it.
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::Post;

/// Result type for permission checks
pub type PermissionResult = Result<()>;

/// Require an authenticated identity for a write
pub fn require_user(user: Option<&CurrentUser>) -> Result<&CurrentUser> {
    user.ok_or(AppError::Unauthorized)
}

/// Verify user has access to update a post
pub fn check_post_update(user: &CurrentUser, post: &Post) -> PermissionResult {
    if post.is_authored_by(user.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden { post_id: post.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn post_by(author_id: Uuid) -> Post {
        Post {
            id: 5,
            text: "text".into(),
            author_id,
            author_username: "owner".into(),
            group_id: None,
            created_at: Utc::now(),
        }
    }

    fn user(id: Uuid) -> CurrentUser {
        CurrentUser {
            id,
            username: "someone".into(),
        }
    }

    #[test]
    fn anonymous_write_is_unauthorized() {
        assert!(matches!(require_user(None), Err(AppError::Unauthorized)));
    }

    #[test]
    fn owner_may_update() {
        let id = Uuid::new_v4();
        assert!(check_post_update(&user(id), &post_by(id)).is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let result = check_post_update(&user(Uuid::new_v4()), &post_by(Uuid::new_v4()));
        assert!(matches!(result, Err(AppError::Forbidden { post_id: 5 })));
    }
}
