/// URL paths shared by handlers and redirect targets

pub const INDEX: &str = "/";
pub const GROUP_LIST: &str = "/group/{slug}/";
pub const PROFILE: &str = "/profile/{username}/";
pub const POST_DETAIL: &str = "/posts/{post_id}/";
pub const POST_CREATE: &str = "/create/";
pub const POST_EDIT: &str = "/posts/{post_id}/edit/";

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_detail(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Login location carrying the attempted path as `next`.
///
/// Path separators stay literal; every other reserved character is
/// percent-encoded.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", login_url, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_keeps_slashes() {
        assert_eq!(
            login_redirect("/auth/login/", "/posts/3/edit/"),
            "/auth/login/?next=/posts/3/edit/"
        );
    }

    #[test]
    fn login_redirect_encodes_query_characters() {
        assert_eq!(
            login_redirect("/auth/login/", "/create/?a=b&c"),
            "/auth/login/?next=/create/%3Fa%3Db%26c"
        );
    }

    #[test]
    fn paths_match_route_patterns() {
        assert_eq!(profile("leo"), "/profile/leo/");
        assert_eq!(post_detail(12), "/posts/12/");
    }
}
