// Route guard
//
// Stateless predicate evaluated before any handler runs. It only looks at
// whether the `auth_session` cookie is present; whether the session is still
// valid is for the session reader to decide when a handler needs the user.
//
// Rules (first match wins), applied only to guarded paths:
// 1. no session + protected prefix     -> redirect to /login
// 2. no session                        -> proceed
// 3. session + /login or /register     -> redirect to /
// 4. otherwise                         -> proceed

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Where authenticated visitors of auth-only pages are sent.
pub const HOME_PATH: &str = "/";

/// Prefixes that require a session (the prefix itself and everything below it).
pub const PROTECTED_PREFIXES: [&str; 2] = ["/dashboard", "/profile"];

/// Pages that only make sense without a session.
pub const AUTH_ONLY_PATHS: [&str; 2] = ["/login", "/register"];

/// Exact paths the guard fires on, in addition to the protected prefixes.
const GUARDED_PATHS: [&str; 3] = ["/login", "/register", "/forgot-password"];

/// What to do with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Continue to the handler unmodified
    Proceed,
    /// Redirect to the given path
    Redirect(&'static str),
}

/// Strip a single trailing slash, keeping "/" intact
fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Whether the path requires a session
pub fn is_protected(path: &str) -> bool {
    let path = normalize(path);
    PROTECTED_PREFIXES.iter().any(|p| under_prefix(path, p))
}

/// Whether the guard fires on this path at all
pub fn is_guarded(path: &str) -> bool {
    let path = normalize(path);
    is_protected(path) || GUARDED_PATHS.contains(&path)
}

/// Whether a cookie value counts as a session. Empty values do not.
pub fn session_present(cookie_value: Option<&str>) -> bool {
    cookie_value.is_some_and(|v| !v.is_empty())
}

/// Evaluate the guard for a request path
pub fn evaluate(path: &str, has_session: bool) -> GuardDecision {
    if !is_guarded(path) {
        return GuardDecision::Proceed;
    }

    let path = normalize(path);

    if !has_session {
        if is_protected(path) {
            return GuardDecision::Redirect(LOGIN_PATH);
        }
        return GuardDecision::Proceed;
    }

    if AUTH_ONLY_PATHS.contains(&path) {
        return GuardDecision::Redirect(HOME_PATH);
    }

    GuardDecision::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTECTED: [&str; 6] = [
        "/dashboard",
        "/dashboard/",
        "/dashboard/images/42",
        "/profile",
        "/profile/settings",
        "/profile/a/b/c",
    ];

    #[test]
    fn test_protected_paths_without_session_redirect_to_login() {
        for path in PROTECTED {
            assert_eq!(
                evaluate(path, false),
                GuardDecision::Redirect("/login"),
                "path {path}"
            );
        }
    }

    #[test]
    fn test_protected_paths_with_session_proceed() {
        for path in PROTECTED {
            assert_eq!(evaluate(path, true), GuardDecision::Proceed, "path {path}");
        }
    }

    #[test]
    fn test_auth_pages_with_session_redirect_home() {
        assert_eq!(evaluate("/login", true), GuardDecision::Redirect("/"));
        assert_eq!(evaluate("/register", true), GuardDecision::Redirect("/"));
        assert_eq!(evaluate("/login/", true), GuardDecision::Redirect("/"));
    }

    #[test]
    fn test_auth_pages_without_session_proceed() {
        assert_eq!(evaluate("/login", false), GuardDecision::Proceed);
        assert_eq!(evaluate("/register", false), GuardDecision::Proceed);
        assert_eq!(evaluate("/forgot-password", false), GuardDecision::Proceed);
    }

    #[test]
    fn test_forgot_password_with_session_proceeds() {
        assert_eq!(evaluate("/forgot-password", true), GuardDecision::Proceed);
    }

    #[test]
    fn test_unguarded_paths_always_proceed() {
        for path in ["/", "/pricing", "/dashboardx", "/profiles", "/api/webhooks/stripe", "/oauth"] {
            assert_eq!(evaluate(path, false), GuardDecision::Proceed, "path {path}");
            assert_eq!(evaluate(path, true), GuardDecision::Proceed, "path {path}");
        }
    }

    #[test]
    fn test_matcher() {
        assert!(is_guarded("/dashboard/x"));
        assert!(is_guarded("/forgot-password"));
        assert!(!is_guarded("/login/extra"));
        assert!(!is_guarded("/"));
    }

    #[test]
    fn test_session_present() {
        assert!(session_present(Some("sess_123")));
        assert!(!session_present(Some("")));
        assert!(!session_present(None));
    }
}
