// Session cookies
// Decision: Both cookies share attributes and expiry; they are always written and cleared together
// Decision: Clearing emits explicit expired cookies, even when the request carried none

use atelier_core::auth::secret_value;
use atelier_core::Session;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

/// Bearer credential presented to the identity provider.
pub const SESSION_SECRET_COOKIE: &str = "session_secret";

/// Session id, used to target deletion on logout.
pub const AUTH_SESSION_COOKIE: &str = "auth_session";

/// Attributes applied to session cookies
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    /// Mark cookies `Secure` (production deployments)
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn build(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build()
    }

    /// Persist a freshly issued session. Both cookies expire with the session.
    pub fn set_session(
        &self,
        jar: CookieJar,
        session: &Session,
    ) -> Result<CookieJar, time::error::ComponentRange> {
        let expires = OffsetDateTime::from_unix_timestamp(session.expires_at.timestamp())?;

        let mut secret = self.build(
            SESSION_SECRET_COOKIE,
            secret_value(&session.secret).to_string(),
        );
        secret.set_expires(expires);

        let mut id = self.build(AUTH_SESSION_COOKIE, session.id.clone());
        id.set_expires(expires);

        Ok(jar.add(secret).add(id))
    }

    /// Remove both session cookies from the client
    pub fn clear_session(&self, jar: CookieJar) -> CookieJar {
        let expired = |name: &'static str| {
            let mut cookie = self.build(name, String::new());
            cookie.make_removal();
            cookie
        };
        jar.add(expired(SESSION_SECRET_COOKIE))
            .add(expired(AUTH_SESSION_COOKIE))
    }
}

/// Session cookies as presented by the browser
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    pub secret: Option<String>,
    pub session_id: Option<String>,
}

impl SessionCookies {
    pub fn from_jar(jar: &CookieJar) -> Self {
        let read = |name| {
            jar.get(name)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            secret: read(SESSION_SECRET_COOKIE),
            session_id: read(AUTH_SESSION_COOKIE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;
    use axum::response::IntoResponse;
    use chrono::{TimeZone, Utc};
    use secrecy::SecretString;

    fn session() -> Session {
        Session {
            id: "sess_1".into(),
            user_id: "u1".into(),
            provider: "email".into(),
            expires_at: Utc.with_ymd_and_hms(2026, 11, 18, 10, 0, 0).unwrap(),
            secret: SecretString::from("s3cr3t".to_string()),
        }
    }

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        let response = jar.into_response();
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_set_session_writes_both_cookies_with_session_expiry() {
        let jar = CookiePolicy::new(false)
            .set_session(CookieJar::new(), &session())
            .unwrap();
        let headers = set_cookie_headers(jar);
        assert_eq!(headers.len(), 2);

        for header in &headers {
            assert!(header.contains("HttpOnly"), "{header}");
            assert!(header.contains("SameSite=Lax"), "{header}");
            assert!(header.contains("Path=/"), "{header}");
            assert!(header.contains("Expires=Wed, 18 Nov 2026 10:00:00 GMT"), "{header}");
            assert!(!header.contains("Secure"), "{header}");
        }
        assert!(headers.iter().any(|h| h.starts_with("session_secret=s3cr3t")));
        assert!(headers.iter().any(|h| h.starts_with("auth_session=sess_1")));
    }

    #[test]
    fn test_production_cookies_are_secure() {
        let jar = CookiePolicy::new(true)
            .set_session(CookieJar::new(), &session())
            .unwrap();
        assert!(set_cookie_headers(jar).iter().all(|h| h.contains("Secure")));
    }

    #[test]
    fn test_clear_session_emits_both_removals_on_empty_jar() {
        let headers = set_cookie_headers(CookiePolicy::new(false).clear_session(CookieJar::new()));
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().any(|h| h.starts_with("session_secret=;")));
        assert!(headers.iter().any(|h| h.starts_with("auth_session=;")));
        assert!(headers.iter().all(|h| h.contains("Max-Age=0")));
    }

    #[test]
    fn test_empty_cookie_values_count_as_absent() {
        let jar = CookieJar::new()
            .add(Cookie::new(SESSION_SECRET_COOKIE, ""))
            .add(Cookie::new(AUTH_SESSION_COOKIE, "sess_1"));
        let cookies = SessionCookies::from_jar(&jar);
        assert!(cookies.secret.is_none());
        assert_eq!(cookies.session_id.as_deref(), Some("sess_1"));
    }
}
