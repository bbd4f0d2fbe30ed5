// Authentication module
// Decision: Sessions live with the identity provider; this module only moves the secret between cookie and provider

pub mod callback;
pub mod cookies;
pub mod guard;
pub mod middleware;
pub mod routes;

pub use cookies::{CookiePolicy, SessionCookies};
pub use guard::route_guard;
pub use middleware::{AuthFailure, CurrentUser};
