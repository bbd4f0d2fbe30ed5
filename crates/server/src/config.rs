// Server configuration loaded from environment variables.
// Decision: Cookies are `Secure` only when APP_ENV=production so local http works
// Decision: Webhook secret is optional; the endpoint answers 503 until it is set

use atelier_core::auth::AuthSettings;
use atelier_core::billing::DEFAULT_TOLERANCE_SECS;
use atelier_core::OAuthProvider;
use secrecy::SecretString;
use std::path::PathBuf;

const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Which identity backend serves accounts and sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityBackend {
    /// Appwrite-compatible REST backend
    #[default]
    Appwrite,
    /// Process-local provider; data is lost on restart
    Memory,
}

impl IdentityBackend {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" => IdentityBackend::Memory,
            _ => IdentityBackend::Appwrite,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Public origin of the app, used for OAuth and recovery URLs
    pub app_url: String,
    /// Deployment environment name ("production" enables secure cookies)
    pub environment: String,
    pub bind_addr: String,
    pub identity_backend: IdentityBackend,
    /// OAuth providers offered on the login page
    pub oauth_providers: Vec<OAuthProvider>,
    pub disable_signup: bool,
    /// Shared secret for payment webhook signatures
    pub stripe_webhook_secret: Option<SecretString>,
    /// Accepted signature age in seconds
    pub stripe_webhook_tolerance: i64,
    /// Origins allowed by CORS; empty means same-origin only
    pub cors_allowed_origins: Vec<String>,
    /// Front-end bundle served as the router fallback
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            environment: "development".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            identity_backend: IdentityBackend::Appwrite,
            oauth_providers: OAuthProvider::ALL.to_vec(),
            disable_signup: false,
            stripe_webhook_secret: None,
            stripe_webhook_tolerance: DEFAULT_TOLERANCE_SECS,
            cors_allowed_origins: Vec::new(),
            static_dir: None,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1"
}

fn parse_providers(value: &str) -> Vec<OAuthProvider> {
    let mut providers = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match OAuthProvider::from_str(name) {
            Some(p) if !providers.contains(&p) => providers.push(p),
            Some(_) => {}
            None => tracing::warn!(provider = %name, "Ignoring unknown OAuth provider"),
        }
    }
    providers
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `APP_URL`: Public origin (default: "http://localhost:3000")
    /// - `APP_ENV`: Deployment environment (default: "development")
    /// - `BIND_ADDR`: Listen address (default: "0.0.0.0:3000")
    /// - `IDENTITY_BACKEND`: "appwrite" or "memory" (default: "appwrite")
    /// - `AUTH_OAUTH_PROVIDERS`: Comma list (default: "google,github"; empty disables OAuth)
    /// - `AUTH_DISABLE_SIGNUP`: "true" or "1" to refuse registrations
    /// - `STRIPE_WEBHOOK_SECRET`: Webhook signing secret
    /// - `STRIPE_WEBHOOK_TOLERANCE`: Signature tolerance in seconds (default: 300)
    /// - `CORS_ALLOWED_ORIGINS`: Comma list of origins
    /// - `STATIC_DIR`: Directory with the built front-end
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let app_url = lookup("APP_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.app_url);

        let environment = lookup("APP_ENV")
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.environment);

        let bind_addr = lookup("BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.bind_addr);

        let identity_backend = lookup("IDENTITY_BACKEND")
            .map(|s| IdentityBackend::from_str(&s))
            .unwrap_or_default();

        let oauth_providers = lookup("AUTH_OAUTH_PROVIDERS")
            .map(|s| parse_providers(&s))
            .unwrap_or(defaults.oauth_providers);

        let disable_signup = lookup("AUTH_DISABLE_SIGNUP")
            .map(|s| parse_flag(&s))
            .unwrap_or(false);

        let stripe_webhook_secret = lookup("STRIPE_WEBHOOK_SECRET")
            .filter(|v| !v.is_empty())
            .map(SecretString::from);

        let stripe_webhook_tolerance = lookup("STRIPE_WEBHOOK_TOLERANCE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.stripe_webhook_tolerance);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let static_dir = lookup("STATIC_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            app_url,
            environment,
            bind_addr,
            identity_backend,
            oauth_providers,
            disable_signup,
            stripe_webhook_secret,
            stripe_webhook_tolerance,
            cors_allowed_origins,
            static_dir,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Settings handed to the session service
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            app_url: self.app_url.clone(),
            signup_enabled: !self.disable_signup,
            oauth_providers: self.oauth_providers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]);
        assert_eq!(config.app_url, "http://localhost:3000");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.identity_backend, IdentityBackend::Appwrite);
        assert_eq!(config.oauth_providers, OAuthProvider::ALL.to_vec());
        assert!(!config.is_production());
        assert!(config.stripe_webhook_secret.is_none());
        assert_eq!(config.stripe_webhook_tolerance, 300);
    }

    #[test]
    fn test_production_and_app_url() {
        let config = from_vars(&[
            ("APP_ENV", "Production"),
            ("APP_URL", "https://atelier.example.com/"),
        ]);
        assert!(config.is_production());
        assert_eq!(config.app_url, "https://atelier.example.com");
        assert_eq!(
            config.auth_settings().url_for("/oauth"),
            "https://atelier.example.com/oauth"
        );
    }

    #[test]
    fn test_identity_backend_parsing() {
        assert_eq!(IdentityBackend::from_str("memory"), IdentityBackend::Memory);
        assert_eq!(IdentityBackend::from_str("MEMORY"), IdentityBackend::Memory);
        assert_eq!(IdentityBackend::from_str("appwrite"), IdentityBackend::Appwrite);
        assert_eq!(IdentityBackend::from_str("other"), IdentityBackend::Appwrite);
    }

    #[test]
    fn test_oauth_provider_list() {
        let config = from_vars(&[("AUTH_OAUTH_PROVIDERS", "github, facebook,github")]);
        assert_eq!(config.oauth_providers, vec![OAuthProvider::GitHub]);

        let config = from_vars(&[("AUTH_OAUTH_PROVIDERS", "")]);
        assert!(config.oauth_providers.is_empty());
    }

    #[test]
    fn test_disable_signup() {
        assert!(from_vars(&[("AUTH_DISABLE_SIGNUP", "true")]).disable_signup);
        assert!(from_vars(&[("AUTH_DISABLE_SIGNUP", "1")]).disable_signup);
        assert!(!from_vars(&[("AUTH_DISABLE_SIGNUP", "no")]).disable_signup);
        assert!(!from_vars(&[("AUTH_DISABLE_SIGNUP", "true")])
            .auth_settings()
            .signup_enabled);
    }

    #[test]
    fn test_cors_origins() {
        let config = from_vars(&[(
            "CORS_ALLOWED_ORIGINS",
            "https://a.example.com, https://b.example.com,",
        )]);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
    }
}
