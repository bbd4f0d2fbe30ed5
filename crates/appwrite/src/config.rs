// Appwrite connection settings loaded from environment variables.
// Decision: Endpoint and project are required; everything else has a default

use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;

/// Collection holding one profile document per user.
pub const DEFAULT_PROFILES_COLLECTION: &str = "profiles";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

/// Connection settings for an Appwrite project
#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    /// API root including the version segment, e.g. `https://cloud.appwrite.io/v1`
    pub endpoint: String,
    pub project_id: String,
    /// Server key used for account creation, session issuance and documents
    pub api_key: SecretString,
    pub database_id: String,
    pub profiles_collection: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AppwriteConfig {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        api_key: SecretString,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key,
            database_id: database_id.into(),
            profiles_collection: DEFAULT_PROFILES_COLLECTION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `APPWRITE_ENDPOINT` (required)
    /// - `APPWRITE_PROJECT_ID` (required)
    /// - `APPWRITE_API_KEY` (required)
    /// - `APPWRITE_DATABASE_ID` (required)
    /// - `APPWRITE_PROFILES_COLLECTION` (default: "profiles")
    /// - `APPWRITE_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let endpoint = required("APPWRITE_ENDPOINT")?;
        if url::Url::parse(&endpoint).is_err() {
            return Err(ConfigError::InvalidUrl {
                name: "APPWRITE_ENDPOINT",
                value: endpoint,
            });
        }

        let mut config = Self::new(
            endpoint,
            required("APPWRITE_PROJECT_ID")?,
            SecretString::from(required("APPWRITE_API_KEY")?),
            required("APPWRITE_DATABASE_ID")?,
        );

        if let Some(collection) = lookup("APPWRITE_PROFILES_COLLECTION").filter(|v| !v.is_empty()) {
            config.profiles_collection = collection;
        }
        if let Some(secs) = lookup("APPWRITE_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
