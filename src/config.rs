//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 3000;
    pub const DEV_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 10;

    // Firebase defaults for development (Firestore emulator, demo project)
    pub const DEV_FIREBASE_API_KEY: &str = "dev-api-key-do-not-use-in-production";
    pub const DEV_FIREBASE_AUTH_DOMAIN: &str = "demo-goat-memory.firebaseapp.com";
    pub const DEV_FIREBASE_PROJECT_ID: &str = "demo-goat-memory";
    pub const DEV_FIREBASE_STORAGE_BUCKET: &str = "demo-goat-memory.appspot.com";
    pub const DEV_FIREBASE_MESSAGING_SENDER_ID: &str = "000000000000";
    pub const DEV_FIREBASE_APP_ID: &str = "1:000000000000:web:0000000000000000";
    pub const DEV_FIRESTORE_EMULATOR_HOST: &str = "127.0.0.1:8080";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Firebase web app settings.
///
/// All six values are opaque to this server. Only the API key, project id
/// and app id take part in Firestore requests; the rest are carried so a
/// misconfigured deployment fails at startup rather than at first lookup.
#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    pub api_key: SecretString,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    /// `host:port` of a Firestore emulator; when set, requests go there over plain HTTP.
    pub emulator_host: Option<String>,
}

/// Outbound download settings.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Connect timeout for upstream fetches. The transfer itself is unbounded.
    pub connect_timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Public origin used when building download links (e.g. `https://goat.example.com`)
    pub public_url: Option<String>,
    /// Directory of static page assets, served at `/assets`
    pub static_dir: Option<PathBuf>,
    /// Firebase / Firestore settings
    pub firebase: FirebaseSettings,
    /// Upstream download settings
    pub download: DownloadSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development):
    /// - All variables have sensible defaults
    /// - Firestore requests go to a local emulator unless `FIRESTORE_EMULATOR_HOST` is empty
    ///
    /// In production mode (RUST_ENV=production):
    /// - All six `FIREBASE_*` values are required
    /// - Server will NOT start if using development defaults
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `GOAT_HOST`: Server host (default: 127.0.0.1)
    /// - `GOAT_PORT`: Server port (default: 3000)
    /// - `GOAT_PUBLIC_URL`: Origin for download links (default: taken from the request)
    /// - `GOAT_STATIC_DIR`: Static assets directory
    /// - `GOAT_UPSTREAM_CONNECT_TIMEOUT_SECS`: Upstream connect timeout (default: 10)
    /// - `FIREBASE_API_KEY`, `FIREBASE_AUTH_DOMAIN`, `FIREBASE_PROJECT_ID`,
    ///   `FIREBASE_STORAGE_BUCKET`, `FIREBASE_MESSAGING_SENDER_ID`, `FIREBASE_APP_ID`
    /// - `FIRESTORE_EMULATOR_HOST`: Firestore emulator `host:port`
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("GOAT_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("GOAT_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("GOAT_PORT must be a valid port number"))?;

        let public_url = env::var("GOAT_PUBLIC_URL")
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        if let Some(ref origin) = public_url
            && !(origin.starts_with("http://") || origin.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue(
                "GOAT_PUBLIC_URL must start with http:// or https://",
            ));
        }

        let static_dir = env::var("GOAT_STATIC_DIR").ok().map(PathBuf::from);

        let connect_timeout_secs = env::var("GOAT_UPSTREAM_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults::DEV_UPSTREAM_CONNECT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("GOAT_UPSTREAM_CONNECT_TIMEOUT_SECS must be a valid number")
            })?;

        let firebase = FirebaseSettings {
            api_key: SecretString::from(firebase_var(
                environment,
                "FIREBASE_API_KEY",
                defaults::DEV_FIREBASE_API_KEY,
            )?),
            auth_domain: firebase_var(
                environment,
                "FIREBASE_AUTH_DOMAIN",
                defaults::DEV_FIREBASE_AUTH_DOMAIN,
            )?,
            project_id: firebase_var(
                environment,
                "FIREBASE_PROJECT_ID",
                defaults::DEV_FIREBASE_PROJECT_ID,
            )?,
            storage_bucket: firebase_var(
                environment,
                "FIREBASE_STORAGE_BUCKET",
                defaults::DEV_FIREBASE_STORAGE_BUCKET,
            )?,
            messaging_sender_id: firebase_var(
                environment,
                "FIREBASE_MESSAGING_SENDER_ID",
                defaults::DEV_FIREBASE_MESSAGING_SENDER_ID,
            )?,
            app_id: firebase_var(environment, "FIREBASE_APP_ID", defaults::DEV_FIREBASE_APP_ID)?,
            emulator_host: match env::var("FIRESTORE_EMULATOR_HOST") {
                Ok(h) if h.trim().is_empty() => None,
                Ok(h) => Some(h.trim().to_string()),
                Err(_) if environment.is_development() => {
                    Some(defaults::DEV_FIRESTORE_EMULATOR_HOST.to_string())
                }
                Err(_) => None,
            },
        };

        let config = Config {
            environment,
            host,
            port,
            public_url,
            static_dir,
            firebase,
            download: DownloadSettings {
                connect_timeout: Duration::from_secs(connect_timeout_secs),
            },
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let firebase = &self.firebase;
        let checks = [
            (
                "FIREBASE_API_KEY",
                firebase.api_key.expose_secret() == defaults::DEV_FIREBASE_API_KEY,
            ),
            (
                "FIREBASE_AUTH_DOMAIN",
                firebase.auth_domain == defaults::DEV_FIREBASE_AUTH_DOMAIN,
            ),
            (
                "FIREBASE_PROJECT_ID",
                firebase.project_id == defaults::DEV_FIREBASE_PROJECT_ID,
            ),
            (
                "FIREBASE_STORAGE_BUCKET",
                firebase.storage_bucket == defaults::DEV_FIREBASE_STORAGE_BUCKET,
            ),
            (
                "FIREBASE_MESSAGING_SENDER_ID",
                firebase.messaging_sender_id == defaults::DEV_FIREBASE_MESSAGING_SENDER_ID,
            ),
            (
                "FIREBASE_APP_ID",
                firebase.app_id == defaults::DEV_FIREBASE_APP_ID,
            ),
        ];

        let errors: Vec<String> = checks
            .iter()
            .filter(|(_, is_default)| *is_default)
            .map(|(name, _)| {
                format!("{} is using its development default. Set the production value.", name)
            })
            .collect();

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Read a Firebase variable: defaulted in development, required in production.
fn firebase_var(
    environment: Environment,
    key: &'static str,
    dev_default: &str,
) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ if environment.is_development() => Ok(dev_default.to_string()),
        _ => Err(ConfigError::MissingEnvVar(key)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
