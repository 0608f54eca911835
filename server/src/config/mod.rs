use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::store::Backend;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/carmeet";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT_SECS: u64 = 3;
const DEFAULT_SESSION_TTL_HOURS: u64 = 24;
const DEFAULT_RESET_TOKEN_TTL_MINUTES: u64 = 60;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Explicit `DATABASE_BACKEND`; otherwise inferred from the URL scheme.
    pub database_backend: Option<Backend>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub production: bool,
    pub session_ttl: Duration,
    pub reset_token_ttl: Duration,
    /// Used to build absolute links, e.g. password reset URLs.
    pub public_base_url: String,
    pub cors_allowed_origins: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_backend: None,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            db_acquire_timeout_secs: ACQUIRE_TIMEOUT_SECS,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            production: false,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_HOURS * 3600),
            reset_token_ttl: Duration::from_secs(DEFAULT_RESET_TOKEN_TTL_MINUTES * 60),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let database_backend = env::var("DATABASE_BACKEND")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .and_then(|v| match v.parse::<Backend>() {
                Ok(backend) => Some(backend),
                Err(e) => {
                    tracing::warn!("Config: ignoring DATABASE_BACKEND: {}", e);
                    None
                }
            });

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_backend,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS).max(1),
            db_acquire_timeout_secs: ACQUIRE_TIMEOUT_SECS,
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3001))),
            production: env::var("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            session_ttl: Duration::from_secs(
                parse_or("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS) * 3600,
            ),
            reset_token_ttl: Duration::from_secs(
                parse_or("RESET_TOKEN_TTL_MINUTES", DEFAULT_RESET_TOKEN_TTL_MINUTES) * 60,
            ),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
        }
    }

    pub fn backend(&self) -> Option<Backend> {
        self.database_backend
            .or_else(|| Backend::from_url(&self.database_url))
    }

    /// The database URL with any password masked, safe for logs.
    pub fn redacted_database_url(&self) -> String {
        redact_password(&self.database_url)
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Config: invalid {} '{}' ({}), using {}", key, raw, e, default);
            default
        }),
        Err(_) => default,
    }
}

fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.split_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_override_wins_over_url() {
        let config = Config {
            database_url: "postgres://localhost/carmeet".to_string(),
            database_backend: Some(Backend::Sqlite),
            ..Config::default()
        };
        assert_eq!(config.backend(), Some(Backend::Sqlite));

        let config = Config {
            database_url: "sqlite://carmeet.db".to_string(),
            ..Config::default()
        };
        assert_eq!(config.backend(), Some(Backend::Sqlite));
    }

    #[test]
    fn test_password_is_redacted() {
        assert_eq!(
            redact_password("postgres://carmeet:hunter2@db:5432/carmeet"),
            "postgres://carmeet:***@db:5432/carmeet"
        );
        assert_eq!(redact_password("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            redact_password("postgres://localhost/carmeet"),
            "postgres://localhost/carmeet"
        );
    }

    #[test]
    fn test_default_ttls() {
        let config = Config::default();
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.reset_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.db_max_connections, 5);
    }
}
