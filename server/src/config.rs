use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);
pub const DEFAULT_SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when DATABASE_URL is set")]
    Missing(&'static str),
}

#[derive(Clone)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: Vec<u8>,
    pub bind_addr: SocketAddr,
    pub session_ttl_secs: i64,
    pub cookie_secure: bool,
    pub delete_recipes_with_user: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("bind_addr", &self.bind_addr)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .field("delete_recipes_with_user", &self.delete_recipes_with_user)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL");
        let jwt_secret = match (var("JWT_SECRET"), &database_url) {
            (Some(secret), _) => secret.into_bytes(),
            (None, Some(_)) => return Err(ConfigError::Missing("JWT_SECRET")),
            (None, None) => {
                warn!("JWT_SECRET not set, sessions will not survive a restart");
                rand::random::<[u8; 32]>().to_vec()
            }
        };

        let session_ttl_secs = try_load(
            "SESSION_TTL_SECS",
            var("SESSION_TTL_SECS"),
            DEFAULT_SESSION_TTL_SECS,
        )?;
        if session_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_SECS",
                value: session_ttl_secs.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: try_load(
                "BIND_ADDR",
                var("BIND_ADDR"),
                SocketAddr::from(DEFAULT_BIND_ADDR),
            )?,
            session_ttl_secs,
            cookie_secure: load_flag("COOKIE_SECURE", var("COOKIE_SECURE"))?,
            delete_recipes_with_user: load_flag(
                "DELETE_RECIPES_WITH_USER",
                var("DELETE_RECIPES_WITH_USER"),
            )?,
        })
    }
}

fn try_load<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn load_flag(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_database() {
        let config = load(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.jwt_secret.len(), 32);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert!(!config.cookie_secure);
        assert!(!config.delete_recipes_with_user);
    }

    #[test]
    fn test_database_requires_secret() {
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://localhost/potluck")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/potluck"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.jwt_secret, b"s3cret");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SESSION_TTL_SECS", "3600"),
            ("COOKIE_SECURE", "true"),
            ("DELETE_RECIPES_WITH_USER", "1"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.session_ttl_secs, 3600);
        assert!(config.cookie_secure);
        assert!(config.delete_recipes_with_user);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(matches!(
            load(&[("SESSION_TTL_SECS", "soon")]),
            Err(ConfigError::Invalid { key: "SESSION_TTL_SECS", .. })
        ));
        assert!(load(&[("SESSION_TTL_SECS", "0")]).is_err());
        assert!(matches!(
            load(&[("COOKIE_SECURE", "maybe")]),
            Err(ConfigError::Invalid { key: "COOKIE_SECURE", .. })
        ));
        assert!(load(&[("BIND_ADDR", "nowhere")]).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = load(&[
            ("DATABASE_URL", "postgres://user:pw@db/potluck"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("pw@db"));
        assert!(!shown.contains("s3cret"));
    }
}
