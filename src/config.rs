use jsonwebtoken::Algorithm;
use std::{str::FromStr, time::Duration};
use thiserror::Error;

// ============================================================================
// CONFIGURATION - Read once at startup, never re-read
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Token signing settings shared by every request.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub token_ttl: chrono::Duration,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub bcrypt_cost: u32,
    pub max_connections: usize,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let algorithm = match lookup("ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let ttl_minutes: i64 = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 20)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "must be positive".into(),
            });
        }

        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: format!("{} is outside 4..=31", bcrypt_cost),
            });
        }

        let max_connections: usize = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        let max_concurrent_requests: usize = parse_or(&lookup, "MAX_CONCURRENT_REQUESTS", 1024)?;
        if max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_CONCURRENT_REQUESTS",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            auth: AuthConfig {
                secret,
                algorithm,
                token_ttl: chrono::Duration::minutes(ttl_minutes),
            },
            store: StoreConfig {
                bcrypt_cost,
                max_connections,
                acquire_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    5,
                )?),
            },
            cache_ttl: Duration::from_secs(parse_or(&lookup, "CACHE_TTL_SECONDS", 5)?),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            max_concurrent_requests,
        })
    }
}

/// Only HMAC algorithms work with a shared secret.
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(raw.trim()).map_err(|e| ConfigError::Invalid {
        key: "ALGORITHM",
        reason: e.to_string(),
    })?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(ConfigError::Invalid {
            key: "ALGORITHM",
            reason: format!("{:?} needs a key pair, only HS256/HS384/HS512 are supported", other),
        }),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup_from(&[("SECRET_KEY", "s3cret")])).unwrap();

        assert_eq!(config.auth.algorithm, Algorithm::HS256);
        assert_eq!(config.auth.token_ttl, chrono::Duration::minutes(20));
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.store.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.store.max_connections, 10);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SECRET_KEY")));
    }

    #[test]
    fn asymmetric_algorithm_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SECRET_KEY", "k"), ("ALGORITHM", "RS256")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ALGORITHM", .. }));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("SECRET_KEY", "k"),
            ("ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "45"),
            ("BCRYPT_COST", "4"),
            ("CACHE_TTL_SECONDS", "1"),
        ]))
        .unwrap();

        assert_eq!(config.auth.algorithm, Algorithm::HS512);
        assert_eq!(config.auth.token_ttl, chrono::Duration::minutes(45));
        assert_eq!(config.store.bcrypt_cost, 4);
        assert_eq!(config.cache_ttl, Duration::from_secs(1));
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("SECRET_KEY", "k"),
            ("DB_MAX_CONNECTIONS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", .. }));
    }
}
