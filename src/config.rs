use std::env;
use std::fmt;
use std::ops::RangeInclusive;

use crate::auth::password::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};

/// Bootstrap administrator created at startup when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct Config {
    /// Postgres connection string. Without one the app runs on the in-memory store.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    /// Key material for signing the session cookie (at least 64 bytes).
    pub session_secret: Option<String>,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
    pub bcrypt_cost: u32,
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    Incomplete(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
            ConfigError::Incomplete(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// Accepted session lifetimes, from one hour to one year.
pub const SESSION_TTL_RANGE: RangeInclusive<i64> = 1..=8760;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let session_secret = non_empty("SESSION_SECRET");
        if let Some(secret) = &session_secret {
            if secret.len() < MIN_SESSION_SECRET_LEN {
                return Err(ConfigError::Invalid {
                    key: "SESSION_SECRET",
                    value: format!("<{} bytes>", secret.len()),
                });
            }
        }

        let admin_seed = match (
            non_empty("ADMIN_EMAIL"),
            non_empty("ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: non_empty("ADMIN_NAME").unwrap_or_else(|| "admin".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Incomplete(
                    "ADMIN_EMAIL and ADMIN_PASSWORD must be set together",
                ))
            }
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            server_port: parse_or("SERVER_PORT", non_empty("SERVER_PORT"), 8080)?,
            server_host: non_empty("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            session_secret,
            session_ttl_hours: parse_in_range(
                "SESSION_TTL_HOURS",
                non_empty("SESSION_TTL_HOURS"),
                24,
                SESSION_TTL_RANGE,
            )?,
            secure_cookies: parse_or("SECURE_COOKIES", non_empty("SECURE_COOKIES"), false)?,
            bcrypt_cost: parse_in_range(
                "BCRYPT_COST",
                non_empty("BCRYPT_COST"),
                bcrypt::DEFAULT_COST,
                MIN_BCRYPT_COST..=MAX_BCRYPT_COST,
            )?,
            admin_seed,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_in_range<T>(
    key: &'static str,
    value: Option<String>,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd,
{
    let raw = value.clone();
    let parsed = parse_or(key, value, default)?;
    if range.contains(&parsed) {
        Ok(parsed)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
        })
    }
}
