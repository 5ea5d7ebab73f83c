use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Hours east of UTC for the business day, 7 for WIB.
    pub utc_offset_hours: i32,
    /// Record the workplace position when a check-in reports none.
    pub trust_default_location: bool,
    pub shift_cache_ttl_secs: u64,
    pub log_level: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: optional("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            utc_offset_hours: optional("UTC_OFFSET_HOURS", 7)?,
            trust_default_location: optional("TRUST_DEFAULT_LOCATION", true)?,
            shift_cache_ttl_secs: optional("SHIFT_CACHE_TTL_SECS", 300)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            utc_offset_hours: 7,
            trust_default_location: true,
            shift_cache_ttl_secs: 300,
            log_level: "debug".to_string(),
        }
    }
}
