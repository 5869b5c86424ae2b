use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

/// Signing secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your_secret_key",
];

/// Ten years; keeps expiry arithmetic far from chrono's range limits.
const MAX_TOKEN_TTL_HOURS: i64 = 10 * 365 * 24;

/// Process configuration, read once at startup.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("SCRIBE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SCRIBE_JWT_SECRET is unset or still a placeholder");
        }

        let token_ttl_hours: i64 = parse_or(&get, "SCRIBE_TOKEN_TTL_HOURS", 24)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!("SCRIBE_TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}");
        }

        Ok(Self {
            host: get("SCRIBE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "SCRIBE_PORT", 8080)?,
            db_path: get("SCRIBE_DB_PATH").unwrap_or_else(|| "scribe.db".into()).into(),
            jwt_secret,
            token_ttl_hours,
            // Argon2id defaults: 19 MiB, 2 passes, 1 lane
            argon2_memory_kib: parse_or(&get, "SCRIBE_ARGON2_MEMORY_KIB", 19 * 1024)?,
            argon2_iterations: parse_or(&get, "SCRIBE_ARGON2_ITERATIONS", 2)?,
            argon2_parallelism: parse_or(&get, "SCRIBE_ARGON2_PARALLELISM", 1)?,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
