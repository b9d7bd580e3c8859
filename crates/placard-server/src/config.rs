use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use placard_api::DEFAULT_REMOVE_RADIUS_M;
use placard_api::claims::DEFAULT_TOKEN_TTL_HOURS;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_DB_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub remove_radius_m: f64,
    pub token_ttl_hours: i64,
    pub db_busy_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = var("PLACARD_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PLACARD_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = var("PLACARD_DB_PATH").unwrap_or_else(|| "placard.db".into()).into();
        let host = var("PLACARD_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("PLACARD_PORT")
            .unwrap_or_else(|| "50051".into())
            .parse()
            .context("PLACARD_PORT")?;
        let addr: SocketAddr = format!("{}:{}", host, port).parse().context("PLACARD_HOST")?;

        let remove_radius_m: f64 = match var("PLACARD_REMOVE_RADIUS_M") {
            Some(v) => v.parse().context("PLACARD_REMOVE_RADIUS_M")?,
            None => DEFAULT_REMOVE_RADIUS_M,
        };
        if !(remove_radius_m.is_finite() && remove_radius_m > 0.0) {
            bail!("PLACARD_REMOVE_RADIUS_M must be a positive number of metres");
        }

        let token_ttl_hours: i64 = match var("PLACARD_TOKEN_TTL_HOURS") {
            Some(v) => v.parse().context("PLACARD_TOKEN_TTL_HOURS")?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if token_ttl_hours <= 0 {
            bail!("PLACARD_TOKEN_TTL_HOURS must be positive");
        }

        let busy_ms: u64 = match var("PLACARD_DB_BUSY_TIMEOUT_MS") {
            Some(v) => v.parse().context("PLACARD_DB_BUSY_TIMEOUT_MS")?,
            None => DEFAULT_DB_BUSY_TIMEOUT_MS,
        };

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            remove_radius_m,
            token_ttl_hours,
            db_busy_timeout: Duration::from_millis(busy_ms),
        })
    }
}
