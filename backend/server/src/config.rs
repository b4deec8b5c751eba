use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Result, anyhow, bail};
use tracing::info;

/// How long a visitor stays deduplicated for a slug.
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const DEFAULT_PORT: &str = "1111";
const DEFAULT_REDIS_URL: &str = "redis://redis:6379";
const DEFAULT_DEDUP_TTL_SECS: &str = "86400";
const DEFAULT_TRUST_PROXY: &str = "false";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub dedup_ttl: Duration,
    /// Read the visitor address from `X-Forwarded-For` / `X-Real-IP` before the socket peer.
    pub trust_proxy: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dedup_ttl_secs: u64 = try_load(&lookup, "DEDUP_TTL_SECS", DEFAULT_DEDUP_TTL_SECS)?;
        if dedup_ttl_secs == 0 {
            bail!("DEDUP_TTL_SECS must be greater than zero");
        }

        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", DEFAULT_PORT)?,
            redis_url: try_load(&lookup, "REDIS_URL", DEFAULT_REDIS_URL)?,
            dedup_ttl: Duration::from_secs(dedup_ttl_secs),
            trust_proxy: try_load(&lookup, "TRUST_PROXY", DEFAULT_TRUST_PROXY)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            dedup_ttl: DEFAULT_DEDUP_TTL,
            trust_proxy: false,
        }
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}
