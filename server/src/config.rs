//! Server configuration read from environment variables.

use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub pool_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3000")?;

        let pool_size = match lookup("DB_POOL_SIZE") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    anyhow!("DB_POOL_SIZE must be a positive integer, got {:?}", value)
                })?,
            None => DEFAULT_POOL_SIZE,
        };

        Ok(Self {
            database_url,
            bind_addr,
            pool_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/foodgram")]).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/foodgram");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.pool_size, 10);
    }

    #[test]
    fn test_missing_database_url() {
        assert!(config_from(&[]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/foodgram"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_POOL_SIZE", "4"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.pool_size, 4);
    }

    #[test]
    fn test_invalid_pool_size() {
        assert!(config_from(&[("DATABASE_URL", "x"), ("DB_POOL_SIZE", "0")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("DB_POOL_SIZE", "lots")]).is_err());
    }
}
