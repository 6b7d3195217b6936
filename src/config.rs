use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

const DEFAULT_SCRYFALL_URL: &str = "https://api.scryfall.com";

#[derive(Debug, Clone)]
pub struct ScryfallConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl ScryfallConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScryfallConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SCRYFALL_URL.into(),
            timeout_secs: 10,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Unset means the in-memory store is used.
    pub database_url: Option<String>,
    pub scryfall: ScryfallConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let timeout_secs = match lookup("SCRYFALL_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("SCRYFALL_TIMEOUT_SECS is not a number: {v}"))?,
            None => 10,
        };
        let scryfall = ScryfallConfig {
            base_url: lookup("SCRYFALL_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SCRYFALL_URL.into()),
            timeout_secs,
            user_agent: lookup("SCRYFALL_USER_AGENT").unwrap_or_else(default_user_agent),
        };
        let port = match lookup("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a port: {v}"))?,
            None => 8080,
        };
        Ok(Self {
            database_url,
            scryfall,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

fn default_user_agent() -> String {
    format!("PlaneswalkersPrimer/{}", env!("CARGO_PKG_VERSION"))
}
