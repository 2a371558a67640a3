//! Baseline engine options applied on construction and on every reset.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Options every fresh or reset client starts from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Absolute limit for one transfer, connect included.
    #[serde(with = "secs")]
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    pub auto_referer: bool,
    /// Peer and host TLS verification. Off unless asked for.
    pub verify_tls: bool,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            follow_redirects: true,
            max_redirects: 10,
            auto_referer: true,
            verify_tls: false,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `FLUENT_CURL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup("FLUENT_CURL_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse("FLUENT_CURL_TIMEOUT_SECS", value)?);
        }
        if let Some(value) = lookup("FLUENT_CURL_MAX_REDIRECTS") {
            config.max_redirects = parse("FLUENT_CURL_MAX_REDIRECTS", value)?;
        }
        if let Some(value) = lookup("FLUENT_CURL_VERIFY_TLS") {
            config.verify_tls = parse("FLUENT_CURL_VERIFY_TLS", value)?;
        }
        if let Some(value) = lookup("FLUENT_CURL_USER_AGENT") {
            config.user_agent = Some(value);
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T> {
    value.trim().parse().map_err(|_| Error::Config { key, value })
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
