use clap::Parser;
use std::time::Duration;
use tracing::{info, warn};

use crate::neatqueue::{ClientConfig, DEFAULT_API_URL};

/// NeatQueue rankings gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "neatqueue-gateway", version, about)]
pub struct Config {
    /// HTTP listen address for the JSON API
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// NeatQueue API base URL
    #[arg(long, env = "NEATQUEUE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// NeatQueue API key (mock data is served when absent)
    #[arg(long, env = "NEATQUEUE_API_KEY")]
    pub api_key: Option<String>,

    /// Discord guild (server) ID where the bot is installed
    #[arg(long, env = "DISCORD_GUILD_ID")]
    pub guild_id: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Retries per request on transport errors, 429 and 5xx
    #[arg(long, env = "RETRY_ATTEMPTS", default_value = "3")]
    pub retry_attempts: u32,

    /// Delay between retries in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value = "1000")]
    pub retry_delay_ms: u64,

    /// Page size used when a request does not specify one
    #[arg(long, env = "DEFAULT_LIMIT", default_value = "50")]
    pub default_limit: usize,

    /// Largest page size a request may ask for
    #[arg(long, env = "MAX_LIMIT", default_value = "100")]
    pub max_limit: usize,
}

impl Config {
    /// Reject unusable settings and warn about suspicious ones.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_ms == 0 {
            anyhow::bail!("request_timeout_ms must be positive");
        }
        if self.default_limit == 0 || self.max_limit == 0 {
            anyhow::bail!("default_limit and max_limit must be positive");
        }
        if self.default_limit > self.max_limit {
            anyhow::bail!("default_limit must not exceed max_limit");
        }
        for warning in self.warnings() {
            warn!("{}", warning);
        }
        Ok(())
    }

    /// Non-fatal problems with the NeatQueue settings.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if let Some(key) = self.api_key.as_deref() {
            if !key.is_empty() && key.len() < 10 {
                warnings.push("API key seems too short - may be invalid");
            }
        }
        if !self.api_url.starts_with("http") {
            warnings.push("API URL should start with http:// or https://");
        }
        if let Some(guild) = self.guild_id.as_deref() {
            if !guild.is_empty() && !guild.chars().all(|c| c.is_ascii_digit()) {
                warnings.push("Guild ID should be numeric");
            }
        }
        warnings
    }

    /// Build the client configuration. Fails on a malformed base URL.
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let config = ClientConfig::new(&self.api_url, self.api_key.clone(), self.guild_id.clone())?
            .with_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_retries(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
            .with_limits(self.default_limit, self.max_limit);

        info!(
            api_url = %config.base_url,
            api_key = if config.api_key.is_some() { "set" } else { "not set" },
            api_key_len = config.api_key.as_deref().map_or(0, str::len),
            guild_id = config.guild_id.as_deref().unwrap_or("not set"),
            "NeatQueue settings loaded"
        );
        Ok(config)
    }

    /// Human-readable configuration status line.
    pub fn status_message(&self) -> String {
        let has_key = self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty());
        let has_guild = self.guild_id.as_deref().map_or(false, |g| !g.trim().is_empty());
        if has_key && has_guild {
            return "NeatQueue API is configured and ready.".to_string();
        }

        let mut missing = Vec::new();
        if !has_key {
            missing.push("API Key");
        }
        if !has_guild {
            missing.push("Guild ID");
        }
        format!(
            "NeatQueue API not configured. Missing: {}. Using mock data.",
            missing.join(", ")
        )
    }
}
