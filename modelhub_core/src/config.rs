use crate::catalog::DEFAULT_CACHE_TTL;
use crate::{Error, Result};
use std::time::Duration;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_USER_AGENT: &str = "modelhub";

#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API root, e.g. `https://api.github.com` or a GitHub Enterprise `/api/v3` URL.
    pub api_base: String,
    /// Client-side bound on each contents read.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            timeout: DEFAULT_GITHUB_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" | "pretty" => Some(Self::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub github: GithubConfig,
    pub cache_ttl: Duration,
    pub log_format: LogFormat,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            log_format: LogFormat::default(),
        }
    }
}

impl CatalogConfig {
    #[tracing::instrument(level = "debug")]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("MODELHUB_GITHUB_API_BASE") {
            cfg.github.api_base = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get("MODELHUB_GITHUB_TIMEOUT_MS") {
            let ms = v.trim().parse::<u64>().map_err(|_| {
                Error::InvalidInput(format!("invalid MODELHUB_GITHUB_TIMEOUT_MS: {v}"))
            })?;
            cfg.github.timeout = Duration::from_millis(ms);
        }
        if let Some(v) = get("MODELHUB_USER_AGENT") {
            cfg.github.user_agent = v.trim().to_string();
        }
        if let Some(v) = get("MODELHUB_CACHE_TTL_SECS") {
            let secs = v.trim().parse::<u64>().map_err(|_| {
                Error::InvalidInput(format!("invalid MODELHUB_CACHE_TTL_SECS: {v}"))
            })?;
            cfg.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(v) = get("MODELHUB_LOG_FORMAT") {
            cfg.log_format = LogFormat::parse(&v)
                .ok_or_else(|| Error::InvalidInput(format!("invalid MODELHUB_LOG_FORMAT: {v}")))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    #[tracing::instrument(level = "debug")]
    pub fn validate(&self) -> Result<()> {
        if self.github.api_base.trim().is_empty() {
            return Err(Error::InvalidInput("github.api_base is empty".to_string()));
        }
        if !(self.github.api_base.starts_with("http://")
            || self.github.api_base.starts_with("https://"))
        {
            return Err(Error::InvalidInput(format!(
                "github.api_base must be an http(s) URL: {}",
                self.github.api_base
            )));
        }
        if self.github.timeout.is_zero() {
            return Err(Error::InvalidInput(
                "github.timeout must be > 0".to_string(),
            ));
        }
        if self.github.user_agent.trim().is_empty() {
            return Err(Error::InvalidInput("github.user_agent is empty".to_string()));
        }
        if self.cache_ttl.is_zero() {
            return Err(Error::InvalidInput("cache_ttl must be > 0".to_string()));
        }
        Ok(())
    }
}
