use std::time::Duration;

use crate::errors::{TabfeedError, TabfeedResult};

pub const DEFAULT_API_URL: &str = "https://www.tabnews.com.br/api/v1";
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_STRATEGY: &str = "relevant";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizerConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub page_size: usize,
    pub strategy: String,
    pub timeout: Duration,
    pub summarizer: Option<SummarizerConfig>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> TabfeedResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> TabfeedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = var("TABFEED_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let page_size = match var("TABFEED_PAGE_SIZE") {
            Some(raw) => parse_positive(&raw, "TABFEED_PAGE_SIZE")? as usize,
            None => DEFAULT_PAGE_SIZE,
        };

        let strategy = var("TABFEED_STRATEGY").unwrap_or_else(|| DEFAULT_STRATEGY.to_string());

        let timeout_secs = match var("TABFEED_TIMEOUT_SECS") {
            Some(raw) => parse_positive(&raw, "TABFEED_TIMEOUT_SECS")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let summarizer = var("SUMMARIZER_URL").map(|url| SummarizerConfig {
            url,
            api_key: var("SUMMARIZER_API_KEY"),
            model: var("SUMMARIZER_MODEL"),
        });

        Ok(Self {
            api_url,
            page_size,
            strategy,
            timeout: Duration::from_secs(timeout_secs),
            summarizer,
        })
    }
}

fn parse_positive(raw: &str, key: &str) -> TabfeedResult<u64> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(TabfeedError::Config(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> TabfeedResult<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.strategy, "relevant");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.summarizer.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TABFEED_API_URL", "http://localhost:3000/api/v1/"),
            ("TABFEED_PAGE_SIZE", "50"),
            ("TABFEED_STRATEGY", "new"),
            ("SUMMARIZER_URL", "http://localhost:11434/v1/chat/completions"),
            ("SUMMARIZER_MODEL", "llama3"),
        ])
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:3000/api/v1");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.strategy, "new");

        let summarizer = config.summarizer.unwrap();
        assert_eq!(summarizer.model.as_deref(), Some("llama3"));
        assert!(summarizer.api_key.is_none());
    }

    #[test]
    fn test_blank_summarizer_url_means_unconfigured() {
        let config = config_from(&[("SUMMARIZER_URL", "  ")]).unwrap();
        assert!(config.summarizer.is_none());
    }

    #[test]
    fn test_invalid_page_size() {
        let err = config_from(&[("TABFEED_PAGE_SIZE", "0")]).unwrap_err();
        assert!(matches!(err, TabfeedError::Config(_)));

        let err = config_from(&[("TABFEED_PAGE_SIZE", "lots")]).unwrap_err();
        assert!(err.to_string().contains("TABFEED_PAGE_SIZE"));
    }
}
