//! Configuration file parser for ~/.config/feedshift/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::content::DEFAULT_USER_AGENT;
use crate::serialize::OutputFormat;
use crate::transform::{FilterOptions, SortOptions};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// User-Agent for feed and article page requests.
    pub user_agent: String,

    /// Article pages fetched at once by the enhancer. 0 = one per item.
    pub max_concurrent_fetches: usize,

    /// Upper bound on a downloaded feed document.
    pub max_feed_size_bytes: usize,

    /// Upper bound on a downloaded article page.
    pub max_page_size_bytes: usize,

    /// Per-request timeout applied by the HTTP client. 0 = no timeout.
    pub request_timeout_secs: u64,

    /// Output format when `--format` is not given.
    pub default_format: OutputFormat,

    /// Default filters for `transform` and `convert`. Each command-line flag
    /// replaces the matching field.
    pub filter: FilterOptions,

    /// Ordering used when `--sort` is not given.
    pub sort: Option<SortOptions>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent_fetches: 0,
            max_feed_size_bytes: 10 * 1024 * 1024,
            max_page_size_bytes: 5 * 1024 * 1024,
            request_timeout_secs: 0,
            default_format: OutputFormat::Rss,
            filter: FilterOptions::default(),
            sort: None,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: &'static [&'static str] = &[
        "user_agent",
        "max_concurrent_fetches",
        "max_feed_size_bytes",
        "max_page_size_bytes",
        "request_timeout_secs",
        "default_format",
        "filter",
        "sort",
    ];

    /// `~/.config/feedshift/config.toml`, or `None` when `HOME` is unset.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("feedshift")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(format = ?config.default_format, "Loaded configuration");
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{SortBy, SortOrder};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.max_concurrent_fetches, 0);
        assert_eq!(config.max_feed_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.request_timeout_secs, 0);
        assert_eq!(config.default_format, OutputFormat::Rss);
        assert_eq!(config.filter, FilterOptions::default());
        assert!(config.sort.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedshift_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.default_format, OutputFormat::Rss);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("feedshift_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::from_toml("default_format = \"json\"\n").unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
        assert_eq!(config.max_page_size_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
user_agent = "my-reader/1.0"
max_concurrent_fetches = 8
max_feed_size_bytes = 2048
max_page_size_bytes = 4096
request_timeout_secs = 15
default_format = "atom"

[filter]
exclude_keywords = ["sponsored"]
from_date = "2024-01-01T00:00:00Z"
limit = 20

[sort]
by = "title"
order = "asc"
"#;

        let config = Config::from_toml(content).unwrap();
        assert_eq!(config.user_agent, "my-reader/1.0");
        assert_eq!(config.max_concurrent_fetches, 8);
        assert_eq!(config.max_feed_size_bytes, 2048);
        assert_eq!(config.max_page_size_bytes, 4096);
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.default_format, OutputFormat::Atom);
        assert_eq!(config.filter.exclude_keywords, vec!["sponsored"]);
        assert!(config.filter.keywords.is_empty());
        assert_eq!(config.filter.limit, Some(20));
        assert_eq!(
            config.filter.from_date.map(|d| d.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
        assert_eq!(
            config.sort,
            Some(SortOptions {
                by: SortBy::Title,
                order: SortOrder::Asc,
            })
        );
    }

    #[test]
    fn test_sort_table_defaults_to_date_desc() {
        let config = Config::from_toml("[sort]\n").unwrap();
        assert_eq!(config.sort, Some(SortOptions::default()));
        assert_eq!(SortOptions::default().order, SortOrder::Desc);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::from_toml("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::from_toml("totally_fake_key = 1\ndefault_format = \"rss\"\n").unwrap();
        assert_eq!(config.default_format, OutputFormat::Rss);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::from_toml("max_concurrent_fetches = \"lots\"\n").is_err());
        assert!(Config::from_toml("default_format = \"yaml\"\n").is_err());
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("feedshift_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
