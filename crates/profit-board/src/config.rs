//! Configuration for the profit board

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use profit_core::constants;

/// Currency suffix shown after amounts
pub const DEFAULT_CURRENCY: &str = "₽";

// =============================================================================
// File-based Configuration (profit-board.toml)
// =============================================================================

/// Configuration loaded from profit-board.toml. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

/// Backend connection
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend base URL, without trailing path
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_API_BASE.to_string(),
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Records per page
    pub page_size: usize,
    pub currency: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: constants::PAGE_SIZE,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Identity-provider context, when the board runs on behalf of a session user
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// URL-encoded context blob (`user=...&auth_date=...`)
    pub init_data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "profit_core=debug"
    pub level: Option<String>,
    /// pretty, compact or json
    pub format: Option<String>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse {}. Check for:\n\
                 - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
                 - Incorrect data types (page_size and timeout_secs are numbers)",
                path.display()
            )
        })
    }

    /// Like [`FileConfig::load`], but a missing file means defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Command-line values that take precedence over the file
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub offline: bool,
    pub log_level: Option<String>,
    pub page_size: Option<usize>,
}

/// Resolved settings the board runs with
#[derive(Debug)]
pub struct Config {
    /// `None` runs on the demo data set
    pub api_url: Option<String>,
    pub timeout: Duration,
    pub page_size: usize,
    pub currency: String,
    pub init_data: Option<String>,
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    pub fn from_file(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let page_size = overrides.page_size.unwrap_or(file.dashboard.page_size);
        if page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }

        let api_url = if overrides.offline {
            None
        } else {
            Some(overrides.api_url.unwrap_or(file.api.base_url))
        };

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(file.api.timeout_secs),
            page_size,
            currency: file.dashboard.currency,
            init_data: file.identity.init_data.filter(|d| !d.trim().is_empty()),
            log_level: overrides
                .log_level
                .or(file.logging.level)
                .unwrap_or_else(|| "info".to_string()),
            log_format: file.logging.format.unwrap_or_else(|| "pretty".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig::load_or_default(&dir.path().join("profit-board.toml")).unwrap();
        let config = Config::from_file(file, Overrides::default()).unwrap();

        assert_eq!(config.api_url.as_deref(), Some(constants::DEFAULT_API_BASE));
        assert_eq!(config.page_size, constants::PAGE_SIZE);
        assert_eq!(config.currency, DEFAULT_CURRENCY);
        assert_eq!(config.log_level, "info");
        assert!(config.init_data.is_none());
    }

    #[test]
    fn test_partial_file() {
        let file = write_config(
            r#"
[api]
base_url = "https://profits.example.org"

[dashboard]
page_size = 10

[logging]
format = "json"
"#,
        );
        let config = Config::from_file(FileConfig::load(file.path()).unwrap(), Overrides::default()).unwrap();

        assert_eq!(config.api_url.as_deref(), Some("https://profits.example.org"));
        assert_eq!(config.timeout, Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.currency, DEFAULT_CURRENCY);
        assert_eq!(config.log_format, "json");
    }

    #[test]
    fn test_overrides_win() {
        let file = write_config("[dashboard]\npage_size = 10\n[logging]\nlevel = \"warn\"\n");
        let overrides = Overrides {
            api_url: Some("http://localhost:9000".to_string()),
            offline: false,
            log_level: Some("debug".to_string()),
            page_size: Some(3),
        };
        let config = Config::from_file(FileConfig::load(file.path()).unwrap(), overrides).unwrap();

        assert_eq!(config.api_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.page_size, 3);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_offline_drops_api_url() {
        let overrides = Overrides {
            offline: true,
            ..Default::default()
        };
        let config = Config::from_file(FileConfig::default(), overrides).unwrap();
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_rejects_bad_input() {
        let file = write_config("[dashboard]\npage_size = \"five\"\n");
        assert!(FileConfig::load(file.path()).is_err());

        let overrides = Overrides {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(Config::from_file(FileConfig::default(), overrides).is_err());
    }

    #[test]
    fn test_blank_init_data_ignored() {
        let file = write_config("[identity]\ninit_data = \"  \"\n");
        let config = Config::from_file(FileConfig::load(file.path()).unwrap(), Overrides::default()).unwrap();
        assert!(config.init_data.is_none());
    }
}
