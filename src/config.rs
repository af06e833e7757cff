//! Configuration types for simplespider

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Main configuration
///
/// Every section has defaults, so `{}` is a valid configuration:
///
/// ```
/// use simplespider::Config;
///
/// let config = Config::from_json_str(r#"{"engine": {"default_retry": 5}}"#)?;
/// assert_eq!(config.engine.default_retry, 5);
/// assert_eq!(config.engine.event_channel_capacity, 1000);
/// # Ok::<(), simplespider::Error>(())
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dispatch engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// HTTP download runner settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Link extraction runner settings
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Durable queue and storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Parse a JSON document and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.engine.name.trim().is_empty() {
            return Err(Error::config("engine.name", "spider name cannot be empty"));
        }
        if self.engine.event_channel_capacity == 0 {
            return Err(Error::config(
                "engine.event_channel_capacity",
                "event channel capacity must be at least 1",
            ));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(Error::config("http.user_agent", "user agent cannot be empty"));
        }
        if self.http.timeout.is_zero() {
            return Err(Error::config("http.timeout", "timeout must be at least 1 second"));
        }
        if self.http.tags.iter().any(|tag| tag.is_empty()) {
            return Err(Error::config("http.tags", "tags cannot be empty strings"));
        }
        if self.persistence.database_path.as_os_str().is_empty() {
            return Err(Error::config(
                "persistence.database_path",
                "database path cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Dispatch engine settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name used in the spider's tracing span (default: "spider")
    #[serde(default = "default_name")]
    pub name: String,

    /// Retry budget for tasks seeded through the spider (default: 2)
    #[serde(default = "default_retry")]
    pub default_retry: u32,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Suppress download tasks that were already processed (default: true)
    #[serde(default = "default_true")]
    pub dedup_downloads: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            default_retry: default_retry(),
            event_channel_capacity: default_event_channel_capacity(),
            dedup_downloads: true,
        }
    }
}

/// HTTP download runner settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Follow redirects (default: true)
    #[serde(default = "default_true")]
    pub allow_redirects: bool,

    /// Maximum trail length to follow; 0 means unlimited (default: 0)
    #[serde(default)]
    pub max_depth: usize,

    /// Tags added to every scrape task the downloader emits
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            allow_redirects: true,
            max_depth: 0,
            tags: vec![],
        }
    }
}

/// Link extraction runner settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Look for bare URLs in non-HTML text responses (default: true)
    #[serde(default = "default_true")]
    pub find_urls_in_text: bool,

    /// Emit each link only once per page (default: true)
    #[serde(default = "default_true")]
    pub deduplicate_links: bool,

    /// Only extract from pages whose trail is shorter than this; 0 means unlimited
    #[serde(default)]
    pub max_depth: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            find_urls_in_text: true,
            deduplicate_links: true,
            max_depth: 0,
        }
    }
}

/// Durable queue and storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./simplespider.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Flush every write to disk before returning (default: false)
    #[serde(default)]
    pub synchronous: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            synchronous: false,
        }
    }
}

fn default_name() -> String {
    "spider".to_string()
}

fn default_retry() -> u32 {
    crate::task::DEFAULT_RETRY
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("simplespider/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./simplespider.db")
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
