//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An upper bound on a count, or no bound at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Max(u32),
    Unlimited,
}

impl Limit {
    /// Whether `count` is still below this limit.
    pub fn allows(self, count: u32) -> bool {
        match self {
            Limit::Max(max) => count < max,
            Limit::Unlimited => true,
        }
    }

    /// The tighter of two limits.
    pub fn min(self, other: Limit) -> Limit {
        match (self, other) {
            (Limit::Max(a), Limit::Max(b)) => Limit::Max(a.min(b)),
            (Limit::Max(a), Limit::Unlimited) | (Limit::Unlimited, Limit::Max(a)) => Limit::Max(a),
            (Limit::Unlimited, Limit::Unlimited) => Limit::Unlimited,
        }
    }

    /// Parse the integer form used by env vars and config files.
    /// `-1` means unlimited; zero and other negatives are rejected.
    pub fn from_count(key: &str, value: i64) -> std::result::Result<Self, ConfigError> {
        match value {
            -1 => Ok(Limit::Unlimited),
            1.. => u32::try_from(value)
                .map(Limit::Max)
                .map_err(|_| ConfigError::Invalid(format!("{key} is too large: {value}"))),
            _ => Err(ConfigError::Invalid(format!(
                "{key} must be a positive integer, -1 or \"unlimited\" (got {value})"
            ))),
        }
    }

    fn parse(key: &str, raw: &str) -> std::result::Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("unlimited") {
            return Ok(Limit::Unlimited);
        }
        let value = raw
            .parse::<i64>()
            .map_err(|_| ConfigError::Invalid(format!("{key} is not an integer: {raw}")))?;
        Self::from_count(key, value)
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Limit::Max(max) => write!(f, "{max}"),
            Limit::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Cache sizing shared by the post-context and username caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Seconds an entry stays valid. Zero disables expiry.
    pub ttl_secs: u64,

    /// Entries kept before the least recently used one is evicted.
    pub max_entries: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_entries: 1000,
        }
    }
}

/// Resolved bot configuration. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token.
    pub discord_token: String,

    /// Twitter API v2 bearer token.
    pub twitter_bearer_token: String,

    /// How many levels of replies the bot follows.
    pub max_depth: Limit,

    /// How many post URLs are handled per message.
    pub max_urls_per_message: Limit,

    /// Depth used by the slash command when the invocation gives none.
    pub default_depth: Option<Limit>,

    /// Post reply-derived context as well as quotes.
    pub include_replies: bool,

    pub cache: CacheConfig,
}

/// On-disk shape of the config file. Every key is optional so the file can be
/// partial and filled in from the environment.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    discord_token: Option<String>,
    twitter_bearer_token: Option<String>,
    max_depth: Option<TomlLimit>,
    max_urls_per_message: Option<TomlLimit>,
    default_depth: Option<TomlLimit>,
    include_replies: Option<bool>,
    #[serde(default)]
    cache: TomlCacheConfig,
}

#[derive(Debug, Default, Deserialize)]
struct TomlCacheConfig {
    ttl_secs: Option<u64>,
    max_entries: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlLimit {
    Count(i64),
    Word(String),
}

impl TomlLimit {
    fn resolve(&self, key: &str) -> std::result::Result<Limit, ConfigError> {
        match self {
            TomlLimit::Count(value) => Limit::from_count(key, *value),
            TomlLimit::Word(word) => Limit::parse(key, word),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("tweetcontext"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Load configuration from the default file (if present) and environment.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let file = if path.exists() {
            Self::read_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using environment only");
            TomlConfig::default()
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Load from a specific config file path, with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = Self::read_file(path)?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Self::resolve(file, |_| None)
    }

    fn read_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Load {
            path: path.display().to_string(),
            source: std::sync::Arc::new(error),
        })?;
        Ok(toml::from_str(&content).map_err(ConfigError::from)?)
    }

    fn resolve(file: TomlConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let discord_token = env("DISCORD_TOKEN")
            .or(file.discord_token)
            .ok_or_else(|| ConfigError::MissingKey("discord_token".into()))?;

        let twitter_bearer_token = env("TWITTER_BEARER_TOKEN")
            .or(file.twitter_bearer_token)
            .ok_or_else(|| ConfigError::MissingKey("twitter_bearer_token".into()))?;

        let limit = |env_key: &str, file_key: &str, file_value: Option<TomlLimit>| {
            match env(env_key) {
                Some(raw) => Limit::parse(env_key, &raw).map(Some),
                None => file_value.map(|value| value.resolve(file_key)).transpose(),
            }
        };

        let max_depth =
            limit("MAX_QUOTE_DEPTH", "max_depth", file.max_depth)?.unwrap_or(Limit::Max(3));
        let max_urls_per_message = limit(
            "MAX_URLS_PER_MSG",
            "max_urls_per_message",
            file.max_urls_per_message,
        )?
        .unwrap_or(Limit::Max(5));
        let default_depth = limit("DEFAULT_DEPTH", "default_depth", file.default_depth)?;

        let include_replies = match env("INCLUDE_REPLIES") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                ConfigError::Invalid(format!("INCLUDE_REPLIES must be true or false (got {raw})"))
            })?,
            None => file.include_replies.unwrap_or(true),
        };

        let defaults = CacheConfig::default();
        let ttl_secs = match env("QUOTE_CACHE_TTL") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!("QUOTE_CACHE_TTL must be a non-negative integer (got {raw})"))
            })?,
            None => file.cache.ttl_secs.unwrap_or(defaults.ttl_secs),
        };
        let max_entries = match env("QUOTE_CACHE_MAX_KEYS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!("QUOTE_CACHE_MAX_KEYS must be a positive integer (got {raw})"))
            })?,
            None => file.cache.max_entries.unwrap_or(defaults.max_entries),
        };
        if max_entries == 0 {
            return Err(ConfigError::Invalid("cache.max_entries must be at least 1".into()).into());
        }

        Ok(Self {
            discord_token,
            twitter_bearer_token,
            max_depth,
            max_urls_per_message,
            default_depth,
            include_replies,
            cache: CacheConfig {
                ttl_secs,
                max_entries,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn parses_full_file() {
        let config = Config::from_toml(
            r#"
            discord_token = "discord"
            twitter_bearer_token = "bearer"
            max_depth = "unlimited"
            max_urls_per_message = 2
            default_depth = 1
            include_replies = false

            [cache]
            ttl_secs = 60
            max_entries = 10
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.twitter_bearer_token, "bearer");
        assert_eq!(config.max_depth, Limit::Unlimited);
        assert_eq!(config.max_urls_per_message, Limit::Max(2));
        assert_eq!(config.default_depth, Some(Limit::Max(1)));
        assert!(!config.include_replies);
        assert_eq!(config.cache.ttl(), Some(Duration::from_secs(60)));
        assert_eq!(config.cache.max_entries, 10);
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_toml(
            r#"
            discord_token = "discord"
            twitter_bearer_token = "bearer"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.max_depth, Limit::Max(3));
        assert_eq!(config.max_urls_per_message, Limit::Max(5));
        assert_eq!(config.default_depth, None);
        assert!(config.include_replies);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn minus_one_is_unlimited() {
        let config = Config::from_toml(
            r#"
            discord_token = "discord"
            twitter_bearer_token = "bearer"
            max_depth = -1
            "#,
        )
        .expect("config should parse");
        assert_eq!(config.max_depth, Limit::Unlimited);
    }

    #[test]
    fn rejects_zero_depth() {
        let result = Config::from_toml(
            r#"
            discord_token = "discord"
            twitter_bearer_token = "bearer"
            max_depth = 0
            "#,
        );
        assert!(matches!(result, Err(Error::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn rejects_empty_cache() {
        let result = Config::from_toml(
            r#"
            discord_token = "discord"
            twitter_bearer_token = "bearer"
            [cache]
            max_entries = 0
            "#,
        );
        assert!(matches!(result, Err(Error::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn requires_bearer_token() {
        let result = Config::from_toml(r#"discord_token = "discord""#);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingKey(key))) if key == "twitter_bearer_token"
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let file: TomlConfig = toml::from_str(
            r#"
            discord_token = "discord"
            twitter_bearer_token = "file-token"
            max_depth = 2
            "#,
        )
        .expect("toml should parse");

        let config = Config::resolve(file, |key| match key {
            "TWITTER_BEARER_TOKEN" => Some("env-token".into()),
            "MAX_QUOTE_DEPTH" => Some("-1".into()),
            "QUOTE_CACHE_TTL" => Some("0".into()),
            _ => None,
        })
        .expect("config should resolve");

        assert_eq!(config.twitter_bearer_token, "env-token");
        assert_eq!(config.max_depth, Limit::Unlimited);
        assert_eq!(config.cache.ttl(), None);
    }

    #[test]
    fn limit_min_and_allows() {
        assert_eq!(Limit::Max(3).min(Limit::Max(1)), Limit::Max(1));
        assert_eq!(Limit::Unlimited.min(Limit::Max(2)), Limit::Max(2));
        assert_eq!(Limit::Unlimited.min(Limit::Unlimited), Limit::Unlimited);
        assert!(Limit::Max(1).allows(0));
        assert!(!Limit::Max(1).allows(1));
        assert!(Limit::Unlimited.allows(u32::MAX));
    }

    #[test]
    fn unreadable_file_is_a_load_error() {
        let path = std::env::temp_dir().join("tweetcontext-missing/config.toml");
        let error = Config::load_from_path(&path).expect_err("file does not exist");
        assert!(matches!(
            error,
            Error::Config(ConfigError::Load { ref path, .. }) if path.ends_with("config.toml")
        ));
    }
}
