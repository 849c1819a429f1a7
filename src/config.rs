//! Settings from `~/.config/rsswatch/config.toml`.
//!
//! The file is optional. Keys we do not recognize are skipped with a warning.

use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::i18n::Locale;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config is larger than {max} bytes")]
    TooLarge { max: u64 },

    #[error("proxy_url {url:?} is unusable: {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Runtime settings. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// allorigins-compatible proxy endpoint. Feeds are requested as
    /// `<proxy_url>?url=<feed>&disableCache=true`.
    pub proxy_url: String,

    /// Delay between the end of one poll cycle and the start of the next.
    pub poll_interval_ms: u64,

    /// Timeout for one proxy request, including the body.
    pub request_timeout_ms: u64,

    /// Maximum number of feeds fetched at the same time while polling.
    pub max_concurrent_fetches: usize,

    /// Maximum proxy response size in bytes.
    pub max_response_bytes: usize,

    /// Display language.
    pub locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: "https://allorigins.hexlet.app/get".to_string(),
            poll_interval_ms: 5_000,
            request_timeout_ms: 10_000,
            max_concurrent_fetches: 10,
            max_response_bytes: 10 * 1024 * 1024,
            locale: Locale::Ru,
        }
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    const KNOWN_KEYS: [&'static str; 6] = [
        "proxy_url",
        "poll_interval_ms",
        "request_timeout_ms",
        "max_concurrent_fetches",
        "max_response_bytes",
        "locale",
    ];

    /// Reads `path`, falling back to defaults when the file does not exist.
    ///
    /// Blank files also yield defaults. Anything over `MAX_FILE_SIZE` is
    /// rejected before parsing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config absent, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                max: Self::MAX_FILE_SIZE,
            });
        }

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let table: toml::Table = content.parse()?;
        table
            .keys()
            .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
            .for_each(|key| tracing::warn!(key = %key, "Ignoring unknown config key"));

        let config: Config = toml::from_str(content)?;
        config.check()?;
        tracing::info!(
            proxy = %config.proxy_url,
            poll_interval_ms = config.poll_interval_ms,
            locale = %config.locale,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Applies command-line overrides on top of the loaded values.
    ///
    /// # Arguments
    ///
    /// * `proxy_url` - replaces `proxy_url` when given
    /// * `poll_interval_ms` - replaces `poll_interval_ms` when given
    /// * `locale` - replaces `locale` when given
    ///
    /// # Errors
    ///
    /// The result is checked like a config file: zero values give
    /// [`ConfigError::Zero`] and an unusable proxy gives
    /// [`ConfigError::InvalidProxy`].
    pub fn apply_overrides(
        &mut self,
        proxy_url: Option<String>,
        poll_interval_ms: Option<u64>,
        locale: Option<Locale>,
    ) -> Result<(), ConfigError> {
        if let Some(proxy_url) = proxy_url {
            self.proxy_url = proxy_url;
        }
        if let Some(ms) = poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        if let Some(locale) = locale {
            self.locale = locale;
        }
        self.check()?;
        self.proxy_base().map(|_| ())
    }

    fn check(&self) -> Result<(), ConfigError> {
        let zero = [
            ("poll_interval_ms", self.poll_interval_ms == 0),
            ("request_timeout_ms", self.request_timeout_ms == 0),
            ("max_concurrent_fetches", self.max_concurrent_fetches == 0),
            ("max_response_bytes", self.max_response_bytes == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((key, _)) => Err(ConfigError::Zero { key: *key }),
            None => Ok(()),
        }
    }

    /// The proxy endpoint as a URL. Only http(s) endpoints are accepted.
    pub fn proxy_base(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidProxy {
            url: self.proxy_url.clone(),
            reason,
        };
        let url = Url::parse(&self.proxy_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(invalid(format!("unsupported scheme {scheme}"))),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
