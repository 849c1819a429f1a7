use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::error::ErrorKind;

/// Errors that can occur while validating a submitted feed URL.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The input was empty after trimming.
    #[error("URL is required")]
    Missing,
    /// A feed with this URL is already subscribed.
    #[error("Feed already added: {0}")]
    Duplicate(String),
    /// The URL string could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::Missing => ErrorKind::MissingUrl,
            ValidationError::Duplicate(_) => ErrorKind::DuplicateFeed,
            ValidationError::InvalidUrl(_)
            | ValidationError::UnsupportedScheme(_)
            | ValidationError::MissingHost => ErrorKind::InvalidUrl,
        }
    }
}

/// Validates a submitted feed URL against the already-known feed URLs.
///
/// The input is trimmed before any check. Checks run in this order:
/// - empty input fails with [`ValidationError::Missing`]
/// - a URL present in `known` fails with [`ValidationError::Duplicate`],
///   whatever its format
/// - anything that is not an absolute `http`/`https` URL with a host fails
///   with an [`ErrorKind::InvalidUrl`]-class error
///
/// Validation is pure: no I/O and no side effects.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use rsswatch::util::validate_feed_url;
///
/// let known = HashSet::new();
/// let url = validate_feed_url(" https://example.com/rss.xml ", &known).unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_feed_url("не-ссылка", &known).is_err());
/// ```
pub fn validate_feed_url(input: &str, known: &HashSet<String>) -> Result<Url, ValidationError> {
    let candidate = input.trim();
    if candidate.is_empty() {
        return Err(ValidationError::Missing);
    }

    if known.contains(candidate) {
        return Err(ValidationError::Duplicate(candidate.to_owned()));
    }

    let url = Url::parse(candidate)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(ValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost);
    }

    Ok(url)
}

/// Validates a post link before handing it to the system browser.
///
/// Only `http` and `https` links are opened; anything else could be turned
/// into a local command by the platform opener.
pub fn validate_url_for_open(link: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(link.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}
