//! Classified error kinds shared by the submit flow and the presentation layer.
//!
//! Module-level errors (`ValidationError`, `ParseError`, `FetchError`) carry
//! details for logging. The form only ever stores the [`ErrorKind`] they map to,
//! and the i18n layer turns that kind into display text.

use std::fmt;

/// Classified failure stored on the form after a rejected submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The submitted input was empty after trimming.
    MissingUrl,
    /// The input is not an absolute http(s) URL.
    InvalidUrl,
    /// A feed with the same URL is already subscribed.
    DuplicateFeed,
    /// The fetched document is not a well-formed RSS/Atom feed.
    MalformedDocument,
    /// The proxy request failed or returned no contents.
    NetworkError,
    /// The proxy request exceeded the configured timeout.
    Timeout,
}

impl ErrorKind {
    /// Translation key used by [`crate::i18n`].
    pub fn translation_key(self) -> &'static str {
        match self {
            ErrorKind::MissingUrl => "errors.required",
            ErrorKind::InvalidUrl => "errors.url",
            ErrorKind::DuplicateFeed => "errors.notOneOf",
            ErrorKind::MalformedDocument => "errors.invalidRss",
            ErrorKind::NetworkError => "errors.network",
            ErrorKind::Timeout => "errors.timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.translation_key())
    }
}
