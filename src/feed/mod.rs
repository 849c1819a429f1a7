//! Feed acquisition: fetching, parsing, deduplication and periodic polling.
//!
//! - [`xml`] - well-formedness checking and a small element tree over `quick-xml`
//! - [`parser`] - RSS/Atom document to [`ParsedFeed`]
//! - [`dedup`] - link-keyed filtering of already-seen posts
//! - [`fetcher`] - HTTP retrieval through the CORS proxy
//! - [`poller`] - the cancellable background refresh loop
//!
//! # Example
//!
//! ```ignore
//! use rsswatch::feed::{load_feed, ProxyClient};
//!
//! let parsed = load_feed(&client, "https://example.com/rss.xml").await?;
//! ```

mod dedup;
mod fetcher;
mod parser;
mod poller;
mod xml;

use thiserror::Error;

use crate::error::ErrorKind;

pub use dedup::DedupIndex;
pub use fetcher::{FetchError, ProxyClient};
pub use parser::{parse_feed, ParseError, ParsedFeed};
pub use poller::{poll_once, CycleReport, PollHandle, PollScheduler};
pub use xml::XmlError;

/// Failure of a fetch-then-parse round trip.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Fetch(e) => e.kind(),
            LoadError::Parse(e) => e.kind(),
        }
    }
}

/// Fetches `url` through the proxy and parses the returned document.
///
/// # Arguments
///
/// * `client` - proxy client carrying the timeout and size limit
/// * `url` - the feed URL, passed to the proxy and kept as the feed key
///
/// # Errors
///
/// [`LoadError::Fetch`] for transport, proxy and timeout failures, and
/// [`LoadError::Parse`] when the document is not a usable feed.
/// [`LoadError::kind`] maps either to the user-facing [`ErrorKind`].
pub async fn load_feed(client: &ProxyClient, url: &str) -> Result<ParsedFeed, LoadError> {
    let contents = client.fetch(url).await?;
    Ok(parse_feed(url, &contents)?)
}
