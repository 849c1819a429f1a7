use thiserror::Error;

use super::xml::{parse_document, Element, XmlError};
use crate::error::ErrorKind;
use crate::state::{Feed, FeedId, Post, PostId};

/// Errors produced while turning a document into a feed.
///
/// Every variant classifies as [`ErrorKind::MalformedDocument`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The text is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Xml(#[from] XmlError),
    /// The root element is neither RSS nor Atom.
    #[error("Unsupported document root <{0}>")]
    UnsupportedRoot(String),
    /// A required element is absent.
    #[error("Missing <{element}> in {context}")]
    MissingElement {
        element: &'static str,
        context: String,
    },
    /// An item carries neither a link `href` nor link text.
    #[error("Item {0:?} has no link")]
    MissingLink(String),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedDocument
    }
}

/// A parsed document: the feed record plus its posts in document order.
///
/// The feed and every post carry freshly generated ids and the posts point
/// at the parsed feed. Callers that already know the feed rebind the posts
/// (see [`crate::state::AppState::merge_polled`]).
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub feed: Feed,
    pub posts: Vec<Post>,
}

/// Which element names a document shape uses.
struct Shape {
    item: &'static str,
    feed_description: &'static str,
    item_descriptions: &'static [&'static str],
}

const RSS: Shape = Shape {
    item: "item",
    feed_description: "description",
    item_descriptions: &["description"],
};

const ATOM: Shape = Shape {
    item: "entry",
    feed_description: "subtitle",
    item_descriptions: &["summary", "content"],
};

/// Parses an RSS 2.0, RSS 1.0 (RDF) or Atom document.
///
/// Title is required on the channel/feed and on every item/entry. Every
/// item must also have a link: the `href` attribute wins (Atom), element
/// text is the fallback (RSS). Descriptions are optional and default to `""`.
///
/// # Arguments
///
/// * `url` - the submitted feed URL, stored as the feed's unique key
/// * `content` - the raw document returned by the proxy
///
/// # Returns
///
/// The feed and its posts in document order. Ids are fresh; the caller
/// rebinds posts to the feed it commits.
///
/// # Errors
///
/// - [`ParseError::Xml`] if the document is not well-formed XML
/// - [`ParseError::UnsupportedRoot`] if the root is not `rss`, `RDF` or `feed`
/// - [`ParseError::MissingElement`] if a required element such as `title` is absent
/// - [`ParseError::MissingLink`] if an item has no usable link
pub fn parse_feed(url: &str, content: &str) -> Result<ParsedFeed, ParseError> {
    let root = parse_document(content)?;

    // RSS 2.0 nests items in the channel, RSS 1.0 places them beside it.
    let (channel, items_parent, shape) = match root.name.as_str() {
        "rss" => {
            let channel = require(&root, "channel", "rss")?;
            (channel, channel, RSS)
        }
        "RDF" => (require(&root, "channel", "RDF")?, &root, RSS),
        "feed" => (&root, &root, ATOM),
        other => return Err(ParseError::UnsupportedRoot(other.to_owned())),
    };

    let feed_title = require(channel, "title", channel.name.as_str())?.text();
    let feed = Feed {
        id: FeedId::generate(),
        url: url.to_owned(),
        title: feed_title.to_owned(),
        description: channel
            .child_text(shape.feed_description)
            .unwrap_or_default()
            .to_owned(),
    };

    let posts = items_parent
        .children(shape.item)
        .map(|item| parse_item(item, &shape, feed.id))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(feed = %url, title = %feed.title, posts = posts.len(), "Parsed feed");
    Ok(ParsedFeed { feed, posts })
}

fn parse_item(item: &Element, shape: &Shape, feed_id: FeedId) -> Result<Post, ParseError> {
    let title = require(item, "title", shape.item)?.text().to_owned();
    let link = extract_link(item).ok_or_else(|| ParseError::MissingLink(title.clone()))?;
    let description = shape
        .item_descriptions
        .iter()
        .find_map(|name| item.child_text(name))
        .unwrap_or_default()
        .to_owned();

    Ok(Post {
        id: PostId::generate(),
        feed_id,
        title,
        link,
        description,
    })
}

/// Picks the item link.
///
/// Atom entries may list several `<link>` elements; an `alternate` (or
/// rel-less) one is preferred over `self`, `enclosure` and friends.
fn extract_link(item: &Element) -> Option<String> {
    let links: Vec<&Element> = item.children("link").collect();

    let href = links
        .iter()
        .filter_map(|l| l.attr("href").map(|href| (l.attr("rel"), href.trim())))
        .filter(|(_, href)| !href.is_empty())
        .min_by_key(|(rel, _)| match rel {
            None | Some("alternate") => 0,
            Some(_) => 1,
        })
        .map(|(_, href)| href);

    href.or_else(|| links.iter().map(|l| l.text()).find(|t| !t.is_empty()))
        .map(str::to_owned)
}

fn require<'a>(
    parent: &'a Element,
    element: &'static str,
    context: &str,
) -> Result<&'a Element, ParseError> {
    parent.child(element).ok_or_else(|| ParseError::MissingElement {
        element,
        context: context.to_owned(),
    })
}
