//! Application state and its transitions.
//!
//! [`AppState`] is the single source of truth for feeds, posts, the form and
//! the viewed set. It is owned by one task (see [`crate::app`]); every
//! mutation goes through a transition method that returns the [`Changes`]
//! the presentation layer has to redraw.

mod types;

use std::collections::HashSet;
use url::Url;

use crate::error::ErrorKind;
use crate::feed::{DedupIndex, ParsedFeed};
use crate::util::validate_feed_url;

pub use types::{Changes, Feed, FeedId, FormState, Post, PostId, Process};

/// Result of starting a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Validation passed; the caller should fetch the URL.
    Accepted(Url),
    /// Validation failed; the form is in the error state.
    Rejected(ErrorKind),
    /// A previous submission is still in flight; nothing changed.
    Busy,
}

#[derive(Debug, Default)]
pub struct AppState {
    /// Most recently added first.
    feeds: Vec<Feed>,
    /// Most recently added first.
    posts: Vec<Post>,
    form: FormState,
    viewed: HashSet<PostId>,
    links: DedupIndex,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn form(&self) -> FormState {
        self.form
    }

    pub fn post(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn feed(&self, id: FeedId) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.id == id)
    }

    pub fn is_viewed(&self, id: PostId) -> bool {
        self.viewed.contains(&id)
    }

    pub fn known_urls(&self) -> HashSet<String> {
        self.feeds.iter().map(|f| f.url.clone()).collect()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Starts a submission: `filling -> sending -> (error)`.
    ///
    /// # Arguments
    ///
    /// * `input` - the raw text the user entered, validated against the
    ///   currently known feed URLs
    ///
    /// # Returns
    ///
    /// - [`Submission::Accepted`] with the parsed URL; the form is `Sending`
    ///   and the caller must finish with `complete_submit` or `fail_submit`
    /// - [`Submission::Rejected`] with the validation kind; the form is `Error`
    /// - [`Submission::Busy`] with no changes while another submission is sending
    pub fn begin_submit(&mut self, input: &str) -> (Submission, Changes) {
        if self.form.process == Process::Sending {
            return (Submission::Busy, Changes::NONE);
        }

        self.form = FormState {
            process: Process::Sending,
            error: None,
        };

        match validate_feed_url(input, &self.known_urls()) {
            Ok(url) => (Submission::Accepted(url), Changes::FORM),
            Err(e) => {
                tracing::debug!(input = %input.trim(), error = %e, "Submission rejected");
                let kind = e.kind();
                self.set_error(kind);
                (Submission::Rejected(kind), Changes::FORM)
            }
        }
    }

    /// Commits a fetched feed: `sending -> success`.
    ///
    /// # Arguments
    ///
    /// * `url` - the submitted (trimmed) input, used as the feed key
    /// * `parsed` - the parsed document
    ///
    /// # Returns
    ///
    /// `FEEDS | POSTS | FORM` on success. The feed is prepended and its posts
    /// are rebound to it, filtered through the link index and prepended.
    /// If `url` became known while the load was in flight, nothing is added
    /// and the form ends in `Error(DuplicateFeed)` with only `FORM` dirty.
    pub fn complete_submit(&mut self, url: &str, parsed: ParsedFeed) -> Changes {
        if self.feeds.iter().any(|f| f.url == url) {
            return self.fail_submit(ErrorKind::DuplicateFeed);
        }

        let ParsedFeed { mut feed, posts } = parsed;
        feed.url = url.to_owned();
        let feed_id = feed.id;
        tracing::info!(feed = %feed.url, title = %feed.title, "Feed added");
        self.feeds.insert(0, feed);
        self.prepend_posts(feed_id, posts);

        self.form = FormState {
            process: Process::Success,
            error: None,
        };
        Changes::FEEDS | Changes::POSTS | Changes::FORM
    }

    /// Records a failed submission: `sending -> error`. Collections are not touched.
    pub fn fail_submit(&mut self, kind: ErrorKind) -> Changes {
        self.set_error(kind);
        Changes::FORM
    }

    /// Merges posts polled for a known feed, keeping only unseen links.
    pub fn merge_polled(&mut self, feed_id: FeedId, posts: Vec<Post>) -> Changes {
        if self.feed(feed_id).is_none() {
            tracing::debug!(feed_id = feed_id.get(), "Dropping posts for unknown feed");
            return Changes::NONE;
        }

        let added = self.prepend_posts(feed_id, posts);
        if added == 0 {
            return Changes::NONE;
        }
        tracing::info!(feed_id = feed_id.get(), added = added, "New posts");
        Changes::POSTS
    }

    /// Marks a post as viewed. Unknown ids and repeats change nothing.
    pub fn mark_viewed(&mut self, id: PostId) -> Changes {
        if self.post(id).is_some() && self.viewed.insert(id) {
            Changes::VIEWED
        } else {
            Changes::NONE
        }
    }

    fn set_error(&mut self, kind: ErrorKind) {
        self.form = FormState {
            process: Process::Error,
            error: Some(kind),
        };
    }

    /// Returns the number of posts added.
    fn prepend_posts(&mut self, feed_id: FeedId, posts: Vec<Post>) -> usize {
        let rebound = posts
            .into_iter()
            .map(|post| Post { feed_id, ..post })
            .collect();
        let fresh = self.links.admit(rebound);
        let added = fresh.len();
        self.posts.splice(0..0, fresh);
        added
    }
}
