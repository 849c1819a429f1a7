use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::error::ErrorKind;
use crate::feed::{load_feed, ParsedFeed, ProxyClient};
use crate::i18n::Locale;
use crate::state::{AppState, Changes, Feed, FeedId, Post, PostId, Submission};

// ============================================================================
// Events and Commands
// ============================================================================

/// Events from background tasks, applied by the task that owns [`App`].
#[derive(Debug)]
pub enum AppEvent {
    /// A submitted feed was fetched and parsed.
    ///
    /// Fields:
    /// - `url`: the submitted (trimmed) URL, which becomes the feed key
    /// - `parsed`: the parsed document
    SubmitLoaded { url: String, parsed: ParsedFeed },
    /// A submitted feed could not be fetched or parsed.
    SubmitFailed { url: String, kind: ErrorKind },
    /// The poll scheduler refreshed a known feed.
    PostsFetched { feed_id: FeedId, posts: Vec<Post> },
}

/// User-triggered commands, produced by the input parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a feed URL (the raw input, validated by the state).
    Submit(String),
    /// Mark a post viewed and show its preview.
    Read(PostId),
    /// Mark a post viewed and open its link in the browser.
    Open(PostId),
    /// Switch the display language.
    Language(Locale),
    /// Redraw everything.
    List,
    Help,
    Quit,
}

// ============================================================================
// App
// ============================================================================

/// Owner of [`AppState`].
///
/// Every mutation happens on the task holding `&mut App`. Network work for
/// submissions runs on spawned tasks and comes back as [`AppEvent`]s, so the
/// state needs no locks. The current feed list is published on a `watch`
/// channel for the poll scheduler.
pub struct App {
    state: AppState,
    client: ProxyClient,
    event_tx: mpsc::Sender<AppEvent>,
    feeds_tx: watch::Sender<Arc<Vec<Feed>>>,
    pub locale: Locale,
}

impl App {
    pub fn new(client: ProxyClient, event_tx: mpsc::Sender<AppEvent>) -> Self {
        let (feeds_tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            state: AppState::new(),
            client,
            event_tx,
            feeds_tx,
            locale: Locale::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn client(&self) -> &ProxyClient {
        &self.client
    }

    /// Receiver of the feed list, updated whenever a feed is added.
    pub fn watch_feeds(&self) -> watch::Receiver<Arc<Vec<Feed>>> {
        self.feeds_tx.subscribe()
    }

    /// Starts a submission.
    ///
    /// Validation is synchronous. When it passes, the fetch runs on a spawned
    /// task which reports back with [`AppEvent::SubmitLoaded`] or
    /// [`AppEvent::SubmitFailed`]. While that is in flight further
    /// submissions are refused.
    pub fn submit(&mut self, input: &str) -> Changes {
        let (submission, changes) = self.state.begin_submit(input);
        if let Submission::Accepted(url) = submission {
            let key = input.trim().to_owned();
            let client = self.client.clone();
            let event_tx = self.event_tx.clone();

            tokio::spawn(async move {
                let event = match load_feed(&client, url.as_str()).await {
                    Ok(parsed) => AppEvent::SubmitLoaded { url: key, parsed },
                    Err(e) => {
                        tracing::warn!(feed = %key, error = %e, "Failed to load submitted feed");
                        AppEvent::SubmitFailed {
                            url: key,
                            kind: e.kind(),
                        }
                    }
                };
                if event_tx.send(event).await.is_err() {
                    tracing::debug!("Event receiver dropped before submission finished");
                }
            });
        }
        changes
    }

    /// Runs a submission to completion on the current task.
    ///
    /// Used for URLs given on the command line, where nothing else is
    /// waiting on the state yet.
    pub async fn submit_and_wait(&mut self, input: &str) -> Changes {
        let (submission, changes) = self.state.begin_submit(input);
        let Submission::Accepted(url) = submission else {
            return changes;
        };

        let key = input.trim();
        let outcome = match load_feed(&self.client, url.as_str()).await {
            Ok(parsed) => self.state.complete_submit(key, parsed),
            Err(e) => {
                tracing::warn!(feed = %key, error = %e, "Failed to load submitted feed");
                self.state.fail_submit(e.kind())
            }
        };
        self.publish_feeds(outcome);
        changes | outcome
    }

    /// Applies a background event to the state.
    pub fn handle_event(&mut self, event: AppEvent) -> Changes {
        let changes = match event {
            AppEvent::SubmitLoaded { url, parsed } => self.state.complete_submit(&url, parsed),
            AppEvent::SubmitFailed { url, kind } => {
                tracing::debug!(feed = %url, kind = %kind, "Submission failed");
                self.state.fail_submit(kind)
            }
            AppEvent::PostsFetched { feed_id, posts } => self.state.merge_polled(feed_id, posts),
        };
        self.publish_feeds(changes);
        changes
    }

    pub fn mark_viewed(&mut self, id: PostId) -> Changes {
        self.state.mark_viewed(id)
    }

    fn publish_feeds(&self, changes: Changes) {
        if changes.feeds {
            self.feeds_tx
                .send_replace(Arc::new(self.state.feeds().to_vec()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Process;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = "<rss><channel><title>T</title><item><title>P</title><link>https://e.com/p</link></item></channel></rss>";

    async fn app_with_proxy(server: &MockServer) -> (App, mpsc::Receiver<AppEvent>) {
        let base = Url::parse(&format!("{}/get", server.uri())).unwrap();
        let client = ProxyClient::new(base, Duration::from_secs(5)).unwrap();
        let (tx, rx) = mpsc::channel(8);
        (App::new(client, tx), rx)
    }

    #[tokio::test]
    async fn test_spawned_submit_reports_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "contents": RSS })))
            .mount(&server)
            .await;
        let (mut app, mut rx) = app_with_proxy(&server).await;
        let feeds = app.watch_feeds();

        let changes = app.submit(" https://example.com/rss.xml ");
        assert_eq!(changes, Changes::FORM);
        assert_eq!(app.state().form().process, Process::Sending);

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let changes = app.handle_event(event);
        assert!(changes.feeds && changes.posts && changes.form);
        assert_eq!(app.state().form().process, Process::Success);
        assert_eq!(app.state().feeds()[0].url, "https://example.com/rss.xml");
        assert_eq!(feeds.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_refused_while_sending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "contents": RSS }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let (mut app, _rx) = app_with_proxy(&server).await;

        app.submit("https://example.com/rss.xml");
        assert!(app.submit("https://example.com/rss.xml").is_empty());
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_feed_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "contents": "<html/>" })))
            .mount(&server)
            .await;
        let (mut app, _rx) = app_with_proxy(&server).await;
        let feeds = app.watch_feeds();

        let changes = app.submit_and_wait("https://example.com/page").await;
        assert_eq!(changes, Changes::FORM);
        assert_eq!(app.state().form().error, Some(ErrorKind::MalformedDocument));
        assert!(feeds.borrow().is_empty());
    }
}
