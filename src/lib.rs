//! rsswatch: an RSS/Atom aggregator core with a terminal front end.
//!
//! Feeds are submitted by URL, validated, fetched through an allorigins-style
//! CORS proxy, parsed, and then re-polled on a fixed delay. Posts are
//! deduplicated by link across all feeds.

pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod i18n;
pub mod state;
pub mod ui;
pub mod util;
