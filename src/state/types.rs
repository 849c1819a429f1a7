use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ErrorKind;

// ============================================================================
// Identifiers
// ============================================================================

/// Process-wide id source shared by feeds and posts, so no two records ever
/// receive the same number.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identifier of a subscribed feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId(u64);

impl FeedId {
    pub fn generate() -> Self {
        Self(next_id())
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Identifier of a post. Shown to the user, who refers to it in commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(u64);

impl PostId {
    pub fn generate() -> Self {
        Self(next_id())
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(PostId)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A subscribed RSS/Atom source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: FeedId,
    /// The URL as submitted (trimmed). Unique across feeds.
    pub url: String,
    pub title: String,
    pub description: String,
}

/// A single item/entry of a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub feed_id: FeedId,
    pub title: String,
    /// Dedup key.
    pub link: String,
    pub description: String,
}

// ============================================================================
// Form
// ============================================================================

/// Progress of the current submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Process {
    #[default]
    Filling,
    Sending,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormState {
    pub process: Process,
    pub error: Option<ErrorKind>,
}

// ============================================================================
// Dirty regions
// ============================================================================

/// Render regions invalidated by a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Changes {
    pub feeds: bool,
    pub posts: bool,
    pub form: bool,
    pub viewed: bool,
}

impl Changes {
    pub const NONE: Changes = Changes {
        feeds: false,
        posts: false,
        form: false,
        viewed: false,
    };
    pub const FEEDS: Changes = Changes {
        feeds: true,
        ..Changes::NONE
    };
    pub const POSTS: Changes = Changes {
        posts: true,
        ..Changes::NONE
    };
    pub const FORM: Changes = Changes {
        form: true,
        ..Changes::NONE
    };
    pub const VIEWED: Changes = Changes {
        viewed: true,
        ..Changes::NONE
    };

    pub fn is_empty(self) -> bool {
        self == Changes::NONE
    }
}

impl BitOr for Changes {
    type Output = Changes;

    fn bitor(self, rhs: Changes) -> Changes {
        Changes {
            feeds: self.feeds || rhs.feeds,
            posts: self.posts || rhs.posts,
            form: self.form || rhs.form,
            viewed: self.viewed || rhs.viewed,
        }
    }
}

impl BitOrAssign for Changes {
    fn bitor_assign(&mut self, rhs: Changes) {
        *self = *self | rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_never_repeat_across_kinds() {
        let a = FeedId::generate().get();
        let b = PostId::generate().get();
        let c = PostId::generate().get();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_post_id_parse() {
        let id = PostId::generate();
        assert_eq!(id.to_string().parse::<PostId>().unwrap(), id);
        assert_eq!(format!("#{id}").parse::<PostId>().unwrap(), id);
        assert!("abc".parse::<PostId>().is_err());
    }

    #[test]
    fn test_changes_union() {
        let c = Changes::FEEDS | Changes::FORM;
        assert!(c.feeds && c.form && !c.posts && !c.viewed);
        assert!(Changes::NONE.is_empty());
        assert!(!c.is_empty());
    }
}
