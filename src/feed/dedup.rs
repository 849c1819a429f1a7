use std::collections::HashSet;

use crate::state::Post;

/// Set of post links already recorded, used to drop repeats.
///
/// The link is the dedup key across all feeds: two feeds syndicating the
/// same article keep only the first copy seen.
#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    links: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the posts whose link is not in `existing`, in input order.
    ///
    /// Pure; repeats inside `candidates` are not collapsed. Running it again
    /// with the returned links as `existing` yields nothing.
    pub fn filter_new(existing: &HashSet<String>, candidates: Vec<Post>) -> Vec<Post> {
        candidates
            .into_iter()
            .filter(|post| !existing.contains(&post.link))
            .collect()
    }

    /// Filters `candidates` against the index and records what passes.
    ///
    /// Unlike [`DedupIndex::filter_new`], a link repeated within the batch is
    /// admitted once (first occurrence wins).
    pub fn admit(&mut self, candidates: Vec<Post>) -> Vec<Post> {
        candidates
            .into_iter()
            .filter(|post| self.links.insert(post.link.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FeedId, PostId};
    use proptest::prelude::*;

    fn post(link: &str) -> Post {
        Post {
            id: PostId::generate(),
            feed_id: FeedId::generate(),
            title: format!("Post at {link}"),
            link: link.to_string(),
            description: String::new(),
        }
    }

    fn links(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.link.as_str()).collect()
    }

    #[test]
    fn test_filter_keeps_unknown_in_order() {
        let existing: HashSet<String> = ["https://e.com/2".to_string()].into_iter().collect();
        let fresh = DedupIndex::filter_new(
            &existing,
            vec![post("https://e.com/3"), post("https://e.com/2"), post("https://e.com/1")],
        );
        assert_eq!(links(&fresh), vec!["https://e.com/3", "https://e.com/1"]);
    }

    #[test]
    fn test_filter_with_empty_existing_keeps_all() {
        let fresh = DedupIndex::filter_new(&HashSet::new(), vec![post("a"), post("b")]);
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn test_admit_records_links() {
        let mut index = DedupIndex::new();
        let first = index.admit(vec![post("a"), post("b")]);
        assert_eq!(first.len(), 2);

        let second = index.admit(vec![post("b"), post("c")]);
        assert_eq!(links(&second), vec!["c"]);
        assert!(index.admit(vec![post("a"), post("c")]).is_empty());
    }

    #[test]
    fn test_admit_collapses_batch_repeats() {
        let mut index = DedupIndex::new();
        let admitted = index.admit(vec![post("x"), post("x"), post("y")]);
        assert_eq!(links(&admitted), vec!["x", "y"]);
    }

    proptest! {
        #[test]
        fn prop_filter_new_is_idempotent(
            existing in proptest::collection::hash_set("[a-e]{1,2}", 0..8),
            candidates in proptest::collection::vec("[a-e]{1,2}", 0..16),
        ) {
            let posts: Vec<Post> = candidates.iter().map(|l| post(l)).collect();
            let first = DedupIndex::filter_new(&existing, posts);
            for p in &first {
                prop_assert!(!existing.contains(&p.link));
            }

            let seen: HashSet<String> = first.iter().map(|p| p.link.clone()).collect();
            let second = DedupIndex::filter_new(&seen, first);
            prop_assert!(second.is_empty());
        }
    }
}
