//! Ordered, duplicate-free entry storage for one feed identity.

use crate::feed::types::FeedEntry;

/// Growing timeline for a single conversation.
///
/// Mutation happens through exactly two operations — `initialize` for page
/// zero and `prepend_older` for every later page — both called only by the
/// session, so there is a single writer by construction. Existing entries
/// are never reordered or rewritten: older chunks go in front as whole
/// blocks, which is what lets the scroll-anchor correction assume that all
/// height growth happened above the previously visible content.
#[derive(Debug, Default)]
pub struct FeedStore {
    entries: Vec<FeedEntry>,
    has_more: bool,
    revision: u64,
}

impl FeedStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            has_more: true,
            revision: 0,
        }
    }

    /// Replaces the store contents with the initial (most recent) page.
    pub fn initialize(&mut self, entries: Vec<FeedEntry>) {
        self.entries = entries;
        self.revision += 1;
        debug_assert!(self.ids_unique(), "duplicate entry id in initial page");
    }

    /// Adds an older chunk in front, preserving its relative order and
    /// leaving every existing entry untouched and in place.
    pub fn prepend_older(&mut self, entries: Vec<FeedEntry>) {
        let mut chunk = entries;
        let added = chunk.len();
        chunk.extend(self.entries.drain(..));
        self.entries = chunk;
        self.revision += 1;
        tracing::debug!(added, total = self.entries.len(), "Prepended older chunk");
        debug_assert!(self.ids_unique(), "duplicate entry id across prepends");
    }

    /// Permanently marks the feed as fully loaded. There is no way back:
    /// exhaustion is terminal for the lifetime of this store.
    pub fn mark_exhausted(&mut self) {
        self.has_more = false;
    }

    /// Whether older pages may still exist upstream.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every mutation; hosts key their layout caches off this.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn ids_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        self.entries.iter().all(|e| seen.insert(e.id.as_str()))
    }
}
