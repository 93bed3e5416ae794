//! One conversation's worth of paging state.
//!
//! `FeedSession` composes the fetcher, assembler, store, and scroll
//! controller for a single feed identity and is the only writer to any of
//! them. It runs entirely on the UI task; the host's spawned fetch tasks
//! hand their results back through `apply_initial`/`apply_older`, stamped
//! with the generation the session had when the request was planned, so a
//! completion that outlives an identity switch is detected and dropped
//! without touching state.

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::feed::assembler::map_chunk;
use crate::feed::fetcher::{FetchError, PageFetcher, PageRequest, RawItem};
use crate::feed::store::FeedStore;
use crate::feed::types::FeedEntry;
use crate::scroll::{MarginBand, ScrollAnchorController};

/// Where the session is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    LoadingInitial,
    LoadingOlder,
    /// Terminal for this identity: a page fetch returned zero items.
    Exhausted,
    /// The last fetch failed; retryable without losing loaded entries.
    Errored,
}

/// Result of applying an initial-page completion.
#[derive(Debug, PartialEq, Eq)]
pub enum InitialOutcome {
    /// The store now holds the assembled page.
    Initialized { added: usize },
    /// Page 0 was empty — the conversation has no history at all.
    Exhausted,
    /// The fetch failed; the store is empty and the error recorded.
    Failed,
    /// The completion belongs to a previous identity and was dropped.
    Stale,
}

/// Result of applying an older-page completion.
#[derive(Debug, PartialEq, Eq)]
pub enum OlderOutcome {
    /// The chunk is in the store; the host must re-layout and then call
    /// [`FeedSession::commit_prepend`].
    Prepended { added: usize },
    /// The page was empty — no more history exists for this identity.
    Exhausted,
    /// The fetch failed; loaded entries are preserved.
    Failed,
    /// The completion belongs to a previous identity and was dropped.
    Stale,
}

/// Paging, assembly, storage, and scroll anchoring for one conversation.
pub struct FeedSession {
    conversation: String,
    /// Bumped on every [`open`](Self::open); completions carrying an older
    /// generation are discarded.
    generation: u64,
    /// Time base for assembly: page 0 ends here, page `p` ends `p` hours
    /// earlier. Fixed at open time so re-assembly is deterministic.
    opened_at: DateTime<Utc>,
    fetcher: PageFetcher,
    store: FeedStore,
    controller: ScrollAnchorController,
    state: LoadState,
    last_error: Option<String>,
    /// Page index of the chunk awaiting its post-layout commit.
    pending_commit_page: Option<usize>,
}

impl FeedSession {
    pub fn new(base_url: Url, page_size: usize, margin_rows: usize) -> Self {
        Self {
            conversation: String::new(),
            generation: 0,
            opened_at: Utc::now(),
            fetcher: PageFetcher::new(base_url, page_size),
            store: FeedStore::new(),
            controller: ScrollAnchorController::new(Box::new(MarginBand::new(margin_rows))),
            state: LoadState::Idle,
            last_error: None,
            pending_commit_page: None,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Switches to a (possibly new) feed identity and plans page 0.
    ///
    /// Discards the store, the fetch ledger, the scroll state, and any
    /// pending error; bumps the generation so an in-flight completion for
    /// the previous identity can no longer land. The host is expected to
    /// abort the previous fetch task as well — the generation check is the
    /// backstop for a task that resolves anyway.
    pub fn open(&mut self, conversation: &str, now: DateTime<Utc>) -> Option<PageRequest> {
        self.generation += 1;
        self.conversation = conversation.to_string();
        self.opened_at = now;
        self.fetcher.reset();
        self.store = FeedStore::new();
        self.controller.reset();
        self.state = LoadState::LoadingInitial;
        self.last_error = None;
        self.pending_commit_page = None;

        tracing::info!(
            conversation = %self.conversation,
            generation = self.generation,
            "Opening conversation"
        );
        self.fetcher.begin_page(0)
    }

    /// Applies the completion of the initial page fetch.
    pub fn apply_initial(
        &mut self,
        generation: u64,
        result: Result<Vec<RawItem>, FetchError>,
    ) -> InitialOutcome {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Dropping stale initial page"
            );
            return InitialOutcome::Stale;
        }

        match result {
            Ok(items) if items.is_empty() => {
                self.store.initialize(Vec::new());
                self.store.mark_exhausted();
                self.controller.mark_exhausted();
                self.state = LoadState::Exhausted;
                InitialOutcome::Exhausted
            }
            Ok(items) => {
                let entries = map_chunk(&items, self.opened_at);
                let added = entries.len();
                self.store.initialize(entries);
                self.state = LoadState::Idle;
                InitialOutcome::Initialized { added }
            }
            Err(err) => {
                tracing::warn!(conversation = %self.conversation, error = %err, "Initial page failed");
                self.last_error = Some(err.to_string());
                self.state = LoadState::Errored;
                InitialOutcome::Failed
            }
        }
    }

    /// The proximity-trigger path: plans the next older page at most once.
    ///
    /// Returns `None` unless the viewer is near the top, no cycle is in
    /// flight, history remains, and the page index has never been
    /// requested for this identity. `content_height` is the laid-out
    /// height measured *before* any mutation — it becomes the snapshot the
    /// commit corrects against.
    pub fn request_older(&mut self, content_height: usize) -> Option<PageRequest> {
        // Older pages only make sense on top of a loaded page 0
        if self.store.is_empty() {
            return None;
        }
        if !self.controller.trigger(content_height, self.store.has_more()) {
            return None;
        }

        let page = self.fetcher.next_older_page();
        match self.fetcher.begin_page(page) {
            Some(request) => {
                self.controller.fetching_started();
                self.state = LoadState::LoadingOlder;
                tracing::debug!(page, "Older page requested");
                Some(request)
            }
            None => {
                self.controller.abandon_trigger();
                None
            }
        }
    }

    /// Applies the completion of an older page fetch (the data-mutation
    /// half of the two-phase commit).
    pub fn apply_older(
        &mut self,
        generation: u64,
        page: usize,
        result: Result<Vec<RawItem>, FetchError>,
    ) -> OlderOutcome {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                page,
                "Dropping stale older page"
            );
            return OlderOutcome::Stale;
        }

        match result {
            Ok(items) if items.is_empty() => {
                self.store.mark_exhausted();
                self.controller.mark_exhausted();
                self.state = LoadState::Exhausted;
                tracing::info!(conversation = %self.conversation, page, "History exhausted");
                OlderOutcome::Exhausted
            }
            Ok(items) => {
                let time_base = self.opened_at - Duration::hours(page as i64);
                let entries = map_chunk(&items, time_base);
                let added = entries.len();
                self.store.prepend_older(entries);
                self.controller.prepend_applied();
                self.pending_commit_page = Some(page);
                OlderOutcome::Prepended { added }
            }
            Err(err) => {
                tracing::warn!(conversation = %self.conversation, page, error = %err, "Older page failed");
                self.last_error = Some(err.to_string());
                // The request is no longer outstanding; un-record it so the
                // next proximity trigger can retry the same page.
                self.fetcher.forget(page);
                self.controller.fetch_failed();
                self.state = LoadState::Errored;
                OlderOutcome::Failed
            }
        }
    }

    /// The measurement-and-correction half of the two-phase commit.
    ///
    /// Must be called after the host has recomputed layout for the current
    /// viewport width. Corrects the scroll offset by the measured height
    /// delta, advances the page cursor, and returns to `Idle`.
    pub fn commit_prepend(&mut self, height_after: usize) -> usize {
        let offset = self.controller.commit(height_after);
        if let Some(page) = self.pending_commit_page.take() {
            self.fetcher.advance_cursor(page);
        }
        if self.state == LoadState::LoadingOlder {
            self.state = LoadState::Idle;
            self.last_error = None;
        }
        offset
    }

    // ------------------------------------------------------------------
    // Scrolling (delegated to the controller, the sole offset owner)
    // ------------------------------------------------------------------

    pub fn offset(&self) -> usize {
        self.controller.offset()
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.controller.scroll_up(rows);
    }

    pub fn scroll_down(&mut self, rows: usize, content_height: usize, viewport_rows: usize) {
        self.controller.scroll_down(rows, content_height, viewport_rows);
    }

    pub fn jump_top(&mut self) {
        self.controller.jump_top();
    }

    pub fn jump_bottom(&mut self, content_height: usize, viewport_rows: usize) {
        self.controller.jump_bottom(content_height, viewport_rows);
    }

    pub fn clamp_scroll(&mut self, content_height: usize, viewport_rows: usize) {
        self.controller.clamp(content_height, viewport_rows);
    }

    // ------------------------------------------------------------------
    // Read-only surface for the presentation layer
    // ------------------------------------------------------------------

    pub fn conversation(&self) -> &str {
        &self.conversation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> &[FeedEntry] {
        self.store.entries()
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn has_more(&self) -> bool {
        self.store.has_more()
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading_initial(&self) -> bool {
        self.state == LoadState::LoadingInitial
    }

    pub fn is_loading_older(&self) -> bool {
        self.state == LoadState::LoadingOlder
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const PAGE_SIZE: usize = 30;

    fn session() -> FeedSession {
        FeedSession::new(
            Url::parse("https://api.example.com").unwrap(),
            PAGE_SIZE,
            8,
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 11, 9, 30, 0).unwrap()
    }

    fn items(start: i64, n: usize) -> Vec<RawItem> {
        (0..n as i64)
            .map(|i| RawItem {
                id: start + i,
                body: format!("message {}", start + i),
            })
            .collect()
    }

    fn opened(session: &mut FeedSession, conversation: &str) -> u64 {
        let request = session.open(conversation, now()).expect("page 0 plan");
        assert_eq!(request.page, 0);
        session.generation()
    }

    #[test]
    fn initial_page_assembles_and_settles_idle() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");

        let outcome = s.apply_initial(generation, Ok(items(1, 30)));
        assert_eq!(outcome, InitialOutcome::Initialized { added: 34 });
        assert_eq!(s.entries().len(), 34);
        assert_eq!(s.load_state(), LoadState::Idle);
        assert!(s.has_more());
    }

    #[test]
    fn double_trigger_plans_exactly_one_request() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        s.apply_initial(generation, Ok(items(1, 30)));

        let first = s.request_older(100);
        assert!(first.is_some());
        assert_eq!(first.as_ref().unwrap().page, 1);

        // Immediate second trigger: single-flight guard refuses
        assert!(s.request_older(100).is_none());
        assert!(s.is_loading_older());
    }

    #[test]
    fn older_page_prepends_then_commit_corrects_offset() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        s.apply_initial(generation, Ok(items(1000, 30)));
        assert_eq!(s.entries().len(), 34);

        let request = s.request_older(100).unwrap();
        let outcome = s.apply_older(generation, request.page, Ok(items(2000, 30)));
        assert_eq!(outcome, OlderOutcome::Prepended { added: 34 });
        assert_eq!(s.entries().len(), 68);

        // Older chunk sits wholly in front of the initial page
        assert_eq!(s.entries()[0].id, "2000");
        assert_eq!(s.entries()[34].id, "1000");

        let corrected = s.commit_prepend(134);
        assert_eq!(corrected, 34); // offset 0 + (134 - 100)
        assert_eq!(s.load_state(), LoadState::Idle);
        assert_eq!(s.offset(), 34);
    }

    #[test]
    fn committed_page_advances_cursor() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        s.apply_initial(generation, Ok(items(1, 30)));

        let request = s.request_older(100).unwrap();
        assert_eq!(request.page, 1);
        s.apply_older(generation, 1, Ok(items(100, 30)));
        s.commit_prepend(134);

        let next = s.request_older(10).unwrap();
        assert_eq!(next.page, 2);
    }

    #[test]
    fn empty_older_page_is_terminal() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        s.apply_initial(generation, Ok(items(1, 30)));
        let before = s.entries().len();

        let request = s.request_older(100).unwrap();
        let outcome = s.apply_older(generation, request.page, Ok(Vec::new()));
        assert_eq!(outcome, OlderOutcome::Exhausted);
        assert!(!s.has_more());
        assert_eq!(s.entries().len(), before);
        assert_eq!(s.load_state(), LoadState::Exhausted);

        // No amount of further triggering restarts paging
        assert!(s.request_older(0).is_none());
        assert!(s.request_older(0).is_none());
    }

    #[test]
    fn failed_older_page_preserves_entries_and_allows_retry() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        s.apply_initial(generation, Ok(items(1, 30)));

        let request = s.request_older(100).unwrap();
        let outcome = s.apply_older(
            generation,
            request.page,
            Err(FetchError::HttpStatus(503)),
        );
        assert_eq!(outcome, OlderOutcome::Failed);
        assert_eq!(s.entries().len(), 34, "entries survive a failed fetch");
        assert_eq!(s.load_state(), LoadState::Errored);
        assert!(s.last_error().unwrap().contains("503"));

        // The failed page was un-recorded, so the next trigger retries it
        let retry = s.request_older(100).expect("retry after failure");
        assert_eq!(retry.page, request.page);
        assert!(s.is_loading_older());
    }

    #[test]
    fn stale_older_completion_is_discarded_after_switch() {
        let mut s = session();
        let generation_a = opened(&mut s, "conv-a");
        s.apply_initial(generation_a, Ok(items(1, 30)));
        let request = s.request_older(100).unwrap();

        // Identity switch while the older fetch is in flight
        let generation_b = opened(&mut s, "conv-b");
        s.apply_initial(generation_b, Ok(items(500, 3)));
        assert_eq!(s.entries().len(), 3);

        // The late resolution for conv-a must not land
        let outcome = s.apply_older(generation_a, request.page, Ok(items(9000, 30)));
        assert_eq!(outcome, OlderOutcome::Stale);
        assert_eq!(s.entries().len(), 3);
        assert!(s.entries().iter().all(|e| {
            e.id.parse::<i64>().map(|id| id >= 500 && id < 600).unwrap_or(true)
        }));
    }

    #[test]
    fn stale_initial_completion_is_discarded_after_switch() {
        let mut s = session();
        let generation_a = opened(&mut s, "conv-a");

        let generation_b = opened(&mut s, "conv-b");
        assert_eq!(s.apply_initial(generation_a, Ok(items(1, 30))), InitialOutcome::Stale);
        assert!(s.entries().is_empty());
        assert!(s.is_loading_initial());

        s.apply_initial(generation_b, Ok(items(40, 9)));
        assert_eq!(s.entries().len(), 9);
    }

    #[test]
    fn empty_initial_page_exhausts_immediately() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        assert_eq!(s.apply_initial(generation, Ok(Vec::new())), InitialOutcome::Exhausted);
        assert!(!s.has_more());
        assert!(s.request_older(0).is_none());
    }

    #[test]
    fn failed_initial_page_blocks_older_requests() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        assert_eq!(
            s.apply_initial(generation, Err(FetchError::HttpStatus(404))),
            InitialOutcome::Failed
        );
        assert!(s.entries().is_empty());
        assert_eq!(s.load_state(), LoadState::Errored);
        assert!(s.request_older(0).is_none(), "no older pages without a page 0");
    }

    #[test]
    fn trigger_requires_proximity_to_top() {
        let mut s = session();
        let generation = opened(&mut s, "conv-a");
        s.apply_initial(generation, Ok(items(1, 30)));

        s.scroll_down(50, 100, 20); // well below the margin band
        assert!(s.request_older(100).is_none());

        s.jump_top();
        assert!(s.request_older(100).is_some());
    }

    #[test]
    fn reopening_same_conversation_refetches_page_zero() {
        let mut s = session();
        let generation_a = opened(&mut s, "conv-a");
        s.apply_initial(generation_a, Ok(items(1, 30)));

        // Reload: same identity string, fresh ledger and store
        let request = s.open("conv-a", now()).expect("page 0 plan after reopen");
        assert_eq!(request.page, 0);
        assert!(s.entries().is_empty());
        assert!(s.is_loading_initial());
    }
}
