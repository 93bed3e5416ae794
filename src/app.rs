//! Central application state for the TUI host.
//!
//! `App` owns the HTTP client, the conversation list, the active
//! [`FeedSession`], and the handle of the in-flight fetch task. All state
//! mutation happens on the UI event-loop task; spawned fetch tasks only
//! send [`AppEvent`]s back through the mpsc channel.

use crate::config::Config;
use crate::feed::{FeedSession, FetchError, RawItem};
use crate::ui::layout::LayoutCache;
use anyhow::Result;
use std::borrow::Cow;
use std::time::Duration;
use tokio::time::Instant;

/// How long transient status messages stay on screen.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Events from background fetch tasks.
///
/// Every event carries the session generation captured when the request
/// was planned. The handler compares it against the current generation and
/// drops mismatches — the backstop for a fetch task that resolves after
/// its conversation was switched away (the task itself is also aborted).
pub enum AppEvent {
    /// Page 0 of the active conversation resolved.
    InitialPageLoaded {
        generation: u64,
        result: Result<Vec<RawItem>, FetchError>,
    },
    /// An older page resolved.
    OlderPageLoaded {
        generation: u64,
        page: usize,
        result: Result<Vec<RawItem>, FetchError>,
    },
}

/// Central application state
pub struct App {
    pub http_client: reqwest::Client,
    pub config: Config,

    /// Conversation identities from config, cycled with Tab / Shift-Tab.
    pub conversations: Vec<String>,
    pub selected_conversation: usize,

    /// Paging, assembly, storage, and scroll anchoring for the open
    /// conversation. Replaced in place (via `open`) on identity change.
    pub session: FeedSession,

    /// Handle to the in-flight fetch task, aborted when a new conversation
    /// supersedes it.
    pub fetch_handle: Option<tokio::task::JoinHandle<()>>,

    /// Transient status message with expiry.
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders.
    pub needs_redraw: bool,

    /// Last known feed viewport size, updated during rendering so input
    /// handlers and the commit protocol can measure without a frame.
    pub feed_viewport_rows: usize,
    pub feed_viewport_width: usize,

    /// Cached wrapped-line layout, keyed on viewport width and store
    /// revision. Shared by rendering and height measurement so the commit
    /// step sees exactly what the next frame will draw.
    pub layout: LayoutCache,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = config.base_url()?;
        let session = FeedSession::new(base_url, config.page_size, config.fetch_margin_rows);
        let conversations = config.conversations.clone();

        Ok(Self {
            http_client,
            config,
            conversations,
            selected_conversation: 0,
            session,
            fetch_handle: None,
            status_message: None,
            needs_redraw: true,
            feed_viewport_rows: 0,
            feed_viewport_width: 0,
            layout: LayoutCache::new(),
        })
    }

    /// Identity of the currently selected conversation.
    pub fn selected_conversation_id(&self) -> &str {
        &self.conversations[self.selected_conversation]
    }

    /// Aborts the in-flight fetch task, if any (identity change or quit).
    pub fn abort_inflight_fetch(&mut self) {
        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
            tracing::debug!("Aborted in-flight fetch task");
        }
    }

    /// Show a transient message in the status bar.
    pub fn set_status(&mut self, message: impl Into<Cow<'static, str>>) {
        self.status_message = Some((message.into(), Instant::now() + STATUS_TTL));
        self.needs_redraw = true;
    }

    /// Clears the status message once its deadline passes.
    /// Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        match &self.status_message {
            Some((_, deadline)) if Instant::now() >= *deadline => {
                self.status_message = None;
                true
            }
            _ => false,
        }
    }
}
