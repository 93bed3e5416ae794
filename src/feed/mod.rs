//! The conversation feed pipeline.
//!
//! Everything between the paged HTTP endpoint and the rendered timeline:
//!
//! - [`fetcher`] - Page planning (request-once ledger, page cursor) and the
//!   network call that retrieves one page of raw items
//! - [`assembler`] - Pure mapping of raw items into typed entries with
//!   deterministic synthetic lifecycle markers
//! - [`store`] - The ordered, duplicate-free, growing entry sequence for
//!   one feed identity
//! - [`session`] - Composition of the above plus the scroll controller for
//!   one open conversation, with generation-checked completion handling
//!
//! # Lifecycle
//!
//! ```ignore
//! let mut session = FeedSession::new(base_url, page_size, margin);
//! let request = session.open("conv-a", Utc::now()).unwrap();
//! // ... run fetch_page on a task, then back on the UI task:
//! session.apply_initial(generation, result);
//! ```

pub mod assembler;
pub mod fetcher;
pub mod session;
pub mod store;
pub mod types;

pub use assembler::map_chunk;
pub use fetcher::{fetch_page, FetchError, PageFetcher, PageRequest, RawItem};
pub use session::{FeedSession, InitialOutcome, LoadState, OlderOutcome};
pub use store::FeedStore;
pub use types::{EntryKind, FeedEntry, Sender};
