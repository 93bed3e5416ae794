//! backscroll — a terminal conversation viewer with lazy-loaded history.
//!
//! The library exposes the feed pipeline (fetching, assembly, storage) and
//! the scroll-anchored lazy-load controller so integration tests can drive
//! them without a terminal. The binary in `main.rs` wires the same pieces
//! into a ratatui UI.

pub mod app;
pub mod config;
pub mod feed;
pub mod scroll;
pub mod ui;
pub mod util;
