//! Utility functions for common operations.
//!
//! - **Text processing**: whitespace normalization for message bodies,
//!   Unicode-aware width calculation, greedy wrapping, and truncation.
//!
//! The wrapping helpers back both rendering and the layout measurement the
//! scroll-anchor commit depends on, so they live here rather than in `ui`.

mod text;

pub use text::{display_width, normalize_ws, truncate_to_width, wrap_to_width};
