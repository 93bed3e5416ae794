//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Fetch-completion processing and the two-phase commit
//! - `render` - Frame rendering (header, feed window, overlays)
//! - `status` - Status bar widget
//! - `layout` - Entry → wrapped-line layout shared by rendering and
//!   height measurement
//! - `helpers` - Fetch-task spawning and the proximity poll

mod events;
mod helpers;
mod input;
pub mod layout;
mod loop_runner;
mod render;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
