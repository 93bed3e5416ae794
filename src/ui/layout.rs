//! Feed layout: entries → wrapped terminal lines.
//!
//! Rendering and height measurement must agree exactly — the scroll-anchor
//! commit corrects the offset by `height_after − height_before`, so the
//! measurement taken right after a prepend has to match what the next
//! frame will draw. Both run through [`build_lines`]; [`LayoutCache`]
//! memoizes the result per (identity, store revision, viewport width).
//!
//! Each entry contributes a self-contained run of lines (header, wrapped
//! body, spacer) with no cross-entry state, so prepending a chunk adds
//! exactly that chunk's lines above the existing ones and changes nothing
//! below — the property the anchor correction relies on.

use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::feed::types::{EntryKind, FeedEntry, Sender};
use crate::util::wrap_to_width;

/// Minimum columns a bubble body may wrap to, however narrow the terminal.
const MIN_BUBBLE_WIDTH: usize = 16;

/// Builds the full line list for a feed, oldest first.
///
/// `handle` is the counterparty's display handle (the conversation
/// identity). Deterministic for a given input — the commit protocol
/// depends on it.
pub fn build_lines(entries: &[FeedEntry], width: usize, handle: &str) -> Vec<Line<'static>> {
    let bubble_width = (width.saturating_mul(2) / 3).max(MIN_BUBBLE_WIDTH);
    let mut lines = Vec::with_capacity(entries.len() * 3);

    for entry in entries {
        match (entry.kind, entry.sender) {
            (EntryKind::Text, Sender::Counterparty) => {
                lines.push(
                    Line::from(Span::styled(
                        format!("@{handle} · {}", format_time(entry)),
                        Style::default().fg(Color::Blue),
                    ))
                    .alignment(Alignment::Right),
                );
                for wrapped in wrap_to_width(&entry.text, bubble_width) {
                    lines.push(Line::from(wrapped).alignment(Alignment::Right));
                }
            }
            (EntryKind::Text, _) => {
                lines.push(Line::from(Span::styled(
                    format!("you · {}", format_time(entry)),
                    Style::default().fg(Color::DarkGray),
                )));
                for wrapped in wrap_to_width(&entry.text, bubble_width) {
                    lines.push(Line::from(wrapped));
                }
            }
            (EntryKind::Event, _) => {
                lines.push(
                    Line::from(Span::styled(
                        format!("── {} ──", entry.text),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Center),
                );
            }
            (EntryKind::Note, _) => {
                lines.push(
                    Line::from(Span::styled(
                        format!(" {} ", entry.text),
                        Style::default().fg(Color::Gray).bg(Color::DarkGray),
                    ))
                    .alignment(Alignment::Center),
                );
            }
        }
        // Spacer between entries
        lines.push(Line::from(""));
    }

    lines
}

fn format_time(entry: &FeedEntry) -> String {
    entry.timestamp.format("%b %-d, %-I:%M %p").to_string()
}

/// Memoized feed layout for the current viewport.
///
/// The key is (session generation, store revision, width): a conversation
/// switch, a store mutation, or a resize each invalidate it. Kept by the
/// `App` and consulted by rendering, scrolling, and the commit protocol.
pub struct LayoutCache {
    key: Option<(u64, u64, usize)>,
    lines: Vec<Line<'static>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            key: None,
            lines: Vec::new(),
        }
    }

    /// Rebuilds the layout if the key changed since the last call.
    pub fn ensure(
        &mut self,
        entries: &[FeedEntry],
        generation: u64,
        revision: u64,
        width: usize,
        handle: &str,
    ) {
        let key = (generation, revision, width);
        if self.key != Some(key) {
            self.lines = build_lines(entries, width, handle);
            self.key = Some(key);
            tracing::trace!(
                generation,
                revision,
                width,
                rows = self.lines.len(),
                "Rebuilt feed layout"
            );
        }
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Content height in rows for the last ensured layout.
    pub fn height(&self) -> usize {
        self.lines.len()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}
