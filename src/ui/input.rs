//! Keyboard input handling.
//!
//! A small fixed key set dispatched directly: vi-style scrolling plus
//! conversation cycling and reload. Scroll movements go through the
//! session (the controller owns the offset), and every movement toward
//! the top is followed by the proximity poll in the main loop.

use crate::app::{App, AppEvent};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{ensure_layout, open_selected_conversation};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    // Ctrl+C always quits, whatever else is happening
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    ensure_layout(app);
    let height = app.layout.height();
    let rows = app.feed_viewport_rows;
    let half_page = (rows / 2).max(1);

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,

        // Scrolling: k/up toward older content, j/down toward newer
        KeyCode::Char('k') | KeyCode::Up => app.session.scroll_up(1),
        KeyCode::Char('j') | KeyCode::Down => app.session.scroll_down(1, height, rows),
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.session.scroll_up(half_page)
        }
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.session.scroll_down(half_page, height, rows)
        }
        KeyCode::PageUp => app.session.scroll_up(rows.max(1)),
        KeyCode::PageDown => app.session.scroll_down(rows.max(1), height, rows),
        KeyCode::Char('g') | KeyCode::Home => app.session.jump_top(),
        KeyCode::Char('G') | KeyCode::End => app.session.jump_bottom(height, rows),

        // Conversation cycling discards the current session entirely
        KeyCode::Tab | KeyCode::Char('n') => {
            app.selected_conversation = (app.selected_conversation + 1) % app.conversations.len();
            switch_conversation(app, event_tx);
        }
        KeyCode::BackTab | KeyCode::Char('p') => {
            app.selected_conversation = (app.selected_conversation + app.conversations.len() - 1)
                % app.conversations.len();
            switch_conversation(app, event_tx);
        }

        // Full reload of the current conversation (fresh ledger, page 0)
        KeyCode::Char('r') => {
            open_selected_conversation(app, event_tx);
            app.set_status("Reloading conversation");
        }

        _ => {}
    }

    Action::Continue
}

fn switch_conversation(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let id = app.selected_conversation_id().to_string();
    open_selected_conversation(app, event_tx);
    app.set_status(format!("Switched to @{id}"));
}
