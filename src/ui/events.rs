//! Application event handling.
//!
//! Fetch tasks report here through the `AppEvent` channel. The session
//! performs the generation check and every state mutation; this module
//! sequences the two-phase commit — mutate, re-layout, then correct the
//! scroll offset — and surfaces failures in the status bar.

use crate::app::{App, AppEvent};
use crate::feed::{InitialOutcome, OlderOutcome};

use super::helpers::ensure_layout;

/// Handle one background-task completion.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::InitialPageLoaded { generation, result } => {
            match app.session.apply_initial(generation, result) {
                InitialOutcome::Initialized { added } => {
                    // Fresh conversation: lay out and jump to the live end
                    ensure_layout(app);
                    app.session
                        .jump_bottom(app.layout.height(), app.feed_viewport_rows);
                    tracing::info!(added, "Initial page loaded");
                }
                InitialOutcome::Exhausted => {
                    app.set_status("No history in this conversation");
                }
                InitialOutcome::Failed => {
                    let error = app
                        .session
                        .last_error()
                        .unwrap_or("unknown error")
                        .to_string();
                    app.set_status(format!("Load failed: {error}"));
                }
                InitialOutcome::Stale => {}
            }
        }
        AppEvent::OlderPageLoaded {
            generation,
            page,
            result,
        } => {
            match app.session.apply_older(generation, page, result) {
                OlderOutcome::Prepended { added } => {
                    // The data mutation happened inside apply_older; now
                    // re-layout for the current viewport and let the
                    // controller correct the offset against its snapshot.
                    ensure_layout(app);
                    let offset = app.session.commit_prepend(app.layout.height());
                    tracing::debug!(page, added, offset, "Older page committed");
                }
                OlderOutcome::Exhausted => {
                    tracing::debug!(page, "Reached the beginning of the conversation");
                }
                OlderOutcome::Failed => {
                    let error = app
                        .session
                        .last_error()
                        .unwrap_or("unknown error")
                        .to_string();
                    app.set_status(format!("Could not load older messages: {error}"));
                }
                OlderOutcome::Stale => {}
            }
        }
    }
}
