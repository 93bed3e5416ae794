//! Shared glue between the event loop, input handling, and the session.

use crate::app::{App, AppEvent};
use crate::feed::fetch_page;
use chrono::Utc;
use tokio::sync::mpsc;

/// Rebuilds the layout cache for the current viewport if it is stale.
///
/// Called before every measurement — scrolling bounds, proximity checks,
/// and the post-prepend commit all read `app.layout.height()` and must see
/// the same layout the next frame will draw.
pub(super) fn ensure_layout(app: &mut App) {
    app.layout.ensure(
        app.session.entries(),
        app.session.generation(),
        app.session.store().revision(),
        app.feed_viewport_width,
        app.session.conversation(),
    );
}

/// Opens the selected conversation: aborts any in-flight fetch for the
/// previous identity, resets the session, and spawns the page-0 fetch.
pub(super) fn open_selected_conversation(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    app.abort_inflight_fetch();

    let conversation = app.selected_conversation_id().to_string();
    let Some(request) = app.session.open(&conversation, Utc::now()) else {
        // Unreachable after a reset; the ledger was just cleared
        tracing::warn!(conversation = %conversation, "Page 0 already planned, not spawning");
        return;
    };

    let generation = app.session.generation();
    let client = app.http_client.clone();
    let tx = event_tx.clone();

    app.fetch_handle = Some(tokio::spawn(async move {
        let result = fetch_page(&client, &request).await;
        if let Err(e) = tx
            .send(AppEvent::InitialPageLoaded { generation, result })
            .await
        {
            tracing::warn!(error = %e, "Failed to send initial page (receiver dropped)");
        }
    }));
    app.needs_redraw = true;
}

/// The proximity poll: starts an older-page fetch when the viewer is near
/// the top, no cycle is in flight, and history remains.
///
/// Safe to call every loop iteration — all the guards live in the session
/// and the planning path returns at most one request per page.
pub(super) fn maybe_request_older(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.feed_viewport_rows == 0 {
        // Nothing rendered yet; measurements would be meaningless
        return;
    }

    ensure_layout(app);
    let Some(request) = app.session.request_older(app.layout.height()) else {
        return;
    };

    let generation = app.session.generation();
    let page = request.page;
    let client = app.http_client.clone();
    let tx = event_tx.clone();

    app.fetch_handle = Some(tokio::spawn(async move {
        let result = fetch_page(&client, &request).await;
        if let Err(e) = tx
            .send(AppEvent::OlderPageLoaded {
                generation,
                page,
                result,
            })
            .await
        {
            tracing::warn!(error = %e, "Failed to send older page (receiver dropped)");
        }
    }));
    app.needs_redraw = true;
}
