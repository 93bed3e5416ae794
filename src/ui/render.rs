//! Render functions for the TUI.

use crate::app::App;
use crate::feed::LoadState;
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame,
};

use super::helpers::ensure_layout;
use super::status;

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 8;

/// Main render dispatch function.
///
/// Lays the screen out as header / feed / status bar, validates the
/// terminal size, and draws the visible window of the feed.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-sized areas during extreme resizes
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = Paragraph::new(format!(
            "Terminal too small\nMinimum: {}x{}",
            MIN_WIDTH, MIN_HEIGHT
        ))
        .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_feed(f, app, chunks[1]);
    status::render(f, app, chunks[2]);
}

/// One-line header: conversation handle and position in the cycle.
fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " @{} ({}/{})",
        app.selected_conversation_id(),
        app.selected_conversation + 1,
        app.conversations.len()
    );
    let header = Paragraph::new(truncate_to_width(&title, area.width as usize).into_owned())
        .style(Style::default().fg(Color::White).bg(Color::Black).add_modifier(Modifier::BOLD));
    f.render_widget(header, area);
}

/// The scrollable conversation window.
fn render_feed(f: &mut Frame, app: &mut App, area: Rect) {
    // Record the viewport so input handlers and the commit protocol can
    // measure between frames
    app.feed_viewport_rows = area.height as usize;
    app.feed_viewport_width = area.width as usize;

    ensure_layout(app);
    let height = app.layout.height();

    // Clamp before rendering so a resize never draws an invalid offset
    app.session.clamp_scroll(height, app.feed_viewport_rows);

    if app.session.is_loading_initial() {
        let msg = Paragraph::new("Loading messages…")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(msg, centered_row(area));
        return;
    }

    if app.session.load_state() == LoadState::Errored && app.session.entries().is_empty() {
        let error = app.session.last_error().unwrap_or("unknown error");
        let msg = Paragraph::new(format!("{error} — press r to retry"))
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        f.render_widget(msg, centered_row(area));
        return;
    }

    let offset = app.session.offset().min(height);
    let end = (offset + app.feed_viewport_rows).min(height);
    let visible: Vec<Line<'static>> = app.layout.lines()[offset..end].to_vec();
    f.render_widget(Paragraph::new(Text::from(visible)), area);

    // Overlays live outside the layout: they must never change content
    // height or the anchor math would drift
    if app.session.is_loading_older() {
        overlay_top(f, area, "Loading older…", Style::default().fg(Color::Black).bg(Color::Gray));
    } else if app.session.load_state() == LoadState::Errored {
        let error = app.session.last_error().unwrap_or("unknown error");
        overlay_top(
            f,
            area,
            &format!("Older messages unavailable: {error}"),
            Style::default().fg(Color::White).bg(Color::Red),
        );
    }
}

/// Draws a one-row centered badge over the top row of `area`.
fn overlay_top(f: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.height == 0 {
        return;
    }
    let text = truncate_to_width(text, area.width as usize).into_owned();
    let badge = Paragraph::new(Line::from(Span::styled(text, style))).alignment(Alignment::Center);
    let row = Rect::new(area.x, area.y, area.width, 1);
    f.render_widget(badge, row);
}

/// The vertically centered single row of `area`.
fn centered_row(area: Rect) -> Rect {
    Rect::new(area.x, area.y + area.height / 2, area.width, 1)
}
