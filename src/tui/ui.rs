//! UI rendering functions for the TUI.
//!
//! Lays out the question input, API key input, notices, the summary panel
//! and a shortcut bar using ratatui widgets.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::app::{App, Focus};
use crate::orchestrator::{Notice, NoticeLevel};
use crate::session::SAMPLE_QUESTIONS;

/// Main rendering function for the TUI.
///
/// Draws inputs at the top, notices and the summary in the middle, and the
/// shortcut bar at the bottom.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let notice_height = (app.notices().len() as u16).clamp(1, 5) + 2;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Inputs
            Constraint::Length(notice_height), // Notices
            Constraint::Min(0),                // Summary
            Constraint::Length(1),             // Shortcut bar
        ])
        .split(size);

    let input_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_chunks[0]);

    render_query_input(frame, app, input_chunks[0]);
    render_api_key_input(frame, app, input_chunks[1]);
    render_notices(frame, app, main_chunks[1]);
    render_summary(frame, app, main_chunks[2]);
    render_shortcut_bar(frame, app, main_chunks[3]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Renders the question input with a cursor when focused.
fn render_query_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::Query;

    let search = if app.use_search() { "on" } else { "off" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Question (web search: {search})"))
        .border_style(border_style(is_focused));

    let mut content = app.query_input().to_string();
    if is_focused {
        content.push('█');
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Renders the API key input. Typed characters are masked.
fn render_api_key_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::ApiKey;

    let title = if app.has_api_key() {
        "API key (set)"
    } else {
        "API key"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(is_focused));

    let mut content = mask(app.api_key_input());
    if is_focused {
        content.push('█');
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Renders notices from the last submission, color-coded by level.
fn render_notices(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Status");

    let text = if app.is_processing() {
        Text::from(Line::from(Span::styled(
            "Processing your request...",
            Style::default().fg(Color::Cyan),
        )))
    } else if app.notices().is_empty() {
        Text::from(Line::from(Span::styled(
            "Ready",
            Style::default().fg(Color::DarkGray),
        )))
    } else {
        Text::from(app.notices().iter().map(notice_line).collect::<Vec<_>>())
    };

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn notice_line(notice: &Notice) -> Line<'static> {
    let (label, color) = level_style(notice.level);
    Line::from(vec![
        Span::styled(
            format!("{label} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(notice.message.clone()),
    ])
}

fn level_style(level: NoticeLevel) -> (&'static str, Color) {
    match level {
        NoticeLevel::Info => ("info", Color::Blue),
        NoticeLevel::Success => ("ok", Color::Green),
        NoticeLevel::Warning => ("warn", Color::Yellow),
        NoticeLevel::Error => ("error", Color::Red),
    }
}

/// Renders the summary as markdown, or the sample questions when empty.
fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Summary");

    let text = match app.summary() {
        Some(markdown) => tui_markdown::from_str(markdown),
        None => samples_text(),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.summary_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn samples_text() -> Text<'static> {
    let mut text = Text::default();
    text.lines.push(Line::from(Span::styled(
        "Sample questions:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
        text.lines.push(Line::from(vec![
            Span::styled(format!("  F{} ", i + 1), Style::default().fg(Color::Cyan)),
            Span::raw(*question),
        ]));
    }
    text
}

/// Renders the shortcut bar at the bottom of the screen.
///
/// Format: `Key: action | Key: action` with keys highlighted in cyan.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let enter_action = match app.focus() {
        Focus::Query => ": ask",
        Focus::ApiKey => ": set key",
    };

    let spans = vec![
        Span::styled("Esc", key_style),
        Span::raw(": quit"),
        Span::styled(" | ", sep_style),
        Span::styled("Enter", key_style),
        Span::raw(enter_action),
        Span::styled(" | ", sep_style),
        Span::styled("Tab", key_style),
        Span::raw(": switch input"),
        Span::styled(" | ", sep_style),
        Span::styled("Ctrl+S", key_style),
        Span::raw(": toggle search"),
        Span::styled(" | ", sep_style),
        Span::styled("Ctrl+N", key_style),
        Span::raw(": new query"),
        Span::styled(" | ", sep_style),
        Span::styled("F1-F3", key_style),
        Span::raw(": samples"),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}
