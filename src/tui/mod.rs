//! Terminal User Interface module for newsum.
//!
//! An interactive session: type a question, toggle web search, and read the
//! summary rendered as markdown. Uses ratatui for rendering and crossterm for
//! terminal management.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::Config;
use crate::orchestrator::{Notice, SummarizeError};
use crate::session::Session;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus};
use event::Action;

const MISSING_KEY_WARNING: &str = "Please enter your Sutra API key to continue.";

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Must be called before exiting the TUI, even in error cases.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic hook. Errors are ignored.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original hook runs.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations fail.
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, config: &Config, session: &mut Option<Session>) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, config, session, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    config: &Config,
    session: &mut Option<Session>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
        {
            match event::handle_key_event(app, key) {
                Action::Quit => break,
                Action::None => {}
                Action::Submit => {
                    // Show the spinner before the blocking call.
                    if session.is_some() && !app.query_input().trim().is_empty() {
                        app.begin_submission();
                        terminal.draw(|frame| ui::draw(frame, app))?;
                    }
                    submit_query(app, session.as_mut());
                }
                Action::ApplyApiKey(key) => apply_api_key(app, config, session, key),
                Action::NewQuery => {
                    if let Some(session) = session.as_mut() {
                        session.reset();
                    }
                }
            }
        }
    }

    Ok(())
}

/// Submits the current query through the session and stores the result in the app.
///
/// Without a session, or with an empty query, the submission is refused
/// with a warning and the summary on screen is kept.
fn submit_query(app: &mut App, session: Option<&mut Session>) {
    let Some(session) = session else {
        app.push_notice(Notice::warning(MISSING_KEY_WARNING));
        return;
    };

    if app.query_input().trim().is_empty() {
        app.push_notice(Notice::warning(SummarizeError::Validation.to_string()));
        return;
    }

    if !app.is_processing() {
        app.begin_submission();
    }

    let query = app.query_input().to_string();
    let use_search = app.use_search();
    match session.submit(&query, use_search, &mut *app) {
        Ok(summary) => {
            app.push_notice(Notice::success("Summary generated."));
            app.finish_submission(Some(summary.formatted.to_markdown()));
        }
        Err(e) => {
            app.push_notice(Notice::error(e.to_string()));
            app.finish_submission(None);
        }
    }
}

/// Replaces the session with one built from `key`.
///
/// The previous session stays open if the new one cannot be built.
fn apply_api_key(app: &mut App, config: &Config, session: &mut Option<Session>, key: String) {
    let mut config = config.clone();
    config.api_key = Some(key);

    match Session::open(&config) {
        Ok(new_session) => {
            if let Some(old) = session.replace(new_session) {
                old.close();
            }
            app.set_has_api_key(true);
            app.push_notice(Notice::success("API key set."));
        }
        Err(e) => app.push_notice(Notice::error(e.to_string())),
    }
}

/// Entry point for the TUI application.
///
/// Opens a session when `config` carries an API key; otherwise the key can
/// be entered in the UI.
///
/// # Errors
///
/// Returns an error if terminal initialization or the event loop fails.
pub fn run(config: Config) -> Result<()> {
    init_panic_hook();

    let mut session = match Session::open(&config) {
        Ok(session) => Some(session),
        Err(SummarizeError::Configuration(e)) if !config.has_api_key() => {
            tracing::debug!(error = %e, "starting without a session");
            None
        }
        Err(e) => return Err(e).context("Failed to open session"),
    };

    let mut app = App::new(session.is_some());
    if session.is_none() {
        app.push_notice(Notice::warning(MISSING_KEY_WARNING));
    }

    run_event_loop(&mut app, &config, &mut session).context("TUI event loop failed")?;

    if let Some(session) = session {
        session.close();
    }

    Ok(())
}
