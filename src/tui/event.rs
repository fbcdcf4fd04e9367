//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Work that
//! needs the session (submitting, applying a key) is returned as an
//! [`Action`] for the event loop to perform.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};
use crate::session::sample_question;

/// Follow-up the event loop must perform after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Submit the current query
    Submit,
    /// Open a session with the typed API key
    ApplyApiKey(String),
    /// Clear the session state
    NewQuery,
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Esc` / `Ctrl+C`: quit
/// - `Tab` / `Shift+Tab`: switch between query and API key inputs
/// - `Ctrl+S`: toggle web search
/// - `Ctrl+N`: new query
/// - `F1`-`F3`: submit a sample question
/// - `Up`/`Down`, `PgUp`/`PgDn`: scroll the summary
/// - `Enter`: submit (query input) or apply the key (API key input)
///
/// # Examples
///
/// ```
/// use newsum::tui::{App, event::{handle_key_event, Action}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new(true);
/// let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
/// assert_eq!(handle_key_event(&mut app, key), Action::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if app.is_processing() {
        return Action::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Char('c') if ctrl => return Action::Quit,
        KeyCode::Char('s') if ctrl => {
            app.toggle_search();
            return Action::None;
        }
        KeyCode::Char('n') if ctrl => {
            app.new_query();
            return Action::NewQuery;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_focus();
            return Action::None;
        }
        KeyCode::F(n @ 1..=3) => {
            if let Some(question) = sample_question(n as usize) {
                app.set_query(question);
                return Action::Submit;
            }
            return Action::None;
        }
        KeyCode::Up => {
            app.scroll_summary_up(1);
            return Action::None;
        }
        KeyCode::Down => {
            app.scroll_summary_down(1);
            return Action::None;
        }
        KeyCode::PageUp => {
            app.scroll_summary_up(10);
            return Action::None;
        }
        KeyCode::PageDown => {
            app.scroll_summary_down(10);
            return Action::None;
        }
        _ => {}
    }

    match app.focus() {
        Focus::Query => handle_query_input(app, key),
        Focus::ApiKey => handle_api_key_input(app, key),
    }
}

/// Handles keyboard input when the query input is focused.
fn handle_query_input(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::Submit,
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_char(c);
            Action::None
        }
        KeyCode::Backspace => {
            app.pop_char();
            Action::None
        }
        _ => Action::None,
    }
}

/// Handles keyboard input when the API key input is focused.
fn handle_api_key_input(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => {
            let key = app.take_api_key_input();
            if key.trim().is_empty() {
                Action::None
            } else {
                app.focus_query();
                Action::ApplyApiKey(key.trim().to_string())
            }
        }
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_char(c);
            Action::None
        }
        KeyCode::Backspace => {
            app.pop_char();
            Action::None
        }
        _ => Action::None,
    }
}
