use crate::orchestrator::{Notice, Reporter};

/// Application state for the TUI.
///
/// Holds the query and API key inputs, the search toggle, and what the last
/// submission produced. The `Session` itself lives in the event loop.
#[derive(Debug, Clone)]
pub struct App {
    /// Query input buffer
    query_input: String,
    /// API key input buffer (masked when rendered)
    api_key_input: String,
    /// Whether the session has a usable model client
    has_api_key: bool,
    /// Whether submissions use web search
    use_search: bool,
    /// Currently focused input
    focus: Focus,
    /// Markdown of the last summary
    summary: Option<String>,
    /// Notices from the last submission
    notices: Vec<Notice>,
    /// True while a submission is running
    processing: bool,
    /// Scroll offset for the summary panel
    summary_scroll: u16,
}

/// Input focus state for keyboard handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Query input is focused (typing edits the query, Enter submits)
    Query,
    /// API key input is focused (typing edits the key, Enter applies it)
    ApiKey,
}

impl App {
    /// Creates a new App with default state.
    ///
    /// Focus starts on the query input when a key is configured, on the API
    /// key input otherwise. Search is on by default.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsum::tui::{App, Focus};
    ///
    /// let app = App::new(true);
    /// assert_eq!(app.focus(), Focus::Query);
    /// assert!(app.use_search());
    /// assert!(app.summary().is_none());
    /// ```
    pub fn new(has_api_key: bool) -> Self {
        Self {
            query_input: String::new(),
            api_key_input: String::new(),
            has_api_key,
            use_search: true,
            focus: if has_api_key { Focus::Query } else { Focus::ApiKey },
            summary: None,
            notices: Vec::new(),
            processing: false,
            summary_scroll: 0,
        }
    }

    pub fn query_input(&self) -> &str {
        &self.query_input
    }

    pub fn api_key_input(&self) -> &str {
        &self.api_key_input
    }

    pub fn has_api_key(&self) -> bool {
        self.has_api_key
    }

    pub fn set_has_api_key(&mut self, has_api_key: bool) {
        self.has_api_key = has_api_key;
    }

    pub fn use_search(&self) -> bool {
        self.use_search
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn summary_scroll(&self) -> u16 {
        self.summary_scroll
    }

    /// Toggles web search for subsequent submissions.
    pub fn toggle_search(&mut self) {
        self.use_search = !self.use_search;
    }

    /// Switches between the query and API key inputs.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Query => Focus::ApiKey,
            Focus::ApiKey => Focus::Query,
        };
    }

    /// Moves focus to the query input.
    pub fn focus_query(&mut self) {
        self.focus = Focus::Query;
    }

    /// Appends a character to the focused input.
    pub fn push_char(&mut self, c: char) {
        match self.focus {
            Focus::Query => self.query_input.push(c),
            Focus::ApiKey => self.api_key_input.push(c),
        }
    }

    /// Removes the last character from the focused input.
    pub fn pop_char(&mut self) {
        match self.focus {
            Focus::Query => self.query_input.pop(),
            Focus::ApiKey => self.api_key_input.pop(),
        };
    }

    /// Replaces the query (used by sample questions).
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query_input = query.into();
        self.focus = Focus::Query;
    }

    /// Takes the API key buffer, leaving it empty.
    pub fn take_api_key_input(&mut self) -> String {
        std::mem::take(&mut self.api_key_input)
    }

    /// Marks a submission as started and clears the previous result.
    pub fn begin_submission(&mut self) {
        self.processing = true;
        self.summary = None;
        self.notices.clear();
        self.summary_scroll = 0;
    }

    /// Stores the rendered summary and ends the submission.
    pub fn finish_submission(&mut self, summary: Option<String>) {
        self.processing = false;
        self.summary = summary;
    }

    /// Adds a notice outside of a submission (e.g., key handling).
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Clears query, summary and notices ("new query").
    pub fn new_query(&mut self) {
        self.query_input.clear();
        self.summary = None;
        self.notices.clear();
        self.processing = false;
        self.summary_scroll = 0;
        self.focus = Focus::Query;
    }

    pub fn scroll_summary_down(&mut self, amount: u16) {
        self.summary_scroll = self.summary_scroll.saturating_add(amount);
    }

    pub fn scroll_summary_up(&mut self, amount: u16) {
        self.summary_scroll = self.summary_scroll.saturating_sub(amount);
    }
}

impl Reporter for App {
    fn report(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
