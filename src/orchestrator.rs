//! Submission pipeline: validation, optional search, model call, extraction
//! and formatting.
//!
//! Search problems never abort a submission; the query falls back to a
//! date-stamped form. Validation, configuration and model-call failures do.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use time::Date;

use crate::enricher::{add_date_to_query, build_search_query, today};
use crate::format::FormattedSummary;
use crate::llm::{ModelClientTrait, ModelError};
use crate::response::{ModelResponse, extract_content};
use crate::search::SearchClient;

/// Errors that end a submission.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The query was empty or whitespace-only
    #[error("Please enter a valid question.")]
    Validation,

    /// The model client cannot be used (e.g., missing API key)
    #[error("Configuration error: {0}")]
    Configuration(#[source] ModelError),

    /// The model endpoint failed
    #[error("Error generating summary: {0}")]
    ModelCall(#[source] ModelError),
}

impl SummarizeError {
    /// Returns true for errors the user can fix by changing input or settings.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SummarizeError::Validation | SummarizeError::Configuration(_)
        )
    }
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible message produced while handling a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives notices as a submission progresses.
pub trait Reporter {
    fn report(&mut self, notice: Notice);
}

impl Reporter for Vec<Notice> {
    fn report(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// What happened in the search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Search was turned off for this submission
    Disabled,
    /// Search returned this many records (at most 3 were embedded)
    Found(usize),
    /// Search returned nothing; the date-only fallback was used
    Empty,
    /// Search failed; the date-only fallback was used
    Failed,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Exactly what was sent to the model
    pub enriched_query: String,
    /// The model's raw response
    pub response: ModelResponse,
    /// Plain text extracted from the response
    pub text: String,
    /// Display shape of `text`
    pub formatted: FormattedSummary,
    pub search: SearchOutcome,
}

type DateSource = Box<dyn Fn() -> Date + Send + Sync>;

/// Builder for constructing `Orchestrator` instances.
#[derive(Default)]
pub struct OrchestratorBuilder {
    model: Option<Arc<dyn ModelClientTrait>>,
    search: Option<SearchClient>,
    date_source: Option<DateSource>,
}

impl OrchestratorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model client.
    pub fn model(mut self, model: Arc<dyn ModelClientTrait>) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the search client. Without one, search-enabled submissions fall
    /// back to date-only enrichment.
    pub fn search(mut self, search: SearchClient) -> Self {
        self.search = Some(search);
        self
    }

    /// Overrides where "today" comes from.
    pub fn date_source(mut self, source: impl Fn() -> Date + Send + Sync + 'static) -> Self {
        self.date_source = Some(Box::new(source));
        self
    }

    /// Builds the `Orchestrator`.
    ///
    /// # Panics
    ///
    /// Panics if `model()` was not called.
    #[must_use]
    pub fn build(self) -> Orchestrator {
        Orchestrator {
            model: self.model.expect("model must be set via model() method"),
            search: self.search,
            date_source: self
                .date_source
                .unwrap_or_else(|| Box::new(today) as DateSource),
        }
    }
}

/// Runs one submission at a time against a model and an optional search client.
pub struct Orchestrator {
    model: Arc<dyn ModelClientTrait>,
    search: Option<SearchClient>,
    date_source: DateSource,
}

impl Orchestrator {
    /// Creates an orchestrator with a model client and no search client.
    #[must_use]
    pub fn new(model: Arc<dyn ModelClientTrait>) -> Self {
        OrchestratorBuilder::new().model(model).build()
    }

    /// Builds the prompt for a query.
    ///
    /// With search disabled the query is returned unmodified. With search
    /// enabled the outcome decides between snippet enrichment and the
    /// date-only fallback.
    ///
    /// # Errors
    ///
    /// Returns `SummarizeError::Validation` for an empty query, before any search.
    pub fn prepare_prompt(
        &self,
        query: &str,
        use_search: bool,
        reporter: &mut dyn Reporter,
    ) -> Result<(String, SearchOutcome), SummarizeError> {
        if query.trim().is_empty() {
            return Err(SummarizeError::Validation);
        }

        if !use_search {
            return Ok((query.to_string(), SearchOutcome::Disabled));
        }

        let date = (self.date_source)();
        notify(
            reporter,
            Notice::info(format!("Searching for recent information about: {query}")),
        );

        let Some(search) = &self.search else {
            notify(
                reporter,
                Notice::warning("Search is not available. Using date-enhanced query."),
            );
            return Ok((add_date_to_query(query, date), SearchOutcome::Failed));
        };

        match search.search(query) {
            Ok(records) if !records.is_empty() => {
                notify(
                    reporter,
                    Notice::success(format!(
                        "Found {} recent results from DuckDuckGo",
                        records.len()
                    )),
                );
                Ok((
                    build_search_query(query, &records, date),
                    SearchOutcome::Found(records.len()),
                ))
            }
            Ok(_) => {
                notify(
                    reporter,
                    Notice::warning(
                        "Could not retrieve recent information from DuckDuckGo. Using date-enhanced query.",
                    ),
                );
                Ok((add_date_to_query(query, date), SearchOutcome::Empty))
            }
            Err(e) => {
                notify(
                    reporter,
                    Notice::error(format!("Error searching with DuckDuckGo: {e}")),
                );
                notify(
                    reporter,
                    Notice::warning("Using date-enhanced query as fallback."),
                );
                Ok((add_date_to_query(query, date), SearchOutcome::Failed))
            }
        }
    }

    /// Handles one submission end to end.
    ///
    /// # Errors
    ///
    /// Returns `SummarizeError::Validation` for an empty query (no search or
    /// model call is made) and `SummarizeError::ModelCall` if the model call
    /// fails. Search failures are reported through `reporter` and recovered.
    pub fn summarize(
        &self,
        query: &str,
        use_search: bool,
        reporter: &mut dyn Reporter,
    ) -> Result<Summary, SummarizeError> {
        let (enriched_query, search) = self.prepare_prompt(query, use_search, reporter)?;

        let started = Instant::now();
        let response = self
            .model
            .run(&enriched_query)
            .map_err(SummarizeError::ModelCall)?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            structured = response.content().is_some(),
            "model call completed"
        );

        let text = extract_content(&response);
        let formatted = FormattedSummary::from_text(&text);

        Ok(Summary {
            enriched_query,
            response,
            text,
            formatted,
            search,
        })
    }
}

/// Logs a notice and forwards it to the reporter.
fn notify(reporter: &mut dyn Reporter, notice: Notice) {
    match notice.level {
        NoticeLevel::Info | NoticeLevel::Success => tracing::info!("{}", notice.message),
        NoticeLevel::Warning => tracing::warn!("{}", notice.message),
        NoticeLevel::Error => tracing::error!("{}", notice.message),
    }
    reporter.report(notice);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RunResponse;
    use crate::search::{RetryPolicy, SearchError, SearchProvider, SearchRecord};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::date;

    struct MockModel {
        response: Result<ModelResponse, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockModel {
        fn answering(content: &str) -> Self {
            Self {
                response: Ok(ModelResponse::Structured(RunResponse::new(content, "mock"))),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn raw(body: &str) -> Self {
            Self {
                response: Ok(ModelResponse::Raw(body.to_string())),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl ModelClientTrait for MockModel {
        fn run(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.response {
                Ok(response) => Ok(response.clone()),
                Err(status) => Err(ModelError::Http {
                    status: *status,
                    message: None,
                }),
            }
        }
    }

    enum Behavior {
        Records(Vec<SearchRecord>),
        Fail,
    }

    struct MockSearch {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl MockSearch {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SearchProvider for MockSearch {
        fn name(&self) -> &str {
            "mock"
        }

        fn text(&self, _query: &str, max_results: usize) -> Result<Vec<SearchRecord>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Records(records) => {
                    Ok(records.iter().take(max_results).cloned().collect())
                }
                Behavior::Fail => Err(SearchError::Http { status: 500 }),
            }
        }
    }

    fn orchestrator(model: &Arc<MockModel>, search: &Arc<MockSearch>) -> Orchestrator {
        let client = SearchClient::new(search.clone() as Arc<dyn SearchProvider>)
            .with_policy(RetryPolicy::immediate(2));
        OrchestratorBuilder::new()
            .model(model.clone() as Arc<dyn ModelClientTrait>)
            .search(client)
            .date_source(|| date!(2025 - 03 - 14))
            .build()
    }

    fn records(n: usize) -> Vec<SearchRecord> {
        (1..=n)
            .map(|i| SearchRecord::new(format!("Title {i}"), format!("Body {i}")))
            .collect()
    }

    #[test]
    fn empty_query_terminates_before_search_and_model() {
        let model = Arc::new(MockModel::answering("unused"));
        let search = Arc::new(MockSearch::new(Behavior::Records(records(2))));
        let orch = orchestrator(&model, &search);
        let mut notices: Vec<Notice> = Vec::new();

        let result = orch.summarize("   \n", true, &mut notices);

        assert!(matches!(result, Err(SummarizeError::Validation)));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
        assert!(model.prompts().is_empty());
        assert!(notices.is_empty());
    }

    #[test]
    fn search_disabled_sends_raw_query_unmodified() {
        let model = Arc::new(MockModel::answering("Summary"));
        let search = Arc::new(MockSearch::new(Behavior::Records(records(2))));
        let orch = orchestrator(&model, &search);
        let mut notices: Vec<Notice> = Vec::new();

        let summary = orch
            .summarize("What happened in F1 today?", false, &mut notices)
            .unwrap();

        assert_eq!(summary.enriched_query, "What happened in F1 today?");
        assert_eq!(model.prompts(), vec!["What happened in F1 today?".to_string()]);
        assert_eq!(summary.search, SearchOutcome::Disabled);
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
        assert!(notices.is_empty());
    }

    #[test]
    fn two_results_are_embedded_with_date_and_sent_to_model() {
        let model = Arc::new(MockModel::answering("Résumé"));
        let search = Arc::new(MockSearch::new(Behavior::Records(vec![
            SearchRecord::new("A", "x"),
            SearchRecord::new("B", "y"),
        ])));
        let orch = orchestrator(&model, &search);
        let mut notices: Vec<Notice> = Vec::new();

        let summary = orch
            .summarize("Summarize tech news", true, &mut notices)
            .unwrap();

        assert!(summary.enriched_query.starts_with("Summarize tech news"));
        assert!(summary.enriched_query.contains("1. A: x"));
        assert!(summary.enriched_query.contains("2. B: y"));
        assert!(summary.enriched_query.contains("2025-03-14"));
        assert_eq!(model.prompts(), vec![summary.enriched_query.clone()]);
        assert_eq!(summary.search, SearchOutcome::Found(2));
        assert_eq!(
            notices,
            vec![
                Notice::info("Searching for recent information about: Summarize tech news"),
                Notice::success("Found 2 recent results from DuckDuckGo"),
            ]
        );
    }

    #[test]
    fn five_results_embed_exactly_three() {
        let model = Arc::new(MockModel::answering("ok"));
        let search = Arc::new(MockSearch::new(Behavior::Records(records(5))));
        let orch = orchestrator(&model, &search);

        let summary = orch.summarize("news", true, &mut Vec::<Notice>::new()).unwrap();

        assert_eq!(summary.search, SearchOutcome::Found(5));
        for i in 1..=3 {
            assert!(summary.enriched_query.contains(&format!("{i}. Title {i}: Body {i}")));
        }
        assert!(!summary.enriched_query.contains("Title 4"));
        assert!(!summary.enriched_query.contains("Title 5"));
    }

    #[test]
    fn empty_search_falls_back_to_date_only() {
        let model = Arc::new(MockModel::answering("ok"));
        let search = Arc::new(MockSearch::new(Behavior::Records(Vec::new())));
        let orch = orchestrator(&model, &search);
        let mut notices: Vec<Notice> = Vec::new();

        let summary = orch.summarize("news", true, &mut notices).unwrap();

        assert_eq!(
            summary.enriched_query,
            add_date_to_query("news", date!(2025 - 03 - 14))
        );
        assert_eq!(summary.search, SearchOutcome::Empty);
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
        assert_eq!(notices.last().unwrap().level, NoticeLevel::Warning);
    }

    #[test]
    fn search_failure_is_reported_and_recovered() {
        let model = Arc::new(MockModel::answering("ok"));
        let search = Arc::new(MockSearch::new(Behavior::Fail));
        let orch = orchestrator(&model, &search);
        let mut notices: Vec<Notice> = Vec::new();

        let summary = orch.summarize("news", true, &mut notices).unwrap();

        assert_eq!(
            summary.enriched_query,
            add_date_to_query("news", date!(2025 - 03 - 14))
        );
        assert_eq!(summary.search, SearchOutcome::Failed);
        let levels: Vec<NoticeLevel> = notices.iter().map(|n| n.level).collect();
        assert_eq!(
            levels,
            vec![NoticeLevel::Info, NoticeLevel::Error, NoticeLevel::Warning]
        );
        assert!(notices[1].message.contains("HTTP error: status 500"));
        assert_eq!(model.prompts().len(), 1);
    }

    #[test]
    fn missing_search_client_falls_back_to_date_only() {
        let model = Arc::new(MockModel::answering("ok"));
        let orch = OrchestratorBuilder::new()
            .model(model.clone() as Arc<dyn ModelClientTrait>)
            .date_source(|| date!(2025 - 03 - 14))
            .build();

        let summary = orch.summarize("news", true, &mut Vec::<Notice>::new()).unwrap();
        assert!(summary.enriched_query.contains("Today's date is 2025-03-14."));
        assert_eq!(summary.search, SearchOutcome::Failed);
    }

    #[test]
    fn model_failure_is_fatal() {
        let model = Arc::new(MockModel::failing(503));
        let search = Arc::new(MockSearch::new(Behavior::Fail));
        let orch = orchestrator(&model, &search);
        let mut notices: Vec<Notice> = Vec::new();

        let result = orch.summarize("news", true, &mut notices);

        match result {
            Err(SummarizeError::ModelCall(ModelError::Http { status, .. })) => {
                assert_eq!(status, 503)
            }
            other => panic!("expected model call failure, got {other:?}"),
        }
        // Search fallback notices were still delivered
        assert_eq!(notices.len(), 3);
    }

    #[test]
    fn raw_model_response_is_extracted_from_text() {
        let model = Arc::new(MockModel::raw("RunResponse(content='Plain summary', model='x')"));
        let search = Arc::new(MockSearch::new(Behavior::Fail));
        let orch = orchestrator(&model, &search);

        let summary = orch.summarize("news", false, &mut Vec::<Notice>::new()).unwrap();
        assert_eq!(summary.text, "Plain summary");
        assert!(!summary.formatted.is_numbered_list());
    }

    #[test]
    fn numbered_answer_is_formatted_as_list() {
        let model = Arc::new(MockModel::answering("1. Markets\n2. Sports"));
        let search = Arc::new(MockSearch::new(Behavior::Fail));
        let orch = orchestrator(&model, &search);

        let summary = orch.summarize("news", false, &mut Vec::<Notice>::new()).unwrap();
        assert!(summary.formatted.is_numbered_list());
        assert_eq!(summary.formatted.to_markdown(), "1. Markets\n2. Sports");
    }

    #[test]
    fn user_error_classification() {
        assert!(SummarizeError::Validation.is_user_error());
        assert!(SummarizeError::Configuration(ModelError::MissingApiKey).is_user_error());
        assert!(
            !SummarizeError::ModelCall(ModelError::Api {
                message: "x".to_string()
            })
            .is_user_error()
        );
    }
}
