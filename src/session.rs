//! Session-scoped context.
//!
//! A `Session` owns the model client for its whole lifetime and keeps the
//! last response in memory. Nothing is persisted.

use std::sync::Arc;

use crate::config::Config;
use crate::llm::ModelClientTrait;
use crate::orchestrator::{Orchestrator, OrchestratorBuilder, Reporter, Summary, SummarizeError};
use crate::response::ModelResponse;

/// Built-in example requests.
pub const SAMPLE_QUESTIONS: [&str; 3] = [
    "Summarize the latest global economic news in Hindi",
    "What are the recent tech industry developments? Respond in French.",
    "Summarize today's top sports headlines in German",
];

/// Ephemeral per-session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Raw response of the last successful submission
    pub last_response: Option<ModelResponse>,
    /// Extracted text of the last successful submission
    pub last_text: String,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        self.last_response.is_none() && self.last_text.is_empty()
    }
}

/// An interactive session: one orchestrator, reused across submissions.
pub struct Session {
    orchestrator: Orchestrator,
    state: SessionState,
    submissions: usize,
}

impl Session {
    /// Opens a session from configuration.
    ///
    /// The model client is built once here with the configured API key. A
    /// search client that cannot be built is logged and left out; searches
    /// then use the date-only fallback.
    ///
    /// # Errors
    ///
    /// Returns `SummarizeError::Configuration` if the settings are unusable
    /// (missing or malformed API key, invalid base URL) and
    /// `SummarizeError::ModelCall` if the HTTP client itself cannot be created.
    pub fn open(config: &Config) -> Result<Self, SummarizeError> {
        let model = config.model_client_builder().build().map_err(|e| {
            if e.is_configuration() {
                SummarizeError::Configuration(e)
            } else {
                SummarizeError::ModelCall(e)
            }
        })?;

        let mut builder = OrchestratorBuilder::new().model(Arc::new(model));
        match config.search_client() {
            Ok(search) => builder = builder.search(search),
            Err(e) => tracing::warn!(error = %e, "search client unavailable"),
        }

        tracing::debug!(model = %config.model, base_url = %config.base_url, "session opened");
        Ok(Self::with_orchestrator(builder.build()))
    }

    /// Creates a session around an already-built orchestrator.
    pub fn with_orchestrator(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            state: SessionState::default(),
            submissions: 0,
        }
    }

    /// Creates a session with only a model client (no search).
    pub fn with_model(model: Arc<dyn ModelClientTrait>) -> Self {
        Self::with_orchestrator(Orchestrator::new(model))
    }

    /// Handles one submission and records the result on success.
    ///
    /// An empty query is rejected without touching the stored state.
    /// Otherwise the previous state is cleared first, so a failed model call
    /// leaves the state empty.
    pub fn submit(
        &mut self,
        query: &str,
        use_search: bool,
        reporter: &mut dyn Reporter,
    ) -> Result<Summary, SummarizeError> {
        if query.trim().is_empty() {
            return Err(SummarizeError::Validation);
        }
        self.state = SessionState::default();
        let summary = self.orchestrator.summarize(query, use_search, reporter)?;
        self.submissions += 1;
        self.state = SessionState {
            last_response: Some(summary.response.clone()),
            last_text: summary.text.clone(),
        };
        Ok(summary)
    }

    /// Clears the stored response ("new query").
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Number of successful submissions in this session.
    pub fn submissions(&self) -> usize {
        self.submissions
    }

    /// Ends the session, releasing the model client.
    pub fn close(self) {
        tracing::debug!(submissions = self.submissions, "session closed");
    }
}

/// Returns sample question `n` (1-based).
pub fn sample_question(n: usize) -> Option<&'static str> {
    n.checked_sub(1).and_then(|i| SAMPLE_QUESTIONS.get(i)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::llm::ModelError;
    use crate::orchestrator::Notice;
    use crate::response::RunResponse;

    struct EchoModel;

    impl ModelClientTrait for EchoModel {
        fn run(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
            if prompt.contains("fail") {
                return Err(ModelError::Api {
                    message: "boom".to_string(),
                });
            }
            Ok(ModelResponse::Structured(RunResponse::new(
                format!("echo: {prompt}"),
                "echo",
            )))
        }
    }

    #[test]
    fn submit_stores_last_response_and_text() {
        let mut session = Session::with_model(Arc::new(EchoModel));
        let mut notices: Vec<Notice> = Vec::new();

        let summary = session.submit("markets", false, &mut notices).unwrap();

        assert_eq!(summary.text, "echo: markets");
        assert_eq!(session.state().last_text, "echo: markets");
        assert_eq!(session.state().last_response, Some(summary.response));
        assert_eq!(session.submissions(), 1);
    }

    #[test]
    fn client_is_reused_across_submissions() {
        let mut session = Session::with_model(Arc::new(EchoModel));
        let mut notices: Vec<Notice> = Vec::new();

        session.submit("one", false, &mut notices).unwrap();
        session.submit("two", false, &mut notices).unwrap();

        assert_eq!(session.submissions(), 2);
        assert_eq!(session.state().last_text, "echo: two");
    }

    #[test]
    fn failed_submission_clears_previous_state() {
        let mut session = Session::with_model(Arc::new(EchoModel));
        let mut notices: Vec<Notice> = Vec::new();

        session.submit("ok", false, &mut notices).unwrap();
        let result = session.submit("please fail", false, &mut notices);

        assert!(matches!(result, Err(SummarizeError::ModelCall(_))));
        assert!(session.state().is_empty());
        assert_eq!(session.submissions(), 1);
    }

    #[test]
    fn empty_submission_keeps_previous_summary() {
        let mut session = Session::with_model(Arc::new(EchoModel));
        let mut notices: Vec<Notice> = Vec::new();

        session.submit("markets", false, &mut notices).unwrap();
        let result = session.submit("  ", false, &mut notices);

        assert!(matches!(result, Err(SummarizeError::Validation)));
        assert_eq!(session.state().last_text, "echo: markets");
        assert_eq!(session.submissions(), 1);
    }

    #[test]
    fn reset_clears_state() {
        let mut session = Session::with_model(Arc::new(EchoModel));
        session
            .submit("ok", false, &mut Vec::<Notice>::new())
            .unwrap();
        assert!(!session.state().is_empty());

        session.reset();
        assert!(session.state().is_empty());
        session.close();
    }

    #[test]
    #[serial_test::serial]
    fn open_without_api_key_is_a_configuration_error() {
        unsafe {
            std::env::remove_var(crate::config::ENV_API_KEY);
        }
        let config = ConfigBuilder::new().build().unwrap();

        let result = Session::open(&config);
        assert!(matches!(
            result,
            Err(SummarizeError::Configuration(ModelError::MissingApiKey))
        ));
    }

    #[test]
    #[serial_test::serial]
    fn open_with_malformed_api_key_is_a_configuration_error() {
        let config = ConfigBuilder::new().api_key("sk\ntest").build().unwrap();

        let result = Session::open(&config);
        match result {
            Err(e @ SummarizeError::Configuration(ModelError::InvalidApiKey)) => {
                assert!(e.is_user_error());
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("malformed key was accepted"),
        }
    }

    #[test]
    #[serial_test::serial]
    fn open_with_api_key_succeeds() {
        let config = ConfigBuilder::new().api_key("sk-test").build().unwrap();
        let session = Session::open(&config).unwrap();
        assert!(session.state().is_empty());
        assert_eq!(session.submissions(), 0);
    }

    #[test]
    fn sample_question_is_one_based() {
        assert_eq!(sample_question(1), Some(SAMPLE_QUESTIONS[0]));
        assert_eq!(sample_question(3), Some(SAMPLE_QUESTIONS[2]));
        assert_eq!(sample_question(0), None);
        assert_eq!(sample_question(4), None);
    }
}
