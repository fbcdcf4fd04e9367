pub mod config;
pub mod doctor;
pub mod enricher;
pub mod format;
pub mod llm;
pub mod logging;
pub mod orchestrator;
pub mod response;
pub mod search;
pub mod session;
pub mod tui;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use format::FormattedSummary;
pub use llm::{ModelClient, ModelClientBuilder, ModelClientTrait, ModelError};
pub use orchestrator::{
    Notice, NoticeLevel, Orchestrator, OrchestratorBuilder, Reporter, SearchOutcome,
    SummarizeError, Summary,
};
pub use response::{ModelResponse, RunResponse, extract_content};
pub use search::{RetryPolicy, SearchClient, SearchError, SearchProvider, SearchRecord};
pub use session::{SAMPLE_QUESTIONS, Session, SessionState, sample_question};
