use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use newsum::config::{self, ConfigBuilder, ConfigError};
use newsum::{
    Config, Notice, NoticeLevel, Reporter, SAMPLE_QUESTIONS, Session, SummarizeError, doctor,
    logging, sample_question, tui,
};
use thiserror::Error;

/// newsum - multilingual news summaries with optional web search
#[derive(Parser)]
#[command(name = "newsum")]
#[command(about = "Summarize current news in any language, grounded in live search results")]
#[command(version)]
struct Cli {
    /// API key for the model endpoint (overrides SUTRA_API_KEY)
    #[arg(long, global = true, value_name = "KEY")]
    api_key: Option<String>,

    /// Model identifier (overrides SUTRA_MODEL)
    #[arg(long, global = true, value_name = "MODEL")]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint (overrides SUTRA_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Model request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Ask a question and print the summary
    Ask(AskCommand),
    /// List the built-in sample questions
    Samples,
    /// Start the interactive terminal session
    Tui,
    /// Check configuration, search and model endpoint health
    Doctor,
}

/// Ask a question
#[derive(Parser)]
struct AskCommand {
    /// The question, including the desired response language
    #[arg(value_name = "QUERY", conflicts_with = "sample")]
    query: Option<String>,

    /// Use sample question N (see `newsum samples`)
    #[arg(long, value_name = "N")]
    sample: Option<usize>,

    /// Send the question as-is, without web search
    #[arg(long)]
    no_search: bool,

    /// Print the summary as HTML paragraphs
    #[arg(long, conflicts_with = "raw")]
    html: bool,

    /// Print the extracted text without formatting
    #[arg(long)]
    raw: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = config::load_dotenv() {
        eprintln!("Warning: {e}");
    }

    // The TUI owns the terminal; log output would corrupt it.
    if !matches!(cli.command, Commands::Tui) {
        logging::init(cli.verbose);
    }

    let result = match &cli.command {
        Commands::Ask(cmd) => handle_ask(&cli, cmd),
        Commands::Samples => {
            handle_samples();
            Ok(())
        }
        Commands::Tui => build_config(&cli).and_then(tui::run),
        Commands::Doctor => handle_doctor(&cli),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// `--sample` named a question that does not exist.
#[derive(Debug, Error)]
#[error("No sample question {0} (choose 1-{max})", max = SAMPLE_QUESTIONS.len())]
struct UnknownSample(usize);

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input or settings: an empty question, a missing API
/// key, an unknown sample number or an unparseable environment variable.
fn is_user_error(error: &anyhow::Error) -> bool {
    if let Some(e) = error.downcast_ref::<SummarizeError>() {
        return e.is_user_error();
    }
    error.downcast_ref::<ConfigError>().is_some() || error.downcast_ref::<UnknownSample>().is_some()
}

/// Resolves configuration from global flags, the environment and defaults.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut builder = ConfigBuilder::new();
    if let Some(key) = &cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(model) = &cli.model {
        builder = builder.model(model);
    }
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.model_timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Picks the question from `--sample` or the positional argument.
fn resolve_query(cmd: &AskCommand) -> Result<String> {
    match (cmd.sample, &cmd.query) {
        (Some(n), _) => sample_question(n)
            .map(str::to_string)
            .ok_or_else(|| UnknownSample(n).into()),
        (None, Some(query)) => Ok(query.clone()),
        (None, None) => Ok(String::new()),
    }
}

/// Handles the ask command: one submission, summary on stdout.
fn handle_ask(cli: &Cli, cmd: &AskCommand) -> Result<()> {
    let query = resolve_query(cmd)?;

    let config = build_config(cli)?;
    let mut session = Session::open(&config)?;

    let mut reporter = StderrReporter;
    let summary = session.submit(&query, !cmd.no_search, &mut reporter);
    session.close();
    let summary = summary?;

    let output = if cmd.raw {
        summary.text
    } else if cmd.html {
        summary.formatted.to_html()
    } else {
        summary.formatted.to_markdown()
    };
    println!("{output}");

    Ok(())
}

fn handle_samples() {
    for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
        println!("{}. {question}", i + 1);
    }
}

fn handle_doctor(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;
    if !doctor::run_health_checks(&config)? {
        anyhow::bail!("One or more health checks failed");
    }
    Ok(())
}

/// Prints notices to stderr as they arrive.
struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, notice: Notice) {
        let label = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{label}] {notice}");
    }
}
