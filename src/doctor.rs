//! Health checks for newsum.
//!
//! Provides the `doctor` command functionality:
//! - API key presence (value never printed)
//! - Search provider reachability with a probe query
//! - Model endpoint reachability and the models it serves

use anyhow::Result;

use crate::config::Config;
use crate::search::SearchClient;

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Query used to probe the search provider.
pub const PROBE_QUERY: &str = "news";

/// Health status for a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Component is healthy
    Ok,
    /// Component has a warning but is functional
    Warning(String),
    /// Component is not functional
    Error(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, HealthStatus::Error(_))
    }
}

/// Search provider health information.
#[derive(Debug)]
pub struct SearchHealth {
    pub status: HealthStatus,
    pub provider: String,
    pub results: usize,
}

/// Model endpoint health information.
#[derive(Debug)]
pub struct ModelHealth {
    pub status: HealthStatus,
    pub base_url: String,
    pub model: String,
    pub models: Vec<String>,
}

/// Collected results of all checks.
#[derive(Debug)]
pub struct HealthReport {
    pub api_key: HealthStatus,
    pub search: SearchHealth,
    pub model: ModelHealth,
}

impl HealthReport {
    /// Returns true if no check failed outright.
    pub fn is_healthy(&self) -> bool {
        !self.api_key.is_error() && !self.search.status.is_error() && !self.model.status.is_error()
    }
}

// ============================================================================
// Health Check Functions
// ============================================================================

/// Performs all health checks and prints results.
///
/// Returns whether every check passed without errors.
pub fn run_health_checks(config: &Config) -> Result<bool> {
    let api_key = check_api_key(config);

    let search = match config.search_client() {
        Ok(client) => check_search_health(&client),
        Err(e) => SearchHealth {
            status: HealthStatus::Error(format!("Failed to build client: {e}")),
            provider: String::new(),
            results: 0,
        },
    };

    let model = check_model_health(config);

    let report = HealthReport {
        api_key,
        search,
        model,
    };
    print_health_report(&report);

    Ok(report.is_healthy())
}

fn check_api_key(config: &Config) -> HealthStatus {
    if config.has_api_key() {
        HealthStatus::Ok
    } else {
        HealthStatus::Error("Not set (use --api-key or SUTRA_API_KEY)".to_string())
    }
}

/// Runs the probe query through `client`.
pub fn check_search_health(client: &SearchClient) -> SearchHealth {
    let provider = client.provider_name().to_string();

    match client.search(PROBE_QUERY) {
        Ok(records) if records.is_empty() => SearchHealth {
            status: HealthStatus::Warning("No results returned".to_string()),
            provider,
            results: 0,
        },
        Ok(records) => SearchHealth {
            status: HealthStatus::Ok,
            provider,
            results: records.len(),
        },
        Err(e) => SearchHealth {
            status: HealthStatus::Error(format!("Search failed: {e}")),
            provider,
            results: 0,
        },
    }
}

/// Lists the models served by the configured endpoint.
///
/// No request is made without an API key.
pub fn check_model_health(config: &Config) -> ModelHealth {
    let base_url = config.base_url.clone();
    let model = config.model.clone();

    let client = match config.model_client_builder().build() {
        Ok(c) => c,
        Err(e) => {
            return ModelHealth {
                status: HealthStatus::Error(format!("Failed to build client: {e}")),
                base_url,
                model,
                models: Vec::new(),
            };
        }
    };

    match client.list_models() {
        Ok(models) => {
            let status = if models.is_empty() {
                HealthStatus::Warning("No models listed".to_string())
            } else if !models.iter().any(|m| m == &model) {
                HealthStatus::Warning(format!("Model '{model}' not listed by endpoint"))
            } else {
                HealthStatus::Ok
            };
            ModelHealth {
                status,
                base_url,
                model,
                models,
            }
        }
        Err(e) => ModelHealth {
            status: HealthStatus::Error(format!("Connection failed: {e}")),
            base_url,
            model,
            models: Vec::new(),
        },
    }
}

// ============================================================================
// Pretty Printing
// ============================================================================

fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "\u{2713}",
        HealthStatus::Warning(_) => "!",
        HealthStatus::Error(_) => "\u{2717}",
    }
}

fn status_color(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => GREEN,
        HealthStatus::Warning(_) => YELLOW,
        HealthStatus::Error(_) => RED,
    }
}

fn status_text(status: &HealthStatus, ok_text: &str) -> String {
    match status {
        HealthStatus::Ok => ok_text.to_string(),
        HealthStatus::Warning(w) => w.clone(),
        HealthStatus::Error(e) => e.clone(),
    }
}

fn models_display(models: &[String]) -> String {
    if models.len() > 3 {
        format!("{}, ... ({} more)", models[..3].join(", "), models.len() - 3)
    } else {
        models.join(", ")
    }
}

fn print_health_report(report: &HealthReport) {
    println!("{}newsum doctor{}", BOLD, RESET);
    println!();

    println!("{}API key{}", BOLD, RESET);
    println!(
        "  {}{}{} {}",
        status_color(&report.api_key),
        status_symbol(&report.api_key),
        RESET,
        status_text(&report.api_key, "Configured")
    );
    println!();

    let search = &report.search;
    println!("{}Search{}", BOLD, RESET);
    println!(
        "  {}{}{} Status: {}",
        status_color(&search.status),
        status_symbol(&search.status),
        RESET,
        status_text(&search.status, &format!("{} results", search.results))
    );
    if !search.provider.is_empty() {
        println!("    {}Provider: {}{}", DIM, search.provider, RESET);
    }
    println!("    {}Probe: \"{}\"{}", DIM, PROBE_QUERY, RESET);
    println!();

    let model = &report.model;
    println!("{}Model{}", BOLD, RESET);
    println!(
        "  {}{}{} Status: {}",
        status_color(&model.status),
        status_symbol(&model.status),
        RESET,
        status_text(&model.status, "Connected")
    );
    println!("    {}URL: {}{}", DIM, model.base_url, RESET);
    println!("    {}Model: {}{}", DIM, model.model, RESET);
    if !model.models.is_empty() {
        println!("    {}Available: {}{}", DIM, models_display(&model.models), RESET);
    }
}
