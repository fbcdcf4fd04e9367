//! Query enrichment.
//!
//! Appends current-date context, and optionally search snippets, to a user's
//! news request before it is sent to the model.

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::search::SearchRecord;

/// Maximum number of search records embedded into an enriched query.
pub const MAX_SNIPPETS: usize = 3;

/// Returns today's local calendar date.
///
/// Falls back to UTC when the local offset cannot be determined (for example
/// in multi-threaded processes on some Unix platforms).
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Appends a date notice to the query.
///
/// # Examples
///
/// ```
/// use newsum::enricher::add_date_to_query;
/// use time::macros::date;
///
/// let enriched = add_date_to_query("Top headlines", date!(2024 - 03 - 09));
/// assert!(enriched.starts_with("Top headlines\n\n"));
/// assert!(enriched.contains("Today's date is 2024-03-09."));
/// ```
pub fn add_date_to_query(query: &str, date: Date) -> String {
    format!(
        "{query}\n\nToday's date is {}. Please provide the most up-to-date information available.",
        format_date(date)
    )
}

/// Builds a query that embeds up to [`MAX_SNIPPETS`] search records and a date stamp.
///
/// Records are numbered from 1 in provider order as `"{index}. {title}: {body}"`.
pub fn build_search_query(query: &str, records: &[SearchRecord], date: Date) -> String {
    let mut recent_info = String::from("\n\nRecent information from search results:\n");
    for (idx, record) in records.iter().take(MAX_SNIPPETS).enumerate() {
        recent_info.push_str(&format!("\n{}. {}: {}\n", idx + 1, record.title, record.body));
    }

    format!(
        "{query}\n\nUse this recent information to provide an up-to-date response: {recent_info}\n\nToday's date is {}",
        format_date(date)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn record(title: &str, body: &str) -> SearchRecord {
        SearchRecord::new(title, body)
    }

    #[test]
    fn format_date_pads_month_and_day() {
        assert_eq!(format_date(date!(2025 - 01 - 05)), "2025-01-05");
    }

    #[test]
    fn add_date_keeps_query_as_prefix() {
        let enriched = add_date_to_query("Summarize sports news", date!(2025 - 06 - 30));
        assert!(enriched.starts_with("Summarize sports news"));
        assert_eq!(
            enriched,
            "Summarize sports news\n\nToday's date is 2025-06-30. Please provide the most up-to-date information available."
        );
    }

    #[test]
    fn add_date_on_empty_query_still_adds_notice() {
        let enriched = add_date_to_query("", date!(2025 - 06 - 30));
        assert!(enriched.contains("2025-06-30"));
    }

    #[test]
    fn search_query_embeds_numbered_snippets() {
        let records = vec![record("A", "x"), record("B", "y")];
        let enriched = build_search_query("Summarize tech news", &records, date!(2025 - 02 - 14));

        assert!(enriched.starts_with("Summarize tech news"));
        assert!(enriched.contains("\n1. A: x\n"));
        assert!(enriched.contains("\n2. B: y\n"));
        assert!(!enriched.contains("3. "));
        assert!(enriched.ends_with("Today's date is 2025-02-14"));
    }

    #[test]
    fn search_query_uses_at_most_three_records() {
        let records: Vec<SearchRecord> = (1..=5)
            .map(|i| record(&format!("title{i}"), &format!("body{i}")))
            .collect();
        let enriched = build_search_query("q", &records, date!(2025 - 02 - 14));

        assert!(enriched.contains("3. title3: body3"));
        assert!(!enriched.contains("title4"));
        assert!(!enriched.contains("title5"));
    }

    #[test]
    fn search_query_with_no_records_has_header_only() {
        let enriched = build_search_query("q", &[], date!(2025 - 02 - 14));
        assert!(enriched.contains("Recent information from search results:"));
        assert!(!enriched.contains("1. "));
    }
}
