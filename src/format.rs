//! Summary formatting for display.

/// Display-ready shape of an extracted summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedSummary {
    /// Text that looks like a numbered list; rendered as-is.
    NumberedList(String),
    /// Free text split on blank lines.
    Paragraphs(Vec<String>),
}

impl FormattedSummary {
    /// Classifies extracted text.
    ///
    /// Text containing both `1.` and `2.` is treated as a numbered list and
    /// left untouched; anything else is split into paragraphs on `\n\n`.
    pub fn from_text(text: &str) -> Self {
        if text.contains("1.") && text.contains("2.") {
            FormattedSummary::NumberedList(text.to_string())
        } else {
            FormattedSummary::Paragraphs(text.split("\n\n").map(str::to_string).collect())
        }
    }

    /// Renders as markdown, separating paragraphs with a blank line.
    pub fn to_markdown(&self) -> String {
        match self {
            FormattedSummary::NumberedList(text) => text.clone(),
            FormattedSummary::Paragraphs(paragraphs) => paragraphs
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// Renders as markdown with inline HTML, wrapping each paragraph in `<p>` tags.
    pub fn to_html(&self) -> String {
        match self {
            FormattedSummary::NumberedList(text) => text.clone(),
            FormattedSummary::Paragraphs(paragraphs) => paragraphs
                .iter()
                .map(|p| format!("<p>{p}</p>"))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// Returns true if the text was recognized as a numbered list.
    pub fn is_numbered_list(&self) -> bool {
        matches!(self, FormattedSummary::NumberedList(_))
    }
}
