//! Log domain types

use serde::{Deserialize, Serialize};

/// Substrings that point at a known fatal condition in runner output
pub const FATAL_MARKERS: &[&str] = &[
    "action error:",
    "download action tarball",
    "nested uses not yet supported",
];

/// A single line relayed from a unit's log stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// When the line was read from the stream
    pub observed_at: chrono::DateTime<chrono::Utc>,
    pub text: String,
}

impl LogLine {
    /// Creates a line observed now, stripping trailing whitespace and newlines
    pub fn observed(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self {
            observed_at: chrono::Utc::now(),
            text: text.trim_end().to_string(),
        }
    }

    /// Returns the trimmed text when the line contains a fatal marker
    ///
    /// This is an annotation only; the line is relayed either way.
    pub fn hint(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        FATAL_MARKERS
            .iter()
            .any(|marker| trimmed.contains(marker))
            .then_some(trimmed)
    }
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
