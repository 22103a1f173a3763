//! HTML-to-structured-data extraction for the portal's pages.
//!
//! The markup belongs to the portal, not to us, and drifts. Every extractor
//! therefore fails soft: a missing fieldset, table, or mismatched row count
//! degrades to an empty/partial result plus a diagnostic, and the caller
//! decides what to do with degraded data. Parsing is split from fetching so
//! the parsers can be tested on fixture HTML without a session.

pub mod curriculum;
pub mod enrollment;
pub mod offerings;

use tracing::warn;

/// Extraction result: the data that could be recovered, plus a note for
/// every piece of expected structure that was missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub data: T,
    pub diagnostics: Vec<String>,
}

impl<T> Extracted<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            diagnostics: Vec::new(),
        }
    }

    pub fn diag(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    /// Emits all diagnostics through tracing and returns self.
    ///
    /// Used by the fetch wrappers; the parsers themselves never log.
    pub(crate) fn logged(self, page: &str) -> Self {
        for diagnostic in &self.diagnostics {
            warn!(page, "{diagnostic}");
        }
        self
    }
}
