//! Text extractor traits and registry used to enrich page records.

mod html;

pub use html::HtmlExtractor;

use crate::classify::is_html;
use crate::error::Result;

/// Hint provided to extractors before probing/extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractHint<'a> {
    pub mime: Option<&'a str>,
    pub uri: Option<&'a str>,
}

impl<'a> ExtractHint<'a> {
    #[must_use]
    pub fn new(mime: Option<&'a str>) -> Self {
        Self { mime, uri: None }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: Option<&'a str>) -> Self {
        self.uri = uri;
        self
    }

    #[must_use]
    pub fn is_html(&self) -> bool {
        self.mime.is_some_and(is_html)
    }
}

/// Title and body text recovered from one captured document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub title: Option<String>,
    pub text: Option<String>,
}

impl ExtractedText {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none()
    }
}

/// Extracted text plus the name of the extractor that produced it.
#[derive(Debug, Clone)]
pub struct ExtractorOutput {
    pub extracted: ExtractedText,
    pub extractor_name: String,
    pub warnings: Vec<String>,
}

impl ExtractorOutput {
    #[must_use]
    pub fn new(extracted: ExtractedText, extractor_name: impl Into<String>) -> Self {
        Self {
            extracted,
            extractor_name: extractor_name.into(),
            warnings: Vec::new(),
        }
    }

    pub fn record_warning<S: Into<String>>(&mut self, warning: S) {
        self.warnings.push(warning.into());
    }
}

/// Trait implemented by extractors that turn a captured body into page text.
pub trait TextExtractor: Send + Sync {
    /// Human-readable name used for diagnostics.
    fn name(&self) -> &'static str;

    /// Return true if this extractor is a good match for the provided hint.
    fn supports(&self, hint: &ExtractHint<'_>) -> bool;

    /// Extract title and text from the decoded body bytes.
    fn extract(&self, bytes: &[u8], hint: &ExtractHint<'_>) -> Result<ExtractorOutput>;
}

/// Ordered set of extractors; the first one that supports a hint wins.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    pub fn register<E>(&mut self, extractor: E)
    where
        E: TextExtractor + 'static,
    {
        self.extractors.push(Box::new(extractor));
    }

    #[must_use]
    pub fn extractors(&self) -> &[Box<dyn TextExtractor>] {
        &self.extractors
    }

    pub fn find_extractor<'a>(&'a self, hint: &ExtractHint<'_>) -> Option<&'a dyn TextExtractor> {
        self.extractors
            .iter()
            .map(std::convert::AsRef::as_ref)
            .find(|extractor| extractor.supports(hint))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(HtmlExtractor);
        registry
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|extractor| extractor.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_routes_html_only() {
        let registry = ExtractorRegistry::default();
        let html = ExtractHint::new(Some("text/html"));
        assert_eq!(registry.find_extractor(&html).map(|e| e.name()), Some("html"));
        assert!(registry.find_extractor(&ExtractHint::new(Some("text/css"))).is_none());
        assert!(registry.find_extractor(&ExtractHint::default()).is_none());
    }
}
