use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, WaczError};
use crate::reader::{ExtractHint, ExtractedText, ExtractorOutput, TextExtractor};

/// Elements whose text never reaches the page text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Title and visible body text of an HTML document, built on `scraper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl TextExtractor for HtmlExtractor {
    fn name(&self) -> &'static str {
        "html"
    }

    fn supports(&self, hint: &ExtractHint<'_>) -> bool {
        hint.is_html()
    }

    fn extract(&self, bytes: &[u8], _hint: &ExtractHint<'_>) -> Result<ExtractorOutput> {
        if bytes.is_empty() {
            return Ok(ExtractorOutput::new(ExtractedText::default(), self.name()));
        }
        let source = std::str::from_utf8(bytes).map_err(|err| WaczError::ExtractionFailed {
            reason: format!("body is not UTF-8: {err}").into(),
        })?;
        let document = Html::parse_document(source);

        let title = document
            .select(&selector("title")?)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|title| !title.is_empty());

        let mut raw = String::new();
        if let Some(body) = document.select(&selector("body")?).next() {
            collect_text(body, &mut raw);
        }
        let text = Some(collapse_whitespace(&raw)).filter(|text| !text.is_empty());

        let mut output = ExtractorOutput::new(ExtractedText { title, text }, self.name());
        if !document.errors.is_empty() {
            output.record_warning(format!("{} HTML parse errors", document.errors.len()));
        }
        Ok(output)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| WaczError::ExtractionFailed {
        reason: format!("selector {css}: {err}").into(),
    })
}

/// Visible text under `root`, in document order. Walks with an explicit stack
/// so nesting depth is bounded by the heap, not the thread stack.
fn collect_text(root: ElementRef<'_>, out: &mut String) {
    let mut pending: Vec<_> = root.children().rev().collect();
    while let Some(node) = pending.pop() {
        match node.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(inner) if !SKIPPED_ELEMENTS.contains(&inner.name()) => {
                pending.extend(node.children().rev());
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
