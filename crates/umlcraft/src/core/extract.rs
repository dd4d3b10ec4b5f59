//! Pulls diagram source out of free-form provider output
//!
//! Providers usually answer with prose around a fenced block. Only the first
//! block tagged with the diagram language is used. When there is none the
//! whole response is passed through trimmed, and the render step decides
//! whether it is usable.

use tracing::{debug, trace};

const FENCE: &str = "```";

/// Extracts the first fenced block for one language tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseExtractor {
    language: String,
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new("mermaid")
    }
}

impl ResponseExtractor {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Return the trimmed interior of the first fenced block, or the trimmed
    /// input when no complete block exists. Never fails.
    pub fn extract(&self, raw: &str) -> String {
        match self.find_block(raw) {
            Some(body) => {
                debug!(language = %self.language, len = body.len(), "Extracted fenced block");
                body.trim().to_string()
            }
            None => {
                debug!(language = %self.language, "No fenced block, passing response through");
                raw.trim().to_string()
            }
        }
    }

    fn find_block<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let opener = format!("{}{}", FENCE, self.language);
        let start = raw.find(&opener)? + opener.len();
        let rest = &raw[start..];
        let body_start = rest.len() - rest.trim_start().len();
        let body = &rest[body_start..];
        let end = body.find(FENCE)?;
        trace!(start, end, "Located fence boundaries");
        Some(&body[..end])
    }
}

/// Extract mermaid source using the default extractor
pub fn extract(raw: &str) -> String {
    ResponseExtractor::default().extract(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_fenced_block() {
        assert_eq!(extract("prefix ```mermaid\nA-->B\n``` suffix"), "A-->B");
    }

    #[test]
    fn test_passthrough_without_fence() {
        assert_eq!(extract("no fenced block here"), "no fenced block here");
    }

    #[test]
    fn test_passthrough_is_trimmed() {
        assert_eq!(extract("  \n graph TD; A-->B \n"), "graph TD; A-->B");
    }

    #[test]
    fn test_only_first_block_is_used() {
        let raw = "```mermaid\nfirst\n```\ntext\n```mermaid\nsecond\n```";
        assert_eq!(extract(raw), "first");
    }

    #[test]
    fn test_other_language_fence_is_ignored() {
        let raw = "```json\n{}\n```\n```mermaid\nclassDiagram\n```";
        assert_eq!(extract(raw), "classDiagram");
    }

    #[test]
    fn test_unterminated_fence_falls_back() {
        let raw = "```mermaid\ngraph TD; A-->B";
        assert_eq!(extract(raw), raw);
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(extract("```mermaid\n```"), "");
    }

    #[test]
    fn test_custom_language() {
        let extractor = ResponseExtractor::new("plantuml");
        assert_eq!(extractor.extract("```plantuml\n@startuml\n```"), "@startuml");
        assert_eq!(extractor.language(), "plantuml");
    }
}
