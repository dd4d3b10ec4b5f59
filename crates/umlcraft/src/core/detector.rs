//! Mermaid diagram kind detection
//!
//! Identifies which Mermaid diagram family a source string belongs to from
//! its header keyword, with a weaker fallback on body patterns. Detection is
//! informational: it labels artifacts and the CLI `detect` command, and is
//! never used to reject a source.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

/// Mermaid diagram families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelationship,
    GitGraph,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 6] = [
        DiagramKind::Flowchart,
        DiagramKind::Sequence,
        DiagramKind::Class,
        DiagramKind::State,
        DiagramKind::EntityRelationship,
        DiagramKind::GitGraph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequence",
            DiagramKind::Class => "class",
            DiagramKind::State => "state",
            DiagramKind::EntityRelationship => "er",
            DiagramKind::GitGraph => "gitgraph",
        }
    }

    /// Header keywords, lowercased
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            DiagramKind::Flowchart => &["graph", "flowchart"],
            DiagramKind::Sequence => &["sequencediagram"],
            DiagramKind::Class => &["classdiagram"],
            DiagramKind::State => &["statediagram-v2", "statediagram"],
            DiagramKind::EntityRelationship => &["erdiagram"],
            DiagramKind::GitGraph => &["gitgraph"],
        }
    }

    /// Body patterns that hint at this kind without a header
    fn body_patterns(&self) -> &'static [&'static str] {
        match self {
            DiagramKind::Flowchart => &["-->", "---", "==>"],
            DiagramKind::Sequence => &["->>", "-->>", "participant "],
            DiagramKind::Class => &["<|--", "class "],
            DiagramKind::State => &["[*]"],
            DiagramKind::EntityRelationship => &["||--o{", "}o--||", "||--|{"],
            DiagramKind::GitGraph => &["commit", "branch "],
        }
    }

    /// Confidence (0.0 to 1.0) that `source` belongs to this kind
    pub fn confidence(&self, source: &str) -> f64 {
        if let Some(header) = header_line(source) {
            let header = header.to_lowercase();
            let first_word = header.split_whitespace().next().unwrap_or("");
            if self.keywords().contains(&first_word) {
                return 1.0;
            }
        }

        let hits = self
            .body_patterns()
            .iter()
            .filter(|pattern| source.contains(*pattern))
            .count();
        match hits {
            0 => 0.0,
            1 => 0.4,
            _ => 0.6,
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First meaningful line, skipping blank lines, `%%` comments and a `---`
/// front-matter block
fn header_line(source: &str) -> Option<&str> {
    let mut in_front_matter = false;
    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line == "---" && (index == 0 || in_front_matter) {
            in_front_matter = !in_front_matter;
            continue;
        }
        if in_front_matter || line.is_empty() || line.starts_with("%%") {
            continue;
        }
        return Some(line);
    }
    None
}

/// Detect the diagram kind of a mermaid source
pub fn detect(source: &str) -> Option<DiagramKind> {
    let mut best: Option<(DiagramKind, f64)> = None;
    for kind in DiagramKind::ALL {
        let confidence = kind.confidence(source);
        trace!(kind = %kind, confidence, "Checking diagram kind");
        if confidence > 0.5 && best.map_or(true, |(_, score)| confidence > score) {
            best = Some((kind, confidence));
        }
    }

    match best {
        Some((kind, confidence)) => {
            debug!(kind = %kind, confidence, "Detected diagram kind");
            Some(kind)
        }
        None => {
            debug!("No diagram kind detected");
            None
        }
    }
}
