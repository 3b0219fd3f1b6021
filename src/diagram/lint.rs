//! Header lint for diagram sources.

use regex::Regex;

use crate::error::RenderError;

/// Diagram types the renderer understands.
const DIAGRAM_KEYWORDS: &[&str] = &[
    "flowchart",
    "graph",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram-v2",
    "stateDiagram",
    "erDiagram",
    "gantt",
    "pie",
    "journey",
    "mindmap",
    "timeline",
    "gitGraph",
    "quadrantChart",
];

/// Rejects sources whose first meaningful line is not a diagram declaration.
#[derive(Debug, Clone)]
pub struct DiagramLinter {
    header: Regex,
}

impl DiagramLinter {
    pub fn new() -> Self {
        let alternatives = DIAGRAM_KEYWORDS
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let header = Regex::new(&format!(r"^(?:{alternatives})(?:\s|$)")).unwrap();
        Self { header }
    }

    /// Ok when the source starts with a known diagram keyword.
    ///
    /// Blank lines, `%%` comments and `---` front matter are skipped.
    pub fn lint(&self, source: &str) -> Result<(), RenderError> {
        let mut in_front_matter = false;
        for (i, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line == "---" {
                in_front_matter = !in_front_matter;
                continue;
            }
            if in_front_matter || line.is_empty() || line.starts_with("%%") {
                continue;
            }
            if self.header.is_match(line) {
                return Ok(());
            }
            return Err(RenderError::Syntax(format!(
                "Line {}: expected a diagram type (e.g. flowchart, sequenceDiagram), found \"{}\"",
                i + 1,
                line
            )));
        }
        Err(RenderError::Syntax("Diagram source is empty".to_string()))
    }
}

impl Default for DiagramLinter {
    fn default() -> Self {
        Self::new()
    }
}
