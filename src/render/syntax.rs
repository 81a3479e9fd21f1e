//! Structural checks run before the backend sees the source.
//!
//! The backend lays out whatever it is given, so malformed input would
//! otherwise render as a stray box instead of an error.

use std::sync::LazyLock;

use regex::Regex;

use super::RenderError;

const DIAGRAM_TYPES: &[&str] = &[
    "graph",
    "flowchart",
    "flowchart-v2",
    "sequenceDiagram",
    "classDiagram",
    "classDiagram-v2",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "gantt",
    "pie",
    "journey",
    "gitGraph",
    "gitgraph",
    "mindmap",
    "timeline",
    "quadrantChart",
];

const DIRECTIONS: &[&str] = &["TD", "TB", "BT", "LR", "RL"];

static TRAILING_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<arrow>[<ox]?(?:-{2,}|={2,}|-\.+-)[>ox]?)\s*(?:\|[^|]*\|)?$").unwrap()
});

static LEADING_ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<arrow><?(?:-{2,}|={2,}|-\.+-)[>ox]?)").unwrap());

/// Reject source with no recognizable diagram header, or a flowchart edge
/// missing one of its endpoints.
///
/// # Errors
///
/// Returns [`RenderError::Syntax`] naming the offending line.
pub fn check(source: &str) -> Result<(), RenderError> {
    let mut lines = statements(source);
    let Some((header_line, header)) = lines.next() else {
        return Err(RenderError::syntax("No diagram definition found"));
    };

    let mut words = header.split_whitespace();
    let kind = words.next().unwrap_or_default().trim_end_matches(':');
    if !DIAGRAM_TYPES.contains(&kind) {
        let snippet: String = header.chars().take(40).collect();
        return Err(RenderError::syntax(format!(
            "No diagram type detected for \"{snippet}\""
        )));
    }
    if !matches!(kind, "graph" | "flowchart" | "flowchart-v2") {
        return Ok(());
    }

    if let Some(direction) = words.next()
        && !DIRECTIONS.contains(&direction)
    {
        return Err(RenderError::syntax(format!(
            "Parse error on line {header_line}: unknown direction '{direction}'"
        )));
    }

    lines.try_for_each(|(number, statement)| check_edge(number, statement))
}

fn check_edge(number: usize, statement: &str) -> Result<(), RenderError> {
    if let Some(caps) = LEADING_ARROW.captures(statement) {
        return Err(RenderError::syntax(format!(
            "Parse error on line {number}: expected a node before '{}'",
            &caps["arrow"]
        )));
    }
    if let Some(caps) = TRAILING_ARROW.captures(statement) {
        return Err(RenderError::syntax(format!(
            "Parse error on line {number}: expected a node after '{}'",
            &caps["arrow"]
        )));
    }
    Ok(())
}

/// Non-empty `;`-separated statements with their 1-based line numbers,
/// skipping front matter and `%%` comments.
fn statements(source: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut in_front_matter = false;
    let mut seen_content = false;
    source
        .lines()
        .enumerate()
        .filter(move |(_, line)| {
            let trimmed = line.trim();
            if trimmed == "---" && (in_front_matter || !seen_content) {
                in_front_matter = !in_front_matter;
                seen_content = true;
                return false;
            }
            if in_front_matter || trimmed.is_empty() || trimmed.starts_with("%%") {
                return false;
            }
            seen_content = true;
            true
        })
        .flat_map(|(index, line)| {
            line.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(move |s| (index + 1, s))
        })
}
