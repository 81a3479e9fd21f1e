//! Token highlighting for Mermaid source in the editor pane.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Diagram type headers and statement keywords.
    Keyword,
    /// Edge and message arrows.
    Arrow,
    String,
    /// `%%` line comments.
    Comment,
    /// Bracketed node text and `|edge|` labels.
    Label,
    Text,
}

/// A classified byte range of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub range: Range<usize>,
    pub kind: TokenKind,
}

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?P<comment>%%.*)"#,
        r#"|(?P<string>"[^"]*"?)"#,
        r#"|(?P<arrow>[<}|ox*]*(?:-{2,}|={2,}|\.{2,}|-\.+-)(?:\|\{|o\{|\|>|>>|[>)xo*])?|-(?:>>?|\)))"#,
        r#"|(?P<label>\[[^\]]*\]|\{[^}]*\}|\([^)]*\)|\|[^|]*\|)"#,
        r#"|(?P<word>[A-Za-z_]\w*(?:-\w+)*)"#,
    ))
    .unwrap()
});

const KEYWORDS: &[&str] = &[
    // diagram headers
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
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
    // directions
    "TD",
    "TB",
    "BT",
    "LR",
    "RL",
    // statements
    "participant",
    "actor",
    "loop",
    "alt",
    "else",
    "opt",
    "par",
    "and",
    "end",
    "note",
    "Note",
    "over",
    "title",
    "section",
    "class",
    "classDef",
    "state",
    "subgraph",
    "direction",
    "style",
    "linkStyle",
    "click",
    "dateFormat",
    "axisFormat",
    "commit",
    "branch",
    "checkout",
    "merge",
    "x-axis",
    "y-axis",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
        || word
            .strip_prefix("quadrant-")
            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
}

/// Split `line` into tokens that cover it end to end.
pub fn highlight_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let push = |tokens: &mut Vec<Token>, range: Range<usize>, kind: TokenKind| {
        if range.is_empty() {
            return;
        }
        match tokens.last_mut() {
            Some(last) if last.kind == kind && last.range.end == range.start => {
                last.range.end = range.end;
            }
            _ => tokens.push(Token { range, kind }),
        }
    };

    for caps in TOKEN_PATTERN.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        push(&mut tokens, pos..whole.start(), TokenKind::Text);
        let kind = if caps.name("comment").is_some() {
            TokenKind::Comment
        } else if caps.name("string").is_some() {
            TokenKind::String
        } else if caps.name("arrow").is_some() {
            TokenKind::Arrow
        } else if caps.name("label").is_some() {
            TokenKind::Label
        } else if is_keyword(whole.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Text
        };
        push(&mut tokens, whole.range(), kind);
        pos = whole.end();
    }
    push(&mut tokens, pos..line.len(), TokenKind::Text);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<(&str, TokenKind)> {
        highlight_line(line)
            .into_iter()
            .map(|t| (&line[t.range], t.kind))
            .collect()
    }

    #[test]
    fn test_header_and_direction_are_keywords() {
        assert_eq!(
            kinds("graph TD"),
            vec![
                ("graph", TokenKind::Keyword),
                (" ", TokenKind::Text),
                ("TD", TokenKind::Keyword),
            ]
        );
    }

    #[test]
    fn test_flowchart_edge_with_label() {
        assert_eq!(
            kinds("    B -->|Yes| C[OK]"),
            vec![
                ("    B ", TokenKind::Text),
                ("-->", TokenKind::Arrow),
                ("|Yes|", TokenKind::Label),
                (" C", TokenKind::Text),
                ("[OK]", TokenKind::Label),
            ]
        );
    }

    #[test]
    fn test_sequence_arrows() {
        let tokens = kinds("Alice->>John: Hello");
        assert!(tokens.contains(&("->>", TokenKind::Arrow)));
        let tokens = kinds("John-->>Alice: Great!");
        assert!(tokens.contains(&("-->>", TokenKind::Arrow)));
    }

    #[test]
    fn test_er_and_class_relations() {
        assert!(kinds("CUSTOMER ||--o{ ORDER : places").contains(&("||--o{", TokenKind::Arrow)));
        assert!(kinds("CUSTOMER }|..|{ ADDR : uses").contains(&("}|..|{", TokenKind::Arrow)));
        assert!(kinds("Animal <|-- Duck").contains(&("<|--", TokenKind::Arrow)));
    }

    #[test]
    fn test_hyphenated_words_are_not_arrows() {
        assert_eq!(
            kinds("stateDiagram-v2"),
            vec![("stateDiagram-v2", TokenKind::Keyword)]
        );
        assert!(!kinds("LINE-ITEM").iter().any(|(_, k)| *k == TokenKind::Arrow));
        assert_eq!(kinds("quadrant-1 We")[0], ("quadrant-1", TokenKind::Keyword));
    }

    #[test]
    fn test_strings_and_comments() {
        assert_eq!(
            kinds(r#""Dogs" : 386 %% note"#),
            vec![
                (r#""Dogs""#, TokenKind::String),
                (" : 386 ", TokenKind::Text),
                ("%% note", TokenKind::Comment),
            ]
        );
    }

    #[test]
    fn test_tokens_cover_line() {
        for line in ["", "   ", "A[Start] --> B{Is it?}", "Note right of John: <br/>ok"] {
            let tokens = highlight_line(line);
            let mut pos = 0;
            for token in &tokens {
                assert_eq!(token.range.start, pos);
                pos = token.range.end;
            }
            assert_eq!(pos, line.len());
        }
    }
}
