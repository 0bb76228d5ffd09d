//! Atlassian Document Format helpers.
//!
//! Only plain text survives a round trip: marks, mentions, lists and other
//! non-paragraph nodes are dropped when reading a document back.

use serde_json::{json, Value};

/// Wrap plain text in a one-paragraph, one-run document.
///
/// Empty or missing text maps to `None`, never to an empty document.
pub fn text_to_doc(text: Option<&str>) -> Option<Value> {
    let text = text.filter(|t| !t.is_empty())?;

    Some(json!({
        "type": "doc",
        "version": 1,
        "content": [
            {
                "type": "paragraph",
                "content": [
                    { "type": "text", "text": text }
                ]
            }
        ]
    }))
}

/// Flatten a document back to plain text.
///
/// Text runs inside a paragraph are concatenated, paragraphs are joined with
/// a newline, and paragraphs without text are skipped. Plain strings pass
/// through unchanged. Anything unrecognised yields `None`.
pub fn doc_to_text(doc: &Value) -> Option<String> {
    match doc {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("doc") => {
            let blocks = map.get("content")?.as_array()?;
            let text = blocks
                .iter()
                .filter_map(paragraph_text)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

fn paragraph_text(block: &Value) -> Option<String> {
    if block.get("type").and_then(Value::as_str) != Some("paragraph") {
        return None;
    }

    let runs = block.get("content")?.as_array()?;
    Some(
        runs.iter()
            .filter(|run| run.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .collect::<String>(),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_empty_text_has_no_document() {
        assert_eq!(text_to_doc(None), None);
        assert_eq!(text_to_doc(Some("")), None);
    }

    #[test]
    fn test_single_line_round_trip() {
        for s in ["hello", "Implement feature X", "  padded  ", "ünïcödé ✓"] {
            let doc = text_to_doc(Some(s)).unwrap();
            assert_eq!(doc_to_text(&doc).as_deref(), Some(s));
        }
    }

    #[test]
    fn test_document_shape() {
        let doc = text_to_doc(Some("body")).unwrap();
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["version"], 1);
        assert_eq!(doc["content"][0]["type"], "paragraph");
        assert_eq!(doc["content"][0]["content"][0]["text"], "body");
    }

    #[test]
    fn test_multiple_runs_and_paragraphs() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "Hello "},
                    {"type": "text", "text": "world", "marks": [{"type": "strong"}]},
                    {"type": "hardBreak"}
                ]},
                {"type": "bulletList", "content": []},
                {"type": "paragraph", "content": []},
                {"type": "paragraph", "content": [{"type": "text", "text": "Second"}]}
            ]
        });
        assert_eq!(doc_to_text(&doc).as_deref(), Some("Hello world\nSecond"));
    }

    #[test]
    fn test_plain_string_passes_through() {
        assert_eq!(doc_to_text(&json!("legacy text")).as_deref(), Some("legacy text"));
    }

    #[test]
    fn test_malformed_documents() {
        assert_eq!(doc_to_text(&Value::Null), None);
        assert_eq!(doc_to_text(&json!("")), None);
        assert_eq!(doc_to_text(&json!(42)), None);
        assert_eq!(doc_to_text(&json!({"type": "doc"})), None);
        assert_eq!(doc_to_text(&json!({"type": "doc", "content": "nope"})), None);
        assert_eq!(doc_to_text(&json!({"type": "panel", "content": []})), None);
        assert_eq!(doc_to_text(&json!({"type": "doc", "content": []})), None);
    }
}
