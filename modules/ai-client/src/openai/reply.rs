//! Reply-shape normalization.
//!
//! Backends answer in several shapes. Each adapter inspects one shape and
//! returns the text it finds, or `None`; the first adapter with a match wins.

use serde_json::Value;

type ReplyAdapter = fn(&Value) -> Option<String>;

/// Adapters in priority order.
const ADAPTERS: [ReplyAdapter; 3] = [direct_output_text, output_segments, legacy_choices];

/// Collapse a raw reply into plain text. Returns `""` when nothing usable is found.
pub fn reply_text(reply: &Value) -> String {
    ADAPTERS
        .iter()
        .find_map(|adapter| adapter(reply))
        .unwrap_or_default()
}

/// `{"output_text": "..."}`
fn direct_output_text(reply: &Value) -> Option<String> {
    reply
        .get("output_text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// `{"output": [{"content": [{"type": "output_text", "text": "..."}]}]}`
fn output_segments(reply: &Value) -> Option<String> {
    let items = reply.get("output")?.as_array()?;
    let text: String = items
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter_map(segment_text)
        .collect();
    (!text.is_empty()).then_some(text)
}

/// `{"choices": [{"message": {"content": "..."}}]}`, content may also be a segment list.
fn legacy_choices(reply: &Value) -> Option<String> {
    let content = reply
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?;

    let text = match content {
        Value::String(text) => text.clone(),
        Value::Array(segments) => segments.iter().filter_map(segment_text).collect(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn segment_text(segment: &Value) -> Option<&str> {
    match segment.get("type").and_then(Value::as_str) {
        None | Some("output_text") | Some("text") => segment.get("text")?.as_str(),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_text_field() {
        assert_eq!(reply_text(&json!({"output_text": "{\"a\":1}"})), "{\"a\":1}");
    }

    #[test]
    fn nested_segments_are_concatenated() {
        let reply = json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"nodes\":"},
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "[]}"}
                ]}
            ]
        });
        assert_eq!(reply_text(&reply), "{\"nodes\":[]}");
    }

    #[test]
    fn legacy_choice_message() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]});
        assert_eq!(reply_text(&reply), "hi");

        let segmented = json!({"choices": [{"message": {"content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]}}]});
        assert_eq!(reply_text(&segmented), "ab");
    }

    #[test]
    fn direct_field_wins_over_segments() {
        let reply = json!({
            "output_text": "direct",
            "output": [{"content": [{"type": "output_text", "text": "nested"}]}]
        });
        assert_eq!(reply_text(&reply), "direct");
    }

    #[test]
    fn empty_direct_field_falls_through() {
        let reply = json!({
            "output_text": "",
            "output": [{"content": [{"type": "output_text", "text": "nested"}]}]
        });
        assert_eq!(reply_text(&reply), "nested");
    }

    #[test]
    fn unknown_shape_yields_empty_string() {
        assert_eq!(reply_text(&json!({"id": "resp_1", "status": "incomplete"})), "");
        assert_eq!(reply_text(&json!(null)), "");
    }
}
