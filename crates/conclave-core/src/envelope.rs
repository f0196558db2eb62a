//! Tool-result shape normalization (spec.md §4.8).
//!
//! Tool servers speak several dialects of "JSON result": a structured
//! object, an MCP-style `[{"text": "<json>"}]` content list, a bare JSON
//! string, or a Python-repr-looking string (single-quoted, `True`/`False`/
//! `None`). `normalize` recognizes each and always returns an object,
//! falling back to `{"raw": <original string>}` when nothing parses.

use serde_json::{Map, Value};

/// Normalize an arbitrary tool-result `Value` into an object. Pure: same
/// input always yields the same output, no I/O.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(_) => value.clone(),
        Value::Array(items) => normalize_content_list(items).unwrap_or_else(|| wrap_raw(value)),
        Value::String(s) => normalize_string(s),
        other => wrap_raw(other),
    }
}

/// MCP content lists look like `[{"text": "<json or plain text>"}]`. Only
/// the first element is inspected, matching the single-result tool calls
/// this control plane issues.
fn normalize_content_list(items: &[Value]) -> Option<Value> {
    let first = items.first()?;
    let text = first.get("text")?.as_str()?;
    Some(normalize_string(text))
}

fn normalize_string(s: &str) -> Value {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return wrap_raw_str(s);
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
        return match parsed {
            Value::Object(_) => parsed,
            other => wrap_value(other),
        };
    }
    if let Some(parsed) = parse_python_literal(trimmed) {
        return parsed;
    }
    wrap_raw_str(s)
}

/// Best-effort translation of a Python-repr-looking dict/list string
/// (`'key'` instead of `"key"`, `True`/`False`/`None`) into JSON, by
/// rewriting the literal tokens and re-parsing as JSON. Never panics;
/// falls back to `None` when the rewrite still doesn't parse.
fn parse_python_literal(s: &str) -> Option<Value> {
    if !(s.starts_with('{') || s.starts_with('[')) {
        return None;
    }
    let rewritten = python_literal_to_json(s);
    match serde_json::from_str::<Value>(&rewritten) {
        Ok(parsed @ Value::Object(_)) => Some(parsed),
        Ok(other) => Some(wrap_value(other)),
        Err(_) => None,
    }
}

fn python_literal_to_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            if c == '\'' {
                in_string = false;
                out.push('"');
            } else if c == '"' {
                out.push('\\');
                out.push('"');
            } else {
                out.push(c);
            }
            continue;
        }

        match c {
            '\'' => {
                in_string = true;
                out.push('"');
            }
            'T' if consume_keyword(&mut chars, "rue") => out.push_str("true"),
            'F' if consume_keyword(&mut chars, "alse") => out.push_str("false"),
            'N' if consume_keyword(&mut chars, "one") => out.push_str("null"),
            _ => out.push(c),
        }
    }
    out
}

/// If the next characters in `chars` spell out `rest`, consume them and
/// return true; otherwise leave `chars` untouched.
fn consume_keyword(chars: &mut std::iter::Peekable<std::str::Chars>, rest: &str) -> bool {
    let mut lookahead = chars.clone();
    for expected in rest.chars() {
        if lookahead.next() != Some(expected) {
            return false;
        }
    }
    for _ in rest.chars() {
        chars.next();
    }
    true
}

fn wrap_raw(value: &Value) -> Value {
    wrap_value(value.clone())
}

fn wrap_raw_str(s: &str) -> Value {
    let mut map = Map::new();
    map.insert("raw".to_string(), Value::String(s.to_string()));
    Value::Object(map)
}

fn wrap_value(value: Value) -> Value {
    let mut map = Map::new();
    map.insert("raw".to_string(), value);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn passes_through_a_plain_object() {
        let value = json!({"status": "success", "data": {"n": 1}});
        assert_eq!(normalize(&value), value);
    }

    #[test]
    fn unwraps_mcp_content_list_with_json_text() {
        let value = json!([{"text": "{\"status\":\"success\",\"data\":{\"n\":1}}"}]);
        let normalized = normalize(&value);
        assert_eq!(normalized, json!({"status": "success", "data": {"n": 1}}));
    }

    #[test]
    fn parses_a_bare_json_string() {
        let value = json!("{\"ok\": true}");
        assert_eq!(normalize(&value), json!({"ok": true}));
    }

    #[test]
    fn parses_a_python_literal_looking_string() {
        let value = json!("{'status': 'success', 'n': True, 'missing': None}");
        let normalized = normalize(&value);
        assert_eq!(normalized["status"], json!("success"));
        assert_eq!(normalized["n"], json!(true));
        assert_eq!(normalized["missing"], json!(null));
    }

    #[test]
    fn falls_back_to_raw_for_non_json_string() {
        let value = json!("not json at all");
        assert_eq!(normalize(&value), json!({"raw": "not json at all"}));
    }

    #[test]
    fn falls_back_to_raw_for_empty_string() {
        let value = json!("");
        assert_eq!(normalize(&value), json!({"raw": ""}));
    }

    #[test]
    fn wraps_a_bare_json_array_as_raw() {
        let value = json!([1, 2, 3]);
        assert_eq!(normalize(&value), json!({"raw": [1, 2, 3]}));
    }
}
