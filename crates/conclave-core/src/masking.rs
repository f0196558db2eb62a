//! Secret-safe redaction for audit logs, ported from
//! `original_source/GitHub-Multi-Agent/shared/audit.py::_mask_value`.

use serde_json::Value;

/// Recursively mask string values longer than 8 characters to
/// `first3 + "***" + last2`, leaving everything else (numbers, bools,
/// short strings, structure) untouched.
pub fn mask_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), mask_value(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(mask_value).collect()),
        Value::String(s) if s.chars().count() > 8 => {
            let chars: Vec<char> = s.chars().collect();
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[chars.len() - 2..].iter().collect();
            Value::String(format!("{head}***{tail}"))
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_long_strings() {
        let masked = mask_value(&json!("ghp_abcdefghijklmnop"));
        assert_eq!(masked, json!("ghp***op"));
    }

    #[test]
    fn leaves_short_strings_alone() {
        let masked = mask_value(&json!("short"));
        assert_eq!(masked, json!("short"));
    }

    #[test]
    fn recurses_into_nested_structures() {
        let masked = mask_value(&json!({
            "token": "sk-1234567890abcdef",
            "count": 3,
            "nested": {"list": ["sk-1234567890abcdef", "ok"]},
        }));
        assert_eq!(masked["token"], json!("sk-***ef"));
        assert_eq!(masked["count"], json!(3));
        assert_eq!(masked["nested"]["list"][0], json!("sk-***ef"));
        assert_eq!(masked["nested"]["list"][1], json!("ok"));
    }

    #[test]
    fn boundary_length_of_eight_is_not_masked() {
        let masked = mask_value(&json!("12345678"));
        assert_eq!(masked, json!("12345678"));
    }
}
