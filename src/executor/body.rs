use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use super::models::ResponseDataType;

/// Response media types returned to callers as base64 instead of decoded.
pub const BINARY_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/zip",
    "application/octet-stream",
];

/// Media type without parameters, lowercased.
pub fn media_type(content_type: Option<&str>) -> String {
    content_type
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub fn classify_body(bytes: &[u8], content_type: Option<&str>) -> (Value, ResponseDataType) {
    let media = media_type(content_type);
    if BINARY_CONTENT_TYPES.contains(&media.as_str()) {
        return (Value::String(STANDARD.encode(bytes)), ResponseDataType::Binary);
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => (value, ResponseDataType::Json),
        Err(_) => (
            Value::String(String::from_utf8_lossy(bytes).into_owned()),
            ResponseDataType::Text,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn media_type_strips_parameters() {
        assert_eq!(media_type(Some("Application/JSON; charset=utf-8")), "application/json");
        assert_eq!(media_type(None), "");
    }

    #[test]
    fn binary_types_are_base64_encoded() {
        let (value, kind) = classify_body(b"%PDF-1.4", Some("application/pdf"));
        assert_eq!(kind, ResponseDataType::Binary);
        assert_eq!(value, json!("JVBERi0xLjQ="));

        let (_, kind) = classify_body(b"{}", Some("application/octet-stream"));
        assert_eq!(kind, ResponseDataType::Binary);
    }

    #[test]
    fn json_is_detected_regardless_of_content_type() {
        let (value, kind) = classify_body(br#"{"ok":true}"#, Some("text/plain"));
        assert_eq!(kind, ResponseDataType::Json);
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn everything_else_is_text() {
        let (value, kind) = classify_body(b"<html>nope</html>", Some("text/html"));
        assert_eq!(kind, ResponseDataType::Text);
        assert_eq!(value, json!("<html>nope</html>"));

        let (value, kind) = classify_body(b"", None);
        assert_eq!(kind, ResponseDataType::Text);
        assert_eq!(value, json!(""));
    }
}
