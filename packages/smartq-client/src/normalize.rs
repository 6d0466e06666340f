//! Response-shape normalization.
//!
//! The backend is inconsistent about envelopes: lists arrive bare, under `data`
//! or under `shops`; login tokens and users hide under several field names.
//! Everything here is pure so the precedence rules can be tested without I/O.

use serde_json::{Map, Value};

/// Token fields, highest precedence first.
const TOKEN_PATHS: &[&[&str]] = &[
    &["data", "accessToken"],
    &["data", "access_token"],
    &["data", "token"],
    &["accessToken"],
    &["token"],
];

/// User fields, highest precedence first.
const USER_PATHS: &[&[&str]] = &[
    &["data", "user"],
    &["data", "customer"],
    &["user"],
    &["customer"],
];

/// List envelope keys, tried after a bare array.
const LIST_KEYS: &[&str] = &["data", "shops"];

/// Token and user extracted from a login response.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPayload {
    pub token: String,
    pub user: Value,
}

/// Empty JSON object, used when a body is missing or not JSON.
pub fn empty_body() -> Value {
    Value::Object(Map::new())
}

/// Parse a response body, treating empty or malformed input as `{}`.
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return empty_body();
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| empty_body())
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

fn present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Unwrap a list from a bare array, `{data: [...]}` or `{shops: [...]}`.
/// Any other shape yields an empty list.
pub fn unwrap_list(value: &Value) -> Vec<Value> {
    if let Value::Array(items) = value {
        return items.clone();
    }

    LIST_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Extract token and user from a login response. Both must be present.
pub fn extract_session(value: &Value) -> Option<SessionPayload> {
    let token = TOKEN_PATHS
        .iter()
        .filter_map(|path| lookup(value, path))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))?;

    let user = USER_PATHS
        .iter()
        .filter_map(|path| lookup(value, path))
        .find(|v| present(v))?;

    Some(SessionPayload {
        token: token.to_string(),
        user: user.clone(),
    })
}

/// Render a `message` field: strings as-is, arrays joined with `", "`.
fn render_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

/// Message carried by a successful envelope: `data.message`, then `message`.
pub fn extract_message(value: &Value) -> Option<String> {
    lookup(value, &["data", "message"])
        .and_then(render_message)
        .or_else(|| value.get("message").and_then(render_message))
}

/// Failure message for a non-2xx response.
pub fn error_message(value: &Value, status: u16) -> String {
    value
        .get("message")
        .and_then(render_message)
        .unwrap_or_else(|| format!("Request failed ({status})"))
}

/// Payload under `data`, or the whole body when there is no envelope.
pub fn data_envelope(value: &Value) -> &Value {
    match value.get("data") {
        Some(data) if data.is_object() => data,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_list_shapes_agree() {
        let items = json!([{"id": 1, "name": "Noodle Bar"}, {"id": 2, "name": "Taco Stand"}]);

        let bare = unwrap_list(&items);
        let data = unwrap_list(&json!({ "data": items }));
        let shops = unwrap_list(&json!({ "shops": items }));

        assert_eq!(bare.len(), 2);
        assert_eq!(bare, data);
        assert_eq!(bare, shops);
    }

    #[test]
    fn test_unwrap_list_prefers_data_over_shops() {
        let value = json!({ "data": [{"id": 1}], "shops": [{"id": 2}, {"id": 3}] });
        assert_eq!(unwrap_list(&value), vec![json!({"id": 1})]);
    }

    #[test]
    fn test_unwrap_list_skips_non_array_data() {
        let value = json!({ "data": {"count": 0}, "shops": [{"id": 2}] });
        assert_eq!(unwrap_list(&value), vec![json!({"id": 2})]);
    }

    #[test]
    fn test_unwrap_list_unknown_shape_is_empty() {
        assert!(unwrap_list(&json!({ "items": [1, 2] })).is_empty());
        assert!(unwrap_list(&json!("nope")).is_empty());
        assert!(unwrap_list(&Value::Null).is_empty());
    }

    #[test]
    fn test_extract_session_nested() {
        let value = json!({"data": {"accessToken": "t", "user": {"username": "bob"}}});
        let session = extract_session(&value).unwrap();
        assert_eq!(session.token, "t");
        assert_eq!(session.user["username"], "bob");
    }

    #[test]
    fn test_extract_session_flat_fallbacks() {
        let value = json!({"token": "flat", "customer": {"id": "c1"}});
        let session = extract_session(&value).unwrap();
        assert_eq!(session.token, "flat");
        assert_eq!(session.user["id"], "c1");
    }

    #[test]
    fn test_extract_session_nested_wins_over_flat() {
        let value = json!({
            "token": "outer",
            "data": {"token": "inner", "user": {"id": 1}}
        });
        assert_eq!(extract_session(&value).unwrap().token, "inner");
    }

    #[test]
    fn test_extract_session_requires_both() {
        assert!(extract_session(&json!({"data": {"message": "Invalid password"}})).is_none());
        assert!(extract_session(&json!({"data": {"accessToken": "t"}})).is_none());
        assert!(extract_session(&json!({"data": {"user": {"id": 1}}})).is_none());
        assert!(extract_session(&json!({"data": {"accessToken": "", "user": {}}})).is_none());
    }

    #[test]
    fn test_error_message_joins_arrays() {
        let body = json!({"message": ["email must be an email", "password is too short"]});
        assert_eq!(
            error_message(&body, 400),
            "email must be an email, password is too short"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(error_message(&empty_body(), 502), "Request failed (502)");
        assert_eq!(error_message(&json!({"message": ""}), 404), "Request failed (404)");
    }

    #[test]
    fn test_parse_body_tolerates_garbage() {
        assert_eq!(parse_body(b""), empty_body());
        assert_eq!(parse_body(b"  \n"), empty_body());
        assert_eq!(parse_body(b"<html>502</html>"), empty_body());
        assert_eq!(parse_body(br#"{"ok":true}"#), json!({"ok": true}));
    }

    #[test]
    fn test_extract_message_precedence() {
        let body = json!({"message": "outer", "data": {"message": "inner"}});
        assert_eq!(extract_message(&body).as_deref(), Some("inner"));
        assert_eq!(
            extract_message(&json!({"message": "outer"})).as_deref(),
            Some("outer")
        );
    }
}
