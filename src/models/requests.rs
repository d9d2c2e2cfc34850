//! Request DTOs for the task API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::store::MAX_KEY_LENGTH;

/// Request body for PUT /tasks and PUT /tasks/deferred
///
/// # Fields
/// - `key`: Optional task key, generated when absent
/// - `value`: Opaque JSON payload
#[derive(Debug, Clone, Deserialize)]
pub struct PutTaskRequest {
    #[serde(default)]
    pub key: Option<String>,
    pub value: Value,
}

impl PutTaskRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match &self.key {
            Some(key) if key.is_empty() => Some("Key cannot be empty".to_string()),
            Some(key) if key.len() > MAX_KEY_LENGTH => Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )),
            _ => None,
        }
    }
}

/// Query string for GET /tasks and POST /tasks/poll
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternQuery {
    /// Regular expression the whole key must match
    #[serde(default)]
    pub pattern: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_request_deserialize() {
        let json = r#"{"key": "job-1", "value": {"table": "todos"}}"#;
        let req: PutTaskRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key.as_deref(), Some("job-1"));
        assert_eq!(req.value, json!({"table": "todos"}));
    }

    #[test]
    fn test_put_request_without_key() {
        let json = r#"{"value": 42}"#;
        let req: PutTaskRequest = serde_json::from_str(json).unwrap();
        assert!(req.key.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = PutTaskRequest {
            key: Some("".to_string()),
            value: json!("x"),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let req = PutTaskRequest {
            key: Some("k".repeat(MAX_KEY_LENGTH + 1)),
            value: json!("x"),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_key_length_counted_in_bytes() {
        // 129 characters, 258 bytes
        let req = PutTaskRequest {
            key: Some("é".repeat(MAX_KEY_LENGTH / 2 + 1)),
            value: json!("x"),
        };

        let message = req.validate().unwrap();
        assert!(message.contains("bytes"));
    }

    #[test]
    fn test_pattern_query_optional() {
        let query: PatternQuery = serde_json::from_str("{}").unwrap();
        assert!(query.pattern.is_none());
    }
}
