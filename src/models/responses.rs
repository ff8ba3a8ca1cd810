// Backend response models
// Shapes returned by `/form-submissions` and `/upload-file`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionId::Number(n) => write!(f, "{}", n),
            SubmissionId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// `data` of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub submission_id: Option<SubmissionId>,
    pub reference_number: String,
    #[serde(default)]
    pub estimated_response_time: Option<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// Laravel-style validation bags send either a list or a single string per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldMessages {
    Many(Vec<String>),
    One(String),
}

impl FieldMessages {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            FieldMessages::Many(v) => v,
            FieldMessages::One(s) => vec![s],
        }
    }
}

/// Superset of the success and failure bodies of `/form-submissions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<SubmissionReceipt>,
    #[serde(default)]
    pub errors: Option<BTreeMap<String, FieldMessages>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SubmissionEnvelope {
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        self.errors
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.into_vec()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Accept either `{success, data: {url, ...}}` or the bare `{url, ...}` object.
pub fn parse_upload_body(body: &Value) -> Option<UploadResult> {
    if let Some(data) = body.get("data").filter(|d| d.get("url").is_some()) {
        return serde_json::from_value(data.clone()).ok();
    }
    if body.get("url").is_some() {
        return serde_json::from_value(body.clone()).ok();
    }
    None
}

/// Pull a human message out of an arbitrary error body (`message`, then `error`).
pub fn message_from_body(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_parses_receipt() {
        let body = json!({
            "success": true,
            "message": "Thanks!",
            "data": {
                "submission_id": 42,
                "reference_number": "EXP-2026-0042",
                "estimated_response_time": "24 hours",
                "next_steps": ["We review your trip", "A consultant calls you"]
            }
        });
        let env: SubmissionEnvelope = serde_json::from_value(body).unwrap();
        let receipt = env.data.unwrap();
        assert_eq!(receipt.reference_number, "EXP-2026-0042");
        assert_eq!(receipt.submission_id.unwrap().to_string(), "42");
        assert_eq!(receipt.next_steps.len(), 2);
    }

    #[test]
    fn validation_envelope_accepts_list_or_string() {
        let body = json!({
            "message": "The given data was invalid.",
            "errors": {
                "email": ["The email has already been taken."],
                "phone": "The phone format is invalid."
            }
        });
        let env: SubmissionEnvelope = serde_json::from_value(body).unwrap();
        let errors = env.field_errors();
        assert_eq!(errors["email"], vec!["The email has already been taken."]);
        assert_eq!(errors["phone"], vec!["The phone format is invalid."]);
    }

    #[test]
    fn upload_body_wrapped_or_bare() {
        let wrapped = json!({
            "success": true,
            "data": {"url": "https://cdn/x.jpg", "path": "uploads/x.jpg", "filename": "x.jpg", "size": 10, "mime_type": "image/jpeg"}
        });
        let bare = json!({"url": "https://cdn/y.jpg", "path": "uploads/y.jpg", "filename": "y.jpg"});

        assert_eq!(parse_upload_body(&wrapped).unwrap().url, "https://cdn/x.jpg");
        let y = parse_upload_body(&bare).unwrap();
        assert_eq!(y.filename, "y.jpg");
        assert_eq!(y.size, None);
        assert!(parse_upload_body(&json!({"success": false, "message": "too big"})).is_none());
    }

    #[test]
    fn message_prefers_message_then_error() {
        assert_eq!(
            message_from_body(&json!({"message": "m", "error": "e"})).as_deref(),
            Some("m")
        );
        assert_eq!(
            message_from_body(&json!({"message": "  ", "error": "e"})).as_deref(),
            Some("e")
        );
        assert_eq!(message_from_body(&json!({})), None);
    }
}
