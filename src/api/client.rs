// Lead API client
//
// `LeadApi` is the seam between the wizard and the backend: production code uses
// `HttpLeadApi` (reqwest), tests use stubs. There is no automatic retry; every failure is
// surfaced and the user retries by acting again.

use async_trait::async_trait;
use log::{info, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{multipart, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::models::requests::SubmissionPayload;
use crate::models::responses::{
    message_from_body, parse_upload_body, SubmissionEnvelope, SubmissionReceipt, UploadResult,
};
use crate::utils::logging::{mask_email, mask_phone, mask_sensitive};

pub const SUBMISSION_PATH: &str = "form-submissions";
/// Misspelled route still served by some backend deployments. Only tried after a 404 on
/// `SUBMISSION_PATH`; remove once every environment serves the correct spelling.
pub const SUBMISSION_PATH_FALLBACK: &str = "form-submissons";
pub const UPLOAD_PATH: &str = "upload-file";
pub const UPLOAD_KIND_TRAVEL_PHOTO: &str = "travel_photo";

const VALIDATION_FALLBACK_MESSAGE: &str = "Please correct the highlighted fields and try again.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("{status_text}")]
    Malformed { status_text: String },
    #[error("The request timed out. Please check your connection and try again.")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    InvalidFile(String),
}

impl ApiError {
    /// Message first, then one bullet per backend field error.
    pub fn display_lines(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        if let ApiError::Validation { errors, .. } = self {
            for (field, messages) in errors {
                for m in messages {
                    lines.push(format!("• {}: {}", field, m));
                }
            }
        }
        lines
    }
}

fn map_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// A photo picked by the user, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a photo from disk, inferring the MIME type from its extension.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Could not read {}: {}", path.display(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo".to_string());
        let mime_type = mime_from_extension(path).to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    /// Local checks performed before any network call.
    pub fn check(&self, max_bytes: u64) -> Result<(), ApiError> {
        if !self.mime_type.starts_with("image/") {
            return Err(ApiError::InvalidFile(
                "Please choose an image file (JPG, PNG, WEBP or GIF).".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(ApiError::InvalidFile("The selected file is empty.".to_string()));
        }
        if self.bytes.len() as u64 > max_bytes {
            return Err(ApiError::InvalidFile(format!(
                "Photos must be {} MB or smaller.",
                max_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[async_trait]
pub trait LeadApi: Send + Sync {
    /// Upload one file; `kind` is sent as the multipart `type` field.
    async fn upload_file(&self, file: &PhotoFile, kind: &str) -> Result<UploadResult, ApiError>;

    /// Submit the completed wizard.
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, ApiError>;
}

/// Production client backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpLeadApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLeadApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json(
        &self,
        url: &str,
        payload: &SubmissionPayload,
    ) -> Result<reqwest::Response, ApiError> {
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)
    }
}

#[async_trait]
impl LeadApi for HttpLeadApi {
    async fn upload_file(&self, file: &PhotoFile, kind: &str) -> Result<UploadResult, ApiError> {
        info!(
            "[PHASE: upload] [STEP: send] Uploading {} ({} bytes, {})",
            file.file_name,
            file.bytes.len(),
            file.mime_type
        );

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| ApiError::InvalidFile(format!("Unsupported file type: {}", e)))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("type", kind.to_string());

        let resp = self
            .client
            .post(self.endpoint(UPLOAD_PATH))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(map_transport_error)?;
        let result = interpret_upload(status, &text);
        match &result {
            Ok(r) => info!("[PHASE: upload] [STEP: done] Upload stored at {}", r.path),
            Err(e) => warn!("[PHASE: upload] [STEP: failed] Upload failed: {}", e),
        }
        result
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, ApiError> {
        info!(
            "[PHASE: submission] [STEP: send] Submitting lead for {} <{}> {}",
            mask_sensitive(&payload.name),
            mask_email(&payload.email),
            mask_phone(&payload.phone)
        );

        let mut resp = self
            .post_json(&self.endpoint(SUBMISSION_PATH), payload)
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            warn!(
                "[PHASE: submission] [STEP: fallback] {} returned 404; retrying at {}",
                SUBMISSION_PATH, SUBMISSION_PATH_FALLBACK
            );
            resp = self
                .post_json(&self.endpoint(SUBMISSION_PATH_FALLBACK), payload)
                .await?;
        }

        let status = resp.status();
        let text = resp.text().await.map_err(map_transport_error)?;
        let result = interpret_submission(status, &text);
        match &result {
            Ok(r) => info!(
                "[PHASE: submission] [STEP: done] Submission accepted, reference {}",
                r.reference_number
            ),
            Err(e) => warn!("[PHASE: submission] [STEP: failed] Submission failed: {}", e),
        }
        result
    }
}

/// Turn a `/form-submissions` response into a receipt or a typed error.
pub fn interpret_submission(status: StatusCode, text: &str) -> Result<SubmissionReceipt, ApiError> {
    let Ok(body) = serde_json::from_str::<Value>(text) else {
        return Err(ApiError::Malformed {
            status_text: status_text(status),
        });
    };

    let envelope: SubmissionEnvelope = match serde_json::from_value(body.clone()) {
        Ok(env) => env,
        Err(_) if status.is_success() => {
            return Err(ApiError::Malformed {
                status_text: status_text(status),
            })
        }
        // Error bodies with unexpected shapes still carry a usable message.
        Err(_) => SubmissionEnvelope::default(),
    };

    if status.is_success() && envelope.success != Some(false) {
        return envelope.data.ok_or_else(|| ApiError::Malformed {
            status_text: status_text(status),
        });
    }

    let errors = envelope.field_errors();
    if !errors.is_empty() {
        return Err(ApiError::Validation {
            message: envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| VALIDATION_FALLBACK_MESSAGE.to_string()),
            errors,
        });
    }

    Err(ApiError::Server {
        status: status.as_u16(),
        message: message_from_body(&body).unwrap_or_else(|| status_text(status)),
    })
}

/// Turn an `/upload-file` response into an upload result or a typed error.
pub fn interpret_upload(status: StatusCode, text: &str) -> Result<UploadResult, ApiError> {
    let Ok(body) = serde_json::from_str::<Value>(text) else {
        return Err(ApiError::Malformed {
            status_text: status_text(status),
        });
    };

    let explicit_failure = body.get("success").and_then(Value::as_bool) == Some(false);
    if status.is_success() && !explicit_failure {
        if let Some(result) = parse_upload_body(&body) {
            return Ok(result);
        }
        return Err(ApiError::Malformed {
            status_text: status_text(status),
        });
    }

    Err(ApiError::Server {
        status: status.as_u16(),
        message: message_from_body(&body).unwrap_or_else(|| status_text(status)),
    })
}
