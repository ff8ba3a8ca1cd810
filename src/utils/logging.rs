// Logging utilities
// Structured logging with JSON and human-readable formats, plus PII masking for lead data.

use log::Level;
use serde_json::json;
use std::collections::HashMap;

/// Mask an opaque value, keeping the first and last 4 characters for troubleshooting.
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let visible = 4;
    let start: String = chars[..visible].iter().collect();
    let end: String = chars[chars.len() - visible..].iter().collect();

    format!("{}...{}", start, end)
}

/// Mask an email address: keep the first character of the local part and the domain.
pub fn mask_email(email: &str) -> String {
    let s = email.trim();
    let Some((local, domain)) = s.split_once('@') else {
        return "***".to_string();
    };
    let first: String = local.chars().take(1).collect();
    if first.is_empty() || domain.is_empty() {
        return "***".to_string();
    }
    format!("{}***@{}", first, domain)
}

/// Mask a phone number: keep the leading `+`/country prefix hint and the last 3 digits.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 5 {
        return "***".to_string();
    }
    let prefix: String = digits[..3].iter().collect();
    let tail: String = digits[digits.len() - 3..].iter().collect();
    let plus = if phone.trim_start().starts_with('+') {
        "+"
    } else {
        ""
    };
    format!("{}{}***{}", plus, prefix, tail)
}

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let mut phase = None;
    let mut step = None;
    let mut cleaned_message = message.to_string();

    if let Some(start) = message.find("[PHASE:") {
        if let Some(end) = message[start..].find(']') {
            let phase_str = message[start + 7..start + end].trim();
            phase = Some(phase_str.to_string());
            cleaned_message = format!("{} {}", &message[..start], &message[start + end + 1..])
                .trim()
                .to_string();
        }
    }

    if let Some(start) = cleaned_message.find("[STEP:") {
        if let Some(end) = cleaned_message[start..].find(']') {
            let step_str = cleaned_message[start + 6..start + end].trim();
            step = Some(step_str.to_string());
            cleaned_message = format!(
                "{} {}",
                &cleaned_message[..start],
                &cleaned_message[start + end + 1..]
            )
            .trim()
            .to_string();
        }
    }

    (phase, step, cleaned_message)
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
    details: Option<&HashMap<String, serde_json::Value>>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    if let Some(details) = details {
        log_entry["details"] = json!(details);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}
