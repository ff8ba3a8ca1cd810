// Input validation utilities
// Field-level rules for the lead-capture wizard. Each validator returns the user-facing
// message as the error, so callers can surface `e.to_string()` under the field.

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const DREAM_WORDS_MAX_CHARS: usize = 100;
pub const SPECIAL_REQUIREMENTS_MAX_CHARS: usize = 500;
pub const MAX_TRAVELLER_TYPES: usize = 3;
pub const REQUIRED_EXPERIENCES: usize = 3;
pub const MIN_GROUP_COUNT: u32 = 2;

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| anyhow::anyhow!("Internal error: failed to compile validation regex: {}", e))
}

/// Validate a traveller's full name: 2-100 characters, letters, spaces, hyphens and
/// apostrophes only.
pub fn validate_name(name: &str) -> Result<()> {
    let s = name.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Name is required"));
    }

    let len = s.chars().count();
    if len < NAME_MIN_CHARS {
        return Err(anyhow::anyhow!(
            "Name must be at least {} characters",
            NAME_MIN_CHARS
        ));
    }
    if len > NAME_MAX_CHARS {
        return Err(anyhow::anyhow!(
            "Name cannot exceed {} characters",
            NAME_MAX_CHARS
        ));
    }

    let re = compile(r"^[\p{L}\s'\-]+$")?;
    if !re.is_match(s) {
        return Err(anyhow::anyhow!(
            "Name can only contain letters, spaces, hyphens and apostrophes"
        ));
    }

    Ok(())
}

/// Validate an email address (RFC-shaped, at most 255 characters).
pub fn validate_email(email: &str) -> Result<()> {
    let s = email.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Email is required"));
    }
    if s.chars().count() > EMAIL_MAX_CHARS {
        return Err(anyhow::anyhow!(
            "Email cannot exceed {} characters",
            EMAIL_MAX_CHARS
        ));
    }

    let re = compile(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")?;
    if !re.is_match(s) {
        return Err(anyhow::anyhow!("Please enter a valid email address"));
    }

    Ok(())
}

/// Strip the separators people type into phone numbers (spaces, dashes, dots, parens).
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}

/// Validate a phone number. Loose E.164 shape: optional `+`, no leading zero, up to 16 digits.
pub fn validate_phone(phone: &str) -> Result<()> {
    let s = normalize_phone(phone.trim());
    if s.is_empty() {
        return Err(anyhow::anyhow!("Phone number is required"));
    }

    let re = compile(r"^\+?[1-9]\d{0,15}$")?;
    if !re.is_match(&s) {
        return Err(anyhow::anyhow!("Please enter a valid phone number"));
    }

    Ok(())
}

/// Validate the country of residence against the known list.
pub fn validate_country(country: &str) -> Result<()> {
    let s = country.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Please select your country of residence"));
    }
    if super::countries::find_country(s).is_none() {
        return Err(anyhow::anyhow!("Please select a country from the list"));
    }
    Ok(())
}

/// Validate an optional photo URL. When present it must be an absolute http(s) URL.
pub fn validate_photo_url(photo_url: Option<&str>) -> Result<()> {
    let Some(raw) = photo_url else {
        return Ok(());
    };

    let parsed = url::Url::parse(raw.trim())
        .map_err(|_| anyhow::anyhow!("Photo must be uploaded before continuing"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(anyhow::anyhow!("Photo must be uploaded before continuing"));
    }
    Ok(())
}

/// Validate a free-text field with an upper bound on characters.
pub fn validate_max_chars(value: &str, max: usize, label: &str) -> Result<()> {
    if value.chars().count() > max {
        return Err(anyhow::anyhow!(
            "{} cannot exceed {} characters",
            label,
            max
        ));
    }
    Ok(())
}

/// Validate a multi-select count lies within `min..=max`.
pub fn validate_selection_count(count: usize, min: usize, max: usize, label: &str) -> Result<()> {
    if min == max && count != min {
        return Err(anyhow::anyhow!("Please select exactly {} {}", min, label));
    }
    if count < min {
        return Err(anyhow::anyhow!("Please select at least {} {}", min, label));
    }
    if count > max {
        return Err(anyhow::anyhow!("You can select up to {} {}", max, label));
    }
    Ok(())
}

/// Validate a trip start date against the earliest bookable date.
pub fn validate_start_date(start: Option<NaiveDate>, earliest: NaiveDate) -> Result<()> {
    let Some(start) = start else {
        return Err(anyhow::anyhow!("Please choose a start date"));
    };
    if start < earliest {
        return Err(anyhow::anyhow!(
            "Trips can start from {} at the earliest",
            earliest.format("%d %b %Y")
        ));
    }
    Ok(())
}

/// Validate a trip end date; it must be strictly after the start date.
pub fn validate_end_date(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    let Some(end) = end else {
        return Err(anyhow::anyhow!("Please choose an end date"));
    };
    if let Some(start) = start {
        if end <= start {
            return Err(anyhow::anyhow!("End date must be after the start date"));
        }
    }
    Ok(())
}

/// Validate the group head-count for friends/family trips.
pub fn validate_group_count(count: Option<u32>) -> Result<()> {
    match count {
        None => Err(anyhow::anyhow!("Please tell us how many people are travelling")),
        Some(n) if n < MIN_GROUP_COUNT => Err(anyhow::anyhow!(
            "Group trips need at least {} travellers",
            MIN_GROUP_COUNT
        )),
        Some(_) => Ok(()),
    }
}
