// Backend request models
// `SubmissionPayload` is the flattened, snake_case body of `POST /form-submissions`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::record::{
    Companion, Experience, HearAboutUs, PioneerTraveller, TravellerType, WizardRecord,
};
use crate::utils::validation::REQUIRED_EXPERIENCES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country_of_residence: String,
    pub been_to_africa_before: bool,
    pub travel_style: Vec<TravellerType>,
    pub dream_escape_words: String,
    pub heard_about_us: HearAboutUs,
    pub feature_as_pioneer: String,
    pub travel_photo_url: Option<String>,
    pub travel_month: String,
    pub travel_year: i32,
    pub preferred_start_date: Option<NaiveDate>,
    pub preferred_end_date: Option<NaiveDate>,
    pub group_type: Companion,
    pub group_size: u32,
    pub must_have_experiences: Vec<Experience>,
    pub accessibility_dietary_preferences: String,
    pub send_options: String,
    pub join_early_explorer: bool,
    pub email_opt_in: bool,
}

impl SubmissionPayload {
    /// Project a wizard record into the backend shape.
    ///
    /// Total over any record, including partial ones: every absent field has a fixed
    /// default so nothing undefined reaches the wire. `today` supplies the travel
    /// month/year when no start date was chosen.
    pub fn from_record(record: &WizardRecord, today: NaiveDate) -> Self {
        let travel_basis = record.start_date.unwrap_or(today);
        let companion = record.companion.unwrap_or(Companion::Solo);

        let travel_style = if record.traveller_type.is_empty() {
            vec![TravellerType::Adventurer]
        } else {
            record.traveller_type.clone()
        };

        let feature_as_pioneer = match record.pioneer_traveller {
            Some(PioneerTraveller::Yes) => "yes",
            _ => "maybe_later",
        };

        let accessibility = record
            .special_requirements
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("None");

        Self {
            name: record.name.trim().to_string(),
            email: record.email.trim().to_string(),
            phone: record.phone.trim().to_string(),
            country_of_residence: non_empty_or(&record.country_of_residence, "Unknown"),
            been_to_africa_before: record.been_to_africa_before.unwrap_or(false),
            travel_style,
            dream_escape_words: record
                .dream_words
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .to_string(),
            heard_about_us: record.hear_about_us.unwrap_or(HearAboutUs::Other),
            feature_as_pioneer: feature_as_pioneer.to_string(),
            travel_photo_url: record.photo_url.clone(),
            travel_month: month_name(travel_basis.month()).to_string(),
            travel_year: travel_basis.year(),
            preferred_start_date: record.start_date,
            preferred_end_date: record.end_date,
            group_type: companion,
            group_size: companion.group_size(),
            must_have_experiences: pad_experiences(&record.experiences),
            accessibility_dietary_preferences: accessibility.to_string(),
            send_options: "both".to_string(),
            join_early_explorer: true,
            email_opt_in: record.keep_updated,
        }
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        default.to_string()
    } else {
        v.to_string()
    }
}

/// Exactly three distinct experiences: the chosen ones in order (deduplicated, truncated),
/// topped up from `Experience::FALLBACK`.
pub fn pad_experiences(chosen: &[Experience]) -> Vec<Experience> {
    let mut out: Vec<Experience> = Vec::with_capacity(REQUIRED_EXPERIENCES);
    for e in chosen.iter().chain(Experience::FALLBACK.iter()) {
        if out.len() == REQUIRED_EXPERIENCES {
            break;
        }
        if !out.contains(e) {
            out.push(*e);
        }
    }
    out
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "january",
        2 => "february",
        3 => "march",
        4 => "april",
        5 => "may",
        6 => "june",
        7 => "july",
        8 => "august",
        9 => "september",
        10 => "october",
        11 => "november",
        _ => "december",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn full_record() -> WizardRecord {
        WizardRecord {
            name: "Jo".to_string(),
            email: "jo@x.com".to_string(),
            phone: "+256700000000".to_string(),
            country_of_residence: "Uganda".to_string(),
            been_to_africa_before: Some(true),
            traveller_type: vec![TravellerType::Adventurer],
            hear_about_us: Some(HearAboutUs::SocialMedia),
            pioneer_traveller: Some(PioneerTraveller::Yes),
            photo_url: Some("https://cdn.example.com/jo.jpg".to_string()),
            start_date: Some(date("2026-03-01")),
            end_date: Some(date("2026-03-10")),
            experiences: vec![
                Experience::GorillaTrekking,
                Experience::NileAdventure,
                Experience::FoodNightlife,
            ],
            companion: Some(Companion::Couple),
            companion_count: None,
            dream_words: Some("wild and free".to_string()),
            special_requirements: Some("Vegetarian".to_string()),
            keep_updated: true,
        }
    }

    #[test]
    fn full_record_maps_field_by_field() {
        let p = SubmissionPayload::from_record(&full_record(), date("2026-01-15"));
        assert_eq!(p.name, "Jo");
        assert_eq!(p.country_of_residence, "Uganda");
        assert!(p.been_to_africa_before);
        assert_eq!(p.travel_style, vec![TravellerType::Adventurer]);
        assert_eq!(p.heard_about_us, HearAboutUs::SocialMedia);
        assert_eq!(p.feature_as_pioneer, "yes");
        assert_eq!(p.travel_month, "march");
        assert_eq!(p.travel_year, 2026);
        assert_eq!(p.group_type, Companion::Couple);
        assert_eq!(p.group_size, 2);
        assert_eq!(
            p.must_have_experiences,
            vec![
                Experience::GorillaTrekking,
                Experience::NileAdventure,
                Experience::FoodNightlife
            ]
        );
        assert_eq!(p.accessibility_dietary_preferences, "Vegetarian");
        assert_eq!(p.send_options, "both");
        assert!(p.join_early_explorer);
        assert!(p.email_opt_in);
    }

    #[test]
    fn empty_record_uses_defaults() {
        let p = SubmissionPayload::from_record(&WizardRecord::default(), date("2026-10-19"));
        assert_eq!(p.country_of_residence, "Unknown");
        assert_eq!(p.travel_style, vec![TravellerType::Adventurer]);
        assert_eq!(p.dream_escape_words, "");
        assert_eq!(p.heard_about_us, HearAboutUs::Other);
        assert_eq!(p.feature_as_pioneer, "maybe_later");
        assert_eq!(p.travel_photo_url, None);
        assert_eq!(p.travel_month, "october");
        assert_eq!(p.travel_year, 2026);
        assert_eq!(p.preferred_start_date, None);
        assert_eq!(p.group_type, Companion::Solo);
        assert_eq!(p.group_size, 1);
        assert_eq!(p.must_have_experiences.len(), 3);
        assert_eq!(p.accessibility_dietary_preferences, "None");
        assert!(!p.email_opt_in);
    }

    #[test]
    fn pioneer_maybe_maps_to_maybe_later() {
        let mut r = full_record();
        r.pioneer_traveller = Some(PioneerTraveller::Maybe);
        let p = SubmissionPayload::from_record(&r, date("2026-01-01"));
        assert_eq!(p.feature_as_pioneer, "maybe_later");
    }

    #[test]
    fn group_size_ignores_companion_count() {
        for (companion, expected) in [
            (Companion::Solo, 1),
            (Companion::Couple, 2),
            (Companion::Friends, 4),
            (Companion::Family, 4),
        ] {
            let mut r = full_record();
            r.companion = Some(companion);
            r.companion_count = Some(9);
            let p = SubmissionPayload::from_record(&r, date("2026-01-01"));
            assert_eq!(p.group_size, expected, "companion {:?}", companion);
        }
    }

    #[test]
    fn experiences_always_padded_to_three_distinct() {
        let cases: Vec<Vec<Experience>> = vec![
            vec![],
            vec![Experience::SafariGameDrive],
            vec![Experience::GorillaTrekking, Experience::SafariGameDrive],
            vec![Experience::Birdwatching, Experience::Birdwatching],
        ];
        for chosen in cases {
            let padded = pad_experiences(&chosen);
            assert_eq!(padded.len(), 3, "chosen {:?}", chosen);
            let unique: std::collections::HashSet<_> = padded.iter().collect();
            assert_eq!(unique.len(), 3, "duplicates in {:?}", padded);
            for e in &chosen {
                assert!(padded.contains(e));
            }
        }
    }

    #[test]
    fn payload_serializes_snake_case_and_nulls() {
        let mut r = full_record();
        r.photo_url = None;
        let p = SubmissionPayload::from_record(&r, date("2026-01-01"));
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["travel_photo_url"], serde_json::Value::Null);
        assert_eq!(v["preferred_start_date"], "2026-03-01");
        assert_eq!(v["group_type"], "couple");
        assert_eq!(v["must_have_experiences"][0], "gorilla_trekking");
        assert_eq!(v["heard_about_us"], "social_media");
    }
}
