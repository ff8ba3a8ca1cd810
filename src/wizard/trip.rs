// Step 2: "Dream Trip" (dates, must-have experiences, companions, free text).

use chrono::{Days, NaiveDate};

use super::fields::FieldTracker;
use super::StepError;
use crate::models::record::{Companion, Experience, TripSlice, WizardRecord};
use crate::utils::validation::{
    self, DREAM_WORDS_MAX_CHARS, REQUIRED_EXPERIENCES, SPECIAL_REQUIREMENTS_MAX_CHARS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripField {
    StartDate,
    EndDate,
    Experiences,
    Companion,
    CompanionCount,
    DreamWords,
    SpecialRequirements,
}

impl TripField {
    pub const ALL: [TripField; 7] = [
        TripField::StartDate,
        TripField::EndDate,
        TripField::Experiences,
        TripField::Companion,
        TripField::CompanionCount,
        TripField::DreamWords,
        TripField::SpecialRequirements,
    ];

    pub fn as_id(&self) -> &'static str {
        match self {
            TripField::StartDate => "preferred_start_date",
            TripField::EndDate => "preferred_end_date",
            TripField::Experiences => "must_have_experiences",
            TripField::Companion => "group_type",
            TripField::CompanionCount => "companion_count",
            TripField::DreamWords => "dream_escape_words",
            TripField::SpecialRequirements => "accessibility_dietary_preferences",
        }
    }
}

/// Parse a `YYYY-MM-DD` date as typed by the user.
pub fn parse_date(input: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Please enter a date as YYYY-MM-DD"))
}

#[derive(Debug, Clone)]
pub struct TripForm {
    earliest_start: NaiveDate,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    experiences: Vec<Experience>,
    companion: Option<Companion>,
    companion_count: Option<u32>,
    dream_words: String,
    special_requirements: String,
    fields: FieldTracker<TripField>,
}

impl TripForm {
    /// `min_lead_days` is how far ahead of `today` the earliest bookable start date lies.
    pub fn new(today: NaiveDate, min_lead_days: i64) -> Self {
        let lead = Days::new(min_lead_days.max(0) as u64);
        Self {
            earliest_start: today.checked_add_days(lead).unwrap_or(today),
            start_date: None,
            end_date: None,
            experiences: Vec::new(),
            companion: None,
            companion_count: None,
            dream_words: String::new(),
            special_requirements: String::new(),
            fields: FieldTracker::default(),
        }
    }

    pub fn from_record(record: &WizardRecord, today: NaiveDate, min_lead_days: i64) -> Self {
        let mut form = Self::new(today, min_lead_days);
        form.start_date = record.start_date;
        form.end_date = record.end_date;
        form.experiences = record.experiences.clone();
        form.companion = record.companion;
        form.companion_count = record.companion_count;
        form.dream_words = record.dream_words.clone().unwrap_or_default();
        form.special_requirements = record.special_requirements.clone().unwrap_or_default();
        form
    }

    pub fn earliest_start(&self) -> NaiveDate {
        self.earliest_start
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn experiences(&self) -> &[Experience] {
        &self.experiences
    }

    pub fn companion(&self) -> Option<Companion> {
        self.companion
    }

    pub fn companion_count(&self) -> Option<u32> {
        self.companion_count
    }

    pub fn dream_words(&self) -> &str {
        &self.dream_words
    }

    pub fn special_requirements(&self) -> &str {
        &self.special_requirements
    }

    pub fn visible_error(&self, field: TripField) -> Option<&str> {
        self.fields.visible_error(field)
    }

    /// Earliest selectable end date: the day after the chosen start.
    pub fn earliest_end(&self) -> NaiveDate {
        let base = self.start_date.unwrap_or(self.earliest_start);
        base.checked_add_days(Days::new(1)).unwrap_or(base)
    }

    // ---------------------------------------------------------------------
    // Setters
    // ---------------------------------------------------------------------

    /// Set the start date. An end date that no longer falls after the new start is
    /// cleared, never shifted, so the user has to pick it again.
    pub fn set_start_date(&mut self, date: Option<NaiveDate>) {
        self.start_date = date;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start >= end {
                self.end_date = None;
                self.fields.clear(TripField::EndDate);
            }
        }
        self.touch_and_validate(TripField::StartDate);
        if self.end_date.is_some() {
            self.touch_and_validate(TripField::EndDate);
        }
    }

    pub fn set_end_date(&mut self, date: Option<NaiveDate>) {
        self.end_date = date;
        self.touch_and_validate(TripField::EndDate);
    }

    /// Text entry variant of `set_start_date`; unparseable input clears the date.
    pub fn set_start_date_text(&mut self, input: &str) {
        match parse_date(input) {
            Ok(d) => self.set_start_date(Some(d)),
            Err(e) => {
                self.start_date = None;
                self.fields.touch(TripField::StartDate);
                self.fields.record(TripField::StartDate, Err(e));
            }
        }
    }

    pub fn set_end_date_text(&mut self, input: &str) {
        match parse_date(input) {
            Ok(d) => self.set_end_date(Some(d)),
            Err(e) => {
                self.end_date = None;
                self.fields.touch(TripField::EndDate);
                self.fields.record(TripField::EndDate, Err(e));
            }
        }
    }

    /// Toggle an experience. With three already chosen, adding another is refused and the
    /// selection is left as it was (returns `false`).
    pub fn toggle_experience(&mut self, e: Experience) -> bool {
        let changed = if let Some(pos) = self.experiences.iter().position(|x| *x == e) {
            self.experiences.remove(pos);
            true
        } else if self.experiences.len() < REQUIRED_EXPERIENCES {
            self.experiences.push(e);
            true
        } else {
            false
        };
        self.touch_and_validate(TripField::Experiences);
        changed
    }

    /// Unselected items are disabled (still listed) once three are chosen.
    pub fn is_experience_disabled(&self, e: Experience) -> bool {
        self.experiences.len() >= REQUIRED_EXPERIENCES && !self.experiences.contains(&e)
    }

    pub fn set_companion(&mut self, companion: Companion) {
        self.companion = Some(companion);
        if !companion.needs_count() {
            self.companion_count = None;
            self.fields.clear(TripField::CompanionCount);
        }
        self.touch_and_validate(TripField::Companion);
    }

    pub fn set_companion_count(&mut self, count: Option<u32>) {
        self.companion_count = count;
        self.touch_and_validate(TripField::CompanionCount);
    }

    pub fn set_dream_words(&mut self, value: impl Into<String>) {
        self.dream_words = value.into();
        self.touch_and_validate(TripField::DreamWords);
    }

    pub fn set_special_requirements(&mut self, value: impl Into<String>) {
        self.special_requirements = value.into();
        self.touch_and_validate(TripField::SpecialRequirements);
    }

    // ---------------------------------------------------------------------
    // Gate + commit
    // ---------------------------------------------------------------------

    fn validate_field(&self, field: TripField) -> anyhow::Result<()> {
        match field {
            TripField::StartDate => {
                validation::validate_start_date(self.start_date, self.earliest_start)
            }
            TripField::EndDate => validation::validate_end_date(self.start_date, self.end_date),
            TripField::Experiences => validation::validate_selection_count(
                self.experiences.len(),
                REQUIRED_EXPERIENCES,
                REQUIRED_EXPERIENCES,
                "experiences",
            ),
            TripField::Companion => match self.companion {
                Some(_) => Ok(()),
                None => Err(anyhow::anyhow!("Please tell us who you're travelling with")),
            },
            TripField::CompanionCount => match self.companion {
                Some(c) if c.needs_count() => {
                    validation::validate_group_count(self.companion_count)
                }
                _ => Ok(()),
            },
            TripField::DreamWords => validation::validate_max_chars(
                &self.dream_words,
                DREAM_WORDS_MAX_CHARS,
                "Dream escape words",
            ),
            TripField::SpecialRequirements => validation::validate_max_chars(
                &self.special_requirements,
                SPECIAL_REQUIREMENTS_MAX_CHARS,
                "Accessibility and dietary preferences",
            ),
        }
    }

    fn touch_and_validate(&mut self, field: TripField) {
        self.fields.touch(field);
        let outcome = self.validate_field(field);
        self.fields.record(field, outcome);
    }

    /// Whether "Next" is enabled.
    pub fn can_advance(&self) -> bool {
        self.start_date.is_some()
            && self.end_date.is_some()
            && self.experiences.len() == REQUIRED_EXPERIENCES
            && self.companion.is_some()
            && TripField::ALL.iter().all(|f| self.validate_field(*f).is_ok())
    }

    pub fn commit(&mut self) -> Result<TripSlice, StepError> {
        let mut first_error = None;
        for field in TripField::ALL {
            self.touch_and_validate(field);
            if first_error.is_none() {
                if let Some(msg) = self.fields.error(field) {
                    first_error = Some(StepError::Invalid {
                        field: field.as_id(),
                        message: msg.to_string(),
                    });
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let (Some(start_date), Some(end_date), Some(companion)) =
            (self.start_date, self.end_date, self.companion)
        else {
            return Err(StepError::Invalid {
                field: TripField::StartDate.as_id(),
                message: "Trip dates and companions are required".to_string(),
            });
        };

        Ok(TripSlice {
            start_date,
            end_date,
            experiences: self.experiences.clone(),
            companion,
            companion_count: self.companion_count,
            dream_words: non_blank(&self.dream_words),
            special_requirements: non_blank(&self.special_requirements),
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::WizardRecord;
    use crate::models::requests::SubmissionPayload;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn today() -> NaiveDate {
        d("2026-01-15")
    }

    fn scenario_form() -> TripForm {
        let mut f = TripForm::new(today(), 20);
        f.set_start_date(Some(d("2026-03-01")));
        f.set_end_date(Some(d("2026-03-10")));
        f.toggle_experience(Experience::GorillaTrekking);
        f.toggle_experience(Experience::NileAdventure);
        f.toggle_experience(Experience::FoodNightlife);
        f.set_companion(Companion::Solo);
        f
    }

    #[test]
    fn earliest_start_is_lead_days_ahead() {
        let f = TripForm::new(today(), 20);
        assert_eq!(f.earliest_start(), d("2026-02-04"));
    }

    #[test]
    fn start_before_earliest_is_an_error() {
        let mut f = TripForm::new(today(), 20);
        f.set_start_date(Some(d("2026-01-20")));
        assert!(f.visible_error(TripField::StartDate).is_some());
        f.set_start_date(Some(d("2026-02-04")));
        assert_eq!(f.visible_error(TripField::StartDate), None);
    }

    #[test]
    fn scenario_is_valid_and_passes_through_unpadded() {
        let mut f = scenario_form();
        assert!(f.can_advance());
        let slice = f.commit().unwrap();

        let mut record = WizardRecord::default();
        record.merge(crate::models::record::StepData::Trip(slice));
        let payload = SubmissionPayload::from_record(&record, today());
        assert_eq!(
            payload.must_have_experiences,
            vec![
                Experience::GorillaTrekking,
                Experience::NileAdventure,
                Experience::FoodNightlife
            ]
        );
    }

    #[test]
    fn moving_start_past_end_clears_end() {
        let mut f = scenario_form();
        f.set_start_date(Some(d("2026-03-10")));
        assert_eq!(f.end_date(), None);
        assert_eq!(f.visible_error(TripField::EndDate), None);
        assert!(!f.can_advance());

        let mut f = scenario_form();
        f.set_start_date(Some(d("2026-03-20")));
        assert_eq!(f.end_date(), None);
    }

    #[test]
    fn moving_start_before_end_keeps_end() {
        let mut f = scenario_form();
        f.set_start_date(Some(d("2026-03-05")));
        assert_eq!(f.end_date(), Some(d("2026-03-10")));
        assert!(f.can_advance());
    }

    #[test]
    fn end_equal_to_start_is_rejected() {
        let mut f = scenario_form();
        f.set_end_date(Some(d("2026-03-01")));
        assert_eq!(
            f.visible_error(TripField::EndDate),
            Some("End date must be after the start date")
        );
        assert!(!f.can_advance());
    }

    #[test]
    fn moving_start_earlier_clears_stale_end_error() {
        let mut f = scenario_form();
        f.set_start_date(Some(d("2026-03-10")));
        f.set_end_date(Some(d("2026-03-05")));
        assert!(f.visible_error(TripField::EndDate).is_some());

        f.set_start_date(Some(d("2026-03-01")));
        assert_eq!(f.end_date(), Some(d("2026-03-05")));
        assert_eq!(f.visible_error(TripField::EndDate), None);
        assert!(f.can_advance());
    }

    #[test]
    fn fourth_experience_is_rejected_quietly() {
        let mut f = scenario_form();
        assert!(f.is_experience_disabled(Experience::Birdwatching));
        assert!(!f.toggle_experience(Experience::Birdwatching));
        assert_eq!(f.experiences().len(), 3);
        assert!(!f.experiences().contains(&Experience::Birdwatching));
        assert_eq!(f.visible_error(TripField::Experiences), None);

        assert!(f.toggle_experience(Experience::NileAdventure));
        assert!(!f.is_experience_disabled(Experience::Birdwatching));
        assert!(f.toggle_experience(Experience::Birdwatching));
    }

    #[test]
    fn two_experiences_are_not_enough() {
        let mut f = scenario_form();
        f.toggle_experience(Experience::FoodNightlife);
        assert!(!f.can_advance());
        assert_eq!(
            f.visible_error(TripField::Experiences),
            Some("Please select exactly 3 experiences")
        );
    }

    #[test]
    fn group_companions_require_a_count() {
        let mut f = scenario_form();
        f.set_companion(Companion::Friends);
        assert!(!f.can_advance());

        f.set_companion_count(Some(1));
        assert!(f.visible_error(TripField::CompanionCount).is_some());
        assert!(!f.can_advance());

        f.set_companion_count(Some(6));
        assert!(f.can_advance());
        assert_eq!(f.commit().unwrap().companion_count, Some(6));

        // Switching back to a couple drops the count.
        f.set_companion(Companion::Couple);
        assert_eq!(f.companion_count(), None);
        assert!(f.can_advance());
    }

    #[test]
    fn companion_is_required() {
        let mut f = TripForm::new(today(), 20);
        f.set_start_date(Some(d("2026-03-01")));
        f.set_end_date(Some(d("2026-03-10")));
        for e in [
            Experience::GorillaTrekking,
            Experience::NileAdventure,
            Experience::FoodNightlife,
        ] {
            f.toggle_experience(e);
        }
        assert!(!f.can_advance());
        assert!(matches!(
            f.commit(),
            Err(StepError::Invalid {
                field: "group_type",
                ..
            })
        ));
    }

    #[test]
    fn dream_words_limit() {
        let mut f = scenario_form();
        f.set_dream_words("x".repeat(101));
        assert!(!f.can_advance());
        f.set_dream_words("   ");
        assert!(f.can_advance());
        assert_eq!(f.commit().unwrap().dream_words, None);
    }

    #[test]
    fn typed_dates_are_parsed() {
        let mut f = TripForm::new(today(), 20);
        f.set_start_date_text("2026-03-01");
        assert_eq!(f.start_date(), Some(d("2026-03-01")));
        f.set_end_date_text("10/03/2026");
        assert_eq!(f.end_date(), None);
        assert_eq!(
            f.visible_error(TripField::EndDate),
            Some("Please enter a date as YYYY-MM-DD")
        );
    }
}
