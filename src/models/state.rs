// Session state (in-memory)
//
// NOTE: Nothing here is persisted. One `SessionState` holds everything a front end needs
// for a single visitor: the wizard controller, the mounted step forms and the chat
// widget. Closing the wizard or submitting successfully throws the wizard data away.

use chrono::NaiveDate;
use log::info;

use crate::api::client::ApiError;
use crate::chat::ChatWidget;
use crate::config::AppConfig;
use crate::models::record::StepData;
use crate::models::requests::SubmissionPayload;
use crate::models::responses::SubmissionReceipt;
use crate::wizard::consent::ConsentForm;
use crate::wizard::profile::ProfileForm;
use crate::wizard::trip::TripForm;
use crate::wizard::{StepError, WizardController, WizardEvent, WizardStep};

#[derive(Debug)]
pub struct SessionState {
    today: NaiveDate,
    min_start_lead_days: i64,
    max_upload_bytes: u64,

    pub wizard: WizardController,
    pub profile: ProfileForm,
    pub trip: TripForm,
    pub consent: ConsentForm,
    pub chat: ChatWidget,
}

impl SessionState {
    pub fn new(config: &AppConfig, today: NaiveDate) -> Self {
        let wizard = WizardController::new();
        Self {
            today,
            min_start_lead_days: config.min_start_lead_days,
            max_upload_bytes: config.max_upload_bytes,
            profile: wizard.mount_profile(config.max_upload_bytes),
            trip: wizard.mount_trip(today, config.min_start_lead_days),
            consent: wizard.mount_consent(),
            wizard,
            chat: ChatWidget::from_config(config),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    /// Whether the active step's "Next" control is enabled.
    pub fn can_advance(&self) -> bool {
        match self.wizard.step() {
            WizardStep::Profile => self.profile.can_advance(),
            WizardStep::Trip => self.trip.can_advance(),
            WizardStep::Consent => !self.consent.is_busy() && !self.consent.is_submitted(),
        }
    }

    /// Commit the active form and move to the next step. The consent step submits
    /// instead (see `prepare_submission`). Forms stay mounted across navigation, so
    /// values typed on a step but not yet committed survive Back and Next.
    pub fn next_step(&mut self) -> Result<(), StepError> {
        match self.wizard.step() {
            WizardStep::Profile => {
                let slice = self.profile.commit()?;
                self.wizard.advance(StepData::Profile(slice))?;
            }
            WizardStep::Trip => {
                let slice = self.trip.commit()?;
                self.wizard.advance(StepData::Trip(slice))?;
            }
            WizardStep::Consent => {
                return Err(StepError::WrongStep {
                    active: WizardStep::Consent,
                    submitted: WizardStep::Trip,
                })
            }
        }
        Ok(())
    }

    pub fn previous_step(&mut self) {
        if self.consent.is_busy() || self.consent.is_submitted() {
            return;
        }
        self.wizard.retreat();
    }

    /// Abandon the wizard and start over with empty forms.
    pub fn close_wizard(&mut self) {
        self.wizard.close();
        self.profile = self.wizard.mount_profile(self.max_upload_bytes);
        self.trip = self.wizard.mount_trip(self.today, self.min_start_lead_days);
        self.consent = self.wizard.mount_consent();
    }

    pub fn prepare_submission(&mut self) -> Result<SubmissionPayload, StepError> {
        self.wizard.prepare_submission(&mut self.consent, self.today)
    }

    pub fn complete_submission(&mut self, result: Result<SubmissionReceipt, ApiError>) {
        self.wizard.complete_submission(&mut self.consent, result);
    }

    pub fn drain_events(&mut self) -> Vec<WizardEvent> {
        self.wizard.drain_events()
    }

    /// Drop every piece of session data, chat included.
    pub fn reset(&mut self, config: &AppConfig) {
        info!(
            "[PHASE: session] [STEP: reset] Resetting session {}",
            self.wizard.session_id()
        );
        self.close_wizard();
        self.wizard.drain_events();
        self.chat = ChatWidget::from_config(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::PhotoFile;
    use crate::chat::ChatStep;
    use crate::models::record::{Companion, Experience, TravellerType};
    use crate::models::responses::UploadResult;
    use crate::wizard::consent::SubmissionStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn session() -> SessionState {
        SessionState::new(&AppConfig::default(), today())
    }

    fn fill_profile(s: &mut SessionState) {
        s.profile.set_name("Amara Okello");
        s.profile.set_email("amara@example.com");
        s.profile.set_phone("+256772123456");
        s.profile.set_country("Uganda");
        s.profile.set_been_to_africa(false);
        s.profile.toggle_traveller_type(TravellerType::NatureLover);
    }

    fn fill_trip(s: &mut SessionState) {
        s.trip.set_start_date(Some(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()));
        s.trip.set_end_date(Some(NaiveDate::from_ymd_opt(2026, 7, 9).unwrap()));
        for e in [
            Experience::ChimpTracking,
            Experience::Birdwatching,
            Experience::MountainHiking,
        ] {
            s.trip.toggle_experience(e);
        }
        s.trip.set_companion(Companion::Solo);
    }

    #[test]
    fn next_step_commits_and_mounts_following_form() {
        let mut s = session();
        assert!(!s.can_advance());
        fill_profile(&mut s);
        assert!(s.can_advance());

        s.next_step().unwrap();
        assert_eq!(s.step(), WizardStep::Trip);
        assert_eq!(s.trip.earliest_start(), NaiveDate::from_ymd_opt(2026, 5, 21).unwrap());

        fill_trip(&mut s);
        s.next_step().unwrap();
        assert_eq!(s.step(), WizardStep::Consent);
        assert!(s.can_advance());
        assert!(s.next_step().is_err());
    }

    #[test]
    fn previous_step_shows_committed_values() {
        let mut s = session();
        fill_profile(&mut s);
        s.next_step().unwrap();
        s.previous_step();
        assert_eq!(s.step(), WizardStep::Profile);
        assert_eq!(s.profile.name(), "Amara Okello");
        assert_eq!(s.profile.traveller_types(), &[TravellerType::NatureLover]);
    }

    #[test]
    fn successful_submission_clears_record_but_keeps_receipt() {
        let mut s = session();
        fill_profile(&mut s);
        s.next_step().unwrap();
        fill_trip(&mut s);
        s.next_step().unwrap();

        let payload = s.prepare_submission().unwrap();
        assert_eq!(payload.travel_month, "july");
        assert_eq!(payload.group_size, 1);
        assert!(!s.can_advance());

        s.complete_submission(Ok(SubmissionReceipt {
            submission_id: None,
            reference_number: "EXP-42".to_string(),
            estimated_response_time: None,
            next_steps: Vec::new(),
        }));
        assert!(s.consent.is_submitted());
        assert!(s.wizard.record().name.is_empty());

        // Back is locked once submitted.
        s.previous_step();
        assert_eq!(s.step(), WizardStep::Consent);

        s.close_wizard();
        assert_eq!(s.step(), WizardStep::Profile);
        assert_eq!(s.consent.status(), &SubmissionStatus::Idle);
        assert!(s.profile.name().is_empty());
    }

    #[test]
    fn reset_clears_chat_too() {
        let mut s = session();
        let reply = s.chat.open().unwrap();
        s.chat.deliver(reply);
        assert_eq!(s.chat.step(), ChatStep::FaqSelection);

        fill_profile(&mut s);
        s.next_step().unwrap();
        s.reset(&AppConfig::default());

        assert_eq!(s.step(), WizardStep::Profile);
        assert!(s.chat.messages().is_empty());
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn uncommitted_trip_values_survive_back_and_next() {
        let mut s = session();
        fill_profile(&mut s);
        s.next_step().unwrap();

        s.trip.set_start_date(Some(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()));
        s.trip.set_dream_words("waterfalls");
        s.previous_step();
        s.profile.set_name("Amara Nakato");
        s.next_step().unwrap();

        assert_eq!(s.step(), WizardStep::Trip);
        assert_eq!(s.trip.dream_words(), "waterfalls");
        assert_eq!(
            s.trip.start_date(),
            Some(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap())
        );
        assert_eq!(s.wizard.record().name, "Amara Nakato");
    }

    #[test]
    fn upload_from_a_closed_session_does_not_reach_the_next_one() {
        let photo = |url: &str| UploadResult {
            url: url.to_string(),
            path: String::new(),
            filename: "p.jpg".to_string(),
            size: None,
            mime_type: None,
        };
        let jpeg = PhotoFile::new("p.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]);

        let mut s = session();
        let first = s.profile.begin_upload(&jpeg).unwrap();
        s.close_wizard();
        let second = s.profile.begin_upload(&jpeg).unwrap();

        s.profile
            .finish_upload(first, Ok(photo("https://cdn.example.com/visitor-a.jpg")));
        assert_eq!(s.profile.photo_url(), None);

        s.profile
            .finish_upload(second, Ok(photo("https://cdn.example.com/visitor-b.jpg")));
        assert_eq!(
            s.profile.photo_url(),
            Some("https://cdn.example.com/visitor-b.jpg")
        );
    }
}
