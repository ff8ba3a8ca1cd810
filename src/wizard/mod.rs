//! Three-step lead-capture wizard.
//!
//! The controller owns the accumulating [`WizardRecord`] and the step cursor. Each step
//! form owns its own field state and only hands the controller a validated slice when
//! the user presses "Next". Navigation is strictly linear; `close` is available from
//! every step.

pub mod consent;
pub mod fields;
pub mod profile;
pub mod trip;

use chrono::NaiveDate;
use log::info;
use uuid::Uuid;

use crate::api::client::{ApiError, LeadApi};
use crate::models::record::{StepData, WizardRecord};
use crate::models::requests::SubmissionPayload;
use crate::models::responses::SubmissionReceipt;
use consent::ConsentForm;
use profile::ProfileForm;
use trip::TripForm;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("Please wait for the photo upload to finish")]
    UploadInProgress,
    #[error("{submitted:?} data cannot be applied while on the {active:?} step")]
    WrongStep {
        active: WizardStep,
        submitted: WizardStep,
    },
    #[error("A submission is already in progress")]
    SubmissionInFlight,
    #[error("This form has already been submitted")]
    AlreadySubmitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Profile,
    Trip,
    Consent,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Profile => 1,
            WizardStep::Trip => 2,
            WizardStep::Consent => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Profile => "Traveller Vibes",
            WizardStep::Trip => "Dream Trip",
            WizardStep::Consent => "Explorer Circle",
        }
    }

    fn next(&self) -> Option<Self> {
        match self {
            WizardStep::Profile => Some(WizardStep::Trip),
            WizardStep::Trip => Some(WizardStep::Consent),
            WizardStep::Consent => None,
        }
    }

    fn prev(&self) -> Option<Self> {
        match self {
            WizardStep::Profile => None,
            WizardStep::Trip => Some(WizardStep::Profile),
            WizardStep::Consent => Some(WizardStep::Trip),
        }
    }

    fn of(data: &StepData) -> Self {
        match data {
            StepData::Profile(_) => WizardStep::Profile,
            StepData::Trip(_) => WizardStep::Trip,
            StepData::Consent(_) => WizardStep::Consent,
        }
    }
}

/// Side effects the front end should perform after a controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    ScrollToTop,
    NavigateHome,
    Submitted { reference_number: String },
}

#[derive(Debug)]
pub struct WizardController {
    session_id: Uuid,
    step: WizardStep,
    record: WizardRecord,
    events: Vec<WizardEvent>,
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            step: WizardStep::Profile,
            record: WizardRecord::default(),
            events: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn record(&self) -> &WizardRecord {
        &self.record
    }

    /// Take the queued side effects.
    pub fn drain_events(&mut self) -> Vec<WizardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Merge a committed slice and move forward. The slice must belong to the active
    /// step; on the last step the data is merged and the cursor stays put.
    pub fn advance(&mut self, data: StepData) -> Result<(), StepError> {
        let submitted = WizardStep::of(&data);
        if submitted != self.step {
            return Err(StepError::WrongStep {
                active: self.step,
                submitted,
            });
        }

        self.record.merge(data);
        if let Some(next) = self.step.next() {
            info!(
                "[PHASE: wizard] [STEP: advance] Session {} moved to step {}",
                self.session_id,
                next.number()
            );
            self.step = next;
            self.events.push(WizardEvent::ScrollToTop);
        }
        Ok(())
    }

    /// Step back one page. Entered data is kept.
    pub fn retreat(&mut self) {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
    }

    /// Abandon the session: clear everything and go home.
    pub fn close(&mut self) {
        info!(
            "[PHASE: wizard] [STEP: close] Session {} closed on step {}",
            self.session_id,
            self.step.number()
        );
        self.step = WizardStep::Profile;
        self.record = WizardRecord::default();
        self.session_id = Uuid::new_v4();
        self.events.push(WizardEvent::NavigateHome);
    }

    // ---------------------------------------------------------------------
    // Step forms rebuilt from the record
    // ---------------------------------------------------------------------

    pub fn mount_profile(&self, max_upload_bytes: u64) -> ProfileForm {
        ProfileForm::from_record(&self.record, max_upload_bytes)
    }

    pub fn mount_trip(&self, today: NaiveDate, min_lead_days: i64) -> TripForm {
        TripForm::from_record(&self.record, today, min_lead_days)
    }

    pub fn mount_consent(&self) -> ConsentForm {
        ConsentForm::from_record(&self.record)
    }

    // ---------------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------------

    /// Merge the consent slice and put the form into `Submitting`.
    pub fn prepare_submission(
        &mut self,
        consent: &mut ConsentForm,
        today: NaiveDate,
    ) -> Result<SubmissionPayload, StepError> {
        if self.step != WizardStep::Consent {
            return Err(StepError::WrongStep {
                active: self.step,
                submitted: WizardStep::Consent,
            });
        }
        if consent.is_busy() {
            return Err(StepError::SubmissionInFlight);
        }
        self.advance(StepData::Consent(consent.slice()))?;
        consent.begin_submit(&self.record, today)
    }

    /// Apply the backend's answer. On success the record is discarded; the receipt stays
    /// on the consent form for the "submitted" view.
    pub fn complete_submission(
        &mut self,
        consent: &mut ConsentForm,
        result: Result<SubmissionReceipt, ApiError>,
    ) {
        let reference = result.as_ref().ok().map(|r| r.reference_number.clone());
        if consent.finish_submit(result) {
            self.record = WizardRecord::default();
            if let Some(reference_number) = reference {
                self.events.push(WizardEvent::Submitted { reference_number });
            }
        }
    }

    /// Full submit sequence against `api`.
    pub async fn submit(
        &mut self,
        consent: &mut ConsentForm,
        api: &dyn LeadApi,
        today: NaiveDate,
    ) -> Result<(), StepError> {
        let payload = self.prepare_submission(consent, today)?;
        let result = api.submit(&payload).await;
        self.complete_submission(consent, result);
        Ok(())
    }
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}
