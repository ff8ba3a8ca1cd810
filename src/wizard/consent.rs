// Step 3: "Explorer Circle" (email opt-in and the one-shot submission).

use chrono::NaiveDate;
use log::{info, warn};

use super::StepError;
use crate::api::client::ApiError;
use crate::models::record::{ConsentSlice, WizardRecord};
use crate::models::requests::SubmissionPayload;
use crate::models::responses::SubmissionReceipt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Submitted(SubmissionReceipt),
    /// Message first, then one bullet per backend field error.
    Failed { lines: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct ConsentForm {
    keep_updated: bool,
    status: SubmissionStatus,
}

impl ConsentForm {
    pub fn new() -> Self {
        Self {
            keep_updated: false,
            status: SubmissionStatus::Idle,
        }
    }

    pub fn from_record(record: &WizardRecord) -> Self {
        Self {
            keep_updated: record.keep_updated,
            status: SubmissionStatus::Idle,
        }
    }

    pub fn keep_updated(&self) -> bool {
        self.keep_updated
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Submit control is disabled (busy indicator) while a request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitting)
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitted(_))
    }

    /// Checkbox is locked while submitting and after success.
    pub fn set_keep_updated(&mut self, value: bool) {
        if self.is_busy() || self.is_submitted() {
            return;
        }
        self.keep_updated = value;
    }

    pub fn slice(&self) -> ConsentSlice {
        ConsentSlice {
            keep_updated: self.keep_updated,
        }
    }

    /// Move to `Submitting` and build the payload. At most one submission may be in
    /// flight, and a submitted form cannot be sent again.
    pub fn begin_submit(
        &mut self,
        record: &WizardRecord,
        today: NaiveDate,
    ) -> Result<SubmissionPayload, StepError> {
        match self.status {
            SubmissionStatus::Submitting => return Err(StepError::SubmissionInFlight),
            SubmissionStatus::Submitted(_) => return Err(StepError::AlreadySubmitted),
            _ => {}
        }
        self.status = SubmissionStatus::Submitting;
        Ok(SubmissionPayload::from_record(record, today))
    }

    /// Apply the outcome. Returns `true` when the submission was accepted. Outcomes that
    /// arrive while nothing is in flight are ignored.
    pub fn finish_submit(&mut self, result: Result<SubmissionReceipt, ApiError>) -> bool {
        if !self.is_busy() {
            warn!("[PHASE: wizard] [STEP: submit] Ignoring submission result with no request in flight");
            return false;
        }
        match result {
            Ok(receipt) => {
                info!(
                    "[PHASE: wizard] [STEP: submit] Submitted, reference {}",
                    receipt.reference_number
                );
                self.status = SubmissionStatus::Submitted(receipt);
                true
            }
            Err(e) => {
                self.status = SubmissionStatus::Failed {
                    lines: e.display_lines(),
                };
                false
            }
        }
    }
}

impl Default for ConsentForm {
    fn default() -> Self {
        Self::new()
    }
}
