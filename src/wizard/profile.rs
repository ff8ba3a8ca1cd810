// Step 1: "Traveller Vibes" (identity, profile and optional travel photo).

use log::{info, warn};
use uuid::Uuid;

use super::fields::FieldTracker;
use super::StepError;
use crate::api::client::{ApiError, LeadApi, PhotoFile, UPLOAD_KIND_TRAVEL_PHOTO};
use crate::models::record::{
    HearAboutUs, PioneerTraveller, ProfileSlice, TravellerType, WizardRecord,
};
use crate::models::responses::UploadResult;
use crate::utils::countries::{self, Country};
use crate::utils::validation::{self, MAX_TRAVELLER_TYPES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Name,
    Email,
    Phone,
    Country,
    BeenToAfrica,
    TravellerType,
    Photo,
}

impl ProfileField {
    pub const ALL: [ProfileField; 7] = [
        ProfileField::Name,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::Country,
        ProfileField::BeenToAfrica,
        ProfileField::TravellerType,
        ProfileField::Photo,
    ];

    pub fn as_id(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
            ProfileField::Country => "country_of_residence",
            ProfileField::BeenToAfrica => "been_to_africa_before",
            ProfileField::TravellerType => "traveller_type",
            ProfileField::Photo => "travel_photo",
        }
    }
}

/// Identifies one upload attempt. Results are only applied to the attempt that asked
/// for them, so a reply from a closed session or a replaced file is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket(Uuid);

/// Photo upload lifecycle: `Idle -> Uploading -> Succeeded | Failed`. A new file selection
/// starts over from the top; nothing retries on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading {
        file_name: String,
        ticket: UploadTicket,
    },
    Succeeded { url: String },
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct ProfileForm {
    name: String,
    email: String,
    phone: String,
    country_of_residence: String,
    country_search: String,
    been_to_africa: Option<bool>,
    traveller_type: Vec<TravellerType>,
    hear_about_us: Option<HearAboutUs>,
    pioneer_traveller: Option<PioneerTraveller>,
    photo_url: Option<String>,
    upload: UploadStatus,
    max_upload_bytes: u64,
    fields: FieldTracker<ProfileField>,
}

impl ProfileForm {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            country_of_residence: String::new(),
            country_search: String::new(),
            been_to_africa: None,
            traveller_type: Vec::new(),
            hear_about_us: None,
            pioneer_traveller: None,
            photo_url: None,
            upload: UploadStatus::Idle,
            max_upload_bytes,
            fields: FieldTracker::default(),
        }
    }

    /// Rebuild the form from the record (used when navigating back to step 1).
    pub fn from_record(record: &WizardRecord, max_upload_bytes: u64) -> Self {
        let mut form = Self::new(max_upload_bytes);
        form.name = record.name.clone();
        form.email = record.email.clone();
        form.phone = record.phone.clone();
        form.country_of_residence = record.country_of_residence.clone();
        form.been_to_africa = record.been_to_africa_before;
        form.traveller_type = record.traveller_type.clone();
        form.hear_about_us = record.hear_about_us;
        form.pioneer_traveller = record.pioneer_traveller;
        form.photo_url = record.photo_url.clone();
        if let Some(url) = &record.photo_url {
            form.upload = UploadStatus::Succeeded { url: url.clone() };
        }
        form
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn country(&self) -> &str {
        &self.country_of_residence
    }

    pub fn country_search(&self) -> &str {
        &self.country_search
    }

    pub fn been_to_africa(&self) -> Option<bool> {
        self.been_to_africa
    }

    pub fn traveller_types(&self) -> &[TravellerType] {
        &self.traveller_type
    }

    pub fn hear_about_us(&self) -> Option<HearAboutUs> {
        self.hear_about_us
    }

    pub fn pioneer_traveller(&self) -> Option<PioneerTraveller> {
        self.pioneer_traveller
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn upload_status(&self) -> &UploadStatus {
        &self.upload
    }

    pub fn visible_error(&self, field: ProfileField) -> Option<&str> {
        self.fields.visible_error(field)
    }

    // ---------------------------------------------------------------------
    // Setters: write, touch, re-validate that one field
    // ---------------------------------------------------------------------

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
        self.touch_and_validate(ProfileField::Name);
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.email = value.into();
        self.touch_and_validate(ProfileField::Email);
    }

    pub fn set_phone(&mut self, value: impl Into<String>) {
        self.phone = value.into();
        self.touch_and_validate(ProfileField::Phone);
    }

    /// Set the phone from the picker's dial code plus the locally typed number.
    pub fn set_phone_parts(&mut self, dial_code: &str, local: &str) {
        self.set_phone(countries::compose_phone(dial_code, local));
    }

    pub fn set_country(&mut self, value: impl Into<String>) {
        let value = value.into();
        // Store the catalogue spelling when the user typed a case variant.
        self.country_of_residence = countries::find_country(&value)
            .map(|c| c.name.to_string())
            .unwrap_or(value);
        self.touch_and_validate(ProfileField::Country);
    }

    pub fn set_country_search(&mut self, value: impl Into<String>) {
        self.country_search = value.into();
    }

    pub fn country_options(&self) -> Vec<&'static Country> {
        countries::filter_countries(&self.country_search)
    }

    pub fn set_been_to_africa(&mut self, value: bool) {
        self.been_to_africa = Some(value);
        self.touch_and_validate(ProfileField::BeenToAfrica);
    }

    /// Toggle a traveller type. Adding a fourth is refused (returns `false`).
    pub fn toggle_traveller_type(&mut self, t: TravellerType) -> bool {
        let changed = if let Some(pos) = self.traveller_type.iter().position(|x| *x == t) {
            self.traveller_type.remove(pos);
            true
        } else if self.traveller_type.len() < MAX_TRAVELLER_TYPES {
            self.traveller_type.push(t);
            true
        } else {
            false
        };
        self.touch_and_validate(ProfileField::TravellerType);
        changed
    }

    pub fn is_traveller_type_disabled(&self, t: TravellerType) -> bool {
        self.traveller_type.len() >= MAX_TRAVELLER_TYPES && !self.traveller_type.contains(&t)
    }

    pub fn set_hear_about_us(&mut self, value: HearAboutUs) {
        self.hear_about_us = Some(value);
    }

    pub fn set_pioneer_traveller(&mut self, value: PioneerTraveller) {
        self.pioneer_traveller = Some(value);
    }

    /// Clears the photo. A running upload is abandoned and its result will be dropped.
    pub fn remove_photo(&mut self) {
        self.photo_url = None;
        self.upload = UploadStatus::Idle;
        self.touch_and_validate(ProfileField::Photo);
    }

    // ---------------------------------------------------------------------
    // Photo upload
    // ---------------------------------------------------------------------

    /// Start an upload for a newly selected file. Returns `None` (and moves to `Failed`)
    /// when the file is rejected locally, or when another upload is still running. The
    /// ticket must be handed back to `finish_upload`.
    pub fn begin_upload(&mut self, file: &PhotoFile) -> Option<UploadTicket> {
        if matches!(self.upload, UploadStatus::Uploading { .. }) {
            return None;
        }
        if let Err(e) = file.check(self.max_upload_bytes) {
            warn!(
                "[PHASE: wizard] [STEP: upload] Rejected {} before upload: {}",
                file.file_name, e
            );
            self.upload = UploadStatus::Failed {
                message: e.to_string(),
            };
            return None;
        }
        let ticket = UploadTicket(Uuid::new_v4());
        self.upload = UploadStatus::Uploading {
            file_name: file.file_name.clone(),
            ticket,
        };
        Some(ticket)
    }

    /// The picked file could not be read at all.
    pub fn reject_file(&mut self, message: impl Into<String>) {
        if matches!(self.upload, UploadStatus::Uploading { .. }) {
            return;
        }
        self.upload = UploadStatus::Failed {
            message: message.into(),
        };
    }

    /// Apply the upload outcome. Only a success with an absolute URL writes `photo_url`;
    /// a result for any ticket other than the running one is ignored.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadResult, ApiError>,
    ) {
        match &self.upload {
            UploadStatus::Uploading { ticket: running, .. } if *running == ticket => {}
            _ => {
                info!("[PHASE: wizard] [STEP: upload] Dropping result of a stale upload");
                return;
            }
        }
        match result {
            Ok(uploaded) => {
                if validation::validate_photo_url(Some(&uploaded.url)).is_err() {
                    warn!(
                        "[PHASE: wizard] [STEP: upload] Upload returned unusable URL {:?}",
                        uploaded.url
                    );
                    self.upload = UploadStatus::Failed {
                        message: "Upload failed: the server did not return a usable photo link"
                            .to_string(),
                    };
                    return;
                }
                info!(
                    "[PHASE: wizard] [STEP: upload] Photo uploaded as {}",
                    uploaded.filename
                );
                self.photo_url = Some(uploaded.url.clone());
                self.upload = UploadStatus::Succeeded { url: uploaded.url };
                self.touch_and_validate(ProfileField::Photo);
            }
            Err(e) => {
                self.upload = UploadStatus::Failed {
                    message: e.to_string(),
                };
            }
        }
    }

    /// Run a full upload against `api`.
    pub async fn upload_photo(&mut self, api: &dyn LeadApi, file: PhotoFile) {
        let Some(ticket) = self.begin_upload(&file) else {
            return;
        };
        let result = api.upload_file(&file, UPLOAD_KIND_TRAVEL_PHOTO).await;
        self.finish_upload(ticket, result);
    }

    // ---------------------------------------------------------------------
    // Gate + commit
    // ---------------------------------------------------------------------

    fn validate_field(&self, field: ProfileField) -> anyhow::Result<()> {
        match field {
            ProfileField::Name => validation::validate_name(&self.name),
            ProfileField::Email => validation::validate_email(&self.email),
            ProfileField::Phone => validation::validate_phone(&self.phone),
            ProfileField::Country => validation::validate_country(&self.country_of_residence),
            ProfileField::BeenToAfrica => match self.been_to_africa {
                Some(_) => Ok(()),
                None => Err(anyhow::anyhow!(
                    "Please let us know if you've been to Africa before"
                )),
            },
            ProfileField::TravellerType => validation::validate_selection_count(
                self.traveller_type.len(),
                1,
                MAX_TRAVELLER_TYPES,
                "traveller types",
            ),
            ProfileField::Photo => validation::validate_photo_url(self.photo_url.as_deref()),
        }
    }

    fn touch_and_validate(&mut self, field: ProfileField) {
        self.fields.touch(field);
        let outcome = self.validate_field(field);
        self.fields.record(field, outcome);
    }

    /// Whether "Next" is enabled.
    pub fn can_advance(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.country_of_residence.trim().is_empty()
            && self.been_to_africa.is_some()
            && !self.traveller_type.is_empty()
            && !matches!(self.upload, UploadStatus::Uploading { .. })
            && ProfileField::ALL
                .iter()
                .all(|f| self.validate_field(*f).is_ok())
    }

    /// Validate every field (marking all touched) and produce the step's slice.
    pub fn commit(&mut self) -> Result<ProfileSlice, StepError> {
        if matches!(self.upload, UploadStatus::Uploading { .. }) {
            return Err(StepError::UploadInProgress);
        }

        let mut first_error = None;
        for field in ProfileField::ALL {
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

        Ok(ProfileSlice {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: validation::normalize_phone(self.phone.trim()),
            country_of_residence: self.country_of_residence.trim().to_string(),
            been_to_africa_before: self.been_to_africa.unwrap_or(false),
            traveller_type: self.traveller_type.clone(),
            hear_about_us: self.hear_about_us,
            pioneer_traveller: self.pioneer_traveller,
            photo_url: self.photo_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::models::requests::SubmissionPayload;
    use crate::models::responses::SubmissionReceipt;

    const MAX: u64 = 5 * 1024 * 1024;

    struct UploadStub {
        result: Result<UploadResult, ApiError>,
    }

    #[async_trait]
    impl LeadApi for UploadStub {
        async fn upload_file(
            &self,
            _file: &PhotoFile,
            _kind: &str,
        ) -> Result<UploadResult, ApiError> {
            self.result.clone()
        }

        async fn submit(
            &self,
            _payload: &SubmissionPayload,
        ) -> Result<SubmissionReceipt, ApiError> {
            Err(ApiError::Network("not used".to_string()))
        }
    }

    fn uploaded(url: &str) -> UploadResult {
        UploadResult {
            url: url.to_string(),
            path: "uploads/p.jpg".to_string(),
            filename: "p.jpg".to_string(),
            size: Some(3),
            mime_type: Some("image/jpeg".to_string()),
        }
    }

    fn jpeg() -> PhotoFile {
        PhotoFile::new("p.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    fn filled() -> ProfileForm {
        let mut f = ProfileForm::new(MAX);
        f.set_name("Jo");
        f.set_email("jo@x.com");
        f.set_phone("+256700000000");
        f.set_country("Uganda");
        f.set_been_to_africa(true);
        f.toggle_traveller_type(TravellerType::Adventurer);
        f
    }

    #[test]
    fn jo_scenario_passes_the_gate() {
        let mut f = filled();
        assert!(f.can_advance());
        let slice = f.commit().unwrap();
        assert_eq!(slice.name, "Jo");
        assert_eq!(slice.country_of_residence, "Uganda");
        assert!(slice.been_to_africa_before);
        assert_eq!(slice.traveller_type, vec![TravellerType::Adventurer]);
    }

    #[test]
    fn fresh_form_shows_no_errors_and_is_gated() {
        let f = ProfileForm::new(MAX);
        assert!(!f.can_advance());
        for field in ProfileField::ALL {
            assert_eq!(f.visible_error(field), None);
        }
    }

    #[test]
    fn touched_invalid_field_shows_error() {
        let mut f = ProfileForm::new(MAX);
        f.set_email("nope");
        assert_eq!(
            f.visible_error(ProfileField::Email),
            Some("Please enter a valid email address")
        );
        assert_eq!(f.visible_error(ProfileField::Name), None);
        f.set_email("jo@x.com");
        assert_eq!(f.visible_error(ProfileField::Email), None);
    }

    #[test]
    fn missing_been_to_africa_blocks_advance() {
        let mut f = ProfileForm::new(MAX);
        f.set_name("Jo");
        f.set_email("jo@x.com");
        f.set_phone("+256700000000");
        f.set_country("Uganda");
        f.toggle_traveller_type(TravellerType::NatureLover);
        assert!(!f.can_advance());
        let err = f.commit().unwrap_err();
        assert!(matches!(
            err,
            StepError::Invalid {
                field: "been_to_africa_before",
                ..
            }
        ));
    }

    #[test]
    fn invalid_name_blocks_even_when_present() {
        let mut f = filled();
        f.set_name("J0hn");
        assert!(!f.can_advance());
    }

    #[test]
    fn commit_touches_every_field() {
        let mut f = ProfileForm::new(MAX);
        assert!(f.commit().is_err());
        assert_eq!(f.visible_error(ProfileField::Name), Some("Name is required"));
        assert!(f.visible_error(ProfileField::TravellerType).is_some());
    }

    #[test]
    fn country_case_is_normalised() {
        let mut f = ProfileForm::new(MAX);
        f.set_country("uganda");
        assert_eq!(f.country(), "Uganda");
        assert_eq!(f.visible_error(ProfileField::Country), None);
    }

    #[test]
    fn phone_parts_compose_e164() {
        let mut f = ProfileForm::new(MAX);
        f.set_phone_parts("+256", "0700 000 000");
        assert_eq!(f.phone(), "+256700000000");
        assert_eq!(f.visible_error(ProfileField::Phone), None);
    }

    #[test]
    fn fourth_traveller_type_is_refused() {
        let mut f = ProfileForm::new(MAX);
        assert!(f.toggle_traveller_type(TravellerType::Adventurer));
        assert!(f.toggle_traveller_type(TravellerType::CultureSeeker));
        assert!(f.toggle_traveller_type(TravellerType::NatureLover));
        assert!(f.is_traveller_type_disabled(TravellerType::SocialButterfly));
        assert!(!f.toggle_traveller_type(TravellerType::SocialButterfly));
        assert_eq!(f.traveller_types().len(), 3);
        // Deselecting re-enables the rest.
        assert!(f.toggle_traveller_type(TravellerType::Adventurer));
        assert!(!f.is_traveller_type_disabled(TravellerType::SocialButterfly));
    }

    #[tokio::test]
    async fn successful_upload_sets_photo() {
        let mut f = filled();
        let api = UploadStub {
            result: Ok(uploaded("https://cdn.example.com/p.jpg")),
        };
        f.upload_photo(&api, jpeg()).await;
        assert_eq!(f.photo_url(), Some("https://cdn.example.com/p.jpg"));
        assert_eq!(
            f.upload_status(),
            &UploadStatus::Succeeded {
                url: "https://cdn.example.com/p.jpg".to_string()
            }
        );
        assert_eq!(
            f.commit().unwrap().photo_url.as_deref(),
            Some("https://cdn.example.com/p.jpg")
        );
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_photo() {
        let mut f = filled();
        let ok = UploadStub {
            result: Ok(uploaded("https://cdn.example.com/first.jpg")),
        };
        f.upload_photo(&ok, jpeg()).await;

        let failing = UploadStub {
            result: Err(ApiError::Timeout),
        };
        f.upload_photo(&failing, jpeg()).await;

        assert_eq!(f.photo_url(), Some("https://cdn.example.com/first.jpg"));
        assert!(matches!(f.upload_status(), UploadStatus::Failed { .. }));
        assert!(f.can_advance());
    }

    #[tokio::test]
    async fn failed_first_upload_leaves_photo_empty() {
        let mut f = filled();
        let failing = UploadStub {
            result: Err(ApiError::Server {
                status: 500,
                message: "Storage offline".to_string(),
            }),
        };
        f.upload_photo(&failing, jpeg()).await;
        assert_eq!(f.photo_url(), None);
        assert_eq!(
            f.upload_status(),
            &UploadStatus::Failed {
                message: "Storage offline".to_string()
            }
        );
    }

    #[test]
    fn non_image_is_rejected_without_network() {
        let mut f = filled();
        let pdf = PhotoFile::new("cv.pdf", "application/pdf", vec![1, 2]);
        assert!(f.begin_upload(&pdf).is_none());
        assert!(matches!(f.upload_status(), UploadStatus::Failed { .. }));
        assert_eq!(f.photo_url(), None);
    }

    #[test]
    fn uploading_blocks_advance_and_ignores_stale_results() {
        let mut f = filled();
        let ticket = f.begin_upload(&jpeg()).unwrap();
        assert!(!f.can_advance());
        assert!(matches!(f.commit(), Err(StepError::UploadInProgress)));
        // A second selection while uploading is refused.
        assert!(f.begin_upload(&jpeg()).is_none());

        f.finish_upload(ticket, Ok(uploaded("https://cdn.example.com/p.jpg")));
        assert!(f.can_advance());

        // Nothing is uploading now, so a late result is dropped.
        f.finish_upload(ticket, Ok(uploaded("https://cdn.example.com/late.jpg")));
        assert_eq!(f.photo_url(), Some("https://cdn.example.com/p.jpg"));
    }

    #[test]
    fn result_for_an_earlier_upload_is_not_applied_to_a_new_one() {
        let mut first = filled();
        let old_ticket = first.begin_upload(&jpeg()).unwrap();

        // The visitor leaves and the next one starts an upload on a fresh form.
        let mut f = filled();
        let ticket = f.begin_upload(&jpeg()).unwrap();
        assert_ne!(old_ticket, ticket);

        f.finish_upload(old_ticket, Ok(uploaded("https://cdn.example.com/visitor-a.jpg")));
        assert_eq!(f.photo_url(), None);
        assert!(matches!(f.upload_status(), UploadStatus::Uploading { .. }));

        f.finish_upload(ticket, Ok(uploaded("https://cdn.example.com/visitor-b.jpg")));
        assert_eq!(f.photo_url(), Some("https://cdn.example.com/visitor-b.jpg"));
    }

    #[test]
    fn removing_photo_abandons_running_upload() {
        let mut f = filled();
        let ticket = f.begin_upload(&jpeg()).unwrap();
        f.remove_photo();
        assert_eq!(f.upload_status(), &UploadStatus::Idle);

        f.finish_upload(ticket, Ok(uploaded("https://cdn.example.com/p.jpg")));
        assert_eq!(f.photo_url(), None);
        assert!(f.can_advance());
    }

    #[test]
    fn relative_upload_url_is_treated_as_failure() {
        let mut f = filled();
        let ok = f.begin_upload(&jpeg()).unwrap();
        f.finish_upload(ok, Ok(uploaded("https://cdn.example.com/first.jpg")));

        let ticket = f.begin_upload(&jpeg()).unwrap();
        f.finish_upload(ticket, Ok(uploaded("/storage/uploads/a.jpg")));

        assert!(matches!(f.upload_status(), UploadStatus::Failed { .. }));
        assert_eq!(f.photo_url(), Some("https://cdn.example.com/first.jpg"));
        assert_eq!(f.visible_error(ProfileField::Photo), None);
        assert!(f.can_advance());
    }

    #[test]
    fn from_record_round_trips_committed_values() {
        let mut f = filled();
        let slice = f.commit().unwrap();
        let mut record = WizardRecord::default();
        record.merge(crate::models::record::StepData::Profile(slice));

        let again = ProfileForm::from_record(&record, MAX);
        assert_eq!(again.name(), "Jo");
        assert_eq!(again.been_to_africa(), Some(true));
        assert!(again.can_advance());
    }
}
