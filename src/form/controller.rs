use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use super::autocomplete::{Autocomplete, CityQuery};
use super::draft::{FieldEdit, TripDraft};
use super::preview::{Preview, PreviewStore};
use crate::api::{ApiError, TripService};
use crate::model::{
    CityRef, ImageFile, Trip, TripField, TripId, TripPayload, TripStatus, UserId, ValidationError,
    parse_date, validate_date_range,
};

/// Shown when the service rejects a submission without saying why.
pub const SUBMIT_FALLBACK_MESSAGE: &str = "Something went wrong. Please check your data.";

/// Errors from submitting the trip form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{message}")]
    Remote { message: String },
    #[error("a submission is already in progress")]
    InFlight,
}

/// The stored trip an edit form was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    pub trip_id: TripId,
    /// Status of the trip as the service last reported it.
    pub stored_status: TripStatus,
}

/// Where a submission goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    Create,
    Update(TripId),
}

/// A validated submission, detached from the form so it can be sent from
/// another task.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The form generation this submission was taken from.
    pub generation: u64,
    pub user_id: UserId,
    pub target: SubmitTarget,
    pub payload: TripPayload,
    pub image: Option<ImageFile>,
}

impl Submission {
    /// Sends the submission to the trip service.
    pub async fn send(&self, trips: &dyn TripService) -> Result<Trip, ApiError> {
        let image = self.image.as_ref();
        match self.target {
            SubmitTarget::Create => trips.create(&self.user_id, &self.payload, image).await,
            SubmitTarget::Update(trip_id) => {
                trips
                    .update(&self.user_id, trip_id, &self.payload, image)
                    .await
            }
        }
    }
}

/// State of the add/edit trip form.
///
/// Owns the draft, the city autocomplete and the local image preview. All
/// writes go through [`TripForm::set_field`] and [`TripForm::set_image`],
/// which enforce which fields are currently writable.
#[derive(Debug, Default)]
pub struct TripForm {
    draft: TripDraft,
    edit: Option<EditTarget>,
    autocomplete: Autocomplete,
    previews: PreviewStore,
    in_flight: bool,
    error: Option<String>,
    generation: u64,
}

impl TripForm {
    /// Creates an empty form for a new trip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a form seeded from `existing`, or empty when `None`.
    pub fn open(existing: Option<&Trip>) -> Self {
        let mut form = Self::new();
        form.initialize(existing);
        form
    }

    /// Seeds the form for a new trip (`None`) or for editing `existing`.
    ///
    /// Any previous local preview is released and autocomplete and
    /// submission state are reset. Starts a new generation, so results of
    /// work begun before this call can be told apart.
    pub fn initialize(&mut self, existing: Option<&Trip>) {
        self.generation += 1;
        match existing {
            Some(trip) => {
                self.draft = TripDraft::from_trip(trip);
                self.edit = Some(EditTarget {
                    trip_id: trip.trip_id,
                    stored_status: trip.status,
                });
            }
            None => {
                self.draft = TripDraft::default();
                self.edit = None;
            }
        }
        self.autocomplete.reset();
        self.in_flight = false;
        self.error = None;
    }

    /// Writes one field.
    ///
    /// City edits return the lookup to run for suggestions, if any. Writes to
    /// a disabled field fail and leave the draft untouched.
    pub fn set_field(&mut self, edit: FieldEdit) -> Result<Option<CityQuery>, ValidationError> {
        let field = edit.field();
        if !self.is_enabled(field) {
            return Err(ValidationError::FieldDisabled(field));
        }
        let query = match edit {
            FieldEdit::CityName(name) => {
                let query = self.autocomplete.query(&name);
                self.draft.city_name = name;
                query
            }
            FieldEdit::StartDate(text) => {
                self.draft.start_date = text;
                None
            }
            FieldEdit::EndDate(text) => {
                self.draft.end_date = text;
                None
            }
            FieldEdit::Status(status) => {
                self.draft.status = status;
                None
            }
            FieldEdit::PersonalRemark(text) => {
                self.draft.personal_remark = text;
                None
            }
            FieldEdit::Rating(rating) => {
                self.draft.rating = rating;
                None
            }
        };
        self.error = None;
        Ok(query)
    }

    /// Replaces the pending cover image and its local preview.
    pub fn set_image(&mut self, image: ImageFile) -> Result<(), ValidationError> {
        if !self.is_enabled(TripField::Image) {
            return Err(ValidationError::FieldDisabled(TripField::Image));
        }
        let preview = self.previews.create(image.bytes.clone());
        debug!(file = %image.file_name, bytes = image.len(), "cover image selected");
        self.draft.preview = Some(Preview::Local(preview));
        self.draft.pending_image = Some(image);
        self.error = None;
        Ok(())
    }

    /// Whether `field` currently accepts writes.
    pub fn is_enabled(&self, field: TripField) -> bool {
        match field {
            TripField::PersonalRemark | TripField::Rating => self.draft.status.is_visited(),
            TripField::Image => !matches!(
                self.edit,
                Some(EditTarget {
                    stored_status: TripStatus::ToBeVisited,
                    ..
                })
            ),
            TripField::CityName | TripField::StartDate | TripField::EndDate | TripField::Status => {
                true
            }
        }
    }

    /// Checks required fields, date syntax and date order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.checked_dates().map(|_| ())
    }

    fn checked_dates(&self) -> Result<(NaiveDate, NaiveDate), ValidationError> {
        let required = [
            (TripField::CityName, &self.draft.city_name),
            (TripField::StartDate, &self.draft.start_date),
            (TripField::EndDate, &self.draft.end_date),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ValidationError::MissingRequiredField(*field));
        }
        let start = parse_date(TripField::StartDate, &self.draft.start_date)?;
        let end = parse_date(TripField::EndDate, &self.draft.end_date)?;
        validate_date_range(start, end)?;
        Ok((start, end))
    }

    /// Validates and builds the payload to send.
    ///
    /// Remark and rating are only sent for visited trips.
    pub fn build_submission(&self) -> Result<TripPayload, ValidationError> {
        let (start_date, end_date) = self.checked_dates()?;
        let visited = self.draft.status.is_visited();
        let personal_remark = Some(&self.draft.personal_remark)
            .filter(|remark| visited && !remark.trim().is_empty())
            .cloned();
        Ok(TripPayload {
            city: CityRef {
                name: self.draft.city_name.trim().to_string(),
            },
            start_date,
            end_date,
            status: self.draft.status,
            personal_remark,
            rating: self.draft.rating.filter(|_| visited),
        })
    }

    /// Starts a submission for `user_id`.
    ///
    /// Fails with [`SubmitError::InFlight`] while an earlier submission has
    /// not finished. Validation failures are kept as the inline error.
    pub fn begin_submit(&mut self, user_id: &UserId) -> Result<Submission, SubmitError> {
        if self.in_flight {
            return Err(SubmitError::InFlight);
        }
        let payload = match self.build_submission() {
            Ok(payload) => payload,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };
        self.in_flight = true;
        self.error = None;
        Ok(Submission {
            generation: self.generation,
            user_id: user_id.clone(),
            target: self.submit_target(),
            payload,
            image: self.draft.pending_image.clone(),
        })
    }

    /// Completes the in-flight submission with the service's answer.
    ///
    /// On failure the form stays open with the server's message, or a
    /// generic one, as its inline error.
    pub fn finish_submit(&mut self, result: Result<Trip, ApiError>) -> Result<Trip, SubmitError> {
        self.in_flight = false;
        match result {
            Ok(trip) => {
                debug!(trip_id = trip.trip_id, "trip saved");
                self.error = None;
                Ok(trip)
            }
            Err(e) => {
                warn!(error = %e, "trip submission failed");
                let message = e.user_message(SUBMIT_FALLBACK_MESSAGE);
                self.error = Some(message.clone());
                Err(SubmitError::Remote { message })
            }
        }
    }

    /// Submits the form through `trips`: create for a new trip, update
    /// otherwise. There is no retry.
    pub async fn submit(
        &mut self,
        trips: &dyn TripService,
        user_id: &UserId,
    ) -> Result<Trip, SubmitError> {
        let submission = self.begin_submit(user_id)?;
        let result = submission.send(trips).await;
        self.finish_submit(result)
    }

    /// Discards the draft and releases any local preview.
    pub fn close(&mut self) {
        self.initialize(None);
    }

    /// Commits the autocomplete suggestion at `index` into the city field.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        let picked = self.autocomplete.select(index);
        self.commit_city(picked)
    }

    /// Commits the highlighted suggestion, if any.
    pub fn select_highlighted(&mut self) -> bool {
        let picked = self.autocomplete.select_highlighted();
        self.commit_city(picked)
    }

    fn commit_city(&mut self, picked: Option<String>) -> bool {
        match picked {
            Some(name) => {
                self.draft.city_name = name;
                self.error = None;
                true
            }
            None => false,
        }
    }

    pub fn submit_target(&self) -> SubmitTarget {
        match self.edit {
            Some(target) => SubmitTarget::Update(target.trip_id),
            None => SubmitTarget::Create,
        }
    }

    pub fn draft(&self) -> &TripDraft {
        &self.draft
    }

    pub fn autocomplete(&self) -> &Autocomplete {
        &self.autocomplete
    }

    pub fn autocomplete_mut(&mut self) -> &mut Autocomplete {
        &mut self.autocomplete
    }

    pub fn edit_target(&self) -> Option<EditTarget> {
        self.edit
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Identifies the current open/close cycle of the form.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The inline error shown under the form, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }
}
