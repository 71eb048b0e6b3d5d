use crate::model::{ImageFile, Rating, Trip, TripField, TripStatus};

use super::preview::Preview;

/// A single typed write to the trip form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    CityName(String),
    StartDate(String),
    EndDate(String),
    Status(TripStatus),
    PersonalRemark(String),
    Rating(Option<Rating>),
}

impl FieldEdit {
    /// The field this edit writes to.
    pub fn field(&self) -> TripField {
        match self {
            FieldEdit::CityName(_) => TripField::CityName,
            FieldEdit::StartDate(_) => TripField::StartDate,
            FieldEdit::EndDate(_) => TripField::EndDate,
            FieldEdit::Status(_) => TripField::Status,
            FieldEdit::PersonalRemark(_) => TripField::PersonalRemark,
            FieldEdit::Rating(_) => TripField::Rating,
        }
    }
}

/// The in-progress values of the trip form.
///
/// Dates are held as typed text and only parsed when the form is validated.
/// Remark and rating survive a switch back to planned so toggling the status
/// twice loses nothing; they are dropped at submission instead.
#[derive(Debug, Default)]
pub struct TripDraft {
    pub(crate) city_name: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) status: TripStatus,
    pub(crate) personal_remark: String,
    pub(crate) rating: Option<Rating>,
    pub(crate) pending_image: Option<ImageFile>,
    pub(crate) preview: Option<Preview>,
}

impl TripDraft {
    /// Projects a stored trip into editable values.
    pub fn from_trip(trip: &Trip) -> Self {
        let date_text = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        Self {
            city_name: trip.city_name().unwrap_or_default().to_string(),
            start_date: date_text(trip.start_date),
            end_date: date_text(trip.end_date),
            status: trip.status,
            personal_remark: trip.personal_remark.clone().unwrap_or_default(),
            rating: trip.rating(),
            pending_image: None,
            preview: trip
                .image_url
                .as_ref()
                .filter(|url| !url.trim().is_empty())
                .map(|url| Preview::Remote(url.clone())),
        }
    }

    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    pub fn end_date(&self) -> &str {
        &self.end_date
    }

    pub fn status(&self) -> TripStatus {
        self.status
    }

    pub fn personal_remark(&self) -> &str {
        &self.personal_remark
    }

    pub fn rating(&self) -> Option<Rating> {
        self.rating
    }

    pub fn pending_image(&self) -> Option<&ImageFile> {
        self.pending_image.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }
}
