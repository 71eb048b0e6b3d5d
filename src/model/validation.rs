use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

/// A field of the trip form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripField {
    CityName,
    StartDate,
    EndDate,
    Status,
    PersonalRemark,
    Rating,
    Image,
}

#[mutants::skip]
impl fmt::Display for TripField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TripField::CityName => "destination",
            TripField::StartDate => "start date",
            TripField::EndDate => "end date",
            TripField::Status => "status",
            TripField::PersonalRemark => "personal remark",
            TripField::Rating => "rating",
            TripField::Image => "cover image",
        };
        f.write_str(name)
    }
}

/// Validation errors for trip form fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingRequiredField(TripField),
    #[error("invalid {field}: {value} (expected YYYY-MM-DD)")]
    InvalidDate { field: TripField, value: String },
    #[error("start date {start} must be before or equal to end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("unknown trip status: {0}")]
    UnknownStatus(String),
    #[error("{0} is disabled for this trip")]
    FieldDisabled(TripField),
}

static CALENDAR_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid hardcoded regex"));

/// Parses a `YYYY-MM-DD` calendar date typed into `field`.
///
/// Surrounding whitespace is ignored. Empty input is reported as a missing field.
pub fn parse_date(field: TripField, text: &str) -> Result<NaiveDate, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::MissingRequiredField(field));
    }
    let invalid = || ValidationError::InvalidDate {
        field,
        value: text.to_string(),
    };
    if !CALENDAR_DATE_RE.is_match(text) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())
}

/// Checks that a trip does not end before it starts. A one-day trip is valid.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        Err(ValidationError::InvalidDateRange { start, end })
    } else {
        Ok(())
    }
}
