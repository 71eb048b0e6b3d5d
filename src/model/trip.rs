use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::rating::Rating;
use super::status::TripStatus;

/// Backend identifier of a trip.
pub type TripId = i64;

/// A city as embedded in a trip record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The canonical trip record owned by the trip service.
///
/// The client only ever holds copies; a copy is stale as soon as anything
/// other than its own latest submit touches the trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub trip_id: TripId,
    #[serde(default)]
    pub city: Option<City>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TripStatus,
    #[serde(default)]
    pub personal_remark: Option<String>,
    /// Raw rating from the service; see [`Trip::rating`] for the checked value.
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Trip {
    /// Returns the destination name, if the record has one.
    pub fn city_name(&self) -> Option<&str> {
        self.city
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Returns the rating when it is within `1..=5`.
    pub fn rating(&self) -> Option<Rating> {
        self.rating.and_then(|r| Rating::new(r).ok())
    }

    /// Returns the non-empty personal remark, if any.
    pub fn remark(&self) -> Option<&str> {
        self.personal_remark
            .as_deref()
            .filter(|remark| !remark.trim().is_empty())
    }

    /// Number of calendar days covered by the trip, both ends inclusive.
    ///
    /// Returns `0` when either date is missing.
    pub fn duration_days(&self) -> i64 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (end - start).num_days() + 1,
            _ => 0,
        }
    }
}

/// The `city` object of a submission; only the name is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRef {
    pub name: String,
}

/// The JSON `trip` part of a create or update request.
///
/// `personal_remark` and `rating` are always serialized, as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPayload {
    pub city: CityRef,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TripStatus,
    pub personal_remark: Option<String>,
    pub rating: Option<Rating>,
}

/// Truncates a date or datetime string to its calendar date.
///
/// Accepts `YYYY-MM-DD` optionally followed by `T` or a space and a
/// time-of-day part, which is discarded.
pub fn truncate_to_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = match text.find(['T', ' ']) {
        Some(idx) => &text[..idx],
        None => text,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// A date that is not a `YYYY-MM-DD[...]` string is treated as absent, so one
/// bad record never fails a whole list.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(truncate_to_date))
}

/// Anything other than a whole number in `0..=255` is treated as absent.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|n| u8::try_from(n).ok()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
