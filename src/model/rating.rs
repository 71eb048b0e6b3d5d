use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// A 1 to 5 star rating for a visited trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Creates a rating, rejecting values outside `1..=5`.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidRating(value))
        }
    }

    /// Returns the numeric value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Renders the rating as filled and empty stars, e.g. `★★★★☆`.
    pub fn stars(self) -> String {
        let filled = usize::from(self.0);
        let empty = usize::from(Self::MAX) - filled;
        format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
    }

    /// Steps through `None → 1 → … → 5 → None`, or backwards.
    pub fn cycle(current: Option<Rating>, forward: bool) -> Option<Rating> {
        let next = match (current.map(Rating::get), forward) {
            (None, true) => Self::MIN,
            (None, false) => Self::MAX,
            (Some(Self::MAX), true) | (Some(Self::MIN), false) => return None,
            (Some(v), true) => v + 1,
            (Some(v), false) => v - 1,
        };
        Some(Self(next))
    }
}

impl TryFrom<u8> for Rating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}
