use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Whether a trip is still being planned or has already happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    #[default]
    ToBeVisited,
    Visited,
}

static ALL_STATUSES: &[TripStatus] = &[TripStatus::ToBeVisited, TripStatus::Visited];

impl TripStatus {
    /// Returns the string the trip service uses for this status.
    pub fn wire_str(&self) -> &'static str {
        match self {
            TripStatus::ToBeVisited => "TO_BE_VISITED",
            TripStatus::Visited => "VISITED",
        }
    }

    /// Returns the label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            TripStatus::ToBeVisited => "Planned",
            TripStatus::Visited => "Visited",
        }
    }

    /// Returns all statuses.
    pub fn all() -> &'static [TripStatus] {
        ALL_STATUSES
    }

    /// Returns `true` for [`TripStatus::Visited`].
    pub fn is_visited(&self) -> bool {
        matches!(self, TripStatus::Visited)
    }

    /// Returns the other status.
    pub fn toggled(self) -> Self {
        match self {
            TripStatus::ToBeVisited => TripStatus::Visited,
            TripStatus::Visited => TripStatus::ToBeVisited,
        }
    }
}

#[mutants::skip]
impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_str())
    }
}

impl FromStr for TripStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.wire_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}
