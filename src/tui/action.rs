//! Actions returned by screen event handlers, and results of background work.

use std::path::PathBuf;

use crossterm::event::KeyEvent;

use crate::api::ApiError;
use crate::form::CityQuery;
use crate::model::{
    CitySuggestion, Credentials, ImageFile, Registration, Trip, TripId, User, UserId,
};

use super::app::Screen;

/// An action that a screen handler returns to the [`App`](super::App).
///
/// The `App` interprets these to update global state, start remote calls and
/// navigate between screens.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No state change needed.
    None,
    /// Navigate to the given screen.
    Navigate(Screen),
    /// Log in with the given credentials.
    Login(Credentials),
    /// Create an account and log in as it.
    Register(Registration),
    /// Forget the logged-in user.
    Logout,
    /// Reload the trip list.
    RefreshTrips,
    /// Show the detail view of a trip.
    OpenTrip(TripId),
    /// Open an empty trip form.
    NewTrip,
    /// Open the trip form seeded from an existing trip.
    EditTrip(TripId),
    /// Delete a trip (already confirmed by the user).
    DeleteTrip(TripId),
    /// Run a city lookup for the autocomplete.
    SearchCities(CityQuery),
    /// Read a cover image from disk.
    LoadImage(PathBuf),
    /// Submit the open trip form.
    SubmitTrip,
    /// Close the trip form without saving.
    CloseForm,
    /// Quit the application.
    Quit,
}

/// The outcome of a background task, delivered back to the UI task.
#[derive(Debug)]
pub enum AppEvent {
    LoggedIn(Result<User, ApiError>),
    Registered(Result<User, ApiError>),
    /// Tagged with the user the list was fetched for.
    TripsLoaded {
        user: UserId,
        result: Result<Vec<Trip>, ApiError>,
    },
    TripLoaded {
        trip_id: TripId,
        result: Result<Option<Trip>, ApiError>,
    },
    CityImage {
        trip_id: TripId,
        result: Result<Option<String>, ApiError>,
    },
    CitiesFound {
        seq: u64,
        result: Result<Vec<CitySuggestion>, ApiError>,
    },
    /// Tagged with the form generation the path was entered in.
    ImageLoaded {
        generation: u64,
        result: Result<ImageFile, std::io::Error>,
    },
    /// Tagged with the form generation the submission was taken from.
    TripSaved {
        generation: u64,
        result: Result<Trip, ApiError>,
    },
    TripDeleted {
        trip_id: TripId,
        result: Result<(), ApiError>,
    },
}

/// Common behavior for all screen state types.
pub trait ScreenState {
    /// Process a key event and return an [`Action`] for the `App` to apply.
    fn handle_key(&mut self, key: KeyEvent) -> Action;
}
