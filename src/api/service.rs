use async_trait::async_trait;

use super::error::ApiError;
use crate::model::{
    CitySuggestion, Credentials, ImageFile, Registration, Trip, TripId, TripPayload, User, UserId,
};

/// Trip CRUD on the remote trip service.
#[async_trait]
pub trait TripService: Send + Sync {
    /// Lists all trips of `user`.
    async fn list(&self, user: &UserId) -> Result<Vec<Trip>, ApiError>;

    /// Creates a trip and returns the canonical record.
    async fn create(
        &self,
        user: &UserId,
        payload: &TripPayload,
        image: Option<&ImageFile>,
    ) -> Result<Trip, ApiError>;

    /// Replaces a trip and returns the canonical record.
    async fn update(
        &self,
        user: &UserId,
        trip_id: TripId,
        payload: &TripPayload,
        image: Option<&ImageFile>,
    ) -> Result<Trip, ApiError>;

    /// Deletes a trip.
    async fn delete(&self, user: &UserId, trip_id: TripId) -> Result<(), ApiError>;

    /// Fetches a single trip.
    ///
    /// The service has no per-trip endpoint, so this lists and filters.
    async fn get(&self, user: &UserId, trip_id: TripId) -> Result<Option<Trip>, ApiError> {
        Ok(self
            .list(user)
            .await?
            .into_iter()
            .find(|t| t.trip_id == trip_id))
    }
}

/// City search and default imagery.
#[async_trait]
pub trait CityService: Send + Sync {
    /// Searches cities by name, returning at most ten suggestions.
    async fn search(&self, name: &str) -> Result<Vec<CitySuggestion>, ApiError>;

    /// Looks up the default cover image for a city.
    async fn image_for(&self, name: &str) -> Result<Option<String>, ApiError>;
}

/// Account login and registration.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError>;

    async fn register(&self, registration: &Registration) -> Result<User, ApiError>;
}
