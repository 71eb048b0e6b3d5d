//! In-memory service doubles for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::error::ApiError;
use super::service::{CityService, TripService, UserService};
use crate::model::{
    City, CitySuggestion, Credentials, ImageFile, Registration, Trip, TripId, TripPayload, User,
    UserId,
};

fn failure(status: u16, message: &Option<String>) -> ApiError {
    ApiError::Status {
        status,
        message: message.clone(),
    }
}

/// A create or update call as the fake saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub user: UserId,
    pub trip_id: Option<TripId>,
    pub payload: TripPayload,
    pub image: Option<ImageFile>,
}

#[derive(Debug, Default)]
struct TripsState {
    trips: Vec<Trip>,
    next_id: TripId,
    writes: Vec<Recorded>,
    deletes: Vec<TripId>,
    list_calls: usize,
    fail: Option<(u16, Option<String>)>,
}

/// Trip service backed by a vector.
#[derive(Debug, Default)]
pub struct FakeTrips {
    state: Mutex<TripsState>,
}

impl FakeTrips {
    pub fn new() -> Self {
        Self::with_trips(Vec::new())
    }

    pub fn with_trips(trips: Vec<Trip>) -> Self {
        let next_id = trips.iter().map(|t| t.trip_id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(TripsState {
                trips,
                next_id,
                ..TripsState::default()
            }),
        }
    }

    /// Makes every call fail with `status` and an optional body message.
    pub fn failing(status: u16, message: Option<&str>) -> Self {
        let fake = Self::new();
        fake.set_failure(Some((status, message.map(str::to_string))));
        fake
    }

    pub fn set_failure(&self, fail: Option<(u16, Option<String>)>) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn trips(&self) -> Vec<Trip> {
        self.state.lock().unwrap().trips.clone()
    }

    pub fn writes(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn deletes(&self) -> Vec<TripId> {
        self.state.lock().unwrap().deletes.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    fn store(
        &self,
        user: &UserId,
        trip_id: Option<TripId>,
        payload: &TripPayload,
        image: Option<&ImageFile>,
    ) -> Result<Trip, ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some((status, message)) = &state.fail {
            return Err(failure(*status, message));
        }
        state.writes.push(Recorded {
            user: user.clone(),
            trip_id,
            payload: payload.clone(),
            image: image.cloned(),
        });
        let id = match trip_id {
            Some(id) => id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                id
            }
        };
        let previous_image = state
            .trips
            .iter()
            .find(|t| t.trip_id == id)
            .and_then(|t| t.image_url.clone());
        let trip = Trip {
            trip_id: id,
            city: Some(City {
                name: payload.city.name.clone(),
                ..City::default()
            }),
            start_date: Some(payload.start_date),
            end_date: Some(payload.end_date),
            status: payload.status,
            personal_remark: payload.personal_remark.clone(),
            rating: payload.rating.map(u8::from),
            image_url: image
                .map(|i| format!("https://img.example/{}", i.file_name))
                .or(previous_image),
        };
        state.trips.retain(|t| t.trip_id != id);
        state.trips.push(trip.clone());
        Ok(trip)
    }
}

#[async_trait]
impl TripService for FakeTrips {
    async fn list(&self, _user: &UserId) -> Result<Vec<Trip>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if let Some((status, message)) = &state.fail {
            return Err(failure(*status, message));
        }
        Ok(state.trips.clone())
    }

    async fn create(
        &self,
        user: &UserId,
        payload: &TripPayload,
        image: Option<&ImageFile>,
    ) -> Result<Trip, ApiError> {
        self.store(user, None, payload, image)
    }

    async fn update(
        &self,
        user: &UserId,
        trip_id: TripId,
        payload: &TripPayload,
        image: Option<&ImageFile>,
    ) -> Result<Trip, ApiError> {
        self.store(user, Some(trip_id), payload, image)
    }

    async fn delete(&self, _user: &UserId, trip_id: TripId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some((status, message)) = &state.fail {
            return Err(failure(*status, message));
        }
        state.deletes.push(trip_id);
        state.trips.retain(|t| t.trip_id != trip_id);
        Ok(())
    }
}

/// City service answering from a fixed prefix table.
#[derive(Debug, Default)]
pub struct FakeCities {
    results: HashMap<String, Vec<String>>,
    images: HashMap<String, String>,
    failing: bool,
    searches: Mutex<Vec<String>>,
}

impl FakeCities {
    pub fn with_results(results: &[(&str, &[&str])]) -> Self {
        Self {
            results: results
                .iter()
                .map(|(q, names)| (q.to_string(), names.iter().map(|n| n.to_string()).collect()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, city: &str, url: &str) -> Self {
        self.images.insert(city.to_string(), url.to_string());
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl CityService for FakeCities {
    async fn search(&self, name: &str) -> Result<Vec<CitySuggestion>, ApiError> {
        self.searches.lock().unwrap().push(name.to_string());
        if self.failing {
            return Err(failure(500, &None));
        }
        Ok(self
            .results
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|n| CitySuggestion::from_value(json!({ "name": n })))
            .collect())
    }

    async fn image_for(&self, name: &str) -> Result<Option<String>, ApiError> {
        if self.failing {
            return Err(failure(500, &None));
        }
        Ok(self.images.get(name).cloned())
    }
}

/// User service with a single known account.
#[derive(Debug)]
pub struct FakeUsers {
    email: String,
    password: String,
    id: UserId,
}

impl FakeUsers {
    pub fn new(email: &str, password: &str, id: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            id: UserId::new(id),
        }
    }
}

#[async_trait]
impl UserService for FakeUsers {
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        if credentials.email == self.email && credentials.password == self.password {
            Ok(User {
                id: self.id.clone(),
                name: None,
                email: Some(self.email.clone()),
            })
        } else {
            Err(failure(401, &Some("Invalid email or password".to_string())))
        }
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        if registration.email == self.email {
            return Err(failure(409, &Some("Email already registered".to_string())));
        }
        Ok(User {
            id: UserId::new("new-user"),
            name: Some(registration.name.clone()),
            email: Some(registration.email.clone()),
        })
    }
}
