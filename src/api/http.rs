use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::ApiError;
use super::service::{CityService, TripService, UserService};
use crate::config::ClientConfig;
use crate::model::{
    CityImage, CitySuggestion, Credentials, ImageFile, Registration, Trip, TripId, TripPayload,
    User, UserId, parse_city_search,
};

/// Client for the trip backend over HTTP.
///
/// Session state lives in the client's cookie store; tokens are never handled here.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: Url,
    client: Client,
}

/// Error body shape used by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// User record as returned by login/register, before checking for an id.
#[derive(Debug, Deserialize)]
struct UserBody {
    id: Option<UserId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl HttpApi {
    /// Builds a client rooted at the configured base URL.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            base: config.api_base_url.clone(),
            client,
        })
    }

    /// Joins an API path onto the base URL.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base.as_str().trim_end_matches('/'))
    }

    /// Sends a request and decodes the JSON response body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = send(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn authenticate<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<User, ApiError> {
        let user: UserBody = self.fetch(self.client.post(self.url(path)).json(body)).await?;
        let id = user
            .id
            .ok_or_else(|| ApiError::InvalidResponse("user record has no id".to_string()))?;
        Ok(User {
            id,
            name: user.name,
            email: user.email,
        })
    }
}

/// Sends a request, turning non-success statuses into [`ApiError::Status`].
async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message);
    warn!(status = status.as_u16(), ?message, "trip service request failed");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Builds the multipart body shared by create and update: a JSON `trip` part
/// and an optional `image` part.
fn trip_form(payload: &TripPayload, image: Option<&ImageFile>) -> Result<Form, ApiError> {
    let json = serde_json::to_vec(payload)?;
    let trip = Part::bytes(json).mime_str("application/json")?;
    let mut form = Form::new().part("trip", trip);
    if let Some(image) = image {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(image.content_type)?;
        form = form.part("image", part);
    }
    Ok(form)
}

#[async_trait]
impl TripService for HttpApi {
    async fn list(&self, user: &UserId) -> Result<Vec<Trip>, ApiError> {
        debug!(%user, "listing trips");
        self.fetch(self.client.get(self.url(&format!("/trips/user/{user}"))))
            .await
    }

    async fn create(
        &self,
        user: &UserId,
        payload: &TripPayload,
        image: Option<&ImageFile>,
    ) -> Result<Trip, ApiError> {
        debug!(%user, city = %payload.city.name, with_image = image.is_some(), "creating trip");
        let form = trip_form(payload, image)?;
        self.fetch(
            self.client
                .post(self.url(&format!("/trips/user/{user}")))
                .multipart(form),
        )
        .await
    }

    async fn update(
        &self,
        user: &UserId,
        trip_id: TripId,
        payload: &TripPayload,
        image: Option<&ImageFile>,
    ) -> Result<Trip, ApiError> {
        debug!(%user, trip_id, with_image = image.is_some(), "updating trip");
        let form = trip_form(payload, image)?;
        self.fetch(
            self.client
                .put(self.url(&format!("/trips/{trip_id}/user/{user}")))
                .multipart(form),
        )
        .await
    }

    async fn delete(&self, user: &UserId, trip_id: TripId) -> Result<(), ApiError> {
        debug!(%user, trip_id, "deleting trip");
        send(
            self.client
                .delete(self.url(&format!("/trips/user/{user}/{trip_id}"))),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CityService for HttpApi {
    async fn search(&self, name: &str) -> Result<Vec<CitySuggestion>, ApiError> {
        debug!(query = name, "searching cities");
        let body: Value = self
            .fetch(
                self.client
                    .get(self.url("/cities/search-api"))
                    .query(&[("name", name)]),
            )
            .await?;
        Ok(parse_city_search(body)?)
    }

    async fn image_for(&self, name: &str) -> Result<Option<String>, ApiError> {
        let image: CityImage = self
            .fetch(
                self.client
                    .get(self.url("/cities/image"))
                    .query(&[("name", name)]),
            )
            .await?;
        Ok(image.image_url.filter(|u| !u.is_empty()))
    }
}

#[async_trait]
impl UserService for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        debug!(email = %credentials.email, "logging in");
        self.authenticate("/user/login", credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        debug!(email = %registration.email, "registering");
        self.authenticate("/user/register", registration).await
    }
}
