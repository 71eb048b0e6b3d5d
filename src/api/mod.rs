//! Remote trip, city and user services.
//!
//! The controllers and the UI depend only on the service traits; [`HttpApi`]
//! is the reqwest-backed implementation used by the binary.

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod http;
mod service;

pub use error::ApiError;
pub use http::HttpApi;
pub use service::{CityService, TripService, UserService};
