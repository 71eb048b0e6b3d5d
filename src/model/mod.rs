mod city;
mod image;
mod rating;
mod status;
mod trip;
mod user;
mod validation;

pub use city::{
    CityImage, CitySearchResponse, CitySuggestion, MAX_SUGGESTIONS, parse_city_search,
};
pub use image::ImageFile;
pub use rating::Rating;
pub use status::TripStatus;
pub use trip::{City, CityRef, Trip, TripId, TripPayload, truncate_to_date};
pub use user::{Credentials, Registration, User, UserId};
pub use validation::{TripField, ValidationError, parse_date, validate_date_range};
