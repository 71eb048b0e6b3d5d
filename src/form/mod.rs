//! The add/edit trip form and its controllers.
//!
//! Everything here is free of terminal and network code: the UI feeds
//! keystrokes in as [`FieldEdit`]s and runs the [`CityQuery`] and
//! [`Submission`] values the controllers hand back.

mod autocomplete;
mod controller;
mod draft;
mod preview;

pub use autocomplete::{Autocomplete, CityQuery, SearchState};
pub use controller::{
    EditTarget, SUBMIT_FALLBACK_MESSAGE, SubmitError, SubmitTarget, Submission, TripForm,
};
pub use draft::{FieldEdit, TripDraft};
pub use preview::{LocalPreview, Preview, PreviewStore};
