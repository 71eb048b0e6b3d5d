//! Local client state on disk.
//!
//! Trips live on the remote service; the only thing kept locally is the
//! id of the logged-in user, as a small JSON file in the data directory.

mod error;
mod session;

pub use error::StorageError;
pub use session::SessionStore;
