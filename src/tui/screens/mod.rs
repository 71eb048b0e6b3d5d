//! TUI screen implementations.

pub mod dashboard;
pub mod help;
pub mod login;
pub mod register;
pub mod trip_detail;
pub mod trip_form;

pub use dashboard::{DashboardState, draw_dashboard};
pub use help::{HelpState, draw_help};
pub use login::{LoginState, draw_login};
pub use register::{RegisterState, draw_register};
pub use trip_detail::{TripDetailState, draw_trip_detail};
pub use trip_form::{TripFormState, draw_trip_form};
