//! Reusable TUI widgets.

pub mod form;
pub mod notification;

pub use form::{FORM_ROW_HEIGHT, Form, FormField, draw_form};
pub use notification::{NOTIFICATION_TTL, Notification, NotificationKind, draw_notification};
