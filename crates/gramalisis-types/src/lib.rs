pub mod api;
pub mod events;
pub mod models;
pub mod text;

pub use models::{Entry, PendingEntry, ProfileUpdate, TimelineEntry, UserProfile};
