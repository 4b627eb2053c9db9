//! Process-wide application state.
//!
//! [`Store`] holds the entry timeline and the signed-in profile and changes
//! only through [`Action`]s. [`Session`] wires an auth provider and a live
//! entry stream into it, and [`SubscriptionRegistry`] owns the stream tasks.

pub mod action;
pub mod backend;
pub mod error;
pub mod review;
pub mod session;
pub mod state;
pub mod store;
pub mod subscription;

pub use action::Action;
pub use backend::{AuthProvider, EntryStream, ProfileStore};
pub use error::{BackendError, SessionError};
pub use review::{EntryReview, ReviewCard};
pub use session::Session;
pub use state::AppState;
pub use store::{Store, StoreConfig, StoreEvent};
pub use subscription::{SubscriptionRegistry, SubscriptionToken};
