use std::future::Future;

use gramalisis_types::events::AuthEvent;
use gramalisis_types::{Entry, UserProfile};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::error::BackendError;

/// Identity provider.
pub trait AuthProvider: Send + Sync {
    fn current_user_id(&self) -> Option<Uuid>;

    /// Sign-in / sign-out transitions from now on.
    fn auth_events(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Per-user entry documents with a live change stream.
pub trait EntryStream: Send + Sync {
    /// Start a live query over `uid`'s entries.
    ///
    /// The current snapshot is delivered first, then one snapshot per change,
    /// in the order the backend produced them. Dropping the receiver ends the
    /// subscription.
    fn subscribe_entries(
        &self,
        uid: Uuid,
    ) -> impl Future<Output = Result<mpsc::UnboundedReceiver<Vec<Entry>>, BackendError>> + Send;

    /// Store a new entry. The stream reports it once it is written.
    fn create_entry(
        &self,
        uid: Uuid,
        text: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

pub trait ProfileStore: Send + Sync {
    fn fetch_profile(
        &self,
        uid: Uuid,
    ) -> impl Future<Output = Result<Option<UserProfile>, BackendError>> + Send;

    /// Persist editable fields and return the profile as stored, after the
    /// backend's normalization. The stored level may only go up.
    fn save_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, BackendError>> + Send;
}
