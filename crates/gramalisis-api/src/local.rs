use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use uuid::Uuid;

use gramalisis_db::Database;
use gramalisis_store::{AuthProvider, BackendError, EntryStream, ProfileStore};
use gramalisis_types::api::{ChangePasswordRequest, RegisterRequest};
use gramalisis_types::events::AuthEvent;
use gramalisis_types::text::normalize_entry_text;
use gramalisis_types::{Entry, UserProfile};

use crate::accounts::{self, AccountError};
use crate::convert::load_entries;
use crate::entries::store_entry;
use crate::feed::EntryFeed;

/// In-process backend over the SQLite store.
///
/// Holds the signed-in account of one client and announces sign-in and
/// sign-out transitions. Shares its [`EntryFeed`] with the HTTP side, so
/// entries written through either path reach every subscriber.
pub struct LocalBackend {
    db: Arc<Database>,
    feed: EntryFeed,
    current: RwLock<Option<Uuid>>,
    auth_tx: broadcast::Sender<AuthEvent>,
}

fn unavailable(e: impl std::fmt::Display) -> BackendError {
    BackendError::Unavailable(e.to_string())
}

impl From<AccountError> for BackendError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::UserNotFound => BackendError::NotFound(e.to_string()),
            AccountError::Hashing(_) | AccountError::Storage(_) => unavailable(e),
            other => BackendError::Rejected(other.to_string()),
        }
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, BackendError>
where
    F: FnOnce() -> Result<T, BackendError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        unavailable(e)
    })?
}

impl LocalBackend {
    pub fn new(db: Arc<Database>, feed: EntryFeed) -> Self {
        let (auth_tx, _) = broadcast::channel(16);
        Self {
            db,
            feed,
            current: RwLock::new(None),
            auth_tx,
        }
    }

    pub fn feed(&self) -> &EntryFeed {
        &self.feed
    }

    fn set_current(&self, uid: Option<Uuid>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = uid;
    }

    fn signed_in(&self, profile: &UserProfile) {
        self.set_current(Some(profile.uid));
        let _ = self.auth_tx.send(AuthEvent::SignedIn {
            uid: profile.uid,
            email: profile.username.clone(),
        });
    }

    /// Create an account and sign into it.
    pub async fn sign_up(&self, req: RegisterRequest) -> Result<UserProfile, AccountError> {
        let db = self.db.clone();
        let profile = tokio::task::spawn_blocking(move || accounts::register_account(&db, &req))
            .await
            .map_err(|e| AccountError::Storage(e.into()))??;
        self.signed_in(&profile);
        Ok(profile)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AccountError> {
        let db = self.db.clone();
        let (email, password) = (email.to_string(), password.to_string());
        let profile = tokio::task::spawn_blocking(move || {
            accounts::verify_credentials(&db, &email, &password)
        })
        .await
        .map_err(|e| AccountError::Storage(e.into()))??;
        self.signed_in(&profile);
        Ok(profile)
    }

    pub fn sign_out(&self) {
        self.set_current(None);
        let _ = self.auth_tx.send(AuthEvent::SignedOut);
        info!("local backend signed out");
    }

    pub async fn change_password(&self, req: ChangePasswordRequest) -> Result<(), AccountError> {
        let uid = self.current_user_id().ok_or(AccountError::NotSignedIn)?;
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || accounts::change_password(&db, uid, &req))
            .await
            .map_err(|e| AccountError::Storage(e.into()))?
    }
}

impl AuthProvider for LocalBackend {
    fn current_user_id(&self) -> Option<Uuid> {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_tx.subscribe()
    }
}

impl EntryStream for LocalBackend {
    /// The first snapshot is read under the feed lock, so no later write can
    /// be published ahead of it.
    async fn subscribe_entries(
        &self,
        uid: Uuid,
    ) -> Result<mpsc::UnboundedReceiver<Vec<Entry>>, BackendError> {
        let db = self.db.clone();
        let feed = self.feed.clone();
        run_blocking(move || feed.subscribe(uid, || load_entries(&db, uid)).map_err(unavailable))
            .await
    }

    async fn create_entry(&self, uid: Uuid, text: &str) -> Result<(), BackendError> {
        let text = normalize_entry_text(text)
            .ok_or_else(|| BackendError::Rejected("entry text cannot be empty".into()))?
            .to_string();
        let db = self.db.clone();
        let feed = self.feed.clone();
        run_blocking(move || store_entry(&db, &feed, uid, &text).map(drop).map_err(unavailable))
            .await
    }
}

impl ProfileStore for LocalBackend {
    async fn fetch_profile(&self, uid: Uuid) -> Result<Option<UserProfile>, BackendError> {
        let db = self.db.clone();
        run_blocking(move || Ok(accounts::load_profile(&db, uid)?)).await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile, BackendError> {
        let db = self.db.clone();
        let profile = profile.clone();
        run_blocking(move || accounts::save_profile(&db, &profile).map_err(Into::into)).await
    }
}
