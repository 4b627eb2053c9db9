use std::sync::Arc;

use gramalisis_progress::{Catalog, Progress, ProgressReport};
use gramalisis_types::events::{AuthEvent, Notice};
use gramalisis_types::text::{normalize_entry_text, summarize};
use gramalisis_types::{PendingEntry, ProfileUpdate, UserProfile};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::backend::{AuthProvider, EntryStream, ProfileStore};
use crate::error::SessionError;
use crate::store::Store;
use crate::subscription::SubscriptionRegistry;

// User-facing notice text
const ENTRIES_UNAVAILABLE: &str = "No pudimos cargar tus textos. Intenta nuevamente.";
const PROFILE_UNAVAILABLE: &str = "No pudimos cargar tu perfil.";
const EMPTY_TEXT: &str = "Escribe o pega un texto antes de guardar.";
const ENTRY_NOT_SAVED: &str = "No se pudo guardar el análisis.";
const PROFILE_SAVED: &str = "Los cambios se aplicaron correctamente.";
const PROFILE_NOT_SAVED: &str = "No se pudo actualizar el perfil. Intenta nuevamente.";
const LEVEL_NOT_SAVED: &str = "No pudimos guardar tu nivel.";

/// Binds a backend to the store for the lifetime of the app.
///
/// Sign-in starts the entry subscription and loads the profile; sign-out
/// cancels the subscription and resets the store. Collaborator failures leave
/// the store as it was and are reported as a [`Notice`].
pub struct Session<B> {
    store: Store,
    backend: Arc<B>,
    subscriptions: SubscriptionRegistry,
}

impl<B> Session<B>
where
    B: AuthProvider + EntryStream + ProfileStore + 'static,
{
    pub fn new(store: Store, backend: Arc<B>) -> Self {
        let subscriptions = SubscriptionRegistry::new(store.clone());
        Self {
            store,
            backend,
            subscriptions,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Follow auth transitions until the provider goes away.
    pub async fn run(&self) {
        // Listen before looking at the current user so no transition is missed
        let mut events = self.backend.auth_events();

        if let Some(uid) = self.backend.current_user_id() {
            let event = AuthEvent::SignedIn {
                uid,
                email: String::new(),
            };
            if let Err(e) = self.handle_auth_event(event).await {
                warn!("Initial sign-in sync failed: {}", e);
            }
        }

        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle_auth_event(event).await {
                        warn!("Auth transition failed: {}", e);
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!("Auth event receiver lagged by {} events", n);
                }
                Err(RecvError::Closed) => break,
            }
        }

        self.subscriptions.cancel_all();
        debug!("Auth event stream closed");
    }

    pub async fn handle_auth_event(&self, event: AuthEvent) -> Result<(), SessionError> {
        match event {
            AuthEvent::SignedIn { uid, email } => self.sign_in(uid, &email).await,
            AuthEvent::SignedOut => {
                self.sign_out();
                Ok(())
            }
        }
    }

    async fn sign_in(&self, uid: Uuid, email: &str) -> Result<(), SessionError> {
        if self.subscriptions.active_token(uid).is_none() {
            // Another user's data must not survive a switch
            self.subscriptions.cancel_all();
            self.store.dispatch(Action::Reset);

            let snapshots = match self.backend.subscribe_entries(uid).await {
                Ok(snapshots) => snapshots,
                Err(e) => {
                    warn!(%uid, "entry subscription failed: {}", e);
                    self.store.notify(Notice::error(ENTRIES_UNAVAILABLE));
                    return Err(e.into());
                }
            };
            self.subscriptions.attach(uid, snapshots);
            info!(%uid, email, "signed in");
        }

        match self.backend.fetch_profile(uid).await {
            Ok(profile) => {
                if profile.is_none() {
                    warn!(%uid, "no profile stored for signed-in user");
                }
                self.store.dispatch(Action::SetUser(profile));
                Ok(())
            }
            Err(e) => {
                warn!(%uid, "profile fetch failed: {}", e);
                self.store.notify(Notice::error(PROFILE_UNAVAILABLE));
                Err(e.into())
            }
        }
    }

    fn sign_out(&self) {
        self.subscriptions.cancel_all();
        self.store.dispatch(Action::Reset);
        info!("signed out");
    }

    /// Save a new entry with an optimistic local insert.
    ///
    /// Returns the temporary id of the pending entry. The pending entry is
    /// replaced once a snapshot containing the stored copy arrives, or removed
    /// again if the backend rejects the write.
    pub async fn submit_entry(&self, text: &str) -> Result<Uuid, SessionError> {
        let uid = self
            .backend
            .current_user_id()
            .ok_or(SessionError::Unauthenticated)?;
        let Some(text) = normalize_entry_text(text) else {
            self.store.notify(Notice::error(EMPTY_TEXT));
            return Err(SessionError::EmptyText);
        };

        let pending = PendingEntry::new(uid, text.to_string(), summarize(text));
        let temp_id = pending.temp_id;
        self.store.dispatch(Action::AddEntry(pending.into()));
        debug!(%uid, %temp_id, "pending entry inserted");

        match self.backend.create_entry(uid, text).await {
            Ok(()) => Ok(temp_id),
            Err(e) => {
                warn!(%uid, %temp_id, "entry create failed: {}", e);
                self.store.dispatch(Action::DiscardPending(temp_id));
                self.store.notify(Notice::error(ENTRY_NOT_SAVED));
                Err(e.into())
            }
        }
    }

    pub fn current_user(&self) -> Result<UserProfile, SessionError> {
        self.store
            .select(|s| s.current_user.clone())
            .ok_or(SessionError::Unauthenticated)
    }

    /// Merge and persist a profile edit, then publish the stored copy.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, SessionError> {
        let mut profile = self.current_user()?;
        profile.apply(update);

        let stored = match self.backend.save_profile(&profile).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(uid = %profile.uid, "profile save failed: {}", e);
                self.store.notify(Notice::error(PROFILE_NOT_SAVED));
                return Err(e.into());
            }
        };

        self.store.dispatch(Action::SetUser(Some(stored.clone())));
        self.store.notify(Notice::success(PROFILE_SAVED));
        Ok(stored)
    }

    pub fn progress(&self, catalog: &Catalog) -> ProgressReport {
        let state = self.store.state();
        let stored_level = state.current_user.as_ref().map(|u| u.level);
        Progress::from_len(catalog, state.entries_count()).report(stored_level)
    }

    /// Persist the effective level when it has overtaken the stored one.
    /// Only confirmed entries count, since the stored level never drops.
    /// Returns the level now stored.
    pub async fn ratchet_level(&self, catalog: &Catalog) -> Result<u32, SessionError> {
        let mut profile = self.current_user()?;
        let confirmed = self.store.select(|s| s.confirmed_count());
        let effective = Progress::from_len(catalog, confirmed).effective_order(profile.level);

        if effective <= profile.level {
            return Ok(profile.level);
        }

        profile.level = effective;
        let stored = match self.backend.save_profile(&profile).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(uid = %profile.uid, "level save failed: {}", e);
                self.store.notify(Notice::error(LEVEL_NOT_SAVED));
                return Err(e.into());
            }
        };
        info!(uid = %stored.uid, level = stored.level, "stored level raised");
        let level = stored.level;
        self.store.dispatch(Action::SetUser(Some(stored)));
        Ok(level)
    }
}
