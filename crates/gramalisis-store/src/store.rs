use std::sync::{Arc, PoisonError, RwLock};

use gramalisis_types::events::Notice;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::action::Action;
use crate::state::{AppState, reduce};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// How far apart a pending write and its confirmed copy may be stamped
    pub pending_match_window_secs: u32,
    /// Buffered events per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pending_match_window_secs: 120,
            event_capacity: 256,
        }
    }
}

/// Events fanned out to store observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// State changed; read it with [`Store::state`]
    Changed { version: u64 },
    /// Transient message for the user
    Notice(Notice),
}

/// Single source of truth for UI state.
///
/// Cheap to clone; every clone observes the same state. Mutations go through
/// [`Store::dispatch`] only, which serialises them.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    current: RwLock<Versioned>,
    events_tx: broadcast::Sender<StoreEvent>,
    match_window: chrono::Duration,
}

struct Versioned {
    version: u64,
    state: Arc<AppState>,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(StoreInner {
                current: RwLock::new(Versioned {
                    version: 0,
                    state: Arc::new(AppState::default()),
                }),
                events_tx,
                match_window: chrono::Duration::seconds(i64::from(config.pending_match_window_secs)),
            }),
        }
    }

    /// Current state. The returned snapshot never changes underneath the caller.
    pub fn state(&self) -> Arc<AppState> {
        let current = self.inner.current.read().unwrap_or_else(PoisonError::into_inner);
        current.state.clone()
    }

    /// Incremented once per observable change.
    pub fn version(&self) -> u64 {
        let current = self.inner.current.read().unwrap_or_else(PoisonError::into_inner);
        current.version
    }

    pub fn select<T>(&self, selector: impl FnOnce(&AppState) -> T) -> T {
        selector(&self.state())
    }

    /// Apply an action. Returns whether the state changed; observers are only
    /// notified when it did.
    pub fn dispatch(&self, action: Action) -> bool {
        let name = action.name();
        let mut current = self.inner.current.write().unwrap_or_else(PoisonError::into_inner);

        let mut next = AppState::clone(&current.state);
        reduce(&mut next, action, self.inner.match_window);

        if next == *current.state {
            trace!(action = name, "dispatch left state unchanged");
            return false;
        }

        current.version += 1;
        current.state = Arc::new(next);
        let version = current.version;

        debug!(action = name, version, "store updated");
        // Sent under the lock so observers see versions in order
        let _ = self.inner.events_tx.send(StoreEvent::Changed { version });
        true
    }

    /// Observe changes and notices.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events_tx.subscribe()
    }

    pub fn notify(&self, notice: Notice) {
        let _ = self.inner.events_tx.send(StoreEvent::Notice(notice));
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramalisis_types::{Entry, PendingEntry};
    use uuid::Uuid;

    fn entries(uid: Uuid, texts: &[&str]) -> Vec<Entry> {
        texts
            .iter()
            .map(|t| Entry {
                id: Uuid::new_v4(),
                uid,
                text: t.to_string(),
                summary: String::new(),
                created_at: Some(chrono::Utc::now()),
            })
            .collect()
    }

    #[test]
    fn test_dispatch_bumps_version_only_on_change() {
        let store = Store::default();
        let snapshot = entries(Uuid::new_v4(), &["a", "b", "c"]);

        assert!(store.dispatch(Action::SetEntries(snapshot.clone())));
        assert_eq!(store.version(), 1);
        assert!(!store.dispatch(Action::SetEntries(snapshot)));
        assert_eq!(store.version(), 1);
        assert_eq!(store.state().entries_count(), 3);
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::default();
        let reader = store.clone();
        let uid = Uuid::new_v4();
        store.dispatch(Action::AddEntry(PendingEntry::new(uid, "x".into(), "s".into()).into()));
        assert_eq!(reader.select(|s| s.entries_count()), 1);
    }

    #[test]
    fn test_snapshot_is_stable_after_dispatch() {
        let store = Store::default();
        let before = store.state();
        store.dispatch(Action::SetEntries(entries(Uuid::new_v4(), &["a"])));
        assert!(before.entries.is_empty());
        assert_eq!(store.state().entries_count(), 1);
    }

    #[tokio::test]
    async fn test_observers_receive_changes_in_order() {
        let store = Store::default();
        let mut rx = store.subscribe();
        let uid = Uuid::new_v4();

        store.dispatch(Action::SetEntries(entries(uid, &["a"])));
        store.dispatch(Action::SetEntries(entries(uid, &["b", "a"])));
        store.notify(Notice::info("hola"));
        store.dispatch(Action::Reset);

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Changed { version: 1 });
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Changed { version: 2 });
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Notice(Notice::info("hola")));
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Changed { version: 3 });
        assert_eq!(*store.state(), AppState::default());
    }
}
