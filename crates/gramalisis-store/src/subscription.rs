use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use gramalisis_types::Entry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::action::Action;
use crate::store::Store;

/// Handle to one live entry subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(Uuid);

struct ActiveSubscription {
    token: SubscriptionToken,
    /// Cleared on cancel; checked under the lock before every dispatch so no
    /// snapshot lands after cancellation.
    live: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl ActiveSubscription {
    fn cancel(self) {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.task.abort();
    }
}

/// Owns the tasks that forward entry snapshots into the store.
///
/// Holds at most one subscription per user. Each subscription is torn down
/// exactly once: by [`cancel`](Self::cancel), by being replaced, or by
/// [`cancel_all`](Self::cancel_all).
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Store,
    active: Arc<Mutex<HashMap<Uuid, ActiveSubscription>>>,
}

impl SubscriptionRegistry {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Forward `snapshots` into the store as `SetEntries`, replacing any
    /// subscription already held for `uid`. Must be called inside a Tokio
    /// runtime.
    pub fn attach(
        &self,
        uid: Uuid,
        mut snapshots: mpsc::UnboundedReceiver<Vec<Entry>>,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(Uuid::new_v4());
        let live = Arc::new(Mutex::new(true));

        let store = self.store.clone();
        let task_live = live.clone();
        let task = tokio::spawn(async move {
            while let Some(snapshot) = snapshots.recv().await {
                let live = task_live.lock().unwrap_or_else(PoisonError::into_inner);
                if !*live {
                    break;
                }
                debug!(%uid, entries = snapshot.len(), "applying entry snapshot");
                store.dispatch(Action::SetEntries(snapshot));
            }
            debug!(%uid, "entry stream ended");
        });

        let previous = self.lock().insert(
            uid,
            ActiveSubscription {
                token,
                live,
                task,
            },
        );
        if let Some(previous) = previous {
            info!(%uid, "replacing entry subscription");
            previous.cancel();
        }

        info!(%uid, "entry subscription started");
        token
    }

    /// Cancel one subscription. Returns false if it was already gone.
    pub fn cancel(&self, token: SubscriptionToken) -> bool {
        let removed = {
            let mut active = self.lock();
            let uid = active
                .iter()
                .find(|(_, sub)| sub.token == token)
                .map(|(uid, _)| *uid);
            uid.and_then(|uid| active.remove(&uid).map(|sub| (uid, sub)))
        };

        match removed {
            Some((uid, sub)) => {
                sub.cancel();
                info!(%uid, "entry subscription cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_user(&self, uid: Uuid) -> bool {
        let removed = self.lock().remove(&uid);
        match removed {
            Some(sub) => {
                sub.cancel();
                info!(%uid, "entry subscription cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel everything. Returns how many subscriptions were live.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<ActiveSubscription> = self.lock().drain().map(|(_, sub)| sub).collect();
        let count = drained.len();
        for sub in drained {
            sub.cancel();
        }
        if count > 0 {
            info!(count, "all entry subscriptions cancelled");
        }
        count
    }

    /// Token of the running subscription for `uid`, if its stream is still open.
    pub fn active_token(&self, uid: Uuid) -> Option<SubscriptionToken> {
        self.lock()
            .get(&uid)
            .filter(|sub| !sub.task.is_finished())
            .map(|sub| sub.token)
    }

    pub fn is_active(&self, token: SubscriptionToken) -> bool {
        self.lock()
            .values()
            .any(|sub| sub.token == token && !sub.task.is_finished())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ActiveSubscription>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
