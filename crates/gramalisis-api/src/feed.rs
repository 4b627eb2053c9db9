use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use gramalisis_types::Entry;

type Subscribers = HashMap<Uuid, Vec<mpsc::UnboundedSender<Vec<Entry>>>>;

/// Fans each user's entry snapshots out to that user's live subscribers.
///
/// Snapshots are loaded while the feed lock is held, so every subscriber sees
/// them in the order the underlying writes happened, and a new subscriber
/// cannot miss a change between its first snapshot and registration.
#[derive(Clone, Default)]
pub struct EntryFeed {
    inner: Arc<Mutex<Subscribers>>,
}

impl EntryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for `uid` and send it the current snapshot.
    /// Dropping the receiver unsubscribes.
    pub fn subscribe<F>(
        &self,
        uid: Uuid,
        load: F,
    ) -> anyhow::Result<mpsc::UnboundedReceiver<Vec<Entry>>>
    where
        F: FnOnce() -> anyhow::Result<Vec<Entry>>,
    {
        let mut subscribers = self.lock();
        let snapshot = load()?;

        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is still in hand, so this cannot fail
        let _ = tx.send(snapshot);
        subscribers.entry(uid).or_default().push(tx);

        debug!(%uid, "entry feed subscriber added");
        Ok(rx)
    }

    /// Load a fresh snapshot for `uid` and deliver it. Subscribers whose
    /// receiver is gone are pruned. Returns how many were reached.
    pub fn publish<F>(&self, uid: Uuid, load: F) -> anyhow::Result<usize>
    where
        F: FnOnce() -> anyhow::Result<Vec<Entry>>,
    {
        let mut subscribers = self.lock();
        let Some(senders) = subscribers.get_mut(&uid) else {
            return Ok(0);
        };

        let snapshot = load()?;
        senders.retain(|tx| tx.send(snapshot.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            subscribers.remove(&uid);
        }

        debug!(%uid, delivered, entries = snapshot.len(), "entry snapshot published");
        Ok(delivered)
    }

    pub fn subscriber_count(&self, uid: Uuid) -> usize {
        self.lock()
            .get(&uid)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn test_subscribe_sends_current_snapshot() {
        let feed = EntryFeed::new();
        let uid = Uuid::new_v4();
        let mut rx = feed.subscribe(uid, || Ok(entries(uid, &["a"]))).unwrap();

        assert_eq!(rx.recv().await.unwrap()[0].text, "a");
        assert_eq!(feed.subscriber_count(uid), 1);
    }

    #[tokio::test]
    async fn test_publish_reaches_only_owner() {
        let feed = EntryFeed::new();
        let ana = Uuid::new_v4();
        let luis = Uuid::new_v4();
        let mut ana_rx = feed.subscribe(ana, || Ok(vec![])).unwrap();
        let mut luis_rx = feed.subscribe(luis, || Ok(vec![])).unwrap();
        ana_rx.recv().await.unwrap();
        luis_rx.recv().await.unwrap();

        assert_eq!(feed.publish(ana, || Ok(entries(ana, &["b", "a"]))).unwrap(), 1);
        assert_eq!(ana_rx.recv().await.unwrap().len(), 2);
        assert!(luis_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_prunes_dropped_receivers() {
        let feed = EntryFeed::new();
        let uid = Uuid::new_v4();
        let rx = feed.subscribe(uid, || Ok(vec![])).unwrap();
        drop(rx);

        assert_eq!(feed.subscriber_count(uid), 0);
        assert_eq!(feed.publish(uid, || Ok(entries(uid, &["a"]))).unwrap(), 0);
        // nobody listening: the loader is not even called
        assert_eq!(feed.publish(uid, || anyhow::bail!("should not load")).unwrap(), 0);
    }

    #[test]
    fn test_failed_load_registers_nothing() {
        let feed = EntryFeed::new();
        let uid = Uuid::new_v4();
        assert!(feed.subscribe(uid, || anyhow::bail!("db down")).is_err());
        assert_eq!(feed.subscriber_count(uid), 0);
    }
}
