//! Live snapshot feeds for stored collections.
//!
//! Each user gets one `watch` channel per collection. Writers publish the
//! full collection after every change and subscribers always observe the
//! latest snapshot; intermediate snapshots may be skipped, which is fine
//! because each one replaces the previous entirely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::domain::models::{Holiday, Settings, VacationRequest};

pub struct SnapshotFeed<T> {
    senders: Arc<Mutex<HashMap<String, watch::Sender<T>>>>,
}

impl<T> Clone for SnapshotFeed<T> {
    fn clone(&self) -> Self {
        Self {
            senders: Arc::clone(&self.senders),
        }
    }
}

impl<T> Default for SnapshotFeed<T> {
    fn default() -> Self {
        Self {
            senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SnapshotFeed<T> {
    fn senders(&self) -> MutexGuard<'_, HashMap<String, watch::Sender<T>>> {
        // The map holds no invariant a panicking holder could break
        self.senders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe to a user's collection. `current` is the snapshot the caller
    /// just loaded; it is delivered first.
    pub fn subscribe(&self, user_id: &str, current: T) -> Subscription<T> {
        let mut senders = self.senders();
        let receiver = match senders.get(user_id) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = watch::channel(current.clone());
                senders.insert(user_id.to_string(), sender);
                receiver
            }
        };
        Subscription {
            initial: Some(current),
            receiver,
        }
    }

    /// Whether anyone is listening to this user's collection
    pub fn is_watched(&self, user_id: &str) -> bool {
        self.senders()
            .get(user_id)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }

    pub fn publish(&self, user_id: &str, snapshot: T) {
        if let Some(sender) = self.senders().get(user_id) {
            sender.send_replace(snapshot);
        }
    }
}

/// Stream of full snapshots of one collection
pub struct Subscription<T> {
    initial: Option<T>,
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Next snapshot, or `None` once the feed is gone
    pub async fn next(&mut self) -> Option<T> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

/// Feed plus write lock of one collection.
///
/// Shared by every repository created from the same connection, so that
/// writes are serialized and snapshots are published in write order.
pub struct LiveCollection<T> {
    pub feed: SnapshotFeed<T>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl<T> Clone for LiveCollection<T> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<T> Default for LiveCollection<T> {
    fn default() -> Self {
        Self {
            feed: SnapshotFeed::default(),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

impl<T> LiveCollection<T> {
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}

/// The three live collections of a connection
#[derive(Clone, Default)]
pub struct LiveCollections {
    pub requests: LiveCollection<Vec<VacationRequest>>,
    pub holidays: LiveCollection<Vec<Holiday>>,
    pub settings: LiveCollection<Option<Settings>>,
}
