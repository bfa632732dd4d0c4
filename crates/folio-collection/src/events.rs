//! Change notifications for record collections.
//!
//! Every mutation on a [`crate::RecordCollection`] emits a [`ChangeEvent`]
//! carrying the mutation kind and a full snapshot of the collection at that
//! point. Subscriptions are registered per collection instance through a
//! [`ChangeFilter`]; the observer contract is explicit, not an ambient bus.

use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::snapshot::CollectionSnapshot;

/// Default capacity of per-subscriber broadcast channels.
pub(crate) const CHANNEL_CAPACITY: usize = 1024;

/// Classification of collection mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A document was inserted.
    Created,
    /// An existing document was merged with a patch.
    Updated,
    /// A document was removed.
    Destroyed,
    /// Every document was removed.
    Cleared,
}

impl ChangeKind {
    /// All mutation kinds, in emission-relevant order.
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Created,
        ChangeKind::Updated,
        ChangeKind::Destroyed,
        ChangeKind::Cleared,
    ];
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Destroyed => "destroyed",
            Self::Cleared => "cleared",
        };
        write!(f, "{s}")
    }
}

/// A mutation notification with the collection state that produced it.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    /// Which mutation fired.
    pub kind: ChangeKind,
    /// Full persisted-state snapshot taken immediately after the mutation.
    pub snapshot: CollectionSnapshot,
}

/// Filter for subscribing to a subset of collection changes.
#[derive(Clone, Debug, Default)]
pub struct ChangeFilter {
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<ChangeKind>>,
}

impl ChangeFilter {
    /// Match every mutation kind.
    pub fn all() -> Self {
        Self { kinds: None }
    }

    /// Match a single mutation kind.
    pub fn only(kind: ChangeKind) -> Self {
        Self {
            kinds: Some(vec![kind]),
        }
    }

    /// Match the given mutation kinds.
    pub fn of_kinds(kinds: impl Into<Vec<ChangeKind>>) -> Self {
        Self {
            kinds: Some(kinds.into()),
        }
    }

    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&event.kind),
            None => true,
        }
    }
}

/// A broadcast receiver of matching change events.
pub type ChangeStream = broadcast::Receiver<ChangeEvent>;

/// Internal subscriber: a filter paired with a broadcast sender.
struct Subscriber {
    filter: ChangeFilter,
    sender: broadcast::Sender<ChangeEvent>,
}

/// Fan-out router that delivers change events to matching subscribers.
pub(crate) struct ChangeRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl ChangeRouter {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a new subscriber with the given filter.
    pub(crate) fn subscribe(&self, filter: ChangeFilter, capacity: usize) -> ChangeStream {
        let (tx, rx) = broadcast::channel(capacity);
        let sub = Subscriber { filter, sender: tx };
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .push(sub);
        rx
    }

    /// Route an event to all matching subscribers.
    /// Subscribers whose channels are closed are pruned.
    pub(crate) fn route(&self, event: &ChangeEvent) {
        let mut subs = self.subscribers.write().expect("router lock poisoned");
        subs.retain(|sub| {
            if sub.filter.matches(event) {
                // If send fails (no receivers), the subscriber is stale.
                sub.sender.send(event.clone()).is_ok()
            } else {
                // Keep non-matching subscribers while their channel is open.
                sub.sender.receiver_count() > 0
            }
        });
    }

    /// Number of active subscribers.
    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("router lock poisoned")
            .len()
    }
}
