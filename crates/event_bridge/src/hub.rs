//! In-process push source keyed by event kind.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
};

use crate::source::{EventCallback, EventSource, ObservationToken};

struct Registration<K, E, T> {
    kind: K,
    target: Option<T>,
    callback: EventCallback<E>,
}

impl<K: PartialEq, E, T: PartialEq> Registration<K, E, T> {
    fn accepts(&self, kind: &K, sender: Option<&T>) -> bool {
        &self.kind == kind
            && match &self.target {
                None => true,
                Some(target) => sender == Some(target),
            }
    }
}

/// Fires every callback registered for a kind, in registration order. Posting
/// to a kind nobody observes drops the event.
///
/// Observers registered with a target only hear events posted by that
/// sender; observers without one hear every sender, anonymous posts included.
pub struct EventHub<K, E, T = ()> {
    next_token: AtomicU64,
    registrations: Mutex<BTreeMap<ObservationToken, Registration<K, E, T>>>,
}

impl<K, E, T> Default for EventHub<K, E, T> {
    fn default() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            registrations: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<K, E, T> EventHub<K, E, T>
where
    K: Eq + Clone + Send + Sync + 'static,
    E: Clone + Send + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many callbacks received the event.
    pub fn post(&self, kind: &K, sender: Option<&T>, event: E) -> usize {
        // Callbacks run outside the lock so they may register or unregister.
        let callbacks: Vec<EventCallback<E>> = self
            .lock()
            .values()
            .filter(|registration| registration.accepts(kind, sender))
            .map(|registration| registration.callback.clone())
            .collect();

        for callback in &callbacks {
            callback(event.clone());
        }
        if callbacks.is_empty() {
            tracing::trace!("event posted with no observers");
        }
        callbacks.len()
    }

    /// Counts registrations for `kind` regardless of their target.
    pub fn observer_count(&self, kind: &K) -> usize {
        self.lock()
            .values()
            .filter(|registration| &registration.kind == kind)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ObservationToken, Registration<K, E, T>>> {
        self.registrations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K, E, T> EventSource for EventHub<K, E, T>
where
    K: Eq + Clone + Send + Sync + 'static,
    E: Clone + Send + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Kind = K;
    type Event = E;
    type Target = T;

    fn register(
        &self,
        kind: &K,
        target: Option<&T>,
        callback: EventCallback<E>,
    ) -> ObservationToken {
        let token = ObservationToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(
            token,
            Registration {
                kind: kind.clone(),
                target: target.cloned(),
                callback,
            },
        );
        tracing::debug!(token = token.0, targeted = target.is_some(), "observer registered");
        token
    }

    fn unregister(&self, token: ObservationToken) {
        // Drop the callback after releasing the lock; it may own a slot sender
        // whose drop wakes a consumer.
        let removed = self.lock().remove(&token);
        if removed.is_some() {
            tracing::debug!(token = token.0, "observer unregistered");
        }
    }
}
