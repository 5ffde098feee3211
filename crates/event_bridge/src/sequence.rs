//! Pull-based view over a push source.
//!
//! [`subscribe`] returns an [`EventSequence`] that registers with the source
//! on first pull (or on [`EventSequence::activate`]) and yields one event per
//! firing. Events fired while nobody is pulling land in a single-slot
//! rendezvous; see [`OverflowPolicy`] for what happens to a second unread
//! event.

use std::{
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard},
    task::{Context, Poll},
};

use futures::{stream::FusedStream, Stream};

use crate::{
    slot::{self, Offer, OverflowPolicy, SlotCloser, SlotReceiver, SlotSender},
    source::{EventSource, ObservationToken},
};

/// Observes `kind` on `source`. With a `target`, only events posted by that
/// sender are delivered.
pub fn subscribe<S: EventSource>(
    source: Arc<S>,
    kind: S::Kind,
    target: Option<S::Target>,
) -> EventSequence<S> {
    subscribe_with_policy(source, kind, target, OverflowPolicy::default())
}

pub fn subscribe_with_policy<S: EventSource>(
    source: Arc<S>,
    kind: S::Kind,
    target: Option<S::Target>,
    policy: OverflowPolicy,
) -> EventSequence<S> {
    let (sender, receiver) = slot::channel(policy);
    EventSequence {
        kind,
        target,
        sender: Some(sender),
        receiver,
        registration: Arc::new(Registration {
            source,
            state: Mutex::new(RegistrationState::Pending),
        }),
    }
}

enum RegistrationState {
    Pending,
    Registered(ObservationToken),
    Released,
}

/// The source and the live token, shared between a sequence and its closers
/// so either side can release the registration.
struct Registration<S> {
    source: Arc<S>,
    state: Mutex<RegistrationState>,
}

impl<S: EventSource> Registration<S> {
    fn lock(&self) -> MutexGuard<'_, RegistrationState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register(
        &self,
        kind: &S::Kind,
        target: Option<&S::Target>,
        sender: SlotSender<S::Event>,
    ) {
        // Held across `register` so a concurrent release cannot miss the token.
        let mut state = self.lock();
        if !matches!(*state, RegistrationState::Pending) {
            return;
        }
        let token = self.source.register(
            kind,
            target,
            Arc::new(move |event: S::Event| {
                if sender.offer(event) == Offer::Closed {
                    tracing::trace!("event dropped: sequence already torn down");
                }
            }),
        );
        *state = RegistrationState::Registered(token);
    }

    fn release(&self) {
        let previous = std::mem::replace(&mut *self.lock(), RegistrationState::Released);
        if let RegistrationState::Registered(token) = previous {
            self.source.unregister(token);
        }
    }

    fn is_registered(&self) -> bool {
        matches!(*self.lock(), RegistrationState::Registered(_))
    }

    fn is_released(&self) -> bool {
        matches!(*self.lock(), RegistrationState::Released)
    }
}

pub struct EventSequence<S: EventSource> {
    kind: S::Kind,
    target: Option<S::Target>,
    /// Moves into the source's callback on activation.
    sender: Option<SlotSender<S::Event>>,
    receiver: SlotReceiver<S::Event>,
    registration: Arc<Registration<S>>,
}

impl<S: EventSource> EventSequence<S> {
    /// Registers with the source now instead of on first pull. Events fired
    /// from here on are captured even if nobody is awaiting yet.
    pub fn activate(&mut self) {
        if let Some(sender) = self.sender.take() {
            self.registration.register(&self.kind, self.target.as_ref(), sender);
        }
    }

    pub fn is_active(&self) -> bool {
        self.registration.is_registered()
    }

    pub fn is_finished(&self) -> bool {
        self.registration.is_released()
    }

    /// Handle that ends the sequence from another task: the registration is
    /// released at once and a pending pull wakes with end-of-sequence.
    pub fn closer(&self) -> SequenceCloser<S> {
        SequenceCloser {
            slot: self.receiver.closer(),
            registration: Arc::clone(&self.registration),
        }
    }

    /// Ends the sequence and releases the registration.
    pub fn close(&mut self) {
        self.registration.release();
        self.receiver.close();
    }
}

impl<S: EventSource> Unpin for EventSequence<S> {}

impl<S: EventSource> Stream for EventSequence<S> {
    type Item = S::Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.is_finished() {
            return Poll::Ready(None);
        }
        this.activate();
        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(event)),
            Poll::Ready(None) => {
                this.registration.release();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S: EventSource> FusedStream for EventSequence<S> {
    fn is_terminated(&self) -> bool {
        self.is_finished()
    }
}

impl<S: EventSource> Drop for EventSequence<S> {
    fn drop(&mut self) {
        self.registration.release();
    }
}

/// Tears an [`EventSequence`] down from outside the consuming task.
pub struct SequenceCloser<S: EventSource> {
    slot: SlotCloser<S::Event>,
    registration: Arc<Registration<S>>,
}

impl<S: EventSource> SequenceCloser<S> {
    /// Unregisters from the source, drops any unread event and wakes a
    /// pending pull.
    pub fn close(&self) {
        self.registration.release();
        self.slot.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }
}

impl<S: EventSource> Clone for SequenceCloser<S> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            registration: Arc::clone(&self.registration),
        }
    }
}

#[cfg(test)]
#[path = "tests/sequence_tests.rs"]
mod tests;
