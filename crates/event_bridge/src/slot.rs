//! Single-slot rendezvous between a synchronous producer and one async consumer.
//!
//! The slot holds either nothing, one unread value, or one parked waiter. A
//! value and a waiter never coexist: a value offered while a waiter is parked
//! is handed straight to it, and a consumer that finds a value takes it
//! without parking.

use std::{
    future::poll_fn,
    mem,
    sync::{Arc, Mutex, MutexGuard},
    task::{Context, Poll, Waker},
};

/// What happens to a value offered while an earlier one is still unread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// The newer value replaces the unread one.
    #[default]
    Overwrite,
    /// The unread value stays; the newer one is dropped.
    KeepUnread,
}

/// Result of [`SlotSender::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// A parked consumer was woken with the value.
    Delivered,
    /// No consumer was waiting; the value is stored until the next read.
    Buffered,
    /// An unread value was dropped in favour of this one.
    Replaced,
    /// An unread value was kept and this one was dropped.
    Discarded,
    /// The consumer side is gone or torn down.
    Closed,
}

enum Slot<T> {
    Empty,
    Value(T),
    Waiter(Waker),
}

struct State<T> {
    slot: Slot<T>,
    senders: usize,
    closed: bool,
    policy: OverflowPolicy,
}

struct Shared<T> {
    state: Mutex<State<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn close(&self) {
        let waiter = {
            let mut state = self.lock();
            state.closed = true;
            take_waiter(&mut state.slot)
        };
        if let Some(waiter) = waiter {
            waiter.wake();
        }
    }
}

/// Empties the slot, returning the parked waiter if there was one. An unread
/// value is dropped.
fn take_waiter<T>(slot: &mut Slot<T>) -> Option<Waker> {
    match mem::replace(slot, Slot::Empty) {
        Slot::Waiter(waker) => Some(waker),
        Slot::Empty | Slot::Value(_) => None,
    }
}

pub fn channel<T>(policy: OverflowPolicy) -> (SlotSender<T>, SlotReceiver<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            slot: Slot::Empty,
            senders: 1,
            closed: false,
            policy,
        }),
    });
    (
        SlotSender {
            shared: Arc::clone(&shared),
        },
        SlotReceiver { shared },
    )
}

/// Producer half. Cheap to clone; the slot ends once every sender is dropped
/// and any unread value has been taken.
pub struct SlotSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SlotSender<T> {
    pub fn offer(&self, value: T) -> Offer {
        let (outcome, waiter) = {
            let mut state = self.shared.lock();
            if state.closed {
                return Offer::Closed;
            }
            let policy = state.policy;
            match mem::replace(&mut state.slot, Slot::Empty) {
                Slot::Empty => {
                    state.slot = Slot::Value(value);
                    (Offer::Buffered, None)
                }
                Slot::Waiter(waker) => {
                    state.slot = Slot::Value(value);
                    (Offer::Delivered, Some(waker))
                }
                Slot::Value(unread) => match policy {
                    OverflowPolicy::Overwrite => {
                        state.slot = Slot::Value(value);
                        (Offer::Replaced, None)
                    }
                    OverflowPolicy::KeepUnread => {
                        state.slot = Slot::Value(unread);
                        (Offer::Discarded, None)
                    }
                },
            }
        };
        if let Some(waiter) = waiter {
            waiter.wake();
        }
        outcome
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl<T> Clone for SlotSender<T> {
    fn clone(&self) -> Self {
        self.shared.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for SlotSender<T> {
    fn drop(&mut self) {
        let waiter = {
            let mut state = self.shared.lock();
            state.senders -= 1;
            if state.senders > 0 || matches!(state.slot, Slot::Value(_)) {
                return;
            }
            take_waiter(&mut state.slot)
        };
        if let Some(waiter) = waiter {
            waiter.wake();
        }
    }
}

/// Consumer half. Reading needs `&mut self`, so a receiver can never have two
/// reads outstanding.
pub struct SlotReceiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SlotReceiver<T> {
    /// Waits for the next value. Returns `None` once the slot is closed, or
    /// once every sender is gone and nothing is left unread.
    pub async fn recv(&mut self) -> Option<T> {
        poll_fn(|cx| self.poll_recv(cx)).await
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let mut state = self.shared.lock();
        if let Slot::Value(value) = mem::replace(&mut state.slot, Slot::Empty) {
            return Poll::Ready(Some(value));
        }
        if state.closed || state.senders == 0 {
            return Poll::Ready(None);
        }
        state.slot = Slot::Waiter(cx.waker().clone());
        Poll::Pending
    }

    /// Handle that can tear the slot down while a read is pending.
    pub fn closer(&self) -> SlotCloser<T> {
        SlotCloser {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn close(&mut self) {
        self.shared.close();
    }
}

impl<T> Drop for SlotReceiver<T> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

pub struct SlotCloser<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SlotCloser<T> {
    /// Closes the slot: any unread value is dropped, a parked consumer wakes
    /// with `None`, and later offers return [`Offer::Closed`].
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl<T> Clone for SlotCloser<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[cfg(test)]
#[path = "tests/slot_tests.rs"]
mod tests;
