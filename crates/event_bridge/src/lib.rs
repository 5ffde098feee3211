//! Bridges push-based callback sources into pull-based async sequences.
//!
//! A source implements [`EventSource`]; [`subscribe`] turns one of its event
//! kinds into an [`EventSequence`], a `futures::Stream` that suspends until the
//! next firing. Delivery goes through a capacity-one [`slot`], so a consumer
//! that falls behind sees the most recent unread event, not a backlog.

pub mod collect;
pub mod hub;
pub mod sequence;
pub mod slot;
pub mod source;

pub use collect::SequenceExt;
pub use hub::EventHub;
pub use sequence::{subscribe, subscribe_with_policy, EventSequence, SequenceCloser};
pub use slot::{Offer, OverflowPolicy};
pub use source::{EventCallback, EventSource, ObservationToken};
