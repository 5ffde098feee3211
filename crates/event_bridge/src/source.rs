use std::sync::Arc;

/// Callback handed to a push source. Invoked from whatever context the source
/// fires in, possibly several threads at once.
pub type EventCallback<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Live registration with an [`EventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationToken(pub u64);

/// A push-based source: fires registered callbacks and has no idea whether
/// anyone downstream is ready for the event.
pub trait EventSource: Send + Sync + 'static {
    type Kind: Clone + Send + Sync + 'static;
    type Event: Send + 'static;
    /// Identity of the object an event is posted from.
    type Target: Clone + PartialEq + Send + Sync + 'static;

    /// A `target` of `None` observes the kind from every sender; `Some`
    /// restricts delivery to events posted by that sender.
    fn register(
        &self,
        kind: &Self::Kind,
        target: Option<&Self::Target>,
        callback: EventCallback<Self::Event>,
    ) -> ObservationToken;

    /// Releasing an unknown or already released token is a no-op.
    fn unregister(&self, token: ObservationToken);
}
