//! A text field that publishes edits through an [`EventHub`], and the
//! sequence of its text values.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

use event_bridge::{subscribe, EventHub, EventSequence};
use futures::{Stream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEventKind {
    TextChanged,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEvent {
    pub kind: FieldEventKind,
    pub text: String,
}

/// Identity a field posts its events under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub u64);

impl FieldId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub type FieldHub = EventHub<FieldEventKind, FieldEvent, FieldId>;

pub struct SearchField {
    id: FieldId,
    text: RwLock<String>,
    hub: Arc<FieldHub>,
}

impl Default for SearchField {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchField {
    pub fn new() -> Self {
        Self::on_hub(Arc::new(EventHub::new()))
    }

    /// A field posting through a hub it may share with other fields. Its own
    /// sequences only see its own events.
    pub fn on_hub(hub: Arc<FieldHub>) -> Self {
        Self {
            id: FieldId::next(),
            text: RwLock::new(String::new()),
            hub,
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn text(&self) -> String {
        self.text
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replaces the text and fires [`FieldEventKind::TextChanged`]. Setting
    /// the same text again fires nothing.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut current = self
                .text
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *current == text {
                return;
            }
            current.clone_from(&text);
        }
        self.hub.post(
            &FieldEventKind::TextChanged,
            Some(&self.id),
            FieldEvent {
                kind: FieldEventKind::TextChanged,
                text,
            },
        );
    }

    pub fn submit(&self) {
        self.hub.post(
            &FieldEventKind::Submitted,
            Some(&self.id),
            FieldEvent {
                kind: FieldEventKind::Submitted,
                text: self.text(),
            },
        );
    }

    pub fn events(&self, kind: FieldEventKind) -> EventSequence<FieldHub> {
        subscribe(Arc::clone(&self.hub), kind, Some(self.id))
    }

    /// Live sequence of the field's text. Registered immediately so edits made
    /// before the first pull are not missed; a consumer that falls behind sees
    /// only the latest text.
    pub fn text_changes(&self) -> impl Stream<Item = String> + Send + Unpin + 'static {
        let mut events = self.events(FieldEventKind::TextChanged);
        events.activate();
        events.map(|event| event.text)
    }

    /// Observers on the underlying hub, across every field sharing it.
    pub fn observer_count(&self) -> usize {
        self.hub.observer_count(&FieldEventKind::TextChanged)
            + self.hub.observer_count(&FieldEventKind::Submitted)
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn text_changes_yield_latest_text() {
        let field = SearchField::new();
        let mut changes = field.text_changes();

        field.set_text("acc");
        assert_eq!(changes.next().await.as_deref(), Some("acc"));

        field.set_text("accu");
        field.set_text("accus");
        assert_eq!(changes.next().await.as_deref(), Some("accus"));
    }

    #[tokio::test]
    async fn unchanged_text_fires_nothing() {
        let field = SearchField::new();
        let mut changes = field.text_changes();

        field.set_text("beatae");
        assert_eq!(changes.next().await.as_deref(), Some("beatae"));

        field.set_text("beatae");
        assert!(changes.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn submit_is_a_separate_kind() {
        let field = SearchField::new();
        let mut submitted = field.events(FieldEventKind::Submitted);
        submitted.activate();
        let mut changes = field.text_changes();

        field.set_text("quidem");
        field.submit();

        assert_eq!(changes.next().await.as_deref(), Some("quidem"));
        let event = submitted.next().await.expect("submitted event");
        assert_eq!(event.kind, FieldEventKind::Submitted);
        assert_eq!(event.text, "quidem");
    }

    #[test]
    fn dropping_text_changes_releases_registration() {
        let field = SearchField::new();
        let changes = field.text_changes();
        assert_eq!(field.observer_count(), 1);

        drop(changes);
        assert_eq!(field.observer_count(), 0);
    }

    #[tokio::test]
    async fn fields_sharing_a_hub_only_see_their_own_edits() {
        let hub = Arc::new(FieldHub::new());
        let title = SearchField::on_hub(hub.clone());
        let author = SearchField::on_hub(hub.clone());
        assert_ne!(title.id(), author.id());
        let mut title_changes = title.text_changes();

        author.set_text("dolorem");
        assert!(title_changes.next().now_or_never().is_none());

        title.set_text("officia");
        assert_eq!(title_changes.next().await.as_deref(), Some("officia"));
    }
}
