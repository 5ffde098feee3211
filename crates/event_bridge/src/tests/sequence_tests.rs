use std::time::Duration;

use futures::{FutureExt, StreamExt};

use super::*;
use crate::{hub::EventHub, SequenceExt};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    DidReceiveData,
    TextChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notification {
    name: &'static str,
    payload: u32,
}

fn notification(payload: u32) -> Notification {
    Notification {
        name: "didReceiveData",
        payload,
    }
}

fn hub() -> Arc<EventHub<Kind, Notification>> {
    Arc::new(EventHub::new())
}

#[test]
fn registration_waits_for_first_pull() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);

    assert!(!events.is_active());
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 0);
    assert_eq!(hub.post(&Kind::DidReceiveData, None, notification(1)), 0);

    assert!(events.next().now_or_never().is_none());
    assert!(events.is_active());
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 1);
}

#[tokio::test]
async fn event_fired_before_next_is_returned_then_next_suspends_until_teardown() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);
    events.activate();

    hub.post(&Kind::DidReceiveData, None, notification(1));
    assert_eq!(events.next().await, Some(notification(1)));

    assert!(
        events.next().now_or_never().is_none(),
        "second next should suspend with nothing fired"
    );

    let closer = events.closer();
    let consumer = tokio::spawn(async move { events.next().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    closer.close();

    let end = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("teardown should end the pending next")
        .expect("join");
    assert_eq!(end, None);
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 0);
}

#[tokio::test]
async fn pending_next_resumes_when_the_source_fires() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);

    let consumer = tokio::spawn(async move { events.next().await });
    while hub.observer_count(&Kind::DidReceiveData) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    hub.post(&Kind::DidReceiveData, None, notification(42));

    let received = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer should resume")
        .expect("join");
    assert_eq!(received, Some(notification(42)));
}

#[tokio::test]
async fn unread_event_is_replaced_by_a_later_one() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);
    events.activate();

    hub.post(&Kind::DidReceiveData, None, notification(1));
    hub.post(&Kind::DidReceiveData, None, notification(2));

    assert_eq!(events.next().await, Some(notification(2)));
    assert!(events.next().now_or_never().is_none());
}

#[tokio::test]
async fn keep_unread_sequence_drops_later_events() {
    let hub = hub();
    let mut events = subscribe_with_policy(
        hub.clone(),
        Kind::DidReceiveData,
        None,
        OverflowPolicy::KeepUnread,
    );
    events.activate();

    hub.post(&Kind::DidReceiveData, None, notification(1));
    hub.post(&Kind::DidReceiveData, None, notification(2));

    assert_eq!(events.next().await, Some(notification(1)));
}

#[tokio::test]
async fn each_handle_registers_independently() {
    let hub = hub();
    let mut first = subscribe(hub.clone(), Kind::DidReceiveData, None);
    let mut second = subscribe(hub.clone(), Kind::DidReceiveData, None);
    first.activate();
    second.activate();
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 2);

    assert_eq!(hub.post(&Kind::DidReceiveData, None, notification(5)), 2);
    assert_eq!(first.next().await, Some(notification(5)));
    assert_eq!(second.next().await, Some(notification(5)));

    drop(first);
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 1);
}

#[tokio::test]
async fn events_of_other_kinds_are_not_delivered() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::TextChanged, None);
    events.activate();

    hub.post(&Kind::DidReceiveData, None, notification(1));
    assert!(events.next().now_or_never().is_none());
}

#[tokio::test]
async fn finished_sequence_ends_immediately_when_drained_again() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);
    events.activate();
    hub.post(&Kind::DidReceiveData, None, notification(1));
    events.closer().close();

    let first_pass = (&mut events).drain().await;
    assert!(first_pass.is_empty());
    assert!(events.is_finished());

    let second_pass = events.next().now_or_never();
    assert_eq!(second_pass, Some(None), "second drain must not hang");
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 0);
}

#[tokio::test]
async fn close_releases_registration() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);
    events.activate();
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 1);

    events.close();

    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 0);
    assert_eq!(events.next().await, None);
}

#[tokio::test]
async fn dropping_an_abandoned_sequence_releases_registration() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);
    events.activate();

    drop(events);

    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 0);
    assert_eq!(hub.post(&Kind::DidReceiveData, None, notification(1)), 0);
}

#[tokio::test]
async fn projection_extracts_a_field_per_event() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);
    events.activate();
    let mut payloads = events.map(|event| event.payload);

    hub.post(&Kind::DidReceiveData, None, notification(10));
    assert_eq!(payloads.next().await, Some(10));
    hub.post(&Kind::DidReceiveData, None, notification(11));
    assert_eq!(payloads.next().await, Some(11));
}

#[tokio::test]
async fn closer_releases_registration_without_a_pull() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);
    events.activate();
    let closer = events.closer();

    closer.close();

    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 0);
    assert_eq!(hub.post(&Kind::DidReceiveData, None, notification(1)), 0);
    assert!(events.is_finished());
    assert_eq!(events.next().await, None);
}

#[test]
fn closing_before_activation_never_registers() {
    let hub = hub();
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, None);

    events.closer().close();
    events.activate();

    assert!(!events.is_active());
    assert_eq!(hub.observer_count(&Kind::DidReceiveData), 0);
    assert_eq!(events.next().now_or_never(), Some(None));
}

#[tokio::test]
async fn targeted_sequence_ignores_other_senders() {
    let hub = Arc::new(EventHub::<Kind, Notification, &'static str>::new());
    let mut events = subscribe(hub.clone(), Kind::DidReceiveData, Some("session"));
    events.activate();

    assert_eq!(
        hub.post(&Kind::DidReceiveData, Some(&"other"), notification(1)),
        0
    );
    assert!(events.next().now_or_never().is_none());

    hub.post(&Kind::DidReceiveData, Some(&"session"), notification(2));
    assert_eq!(events.next().await, Some(notification(2)));
}
