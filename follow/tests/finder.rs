mod common;

use chrono::Utc;
use common::*;
use follow::{BehaviorState, FaceFinder, View, found_queue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const EXPIRATION: Duration = Duration::from_secs(300);

#[tokio::test]
async fn forwards_views_with_faces() {
    let detector = Arc::new(StubDetector::at(&[180]));
    let telemetry = Arc::new(CountingTelemetry::default());
    let pinned = pinned(BehaviorState::Searching, None);
    let (found_tx, mut found_rx) = found_queue();
    let (tx, rx) = mpsc::channel(10);
    let finder = FaceFinder::new(
        detector.clone(),
        telemetry.clone(),
        found_tx,
        pinned.handle.clone(),
        EXPIRATION,
    );
    let task = tokio::spawn(finder.run(rx));

    for heading in [0.0, 60.0, 120.0, 180.0, 240.0, 300.0] {
        tx.send(View::captured("LookAround", frame_at(heading), heading, 20.0))
            .await
            .unwrap();
    }
    let found = timeout(Duration::from_secs(2), found_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.heading(), 180.0);
    assert_eq!(found.id(), "LookAround-180");
    assert!(
        timeout(Duration::from_millis(50), found_rx.recv())
            .await
            .is_err()
    );
    assert_eq!(telemetry.sent(), 1);
    assert_eq!(detector.calls(), 6);

    pinned.shutdown.trigger();
    timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn expired_views_are_never_forwarded() {
    let detector = Arc::new(StubDetector::at(&[0, 60]));
    let telemetry = Arc::new(CountingTelemetry::default());
    let pinned = pinned(BehaviorState::Searching, None);
    let (found_tx, mut found_rx) = found_queue();
    let (tx, rx) = mpsc::channel(10);
    let finder = FaceFinder::new(
        detector.clone(),
        telemetry.clone(),
        found_tx,
        pinned.handle.clone(),
        EXPIRATION,
    );
    tokio::spawn(finder.run(rx));

    let stale = Utc::now() - chrono::Duration::seconds(301);
    tx.send(View::captured_at("LookAround", frame_at(0.0), 0.0, 20.0, stale))
        .await
        .unwrap();
    tx.send(View::captured("LookAround", frame_at(60.0), 60.0, 20.0))
        .await
        .unwrap();

    let found = timeout(Duration::from_secs(2), found_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.heading(), 60.0);
    assert!(
        timeout(Duration::from_millis(50), found_rx.recv())
            .await
            .is_err()
    );
    assert_eq!(detector.calls(), 1);
    pinned.shutdown.trigger();
}

#[tokio::test]
async fn stop_ends_drain_with_detections_pending() {
    let detector = Arc::new(StubDetector::at(&[0, 60, 120]));
    let telemetry = Arc::new(CountingTelemetry::default());
    let pinned = pinned(BehaviorState::Searching, None);
    // nobody receives found views, so every positive detection stays blocked
    let (found_tx, _found_rx) = found_queue();
    let (tx, rx) = mpsc::channel(10);
    let finder = FaceFinder::new(
        detector,
        telemetry,
        found_tx,
        pinned.handle.clone(),
        EXPIRATION,
    );
    let task = tokio::spawn(finder.run(rx));
    for heading in [0.0, 60.0, 120.0] {
        tx.send(View::captured("LookAround", frame_at(heading), heading, 20.0))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    pinned.shutdown.trigger();
    timeout(Duration::from_secs(2), task)
        .await
        .expect("finder deadlocked")
        .unwrap();
}

#[tokio::test]
async fn stop_awaits_detections_when_configured() {
    let detector = Arc::new(StubDetector::slow(&[0, 60, 120], Duration::from_millis(50)));
    let telemetry = Arc::new(CountingTelemetry::default());
    let pinned = pinned(BehaviorState::Searching, None);
    let (found_tx, _found_rx) = found_queue();
    let (tx, rx) = mpsc::channel(10);
    let finder = FaceFinder::new(
        detector.clone(),
        telemetry.clone(),
        found_tx,
        pinned.handle.clone(),
        EXPIRATION,
    )
    .await_on_stop(true);
    let task = tokio::spawn(finder.run(rx));
    for heading in [0.0, 60.0, 120.0] {
        tx.send(View::captured("LookAround", frame_at(heading), heading, 20.0))
            .await
            .unwrap();
    }
    timeout(Duration::from_secs(2), async {
        while detector.calls() < 3 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(detector.finished(), 0);

    pinned.shutdown.trigger();
    timeout(Duration::from_secs(2), task)
        .await
        .expect("finder deadlocked")
        .unwrap();
    assert_eq!(detector.finished(), 3);
    assert_eq!(telemetry.sent(), 3);
}

#[tokio::test]
async fn stop_abandons_detections_by_default() {
    let detector = Arc::new(StubDetector::slow(&[0], Duration::from_secs(60)));
    let pinned = pinned(BehaviorState::Searching, None);
    let (found_tx, _found_rx) = found_queue();
    let (tx, rx) = mpsc::channel(10);
    let finder = FaceFinder::new(
        detector.clone(),
        Arc::new(CountingTelemetry::default()),
        found_tx,
        pinned.handle.clone(),
        EXPIRATION,
    );
    let task = tokio::spawn(finder.run(rx));
    tx.send(View::captured("LookAround", frame_at(0.0), 0.0, 20.0))
        .await
        .unwrap();
    timeout(Duration::from_secs(2), async {
        while detector.calls() < 1 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    pinned.shutdown.trigger();
    timeout(Duration::from_secs(2), task)
        .await
        .expect("finder waited on an abandoned detection")
        .unwrap();
    assert_eq!(detector.finished(), 0);
}
