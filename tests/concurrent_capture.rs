//! Concurrency tests for the capture pipeline
//!
//! These tests ensure no event is lost or duplicated when many pixel requests
//! and stats reads run at the same time.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use beacon::api;
use beacon::tracking::{PixelTracker, TrackingEvent};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pixel_requests() {
    let tracker = PixelTracker::default();
    let handler_calls = Arc::new(AtomicUsize::new(0));
    {
        let handler_calls = Arc::clone(&handler_calls);
        tracker.use_handler(move |_: &TrackingEvent| -> anyhow::Result<()> {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    let app = api::create_router(tracker.clone());

    let num_requests = 100;
    let mut handles = vec![];
    for id in 0..num_requests {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .uri(format!("/pixel.gif?id={id}"))
                .body(Body::empty())
                .unwrap();
            let response = app.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            response.headers()[header::SET_COOKIE]
                .to_str()
                .unwrap()
                .to_string()
        }));
    }

    let mut cookies = HashSet::new();
    for handle in handles {
        cookies.insert(handle.await.unwrap());
    }
    assert_eq!(cookies.len(), num_requests, "every token should be distinct");

    tracker.drain().await;

    let events = tracker.events().await;
    assert_eq!(events.len(), num_requests);

    let ids: HashSet<&str> = events.iter().map(|e| e.query["id"].as_str()).collect();
    assert_eq!(ids.len(), num_requests, "no event lost or duplicated");
    assert_eq!(handler_calls.load(Ordering::SeqCst), num_requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stats_reads_during_capture() {
    let tracker = PixelTracker::default();
    let app = api::create_router(tracker.clone());

    let writers: Vec<_> = (0..50)
        .map(|id| {
            let app = app.clone();
            tokio::spawn(async move {
                let request = Request::builder()
                    .uri(format!("/pixel.gif?id={id}"))
                    .body(Body::empty())
                    .unwrap();
                app.oneshot(request).await.unwrap();
            })
        })
        .collect();

    let readers: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
                let response = app.oneshot(request).await.unwrap();
                assert_eq!(response.status(), StatusCode::OK);
                let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
                // Every snapshot must decode into complete events
                let events: Vec<TrackingEvent> = serde_json::from_slice(&body).unwrap();
                events.len()
            })
        })
        .collect();

    for writer in writers {
        writer.await.unwrap();
    }
    for reader in readers {
        assert!(reader.await.unwrap() <= 50);
    }

    tracker.drain().await;
    assert_eq!(tracker.events().await.len(), 50);
}
