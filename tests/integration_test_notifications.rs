mod common;

use axum::http::StatusCode;
use capacity_backend::domain::models::broadcast::BroadcastType;
use common::{parse_body, TestApp};
use serde_json::{json, Value};
use std::time::Duration;

#[tokio::test]
async fn test_lifecycle_notifications_are_persisted() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;

    app.action("register", &sid, "user-a").await;
    app.action("join_waitlist", &sid, "user-b").await;

    let items = app.wait_for_notifications("user-b", 1).await;
    assert_eq!(items[0]["notificationType"], "WAITLIST_JOINED");
    assert!(items[0]["message"].as_str().unwrap().contains("number 1"));

    app.action("cancel_registration", &sid, "user-a").await;

    let items = app.wait_for_notifications("user-b", 2).await;
    let types: Vec<&str> = items.iter().map(|n| n["notificationType"].as_str().unwrap()).collect();
    assert!(types.contains(&"WAITLIST_PROMOTED"));
    assert!(items.iter().all(|n| n["sessionId"] == sid.as_str()));

    let items = app.wait_for_notifications("user-a", 1).await;
    assert_eq!(items[0]["notificationType"], "SESSION_REGISTRATION");
    assert!(items[0]["title"].as_str().unwrap().contains("Rust in Production"));
}

#[tokio::test]
async fn test_mark_notification_read() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(3), true).await;
    app.action("register", &sid, "user-a").await;

    let items = app.wait_for_notifications("user-a", 1).await;
    let id = items[0]["id"].as_str().unwrap().to_string();
    assert_eq!(items[0]["isRead"], false);

    let res = app.send_json("POST", &format!("/api/v1/notifications/{}/read", id), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["isRead"], true);

    let unread = parse_body(app.get("/api/v1/users/user-a/notifications?unreadOnly=true").await).await;
    assert_eq!(unread, Value::Array(vec![]));

    let res = app.send_json("POST", "/api/v1/notifications/missing/read", json!({})).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promotion_is_broadcast() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;
    app.action("register", &sid, "user-a").await;
    app.action("join_waitlist", &sid, "user-b").await;

    let mut rx = app.state.broadcaster.subscribe();
    app.action("cancel_registration", &sid, "user-a").await;

    let mut seen = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
        assert_eq!(event.module, "sessions");
        seen.push(event);
    }

    let promoted = seen.iter()
        .find(|e| e.event_type == BroadcastType::WaitlistPromoted)
        .expect("no promotion event");
    assert_eq!(promoted.data["userId"], "user-b");
    assert!(seen.iter().any(|e| e.event_type == BroadcastType::SessionCancelled));
}
