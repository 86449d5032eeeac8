mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::json;

fn assert_contiguous(entries: &[(String, i64)]) {
    for (i, (_, position)) in entries.iter().enumerate() {
        assert_eq!(*position, i as i64 + 1, "positions not contiguous: {:?}", entries);
    }
}

#[tokio::test]
async fn test_leaving_compacts_positions() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;
    app.action("register", &sid, "user-a").await;

    let res = app.action("join_waitlist", &sid, "user-d").await;
    assert_eq!(parse_body(res).await["position"], 1);
    let res = app.action("join_waitlist", &sid, "user-e").await;
    assert_eq!(parse_body(res).await["position"], 2);

    assert_eq!(app.action("leave_waitlist", &sid, "user-d").await.status(), StatusCode::OK);

    assert_eq!(app.waitlist(&sid).await, vec![("user-e".to_string(), 1)]);
}

#[tokio::test]
async fn test_duplicate_join_is_rejected() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;
    app.action("register", &sid, "user-a").await;

    app.action("join_waitlist", &sid, "user-b").await;
    let res = app.action("join_waitlist", &sid, "user-b").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["error"], "Already on the waitlist for this session");

    // Waitlisted users cannot bypass the queue
    let res = app.action("register", &sid, "user-b").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(app.waitlist(&sid).await.len(), 1);
}

#[tokio::test]
async fn test_process_waitlist_without_free_spots_is_noop() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;
    app.action("register", &sid, "user-a").await;
    app.action("join_waitlist", &sid, "user-b").await;

    let before = app.capacity(&sid).await;
    let res = app.send_json("POST", "/api/v1/sessions/capacity", json!({"action": "process_waitlist", "sessionId": sid})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert!(body.get("promotedUserIds").is_none());

    let after = app.capacity(&sid).await;
    assert_eq!(before["registeredCount"], after["registeredCount"]);
    assert_eq!(before["waitlistCount"], after["waitlistCount"]);
    assert_eq!(app.waitlist(&sid).await, vec![("user-b".to_string(), 1)]);
}

#[tokio::test]
async fn test_capacity_increase_drains_in_queue_order() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;
    app.action("register", &sid, "user-a").await;
    for user in ["user-b", "user-c", "user-d", "user-e"] {
        app.action("join_waitlist", &sid, user).await;
    }

    let res = app.send_json("PUT", &format!("/api/v1/sessions/{}", sid), json!({"maxAttendees": 3})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["promotedUserIds"], json!(["user-b", "user-c"]));
    assert_eq!(body["capacity"]["registeredCount"], 3);

    let waitlist = app.waitlist(&sid).await;
    assert_eq!(waitlist, vec![("user-d".to_string(), 1), ("user-e".to_string(), 2)]);

    // Lifting the limit admits everyone left
    let res = app.send_json("PUT", &format!("/api/v1/sessions/{}", sid), json!({"removeCapacityLimit": true})).await;
    let body = parse_body(res).await;
    assert_eq!(body["promotedUserIds"], json!(["user-d", "user-e"]));
    assert!(app.waitlist(&sid).await.is_empty());
}

#[tokio::test]
async fn test_mixed_sequence_keeps_positions_contiguous() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(2), true).await;
    app.action("register", &sid, "r-1").await;
    app.action("register", &sid, "r-2").await;

    for i in 0..6 {
        app.action("join_waitlist", &sid, &format!("w-{}", i)).await;
    }

    app.action("leave_waitlist", &sid, "w-2").await;
    assert_contiguous(&app.waitlist(&sid).await);

    app.action("cancel_registration", &sid, "r-1").await;
    let waitlist = app.waitlist(&sid).await;
    assert_contiguous(&waitlist);
    assert_eq!(waitlist.first().map(|(u, _)| u.as_str()), Some("w-1"));

    app.action("leave_waitlist", &sid, "w-5").await;
    app.action("join_waitlist", &sid, "w-6").await;
    app.action("cancel_registration", &sid, "w-0").await;

    let waitlist = app.waitlist(&sid).await;
    assert_contiguous(&waitlist);
    let users: Vec<&str> = waitlist.iter().map(|(u, _)| u.as_str()).collect();
    assert_eq!(users, vec!["w-3", "w-4", "w-6"]);

    let registered = app.registered_users(&sid).await;
    assert_eq!(registered.len(), 2);
    for user in &registered {
        assert!(!users.contains(&user.as_str()), "{} is both registered and waitlisted", user);
    }
}

#[tokio::test]
async fn test_attendance_status_follows_lifecycle() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;
    let uri = |user: &str| format!("/api/v1/sessions/{}/attendance/{}", sid, user);

    app.action("register", &sid, "user-a").await;
    app.action("join_waitlist", &sid, "user-b").await;

    let body = parse_body(app.get(&uri("user-b")).await).await;
    assert_eq!(body, json!({"state": "WAITLISTED", "position": 1}));

    app.action("cancel_registration", &sid, "user-a").await;

    let body = parse_body(app.get(&uri("user-b")).await).await;
    assert_eq!(body, json!({"state": "REGISTERED", "status": "CONFIRMED"}));
    let body = parse_body(app.get(&uri("user-a")).await).await;
    assert_eq!(body, json!({"state": "NONE"}));
}

#[tokio::test]
async fn test_reopening_session_promotes_waiting_users() {
    let app = TestApp::new().await;
    let sid = app.create_session("conf-2024", Some(1), true).await;
    app.action("register", &sid, "user-a").await;
    app.action("join_waitlist", &sid, "user-b").await;
    app.action("join_waitlist", &sid, "user-c").await;

    app.send_json("PUT", &format!("/api/v1/sessions/{}", sid), json!({"status": "CANCELLED"})).await;

    // Closed sessions never promote
    let res = app.action("cancel_registration", &sid, "user-a").await;
    assert!(parse_body(res).await.get("promotedUserIds").is_none());
    assert_eq!(app.waitlist(&sid).await.len(), 2);

    let res = app.send_json("PUT", &format!("/api/v1/sessions/{}", sid), json!({"status": "SCHEDULED"})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["promotedUserIds"], json!(["user-b"]));
    assert_eq!(app.waitlist(&sid).await, vec![("user-c".to_string(), 1)]);
}
