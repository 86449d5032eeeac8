use capacity_backend::{
    api::router::create_router,
    background::start_notification_worker,
    config::Config,
    infra::factory::{assemble_state, Repositories},
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::{json, Value};

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            broadcast_capacity: 64,
            notification_queue_capacity: 256,
            log_dir: "./logs".to_string(),
        };

        let (state, notification_rx) = assemble_state(&config, Repositories::sqlite(pool.clone()))
            .expect("Failed to assemble state");
        let state = Arc::new(state);

        let worker_state = state.clone();
        tokio::spawn(async move {
            start_notification_worker(worker_state, notification_rx).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.router.clone().oneshot(
            Request::builder().method("GET").uri(uri)
                .body(Body::empty()).unwrap()
        ).await.unwrap()
    }

    pub async fn send_json(&self, method: &str, uri: &str, payload: Value) -> Response {
        self.router.clone().oneshot(
            Request::builder().method(method).uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string())).unwrap()
        ).await.unwrap()
    }

    pub async fn action(&self, action: &str, session_id: &str, user_id: &str) -> Response {
        self.send_json("POST", "/api/v1/sessions/capacity", json!({
            "action": action,
            "sessionId": session_id,
            "userId": user_id
        })).await
    }

    /// Creates a session one week out and returns its id.
    pub async fn create_session(&self, event_id: &str, max_attendees: Option<i32>, allow_waitlist: bool) -> String {
        let start = Utc::now() + ChronoDuration::days(7);
        let res = self.send_json("POST", &format!("/api/v1/events/{}/sessions", event_id), json!({
            "title": "Rust in Production",
            "startTime": start.to_rfc3339(),
            "endTime": (start + ChronoDuration::hours(1)).to_rfc3339(),
            "location": "Hall B",
            "maxAttendees": max_attendees,
            "allowWaitlist": allow_waitlist
        })).await;
        assert_eq!(res.status(), axum::http::StatusCode::CREATED);
        parse_body(res).await["id"].as_str().unwrap().to_string()
    }

    pub async fn capacity(&self, session_id: &str) -> Value {
        parse_body(self.get(&format!("/api/v1/sessions/capacity?sessionId={}", session_id)).await).await
    }

    /// `(user_id, position)` pairs in queue order.
    pub async fn waitlist(&self, session_id: &str) -> Vec<(String, i64)> {
        let body = parse_body(self.get(&format!("/api/v1/sessions/{}/waitlist", session_id)).await).await;
        body.as_array().unwrap().iter()
            .map(|e| (e["userId"].as_str().unwrap().to_string(), e["position"].as_i64().unwrap()))
            .collect()
    }

    pub async fn registered_users(&self, session_id: &str) -> Vec<String> {
        let body = parse_body(self.get(&format!("/api/v1/sessions/{}/registrations", session_id)).await).await;
        body.as_array().unwrap().iter()
            .map(|r| r["userId"].as_str().unwrap().to_string())
            .collect()
    }

    /// Polls until the background worker has stored `expected` notifications for the user.
    pub async fn wait_for_notifications(&self, user_id: &str, expected: usize) -> Vec<Value> {
        for _ in 0..50 {
            let body = parse_body(self.get(&format!("/api/v1/users/{}/notifications", user_id)).await).await;
            let items = body.as_array().cloned().unwrap_or_default();
            if items.len() >= expected {
                return items;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Timed out waiting for {} notifications for {}", expected, user_id);
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
