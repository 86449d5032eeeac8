use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const BASE_URL_DEFAULT: &str = "http://localhost:3000";
const CAPACITY: i64 = 25;
const CONTENDERS: usize = 200;

struct Outcome {
    latency: Duration,
    status: Option<StatusCode>,
}

#[tokio::main]
async fn main() {
    let base_url = std::env::var("BASE_URL").unwrap_or_else(|_| BASE_URL_DEFAULT.to_string());
    println!("{}", "🚀 Starting Capacity Stress Test".bold().green());
    println!("Target URL: {}", base_url);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");

    if client.get(format!("{}/health", base_url)).send().await.is_err() {
        eprintln!("{}", format!("❌ Server is NOT reachable at {}. Please start it first.", base_url).red().bold());
        return;
    }

    let event_id = format!("stress-{}", Uuid::new_v4());
    let session_id = setup_session(&client, &base_url, &event_id).await;
    println!("{}", "✅ Session created.".green());
    println!("   Event ID:   {}", event_id);
    println!("   Session ID: {}", session_id);

    println!("\n{}", "=".repeat(60));
    println!("Phase 1: {} concurrent registrations for {} seats", CONTENDERS, CAPACITY);
    println!("{}", "=".repeat(60));
    let outcomes = fire(&client, &base_url, &session_id, "register", CONTENDERS).await;
    report(&outcomes);

    println!("\n{}", "=".repeat(60));
    println!("Phase 2: rejected users join the waitlist concurrently");
    println!("{}", "=".repeat(60));
    let outcomes = fire(&client, &base_url, &session_id, "join_waitlist", CONTENDERS).await;
    report(&outcomes);

    let capacity = get_json(&client, &format!("{}/api/v1/sessions/capacity?sessionId={}", base_url, session_id)).await;
    let registered = capacity["registeredCount"].as_i64().unwrap_or(-1);
    let waitlisted = capacity["waitlistCount"].as_i64().unwrap_or(-1);

    let waitlist = get_json(&client, &format!("{}/api/v1/sessions/{}/waitlist", base_url, session_id)).await;
    let positions: Vec<i64> = waitlist.as_array()
        .map(|entries| entries.iter().filter_map(|e| e["position"].as_i64()).collect())
        .unwrap_or_default();
    let contiguous = positions.iter().enumerate().all(|(i, p)| *p == i as i64 + 1);

    println!("\n{}", "Invariants".bold());
    verdict(&format!("registered ({}) <= capacity ({})", registered, CAPACITY), registered <= CAPACITY && registered >= 0);
    verdict(&format!("registered + waitlisted ({}) == contenders ({})", registered + waitlisted, CONTENDERS), registered + waitlisted == CONTENDERS as i64);
    verdict(&format!("waitlist positions contiguous 1..{}", positions.len()), contiguous);
}

fn user_id(i: usize) -> String {
    format!("stress-user-{:04}", i)
}

async fn setup_session(client: &Client, base_url: &str, event_id: &str) -> String {
    let start = Utc::now() + ChronoDuration::days(7);
    let res = client.post(format!("{}/api/v1/events/{}/sessions", base_url, event_id))
        .json(&json!({
            "title": "Stress Test Keynote",
            "startTime": start.to_rfc3339(),
            "endTime": (start + ChronoDuration::hours(1)).to_rfc3339(),
            "maxAttendees": CAPACITY,
            "allowWaitlist": true
        }))
        .send()
        .await
        .expect("Failed to send session create request");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Failed to create session. Status: {}. Body: {}", status, txt);
    }

    let body: Value = res.json().await.expect("Failed to parse session response");
    body["id"].as_str().expect("No session id").to_string()
}

async fn fire(client: &Client, base_url: &str, session_id: &str, action: &str, count: usize) -> Vec<Outcome> {
    let (tx, mut rx) = mpsc::channel(count);

    for i in 0..count {
        let client = client.clone();
        let url = format!("{}/api/v1/sessions/capacity", base_url);
        let body = json!({ "action": action, "sessionId": session_id, "userId": user_id(i) });
        let tx = tx.clone();

        tokio::spawn(async move {
            let req_start = Instant::now();
            let res = client.post(&url).json(&body).send().await;
            let _ = tx.send(Outcome {
                latency: req_start.elapsed(),
                status: res.ok().map(|r| r.status()),
            }).await;
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(count);
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes
}

fn report(outcomes: &[Outcome]) {
    let mut histogram = Histogram::<u64>::new(3).expect("Failed to create histogram");
    let mut ok = 0;
    let mut conflicts = 0;
    let mut failures = 0;

    for outcome in outcomes {
        let _ = histogram.record(outcome.latency.as_micros() as u64);
        match outcome.status {
            Some(s) if s.is_success() => ok += 1,
            Some(StatusCode::CONFLICT) => conflicts += 1,
            _ => failures += 1,
        }
    }

    println!("{:<10} | {:<10} | {:<10} | {:<12} | {:<12}", "OK", "Conflict", "Failed", "Mean (ms)", "P99 (ms)");
    println!("{:-<10}-+-{:-<10}-+-{:-<10}-+-{:-<12}-+-{:-<12}", "", "", "", "", "");
    println!(
        "{:<10} | {:<10} | {:<10} | {:<12.2} | {:<12.2}",
        ok,
        conflicts,
        failures,
        histogram.mean() / 1000.0,
        histogram.value_at_quantile(0.99) as f64 / 1000.0
    );
}

async fn get_json(client: &Client, url: &str) -> Value {
    match client.get(url).send().await {
        Ok(res) => res.json().await.unwrap_or(Value::Null),
        Err(e) => {
            eprintln!("{}", format!("GET {} failed: {}", url, e).red());
            Value::Null
        }
    }
}

fn verdict(label: &str, held: bool) {
    if held {
        println!("  {} {}", "✔".green().bold(), label);
    } else {
        println!("  {} {}", "✘".red().bold(), label);
    }
}
