//! Broadcast hub for real-time session capacity updates.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::domain::models::broadcast::BroadcastEvent;
use crate::domain::ports::Broadcaster;

#[derive(Clone)]
pub struct SseBroadcaster {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl SseBroadcaster {
    /// `capacity` is the number of events buffered per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        info!("SSE broadcaster initialized with capacity {}", capacity);
        Self { tx }
    }
}

impl Broadcaster for SseBroadcaster {
    fn publish(&self, event: BroadcastEvent) {
        match self.tx.send(event) {
            Ok(count) => debug!("Broadcast event to {} clients", count),
            Err(_) => debug!("Broadcast dropped, no clients connected"),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }

    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Turns a subscription into an SSE response. Lagging clients skip missed events.
pub fn sse_stream(rx: broadcast::Receiver<BroadcastEvent>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => Event::default()
                .event(event.event_type.as_str())
                .json_data(&event)
                .ok()
                .map(Ok),
            Err(e) => {
                warn!("SSE client lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::broadcast::{BroadcastType, MODULE_SESSIONS};
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let hub = SseBroadcaster::new(4);
        hub.publish(BroadcastEvent::sessions(BroadcastType::SessionUpdated, json!({})));
        assert_eq!(hub.subscriber_count(), 0);

        let rx = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(rx);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let hub = SseBroadcaster::new(8);
        let mut rx = hub.subscribe();

        hub.publish(BroadcastEvent::sessions(BroadcastType::WaitlistJoined, json!({ "position": 1 })));
        hub.publish(BroadcastEvent::sessions(BroadcastType::WaitlistPromoted, json!({ "userId": "u1" })));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type, BroadcastType::WaitlistJoined);
        assert_eq!(first.module, MODULE_SESSIONS);
        assert_eq!(second.data["userId"], "u1");

        let wire = serde_json::to_value(&second).unwrap();
        assert_eq!(wire["type"], "WAITLIST_PROMOTED");
        assert_eq!(wire["module"], "sessions");
    }
}
