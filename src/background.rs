use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::notification::{Notification, NotificationCommand};
use crate::error::AppError;

/// Persists queued notifications until every sender is gone.
pub async fn start_notification_worker(state: Arc<AppState>, mut rx: mpsc::Receiver<NotificationCommand>) {
    info!("Starting notification worker...");

    while let Some(command) = rx.recv().await {
        let span = info_span!(
            "notification",
            notification_type = %command.notification_type.as_str(),
            user_id = %command.user_id,
            session_id = %command.session_id
        );

        async {
            match deliver(&state, &command).await {
                Ok(notification) => info!("Notification {} stored", notification.id),
                Err(e) => error!("Failed to store notification: {}", e),
            }
        }
            .instrument(span)
            .await;
    }

    info!("Notification queue closed, worker stopping");
}

async fn deliver(state: &AppState, command: &NotificationCommand) -> Result<Notification, AppError> {
    let (title, message) = state.templates.render(command)?;
    let notification = Notification::new(command, title, message);
    state.notification_repo.create(&notification).await
}
