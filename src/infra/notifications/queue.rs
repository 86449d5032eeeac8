use tokio::sync::mpsc;

use crate::domain::models::notification::NotificationCommand;
use crate::domain::ports::NotificationSink;
use crate::error::AppError;

/// Bounded in-process queue drained by the notification worker.
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationCommand>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotificationCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl NotificationSink for NotificationQueue {
    fn enqueue(&self, command: NotificationCommand) -> Result<(), AppError> {
        self.tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AppError::InternalWithMsg("Notification queue is full".into()),
            mpsc::error::TrySendError::Closed(_) => AppError::InternalWithMsg("Notification worker is not running".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::notification::NotificationType;

    fn command(user: &str) -> NotificationCommand {
        NotificationCommand {
            notification_type: NotificationType::SessionRegistration,
            user_id: user.into(),
            session_id: "s1".into(),
            session_title: "Async Rust".into(),
            position: None,
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_blocking() {
        let (queue, mut rx) = NotificationQueue::new(1);
        queue.enqueue(command("a")).unwrap();
        assert!(queue.enqueue(command("b")).is_err());

        assert_eq!(rx.recv().await.unwrap().user_id, "a");
        queue.enqueue(command("c")).unwrap();
    }

    #[tokio::test]
    async fn test_closed_queue_reports_error() {
        let (queue, rx) = NotificationQueue::new(4);
        drop(rx);
        assert!(matches!(queue.enqueue(command("a")), Err(AppError::InternalWithMsg(_))));
    }
}
