use tera::{Context, Tera};

use crate::domain::models::notification::{NotificationCommand, NotificationType};
use crate::error::AppError;

pub const REGISTRATION_TITLE: &str = "Registered: {{ session_title }}";
pub const REGISTRATION_MESSAGE: &str = "Your spot in \"{{ session_title }}\" is confirmed.";
pub const WAITLIST_JOINED_TITLE: &str = "Waitlisted: {{ session_title }}";
pub const WAITLIST_JOINED_MESSAGE: &str =
    "\"{{ session_title }}\" is full. You are number {{ position }} on the waitlist.";
pub const WAITLIST_PROMOTED_TITLE: &str = "A spot opened up: {{ session_title }}";
pub const WAITLIST_PROMOTED_MESSAGE: &str =
    "Good news! You have been moved from the waitlist and are now registered for \"{{ session_title }}\".";

/// Title and message templates for every notification type.
pub struct NotificationTemplates {
    tera: Tera,
}

fn template_names(kind: NotificationType) -> (&'static str, &'static str) {
    match kind {
        NotificationType::SessionRegistration => ("registration_title", "registration_message"),
        NotificationType::WaitlistJoined => ("waitlist_joined_title", "waitlist_joined_message"),
        NotificationType::WaitlistPromoted => ("waitlist_promoted_title", "waitlist_promoted_message"),
    }
}

impl NotificationTemplates {
    pub fn new() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("registration_title", REGISTRATION_TITLE),
            ("registration_message", REGISTRATION_MESSAGE),
            ("waitlist_joined_title", WAITLIST_JOINED_TITLE),
            ("waitlist_joined_message", WAITLIST_JOINED_MESSAGE),
            ("waitlist_promoted_title", WAITLIST_PROMOTED_TITLE),
            ("waitlist_promoted_message", WAITLIST_PROMOTED_MESSAGE),
        ])
        .map_err(|e| AppError::InternalWithMsg(format!("Tera parse error: {:?}", e)))?;

        // Titles and messages are plain text.
        tera.autoescape_on(vec![]);
        Ok(Self { tera })
    }

    pub fn render(&self, command: &NotificationCommand) -> Result<(String, String), AppError> {
        let mut context = Context::new();
        context.insert("session_title", &command.session_title);
        context.insert("position", &command.position.unwrap_or_default());

        let (title_name, message_name) = template_names(command.notification_type);
        let title = self.tera.render(title_name, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Tera render error: {:?}", e)))?;
        let message = self.tera.render(message_name, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Tera render error: {:?}", e)))?;

        Ok((title, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(kind: NotificationType, position: Option<i32>) -> NotificationCommand {
        NotificationCommand {
            notification_type: kind,
            user_id: "user-1".into(),
            session_id: "session-1".into(),
            session_title: "Rust & Friends".into(),
            position,
        }
    }

    #[test]
    fn test_waitlist_message_includes_position() {
        let templates = NotificationTemplates::new().unwrap();
        let (title, message) = templates.render(&command(NotificationType::WaitlistJoined, Some(3))).unwrap();

        assert_eq!(title, "Waitlisted: Rust & Friends");
        assert!(message.contains("number 3 on the waitlist"), "got: {}", message);
    }

    #[test]
    fn test_titles_are_not_html_escaped() {
        let templates = NotificationTemplates::new().unwrap();
        let (title, message) = templates.render(&command(NotificationType::WaitlistPromoted, None)).unwrap();

        assert_eq!(title, "A spot opened up: Rust & Friends");
        assert!(message.contains("\"Rust & Friends\""));
    }

    #[test]
    fn test_every_type_renders() {
        let templates = NotificationTemplates::new().unwrap();
        for kind in [
            NotificationType::SessionRegistration,
            NotificationType::WaitlistJoined,
            NotificationType::WaitlistPromoted,
        ] {
            let (title, message) = templates.render(&command(kind, Some(1))).unwrap();
            assert!(!title.is_empty());
            assert!(message.contains("Rust & Friends"));
        }
    }
}
