//! One-shot user notifications

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Success(msg) | Notification::Failure(msg) => msg,
        }
    }
}

/// Surfaces a notification to the user, e.g. a popup or a printed line.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ignores_outcome() {
        assert_eq!(Notification::Success("ok".to_string()).message(), "ok");
        assert_eq!(Notification::Failure("nope".to_string()).message(), "nope");
    }
}
