use std::fmt;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use log::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user visible message, shown by whatever front end drains the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };

        write!(f, "[{}] {}", prefix, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct Notifier {
    sender: UnboundedSender<Notice>,
}

impl Notifier {
    pub fn channel() -> (Notifier, UnboundedReceiver<Notice>) {
        let (sender, receiver) = unbounded::<Notice>();
        (Notifier { sender }, receiver)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    fn push(&self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", message),
            NoticeLevel::Warning => warn!("{}", message),
            NoticeLevel::Error => error!("{}", message),
        }

        // a closed front end is not a reason to fail the operation
        if let Err(err) = self.sender.unbounded_send(Notice { level, message }) {
            debug!("Notice dropped: {}", err);
        }
    }
}

#[cfg(test)]
pub fn drain(receiver: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = receiver.try_recv() {
        notices.push(notice);
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_arrive_in_order() {
        let (notifier, mut receiver) = Notifier::channel();
        notifier.success("Connected");
        notifier.warning("MQTT Connection Offline");

        let notices = drain(&mut receiver);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[1].to_string(), "[warning] MQTT Connection Offline");
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (notifier, receiver) = Notifier::channel();
        drop(receiver);
        notifier.error("nobody is listening");
    }

    #[test]
    fn test_drain_after_notifier_is_gone() {
        let (notifier, mut receiver) = Notifier::channel();
        notifier.info("Sending...");
        drop(notifier);

        assert_eq!(drain(&mut receiver), vec![Notice { level: NoticeLevel::Info, message: "Sending...".to_string() }]);
        assert!(drain(&mut receiver).is_empty());
    }
}
