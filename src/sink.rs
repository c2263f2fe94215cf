//! System messages: the server's own view of chat activity.
//!
//! The server posts display-ready text for every chat message it relays and
//! for every change to the user list. Where that text ends up is up to the
//! [`SystemMessageSink`]; the binary logs it.

use chrono::{DateTime, Utc};
use chadt_proto::{Message, MessageType};
use tokio::sync::mpsc;
use tracing::info;

/// What a system message reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemMessageKind {
    /// A chat message passing through the server.
    Text,
    /// A user connected, disconnected or changed name.
    UserListUpdate,
}

/// Display-ready text plus when it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMessage {
    pub kind: SystemMessageKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl SystemMessage {
    pub fn new(kind: SystemMessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(SystemMessageKind::Text, text)
    }

    pub fn user_list_update(text: impl Into<String>) -> Self {
        Self::new(SystemMessageKind::UserListUpdate, text)
    }

    /// Render a protocol message, classifying presence types as user list
    /// updates and everything else as text.
    pub fn from_message(message: &Message) -> Self {
        let kind = if message.message_type.is_presence() {
            SystemMessageKind::UserListUpdate
        } else {
            SystemMessageKind::Text
        };
        Self::new(kind, message.display_string())
    }
}

/// Destination for system messages.
pub trait SystemMessageSink: Send + Sync {
    fn post(&self, message: SystemMessage);
}

/// Logs every system message at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SystemMessageSink for TracingSink {
    fn post(&self, message: SystemMessage) {
        let at = message.timestamp.format("%H:%M:%S");
        match message.kind {
            SystemMessageKind::Text => info!(target: "chadt::chat", %at, "{}", message.text),
            SystemMessageKind::UserListUpdate => {
                info!(target: "chadt::presence", %at, "{}", message.text)
            }
        }
    }
}

/// Forwards system messages into a channel, for embedding and tests.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SystemMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SystemMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SystemMessageSink for ChannelSink {
    fn post(&self, message: SystemMessage) {
        // Receiver gone means nobody is watching.
        let _ = self.tx.send(message);
    }
}

/// `true` for the types a sink is told about when relayed.
pub(crate) fn is_reportable(ty: MessageType) -> bool {
    ty == MessageType::Text || ty.is_presence()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_message_classifies() {
        let chat = SystemMessage::from_message(&Message::text("hi", "alice", "ALL"));
        assert_eq!(chat.kind, SystemMessageKind::Text);
        assert_eq!(chat.text, "alice: hi");

        let joined = SystemMessage::from_message(&Message::user_connect("bob", "SERVER", "ALL"));
        assert_eq!(joined.kind, SystemMessageKind::UserListUpdate);
        assert_eq!(joined.text, "bob connected");
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::new();
        sink.post(SystemMessage::user_list_update("user0 connected"));
        let received = rx.try_recv().unwrap();
        assert_eq!(received.kind, SystemMessageKind::UserListUpdate);
        assert_eq!(received.text, "user0 connected");
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.post(SystemMessage::text("nobody listening"));
    }

    #[test]
    fn test_reportable_types() {
        assert!(is_reportable(MessageType::Text));
        assert!(is_reportable(MessageType::UserNameChange));
        assert!(!is_reportable(MessageType::UsernameAccepted));
    }
}
