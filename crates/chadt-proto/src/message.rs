//! The chadt message value.

use std::fmt;

use crate::message_type::MessageType;

/// Protocol version written into every frame.
pub const PROTOCOL_VERSION: u8 = 1;

/// Separator used in list-valued message text (user lists, renames).
pub const LIST_SEPARATOR: char = ',';

/// A single protocol message.
///
/// `sender` and `recipient` are logical addresses (usernames or reserved
/// tokens), never network addresses. The frame length is not stored; it is
/// always the UTF-8 byte length of `text`, see [`Message::length`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    /// Protocol version.
    pub version: u8,
    /// Kind of message.
    pub message_type: MessageType,
    /// Username of the originator.
    pub sender: String,
    /// Username of the addressee, or the broadcast token.
    pub recipient: String,
    /// Message body.
    pub text: String,
}

impl Message {
    /// Build a message of any type at the current protocol version.
    pub fn new(
        message_type: MessageType,
        text: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message_type,
            sender: sender.into(),
            recipient: recipient.into(),
            text: text.into(),
        }
    }

    /// Byte length of `text` as carried in the frame header.
    #[inline]
    pub fn length(&self) -> usize {
        self.text.len()
    }

    /// Chat text.
    pub fn text(
        text: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::Text, text, sender, recipient)
    }

    /// Disconnect notice; carries no text.
    pub fn disconnect(sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self::new(MessageType::Disconnect, "", sender, recipient)
    }

    /// Ask the server for `requested` as a username.
    pub fn username_request(
        requested: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::UsernameRequest, requested, sender, recipient)
    }

    /// Grant `username` to the recipient.
    pub fn username_accepted(
        username: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::UsernameAccepted, username, sender, recipient)
    }

    /// Refuse `username` to the recipient.
    pub fn username_rejected(
        username: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::UsernameRejected, username, sender, recipient)
    }

    /// Tell a newly connected client its placeholder name.
    pub fn temp_username_assigned(
        username: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::TempUsernameAssigned, username, sender, recipient)
    }

    /// Roster of connected clients, comma-joined.
    pub fn list_of_users<I, S>(users: I, sender: impl Into<String>, recipient: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for (i, user) in users.into_iter().enumerate() {
            if i > 0 {
                text.push(LIST_SEPARATOR);
            }
            text.push_str(user.as_ref());
        }
        Self::new(MessageType::ListOfUsers, text, sender, recipient)
    }

    /// Presence: `username` connected.
    pub fn user_connect(
        username: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::UserConnect, username, sender, recipient)
    }

    /// Presence: `old` is now called `new`.
    pub fn user_name_change(
        old: &str,
        new: &str,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        let text = format!("{old}{LIST_SEPARATOR}{new}");
        Self::new(MessageType::UserNameChange, text, sender, recipient)
    }

    /// Presence: `username` left.
    pub fn user_disconnect(
        username: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::UserDisconnect, username, sender, recipient)
    }

    /// Error report.
    pub fn error(
        text: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::Error, text, sender, recipient)
    }

    /// Names carried by a LIST_OF_USERS message. Empty for other types.
    pub fn users(&self) -> Vec<&str> {
        if self.message_type != MessageType::ListOfUsers || self.text.is_empty() {
            return Vec::new();
        }
        self.text.split(LIST_SEPARATOR).collect()
    }

    /// `(old, new)` of a USER_NAME_CHANGE message.
    pub fn name_change(&self) -> Option<(&str, &str)> {
        if self.message_type != MessageType::UserNameChange {
            return None;
        }
        self.text.split_once(LIST_SEPARATOR)
    }

    /// Human-readable rendering for logs and chat displays.
    pub fn display_string(&self) -> String {
        match self.message_type {
            MessageType::Text => format!("{}: {}", self.sender, self.text),
            MessageType::UserConnect => format!("{} connected", self.text),
            MessageType::UserDisconnect => format!("{} disconnected", self.text),
            MessageType::UserNameChange => match self.name_change() {
                Some((old, new)) => format!("{old} is now known as {new}"),
                None => format!("renamed: {}", self.text),
            },
            MessageType::ListOfUsers => format!("connected users: {}", self.users().join(", ")),
            other => format!("[{other}] {}: {}", self.sender, self.text),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} ({} bytes)",
            self.message_type,
            self.sender,
            self.recipient,
            self.length()
        )
    }
}
