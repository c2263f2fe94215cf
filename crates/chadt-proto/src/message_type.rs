//! Message type codes.
//!
//! Codes are grouped by decade: chat text, session control, username
//! negotiation, presence, and errors.

use std::fmt;

use crate::error::DecodingError;

/// The kind of a [`crate::Message`], carried as one byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Chat text.
    Text = 1,

    /// A client leaving, or the server closing a session.
    Disconnect = 11,

    /// Client asks for a username (text = requested name).
    UsernameRequest = 20,
    /// Server grants a requested username.
    UsernameAccepted = 21,
    /// Server refuses a requested username.
    UsernameRejected = 22,
    /// Server tells a new client its placeholder name.
    TempUsernameAssigned = 23,

    /// Comma-separated names of clients already connected.
    ListOfUsers = 30,
    /// Presence: a client connected.
    UserConnect = 31,
    /// Presence: a client renamed (text = `old,new`).
    UserNameChange = 32,
    /// Presence: a client left.
    UserDisconnect = 33,

    /// Error report.
    Error = 90,
}

impl MessageType {
    /// Every message type, in code order.
    pub const ALL: [MessageType; 11] = [
        Self::Text,
        Self::Disconnect,
        Self::UsernameRequest,
        Self::UsernameAccepted,
        Self::UsernameRejected,
        Self::TempUsernameAssigned,
        Self::ListOfUsers,
        Self::UserConnect,
        Self::UserNameChange,
        Self::UserDisconnect,
        Self::Error,
    ];

    /// The wire code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a type from its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Text,
            11 => Self::Disconnect,
            20 => Self::UsernameRequest,
            21 => Self::UsernameAccepted,
            22 => Self::UsernameRejected,
            23 => Self::TempUsernameAssigned,
            30 => Self::ListOfUsers,
            31 => Self::UserConnect,
            32 => Self::UserNameChange,
            33 => Self::UserDisconnect,
            90 => Self::Error,
            _ => return None,
        })
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Disconnect => "DISCONNECT",
            Self::UsernameRequest => "USERNAME_REQUEST",
            Self::UsernameAccepted => "USERNAME_ACCEPTED",
            Self::UsernameRejected => "USERNAME_REJECTED",
            Self::TempUsernameAssigned => "TEMP_USERNAME_ASSIGNED",
            Self::ListOfUsers => "LIST_OF_USERS",
            Self::UserConnect => "USER_CONNECT",
            Self::UserNameChange => "USER_NAME_CHANGE",
            Self::UserDisconnect => "USER_DISCONNECT",
            Self::Error => "ERROR",
        }
    }

    /// Presence types announce roster changes to every client.
    pub fn is_presence(self) -> bool {
        matches!(
            self,
            Self::UserConnect | Self::UserNameChange | Self::UserDisconnect
        )
    }
}

impl From<MessageType> for u8 {
    fn from(ty: MessageType) -> u8 {
        ty.code()
    }
}

impl TryFrom<u8> for MessageType {
    type Error = DecodingError;

    fn try_from(code: u8) -> Result<Self, DecodingError> {
        Self::from_code(code).ok_or(DecodingError::UnknownMessageType(code))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
