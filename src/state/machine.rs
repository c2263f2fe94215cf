//! Identity state machine for a client session.
//!
//! ```text
//! Unnamed ──rename──► Named ──rename──► Named
//!    │                  │
//!    └──disconnect──────┴──disconnect──► Gone
//! ```
//!
//! `Gone` is terminal and nothing leads back to `Unnamed`.

use std::fmt;

/// Where a session is in its naming lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Holding the temporary username it was assigned on connect.
    #[default]
    Unnamed,
    /// Holding a username it negotiated.
    Named,
    /// Disconnected and removed from the registry.
    Gone,
}

impl SessionState {
    /// State after an accepted username request, or `None` if the session
    /// can no longer be renamed.
    pub fn renamed(self) -> Option<Self> {
        match self {
            Self::Unnamed | Self::Named => Some(Self::Named),
            Self::Gone => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unnamed => f.write_str("unnamed"),
            Self::Named => f.write_str("named"),
            Self::Gone => f.write_str("gone"),
        }
    }
}
