//! Session identifiers and temporary usernames.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identifier of one client session.
///
/// Unlike the username it never changes, so queued work can always be
/// traced back to the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw counter value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out session ids together with the temporary username derived
/// from the same counter value.
///
/// Format: base + decimal counter, starting at zero ("user0", "user1", ...).
pub struct SessionIdGenerator {
    base: String,
    counter: AtomicU64,
}

impl SessionIdGenerator {
    /// Create a generator for the given username base.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Allocate the next id and its temporary username.
    pub fn next(&self) -> (SessionId, String) {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        (SessionId(n), format!("{}{}", self.base, n))
    }
}
