//! Network module.
//!
//! Contains the Listener (accept loop), the hand-off channel that carries
//! accepted connections to the dispatcher, and the Relayer (fan-out).

mod handoff;
mod listener;
mod relayer;

pub use handoff::{ConnectionRegistry, PendingConnections, handoff};
pub use listener::Listener;
pub use relayer::{Relayer, relay, should_deliver};
