//! State management module.
//!
//! Contains the Hub (shared server state), the session registry and the
//! per-client session with its identity state machine.

mod hub;
mod id;
mod machine;
mod registry;
mod session;

pub use hub::{Hub, HubQueues};
pub use id::{SessionId, SessionIdGenerator};
pub use machine::SessionState;
pub use registry::SessionRegistry;
pub use session::{ClientSession, Inbound};
