//! chadt - a small relay chat server.
//!
//! Clients connect over TCP and speak the fixed-header binary protocol from
//! [`chadt_proto`]. Each gets a temporary username, may negotiate a real
//! one, and exchanges text that the server relays to one client by name or
//! to everyone via the broadcast token.

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod server;
pub mod sink;
pub mod state;

pub use config::Config;
pub use error::{HandlerError, ServerError};
pub use server::Server;
pub use sink::{SystemMessage, SystemMessageKind, SystemMessageSink, TracingSink};
