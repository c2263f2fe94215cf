//! Message handlers.
//!
//! The dispatcher resolves the session a message came from, stamps the
//! sender with that session's current username, and routes by type. Errors
//! are turned into replies to the requester where one applies.

mod connect;
mod disconnect;
mod text;
mod username;

pub use connect::register;
pub use disconnect::handle_disconnect;
pub use text::handle_text;
pub use username::{handle_username_request, validate_username};

use std::sync::Arc;

use chadt_proto::MessageType;
use tracing::{debug, trace};

use crate::error::{HandlerError, HandlerResult};
use crate::state::{ClientSession, Hub, Inbound};

/// What a handler gets to work with.
pub struct Context<'a> {
    /// Shared server state.
    pub hub: &'a Arc<Hub>,
    /// Session the message came from.
    pub session: &'a Arc<ClientSession>,
}

/// Route one inbound message to its handler.
pub async fn dispatch(hub: &Arc<Hub>, inbound: Inbound) {
    let Inbound { origin, mut message } = inbound;
    let Some(session) = hub.sessions.get(origin) else {
        trace!(session = %origin, message_type = %message.message_type, "Message from departed session ignored");
        return;
    };

    // The session is the authority on who sent this.
    message.sender = session.username();
    let ctx = Context {
        hub,
        session: &session,
    };

    let result: HandlerResult = match message.message_type {
        MessageType::Text => handle_text(&ctx, message),
        MessageType::Disconnect => handle_disconnect(&ctx).await,
        MessageType::UsernameRequest => handle_username_request(&ctx, message),
        other => Err(HandlerError::UnexpectedMessageType(other)),
    };

    if let Err(e) = result {
        debug!(session = %origin, error = %e, code = e.error_code(), "Handler error");
        if let Some(reply) = e.to_reply(hub.server_name(), &session.username()) {
            session.enqueue(reply);
        }
    }
}
