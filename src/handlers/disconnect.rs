//! DISCONNECT handler.

use chadt_proto::Message;
use tracing::info;

use super::Context;
use crate::error::HandlerResult;

/// Remove the session, close it, and tell everyone else it left.
///
/// A second DISCONNECT for the same session finds nothing to remove and is
/// ignored, so each departure is announced exactly once.
pub async fn handle_disconnect(ctx: &Context<'_>) -> HandlerResult {
    let Some(session) = ctx.hub.sessions.remove(ctx.session.id()) else {
        return Ok(());
    };
    let was = session.state();
    session.mark_gone();
    let username = session.username();

    info!(
        session = %session.id(),
        username = %username,
        addr = ?session.peer_addr(),
        %was,
        "Client disconnected"
    );
    session.shutdown(None).await;

    let hub = ctx.hub;
    hub.broadcast(Message::user_disconnect(
        username,
        hub.server_name(),
        hub.broadcast_token(),
    ));
    Ok(())
}
