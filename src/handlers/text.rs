//! TEXT handler.

use chadt_proto::Message;

use super::Context;
use crate::error::HandlerResult;

/// Chat text goes to the relayer unchanged.
pub fn handle_text(ctx: &Context<'_>, message: Message) -> HandlerResult {
    ctx.hub.broadcast(message);
    Ok(())
}
