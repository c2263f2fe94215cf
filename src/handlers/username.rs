//! USERNAME_REQUEST handler.

use chadt_proto::{AddressField, LIST_SEPARATOR, Message};
use tracing::info;

use super::Context;
use crate::config::Config;
use crate::error::{HandlerError, HandlerResult};

/// Check a requested username against everything but uniqueness, which the
/// registry checks atomically with the rename.
///
/// A name must fit both address fields, since it is the sender of its
/// owner's messages and the recipient of replies and direct messages. It must
/// also stay within the configured bounds, have
/// no surrounding whitespace (it would not survive the field padding), not
/// contain the user-list separator, and not impersonate the server or the
/// broadcast token.
pub fn validate_username(name: &str, config: &Config) -> Result<(), HandlerError> {
    let erroneous = |reason| HandlerError::ErroneousUsername {
        name: name.to_owned(),
        reason,
    };

    if name.len() < config.server.username_min_length {
        return Err(erroneous("too short"));
    }
    let wire = config.protocol.wire_format();
    if name.len() > config.server.username_max_length
        || !wire.fits(AddressField::Sender, name)
        || !wire.fits(AddressField::Recipient, name)
    {
        return Err(erroneous("too long"));
    }
    if name.trim() != name {
        return Err(erroneous("leading or trailing whitespace"));
    }
    if name.contains(LIST_SEPARATOR) {
        return Err(erroneous("contains the list separator"));
    }
    if name == config.protocol.broadcast_token || name == config.server.name {
        return Err(erroneous("reserved"));
    }
    Ok(())
}

/// Rename the requester if the name is valid and free.
///
/// On success everyone hears USER_NAME_CHANGE and the requester gets
/// USERNAME_ACCEPTED. A rejected request changes nothing.
pub fn handle_username_request(ctx: &Context<'_>, request: Message) -> HandlerResult {
    let hub = ctx.hub;
    let requested = request.text;

    validate_username(&requested, &hub.config)?;
    let old = hub.sessions.rename(ctx.session.id(), &requested)?;

    info!(session = %ctx.session.id(), old = %old, new = %requested, "Username accepted");
    hub.broadcast(Message::user_name_change(
        &old,
        &requested,
        hub.server_name(),
        hub.broadcast_token(),
    ));
    ctx.session.enqueue(Message::username_accepted(
        &requested,
        hub.server_name(),
        &requested,
    ));
    Ok(())
}
