//! New-connection handling.

use std::sync::Arc;

use chadt_proto::{AddressField, Connection, Message};
use tracing::{info, warn};

use crate::state::{ClientSession, Hub};

/// Give a freshly accepted connection a temporary username and a session.
///
/// The newcomer first hears its temporary name, then (if anyone else is
/// connected) the current user list. Everyone, the newcomer included, then
/// hears USER_CONNECT.
pub fn register(hub: &Arc<Hub>, connection: Connection) -> Option<Arc<ClientSession>> {
    // Skip counter values whose name a client has already claimed.
    let (id, username) = loop {
        let (id, username) = hub.ids.next();
        if !hub.sessions.contains_name(&username) {
            break (id, username);
        }
    };
    let addr = connection.peer_addr();
    let wire = hub.config.protocol.wire_format();
    if !wire.fits(AddressField::Sender, &username)
        || !wire.fits(AddressField::Recipient, &username)
    {
        warn!(
            session = %id,
            username = %username,
            addr = ?addr,
            "Temporary username does not fit the wire format, dropping connection"
        );
        return None;
    }
    let session = ClientSession::new(id, username.clone(), connection);

    let others = hub.sessions.usernames();
    if !hub.sessions.insert(Arc::clone(&session)) {
        warn!(session = %id, username = %username, "Temporary username already taken, dropping connection");
        return None;
    }

    let server = hub.server_name();
    session.enqueue(Message::temp_username_assigned(&username, server, &username));
    if !others.is_empty() {
        session.enqueue(Message::list_of_users(others, server, &username));
    }
    session.start(hub.inbound());
    info!(
        session = %id,
        username = %username,
        addr = ?addr,
        online = hub.sessions.len(),
        "Client registered"
    );

    hub.broadcast(Message::user_connect(&username, server, hub.broadcast_token()));
    Some(session)
}
