//! Hand-off of accepted connections from the Listener to the dispatcher.

use chadt_proto::Connection;
use tokio::sync::mpsc;

/// Create a connected registry/pending pair.
pub fn handoff() -> (ConnectionRegistry, PendingConnections) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ConnectionRegistry { tx }, PendingConnections { rx })
}

/// Producer side: the Listener adds each started connection here.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    tx: mpsc::UnboundedSender<Connection>,
}

impl ConnectionRegistry {
    /// Hand over a connection. Returns `false` if the consumer is gone, in
    /// which case the connection is dropped.
    pub fn add(&self, connection: Connection) -> bool {
        self.tx.send(connection).is_ok()
    }
}

/// Consumer side, owned by the dispatcher.
#[derive(Debug)]
pub struct PendingConnections {
    rx: mpsc::UnboundedReceiver<Connection>,
}

impl PendingConnections {
    /// Next connection in arrival order; `None` once every producer is gone.
    pub async fn next(&mut self) -> Option<Connection> {
        self.rx.recv().await
    }
}
