//! The Hub - central shared state for the chat server.
//!
//! The Hub holds the session registry, the queues that connect sessions,
//! the dispatcher and the relayer, and the configuration every handler
//! reads. It is shared as an `Arc<Hub>` between those tasks.

use std::sync::Arc;

use chadt_proto::Message;
use tokio::sync::mpsc;
use tracing::trace;

use super::{Inbound, SessionIdGenerator, SessionRegistry};
use crate::config::Config;
use crate::sink::{SystemMessage, SystemMessageSink, is_reportable};

/// Receiving ends of the Hub's queues, handed to the tasks that consume them.
#[derive(Debug)]
pub struct HubQueues {
    /// Messages from every session, consumed by the dispatcher.
    pub inbound: mpsc::UnboundedReceiver<Inbound>,
    /// Messages to fan out, consumed by the relayer.
    pub outbound: mpsc::UnboundedReceiver<Message>,
}

/// Central shared state container.
pub struct Hub {
    /// Server configuration (for handlers to access).
    pub config: Config,

    /// All connected sessions.
    pub sessions: SessionRegistry,

    /// Session id and temporary username generator.
    pub ids: SessionIdGenerator,

    /// Inbound queue every session's receive loop feeds.
    inbound: mpsc::UnboundedSender<Inbound>,

    /// Global outbound queue drained by the relayer.
    outbound: mpsc::UnboundedSender<Message>,

    sink: Arc<dyn SystemMessageSink>,
}

impl Hub {
    pub fn new(config: Config, sink: Arc<dyn SystemMessageSink>) -> (Arc<Self>, HubQueues) {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let ids = SessionIdGenerator::new(config.server.default_username_base.clone());

        let hub = Arc::new(Self {
            config,
            sessions: SessionRegistry::new(),
            ids,
            inbound,
            outbound,
            sink,
        });
        let queues = HubQueues {
            inbound: inbound_rx,
            outbound: outbound_rx,
        };
        (hub, queues)
    }

    /// Sender name on server-originated messages.
    pub fn server_name(&self) -> &str {
        &self.config.server.name
    }

    /// Recipient meaning "every connected client".
    pub fn broadcast_token(&self) -> &str {
        &self.config.protocol.broadcast_token
    }

    /// Handle for a session's receive loop.
    pub fn inbound(&self) -> mpsc::UnboundedSender<Inbound> {
        self.inbound.clone()
    }

    /// Queue a message for the relayer. Chat and presence messages are also
    /// posted to the system sink.
    pub fn broadcast(&self, message: Message) {
        if is_reportable(message.message_type) {
            self.sink.post(SystemMessage::from_message(&message));
        }
        if self.outbound.send(message).is_err() {
            trace!("Relayer gone, dropping outbound message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ChannelSink, SystemMessageKind};
    use chadt_proto::MessageType;

    #[test]
    fn test_broadcast_reaches_relayer_queue_and_sink() {
        let (sink, mut system) = ChannelSink::new();
        let (hub, mut queues) = Hub::new(Config::default(), Arc::new(sink));

        hub.broadcast(Message::user_connect("user0", hub.server_name(), hub.broadcast_token()));

        let queued = queues.outbound.try_recv().unwrap();
        assert_eq!(queued.message_type, MessageType::UserConnect);
        assert_eq!(queued.sender, "SERVER");
        assert_eq!(queued.recipient, "ALL");

        let posted = system.try_recv().unwrap();
        assert_eq!(posted.kind, SystemMessageKind::UserListUpdate);
        assert_eq!(posted.text, "user0 connected");
    }

    #[test]
    fn test_replies_are_not_posted() {
        let (sink, mut system) = ChannelSink::new();
        let (hub, _queues) = Hub::new(Config::default(), Arc::new(sink));

        hub.broadcast(Message::username_accepted("alice", "SERVER", "alice"));
        assert!(system.try_recv().is_err());
    }

    #[test]
    fn test_ids_use_configured_base() {
        let mut config = Config::default();
        config.server.default_username_base = "guest".into();
        let (hub, _queues) = Hub::new(config, Arc::new(ChannelSink::new().0));
        assert_eq!(hub.ids.next().1, "guest0");
    }
}
