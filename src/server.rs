//! Server lifecycle.
//!
//! [`Server::start`] binds the listener and spawns the three long-running
//! roles: the Listener accept loop, the dispatcher that owns username
//! negotiation, and the Relayer. Sessions spawn their own send and receive
//! tasks as they register.

use std::net::SocketAddr;
use std::sync::Arc;

use chadt_proto::Message;
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::handlers;
use crate::network::{Listener, PendingConnections, Relayer, handoff};
use crate::sink::{SystemMessageSink, TracingSink};
use crate::state::{Hub, Inbound};

/// The chat server.
pub struct Server {
    config: Config,
    sink: Arc<dyn SystemMessageSink>,
    running: Option<Running>,
}

struct Running {
    hub: Arc<Hub>,
    listener: Listener,
    relayer: Relayer,
    dispatcher: JoinHandle<()>,
    stopping: CancellationToken,
}

impl Server {
    /// A server that logs system messages through `tracing`.
    pub fn new(config: Config) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// A server that posts system messages to `sink`.
    pub fn with_sink(config: Config, sink: Arc<dyn SystemMessageSink>) -> Self {
        Self {
            config,
            sink,
            running: None,
        }
    }

    /// Configuration the server was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind and start serving. Returns the bound address, which differs from
    /// the configured one when the configured port is 0.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted);
        }

        let (hub, queues) = Hub::new(self.config.clone(), Arc::clone(&self.sink));
        let stopping = CancellationToken::new();
        let (registry, pending) = handoff();

        let server = &self.config.server;
        let listener = Listener::bind(
            &server.listen_host,
            server.port,
            self.config.protocol.connection_options(),
            registry,
            stopping.child_token(),
        )
        .await?;
        let relayer = Relayer::spawn(Arc::clone(&hub), queues.outbound, stopping.child_token());
        let dispatcher = tokio::spawn(run_dispatcher(
            Arc::clone(&hub),
            queues.inbound,
            pending,
            stopping.child_token(),
        ));

        let addr = listener.local_addr();
        info!(%addr, server = %server.name, "chadt server started");
        self.running = Some(Running {
            hub,
            listener,
            relayer,
            dispatcher,
            stopping,
        });
        Ok(addr)
    }

    /// Whether the server has started and not yet been stopped.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.stopping.is_cancelled())
    }

    /// Bound listening address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.listener.local_addr())
    }

    /// Snapshot of connected usernames, sorted.
    pub fn usernames(&self) -> Vec<String> {
        self.running
            .as_ref()
            .map(|running| running.hub.sessions.usernames())
            .unwrap_or_default()
    }

    /// Stop accepting, dispatching and relaying. Sessions stay open until
    /// [`shutdown`](Self::shutdown).
    pub fn stop(&self) {
        if let Some(running) = &self.running {
            running.stopping.cancel();
            info!("chadt server stopping");
        }
    }

    /// Stop, then tell every client the server is going away and close its
    /// session once its queue has been flushed.
    pub async fn shutdown(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.stopping.cancel();

        running.listener.shutdown().await;
        if let Err(e) = running.dispatcher.await {
            warn!(error = %e, "Dispatcher task failed");
        }
        // Relays whatever the dispatcher queued before it stopped.
        running.relayer.shutdown().await;

        let hub = running.hub;
        let sessions = hub.sessions.drain();
        let count = sessions.len();
        join_all(sessions.into_iter().map(|session| {
            session.mark_gone();
            let notice = Message::disconnect(hub.server_name(), session.username());
            async move { session.shutdown(Some(notice)).await }
        }))
        .await;

        info!(sessions = count, "chadt server shut down");
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.stopping.cancel();
        }
    }
}

#[instrument(skip_all)]
async fn run_dispatcher(
    hub: Arc<Hub>,
    mut inbound: mpsc::UnboundedReceiver<Inbound>,
    mut pending: PendingConnections,
    stopping: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = stopping.cancelled() => break,
            Some(connection) = pending.next() => {
                handlers::register(&hub, connection);
            }
            Some(inbound) = inbound.recv() => handlers::dispatch(&hub, inbound).await,
            else => break,
        }
    }
    debug!("Dispatcher stopped");
}
