//! Listener - accepts incoming connections.
//!
//! The Listener owns the listening socket and hands every accepted client,
//! already wrapped in a started [`Connection`], to the dispatcher through the
//! [`ConnectionRegistry`].

use std::net::SocketAddr;
use std::sync::Arc;

use chadt_proto::{Connection, ConnectionError, ConnectionOptions};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, trace, warn};

use super::ConnectionRegistry;

/// Accept loop over one listening socket.
#[derive(Debug)]
pub struct Listener {
    socket: Arc<Connection>,
    local_addr: SocketAddr,
    stopping: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Listener {
    /// Bind `host:port` and start accepting.
    pub async fn bind(
        host: &str,
        port: u16,
        options: ConnectionOptions,
        registry: ConnectionRegistry,
        stopping: CancellationToken,
    ) -> Result<Self, ConnectionError> {
        let mut socket = Connection::listening(host, port, options);
        socket.start().await?;
        let local_addr = socket.local_addr().ok_or(ConnectionError::NotListening)?;
        info!(%local_addr, "Listener bound");

        let socket = Arc::new(socket);
        let task = tokio::spawn(run(
            Arc::clone(&socket),
            options,
            registry,
            stopping.clone(),
        ));

        Ok(Self {
            socket,
            local_addr,
            stopping,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// End the accept loop. The socket stays bound until [`shutdown`](Self::shutdown).
    pub fn stop(&self) {
        self.stopping.cancel();
    }

    /// End the accept loop and close the listening socket.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Listener task failed");
        }
        self.socket.shutdown().await;
        info!(local_addr = %self.local_addr, "Listener closed");
    }
}

#[instrument(skip_all, fields(addr = ?socket.local_addr()))]
async fn run(
    socket: Arc<Connection>,
    options: ConnectionOptions,
    registry: ConnectionRegistry,
    stopping: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = stopping.cancelled() => break,
            accepted = socket.accept_connections() => accepted,
        };

        match accepted {
            Ok((stream, addr)) => {
                let mut connection = Connection::accepted(stream, options);
                if let Err(e) = connection.start().await {
                    warn!(%addr, error = %e, "Failed to set up accepted connection");
                    continue;
                }
                info!(%addr, "Connection accepted");
                if !registry.add(connection) {
                    // Dispatcher is gone; nothing left to accept for.
                    break;
                }
            }
            Err(e) if e.is_timeout() => trace!("Accept timed out"),
            Err(e @ ConnectionError::InvalidState { .. }) => {
                error!(error = %e, "Listening socket unusable");
                break;
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
