//! Client sessions.
//!
//! A session owns one accepted [`Connection`] and runs two tasks over it: a
//! receive loop feeding the server's shared inbound queue and a send loop
//! draining the session's private outbound queue. The two never wait on
//! each other, so a slow reader does not hold up writes and vice versa.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chadt_proto::{Connection, ConnectionError, Message, MessageType};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::{SessionId, SessionState};

/// A message read from a client, tagged with the session it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Session whose socket produced the message.
    pub origin: SessionId,
    /// The message as received.
    pub message: Message,
}

#[derive(Debug)]
struct Identity {
    username: String,
    state: SessionState,
}

/// One connected client.
#[derive(Debug)]
pub struct ClientSession {
    id: SessionId,
    connection: Connection,
    identity: RwLock<Identity>,
    outbound: mpsc::UnboundedSender<Message>,
    /// Receiving end of `outbound` until the send loop takes it.
    queue: Mutex<Option<mpsc::UnboundedReceiver<Message>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closing: CancellationToken,
    /// Set once a DISCONNECT for this session went to the inbound queue.
    disconnect_reported: AtomicBool,
    shut_down: AtomicBool,
}

impl ClientSession {
    /// Wrap a started connection. Nothing is read or written until
    /// [`start`](Self::start).
    pub fn new(id: SessionId, username: impl Into<String>, connection: Connection) -> Arc<Self> {
        let (outbound, queue) = mpsc::unbounded_channel();
        Arc::new(Self {
            id,
            connection,
            identity: RwLock::new(Identity {
                username: username.into(),
                state: SessionState::Unnamed,
            }),
            outbound,
            queue: Mutex::new(Some(queue)),
            tasks: Mutex::new(Vec::new()),
            closing: CancellationToken::new(),
            disconnect_reported: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Id this session was registered under; never changes.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current username.
    pub fn username(&self) -> String {
        self.identity.read().username.clone()
    }

    /// Where the session is in the Unnamed, Named, Gone lifecycle.
    pub fn state(&self) -> SessionState {
        self.identity.read().state
    }

    /// Address of the client's end of the socket.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.connection.peer_addr()
    }

    /// Queue a message for this client.
    ///
    /// Returns `false` once the session has shut down.
    pub fn enqueue(&self, message: Message) -> bool {
        self.outbound.send(message).is_ok()
    }

    /// Apply an accepted username, returning the previous one.
    ///
    /// Returns `None` if the session is already gone. Callers must hold the
    /// registry write lock so the name index stays in step.
    pub(crate) fn rename(&self, username: &str) -> Option<String> {
        let mut identity = self.identity.write();
        identity.state = identity.state.renamed()?;
        Some(std::mem::replace(&mut identity.username, username.to_owned()))
    }

    pub(crate) fn mark_gone(&self) {
        self.identity.write().state = SessionState::Gone;
    }

    /// Spawn the send and receive loops. Does nothing after the first call.
    pub fn start(self: &Arc<Self>, inbound: mpsc::UnboundedSender<Inbound>) {
        let Some(queue) = self.queue.lock().take() else {
            return;
        };

        let receiver = tokio::spawn(Arc::clone(self).receive_loop(inbound.clone()));
        let sender = tokio::spawn(Arc::clone(self).send_loop(queue, inbound));
        self.tasks.lock().extend([receiver, sender]);
    }

    /// Stop both loops and close the socket.
    ///
    /// `final_message` is queued behind everything already pending, and the
    /// queue is flushed before the socket closes. Idempotent.
    pub async fn shutdown(&self, final_message: Option<Message>) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(message) = final_message {
            let _ = self.outbound.send(message);
        }
        self.closing.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(session = %self.id, error = %e, "Session task failed");
            }
        }

        // Never started: nothing will drain the queue.
        self.queue.lock().take();
        self.connection.shutdown().await;
        info!(session = %self.id, username = %self.username(), "Session closed");
    }

    #[instrument(skip_all, fields(session = %self.id))]
    async fn receive_loop(self: Arc<Self>, inbound: mpsc::UnboundedSender<Inbound>) {
        loop {
            let received = tokio::select! {
                biased;
                _ = self.closing.cancelled() => break,
                received = self.connection.receive_message() => received,
            };

            match received {
                Ok(message) => {
                    trace!(%message, "Received");
                    let is_disconnect = message.message_type == MessageType::Disconnect;
                    if is_disconnect && self.disconnect_reported.swap(true, Ordering::AcqRel) {
                        break;
                    }
                    let forwarded = inbound
                        .send(Inbound {
                            origin: self.id,
                            message,
                        })
                        .is_ok();
                    if !forwarded || is_disconnect {
                        break;
                    }
                }
                Err(e) if e.is_timeout() => continue,
                Err(ConnectionError::PeerDisconnected) => {
                    debug!("Peer disconnected");
                    self.report_disconnect(&inbound);
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Receive failed, dropping session");
                    self.report_disconnect(&inbound);
                    break;
                }
            }
        }
    }

    #[instrument(skip_all, fields(session = %self.id))]
    async fn send_loop(
        self: Arc<Self>,
        mut queue: mpsc::UnboundedReceiver<Message>,
        inbound: mpsc::UnboundedSender<Inbound>,
    ) {
        loop {
            tokio::select! {
                biased;
                next = queue.recv() => match next {
                    Some(message) => {
                        if !self.transmit(&message, &inbound).await {
                            break;
                        }
                    }
                    None => break,
                },
                _ = self.closing.cancelled() => {
                    while let Ok(message) = queue.try_recv() {
                        if !self.transmit(&message, &inbound).await {
                            break;
                        }
                    }
                    break;
                }
            }
        }
    }

    /// Write one message. A failure is fatal to the session.
    async fn transmit(&self, message: &Message, inbound: &mpsc::UnboundedSender<Inbound>) -> bool {
        match self.connection.transmit_message(message).await {
            Ok(()) => {
                trace!(%message, "Sent");
                true
            }
            Err(e) => {
                warn!(error = %e, %message, "Transmit failed, dropping session");
                self.report_disconnect(inbound);
                self.closing.cancel();
                false
            }
        }
    }

    /// Hand the server a DISCONNECT on the client's behalf, at most once.
    fn report_disconnect(&self, inbound: &mpsc::UnboundedSender<Inbound>) {
        if self.disconnect_reported.swap(true, Ordering::AcqRel) {
            return;
        }
        let message = Message::disconnect(self.username(), "");
        let _ = inbound.send(Inbound {
            origin: self.id,
            message,
        });
    }
}
