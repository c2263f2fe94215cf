//! Relayer - fans the global outbound queue out to sessions.
//!
//! Messages leave the queue one at a time in the order they were queued, so
//! every recipient sees them in that order too.

use std::sync::Arc;

use chadt_proto::Message;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::state::Hub;

/// Whether `message` goes to the client named `username`.
///
/// Delivered when addressed to the broadcast token, addressed to the client
/// by name, or (with `echo_to_sender`) sent by that client.
pub fn should_deliver(
    username: &str,
    message: &Message,
    broadcast_token: &str,
    echo_to_sender: bool,
) -> bool {
    message.recipient == broadcast_token
        || message.recipient == username
        || (echo_to_sender && message.sender == username)
}

/// Fan-out task over the Hub's outbound queue.
#[derive(Debug)]
pub struct Relayer {
    stopping: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Relayer {
    /// Start relaying everything queued on `queue`.
    pub fn spawn(
        hub: Arc<Hub>,
        queue: mpsc::UnboundedReceiver<Message>,
        stopping: CancellationToken,
    ) -> Self {
        let task = tokio::spawn(run(hub, queue, stopping.clone()));
        Self {
            stopping,
            task: Mutex::new(Some(task)),
        }
    }

    /// Ask the loop to finish. Messages already queued are still relayed.
    pub fn stop(&self) {
        self.stopping.cancel();
    }

    /// Stop and wait until the queue has been drained.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Relayer task failed");
        }
    }
}

/// Deliver one message to every matching session.
pub fn relay(hub: &Hub, message: &Message) -> usize {
    let token = hub.broadcast_token();
    let echo = hub.config.relay.echo_to_sender;
    let delivered = hub
        .sessions
        .deliver(message, |username| should_deliver(username, message, token, echo));
    if delivered == 0 {
        debug!(%message, "No recipient for message");
    } else {
        trace!(%message, delivered, "Relayed");
    }
    delivered
}

#[instrument(skip_all)]
async fn run(hub: Arc<Hub>, mut queue: mpsc::UnboundedReceiver<Message>, stopping: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            next = queue.recv() => match next {
                Some(message) => {
                    relay(&hub, &message);
                }
                None => break,
            },
            _ = stopping.cancelled() => {
                while let Ok(message) = queue.try_recv() {
                    relay(&hub, &message);
                }
                break;
            }
        }
    }
    debug!("Relayer stopped");
}
