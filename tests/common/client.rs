//! Test chat client.
//!
//! Speaks the wire protocol through a [`Connection`] and provides helpers
//! to send requests and assert on what the server sends back.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use chadt::Config;
use chadt_proto::{Connection, ConnectionError, ConnectionOptions, Message, MessageType};

/// How long a single `recv` waits before failing the test.
const RECV_DEADLINE: Duration = Duration::from_secs(5);

/// A test chat client.
pub struct TestClient {
    connection: Connection,
    /// Username as last confirmed by the server.
    pub username: String,
    broadcast_token: String,
    server_name: String,
}

#[allow(dead_code)]
impl TestClient {
    /// Connect to a test server.
    pub async fn connect(addr: SocketAddr, config: &Config) -> anyhow::Result<Self> {
        let options = ConnectionOptions {
            wire: config.protocol.wire_format(),
            socket_timeout: Duration::from_millis(100),
        };
        let mut connection = Connection::outbound(addr.ip().to_string(), addr.port(), options);
        connection.start().await?;

        Ok(Self {
            connection,
            username: String::new(),
            broadcast_token: config.protocol.broadcast_token.clone(),
            server_name: config.server.name.clone(),
        })
    }

    /// Read TEMP_USERNAME_ASSIGNED and everything up to this client's own
    /// USER_CONNECT. Returns the messages read.
    pub async fn await_welcome(&mut self) -> anyhow::Result<Vec<Message>> {
        let assigned = self.recv().await?;
        anyhow::ensure!(
            assigned.message_type == MessageType::TempUsernameAssigned,
            "expected TEMP_USERNAME_ASSIGNED, got {assigned}"
        );
        self.username = assigned.text.clone();

        let username = self.username.clone();
        let mut messages = vec![assigned];
        messages.extend(
            self.recv_until(|msg| {
                msg.message_type == MessageType::UserConnect && msg.text == username
            })
            .await?,
        );
        Ok(messages)
    }

    /// Send a message as-is.
    pub async fn send(&self, message: &Message) -> anyhow::Result<()> {
        self.connection.transmit_message(message).await?;
        Ok(())
    }

    /// Send TEXT to `recipient`.
    pub async fn say(&self, recipient: &str, text: &str) -> anyhow::Result<()> {
        self.send(&Message::text(text, &self.username, recipient)).await
    }

    /// Send TEXT to everyone.
    pub async fn say_all(&self, text: &str) -> anyhow::Result<()> {
        let token = self.broadcast_token.clone();
        self.say(&token, text).await
    }

    /// Request `username` and wait for the verdict.
    ///
    /// Errors unless the request is accepted.
    pub async fn request_username(&mut self, username: &str) -> anyhow::Result<()> {
        let verdict = self.ask_for_username(username).await?;
        anyhow::ensure!(
            verdict.message_type == MessageType::UsernameAccepted,
            "username {username} not accepted: {verdict}"
        );
        self.username = verdict.text;
        Ok(())
    }

    /// Request `username` and return the ACCEPTED or REJECTED reply.
    pub async fn ask_for_username(&self, username: &str) -> anyhow::Result<Message> {
        let request = Message::username_request(username, &self.username, &self.server_name);
        self.send(&request).await?;
        self.recv_until(|msg| {
            matches!(
                msg.message_type,
                MessageType::UsernameAccepted | MessageType::UsernameRejected
            )
        })
        .await?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("no verdict received"))
    }

    /// Receive a single message from the server.
    pub async fn recv(&self) -> anyhow::Result<Message> {
        let deadline = Instant::now() + RECV_DEADLINE;
        loop {
            match self.connection.receive_message().await {
                Ok(message) => return Ok(message),
                Err(ConnectionError::ReadTimeout) if Instant::now() < deadline => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Receive messages until `predicate` matches; the match is the last
    /// element.
    pub async fn recv_until<F>(&self, mut predicate: F) -> anyhow::Result<Vec<Message>>
    where
        F: FnMut(&Message) -> bool,
    {
        let mut messages = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = predicate(&msg);
            messages.push(msg);
            if done {
                return Ok(messages);
            }
        }
    }

    /// Skip ahead to the next message of type `ty`.
    pub async fn expect(&self, ty: MessageType) -> anyhow::Result<Message> {
        self.recv_until(|msg| msg.message_type == ty)
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("no {ty} received"))
    }

    /// Everything that arrives within `window`.
    pub async fn drain_for(&self, window: Duration) -> anyhow::Result<Vec<Message>> {
        let deadline = Instant::now() + window;
        let mut messages = Vec::new();
        while Instant::now() < deadline {
            match self.connection.receive_message().await {
                Ok(message) => messages.push(message),
                Err(ConnectionError::ReadTimeout) => {}
                Err(ConnectionError::PeerDisconnected) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(messages)
    }

    /// Whether the server has closed the connection.
    pub async fn is_closed_by_server(&self) -> bool {
        let deadline = Instant::now() + RECV_DEADLINE;
        while Instant::now() < deadline {
            match self.connection.receive_message().await {
                Err(ConnectionError::PeerDisconnected) => return true,
                Err(ConnectionError::ReadTimeout) | Ok(_) => continue,
                Err(_) => return true,
            }
        }
        false
    }

    /// Send DISCONNECT and close the socket.
    pub async fn disconnect(self) -> anyhow::Result<()> {
        let bye = Message::disconnect(&self.username, &self.server_name);
        self.send(&bye).await?;
        self.connection.shutdown().await;
        Ok(())
    }

    /// Close the socket without saying goodbye.
    pub async fn drop_connection(self) {
        self.connection.shutdown().await;
    }
}
