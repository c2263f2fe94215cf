//! Test server management.
//!
//! Runs a chadt server inside the test's runtime on an ephemeral loopback
//! port, with system messages captured on a channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chadt::sink::ChannelSink;
use chadt::{Config, Server, SystemMessage};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::client::TestClient;

/// A test server instance.
pub struct TestServer {
    server: Server,
    addr: SocketAddr,
    system: mpsc::UnboundedReceiver<SystemMessage>,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawn a server with the default configuration.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn a server after letting `configure` adjust the configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut Config)) -> anyhow::Result<Self> {
        let mut config = Config::default();
        config.server.listen_host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.protocol.socket_timeout_ms = 200;
        configure(&mut config);

        let (sink, system) = ChannelSink::new();
        let mut server = Server::with_sink(config, Arc::new(sink));
        let addr = server.start().await?;

        Ok(Self {
            server,
            addr,
            system,
        })
    }

    /// Get the server address.
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        self.server.config()
    }

    /// Usernames the server currently has registered.
    pub fn usernames(&self) -> Vec<String> {
        self.server.usernames()
    }

    /// Open a raw connection without waiting for the welcome.
    pub async fn connect_raw(&self) -> anyhow::Result<TestClient> {
        TestClient::connect(self.addr, self.config()).await
    }

    /// Connect and wait until the server has announced this client.
    pub async fn connect(&self) -> anyhow::Result<TestClient> {
        let mut client = self.connect_raw().await?;
        client.await_welcome().await?;
        Ok(client)
    }

    /// Connect and negotiate `username`.
    pub async fn join(&self, username: &str) -> anyhow::Result<TestClient> {
        let mut client = self.connect().await?;
        client.request_username(username).await?;
        Ok(client)
    }

    /// Next system message, waiting up to a second.
    pub async fn next_system_message(&mut self) -> anyhow::Result<SystemMessage> {
        timeout(Duration::from_secs(1), self.system.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("system sink closed"))
    }

    /// Wait until the registry holds exactly `expected` (sorted).
    pub async fn wait_for_usernames(&self, expected: &[&str]) -> anyhow::Result<()> {
        for _ in 0..50 {
            if self.usernames() == expected {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!("usernames {:?}, expected {:?}", self.usernames(), expected)
    }

    pub async fn shutdown(mut self) {
        self.server.shutdown().await;
    }
}
