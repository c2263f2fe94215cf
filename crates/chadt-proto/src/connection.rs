//! Socket ownership and framed I/O.
//!
//! A [`Connection`] owns exactly one socket. Which constructor built it
//! decides what [`Connection::start`] does:
//!
//! - [`Connection::outbound`]: connect to a remote host and port
//! - [`Connection::listening`]: bind and listen on a local port
//! - [`Connection::accepted`]: adopt a socket returned by `accept`
//!
//! Once started, a stream connection is split into independently locked read
//! and write halves so one task can block in [`Connection::receive_message`]
//! while another calls [`Connection::transmit_message`].

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, warn};

use crate::codec::ChadtCodec;
use crate::error::ConnectionError;
use crate::message::Message;
use crate::wire::WireFormat;

/// Default bound on a single read, write, accept or connect.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(1);

const LISTEN_BACKLOG: u32 = 1024;

/// Lifecycle of a [`Connection`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Constructed, socket not yet usable.
    Uninitialized,
    /// Connected, listening, or adopted.
    Connected,
    /// Socket closed; cannot be reopened.
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Connected => f.write_str("connected"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Settings every connection on one side of the protocol shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Frame field widths.
    pub wire: WireFormat,
    /// Bound on each read, write, accept or connect.
    pub socket_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            wire: WireFormat::default(),
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
        }
    }
}

enum Endpoint {
    Outbound { host: String, port: u16 },
    Listening { host: String, port: u16 },
    Accepted,
}

/// One socket with chadt framing on top.
pub struct Connection {
    endpoint: Endpoint,
    options: ConnectionOptions,
    status: Mutex<ConnectionStatus>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
    adopted: Option<TcpStream>,
    listener: tokio::sync::Mutex<Option<TcpListener>>,
    reader: tokio::sync::Mutex<Option<FramedRead<OwnedReadHalf, ChadtCodec>>>,
    writer: tokio::sync::Mutex<Option<FramedWrite<OwnedWriteHalf, ChadtCodec>>>,
}

impl Connection {
    fn with_endpoint(endpoint: Endpoint, options: ConnectionOptions) -> Self {
        Self {
            endpoint,
            options,
            status: Mutex::new(ConnectionStatus::Uninitialized),
            local_addr: None,
            peer_addr: None,
            adopted: None,
            listener: tokio::sync::Mutex::new(None),
            reader: tokio::sync::Mutex::new(None),
            writer: tokio::sync::Mutex::new(None),
        }
    }

    /// A connection that will dial `host:port` when started.
    pub fn outbound(host: impl Into<String>, port: u16, options: ConnectionOptions) -> Self {
        Self::with_endpoint(
            Endpoint::Outbound {
                host: host.into(),
                port,
            },
            options,
        )
    }

    /// A connection that will listen on `host:port` when started.
    ///
    /// Port 0 asks the OS for a free port; see [`Connection::local_addr`].
    pub fn listening(host: impl Into<String>, port: u16, options: ConnectionOptions) -> Self {
        Self::with_endpoint(
            Endpoint::Listening {
                host: host.into(),
                port,
            },
            options,
        )
    }

    /// Wrap a socket returned by [`Connection::accept_connections`].
    pub fn accepted(stream: TcpStream, options: ConnectionOptions) -> Self {
        let mut conn = Self::with_endpoint(Endpoint::Accepted, options);
        conn.adopted = Some(stream);
        conn
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.lock()
    }

    /// Local socket address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Remote socket address of a stream connection, once started.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Whether this connection accepts rather than exchanges messages.
    pub fn is_listening(&self) -> bool {
        matches!(self.endpoint, Endpoint::Listening { .. })
    }

    /// Bring the socket up. Does nothing unless the connection is
    /// [`ConnectionStatus::Uninitialized`].
    pub async fn start(&mut self) -> Result<(), ConnectionError> {
        if *self.status.get_mut() != ConnectionStatus::Uninitialized {
            return Ok(());
        }

        let socket_timeout = self.options.socket_timeout;
        match &self.endpoint {
            Endpoint::Outbound { host, port } => {
                let addr = resolve(host, *port).await?;
                let socket = new_socket(&addr)?;
                let stream = timeout(socket_timeout, socket.connect(addr))
                    .await
                    .map_err(|_| {
                        io::Error::new(io::ErrorKind::TimedOut, format!("connect to {addr} timed out"))
                    })??;
                debug!(%addr, "Outbound connection established");
                self.adopt(stream)?;
            }
            Endpoint::Listening { host, port } => {
                let addr = resolve(host, *port).await?;
                let socket = new_socket(&addr)?;
                socket.bind(addr)?;
                let listener = socket.listen(LISTEN_BACKLOG)?;
                self.local_addr = Some(listener.local_addr()?);
                *self.listener.get_mut() = Some(listener);
                debug!(addr = ?self.local_addr, "Listening");
            }
            Endpoint::Accepted => {
                let stream = self.adopted.take().ok_or(ConnectionError::InvalidState {
                    operation: "start",
                    status: ConnectionStatus::Uninitialized,
                })?;
                self.adopt(stream)?;
            }
        }

        *self.status.get_mut() = ConnectionStatus::Connected;
        Ok(())
    }

    fn adopt(&mut self, stream: TcpStream) -> Result<(), ConnectionError> {
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        stream.set_nodelay(true)?;
        self.local_addr = Some(stream.local_addr()?);
        self.peer_addr = Some(stream.peer_addr()?);

        let codec = ChadtCodec::new(self.options.wire);
        let (read_half, write_half) = stream.into_split();
        *self.reader.get_mut() = Some(FramedRead::new(read_half, codec));
        *self.writer.get_mut() = Some(FramedWrite::new(write_half, codec));
        Ok(())
    }

    /// Close the socket. Does nothing unless the connection is
    /// [`ConnectionStatus::Connected`].
    ///
    /// Waits for an in-flight receive or accept to finish, which is bounded
    /// by the socket timeout.
    pub async fn shutdown(&self) {
        {
            let mut status = self.status.lock();
            if *status != ConnectionStatus::Connected {
                return;
            }
            *status = ConnectionStatus::Closed;
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            match timeout(self.options.socket_timeout, writer.close()).await {
                Ok(Err(e)) => debug!(error = %e, "Error closing write half"),
                Err(_) => debug!("Timed out closing write half"),
                Ok(Ok(())) => {}
            }
        }
        self.reader.lock().await.take();
        self.listener.lock().await.take();
        debug!(peer = ?self.peer_addr, "Connection closed");
    }

    /// Encode `message` and write the whole frame.
    pub async fn transmit_message(&self, message: &Message) -> Result<(), ConnectionError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or_else(|| self.invalid_state("transmit"))?;

        match timeout(self.options.socket_timeout, writer.send(message)).await {
            Ok(result) => result.map_err(ConnectionError::from),
            Err(_) => Err(ConnectionError::WriteTimeout),
        }
    }

    /// Read one complete frame.
    ///
    /// A clean close before any header byte yields
    /// [`ConnectionError::PeerDisconnected`]; no frame within the socket
    /// timeout yields [`ConnectionError::ReadTimeout`]. Both leave the
    /// connection usable for another call.
    pub async fn receive_message(&self) -> Result<Message, ConnectionError> {
        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut().ok_or_else(|| self.invalid_state("receive"))?;

        match timeout(self.options.socket_timeout, reader.next()).await {
            Err(_) => Err(ConnectionError::ReadTimeout),
            Ok(None) => Err(ConnectionError::PeerDisconnected),
            Ok(Some(result)) => result.map_err(ConnectionError::from),
        }
    }

    /// Wait for one inbound connection on a listening connection.
    pub async fn accept_connections(&self) -> Result<(TcpStream, SocketAddr), ConnectionError> {
        if !self.is_listening() {
            return Err(ConnectionError::NotListening);
        }
        let guard = self.listener.lock().await;
        let listener = guard.as_ref().ok_or_else(|| self.invalid_state("accept"))?;

        match timeout(self.options.socket_timeout, listener.accept()).await {
            Err(_) => Err(ConnectionError::AcceptTimeout),
            Ok(result) => Ok(result?),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> ConnectionError {
        ConnectionError::InvalidState {
            operation,
            status: self.status(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("status", &self.status())
            .field("local_addr", &self.local_addr)
            .field("peer_addr", &self.peer_addr)
            .field("listening", &self.is_listening())
            .finish()
    }
}

async fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no address for {host}:{port}"),
            )
        })
}

fn new_socket(addr: &SocketAddr) -> io::Result<TcpSocket> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    Ok(socket)
}

fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}
