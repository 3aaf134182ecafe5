//! Core server: accepts producer connections and feeds them into sessions.
//!
//! Owns the session manager and the shared sink. Each accepted connection
//! becomes one producer session whose byte stream is line-buffered and
//! emitted into the server log.

use crate::config::ServerConfig;
use crate::session::{ServerPrinter, SessionManager, SharedSink};
use crate::sink::TraceSink;
use linelog_core::LinelogResult;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, UnixListener};
use tracing::{debug, info, warn};

/// Read chunk size for producer connections.
const READ_BUFFER_SIZE: usize = 4096;

/// The linelog server instance.
pub struct LinelogServer {
    /// Server configuration.
    config: ServerConfig,
    /// Session manager.
    sessions: Arc<SessionManager>,
    /// Process-wide sink shared by every session printer.
    sink: SharedSink,
}

impl LinelogServer {
    /// Create a server that logs lines through a [`TraceSink`].
    pub fn new(config: ServerConfig) -> Self {
        let sink: SharedSink = Arc::new(TraceSink::new(config.prefix.clone()));
        Self::with_sink(config, sink)
    }

    /// Create a server with a caller-provided sink.
    pub fn with_sink(config: ServerConfig, sink: SharedSink) -> Self {
        let sessions = Arc::new(SessionManager::new(config.max_sessions));
        Self {
            config,
            sessions,
            sink,
        }
    }

    /// Access the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Access the session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Bind the listeners and accept producers until the task is cancelled.
    pub async fn run(self: Arc<Self>) -> LinelogResult<()> {
        // Unix socket: create the parent dir, drop any stale socket file.
        let socket_path = self.config.socket_path.clone();
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }
        let unix_listener = UnixListener::bind(&socket_path)?;
        info!(path = %socket_path.display(), "listening on unix socket");

        if let Some(addr) = self.config.tcp_listen.clone() {
            let tcp_listener = TcpListener::bind(&addr).await?;
            info!(addr = %addr, "listening on tcp");
            let server = self.clone();
            tokio::spawn(async move {
                server.accept_tcp(tcp_listener).await;
            });
        }

        info!(
            line_capacity = self.config.line_capacity,
            max_sessions = self.config.max_sessions,
            "linelog-server ready"
        );

        self.accept_unix(unix_listener).await;
        Ok(())
    }

    async fn accept_unix(self: Arc<Self>, listener: UnixListener) {
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream, "unix".to_string()).await
                        {
                            warn!(error = %e, "connection error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "unix accept failed"),
            }
        }
    }

    async fn accept_tcp(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream, addr.to_string()).await {
                            warn!(error = %e, "connection error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "tcp accept failed"),
            }
        }
    }

    /// Run one producer connection: open a session, pump bytes into its
    /// printer, and close the session however the stream ends.
    async fn handle_connection<T>(&self, stream: T, peer: String) -> LinelogResult<()>
    where
        T: AsyncRead + Unpin,
    {
        let (session_id, printer) = self
            .sessions
            .create(peer, self.config.line_capacity, self.sink.clone())
            .await?;

        let outcome = pump(stream, &printer).await;

        // Close exactly once, whether the producer disconnected cleanly or
        // the read failed: the trailing partial line must not be lost.
        if let Err(e) = printer.close() {
            warn!(session_id = %session_id, error = %e, "final flush failed");
        }
        self.sessions.remove(&session_id).await?;

        match outcome {
            Ok(bytes) => {
                debug!(session_id = %session_id, bytes, "producer disconnected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Read the producer stream to EOF, feeding every chunk to the printer.
///
/// Returns the total number of bytes consumed.
async fn pump<T>(mut stream: T, printer: &ServerPrinter) -> LinelogResult<u64>
where
    T: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        printer.write(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}
