//! Producer session lifecycle.
//!
//! Tracks active sessions, one buffering printer per producer connection,
//! and guarantees every session is flushed exactly once on removal or
//! server drain.

use linelog_core::{LinePrinter, LineSink, LinelogError, LinelogResult, SharedPrinter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// The sink handle every session printer shares.
pub type SharedSink = Arc<dyn LineSink + Send + Sync>;

/// Printer type used by server sessions.
pub type ServerPrinter = SharedPrinter<SharedSink>;

/// Metadata about a single producer session.
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Peer description (socket kind or remote address).
    pub peer: String,
    /// The buffering printer backing this session.
    pub printer: ServerPrinter,
    /// When the session was created.
    pub created_at: Instant,
}

/// Information returned when listing sessions.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub peer: String,
    pub age_secs: u64,
    /// Bytes buffered awaiting a terminator.
    pub pending: usize,
}

/// Manages all active producer sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
    max_sessions: usize,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Create a new session with its own printer over the shared sink.
    ///
    /// Returns the session id and a printer handle for the connection task.
    pub async fn create(
        &self,
        peer: String,
        line_capacity: usize,
        sink: SharedSink,
    ) -> LinelogResult<(String, ServerPrinter)> {
        let sessions = self.sessions.read().await;
        if sessions.len() >= self.max_sessions {
            return Err(LinelogError::SessionLimit(self.max_sessions));
        }
        drop(sessions);

        let session_id = generate_session_id();
        let printer = SharedPrinter::new(LinePrinter::with_capacity(line_capacity, sink));

        let session = Session {
            id: session_id.clone(),
            peer,
            printer: printer.clone(),
            created_at: Instant::now(),
        };

        let mut sessions = self.sessions.write().await;
        info!(session_id = %session_id, peer = %session.peer, "session created");
        sessions.insert(session_id.clone(), session);

        Ok((session_id, printer))
    }

    /// Remove a session after its connection ended.
    ///
    /// The caller performs the final flush through its own printer handle;
    /// the registry just forgets the session.
    pub async fn remove(&self, session_id: &str) -> LinelogResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(session_id).is_some() {
            info!(session_id, "session removed");
            Ok(())
        } else {
            Err(LinelogError::SessionNotFound(session_id.to_string()))
        }
    }

    /// List all active sessions.
    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .map(|s| SessionInfo {
                id: s.id.clone(),
                peer: s.peer.clone(),
                age_secs: s.created_at.elapsed().as_secs(),
                pending: s.printer.pending().unwrap_or(0),
            })
            .collect()
    }

    /// Number of active sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close every remaining session, flushing trailing partial lines.
    ///
    /// Used at server shutdown so abruptly-ended producers lose nothing.
    /// Returns the number of sessions drained.
    pub async fn drain(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        for (id, session) in sessions.drain() {
            if let Err(e) = session.printer.flush() {
                warn!(session_id = %id, error = %e, "flush failed during drain");
            }
        }
        count
    }
}

/// Generate a random session ID (hex-encoded, 16 bytes = 32 hex chars).
fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}
