//! Tracing-backed line sink.

use linelog_core::LineSink;
use tracing::info;

/// Emits completed producer lines into the server's structured log.
///
/// Each line is logged once at INFO under a dedicated target, tagged with
/// the configured prefix. Non-UTF-8 bytes are rendered lossily; emission
/// never fails and is never retried.
#[derive(Debug)]
pub struct TraceSink {
    prefix: String,
}

impl TraceSink {
    pub fn new(prefix: String) -> Self {
        Self { prefix }
    }
}

impl LineSink for TraceSink {
    fn emit(&self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        if self.prefix.is_empty() {
            info!(target: "linelog::lines", "{text}");
        } else {
            info!(target: "linelog::lines", "{} {}", self.prefix, text);
        }
    }
}
