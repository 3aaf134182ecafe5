//! Server configuration: TOML file + CLI overrides.

use linelog_core::{LinelogError, LinelogResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub log: LogSection,
}

/// `[server]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_socket_path")]
    pub socket: String,
    /// Optional TCP listen address, e.g. "127.0.0.1:5514".
    #[serde(default)]
    pub tcp_listen: Option<String>,
    #[serde(default = "default_line_capacity")]
    pub line_capacity: usize,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            socket: default_socket_path(),
            tcp_listen: None,
            line_capacity: default_line_capacity(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// `[log]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    /// Tag prepended to every emitted producer line.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

fn default_socket_path() -> String {
    "~/.linelog/linelog.sock".to_string()
}
fn default_line_capacity() -> usize {
    linelog_core::DEFAULT_LINE_CAPACITY
}
fn default_max_sessions() -> usize {
    100
}
fn default_prefix() -> String {
    "[U]".to_string()
}

/// Resolved server configuration (paths expanded, CLI overrides applied).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
    pub tcp_listen: Option<String>,
    pub line_capacity: usize,
    pub max_sessions: usize,
    pub prefix: String,
}

impl ServerConfig {
    /// Load config from TOML file, then apply CLI overrides.
    pub fn load(
        config_path: Option<&Path>,
        cli_socket: Option<&str>,
        cli_tcp_listen: Option<&str>,
        cli_line_capacity: Option<usize>,
        cli_max_sessions: Option<usize>,
    ) -> LinelogResult<Self> {
        // Load base config from file
        let file_config = if let Some(path) = config_path {
            let expanded = expand_tilde(path);
            if expanded.exists() {
                info!(path = %expanded.display(), "loading config file");
                let content = std::fs::read_to_string(&expanded)?;
                toml::from_str::<ConfigFile>(&content)
                    .map_err(|e| LinelogError::Config(format!("config parse error: {e}")))?
            } else {
                info!(path = %expanded.display(), "config file not found, using defaults");
                ConfigFile::default()
            }
        } else {
            ConfigFile::default()
        };

        // Merge CLI overrides
        let socket = cli_socket
            .map(|s| s.to_string())
            .unwrap_or(file_config.server.socket);
        let tcp_listen = cli_tcp_listen
            .map(|s| s.to_string())
            .or(file_config.server.tcp_listen);
        let line_capacity = cli_line_capacity.unwrap_or(file_config.server.line_capacity);
        let max_sessions = cli_max_sessions.unwrap_or(file_config.server.max_sessions);

        Ok(Self {
            socket_path: expand_tilde_str(&socket),
            tcp_listen,
            line_capacity,
            max_sessions,
            prefix: file_config.log.prefix,
        })
    }
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    expand_tilde_str(&s)
}

fn expand_tilde_str(s: &str) -> PathBuf {
    if s.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&s[2..]);
        }
    }
    PathBuf::from(s)
}
