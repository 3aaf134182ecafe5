//! linelog — producer client for the linelog daemon.
//!
//! Streams stdin (or one-shot messages) to the daemon's socket; the daemon
//! line-buffers the bytes and logs complete lines.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

/// linelog — send producer output to a linelog daemon
#[derive(Parser, Debug)]
#[command(name = "linelog", version, about = "Send producer output to a linelog daemon")]
struct Cli {
    /// Unix socket path of the daemon
    #[arg(short, long, default_value = "~/.linelog/linelog.sock")]
    socket: String,

    /// Connect over TCP instead (e.g. 127.0.0.1:5514)
    #[arg(long)]
    tcp: Option<String>,

    /// One-shot messages to send as lines instead of streaming stdin
    #[arg(short, long = "message")]
    messages: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.tcp {
        Some(addr) => {
            let stream = TcpStream::connect(addr)
                .await
                .with_context(|| format!("cannot connect to {addr}"))?;
            send(stream, &cli.messages).await
        }
        None => {
            let path = expand_tilde(&cli.socket);
            let stream = UnixStream::connect(&path)
                .await
                .with_context(|| format!("cannot connect to {}", path.display()))?;
            send(stream, &cli.messages).await
        }
    }
}

/// Write the messages (or stdin) to the daemon, then half-close so the
/// daemon flushes any trailing partial line.
async fn send<S>(mut stream: S, messages: &[String]) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    if messages.is_empty() {
        let mut stdin = tokio::io::stdin();
        let mut buf = [0u8; 4096];
        loop {
            let n = stdin.read(&mut buf).await.context("stdin read failed")?;
            if n == 0 {
                break;
            }
            stream
                .write_all(&buf[..n])
                .await
                .context("socket write failed")?;
        }
    } else {
        for message in messages {
            stream
                .write_all(message.as_bytes())
                .await
                .context("socket write failed")?;
            stream.write_all(b"\n").await.context("socket write failed")?;
        }
    }

    stream.shutdown().await.context("socket shutdown failed")?;
    Ok(())
}

/// Expand `~` to the user's home directory.
fn expand_tilde(s: &str) -> PathBuf {
    if s.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&s[2..]);
        }
    }
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn one_shot_messages_are_terminated() {
        let mut out = Vec::new();
        send(&mut out, &["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(out, b"first\nsecond\n".to_vec());
    }

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(expand_tilde("/tmp/x.sock"), PathBuf::from("/tmp/x.sock"));
    }
}
