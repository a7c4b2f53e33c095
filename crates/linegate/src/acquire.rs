//! Scan feed acquisition.
//!
//! The decoder collaborator delivers decoded payloads as lines, either on
//! stdin (piped from a local decoder process) or over a TCP connection.
//! Lines are published through a depth-one watch channel: when the pipeline
//! falls behind, only the most recent scan survives, so stale frames are
//! never processed.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Lines that terminate the feed instead of scanning as a code.
const QUIT_COMMANDS: [&str; 2] = ["q", "quit"];

pub fn is_quit(line: &str) -> bool {
    QUIT_COMMANDS
        .iter()
        .any(|command| line.trim().eq_ignore_ascii_case(command))
}

/// Why a feed reader stopped.
enum FeedEnd {
    /// Operator asked to quit; the whole feed shuts down.
    Quit,
    /// This input ran out; a listening feed may accept a new connection.
    Disconnected,
}

/// Receiving side of the acquisition feed.
///
/// `next_scan` yields decoded payloads until the feed ends (quit command,
/// end of input, or reader failure), then returns `None`.
pub struct ScanFeed {
    rx: watch::Receiver<Option<String>>,
}

impl ScanFeed {
    /// Feed decoded payloads from stdin.
    pub fn stdin() -> Self {
        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            read_lines(reader, &tx).await;
        });
        Self { rx }
    }

    /// Bind a TCP listener and feed lines from inbound decoder connections.
    ///
    /// One connection is served at a time; when the decoder disconnects the
    /// listener accepts the next connection, so a decoder restart does not
    /// require a gate restart.
    pub async fn listen(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind scan feed listener on {addr}"))?;
        info!("Scan feed listening on {}", addr);

        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, peer)) => {
                        info!("Decoder connected from {}", peer);
                        if let FeedEnd::Quit = read_lines(BufReader::new(socket), &tx).await {
                            break;
                        }
                        info!("Decoder disconnected, waiting for the next connection");
                    }
                    Err(err) => {
                        warn!("Scan feed accept error: {}", err);
                        break;
                    }
                }
            }
        });
        Ok(Self { rx })
    }

    /// The next decoded payload, or `None` once the feed has ended.
    pub async fn next_scan(&mut self) -> Option<String> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let latest = self.rx.borrow_and_update().clone();
            if let Some(code) = latest {
                return Some(code);
            }
        }
    }
}

/// Pump lines from one reader into the feed channel.
async fn read_lines<R>(reader: R, tx: &watch::Sender<Option<String>>) -> FeedEnd
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let code = line.trim();
                if code.is_empty() {
                    continue;
                }
                if is_quit(code) {
                    info!("Quit command received on scan feed");
                    return FeedEnd::Quit;
                }
                if tx.send(Some(code.to_string())).is_err() {
                    // Receiver gone; nothing left to feed.
                    return FeedEnd::Quit;
                }
            }
            Ok(None) => {
                info!("Scan feed reached end of input");
                return FeedEnd::Quit;
            }
            Err(err) => {
                warn!("Scan feed read error: {}", err);
                return FeedEnd::Disconnected;
            }
        }
    }
}
