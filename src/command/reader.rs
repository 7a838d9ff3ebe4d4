//! Serial line reader task
//!
//! Assembles bytes into CR/LF-terminated lines, parses them with the line
//! grammar, and feeds the command queue. Enqueue never blocks: when the
//! queue is full the newest command is dropped with a warning.

use std::time::Duration;

use bytes::BytesMut;
use tokio::sync::mpsc;
use tracing::{info, warn};
use webrelay_shared::{limits, parse_line, Command};

use crate::transport::ByteSource;

/// Run the reader until the byte source goes away
pub async fn read_commands(mut source: Box<dyn ByteSource>, queue: mpsc::Sender<Command>) {
    let timeout = Duration::from_millis(limits::READ_TIMEOUT_MS);
    let mut buffer = BytesMut::with_capacity(limits::MAX_LINE_BYTES);

    info!("serial command reader started");
    loop {
        let byte = match source.read_byte(timeout).await {
            Ok(Some(byte)) => byte,
            Ok(None) => continue, // read timeout, keep polling
            Err(e) => {
                warn!(error = %e, "byte source closed, stopping reader");
                break;
            }
        };

        match byte {
            b'\r' | b'\n' => {
                if buffer.is_empty() {
                    continue;
                }
                let line = String::from_utf8_lossy(&buffer).into_owned();
                buffer.clear();
                handle_line(&line, &queue);
            }
            _ if buffer.len() < limits::MAX_LINE_BYTES => {
                buffer.extend_from_slice(&[byte]);
            }
            _ => {
                warn!("command line overflow, resetting buffer");
                buffer.clear();
            }
        }
    }
}

fn handle_line(line: &str, queue: &mpsc::Sender<Command>) {
    match parse_line(line) {
        Command::Unknown => warn!(line, "unknown command"),
        command => {
            if enqueue(command, queue) {
                info!(line, "command received");
            }
        }
    }
}

/// Non-blocking enqueue; drops the newest command when the queue is full
pub fn enqueue(command: Command, queue: &mpsc::Sender<Command>) -> bool {
    match queue.try_send(command) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(command)) => {
            warn!(?command, "command queue full, dropping newest");
            false
        }
        Err(mpsc::error::TrySendError::Closed(command)) => {
            warn!(?command, "command queue closed, dropping");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use webrelay_shared::RelayId;

    /// Byte source that plays back a fixed script, then errors out so the
    /// reader terminates.
    struct ScriptedSource {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl ScriptedSource {
        fn new(script: &str) -> Self {
            Self {
                bytes: script.as_bytes().to_vec(),
                pos: 0,
            }
        }
    }

    #[async_trait]
    impl ByteSource for ScriptedSource {
        async fn read_byte(&mut self, _timeout: Duration) -> Result<Option<u8>> {
            if self.pos < self.bytes.len() {
                let byte = self.bytes[self.pos];
                self.pos += 1;
                Ok(Some(byte))
            } else {
                Err(anyhow!("script exhausted"))
            }
        }
    }

    #[tokio::test]
    async fn test_lines_become_commands_in_order() {
        let (tx, mut rx) = mpsc::channel(limits::COMMAND_QUEUE_CAPACITY);
        let source = ScriptedSource::new("relay1 on\rLED OFF\r\nrelay2 off\n");

        read_commands(Box::new(source), tx).await;

        assert_eq!(rx.recv().await, Some(Command::SetRelay(RelayId::One, true)));
        assert_eq!(rx.recv().await, Some(Command::SetLed(false)));
        assert_eq!(rx.recv().await, Some(Command::SetRelay(RelayId::Two, false)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_unknown_lines_are_not_enqueued() {
        let (tx, mut rx) = mpsc::channel(limits::COMMAND_QUEUE_CAPACITY);
        let source = ScriptedSource::new("open the pod bay doors\rled on\r");

        read_commands(Box::new(source), tx).await;

        assert_eq!(rx.recv().await, Some(Command::SetLed(true)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_overflow_resets_buffer() {
        let long = "x".repeat(limits::MAX_LINE_BYTES + 50);
        let script = format!("{long}\rrelay2 on\r");
        let (tx, mut rx) = mpsc::channel(limits::COMMAND_QUEUE_CAPACITY);

        read_commands(Box::new(ScriptedSource::new(&script)), tx).await;

        // The overflowed line is discarded; the next one still parses.
        assert_eq!(rx.recv().await, Some(Command::SetRelay(RelayId::Two, true)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_full_queue_drops_newest() {
        let (tx, mut rx) = mpsc::channel(2);

        assert!(enqueue(Command::SetLed(true), &tx));
        assert!(enqueue(Command::SetLed(false), &tx));
        assert!(!enqueue(Command::SetRelay(RelayId::One, true), &tx));

        // The first two survive in FIFO order
        assert_eq!(rx.recv().await, Some(Command::SetLed(true)));
        assert_eq!(rx.recv().await, Some(Command::SetLed(false)));
        assert!(rx.try_recv().is_err());
    }
}
