//! Collaborator trait seams for the byte and HTTP transports

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// A byte-at-a-time input source (the serial console RX side)
#[async_trait]
pub trait ByteSource: Send {
    /// Read one byte, waiting at most `timeout`.
    ///
    /// `Ok(None)` on timeout; `Err` when the source is gone for good.
    async fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>>;
}

/// Line-oriented output sink (the serial console TX side)
#[async_trait]
pub trait LineWriter: Send {
    /// Write `line` followed by CR+LF
    async fn write_line(&mut self, line: &str) -> Result<()>;
}

/// HTTP GET collaborator used by the remote poller
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Fetch `url`, returning the status code and body text
    async fn get(&self, url: &str) -> Result<(u16, String)>;
}

/// HTTP POST collaborator used for acknowledgements
#[async_trait]
pub trait HttpPost: Send + Sync {
    /// POST a JSON body to `url`
    async fn post_json(&self, url: &str, body: &str) -> Result<()>;
}
