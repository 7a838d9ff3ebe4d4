//! WebRelay Shared Protocol Types
//!
//! This crate provides the command vocabulary and the two protocol grammars
//! spoken by the relay switch: the line-oriented serial protocol and the
//! polled remote JSON protocol. Both grammars reduce to the same internal
//! command representation before anything touches an actuator.

pub mod command;
pub mod envelope;
pub mod line;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use command::{Command, RelayId, WifiField};
pub use envelope::{parse_envelope, Ack, Directive, DirectiveBody, Envelope, EnvelopeBody, EnvelopeError};
pub use line::{mask_secret, parse_line};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Fixed operating limits for the device
pub mod limits {
    /// Maximum accepted command line length, also the payload bound, in bytes
    pub const MAX_LINE_BYTES: usize = 128;

    /// Capacity of the local command queue
    pub const COMMAND_QUEUE_CAPACITY: usize = 10;

    /// Serial byte read timeout in milliseconds
    pub const READ_TIMEOUT_MS: u64 = 100;

    /// Command dequeue timeout in milliseconds
    pub const DEQUEUE_TIMEOUT_MS: u64 = 100;

    /// Default remote poll interval in milliseconds
    pub const POLL_INTERVAL_MS: u64 = 2000;

    /// HTTP fetch attempts before giving up on a poll cycle
    pub const FETCH_MAX_ATTEMPTS: u32 = 3;

    /// Delay between HTTP fetch attempts in milliseconds
    pub const FETCH_RETRY_DELAY_MS: u64 = 1000;

    /// HTTP request timeout in milliseconds
    pub const FETCH_TIMEOUT_MS: u64 = 10_000;
}
