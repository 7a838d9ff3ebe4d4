//! Remote JSON envelope grammar
//!
//! A poll-response body is expected to be a JSON object:
//!
//! ```text
//! { "command_id"?: string,
//!   "relay1"?: { "state": 0|1, "duration"?: integer_ms },
//!   "relay2"?: { "state": 0|1, "duration"?: integer_ms } }
//! ```
//!
//! Keys are case-sensitive and exact. Extraction is deliberately tolerant at
//! the field level: a relay entry without a numeric `state` is skipped rather
//! than failing the whole envelope. A body that is valid JSON but not an
//! object (for example a bare `1`) is a parse failure, which keeps the legacy
//! single-character fallback reachable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::command::RelayId;

/// Errors that can occur while parsing a poll-response body
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("top-level JSON value is not an object")]
    NotAnObject,
}

/// A raw per-relay directive as found in an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    /// Requested state; only 0 and 1 cause actuation
    pub state: i64,
    /// Auto-off delay in milliseconds; 0 means none
    pub duration_ms: u64,
}

/// A parsed poll-response envelope
///
/// `directives` preserves relay1-then-relay2 order. An empty body (`{}`)
/// parses to an envelope with no id and no directives, a heartbeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub command_id: Option<String>,
    pub directives: Vec<(RelayId, Directive)>,
}

/// Parse a poll-response body into an [`Envelope`].
pub fn parse_envelope(body: &str) -> Result<Envelope, EnvelopeError> {
    let value: Value = serde_json::from_str(body)?;
    let object = value.as_object().ok_or(EnvelopeError::NotAnObject)?;

    let command_id = object
        .get("command_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut directives = Vec::new();
    for relay in RelayId::ALL {
        let Some(entry) = object.get(relay.key()).and_then(Value::as_object) else {
            continue;
        };
        // `state` is required; a missing or non-numeric value skips the relay.
        let Some(state) = entry.get("state").and_then(Value::as_i64) else {
            continue;
        };
        let duration_ms = entry
            .get("duration")
            .and_then(Value::as_i64)
            .map(|d| d.max(0) as u64)
            .unwrap_or(0);
        directives.push((relay, Directive { state, duration_ms }));
    }

    Ok(Envelope {
        command_id,
        directives,
    })
}

/// Acknowledgement for a correlated envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub command_id: String,
    pub status: String,
}

impl Ack {
    /// Create the receipt acknowledgement for a command id
    pub fn received(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            status: "received".into(),
        }
    }
}

/// Builder-side envelope, serialized by the controller server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay1: Option<DirectiveBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay2: Option<DirectiveBody>,
}

/// Builder-side per-relay directive
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DirectiveBody {
    pub state: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}
