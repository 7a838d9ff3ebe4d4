//! Shared command vocabulary
//!
//! Every input path (serial line, remote envelope, web UI) is parsed into
//! these types before execution, so the actuator only ever sees one command
//! representation.

use std::fmt;

/// A relay output, addressed as 1 or 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayId {
    One,
    Two,
}

impl RelayId {
    /// Both relays, in fixed processing order
    pub const ALL: [RelayId; 2] = [RelayId::One, RelayId::Two];

    /// Zero-based slot index
    pub fn index(self) -> usize {
        match self {
            RelayId::One => 0,
            RelayId::Two => 1,
        }
    }

    /// One-based relay number as printed on the enclosure
    pub fn number(self) -> u8 {
        match self {
            RelayId::One => 1,
            RelayId::Two => 2,
        }
    }

    /// The JSON key naming this relay in a remote envelope
    pub fn key(self) -> &'static str {
        match self {
            RelayId::One => "relay1",
            RelayId::Two => "relay2",
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(RelayId::One),
            2 => Some(RelayId::Two),
            _ => None,
        }
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// WiFi credential fields addressable over the serial protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiField {
    Ssid,
    Password,
}

/// A parsed local command
///
/// Payload strings are bounded to [`crate::limits::MAX_LINE_BYTES`] by the
/// line grammar; a command is produced per input event and consumed exactly
/// once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a WiFi credential (`SSID=` / `WIFIPASS=`)
    SetWifiField(WifiField, String),
    /// Query a stored WiFi credential (`SSID?` / `WIFIPASS?`)
    QueryWifiField(WifiField),
    /// Store the remote poll URL (`URL=`)
    SetRemoteUrl(String),
    /// Query the stored remote poll URL (`URL?`)
    QueryRemoteUrl,
    /// Query the current IP address (`IP?`)
    QueryIp,
    /// Drive the status LED
    SetLed(bool),
    /// Drive a relay output
    SetRelay(RelayId, bool),
    /// Anything the grammar did not recognize
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_id_roundtrip() {
        for relay in RelayId::ALL {
            assert_eq!(RelayId::from_number(relay.number()), Some(relay));
        }
        assert_eq!(RelayId::from_number(0), None);
        assert_eq!(RelayId::from_number(3), None);
    }

    #[test]
    fn test_relay_id_keys() {
        assert_eq!(RelayId::One.key(), "relay1");
        assert_eq!(RelayId::Two.key(), "relay2");
        assert_eq!(RelayId::Two.index(), 1);
    }
}
