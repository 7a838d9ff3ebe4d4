//! Remote directive processor
//!
//! Applies one poll result to the actuator and posts acknowledgements for
//! correlated envelopes. Every failure path degrades to "ignore and
//! continue"; nothing here can take the poll loop down.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use webrelay_shared::{parse_envelope, Ack, Directive, EnvelopeError, RelayId};

use crate::relay::RelayBank;
use crate::transport::HttpPost;

pub struct RemoteProcessor {
    bank: RelayBank,
    poster: Arc<dyn HttpPost>,
}

impl RemoteProcessor {
    pub fn new(bank: RelayBank, poster: Arc<dyn HttpPost>) -> Self {
        Self { bank, poster }
    }

    /// Apply one poll response. Only status 200 is processed; the transport
    /// retries other outcomes on its own schedule.
    pub async fn apply(&self, status: u16, body: &str, ack_url: &str) {
        if status != 200 {
            debug!(status, "ignoring poll response");
            return;
        }

        let trimmed = body.trim();
        if trimmed.is_empty() {
            return;
        }

        let envelope = match parse_envelope(trimmed) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.apply_legacy(trimmed, &e);
                return;
            }
        };

        if envelope.command_id.is_none() && envelope.directives.is_empty() {
            debug!("heartbeat envelope, nothing to do");
            return;
        }

        for (relay, directive) in &envelope.directives {
            self.apply_directive(*relay, directive);
        }

        // Receipt is acknowledged whenever the envelope was correlated,
        // whether or not any directive matched.
        if let Some(command_id) = envelope.command_id {
            self.acknowledge(&command_id, ack_url).await;
        }
    }

    fn apply_directive(&self, relay: RelayId, directive: &Directive) {
        match directive.state {
            1 => {
                self.bank.energize(relay, true);
                if directive.duration_ms > 0 {
                    self.bank
                        .schedule_auto_off(relay, Duration::from_millis(directive.duration_ms));
                }
            }
            0 => self.bank.energize(relay, false),
            other => warn!(%relay, state = other, "invalid relay state, ignoring"),
        }
    }

    /// Backward compatibility: a bare `"0"`/`"1"` body drives relay 1
    fn apply_legacy(&self, body: &str, error: &EnvelopeError) {
        match body {
            "0" => {
                info!("legacy poll body, de-energizing relay1");
                self.bank.energize(RelayId::One, false);
            }
            "1" => {
                info!("legacy poll body, energizing relay1");
                self.bank.energize(RelayId::One, true);
            }
            _ => debug!(error = %error, "unparseable poll body ignored"),
        }
    }

    async fn acknowledge(&self, command_id: &str, url: &str) {
        let ack = Ack::received(command_id);
        let body = match serde_json::to_string(&ack) {
            Ok(body) => body,
            Err(e) => {
                warn!(command_id, error = %e, "failed to serialize acknowledgement");
                return;
            }
        };

        info!(command_id, "acknowledging envelope");
        if let Err(e) = self.poster.post_json(url, &body).await {
            warn!(command_id, error = %e, "acknowledgement dispatch failed");
        }
    }
}
