//! WebRelay controller server
//!
//! Companion to the device daemon: queues one pending directive envelope at
//! a time (a newer command replaces an unfetched one), hands it to the
//! device's next poll, records acknowledgements, and only confirms relay
//! state once the device has acked. Serves a minimal control page.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;
use webrelay_shared::{Ack, DirectiveBody, EnvelopeBody, RelayId};

/// Target state a queued command should confirm on acknowledgement
#[derive(Debug, Clone, Copy)]
struct PendingTarget {
    relay: RelayId,
    on: bool,
}

/// Command state shared by all handlers
#[derive(Default)]
struct Commands {
    /// Single pending envelope slot; last write wins until the device polls
    pending: Option<EnvelopeBody>,
    /// Issued command ids awaiting acknowledgement
    awaiting: HashMap<String, PendingTarget>,
    /// Ack-confirmed relay states
    confirmed: [bool; 2],
}

#[derive(Clone, Default)]
struct AppState {
    commands: Arc<Mutex<Commands>>,
}

impl AppState {
    /// Queue a directive for the device's next poll, returning its command id
    fn queue_directive(&self, relay: RelayId, on: bool, duration: Option<u64>) -> String {
        let uuid = Uuid::new_v4().simple().to_string();
        let command_id = uuid[..8].to_string();

        let directive = DirectiveBody {
            state: i64::from(on),
            duration,
        };
        let mut envelope = EnvelopeBody {
            command_id: Some(command_id.clone()),
            ..EnvelopeBody::default()
        };
        match relay {
            RelayId::One => envelope.relay1 = Some(directive),
            RelayId::Two => envelope.relay2 = Some(directive),
        }

        let mut commands = self.commands.lock().unwrap();
        if let Some(replaced) = commands.pending.replace(envelope) {
            debug!(replaced_id = ?replaced.command_id, "replacing unfetched pending command");
        }
        commands
            .awaiting
            .insert(command_id.clone(), PendingTarget { relay, on });
        info!(command_id = %command_id, %relay, on, "command queued");
        command_id
    }

    /// Hand out and clear the pending envelope
    fn take_pending(&self) -> Option<EnvelopeBody> {
        let mut commands = self.commands.lock().unwrap();
        let envelope = commands.pending.take();
        if let Some(envelope) = &envelope {
            info!(command_id = ?envelope.command_id, "pending command fetched by device");
        }
        envelope
    }

    /// Apply a device acknowledgement to the confirmed state
    fn acknowledge(&self, ack: &Ack) {
        let mut commands = self.commands.lock().unwrap();
        match commands.awaiting.remove(&ack.command_id) {
            Some(target) => {
                commands.confirmed[target.relay.index()] = target.on;
                info!(
                    command_id = %ack.command_id,
                    relay = %target.relay,
                    on = target.on,
                    "command acknowledged"
                );
            }
            None => warn!(command_id = %ack.command_id, "ack for unknown command"),
        }
    }

    fn confirmed(&self) -> [bool; 2] {
        self.commands.lock().unwrap().confirmed
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let state = AppState::default();
    let app = router(state);

    let addr: SocketAddr = std::env::var("WEBRELAY_SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
        .parse()
        .context("invalid WEBRELAY_SERVER_ADDR")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "controller server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/relay", get(api_poll).post(api_ack))
        .route("/api/relay1", post(api_queue_relay1))
        .route("/api/relay2", post(api_queue_relay2))
        .route("/api/status", get(api_status))
        .with_state(state)
}

/// The device's poll endpoint: pending envelope or `{}`
async fn api_poll(State(state): State<AppState>) -> Json<EnvelopeBody> {
    Json(state.take_pending().unwrap_or_default())
}

/// The device's acknowledgement endpoint; invalid payloads are ignored
async fn api_ack(State(state): State<AppState>, body: String) -> StatusCode {
    match serde_json::from_str::<Ack>(&body) {
        Ok(ack) => state.acknowledge(&ack),
        Err(e) => debug!(error = %e, "ignoring invalid ack payload"),
    }
    StatusCode::OK
}

#[derive(Deserialize)]
struct DirectiveRequest {
    state: i64,
    duration: Option<u64>,
}

async fn api_queue_relay1(
    State(state): State<AppState>,
    Json(request): Json<DirectiveRequest>,
) -> Response {
    queue(&state, RelayId::One, request)
}

async fn api_queue_relay2(
    State(state): State<AppState>,
    Json(request): Json<DirectiveRequest>,
) -> Response {
    queue(&state, RelayId::Two, request)
}

fn queue(state: &AppState, relay: RelayId, request: DirectiveRequest) -> Response {
    if request.state != 0 && request.state != 1 {
        return (StatusCode::BAD_REQUEST, "state must be 0 or 1").into_response();
    }
    let command_id = state.queue_directive(relay, request.state == 1, request.duration);
    Json(serde_json::json!({ "command_id": command_id })).into_response()
}

async fn api_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let [relay1, relay2] = state.confirmed();
    Json(serde_json::json!({ "relay1": relay1, "relay2": relay2 }))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let [relay1, relay2] = state.confirmed();
    Html(render_page(relay1, relay2))
}

fn render_page(relay1: bool, relay2: bool) -> String {
    let row = |relay: RelayId, on: bool| {
        format!(
            concat!(
                "<div class=\"row\"><h2>Relay {num}</h2>",
                "<span class=\"state\">{state}</span>",
                "<button onclick=\"send('{key}',1)\">ON</button>",
                "<button onclick=\"send('{key}',0)\">OFF</button></div>"
            ),
            num = relay.number(),
            key = relay.key(),
            state = if on { "ON" } else { "OFF" },
        )
    };

    format!(
        concat!(
            "<!DOCTYPE html><html><head><title>WebRelay Controller</title>",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            "<style>body {{ font-family: Arial; margin: 40px; }} ",
            ".row {{ margin: 20px 0; }} ",
            "button {{ padding: 8px 16px; margin: 0 4px; }} ",
            ".state {{ font-weight: bold; margin-right: 12px; }}</style>",
            "<script>",
            "function send(relay, state) {{",
            "  fetch('/api/' + relay, {{ method: 'POST',",
            "    headers: {{ 'Content-Type': 'application/json' }},",
            "    body: JSON.stringify({{ state: state }}) }})",
            "    .then(() => setTimeout(() => location.reload(), 500));",
            "}}",
            "</script></head><body><h1>WebRelay Controller</h1>",
            "<p>States reflect device acknowledgements, not queued commands.</p>",
            "{relay1}{relay2}",
            "</body></html>"
        ),
        relay1 = row(RelayId::One, relay1),
        relay2 = row(RelayId::Two, relay2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrelay_shared::envelope::parse_envelope;

    #[test]
    fn test_queued_command_is_fetched_once() {
        let state = AppState::default();
        let command_id = state.queue_directive(RelayId::One, true, Some(500));

        let envelope = state.take_pending().expect("pending command missing");
        assert_eq!(envelope.command_id.as_deref(), Some(command_id.as_str()));
        let directive = envelope.relay1.expect("relay1 directive missing");
        assert_eq!(directive.state, 1);
        assert_eq!(directive.duration, Some(500));
        assert!(envelope.relay2.is_none());

        // The slot is cleared after one fetch
        assert!(state.take_pending().is_none());
    }

    #[test]
    fn test_newer_command_replaces_unfetched_one() {
        let state = AppState::default();
        state.queue_directive(RelayId::One, true, None);
        let newer = state.queue_directive(RelayId::Two, false, None);

        let envelope = state.take_pending().expect("pending command missing");
        assert_eq!(envelope.command_id.as_deref(), Some(newer.as_str()));
        assert!(envelope.relay1.is_none());
        assert!(envelope.relay2.is_some());
    }

    #[test]
    fn test_state_is_confirmed_only_on_ack() {
        let state = AppState::default();
        let command_id = state.queue_directive(RelayId::Two, true, None);
        assert_eq!(state.confirmed(), [false, false]);

        state.acknowledge(&Ack::received(command_id));
        assert_eq!(state.confirmed(), [false, true]);

        // An ack for an unknown id is ignored
        state.acknowledge(&Ack::received("deadbeef"));
        assert_eq!(state.confirmed(), [false, true]);
    }

    #[test]
    fn test_served_envelope_parses_with_device_grammar() {
        let state = AppState::default();
        state.queue_directive(RelayId::One, true, Some(1500));

        let envelope = state.take_pending().expect("pending command missing");
        let json = serde_json::to_string(&envelope).expect("serialize failed");
        let parsed = parse_envelope(&json).expect("device grammar rejected envelope");

        assert_eq!(parsed.directives.len(), 1);
        assert_eq!(parsed.directives[0].1.state, 1);
        assert_eq!(parsed.directives[0].1.duration_ms, 1500);
    }

    #[test]
    fn test_command_ids_are_short_hex() {
        let state = AppState::default();
        let command_id = state.queue_directive(RelayId::One, false, None);
        assert_eq!(command_id.len(), 8);
        assert!(command_id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
