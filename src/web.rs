//! Local web UI
//!
//! The on-device control page: relay toggles, remote URL form, and a JSON
//! status endpoint. Web actuation goes through the same relay bank as every
//! other command path.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use tracing::{info, warn};
use webrelay_shared::RelayId;

use crate::net::NetLink;
use crate::relay::RelayBank;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub bank: RelayBank,
    pub settings: Settings,
    pub link: Arc<dyn NetLink>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/seturl", post(set_url))
        .route("/api/status", get(status))
        .route("/:relay/:action", get(set_relay))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let ip = state
        .link
        .ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "Not connected".to_string());
    let url = state.settings.url().unwrap_or_else(|| "Not set".to_string());

    Html(render_page(
        &ip,
        &url,
        state.bank.is_energized(RelayId::One),
        state.bank.is_energized(RelayId::Two),
    ))
}

#[derive(Deserialize)]
struct SetUrlForm {
    url: String,
}

async fn set_url(State(state): State<AppState>, Form(form): Form<SetUrlForm>) -> Response {
    let url = form.url.trim();
    if url.is_empty() {
        return (StatusCode::BAD_REQUEST, "Invalid URL").into_response();
    }
    match state.settings.set_url(url) {
        Ok(()) => {
            info!(url, "remote URL updated via web");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            warn!(error = %e, "failed to store remote URL");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save URL").into_response()
        }
    }
}

async fn set_relay(
    State(state): State<AppState>,
    Path((relay, action)): Path<(String, String)>,
) -> Response {
    let relay = match relay.as_str() {
        "relay1" => RelayId::One,
        "relay2" => RelayId::Two,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    let on = match action.as_str() {
        "on" => true,
        "off" => false,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    info!(%relay, on, "relay driven via web");
    state.bank.energize(relay, on);
    Redirect::to("/").into_response()
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "relay1": state.bank.is_energized(RelayId::One),
        "relay2": state.bank.is_energized(RelayId::Two),
        "ip": state.link.ip().map(|ip| ip.to_string()),
        "url": state.settings.url(),
    }))
}

fn render_page(ip: &str, url: &str, relay1: bool, relay2: bool) -> String {
    let relay_section = |relay: RelayId, on: bool| {
        let status = if on { "ON" } else { "OFF" };
        let class = if on { "status-on" } else { "status-off" };
        format!(
            concat!(
                "<div class=\"section\">",
                "<h2>Relay {num}</h2>",
                "<div class=\"status {class}\">Status: {status}</div>",
                "<button onclick=\"location.href='/{key}/on'\" class=\"btn-on\">ON</button>",
                "<button onclick=\"location.href='/{key}/off'\" class=\"btn-off\">OFF</button>",
                "</div>"
            ),
            num = relay.number(),
            key = relay.key(),
            class = class,
            status = status,
        )
    };

    format!(
        concat!(
            "<!DOCTYPE html><html><head>",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            "<title>Web Relay Control</title>",
            "<style>",
            "body {{ font-family: Arial; margin: 20px; background: #f5f5f5; }}",
            ".container {{ max-width: 600px; margin: 0 auto; background: white; ",
            "padding: 20px; border-radius: 8px; }}",
            ".section {{ margin: 20px 0; padding: 15px; background: #f9f9f9; border-radius: 5px; }}",
            "input[type=\"text\"] {{ width: 100%; padding: 8px; margin: 5px 0; box-sizing: border-box; }}",
            "button {{ padding: 10px 20px; margin: 5px; border: none; border-radius: 4px; cursor: pointer; }}",
            ".btn-on {{ background: #4CAF50; color: white; }}",
            ".btn-off {{ background: #f44336; color: white; }}",
            ".btn-save {{ background: #2196F3; color: white; }}",
            ".status {{ padding: 10px; margin: 10px 0; border-radius: 4px; }}",
            ".status-on {{ background: #d4edda; color: #155724; }}",
            ".status-off {{ background: #f8d7da; color: #721c24; }}",
            "</style></head><body><div class=\"container\">",
            "<h1>Web Relay Control</h1>",
            "<div class=\"section\"><p><strong>IP Address:</strong> {ip}</p></div>",
            "<div class=\"section\"><h2>Set Server URL</h2>",
            "<form method=\"POST\" action=\"/seturl\">",
            "<input type=\"text\" name=\"url\" placeholder=\"https://example.com/api/relay\" value=\"{url}\">",
            "<button type=\"submit\" class=\"btn-save\">Save URL</button>",
            "</form></div>",
            "{relay1}{relay2}",
            "</div></body></html>"
        ),
        ip = ip,
        url = url,
        relay1 = relay_section(RelayId::One, relay1),
        relay2 = relay_section(RelayId::Two, relay2),
    )
}
