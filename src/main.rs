mod command;
mod config;
mod gpio;
mod net;
mod relay;
mod remote;
mod settings;
mod transport;
mod web;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use command::Dispatcher;
use config::Config;
use dotenvy::dotenv;
use gpio::SimulatedGpio;
use net::{HostLink, NetLink};
use relay::{RelayBank, StatusLed};
use settings::{FileStore, KvStore, MemoryStore, Settings};
use tokio::signal;
use tokio::sync::mpsc;
use transport::HttpClient;
use webrelay_shared::limits;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = Config::from_env();
    info!(?config, "webrelay device starting");

    // Persistent settings; an unreadable store degrades to in-memory
    let store: Arc<dyn KvStore> = match FileStore::open(&config.store_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(path = %config.store_path, error = %e, "settings store unavailable, running in-memory");
            Arc::new(MemoryStore::new())
        }
    };
    let settings = Settings::new(store);

    let gpio = Arc::new(SimulatedGpio::new());
    let bank = RelayBank::new(gpio.clone());
    let link: Arc<dyn NetLink> = Arc::new(HostLink::new());

    // Link monitor drives the status LED
    tokio::spawn(net::monitor_link(link.clone(), StatusLed::new(gpio.clone())));

    // Local serial console: reader task + dispatcher
    let (queue_tx, queue_rx) = mpsc::channel(limits::COMMAND_QUEUE_CAPACITY);
    match &config.serial_port {
        Some(port) => match transport::serial::open(port, config.serial_baud) {
            Ok((source, writer)) => {
                tokio::spawn(command::read_commands(Box::new(source), queue_tx.clone()));
                let dispatcher = Dispatcher::new(
                    bank.clone(),
                    StatusLed::new(gpio.clone()),
                    settings.clone(),
                    link.clone(),
                    Box::new(writer),
                );
                tokio::spawn(dispatcher.run(queue_rx));
            }
            Err(e) => {
                warn!(port = %port, error = %e, "serial console unavailable, local commands disabled");
            }
        },
        None => info!("no serial port configured, local command interface disabled"),
    }
    drop(queue_tx);

    // Remote poller
    let http = Arc::new(HttpClient::new()?);
    let processor = remote::RemoteProcessor::new(bank.clone(), http.clone());
    tokio::spawn(remote::poll_remote(
        http,
        processor,
        settings.clone(),
        link.clone(),
        Duration::from_millis(config.poll_interval_ms),
    ));

    // Local web UI
    let app = web::router(web::AppState {
        bank,
        settings,
        link,
    });
    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    info!(addr = %config.http_addr, "web UI listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("webrelay device stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
