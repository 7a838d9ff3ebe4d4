//! Command dispatcher
//!
//! Drains the bounded command queue and executes each command to full
//! completion before the next dequeue. Single consumer by construction; the
//! actuator's own lock covers races with the remote and web paths.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use webrelay_shared::{limits, mask_secret, Command, WifiField};

use crate::net::NetLink;
use crate::relay::{RelayBank, StatusLed};
use crate::settings::Settings;
use crate::transport::LineWriter;

const RESP_OK: &str = "OK";
const RESP_ERROR: &str = "ERROR";
const RESP_NOT_SET: &str = "NOT_SET";

/// Executes locally queued commands against the actuator and settings store
pub struct Dispatcher {
    bank: RelayBank,
    led: StatusLed,
    settings: Settings,
    link: Arc<dyn NetLink>,
    writer: Box<dyn LineWriter>,
}

impl Dispatcher {
    pub fn new(
        bank: RelayBank,
        led: StatusLed,
        settings: Settings,
        link: Arc<dyn NetLink>,
        writer: Box<dyn LineWriter>,
    ) -> Self {
        Self {
            bank,
            led,
            settings,
            link,
            writer,
        }
    }

    /// Run until the queue closes
    pub async fn run(mut self, mut queue: mpsc::Receiver<Command>) {
        let wait = Duration::from_millis(limits::DEQUEUE_TIMEOUT_MS);

        info!("command dispatcher started");
        loop {
            match timeout(wait, queue.recv()).await {
                Ok(Some(command)) => self.execute(command).await,
                Ok(None) => {
                    info!("command queue closed, dispatcher stopping");
                    break;
                }
                Err(_) => continue, // dequeue timeout, wait again
            }
        }
    }

    async fn execute(&mut self, command: Command) {
        debug!(?command, "executing command");
        match command {
            Command::SetRelay(relay, on) => self.bank.energize(relay, on),
            Command::SetLed(on) => {
                self.led.set(on);
                info!(on, "led driven");
            }
            Command::SetWifiField(field, value) => self.set_wifi_field(field, value).await,
            Command::QueryWifiField(WifiField::Ssid) => {
                let response = self.settings.ssid();
                self.respond(response.as_deref().unwrap_or(RESP_NOT_SET)).await;
            }
            Command::QueryWifiField(WifiField::Password) => {
                let response = self.settings.password().map(|p| mask_secret(&p));
                self.respond(response.as_deref().unwrap_or(RESP_NOT_SET)).await;
            }
            Command::SetRemoteUrl(value) => match self.settings.set_url(&value) {
                Ok(()) => {
                    info!(url = %value, "remote URL updated");
                    self.respond(RESP_OK).await;
                }
                Err(e) => {
                    warn!(error = %e, "failed to store remote URL");
                    self.respond(RESP_ERROR).await;
                }
            },
            Command::QueryRemoteUrl => {
                let response = self.settings.url();
                self.respond(response.as_deref().unwrap_or(RESP_NOT_SET)).await;
            }
            Command::QueryIp => {
                let response = self.link.ip().map(|ip| ip.to_string());
                self.respond(response.as_deref().unwrap_or(RESP_NOT_SET)).await;
            }
            Command::Unknown => debug!("ignoring unknown command"),
        }
    }

    async fn set_wifi_field(&mut self, field: WifiField, value: String) {
        let stored = match field {
            WifiField::Ssid => self.settings.set_ssid(&value),
            WifiField::Password => self.settings.set_password(&value),
        };

        match stored {
            Ok(()) => {
                self.respond(RESP_OK).await;
                // Re-associate once both credentials are known.
                let (ssid, password) = match field {
                    WifiField::Ssid => (Some(value), self.settings.password()),
                    WifiField::Password => (self.settings.ssid(), Some(value)),
                };
                if let (Some(ssid), Some(password)) = (ssid, password) {
                    if let Err(e) = self.link.reconnect(&ssid, &password).await {
                        warn!(error = %e, "link reconnect failed");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to store credential");
                self.respond(RESP_ERROR).await;
            }
        }
    }

    async fn respond(&mut self, line: &str) {
        if let Err(e) = self.writer.write_line(line).await {
            warn!(error = %e, "failed to write serial response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{pins, SimulatedGpio};
    use crate::net::testutil::MockLink;
    use crate::settings::MemoryStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use webrelay_shared::RelayId;

    /// Writer that collects responses for assertions
    #[derive(Clone, Default)]
    struct RecordingWriter {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingWriter {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LineWriter for RecordingWriter {
        async fn write_line(&mut self, line: &str) -> Result<()> {
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    struct Fixture {
        gpio: Arc<SimulatedGpio>,
        bank: RelayBank,
        settings: Settings,
        link: Arc<MockLink>,
        writer: RecordingWriter,
    }

    impl Fixture {
        fn new() -> Self {
            let gpio = Arc::new(SimulatedGpio::new());
            Self {
                bank: RelayBank::new(gpio.clone()),
                gpio,
                settings: Settings::new(Arc::new(MemoryStore::new())),
                link: Arc::new(MockLink::new(true)),
                writer: RecordingWriter::default(),
            }
        }

        async fn run(&self, commands: Vec<Command>) {
            let (tx, rx) = mpsc::channel(limits::COMMAND_QUEUE_CAPACITY);
            for command in commands {
                tx.send(command).await.expect("enqueue failed");
            }
            drop(tx);

            let dispatcher = Dispatcher::new(
                self.bank.clone(),
                StatusLed::new(self.gpio.clone()),
                self.settings.clone(),
                self.link.clone(),
                Box::new(self.writer.clone()),
            );
            dispatcher.run(rx).await;
        }
    }

    #[tokio::test]
    async fn test_relay_and_led_commands_actuate() {
        let fixture = Fixture::new();
        fixture
            .run(vec![
                Command::SetRelay(RelayId::One, true),
                Command::SetLed(true),
            ])
            .await;

        assert!(fixture.bank.is_energized(RelayId::One));
        assert_eq!(fixture.gpio.level(pins::STATUS_LED), Some(true));
        assert!(fixture.writer.lines().is_empty(), "actuation has no response");
    }

    #[tokio::test]
    async fn test_settings_roundtrip_over_serial() {
        let fixture = Fixture::new();
        fixture
            .run(vec![
                Command::QueryRemoteUrl,
                Command::SetRemoteUrl("http://example.com/api/relay".into()),
                Command::QueryRemoteUrl,
                Command::SetWifiField(WifiField::Ssid, "MyHomeAP".into()),
                Command::QueryWifiField(WifiField::Ssid),
            ])
            .await;

        assert_eq!(
            fixture.writer.lines(),
            vec![
                "NOT_SET",
                "OK",
                "http://example.com/api/relay",
                "OK",
                "MyHomeAP",
            ]
        );
    }

    #[tokio::test]
    async fn test_password_query_is_masked() {
        let fixture = Fixture::new();
        fixture
            .run(vec![
                Command::SetWifiField(WifiField::Password, "abcdefgh".into()),
                Command::QueryWifiField(WifiField::Password),
            ])
            .await;

        assert_eq!(fixture.writer.lines(), vec!["OK", "abc***gh"]);
    }

    #[tokio::test]
    async fn test_completing_credentials_triggers_reconnect() {
        let fixture = Fixture::new();
        fixture
            .run(vec![
                Command::SetWifiField(WifiField::Ssid, "MyHomeAP".into()),
                Command::SetWifiField(WifiField::Password, "hunter22".into()),
            ])
            .await;

        let reconnects = fixture.link.reconnects.lock().unwrap().clone();
        assert_eq!(
            reconnects,
            vec![("MyHomeAP".to_string(), "hunter22".to_string())]
        );
    }

    #[tokio::test]
    async fn test_ip_query_reports_link_address() {
        let fixture = Fixture::new();
        fixture.run(vec![Command::QueryIp]).await;
        assert_eq!(fixture.writer.lines(), vec!["192.168.1.50"]);

        let offline = Fixture::new();
        offline.link.set_connected(false);
        offline.run(vec![Command::QueryIp]).await;
        assert_eq!(offline.writer.lines(), vec!["NOT_SET"]);
    }

    #[tokio::test]
    async fn test_unknown_command_is_a_no_op() {
        let fixture = Fixture::new();
        fixture.run(vec![Command::Unknown]).await;

        assert!(fixture.writer.lines().is_empty());
        assert!(!fixture.bank.is_energized(RelayId::One));
        assert!(!fixture.bank.is_energized(RelayId::Two));
    }
}
