//! Relay actuation authority
//!
//! [`RelayBank`] owns the authoritative per-relay state. Local dispatch,
//! remote directives, web handlers and auto-off timers all funnel through
//! [`RelayBank::energize`]; the slot mutex is the only guard those paths
//! share. Auto-off timers are fire-and-forget tasks that carry a generation
//! token: any newer actuation of the same relay bumps the generation, so a
//! superseded timer stands down instead of forcing the relay off.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};
use webrelay_shared::RelayId;

use crate::gpio::{pins, GpioSet};

#[derive(Debug, Default, Clone, Copy)]
struct RelaySlot {
    energized: bool,
    /// Bumped on every actuation; a pending auto-off only fires while the
    /// generation still matches the value it was armed under.
    generation: u64,
}

/// Authoritative owner of both relay outputs
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct RelayBank {
    inner: Arc<Inner>,
}

struct Inner {
    slots: Mutex<[RelaySlot; 2]>,
    gpio: Arc<dyn GpioSet>,
}

impl RelayBank {
    pub fn new(gpio: Arc<dyn GpioSet>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new([RelaySlot::default(); 2]),
                gpio,
            }),
        }
    }

    /// Assert the requested output level, even when already in that state.
    ///
    /// Supersedes any pending auto-off for the relay.
    pub fn energize(&self, relay: RelayId, on: bool) {
        self.inner.energize(relay, on);
    }

    /// Current logical state of a relay
    pub fn is_energized(&self, relay: RelayId) -> bool {
        self.inner.slots.lock().unwrap()[relay.index()].energized
    }

    /// Arm a one-shot auto-off that de-energizes the relay after `delay`,
    /// unless a newer actuation supersedes it first.
    pub fn schedule_auto_off(&self, relay: RelayId, delay: Duration) {
        let token = self.inner.slots.lock().unwrap()[relay.index()].generation;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.auto_off(relay, token);
        });
        info!(%relay, delay_ms = delay.as_millis() as u64, "auto-off armed");
    }
}

impl Inner {
    fn pin(relay: RelayId) -> u8 {
        match relay {
            RelayId::One => pins::RELAY_1,
            RelayId::Two => pins::RELAY_2,
        }
    }

    fn energize(&self, relay: RelayId, on: bool) {
        let mut slots = self.slots.lock().unwrap();
        let slot = &mut slots[relay.index()];
        slot.energized = on;
        slot.generation += 1;
        self.gpio.set_level(Self::pin(relay), on);
        info!(%relay, on, "relay driven");
    }

    fn auto_off(&self, relay: RelayId, token: u64) {
        let mut slots = self.slots.lock().unwrap();
        let slot = &mut slots[relay.index()];
        if slot.generation != token {
            debug!(%relay, "auto-off superseded, standing down");
            return;
        }
        slot.energized = false;
        slot.generation += 1;
        self.gpio.set_level(Self::pin(relay), false);
        info!(%relay, "auto-off fired");
    }
}

/// Status LED output
pub struct StatusLed {
    gpio: Arc<dyn GpioSet>,
}

impl StatusLed {
    pub fn new(gpio: Arc<dyn GpioSet>) -> Self {
        Self { gpio }
    }

    pub fn set(&self, on: bool) {
        self.gpio.set_level(pins::STATUS_LED, on);
    }
}
