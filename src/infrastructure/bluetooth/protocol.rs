//! IR Remote Programming Protocol
//!
//! This module contains the protocol definitions for programming the
//! remote's IR table through BlueZ

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// BlueZ well-known bus name
pub const BLUEZ_BUS_NAME: &str = "org.bluez";

/// Default adapter object path
pub const ADAPTER_PATH: &str = "/org/bluez/hci0";

pub const DEVICE_INTERFACE: &str = "org.bluez.Device1";
pub const GATT_CHARACTERISTIC_INTERFACE: &str = "org.bluez.GattCharacteristic1";

/// START/STOP Characteristic UUID - enables and disables programming mode
pub const STARTSTOP_CHAR_UUID: Uuid = Uuid::from_u128(0xd343bfc1_5a21_4f05_bc7d_af01f617b664);

/// Key Characteristic UUID - selects the button slot being programmed
pub const KEY_CHAR_UUID: Uuid = Uuid::from_u128(0xd343bfc2_5a21_4f05_bc7d_af01f617b664);

/// Value Characteristic UUID - receives the IR waveform for the selected slot
pub const VALUE_CHAR_UUID: Uuid = Uuid::from_u128(0xd343bfc3_5a21_4f05_bc7d_af01f617b664);

/// Programming mode markers written to START/STOP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgrammingCommand {
    Enable,
    Disable,
}

impl ProgrammingCommand {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Self::Enable => &[0x01],
            Self::Disable => &[0x00],
        }
    }
}

/// Settle and commit windows required by the remote's flash-backed firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Wait after START before anything else is written
    #[serde(default = "default_start_settle_ms")]
    pub start_settle_ms: u64,
    /// Wait after a key write so the device latches the slot
    #[serde(default = "default_key_latch_ms")]
    pub key_latch_ms: u64,
    /// Wait after a value write so the device commits it to flash
    #[serde(default = "default_value_commit_ms")]
    pub value_commit_ms: u64,
    /// Wait after STOP
    #[serde(default = "default_stop_settle_ms")]
    pub stop_settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            start_settle_ms: default_start_settle_ms(),
            key_latch_ms: default_key_latch_ms(),
            value_commit_ms: default_value_commit_ms(),
            stop_settle_ms: default_stop_settle_ms(),
        }
    }
}

impl Timing {
    /// No waits at all
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            start_settle_ms: 0,
            key_latch_ms: 0,
            value_commit_ms: 0,
            stop_settle_ms: 0,
        }
    }

    pub fn start_settle(&self) -> Duration {
        Duration::from_millis(self.start_settle_ms)
    }

    pub fn key_latch(&self) -> Duration {
        Duration::from_millis(self.key_latch_ms)
    }

    pub fn value_commit(&self) -> Duration {
        Duration::from_millis(self.value_commit_ms)
    }

    pub fn stop_settle(&self) -> Duration {
        Duration::from_millis(self.stop_settle_ms)
    }

    /// Total time spent waiting for a table of `entries` codes
    pub fn total_for(&self, entries: usize) -> Duration {
        self.start_settle()
            + (self.key_latch() + self.value_commit()) * entries as u32
            + self.stop_settle()
    }
}

fn default_start_settle_ms() -> u64 {
    250
}
fn default_key_latch_ms() -> u64 {
    180
}
fn default_value_commit_ms() -> u64 {
    350
}
fn default_stop_settle_ms() -> u64 {
    200
}

/// Bounded wait for a write acknowledgement
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;
