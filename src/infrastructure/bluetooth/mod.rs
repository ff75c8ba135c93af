//! Bluetooth Module
//!
//! Programs the IR table of a BLE remote through BlueZ.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   ProgrammingService                     │
//! │  (Main coordinator - public API for the application)     │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼──────────────┐
//!         │             │              │
//!         ▼             ▼              ▼
//! ┌────────────┐  ┌────────────┐  ┌────────────┐
//! │ Connection │  │  Resolver  │  │ Sequencer  │
//! │            │  │            │  │            │
//! │ - D-Bus    │  │ - Scanner  │  │ - START    │
//! │ - Device1  │  │ - Object   │  │ - KEY/VALUE│
//! │ - Writes   │  │   tree     │  │ - STOP     │
//! └────────────┘  └────────────┘  └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - UUIDs, programming markers and timing
//! - [`address`] - Hardware address to device object path
//! - [`object_tree`] - Managed-object snapshot
//! - [`scanner`] - Characteristic lookup in the snapshot
//! - [`resolver`] - Role to characteristic resolution
//! - [`transport`] - Timed characteristic writes
//! - [`sequencer`] - The programming state machine
//! - [`connection`] - BlueZ bus session
//! - [`service`] - Main service coordinator

pub mod address;
pub mod connection;
pub mod error;
pub mod object_tree;
pub mod protocol;
pub mod resolver;
pub mod scanner;
pub mod sequencer;
pub mod service;
pub mod transport;

// Re-export main service for convenience
pub use service::ProgrammingService;
