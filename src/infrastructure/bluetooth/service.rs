//! Programming Service Module
//!
//! Main service that coordinates device checks, characteristic resolution
//! and the programming sequence for one remote.

use crate::domain::models::IrCodeEntry;
use crate::infrastructure::bluetooth::connection::DeviceBus;
use crate::infrastructure::bluetooth::error::{ProgrammerError, SessionError};
use crate::infrastructure::bluetooth::object_tree::PropertyValue;
use crate::infrastructure::bluetooth::protocol::{Timing, DEVICE_INTERFACE};
use crate::infrastructure::bluetooth::resolver::{resolve_endpoints, CharacteristicUuids};
use crate::infrastructure::bluetooth::sequencer::{Interrupt, ProgrammingSequencer, SequenceReport};
use crate::infrastructure::bluetooth::transport::{Endpoints, WriteTransport};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything a programming run is parameterised by
#[derive(Debug, Clone)]
pub struct ProgrammingConfig {
    pub uuids: CharacteristicUuids,
    pub timing: Timing,
    pub write_timeout: Duration,
    pub code_table: Vec<IrCodeEntry>,
    /// Resolve characteristics but write nothing
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramOutcome {
    Programmed {
        endpoints: Endpoints,
        report: SequenceReport,
    },
    DryRun {
        endpoints: Endpoints,
    },
}

/// Main service coordinating a programming run
pub struct ProgrammingService<B> {
    bus: B,
    config: ProgrammingConfig,
    interrupt: Interrupt,
}

impl<B: DeviceBus> ProgrammingService<B> {
    pub fn new(bus: B, config: ProgrammingConfig) -> Self {
        Self {
            bus,
            config,
            interrupt: Interrupt::new(),
        }
    }

    /// Handle that aborts the run before its next write
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Program the remote at `device_path`. The link is left open afterwards.
    pub async fn program(&self, device_path: &str) -> Result<ProgramOutcome, ProgrammerError> {
        info!("Device path: {}", device_path);

        if !self.bus.is_device_connected(device_path).await? {
            return Err(SessionError::DeviceNotConnected {
                path: device_path.to_string(),
            }
            .into());
        }

        let tree = self.bus.fetch_object_tree().await?;
        if tree.is_empty() {
            warn!("BlueZ reports no managed objects");
        }
        if let Some(name) = tree
            .property(device_path, DEVICE_INTERFACE, "Name")
            .and_then(PropertyValue::as_str)
        {
            info!("Remote name: {}", name);
        }
        let endpoints = resolve_endpoints(&tree, device_path, &self.config.uuids)?;

        if self.config.dry_run {
            info!(
                "Dry run: would write {} code(s), no writes issued",
                self.config.code_table.len()
            );
            return Ok(ProgramOutcome::DryRun { endpoints });
        }

        let transport = WriteTransport::new(self.bus.writer(), self.config.write_timeout);
        let mut sequencer = ProgrammingSequencer::new(
            transport,
            endpoints.clone(),
            self.config.code_table.clone(),
            self.config.timing,
        )
        .with_interrupt(self.interrupt.clone());

        let result = sequencer.run().await;
        debug!("Session ended: {}", sequencer.phase());
        let report = result?;
        info!(
            "Programming complete: {} code(s), {} writes in {:?}",
            report.entries, report.writes, report.elapsed
        );

        Ok(ProgramOutcome::Programmed { endpoints, report })
    }
}
