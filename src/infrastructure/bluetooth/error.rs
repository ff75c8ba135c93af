//! Programming session errors
//!
//! Every variant is fatal for the run. Nothing here is retried internally;
//! the caller reruns the whole session.

use crate::domain::models::{Phase, Role};
use std::time::Duration;

/// Failures while reaching BlueZ and checking the device
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("cannot reach BlueZ on the system bus: {0}")]
    Connection(String),
    #[error("cannot fetch BlueZ managed objects: {0}")]
    Introspection(String),
    #[error("device object {path} not found on D-Bus. Is it paired/connected via bluetoothctl?")]
    DeviceNotFound { path: String },
    #[error("device {path} is not connected. Connect it (e.g. bluetoothctl connect) and run again")]
    DeviceNotConnected { path: String },
}

/// One or more programming characteristics are missing under the device
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot find {} characteristic(s) under {device_path}", role_list(.missing))]
pub struct ResolutionError {
    pub device_path: String,
    pub missing: Vec<Role>,
}

fn role_list(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn interrupt_note(phase: &Phase) -> String {
    match phase {
        Phase::Idle => "before START, nothing was written".to_string(),
        phase => format!(
            "during {phase}; STOP was not sent, the remote may still be in programming mode"
        ),
    }
}

fn name_prefix(name: &Option<String>) -> String {
    name.as_deref().map(|n| format!("{n}: ")).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    #[error("{}{message}", name_prefix(.name))]
    Rejected {
        name: Option<String>,
        message: String,
    },
    #[error("no acknowledgement within {0:?}")]
    Timeout(Duration),
}

/// A single characteristic write that failed or timed out
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("write to {path} failed: {reason}")]
pub struct TransportError {
    pub path: String,
    pub reason: TransportFailure,
}

impl TransportError {
    pub fn rejected(path: &str, name: Option<&str>, message: &str) -> Self {
        Self {
            path: path.to_string(),
            reason: TransportFailure::Rejected {
                name: name.map(str::to_string),
                message: message.to_string(),
            },
        }
    }

    pub fn timeout(path: &str, after: Duration) -> Self {
        Self {
            path: path.to_string(),
            reason: TransportFailure::Timeout(after),
        }
    }
}

/// Failure of the START → KEY/VALUE → STOP transaction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("code table is empty, nothing to program")]
    EmptyTable,
    #[error("{phase} failed on {role} write: {cause}")]
    Write {
        phase: Phase,
        role: Role,
        cause: TransportError,
    },
    #[error("interrupted {}", interrupt_note(.phase))]
    Interrupted { phase: Phase },
}

/// Any failure of a programming run
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProgrammerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}
