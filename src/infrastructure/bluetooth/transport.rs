//! Write Transport
//!
//! One acknowledged write per call against a resolved characteristic.

use crate::domain::models::Role;
use crate::infrastructure::bluetooth::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A resolved programming characteristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub role: Role,
    pub path: String,
}

/// The three endpoints a session programs through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub startstop: Endpoint,
    pub key: Endpoint,
    pub value: Endpoint,
}

/// Issues a GATT write-with-response and waits for the stack to accept it
#[async_trait]
pub trait CharacteristicWriter: Send + Sync {
    async fn write_value(&self, path: &str, value: &[u8]) -> Result<(), TransportError>;
}

#[async_trait]
impl<W: CharacteristicWriter + ?Sized> CharacteristicWriter for Arc<W> {
    async fn write_value(&self, path: &str, value: &[u8]) -> Result<(), TransportError> {
        (**self).write_value(path, value).await
    }
}

/// Bounds every write by a timeout. No retries.
pub struct WriteTransport<W> {
    writer: W,
    timeout: Duration,
}

impl<W: CharacteristicWriter> WriteTransport<W> {
    pub fn new(writer: W, timeout: Duration) -> Self {
        Self { writer, timeout }
    }

    pub async fn write(&self, endpoint: &Endpoint, value: &[u8]) -> Result<(), TransportError> {
        debug!(
            "Writing {} byte(s) to {} ({})",
            value.len(),
            endpoint.role,
            endpoint.path
        );
        match tokio::time::timeout(self.timeout, self.writer.write_value(&endpoint.path, value))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::timeout(&endpoint.path, self.timeout)),
        }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory writer for exercising the sequencer

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingWriter {
        writes: Mutex<Vec<(String, Vec<u8>)>>,
        /// Zero-based index of the write that is rejected
        fail_at: Option<usize>,
        /// Zero-based index of the write that never completes
        hang_at: Option<usize>,
    }

    impl RecordingWriter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_at(index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Self::default()
            }
        }

        pub fn hanging_at(index: usize) -> Self {
            Self {
                hang_at: Some(index),
                ..Self::default()
            }
        }

        /// Successful writes so far
        pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CharacteristicWriter for RecordingWriter {
        async fn write_value(&self, path: &str, value: &[u8]) -> Result<(), TransportError> {
            let index = self.writes.lock().unwrap().len();
            if self.fail_at == Some(index) {
                return Err(TransportError::rejected(
                    path,
                    Some("org.bluez.Error.Failed"),
                    "Operation failed",
                ));
            }
            if self.hang_at == Some(index) {
                std::future::pending::<()>().await;
            }
            self.writes
                .lock()
                .unwrap()
                .push((path.to_string(), value.to_vec()));
            Ok(())
        }
    }
}
