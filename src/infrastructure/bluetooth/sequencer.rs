//! Programming Sequencer
//!
//! Drives one programming session:
//!
//! ```text
//! Idle ──START──▶ Started ──▶ Writing(0) ──▶ … ──▶ Writing(n-1) ──STOP──▶ Stopped ──▶ Done
//!   │                │              │                                        │
//!   └────────────────┴──────────────┴──────────── any failure ───────────────┴──▶ Failed
//! ```
//!
//! Writes are strictly sequential. Entry `i + 1` is not started until both
//! the key and the value of entry `i` were acknowledged. A failed write ends
//! the session without a STOP write.

use crate::domain::models::{IrCodeEntry, Phase, Role};
use crate::infrastructure::bluetooth::error::SequenceError;
use crate::infrastructure::bluetooth::protocol::{ProgrammingCommand, Timing};
use crate::infrastructure::bluetooth::transport::{
    CharacteristicWriter, Endpoint, Endpoints, WriteTransport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Set from a signal handler; checked before every write
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of a completed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    pub entries: usize,
    pub writes: usize,
    pub elapsed: Duration,
}

pub struct ProgrammingSequencer<W> {
    transport: WriteTransport<W>,
    endpoints: Endpoints,
    table: Vec<IrCodeEntry>,
    timing: Timing,
    interrupt: Interrupt,
    phase: Phase,
    writes: usize,
}

impl<W: CharacteristicWriter> ProgrammingSequencer<W> {
    pub fn new(
        transport: WriteTransport<W>,
        endpoints: Endpoints,
        table: Vec<IrCodeEntry>,
        timing: Timing,
    ) -> Self {
        Self {
            transport,
            endpoints,
            table,
            timing,
            interrupt: Interrupt::new(),
            phase: Phase::Idle,
            writes: 0,
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn transport(&self) -> &WriteTransport<W> {
        &self.transport
    }

    /// Run the whole session. The connection is left open either way.
    pub async fn run(&mut self) -> Result<SequenceReport, SequenceError> {
        let started_at = Instant::now();

        if self.table.is_empty() {
            self.phase = Phase::Failed;
            return Err(SequenceError::EmptyTable);
        }

        self.start().await?;
        for index in 0..self.table.len() {
            self.write_entry(index).await?;
        }
        self.stop().await?;

        self.phase = Phase::Done;
        Ok(SequenceReport {
            entries: self.table.len(),
            writes: self.writes,
            elapsed: started_at.elapsed(),
        })
    }

    async fn start(&mut self) -> Result<(), SequenceError> {
        info!("Start programming (START)");
        let endpoint = self.endpoints.startstop.clone();
        self.write(&endpoint, ProgrammingCommand::Enable.as_bytes())
            .await?;
        self.phase = Phase::Started;
        tokio::time::sleep(self.timing.start_settle()).await;
        Ok(())
    }

    async fn write_entry(&mut self, index: usize) -> Result<(), SequenceError> {
        self.phase = Phase::Writing(index);
        let entry = self.table[index].clone();
        let (key_endpoint, value_endpoint) =
            (self.endpoints.key.clone(), self.endpoints.value.clone());

        info!(
            "[{}/{}] write key {} {}",
            index + 1,
            self.table.len(),
            hex::encode(&entry.key),
            entry.name
        );
        self.write(&key_endpoint, &entry.key).await?;
        tokio::time::sleep(self.timing.key_latch()).await;

        info!(
            "[{}/{}] write value ({} bytes)",
            index + 1,
            self.table.len(),
            entry.value.len()
        );
        self.write(&value_endpoint, &entry.value).await?;
        tokio::time::sleep(self.timing.value_commit()).await;

        info!("[{}/{}] OK", index + 1, self.table.len());
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SequenceError> {
        info!("Disable programming (STOP)");
        let endpoint = self.endpoints.startstop.clone();
        self.write(&endpoint, ProgrammingCommand::Disable.as_bytes())
            .await?;
        self.phase = Phase::Stopped;
        tokio::time::sleep(self.timing.stop_settle()).await;
        Ok(())
    }

    /// Checks for an interrupt, then performs one write. Any failure moves
    /// the session to `Failed`.
    async fn write(&mut self, endpoint: &Endpoint, value: &[u8]) -> Result<(), SequenceError> {
        let phase = self.phase_for(endpoint.role);

        if self.interrupt.is_triggered() {
            self.phase = Phase::Failed;
            if self.writes == 0 {
                warn!("Interrupted before START, nothing was written");
                return Err(SequenceError::Interrupted { phase: Phase::Idle });
            }
            warn!(
                "Interrupted during {}; STOP not sent, the remote may remain in programming mode",
                phase
            );
            return Err(SequenceError::Interrupted { phase });
        }

        match self.transport.write(endpoint, value).await {
            Ok(()) => {
                self.writes += 1;
                Ok(())
            }
            Err(cause) => {
                self.phase = Phase::Failed;
                error!("{} failed on {} write: {}", phase, endpoint.role, cause);
                Err(SequenceError::Write {
                    phase,
                    role: endpoint.role,
                    cause,
                })
            }
        }
    }

    /// Phase a write to `role` belongs to, given the current state
    fn phase_for(&self, role: Role) -> Phase {
        match (self.phase, role) {
            (Phase::Idle, _) => Phase::Started,
            (Phase::Writing(_), Role::StartStop) => Phase::Stopped,
            (phase, _) => phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::resolver::fixtures::{KEY_PATH, STARTSTOP_PATH, VALUE_PATH};
    use crate::infrastructure::bluetooth::error::TransportFailure;
    use crate::infrastructure::bluetooth::transport::testing::RecordingWriter;

    fn endpoints() -> Endpoints {
        Endpoints {
            startstop: Endpoint {
                role: Role::StartStop,
                path: STARTSTOP_PATH.into(),
            },
            key: Endpoint {
                role: Role::Key,
                path: KEY_PATH.into(),
            },
            value: Endpoint {
                role: Role::Value,
                path: VALUE_PATH.into(),
            },
        }
    }

    fn table(n: u8) -> Vec<IrCodeEntry> {
        (1..=n)
            .map(|i| IrCodeEntry::new(&format!("code{i}"), &[0x00, i], &[0xa0 + i, 0xff]))
            .collect()
    }

    fn sequencer(writer: RecordingWriter, n: u8, timing: Timing) -> ProgrammingSequencer<RecordingWriter> {
        ProgrammingSequencer::new(
            WriteTransport::new(writer, Duration::from_secs(5)),
            endpoints(),
            table(n),
            timing,
        )
    }

    /// Labels writes as START, key1, value1, ..., STOP
    fn labels(writes: &[(String, Vec<u8>)]) -> Vec<String> {
        writes
            .iter()
            .map(|(path, value)| match path.as_str() {
                STARTSTOP_PATH if value == &[0x01] => "START".to_string(),
                STARTSTOP_PATH if value == &[0x00] => "STOP".to_string(),
                KEY_PATH => format!("key{}", value[1]),
                VALUE_PATH => format!("value{}", value[0] - 0xa0),
                other => panic!("unexpected write to {other}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_full_run_interleaving() {
        let mut seq = sequencer(RecordingWriter::new(), 4, Timing::immediate());
        let report = seq.run().await.unwrap();

        assert_eq!(
            labels(&seq.transport().writer().writes()),
            vec![
                "START", "key1", "value1", "key2", "value2", "key3", "value3", "key4", "value4",
                "STOP"
            ]
        );
        assert_eq!(report.entries, 4);
        assert_eq!(report.writes, 10);
        assert_eq!(seq.phase(), Phase::Done);
    }

    #[tokio::test]
    async fn test_value_failure_skips_stop() {
        // START, key1, value1, key2 succeed; value2 is the fifth write
        let mut seq = sequencer(RecordingWriter::failing_at(4), 4, Timing::immediate());
        let err = seq.run().await.unwrap_err();

        assert_eq!(
            labels(&seq.transport().writer().writes()),
            vec!["START", "key1", "value1", "key2"]
        );
        assert!(matches!(
            err,
            SequenceError::Write {
                phase: Phase::Writing(1),
                role: Role::Value,
                ..
            }
        ));
        assert_eq!(seq.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_start_failure_writes_nothing_else() {
        let mut seq = sequencer(RecordingWriter::failing_at(0), 4, Timing::immediate());
        let err = seq.run().await.unwrap_err();

        assert!(seq.transport().writer().writes().is_empty());
        assert!(matches!(
            err,
            SequenceError::Write {
                phase: Phase::Started,
                role: Role::StartStop,
                ..
            }
        ));
        assert_eq!(seq.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_stop_failure_is_reported() {
        let mut seq = sequencer(RecordingWriter::failing_at(5), 2, Timing::immediate());
        let err = seq.run().await.unwrap_err();

        assert_eq!(seq.transport().writer().writes().len(), 5);
        assert!(matches!(
            err,
            SequenceError::Write {
                phase: Phase::Stopped,
                role: Role::StartStop,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_table_is_rejected() {
        let mut seq = sequencer(RecordingWriter::new(), 0, Timing::immediate());
        assert_eq!(seq.run().await.unwrap_err(), SequenceError::EmptyTable);
        assert!(seq.transport().writer().writes().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_stops_before_next_write() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let mut seq =
            sequencer(RecordingWriter::new(), 2, Timing::immediate()).with_interrupt(interrupt);

        let err = seq.run().await.unwrap_err();
        assert_eq!(err, SequenceError::Interrupted { phase: Phase::Idle });
        assert!(err.to_string().contains("nothing was written"));
        assert!(seq.transport().writer().writes().is_empty());
    }

    /// Triggers the interrupt once `after` writes went through
    struct InterruptingWriter {
        inner: RecordingWriter,
        interrupt: Interrupt,
        after: usize,
    }

    #[async_trait::async_trait]
    impl CharacteristicWriter for InterruptingWriter {
        async fn write_value(
            &self,
            path: &str,
            value: &[u8],
        ) -> Result<(), crate::infrastructure::bluetooth::error::TransportError> {
            self.inner.write_value(path, value).await?;
            if self.inner.writes().len() == self.after {
                self.interrupt.trigger();
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_interrupt_mid_run_skips_stop() {
        let interrupt = Interrupt::new();
        let writer = InterruptingWriter {
            inner: RecordingWriter::new(),
            interrupt: interrupt.clone(),
            after: 3,
        };
        let mut seq = ProgrammingSequencer::new(
            WriteTransport::new(writer, Duration::from_secs(5)),
            endpoints(),
            table(3),
            Timing::immediate(),
        )
        .with_interrupt(interrupt);

        let err = seq.run().await.unwrap_err();
        assert_eq!(err, SequenceError::Interrupted { phase: Phase::Writing(1) });
        assert!(err.to_string().contains("STOP was not sent"));
        assert_eq!(
            labels(&seq.transport().writer().inner.writes()),
            vec!["START", "key1", "value1"]
        );
        assert_eq!(seq.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_key_failure_skips_stop() {
        // key3 is the sixth write
        let mut seq = sequencer(RecordingWriter::failing_at(5), 4, Timing::immediate());
        let err = seq.run().await.unwrap_err();

        assert_eq!(
            labels(&seq.transport().writer().writes()),
            vec!["START", "key1", "value1", "key2", "value2"]
        );
        assert!(matches!(
            err,
            SequenceError::Write {
                phase: Phase::Writing(2),
                role: Role::Key,
                ..
            }
        ));
        assert_eq!(seq.phase(), Phase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unacknowledged_write_fails_session() {
        // value1 never completes
        let mut seq = sequencer(RecordingWriter::hanging_at(2), 2, Timing::default());
        let err = seq.run().await.unwrap_err();

        assert_eq!(
            labels(&seq.transport().writer().writes()),
            vec!["START", "key1"]
        );
        match err {
            SequenceError::Write {
                phase: Phase::Writing(0),
                role: Role::Value,
                cause,
            } => assert_eq!(cause.reason, TransportFailure::Timeout(Duration::from_secs(5))),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(seq.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_repeated_runs_issue_identical_writes() {
        let mut first = sequencer(RecordingWriter::new(), 3, Timing::immediate());
        let mut second = sequencer(RecordingWriter::new(), 3, Timing::immediate());
        first.run().await.unwrap();
        second.run().await.unwrap();

        assert_eq!(
            first.transport().writer().writes(),
            second.transport().writer().writes()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_follow_timing() {
        let timing = Timing::default();
        let mut seq = sequencer(RecordingWriter::new(), 4, timing);

        let report = seq.run().await.unwrap();
        assert_eq!(report.elapsed, timing.total_for(4));
        assert_eq!(report.elapsed, Duration::from_millis(250 + 4 * (180 + 350) + 200));
    }
}
