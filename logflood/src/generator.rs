//! The record generator.
//!
//! The generator owns the run loop. It computes the record filler once at
//! construction, then on every tick of its throttle renders one record and
//! writes it, followed by a newline, to its writer. The run ends when the
//! deadline passes or, earlier, when its cancellation token is cancelled.
//! Both are checked between records only, a write that has started always
//! completes.
//!
//! ## Metrics
//!
//! `records_written`: Records written successfully
//! `bytes_written`: Bytes written successfully, delimiters included
//! `records_per_second`: Configured rate to emit records
//!

use std::future;

use logflood_payload::{Filler, Record, Sequence, Timestamp};
use logflood_throttle::Throttle;
use metrics::{counter, gauge};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RunConfig;

#[derive(thiserror::Error, Debug)]
/// Errors produced by [`Generator`].
pub enum Error {
    /// Record construction failed, see [`logflood_payload::Error`].
    #[error("Record error: {0}")]
    Payload(#[from] logflood_payload::Error),
    /// Writing to the output failed. The run is abandoned, writes are not
    /// retried.
    #[error("Failed to write record: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The configured duration elapsed.
    Deadline,
    /// The run was cancelled before the deadline.
    Cancelled,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Records written.
    pub records_written: u64,
    /// Bytes written, delimiters included.
    pub bytes_written: u64,
    /// Why the run ended.
    pub termination: Termination,
}

#[derive(Debug)]
/// The record generator.
///
/// Writes fixed-size records to `W` at the configured rate.
pub struct Generator<W> {
    config: RunConfig,
    filler: Filler,
    writer: W,
    metric_labels: Vec<(String, String)>,
}

impl<W> Generator<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a new [`Generator`] instance
    ///
    /// # Errors
    ///
    /// Creation will fail if the configured record size is smaller than the
    /// smallest record the configuration can produce.
    pub fn new(config: RunConfig, writer: W) -> Result<Self, Error> {
        let filler = Filler::new(config.record_size, config.run_id.as_deref())?;

        let mut metric_labels = Vec::new();
        if let Some(run_id) = &config.run_id {
            metric_labels.push(("run_id".to_string(), run_id.clone()));
        }

        Ok(Self {
            config,
            filler,
            writer,
            metric_labels,
        })
    }

    /// The filler every record of this run carries.
    #[must_use]
    pub fn filler(&self) -> &Filler {
        &self.filler
    }

    /// Run [`Generator`] until the deadline passes or `shutdown` is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Function will return an error when a record cannot be written.
    pub async fn spin(mut self, shutdown: CancellationToken) -> Result<Summary, Error> {
        let mut throttle = Throttle::new(self.config.records_per_second);
        // A duration too large to represent never fires, same as no duration.
        let deadline = self
            .config
            .duration
            .and_then(|duration| Instant::now().checked_add(duration));

        gauge!("records_per_second", &self.metric_labels)
            .set(f64::from(self.config.records_per_second.get()));
        info!(
            interval = ?throttle.interval(),
            filler_bytes = self.filler.len(),
            record_size = self.config.record_size,
            bounded = deadline.is_some(),
            "generator running"
        );

        let mut seq = Sequence::FIRST;
        let mut buffer: Vec<u8> = Vec::with_capacity(self.config.record_size + 1);
        let mut records_written: u64 = 0;
        let mut bytes_written: u64 = 0;

        let deadline_wait = expire(deadline);
        tokio::pin!(deadline_wait);
        let shutdown_wait = shutdown.cancelled();
        tokio::pin!(shutdown_wait);

        let termination = loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break Termination::Deadline;
            }
            if shutdown.is_cancelled() {
                break Termination::Cancelled;
            }

            tokio::select! {
                biased;

                () = &mut deadline_wait => {
                    break Termination::Deadline;
                }
                () = &mut shutdown_wait => {
                    break Termination::Cancelled;
                }
                () = throttle.wait() => {
                    let written = self.emit(&mut buffer, seq).await?;
                    records_written += 1;
                    bytes_written += written;
                    seq = seq.next();
                }
            }
        };

        info!(
            ?termination,
            records_written, bytes_written, "generator terminated"
        );
        Ok(Summary {
            records_written,
            bytes_written,
            termination,
        })
    }

    /// Render one record into `buffer` and write it out with its delimiter.
    /// Returns the number of bytes written.
    async fn emit(&mut self, buffer: &mut Vec<u8>, seq: Sequence) -> Result<u64, Error> {
        buffer.clear();
        Record::new(
            Timestamp::now(),
            self.config.run_id.as_deref(),
            seq,
            self.filler.as_str(),
        )
        .to_bytes(buffer)?;
        debug_assert_eq!(buffer.len(), self.config.record_size);
        buffer.push(b'\n');

        self.writer.write_all(buffer).await?;
        self.writer.flush().await?;

        let written = buffer.len() as u64;
        counter!("records_written", &self.metric_labels).increment(1);
        counter!("bytes_written", &self.metric_labels).increment(written);
        if self.config.debug {
            debug!(%seq, bytes = written, "record written");
        }
        Ok(written)
    }
}

/// Resolves once `deadline` passes, never when there is no deadline.
async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
