//! Record formatting.
//!
//! A record is a flat JSON object on a single line:
//!
//! ```text
//! {"ts":"2024-01-02T03:04:05.000000000+00:00","run_id":"test","seq":"000001","_data":"some data some"}
//! ```
//!
//! The `run_id` key is left out when no run identifier is configured. The
//! filler sits under `_data`, the leading underscore telling search backends
//! not to analyze the field. The record delimiter is not part of the record.

use std::io::Write;

use serde::Serialize;

use crate::{Error, Sequence, Timestamp};

/// One log record, borrowing its run-wide fields.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    ts: Timestamp,
    run_id: Option<&'a str>,
    seq: Sequence,
    data: &'a str,
}

// Wire shape of a record, with the timestamp already rendered.
#[derive(Serialize)]
struct Encoded<'a> {
    ts: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<&'a str>,
    seq: Sequence,
    #[serde(rename = "_data")]
    data: &'a str,
}

impl<'a> Record<'a> {
    /// Create a new record.
    #[must_use]
    pub fn new(ts: Timestamp, run_id: Option<&'a str>, seq: Sequence, data: &'a str) -> Self {
        Self {
            ts,
            run_id,
            seq,
            data,
        }
    }

    /// The smallest record a run with `run_id` can produce: placeholder
    /// timestamp, lowest sequence and no filler.
    #[must_use]
    pub fn baseline(run_id: Option<&'a str>) -> Self {
        Self::new(Timestamp::PLACEHOLDER, run_id, Sequence::MIN, "")
    }

    /// Write the record into `writer`, without a delimiter.
    ///
    /// # Errors
    ///
    /// Function will error if the timestamp cannot be rendered, the writer
    /// fails or the record cannot be encoded.
    pub fn to_bytes<W>(&self, writer: &mut W) -> Result<(), Error>
    where
        W: Write,
    {
        let ts = self.ts.render()?;
        let encoded = Encoded {
            ts: &ts,
            run_id: self.run_id,
            seq: self.seq,
            data: self.data,
        };
        serde_json::to_writer(writer, &encoded)?;
        Ok(())
    }

    /// The length in bytes of the rendered record.
    ///
    /// # Errors
    ///
    /// See [`Record::to_bytes`].
    pub fn encoded_len(&self) -> Result<usize, Error> {
        let mut buf = Vec::with_capacity(128 + self.data.len());
        self.to_bytes(&mut buf)?;
        Ok(buf.len())
    }
}
