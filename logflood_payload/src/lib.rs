//! The logflood payloads
//!
//! This library renders the fixed-size log records emitted by logflood. A
//! [`Filler`] is computed once per run so that every [`Record`] rendered with
//! it occupies exactly the configured number of bytes.

#![deny(clippy::unwrap_used)]
#![allow(clippy::multiple_crate_versions)]

pub use padding::Filler;
pub use record::Record;
pub use sequence::Sequence;
pub use timestamp::Timestamp;

pub mod padding;
pub mod record;
pub mod sequence;
pub mod timestamp;

/// Errors related to record construction
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The smallest possible record is larger than the requested size. No
    /// amount of filler can fix this.
    #[error("Desired size of {requested} bytes is less than minimum size of {minimum} bytes")]
    SizeTooSmall {
        /// Length of a record with an empty filler.
        minimum: usize,
        /// The configured record size.
        requested: usize,
    },
    /// Json payload could not be encoded
    #[error("Json payload could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
    /// Timestamp could not be rendered
    #[error("Timestamp could not be rendered: {0}")]
    Timestamp(#[from] time::error::Format),
}
