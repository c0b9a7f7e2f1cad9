//! Record padding.
//!
//! The filler brings a record up to an exact byte size. It is measured once
//! against a baseline record and reused unmodified by every record of a run.
//! Timestamp and sequence always render at the same width, so the baseline is
//! representative of every later record.

use std::sync::Arc;

use crate::{Error, Record};

/// Repeated to fill a record. The trailing space keeps words apart for
/// tokenizing backends.
pub const FILLER_TOKEN: &str = "some data ";

/// The padding shared by every record of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filler {
    inner: Arc<str>,
}

impl Filler {
    /// Compute the filler that makes a record with `run_id` exactly
    /// `record_size` bytes long.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeTooSmall`] if a record with no filler at all is
    /// already longer than `record_size`.
    pub fn new(record_size: usize, run_id: Option<&str>) -> Result<Self, Error> {
        let minimum = Record::baseline(run_id).encoded_len()?;
        if minimum > record_size {
            return Err(Error::SizeTooSmall {
                minimum,
                requested: record_size,
            });
        }

        Ok(Self {
            inner: build(record_size - minimum).into(),
        })
    }

    /// The filler text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Length of the filler in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the filler is empty, as happens when the record size equals
    /// the baseline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Whole copies of [`FILLER_TOKEN`] followed by a prefix of it, `bytes` long
/// in total.
fn build(bytes: usize) -> String {
    let token_len = FILLER_TOKEN.len();
    let mut filler = String::with_capacity(bytes);
    for _ in 0..(bytes / token_len) {
        filler.push_str(FILLER_TOKEN);
    }
    filler.push_str(&FILLER_TOKEN[..bytes % token_len]);
    filler
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use crate::{Error, Filler, Record, Sequence, Timestamp, padding::FILLER_TOKEN};

    const BASELINE: usize = 70;
    const BASELINE_WITH_TEST_ID: usize = 86;

    #[test]
    fn six_whole_tokens() {
        let filler = Filler::new(BASELINE + 60, None).expect("size is achievable");
        assert_eq!(filler.len(), 60);
        assert_eq!(filler.as_str(), FILLER_TOKEN.repeat(6));
    }

    #[test]
    fn remainder_is_token_prefix() {
        let filler = Filler::new(BASELINE + 23, None).expect("size is achievable");
        assert_eq!(filler.as_str(), "some data some data som");
    }

    #[test]
    fn exact_baseline_is_empty() {
        let filler = Filler::new(BASELINE_WITH_TEST_ID, Some("test")).expect("size is achievable");
        assert!(filler.is_empty());
    }

    #[test]
    fn one_byte_short_fails() {
        match Filler::new(BASELINE - 1, None) {
            Err(Error::SizeTooSmall { minimum, requested }) => {
                assert_eq!(minimum, BASELINE);
                assert_eq!(requested, BASELINE - 1);
            }
            other => panic!("expected SizeTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn run_id_counts_against_budget() {
        assert!(Filler::new(BASELINE, Some("test")).is_err());
    }

    #[test]
    fn default_record_size() {
        let filler = Filler::new(1024, Some("test")).expect("size is achievable");
        let record = Record::new(Timestamp::now(), Some("test"), Sequence::FIRST, filler.as_str());
        assert_eq!(record.encoded_len().expect("record renders"), 1024);
    }

    proptest! {
        #[test]
        fn rendered_record_is_exact_size(
            extra in 0..16_384usize,
            run_id in proptest::option::of("[ -~]{0,32}"),
            seq in any::<u64>(),
        ) {
            let minimum = Record::baseline(run_id.as_deref()).encoded_len().expect("record renders");
            let record_size = minimum + extra;
            let filler = Filler::new(record_size, run_id.as_deref()).expect("size is achievable");
            prop_assert_eq!(filler.len(), extra);

            let record = Record::new(Timestamp::now(), run_id.as_deref(), Sequence::new(seq), filler.as_str());
            prop_assert_eq!(record.encoded_len().expect("record renders"), record_size);
        }

        #[test]
        fn undersized_record_fails(
            short in 1..64usize,
            run_id in proptest::option::of("[a-z0-9-]{0,16}"),
        ) {
            let minimum = Record::baseline(run_id.as_deref()).encoded_len().expect("record renders");
            let result = Filler::new(minimum.saturating_sub(short), run_id.as_deref());
            let is_too_small = matches!(result, Err(Error::SizeTooSmall { .. }));
            prop_assert!(is_too_small);
        }

        #[test]
        fn filler_is_deterministic(extra in 0..4_096usize) {
            let a = Filler::new(BASELINE + extra, None).expect("size is achievable");
            let b = Filler::new(BASELINE + extra, None).expect("size is achievable");
            prop_assert_eq!(a, b);
        }
    }
}
