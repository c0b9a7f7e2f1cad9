//! Wrapping record sequence numbers.

use std::fmt;

/// Sequence values live in `[0, SEQUENCE_MODULUS)`. Six decimal digits.
pub const SEQUENCE_MODULUS: u32 = 1_000_000;

/// Position of a record within a run, rendered as a six digit zero-padded
/// string.
///
/// A run starts at [`Sequence::FIRST`] and every emitted record advances the
/// counter with [`Sequence::next`], so `999999` is followed by `000000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sequence(u32);

impl Sequence {
    /// The smallest representable sequence value.
    pub const MIN: Self = Self(0);
    /// The sequence value of the first record of a run.
    pub const FIRST: Self = Self(1);

    /// Create a sequence value, reducing `value` modulo [`SEQUENCE_MODULUS`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(value: u64) -> Self {
        // The remainder is below SEQUENCE_MODULUS and always fits a u32.
        Self((value % u64::from(SEQUENCE_MODULUS)) as u32)
    }

    /// The numeric value, always below [`SEQUENCE_MODULUS`].
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// The value following this one, wrapping to zero.
    #[must_use]
    pub fn next(self) -> Self {
        Self((self.0 + 1) % SEQUENCE_MODULUS)
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

// Serialized as a string, a number would lose the leading zeros.
impl serde::Serialize for Sequence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::{SEQUENCE_MODULUS, Sequence};

    #[test]
    fn wraps_to_zero() {
        let last = Sequence::new(999_999);
        assert_eq!(last.to_string(), "999999");
        assert_eq!(last.next(), Sequence::MIN);
        assert_eq!(last.next().to_string(), "000000");
    }

    #[test]
    fn run_starts_at_one() {
        assert_eq!(Sequence::default().to_string(), "000001");
        assert_eq!(Sequence::default().next().to_string(), "000002");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Sequence::new(42)).expect("serializes");
        assert_eq!(json, r#""000042""#);
    }

    proptest! {
        #[test]
        fn always_six_digits(value in any::<u64>()) {
            let seq = Sequence::new(value);
            let rendered = seq.to_string();
            prop_assert_eq!(rendered.len(), 6);
            prop_assert!(rendered.bytes().all(|b| b.is_ascii_digit()));
            prop_assert!(seq.get() < SEQUENCE_MODULUS);
            prop_assert_eq!(u64::from(seq.get()), value % u64::from(SEQUENCE_MODULUS));
        }

        #[test]
        fn next_agrees_with_modulus(value in 0..SEQUENCE_MODULUS) {
            let seq = Sequence::new(u64::from(value));
            prop_assert_eq!(seq.next(), Sequence::new(u64::from(value) + 1));
        }
    }
}
