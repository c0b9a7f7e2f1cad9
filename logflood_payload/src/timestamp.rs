//! Fixed-width record timestamps.

use std::{fmt, time::SystemTime};

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

// Close to RFC 3339 with nanoseconds, but trailing zeros of the fraction are
// kept and the offset is always numeric. Every rendering has the same width.
const FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9][offset_hour sign:mandatory]:[offset_minute]"
);

/// Width in bytes of every rendered [`Timestamp`].
pub const WIDTH: usize = 35;

/// The instant a record was produced, rendered in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// A timestamp of the same width as any real one, used to measure record
    /// size without depending on the wall clock.
    pub const PLACEHOLDER: Self = Self(OffsetDateTime::UNIX_EPOCH);

    /// The current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Render the timestamp as it appears in a record.
    ///
    /// # Errors
    ///
    /// Function will error if the instant cannot be formatted.
    pub fn render(&self) -> Result<String, Error> {
        Ok(self.0.format(FORMAT)?)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(value: SystemTime) -> Self {
        Self(OffsetDateTime::from(value))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, SystemTime};

    use super::{Timestamp, WIDTH};

    #[test]
    fn placeholder_renders_epoch() {
        assert_eq!(
            Timestamp::PLACEHOLDER.to_string(),
            "1970-01-01T00:00:00.000000000+00:00"
        );
    }

    #[test]
    fn trailing_zeros_are_kept() {
        let ts = Timestamp::from(SystemTime::UNIX_EPOCH + Duration::from_millis(1_500));
        assert_eq!(ts.to_string(), "1970-01-01T00:00:01.500000000+00:00");
    }

    #[test]
    fn width_is_fixed() {
        assert_eq!(Timestamp::PLACEHOLDER.to_string().len(), WIDTH);
        assert_eq!(Timestamp::now().to_string().len(), WIDTH);
        let ts = Timestamp::from(SystemTime::UNIX_EPOCH + Duration::new(1_700_000_000, 123));
        assert_eq!(ts.to_string(), "2023-11-14T22:13:20.000000123+00:00");
    }

    #[test]
    fn render_matches_display() {
        let ts = Timestamp::from(SystemTime::UNIX_EPOCH + Duration::new(86_400, 42));
        let rendered = ts.render().expect("in-range instant renders");
        assert_eq!(rendered, ts.to_string());
        assert_eq!(rendered.len(), WIDTH);
    }
}
