//! Interval throttle
//!
//! This throttle releases one unit per period on a fixed grid anchored at the
//! moment the throttle was created. Tick `n` is due at `n * period`, starting
//! with `n = 1`. A caller that falls behind is released once per missed grid
//! point, back to back, so timer granularity coarser than the period does not
//! lower the long-run rate. The backlog is bounded to one interval, grid
//! points older than that are dropped.

use std::num::NonZeroU32;

// One tick is one nanosecond, so one second holds this many ticks. This is
// also the deepest backlog a late caller may draw on.
const INTERVAL_TICKS: u64 = 1_000_000_000;

/// The non-async interior to `Throttle`, about which we can make proof
/// claims without involving a real clock.
#[derive(Debug)]
pub(crate) struct Metronome {
    /// Ticks between two releases, never zero.
    period: u64,
    /// The absolute tick at which the next release is due.
    next: u64,
}

impl Metronome {
    pub(crate) fn new(rate: NonZeroU32) -> Self {
        let period = (INTERVAL_TICKS / u64::from(rate.get())).max(1);
        Self {
            period,
            next: period,
        }
    }

    pub(crate) fn period(&self) -> u64 {
        self.period
    }

    /// For an absolute `ticks_elapsed` return how long a caller would have to
    /// wait -- in ticks -- before the next release. A return of zero means the
    /// caller is released now and the release has been consumed.
    pub(crate) fn request(&mut self, ticks_elapsed: u64) -> u64 {
        if ticks_elapsed < self.next {
            return self.next - ticks_elapsed;
        }

        // Grid points more than one interval in the past are forfeit. Move
        // `next` up to the oldest grid point still inside the window.
        let horizon = ticks_elapsed.saturating_sub(INTERVAL_TICKS);
        if self.next < horizon {
            let stale = (horizon - self.next).div_ceil(self.period);
            self.next = self
                .next
                .saturating_add(stale.saturating_mul(self.period));
        }

        // Consume exactly one grid point. Any others already due are handed
        // out on the following calls without waiting.
        self.next = self.next.saturating_add(self.period);
        0
    }
}
