//! The logflood throttle mechanism
//!
//! This library turns a records-per-second target into a periodic signal for
//! the rest of the logflood project. Callers `wait` on a [`Throttle`] and are
//! released once per interval, the first release coming one interval after
//! the throttle is created. A caller that wakes late is released for every
//! tick it missed, up to one second's worth.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

use async_trait::async_trait;
use std::num::NonZeroU32;
use tokio::time::{self, Duration, Instant};

pub mod interval;

#[async_trait]
/// The `Clock` used for every throttle
pub trait Clock {
    /// The number of ticks elapsed since the clock was created. One tick is
    /// one nanosecond.
    fn ticks_elapsed(&self) -> u64;
    /// Wait for `ticks` amount of time
    async fn wait(&self, ticks: u64);
}

#[derive(Debug, Clone, Copy)]
/// A clock that operates with respect to real-clock time.
pub struct RealClock {
    start: Instant,
}

impl Default for RealClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

#[async_trait]
impl Clock for RealClock {
    /// Return the number of ticks since `Clock` was created, saturating at
    /// `u64::MAX`.
    fn ticks_elapsed(&self) -> u64 {
        let now = Instant::now();
        let ticks_since: u128 = now.duration_since(self.start).as_nanos();
        u64::try_from(ticks_since).unwrap_or(u64::MAX)
    }

    async fn wait(&self, ticks: u64) {
        time::sleep(Duration::from_nanos(ticks)).await;
    }
}

/// The throttle mechanism
///
/// Releases one caller per interval, where the interval is one second divided
/// by the configured rate. See [`interval`] for the scheduling rules.
#[derive(Debug)]
pub struct Throttle<C = RealClock> {
    metronome: interval::Metronome,
    clock: C,
}

impl Throttle<RealClock> {
    /// Create a new instance of `Throttle` with a real-time clock. The clock
    /// starts now.
    #[must_use]
    pub fn new(rate: NonZeroU32) -> Self {
        Self::with_clock(rate, RealClock::default())
    }
}

impl<C> Throttle<C>
where
    C: Clock + Sync + Send,
{
    /// Create a new instance of `Throttle` driven by `clock`.
    #[must_use]
    pub fn with_clock(rate: NonZeroU32, clock: C) -> Self {
        Self {
            metronome: interval::Metronome::new(rate),
            clock,
        }
    }

    /// The period between two releases of this throttle.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.metronome.period())
    }

    /// Wait for the next tick of the throttle.
    #[inline]
    pub async fn wait(&mut self) {
        loop {
            let slop: u64 = self.metronome.request(self.clock.ticks_elapsed());
            if slop == 0 {
                break;
            }
            self.clock.wait(slop).await;
        }
    }
}
