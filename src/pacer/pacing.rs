//! Rate pacing with drift correction
//!
//! After each flush of `n` records the pacer sleeps until
//! `anchor + n * delay` and moves the anchor there. If that moment has
//! already passed the pacer does not sleep and re-anchors at the current
//! time, so a slow consumer never triggers a catch-up burst.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Source of wall-clock time for the pacer.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep_until(&self, deadline: Instant);
}

/// Real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
}

#[derive(Debug)]
struct ManualState {
    now: Instant,
    sleeps: Vec<Duration>,
}

/// Clock that only moves when told to. Sleeping advances it instantly.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Rc<RefCell<ManualState>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ManualState {
                now: Instant::now(),
                sleeps: Vec::new(),
            })),
        }
    }

    /// Moves time forward without sleeping.
    pub fn advance(&self, by: Duration) {
        self.state.borrow_mut().now += by;
    }

    /// Every sleep requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.borrow().sleeps.clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.state.borrow().now
    }

    fn sleep_until(&self, deadline: Instant) {
        let mut state = self.state.borrow_mut();
        if deadline > state.now {
            let slept = deadline - state.now;
            state.sleeps.push(slept);
            state.now = deadline;
        }
    }
}

/// Target pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Flush as fast as records arrive.
    #[default]
    Unpaced,
    /// Fixed delay per record.
    PerRecord(Duration),
}

impl Pacing {
    /// Fixed delay in seconds per record. Zero (or less) disables pacing.
    ///
    /// A delay too large for a [`Duration`] saturates to `Duration::MAX`.
    pub fn from_delay(seconds: f64) -> Self {
        if seconds.is_nan() || seconds <= 0.0 {
            return Pacing::Unpaced;
        }
        Pacing::PerRecord(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
    }

    /// True if `seconds` is a delay a [`Duration`] can hold.
    pub fn delay_in_range(seconds: f64) -> bool {
        Duration::try_from_secs_f64(seconds).is_ok()
    }

    /// Target records per second. Zero (or less) disables pacing.
    pub fn from_rate(records_per_second: f64) -> Self {
        if records_per_second > 0.0 && records_per_second.is_finite() {
            Self::from_delay(1.0 / records_per_second)
        } else {
            Pacing::Unpaced
        }
    }

    pub fn per_record(&self) -> Option<Duration> {
        match self {
            Pacing::Unpaced => None,
            Pacing::PerRecord(delay) => Some(*delay),
        }
    }
}

/// Sleeps between flushes to approximate the target rate.
#[derive(Debug)]
pub struct Pacer<C> {
    pacing: Pacing,
    anchor: Option<Instant>,
    clock: C,
}

impl<C: Clock> Pacer<C> {
    pub fn new(pacing: Pacing, clock: C) -> Self {
        Self {
            pacing,
            anchor: None,
            clock,
        }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Anchors at the current time. Called at the start of a session.
    pub fn start(&mut self) {
        self.anchor = Some(self.clock.now());
    }

    /// Paces after a flush of `records` records. Returns the time slept.
    pub fn after_flush(&mut self, records: usize) -> Option<Duration> {
        let delay = self.pacing.per_record()?;

        let now = self.clock.now();
        let anchor = self.anchor.unwrap_or(now);
        let owed = u32::try_from(records)
            .ok()
            .and_then(|n| delay.checked_mul(n))
            .unwrap_or(Duration::MAX);

        match anchor.checked_add(owed) {
            Some(ideal) if ideal > now => {
                self.clock.sleep_until(ideal);
                self.anchor = Some(ideal);
                Some(ideal - now)
            }
            Some(_) => {
                self.anchor = Some(now);
                None
            }
            None => {
                self.anchor = Some(now);
                None
            }
        }
    }
}
