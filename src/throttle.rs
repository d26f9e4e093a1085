//! Fixed-interval pacing between outbound requests.

use std::thread;
use std::time::Duration;

/// Blocks the current thread for a while.
pub trait Sleeper {
    /// Pause for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Inserts a fixed pause between consecutive calls to [`Throttle::wait`].
///
/// The first call returns immediately; every later call sleeps for the
/// configured delay first. A zero delay never sleeps.
#[derive(Debug)]
pub struct Throttle<S = ThreadSleeper> {
    delay: Duration,
    sleeper: S,
    primed: bool,
}

impl Throttle<ThreadSleeper> {
    /// Throttle that really sleeps.
    pub fn new(delay: Duration) -> Self {
        Self::with_sleeper(delay, ThreadSleeper)
    }
}

impl<S: Sleeper> Throttle<S> {
    /// Throttle with a custom sleeper (tests pass a recording fake).
    pub fn with_sleeper(delay: Duration, sleeper: S) -> Self {
        Self {
            delay,
            sleeper,
            primed: false,
        }
    }

    /// Configured pause between requests.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Call right before each request.
    pub fn wait(&mut self) {
        if self.primed && !self.delay.is_zero() {
            self.sleeper.sleep(self.delay);
        }
        self.primed = true;
    }

    /// Borrow the sleeper.
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }
}
