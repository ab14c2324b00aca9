//! Time management for sensor lifecycles
//!
//! Every wait in an acquisition cycle (power settle, inter-sample delay,
//! probe round-trip window) goes through a [`Clock`]. The controller never
//! sleeps on its own, which keeps the timing policy pluggable:
//!
//! - [`HalClock`] wraps any `embedded_hal::delay::DelayNs` plus a tick source
//! - [`StdClock`] sleeps the thread (requires `std`)
//! - [`SimulatedClock`] advances instantly and records every wait (tests, dry runs)

use embedded_hal::delay::DelayNs;

/// Timestamp in milliseconds since device boot (monotonic)
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Blocking clock: a time source that can also wait
///
/// Waits are hard blocks with no cancellation. Anything that must stay
/// responsive (calibration trigger) is written as a step function instead.
pub trait Clock: TimeSource {
    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Milliseconds elapsed since `since`, saturating at zero
    fn elapsed_since(&self, since: Timestamp) -> u64 {
        self.now().saturating_sub(since)
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Clock built from an embedded-hal delay provider and a tick source
///
/// ```rust,ignore
/// let clock = HalClock::new(embassy_time::Delay, UptimeMillis);
/// controller.enable(&mut clock)?;
/// ```
pub struct HalClock<D, T> {
    delay: D,
    time: T,
}

impl<D: DelayNs, T: TimeSource> HalClock<D, T> {
    pub fn new(delay: D, time: T) -> Self {
        Self { delay, time }
    }

    /// Give back the delay provider and tick source
    pub fn release(self) -> (D, T) {
        (self.delay, self.time)
    }
}

impl<D: DelayNs, T: TimeSource> TimeSource for HalClock<D, T> {
    fn now(&self) -> Timestamp {
        self.time.now()
    }
}

impl<D: DelayNs, T: TimeSource> Clock for HalClock<D, T> {
    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

/// Thread-sleeping clock measured from its creation (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct StdClock {
    started: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self { started: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for StdClock {
    fn now(&self) -> Timestamp {
        self.started.elapsed().as_millis() as Timestamp
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}

/// Maximum number of individual waits a [`SimulatedClock`] remembers
pub const SIMULATED_WAIT_HISTORY: usize = 64;

/// Clock that advances instantly on every wait
///
/// Records each wait so tests can assert on the exact timing sequence a
/// lifecycle operation produced.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    now: Timestamp,
    waits: heapless::Vec<u32, SIMULATED_WAIT_HISTORY>,
    total_waited_ms: u64,
}

impl SimulatedClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: start,
            waits: heapless::Vec::new(),
            total_waited_ms: 0,
        }
    }

    /// Move time forward without recording a wait
    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }

    /// Waits in the order they happened (oldest dropped past capacity)
    pub fn waits(&self) -> &[u32] {
        &self.waits
    }

    /// Sum of every wait since creation or the last [`clear`](Self::clear)
    pub fn total_waited_ms(&self) -> u64 {
        self.total_waited_ms
    }

    /// Forget recorded waits, keep the current time
    pub fn clear(&mut self) {
        self.waits.clear();
        self.total_waited_ms = 0;
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TimeSource for SimulatedClock {
    fn now(&self) -> Timestamp {
        self.now
    }
}

impl Clock for SimulatedClock {
    fn delay_ms(&mut self, ms: u32) {
        self.now += ms as u64;
        self.total_waited_ms += ms as u64;
        if self.waits.is_full() {
            self.waits.remove(0);
        }
        // Cannot fail after the removal above
        let _ = self.waits.push(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn simulated_clock_records_waits() {
        let mut clock = SimulatedClock::new(100);
        clock.delay_ms(1000);
        clock.delay_ms(250);

        assert_eq!(clock.now(), 1350);
        assert_eq!(clock.waits(), &[1000, 250]);
        assert_eq!(clock.total_waited_ms(), 1250);
        assert_eq!(clock.elapsed_since(100), 1250);
    }

    #[test]
    fn simulated_clock_drops_oldest_wait() {
        let mut clock = SimulatedClock::default();
        for ms in 0..(SIMULATED_WAIT_HISTORY as u32 + 2) {
            clock.delay_ms(ms);
        }

        assert_eq!(clock.waits().len(), SIMULATED_WAIT_HISTORY);
        assert_eq!(clock.waits()[0], 2);
    }

    struct CountingDelay {
        ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.ns += ns as u64;
        }
    }

    #[test]
    fn hal_clock_forwards_delays() {
        let mut clock = HalClock::new(CountingDelay { ns: 0 }, FixedTime::new(42));
        clock.delay_ms(3);

        assert_eq!(clock.now(), 42);
        let (delay, _) = clock.release();
        assert_eq!(delay.ns, 3_000_000);
    }
}
