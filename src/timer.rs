//! Clock and delay source used for settle times and sweep polling.

/// Microsecond resolution timestamp.
pub type Instant = fugit::TimerInstantU64<1_000_000>;
/// Microsecond resolution duration.
pub type Duration = fugit::MicrosDurationU64;

/// A monotonic clock that can also block the caller.
pub trait Timer {
    /// The current time. Must never go backwards.
    fn now(&mut self) -> Instant;

    /// Block for at least `duration`.
    fn delay(&mut self, duration: Duration);

    /// Time elapsed since `start`.
    fn elapsed_since(&mut self, start: Instant) -> Duration {
        self.now()
            .checked_duration_since(start)
            .unwrap_or(Duration::from_ticks(0))
    }
}

/// [Timer] backed by [std::time::Instant] and [std::thread::sleep].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdTimer {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimer {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Timer for StdTimer {
    fn now(&mut self) -> Instant {
        Instant::from_ticks(self.origin.elapsed().as_micros() as u64)
    }

    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(std::time::Duration::from_micros(duration.to_micros()));
    }
}

/// Virtual clock for tests: time only moves when asked to.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MockTimer {
    now_us: u64,
    /// Added to the clock on every call to [Timer::now].
    pub tick_us: u64,
    /// Every delay requested so far.
    pub delays: std::vec::Vec<Duration>,
}

#[cfg(test)]
impl MockTimer {
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick_us: tick.to_micros(),
            ..Default::default()
        }
    }

    pub fn total_delay(&self) -> Duration {
        Duration::from_ticks(self.delays.iter().map(|d| d.ticks()).sum())
    }
}

#[cfg(test)]
impl Timer for MockTimer {
    fn now(&mut self) -> Instant {
        self.now_us += self.tick_us;
        Instant::from_ticks(self.now_us)
    }

    fn delay(&mut self, duration: Duration) {
        self.now_us += duration.to_micros();
        self.delays.push(duration);
    }
}
