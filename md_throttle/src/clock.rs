use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Millisecond time source behind both admission gates
///
/// Injected so decisions can be driven with a deterministic clock in tests.
/// Readings are expected to be non-decreasing under normal operation;
/// decreasing values are not guarded against.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Wall-clock time source
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline(always)]
    fn now_millis(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).expect("System time before Unix epoch").as_millis() as u64
    }
}

/// Manually driven clock for deterministic tests and replay drivers
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self { millis: AtomicU64::new(start_millis) }
    }

    /// Jump to an absolute time
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Release);
    }

    /// Move the clock forward
    pub fn advance(&self, delta_millis: u64) {
        self.millis.fetch_add(delta_millis, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    #[inline(always)]
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::Acquire)
    }
}
