use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use md_throttle::AdmitError;

/// Counters for every admission outcome
///
/// Rejections are counted per reason rather than silently dropped, keeping
/// the reject paths observable without touching the admission algorithm
/// itself.
#[derive(Debug, Default)]
pub struct AdmissionStats {
    published: AtomicU64,
    rate_limited: AtomicU64,
    too_soon: AtomicU64,
    stale: AtomicU64,
}

impl AdmissionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self, reason: AdmitError) {
        let counter = match reason {
            AdmitError::RateLimited => &self.rate_limited,
            AdmitError::TooSoon => &self.too_soon,
            AdmitError::StaleOrDuplicate => &self.stale,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AdmissionStatsSnapshot {
        AdmissionStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            too_soon: self.too_soon.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the admission counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionStatsSnapshot {
    pub published: u64,
    pub rate_limited: u64,
    pub too_soon: u64,
    pub stale: u64,
}

impl AdmissionStatsSnapshot {
    /// Updates seen by the dispatcher since startup
    pub fn total(&self) -> u64 {
        self.published + self.rejected()
    }

    /// Rejected updates across all reasons
    pub fn rejected(&self) -> u64 {
        self.rate_limited + self.too_soon + self.stale
    }
}
