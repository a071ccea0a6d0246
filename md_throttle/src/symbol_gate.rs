use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::clock::Clock;
use crate::error::AdmitError;
use crate::error::Result;

/// Last admitted update for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRecord {
    /// Source timestamp of the last admitted update (ms)
    pub last_source_timestamp: u64,

    /// Local processing time when it was admitted (ms)
    pub last_process_time: u64,
}

/// Per-symbol freshness and dedup gate
///
/// A symbol is re-admitted only once its cooldown has elapsed on the local
/// clock AND the incoming source timestamp is strictly newer than the last
/// admitted one. The record is replaced on admission and untouched on
/// rejection, so admitted source timestamps are strictly increasing per
/// symbol. Check-and-replace is atomic per symbol via the map's shard lock.
pub struct SymbolGate {
    /// One record per symbol, replaced in place on every admission
    records: DashMap<Arc<str>, SymbolRecord>,

    /// Minimum local time between admissions of the same symbol (ms)
    cooldown_millis: u64,

    /// Time source shared with the rest of the admission pipeline
    clock: Arc<dyn Clock>,
}

impl SymbolGate {
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

    /// Create a gate with an explicit cooldown
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        assert!(!cooldown.is_zero(), "Cooldown must be greater than 0");

        Self { records: DashMap::new(), cooldown_millis: cooldown.as_millis() as u64, clock }
    }

    /// Create a gate with the one-second default cooldown
    pub fn with_default_cooldown(clock: Arc<dyn Clock>) -> Self {
        Self::new(Self::DEFAULT_COOLDOWN, clock)
    }

    /// Try to admit an update for `symbol` carrying `source_timestamp`
    ///
    /// First sighting of a symbol always admits. After that the cooldown is
    /// checked before staleness, so an update inside the cooldown rejects as
    /// `TooSoon` even when its source timestamp would also have been stale.
    pub fn try_admit(&self, symbol: &str, source_timestamp: u64) -> Result<()> {
        let now = self.clock.now_millis();

        // Known symbols take the borrowed-key path and skip the allocation
        if let Some(mut record) = self.records.get_mut(symbol) {
            return self.check_and_replace(&mut record, source_timestamp, now);
        }

        match self.records.entry(Arc::from(symbol)) {
            // Lost the race against another first sighting; re-check under
            // the entry guard
            Entry::Occupied(mut slot) => self.check_and_replace(slot.get_mut(), source_timestamp, now),
            Entry::Vacant(slot) => {
                slot.insert(SymbolRecord { last_source_timestamp: source_timestamp, last_process_time: now });
                Ok(())
            }
        }
    }

    fn check_and_replace(&self, record: &mut SymbolRecord, source_timestamp: u64, now: u64) -> Result<()> {
        if now.saturating_sub(record.last_process_time) <= self.cooldown_millis {
            return Err(AdmitError::TooSoon);
        }

        if source_timestamp <= record.last_source_timestamp {
            return Err(AdmitError::StaleOrDuplicate);
        }

        *record = SymbolRecord { last_source_timestamp: source_timestamp, last_process_time: now };
        Ok(())
    }

    /// Last admitted record for `symbol`, if any
    pub fn record(&self, symbol: &str) -> Option<SymbolRecord> {
        self.records.get(symbol).map(|record| *record)
    }

    /// Number of symbols seen and admitted at least once
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
