use std::sync::Arc;

use md_throttle::AdmitError;
use md_throttle::Result;
use md_throttle::SlidingWindow;
use md_throttle::SymbolGate;
use md_types::MarketDataUpdate;
use tracing::debug;
use tracing::trace;

use crate::sink::PublishSink;
use crate::stats::AdmissionStats;
use crate::stats::AdmissionStatsSnapshot;

/// Admission pipeline in front of the publish sink
///
/// Every update first claims a global sliding-window slot, then passes the
/// per-symbol freshness gate, and only then reaches the sink, exactly once.
/// The global slot is deliberately consumed before the per-symbol check and
/// stays consumed when that check rejects, so a bursty single symbol can
/// starve other symbols of slots.
pub struct MarketDataProcessor {
    window: SlidingWindow,
    symbols: SymbolGate,
    sink: Arc<dyn PublishSink>,
    stats: AdmissionStats,
}

impl MarketDataProcessor {
    pub fn new(window: SlidingWindow, symbols: SymbolGate, sink: Arc<dyn PublishSink>) -> Self {
        Self { window, symbols, sink, stats: AdmissionStats::new() }
    }

    /// Create a builder for wiring up a processor
    pub fn builder() -> MarketDataProcessorBuilder {
        MarketDataProcessorBuilder::new()
    }

    /// Run one update through both gates and publish it if admitted
    ///
    /// The returned error is the rejection reason; the update is dropped
    /// either way, with no retry and no backpressure to the caller.
    pub fn on_update(&self, update: MarketDataUpdate) -> Result<()> {
        if let Err(reason) = self.window.try_admit() {
            return Err(self.rejected(&update, reason));
        }

        if let Err(reason) = self.symbols.try_admit(&update.symbol, update.source_timestamp) {
            return Err(self.rejected(&update, reason));
        }

        self.stats.record_published();
        trace!(
            symbol = %update.symbol,
            source_timestamp = update.source_timestamp,
            "Publishing admitted update"
        );
        self.sink.publish(update);
        Ok(())
    }

    /// Current admission counters
    pub fn stats(&self) -> AdmissionStatsSnapshot {
        self.stats.snapshot()
    }

    fn rejected(&self, update: &MarketDataUpdate, reason: AdmitError) -> AdmitError {
        self.stats.record_rejected(reason);
        debug!(
            symbol = %update.symbol,
            source_timestamp = update.source_timestamp,
            reason = %reason,
            "Dropping rejected update"
        );
        reason
    }
}

/// Builder wiring the two gates and a sink into a processor
pub struct MarketDataProcessorBuilder {
    window: Option<SlidingWindow>,
    symbols: Option<SymbolGate>,
    sink: Option<Arc<dyn PublishSink>>,
}

impl MarketDataProcessorBuilder {
    pub fn new() -> Self {
        Self { window: None, symbols: None, sink: None }
    }

    /// Set the global admission gate
    pub fn window(mut self, window: SlidingWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Set the per-symbol freshness gate
    pub fn symbols(mut self, symbols: SymbolGate) -> Self {
        self.symbols = Some(symbols);
        self
    }

    /// Set the downstream publish sink
    pub fn sink(mut self, sink: Arc<dyn PublishSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the processor
    ///
    /// # Panics
    /// Panics if the window gate, the symbol gate or the sink is not set
    pub fn build(self) -> MarketDataProcessor {
        let window = self.window.expect("Window gate must be set");
        let symbols = self.symbols.expect("Symbol gate must be set");
        let sink = self.sink.expect("Publish sink must be set");
        MarketDataProcessor::new(window, symbols, sink)
    }
}

impl Default for MarketDataProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
