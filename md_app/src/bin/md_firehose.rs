use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use md_app::cli;
use md_app::shutdown_handler;
use md_processor::ChannelSink;
use md_processor::MarketDataProcessor;
use md_throttle::Clock;
use md_throttle::SlidingWindow;
use md_throttle::SymbolGate;
use md_throttle::SystemClock;
use md_types::FixedPoint;
use md_types::MarketDataUpdate;
use tracing::debug;
use tracing::info;

const PUBLISH_QUEUE_CAPACITY: usize = 10_000;
const STATS_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let _guard = md_app::tracing_setup::init("md_firehose", "./logs", tracing::Level::INFO);

    let symbols = cli::get_symbols(&["BTCUSDT", "ETHUSDT", "SOLUSDT", "MSFT"]);
    let rate = cli::get_rate(500);

    info!("Starting market data firehose for {symbols:?} at {rate} updates/s per symbol");

    let clock = Arc::new(SystemClock);
    let (sink, receiver) = ChannelSink::bounded(PUBLISH_QUEUE_CAPACITY);
    let processor = Arc::new(
        MarketDataProcessor::builder()
            .window(SlidingWindow::builder().per_second(100).clock(clock.clone()).build())
            .symbols(SymbolGate::with_default_cooldown(clock.clone()))
            .sink(Arc::new(sink))
            .build(),
    );

    // Set up shutdown handler
    let running = Arc::new(AtomicBool::new(true));
    shutdown_handler::setup(Arc::clone(&running))?;

    // One producer per symbol pushing sine-wave quotes at the configured rate
    let mut producer_handles = vec![];
    for symbol in symbols {
        let processor = Arc::clone(&processor);
        let running = Arc::clone(&running);
        let clock = Arc::clone(&clock);
        let symbol: Arc<str> = Arc::from(symbol);

        producer_handles.push(thread::spawn(move || {
            let base_price = 50_000.0;
            let amplitude = 500.0;
            let pause = Duration::from_micros(1_000_000 / rate.max(1));
            let mut tick = 0u64;

            while running.load(Ordering::Relaxed) {
                let angle = (tick as f64 / 100.0) * 2.0 * PI;
                let mid = base_price + amplitude * angle.sin();
                let update = MarketDataUpdate::new(
                    Arc::clone(&symbol),
                    FixedPoint::from_f64(mid - 0.5),
                    FixedPoint::from_f64(mid + 0.5),
                    FixedPoint::from_f64(mid),
                    clock.now_millis(),
                );

                let _ = processor.on_update(update);
                tick += 1;
                thread::sleep(pause);
            }
        }));
    }

    // Consumer draining the publish queue, standing in for the downstream feed
    let consumer_running = Arc::clone(&running);
    let consumer = thread::spawn(move || {
        let mut delivered = 0u64;
        while consumer_running.load(Ordering::Relaxed) {
            if let Ok(update) = receiver.recv_timeout(Duration::from_millis(100)) {
                delivered += 1;
                debug!(
                    symbol = %update.symbol,
                    mid = %update.mid(),
                    source_timestamp = update.source_timestamp,
                    "Delivered downstream"
                );
            }
        }
        delivered
    });

    // Main loop: periodic admission stats until shutdown
    info!("Firehose running, Ctrl+C to stop");
    let mut last_stats = processor.stats();
    while running.load(Ordering::Relaxed) {
        thread::sleep(STATS_INTERVAL);

        let stats = processor.stats();
        info!(
            published = stats.published - last_stats.published,
            rate_limited = stats.rate_limited - last_stats.rate_limited,
            too_soon = stats.too_soon - last_stats.too_soon,
            stale = stats.stale - last_stats.stale,
            "Admissions over the last interval"
        );
        last_stats = stats;
    }

    info!("Shutting down firehose");
    for handle in producer_handles {
        let _ = handle.join();
    }
    let delivered = consumer.join().unwrap_or(0);

    let stats = processor.stats();
    info!(
        "Final stats: {} published, {} rate limited, {} too soon, {} stale, {} delivered downstream",
        stats.published, stats.rate_limited, stats.too_soon, stats.stale, delivered
    );
    Ok(())
}
