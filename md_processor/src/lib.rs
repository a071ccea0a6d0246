pub mod processor;
pub mod sink;
pub mod stats;

pub use processor::MarketDataProcessor;
pub use processor::MarketDataProcessorBuilder;
pub use sink::ChannelSink;
pub use sink::PublishSink;
pub use stats::AdmissionStats;
pub use stats::AdmissionStatsSnapshot;
