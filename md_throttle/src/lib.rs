pub mod clock;
pub mod error;
pub mod sliding_window;
pub mod symbol_gate;

pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use error::AdmitError;
pub use error::Result;
pub use sliding_window::SlidingWindow;
pub use sliding_window::SlidingWindowBuilder;
pub use symbol_gate::SymbolGate;
pub use symbol_gate::SymbolRecord;
