//! linelog-core: line-buffering library for the linelog daemon.
//!
//! Provides the bounded line printer (accumulate producer bytes, emit
//! complete lines to a sink), the sink and byte-source contracts, and a
//! shared-instance wrapper for concurrent producers.

pub mod error;
pub mod printer;
pub mod shared;
pub mod sink;
pub mod source;

// Re-export commonly used items at crate root.
pub use error::{LinelogError, LinelogResult};
pub use printer::{LinePrinter, DEFAULT_LINE_CAPACITY};
pub use shared::SharedPrinter;
pub use sink::{LineSink, MemorySink, WriterSink};
pub use source::ByteSource;
