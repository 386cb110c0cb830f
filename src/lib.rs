//! # numpress
//!
//! A multi-codec compression engine for sequences of positive integers.
//!
//! ## Features
//!
//! - **Three Lossless Codecs**: Fibonacci (Zeckendorf) coding, Huffman coding
//!   over distinct values and LZW over integer tokens
//! - **Verified Round Trips**: every encoding is decoded again before it is
//!   measured; a mismatch aborts the comparison
//! - **Comparable Metrics**: ratio and reduction against a fixed 32-bit
//!   baseline, timing, CPU time, memory and integrity hashes (SHA-256 or CRC32)
//! - **Parallel Processing**: codecs run concurrently on the rayon pool, with an
//!   optional wall-clock deadline
//!
//! ## Quick Start
//!
//! ```rust
//! use numpress::compare_values;
//!
//! let report = compare_values(&[1, 2, 3, 4, 5]).unwrap();
//! assert_eq!(report.per_codec.fibonacci.compressed_bits, 18);
//! assert_eq!(report.per_codec.fibonacci.original_bits, 160);
//! println!("best: {}", report.best_method);
//! ```
//!
//! ### Single Codecs
//!
//! ```rust
//! use numpress::codec::{Codec, FibonacciCodec};
//!
//! let codec = FibonacciCodec::new();
//! assert_eq!(codec.encode(4).unwrap().to_string(), "1011");
//!
//! let bits = codec.encode_dataset(&[1, 2, 3]).unwrap();
//! assert_eq!(bits.to_string(), "110110011");
//! assert_eq!(codec.decode_dataset(&bits, Some(3)).unwrap(), vec![1, 2, 3]);
//! ```
//!
//! ### Parsing and History
//!
//! ```rust
//! use numpress::config::{EngineConfig, ParsePolicy};
//! use numpress::history::{HistoryStore, MemoryHistory};
//! use numpress::pipeline;
//!
//! let config = EngineConfig::default().with_policy(ParsePolicy::Lenient);
//! let mut history = MemoryHistory::new();
//! let outcome = pipeline::compress_text("3, 3, n/a, 7", &config, Some(&mut history)).unwrap();
//! assert_eq!(outcome.dataset.values(), &[3, 3, 7]);
//! assert_eq!(history.list(10, 0).unwrap().len(), 1);
//! ```

pub mod analyzer;
pub mod bits;
pub mod checksum;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod history;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod resources;

// Re-export commonly used types for convenience
pub use analyzer::ComparativeAnalyzer;
pub use bits::BitString;
pub use codec::{Codec, CodecKind, FibonacciCodec, HuffmanCodec, LzwCodec};
pub use config::{ChecksumType, EngineConfig, ParsePolicy};
pub use dataset::Dataset;
pub use error::{EngineError, InputError, Result};
pub use metrics::{MetricsEngine, MetricsRecord};
pub use report::ComparativeReport;

/// Compare all codecs on `values` with the default configuration.
///
/// # Example
///
/// ```rust
/// use numpress::compare_values;
///
/// let report = compare_values(&[5]).unwrap();
/// assert_eq!(report.per_codec.fibonacci.compressed_bits, 5);
/// assert!((report.per_codec.fibonacci.ratio - 6.4).abs() < 1e-9);
/// ```
pub fn compare_values(values: &[u64]) -> Result<ComparativeReport> {
    compare_with_config(values, &EngineConfig::default())
}

/// Compare all codecs on `values`.
///
/// Values are validated first: an empty slice or a zero rejects the whole
/// input before any codec runs.
pub fn compare_with_config(values: &[u64], config: &EngineConfig) -> Result<ComparativeReport> {
    config.validate()?;
    let dataset = Dataset::new(values.to_vec())?;
    ComparativeAnalyzer::new(config.clone()).compare(&dataset)
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get library version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: VERSION,
        authors: AUTHORS,
        description: DESCRIPTION,
    }
}

#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: &'static str,
    pub authors: &'static str,
    pub description: &'static str,
}
