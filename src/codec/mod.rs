//! Lossless integer codecs and the harness that runs them.
//!
//! Every codec turns a sequence of positive integers into a [`BitString`]
//! and back. [`run_codec`] wraps one encode call with timing and resource
//! sampling and verifies the round trip before anything is measured.

pub mod fibonacci;
pub mod huffman;
pub mod lzw;

pub use fibonacci::{FibonacciCodec, FibonacciTable};
pub use huffman::HuffmanCodec;
pub use lzw::LzwCodec;

use crate::bits::BitString;
use crate::dataset::Dataset;
use crate::error::{EngineError, Result};
use crate::resources;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Codec identifiers. Declaration order is the tie-break priority used when
/// two codecs produce the same number of bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Fibonacci,
    Huffman,
    Lzw,
}

impl CodecKind {
    pub const ALL: [CodecKind; 3] = [CodecKind::Fibonacci, CodecKind::Huffman, CodecKind::Lzw];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodecKind::Fibonacci => "fibonacci",
            CodecKind::Huffman => "huffman",
            CodecKind::Lzw => "lzw",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Output of a tracked encode: the bits plus the bytes of working state the
/// codec needed to produce them.
#[derive(Debug, Clone)]
pub struct Encoding {
    pub bits: BitString,
    pub working_set_bytes: usize,
}

/// Trait for all codec implementations
pub trait Codec: Send + Sync {
    fn kind(&self) -> CodecKind;

    /// Encode a whole sequence, reporting working-set size.
    ///
    /// `cancel` is polled every [`CANCEL_CHECK_INTERVAL`] values.
    fn encode_tracked(&self, values: &[u64], cancel: &CancelFlag) -> Result<Encoding>;

    /// Decode a bitstream. With `Some(count)` exactly `count` values are
    /// produced and trailing bits are ignored; with `None` the stream is
    /// decoded to its end.
    fn decode_dataset(&self, bits: &BitString, count: Option<usize>) -> Result<Vec<u64>>;

    fn encode_dataset(&self, values: &[u64]) -> Result<BitString> {
        Ok(self.encode_tracked(values, &CancelFlag::new())?.bits)
    }
}

/// Values encoded between two polls of a [`CancelFlag`].
pub const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Shared flag used to abandon work that is no longer wanted.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Fail with [`EngineError::Cancelled`] at every
    /// [`CANCEL_CHECK_INTERVAL`]-th value once the flag is raised.
    pub fn checkpoint(&self, index: usize) -> Result<()> {
        if index % CANCEL_CHECK_INTERVAL == 0 {
            self.check()
        } else {
            Ok(())
        }
    }
}

/// One codec's output on one dataset.
#[derive(Debug, Clone)]
pub struct CodecResult {
    pub codec: CodecKind,
    pub bits: BitString,
    pub encode_duration: Duration,
    pub cpu_time: Option<Duration>,
    pub memory_estimate: usize,
    pub roundtrip_ok: bool,
}

/// Encode `dataset` with `codec`, then decode the result and compare.
///
/// A decode that errors is reported as a failed round trip rather than a
/// decode error: for bits the codec just produced, either outcome is a bug.
pub fn run_codec(codec: &dyn Codec, dataset: &Dataset, cancel: &CancelFlag) -> Result<CodecResult> {
    cancel.check()?;

    let cpu_before = resources::thread_cpu_time();
    let start = Instant::now();
    let encoding = codec.encode_tracked(dataset.values(), cancel)?;
    let encode_duration = start.elapsed();
    let cpu_time = match (cpu_before, resources::thread_cpu_time()) {
        (Some(before), Some(after)) => Some(after.saturating_sub(before)),
        _ => None,
    };

    cancel.check()?;

    let roundtrip_ok = match codec.decode_dataset(&encoding.bits, Some(dataset.len())) {
        Ok(decoded) => decoded == dataset.values(),
        Err(e) => {
            log::error!("{} codec failed to decode its own output: {}", codec.kind(), e);
            false
        }
    };

    log::debug!(
        "{} codec: {} values -> {} bits in {:?}",
        codec.kind(),
        dataset.len(),
        encoding.bits.len(),
        encode_duration
    );

    Ok(CodecResult {
        codec: codec.kind(),
        memory_estimate: encoding.working_set_bytes + encoding.bits.heap_bytes(),
        bits: encoding.bits,
        encode_duration,
        cpu_time,
        roundtrip_ok,
    })
}

/// Number of bits needed to write `value` in binary (0 for 0).
pub(crate) fn bit_length(value: usize) -> u32 {
    usize::BITS - value.leading_zeros()
}
