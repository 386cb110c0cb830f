//! Per-codec efficiency and integrity metrics.

use crate::checksum::ChecksumCalculator;
use crate::codec::CodecResult;
use crate::config::ChecksumType;
use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// Measurements for one codec on one dataset.
///
/// `original_bits` is always `len * 32`, independent of value magnitude, so
/// ratios are comparable across datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub original_bits: u64,
    pub compressed_bits: u64,
    pub ratio: f64,
    pub reduction_pct: f64,
    /// Seconds
    pub encode_time: f64,
    /// Values per second; absent when the encode was too fast to time.
    pub throughput: Option<f64>,
    /// Seconds of thread CPU time; absent without per-thread accounting.
    pub cpu_time: Option<f64>,
    pub memory_estimate: usize,
    pub original_hash: String,
    pub compressed_hash: String,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine {
    checksum: ChecksumCalculator,
}

impl MetricsEngine {
    pub fn new(checksum_type: ChecksumType) -> Self {
        Self {
            checksum: ChecksumCalculator::new(checksum_type),
        }
    }

    pub fn compute(&self, dataset: &Dataset, result: &CodecResult) -> MetricsRecord {
        let original_bits = dataset.baseline_bits();
        let compressed_bits = result.bits.len() as u64;

        let ratio = if compressed_bits > 0 {
            original_bits as f64 / compressed_bits as f64
        } else {
            0.0
        };
        let reduction_pct = (1.0 - compressed_bits as f64 / original_bits as f64) * 100.0;

        let encode_time = result.encode_duration.as_secs_f64();
        let throughput = (encode_time > 0.0).then(|| dataset.len() as f64 / encode_time);

        MetricsRecord {
            original_bits,
            compressed_bits,
            ratio,
            reduction_pct,
            encode_time,
            throughput,
            cpu_time: result.cpu_time.map(|t| t.as_secs_f64()),
            memory_estimate: result.memory_estimate,
            original_hash: self.checksum.hex_digest(dataset.canonical_string().as_bytes()),
            compressed_hash: self.checksum.hex_digest(result.bits.to_string().as_bytes()),
        }
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(ChecksumType::SHA256)
    }
}
