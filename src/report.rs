//! Comparative report returned for every dataset.

use crate::codec::CodecKind;
use crate::dataset::BatchStats;
use crate::metrics::MetricsRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerCodec {
    pub fibonacci: MetricsRecord,
    pub huffman: MetricsRecord,
    pub lzw: MetricsRecord,
}

impl PerCodec {
    pub fn get(&self, kind: CodecKind) -> &MetricsRecord {
        match kind {
            CodecKind::Fibonacci => &self.fibonacci,
            CodecKind::Huffman => &self.huffman,
            CodecKind::Lzw => &self.lzw,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CodecKind, &MetricsRecord)> {
        CodecKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Size of the Fibonacci encoding relative to each competitor, in percent.
/// Positive means the Fibonacci output is larger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deltas {
    pub vs_huffman: f64,
    pub vs_lzw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeReport {
    pub per_codec: PerCodec,
    pub best_method: CodecKind,
    pub deltas: Deltas,
    pub batch_stats: BatchStats,
}

impl ComparativeReport {
    /// Rank the three records and derive the deltas.
    pub fn new(per_codec: PerCodec, batch_stats: BatchStats) -> Self {
        let best_method = best_method(&per_codec);
        let fibonacci_bits = per_codec.fibonacci.compressed_bits;
        let deltas = Deltas {
            vs_huffman: percent_delta(fibonacci_bits, per_codec.huffman.compressed_bits),
            vs_lzw: percent_delta(fibonacci_bits, per_codec.lzw.compressed_bits),
        };
        Self {
            per_codec,
            best_method,
            deltas,
            batch_stats,
        }
    }

    pub fn best(&self) -> &MetricsRecord {
        self.per_codec.get(self.best_method)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Smallest output wins; ties go to the codec declared first.
fn best_method(per_codec: &PerCodec) -> CodecKind {
    per_codec
        .iter()
        .min_by_key(|(kind, record)| (record.compressed_bits, *kind))
        .map(|(kind, _)| kind)
        .unwrap_or(CodecKind::Fibonacci)
}

fn percent_delta(fibonacci_bits: u64, other_bits: u64) -> f64 {
    if other_bits == 0 {
        return 0.0;
    }
    (fibonacci_bits as f64 - other_bits as f64) / other_bits as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(compressed_bits: u64) -> MetricsRecord {
        MetricsRecord {
            original_bits: 320,
            compressed_bits,
            ratio: 320.0 / compressed_bits as f64,
            reduction_pct: (1.0 - compressed_bits as f64 / 320.0) * 100.0,
            encode_time: 0.0,
            throughput: None,
            cpu_time: None,
            memory_estimate: 0,
            original_hash: String::new(),
            compressed_hash: String::new(),
        }
    }

    fn stats() -> BatchStats {
        BatchStats {
            min_value: 1,
            max_value: 10,
            avg_value: 5.5,
            count: 10,
        }
    }

    fn report(fib: u64, huff: u64, lzw: u64) -> ComparativeReport {
        ComparativeReport::new(
            PerCodec {
                fibonacci: record(fib),
                huffman: record(huff),
                lzw: record(lzw),
            },
            stats(),
        )
    }

    #[test]
    fn test_best_method_is_smallest() {
        assert_eq!(report(50, 40, 60).best_method, CodecKind::Huffman);
        assert_eq!(report(50, 40, 30).best_method, CodecKind::Lzw);
        assert_eq!(report(20, 40, 30).best_method, CodecKind::Fibonacci);
    }

    #[test]
    fn test_ties_prefer_declaration_order() {
        assert_eq!(report(40, 40, 40).best_method, CodecKind::Fibonacci);
        assert_eq!(report(50, 40, 40).best_method, CodecKind::Huffman);
        assert_eq!(report(40, 50, 40).best_method, CodecKind::Fibonacci);
    }

    #[test]
    fn test_delta_sign() {
        let r = report(60, 40, 80);
        assert!((r.deltas.vs_huffman - 50.0).abs() < 1e-9);
        assert!((r.deltas.vs_lzw + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(report(18, 20, 22)).unwrap();
        assert_eq!(json["best_method"], "fibonacci");
        assert_eq!(json["per_codec"]["lzw"]["compressed_bits"], 22);
        assert!(json["deltas"]["vs_huffman"].is_number());
        assert_eq!(json["batch_stats"]["count"], 10);

        let back: ComparativeReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.best_method, CodecKind::Fibonacci);
    }
}
