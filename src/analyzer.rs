//! Runs every codec on a dataset and ranks the results
//!
//! The three codecs are independent, so by default they run concurrently
//! with `rayon::join`. Each output is decoded again before it is measured; a
//! codec that cannot reproduce its input aborts the whole comparison.

use crate::codec::{run_codec, CancelFlag, CodecKind, CodecResult, FibonacciCodec, FibonacciTable, HuffmanCodec, LzwCodec};
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::{EngineError, Result};
use crate::metrics::{MetricsEngine, MetricsRecord};
use crate::report::{ComparativeReport, PerCodec};
use crossbeam_channel::{bounded, RecvTimeoutError};
use log::{error, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ComparativeAnalyzer {
    config: EngineConfig,
    table: Arc<FibonacciTable>,
    metrics: MetricsEngine,
}

impl ComparativeAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_table(config, Arc::new(FibonacciTable::new()))
    }

    /// Share a Fibonacci table with other analyzers.
    pub fn with_table(config: EngineConfig, table: Arc<FibonacciTable>) -> Self {
        let metrics = MetricsEngine::new(config.checksum);
        Self { config, table, metrics }
    }

    /// Compare all codecs on `dataset`, honouring the configured deadline.
    pub fn compare(&self, dataset: &Dataset) -> Result<ComparativeReport> {
        match self.config.deadline {
            Some(deadline) => self.compare_with_deadline(dataset, deadline),
            None => self.compare_cancellable(dataset, &CancelFlag::new()),
        }
    }

    /// Run the comparison on a worker thread and give up after `deadline`.
    ///
    /// On expiry the worker is told to stop at its next checkpoint and its
    /// result is discarded; no partial report is ever returned.
    pub fn compare_with_deadline(&self, dataset: &Dataset, deadline: Duration) -> Result<ComparativeReport> {
        let (tx, rx) = bounded(1);
        let cancel = CancelFlag::new();

        let worker = self.clone();
        let dataset = dataset.clone();
        let flag = cancel.clone();
        thread::Builder::new()
            .name("numpress-compare".to_string())
            .spawn(move || {
                // The receiver is gone once the deadline has passed.
                let _ = tx.send(worker.compare_cancellable(&dataset, &flag));
            })?;

        match rx.recv_timeout(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                warn!("comparison abandoned after {:?}", deadline);
                Err(EngineError::DeadlineExceeded(deadline))
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Cancelled),
        }
    }

    /// Compare all codecs, stopping early once `cancel` is raised.
    pub fn compare_cancellable(&self, dataset: &Dataset, cancel: &CancelFlag) -> Result<ComparativeReport> {
        dataset.check_max_value(self.config.max_value)?;
        let start = Instant::now();

        let (fibonacci, (huffman, lzw)) = if self.config.parallel {
            rayon::join(
                || self.run(CodecKind::Fibonacci, dataset, cancel),
                || {
                    rayon::join(
                        || self.run(CodecKind::Huffman, dataset, cancel),
                        || self.run(CodecKind::Lzw, dataset, cancel),
                    )
                },
            )
        } else {
            (
                self.run(CodecKind::Fibonacci, dataset, cancel),
                (
                    self.run(CodecKind::Huffman, dataset, cancel),
                    self.run(CodecKind::Lzw, dataset, cancel),
                ),
            )
        };

        let report = self.assemble(dataset, [fibonacci?, huffman?, lzw?])?;
        info!(
            "compared {} values in {:?}: best {} ({} bits)",
            dataset.len(),
            start.elapsed(),
            report.best_method,
            report.best().compressed_bits
        );
        Ok(report)
    }

    fn run(&self, kind: CodecKind, dataset: &Dataset, cancel: &CancelFlag) -> Result<CodecResult> {
        let values = dataset.values();
        match kind {
            CodecKind::Fibonacci => run_codec(&FibonacciCodec::with_table(Arc::clone(&self.table)), dataset, cancel),
            CodecKind::Huffman => run_codec(&HuffmanCodec::from_values(values)?, dataset, cancel),
            CodecKind::Lzw => run_codec(
                &LzwCodec::with_max_entries(values, self.config.max_dictionary_entries)?,
                dataset,
                cancel,
            ),
        }
    }

    /// Measure each result, failing closed on any round-trip mismatch.
    fn assemble(&self, dataset: &Dataset, results: [CodecResult; 3]) -> Result<ComparativeReport> {
        let [fibonacci, huffman, lzw] = results.map(|result| {
            let record = self.metrics.compute(dataset, &result);
            (result, record)
        });

        for (result, record) in [&fibonacci, &huffman, &lzw] {
            if !result.roundtrip_ok {
                error!(
                    "{} codec failed its round trip: {} values, original hash {}, compressed hash {}",
                    result.codec,
                    dataset.len(),
                    record.original_hash,
                    record.compressed_hash
                );
                return Err(EngineError::DecodeInvariantViolation {
                    codec: result.codec,
                    detail: format!("decoded output differs from the {} input values", dataset.len()),
                });
            }
        }

        let record = |pair: (CodecResult, MetricsRecord)| pair.1;
        Ok(ComparativeReport::new(
            PerCodec {
                fibonacci: record(fibonacci),
                huffman: record(huffman),
                lzw: record(lzw),
            },
            dataset.batch_stats(),
        ))
    }
}

impl Default for ComparativeAnalyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitString;

    #[test]
    fn test_scenario_a() {
        let dataset = Dataset::new(vec![1, 2, 3, 4, 5]).unwrap();
        let report = ComparativeAnalyzer::default().compare(&dataset).unwrap();
        let fib = &report.per_codec.fibonacci;
        assert_eq!(fib.original_bits, 160);
        assert_eq!(fib.compressed_bits, 18);
        assert!((fib.ratio - 160.0 / 18.0).abs() < 1e-9);
        assert!((fib.reduction_pct - 88.75).abs() < 1e-9);
        assert_eq!(report.batch_stats.count, 5);
        assert_eq!(report.batch_stats.avg_value, 3.0);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let dataset = Dataset::new((1..=300).map(|i| i % 17 + 1).collect()).unwrap();
        let parallel = ComparativeAnalyzer::new(EngineConfig::default()).compare(&dataset).unwrap();
        let sequential = ComparativeAnalyzer::new(EngineConfig::default().with_parallel(false))
            .compare(&dataset)
            .unwrap();
        for kind in CodecKind::ALL {
            assert_eq!(
                parallel.per_codec.get(kind).compressed_hash,
                sequential.per_codec.get(kind).compressed_hash
            );
        }
        assert_eq!(parallel.best_method, sequential.best_method);
    }

    #[test]
    fn test_best_method_matches_minimum() {
        let dataset = Dataset::new(vec![7; 64]).unwrap();
        let report = ComparativeAnalyzer::default().compare(&dataset).unwrap();
        let min = report.per_codec.iter().map(|(_, r)| r.compressed_bits).min().unwrap();
        assert_eq!(report.best().compressed_bits, min);
        // 64 values of 7: Huffman spends one bit each, LZW far fewer.
        assert_eq!(report.best_method, CodecKind::Lzw);
    }

    #[test]
    fn test_max_value_enforced_before_encoding() {
        let dataset = Dataset::new(vec![1, 1_000]).unwrap();
        let analyzer = ComparativeAnalyzer::new(EngineConfig::default().with_max_value(999));
        assert!(matches!(
            analyzer.compare(&dataset),
            Err(EngineError::EncodingOverflow { .. })
        ));
    }

    #[test]
    fn test_failed_roundtrip_is_fatal() {
        let dataset = Dataset::new(vec![1, 2]).unwrap();
        let result = |codec, roundtrip_ok| CodecResult {
            codec,
            bits: "11011".parse::<BitString>().unwrap(),
            encode_duration: Duration::ZERO,
            cpu_time: None,
            memory_estimate: 0,
            roundtrip_ok,
        };
        let err = ComparativeAnalyzer::default()
            .assemble(
                &dataset,
                [
                    result(CodecKind::Fibonacci, true),
                    result(CodecKind::Huffman, false),
                    result(CodecKind::Lzw, true),
                ],
            )
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            EngineError::DecodeInvariantViolation { codec: CodecKind::Huffman, .. }
        ));
    }

    #[test]
    fn test_cancelled_comparison() {
        let dataset = Dataset::new(vec![1, 2, 3]).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(matches!(
            ComparativeAnalyzer::default().compare_cancellable(&dataset, &cancel),
            Err(EngineError::Cancelled)
        ));
    }

    #[test]
    fn test_generous_deadline_returns_report() {
        let dataset = Dataset::new(vec![1, 2, 3, 4, 5]).unwrap();
        let analyzer = ComparativeAnalyzer::new(EngineConfig::default().with_deadline(Duration::from_secs(30)));
        assert_eq!(analyzer.compare(&dataset).unwrap().per_codec.fibonacci.compressed_bits, 18);
    }
}
