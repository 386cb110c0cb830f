use crate::analyzer::ComparativeAnalyzer;
use crate::bits::BitString;
use crate::codec::{Codec, FibonacciCodec, FibonacciTable};
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::history::{HistoryRecord, HistoryStore};
use crate::normalize;
use crate::report::ComparativeReport;
use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct CompressionOutcome {
	pub dataset: Dataset,
	pub report: ComparativeReport,
	/// Largest Fibonacci term not above the dataset maximum.
	pub max_fibonacci_used: u64,
	/// Bytes the Fibonacci encoding saves against the 32-bit baseline; negative when it is larger.
	pub bytes_saved: f64,
	pub elapsed: Duration,
}

/// Size the global rayon pool. Only the first call in a process takes effect.
pub fn configure_threads(threads: usize) {
	let _ = rayon::ThreadPoolBuilder::new()
		.num_threads(threads)
		.build_global();
}

/// Compare all codecs on `dataset` and record the report in `history`.
///
/// Nothing is recorded unless the comparison completes.
pub fn compress(
	dataset: Dataset,
	config: &EngineConfig,
	history: Option<&mut dyn HistoryStore>,
) -> Result<CompressionOutcome> {
	config.validate()?;
	let start = Instant::now();

	let table = Arc::new(FibonacciTable::new());
	let report = ComparativeAnalyzer::with_table(config.clone(), Arc::clone(&table)).compare(&dataset)?;

	if let Some(store) = history {
		store.append(&HistoryRecord::new(&dataset, report.clone()))?;
	}

	let max_fibonacci_used = FibonacciCodec::with_table(table)
		.largest_term_used(dataset.max_value())
		.unwrap_or(1);
	let fibonacci = &report.per_codec.fibonacci;
	let bytes_saved = (fibonacci.original_bits as f64 - fibonacci.compressed_bits as f64) / 8.0;

	Ok(CompressionOutcome {
		dataset,
		report,
		max_fibonacci_used,
		bytes_saved,
		elapsed: start.elapsed(),
	})
}

/// Parse comma/whitespace separated text with the configured policy, then compress.
pub fn compress_text(
	text: &str,
	config: &EngineConfig,
	history: Option<&mut dyn HistoryStore>,
) -> Result<CompressionOutcome> {
	let dataset = normalize::parse_values(text, config.policy)?;
	compress(dataset, config, history)
}

/// Parse a CSV document with the configured policy, then compress.
pub fn compress_csv<R: BufRead>(
	reader: R,
	config: &EngineConfig,
	history: Option<&mut dyn HistoryStore>,
) -> Result<CompressionOutcome> {
	let dataset = normalize::parse_csv(reader, config.policy)?;
	compress(dataset, config, history)
}

/// Decode `'0'`/`'1'` text produced by the Fibonacci codec.
///
/// With a `count`, exactly that many values are decoded and any trailing
/// bits are ignored.
pub fn decompress_fibonacci(text: &str, count: Option<usize>) -> Result<Vec<u64>> {
	let bits: BitString = text.trim().parse()?;
	FibonacciCodec::new().decode_dataset(&bits, count)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ParsePolicy;
	use crate::error::{EngineError, InputError};
	use crate::history::MemoryHistory;

	#[test]
	fn test_compress_records_history() {
		let mut history = MemoryHistory::new();
		let outcome = compress_text("1,2,3,4,5", &EngineConfig::default(), Some(&mut history)).unwrap();
		assert_eq!(outcome.report.per_codec.fibonacci.compressed_bits, 18);
		assert_eq!(history.len(), 1);
		assert_eq!(history.list(1, 0).unwrap()[0].dataset, vec![1, 2, 3, 4, 5]);
	}

	#[test]
	fn test_fibonacci_extras() {
		// 160 baseline bits against 18 encoded bits
		let outcome = compress_text("1,2,3,4,5", &EngineConfig::default(), None).unwrap();
		assert_eq!(outcome.max_fibonacci_used, 5);
		assert_eq!(outcome.bytes_saved, 17.75);

		let outcome = compress_text("100, 7", &EngineConfig::default(), None).unwrap();
		assert_eq!(outcome.max_fibonacci_used, 89);

		// 2^40 needs a 59-bit codeword, more than its 32-bit baseline
		let outcome = compress_text("1099511627776", &EngineConfig::default(), None).unwrap();
		assert!(outcome.bytes_saved < 0.0);
		assert_eq!(outcome.max_fibonacci_used, 956_722_026_041);
	}

	#[test]
	fn test_rejected_input_is_not_recorded() {
		let mut history = MemoryHistory::new();
		let err = compress_text("1,-2", &EngineConfig::default(), Some(&mut history)).unwrap_err();
		assert!(matches!(err, EngineError::InvalidInput(InputError::NonPositive(_))));
		assert!(history.is_empty());

		let config = EngineConfig::default().with_max_value(10);
		assert!(compress_text("1,11", &config, Some(&mut history)).is_err());
		assert!(history.is_empty());
	}

	#[test]
	fn test_lenient_policy_from_config() {
		let config = EngineConfig::default().with_policy(ParsePolicy::Lenient);
		let outcome = compress_text("4, four, 4", &config, None).unwrap();
		assert_eq!(outcome.dataset.values(), &[4, 4]);
	}

	#[test]
	fn test_compress_csv() {
		let csv = "reading\n3\n3\n7\n";
		let outcome = compress_csv(csv.as_bytes(), &EngineConfig::default(), None).unwrap();
		assert_eq!(outcome.report.batch_stats.count, 3);
		assert_eq!(outcome.report.batch_stats.max_value, 7);
	}

	#[test]
	fn test_decompress_fibonacci() {
		assert_eq!(decompress_fibonacci("110110011", None).unwrap(), vec![1, 2, 3]);
		assert_eq!(decompress_fibonacci("110110011000", Some(3)).unwrap(), vec![1, 2, 3]);
		assert!(matches!(
			decompress_fibonacci("11012", None),
			Err(EngineError::MalformedBitstream(_))
		));
		assert!(decompress_fibonacci("11011", Some(3)).is_err());
	}
}
