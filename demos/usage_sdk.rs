use numpress::config::EngineConfig;
use numpress::history::{HistoryStore, MemoryHistory};
use numpress::pipeline;

fn main() {
	let cfg = EngineConfig::default();
	let mut history = MemoryHistory::new();

	let outcome = pipeline::compress_text("1, 1, 2, 3, 5, 8, 13, 21, 34, 55", &cfg, Some(&mut history)).unwrap();
	for (codec, record) in outcome.report.per_codec.iter() {
		println!("{:<10} {:>5} bits  {:.2}x", codec, record.compressed_bits, record.ratio);
	}
	println!("best: {}", outcome.report.best_method);

	let encoded = "110110011101100011";
	let restored = pipeline::decompress_fibonacci(encoded, None).unwrap();
	println!("{} -> {:?}", encoded, restored);
	println!("history holds {} record(s)", history.list(100, 0).unwrap().len());
}
