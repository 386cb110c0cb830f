use crate::codec::CodecKind;
use crate::config::{ChecksumType, EngineConfig, ParsePolicy};
use crate::error::EngineError;
use crate::history::{HistoryStore, JsonLinesHistory};
use crate::pipeline::{self, CompressionOutcome};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = "Compare Fibonacci, Huffman and LZW coding of integer datasets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compresses a dataset with every codec and reports the comparison
    Compress {
        /// Values separated by commas or whitespace, e.g. "1,2,3"
        #[arg(short, long, conflicts_with = "input", required_unless_present = "input")]
        values: Option<String>,

        /// CSV file to read values from
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Skip tokens that are not positive integers instead of rejecting the input
        #[arg(long)]
        lenient: bool,

        /// Integrity hash for the report [sha256, crc32]
        #[arg(short, long, default_value = "sha256")]
        checksum: ChecksumType,

        /// Abandon the comparison after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Run the codecs one after another
        #[arg(long)]
        sequential: bool,

        /// Number of threads to use (default: all available cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Append the report to this JSON-lines history file
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decodes a Fibonacci bitstring back to its values
    Decompress {
        /// Bitstring of '0' and '1' characters
        #[arg(short, long)]
        bits: String,

        /// Number of values to decode; trailing bits are ignored
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Lists stored reports, newest first
    History {
        /// JSON-lines history file
        #[arg(short, long, value_name = "FILE")]
        path: PathBuf,

        #[arg(short, long, default_value_t = 100)]
        limit: usize,

        #[arg(short, long, default_value_t = 0)]
        offset: usize,
    },
}

pub fn run() -> Result<(), EngineError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compress {
            values,
            input,
            lenient,
            checksum,
            timeout_ms,
            sequential,
            threads,
            history,
            json,
        } => {
            let mut config = EngineConfig {
                checksum,
                parallel: !sequential,
                threads: threads.unwrap_or_else(num_cpus::get),
                deadline: timeout_ms.map(Duration::from_millis),
                ..Default::default()
            };
            if lenient {
                config = config.with_policy(ParsePolicy::Lenient);
            }
            pipeline::configure_threads(config.threads);

            let mut store = history.map(JsonLinesHistory::new);
            let store = store.as_mut().map(|s| s as &mut dyn HistoryStore);

            let outcome = match (values, input) {
                (Some(text), _) => pipeline::compress_text(&text, &config, store)?,
                (None, Some(path)) => {
                    let reader = BufReader::new(File::open(&path)?);
                    pipeline::compress_csv(reader, &config, store)?
                }
                (None, None) => {
                    return Err(EngineError::ConfigError("either --values or --input is required".to_string()))
                }
            };

            if json {
                println!("{}", outcome.report.to_json_pretty()?);
            } else {
                print_summary(&outcome);
            }
        }
        Commands::Decompress { bits, count } => {
            let values = pipeline::decompress_fibonacci(&bits, count)?;
            let text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            println!("{}", text.join(","));
        }
        Commands::History { path, limit, offset } => {
            let store = JsonLinesHistory::new(path);
            for record in store.list(limit, offset)? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
    }

    Ok(())
}

fn print_summary(outcome: &CompressionOutcome) {
    let report = &outcome.report;
    let stats = &report.batch_stats;
    println!("Comparison successful!");
    println!(
        "  Values:           {} (min {}, max {}, avg {:.2})",
        stats.count, stats.min_value, stats.max_value, stats.avg_value
    );
    println!("  Original Size:    {} bits", report.per_codec.fibonacci.original_bits);
    println!("  Bytes Saved:      {:.2} bytes (fibonacci)", outcome.bytes_saved);
    println!("  Max Fibonacci:    {}", outcome.max_fibonacci_used);
    println!();
    println!("  {:<10} {:>12} {:>9} {:>11} {:>12}", "codec", "bits", "ratio", "reduction", "encode");
    for (kind, record) in report.per_codec.iter() {
        let marker = if kind == report.best_method { "*" } else { " " };
        println!(
            "{} {:<10} {:>12} {:>8.2}x {:>10.2}% {:>10.3}ms",
            marker,
            kind,
            record.compressed_bits,
            record.ratio,
            record.reduction_pct,
            record.encode_time * 1000.0
        );
    }
    println!();
    println!("  Best Method:      {}", report.best_method);
    println!(
        "  Fibonacci vs {}:  {:+.2}%",
        CodecKind::Huffman,
        report.deltas.vs_huffman
    );
    println!("  Fibonacci vs {}:      {:+.2}%", CodecKind::Lzw, report.deltas.vs_lzw);
    println!("  Elapsed Time:     {:.2?}", outcome.elapsed);
}
