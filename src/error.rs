use crate::codec::CodecKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
	#[error("invalid input: {0}")]
	InvalidInput(#[from] InputError),

	#[error("encoding overflow: {value} exceeds the limit of {limit}")]
	EncodingOverflow { value: String, limit: String },

	#[error("{codec} codec has no codeword for {value}")]
	UnknownSymbol { codec: CodecKind, value: u64 },

	#[error("malformed bitstream: {0}")]
	MalformedBitstream(String),

	#[error("decode invariant violated by {codec} codec: {detail}")]
	DecodeInvariantViolation { codec: CodecKind, detail: String },

	#[error("comparison exceeded its deadline of {0:?}")]
	DeadlineExceeded(Duration),

	#[error("comparison was cancelled")]
	Cancelled,

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Configuration error: {0}")]
	ConfigError(String),
}

impl EngineError {
	/// Errors that indicate a bug rather than bad input. They are never
	/// retried and never produce a persisted report.
	pub fn is_fatal(&self) -> bool {
		matches!(self, EngineError::DecodeInvariantViolation { .. })
	}
}

/// Reasons a dataset is rejected before any codec runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
	#[error("empty dataset")]
	Empty,

	#[error("{0} is not a positive integer")]
	NonPositive(String),

	#[error("{0:?} is not an integer")]
	NotAnInteger(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
