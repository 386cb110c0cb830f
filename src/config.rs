use crate::error::EngineError;
use std::str::FromStr;
use std::time::Duration;

/// Default LZW dictionary bound; the dictionary freezes once it holds this many entries.
pub const DEFAULT_MAX_DICTIONARY_ENTRIES: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumType {
    CRC32,
    SHA256,
}

/// How the input normalizer treats tokens that are not positive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Any bad token rejects the whole input.
    Strict,
    /// Bad tokens are skipped with a warning.
    Lenient,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub checksum: ChecksumType,
    pub parallel: bool,
    pub threads: usize,
    pub deadline: Option<Duration>,
    pub max_value: u64,
    pub max_dictionary_entries: usize,
    pub policy: ParsePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checksum: ChecksumType::SHA256,
            parallel: true,
            threads: num_cpus::get(),
            deadline: None,
            max_value: u64::MAX,
            max_dictionary_entries: DEFAULT_MAX_DICTIONARY_ENTRIES,
            policy: ParsePolicy::Strict,
        }
    }
}

impl EngineConfig {
    pub fn with_checksum(mut self, checksum: ChecksumType) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_value(mut self, max_value: u64) -> Self {
        self.max_value = max_value;
        self
    }

    pub fn with_max_dictionary_entries(mut self, entries: usize) -> Self {
        self.max_dictionary_entries = entries;
        self
    }

    pub fn with_policy(mut self, policy: ParsePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_value == 0 {
            return Err(EngineError::ConfigError("max_value must be at least 1".to_string()));
        }
        if self.max_dictionary_entries == 0 {
            return Err(EngineError::ConfigError(
                "max_dictionary_entries must be at least 1".to_string(),
            ));
        }
        if self.threads == 0 {
            return Err(EngineError::ConfigError("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl FromStr for ChecksumType {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crc32" => Ok(ChecksumType::CRC32),
            "sha256" | "sha-256" => Ok(ChecksumType::SHA256),
            _ => Err(EngineError::ConfigError(format!("Invalid checksum: {}", s))),
        }
    }
}

impl FromStr for ParsePolicy {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ParsePolicy::Strict),
            "lenient" => Ok(ParsePolicy::Lenient),
            _ => Err(EngineError::ConfigError(format!("Invalid parse policy: {}", s))),
        }
    }
}
