use crate::error::{EngineError, InputError, Result};
use serde::{Deserialize, Serialize};

/// Width of the fixed per-value baseline used for compression ratios.
pub const BASELINE_BITS_PER_VALUE: u64 = 32;

/// A validated, non-empty sequence of positive integers.
///
/// The only way to obtain a `Dataset` is through validation, so every codec
/// can rely on `len() >= 1` and `value > 0` without re-checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    values: Vec<u64>,
}

impl Dataset {
    /// Validate `values`. The first invalid element rejects the whole dataset.
    pub fn new(values: Vec<u64>) -> Result<Self> {
        if values.is_empty() {
            return Err(InputError::Empty.into());
        }
        if let Some(bad) = values.iter().find(|&&v| v == 0) {
            return Err(InputError::NonPositive(bad.to_string()).into());
        }
        Ok(Self { values })
    }

    /// Enforce an upper bound on element magnitude.
    pub fn check_max_value(&self, limit: u64) -> Result<()> {
        match self.values.iter().find(|&&v| v > limit) {
            Some(v) => Err(EngineError::EncodingOverflow {
                value: v.to_string(),
                limit: limit.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max_value(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(1)
    }

    pub fn min_value(&self) -> u64 {
        self.values.iter().copied().min().unwrap_or(1)
    }

    /// `len * 32`, independent of value magnitude.
    pub fn baseline_bits(&self) -> u64 {
        self.values.len() as u64 * BASELINE_BITS_PER_VALUE
    }

    /// Decimal values joined with commas, e.g. `1,2,3`. This is the text
    /// that integrity hashes are computed over.
    pub fn canonical_string(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn batch_stats(&self) -> BatchStats {
        let sum: u128 = self.values.iter().map(|&v| u128::from(v)).sum();
        let avg = sum as f64 / self.values.len() as f64;
        BatchStats {
            min_value: self.min_value(),
            max_value: self.max_value(),
            avg_value: (avg * 100.0).round() / 100.0,
            count: self.values.len(),
        }
    }
}

impl TryFrom<Vec<u64>> for Dataset {
    type Error = EngineError;

    fn try_from(values: Vec<u64>) -> Result<Self> {
        Dataset::new(values)
    }
}

/// Summary statistics of the input batch carried in every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub min_value: u64,
    pub max_value: u64,
    pub avg_value: f64,
    pub count: usize,
}
