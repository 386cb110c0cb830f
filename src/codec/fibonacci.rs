//! Fibonacci (Zeckendorf) coding
//!
//! Every positive integer is a unique sum of non-consecutive Fibonacci
//! numbers. A codeword marks the terms used, lowest term first, and appends a
//! terminating `1`. Since a Zeckendorf representation never marks two
//! adjacent terms, `11` appears only at the end of each codeword, which makes
//! the code prefix-free and lets a decoder find boundaries in a concatenated
//! stream without any length information.

use super::{CancelFlag, Codec, CodecKind, Encoding};
use crate::bits::BitString;
use crate::error::{EngineError, InputError, Result};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Ascending Fibonacci terms `1, 2, 3, 5, 8, ...`.
///
/// The table only ever grows. Growth takes the write lock; lookups take the
/// read lock, so one table can be shared between concurrent codecs.
#[derive(Debug)]
pub struct FibonacciTable {
    terms: RwLock<Vec<u64>>,
}

impl FibonacciTable {
    pub fn new() -> Self {
        Self {
            terms: RwLock::new(vec![1, 2]),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<u64>> {
        // The vector is append-only, so a poisoned guard still holds a valid prefix.
        self.terms.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Grow until the last term is `>= value` or the next term would not fit in `u64`.
    pub fn ensure_covers(&self, value: u64) {
        if self.read().last().is_some_and(|&last| last >= value) {
            return;
        }
        let mut terms = self.terms.write().unwrap_or_else(PoisonError::into_inner);
        loop {
            let n = terms.len();
            let (a, b) = (terms[n - 2], terms[n - 1]);
            if b >= value {
                break;
            }
            match a.checked_add(b) {
                Some(next) => terms.push(next),
                None => break,
            }
        }
    }

    /// Grow to every term representable in `u64`.
    pub fn ensure_complete(&self) {
        self.ensure_covers(u64::MAX);
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    /// Largest term `<= value`, growing the table if needed.
    pub fn largest_at_most(&self, value: u64) -> Option<u64> {
        self.ensure_covers(value);
        let terms = self.read();
        let count = terms.partition_point(|&t| t <= value);
        count.checked_sub(1).map(|i| terms[i])
    }
}

impl Default for FibonacciTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of scanning for one codeword starting at a bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanStep {
    /// A complete codeword; `next` is the position after its terminator.
    Codeword { value: u64, next: usize },
    /// The scan started at the end of the stream.
    End,
    /// Bits remain but no `11` terminator follows them.
    Unterminated { start: usize },
}

/// Fibonacci codec
#[derive(Debug, Clone)]
pub struct FibonacciCodec {
    table: Arc<FibonacciTable>,
}

impl FibonacciCodec {
    pub fn new() -> Self {
        Self {
            table: Arc::new(FibonacciTable::new()),
        }
    }

    /// Use a table shared with other codec instances.
    pub fn with_table(table: Arc<FibonacciTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<FibonacciTable> {
        &self.table
    }

    /// Encode a single positive integer.
    pub fn encode(&self, n: u64) -> Result<BitString> {
        let mut bits = BitString::new();
        self.encode_into(n, &mut bits)?;
        Ok(bits)
    }

    fn encode_into(&self, n: u64, out: &mut BitString) -> Result<()> {
        if n == 0 {
            return Err(InputError::NonPositive(n.to_string()).into());
        }
        self.table.ensure_covers(n);
        let terms = self.table.read();

        // Only terms <= n take part; the table may hold one larger term.
        let used = terms.partition_point(|&t| t <= n);
        let mut marks = vec![false; used];
        let mut remainder = n;
        for i in (0..used).rev() {
            if terms[i] <= remainder {
                marks[i] = true;
                remainder -= terms[i];
            }
        }
        debug_assert_eq!(remainder, 0);

        for mark in marks {
            out.push(mark);
        }
        out.push(true);
        Ok(())
    }

    /// Decode exactly one codeword.
    pub fn decode(&self, bits: &BitString) -> Result<u64> {
        self.table.ensure_complete();
        let terms = self.table.read();
        match scan_codeword(&terms, bits, 0)? {
            ScanStep::Codeword { value, next } if next == bits.len() => Ok(value),
            ScanStep::Codeword { next, .. } => Err(EngineError::MalformedBitstream(format!(
                "{} trailing bits after codeword",
                bits.len() - next
            ))),
            ScanStep::End => Err(EngineError::MalformedBitstream("empty codeword".to_string())),
            ScanStep::Unterminated { .. } => Err(EngineError::MalformedBitstream(
                "codeword does not end in 11".to_string(),
            )),
        }
    }

    /// Largest Fibonacci term used when encoding `n`.
    pub fn largest_term_used(&self, n: u64) -> Option<u64> {
        self.table.largest_at_most(n)
    }
}

impl Default for FibonacciCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for FibonacciCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Fibonacci
    }

    fn encode_tracked(&self, values: &[u64], cancel: &CancelFlag) -> Result<Encoding> {
        if let Some(&max) = values.iter().max() {
            self.table.ensure_covers(max);
        }
        let mut bits = BitString::new();
        for (index, &n) in values.iter().enumerate() {
            cancel.checkpoint(index)?;
            self.encode_into(n, &mut bits)?;
        }
        Ok(Encoding {
            bits,
            working_set_bytes: self.table.len() * std::mem::size_of::<u64>(),
        })
    }

    fn decode_dataset(&self, bits: &BitString, count: Option<usize>) -> Result<Vec<u64>> {
        self.table.ensure_complete();
        let terms = self.table.read();
        let mut values = Vec::with_capacity(count.unwrap_or(0).min(bits.len() / 2));
        let mut pos = 0;

        loop {
            if count == Some(values.len()) {
                break;
            }
            match scan_codeword(&terms, bits, pos)? {
                ScanStep::Codeword { value, next } => {
                    values.push(value);
                    pos = next;
                }
                ScanStep::End => break,
                // A zero tail is byte-packing padding.
                ScanStep::Unterminated { start } if count.is_none() && bits.is_zero_from(start) => break,
                ScanStep::Unterminated { start } => {
                    return Err(EngineError::MalformedBitstream(format!(
                        "no terminator found after bit {}",
                        start
                    )))
                }
            }
        }

        if let Some(expected) = count {
            if values.len() != expected {
                return Err(EngineError::MalformedBitstream(format!(
                    "expected {} values, decoded {}",
                    expected,
                    values.len()
                )));
            }
        }
        Ok(values)
    }
}

/// Scan one codeword starting at `start`.
fn scan_codeword(terms: &[u64], bits: &BitString, start: usize) -> Result<ScanStep> {
    if start >= bits.len() {
        return Ok(ScanStep::End);
    }

    let mut value = 0u64;
    let mut previous = false;
    for (index, pos) in (start..bits.len()).enumerate() {
        let bit = bits.get(pos) == Some(true);
        if bit && previous {
            return Ok(ScanStep::Codeword { value, next: pos + 1 });
        }
        if bit {
            value = terms
                .get(index)
                .and_then(|&term| value.checked_add(term))
                .ok_or_else(|| EngineError::EncodingOverflow {
                    value: format!("codeword starting at bit {}", start),
                    limit: u64::MAX.to_string(),
                })?;
        }
        previous = bit;
    }
    Ok(ScanStep::Unterminated { start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const KNOWN_CODES: [(u64, &str); 10] = [
        (1, "11"),
        (2, "011"),
        (3, "0011"),
        (4, "1011"),
        (5, "00011"),
        (6, "10011"),
        (7, "01011"),
        (8, "000011"),
        (10, "010011"),
        (100, "0001010011"),
    ];

    #[test]
    fn test_known_codewords() {
        let codec = FibonacciCodec::new();
        for (n, code) in KNOWN_CODES {
            assert_eq!(codec.encode(n).unwrap().to_string(), code, "encode({})", n);
            assert_eq!(codec.decode(&code.parse().unwrap()).unwrap(), n, "decode({})", code);
        }
    }

    #[test]
    fn test_roundtrip_and_single_terminator_up_to_100000() {
        let codec = FibonacciCodec::new();
        for n in 1..=100_000u64 {
            let code = codec.encode(n).unwrap();
            let text = code.to_string();
            assert!(text.ends_with("11"));
            assert_eq!(text.find("11"), Some(text.len() - 2), "inner 11 in code for {}", n);
            assert_eq!(codec.decode(&code).unwrap(), n);
        }
    }

    #[test]
    fn test_zero_rejected() {
        let err = FibonacciCodec::new().encode(0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(InputError::NonPositive(ref v)) if v == "0"));
    }

    #[test]
    fn test_dataset_concatenation() {
        let codec = FibonacciCodec::new();
        let bits = codec.encode_dataset(&[1, 2, 3]).unwrap();
        assert_eq!(bits.to_string(), "110110011");
        assert_eq!(codec.decode_dataset(&bits, Some(3)).unwrap(), vec![1, 2, 3]);
        assert_eq!(codec.decode_dataset(&bits, None).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_scenario_a_lengths() {
        let codec = FibonacciCodec::new();
        let bits = codec.encode_dataset(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(bits.to_string(), "110110011101100011");
        assert_eq!(bits.len(), 18);
    }

    #[test]
    fn test_random_datasets_roundtrip_with_count() {
        let codec = FibonacciCodec::new();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let len = rng.gen_range(1..=1000);
            let values: Vec<u64> = (0..len).map(|_| rng.gen_range(1..=1_000_000)).collect();
            let bits = codec.encode_dataset(&values).unwrap();
            assert_eq!(codec.decode_dataset(&bits, Some(values.len())).unwrap(), values);
        }
    }

    #[test]
    fn test_count_ignores_trailing_padding() {
        let codec = FibonacciCodec::new();
        let mut bits = codec.encode_dataset(&[7, 9]).unwrap();
        bits.push_bits(0b101, 3);
        assert_eq!(codec.decode_dataset(&bits, Some(2)).unwrap(), vec![7, 9]);
        assert!(codec.decode_dataset(&bits, None).is_err());
    }

    #[test]
    fn test_boundary_only_decode_tolerates_zero_padding() {
        let codec = FibonacciCodec::new();
        let mut bits = codec.encode_dataset(&[4, 1]).unwrap();
        bits.push_bits(0, 5);
        assert_eq!(codec.decode_dataset(&bits, None).unwrap(), vec![4, 1]);
    }

    #[test]
    fn test_count_mismatch_is_malformed() {
        let codec = FibonacciCodec::new();
        let bits = codec.encode_dataset(&[1, 2]).unwrap();
        assert!(matches!(
            codec.decode_dataset(&bits, Some(3)),
            Err(EngineError::MalformedBitstream(_))
        ));
    }

    #[test]
    fn test_single_decode_rejects_bad_codewords() {
        let codec = FibonacciCodec::new();
        assert!(codec.decode(&"0101".parse().unwrap()).is_err());
        assert!(codec.decode(&"11011".parse().unwrap()).is_err());
        assert!(codec.decode(&BitString::new()).is_err());
    }

    #[test]
    fn test_u64_extremes() {
        let codec = FibonacciCodec::new();
        let bits = codec.encode(u64::MAX).unwrap();
        assert_eq!(codec.decode(&bits).unwrap(), u64::MAX);

        // 100 zero bits then 11 names a term far beyond u64.
        let mut oversized = BitString::new();
        oversized.push_bits(0, 64);
        oversized.push_bits(0, 36);
        oversized.push_bits(0b11, 2);
        assert!(matches!(
            codec.decode(&oversized),
            Err(EngineError::EncodingOverflow { .. })
        ));
    }

    #[test]
    fn test_table_grows_append_only() {
        let table = FibonacciTable::new();
        table.ensure_covers(10);
        // 1 2 3 5 8 13
        assert_eq!(table.len(), 6);
        assert_eq!(table.largest_at_most(12), Some(8));
        assert_eq!(table.largest_at_most(13), Some(13));
        table.ensure_covers(5);
        assert_eq!(table.len(), 6);
        assert_eq!(table.largest_at_most(100), Some(89));
        assert_eq!(table.largest_at_most(1), Some(1));
    }

    #[test]
    fn test_shared_table_across_threads() {
        let table = Arc::new(FibonacciTable::new());
        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                let codec = FibonacciCodec::with_table(Arc::clone(&table));
                std::thread::spawn(move || {
                    let values: Vec<u64> = (1..500).map(|v| v * (i + 1) * 7919).collect();
                    let bits = codec.encode_dataset(&values).unwrap();
                    codec.decode_dataset(&bits, Some(values.len())).unwrap() == values
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
