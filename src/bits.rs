//! Packed bit sequences shared by all codecs.
//!
//! Bits are stored MSB-first inside each byte. The final partial byte is
//! padded with zeros and the exact bit length is tracked separately, so two
//! `BitString`s compare equal exactly when they hold the same bits.

use crate::error::EngineError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitString {
    bytes: Vec<u8>,
    len: usize,
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Number of bits (not bytes).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            // offset 0 is the most significant bit
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    /// Append the lowest `width` bits of `value`, most significant first.
    pub fn push_bits(&mut self, value: u64, width: u32) {
        debug_assert!(width <= 64);
        for shift in (0..width).rev() {
            self.push((value >> shift) & 1 == 1);
        }
    }

    pub fn extend_from(&mut self, other: &BitString) {
        if self.len % 8 == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.len += other.len;
        } else {
            for bit in other.iter() {
                self.push(bit);
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    /// Read `width` bits starting at `pos` as an unsigned integer, MSB first.
    /// Returns `None` if fewer than `width` bits remain.
    pub fn read_bits(&self, pos: usize, width: u32) -> Option<u64> {
        if width > 64 || pos.checked_add(width as usize)? > self.len {
            return None;
        }
        let mut value = 0u64;
        for i in 0..width as usize {
            value = (value << 1) | u64::from(self.get(pos + i)?);
        }
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bytes[i / 8] & (0x80 >> (i % 8)) != 0)
    }

    /// Packed bytes; the last byte is zero-padded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Heap bytes held by this bit string.
    pub fn heap_bytes(&self) -> usize {
        self.bytes.capacity()
    }

    /// True when every bit from `pos` to the end is zero.
    pub fn is_zero_from(&self, pos: usize) -> bool {
        (pos..self.len).all(|i| self.get(i) == Some(false))
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.iter().map(|bit| if bit { '1' } else { '0' }).collect();
        f.write_str(&text)
    }
}

impl FromStr for BitString {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut bits = BitString::with_capacity(trimmed.len());
        for (i, c) in trimmed.chars().enumerate() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                other => {
                    return Err(EngineError::MalformedBitstream(format!(
                        "unexpected character {:?} at position {}",
                        other, i
                    )))
                }
            }
        }
        Ok(bits)
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = BitString::new();
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}
