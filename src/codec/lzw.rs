//! LZW coding over integer tokens
//!
//! The initial dictionary holds each distinct token of the dataset, in order
//! of first appearance. Codes are written with a growing width: the k-th
//! emitted code is given just enough bits for the largest code the decoder
//! could see at that point, so both sides derive the width without side
//! information. Once the dictionary reaches its bound it stops growing.
//!
//! Code 0 is all zero bits, so padding cannot be told apart from data.
//! Decoding without a value count needs the exact bit length of the stream.

use super::{bit_length, CancelFlag, Codec, CodecKind, Encoding};
use crate::bits::BitString;
use crate::config::DEFAULT_MAX_DICTIONARY_ENTRIES;
use crate::error::{EngineError, InputError, Result};
use std::collections::HashMap;

/// LZW codec for one dataset's token alphabet.
#[derive(Debug, Clone)]
pub struct LzwCodec {
    alphabet: Vec<u64>,
    index: HashMap<u64, usize>,
    max_entries: usize,
}

impl LzwCodec {
    pub fn from_values(values: &[u64]) -> Result<Self> {
        Self::with_max_entries(values, DEFAULT_MAX_DICTIONARY_ENTRIES)
    }

    /// Build the initial dictionary; it will never grow past `max_entries`
    /// (or the alphabet size, if that is larger).
    pub fn with_max_entries(values: &[u64], max_entries: usize) -> Result<Self> {
        let mut alphabet = Vec::new();
        let mut index = HashMap::new();
        for &value in values {
            index.entry(value).or_insert_with(|| {
                alphabet.push(value);
                alphabet.len() - 1
            });
        }
        if alphabet.is_empty() {
            return Err(InputError::Empty.into());
        }
        Ok(Self {
            alphabet,
            index,
            max_entries,
        })
    }

    /// Dictionary size at which growth stops.
    pub fn limit(&self) -> usize {
        self.max_entries.max(self.alphabet.len())
    }

    /// Width of the `k`-th emitted code (0-based).
    fn code_width(&self, k: usize) -> u32 {
        let max_code = (self.alphabet.len() + k - 1).min(self.limit() - 1);
        bit_length(max_code).max(1)
    }

    fn token_code(&self, token: u64) -> Result<usize> {
        self.index.get(&token).copied().ok_or(EngineError::UnknownSymbol {
            codec: CodecKind::Lzw,
            value: token,
        })
    }

    /// Code for a single token, written at the width of a first emission.
    pub fn encode(&self, token: u64) -> Result<BitString> {
        let mut bits = BitString::new();
        bits.push_bits(self.token_code(token)? as u64, self.code_width(0));
        Ok(bits)
    }

    /// Decode one first-emission code back to its token.
    pub fn decode(&self, bits: &BitString) -> Result<u64> {
        let width = self.code_width(0);
        if bits.len() != width as usize {
            return Err(EngineError::MalformedBitstream(format!(
                "expected a {}-bit code, got {} bits",
                width,
                bits.len()
            )));
        }
        bits.read_bits(0, width)
            .and_then(|code| self.alphabet.get(code as usize).copied())
            .ok_or_else(|| EngineError::MalformedBitstream("code outside the alphabet".to_string()))
    }
}

impl Codec for LzwCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Lzw
    }

    fn encode_tracked(&self, values: &[u64], cancel: &CancelFlag) -> Result<Encoding> {
        let limit = self.limit();
        let mut dictionary: HashMap<(usize, u64), usize> = HashMap::new();
        let mut next_code = self.alphabet.len();
        let mut bits = BitString::new();
        let mut emitted = 0usize;
        let mut phrase: Option<usize> = None;

        for (index, &token) in values.iter().enumerate() {
            cancel.checkpoint(index)?;
            let token_code = self.token_code(token)?;
            let Some(current) = phrase else {
                phrase = Some(token_code);
                continue;
            };
            if let Some(&extended) = dictionary.get(&(current, token)) {
                phrase = Some(extended);
                continue;
            }
            bits.push_bits(current as u64, self.code_width(emitted));
            emitted += 1;
            if next_code < limit {
                dictionary.insert((current, token), next_code);
                next_code += 1;
            }
            phrase = Some(token_code);
        }
        if let Some(current) = phrase {
            bits.push_bits(current as u64, self.code_width(emitted));
        }

        if next_code == limit {
            log::debug!("lzw dictionary frozen at {} entries", limit);
        }

        let entry = std::mem::size_of::<((usize, u64), usize)>();
        Ok(Encoding {
            bits,
            working_set_bytes: dictionary.capacity() * entry
                + self.alphabet.len() * (std::mem::size_of::<u64>() + entry),
        })
    }

    fn decode_dataset(&self, bits: &BitString, count: Option<usize>) -> Result<Vec<u64>> {
        let limit = self.limit();
        let mut entries: Vec<Vec<u64>> = self.alphabet.iter().map(|&t| vec![t]).collect();
        let mut values = Vec::with_capacity(count.unwrap_or(0).min(bits.len() * 4));
        let mut previous: Option<usize> = None;
        let mut pos = 0usize;
        let mut k = 0usize;

        while pos < bits.len() {
            if let Some(expected) = count {
                if values.len() >= expected {
                    break;
                }
            }
            let width = self.code_width(k);
            let Some(code) = bits.read_bits(pos, width) else {
                return Err(EngineError::MalformedBitstream(format!(
                    "truncated code at bit {}",
                    pos
                )));
            };
            let code = code as usize;
            pos += width as usize;

            let entry = match (entries.get(code), previous) {
                (Some(entry), _) => entry.clone(),
                // The code being defined by this very step.
                (None, Some(prev)) if code == entries.len() && entries.len() < limit => {
                    let mut entry = entries[prev].clone();
                    entry.push(entries[prev][0]);
                    entry
                }
                _ => {
                    return Err(EngineError::MalformedBitstream(format!(
                        "invalid code {} at emission {}",
                        code, k
                    )))
                }
            };

            if let Some(prev) = previous {
                if entries.len() < limit {
                    let mut added = entries[prev].clone();
                    added.push(entry[0]);
                    entries.push(added);
                }
            }
            values.extend_from_slice(&entry);
            previous = Some(code);
            k += 1;
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
