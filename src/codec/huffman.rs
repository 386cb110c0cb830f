//! Huffman coding over integer symbols
//!
//! Symbols are the distinct values of the dataset, so each input number maps
//! to exactly one codeword, the same granularity as Fibonacci coding. The tree
//! is built with a min-heap; equal frequencies are merged in insertion order
//! (leaves by first appearance, then internal nodes by creation), so the same
//! dataset always yields the same codebook.

use super::{CancelFlag, Codec, CodecKind, Encoding};
use crate::bits::BitString;
use crate::error::{EngineError, InputError, Result};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HuffmanNode {
    Leaf { symbol: u64 },
    Internal { left: usize, right: usize },
}

/// Huffman codec built for one dataset's symbol frequencies.
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    /// Arena; leaves first in insertion order, then internal nodes in creation order.
    nodes: Vec<HuffmanNode>,
    root: usize,
    codebook: HashMap<u64, BitString>,
    frequencies: Vec<(u64, u64)>,
}

impl HuffmanCodec {
    /// Build the tree from the symbol frequencies of `values`.
    pub fn from_values(values: &[u64]) -> Result<Self> {
        let frequencies = count_frequencies(values);
        if frequencies.is_empty() {
            return Err(InputError::Empty.into());
        }

        let mut nodes: Vec<HuffmanNode> = frequencies
            .iter()
            .map(|&(symbol, _)| HuffmanNode::Leaf { symbol })
            .collect();

        // (frequency, node index): the index doubles as the insertion-order tie-break.
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = frequencies
            .iter()
            .enumerate()
            .map(|(index, &(_, freq))| Reverse((freq, index)))
            .collect();

        while heap.len() > 1 {
            let (Some(Reverse((left_freq, left))), Some(Reverse((right_freq, right)))) =
                (heap.pop(), heap.pop())
            else {
                break;
            };
            nodes.push(HuffmanNode::Internal { left, right });
            heap.push(Reverse((left_freq + right_freq, nodes.len() - 1)));
        }

        let root = heap.pop().map(|Reverse((_, index))| index).unwrap_or(0);
        let codebook = build_codebook(&nodes, root);

        log::debug!(
            "huffman tree: {} symbols, {} nodes",
            frequencies.len(),
            nodes.len()
        );

        Ok(Self {
            nodes,
            root,
            codebook,
            frequencies,
        })
    }

    /// Codeword for a single symbol.
    pub fn encode(&self, symbol: u64) -> Result<BitString> {
        self.codebook
            .get(&symbol)
            .cloned()
            .ok_or(EngineError::UnknownSymbol {
                codec: CodecKind::Huffman,
                value: symbol,
            })
    }

    /// Decode exactly one codeword.
    pub fn decode(&self, bits: &BitString) -> Result<u64> {
        match self.decode_dataset(bits, None)?.as_slice() {
            [symbol] => Ok(*symbol),
            other => Err(EngineError::MalformedBitstream(format!(
                "expected one codeword, found {}",
                other.len()
            ))),
        }
    }

    pub fn code_for(&self, symbol: u64) -> Option<&BitString> {
        self.codebook.get(&symbol)
    }

    fn working_set_bytes(&self) -> usize {
        let codes: usize = self.codebook.values().map(BitString::heap_bytes).sum();
        self.nodes.len() * std::mem::size_of::<HuffmanNode>()
            + self.frequencies.len() * std::mem::size_of::<(u64, u64)>()
            + self.codebook.len() * std::mem::size_of::<(u64, BitString)>()
            + codes
    }
}

impl Codec for HuffmanCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Huffman
    }

    fn encode_tracked(&self, values: &[u64], cancel: &CancelFlag) -> Result<Encoding> {
        let mut bits = BitString::new();
        for (index, &value) in values.iter().enumerate() {
            cancel.checkpoint(index)?;
            let code = self.codebook.get(&value).ok_or(EngineError::UnknownSymbol {
                codec: CodecKind::Huffman,
                value,
            })?;
            bits.extend_from(code);
        }
        Ok(Encoding {
            bits,
            working_set_bytes: self.working_set_bytes(),
        })
    }

    fn decode_dataset(&self, bits: &BitString, count: Option<usize>) -> Result<Vec<u64>> {
        let mut values = Vec::with_capacity(count.unwrap_or(0).min(bits.len()));
        let mut node = self.root;

        for bit in bits.iter() {
            if count == Some(values.len()) {
                break;
            }
            node = match self.nodes[node] {
                // One-symbol tree: every codeword is a single 0.
                HuffmanNode::Leaf { symbol } if !bit => {
                    values.push(symbol);
                    continue;
                }
                HuffmanNode::Leaf { .. } => {
                    return Err(EngineError::MalformedBitstream(
                        "single-symbol stream contains a 1 bit".to_string(),
                    ))
                }
                HuffmanNode::Internal { left, right } => {
                    if bit {
                        right
                    } else {
                        left
                    }
                }
            };
            if let HuffmanNode::Leaf { symbol } = self.nodes[node] {
                values.push(symbol);
                node = self.root;
            }
        }

        if node != self.root && count != Some(values.len()) {
            return Err(EngineError::MalformedBitstream(
                "stream ends inside a codeword".to_string(),
            ));
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

/// Frequencies of each distinct value, in order of first appearance.
fn count_frequencies(values: &[u64]) -> Vec<(u64, u64)> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut frequencies: Vec<(u64, u64)> = Vec::new();
    for &value in values {
        match index.get(&value) {
            Some(&i) => frequencies[i].1 += 1,
            None => {
                index.insert(value, frequencies.len());
                frequencies.push((value, 1));
            }
        }
    }
    frequencies
}

/// Walk the tree assigning `0` to left edges and `1` to right edges.
fn build_codebook(nodes: &[HuffmanNode], root: usize) -> HashMap<u64, BitString> {
    let mut codebook = HashMap::new();
    if let HuffmanNode::Leaf { symbol } = nodes[root] {
        let mut code = BitString::new();
        code.push(false);
        codebook.insert(symbol, code);
        return codebook;
    }

    let mut stack = vec![(root, BitString::new())];
    while let Some((index, prefix)) = stack.pop() {
        match nodes[index] {
            HuffmanNode::Leaf { symbol } => {
                codebook.insert(symbol, prefix);
            }
            HuffmanNode::Internal { left, right } => {
                let mut left_code = prefix.clone();
                left_code.push(false);
                let mut right_code = prefix;
                right_code.push(true);
                stack.push((right, right_code));
                stack.push((left, left_code));
            }
        }
    }
    codebook
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_codebook_for_skewed_frequencies() {
        let values = [1, 2, 2, 3, 3, 3, 4, 4, 4, 4];
        let codec = HuffmanCodec::from_values(&values).unwrap();
        assert_eq!(codec.code_for(4).unwrap().to_string(), "0");
        assert_eq!(codec.code_for(3).unwrap().to_string(), "10");
        assert_eq!(codec.code_for(1).unwrap().to_string(), "110");
        assert_eq!(codec.code_for(2).unwrap().to_string(), "111");

        let bits = codec.encode_dataset(&values).unwrap();
        assert_eq!(bits.len(), 19);
        assert_eq!(codec.decode_dataset(&bits, Some(values.len())).unwrap(), values);
        assert_eq!(codec.decode_dataset(&bits, None).unwrap(), values);
    }

    #[test]
    fn test_single_symbol_uses_one_bit() {
        let values = [7u64; 12];
        let codec = HuffmanCodec::from_values(&values).unwrap();
        assert_eq!(codec.encode(7).unwrap().to_string(), "0");
        let bits = codec.encode_dataset(&values).unwrap();
        assert_eq!(bits.to_string(), "0".repeat(12));
        assert_eq!(codec.decode_dataset(&bits, Some(12)).unwrap(), values);
        assert_eq!(codec.decode(&"0".parse().unwrap()).unwrap(), 7);
        assert!(codec.decode_dataset(&"001".parse().unwrap(), None).is_err());
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        // All frequencies equal: the first two symbols seen merge first.
        let codec = HuffmanCodec::from_values(&[9, 8, 7, 6]).unwrap();
        let again = HuffmanCodec::from_values(&[9, 8, 7, 6]).unwrap();
        for symbol in [9, 8, 7, 6] {
            assert_eq!(codec.code_for(symbol), again.code_for(symbol));
            assert_eq!(codec.code_for(symbol).unwrap().len(), 2);
        }
        assert_eq!(codec.code_for(9).unwrap().to_string(), "00");
        assert_eq!(codec.code_for(8).unwrap().to_string(), "01");
        assert_eq!(codec.code_for(7).unwrap().to_string(), "10");
        assert_eq!(codec.code_for(6).unwrap().to_string(), "11");
    }

    #[test]
    fn test_prefix_free() {
        let values: Vec<u64> = (1..=40).flat_map(|v| std::iter::repeat(v).take(v as usize % 7 + 1)).collect();
        let codec = HuffmanCodec::from_values(&values).unwrap();
        let codes: Vec<String> = (1..=40).map(|v| codec.code_for(v).unwrap().to_string()).collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a.as_str()), "{} is a prefix of {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_random_roundtrip() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let len = rng.gen_range(1..=1000);
            let alphabet = rng.gen_range(1..=64u64);
            let values: Vec<u64> = (0..len).map(|_| rng.gen_range(1..=alphabet) * 13).collect();
            let codec = HuffmanCodec::from_values(&values).unwrap();
            let bits = codec.encode_dataset(&values).unwrap();
            assert_eq!(codec.decode_dataset(&bits, Some(values.len())).unwrap(), values);
        }
    }

    #[test]
    fn test_unknown_symbol_and_truncation() {
        let codec = HuffmanCodec::from_values(&[1, 2, 3]).unwrap();
        assert!(matches!(
            codec.encode(99),
            Err(EngineError::UnknownSymbol { value: 99, .. })
        ));
        let bits = codec.encode_dataset(&[3, 3]).unwrap();
        let mut truncated: BitString = bits.iter().collect();
        truncated.push(true);
        assert!(codec.decode_dataset(&truncated, None).is_err());
        assert_eq!(codec.decode_dataset(&truncated, Some(2)).unwrap(), vec![3, 3]);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            HuffmanCodec::from_values(&[]),
            Err(EngineError::InvalidInput(InputError::Empty))
        ));
    }
}
