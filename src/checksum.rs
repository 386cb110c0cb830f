//! Integrity digests for datasets and encoded bitstreams
//!
//! Digests are rendered as lowercase hex so they can be stored and compared
//! as plain strings in reports.

use crate::config::ChecksumType;
use crc32fast::Hasher as Crc32Hasher;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Digest calculator for a fixed checksum type
#[derive(Debug, Clone, Copy)]
pub struct ChecksumCalculator {
    checksum_type: ChecksumType,
}

impl ChecksumCalculator {
    pub fn new(checksum_type: ChecksumType) -> Self {
        Self { checksum_type }
    }

    /// Hex digest of `data`
    pub fn hex_digest(&self, data: &[u8]) -> String {
        match self.checksum_type {
            ChecksumType::CRC32 => format!("{:08x}", crc32(data)),
            ChecksumType::SHA256 => to_hex(&sha256(data)),
        }
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}
