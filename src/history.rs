//! Persistence of completed comparisons.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::report::ComparativeReport;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// A report together with the dataset it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unix seconds
    pub timestamp: u64,
    pub dataset: Vec<u64>,
    pub report: ComparativeReport,
}

impl HistoryRecord {
    pub fn new(dataset: &Dataset, report: ComparativeReport) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            timestamp,
            dataset: dataset.values().to_vec(),
            report,
        }
    }
}

pub trait HistoryStore {
    fn append(&mut self, record: &HistoryRecord) -> Result<()>;

    /// Newest first, skipping `offset` records and returning at most `limit`.
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<HistoryRecord>>;
}

fn newest_first(records: Vec<HistoryRecord>, limit: usize, offset: usize) -> Vec<HistoryRecord> {
    records.into_iter().rev().skip(offset).take(limit).collect()
}

#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Vec<HistoryRecord>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, record: &HistoryRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<HistoryRecord>> {
        Ok(newest_first(self.records.clone(), limit, offset))
    }
}

/// Append-only file with one JSON record per line.
#[derive(Debug, Clone)]
pub struct JsonLinesHistory {
    path: PathBuf,
}

impl JsonLinesHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<HistoryRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl HistoryStore for JsonLinesHistory {
    fn append(&mut self, record: &HistoryRecord) -> Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        log::debug!("appended history record to {}", self.path.display());
        Ok(())
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<HistoryRecord>> {
        Ok(newest_first(self.read_all()?, limit, offset))
    }
}
