//! Output batching
//!
//! Forwarded records are serialized into one contiguous buffer and written
//! with a single `write_all`. A batch is flushed when it holds `max_records`
//! records or, if a byte limit is set, when its length reaches `max_bytes`,
//! whichever happens first. Record order is arrival order; no record is
//! split across batches.

use std::io::{self, Write};

use crate::source::Record;

/// Batch bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// Records per batch, at least 1.
    pub max_records: usize,
    /// Optional byte bound.
    pub max_bytes: Option<usize>,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_records: 1,
            max_bytes: None,
        }
    }
}

impl BatchLimits {
    pub fn records(max_records: usize) -> Self {
        Self {
            max_records: max_records.max(1),
            max_bytes: None,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

/// Size of one flushed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushedBatch {
    pub records: usize,
    pub bytes: usize,
}

/// Accumulates serialized records until a limit is reached.
#[derive(Debug)]
pub struct Batcher {
    limits: BatchLimits,
    buffer: Vec<u8>,
    record_count: usize,
}

impl Batcher {
    pub fn new(limits: BatchLimits) -> Self {
        let capacity = limits.max_bytes.unwrap_or(4096).min(1 << 20);
        Self {
            limits,
            buffer: Vec::with_capacity(capacity),
            record_count: 0,
        }
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    pub fn pending_records(&self) -> usize {
        self.record_count
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// True once either limit is reached.
    pub fn is_full(&self) -> bool {
        if self.record_count >= self.limits.max_records {
            return true;
        }
        match self.limits.max_bytes {
            Some(max) => self.buffer.len() >= max,
            None => false,
        }
    }

    /// Appends `record`. Returns true if the batch must now be flushed.
    pub fn push(&mut self, record: &Record) -> bool {
        record.encode_into(&mut self.buffer);
        self.record_count += 1;
        self.is_full()
    }

    /// Writes the batch in one `write_all`, flushes the writer and clears
    /// the batch.
    ///
    /// Returns `None` for an empty batch. On error the batch is discarded.
    pub fn flush<W: Write>(&mut self, writer: &mut W) -> io::Result<Option<FlushedBatch>> {
        if self.is_empty() {
            return Ok(None);
        }

        let flushed = FlushedBatch {
            records: self.record_count,
            bytes: self.buffer.len(),
        };
        let result = writer
            .write_all(&self.buffer)
            .and_then(|()| writer.flush());
        self.clear();
        result?;

        Ok(Some(flushed))
    }

    /// Drops any pending records.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.record_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> Record {
        Record::parse(line, ',', 1)
    }

    #[test]
    fn test_count_limit() {
        let mut batcher = Batcher::new(BatchLimits::records(2));
        assert!(!batcher.push(&record("1,a")));
        assert!(batcher.push(&record("2,b")));
    }

    #[test]
    fn test_byte_limit_reached_first() {
        let mut batcher = Batcher::new(BatchLimits::records(100).with_max_bytes(8));
        assert!(!batcher.push(&record("1,a")));
        assert!(batcher.push(&record("2,b")));
        assert_eq!(batcher.pending_bytes(), 8);
    }

    #[test]
    fn test_oversized_record_flushes_alone() {
        let mut batcher = Batcher::new(BatchLimits::records(100).with_max_bytes(4));
        assert!(batcher.push(&record("a-very-long-record")));
        assert_eq!(batcher.pending_records(), 1);
    }

    #[test]
    fn test_flush_writes_concatenated_buffer() {
        let mut batcher = Batcher::new(BatchLimits::records(3));
        batcher.push(&record("1,a"));
        batcher.push(&record("2,b"));

        let mut out = Vec::new();
        let flushed = batcher.flush(&mut out).unwrap().unwrap();

        assert_eq!(out, b"1,a\n2,b\n");
        assert_eq!(flushed, FlushedBatch { records: 2, bytes: 8 });
        assert!(batcher.is_empty());
        assert!(batcher.flush(&mut out).unwrap().is_none());
    }

    #[test]
    fn test_zero_record_limit_is_clamped() {
        let limits = BatchLimits::records(0);
        assert_eq!(limits.max_records, 1);
    }
}
