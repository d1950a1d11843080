//! Batching pacer
//!
//! Groups forwarded records into batches and throttles batch emission to a
//! target per-record delay (or rate).

mod batching;
mod pacing;

pub use batching::{BatchLimits, Batcher, FlushedBatch};
pub use pacing::{Clock, ManualClock, Pacer, Pacing, SystemClock};

use std::io::{self, Write};

use crate::source::Record;

/// A [`Batcher`] whose flushes are paced by a [`Pacer`].
#[derive(Debug)]
pub struct BatchingPacer<C> {
    batcher: Batcher,
    pacer: Pacer<C>,
}

impl<C: Clock> BatchingPacer<C> {
    pub fn new(limits: BatchLimits, pacing: Pacing, clock: C) -> Self {
        Self {
            batcher: Batcher::new(limits),
            pacer: Pacer::new(pacing, clock),
        }
    }

    /// Drops pending records and re-anchors pacing at the current time.
    pub fn start(&mut self) {
        self.batcher.clear();
        self.pacer.start();
    }

    /// Adds `record`, flushing and pacing if the batch is full.
    pub fn push<W: Write>(
        &mut self,
        record: &Record,
        writer: &mut W,
    ) -> io::Result<Option<FlushedBatch>> {
        if self.batcher.push(record) {
            self.flush(writer)
        } else {
            Ok(None)
        }
    }

    /// Flushes whatever is pending, then paces.
    pub fn flush<W: Write>(&mut self, writer: &mut W) -> io::Result<Option<FlushedBatch>> {
        let flushed = self.batcher.flush(writer)?;
        if let Some(batch) = flushed {
            self.pacer.after_flush(batch.records);
        }
        Ok(flushed)
    }
}
