//! Fixed-capacity batching of accepted records
//!
//! The batcher never holds more than `capacity` records. When a push fills it,
//! the full chunk is handed back to the caller, which must finish writing it
//! before pulling another row from the source. That hand-back is the pause
//! signal: with one caller and no concurrent pulls, at most one chunk is ever
//! in flight.

use collab_common::AssignmentRecord;

#[derive(Debug)]
pub struct ChunkBatcher {
    capacity: usize,
    pending: Vec<AssignmentRecord>,
    chunks_emitted: usize,
}

impl ChunkBatcher {
    /// `capacity` is clamped to at least 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            pending: Vec::with_capacity(capacity),
            chunks_emitted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Chunks handed out so far, including the final partial one
    pub fn chunks_emitted(&self) -> usize {
        self.chunks_emitted
    }

    /// Append a record. Returns the full chunk once capacity is reached,
    /// leaving the batcher empty.
    #[must_use = "a full chunk must be flushed before reading more rows"]
    pub fn push(&mut self, record: AssignmentRecord) -> Option<Vec<AssignmentRecord>> {
        self.pending.push(record);
        if self.pending.len() >= self.capacity {
            Some(self.take())
        } else {
            None
        }
    }

    /// Hand out whatever remains at end of input; `None` if nothing is pending
    pub fn finish(&mut self) -> Option<Vec<AssignmentRecord>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    fn take(&mut self) -> Vec<AssignmentRecord> {
        self.chunks_emitted += 1;
        std::mem::replace(&mut self.pending, Vec::with_capacity(self.capacity))
    }
}
