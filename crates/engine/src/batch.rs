use model::ops::WriteOp;

/// Accumulates write operations up to a fixed capacity. Flushed and
/// reset as a unit via `take`; never partially drained.
#[derive(Debug)]
pub struct BulkBuffer {
    ops: Vec<WriteOp>,
    capacity: usize,
}

impl BulkBuffer {
    pub fn new(capacity: usize) -> Self {
        BulkBuffer {
            ops: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one operation. The caller flushes once `is_full`; pushing
    /// past capacity is a logic error upstream.
    pub fn push(&mut self, op: WriteOp) {
        debug_assert!(self.ops.len() < self.capacity, "buffer pushed past capacity");
        self.ops.push(op);
    }

    pub fn is_full(&self) -> bool {
        self.ops.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hand out everything pending and reset the buffer.
    pub fn take(&mut self) -> Vec<WriteOp> {
        std::mem::take(&mut self.ops)
    }
}
