//! Compute pipe/queue bindings.
//!
//! Binding is permissive: any `(pipe, queue)` pair is accepted and rebinding overwrites the
//! previous slot. Keeping pairs unique is the guest driver's job, as on hardware.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use orbis_gc_protocol::MapComputeQueueArgs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputeQueueSlot {
    /// 0-based pipe index.
    pub pipe_id: u32,
    pub queue_id: u32,
    pub ring_base_addr: u64,
    pub ring_size_dw: u32,
    /// `1 << ring_size_dw`, or 0 when the exponent does not fit in 64 bits.
    pub ring_size_bytes: u64,
    pub read_ptr_addr: u64,
    pub priority: u32,
}

impl ComputeQueueSlot {
    pub fn from_args(args: &MapComputeQueueArgs, priority: u32) -> Self {
        Self {
            // `pipe_lo` is 1-based; 0 wraps exactly like the guest's u32 arithmetic.
            pipe_id: args.pipe_lo.wrapping_sub(1),
            queue_id: args.queue_id,
            ring_base_addr: args.ring_base_addr,
            ring_size_dw: args.ring_size_dw,
            ring_size_bytes: 1u64.checked_shl(args.ring_size_dw).unwrap_or(0),
            read_ptr_addr: args.read_ptr_addr,
            priority,
        }
    }

    pub fn key(&self) -> (u32, u32) {
        (self.pipe_id, self.queue_id)
    }
}

/// Process-wide table of bound compute queues, keyed by `(pipe_id, queue_id)`.
#[derive(Debug, Default)]
pub struct ComputeQueueTable {
    slots: Mutex<BTreeMap<(u32, u32), ComputeQueueSlot>>,
}

impl ComputeQueueTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, BTreeMap<(u32, u32), ComputeQueueSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds `slot`, returning whatever was bound to the same pair before.
    pub fn map(&self, slot: ComputeQueueSlot) -> Option<ComputeQueueSlot> {
        self.slots().insert(slot.key(), slot)
    }

    pub fn unmap(&self, pipe_id: u32, queue_id: u32) -> Option<ComputeQueueSlot> {
        self.slots().remove(&(pipe_id, queue_id))
    }

    pub fn get(&self, pipe_id: u32, queue_id: u32) -> Option<ComputeQueueSlot> {
        self.slots().get(&(pipe_id, queue_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    /// Snapshot ordered by `(pipe_id, queue_id)`.
    pub fn slots_snapshot(&self) -> Vec<ComputeQueueSlot> {
        self.slots().values().copied().collect()
    }

    pub fn clear(&self) {
        self.slots().clear();
    }
}
