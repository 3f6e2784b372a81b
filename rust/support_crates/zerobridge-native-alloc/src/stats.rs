//! Per-thread allocator call counters.
//!
//! Counters are kept per thread so that a test can take a snapshot, run a scenario and
//! compare, without interference from other tests running in parallel.

use std::cell::Cell;

thread_local! {
    static COUNTERS: Cell<AllocatorStats> = const { Cell::new(AllocatorStats::ZERO) };
}

/// Snapshot of the native allocator calls made by the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Number of successful allocations.
    pub allocations: u64,
    /// Number of frees that reached the platform allocator.
    pub frees: u64,
    /// Total bytes requested by successful allocations.
    pub bytes_allocated: u64,
}

impl AllocatorStats {
    const ZERO: AllocatorStats = AllocatorStats {
        allocations: 0,
        frees: 0,
        bytes_allocated: 0,
    };

    /// Returns the counters of the calling thread.
    pub fn current_thread() -> AllocatorStats {
        COUNTERS.with(Cell::get)
    }

    /// Returns the calls made between `earlier` and `self`.
    pub fn since(&self, earlier: &AllocatorStats) -> AllocatorStats {
        AllocatorStats {
            allocations: self.allocations - earlier.allocations,
            frees: self.frees - earlier.frees,
            bytes_allocated: self.bytes_allocated - earlier.bytes_allocated,
        }
    }

    /// Allocations not yet matched by a free on this thread.
    pub fn outstanding(&self) -> i64 {
        self.allocations as i64 - self.frees as i64
    }
}

pub(crate) fn record_allocation(size: u64) {
    COUNTERS.with(|c| {
        let mut s = c.get();
        s.allocations += 1;
        s.bytes_allocated += size;
        c.set(s);
    });
}

pub(crate) fn record_free() {
    COUNTERS.with(|c| {
        let mut s = c.get();
        s.frees += 1;
        c.set(s);
    });
}
