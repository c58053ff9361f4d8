//! NUMA-pinned monotonic pool
//!
//! A [`NumaPool`] hands out aligned slices of a fixed, node-bound buffer by
//! bumping a cursor. Nothing is ever reused while the pool lives:
//! deallocation only adjusts the accounting counter, and the buffer is
//! released in one piece when the pool is dropped. Pools are sized for one
//! column's worth of segments and discarded as a unit, which is what makes
//! the append-only design acceptable.
//!
//! ## Invariants
//!
//! - Base address and capacity are fixed at construction
//! - The cursor only moves forward; handed-out ranges never overlap
//! - `allocated_bytes` is net of accounting deallocations
//! - `!Sync`: one writer at a time, serialized by the caller

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::error::{AllocResult, MemoryError};
use crate::fatal;
use crate::platform::{self, MappedRegion, NumaNode};

/// Append-only memory arena pinned to one NUMA node.
pub struct NumaPool {
    region: MappedRegion,
    node: NumaNode,
    capacity: usize,
    /// Offset of the first unused byte.
    cursor: Cell<usize>,
    /// Bytes handed out, net of accounting deallocations.
    allocated: Cell<usize>,
}

impl NumaPool {
    /// Allocate a `capacity`-byte buffer bound to `node`.
    ///
    /// Terminates the process if `node` is outside the host's node range or
    /// the kernel refuses the mapping. Both are configuration errors: the
    /// requested placement does not exist, so there is nothing to retry.
    pub fn create(capacity: usize, node: NumaNode) -> Self {
        let nodes = platform::node_count();
        if node.0 >= nodes {
            fatal!(
                "invalid NUMA node {} (valid: 0..{})",
                node.0,
                nodes - 1
            );
        }

        let region = match platform::map_on_node(capacity, node) {
            Ok(region) => region,
            Err(err) => {
                fatal!("failed to allocate {capacity} bytes on {node}: {err}");
            }
        };

        Self {
            region,
            node,
            capacity,
            cursor: Cell::new(0),
            allocated: Cell::new(0),
        }
    }

    /// Serve an aligned allocation from the unused remainder of the buffer.
    ///
    /// Fails with [`MemoryError::OutOfPoolMemory`] once the remainder cannot
    /// hold the request; that error is the engine's "pool too small" signal.
    pub fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        let size = layout.size();
        let align = layout.align();

        let base = self.start_address();
        let cursor = self.cursor.get();
        let aligned_offset = align_up(base + cursor, align) - base;

        let Some(end) = aligned_offset.checked_add(size) else {
            return Err(MemoryError::InvalidLayout { size, align });
        };
        if end > self.capacity {
            return Err(MemoryError::OutOfPoolMemory {
                requested: size,
                align,
                remaining: self.capacity - cursor,
            });
        }

        self.cursor.set(end);
        self.allocated.set(self.allocated.get() + size);

        // SAFETY: aligned_offset + size <= capacity <= mapped length, so the
        // range lies inside the live mapping; cursor monotonicity guarantees
        // it does not overlap any previously returned range.
        let ptr = unsafe { self.region.as_ptr().as_ptr().add(aligned_offset) };
        let ptr = NonNull::new(ptr).expect("pool base is non-null");
        Ok(NonNull::slice_from_raw_parts(ptr, size))
    }

    /// Accounting-only release. The address range stays reserved until the
    /// pool itself is dropped.
    pub fn deallocate(&self, _ptr: NonNull<u8>, layout: Layout) {
        let released = layout.size().min(self.allocated.get());
        self.allocated.set(self.allocated.get() - released);
    }

    /// First byte address of the backing buffer.
    pub fn start_address(&self) -> usize {
        self.region.as_ptr().as_ptr() as usize
    }

    /// One-past-the-end byte address of the usable buffer.
    pub fn end_address(&self) -> usize {
        self.start_address() + self.capacity
    }

    /// Usable capacity in bytes, as requested at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out, net of accounting deallocations.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.get()
    }

    /// Unused bytes past the cursor.
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor.get()
    }

    /// The node this pool's pages are bound to.
    pub fn node(&self) -> NumaNode {
        self.node
    }

    /// Whether `addr` falls inside this pool's buffer.
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.start_address() && addr < self.end_address()
    }

    /// Diagnostic probe: where does the kernel actually place pages requested
    /// on this pool's node? `None` when the host cannot answer (no NUMA
    /// syscalls, or the query failed). Not used for correctness.
    pub fn verify_numa_node(&self) -> Option<usize> {
        platform::probe_node_residency(self.node)
    }
}

impl core::fmt::Debug for NumaPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NumaPool")
            .field("node", &self.node)
            .field("capacity", &self.capacity)
            .field("allocated", &self.allocated.get())
            .field("start", &format_args!("{:#x}", self.start_address()))
            .finish()
    }
}

fn align_up(addr: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (addr + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_boundary() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 64), 64);
    }

    #[test]
    fn zero_sized_allocation_does_not_advance() {
        let pool = NumaPool::create(128, NumaNode(0));
        let layout = Layout::from_size_align(0, 8).unwrap();
        pool.allocate(layout).expect("zero-sized allocation failed");
        assert_eq!(pool.remaining(), 128);
        assert_eq!(pool.allocated_bytes(), 0);
    }
}
