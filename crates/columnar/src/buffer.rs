//! Pool-aware typed buffers
//!
//! [`PoolBuffer`] is the one storage primitive every segment is built from:
//! a fixed-length typed array backed either by the global heap (freshly
//! ingested data) or by a [`NumaPool`] (migrated data). Copying a buffer
//! into a pool is the leaf operation of column migration.
//!
//! A pool-backed buffer holds a shared handle to its pool; that handle is
//! what keeps the registry from releasing a pool while segment data still
//! lives inside it.

use core::alloc::Layout;
use core::ops::Deref;
use core::ptr::NonNull;
use std::sync::Arc;

use strata_memory::{AllocResult, MemoryError, NumaPool};

/// A `[start, end)` byte range of one live allocation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: usize,
    pub end: usize,
}

impl AddressRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

enum Backing {
    Heap,
    Pool(Arc<NumaPool>),
}

/// Fixed-length typed buffer, heap- or pool-backed.
///
/// Restricted to `Copy` element types: buffers are raw storage, moved by
/// `memcpy` and dropped without element drop glue.
pub struct PoolBuffer<T: Copy> {
    ptr: NonNull<T>,
    len: usize,
    backing: Backing,
}

impl<T: Copy> PoolBuffer<T> {
    /// Take ownership of `values` as a heap-backed buffer.
    pub fn from_vec(values: Vec<T>) -> Self {
        let boxed = values.into_boxed_slice();
        let len = boxed.len();
        let raw = Box::into_raw(boxed);
        let ptr = NonNull::new(raw.cast::<T>()).expect("box pointer is non-null");
        Self { ptr, len, backing: Backing::Heap }
    }

    /// Deep-copy `values` into `pool`, yielding a pool-backed buffer.
    pub fn copy_slice_into_pool(values: &[T], pool: &Arc<NumaPool>) -> AllocResult<Self> {
        let layout = Layout::array::<T>(values.len()).map_err(|_| MemoryError::InvalidLayout {
            size: values.len(),
            align: core::mem::align_of::<T>(),
        })?;
        let dst = pool.allocate(layout)?;
        let ptr = dst.cast::<T>();
        // SAFETY: dst is a freshly served, exclusive range of at least
        // `values.len()` elements, properly aligned for T; the source slice
        // cannot overlap memory the pool just handed out.
        unsafe {
            core::ptr::copy_nonoverlapping(values.as_ptr(), ptr.as_ptr(), values.len());
        }
        Ok(Self {
            ptr,
            len: values.len(),
            backing: Backing::Pool(Arc::clone(pool)),
        })
    }

    /// Deep-copy this buffer into `pool`.
    pub fn copy_into_pool(&self, pool: &Arc<NumaPool>) -> AllocResult<Self> {
        Self::copy_slice_into_pool(self.as_slice(), pool)
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr/len describe this buffer's owned allocation, which is
        // initialized at construction and immutable afterwards.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Occupied bytes, independent of backing.
    pub fn byte_size(&self) -> usize {
        self.len * core::mem::size_of::<T>()
    }

    /// Byte range of the underlying allocation.
    pub fn address_range(&self) -> AddressRange {
        let start = self.ptr.as_ptr() as usize;
        AddressRange { start, end: start + self.byte_size() }
    }

    /// The pool this buffer lives in, if it is pool-backed.
    pub fn backing_pool(&self) -> Option<&Arc<NumaPool>> {
        match &self.backing {
            Backing::Heap => None,
            Backing::Pool(pool) => Some(pool),
        }
    }
}

impl<T: Copy> Deref for PoolBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy> Drop for PoolBuffer<T> {
    fn drop(&mut self) {
        match &self.backing {
            Backing::Heap => {
                // SAFETY: reconstructs exactly the Box<[T]> taken apart in
                // `from_vec`; drop runs at most once.
                unsafe {
                    drop(Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                        self.ptr.as_ptr(),
                        self.len,
                    )));
                }
            }
            Backing::Pool(pool) => {
                let layout =
                    Layout::array::<T>(self.len).expect("layout was valid at construction");
                pool.deallocate(self.ptr.cast::<u8>(), layout);
            }
        }
    }
}

impl<T: Copy + core::fmt::Debug> core::fmt::Debug for PoolBuffer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PoolBuffer")
            .field("len", &self.len)
            .field("pooled", &self.backing_pool().is_some())
            .finish()
    }
}

/// One string whose bytes live in a pool.
///
/// Text dictionaries cannot be bulk-copied the way fixed-width buffers can;
/// migration materializes them one string at a time through this type.
#[derive(Debug)]
pub struct PoolString {
    bytes: PoolBuffer<u8>,
}

impl PoolString {
    /// Deep-copy `s` into `pool`.
    pub fn copy_into_pool(s: &str, pool: &Arc<NumaPool>) -> AllocResult<Self> {
        Ok(Self {
            bytes: PoolBuffer::copy_slice_into_pool(s.as_bytes(), pool)?,
        })
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: the bytes are an unmodified copy of a valid &str.
        unsafe { core::str::from_utf8_unchecked(self.bytes.as_slice()) }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte range of this string's pool allocation.
    pub fn address_range(&self) -> AddressRange {
        self.bytes.address_range()
    }

    pub fn backing_pool(&self) -> Option<&Arc<NumaPool>> {
        self.bytes.backing_pool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_memory::NumaNode;

    #[test]
    fn heap_buffer_round_trip() {
        let buffer = PoolBuffer::from_vec(vec![1i64, 2, 3]);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
        assert_eq!(buffer.byte_size(), 24);
        assert!(buffer.backing_pool().is_none());
    }

    #[test]
    fn empty_buffer_is_harmless() {
        let buffer = PoolBuffer::<i32>::from_vec(Vec::new());
        assert!(buffer.is_empty());
        assert!(buffer.address_range().is_empty());
    }

    #[test]
    fn pool_copy_is_value_identical_and_in_bounds() {
        let pool = Arc::new(NumaPool::create(4096, NumaNode(0)));
        let heap = PoolBuffer::from_vec(vec![10i32, 20, 30, 40]);

        let pooled = heap.copy_into_pool(&pool).expect("copy failed");
        assert_eq!(pooled.as_slice(), heap.as_slice());
        assert!(pool.contains(pooled.address_range().start));
        assert!(pool.contains(pooled.address_range().end - 1));
        assert_ne!(pooled.address_range(), heap.address_range());
        assert_eq!(pool.allocated_bytes(), 16);

        drop(pooled);
        assert_eq!(pool.allocated_bytes(), 0, "drop is accounting-only");
    }

    #[test]
    fn pool_string_owns_distinct_memory() {
        let pool = Arc::new(NumaPool::create(4096, NumaNode(0)));
        let original = String::from("tiered memory");

        let pooled = PoolString::copy_into_pool(&original, &pool).expect("copy failed");
        assert_eq!(pooled.as_str(), original);
        assert!(pool.contains(pooled.address_range().start));
        assert_ne!(pooled.as_str().as_ptr(), original.as_ptr());
    }
}
