//! Off-heap managed buffers with stable storage.

use std::{
    alloc::{Layout, alloc_zeroed, dealloc},
    ptr::NonNull,
    sync::Arc,
};

use zerobridge_common_traits::memory_owner::{MemoryOwner, MemoryRegion};

/// A managed buffer whose storage lives outside the managed heap, so its address is
/// stable for the buffer's whole lifetime.
///
/// The buffer is reference-counted: it stays reachable while any clone exists, and its
/// storage is reclaimed when the last clone drops. A buffer created by
/// [`facade`](DirectBuffer::facade) does not own its storage and never frees it.
///
/// Reads and writes go through raw pointers. Any clone can mutate the shared storage;
/// callers must not let two threads mutate the same buffer without their own locking.
#[derive(Clone)]
pub struct DirectBuffer {
    storage: Arc<DirectStorage>,
}

struct DirectStorage {
    ptr: NonNull<u8>,
    len: usize,
    layout: Option<Layout>,
    foreign: bool,
}

// SAFETY: DirectStorage exclusively owns (or, for facades, exclusively references)
// a raw memory region; concurrent mutation is excluded by the caller contract above.
unsafe impl Send for DirectStorage {}
unsafe impl Sync for DirectStorage {}

impl DirectBuffer {
    /// Largest capacity the managed runtime accepts for a direct buffer.
    pub const MAX_CAPACITY: u64 = i32::MAX as u64;

    const ALIGNMENT: usize = 64;

    /// Allocates a zero-filled direct buffer of `capacity` bytes.
    ///
    /// Returns `None` if `capacity` exceeds [`MAX_CAPACITY`](Self::MAX_CAPACITY) or the
    /// allocation fails. A zero-capacity buffer owns no storage but has a valid,
    /// non-null address.
    pub fn allocate(capacity: u64) -> Option<DirectBuffer> {
        if capacity > Self::MAX_CAPACITY {
            return None;
        }
        let len = capacity as usize;
        let storage = if len == 0 {
            DirectStorage {
                ptr: NonNull::dangling(),
                len: 0,
                layout: None,
                foreign: false,
            }
        } else {
            let layout = Layout::from_size_align(len, Self::ALIGNMENT).ok()?;
            let ptr = NonNull::new(unsafe { alloc_zeroed(layout) })?;
            DirectStorage {
                ptr,
                len,
                layout: Some(layout),
                foreign: false,
            }
        };
        Some(DirectBuffer {
            storage: Arc::new(storage),
        })
    }

    /// Creates a direct buffer over memory owned by someone else.
    ///
    /// The buffer never frees `ptr`. A null `ptr` yields `None`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for as long as any clone
    /// of the returned buffer is used.
    pub unsafe fn facade(ptr: *mut u8, len: usize) -> Option<DirectBuffer> {
        let ptr = NonNull::new(ptr)?;
        Some(DirectBuffer {
            storage: Arc::new(DirectStorage {
                ptr,
                len,
                layout: None,
                foreign: true,
            }),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len
    }

    #[inline]
    pub fn address(&self) -> u64 {
        self.storage.ptr.as_ptr() as usize as u64
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.storage.ptr.as_ptr()
    }

    /// False for buffers created by [`facade`](DirectBuffer::facade) and for
    /// zero-capacity buffers.
    pub fn owns_storage(&self) -> bool {
        self.storage.layout.is_some()
    }

    /// True for buffers created by [`facade`](DirectBuffer::facade), whose memory
    /// belongs to someone else.
    pub fn is_facade(&self) -> bool {
        self.storage.foreign
    }

    /// Reads the byte at `index`. Panics if `index` is out of bounds.
    pub fn get(&self, index: usize) -> u8 {
        assert!(
            index < self.capacity(),
            "index {index} out of bounds (capacity: {})",
            self.capacity()
        );
        unsafe { self.as_ptr().add(index).read() }
    }

    /// Writes `value` at `index`. Panics if `index` is out of bounds.
    pub fn put(&self, index: usize, value: u8) {
        assert!(
            index < self.capacity(),
            "index {index} out of bounds (capacity: {})",
            self.capacity()
        );
        unsafe { self.as_ptr().add(index).write(value) }
    }

    /// Copies `src` into the buffer starting at `start`, clamped to the buffer's end.
    /// Returns the number of bytes written.
    pub fn write_at(&self, start: usize, src: &[u8]) -> usize {
        if start >= self.capacity() {
            return 0;
        }
        let n = src.len().min(self.capacity() - start);
        unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), self.as_ptr().add(start), n) };
        n
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.capacity()];
        unsafe { std::ptr::copy_nonoverlapping(self.as_ptr(), out.as_mut_ptr(), out.len()) };
        out
    }

    /// Number of live references to the underlying buffer.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.storage)
    }

    /// True if both handles reference the same buffer object.
    pub fn same_object(&self, other: &DirectBuffer) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}

impl Drop for DirectStorage {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            unsafe { dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

unsafe impl MemoryOwner for DirectBuffer {
    fn memory(&self) -> MemoryRegion {
        MemoryRegion {
            ptr: self.as_ptr(),
            len: self.capacity(),
        }
    }
}

impl std::fmt::Debug for DirectBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectBuffer")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("capacity", &self.capacity())
            .field("owns_storage", &self.owns_storage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_zeroed_and_aligned() {
        let b = DirectBuffer::allocate(100).unwrap();
        assert_eq!(b.capacity(), 100);
        assert_eq!(b.address() % 64, 0);
        assert!(b.to_vec().iter().all(|&x| x == 0));
        assert!(b.owns_storage());
    }

    #[test]
    fn test_allocate_zero_capacity() {
        let b = DirectBuffer::allocate(0).unwrap();
        assert_eq!(b.capacity(), 0);
        assert_ne!(b.address(), 0);
        assert!(b.to_vec().is_empty());
        assert!(!b.owns_storage());
        assert!(!b.is_facade());
    }

    #[test]
    fn test_allocate_over_max_capacity() {
        assert!(DirectBuffer::allocate(DirectBuffer::MAX_CAPACITY + 1).is_none());
    }

    #[test]
    fn test_get_put_write_at() {
        let b = DirectBuffer::allocate(4).unwrap();
        b.put(3, 0xee);
        assert_eq!(b.get(3), 0xee);
        assert_eq!(b.write_at(1, &[1, 2, 3, 4]), 3);
        assert_eq!(b.to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(b.write_at(4, &[1]), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let b = DirectBuffer::allocate(4).unwrap();
        b.get(4);
    }

    #[test]
    fn test_facade_shares_foreign_memory() {
        let mut backing = vec![1u8, 2, 3];
        let b = unsafe { DirectBuffer::facade(backing.as_mut_ptr(), backing.len()) }.unwrap();
        assert!(!b.owns_storage());
        assert!(b.is_facade());
        b.put(0, 9);
        drop(b);
        assert_eq!(backing, vec![9, 2, 3]);
        assert!(unsafe { DirectBuffer::facade(std::ptr::null_mut(), 3) }.is_none());
    }

    #[test]
    fn test_clones_share_storage() {
        let a = DirectBuffer::allocate(2).unwrap();
        let b = a.clone();
        assert_eq!(a.reference_count(), 2);
        b.put(1, 5);
        assert_eq!(a.get(1), 5);
        assert!(a.same_object(&b));
        drop(b);
        assert_eq!(a.reference_count(), 1);
    }
}
