//! Relocatable managed byte arrays.

use std::{
    ops::{Deref, DerefMut},
    sync::{
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicU64, Ordering},
    },
};

/// A byte array living in the managed heap.
///
/// The collector may move the array's storage at any time unless it is pinned, so
/// no address taken from it stays valid outside a pinned scope. Native code reaches
/// the contents in one of two ways:
///
/// - [`pinned`](HeapArray::pinned): a shared, read-only pin. Any number of shared
///   pins may coexist, on any threads, and the array's other read calls keep working
///   while one is held.
/// - [`critical`](HeapArray::critical): pins the array for the lifetime of the
///   returned guard and exposes the storage in place for writing. The collector cannot
///   relocate the array while either kind of pin lives, so pins must be short-lived.
///   Making any other call on the same array from the pinning thread before a critical
///   guard drops deadlocks.
/// - [`elements`](HeapArray::elements): copies the contents out, lets the caller
///   edit the copy, and writes it back when the guard drops (unless aborted).
///
/// Clones are additional references to the same array, which stays reachable while
/// any reference exists.
#[derive(Clone)]
pub struct HeapArray {
    object: Arc<HeapObject>,
}

struct HeapObject {
    data: RwLock<Vec<u8>>,
    relocations: AtomicU64,
}

impl HeapArray {
    /// Allocates a zero-filled array of `len` bytes.
    pub fn new(len: usize) -> HeapArray {
        HeapArray::from_vec(vec![0u8; len])
    }

    pub fn from_vec(data: Vec<u8>) -> HeapArray {
        HeapArray {
            object: Arc::new(HeapObject {
                data: RwLock::new(data),
                relocations: AtomicU64::new(0),
            }),
        }
    }

    pub fn copy_from(data: &[u8]) -> HeapArray {
        HeapArray::from_vec(data.to_vec())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the contents out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.read().clone()
    }

    /// Copies `src` into the array starting at `start`, clamped to the array's end.
    /// Returns the number of bytes written.
    pub fn write_at(&self, start: usize, src: &[u8]) -> usize {
        let mut data = self.write();
        if start >= data.len() {
            return 0;
        }
        let n = src.len().min(data.len() - start);
        data[start..start + n].copy_from_slice(&src[..n]);
        n
    }

    /// Copies bytes from `start` into `dst`, clamped to the array's end.
    /// Returns the number of bytes read.
    pub fn read_at(&self, start: usize, dst: &mut [u8]) -> usize {
        let data = self.read();
        if start >= data.len() {
            return 0;
        }
        let n = dst.len().min(data.len() - start);
        dst[..n].copy_from_slice(&data[start..start + n]);
        n
    }

    /// Pins the array for reading and exposes its storage in place.
    pub fn pinned(&self) -> PinnedArrayRef<'_> {
        PinnedArrayRef { guard: self.read() }
    }

    /// Runs `f` with the array pinned for reading.
    pub fn with_pinned<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let pinned = self.pinned();
        f(&pinned)
    }

    /// Pins the array exclusively and exposes its storage in place for writing.
    pub fn critical(&self) -> CriticalArrayRef<'_> {
        CriticalArrayRef { guard: self.write() }
    }

    /// Runs `f` with the array pinned.
    pub fn with_critical<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut pinned = self.critical();
        f(&mut *pinned)
    }

    /// Copies the contents into a scratch buffer that is written back on drop.
    pub fn elements(&self) -> ElementsRef<'_> {
        ElementsRef {
            array: self,
            copy: self.to_vec(),
            commit: true,
        }
    }

    /// Moves the array to fresh storage, the way a compacting collector would.
    ///
    /// Returns `false` without moving anything while the array is pinned, shared or
    /// critical.
    pub fn relocate(&self) -> bool {
        let Ok(mut data) = self.object.data.try_write() else {
            return false;
        };
        let mut moved = Vec::with_capacity(data.len());
        moved.extend_from_slice(&data);
        *data = moved;
        self.object.relocations.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of times the collector has moved this array.
    pub fn relocation_count(&self) -> u64 {
        self.object.relocations.load(Ordering::Relaxed)
    }

    /// True if both handles reference the same managed array.
    pub fn same_object(&self, other: &HeapArray) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.object
            .data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.object
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for HeapArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapArray")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Shared, read-only pinned access to a [`HeapArray`].
///
/// The storage address is stable until the guard drops.
pub struct PinnedArrayRef<'a> {
    guard: RwLockReadGuard<'a, Vec<u8>>,
}

impl PinnedArrayRef<'_> {
    pub fn as_ptr(&self) -> *const u8 {
        self.guard.as_ptr()
    }
}

impl Deref for PinnedArrayRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard
    }
}

/// Exclusive, pinned, in-place access to a [`HeapArray`].
///
/// The storage address is stable until the guard drops.
pub struct CriticalArrayRef<'a> {
    guard: RwLockWriteGuard<'a, Vec<u8>>,
}

impl CriticalArrayRef<'_> {
    pub fn as_ptr(&self) -> *const u8 {
        self.guard.as_ptr()
    }
}

impl Deref for CriticalArrayRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard
    }
}

impl DerefMut for CriticalArrayRef<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.guard
    }
}

/// A copy of a [`HeapArray`]'s contents, written back when dropped.
pub struct ElementsRef<'a> {
    array: &'a HeapArray,
    copy: Vec<u8>,
    commit: bool,
}

impl ElementsRef<'_> {
    /// Discards the copy without writing it back.
    pub fn abort(mut self) {
        self.commit = false;
    }
}

impl Deref for ElementsRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.copy
    }
}

impl DerefMut for ElementsRef<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.copy
    }
}

impl Drop for ElementsRef<'_> {
    fn drop(&mut self) {
        if self.commit {
            self.array.write_at(0, &self.copy);
        }
    }
}
