//! `DirectArray`: a byte region shared between the managed and native sides without
//! copying.

use zerobridge_common::{Result, error::Error, verify_arg};
use zerobridge_common_traits::memory_owner::{MemoryOwner, MemoryRegion};

use crate::{
    managed::{ByteBuffer, DirectBuffer, HeapArray},
    unsafe_array::UnsafeArray,
    view::{ArrayMut, ArrayRef, ArrayView, RawHandle},
};

/// Where the bytes of a [`DirectArray`] live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BackingKind {
    /// A managed heap array. Its address is only stable while pinned.
    ManagedHeap = 0,
    /// A managed direct buffer with stable off-heap storage.
    ManagedDirect = 1,
    /// Native memory from the native allocator, freed on release.
    NativeUnsafe = 2,
    /// Memory owned by someone else; never freed through this array.
    WrappedForeign = 3,
}

impl BackingKind {
    pub fn from_u32(value: u32) -> Option<BackingKind> {
        match value {
            0 => Some(BackingKind::ManagedHeap),
            1 => Some(BackingKind::ManagedDirect),
            2 => Some(BackingKind::NativeUnsafe),
            3 => Some(BackingKind::WrappedForeign),
            _ => None,
        }
    }

    /// True if native code may hold the backing's address across calls.
    pub fn has_stable_address(self) -> bool {
        !matches!(self, BackingKind::ManagedHeap)
    }
}

/// Whether a [`DirectArray`] is responsible for releasing its backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
}

enum Backing {
    ManagedHeap(HeapArray),
    ManagedDirect(DirectBuffer),
    NativeUnsafe(UnsafeArray),
    WrappedForeign(MemoryRegion),
}

impl Backing {
    fn kind(&self) -> BackingKind {
        match self {
            Backing::ManagedHeap(_) => BackingKind::ManagedHeap,
            Backing::ManagedDirect(_) => BackingKind::ManagedDirect,
            Backing::NativeUnsafe(_) => BackingKind::NativeUnsafe,
            Backing::WrappedForeign(_) => BackingKind::WrappedForeign,
        }
    }

    /// The in-place region for kinds with a stable address.
    fn region(&self) -> Option<MemoryRegion> {
        match self {
            Backing::ManagedHeap(_) => None,
            Backing::ManagedDirect(buffer) => Some(buffer.memory()),
            Backing::NativeUnsafe(array) => Some(array.memory()),
            Backing::WrappedForeign(region) => Some(*region),
        }
    }
}

/// A handle to a byte region that both sides of the runtime boundary can read and
/// write in place.
///
/// A `DirectArray` is either *absent* (no backing at all, the analogue of a null
/// reference) or holds exactly one backing of a fixed [`BackingKind`]. A present array
/// may still have length zero: [`has_array`](DirectArray::has_array) tells the two
/// apart, while [`is_empty`](DirectArray::is_empty) is true for both.
///
/// Only one handle owns a backing at a time. Moving the `DirectArray` moves ownership;
/// [`take`](DirectArray::take) moves it out of a place and leaves that place absent.
/// Borrowed access goes through [`lend`](DirectArray::lend) and
/// [`lend_mut`](DirectArray::lend_mut), whose views cannot release anything.
///
/// Dropping an owned array releases it. Release is idempotent.
#[derive(Default)]
pub struct DirectArray {
    backing: Option<Backing>,
    released: bool,
}

impl DirectArray {
    /// An array with no backing.
    pub const fn absent() -> DirectArray {
        DirectArray {
            backing: None,
            released: false,
        }
    }

    fn with_backing(backing: Backing) -> DirectArray {
        DirectArray {
            backing: Some(backing),
            released: false,
        }
    }

    /// Wraps a managed buffer object.
    ///
    /// Yields an absent array for `None` and for buffers that are not direct: a
    /// heap-backed buffer has no stable address to share.
    pub fn wrap_managed_direct<'a>(buffer: impl Into<Option<&'a ByteBuffer>>) -> DirectArray {
        match buffer.into() {
            Some(ByteBuffer::Direct(buffer)) => {
                DirectArray::with_backing(Backing::ManagedDirect(buffer.clone()))
            }
            Some(ByteBuffer::Heap(_)) => {
                log::debug!("wrap_managed_direct: buffer is not direct; array left absent");
                DirectArray::absent()
            }
            None => DirectArray::absent(),
        }
    }

    /// Wraps a managed heap array. Native access pins the array for the duration of
    /// each operation.
    pub fn wrap_managed_heap(array: &HeapArray) -> DirectArray {
        DirectArray::with_backing(Backing::ManagedHeap(array.clone()))
    }

    /// Takes ownership of a native array.
    ///
    /// `None` and arrays without an allocation yield an absent array.
    pub fn wrap_unsafe(array: impl Into<Option<UnsafeArray>>) -> DirectArray {
        match array.into() {
            Some(array) if array.is_allocated() => {
                DirectArray::with_backing(Backing::NativeUnsafe(array))
            }
            _ => DirectArray::absent(),
        }
    }

    /// Exposes memory owned by someone else. The array never frees it.
    ///
    /// A zero `address` yields an absent array.
    ///
    /// # Safety
    ///
    /// `address` must be valid for reads and writes of `length` bytes for as long as
    /// this array (or any view of it) is used.
    pub unsafe fn wrap_foreign(address: u64, length: u64) -> DirectArray {
        if address == 0 {
            return DirectArray::absent();
        }
        DirectArray::with_backing(Backing::WrappedForeign(MemoryRegion {
            ptr: address as usize as *mut u8,
            len: length as usize,
        }))
    }

    /// Allocates a fresh managed direct buffer and wraps it.
    ///
    /// Returns an absent array if the buffer cannot be allocated.
    pub fn allocate_managed_direct(size: u64) -> DirectArray {
        match DirectBuffer::allocate(size) {
            Some(buffer) => DirectArray::with_backing(Backing::ManagedDirect(buffer)),
            None => {
                log::debug!("allocate_managed_direct: failed to allocate {size} bytes");
                DirectArray::absent()
            }
        }
    }

    /// Allocates native memory and takes ownership of it.
    ///
    /// A zero `size` yields a present zero-length array. Returns an absent array if
    /// the allocation fails.
    pub fn allocate_unsafe(size: u64) -> DirectArray {
        let array = UnsafeArray::allocate(size);
        if !array.is_allocated() {
            log::debug!("allocate_unsafe: failed to allocate {size} bytes");
        }
        DirectArray::wrap_unsafe(array)
    }

    /// True iff the array has a backing, even a zero-length one.
    #[inline]
    pub fn has_array(&self) -> bool {
        self.backing.is_some()
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        self.backing.is_none()
    }

    /// True iff the array has no backing or a zero-length one.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True iff [`release`](DirectArray::release) has dropped a backing from this array.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn kind(&self) -> Option<BackingKind> {
        self.backing.as_ref().map(Backing::kind)
    }

    pub fn ownership(&self) -> Option<Ownership> {
        self.backing.as_ref().map(|backing| match backing {
            Backing::WrappedForeign(_) => Ownership::Borrowed,
            Backing::ManagedDirect(buffer) if buffer.is_facade() => Ownership::Borrowed,
            _ => Ownership::Owned,
        })
    }

    /// Length in bytes; `0` when absent.
    pub fn len(&self) -> u64 {
        match &self.backing {
            None => 0,
            Some(Backing::ManagedHeap(array)) => array.len() as u64,
            Some(Backing::ManagedDirect(buffer)) => buffer.capacity() as u64,
            Some(Backing::NativeUnsafe(array)) => array.len(),
            Some(Backing::WrappedForeign(region)) => region.len as u64,
        }
    }

    /// Describes how the other side can reach the bytes.
    pub fn as_view(&self) -> ArrayView<'_> {
        match &self.backing {
            None => ArrayView::Absent,
            Some(Backing::ManagedHeap(array)) => ArrayView::Heap(array),
            Some(backing) => {
                let region = backing.region().unwrap_or(MemoryRegion::NULL);
                ArrayView::Native {
                    address: region.address(),
                    length: region.len as u64,
                    kind: backing.kind(),
                }
            }
        }
    }

    /// The managed direct buffer behind this array, if it has one.
    pub fn as_direct_buffer(&self) -> Option<&DirectBuffer> {
        match &self.backing {
            Some(Backing::ManagedDirect(buffer)) => Some(buffer),
            _ => None,
        }
    }

    /// A read-only borrowed view. The view cannot release the array.
    pub fn lend(&self) -> ArrayRef<'_> {
        ArrayRef::new(self)
    }

    /// A writable borrowed view. The view cannot release or take the array.
    pub fn lend_mut(&mut self) -> ArrayMut<'_> {
        ArrayMut::new(self)
    }

    /// Reads the byte at `index`.
    ///
    /// `index < len()` is a precondition; debug builds assert it.
    pub fn get(&self, index: u64) -> u8 {
        debug_assert!(self.has_array(), "Empty array");
        debug_assert!(
            index < self.len(),
            "Index {index} out of bounds (size: {})",
            self.len()
        );
        match &self.backing {
            None => 0,
            Some(Backing::ManagedHeap(array)) => array.with_pinned(|data| data[index as usize]),
            Some(Backing::ManagedDirect(buffer)) => buffer.get(index as usize),
            Some(Backing::NativeUnsafe(array)) => array.get(index),
            Some(Backing::WrappedForeign(region)) => unsafe {
                region.ptr.add(index as usize).read()
            },
        }
    }

    /// Writes `value` at `index`.
    ///
    /// `index < len()` is a precondition; debug builds assert it.
    pub fn put(&mut self, index: u64, value: u8) {
        debug_assert!(self.has_array(), "Empty array");
        debug_assert!(
            index < self.len(),
            "Index {index} out of bounds (size: {})",
            self.len()
        );
        match &mut self.backing {
            None => (),
            Some(Backing::ManagedHeap(array)) => {
                array.with_critical(|data| data[index as usize] = value)
            }
            Some(Backing::ManagedDirect(buffer)) => buffer.put(index as usize, value),
            Some(Backing::NativeUnsafe(array)) => array.put(index, value),
            Some(Backing::WrappedForeign(region)) => unsafe {
                region.ptr.add(index as usize).write(value)
            },
        }
    }

    /// Copies `src` in at `start`, clamped to the array's end. Returns the number of
    /// bytes written; `0` if the array is absent or `start` is past the end.
    pub fn write_at(&mut self, start: u64, src: &[u8]) -> usize {
        let Some(backing) = &self.backing else {
            return 0;
        };
        if let Backing::ManagedHeap(array) = backing {
            return usize::try_from(start).map_or(0, |start| array.write_at(start, src));
        }
        let len = self.len();
        if start >= len {
            return 0;
        }
        let n = (src.len() as u64).min(len - start) as usize;
        self.with_bytes_mut(|bytes| {
            let start = start as usize;
            bytes[start..start + n].copy_from_slice(&src[..n]);
        });
        n
    }

    /// Copies bytes from `start` into `dst`, clamped to the array's end. Returns the
    /// number of bytes read.
    pub fn read_at(&self, start: u64, dst: &mut [u8]) -> usize {
        let len = self.len();
        if start >= len {
            return 0;
        }
        let n = (dst.len() as u64).min(len - start) as usize;
        self.with_bytes(|bytes| {
            let start = start as usize;
            dst[..n].copy_from_slice(&bytes[start..start + n]);
        });
        n
    }

    /// Replaces the whole contents with `contents`, which must match the array's
    /// length exactly.
    pub fn write_all(&mut self, contents: &[u8]) -> Result<()> {
        if self.is_absent() {
            return Err(Error::invalid_operation("write_all: array has no buffer"));
        }
        let len = self.len() as usize;
        if contents.len() > len {
            return Err(Error::dest_buffer_too_small(contents.len(), len));
        }
        verify_arg!(contents, contents.len() == len);
        self.write_at(0, contents);
        Ok(())
    }

    /// Copies the contents out. Empty when absent.
    pub fn to_vec(&self) -> Vec<u8> {
        self.with_bytes(<[u8]>::to_vec)
    }

    /// True iff the array is present and holds exactly `expected`.
    pub fn contents_eq(&self, expected: &[u8]) -> bool {
        self.has_array() && self.with_bytes(|bytes| bytes == expected)
    }

    /// Runs `f` over the contents in place. Heap arrays hold a shared pin for the
    /// call, so read access may nest.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        match &self.backing {
            None => f(&[]),
            Some(Backing::ManagedHeap(array)) => array.with_pinned(f),
            Some(backing) => {
                let region = backing.region().unwrap_or(MemoryRegion::NULL);
                f(unsafe { region.as_slice() })
            }
        }
    }

    /// Runs `f` over the contents in place, mutably. Heap arrays are pinned
    /// exclusively for the call.
    pub fn with_bytes_mut<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        match &self.backing {
            None => f(&mut []),
            Some(Backing::ManagedHeap(array)) => array.with_critical(f),
            Some(backing) => {
                let region = backing.region().unwrap_or(MemoryRegion::NULL);
                f(unsafe { region.as_mut_slice() })
            }
        }
    }

    /// Moves the backing out, leaving this place absent.
    pub fn take(&mut self) -> DirectArray {
        std::mem::take(self)
    }

    /// A borrowed raw snapshot for native code, or `None` for absent and heap-backed
    /// arrays. Restoring it yields a non-owning array.
    pub fn raw_handle(&self) -> Option<RawHandle> {
        let region = self.backing.as_ref()?.region()?;
        Some(RawHandle::borrowed(region.address(), region.len as u64))
    }

    /// Converts a native or foreign array into a raw handle, transferring ownership
    /// into it. Owned native memory is then released only by restoring the handle with
    /// [`from_raw`](DirectArray::from_raw).
    ///
    /// Managed-backed and absent arrays cannot leave the managed heap's tracking and
    /// come back unchanged as `Err`.
    pub fn into_raw(mut self) -> std::result::Result<RawHandle, DirectArray> {
        match self.backing.take() {
            Some(Backing::NativeUnsafe(array)) => {
                let (address, length) = array.into_raw_parts();
                Ok(RawHandle::owned(address, length))
            }
            Some(Backing::WrappedForeign(region)) => {
                Ok(RawHandle::borrowed(region.address(), region.len as u64))
            }
            backing => {
                self.backing = backing;
                Err(self)
            }
        }
    }

    /// Restores an array from a raw handle.
    ///
    /// An owned handle yields an owning native array; a borrowed one yields a
    /// non-owning view. Null or malformed handles yield an absent array.
    ///
    /// # Safety
    ///
    /// An owned handle must come from [`into_raw`](DirectArray::into_raw) and be
    /// restored at most once. A borrowed handle carries the contract of
    /// [`wrap_foreign`](DirectArray::wrap_foreign).
    pub unsafe fn from_raw(handle: RawHandle) -> DirectArray {
        if handle.address == 0 {
            return DirectArray::absent();
        }
        match handle.backing_kind() {
            Some(BackingKind::NativeUnsafe) => DirectArray::wrap_unsafe(unsafe {
                UnsafeArray::from_raw_parts(handle.address, handle.length)
            }),
            Some(BackingKind::WrappedForeign) => unsafe {
                DirectArray::wrap_foreign(handle.address, handle.length)
            },
            _ => {
                log::warn!("from_raw: unexpected handle kind {}", handle.kind);
                DirectArray::absent()
            }
        }
    }

    /// Releases the backing: native memory is freed, managed buffers are dropped to the
    /// collector, foreign memory is left alone. The array is absent afterwards.
    ///
    /// Releasing an absent or already released array is a no-op.
    pub fn release(&mut self) {
        let Some(backing) = self.backing.take() else {
            return;
        };
        if let Backing::NativeUnsafe(mut array) = backing {
            array.release();
        }
        self.released = true;
    }
}

impl Drop for DirectArray {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DirectArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_view() {
            ArrayView::Absent => f
                .debug_struct("DirectArray")
                .field("released", &self.released)
                .finish_non_exhaustive(),
            ArrayView::Heap(array) => f
                .debug_struct("DirectArray")
                .field("kind", &BackingKind::ManagedHeap)
                .field("len", &array.len())
                .finish(),
            ArrayView::Native {
                address,
                length,
                kind,
            } => f
                .debug_struct("DirectArray")
                .field("kind", &kind)
                .field("address", &format_args!("{address:#x}"))
                .field("len", &length)
                .finish(),
        }
    }
}
