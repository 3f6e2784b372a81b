//! Borrowed and raw views of a [`DirectArray`].

use std::ops::Deref;

use zerobridge_common::Result;

use crate::{
    direct_array::{BackingKind, DirectArray},
    managed::HeapArray,
};

/// How the other side of the boundary reaches an array's bytes.
#[derive(Debug, Clone, Copy)]
pub enum ArrayView<'a> {
    Absent,
    /// Stable storage addressable as `(address, length)`.
    Native {
        address: u64,
        length: u64,
        kind: BackingKind,
    },
    /// A managed heap array, addressable only while pinned.
    Heap(&'a HeapArray),
}

impl ArrayView<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, ArrayView::Absent)
    }
}

/// A plain-data handle that carries an array across a C ABI.
///
/// `kind` holds a [`BackingKind`] value: `NativeUnsafe` marks a handle that owns its
/// memory, `WrappedForeign` marks a borrowed one.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHandle {
    pub address: u64,
    pub length: u64,
    pub kind: u32,
}

impl RawHandle {
    pub const NULL: RawHandle = RawHandle {
        address: 0,
        length: 0,
        kind: BackingKind::WrappedForeign as u32,
    };

    pub(crate) fn owned(address: u64, length: u64) -> RawHandle {
        RawHandle {
            address,
            length,
            kind: BackingKind::NativeUnsafe as u32,
        }
    }

    pub(crate) fn borrowed(address: u64, length: u64) -> RawHandle {
        RawHandle {
            address,
            length,
            kind: BackingKind::WrappedForeign as u32,
        }
    }

    pub fn backing_kind(&self) -> Option<BackingKind> {
        BackingKind::from_u32(self.kind)
    }

    pub fn is_null(&self) -> bool {
        self.address == 0
    }

    /// True if restoring this handle transfers ownership of its memory.
    pub fn is_owned(&self) -> bool {
        self.backing_kind() == Some(BackingKind::NativeUnsafe)
    }
}

/// A read-only loan of a [`DirectArray`]. Holders can read but never release.
#[derive(Clone, Copy)]
pub struct ArrayRef<'a> {
    array: &'a DirectArray,
}

impl<'a> ArrayRef<'a> {
    pub(crate) fn new(array: &'a DirectArray) -> Self {
        ArrayRef { array }
    }
}

impl Deref for ArrayRef<'_> {
    type Target = DirectArray;

    fn deref(&self) -> &DirectArray {
        self.array
    }
}

/// A writable loan of a [`DirectArray`]. Holders can read and write in place but
/// cannot release the array or move it out.
pub struct ArrayMut<'a> {
    array: &'a mut DirectArray,
}

impl<'a> ArrayMut<'a> {
    pub(crate) fn new(array: &'a mut DirectArray) -> Self {
        ArrayMut { array }
    }

    pub fn put(&mut self, index: u64, value: u8) {
        self.array.put(index, value)
    }

    pub fn write_at(&mut self, start: u64, src: &[u8]) -> usize {
        self.array.write_at(start, src)
    }

    pub fn write_all(&mut self, contents: &[u8]) -> Result<()> {
        self.array.write_all(contents)
    }

    pub fn with_bytes_mut<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        self.array.with_bytes_mut(f)
    }
}

impl Deref for ArrayMut<'_> {
    type Target = DirectArray;

    fn deref(&self) -> &DirectArray {
        self.array
    }
}
