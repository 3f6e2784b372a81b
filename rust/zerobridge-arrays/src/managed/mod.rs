//! In-process model of the managed runtime's byte buffers.
//!
//! The managed side hands native code either a heap array ([`HeapArray`], movable by
//! the collector) or a direct buffer ([`DirectBuffer`], stable off-heap storage).
//! [`ByteBuffer`] is the buffer-object handle that can be backed by either.

pub mod direct;
pub mod heap;

pub use direct::DirectBuffer;
pub use heap::{CriticalArrayRef, ElementsRef, HeapArray, PinnedArrayRef};

/// A managed byte-buffer object, backed either by a heap array or by direct storage.
#[derive(Debug, Clone)]
pub enum ByteBuffer {
    Heap(HeapArray),
    Direct(DirectBuffer),
}

impl ByteBuffer {
    /// Allocates a heap-backed buffer of `capacity` zero bytes.
    pub fn allocate(capacity: usize) -> ByteBuffer {
        ByteBuffer::Heap(HeapArray::new(capacity))
    }

    /// Allocates a direct buffer of `capacity` zero bytes. See [`DirectBuffer::allocate`].
    pub fn allocate_direct(capacity: u64) -> Option<ByteBuffer> {
        DirectBuffer::allocate(capacity).map(ByteBuffer::Direct)
    }

    /// Wraps `data` in a heap-backed buffer.
    pub fn wrap(data: Vec<u8>) -> ByteBuffer {
        ByteBuffer::Heap(HeapArray::from_vec(data))
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, ByteBuffer::Direct(_))
    }

    pub fn capacity(&self) -> usize {
        match self {
            ByteBuffer::Heap(array) => array.len(),
            ByteBuffer::Direct(buffer) => buffer.capacity(),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            ByteBuffer::Heap(array) => array.to_vec(),
            ByteBuffer::Direct(buffer) => buffer.to_vec(),
        }
    }

    /// Copies `src` in at `start`, clamped to the buffer's end. Returns bytes written.
    pub fn write_at(&self, start: usize, src: &[u8]) -> usize {
        match self {
            ByteBuffer::Heap(array) => array.write_at(start, src),
            ByteBuffer::Direct(buffer) => buffer.write_at(start, src),
        }
    }

    pub fn as_direct(&self) -> Option<&DirectBuffer> {
        match self {
            ByteBuffer::Direct(buffer) => Some(buffer),
            ByteBuffer::Heap(_) => None,
        }
    }
}

impl From<HeapArray> for ByteBuffer {
    fn from(array: HeapArray) -> Self {
        ByteBuffer::Heap(array)
    }
}

impl From<DirectBuffer> for ByteBuffer {
    fn from(buffer: DirectBuffer) -> Self {
        ByteBuffer::Direct(buffer)
    }
}
