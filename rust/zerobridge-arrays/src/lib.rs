//! Zero-copy byte arrays shared between a managed runtime and native code.
//!
//! [`DirectArray`] is the central type: a handle to bytes that live in a managed
//! direct buffer, a managed heap array, native memory, or someone else's memory, and
//! that both sides can read and write in place. [`UnsafeArray`] is the raw native
//! allocation underneath, and [`transfer`] moves arrays between the two sides.

pub mod direct_array;
pub mod ffi;
pub mod managed;
pub mod transfer;
pub mod unsafe_array;
pub mod view;

pub use direct_array::{BackingKind, DirectArray, Ownership};
pub use managed::{ByteBuffer, DirectBuffer, HeapArray};
pub use transfer::{Endpoint, OwnershipState, Side};
pub use unsafe_array::UnsafeArray;
pub use view::{ArrayMut, ArrayRef, ArrayView, RawHandle};
