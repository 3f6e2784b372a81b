//! Ownership hand-off of arrays between the managed and native sides.
//!
//! Each side keeps its arrays in an [`Endpoint`]. Moving an array between endpoints is
//! a plain move of the [`DirectArray`]; lending it is a borrow. Arrays that leave Rust
//! as a [`RawHandle`] are tracked, in debug builds, by a ledger of in-flight owned
//! handles so that a handle restored twice fails loudly instead of freeing twice.

use zerobridge_common::{Result, error::Error};

use crate::{
    direct_array::{DirectArray, Ownership},
    view::{ArrayMut, ArrayRef, RawHandle},
};

/// One side of the runtime boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Managed,
    Native,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Managed => Side::Native,
            Side::Native => Side::Managed,
        }
    }
}

/// Lifecycle of the array held by an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipState {
    /// No array; either never bound or moved out.
    Unbound,
    /// Holds an array it is responsible for releasing.
    Owned(Side),
    /// Holds a non-owning view of memory owned elsewhere.
    Borrowed(Side),
    /// The last array was released here.
    Released,
}

/// A side's slot for one [`DirectArray`].
#[derive(Debug)]
pub struct Endpoint {
    side: Side,
    array: DirectArray,
}

impl Endpoint {
    pub fn new(side: Side) -> Endpoint {
        Endpoint {
            side,
            array: DirectArray::absent(),
        }
    }

    pub fn with_array(side: Side, array: DirectArray) -> Endpoint {
        Endpoint { side, array }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn array(&self) -> &DirectArray {
        &self.array
    }

    pub fn state(&self) -> OwnershipState {
        match self.array.ownership() {
            Some(Ownership::Owned) => OwnershipState::Owned(self.side),
            Some(Ownership::Borrowed) => OwnershipState::Borrowed(self.side),
            None if self.array.is_released() => OwnershipState::Released,
            None => OwnershipState::Unbound,
        }
    }

    pub fn has_array(&self) -> bool {
        self.array.has_array()
    }

    /// Lends the array to the other side for reading.
    pub fn lend(&self) -> ArrayRef<'_> {
        self.array.lend()
    }

    /// Lends the array to the other side for reading and writing.
    pub fn lend_mut(&mut self) -> ArrayMut<'_> {
        self.array.lend_mut()
    }

    /// Binds `array` to this endpoint, releasing whatever it held before.
    ///
    /// Returns `true` iff the endpoint now holds an array (possibly zero-length).
    pub fn adopt(&mut self, array: DirectArray) -> bool {
        self.array.release();
        self.array = array;
        log::trace!("{:?} endpoint adopted {:?}", self.side, self.array);
        self.array.has_array()
    }

    /// Moves the array out, leaving the endpoint unbound.
    pub fn take(&mut self) -> DirectArray {
        self.array.take()
    }

    /// Moves the array into `other`. Returns `true` iff `other` now holds an array.
    pub fn transfer_to(&mut self, other: &mut Endpoint) -> bool {
        other.adopt(self.take())
    }

    /// Moves the array out as a raw handle for code outside Rust.
    ///
    /// Returns `None`, leaving the array in place, for absent and managed-backed
    /// arrays.
    pub fn export(&mut self) -> Option<RawHandle> {
        match self.array.take().into_raw() {
            Ok(handle) => {
                if handle.is_owned() {
                    ledger::export(handle.address, self.side);
                }
                Some(handle)
            }
            Err(array) => {
                self.array = array;
                None
            }
        }
    }

    /// Adopts the array carried by a raw handle. See [`Endpoint::adopt`].
    ///
    /// # Safety
    ///
    /// Same contract as [`DirectArray::from_raw`]. Debug builds panic if an owned
    /// handle was not exported or has already been imported.
    pub unsafe fn import(&mut self, handle: RawHandle) -> bool {
        if handle.is_owned() && !handle.is_null() {
            ledger::import(handle.address);
        }
        self.adopt(unsafe { DirectArray::from_raw(handle) })
    }

    /// Overwrites the whole array with `contents`.
    pub fn write(&mut self, contents: &[u8]) -> Result<()> {
        if !self.array.has_array() {
            return Err(Error::invalid_operation(format!(
                "{:?} endpoint does not have a buffer",
                self.side
            )));
        }
        self.array.write_all(contents)
    }

    /// True iff the endpoint holds an array whose contents equal `expected`.
    pub fn check(&self, expected: &[u8]) -> bool {
        self.array.contents_eq(expected)
    }

    /// Releases the held array. No-op if the endpoint holds nothing.
    pub fn release(&mut self) {
        self.array.release();
    }
}

/// Debug-build record of owned raw handles that are outside Rust.
pub(crate) mod ledger {
    use super::Side;

    #[cfg(debug_assertions)]
    fn in_flight() -> std::sync::MutexGuard<'static, std::collections::HashMap<u64, Side>> {
        use std::{
            collections::HashMap,
            sync::{Mutex, OnceLock},
        };
        static IN_FLIGHT: OnceLock<Mutex<HashMap<u64, Side>>> = OnceLock::new();
        IN_FLIGHT
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn export(address: u64, from: Side) {
        #[cfg(debug_assertions)]
        {
            let prev = in_flight().insert(address, from);
            assert!(
                prev.is_none(),
                "raw handle {address:#x} exported while already in flight"
            );
        }
        #[cfg(not(debug_assertions))]
        let _ = (address, from);
    }

    pub fn import(address: u64) {
        #[cfg(debug_assertions)]
        {
            let removed = in_flight().remove(&address);
            assert!(
                removed.is_some(),
                "raw handle {address:#x} is not in flight (restored twice?)"
            );
        }
        #[cfg(not(debug_assertions))]
        let _ = address;
    }

    #[cfg(all(test, debug_assertions))]
    pub fn exporter(address: u64) -> Option<Side> {
        in_flight().get(&address).copied()
    }
}

#[cfg(test)]
mod tests {
    use zerobridge_native_alloc::AllocatorStats;

    use super::*;

    #[test]
    fn test_states() {
        let mut ep = Endpoint::new(Side::Native);
        assert_eq!(ep.state(), OwnershipState::Unbound);
        assert!(ep.adopt(DirectArray::allocate_unsafe(2)));
        assert_eq!(ep.state(), OwnershipState::Owned(Side::Native));
        ep.release();
        assert_eq!(ep.state(), OwnershipState::Released);
        assert!(!ep.adopt(DirectArray::absent()));
        assert_eq!(ep.state(), OwnershipState::Unbound);

        let mut foreign = [0u8; 2];
        let da = unsafe { DirectArray::wrap_foreign(foreign.as_mut_ptr() as usize as u64, 2) };
        let ep = Endpoint::with_array(Side::Managed, da);
        assert_eq!(ep.state(), OwnershipState::Borrowed(Side::Managed));
    }

    #[test]
    fn test_adopt_releases_previous_array() {
        let before = AllocatorStats::current_thread();
        let mut ep = Endpoint::new(Side::Native);
        ep.adopt(DirectArray::allocate_unsafe(4));
        ep.adopt(DirectArray::allocate_unsafe(4));
        assert_eq!(AllocatorStats::current_thread().since(&before).frees, 1);
        drop(ep);
        assert_eq!(AllocatorStats::current_thread().since(&before).outstanding(), 0);
    }

    #[test]
    fn test_transfer_to_other_side() {
        let mut native = Endpoint::with_array(Side::Native, DirectArray::allocate_unsafe(2));
        let mut managed = Endpoint::new(Side::Managed);
        assert!(native.transfer_to(&mut managed));
        assert_eq!(native.state(), OwnershipState::Unbound);
        assert_eq!(managed.state(), OwnershipState::Owned(Side::Managed));
        assert_eq!(native.side().other(), managed.side());
    }

    #[test]
    fn test_write_without_buffer_fails() {
        let mut ep = Endpoint::new(Side::Native);
        assert!(ep.write(&[1]).is_err());
        assert!(!ep.check(&[]));
    }

    #[test]
    fn test_export_import_roundtrip() {
        let before = AllocatorStats::current_thread();
        let mut native = Endpoint::with_array(Side::Native, DirectArray::allocate_unsafe(3));
        native.write(b"abc").unwrap();

        let handle = native.export().unwrap();
        assert_eq!(native.state(), OwnershipState::Unbound);
        #[cfg(debug_assertions)]
        assert_eq!(ledger::exporter(handle.address), Some(Side::Native));

        let mut managed = Endpoint::new(Side::Managed);
        assert!(unsafe { managed.import(handle) });
        assert!(managed.check(b"abc"));
        #[cfg(debug_assertions)]
        assert_eq!(ledger::exporter(handle.address), None);

        drop(managed);
        let delta = AllocatorStats::current_thread().since(&before);
        assert_eq!(delta.allocations, 1);
        assert_eq!(delta.frees, 1);
    }

    #[test]
    fn test_export_keeps_managed_arrays() {
        let mut ep = Endpoint::with_array(Side::Managed, DirectArray::allocate_managed_direct(2));
        assert!(ep.export().is_none());
        assert!(ep.has_array());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "not in flight")]
    fn test_double_import_panics_in_debug() {
        let mut native = Endpoint::with_array(Side::Native, DirectArray::allocate_unsafe(1));
        let handle = native.export().unwrap();
        let mut first = Endpoint::new(Side::Managed);
        let mut second = Endpoint::new(Side::Managed);
        unsafe {
            first.import(handle);
            second.import(handle);
        }
    }
}
